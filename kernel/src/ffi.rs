//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! C 接口
//!
//! 和 light-weight-mutex.h 中的函数一一对应，供 C 任务代码使用。
//! C 侧用 [`LightWeightMutex_t`] 声明存储（通常是 static），大小和对齐
//! 足够放下一个 [`LwMutex`]，内容只能通过这里的函数访问。
//! 返回值沿用 pdTRUE / pdFALSE。
//!
//! 使用前必须通过 [`register_scheduler`] 注册调度器。

#![allow(non_snake_case, non_camel_case_types)]

use core::ffi::c_void;
use core::mem::{align_of, size_of};

use spin::Once;

use crate::sched::{Priority, Scheduler, Tick, MAX_PRIORITY};
use crate::sync::LwMutex;

pub type BaseType = i32;

pub const PD_TRUE: BaseType = 1;
pub const PD_FALSE: BaseType = 0;

/// C 侧互斥锁存储的字节数
pub const LW_MUTEX_SIZE: usize = 128;

/// C 侧互斥锁存储的对齐
pub const LW_MUTEX_ALIGN: usize = 8;

/// 互斥锁的不透明存储
///
/// 对应 C 头文件中的 `LightWeightMutex_t`：
/// ```c
/// typedef struct { _Alignas(8) unsigned char storage[128]; } LightWeightMutex_t;
/// ```
#[repr(C, align(8))]
pub struct LightWeightMutex_t {
    _storage: [u8; LW_MUTEX_SIZE],
}

const _: () = assert!(size_of::<LwMutex>() <= size_of::<LightWeightMutex_t>());
const _: () = assert!(align_of::<LwMutex>() <= align_of::<LightWeightMutex_t>());
const _: () = assert!(size_of::<LightWeightMutex_t>() == LW_MUTEX_SIZE);
const _: () = assert!(align_of::<LightWeightMutex_t>() == LW_MUTEX_ALIGN);

impl LightWeightMutex_t {
    /// 未初始化（全零）的存储，使用前要调用 `lightMutexInit*`
    pub const fn zeroed() -> Self {
        Self {
            _storage: [0; LW_MUTEX_SIZE],
        }
    }
}

/// 存储中的互斥锁
///
/// # Safety
/// `handle` 非空，并且已经由 `lightMutexInit*` 初始化，在程序运行期间不会移动
unsafe fn mutex_ref(handle: *mut LightWeightMutex_t) -> &'static LwMutex {
    &*handle.cast::<LwMutex>()
}

static SCHEDULER: Once<&'static dyn Scheduler> = Once::new();

/// 注册 C 接口使用的调度器
///
/// 只能注册一次，重复注册返回 false。
pub fn register_scheduler(sched: &'static dyn Scheduler) -> bool {
    let mut registered = false;
    SCHEDULER.call_once(|| {
        registered = true;
        sched
    });
    if registered {
        crate::init();
    }
    registered
}

fn scheduler() -> Option<&'static dyn Scheduler> {
    let sched = SCHEDULER.get().copied();
    if sched.is_none() {
        log::error!("ffi: light weight mutex used before register_scheduler()");
    }
    sched
}

/// 初始化互斥锁（无天花板）
///
/// # Safety
/// `mutex` 指向可写的 `LightWeightMutex_t`，且没有任务持有或等待它
#[no_mangle]
pub unsafe extern "C" fn lightMutexInit(mutex: *mut LightWeightMutex_t) {
    assert!(!mutex.is_null(), "lightMutexInit: null mutex");
    mutex.cast::<LwMutex>().write(LwMutex::new());
}

/// 初始化带天花板的互斥锁
///
/// 天花板超出范围时返回 pdFALSE，不修改互斥锁
///
/// # Safety
/// 同 [`lightMutexInit`]
#[no_mangle]
pub unsafe extern "C" fn lightMutexInitCeiling(
    mutex: *mut LightWeightMutex_t,
    ceiling: Priority,
) -> BaseType {
    assert!(!mutex.is_null(), "lightMutexInitCeiling: null mutex");
    if ceiling > MAX_PRIORITY {
        return PD_FALSE;
    }
    mutex.cast::<LwMutex>().write(LwMutex::with_ceiling(ceiling));
    PD_TRUE
}

/// 获取互斥锁
///
/// # Safety
/// `mutex` 指向已初始化、在程序运行期间不会移动或释放的 `LightWeightMutex_t`。
/// 传入空指针属于契约违反，直接断言失败。
#[no_mangle]
pub unsafe extern "C" fn lightMutexTake(mutex: *mut LightWeightMutex_t, ticks: Tick) -> BaseType {
    assert!(!mutex.is_null(), "lightMutexTake: null mutex");

    let Some(sched) = scheduler() else {
        return PD_FALSE;
    };
    let mutex = mutex_ref(mutex);

    match mutex.take(sched, ticks) {
        Ok(()) => PD_TRUE,
        Err(err) => {
            if err.is_misuse() {
                log::warn!("ffi: lightMutexTake failed: {}", err);
            }
            PD_FALSE
        }
    }
}

/// 释放互斥锁
///
/// 空指针、未加锁、调用者不是持有者时返回 pdFALSE
///
/// # Safety
/// 同 [`lightMutexTake`]，但允许空指针
#[no_mangle]
pub unsafe extern "C" fn lightMutexGive(mutex: *mut LightWeightMutex_t) -> BaseType {
    if mutex.is_null() {
        log::warn!("ffi: lightMutexGive on null mutex");
        return PD_FALSE;
    }
    let mutex = mutex_ref(mutex);
    let Some(sched) = scheduler() else {
        return PD_FALSE;
    };

    match mutex.give(sched) {
        Ok(()) => PD_TRUE,
        Err(_) => PD_FALSE,
    }
}

/// 把互斥锁从持有者的持有链表中摘除
///
/// # Safety
/// `mutex_handle` 为空，或者指向已初始化的 `LightWeightMutex_t`
#[no_mangle]
pub unsafe extern "C" fn vRemoveMutexItemFromList(mutex_handle: *mut c_void) {
    if mutex_handle.is_null() {
        return;
    }
    let mutex = mutex_ref(mutex_handle.cast::<LightWeightMutex_t>());
    if let Some(sched) = scheduler() {
        mutex.remove_holder_item(sched);
    }
}

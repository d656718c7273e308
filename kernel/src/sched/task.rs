//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 任务相关的基本类型

use core::fmt;
use core::num::NonZeroUsize;

use crate::config::{MAX_PRIORITIES, TICK_RATE_HZ};

/// 任务优先级，数值越大优先级越高
///
/// 合法范围为 `0..MAX_PRIORITIES`
pub type Priority = u32;

/// 滴答计数
pub type Tick = u32;

/// 永久等待
pub const MAX_DELAY: Tick = crate::config::MAX_DELAY;

/// 最高优先级
pub const MAX_PRIORITY: Priority = MAX_PRIORITIES - 1;

/// 毫秒转换为滴答数（向下取整，结果不会超过 MAX_DELAY - 1）
pub const fn ms_to_ticks(ms: u32) -> Tick {
    let ticks = (ms as u64 * TICK_RATE_HZ as u64) / 1000;
    if ticks >= MAX_DELAY as u64 {
        MAX_DELAY - 1
    } else {
        ticks as Tick
    }
}

/// 任务句柄
///
/// 调度器给出的不透明标识（通常是 TCB 地址），不能为 0：
/// 互斥锁用 0 表示"无持有者"。
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(NonZeroUsize);

impl TaskHandle {
    /// 从原始值创建句柄，0 返回 None
    pub const fn new(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// 从 TCB 指针创建句柄
    pub fn from_ptr<T>(tcb: *const T) -> Option<Self> {
        Self::new(tcb as usize)
    }

    pub const fn as_usize(self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskHandle({:#x})", self.0)
    }
}

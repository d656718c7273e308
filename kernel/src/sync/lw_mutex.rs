//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 轻量级互斥锁 (Light Weight Mutex)
//!
//! 比基于信号量的互斥锁更轻：
//! - 快速路径只有一次 CAS，不进入临界区，不阻塞
//! - 可重入：持有者再次加锁只增加计数
//! - 竞争时按优先级排队阻塞，释放时直接转交给最高优先级的等待者
//! - 可选优先级天花板 (ICPP)，见 [`super::ceiling`]
//!
//! 状态：
//! - `owner`: 持有者句柄，0 表示无持有者
//! - `lock_count`: 递归计数，`lock_count == 0` 当且仅当无持有者

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::ceiling::{self, HolderItem, HolderLink};
use super::wait_queue::{WaitQueue, Waiter};
use crate::config::MAX_LOCK_COUNT;
use crate::errno::Errno;
use crate::list::ListItem;
use crate::sched::{CriticalSection, Priority, Scheduler, TaskHandle, Tick, MAX_DELAY, MAX_PRIORITY};

/// 无持有者
const UNOWNED: usize = 0;

/// 轻量级互斥锁
///
/// 通常放在 static 中。所有操作都要求 `&'static self`：天花板互斥锁的节点
/// 在持有期间挂在持有者的链表上，不能移动。
///
/// # 示例
/// ```no_run
/// # use lwmutex::sync::LwMutex;
/// # use lwmutex::sched::{Scheduler, MAX_DELAY};
/// static UART_LOCK: LwMutex = LwMutex::with_ceiling(8);
///
/// fn write(sched: &dyn Scheduler, bytes: &[u8]) {
///     if UART_LOCK.take(sched, MAX_DELAY).is_ok() {
///         // ... 临界区 ...
///         let _ = UART_LOCK.give(sched);
///     }
/// }
/// ```
pub struct LwMutex {
    /// 持有者
    owner: AtomicUsize,
    /// 递归计数，只有持有者会修改
    lock_count: AtomicU32,
    /// 天花板优先级，构造后不变
    ceiling: Option<Priority>,
    /// 持有链表节点（天花板互斥锁）
    holder: HolderItem,
    /// 等待队列
    waiters: WaitQueue,
}

// SAFETY: 除 owner 的 CAS 外，所有可变状态（链表、计数的 0/1 切换）
// 都在调度器的临界区内修改
unsafe impl Sync for LwMutex {}
unsafe impl Send for LwMutex {}

impl LwMutex {
    /// 创建不带天花板的互斥锁
    pub const fn new() -> Self {
        Self {
            owner: AtomicUsize::new(UNOWNED),
            lock_count: AtomicU32::new(0),
            ceiling: None,
            holder: ListItem::new(HolderLink::new()),
            waiters: WaitQueue::new(),
        }
    }

    /// 创建带天花板优先级的互斥锁
    ///
    /// # Panics
    /// `ceiling` 超过 `MAX_PRIORITY`（在 const 上下文中为编译错误）
    pub const fn with_ceiling(ceiling: Priority) -> Self {
        assert!(ceiling <= MAX_PRIORITY, "LwMutex ceiling out of range");
        let mut mutex = Self::new();
        mutex.ceiling = Some(ceiling);
        mutex
    }

    /// 初始化互斥锁（运行时初始化）
    ///
    /// 只能用于空闲的互斥锁：无持有者，无等待者。
    pub fn init(&self) {
        debug_assert!(self.waiters.is_empty(), "LwMutex::init with waiters");
        debug_assert!(!self.holder.is_linked(), "LwMutex::init while held");
        self.owner.store(UNOWNED, Ordering::Release);
        self.lock_count.store(0, Ordering::Release);
    }

    /// 天花板优先级
    pub fn ceiling(&self) -> Option<Priority> {
        self.ceiling
    }

    /// 当前持有者
    pub fn owner(&self) -> Option<TaskHandle> {
        TaskHandle::new(self.owner.load(Ordering::Acquire))
    }

    /// 递归计数
    pub fn lock_count(&self) -> u32 {
        self.lock_count.load(Ordering::Acquire)
    }

    pub fn is_locked(&self) -> bool {
        self.owner.load(Ordering::Acquire) != UNOWNED
    }

    /// 等待的任务数量
    pub fn waiter_count<S: Scheduler + ?Sized>(&self, sched: &S) -> usize {
        let _cs = CriticalSection::enter(sched);
        self.waiters.len()
    }

    pub(crate) fn holder_item(&self) -> &HolderItem {
        &self.holder
    }

    /// 获取互斥锁
    ///
    /// # 参数
    /// * `sched` - 调度器
    /// * `ticks` - 最长等待滴答数，`0` 不等待，`MAX_DELAY` 永久等待
    ///
    /// # 返回
    /// * `Ok(())` - 获取成功（天花板提升已完成）
    /// * `Err(Errno::TryAgain)` - 调度器已挂起但请求了等待
    /// * `Err(Errno::TimedOut)` - 等待超时
    /// * `Err(Errno::ValueOverflow)` - 递归层数过多
    pub fn take<S: Scheduler + ?Sized>(&'static self, sched: &S, ticks: Tick) -> Result<(), Errno> {
        let current = sched.current();

        // 调度器挂起时无法切换任务，不能阻塞
        if ticks != 0 && sched.is_suspended() {
            log::warn!("lw_mutex: {:?} take with scheduler suspended", current);
            return Err(Errno::TryAgain);
        }

        let start = sched.tick_count();

        loop {
            match self.owner.compare_exchange(
                UNOWNED,
                current.as_usize(),
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    let _cs = CriticalSection::enter(sched);
                    self.lock_count.store(1, Ordering::Relaxed);
                    // SAFETY: 在临界区内，current 刚成为持有者
                    unsafe { ceiling::inherit(sched, self, current) };
                    return Ok(());
                }
                Err(holder) if holder == current.as_usize() => {
                    return self.relock();
                }
                Err(_) => {}
            }

            let cs = CriticalSection::enter(sched);

            // 在临界区内重新检查，避免和 give 交错
            if self.owner.load(Ordering::Acquire) == UNOWNED {
                drop(cs);
                continue;
            }

            let remaining = if ticks == MAX_DELAY {
                MAX_DELAY
            } else {
                let elapsed = sched.tick_count().wrapping_sub(start);
                if elapsed >= ticks {
                    return Err(Errno::TimedOut);
                }
                ticks - elapsed
            };

            let waiter = Waiter::new(current);
            let priority = sched.priority(current);
            // SAFETY: 在临界区内；waiter 在 finish_wait 之前一直在本栈帧中
            unsafe { self.waiters.prepare_to_wait(sched, &waiter, priority, remaining) };
            drop(cs);

            sched.yield_cpu();

            let cs = CriticalSection::enter(sched);
            // SAFETY: 在临界区内
            let granted = unsafe { self.waiters.finish_wait(&waiter) };
            drop(cs);

            if granted {
                // give 已经完成了所有权转交和天花板提升
                #[cfg(feature = "debug_log")]
                log::trace!("lw_mutex: {:?} woken as owner", current);
                return Ok(());
            }
        }
    }

    /// 尝试获取互斥锁，不等待
    pub fn try_take<S: Scheduler + ?Sized>(&'static self, sched: &S) -> Result<(), Errno> {
        self.take(sched, 0)
    }

    /// 持有者再次加锁
    fn relock(&self) -> Result<(), Errno> {
        let count = self.lock_count.load(Ordering::Relaxed);
        if count >= MAX_LOCK_COUNT {
            return Err(Errno::ValueOverflow);
        }
        self.lock_count.store(count + 1, Ordering::Relaxed);
        Ok(())
    }

    /// 释放互斥锁
    ///
    /// 递归计数归零时恢复优先级，并把所有权直接转交给最高优先级的等待者。
    ///
    /// # 返回
    /// * `Ok(())` - 释放成功
    /// * `Err(Errno::TryAgain)` - 调度器已挂起
    /// * `Err(Errno::InvalidArgument)` - 互斥锁未加锁
    /// * `Err(Errno::OperationNotPermitted)` - 调用者不是持有者
    ///
    /// # Panics
    /// 持有者字段被其他任务改写（一致性被破坏）
    pub fn give<S: Scheduler + ?Sized>(&'static self, sched: &S) -> Result<(), Errno> {
        if sched.is_suspended() {
            return Err(Errno::TryAgain);
        }

        let current = sched.current();
        let _cs = CriticalSection::enter(sched);

        // 先看 owner：快速路径的 CAS 之后、写入 lock_count 之前，owner 已经
        // 是新持有者而计数仍为 0
        let owner = self.owner.load(Ordering::Acquire);
        if owner == UNOWNED {
            log::warn!("lw_mutex: {:?} give on unlocked mutex", current);
            return Err(Errno::InvalidArgument);
        }
        if owner != current.as_usize() {
            log::warn!("lw_mutex: {:?} give on mutex owned by {:?}", current, self.owner());
            return Err(Errno::OperationNotPermitted);
        }

        let count = self.lock_count.load(Ordering::Relaxed);
        debug_assert!(count > 0, "lw_mutex: owner set with zero lock count");

        if count > 1 {
            self.lock_count.store(count - 1, Ordering::Relaxed);
            return Ok(());
        }

        self.lock_count.store(0, Ordering::Relaxed);
        // SAFETY: 在临界区内，current 是持有者
        unsafe { ceiling::disinherit(sched, self, current) };

        // SAFETY: 在临界区内
        let next = unsafe { self.waiters.grant_highest() };
        let new_owner = next.map_or(UNOWNED, TaskHandle::as_usize);

        // 所有权直接从 current 交给 next，中间不会出现可被抢占的空闲状态
        if self
            .owner
            .compare_exchange(current.as_usize(), new_owner, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            panic!("lw_mutex: owner changed while held by {:?}", current);
        }

        if let Some(next) = next {
            self.lock_count.store(1, Ordering::Relaxed);
            // SAFETY: 在临界区内，next 刚成为持有者
            unsafe { ceiling::inherit(sched, self, next) };
            sched.wake_up(next);

            #[cfg(feature = "debug_log")]
            log::trace!("lw_mutex: handoff {:?} -> {:?}", current, next);
        }

        Ok(())
    }

    /// 获取互斥锁，返回 RAII 守护（永久等待）
    pub fn lock<'a, S: Scheduler + ?Sized>(
        &'static self,
        sched: &'a S,
    ) -> Result<LwMutexGuard<'a, S>, Errno> {
        self.take(sched, MAX_DELAY)?;
        Ok(LwMutexGuard { mutex: self, sched })
    }

    /// 把持有链表节点从所在链表中摘除，不调整优先级
    ///
    /// 供调度器在删除持有锁的任务时使用。
    pub fn remove_holder_item<S: Scheduler + ?Sized>(&self, sched: &S) {
        let _cs = CriticalSection::enter(sched);
        // SAFETY: 在临界区内
        unsafe { ceiling::unlink(self) };
    }

    /// 按顺序遍历等待的任务及其排队优先级
    pub fn for_each_waiter<S, F>(&self, sched: &S, f: F)
    where
        S: Scheduler + ?Sized,
        F: FnMut(TaskHandle, Priority),
    {
        let _cs = CriticalSection::enter(sched);
        // SAFETY: 在临界区内
        unsafe { self.waiters.for_each(f) };
    }
}

impl Default for LwMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// 互斥锁守护（RAII）
///
/// 离开作用域时自动释放锁
///
/// # 示例
/// ```no_run
/// # use lwmutex::sync::LwMutex;
/// # use lwmutex::sched::Scheduler;
/// static LOCK: LwMutex = LwMutex::new();
///
/// fn work(sched: &dyn Scheduler) {
///     let _guard = LOCK.lock(sched).unwrap();
///     // ... 临界区 ...
/// } // 自动释放锁
/// ```
pub struct LwMutexGuard<'a, S: Scheduler + ?Sized> {
    mutex: &'static LwMutex,
    sched: &'a S,
}

impl<S: Scheduler + ?Sized> LwMutexGuard<'_, S> {
    pub fn mutex(&self) -> &'static LwMutex {
        self.mutex
    }
}

impl<S: Scheduler + ?Sized> Drop for LwMutexGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(err) = self.mutex.give(self.sched) {
            log::warn!("lw_mutex: guard release failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mock::{leak, MockScheduler};

    #[test]
    fn test_give_during_fast_path_window() {
        let sched = MockScheduler::new(&[1, 1]);
        let mutex = leak(LwMutex::new());

        // 快速路径 CAS 已经成功，lock_count 还没写入
        mutex.owner.store(sched.task(1).as_usize(), Ordering::Release);

        sched.run_as(2);
        assert_eq!(mutex.give(sched), Err(Errno::OperationNotPermitted));
        assert_eq!(mutex.owner(), Some(sched.task(1)));
        assert_eq!(mutex.lock_count(), 0);

        mutex.lock_count.store(1, Ordering::Relaxed);
        sched.run_as(1);
        assert_eq!(mutex.give(sched), Ok(()));
        assert!(!mutex.is_locked());
    }
}

//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 互斥锁等待队列
//!
//! 和 Linux 的等待队列 (include/linux/wait.h) 用法一致：
//! - prepare_to_wait(): 在临界区内入队并标记阻塞
//! - yield_cpu(): 离开临界区后让出 CPU
//! - finish_wait(): 醒来后在临界区内出队
//!
//! 不同之处：
//! - 按任务优先级排序（高优先级在前），相同优先级 FIFO
//! - 释放锁时直接把所有权交给队首任务，并在节点上做标记
//! - 入队后不因优先级变化重新排序

use core::cell::Cell;

use crate::list::{ListItem, SortedList};
use crate::sched::{Priority, Scheduler, TaskHandle, Tick};

/// 等待者信息
pub struct WaitToken {
    /// 等待的任务
    task: TaskHandle,
    /// 是否已经被转交所有权
    granted: Cell<bool>,
}

impl WaitToken {
    pub fn task(&self) -> TaskHandle {
        self.task
    }

    pub fn is_granted(&self) -> bool {
        self.granted.get()
    }
}

/// 等待队列项
///
/// 位于等待任务的栈上，只在一次阻塞期间挂在队列中。
pub struct Waiter {
    item: ListItem<WaitToken>,
}

impl Waiter {
    pub fn new(task: TaskHandle) -> Self {
        Self {
            item: ListItem::new(WaitToken {
                task,
                granted: Cell::new(false),
            }),
        }
    }

    pub fn task(&self) -> TaskHandle {
        self.item.owner().task()
    }

    pub fn is_queued(&self) -> bool {
        self.item.is_linked()
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        // 节点在栈上，销毁前必须已经出队
        debug_assert!(!self.item.is_linked(), "Waiter dropped while queued");
    }
}

/// 等待队列头
pub struct WaitQueue {
    list: SortedList<WaitToken>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            list: SortedList::new(),
        }
    }

    /// 等待的任务数量
    ///
    /// 需要在临界区内读取才准确
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// 队首等待者的优先级
    pub fn highest_priority(&self) -> Option<Priority> {
        self.list.head_value()
    }

    /// 入队并把当前任务标记为阻塞
    ///
    /// # Safety
    /// - 调用者处于临界区内
    /// - `waiter` 未入队，并且在 `finish_wait()` 之前不会移动或销毁
    pub unsafe fn prepare_to_wait<S: Scheduler + ?Sized>(
        &self,
        sched: &S,
        waiter: &Waiter,
        priority: Priority,
        ticks: Tick,
    ) {
        waiter.item.owner().granted.set(false);
        waiter.item.set_value(priority);
        self.list.insert(&waiter.item);
        sched.block_current(ticks);

        #[cfg(feature = "debug_log")]
        log::trace!(
            "wait_queue: {:?} queued at priority {} ({} waiting)",
            waiter.task(),
            priority,
            self.list.len()
        );
    }

    /// 醒来后出队
    ///
    /// 返回是否已经被转交所有权。超时和虚假唤醒时节点仍在队列中，这里摘除；
    /// 被转交时节点已经由 `grant_highest()` 摘除。
    ///
    /// # Safety
    /// 调用者处于临界区内
    pub unsafe fn finish_wait(&self, waiter: &Waiter) -> bool {
        if waiter.item.is_linked_to(&self.list) {
            self.list.remove(&waiter.item);
        }
        waiter.item.owner().is_granted()
    }

    /// 摘下最高优先级的等待者并标记为已转交
    ///
    /// # Safety
    /// 调用者处于临界区内
    pub unsafe fn grant_highest(&self) -> Option<TaskHandle> {
        let item = self.list.pop_front()?;
        let token = item.owner();
        token.granted.set(true);
        Some(token.task())
    }

    /// 按顺序遍历等待的任务
    ///
    /// # Safety
    /// 调用者处于临界区内
    pub unsafe fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(TaskHandle, Priority),
    {
        self.list.for_each(|item| f(item.owner().task(), item.value()));
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::{CriticalSection, MAX_DELAY};
    use crate::tests::mock::MockScheduler;

    #[test]
    fn test_wait_queue_grant_order() {
        let sched = MockScheduler::new(&[1, 1]);
        sched.run_as(1);
        let queue = WaitQueue::new();
        let low = Waiter::new(sched.task(1));
        let high = Waiter::new(sched.task(2));

        let _cs = CriticalSection::enter(sched);
        unsafe {
            queue.prepare_to_wait(sched, &low, 3, MAX_DELAY);
            queue.prepare_to_wait(sched, &high, 5, MAX_DELAY);
        }
        assert!(low.is_queued());
        assert!(high.is_queued());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.highest_priority(), Some(5));

        let granted = unsafe { queue.grant_highest() };
        assert_eq!(granted, Some(sched.task(2)));
        assert!(!high.is_queued());
        assert_eq!(queue.highest_priority(), Some(3));

        // 被转交的等待者已经出队，未转交的由 finish_wait 摘除
        assert!(unsafe { queue.finish_wait(&high) });
        assert!(!unsafe { queue.finish_wait(&low) });
        assert!(!low.is_queued());
        assert!(queue.is_empty());
        assert_eq!(queue.highest_priority(), None);
    }

    #[test]
    fn test_waiter_requeue_clears_grant() {
        let sched = MockScheduler::new(&[1]);
        sched.run_as(1);
        let queue = WaitQueue::new();
        let waiter = Waiter::new(sched.task(1));

        let _cs = CriticalSection::enter(sched);
        unsafe {
            queue.prepare_to_wait(sched, &waiter, 2, 10);
            assert_eq!(queue.grant_highest(), Some(sched.task(1)));
            assert!(queue.finish_wait(&waiter));

            queue.prepare_to_wait(sched, &waiter, 2, 10);
            assert!(waiter.is_queued());
            assert!(!queue.finish_wait(&waiter));
        }
        assert!(!waiter.is_queued());
    }
}

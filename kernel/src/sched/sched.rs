//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器回调
//!
//! 由使用本 crate 的内核实现。所有方法都可能在临界区内被调用，
//! 除了 `yield_cpu()`。

use super::task::{Priority, TaskHandle, Tick};
use crate::sync::HolderList;

/// 互斥锁所需的调度器能力
///
/// 对象安全，可以通过 `&'static dyn Scheduler` 注册给 C 接口。
pub trait Scheduler: Sync {
    /// 当前正在运行的任务
    fn current(&self) -> TaskHandle;

    /// 当前滴答计数，允许回绕
    fn tick_count(&self) -> Tick;

    /// 调度器是否已挂起（此时无法切换任务）
    fn is_suspended(&self) -> bool;

    /// 进入临界区，可以嵌套
    fn enter_critical(&self);

    /// 离开临界区
    fn exit_critical(&self);

    /// 把当前任务标记为阻塞
    ///
    /// 在临界区内调用。任务在 `wake_up()` 或经过 `ticks` 个滴答后恢复就绪，
    /// `ticks == MAX_DELAY` 表示永不超时。在随后的 `yield_cpu()` 之前到达的
    /// `wake_up()` 不能丢失。
    fn block_current(&self, ticks: Tick);

    /// 唤醒被阻塞的任务，任务未阻塞时什么也不做
    fn wake_up(&self, task: TaskHandle);

    /// 让出 CPU
    ///
    /// 可能因为唤醒、超时或者虚假唤醒而返回，调用者必须重新检查条件。
    fn yield_cpu(&self);

    /// 任务当前（有效）优先级
    fn priority(&self, task: TaskHandle) -> Priority;

    /// 任务的基础优先级，不受天花板提升影响
    fn base_priority(&self, task: TaskHandle) -> Priority;

    /// 设置任务的有效优先级
    fn set_priority(&self, task: TaskHandle, priority: Priority);

    /// 任务 TCB 中的持有链表
    fn holder_list(&self, task: TaskHandle) -> &HolderList;
}

/// 临界区守护（RAII）
///
/// 离开作用域时自动退出临界区，提前返回也不会漏掉。
pub struct CriticalSection<'a, S: Scheduler + ?Sized> {
    sched: &'a S,
}

impl<'a, S: Scheduler + ?Sized> CriticalSection<'a, S> {
    /// 进入临界区
    #[inline]
    pub fn enter(sched: &'a S) -> Self {
        sched.enter_critical();
        Self { sched }
    }
}

impl<S: Scheduler + ?Sized> Drop for CriticalSection<'_, S> {
    #[inline]
    fn drop(&mut self) {
        self.sched.exit_critical();
    }
}

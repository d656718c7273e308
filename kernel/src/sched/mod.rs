//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器接口
//!
//! 互斥锁本身不实现调度器，只通过 [`Scheduler`] 使用下面这些能力：
//! - 当前任务、滴答计数、调度器是否挂起
//! - 临界区（同时屏蔽其他任务和中断）
//! - 阻塞 / 唤醒 / 让出 CPU
//! - 读写任务优先级，以及任务 TCB 中的持有链表
//!
//! 阻塞流程和 Linux 的 prepare_to_wait() / schedule() / finish_wait() 一致：
//! 在临界区内把任务挂到等待队列并标记为阻塞，离开临界区后再调用
//! `yield_cpu()` 真正切换。

pub mod sched;
pub mod task;

pub use sched::{CriticalSection, Scheduler};
pub use task::{ms_to_ticks, Priority, TaskHandle, Tick, MAX_DELAY, MAX_PRIORITY};

//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Rux 轻量级互斥锁
//!
//! 面向抢占式优先级调度器的可重入互斥锁：
//! - 无竞争时一次 CAS 完成加锁
//! - 竞争时按优先级排队阻塞，支持超时
//! - 优先级天花板协议 (ICPP) 限制优先级反转
//!
//! 调度器通过 [`sched::Scheduler`] 接入。

#![cfg_attr(not(test), no_std)]

extern crate log;

pub mod config;
pub mod errno;
pub mod list;
pub mod sched;
pub mod sync;

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(test)]
mod tests;

pub use errno::Errno;
pub use sched::{Priority, Scheduler, TaskHandle, Tick, MAX_DELAY};
pub use sync::{HolderList, LwMutex, LwMutexGuard};

/// 应用配置中的日志级别
///
/// 日志输出由内核自己的 `log::Log` 实现负责，这里只设置最大级别。
pub fn init() {
    log::set_max_level(config::LOG_LEVEL);
    log::info!(
        "{} {}: max priorities {}, max lock count {}",
        config::KERNEL_NAME,
        config::KERNEL_VERSION,
        config::MAX_PRIORITIES,
        config::MAX_LOCK_COUNT
    );
}

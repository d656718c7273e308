//! 单元测试模块
//!
//! 在主机上运行，使用 `mock::MockScheduler` 模拟调度器：
//! ```bash
//! cargo test --package lwmutex
//! cargo test --package lwmutex --features ffi
//! ```
//!
//! - `reentrancy` - 快速路径与递归加锁
//! - `misuse` - 误用返回错误且不改变状态
//! - `ceiling` - 优先级天花板的提升与恢复
//! - `handoff` - 按优先级转交所有权、互斥性
//! - `timeout` - 超时与永久等待


mod misuse;
mod reentrancy;

#[cfg(feature = "ffi")]
mod ffi;

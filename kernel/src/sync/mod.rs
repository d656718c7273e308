//! 同步原语 (Synchronization Primitives)
//!
//! - `lw_mutex` - 轻量级可重入互斥锁
//! - `ceiling` - 优先级天花板协议
//! - `wait_queue` - 按优先级排序的等待队列
//!
//! 核心概念：
//! - 无竞争时加锁只需要一次 CAS
//! - 竞争时阻塞在等待队列上，释放时按优先级转交所有权
//! - 天花板互斥锁在持有期间把持有者提升到天花板优先级，限制优先级反转

pub mod ceiling;
pub mod lw_mutex;
pub mod wait_queue;

pub use ceiling::HolderList;
pub use lw_mutex::{LwMutex, LwMutexGuard};
pub use wait_queue::{WaitQueue, Waiter};

//! lwmutex 配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 名称
pub const KERNEL_NAME: &str = "lwmutex";

/// 版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// 调度器配置
// ============================================================

/// 优先级数量（合法优先级为 0..MAX_PRIORITIES）
pub const MAX_PRIORITIES: u32 = 32;

/// 永久等待
pub const MAX_DELAY: u32 = 4294967295;

/// 每秒滴答数
pub const TICK_RATE_HZ: u32 = 1000;

// ============================================================
// 互斥锁配置
// ============================================================

/// 递归加锁的最大深度
pub const MAX_LOCK_COUNT: u32 = 65535;

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

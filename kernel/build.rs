//! lwmutex 构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml（或 menuconfig 生成的 build/.config）
//! 2. 生成 src/config.rs
//! 3. 导出 cargo 环境变量

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct KernelConfig {
    #[serde(default)]
    general: General,
    #[serde(default)]
    scheduler: SchedulerConfig,
    #[serde(default)]
    mutex: MutexConfig,
    #[serde(default)]
    debug: DebugConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct General {
    name: String,
    version: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            name: "lwmutex".to_string(),
            version: "0.1.0".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SchedulerConfig {
    max_priorities: u32,
    max_delay: u32,
    tick_rate_hz: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_priorities: 32,
            max_delay: u32::MAX,
            tick_rate_hz: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MutexConfig {
    max_lock_count: u32,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self { max_lock_count: 65535 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DebugConfig {
    log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

/// 解析 build/.config 文件（简单 section_key=value 格式）
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, toml::map::Map<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // 跳过注释和空行
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        // 使用第一个下划线分割 section 和 key
        let Some((section, config_key)) = key.trim().split_once('_') else {
            continue;
        };

        let value = value.trim().trim_matches('"');
        let parsed_value = if value == "true" {
            toml::Value::Boolean(true)
        } else if value == "false" {
            toml::Value::Boolean(false)
        } else if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else {
            toml::Value::String(value.to_string())
        };

        sections
            .entry(section.to_string())
            .or_default()
            .insert(config_key.to_string(), parsed_value);
    }

    let mut root_map = toml::map::Map::new();
    for (section_name, section_data) in sections {
        root_map.insert(section_name, toml::Value::Table(section_data));
    }
    toml::Value::Table(root_map)
}

fn load_config(workspace_dir: &Path) -> KernelConfig {
    let dot_config = workspace_dir.join("build/.config");
    let kernel_toml = workspace_dir.join("Kernel.toml");

    if let Ok(content) = fs::read_to_string(&dot_config) {
        println!("cargo:warning=Using build/.config configuration");
        return parse_dot_config(&content)
            .try_into()
            .expect("build/.config 解析失败");
    }

    match fs::read_to_string(&kernel_toml) {
        Ok(content) => toml::from_str(&content).expect("Kernel.toml 解析失败"),
        // 没有配置文件时使用默认值，便于单独构建本 crate
        Err(_) => toml::from_str("").expect("默认配置解析失败"),
    }
}

fn log_level_filter(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "off" => "Off",
        "error" => "Error",
        "warn" => "Warn",
        "debug" => "Debug",
        "trace" => "Trace",
        _ => "Info",
    }
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let workspace_dir = manifest_dir.join("..");

    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");
    println!("cargo:rerun-if-changed=build.rs");

    let config = load_config(&workspace_dir);

    assert!(
        config.scheduler.max_priorities > 0,
        "scheduler.max_priorities 必须大于 0"
    );
    assert!(
        config.mutex.max_lock_count > 0,
        "mutex.max_lock_count 必须大于 0"
    );

    println!("cargo:rustc-env=CARGO_KERNEL_NAME={}", config.general.name);
    println!("cargo:rustc-env=CARGO_KERNEL_VERSION={}", config.general.version);
    println!("cargo:rustc-env=LWMUTEX_LOG_LEVEL={}", config.debug.log_level);

    generate_config_code(&manifest_dir, &config);
}

fn generate_config_code(manifest_dir: &Path, config: &KernelConfig) {
    let config_code = format!(
        r#"//! lwmutex 配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 名称
pub const KERNEL_NAME: &str = "{}";

/// 版本
pub const KERNEL_VERSION: &str = "{}";

// ============================================================
// 调度器配置
// ============================================================

/// 优先级数量（合法优先级为 0..MAX_PRIORITIES）
pub const MAX_PRIORITIES: u32 = {};

/// 永久等待
pub const MAX_DELAY: u32 = {};

/// 每秒滴答数
pub const TICK_RATE_HZ: u32 = {};

// ============================================================
// 互斥锁配置
// ============================================================

/// 递归加锁的最大深度
pub const MAX_LOCK_COUNT: u32 = {};

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::{};
"#,
        config.general.name,
        config.general.version,
        config.scheduler.max_priorities,
        config.scheduler.max_delay,
        config.scheduler.tick_rate_hz,
        config.mutex.max_lock_count,
        log_level_filter(&config.debug.log_level),
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_code {
        fs::write(&config_file, &config_code).expect("写入配置文件失败");
    }
}

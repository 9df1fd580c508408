//! Logging Module - 统一的日志系统
//!
//! 本模块提供基于tracing框架的统一日志系统，支持：
//! - 日志输出到系统临时目录
//! - 日志文件按天轮转和数量上限
//! - 结构化日志记录
//!
//! # Examples
//!
//! ```no_run
//! use shared_utils::logging::{LogConfig, init_logging};
//! use tracing::{info, error};
//!
//! // 初始化日志系统
//! let config = LogConfig::default();
//! init_logging("my_program", config).expect("Failed to initialize logging");
//!
//! // 使用tracing宏记录日志
//! info!("Program started");
//! error!(error = "something went wrong", "Operation failed");
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志目录路径（默认为系统临时目录）
    pub log_dir: PathBuf,
    /// 单个日志文件最大大小（字节），默认100MB
    pub max_file_size: u64,
    /// 保留的最大日志文件数量，默认5个
    pub max_files: usize,
    /// 日志级别，默认Info
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: std::env::temp_dir(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_files: 5,
            level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// 创建新的日志配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志目录
    pub fn with_log_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.log_dir = dir.as_ref().to_path_buf();
        self
    }

    /// 设置最大文件大小
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// 设置最大文件数量
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

/// 初始化日志系统
///
/// 此函数设置tracing-subscriber，将日志输出到系统临时目录中的文件。
/// 日志文件命名格式：`{program_name}.log`
///
/// # Arguments
///
/// * `program_name` - 程序名称，用于日志文件命名
/// * `config` - 日志配置
///
/// # Returns
///
/// 成功返回Ok(())，失败返回错误信息
///
/// # Examples
///
/// ```no_run
/// use shared_utils::logging::{LogConfig, init_logging};
///
/// let config = LogConfig::default();
/// init_logging("heic_merge", config).expect("Failed to init logging");
/// ```
pub fn init_logging(program_name: &str, config: LogConfig) -> Result<()> {
    // 确保日志目录存在
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;

    // 创建日志文件名
    let log_file_name = format!("{}.log", program_name);

    // 创建文件appender，使用每日轮转
    // 注意：RollingFileAppender基于时间轮转（daily），不是基于文件大小
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, &log_file_name);

    // 创建环境过滤器
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", program_name, config.level)));

    // 创建格式化层（输出到文件）
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false) // 文件中不使用ANSI颜色代码
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // 创建格式化层（输出到stderr）
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true) // stderr使用颜色
        .with_target(false)
        .with_line_number(false);

    // 组合所有层并初始化
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // 记录日志系统初始化信息
    tracing::info!(
        program = program_name,
        log_dir = ?config.log_dir,
        log_file = log_file_name,
        max_files = config.max_files,
        level = ?config.level,
        "Logging system initialized"
    );

    // 清理旧日志文件（保留最近N个）
    cleanup_old_logs(&config.log_dir, program_name, config.max_files)?;

    Ok(())
}

/// 清理旧的日志文件，只保留最近的N个
///
/// # Arguments
///
/// * `log_dir` - 日志目录
/// * `program_name` - 程序名称
/// * `max_files` - 保留的最大文件数
fn cleanup_old_logs(log_dir: &Path, program_name: &str, max_files: usize) -> Result<()> {
    use std::fs;

    // 读取日志目录中的所有文件
    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("Failed to read log directory: {:?}", log_dir))?;

    // 收集所有匹配的日志文件
    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        // 只处理文件（不处理目录）
        if !path.is_file() {
            continue;
        }

        // 检查文件名是否匹配程序名
        if let Some(file_name) = path.file_name() {
            let file_name_str = file_name.to_string_lossy();
            if file_name_str.starts_with(program_name) && file_name_str.ends_with(".log") {
                // 获取文件修改时间
                if let Ok(metadata) = fs::metadata(&path) {
                    if let Ok(modified) = metadata.modified() {
                        log_files.push((path, modified));
                    }
                }
            }
        }
    }

    // 如果文件数量超过限制，删除最旧的文件
    if log_files.len() > max_files {
        // 按修改时间排序（最新的在前）
        log_files.sort_by(|a, b| b.1.cmp(&a.1));

        // 删除超出限制的文件
        for (path, _) in log_files.iter().skip(max_files) {
            if let Err(e) = fs::remove_file(path) {
                tracing::warn!(
                    path = ?path,
                    error = %e,
                    "Failed to remove old log file"
                );
            } else {
                tracing::debug!(
                    path = ?path,
                    "Removed old log file"
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.max_file_size, 100 * 1024 * 1024);
        assert_eq!(config.max_files, 5);
        assert_eq!(config.level, Level::INFO);
    }

    #[test]
    fn test_log_config_builder() {
        let temp_dir = TempDir::new().unwrap();
        let config = LogConfig::new()
            .with_log_dir(temp_dir.path())
            .with_max_file_size(50 * 1024 * 1024)
            .with_max_files(3)
            .with_level(Level::DEBUG);

        assert_eq!(config.log_dir, temp_dir.path());
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.max_files, 3);
        assert_eq!(config.level, Level::DEBUG);
    }

    #[test]
    fn test_init_logging_creates_log_file() {
        let temp_dir = TempDir::new().unwrap();
        let _config = LogConfig::new().with_log_dir(temp_dir.path());

        // 注意：init_logging只能调用一次，因为它会初始化全局subscriber
        // 在测试中，我们只测试配置创建，不实际初始化
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_cleanup_old_logs() {
        let temp_dir = TempDir::new().unwrap();
        let program_name = "test_program";

        // 创建多个测试日志文件
        for i in 0..10 {
            let file_path = temp_dir.path().join(format!("{}.{}.log", program_name, i));
            fs::write(&file_path, format!("log content {}", i)).unwrap();
            // 等待一小段时间，确保文件修改时间不同
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        // 清理，只保留3个最新的
        cleanup_old_logs(temp_dir.path(), program_name, 3).unwrap();

        // 检查剩余文件数量
        let remaining_files: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(program_name))
            .collect();

        assert_eq!(remaining_files.len(), 3);
    }

    #[test]
    fn test_cleanup_ignores_other_programs() {
        let temp_dir = TempDir::new().unwrap();

        fs::write(temp_dir.path().join("heic_merge.log"), "a").unwrap();
        fs::write(temp_dir.path().join("other_tool.log"), "b").unwrap();

        cleanup_old_logs(temp_dir.path(), "heic_merge", 1).unwrap();

        // 两个文件都应保留：heic_merge.log在上限内，other_tool.log不匹配
        assert!(temp_dir.path().join("heic_merge.log").exists());
        assert!(temp_dir.path().join("other_tool.log").exists());
    }
}

//! 日志初始化
//!
//! 容器本身只发出 `tracing` 事件：注册、别名与装饰为 `debug`，每次解析为 `trace`。
//! 这里提供按环境预设的订阅者配置，供应用和基准测试使用。

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 日志环境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingEnvironment {
    Development,
    Testing,
    Production,
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 多行，适合跟踪解析链
    Pretty,
    /// 单行
    Compact,
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub environment: LoggingEnvironment,
    /// 本 crate 事件的最低级别；设置了 `RUST_LOG` 时以其为准
    pub level: Level,
    pub format: LogFormat,
    pub show_target: bool,
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(LoggingEnvironment::Development)
    }
}

impl LoggingConfig {
    /// 按环境选择预设
    pub fn for_environment(environment: LoggingEnvironment) -> Self {
        match environment {
            LoggingEnvironment::Development => Self::development(),
            LoggingEnvironment::Testing => Self::testing(),
            LoggingEnvironment::Production => Self::production(),
        }
    }

    /// 输出每次解析（`trace`），并显示线程以便观察并发创建
    pub fn development() -> Self {
        Self {
            environment: LoggingEnvironment::Development,
            level: Level::TRACE,
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: true,
        }
    }

    pub fn testing() -> Self {
        Self {
            environment: LoggingEnvironment::Testing,
            level: Level::ERROR,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 只保留校验失败与错误
    pub fn production() -> Self {
        Self {
            environment: LoggingEnvironment::Production,
            level: Level::WARN,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 默认过滤指令，只作用于本 crate 的事件
    pub fn directive(&self) -> String {
        format!(
            "{}={}",
            env!("CARGO_CRATE_NAME"),
            self.level.as_str().to_lowercase()
        )
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }
}

/// 安装全局订阅者；已经安装过时返回错误
///
/// ```
/// use di_compose::logging::{init_logging, LoggingConfig};
///
/// init_logging(LoggingConfig::testing()).expect("first subscriber");
/// assert!(init_logging(LoggingConfig::testing()).is_err());
/// ```
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let layer = fmt::layer()
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_ansi(config.environment != LoggingEnvironment::Production);

    let layer = match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(config.env_filter())
        .try_init()?;

    tracing::debug!(
        environment = ?config.environment,
        filter = %config.directive(),
        "Container logging initialized"
    );

    Ok(())
}

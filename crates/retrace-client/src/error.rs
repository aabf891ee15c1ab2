//! 客户端层错误类型定义

use std::io;
use thiserror::Error;

/// 收敛循环错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// 在到达目标前用完了轮询策略的迭代或时间上限。
    /// 执行器已停止。
    #[error("Convergence bound exhausted after {iterations} iteration(s), last reading {last_reading}")]
    Exhausted { iterations: u64, last_reading: i32 },
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 没有该名称的 routine 槽位
    #[error("Unknown routine: {0}")]
    UnknownRoutine(String),
}

//! # Retrace SDK
//!
//! 竞赛机器人的电机与传感器控制及闭环原语，
//! 以及操作员驾驶过程的确定性录制与回放。
//!
//! # 分层
//!
//! 自底向上：
//!
//! - **Protocol** (`protocol`): 端口范围、速度限制、样本编解码
//! - **HAL** (`hal`): [`Hardware`] trait，启用 `mock` feature 时还有
//!   内存实现
//! - **Driver** (`driver`): [`Motor`], [`MotorSystem`], [`Sensor`], [`SensorSystem`]
//! - **Client** (`client`): 收敛控制、录制与回放、
//!   配置、[`RobotContext`]
//!
//! # 快速开始
//!
//! ```rust
//! use retrace_sdk::prelude::*;
//! ```

pub use retrace_client as client;
pub use retrace_driver as driver;
pub use retrace_hal as hal;
pub use retrace_protocol as protocol;

pub mod prelude;

pub use client::{
    ConfigError, ControlError, ConvergenceExt, PollPolicy, Proportional, RetraceConfig,
    RobotContext, SessionOutcome, SessionReport, StopRule,
};
pub use driver::{DriverError, Motor, MotorSystem, Sensor, SensorKind, SensorSystem};
pub use hal::{HalError, Hardware};
pub use protocol::ProtocolError;

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` 未设置时使用的过滤器
pub const DEFAULT_LOG_FILTER: &str = "retrace=info";

/// 安装 `tracing` subscriber 并将 `log` 记录转发给它。
///
/// 过滤器取自 `RUST_LOG`，未设置时回退到 [`DEFAULT_LOG_FILTER`]。
/// 重复调用无害；只有第一次调用
/// 会安装。
pub fn init_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // 应用可能已经安装了自己的 logger
    let _ = tracing_log::LogTracer::init();

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        init_logger();
        init_logger();
        tracing::info!("logger initialised");
    }
}

//! 驱动层错误类型定义

use retrace_hal::HalError;
use retrace_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// 端口校验或编解码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 硬件拒绝分配资源
    #[error("HAL error: {0}")]
    Hal(#[from] HalError),

    /// 端口数量与传感器类型不符
    #[error("{kind} takes {expected} port(s), got {actual}")]
    PortCount {
        kind: crate::SensorKind,
        expected: usize,
        actual: usize,
    },
}

//! # Retrace 协议层
//!
//! 与硬件无关的定义，供 retrace 各层共用。
//!
//! ## 模块
//!
//! - `constants`: 通道数量、速度上限和采样周期
//! - `ports`: 经过校验的端口类型，每类端口一个
//! - `sample`: 定宽文本录制格式的编解码
//!
//! 本 crate 不访问硬件。HAL 层和驱动层基于这些类型构建，
//! 越界端口不可能到达硬件调用。

pub mod constants;
pub mod ports;
pub mod sample;

pub use constants::*;
pub use ports::{ActuatorPort, AnalogPort, DigitalPort, I2cPort, PortClass};
pub use sample::{Sample, SampleReader};

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid {class} port: {port} (valid range {min}..={max})")]
    InvalidPort {
        class: PortClass,
        port: i32,
        min: i32,
        max: i32,
    },

    #[error("Invalid sample length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid digit 0x{byte:02X} at offset {offset}")]
    InvalidDigit { offset: usize, byte: u8 },

    #[error("Actuator field {channel} out of range: offset {offset} > {max}")]
    ActuatorOutOfRange { channel: usize, offset: u8, max: u8 },
}

/// 将速度限制在 `[-MAX_VELOCITY, MAX_VELOCITY]` 内。
///
/// 所有写入执行器的速度都经过这里，无论来自单个电机、
/// 电机组还是比例控制器。
pub fn clamp_velocity(velocity: i32) -> i32 {
    velocity.clamp(-MAX_VELOCITY, MAX_VELOCITY)
}

//! # Retrace 硬件抽象层
//!
//! 上层只通过 [`Hardware`] trait 访问机器人。它对应控制器的通道模型：
//! 10 个执行器端口、12 个数字端口、8 个模拟端口和 10 个 I2C 编码器槽位，
//! 以及建立在其上的编码器、测距仪和陀螺仪驱动。
//!
//! 所有方法都接受 `&self`，内部可变性由实现自行管理。
//! 同一个硬件句柄因此可以在电机组、它所收敛的传感器
//! 以及观察二者的录制器之间共享。
//!
//! 启用 `mock` feature 时还提供 [`mock::MockHardware`]，
//! 一个带虚拟时钟的内存实现。

use retrace_protocol::{ActuatorPort, AnalogPort, DigitalPort, I2cPort};
use std::time::Duration;
use thiserror::Error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use retrace_protocol as protocol;

/// HAL 层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),
}

/// 数字端口方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    Input,
    Output,
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_handle!(
    /// 已获取的双线正交编码器句柄
    EncoderHandle
);
define_handle!(
    /// 已获取的超声波测距仪句柄
    UltrasonicHandle
);
define_handle!(
    /// 已获取的陀螺仪句柄
    GyroHandle
);

/// 机器人控制器的通道级访问
pub trait Hardware {
    /// 设置执行器输出，取值应在 `[-127, 127]` 内。
    fn motor_set(&self, port: ActuatorPort, value: i32);

    /// 执行器最近一次的指令值
    fn motor_get(&self, port: ActuatorPort) -> i32;

    /// 将所有执行器端口置零
    fn motor_stop_all(&self) {
        for port in ActuatorPort::all() {
            self.motor_set(port, 0);
        }
    }

    fn pin_mode(&self, port: DigitalPort, mode: PinMode);

    /// 将模拟端口配置为模拟输入
    fn analog_input(&self, port: AnalogPort);

    fn digital_read(&self, port: DigitalPort) -> bool;

    fn digital_write(&self, port: DigitalPort, level: bool);

    /// 原始模拟量，真实硬件上为 0..=4095
    fn analog_read(&self, port: AnalogPort) -> i32;

    fn encoder_init(
        &self,
        top: DigitalPort,
        bottom: DigitalPort,
        reversed: bool,
    ) -> Result<EncoderHandle, HalError>;

    /// 上次复位以来累计的计数
    fn encoder_get(&self, handle: EncoderHandle) -> i32;

    fn encoder_reset(&self, handle: EncoderHandle);

    /// 释放编码器，使其端口可以重新获取
    fn encoder_shutdown(&self, handle: EncoderHandle);

    fn ultrasonic_init(
        &self,
        echo: DigitalPort,
        ping: DigitalPort,
    ) -> Result<UltrasonicHandle, HalError>;

    /// 到最近物体的距离（厘米）
    fn ultrasonic_get(&self, handle: UltrasonicHandle) -> i32;

    /// 获取陀螺仪。倍率为 0 时使用默认标定。
    fn gyro_init(&self, port: AnalogPort, multiplier: i32) -> Result<GyroHandle, HalError>;

    /// 上次复位以来的航向角（度）
    fn gyro_get(&self, handle: GyroHandle) -> i32;

    fn gyro_reset(&self, handle: GyroHandle);

    /// 枚举 I2C 链上的集成电机编码器。
    ///
    /// 返回找到的编码器数量。
    fn ime_initialize_all(&self) -> usize;

    /// 集成编码器的计数，该槽位无应答时为 `None`
    fn ime_get(&self, port: I2cPort) -> Option<i32>;

    /// 将集成编码器清零，该槽位无应答时返回 `false`
    fn ime_reset(&self, port: I2cPort) -> bool;

    /// 挂起当前任务
    fn delay(&self, duration: Duration) {
        spin_sleep::sleep(duration);
    }

    /// 控制器启动以来的时间
    fn uptime(&self) -> Duration;
}

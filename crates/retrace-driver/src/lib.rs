//! # Retrace 驱动层
//!
//! 基于 [`Hardware`] 接口的强类型执行器与传感器对象：
//!
//! - [`Motor`]: 一个执行器端口，带极性和指令速度
//! - [`MotorSystem`]: 有序、端口唯一、统一驱动的一组电机
//! - [`Sensor`]: 按 [`SensorKind`] 解释的一个或两个输入端口
//! - [`SensorSystem`]: 读数为成员平均值的一组传感器
//!
//! 所有访问机器人的操作都以 `&dyn Hardware`（或任意 `H: Hardware + ?Sized`）
//! 传入硬件，对象本身从不持有它。
//!
//! # 示例
//!
//! ```
//! use retrace_driver::{Motor, MotorSystem};
//! use retrace_hal::mock::MockHardware;
//! use retrace_protocol::ActuatorPort;
//!
//! let hw = MockHardware::new();
//! let left = Motor::new(&hw, ActuatorPort::new(2).unwrap(), false);
//! let mut drive = MotorSystem::builder(4)
//!     .motor(left)
//!     .port(3, true)
//!     .port(42, false) // 丢弃：没有这个端口
//!     .build(&hw);
//!
//! drive.set_velocity(&hw, 80);
//! assert_eq!(drive.len(), 2);
//! assert_eq!(drive.build_report().invalid, 1);
//! ```

mod error;
mod motor;
mod motor_system;
mod sensor;
mod sensor_system;

pub use error::DriverError;
pub use motor::Motor;
pub use motor_system::{BuildReport, MotorSystem, MotorSystemBuilder};
pub use sensor::{Sensor, SensorBacking, SensorKind};
pub use sensor_system::{SensorSystem, SensorSystemBuilder};

pub use retrace_hal::Hardware;

/// 可以用速度驱动的对象
///
/// [`Motor`] 和 [`MotorSystem`] 实现了它；收敛循环基于此 trait 编写。
pub trait Actuator {
    /// 限幅、保存并写出速度
    fn set_velocity(&mut self, hw: &dyn Hardware, velocity: i32);

    /// 最近一次指令（限幅后）速度
    fn velocity(&self) -> i32;

    fn stop(&mut self, hw: &dyn Hardware) {
        self.set_velocity(hw, 0);
    }
}

/// 产生标量读数的对象
///
/// [`Sensor`] 和 [`SensorSystem`] 实现了它。
pub trait Reading {
    fn read(&self, hw: &dyn Hardware) -> i32;
}

//! 单个执行器

use crate::Actuator;
use retrace_hal::Hardware;
use retrace_protocol::{ActuatorPort, clamp_velocity};

/// 带极性的单个执行器端口
///
/// 反向电机输出到线上的值始终是 `-velocity`，否则是 `velocity`。
/// 切换极性不会写出；新符号在下一次 [`set_velocity`](Motor::set_velocity) 时生效。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motor {
    port: ActuatorPort,
    velocity: i32,
    reversed: bool,
}

impl Motor {
    /// 创建电机并向其端口写零。
    pub fn new(hw: &dyn Hardware, port: ActuatorPort, reversed: bool) -> Self {
        let mut motor = Self {
            port,
            velocity: 0,
            reversed,
        };
        motor.set_velocity(hw, 0);
        motor
    }

    /// 将 `velocity` 限制在 `[-127, 127]`，保存并写出。
    ///
    /// 每次调用都会写出，即使值没有变化。
    pub fn set_velocity(&mut self, hw: &dyn Hardware, velocity: i32) {
        self.velocity = clamp_velocity(velocity);
        hw.motor_set(self.port, self.output());
    }

    pub fn stop(&mut self, hw: &dyn Hardware) {
        self.set_velocity(hw, 0);
    }

    /// 翻转极性并返回新标志。不写出任何值。
    pub fn reverse(&mut self) -> bool {
        self.reversed = !self.reversed;
        self.reversed
    }

    pub fn port(&self) -> ActuatorPort {
        self.port
    }

    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// 该电机输出到线上的值
    pub fn output(&self) -> i32 {
        if self.reversed {
            -self.velocity
        } else {
            self.velocity
        }
    }
}

impl Actuator for Motor {
    fn set_velocity(&mut self, hw: &dyn Hardware, velocity: i32) {
        Motor::set_velocity(self, hw, velocity);
    }

    fn velocity(&self) -> i32 {
        self.velocity
    }
}

//! 电机组

use crate::{Actuator, Motor};
use retrace_hal::Hardware;
use retrace_protocol::{ActuatorPort, clamp_velocity};
use tracing::debug;

/// 构建器收到的候选项的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// 提供的候选数，包括超出容量的
    pub requested: usize,
    /// 构建后系统中的成员数
    pub accepted: usize,
    /// 端口号越界而丢弃
    pub invalid: usize,
    /// 端口已被之前的成员使用而丢弃
    pub duplicate: usize,
    /// 构建器已满而忽略
    pub overflow: usize,
}

impl BuildReport {
    pub fn dropped(&self) -> usize {
        self.invalid + self.duplicate + self.overflow
    }
}

enum Candidate {
    Motor(Motor),
    Port { port: i32, reversed: bool },
}

/// [`MotorSystem`] 的构建器
///
/// 最多考虑 `capacity` 个候选。非法端口和重复端口被丢弃，
/// 不会导致构建失败。
pub struct MotorSystemBuilder {
    capacity: usize,
    candidates: Vec<Candidate>,
    overflow: usize,
}

impl MotorSystemBuilder {
    fn push(mut self, candidate: Candidate) -> Self {
        if self.candidates.len() < self.capacity {
            self.candidates.push(candidate);
        } else {
            self.overflow += 1;
        }
        self
    }

    /// 添加已有电机，保留其极性
    pub fn motor(self, motor: Motor) -> Self {
        self.push(Candidate::Motor(motor))
    }

    /// 按原始端口号添加电机
    pub fn port(self, port: i32, reversed: bool) -> Self {
        self.push(Candidate::Port { port, reversed })
    }

    pub fn motors(self, motors: impl IntoIterator<Item = Motor>) -> Self {
        motors.into_iter().fold(self, Self::motor)
    }

    /// 填充系统并将其速度置零。
    pub fn build(self, hw: &dyn Hardware) -> MotorSystem {
        let mut report = BuildReport {
            requested: self.candidates.len() + self.overflow,
            overflow: self.overflow,
            ..BuildReport::default()
        };
        let mut members: Vec<Motor> = Vec::with_capacity(self.candidates.len());

        for candidate in self.candidates {
            let (port, reversed, existing) = match candidate {
                Candidate::Motor(motor) => (motor.port(), motor.is_reversed(), Some(motor)),
                Candidate::Port { port, reversed } => match ActuatorPort::new(port) {
                    Ok(port) => (port, reversed, None),
                    Err(e) => {
                        debug!("Dropping motor candidate: {e}");
                        report.invalid += 1;
                        continue;
                    },
                },
            };

            if members.iter().any(|m| m.port() == port) {
                debug!("Dropping motor candidate: {port} already in system");
                report.duplicate += 1;
                continue;
            }

            members.push(existing.unwrap_or_else(|| Motor::new(hw, port, reversed)));
        }

        report.accepted = members.len();
        if report.overflow > 0 {
            debug!(
                "Motor system capacity {} exceeded, {} candidate(s) ignored",
                self.capacity, report.overflow
            );
        }

        let mut system = MotorSystem {
            members,
            velocity: 0,
            report,
        };
        system.set_velocity(hw, 0);
        system
    }
}

/// 端口唯一、统一驱动的有序电机组
#[derive(Debug)]
pub struct MotorSystem {
    members: Vec<Motor>,
    velocity: i32,
    report: BuildReport,
}

impl MotorSystem {
    /// 创建最多考虑 `capacity` 个候选的构建器。
    ///
    /// # 示例
    ///
    /// ```
    /// use retrace_driver::MotorSystem;
    /// use retrace_hal::mock::MockHardware;
    ///
    /// let hw = MockHardware::new();
    /// let lift = MotorSystem::builder(2).port(5, false).port(5, true).build(&hw);
    /// assert_eq!(lift.len(), 1);
    /// ```
    pub fn builder(capacity: usize) -> MotorSystemBuilder {
        MotorSystemBuilder {
            capacity,
            candidates: Vec::with_capacity(capacity),
            overflow: 0,
        }
    }

    /// 限幅并保存整体速度，再按声明顺序设置到每个成员。
    /// 成员各自的极性仍然生效。
    pub fn set_velocity(&mut self, hw: &dyn Hardware, velocity: i32) {
        self.velocity = clamp_velocity(velocity);
        for motor in &mut self.members {
            motor.set_velocity(hw, self.velocity);
        }
    }

    pub fn stop(&mut self, hw: &dyn Hardware) {
        self.set_velocity(hw, 0);
    }

    /// 仅按端口判断成员关系，忽略极性和速度。
    pub fn contains(&self, motor: &Motor) -> bool {
        self.contains_port(motor.port())
    }

    pub fn contains_port(&self, port: ActuatorPort) -> bool {
        self.members.iter().any(|m| m.port() == port)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    pub fn members(&self) -> &[Motor] {
        &self.members
    }

    pub fn build_report(&self) -> BuildReport {
        self.report
    }

    /// 消耗系统并交还其成员。
    pub fn release(self) -> Vec<Motor> {
        self.members
    }
}

impl Actuator for MotorSystem {
    fn set_velocity(&mut self, hw: &dyn Hardware, velocity: i32) {
        MotorSystem::set_velocity(self, hw, velocity);
    }

    fn velocity(&self) -> i32 {
        self.velocity
    }
}

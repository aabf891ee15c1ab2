//! 收敛控制
//!
//! 驱动一个 [`Actuator`] 直到 [`Reading`] 到达目标：
//!
//! - [`run_for`](ConvergenceExt::run_for): 以固定速度运行固定时长
//! - [`run_until`](ConvergenceExt::run_until): 以固定速度运行，直到读数
//!   恰好等于目标
//! - [`run_until_pid`](ConvergenceExt::run_until_pid): 比例逼近，
//!   `velocity = trunc(error * gain)`，直到 [`StopRule`] 判定停止
//!
//! 循环每次迭代读取一次传感器，默认忙等轮询。
//! [`PollPolicy`] 可以在迭代之间加入间隔，并可选地限制迭代次数
//! 和时长；达到上限时执行器停止，
//! 并返回 [`ControlError::Exhausted`]。
//!
//! # 示例
//!
//! ```
//! use retrace_client::control::{ConvergenceExt, PollPolicy, Proportional};
//! use retrace_driver::{MotorSystem, Sensor, SensorKind};
//! use retrace_hal::mock::MockHardware;
//! use retrace_protocol::{ActuatorPort, DigitalPort};
//!
//! let hw = MockHardware::new();
//! let mut lift = MotorSystem::builder(1).port(1, false).build(&hw);
//! let encoder = Sensor::new(&hw, SensorKind::QuadratureEncoder, &[1, 2]).unwrap();
//! hw.link_encoder(DigitalPort::new(1).unwrap(), ActuatorPort::new(1).unwrap(), 4);
//!
//! let done = lift
//!     .run_until_pid(&hw, &encoder, &Proportional::new(0.7), 500, &PollPolicy::default())
//!     .unwrap();
//! assert!(done.iterations > 0);
//! assert_eq!(lift.velocity(), 0);
//! ```

use crate::ControlError;
use retrace_driver::{Actuator, Reading};
use retrace_hal::Hardware;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{trace, warn};

/// 收敛循环的轮询方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollPolicy {
    /// 迭代之间的间隔，0 表示忙等轮询
    pub interval: Duration,
    /// 循环迭代达到此次数后放弃
    pub max_iterations: Option<u64>,
    /// 控制器运行时间超过此值后放弃
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// 无上限的忙等轮询
    pub const UNBOUNDED: PollPolicy = PollPolicy {
        interval: Duration::ZERO,
        max_iterations: None,
        timeout: None,
    };

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.max_iterations.is_some() || self.timeout.is_some()
    }
}

/// 比例循环何时继续
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopRule {
    /// 当 `|reading| != target || (target - reading) * gain < 10` 时继续。
    ///
    /// 增益和目标为正时，只有读数恰好为 `-target` 才会停止，
    /// 因此逼近目标的循环永远不会停止。
    Legacy,
    /// 当 `|target - reading| * gain >= threshold` 时继续。
    Tolerance { threshold: f64 },
}

impl Default for StopRule {
    fn default() -> Self {
        StopRule::Tolerance { threshold: 10.0 }
    }
}

impl StopRule {
    pub fn should_continue(&self, target: i32, reading: i32, gain: f64) -> bool {
        let error = error(target, reading) as f64;
        match *self {
            StopRule::Legacy => {
                reading.unsigned_abs() as i64 != target as i64 || error * gain < 10.0
            },
            StopRule::Tolerance { threshold } => error.abs() * gain >= threshold,
        }
    }
}

fn error(target: i32, reading: i32) -> i64 {
    target as i64 - reading as i64
}

/// 比例控制律
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proportional {
    pub gain: f64,
    pub rule: StopRule,
}

impl Proportional {
    /// 使用默认停止规则的增益
    pub fn new(gain: f64) -> Self {
        Self {
            gain,
            rule: StopRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: StopRule) -> Self {
        self.rule = rule;
        self
    }

    /// `trunc((target - reading) * gain)`，在 `i32` 范围内饱和
    pub fn velocity(&self, target: i32, reading: i32) -> i32 {
        (error(target, reading) as f64 * self.gain) as i32
    }

    pub fn should_continue(&self, target: i32, reading: i32) -> bool {
        self.rule.should_continue(target, reading, self.gain)
    }
}

/// 收敛循环的成功结束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// 循环结束前的迭代次数
    pub iterations: u64,
    /// 结束循环时的传感器读数
    pub reading: i32,
}

struct Poller<'a> {
    hw: &'a dyn Hardware,
    policy: &'a PollPolicy,
    started: Duration,
    iterations: u64,
}

impl<'a> Poller<'a> {
    fn new(hw: &'a dyn Hardware, policy: &'a PollPolicy) -> Self {
        let started = if policy.timeout.is_some() {
            hw.uptime()
        } else {
            Duration::ZERO
        };
        Self {
            hw,
            policy,
            started,
            iterations: 0,
        }
    }

    fn exhausted(&self) -> bool {
        if let Some(max) = self.policy.max_iterations
            && self.iterations >= max
        {
            return true;
        }
        if let Some(timeout) = self.policy.timeout
            && self.hw.uptime().saturating_sub(self.started) >= timeout
        {
            return true;
        }
        false
    }

    fn advance(&mut self) {
        self.iterations += 1;
        if !self.policy.interval.is_zero() {
            self.hw.delay(self.policy.interval);
        }
    }

    fn give_up(&self, last_reading: i32) -> ControlError {
        warn!(
            "Convergence bound exhausted after {} iteration(s), last reading {}",
            self.iterations, last_reading
        );
        ControlError::Exhausted {
            iterations: self.iterations,
            last_reading,
        }
    }
}

/// 适用于任何接受速度的对象的收敛循环
///
/// 无论是否收敛，每个方法返回时执行器都已停止。
pub trait ConvergenceExt: Actuator {
    /// 以 `velocity` 运行 `duration`，然后停止。阻塞调用。
    fn run_for(&mut self, hw: &dyn Hardware, velocity: i32, duration: Duration) {
        self.set_velocity(hw, velocity);
        hw.delay(duration);
        self.set_velocity(hw, 0);
    }

    /// 以 `velocity` 运行，直到 `sensor` 恰好读到 `target`，然后停止。
    ///
    /// 策略无上限时，会一直阻塞到读到该值。
    fn run_until<S: Reading + ?Sized>(
        &mut self,
        hw: &dyn Hardware,
        sensor: &S,
        velocity: i32,
        target: i32,
        policy: &PollPolicy,
    ) -> Result<Convergence, ControlError> {
        self.set_velocity(hw, velocity);
        let mut poller = Poller::new(hw, policy);
        let result = loop {
            let reading = sensor.read(hw);
            if reading == target {
                break Ok(Convergence {
                    iterations: poller.iterations,
                    reading,
                });
            }
            if poller.exhausted() {
                break Err(poller.give_up(reading));
            }
            poller.advance();
        };
        self.set_velocity(hw, 0);
        result
    }

    /// 比例逼近 `target`，然后停止。
    fn run_until_pid<S: Reading + ?Sized>(
        &mut self,
        hw: &dyn Hardware,
        sensor: &S,
        law: &Proportional,
        target: i32,
        policy: &PollPolicy,
    ) -> Result<Convergence, ControlError> {
        let mut poller = Poller::new(hw, policy);
        let result = loop {
            let reading = sensor.read(hw);
            if !law.should_continue(target, reading) {
                break Ok(Convergence {
                    iterations: poller.iterations,
                    reading,
                });
            }
            if poller.exhausted() {
                break Err(poller.give_up(reading));
            }
            let velocity = law.velocity(target, reading);
            trace!("pid: target {target}, reading {reading}, velocity {velocity}");
            self.set_velocity(hw, velocity);
            poller.advance();
        };
        self.set_velocity(hw, 0);
        result
    }
}

impl<T: Actuator + ?Sized> ConvergenceExt for T {}

/// 比赛阶段查询
pub trait CompetitionStatus {
    /// 自动阶段时为 true
    fn is_autonomous(&self) -> bool;
}

impl CompetitionStatus for bool {
    fn is_autonomous(&self) -> bool {
        *self
    }
}

/// 由场控任务切换的标志
impl CompetitionStatus for AtomicBool {
    fn is_autonomous(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CompetitionStatus + ?Sized> CompetitionStatus for Arc<T> {
    fn is_autonomous(&self) -> bool {
        (**self).is_autonomous()
    }
}

/// [`seek_position`] 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// 自动阶段：阻塞循环已运行完成
    Converged(Convergence),
    /// 手动阶段：发出了一次比例指令
    Stepped { velocity: i32 },
    /// 手动阶段：已在容差内，执行器已停止
    Settled { reading: i32 },
}

/// 将机构移向一个传感器位置。
///
/// 自动阶段时阻塞在
/// [`run_until_pid`](ConvergenceExt::run_until_pid) 中。否则只执行
/// 一次比例步进，因此可以在手动循环中每个周期调用一次。
/// 该步进中 [`StopRule::Legacy`] 直接比较原始读数与目标，
/// 不像阻塞循环那样取绝对值。
pub fn seek_position<A, S>(
    hw: &dyn Hardware,
    competition: &dyn CompetitionStatus,
    actuator: &mut A,
    sensor: &S,
    law: &Proportional,
    target: i32,
    policy: &PollPolicy,
) -> Result<Seek, ControlError>
where
    A: Actuator + ?Sized,
    S: Reading + ?Sized,
{
    if competition.is_autonomous() {
        return actuator
            .run_until_pid(hw, sensor, law, target, policy)
            .map(Seek::Converged);
    }

    let reading = sensor.read(hw);
    if step_continues(law, target, reading) {
        let velocity = law.velocity(target, reading);
        actuator.set_velocity(hw, velocity);
        Ok(Seek::Stepped {
            velocity: actuator.velocity(),
        })
    } else {
        actuator.set_velocity(hw, 0);
        Ok(Seek::Settled { reading })
    }
}

fn step_continues(law: &Proportional, target: i32, reading: i32) -> bool {
    match law.rule {
        StopRule::Legacy => reading != target || error(target, reading) as f64 * law.gain < 10.0,
        StopRule::Tolerance { .. } => law.should_continue(target, reading),
    }
}

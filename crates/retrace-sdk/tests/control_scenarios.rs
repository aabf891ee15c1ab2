//! 驱动 mock 机构的收敛循环

use retrace_sdk::hal::mock::MockHardware;
use retrace_sdk::prelude::*;
use std::time::Duration;

fn dp(n: i32) -> DigitalPort {
    DigitalPort::new(n).unwrap()
}

fn ap(n: i32) -> ActuatorPort {
    ActuatorPort::new(n).unwrap()
}

#[test]
fn drive_train_pid_to_encoder_target() {
    let hw = MockHardware::new();
    let mut drive = MotorSystem::builder(4)
        .port(1, false)
        .port(2, false)
        .port(9, true)
        .port(10, true)
        .build(&hw);
    let left = Sensor::new(&hw, SensorKind::QuadratureEncoder, &[1, 2]).unwrap();
    let right = Sensor::new(&hw, SensorKind::QuadratureEncoder, &[3, 4]).unwrap();
    hw.link_encoder(dp(1), ap(1), 8);
    hw.link_encoder(dp(3), ap(2), 8);
    let encoders = SensorSystem::builder(2).sensor(left).sensor(right).build(&hw);

    let done = drive
        .run_until_pid(
            &hw,
            &encoders,
            &Proportional::new(0.5),
            1000,
            &PollPolicy::default().with_max_iterations(10_000),
        )
        .unwrap();

    assert!((1000 - done.reading).abs() * 5 / 10 < 10);
    for port in [1, 2, 9, 10] {
        assert_eq!(hw.motor(ap(port)), 0);
    }
    // 反向成员镜像每条指令
    let forward = hw.motor_writes(ap(1));
    let mirrored: Vec<i32> = hw.motor_writes(ap(9)).iter().map(|v| -v).collect();
    assert_eq!(forward, mirrored);
}

#[test]
fn run_until_limit_switch_closes() {
    let hw = MockHardware::new();
    let limit = Sensor::new(&hw, SensorKind::LimitSwitch, &[5]).unwrap();
    let mut lift = Motor::new(&hw, ap(3), false);

    hw.set_digital(dp(5), true);
    let done = lift
        .run_until(&hw, &limit, 100, 1, &PollPolicy::UNBOUNDED)
        .unwrap();
    assert_eq!(done.iterations, 0);
    assert_eq!(hw.motor_writes(ap(3)), vec![0, 100, 0]);
}

#[test]
fn run_until_gives_up_at_timeout() {
    let hw = MockHardware::new();
    let sonar = Sensor::new(&hw, SensorKind::Ultrasonic, &[6, 7]).unwrap();
    hw.script_ultrasonic(dp(6), [80, 60, 40, 20]);
    let mut drive = MotorSystem::builder(2).port(4, false).port(5, false).build(&hw);

    let policy = PollPolicy::default()
        .with_interval(Duration::from_millis(20))
        .with_timeout(Duration::from_millis(200));
    let err = drive.run_until(&hw, &sonar, 60, 30, &policy).unwrap_err();

    assert_eq!(
        err,
        ControlError::Exhausted {
            iterations: 10,
            last_reading: 20,
        }
    );
    assert_eq!(drive.velocity(), 0);
    assert_eq!(hw.motor(ap(4)), 0);
}

#[test]
fn run_for_on_motor_system() {
    let hw = MockHardware::new();
    let mut intake = MotorSystem::builder(2).port(7, false).port(8, true).build(&hw);
    intake.run_for(&hw, -50, Duration::from_millis(750));

    assert_eq!(hw.motor_writes(ap(7)), vec![0, 0, -50, 0]);
    assert_eq!(hw.motor_writes(ap(8)), vec![0, 0, 50, 0]);
    assert_eq!(hw.elapsed(), Duration::from_millis(750));
}

#[test]
fn gyro_turn_with_legacy_rule_needs_a_bound() {
    let hw = MockHardware::new();
    let gyro = Sensor::gyro(&hw, AnalogPort::new(1).unwrap(), 196).unwrap();
    hw.script_gyro(AnalogPort::new(1).unwrap(), [0, 45, 80, 90]);
    let mut turn = Motor::new(&hw, ap(6), false);

    let law = Proportional::new(1.0).with_rule(StopRule::Legacy);
    let err = turn
        .run_until_pid(&hw, &gyro, &law, 90, &PollPolicy::default().with_max_iterations(20))
        .unwrap_err();
    assert!(matches!(
        err,
        ControlError::Exhausted {
            iterations: 20,
            last_reading: 90,
        }
    ));

    // 容差规则在相同读数处停止
    let done = turn
        .run_until_pid(&hw, &gyro, &Proportional::new(1.0), 90, &PollPolicy::UNBOUNDED)
        .unwrap();
    assert_eq!(done.iterations, 0);
}

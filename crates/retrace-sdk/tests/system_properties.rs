//! 电机组与传感器组的属性测试

use proptest::prelude::*;
use retrace_sdk::hal::mock::MockHardware;
use retrace_sdk::prelude::*;
use std::collections::BTreeSet;

proptest! {
    /// 大小等于前 `capacity` 个候选中不同有效端口的数量，
    /// 且每一个都是成员。
    #[test]
    fn motor_system_keeps_distinct_valid_ports(
        candidates in prop::collection::vec((-2i32..14, any::<bool>()), 0..24),
        capacity in 0usize..16,
    ) {
        let hw = MockHardware::new();
        let system = candidates
            .iter()
            .fold(MotorSystem::builder(capacity), |b, &(port, rev)| b.port(port, rev))
            .build(&hw);

        let considered = &candidates[..candidates.len().min(capacity)];
        let expected: BTreeSet<i32> = considered
            .iter()
            .map(|&(port, _)| port)
            .filter(|port| (1..=10).contains(port))
            .collect();

        prop_assert_eq!(system.len(), expected.len());
        for port in &expected {
            prop_assert!(system.contains_port(ActuatorPort::new(*port).unwrap()));
        }

        let report = system.build_report();
        prop_assert_eq!(report.requested, candidates.len());
        prop_assert_eq!(report.accepted + report.dropped(), report.requested);
    }

    /// 每个成员最终都得到限幅后的组速度，符号由
    /// 自身极性决定。
    #[test]
    fn motor_system_fan_out_respects_polarity(
        polarity in prop::collection::vec(any::<bool>(), 1..=10),
        velocity in -1000i32..1000,
    ) {
        let hw = MockHardware::new();
        let mut system = polarity
            .iter()
            .enumerate()
            .fold(MotorSystem::builder(10), |b, (i, &rev)| b.port(i as i32 + 1, rev))
            .build(&hw);
        system.set_velocity(&hw, velocity);

        let clamped = velocity.clamp(-127, 127);
        prop_assert_eq!(system.velocity(), clamped);
        for motor in system.members() {
            let expected = if motor.is_reversed() { -clamped } else { clamped };
            prop_assert_eq!(hw.motor(motor.port()), expected);
        }
    }

    /// 组读数是截断的整数平均值。
    #[test]
    fn sensor_system_reads_integer_mean(
        values in prop::collection::vec(0i32..=4095, 1..=8),
    ) {
        let hw = MockHardware::new();
        let sensors: Vec<Sensor> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let port = i as i32 + 1;
                hw.set_analog(AnalogPort::new(port).unwrap(), v);
                Sensor::new(&hw, SensorKind::LineTracker, &[port]).unwrap()
            })
            .collect();
        let system = SensorSystem::builder(8).sensors(sensors).build(&hw);

        let mean = values.iter().sum::<i32>() / values.len() as i32;
        prop_assert_eq!(system.read(&hw), mean);
    }
}

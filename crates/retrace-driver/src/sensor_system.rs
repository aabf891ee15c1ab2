//! 传感器组

use crate::{BuildReport, Reading, Sensor};
use retrace_hal::Hardware;
use tracing::debug;

/// [`SensorSystem`] 的构建器
pub struct SensorSystemBuilder {
    capacity: usize,
    candidates: Vec<Sensor>,
    overflow: Vec<Sensor>,
}

impl SensorSystemBuilder {
    pub fn sensor(mut self, sensor: Sensor) -> Self {
        if self.candidates.len() < self.capacity {
            self.candidates.push(sensor);
        } else {
            self.overflow.push(sensor);
        }
        self
    }

    pub fn sensors(self, sensors: impl IntoIterator<Item = Sensor>) -> Self {
        sensors.into_iter().fold(self, Self::sensor)
    }

    /// 按 `(kind, primary port)` 去重并复位所有成员。
    ///
    /// 被丢弃的传感器（重复项和超出容量的候选）会被释放，
    /// 与成员共用句柄的除外。
    pub fn build(self, hw: &dyn Hardware) -> SensorSystem {
        let mut report = BuildReport {
            requested: self.candidates.len() + self.overflow.len(),
            overflow: self.overflow.len(),
            ..BuildReport::default()
        };
        let mut members: Vec<Sensor> = Vec::with_capacity(self.candidates.len());
        let mut dropped = self.overflow;

        for sensor in self.candidates {
            if members.iter().any(|m| same_slot(m, &sensor)) {
                debug!(
                    "Dropping {} on port {}: already in system",
                    sensor.kind(),
                    sensor.primary_port()
                );
                report.duplicate += 1;
                dropped.push(sensor);
                continue;
            }
            members.push(sensor);
        }
        report.accepted = members.len();

        for sensor in dropped {
            if !members.iter().any(|m| m.backing() == sensor.backing()) {
                sensor.release(hw);
            }
        }

        let system = SensorSystem { members, report };
        system.reset(hw);
        system
    }
}

fn same_slot(a: &Sensor, b: &Sensor) -> bool {
    a.kind() == b.kind() && a.primary_port() == b.primary_port()
}

/// 读数取平均值的传感器组
#[derive(Debug)]
pub struct SensorSystem {
    members: Vec<Sensor>,
    report: BuildReport,
}

impl SensorSystem {
    pub fn builder(capacity: usize) -> SensorSystemBuilder {
        SensorSystemBuilder {
            capacity,
            candidates: Vec::with_capacity(capacity),
            overflow: Vec::new(),
        }
    }

    /// 成员读数的整数平均值，向零截断。
    ///
    /// 空系统读数为 0。
    pub fn read(&self, hw: &dyn Hardware) -> i32 {
        if self.members.is_empty() {
            return 0;
        }
        let sum: i64 = self.members.iter().map(|s| s.read(hw) as i64).sum();
        (sum / self.members.len() as i64) as i32
    }

    pub fn write(&self, hw: &dyn Hardware, value: i32) {
        for sensor in &self.members {
            sensor.write(hw, value);
        }
    }

    pub fn reset(&self, hw: &dyn Hardware) {
        for sensor in &self.members {
            sensor.reset(hw);
        }
    }

    /// 按类型和主端口判断成员关系
    pub fn contains(&self, sensor: &Sensor) -> bool {
        self.members.iter().any(|m| same_slot(m, sensor))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Sensor] {
        &self.members
    }

    pub fn build_report(&self) -> BuildReport {
        self.report
    }

    /// 消耗系统并释放所有成员。
    pub fn release(self, hw: &dyn Hardware) {
        for sensor in self.members {
            sensor.release(hw);
        }
    }
}

impl Reading for SensorSystem {
    fn read(&self, hw: &dyn Hardware) -> i32 {
        SensorSystem::read(self, hw)
    }
}

//! 回放器

use super::{ProgressEvent, ProgressSink, SessionOutcome, SessionReport};
use retrace_hal::Hardware;
use retrace_protocol::{ActuatorPort, DigitalPort, Sample, SampleReader, TICK};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// 按录制节奏回放日志
///
/// 每个样本直接写入通道：执行器值写到端口
/// 1..=10，数字电平写到端口 1..=12，按顺序进行。
/// 通道布局不会与机器人核对；在不同接线下录制的日志
/// 会回放到错误的通道上。
pub struct Player<R: Read> {
    reader: SampleReader<R>,
}

impl<R: Read> Player<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: SampleReader::new(reader),
        }
    }

    /// 回放直到日志结束，然后停止所有执行器。
    ///
    /// 截断或无效的样本会在该处结束回放；执行器
    /// 被停止，报告为 [`SessionOutcome::Corrupt`]。
    pub fn run(mut self, hw: &dyn Hardware, progress: &mut dyn ProgressSink) -> SessionReport {
        progress.report(ProgressEvent::ReplayStarted);

        let mut outcome = SessionOutcome::Completed;
        loop {
            match self.reader.read_sample() {
                Ok(Some(sample)) => {
                    apply(hw, &sample);
                    hw.delay(TICK);
                },
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "Replay stopped after {} sample(s): {e}",
                        self.reader.samples_read()
                    );
                    outcome = SessionOutcome::Corrupt;
                    break;
                },
            }
        }

        hw.motor_stop_all();
        let samples = self.reader.samples_read();
        progress.report(ProgressEvent::ReplayFinished { samples });
        SessionReport { outcome, samples }
    }
}

fn apply(hw: &dyn Hardware, sample: &Sample) {
    for port in ActuatorPort::all() {
        hw.motor_set(port, sample.actuator(port));
    }
    for port in DigitalPort::all() {
        hw.digital_write(port, sample.digital(port));
    }
}

/// 回放 `path` 处的日志。
///
/// 文件无法打开时什么都不做，报告为
/// [`SessionOutcome::LogUnavailable`]。
pub fn replay_file(
    hw: &dyn Hardware,
    path: &Path,
    progress: &mut dyn ProgressSink,
) -> SessionReport {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot open {} for replay: {e}", path.display());
            return SessionReport::unavailable();
        },
    };

    info!("Replaying {}", path.display());
    let report = Player::new(BufReader::new(file)).run(hw, progress);
    info!(
        "Replay of {} finished: {:?}, {} sample(s)",
        path.display(),
        report.outcome,
        report.samples
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_hal::mock::{HalEvent, MockHardware};
    use std::time::Duration;

    fn log_of(samples: &[Sample]) -> Vec<u8> {
        let mut log = Vec::new();
        for sample in samples {
            sample.write_to(&mut log).unwrap();
        }
        log
    }

    #[test]
    fn test_replay_writes_raw_channels_in_order() {
        let hw = MockHardware::new();
        let mut sample = Sample::default();
        sample.actuators[0] = 55;
        sample.actuators[9] = -127;
        sample.digital[11] = true;
        let log = log_of(&[sample]);

        let mut events: Vec<ProgressEvent> = Vec::new();
        let report = Player::new(log.as_slice()).run(&hw, &mut events);
        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(report.samples, 1);

        let journal = hw.events();
        let mut expected: Vec<HalEvent> = (1..=10u8)
            .map(|port| HalEvent::MotorSet {
                port,
                value: sample.actuators[port as usize - 1],
            })
            .collect();
        expected.extend((1..=12u8).map(|port| HalEvent::DigitalWrite {
            port,
            level: port == 12,
        }));
        expected.push(HalEvent::Delay(TICK));
        expected.push(HalEvent::MotorStopAll);
        assert_eq!(journal, expected);

        assert_eq!(
            events,
            vec![
                ProgressEvent::ReplayStarted,
                ProgressEvent::ReplayFinished { samples: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_log_only_stops() {
        let hw = MockHardware::new();
        let report = Player::new(&b""[..]).run(&hw, &mut Vec::<ProgressEvent>::new());
        assert_eq!(report.samples, 0);
        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(hw.events(), vec![HalEvent::MotorStopAll]);
    }

    #[test]
    fn test_truncated_tail_stops_replay() {
        let hw = MockHardware::new();
        let mut sample = Sample::default();
        sample.actuators[2] = 90;
        let mut log = log_of(&[sample, sample]);
        log.truncate(log.len() - 5);

        let report = Player::new(log.as_slice()).run(&hw, &mut Vec::<ProgressEvent>::new());
        assert_eq!(report.outcome, SessionOutcome::Corrupt);
        assert_eq!(report.samples, 1);
        assert!(report.stopped_early());
        assert_eq!(hw.motor(ActuatorPort::new(3).unwrap()), 0);
        assert_eq!(hw.elapsed(), Duration::from_millis(20));
    }

    #[test]
    fn test_corrupt_digit_stops_replay() {
        let hw = MockHardware::new();
        let mut log = log_of(&[Sample::default()]);
        log[0] = b'z';
        let report = Player::new(log.as_slice()).run(&hw, &mut Vec::<ProgressEvent>::new());
        assert_eq!(report.outcome, SessionOutcome::Corrupt);
        assert_eq!(report.samples, 0);
    }

    #[test]
    fn test_replay_file_missing() {
        let hw = MockHardware::new();
        let dir = tempfile::tempdir().unwrap();
        let mut events: Vec<ProgressEvent> = Vec::new();
        let report = replay_file(&hw, &dir.path().join("a3.txt"), &mut events);
        assert_eq!(report.outcome, SessionOutcome::LogUnavailable);
        assert!(events.is_empty());
        assert!(hw.events().is_empty());
    }
}

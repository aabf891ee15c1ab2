//! 录制器

use super::{ProgressEvent, ProgressSink, SessionOutcome, SessionReport};
use crate::config::RecordingConfig;
use retrace_hal::Hardware;
use retrace_protocol::{ActuatorPort, DigitalPort, Sample, TICK, TICK_MS, sample_count};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// 录制器生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    /// 操作员倒计时，尚未写入
    Countdown,
    /// 每个周期一个样本
    Capturing,
    /// 执行器已停止，日志已刷新
    Done,
}

/// 固定节奏采样器
///
/// 每个录制周期调用一次操作员控制回调，追加一个
/// 记录当前执行器指令和数字电平的 [`Sample`]，然后
/// 等待一个周期。经过时间按周期计数，而非墙钟时间。
///
/// [`run`](Recorder::run) 驱动整个会话。单独的步骤
/// （[`countdown`](Recorder::countdown)、[`tick`](Recorder::tick)、
/// [`finish`](Recorder::finish)）对需要穿插
/// 自己工作的调用方公开。
pub struct Recorder<W: Write> {
    writer: W,
    total: u64,
    samples: u64,
    settings: RecordingConfig,
    state: RecorderState,
}

impl<W: Write> Recorder<W> {
    /// 向 `writer` 录制 `duration / TICK` 个样本（整数除法）。
    pub fn new(writer: W, duration: Duration, settings: RecordingConfig) -> Self {
        Self {
            writer,
            total: sample_count(duration),
            samples: 0,
            settings,
            state: RecorderState::Idle,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// 本次会话将写入的样本数
    pub fn total_samples(&self) -> u64 {
        self.total
    }

    pub fn samples_written(&self) -> u64 {
        self.samples
    }

    /// 倒计时到录制开始。
    pub fn countdown(&mut self, hw: &dyn Hardware, progress: &mut dyn ProgressSink) {
        self.state = RecorderState::Countdown;
        let step = Duration::from_millis(self.settings.countdown_step_ms);
        for remaining_secs in (1..=self.settings.countdown_steps).rev() {
            progress.report(ProgressEvent::Countdown { remaining_secs });
            hw.delay(step);
        }
        self.state = RecorderState::Capturing;
    }

    /// 录制一个周期。仍有剩余周期时返回 `Ok(true)`。
    ///
    /// 不在录制状态时什么都不做。
    pub fn tick(
        &mut self,
        hw: &dyn Hardware,
        teleop: &mut dyn FnMut(&dyn Hardware),
        progress: &mut dyn ProgressSink,
    ) -> io::Result<bool> {
        if self.state != RecorderState::Capturing || self.samples >= self.total {
            return Ok(false);
        }

        let remaining = Duration::from_millis((self.total - self.samples) * TICK_MS);
        progress.report(ProgressEvent::Recording { remaining });

        teleop(hw);
        snapshot(hw).write_to(&mut self.writer)?;
        self.samples += 1;
        hw.delay(TICK);

        Ok(self.samples < self.total)
    }

    /// 停止所有执行器，刷新日志并报告完成。
    ///
    /// 录制器进入 [`RecorderState::Done`]。
    pub fn finish(&mut self, hw: &dyn Hardware, progress: &mut dyn ProgressSink) -> SessionReport {
        hw.motor_stop_all();
        let outcome = match self.writer.flush() {
            Ok(()) => SessionOutcome::Completed,
            Err(e) => {
                warn!("Failed to flush recording: {e}");
                SessionOutcome::WriteFailed
            },
        };
        self.state = RecorderState::Done;

        progress.report(ProgressEvent::Completed);
        hw.delay(Duration::from_millis(self.settings.completion_hold_ms));

        SessionReport {
            outcome,
            samples: self.samples,
        }
    }

    /// 倒计时、录制、结束。
    ///
    /// 写入失败会提前结束录制；执行器仍会停止，
    /// 报告为 [`SessionOutcome::WriteFailed`]。
    pub fn run(
        mut self,
        hw: &dyn Hardware,
        teleop: &mut dyn FnMut(&dyn Hardware),
        progress: &mut dyn ProgressSink,
    ) -> SessionReport {
        self.countdown(hw, progress);
        loop {
            match self.tick(hw, teleop, progress) {
                Ok(true) => {},
                Ok(false) => break,
                Err(e) => {
                    warn!("Recording stopped after {} sample(s): {e}", self.samples);
                    let mut report = self.finish(hw, progress);
                    report.outcome = SessionOutcome::WriteFailed;
                    return report;
                },
            }
        }
        self.finish(hw, progress)
    }
}

/// 所有执行器和数字通道当前的指令状态
fn snapshot(hw: &dyn Hardware) -> Sample {
    let mut sample = Sample::default();
    for port in ActuatorPort::all() {
        sample.actuators[port.index()] = hw.motor_get(port);
    }
    for port in DigitalPort::all() {
        sample.digital[port.index()] = hw.digital_read(port);
    }
    sample
}

/// 将会话录制到 `path` 处的文件，覆盖原文件。
///
/// 文件无法创建时什么都不做：没有倒计时、没有样本，
/// 报告为 [`SessionOutcome::LogUnavailable`]。
pub fn record_file(
    hw: &dyn Hardware,
    path: &Path,
    duration: Duration,
    settings: &RecordingConfig,
    teleop: &mut dyn FnMut(&dyn Hardware),
    progress: &mut dyn ProgressSink,
) -> SessionReport {
    let file = match File::create(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Cannot open {} for recording: {e}", path.display());
            return SessionReport::unavailable();
        },
    };

    info!("Recording {} for {:?}", path.display(), duration);
    let report = Recorder::new(BufWriter::new(file), duration, settings.clone())
        .run(hw, teleop, progress);
    info!(
        "Recording {} finished: {:?}, {} sample(s)",
        path.display(),
        report.outcome,
        report.samples
    );
    report
}

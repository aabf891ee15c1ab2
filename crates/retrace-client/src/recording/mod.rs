//! 录制与回放
//!
//! [`Recorder`] 在操作员驾驶机器人时，每个周期采样一次所有执行器指令
//! 和数字电平，并将样本追加到日志。
//! [`Player`] 以相同节奏读回日志，
//! 并把每个样本作为原始通道写入重新发出。
//!
//! 二者都通过 [`ProgressSink`] 报告面向操作员的进度，
//! 结束时返回 [`SessionReport`]。无法打开日志不算错误：
//! 会跳过本次会话并报告为 [`SessionOutcome::LogUnavailable`]。
//!
//! # 示例
//!
//! ```
//! use retrace_client::config::RecordingConfig;
//! use retrace_client::recording::{Player, ProgressEvent, Recorder, SessionOutcome};
//! use retrace_hal::Hardware;
//! use retrace_hal::mock::MockHardware;
//! use retrace_protocol::ActuatorPort;
//! use std::time::Duration;
//!
//! let hw = MockHardware::new();
//! let drive = ActuatorPort::new(1).unwrap();
//! let mut log: Vec<u8> = Vec::new();
//! let mut events: Vec<ProgressEvent> = Vec::new();
//!
//! let report = Recorder::new(&mut log, Duration::from_millis(60), RecordingConfig::default())
//!     .run(&hw, &mut |hw: &dyn Hardware| hw.motor_set(drive, 42), &mut events);
//! assert_eq!(report.samples, 3);
//!
//! let report = Player::new(log.as_slice()).run(&hw, &mut events);
//! assert_eq!(report.outcome, SessionOutcome::Completed);
//! ```

mod player;
mod recorder;

pub use player::{Player, replay_file};
pub use recorder::{Recorder, RecorderState, record_file};

use retrace_protocol::TICK_MS;
use std::fmt;
use std::time::Duration;
use tracing::{info, trace};

/// 面向操作员的进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// `remaining_secs` 秒后开始录制
    Countdown { remaining_secs: u32 },
    /// 录制中，剩余 `remaining`
    Recording { remaining: Duration },
    /// 录制结束，执行器已停止
    Completed,
    ReplayStarted,
    /// 回放在 `samples` 个样本后结束
    ReplayFinished { samples: u64 },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Countdown { remaining_secs } => {
                write!(f, "Recording in: {remaining_secs} seconds")
            },
            ProgressEvent::Recording { remaining } => {
                write!(f, "T -{:.2} seconds", remaining.as_secs_f64())
            },
            ProgressEvent::Completed => f.write_str("COMPLETED"),
            ProgressEvent::ReplayStarted => f.write_str("Replaying"),
            ProgressEvent::ReplayFinished { samples } => {
                write!(f, "Replay finished ({samples} samples)")
            },
        }
    }
}

/// 接收进度事件，通常是机器人上的显示屏
pub trait ProgressSink {
    fn report(&mut self, event: ProgressEvent);
}

/// 收集事件，主要用于测试
impl ProgressSink for Vec<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// 通过 `tracing` 输出事件
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Recording { .. } => trace!("{event}"),
            _ => info!("{event}"),
        }
    }
}

/// 录制或回放会话的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 运行到结束
    Completed,
    /// 无法打开日志；什么都没做
    LogUnavailable,
    /// 写入样本失败；录制提前结束
    WriteFailed,
    /// 日志在样本中途结束或包含无效样本；回放提前结束
    Corrupt,
}

/// 录制或回放会话的摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// 写入或回放的样本数
    pub samples: u64,
}

impl SessionReport {
    pub(crate) fn unavailable() -> Self {
        Self {
            outcome: SessionOutcome::LogUnavailable,
            samples: 0,
        }
    }

    /// 样本覆盖的时长，每个样本一个周期
    pub fn duration(&self) -> Duration {
        Duration::from_millis(TICK_MS.saturating_mul(self.samples))
    }

    pub fn stopped_early(&self) -> bool {
        matches!(
            self.outcome,
            SessionOutcome::WriteFailed | SessionOutcome::Corrupt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_messages() {
        assert_eq!(
            ProgressEvent::Countdown { remaining_secs: 10 }.to_string(),
            "Recording in: 10 seconds"
        );
        assert_eq!(
            ProgressEvent::Recording {
                remaining: Duration::from_millis(14_980)
            }
            .to_string(),
            "T -14.98 seconds"
        );
        assert_eq!(ProgressEvent::Completed.to_string(), "COMPLETED");
    }

    #[test]
    fn test_report_duration() {
        let report = SessionReport {
            outcome: SessionOutcome::Completed,
            samples: 750,
        };
        assert_eq!(report.duration(), Duration::from_secs(15));
        assert!(!report.stopped_early());
        assert!(!SessionReport::unavailable().stopped_early());
    }
}

//! # Retrace 客户端层
//!
//! 比赛程序直接使用的一层：
//!
//! - [`control`]: 驱动电机直到传感器到达目标的收敛循环，
//!   以及手动和自动阶段共用的定位函数
//! - [`recording`]: 以固定周期将机器人通道录制到日志，
//!   并确定性地回放该日志
//! - [`config`]: 二者的 TOML 配置
//! - [`RobotContext`]: 持有硬件、配置、比赛状态
//!   和操作员显示

pub mod config;
pub mod context;
pub mod control;
mod error;
pub mod recording;

pub use config::{ControlConfig, RecordingConfig, RetraceConfig, RoutineConfig};
pub use context::RobotContext;
pub use control::{
    CompetitionStatus, Convergence, ConvergenceExt, PollPolicy, Proportional, Seek, StopRule,
    seek_position,
};
pub use error::{ConfigError, ControlError};
pub use recording::{
    Player, ProgressEvent, ProgressSink, Recorder, RecorderState, SessionOutcome, SessionReport,
    TracingProgress,
};

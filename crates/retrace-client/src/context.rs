//! 机器人上下文
//!
//! 持有比赛程序共享的一切：硬件、已加载的配置、
//! 比赛状态查询和操作员显示。

use crate::config::{RetraceConfig, RoutineConfig};
use crate::control::{CompetitionStatus, PollPolicy, Seek, seek_position};
use crate::recording::{ProgressSink, SessionReport, TracingProgress, record_file, replay_file};
use crate::{ConfigError, ControlError};
use retrace_driver::{Actuator, Reading};
use retrace_hal::Hardware;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 共享的机器人状态
///
/// # 示例
///
/// ```
/// use retrace_client::RobotContext;
/// use retrace_hal::mock::MockHardware;
///
/// let robot = RobotContext::new(MockHardware::new());
/// let (file, duration) = robot.routine("auton1").unwrap();
/// assert!(file.ends_with("a1.txt"));
/// assert_eq!(duration.as_secs(), 15);
/// ```
pub struct RobotContext<H: Hardware> {
    hw: H,
    config: RetraceConfig,
    competition: Box<dyn CompetitionStatus>,
    progress: Box<dyn ProgressSink>,
}

impl<H: Hardware> RobotContext<H> {
    /// 默认配置，从不处于自动阶段，进度通过 `tracing` 输出
    pub fn new(hw: H) -> Self {
        Self {
            hw,
            config: RetraceConfig::default(),
            competition: Box::new(false),
            progress: Box::new(TracingProgress),
        }
    }

    pub fn with_config(mut self, config: RetraceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_competition(mut self, competition: impl CompetitionStatus + 'static) -> Self {
        self.competition = Box::new(competition);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn config(&self) -> &RetraceConfig {
        &self.config
    }

    pub fn is_autonomous(&self) -> bool {
        self.competition.is_autonomous()
    }

    /// 以 `duration` 时长录制到 `path`；参见 [`record_file`]。
    pub fn record(
        &mut self,
        path: &Path,
        duration: Duration,
        teleop: &mut dyn FnMut(&dyn Hardware),
    ) -> SessionReport {
        record_file(
            &self.hw,
            path,
            duration,
            &self.config.recording,
            teleop,
            self.progress.as_mut(),
        )
    }

    /// 回放 `path`；参见 [`replay_file`]。
    pub fn replay(&mut self, path: &Path) -> SessionReport {
        replay_file(&self.hw, path, self.progress.as_mut())
    }

    /// 具名 routine 槽位的日志文件和时长
    pub fn routine(&self, name: &str) -> Result<(PathBuf, Duration), ConfigError> {
        let routine: &RoutineConfig = self.config.routine(name)?;
        Ok((
            routine.path_in(&self.config.recording.log_dir),
            routine.duration(),
        ))
    }

    /// 录制具名 routine 槽位。
    pub fn record_routine(
        &mut self,
        name: &str,
        teleop: &mut dyn FnMut(&dyn Hardware),
    ) -> Result<SessionReport, ConfigError> {
        let (path, duration) = self.routine(name)?;
        Ok(self.record(&path, duration, teleop))
    }

    /// 回放具名 routine 槽位。
    pub fn replay_routine(&mut self, name: &str) -> Result<SessionReport, ConfigError> {
        let (path, _) = self.routine(name)?;
        Ok(self.replay(&path))
    }

    /// 使用已配置的默认增益、停止规则和轮询策略的
    /// [`seek_position`]。
    pub fn seek_position<A, S>(
        &self,
        actuator: &mut A,
        sensor: &S,
        target: i32,
    ) -> Result<Seek, ControlError>
    where
        A: Actuator + ?Sized,
        S: Reading + ?Sized,
    {
        let law = self.config.control.default_proportional();
        let policy: PollPolicy = self.config.control.poll_policy();
        seek_position(
            &self.hw,
            self.competition.as_ref(),
            actuator,
            sensor,
            &law,
            target,
            &policy,
        )
    }
}

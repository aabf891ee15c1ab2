//! 配置
//!
//! 从 TOML 加载。每个字段都有默认值，空文件（或没有文件）
//! 即为默认行为：
//!
//! ```toml
//! [recording]
//! countdown_steps = 10
//! countdown_step_ms = 1000
//! completion_hold_ms = 1000
//! log_dir = "."
//!
//! [control]
//! poll_interval_us = 0
//! stop_rule = "tolerance"
//! tolerance = 10.0
//! default_gain = 0.7
//!
//! [[routines]]
//! name = "skills"
//! file = "sk.txt"
//! duration_ms = 60000
//! ```
//!
//! 周期长度不可配置：它是日志格式的一部分。

use crate::ConfigError;
use crate::control::{PollPolicy, Proportional, StopRule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 顶层配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetraceConfig {
    pub recording: RecordingConfig,
    pub control: ControlConfig,
    /// 具名的录制/回放槽位
    pub routines: Vec<RoutineConfig>,
}

impl Default for RetraceConfig {
    fn default() -> Self {
        Self {
            recording: RecordingConfig::default(),
            control: ControlConfig::default(),
            routines: default_routines(),
        }
    }
}

impl RetraceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 按名称查找 routine 槽位。
    pub fn routine(&self, name: &str) -> Result<&RoutineConfig, ConfigError> {
        self.routines
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ConfigError::UnknownRoutine(name.to_string()))
    }
}

/// 录制会话设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// 开始录制前的倒计时步数
    pub countdown_steps: u32,
    pub countdown_step_ms: u64,
    /// 录制结束后 "COMPLETED" 的显示时长
    pub completion_hold_ms: u64,
    /// 解析 routine 文件的目录
    pub log_dir: PathBuf,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            countdown_steps: 10,
            countdown_step_ms: 1000,
            completion_hold_ms: 1000,
            log_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRuleKind {
    #[default]
    Tolerance,
    Legacy,
}

/// 收敛循环设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// 循环迭代之间的间隔，0 表示忙等轮询
    pub poll_interval_us: u64,
    pub max_iterations: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub stop_rule: StopRuleKind,
    /// 容差规则的阈值
    pub tolerance: f64,
    /// 未指定时使用的比例增益
    pub default_gain: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: 0,
            max_iterations: None,
            timeout_ms: None,
            stop_rule: StopRuleKind::Tolerance,
            tolerance: 10.0,
            default_gain: 0.7,
        }
    }
}

impl ControlConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_micros(self.poll_interval_us),
            max_iterations: self.max_iterations,
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn stop_rule(&self) -> StopRule {
        match self.stop_rule {
            StopRuleKind::Tolerance => StopRule::Tolerance {
                threshold: self.tolerance,
            },
            StopRuleKind::Legacy => StopRule::Legacy,
        }
    }

    /// 使用已配置停止规则和 `gain` 的控制律
    pub fn proportional(&self, gain: f64) -> Proportional {
        Proportional::new(gain).with_rule(self.stop_rule())
    }

    pub fn default_proportional(&self) -> Proportional {
        self.proportional(self.default_gain)
    }
}

/// 具名的录制/回放槽位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineConfig {
    pub name: String,
    /// 日志文件，非绝对路径时相对于 `recording.log_dir`
    pub file: PathBuf,
    pub duration_ms: u64,
}

impl RoutineConfig {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            duration_ms,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn path_in(&self, log_dir: &Path) -> PathBuf {
        log_dir.join(&self.file)
    }
}

/// Skills（60 秒）和四个自动阶段槽位（各 15 秒）
pub fn default_routines() -> Vec<RoutineConfig> {
    let mut routines = vec![RoutineConfig::new("skills", "sk.txt", 60_000)];
    routines.extend(
        (1..=4).map(|n| RoutineConfig::new(format!("auton{n}"), format!("a{n}.txt"), 15_000)),
    );
    routines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetraceConfig::default();
        assert_eq!(config.recording.countdown_steps, 10);
        assert_eq!(config.control.default_gain, 0.7);
        assert_eq!(config.control.stop_rule(), StopRule::Tolerance { threshold: 10.0 });
        assert_eq!(config.control.poll_policy(), PollPolicy::UNBOUNDED);

        let skills = config.routine("skills").unwrap();
        assert_eq!(skills.file, PathBuf::from("sk.txt"));
        assert_eq!(skills.duration(), Duration::from_secs(60));
        assert_eq!(config.routine("auton4").unwrap().duration_ms, 15_000);
        assert!(matches!(
            config.routine("auton5"),
            Err(ConfigError::UnknownRoutine(_))
        ));
    }

    #[test]
    fn test_empty_toml_gives_stock_config() {
        let config = RetraceConfig::from_toml_str("").unwrap();
        assert_eq!(config, RetraceConfig::default());
        assert_eq!(config.recording, RecordingConfig::default());
        assert_eq!(config.control, ControlConfig::default());
        assert_eq!(config.routines, default_routines());
    }

    #[test]
    fn test_partial_toml() {
        let config = RetraceConfig::from_toml_str(
            r#"
            [control]
            stop_rule = "legacy"
            max_iterations = 500
            poll_interval_us = 250

            [[routines]]
            name = "demo"
            file = "demo.txt"
            duration_ms = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.control.stop_rule(), StopRule::Legacy);
        let policy = config.control.poll_policy();
        assert_eq!(policy.max_iterations, Some(500));
        assert_eq!(policy.interval, Duration::from_micros(250));
        assert_eq!(config.routines.len(), 1);
        assert_eq!(config.recording.completion_hold_ms, 1000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            RetraceConfig::from_toml_str("[control]\nstop_rule = \"sometimes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retrace.toml");

        let mut config = RetraceConfig::default();
        config.control.timeout_ms = Some(3000);
        config.recording.log_dir = PathBuf::from("/media/usb");
        config.save_to_file(&path).unwrap();

        let loaded = RetraceConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RetraceConfig::load_from_file(dir.path().join("nope.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}

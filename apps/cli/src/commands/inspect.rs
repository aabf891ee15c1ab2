//! inspect 命令
//!
//! 解码录制文件并汇总每个通道。

use anyhow::{Context, Result};
use clap::Args;
use retrace_sdk::protocol::{ACTUATOR_CHANNELS, DIGITAL_CHANNELS, SampleReader, TICK_MS};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::debug;

/// inspect 参数
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// 录制文件
    pub log: PathBuf,

    /// 以 JSON 输出汇总
    #[arg(long)]
    pub json: bool,
}

/// 每个执行器的统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActuatorStats {
    pub port: usize,
    pub min: i32,
    pub max: i32,
    pub last: i32,
}

/// 每个数字端口的统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigitalStats {
    pub port: usize,
    /// 电平为高的样本数
    pub high: u64,
    pub last: bool,
}

/// 录制文件的内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    pub samples: u64,
    pub duration_ms: u64,
    /// 日志没有样本时为空
    pub actuators: Vec<ActuatorStats>,
    pub digital: Vec<DigitalStats>,
    /// 解码在文件结束前停止的原因
    pub error: Option<String>,
}

/// 读取样本直到输入结束或遇到第一个坏样本。
pub fn summarize<R: Read>(reader: R) -> LogSummary {
    let mut reader = SampleReader::new(reader);
    let mut actuators: Vec<ActuatorStats> = Vec::new();
    let mut digital: Vec<DigitalStats> = Vec::new();
    let mut error = None;

    for result in reader.by_ref() {
        let sample = match result {
            Ok(sample) => sample,
            Err(e) => {
                error = Some(e.to_string());
                break;
            },
        };

        if actuators.is_empty() {
            actuators = (0..ACTUATOR_CHANNELS)
                .map(|i| ActuatorStats {
                    port: i + 1,
                    min: sample.actuators[i],
                    max: sample.actuators[i],
                    last: sample.actuators[i],
                })
                .collect();
            digital = (0..DIGITAL_CHANNELS)
                .map(|i| DigitalStats {
                    port: i + 1,
                    high: 0,
                    last: false,
                })
                .collect();
        }

        for (stats, &value) in actuators.iter_mut().zip(&sample.actuators) {
            stats.min = stats.min.min(value);
            stats.max = stats.max.max(value);
            stats.last = value;
        }
        for (stats, &level) in digital.iter_mut().zip(&sample.digital) {
            stats.high += level as u64;
            stats.last = level;
        }
    }

    let samples = reader.samples_read();
    LogSummary {
        samples,
        duration_ms: samples * TICK_MS,
        actuators,
        digital,
        error,
    }
}

impl InspectCommand {
    pub fn execute(&self) -> Result<()> {
        let file = File::open(&self.log)
            .with_context(|| format!("Cannot open recording {}", self.log.display()))?;
        let summary = summarize(BufReader::new(file));
        debug!("{} decoded: {} sample(s)", self.log.display(), summary.samples);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("File:     {}", self.log.display());
        println!("Samples:  {}", summary.samples);
        println!("Duration: {:.2} s", summary.duration_ms as f64 / 1000.0);
        if let Some(ref error) = summary.error {
            println!("Stopped:  {error}");
        }
        if summary.samples == 0 {
            return Ok(());
        }

        println!();
        println!("Actuator   min   max  last");
        for a in &summary.actuators {
            println!("{:>8} {:>5} {:>5} {:>5}", a.port, a.min, a.max, a.last);
        }
        println!();
        println!("Digital   high  last");
        for d in &summary.digital {
            println!("{:>7} {:>6} {:>5}", d.port, d.high, d.last as u8);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_sdk::protocol::Sample;

    fn log_of(samples: &[Sample]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.encode()).collect()
    }

    #[test]
    fn test_summarize_channels() {
        let mut a = Sample::default();
        a.actuators[0] = 10;
        a.digital[3] = true;
        let mut b = Sample::default();
        b.actuators[0] = -20;
        b.actuators[9] = 127;

        let summary = summarize(log_of(&[a, b]).as_slice());
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.duration_ms, 40);
        assert_eq!(summary.error, None);
        assert_eq!(
            summary.actuators[0],
            ActuatorStats {
                port: 1,
                min: -20,
                max: 10,
                last: -20,
            }
        );
        assert_eq!(summary.actuators[9].max, 127);
        assert_eq!(summary.digital[3].high, 1);
        assert!(!summary.digital[3].last);
    }

    #[test]
    fn test_summarize_truncated() {
        let mut bytes = log_of(&[Sample::default(), Sample::default()]);
        bytes.truncate(40);
        let summary = summarize(bytes.as_slice());
        assert_eq!(summary.samples, 1);
        assert!(summary.error.is_some());
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&b""[..]);
        assert_eq!(summary.samples, 0);
        assert!(summary.actuators.is_empty());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["samples"], 0);
    }

    #[test]
    fn test_execute_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a1.txt");
        std::fs::write(&path, log_of(&[Sample::default()])).unwrap();

        let cmd = InspectCommand {
            log: path,
            json: true,
        };
        cmd.execute().unwrap();

        let missing = InspectCommand {
            log: dir.path().join("a9.txt"),
            json: false,
        };
        assert!(missing.execute().is_err());
    }
}

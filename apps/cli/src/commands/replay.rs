//! replay 命令
//!
//! 在模拟硬件上试运行录制文件。

use anyhow::{Context, Result, bail};
use clap::Args;
use retrace_sdk::client::recording::{SessionReport, TracingProgress, replay_file};
use retrace_sdk::hal::mock::MockHardware;
use retrace_sdk::protocol::{ActuatorPort, DigitalPort, SampleReader};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// replay 参数
#[derive(Args, Debug)]
pub struct ReplayCommand {
    /// 录制文件
    pub log: PathBuf,

    /// 回放前打印每个样本
    #[arg(long)]
    pub trace: bool,
}

/// 模拟硬件观察到的通道活动
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayActivity {
    pub report: SessionReport,
    /// 每个端口的非零执行器写入次数（1..=10）
    pub actuator_writes: Vec<usize>,
    /// 每个端口的高电平数字写入次数（1..=12）
    pub digital_highs: Vec<usize>,
}

/// 在新的 [`MockHardware`] 上回放 `log`。
pub fn simulate(log: &std::path::Path) -> (ReplayActivity, MockHardware) {
    let hw = MockHardware::new();
    let report = replay_file(&hw, log, &mut TracingProgress);

    let actuator_writes = ActuatorPort::all()
        .map(|port| hw.motor_writes(port).iter().filter(|&&v| v != 0).count())
        .collect();
    let digital_highs = DigitalPort::all()
        .map(|port| hw.digital_writes(port).iter().filter(|&&l| l).count())
        .collect();

    (
        ReplayActivity {
            report,
            actuator_writes,
            digital_highs,
        },
        hw,
    )
}

impl ReplayCommand {
    pub fn execute(&self) -> Result<()> {
        if !self.log.exists() {
            bail!("Recording not found: {}", self.log.display());
        }

        if self.trace {
            let file = File::open(&self.log)
                .with_context(|| format!("Cannot open recording {}", self.log.display()))?;
            for (n, sample) in SampleReader::new(BufReader::new(file)).enumerate() {
                match sample {
                    Ok(sample) => println!("{n:>6}  {sample}"),
                    Err(e) => {
                        println!("{n:>6}  <{e}>");
                        break;
                    },
                }
            }
            println!();
        }

        let (activity, hw) = simulate(&self.log);
        let report = activity.report;

        println!("Outcome:   {:?}", report.outcome);
        println!("Samples:   {}", report.samples);
        println!("Simulated: {:.2} s", hw.elapsed().as_secs_f64());
        println!();
        println!("Actuator  active ticks");
        for (i, count) in activity.actuator_writes.iter().enumerate() {
            println!("{:>8}  {count}", i + 1);
        }
        println!("Digital   high ticks");
        for (i, count) in activity.digital_highs.iter().enumerate() {
            println!("{:>7}   {count}", i + 1);
        }

        if report.stopped_early() {
            bail!("Replay stopped early after {} sample(s)", report.samples);
        }
        Ok(())
    }
}

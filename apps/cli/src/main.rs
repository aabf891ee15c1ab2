//! # Retrace CLI
//!
//! 录制文件与配置的离线工具。
//!
//! ```bash
//! # 查看录制内容
//! retrace-cli inspect a1.txt
//! retrace-cli inspect a1.txt --json
//!
//! # 在模拟硬件上回放
//! retrace-cli replay sk.txt --trace
//!
//! # 配置
//! retrace-cli config init retrace.toml
//! retrace-cli config show --path retrace.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, InspectCommand, ReplayCommand};

/// Retrace CLI
#[derive(Parser, Debug)]
#[command(name = "retrace-cli")]
#[command(about = "Inspect, dry-run and configure retrace recordings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 汇总一个录制文件
    Inspect {
        #[command(flatten)]
        args: InspectCommand,
    },

    /// 在模拟硬件上回放录制文件
    Replay {
        #[command(flatten)]
        args: ReplayCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("retrace=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { args } => args.execute(),
        Commands::Replay { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
    }
}

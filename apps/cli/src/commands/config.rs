//! config 命令

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use retrace_sdk::client::RetraceConfig;
use std::path::PathBuf;

/// 配置子命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置
    Show {
        /// 配置文件；省略时使用默认配置
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// 将默认配置写入文件
    Init {
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self) -> Result<()> {
        match self {
            ConfigCommand::Show { path } => {
                let config = load(path.as_ref())?;
                print!("{}", config.to_toml_string()?);
                Ok(())
            },
            ConfigCommand::Init { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                RetraceConfig::default()
                    .save_to_file(path)
                    .with_context(|| format!("Cannot write {}", path.display()))?;
                println!("Wrote {}", path.display());
                Ok(())
            },
        }
    }
}

fn load(path: Option<&PathBuf>) -> Result<RetraceConfig> {
    match path {
        Some(path) => RetraceConfig::load_from_file(path)
            .with_context(|| format!("Cannot load {}", path.display())),
        None => Ok(RetraceConfig::default()),
    }
}

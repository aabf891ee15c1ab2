//! 命令定义

pub mod config;
pub mod inspect;
pub mod replay;

pub use config::ConfigCommand;
pub use inspect::InspectCommand;
pub use replay::ReplayCommand;

//! 常用导入
//!
//! ```rust
//! use retrace_sdk::prelude::*;
//! ```

// 对象
pub use crate::driver::{Motor, MotorSystem, Sensor, SensorKind, SensorSystem};

// Trait
pub use crate::client::{CompetitionStatus, ConvergenceExt, ProgressSink};
pub use crate::driver::{Actuator, Reading};
pub use crate::hal::Hardware;

// 控制与会话
pub use crate::client::{
    PollPolicy, Proportional, RetraceConfig, RobotContext, Seek, SessionOutcome, SessionReport,
    StopRule,
};

// 端口
pub use crate::protocol::{ActuatorPort, AnalogPort, DigitalPort, I2cPort};

// 错误
pub use crate::client::{ConfigError, ControlError};
pub use crate::driver::DriverError;
pub use crate::hal::HalError;
pub use crate::protocol::ProtocolError;

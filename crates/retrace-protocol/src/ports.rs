//! 经过校验的端口号
//!
//! 每类端口有独立的 newtype，数字端口不能传给需要执行器端口的地方。
//! 构造是唯一的校验点：值一旦存在就必然在范围内。
//!
//! | 类别     | 范围   |
//! |----------|--------|
//! | 执行器   | 1..=10 |
//! | 数字     | 1..=12 |
//! | 模拟     | 1..=8  |
//! | I2C      | 0..=9  |

use crate::ProtocolError;
use std::fmt;

/// 端口号所属的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortClass {
    Actuator,
    Digital,
    Analog,
    I2c,
}

impl PortClass {
    /// 该类别合法端口号的闭区间
    pub const fn range(self) -> (i32, i32) {
        match self {
            PortClass::Actuator => (1, 10),
            PortClass::Digital => (1, 12),
            PortClass::Analog => (1, 8),
            PortClass::I2c => (0, 9),
        }
    }

    pub fn contains(self, port: i32) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&port)
    }

    pub(crate) fn check(self, port: i32) -> Result<u8, ProtocolError> {
        let (min, max) = self.range();
        if self.contains(port) {
            Ok(port as u8)
        } else {
            Err(ProtocolError::InvalidPort {
                class: self,
                port,
                min,
                max,
            })
        }
    }
}

impl fmt::Display for PortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortClass::Actuator => "actuator",
            PortClass::Digital => "digital",
            PortClass::Analog => "analog",
            PortClass::I2c => "I2C",
        };
        f.write_str(name)
    }
}

macro_rules! define_port {
    ($(#[$meta:meta])* $name:ident, $class:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
        pub struct $name(u8);

        impl $name {
            pub const CLASS: PortClass = $class;
            pub const MIN: u8 = $class.range().0 as u8;
            pub const MAX: u8 = $class.range().1 as u8;

            /// 校验原始端口号。
            pub fn new(port: i32) -> Result<Self, ProtocolError> {
                Self::CLASS.check(port).map(Self)
            }

            /// 原始端口号
            pub const fn get(self) -> u8 {
                self.0
            }

            /// 在本类别中从 0 开始的位置
            pub const fn index(self) -> usize {
                (self.0 - Self::MIN) as usize
            }

            /// 本类别的所有端口，升序
            pub fn all() -> impl Iterator<Item = Self> {
                (Self::MIN..=Self::MAX).map(Self)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = ProtocolError;

            fn try_from(port: i32) -> Result<Self, Self::Error> {
                Self::new(port)
            }
        }

        impl From<$name> for i32 {
            fn from(port: $name) -> i32 {
                port.0 as i32
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", Self::CLASS, self.0)
            }
        }
    };
}

define_port!(
    /// 执行器（电机）端口，1..=10
    ActuatorPort,
    PortClass::Actuator
);
define_port!(
    /// 数字 I/O 端口，1..=12
    DigitalPort,
    PortClass::Digital
);
define_port!(
    /// 模拟输入端口，1..=8
    AnalogPort,
    PortClass::Analog
);
define_port!(
    /// I2C 编码器槽位，0..=9
    I2cPort,
    PortClass::I2c
);

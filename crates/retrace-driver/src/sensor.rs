//! 单个传感器
//!
//! [`Sensor`] 由 [`SensorKind`] 和 [`SensorBacking`] 组成，后者携带校验过的端口，
//! 以及需要时的硬件句柄。所有与类型相关的行为都是对 backing 的 `match`。

use crate::{DriverError, Reading};
use retrace_hal::{EncoderHandle, GyroHandle, Hardware, PinMode, UltrasonicHandle};
use retrace_protocol::{AnalogPort, DigitalPort, I2cPort, PortClass};
use smallvec::{SmallVec, smallvec};
use std::fmt;
use tracing::debug;

/// 输入（及简单输出）设备类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// I2C 链上的集成电机编码器
    IntegratedEncoder,
    /// 双线正交编码器
    QuadratureEncoder,
    Gyroscope,
    Accelerometer,
    /// 超声波测距仪（echo + ping）
    Ultrasonic,
    Potentiometer,
    LineTracker,
    LightSensor,
    Bumper,
    LimitSwitch,
    Led,
    Solenoid,
}

impl SensorKind {
    pub const ALL: [SensorKind; 12] = [
        SensorKind::IntegratedEncoder,
        SensorKind::QuadratureEncoder,
        SensorKind::Gyroscope,
        SensorKind::Accelerometer,
        SensorKind::Ultrasonic,
        SensorKind::Potentiometer,
        SensorKind::LineTracker,
        SensorKind::LightSensor,
        SensorKind::Bumper,
        SensorKind::LimitSwitch,
        SensorKind::Led,
        SensorKind::Solenoid,
    ];

    /// 该类型占用的端口数
    pub const fn port_count(self) -> usize {
        match self {
            SensorKind::QuadratureEncoder | SensorKind::Ultrasonic => 2,
            _ => 1,
        }
    }

    pub const fn is_analog(self) -> bool {
        matches!(
            self,
            SensorKind::Gyroscope
                | SensorKind::Accelerometer
                | SensorKind::Potentiometer
                | SensorKind::LineTracker
                | SensorKind::LightSensor
        )
    }

    /// 该类型端口的校验类别
    pub const fn port_class(self) -> PortClass {
        match self {
            SensorKind::IntegratedEncoder => PortClass::I2c,
            k if k.is_analog() => PortClass::Analog,
            _ => PortClass::Digital,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorKind::IntegratedEncoder => "integrated encoder",
            SensorKind::QuadratureEncoder => "quadrature encoder",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Ultrasonic => "ultrasonic",
            SensorKind::Potentiometer => "potentiometer",
            SensorKind::LineTracker => "line tracker",
            SensorKind::LightSensor => "light sensor",
            SensorKind::Bumper => "bumper",
            SensorKind::LimitSwitch => "limit switch",
            SensorKind::Led => "LED",
            SensorKind::Solenoid => "solenoid",
        };
        f.write_str(name)
    }
}

/// 传感器背后的端口和硬件句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorBacking {
    Ime {
        port: I2cPort,
    },
    Quadrature {
        top: DigitalPort,
        bottom: DigitalPort,
        handle: EncoderHandle,
    },
    Ultrasonic {
        echo: DigitalPort,
        ping: DigitalPort,
        handle: UltrasonicHandle,
    },
    Gyro {
        port: AnalogPort,
        multiplier: i32,
        handle: GyroHandle,
    },
    AnalogIn {
        port: AnalogPort,
    },
    DigitalIn {
        port: DigitalPort,
    },
    DigitalOut {
        port: DigitalPort,
    },
}

/// 单个传感器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    kind: SensorKind,
    backing: SensorBacking,
    opposite: bool,
}

impl Sensor {
    /// 按 `kind` 校验端口，获取硬件并复位传感器。
    ///
    /// 双端口类型接收 `[top, bottom]`（正交编码器）或 `[echo, ping]`（超声波）。
    /// 此处创建的陀螺仪使用默认标定，
    /// 参见 [`Sensor::gyro`]。
    pub fn new(hw: &dyn Hardware, kind: SensorKind, ports: &[i32]) -> Result<Self, DriverError> {
        if ports.len() != kind.port_count() {
            return Err(DriverError::PortCount {
                kind,
                expected: kind.port_count(),
                actual: ports.len(),
            });
        }

        let backing = match kind {
            SensorKind::IntegratedEncoder => {
                let port = I2cPort::new(ports[0])?;
                let found = hw.ime_initialize_all();
                debug!("Integrated encoder chain reports {found} device(s)");
                SensorBacking::Ime { port }
            },
            SensorKind::QuadratureEncoder => {
                let top = DigitalPort::new(ports[0])?;
                let bottom = DigitalPort::new(ports[1])?;
                let handle = hw.encoder_init(top, bottom, false)?;
                SensorBacking::Quadrature {
                    top,
                    bottom,
                    handle,
                }
            },
            SensorKind::Ultrasonic => {
                let echo = DigitalPort::new(ports[0])?;
                let ping = DigitalPort::new(ports[1])?;
                let handle = hw.ultrasonic_init(echo, ping)?;
                SensorBacking::Ultrasonic { echo, ping, handle }
            },
            SensorKind::Gyroscope => {
                return Self::gyro(hw, AnalogPort::new(ports[0])?, 0);
            },
            k if k.is_analog() => {
                let port = AnalogPort::new(ports[0])?;
                hw.analog_input(port);
                SensorBacking::AnalogIn { port }
            },
            SensorKind::Led | SensorKind::Solenoid => {
                let port = DigitalPort::new(ports[0])?;
                hw.pin_mode(port, PinMode::Output);
                SensorBacking::DigitalOut { port }
            },
            _ => {
                let port = DigitalPort::new(ports[0])?;
                hw.pin_mode(port, PinMode::Input);
                SensorBacking::DigitalIn { port }
            },
        };

        Ok(Self::finish(hw, kind, backing))
    }

    /// 带标定倍率的陀螺仪（0 表示默认）
    pub fn gyro(hw: &dyn Hardware, port: AnalogPort, multiplier: i32) -> Result<Self, DriverError> {
        let handle = hw.gyro_init(port, multiplier)?;
        let backing = SensorBacking::Gyro {
            port,
            multiplier,
            handle,
        };
        Ok(Self::finish(hw, SensorKind::Gyroscope, backing))
    }

    fn finish(hw: &dyn Hardware, kind: SensorKind, backing: SensorBacking) -> Self {
        let sensor = Self {
            kind,
            backing,
            opposite: false,
        };
        sensor.reset(hw);
        sensor
    }

    /// 当前读数。这里不做取反；只有正交编码器的符号
    /// 随 [`toggle_opposite`](Sensor::toggle_opposite) 变化。
    pub fn read(&self, hw: &dyn Hardware) -> i32 {
        match &self.backing {
            SensorBacking::Ime { port } => hw.ime_get(*port).unwrap_or(0),
            SensorBacking::Quadrature { handle, .. } => hw.encoder_get(*handle),
            SensorBacking::Ultrasonic { handle, .. } => hw.ultrasonic_get(*handle),
            SensorBacking::Gyro { handle, .. } => hw.gyro_get(*handle),
            SensorBacking::AnalogIn { port } => hw.analog_read(*port),
            SensorBacking::DigitalIn { port } | SensorBacking::DigitalOut { port } => {
                hw.digital_read(*port) as i32
            },
        }
    }

    /// 将主端口驱动为数字电平（非零为高）。
    ///
    /// 所有非模拟类型写其第一个数字端口：正交编码器的 top 线，
    /// 测距仪的 echo 线。模拟类型忽略此调用，
    /// 集成编码器也忽略，它的端口是 I2C 槽位，
    /// 背后没有数字线。
    pub fn write(&self, hw: &dyn Hardware, value: i32) {
        match self.digital_line() {
            Some(port) => hw.digital_write(port, value != 0),
            None if !self.is_analog() => {
                debug!("{} on I2C slot {} has no digital line", self.kind, self.primary_port());
            },
            None => {},
        }
    }

    /// 非模拟传感器的第一个数字端口
    fn digital_line(&self) -> Option<DigitalPort> {
        match &self.backing {
            SensorBacking::Quadrature { top: port, .. }
            | SensorBacking::Ultrasonic { echo: port, .. }
            | SensorBacking::DigitalIn { port }
            | SensorBacking::DigitalOut { port } => Some(*port),
            SensorBacking::Ime { .. }
            | SensorBacking::Gyro { .. }
            | SensorBacking::AnalogIn { .. } => None,
        }
    }

    /// 在硬件允许的范围内将传感器清零。
    ///
    /// 编码器和陀螺仪通过硬件复位。普通数字类型和测距仪
    /// 写入低电平（见 [`write`](Sensor::write)）。
    /// 普通模拟输入无法复位。
    pub fn reset(&self, hw: &dyn Hardware) {
        match &self.backing {
            SensorBacking::Ime { port } => {
                if !hw.ime_reset(*port) {
                    debug!("No integrated encoder answering on {port}");
                }
            },
            SensorBacking::Quadrature { handle, .. } => hw.encoder_reset(*handle),
            SensorBacking::Gyro { handle, .. } => hw.gyro_reset(*handle),
            SensorBacking::Ultrasonic { .. }
            | SensorBacking::DigitalIn { .. }
            | SensorBacking::DigitalOut { .. } => self.write(hw, 0),
            SensorBacking::AnalogIn { .. } => {},
        }
    }

    /// 翻转 opposite 标志并返回。
    ///
    /// 正交编码器会先关闭，再以新极性重新获取。
    /// 重新获取失败时标志不变，
    /// 编码器在再次切换前读数为零。
    pub fn toggle_opposite(&mut self, hw: &dyn Hardware) -> Result<bool, DriverError> {
        let opposite = !self.opposite;
        if let SensorBacking::Quadrature {
            top,
            bottom,
            handle,
        } = &mut self.backing
        {
            hw.encoder_shutdown(*handle);
            *handle = hw.encoder_init(*top, *bottom, opposite)?;
            debug!("Re-acquired encoder on {top}/{bottom}, reversed = {opposite}");
        }
        self.opposite = opposite;
        Ok(opposite)
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn backing(&self) -> &SensorBacking {
        &self.backing
    }

    pub fn port_count(&self) -> usize {
        self.kind.port_count()
    }

    /// 按声明顺序的原始端口号
    pub fn ports(&self) -> SmallVec<[u8; 2]> {
        match &self.backing {
            SensorBacking::Ime { port } => smallvec![port.get()],
            SensorBacking::Quadrature { top, bottom, .. } => smallvec![top.get(), bottom.get()],
            SensorBacking::Ultrasonic { echo, ping, .. } => smallvec![echo.get(), ping.get()],
            SensorBacking::Gyro { port, .. } | SensorBacking::AnalogIn { port } => {
                smallvec![port.get()]
            },
            SensorBacking::DigitalIn { port } | SensorBacking::DigitalOut { port } => {
                smallvec![port.get()]
            },
        }
    }

    pub fn primary_port(&self) -> u8 {
        self.ports()[0]
    }

    pub fn is_opposite(&self) -> bool {
        self.opposite
    }

    pub fn is_analog(&self) -> bool {
        self.kind.is_analog()
    }

    /// 消耗传感器，释放正交编码器的句柄。
    pub fn release(self, hw: &dyn Hardware) {
        if let SensorBacking::Quadrature { handle, .. } = self.backing {
            hw.encoder_shutdown(handle);
        }
    }
}

impl Reading for Sensor {
    fn read(&self, hw: &dyn Hardware) -> i32 {
        Sensor::read(self, hw)
    }
}

//! 模拟硬件
//!
//! 用于测试和离线演练的内存 [`Hardware`] 实现。
//!
//! - **虚拟时钟**：`delay()` 推进时钟而不真正休眠，
//!   15 秒的录制在微秒内完成。
//! - **脚本化读数**：每个输入通道可以设置一个值队列，
//!   每次读取弹出一个，队列空后保持最后一个值。
//! - **事件日志**：每次写入和配置调用都追加到日志中，
//!   供测试检查。
//!
//! `MockHardware` 是轻量句柄：克隆共享同一状态，
//! 测试可以保留一个，同时由上下文持有另一个。

use crate::{EncoderHandle, GyroHandle, HalError, Hardware, PinMode, UltrasonicHandle};
use parking_lot::Mutex;
use retrace_protocol::{
    ACTUATOR_CHANNELS, ANALOG_CHANNELS, ActuatorPort, AnalogPort, DIGITAL_CHANNELS, DigitalPort,
    I2C_CHANNELS, I2cPort,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// 一次可观察的硬件交互
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HalEvent {
    MotorSet { port: u8, value: i32 },
    MotorStopAll,
    PinMode { port: u8, mode: PinMode },
    AnalogInput { port: u8 },
    DigitalWrite { port: u8, level: bool },
    EncoderInit { top: u8, bottom: u8, reversed: bool, handle: u32 },
    EncoderReset { handle: u32 },
    EncoderShutdown { handle: u32 },
    UltrasonicInit { echo: u8, ping: u8 },
    GyroInit { port: u8, multiplier: i32 },
    GyroReset { port: u8 },
    ImeInitializeAll,
    ImeReset { port: u8 },
    Delay(Duration),
}

/// 脚本化的输入值
#[derive(Debug, Default)]
struct Reading {
    value: i32,
    script: VecDeque<i32>,
}

impl Reading {
    fn next(&mut self) -> i32 {
        if let Some(v) = self.script.pop_front() {
            self.value = v;
        }
        self.value
    }
}

#[derive(Debug)]
struct MockEncoder {
    top: u8,
    reversed: bool,
    active: bool,
}

/// 将编码器与执行器耦合：每次读取计数增加
/// `motor_value / divisor`。
#[derive(Debug, Clone, Copy)]
struct Link {
    motor: usize,
    divisor: i32,
}

#[derive(Debug)]
struct MockState {
    motors: [i32; ACTUATOR_CHANNELS],
    digital: [bool; DIGITAL_CHANNELS],
    pin_modes: [Option<PinMode>; DIGITAL_CHANNELS],
    analog: Vec<Reading>,
    // 按编码器的 top 端口索引，重新获取后计数保留
    encoder_counts: HashMap<u8, Reading>,
    encoder_links: HashMap<u8, Link>,
    encoders: Vec<MockEncoder>,
    ultrasonic: HashMap<u8, Reading>,
    ultrasonics: Vec<u8>,
    gyro: HashMap<u8, Reading>,
    gyros: Vec<u8>,
    ime: Vec<Reading>,
    ime_connected: usize,
    events: Vec<HalEvent>,
    clock: Duration,
    unavailable: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            motors: [0; ACTUATOR_CHANNELS],
            digital: [false; DIGITAL_CHANNELS],
            pin_modes: [None; DIGITAL_CHANNELS],
            analog: (0..ANALOG_CHANNELS).map(|_| Reading::default()).collect(),
            encoder_counts: HashMap::new(),
            encoder_links: HashMap::new(),
            encoders: Vec::new(),
            ultrasonic: HashMap::new(),
            ultrasonics: Vec::new(),
            gyro: HashMap::new(),
            gyros: Vec::new(),
            ime: (0..I2C_CHANNELS).map(|_| Reading::default()).collect(),
            ime_connected: I2C_CHANNELS,
            events: Vec::new(),
            clock: Duration::ZERO,
            unavailable: false,
        }
    }
}

impl MockState {
    fn record(&mut self, event: HalEvent) {
        tracing::trace!(?event, "mock hardware");
        self.events.push(event);
    }

    fn acquire_check(&self, what: &str) -> Result<(), HalError> {
        if self.unavailable {
            Err(HalError::ResourceUnavailable(what.to_string()))
        } else {
            Ok(())
        }
    }
}

/// 内存中的机器人控制器
#[derive(Debug, Clone, Default)]
pub struct MockHardware {
    state: Arc<Mutex<MockState>>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    // --- 检查 ---

    /// 目前记录的所有事件
    pub fn events(&self) -> Vec<HalEvent> {
        self.state.lock().events.clone()
    }

    /// 取出并清空事件日志
    pub fn take_events(&self) -> Vec<HalEvent> {
        std::mem::take(&mut self.state.lock().events)
    }

    /// 执行器当前的指令值
    pub fn motor(&self, port: ActuatorPort) -> i32 {
        self.state.lock().motors[port.index()]
    }

    /// 数字端口当前电平
    pub fn digital(&self, port: DigitalPort) -> bool {
        self.state.lock().digital[port.index()]
    }

    pub fn pin_mode_of(&self, port: DigitalPort) -> Option<PinMode> {
        self.state.lock().pin_modes[port.index()]
    }

    /// 写入某个执行器的值，按顺序
    pub fn motor_writes(&self, port: ActuatorPort) -> Vec<i32> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match *e {
                HalEvent::MotorSet { port: p, value } if p == port.get() => Some(value),
                _ => None,
            })
            .collect()
    }

    /// 写入某个数字端口的电平，按顺序
    pub fn digital_writes(&self, port: DigitalPort) -> Vec<bool> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match *e {
                HalEvent::DigitalWrite { port: p, level } if p == port.get() => Some(level),
                _ => None,
            })
            .collect()
    }

    /// `delay()` 累计的总时长
    pub fn elapsed(&self) -> Duration {
        self.state.lock().clock
    }

    // --- 脚本 ---

    /// 像外部输入一样设置数字端口电平
    pub fn set_digital(&self, port: DigitalPort, level: bool) {
        self.state.lock().digital[port.index()] = level;
    }

    pub fn set_analog(&self, port: AnalogPort, value: i32) {
        let mut state = self.state.lock();
        let reading = &mut state.analog[port.index()];
        reading.script.clear();
        reading.value = value;
    }

    pub fn script_analog(&self, port: AnalogPort, values: impl IntoIterator<Item = i32>) {
        self.state.lock().analog[port.index()].script.extend(values);
    }

    /// 为 top 线为 `top` 的编码器设置原始（未反向）计数脚本
    pub fn script_encoder(&self, top: DigitalPort, values: impl IntoIterator<Item = i32>) {
        self.state
            .lock()
            .encoder_counts
            .entry(top.get())
            .or_default()
            .script
            .extend(values);
    }

    /// 让 `top` 上的编码器对 `motor` 的输出积分。
    ///
    /// 每次读取先将 `motor_value / divisor` 加到计数上再返回。
    /// 脚本值仍然优先。
    pub fn link_encoder(&self, top: DigitalPort, motor: ActuatorPort, divisor: i32) {
        self.state.lock().encoder_links.insert(
            top.get(),
            Link {
                motor: motor.index(),
                divisor: divisor.max(1),
            },
        );
    }

    pub fn script_ultrasonic(&self, echo: DigitalPort, values: impl IntoIterator<Item = i32>) {
        self.state
            .lock()
            .ultrasonic
            .entry(echo.get())
            .or_default()
            .script
            .extend(values);
    }

    pub fn script_gyro(&self, port: AnalogPort, values: impl IntoIterator<Item = i32>) {
        self.state
            .lock()
            .gyro
            .entry(port.get())
            .or_default()
            .script
            .extend(values);
    }

    pub fn script_ime(&self, port: I2cPort, values: impl IntoIterator<Item = i32>) {
        self.state.lock().ime[port.index()].script.extend(values);
    }

    /// I2C 链上有应答的集成编码器数量（槽位 `0..count`）
    pub fn set_ime_connected(&self, count: usize) {
        self.state.lock().ime_connected = count.min(I2C_CHANNELS);
    }

    /// 之后所有句柄获取都失败
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }
}

impl Hardware for MockHardware {
    fn motor_set(&self, port: ActuatorPort, value: i32) {
        let mut state = self.state.lock();
        state.motors[port.index()] = value;
        state.record(HalEvent::MotorSet {
            port: port.get(),
            value,
        });
    }

    fn motor_get(&self, port: ActuatorPort) -> i32 {
        self.state.lock().motors[port.index()]
    }

    fn motor_stop_all(&self) {
        let mut state = self.state.lock();
        state.motors = [0; ACTUATOR_CHANNELS];
        state.record(HalEvent::MotorStopAll);
    }

    fn pin_mode(&self, port: DigitalPort, mode: PinMode) {
        let mut state = self.state.lock();
        state.pin_modes[port.index()] = Some(mode);
        state.record(HalEvent::PinMode {
            port: port.get(),
            mode,
        });
    }

    fn analog_input(&self, port: AnalogPort) {
        self.state
            .lock()
            .record(HalEvent::AnalogInput { port: port.get() });
    }

    fn digital_read(&self, port: DigitalPort) -> bool {
        self.state.lock().digital[port.index()]
    }

    fn digital_write(&self, port: DigitalPort, level: bool) {
        let mut state = self.state.lock();
        state.digital[port.index()] = level;
        state.record(HalEvent::DigitalWrite {
            port: port.get(),
            level,
        });
    }

    fn analog_read(&self, port: AnalogPort) -> i32 {
        self.state.lock().analog[port.index()].next()
    }

    fn encoder_init(
        &self,
        top: DigitalPort,
        bottom: DigitalPort,
        reversed: bool,
    ) -> Result<EncoderHandle, HalError> {
        let mut state = self.state.lock();
        state.acquire_check(&format!("encoder on {top}"))?;
        let handle = state.encoders.len() as u32;
        state.encoders.push(MockEncoder {
            top: top.get(),
            reversed,
            active: true,
        });
        state.encoder_counts.entry(top.get()).or_default();
        state.record(HalEvent::EncoderInit {
            top: top.get(),
            bottom: bottom.get(),
            reversed,
            handle,
        });
        Ok(EncoderHandle::from_raw(handle))
    }

    fn encoder_get(&self, handle: EncoderHandle) -> i32 {
        let mut state = self.state.lock();
        let Some((top, reversed)) = state
            .encoders
            .get(handle.raw() as usize)
            .filter(|e| e.active)
            .map(|e| (e.top, e.reversed))
        else {
            return 0;
        };

        let link = state.encoder_links.get(&top).copied();
        let drive = link.map(|l| state.motors[l.motor] / l.divisor);
        let reading = state.encoder_counts.entry(top).or_default();
        let value = if reading.script.is_empty() {
            if let Some(delta) = drive {
                reading.value += delta;
            }
            reading.value
        } else {
            reading.next()
        };

        if reversed { -value } else { value }
    }

    fn encoder_reset(&self, handle: EncoderHandle) {
        let mut state = self.state.lock();
        let top = state.encoders.get(handle.raw() as usize).map(|e| e.top);
        if let Some(top) = top {
            state.encoder_counts.entry(top).or_default().value = 0;
        }
        state.record(HalEvent::EncoderReset {
            handle: handle.raw(),
        });
    }

    fn encoder_shutdown(&self, handle: EncoderHandle) {
        let mut state = self.state.lock();
        if let Some(encoder) = state.encoders.get_mut(handle.raw() as usize) {
            encoder.active = false;
        }
        state.record(HalEvent::EncoderShutdown {
            handle: handle.raw(),
        });
    }

    fn ultrasonic_init(
        &self,
        echo: DigitalPort,
        ping: DigitalPort,
    ) -> Result<UltrasonicHandle, HalError> {
        let mut state = self.state.lock();
        state.acquire_check(&format!("ultrasonic on {echo}"))?;
        let handle = state.ultrasonics.len() as u32;
        state.ultrasonics.push(echo.get());
        state.ultrasonic.entry(echo.get()).or_default();
        state.record(HalEvent::UltrasonicInit {
            echo: echo.get(),
            ping: ping.get(),
        });
        Ok(UltrasonicHandle::from_raw(handle))
    }

    fn ultrasonic_get(&self, handle: UltrasonicHandle) -> i32 {
        let mut state = self.state.lock();
        match state.ultrasonics.get(handle.raw() as usize).copied() {
            Some(echo) => state.ultrasonic.entry(echo).or_default().next(),
            None => 0,
        }
    }

    fn gyro_init(&self, port: AnalogPort, multiplier: i32) -> Result<GyroHandle, HalError> {
        let mut state = self.state.lock();
        state.acquire_check(&format!("gyroscope on {port}"))?;
        let handle = state.gyros.len() as u32;
        state.gyros.push(port.get());
        state.gyro.entry(port.get()).or_default();
        state.record(HalEvent::GyroInit {
            port: port.get(),
            multiplier,
        });
        Ok(GyroHandle::from_raw(handle))
    }

    fn gyro_get(&self, handle: GyroHandle) -> i32 {
        let mut state = self.state.lock();
        match state.gyros.get(handle.raw() as usize).copied() {
            Some(port) => state.gyro.entry(port).or_default().next(),
            None => 0,
        }
    }

    fn gyro_reset(&self, handle: GyroHandle) {
        let mut state = self.state.lock();
        if let Some(port) = state.gyros.get(handle.raw() as usize).copied() {
            state.gyro.entry(port).or_default().value = 0;
            state.record(HalEvent::GyroReset { port });
        }
    }

    fn ime_initialize_all(&self) -> usize {
        let mut state = self.state.lock();
        state.record(HalEvent::ImeInitializeAll);
        state.ime_connected
    }

    fn ime_get(&self, port: I2cPort) -> Option<i32> {
        let mut state = self.state.lock();
        if port.index() < state.ime_connected {
            Some(state.ime[port.index()].next())
        } else {
            None
        }
    }

    fn ime_reset(&self, port: I2cPort) -> bool {
        let mut state = self.state.lock();
        state.record(HalEvent::ImeReset { port: port.get() });
        if port.index() < state.ime_connected {
            state.ime[port.index()].value = 0;
            true
        } else {
            false
        }
    }

    fn delay(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.clock += duration;
        state.record(HalEvent::Delay(duration));
    }

    fn uptime(&self) -> Duration {
        self.state.lock().clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dp(n: i32) -> DigitalPort {
        DigitalPort::new(n).unwrap()
    }

    #[test]
    fn test_delay_advances_virtual_clock() {
        let hw = MockHardware::new();
        hw.delay(Duration::from_millis(20));
        hw.delay(Duration::from_millis(20));
        assert_eq!(hw.elapsed(), Duration::from_millis(40));
        assert_eq!(hw.uptime(), Duration::from_millis(40));
    }

    #[test]
    fn test_scripted_reading_sticks_on_last_value() {
        let hw = MockHardware::new();
        let port = AnalogPort::new(2).unwrap();
        hw.script_analog(port, [5, 6]);
        assert_eq!(hw.analog_read(port), 5);
        assert_eq!(hw.analog_read(port), 6);
        assert_eq!(hw.analog_read(port), 6);
    }

    #[test]
    fn test_encoder_reversed_handle_flips_sign() {
        let hw = MockHardware::new();
        hw.script_encoder(dp(1), [42]);
        let forward = hw.encoder_init(dp(1), dp(2), false).unwrap();
        assert_eq!(hw.encoder_get(forward), 42);

        hw.encoder_shutdown(forward);
        let reversed = hw.encoder_init(dp(1), dp(2), true).unwrap();
        assert_eq!(hw.encoder_get(reversed), -42);
        assert_eq!(hw.encoder_get(forward), 0);
    }

    #[test]
    fn test_encoder_reset_keeps_script() {
        let hw = MockHardware::new();
        let handle = hw.encoder_init(dp(3), dp(4), false).unwrap();
        hw.script_encoder(dp(3), [10]);
        assert_eq!(hw.encoder_get(handle), 10);
        hw.encoder_reset(handle);
        assert_eq!(hw.encoder_get(handle), 0);
    }

    #[test]
    fn test_linked_encoder_integrates_motor_output() {
        let hw = MockHardware::new();
        let motor = ActuatorPort::new(1).unwrap();
        let handle = hw.encoder_init(dp(1), dp(2), false).unwrap();
        hw.link_encoder(dp(1), motor, 2);

        hw.motor_set(motor, 10);
        assert_eq!(hw.encoder_get(handle), 5);
        assert_eq!(hw.encoder_get(handle), 10);
        hw.motor_set(motor, -4);
        assert_eq!(hw.encoder_get(handle), 8);
    }

    #[test]
    fn test_unavailable_acquisition_fails() {
        let hw = MockHardware::new();
        hw.set_unavailable(true);
        assert!(matches!(
            hw.encoder_init(dp(1), dp(2), false),
            Err(HalError::ResourceUnavailable(_))
        ));
        assert!(hw.gyro_init(AnalogPort::new(1).unwrap(), 0).is_err());
        assert!(hw.ultrasonic_init(dp(5), dp(6)).is_err());
    }

    #[test]
    fn test_ime_connected_slots() {
        let hw = MockHardware::new();
        hw.set_ime_connected(2);
        assert_eq!(hw.ime_initialize_all(), 2);
        assert_eq!(hw.ime_get(I2cPort::new(1).unwrap()), Some(0));
        assert_eq!(hw.ime_get(I2cPort::new(2).unwrap()), None);
        assert!(!hw.ime_reset(I2cPort::new(5).unwrap()));
    }

    #[test]
    fn test_journal_and_write_filters() {
        let hw = MockHardware::new();
        let motor = ActuatorPort::new(4).unwrap();
        hw.motor_set(motor, 12);
        hw.digital_write(dp(7), true);
        hw.motor_set(motor, -3);

        assert_eq!(hw.motor_writes(motor), vec![12, -3]);
        assert_eq!(hw.digital_writes(dp(7)), vec![true]);
        assert_eq!(hw.take_events().len(), 3);
        assert!(hw.events().is_empty());
    }
}

//! 协议常量

use std::time::Duration;

/// 控制器上的执行器（电机）通道数
pub const ACTUATOR_CHANNELS: usize = 10;

/// 控制器上的数字 I/O 通道数
pub const DIGITAL_CHANNELS: usize = 12;

/// 控制器上的模拟输入通道数
pub const ANALOG_CHANNELS: usize = 8;

/// 控制器上的 I2C 编码器槽位数
pub const I2C_CHANNELS: usize = 10;

/// 执行器接受的最大速度绝对值
pub const MAX_VELOCITY: i32 = 127;

/// 写入录制文件前加到速度上的偏移量
pub const VELOCITY_OFFSET: i32 = 127;

/// 录制与回放周期（毫秒）。
///
/// 录制格式没有时间戳：第 `n` 个样本固定发生在 `n * TICK_MS`。
/// 修改此值会使所有已有录制失效。
pub const TICK_MS: u64 = 20;

/// 录制与回放周期（[`Duration`]）。
pub const TICK: Duration = Duration::from_millis(TICK_MS);

/// 单个执行器字段的字符数
pub const ACTUATOR_FIELD_LEN: usize = 2;

/// 单个数字字段的字符数
pub const DIGITAL_FIELD_LEN: usize = 1;

/// 单个样本的字符数（10 × 2 + 12 × 1）
pub const SAMPLE_LEN: usize =
    ACTUATOR_CHANNELS * ACTUATOR_FIELD_LEN + DIGITAL_CHANNELS * DIGITAL_FIELD_LEN;

/// 时长为 `duration` 的录制产生的样本数（按周期整除）。
pub fn sample_count(duration: Duration) -> u64 {
    duration.as_millis() as u64 / TICK_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_len() {
        assert_eq!(SAMPLE_LEN, 32);
    }

    #[test]
    fn test_sample_count_truncates() {
        assert_eq!(sample_count(Duration::from_millis(0)), 0);
        assert_eq!(sample_count(Duration::from_millis(19)), 0);
        assert_eq!(sample_count(Duration::from_millis(40)), 2);
        assert_eq!(sample_count(Duration::from_millis(50)), 2);
        assert_eq!(sample_count(Duration::from_secs(15)), 750);
    }
}

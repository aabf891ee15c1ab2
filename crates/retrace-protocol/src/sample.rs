//! 录制样本编解码
//!
//! 录制文件是定宽样本的平铺序列，每个周期一个，
//! 没有文件头、分隔符和时间戳：
//!
//! ```text
//! sample := actuator{10} digital{12}
//! actuator := HEX HEX        ; 速度 + 127，0x00..=0xFE，高位在前
//! digital  := HEX            ; 电平，"0" 或 "1"
//! HEX      := [0-9A-F]
//! ```
//!
//! 因此一个样本是 32 个字符。解码是严格的：只接受大写数字，
//! 数字字段只接受 `0`/`1`，所以合法样本解码后再编码逐字节一致。

use crate::constants::{
    ACTUATOR_CHANNELS, ACTUATOR_FIELD_LEN, DIGITAL_CHANNELS, MAX_VELOCITY, SAMPLE_LEN,
    VELOCITY_OFFSET,
};
use crate::{ProtocolError, clamp_velocity};
use std::fmt;
use std::io::{self, Read, Write};

/// 执行器字段的最大值（`MAX_VELOCITY + VELOCITY_OFFSET`）
const MAX_ACTUATOR_OFFSET: u8 = (MAX_VELOCITY + VELOCITY_OFFSET) as u8;

/// 样本中执行器部分的字符数
const ACTUATOR_BLOCK_LEN: usize = ACTUATOR_CHANNELS * ACTUATOR_FIELD_LEN;

/// 一个周期的通道状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// 执行器端口 1..=10 的指令速度
    pub actuators: [i32; ACTUATOR_CHANNELS],
    /// 数字端口 1..=12 的电平
    pub digital: [bool; DIGITAL_CHANNELS],
}

impl Sample {
    pub fn new(actuators: [i32; ACTUATOR_CHANNELS], digital: [bool; DIGITAL_CHANNELS]) -> Self {
        Self { actuators, digital }
    }

    /// 编码样本。
    ///
    /// 超出 `[-127, 127]` 的执行器值先被限幅，与硬件的处理一致。
    pub fn encode(&self) -> [u8; SAMPLE_LEN] {
        let offsets = self.actuators.map(|v| (clamp_velocity(v) + VELOCITY_OFFSET) as u8);
        let hex = hex::encode_upper(offsets);

        let mut out = [0u8; SAMPLE_LEN];
        out[..ACTUATOR_BLOCK_LEN].copy_from_slice(hex.as_bytes());
        for (slot, level) in out[ACTUATOR_BLOCK_LEN..].iter_mut().zip(self.digital) {
            *slot = if level { b'1' } else { b'0' };
        }
        out
    }

    /// 将编码后的样本写入 `writer`。
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.encode())
    }

    /// 解码一个样本。
    ///
    /// `bytes` 长度必须正好是 [`SAMPLE_LEN`]。数字字段必须是 `0` 或 `1`，
    /// 其他数字返回 [`ProtocolError::InvalidDigit`]。
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != SAMPLE_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: SAMPLE_LEN,
                actual: bytes.len(),
            });
        }

        let (actuator_block, digital_block) = bytes.split_at(ACTUATOR_BLOCK_LEN);

        // hex 接受小写，录制格式不接受
        for (offset, &byte) in actuator_block.iter().enumerate() {
            digit_value(byte).ok_or(ProtocolError::InvalidDigit { offset, byte })?;
        }

        let mut offsets = [0u8; ACTUATOR_CHANNELS];
        hex::decode_to_slice(actuator_block, &mut offsets).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => ProtocolError::InvalidDigit {
                offset: index,
                byte: c as u8,
            },
            _ => ProtocolError::InvalidLength {
                expected: ACTUATOR_BLOCK_LEN,
                actual: actuator_block.len(),
            },
        })?;

        let mut actuators = [0i32; ACTUATOR_CHANNELS];
        for (channel, (&offset, value)) in offsets.iter().zip(actuators.iter_mut()).enumerate() {
            if offset > MAX_ACTUATOR_OFFSET {
                return Err(ProtocolError::ActuatorOutOfRange {
                    channel: channel + 1,
                    offset,
                    max: MAX_ACTUATOR_OFFSET,
                });
            }
            *value = offset as i32 - VELOCITY_OFFSET;
        }

        let mut digital = [false; DIGITAL_CHANNELS];
        for (i, (&byte, level)) in digital_block.iter().zip(digital.iter_mut()).enumerate() {
            *level = match byte {
                b'0' => false,
                b'1' => true,
                _ => {
                    return Err(ProtocolError::InvalidDigit {
                        offset: ACTUATOR_BLOCK_LEN + i,
                        byte,
                    });
                },
            };
        }

        Ok(Self { actuators, digital })
    }

    /// 解码内存中的整个录制。
    ///
    /// 遇到第一个坏样本即失败，包括末尾不完整的样本。
    pub fn decode_all(bytes: &[u8]) -> Result<Vec<Self>, ProtocolError> {
        let chunks = bytes.chunks_exact(SAMPLE_LEN);
        let remainder = chunks.remainder().len();
        let samples = chunks.map(Self::decode).collect::<Result<Vec<_>, _>>()?;
        if remainder != 0 {
            return Err(ProtocolError::InvalidLength {
                expected: SAMPLE_LEN,
                actual: remainder,
            });
        }
        Ok(samples)
    }

    /// 执行器端口的指令速度（从 1 开始）
    pub fn actuator(&self, port: crate::ActuatorPort) -> i32 {
        self.actuators[port.index()]
    }

    /// 数字端口的电平（从 1 开始）
    pub fn digital(&self, port: crate::DigitalPort) -> bool {
        self.digital[port.index()]
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.encode();
        // encode() 只产生 ASCII 数字
        f.write_str(std::str::from_utf8(&encoded).map_err(|_| fmt::Error)?)
    }
}

/// 单个大写十六进制数字的值
fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// 流式样本读取器
///
/// 从任意 [`Read`] 逐个读取样本。在样本边界处正常结束即结束流；
/// 末尾不完整的样本或非法数字报告为 [`io::ErrorKind::InvalidData`]，
/// 内含 [`ProtocolError`]。
pub struct SampleReader<R> {
    inner: R,
    samples_read: u64,
}

impl<R: Read> SampleReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            samples_read: 0,
        }
    }

    /// 目前成功解码的样本数
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }

    /// 读取下一个样本，输入结束时返回 `Ok(None)`。
    pub fn read_sample(&mut self) -> io::Result<Option<Sample>> {
        let mut buf = [0u8; SAMPLE_LEN];
        let mut filled = 0;
        while filled < SAMPLE_LEN {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled == 0 {
            return Ok(None);
        }

        let sample = Sample::decode(&buf[..filled])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.samples_read += 1;
        Ok(Some(sample))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for SampleReader<R> {
    type Item = io::Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_sample().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> Sample {
        Sample::default()
    }

    #[test]
    fn test_idle_sample_encoding() {
        let encoded = idle().encode();
        assert_eq!(&encoded[..], b"7F7F7F7F7F7F7F7F7F7F000000000000".as_slice());
    }

    #[test]
    fn test_boundary_values() {
        let mut sample = idle();
        sample.actuators[0] = -127;
        sample.actuators[1] = 127;
        let encoded = sample.encode();
        assert_eq!(&encoded[0..2], b"00");
        assert_eq!(&encoded[2..4], b"FE");
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut sample = idle();
        sample.actuators[0] = 300;
        sample.actuators[1] = -300;
        let encoded = sample.encode();
        assert_eq!(&encoded[0..2], b"FE");
        assert_eq!(&encoded[2..4], b"00");
    }

    #[test]
    fn test_digital_fields() {
        let mut sample = idle();
        sample.digital[0] = true;
        sample.digital[11] = true;
        let encoded = sample.encode();
        assert_eq!(encoded[20], b'1');
        assert_eq!(encoded[31], b'1');
        assert!(encoded[21..31].iter().all(|&b| b == b'0'));
    }

    #[test]
    fn test_decode_known_sample() {
        let sample = Sample::decode(b"896B7F7F7F7F7F7F7F7F100000000001").unwrap();
        assert_eq!(sample.actuators[0], 0x89 - 127);
        assert_eq!(sample.actuators[0], 10);
        assert_eq!(sample.actuators[1], -20);
        assert!(sample.actuators[2..].iter().all(|&v| v == 0));
        assert!(sample.digital[0]);
        assert!(sample.digital[11]);
        assert!(!sample.digital[5]);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = Sample::decode(b"7F7F").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidLength {
                expected: 32,
                actual: 4
            }
        );
    }

    #[test]
    fn test_decode_rejects_lowercase() {
        let err = Sample::decode(b"7f7F7F7F7F7F7F7F7F7F000000000000").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidDigit { offset: 1, byte: b'f' });
    }

    #[test]
    fn test_decode_rejects_offset_255() {
        let err = Sample::decode(b"7FFF7F7F7F7F7F7F7F7F000000000000").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ActuatorOutOfRange {
                channel: 2,
                offset: 0xFF,
                max: 0xFE
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_digital_digit() {
        let err = Sample::decode(b"7F7F7F7F7F7F7F7F7F7F00000000000x").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidDigit { offset: 31, byte: b'x' });
    }

    #[test]
    fn test_decode_rejects_digital_digit_above_one() {
        let err = Sample::decode(b"7F7F7F7F7F7F7F7F7F7F20000000000F").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidDigit { offset: 20, byte: b'2' });

        let err = Sample::decode(b"7F7F7F7F7F7F7F7F7F7F00000000000F").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidDigit { offset: 31, byte: b'F' });
    }

    #[test]
    fn test_decode_all_reports_truncated_tail() {
        let mut bytes = idle().encode().to_vec();
        bytes.extend_from_slice(b"7F7F");
        let err = Sample::decode_all(&bytes).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidLength {
                expected: 32,
                actual: 4
            }
        );
    }

    #[test]
    fn test_sample_reader() {
        let mut first = idle();
        first.actuators[0] = 10;
        let mut second = idle();
        second.actuators[0] = -20;

        let mut bytes = Vec::new();
        first.write_to(&mut bytes).unwrap();
        second.write_to(&mut bytes).unwrap();

        let mut reader = SampleReader::new(bytes.as_slice());
        assert_eq!(reader.read_sample().unwrap(), Some(first));
        assert_eq!(reader.read_sample().unwrap(), Some(second));
        assert_eq!(reader.read_sample().unwrap(), None);
        assert_eq!(reader.samples_read(), 2);
    }

    #[test]
    fn test_sample_reader_partial_tail_is_invalid_data() {
        let mut bytes = idle().encode().to_vec();
        bytes.extend_from_slice(b"7F");

        let mut reader = SampleReader::new(bytes.as_slice());
        assert!(reader.read_sample().unwrap().is_some());
        let err = reader.read_sample().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_display_matches_encode() {
        let mut sample = idle();
        sample.actuators[9] = 1;
        sample.digital[3] = true;
        assert_eq!(sample.to_string(), "7F7F7F7F7F7F7F7F7F80000100000000");
    }
}

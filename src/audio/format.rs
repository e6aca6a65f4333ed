//! 音频格式信息模块
//!
//! 描述解码器探测到的源格式，并在送入分析引擎前做基本校验

use serde::Serialize;

use crate::error::{self, EngineResult};
use crate::tools::constants::engine_limits::MAX_CHANNELS;

/// 音频格式信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// 源音频的位深度（来自解码器/容器元数据）
    ///
    /// 表示源格式的位深，分析内部统一使用 f32 样本。
    pub bits_per_sample: u16,
    /// 每声道样本数（容器未声明时为0）
    pub sample_count: u64,
    /// 编解码器名称（如 "pcm", "flac"）
    pub codec: Option<String>,
    /// 解码过程中跳过的损坏包数量
    skipped_packets: usize,
}

impl AudioFormat {
    /// 创建新的音频格式
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16, sample_count: u64) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            sample_count,
            codec: None,
            skipped_packets: 0,
        }
    }

    /// 附加编解码器名称
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    /// 累加跳过的损坏包数量
    pub fn add_skipped_packets(&mut self, count: usize) {
        self.skipped_packets = self.skipped_packets.saturating_add(count);
    }

    /// 是否为部分分析（解码时跳过了损坏的包）
    pub fn is_partial(&self) -> bool {
        self.skipped_packets > 0
    }

    /// 跳过的损坏包数量
    pub fn skipped_packets(&self) -> usize {
        self.skipped_packets
    }

    /// 验证格式参数的有效性
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate == 0 {
            return Err(error::format_error("采样率不能为0", self.sample_rate));
        }
        if self.channels == 0 {
            return Err(error::format_error("声道数不能为0", self.channels));
        }
        if self.channels as usize > MAX_CHANNELS {
            return Err(error::format_error(
                "不支持的声道数",
                format!("{}声道（最多{MAX_CHANNELS}声道）", self.channels),
            ));
        }
        if !(1..=64).contains(&self.bits_per_sample) {
            return Err(error::format_error(
                "不支持的位深度",
                format!("{}位", self.bits_per_sample),
            ));
        }
        Ok(())
    }

    /// 持续时长（秒）
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f64 / self.sample_rate as f64
    }

    /// 更新样本数（解码结束后用实际值覆盖容器声明值）
    pub fn update_sample_count(&mut self, sample_count: u64) {
        self.sample_count = sample_count;
    }

    /// 声道数（usize类型）
    pub fn channels_usize(&self) -> usize {
        self.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(AudioFormat::new(44100, 2, 16, 1000).validate().is_ok());
        assert!(AudioFormat::new(0, 2, 16, 1000).validate().is_err());
        assert!(AudioFormat::new(44100, 0, 16, 1000).validate().is_err());
        assert!(AudioFormat::new(44100, 33, 16, 1000).validate().is_err());
        assert!(AudioFormat::new(44100, 6, 24, 1000).validate().is_ok());
        assert!(AudioFormat::new(44100, 2, 0, 1000).validate().is_err());
    }

    #[test]
    fn test_duration_and_partial() {
        let mut format = AudioFormat::new(48000, 2, 24, 96000).with_codec("flac");
        assert!((format.duration_seconds() - 2.0).abs() < 1e-12);
        assert_eq!(format.codec.as_deref(), Some("flac"));
        assert!(!format.is_partial());

        format.add_skipped_packets(2);
        format.add_skipped_packets(1);
        assert!(format.is_partial());
        assert_eq!(format.skipped_packets(), 3);
    }
}

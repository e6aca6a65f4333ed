//! WAV流式解码器
//!
//! 基于hound库逐块读取WAV文件，整数PCM按 2^(bits-1) 归一化到 [-1, 1)。

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::format::AudioFormat;
use super::streaming::StreamingDecoder;
use crate::error::{self, EngineResult};

/// WAV流式解码器
///
/// 支持8/16/24/32位整数PCM和32位浮点，每次返回最多 `chunk_frames` 帧。
pub struct WavStreamingDecoder {
    reader: hound::WavReader<BufReader<File>>,
    format: AudioFormat,
    sample_format: hound::SampleFormat,
    chunk_frames: usize,
    frames_decoded: u64,
}

impl WavStreamingDecoder {
    /// 打开WAV文件
    ///
    /// # 错误
    ///
    /// * `AnalysisError::Decoding` - 文件头无法解析
    /// * `AnalysisError::Format` - 格式参数不受支持
    pub fn open<P: AsRef<Path>>(path: P, chunk_frames: usize) -> EngineResult<Self> {
        let reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        let frames = reader.len() as u64 / spec.channels.max(1) as u64;
        let codec = match spec.sample_format {
            hound::SampleFormat::Int => "pcm",
            hound::SampleFormat::Float => "pcm_float",
        };
        let format = AudioFormat::new(spec.sample_rate, spec.channels, spec.bits_per_sample, frames)
            .with_codec(codec);
        format.validate()?;

        if spec.sample_format == hound::SampleFormat::Float && spec.bits_per_sample != 32 {
            return Err(error::format_error(
                "不支持的浮点位深度",
                format!("{}位", spec.bits_per_sample),
            ));
        }

        Ok(Self {
            reader,
            format,
            sample_format: spec.sample_format,
            chunk_frames: chunk_frames.max(1),
            frames_decoded: 0,
        })
    }

    fn read_chunk(&mut self, sample_limit: usize) -> EngineResult<Vec<f32>> {
        let mut samples = Vec::with_capacity(sample_limit);

        match self.sample_format {
            hound::SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(sample_limit) {
                    samples.push(sample?);
                }
            }
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (self.format.bits_per_sample - 1)) as f64;
                for sample in self.reader.samples::<i32>().take(sample_limit) {
                    samples.push((sample? as f64 / scale) as f32);
                }
            }
        }

        Ok(samples)
    }
}

impl StreamingDecoder for WavStreamingDecoder {
    fn next_chunk(&mut self) -> EngineResult<Option<Vec<f32>>> {
        let channels = self.format.channels_usize();
        let samples = self.read_chunk(self.chunk_frames * channels)?;
        if samples.is_empty() {
            return Ok(None);
        }

        self.frames_decoded += (samples.len() / channels) as u64;
        Ok(Some(samples))
    }

    fn progress(&self) -> f32 {
        if self.format.sample_count > 0 {
            self.frames_decoded as f32 / self.format.sample_count as f32
        } else {
            0.0
        }
    }

    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }
}

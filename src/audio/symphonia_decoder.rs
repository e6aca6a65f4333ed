//! 通用流式解码器（FLAC / MP3 / AAC / ALAC / Vorbis / AIFF 等）
//!
//! 基于symphonia逐包解码，每个解码包转换为交错f32块立即返回。
//! 损坏的包被跳过并计入 `AudioFormat::skipped_packets`。

use std::fs::File;
use std::path::Path;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, CodecParameters, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::format::AudioFormat;
use super::streaming::StreamingDecoder;
use crate::error::{self, EngineResult};

/// symphonia流式解码器
pub struct SymphoniaStreamingDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: AudioFormat,
    sample_buffer: Option<SampleBuffer<f32>>,
    frames_decoded: u64,
}

impl SymphoniaStreamingDecoder {
    /// 探测并打开音频文件
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension() {
            hint.with_extension(&extension.to_string_lossy());
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| error::format_error("格式探测失败", e))?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| error::format_error("未找到音频轨道", path.display()))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let format = Self::describe(&codec_params)?;

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| error::format_error("创建解码器失败", e))?;

        debug!(
            "打开音频文件: {} ({} Hz, {} 声道, {} bit)",
            path.display(),
            format.sample_rate,
            format.channels,
            format.bits_per_sample
        );

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            format,
            sample_buffer: None,
            frames_decoded: 0,
        })
    }

    fn describe(codec_params: &CodecParameters) -> EngineResult<AudioFormat> {
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| error::format_error("无法获取采样率信息", "sample_rate"))?;
        let channels = codec_params
            .channels
            .map(|ch| ch.count())
            .ok_or_else(|| error::format_error("无法获取声道数信息", "channels"))?
            as u16;
        // 有损格式没有位深概念，按解码输出的32位浮点记录
        let bits_per_sample = codec_params.bits_per_sample.unwrap_or(32) as u16;
        let sample_count = codec_params.n_frames.unwrap_or(0);

        let codec_name = symphonia::default::get_codecs()
            .get_codec(codec_params.codec)
            .map(|d| d.short_name.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let format = AudioFormat::new(sample_rate, channels, bits_per_sample, sample_count)
            .with_codec(codec_name);
        format.validate()?;
        Ok(format)
    }
}

impl StreamingDecoder for SymphoniaStreamingDecoder {
    fn next_chunk(&mut self) -> EngineResult<Option<Vec<f32>>> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(error::decoding_error("读取音频包失败", e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("跳过损坏的音频包: {e}");
                    self.format.add_skipped_packets(1);
                    continue;
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(error::decoding_error("解码失败", e)),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let required = decoded.capacity() * spec.channels.count();
            if self
                .sample_buffer
                .as_ref()
                .is_none_or(|buf| buf.capacity() < required)
            {
                self.sample_buffer = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            let Some(buffer) = self.sample_buffer.as_mut() else {
                continue;
            };
            buffer.copy_interleaved_ref(decoded);

            let samples = buffer.samples().to_vec();
            self.frames_decoded += (samples.len() / self.format.channels_usize()) as u64;
            return Ok(Some(samples));
        }
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

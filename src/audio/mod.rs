//! 音频解码模块
//!
//! 宿主侧：把音频文件解码为交错f32块，供分析引擎流式摄取。

mod format;
mod streaming;
mod symphonia_decoder;
mod wav_decoder;

pub mod universal_decoder;

pub use format::AudioFormat;
pub use streaming::StreamingDecoder;
pub use symphonia_decoder::SymphoniaStreamingDecoder;
pub use universal_decoder::{SUPPORTED_EXTENSIONS, is_supported_extension, open_streaming_decoder};
pub use wav_decoder::WavStreamingDecoder;

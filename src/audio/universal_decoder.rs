//! 统一音频解码入口
//!
//! 按文件扩展名选择解码器：WAV优先使用hound（失败时回退到symphonia），
//! 其他格式使用symphonia。

use std::path::Path;

use log::debug;

use super::streaming::StreamingDecoder;
use super::symphonia_decoder::SymphoniaStreamingDecoder;
use super::wav_decoder::WavStreamingDecoder;
use crate::error::{self, EngineResult};

/// 支持的文件扩展名（小写）
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "wav", "flac", "mp3", "m4a", "mp4", "aac", "ogg", "oga", "aif", "aiff", "aifc",
];

/// 文件扩展名是否受支持（大小写不敏感）
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// 打开流式解码器
///
/// `chunk_frames` 只对hound路径生效；symphonia路径按解码包大小返回。
pub fn open_streaming_decoder(
    path: &Path,
    chunk_frames: usize,
) -> EngineResult<Box<dyn StreamingDecoder>> {
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("文件不存在: {}", path.display()),
        )
        .into());
    }
    if !is_supported_extension(path) {
        return Err(error::format_error(
            "不支持的文件格式",
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "(无扩展名)".to_string()),
        ));
    }

    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        match WavStreamingDecoder::open(path, chunk_frames) {
            Ok(decoder) => return Ok(Box::new(decoder)),
            Err(e) => debug!("hound无法打开 {}，回退到symphonia: {e}", path.display()),
        }
    }

    Ok(Box::new(SymphoniaStreamingDecoder::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension(Path::new("a.wav")));
        assert!(is_supported_extension(Path::new("B.FLAC")));
        assert!(is_supported_extension(Path::new("dir/c.m4a")));
        assert!(!is_supported_extension(Path::new("notes.txt")));
        assert!(!is_supported_extension(Path::new("no_extension")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = open_streaming_decoder(Path::new("/nonexistent/track.flac"), 1024);
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }

    #[test]
    fn test_unsupported_extension_is_format_error() {
        let path = std::env::temp_dir().join(format!("masvis_ud_{}.txt", std::process::id()));
        std::fs::write(&path, b"hello").unwrap();
        let result = open_streaming_decoder(&path, 1024);
        assert!(matches!(result, Err(AnalysisError::Format(_))));
        std::fs::remove_file(&path).ok();
    }
}

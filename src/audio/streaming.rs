//! 流式解码接口
//!
//! 宿主侧解码器统一以交错f32块的形式输出样本，
//! 由调用方逐块送入分析引擎，内存占用与文件长度无关。

use super::format::AudioFormat;
use crate::error::EngineResult;

/// 流式解码器trait
pub trait StreamingDecoder: Send {
    /// 获取下一个交错音频块，文件结束时返回None
    fn next_chunk(&mut self) -> EngineResult<Option<Vec<f32>>>;

    /// 解码进度 (0.0-1.0)，总长度未知时为0
    fn progress(&self) -> f32;

    /// 音频格式信息
    fn format(&self) -> &AudioFormat;

    /// 已解码的每声道样本数
    fn frames_decoded(&self) -> u64;
}

//! 统一错误处理框架
//!
//! 核心分析引擎只产生 `TooFewBlocks` / `InvalidState` / `InvalidConfig`，
//! 其余变体来自宿主侧（文件解码、CLI）。

use std::fmt;
use std::io;

use thiserror::Error;

/// 分析引擎与宿主工具共用的错误类型
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 完整DR块不足，或上位20%选择为空
    #[error(
        "DR块数量不足 / Too few blocks: 声道 {channel} 仅有 {blocks} 个完整块，至少需要 {required} 个（最少9秒音频）"
    )]
    TooFewBlocks {
        channel: usize,
        blocks: usize,
        required: usize,
    },

    /// 在错误的生命周期状态下调用了操作
    #[error("状态错误 / Invalid state: 无法在 {state} 状态下执行 {operation}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// 引擎配置无效（采样率、声道数）
    #[error("配置无效 / Invalid config: {0}")]
    InvalidConfig(String),

    /// 文件I/O错误
    #[error("文件I/O错误: {0}")]
    Io(#[from] io::Error),

    /// 音频格式错误
    #[error("音频格式错误: {0}")]
    Format(String),

    /// 解码错误
    #[error("音频解码失败: {0}")]
    Decoding(String),
}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        AnalysisError::Decoding(format!("WAV解码错误: {err}"))
    }
}

/// 分析操作的标准Result类型
pub type EngineResult<T> = Result<T, AnalysisError>;

// ==================== 错误转换Helper函数 ====================

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> AnalysisError {
    AnalysisError::Format(format!("{context}: {err}"))
}

/// 创建解码错误的helper函数
#[inline]
pub fn decoding_error<E: fmt::Display>(context: &str, err: E) -> AnalysisError {
    AnalysisError::Decoding(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和退出码映射

/// 错误类别枚举
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 格式相关错误（不支持的格式、格式损坏等）
    Format,
    /// 解码相关错误
    Decoding,
    /// I/O相关错误
    Io,
    /// 计算相关错误（块数不足等）
    Calculation,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从AnalysisError提取错误类别
    pub fn from_analysis_error(e: &AnalysisError) -> Self {
        match e {
            AnalysisError::Format(_) => Self::Format,
            AnalysisError::Decoding(_) => Self::Decoding,
            AnalysisError::Io(_) => Self::Io,
            AnalysisError::TooFewBlocks { .. } => Self::Calculation,
            AnalysisError::InvalidState { .. } | AnalysisError::InvalidConfig(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::Decoding => "解码错误",
            Self::Io => "I/O错误",
            Self::Calculation => "计算错误",
            Self::Other => "其他错误",
        }
    }
}

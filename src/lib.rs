//! MASVIS DR Meter
//!
//! 流式DR14动态范围与全通峰值因数分析引擎。
//!
//! ## 核心特性
//! - 7频段一阶全通滤波器组（20 Hz - 20 kHz），测量每个频段的峰值因数
//! - 3秒DR块分段：块RMS = sqrt(2 × Σx² / n)
//! - 第二大块峰值（Pk_2nd）与上位20%块RMS计算DR
//! - 601-bin有符号幅度直方图及log2归一化显示曲线
//! - 实时摄取路径不分配内存、不记录日志
//!
//! ## 示例
//!
//! ```rust
//! use masvis_dr_meter::AnalysisEngine;
//!
//! let mut engine = AnalysisEngine::new();
//! engine.initialize(1000.0, 2).unwrap();
//!
//! let square: Vec<f32> = (0..10_000)
//!     .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
//!     .collect();
//! engine.ingest(0, &square);
//! engine.ingest(1, &square);
//!
//! let result = engine.finalize().unwrap();
//! assert_eq!(result.channels.len(), 2);
//! assert_eq!(result.average_label(), "DR -3.0");
//! ```

pub mod audio;
pub mod core;
pub mod error;
pub mod tools;

// 重新导出核心类型
pub use audio::{AudioFormat, StreamingDecoder, open_streaming_decoder};
pub use core::{
    AnalysisEngine, AnalysisResult, ChannelReport, CrestFactorReport, DrAverage, DrResult,
    EngineConfig, EngineState, HistogramCurve,
};
pub use error::{AnalysisError, EngineResult};

//! 核心算法模块
//!
//! 包含全通滤波器组、DR块分段、直方图、DR计算与峰值因数报告，
//! 以及把它们串起来的流式分析引擎。

pub mod allpass;
pub mod channel_data;
pub mod crest_factor;
pub mod dr_block;
pub mod dr_calculator;
pub mod engine;
pub mod histogram;
pub mod peak_selection;

// 重新导出公共接口
pub use allpass::BandFilterBank;
pub use channel_data::{BandAccumulator, ChannelData};
pub use crest_factor::{CrestFactorReport, db};
pub use dr_block::{DrBlock, DrBlockTracker};
pub use dr_calculator::{DrAverage, DrResult};
pub use engine::{
    AnalysisEngine, AnalysisResult, ChannelAnalyzer, ChannelReport, EngineConfig, EngineState,
};
pub use histogram::{AmplitudeHistogram, HistogramCurve};

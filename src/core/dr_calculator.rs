//! DR计算核心
//!
//! 核心DR计算公式：DR = -20 · log10(RMS_top20 / Pk_2nd)
//!
//! 1. 收集声道的所有块RMS与块峰值（完整块 + 非空尾块）
//! 2. 两组数据分别升序排序
//! 3. 取 round(0.2 × n) 个最响块做二次平均，得到代表RMS
//! 4. 取第二大块峰值作为参考峰值
//!
//! 计算前要求每个声道至少有3个完整块（≥ 9秒音频）。

use serde::Serialize;

use crate::core::dr_block::DrBlockTracker;
use crate::core::peak_selection::{
    representative_rms, second_highest_peak, sort_ascending, top_block_count,
};
use crate::error::{AnalysisError, EngineResult};
use crate::tools::constants::decibels::SILENCE_DB;
use crate::tools::constants::dr_analysis::MIN_COMPLETE_BLOCKS;
use crate::tools::constants::labels::NO_MEASUREMENTS_AVERAGE;

/// 单声道DR计算结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrResult {
    /// 声道索引
    pub channel: usize,

    /// 计算得到的DR值（dB）
    pub dr_value: f64,

    /// 上位20%块的代表RMS
    pub rms: f64,

    /// 参考峰值（第二大块峰值）
    pub peak: f64,

    /// 参与统计的块数
    pub block_count: usize,

    /// 参与RMS平均的上位块数
    pub top_count: usize,
}

impl DrResult {
    /// 四舍五入的整数DR（官方显示格式）
    pub fn dr_value_rounded(&self) -> i32 {
        self.dr_value.round() as i32
    }
}

/// 由代表RMS和参考峰值计算DR
///
/// rms为0（静音）或结果不是有限值时返回 -128 哨兵。
#[inline]
pub fn dr_from_rms_and_peak(rms: f64, peak: f64) -> f64 {
    if rms == 0.0 {
        return SILENCE_DB;
    }
    let dr = -20.0 * (rms / peak).log10();
    if dr.is_finite() { dr } else { SILENCE_DB }
}

/// 计算单声道的DR
///
/// # 错误
///
/// 完整块少于 `MIN_COMPLETE_BLOCKS`，或上位块数为0时返回 `TooFewBlocks`。
pub fn calculate_channel_dr(channel: usize, tracker: &DrBlockTracker) -> EngineResult<DrResult> {
    let complete = tracker.complete_block_count();
    if complete < MIN_COMPLETE_BLOCKS {
        return Err(AnalysisError::TooFewBlocks {
            channel,
            blocks: complete,
            required: MIN_COMPLETE_BLOCKS,
        });
    }

    let mut rms_values = tracker.block_rms_values();
    let mut peaks = tracker.block_peaks();
    sort_ascending(&mut rms_values);
    sort_ascending(&mut peaks);

    let block_count = rms_values.len();
    let top_count = top_block_count(block_count);
    let too_few = || AnalysisError::TooFewBlocks {
        channel,
        blocks: complete,
        required: MIN_COMPLETE_BLOCKS,
    };

    let rms = representative_rms(&rms_values, top_count).ok_or_else(too_few)?;
    let peak = second_highest_peak(&peaks).ok_or_else(too_few)?;

    Ok(DrResult {
        channel,
        dr_value: dr_from_rms_and_peak(rms, peak),
        rms,
        peak,
        block_count,
        top_count,
    })
}

/// 多声道平均DR
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum DrAverage {
    /// 多于一个声道产生了DR值时的算术平均
    Measured(f64),

    /// 只有一个（或没有）声道的测量值
    NoMeasurements,
}

impl DrAverage {
    /// 由各声道DR值计算平均
    ///
    /// # 示例
    ///
    /// ```rust
    /// use masvis_dr_meter::core::DrAverage;
    ///
    /// assert_eq!(DrAverage::from_values(&[10.0, 12.0]), DrAverage::Measured(11.0));
    /// assert_eq!(DrAverage::from_values(&[10.0]), DrAverage::NoMeasurements);
    /// ```
    pub fn from_values(values: &[f64]) -> Self {
        if values.len() > 1 {
            Self::Measured(values.iter().sum::<f64>() / values.len() as f64)
        } else {
            Self::NoMeasurements
        }
    }

    /// 平均值（无测量时为None）
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Measured(v) => Some(*v),
            Self::NoMeasurements => None,
        }
    }

    /// 显示标签："DR 12.3"，无测量时为 "DR 00.0"
    pub fn label(&self) -> String {
        match self {
            Self::Measured(v) => format!("DR {v:.1}"),
            Self::NoMeasurements => NO_MEASUREMENTS_AVERAGE.to_string(),
        }
    }

    /// 官方整数DR："DR12"，无测量时为 "DR??"
    pub fn official_label(&self) -> String {
        match self {
            Self::Measured(v) => format!("DR{}", v.round() as i32),
            Self::NoMeasurements => "DR??".to_string(),
        }
    }
}

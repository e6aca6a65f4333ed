//! 峰值因数（Crest Factor）报告
//!
//! 对每个声道计算整体峰值因数 `db(peak, rms)` 和7个全通频段的峰值因数，
//! 并生成"频段CF − 整体CF"差值矩阵：行是频段，列是声道，
//! 单元格格式为带符号两位小数（`+0.00`）。

use serde::Serialize;

use crate::core::channel_data::ChannelData;
use crate::tools::constants::bands::{BAND_COUNT, BAND_FREQUENCIES};
use crate::tools::constants::decibels::SILENCE_DB;

/// 峰值与RMS之比的分贝值：20·log10(peak / rms)
///
/// rms为0，或结果为负无穷（peak为0）时返回哨兵值 -128 dB。
///
/// # 示例
///
/// ```rust
/// use masvis_dr_meter::core::crest_factor::db;
///
/// assert!((db(1.0, 0.5) - 6.020599913279624).abs() < 1e-12);
/// assert_eq!(db(0.5, 0.0), -128.0);
/// assert_eq!(db(0.0, 0.5), -128.0);
/// ```
#[inline]
pub fn db(peak: f64, rms: f64) -> f64 {
    if rms == 0.0 {
        return SILENCE_DB;
    }
    let value = 20.0 * (peak / rms).log10();
    if value == f64::NEG_INFINITY {
        SILENCE_DB
    } else {
        value
    }
}

/// 线性幅度转dBFS（0或负值返回 -128 dB）
#[inline]
pub fn linear_to_dbfs(value: f64) -> f64 {
    db(value, 1.0)
}

/// 单声道的峰值因数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelCrestFactors {
    /// 整体峰值因数（dB）
    pub overall: f64,

    /// 每个频段的峰值因数（dB）
    pub bands: [f64; BAND_COUNT],
}

impl ChannelCrestFactors {
    /// 从声道累积数据计算
    pub fn from_channel(data: &ChannelData) -> Self {
        let overall = db(data.peak, data.calculate_rms());
        let bands = std::array::from_fn(|band| db(data.bands[band].peak, data.band_rms(band)));
        Self { overall, bands }
    }

    /// 频段CF − 整体CF
    pub fn differences(&self) -> [f64; BAND_COUNT] {
        self.bands.map(|band| band - self.overall)
    }
}

/// 差值矩阵的一行（一个频段）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrestFactorRow {
    /// 频段中心频率（Hz）
    pub frequency: f64,

    /// 行标签（整数频率，如 "2000"）
    pub label: String,

    /// 每个声道的差值（dB）
    pub differences: Vec<f64>,
}

impl CrestFactorRow {
    /// 单元格文本：带符号两位小数
    pub fn cells(&self) -> Vec<String> {
        self.differences.iter().map(|d| format!("{d:+.2}")).collect()
    }
}

/// 全部声道的峰值因数报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrestFactorReport {
    /// 每个声道的峰值因数
    pub channels: Vec<ChannelCrestFactors>,

    /// 差值矩阵：7行（频段）× 声道数列
    pub rows: Vec<CrestFactorRow>,
}

impl CrestFactorReport {
    /// 由所有声道的累积数据构建报告
    pub fn build<'a, I>(channels: I) -> Self
    where
        I: IntoIterator<Item = &'a ChannelData>,
    {
        let channels: Vec<ChannelCrestFactors> = channels
            .into_iter()
            .map(ChannelCrestFactors::from_channel)
            .collect();

        let rows = BAND_FREQUENCIES
            .iter()
            .enumerate()
            .map(|(band, &frequency)| CrestFactorRow {
                frequency,
                label: format!("{}", frequency as u32),
                differences: channels
                    .iter()
                    .map(|ch| ch.bands[band] - ch.overall)
                    .collect(),
            })
            .collect();

        Self { channels, rows }
    }

    /// 指定频段、声道的差值
    pub fn difference(&self, band: usize, channel: usize) -> Option<f64> {
        self.rows.get(band)?.differences.get(channel).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_db_sentinels() {
        assert_eq!(db(0.0, 0.0), SILENCE_DB);
        assert_eq!(db(1.0, 0.0), SILENCE_DB);
        assert_eq!(db(0.0, 1.0), SILENCE_DB);
        assert_abs_diff_eq!(db(1.0, 1.0), 0.0);
        assert_abs_diff_eq!(db(2.0_f64.sqrt(), 1.0), 3.0103, epsilon = 1e-4);
    }

    #[test]
    fn test_linear_to_dbfs() {
        assert_abs_diff_eq!(linear_to_dbfs(1.0), 0.0);
        assert_abs_diff_eq!(linear_to_dbfs(0.5), -6.0206, epsilon = 1e-4);
        assert_eq!(linear_to_dbfs(0.0), SILENCE_DB);
    }

    #[test]
    fn test_report_layout() {
        let mut left = ChannelData::new();
        let mut right = ChannelData::new();
        for i in 0..100 {
            let x = if i % 2 == 0 { 0.5 } else { -0.5 };
            left.process_sample(x);
            right.process_sample(0.0);
            for band in 0..BAND_COUNT {
                left.accumulate_band(band, x);
            }
        }

        let report = CrestFactorReport::build([&left, &right]);
        assert_eq!(report.rows.len(), BAND_COUNT);
        assert_eq!(report.rows[0].label, "20");
        assert_eq!(report.rows[6].label, "20000");
        assert_eq!(report.rows[3].differences.len(), 2);

        // 方波：峰值 = RMS，整体CF为0
        assert_abs_diff_eq!(report.channels[0].overall, 0.0, epsilon = 1e-12);
        assert_eq!(report.difference(2, 0), Some(report.channels[0].bands[2]));
        // 静音声道：两者都是哨兵值，差值为0
        assert_eq!(report.channels[1].overall, SILENCE_DB);
        assert_eq!(report.difference(0, 1), Some(0.0));
        assert_eq!(report.difference(7, 0), None);
    }

    #[test]
    fn test_cells_are_signed_two_decimals() {
        let row = CrestFactorRow {
            frequency: 60.0,
            label: "60".to_string(),
            differences: vec![1.234, -0.5, 0.0],
        };
        assert_eq!(row.cells(), vec!["+1.23", "-0.50", "+0.00"]);
    }
}

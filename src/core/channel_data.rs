//! 每声道的整体统计与频段统计累加器
//!
//! ## 峰值定义的不对称性
//!
//! - 整体峰值：原始样本的**绝对值**最大值
//! - 频段峰值：全通输出的**有符号**最大值（初值0，负半周不计入）
//!
//! 两者保持与DR14参考实现一致的数值结果，不做统一。

use std::fmt;

use crate::tools::constants::bands::BAND_COUNT;

/// 单个频段的累加器：全通输出的平方和与有符号峰值
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandAccumulator {
    /// 输出平方和
    pub sum_of_squares: f64,

    /// 有符号峰值 max(peak, y)
    pub peak: f64,
}

impl BandAccumulator {
    /// 累加一个全通输出样本
    #[inline]
    pub fn accumulate(&mut self, output: f64) {
        if output > self.peak {
            self.peak = output;
        }
        self.sum_of_squares += output * output;
    }

    /// 频段RMS：sqrt(Σy² / n)，n为0时返回0.0
    pub fn calculate_rms(&self, sample_count: u64) -> f64 {
        mean_square_root(self.sum_of_squares, sample_count)
    }
}

/// 每声道的整体（未滤波）统计数据
///
/// - 绝对值峰值
/// - 原始样本平方和
/// - 已摄取样本数
/// - 7个频段的累加器
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelData {
    /// 原始信号绝对值峰值
    pub peak: f64,

    /// 原始信号平方和（与频段无关）
    pub sum_of_squares: f64,

    /// 已处理的样本数
    pub sample_count: u64,

    /// 每个分析频段的累加器
    pub bands: [BandAccumulator; BAND_COUNT],
}

impl ChannelData {
    /// 创建新的空ChannelData实例
    ///
    /// # 示例
    ///
    /// ```rust
    /// use masvis_dr_meter::core::ChannelData;
    ///
    /// let data = ChannelData::new();
    /// assert_eq!(data.peak, 0.0);
    /// assert_eq!(data.sample_count, 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理单个原始样本，更新整体峰值和平方和
    ///
    /// # 示例
    ///
    /// ```rust
    /// use masvis_dr_meter::core::ChannelData;
    ///
    /// let mut data = ChannelData::new();
    /// data.process_sample(0.5);
    /// data.process_sample(-0.8);
    ///
    /// assert_eq!(data.sample_count, 2);
    /// assert!((data.peak - 0.8).abs() < 1e-12);
    /// ```
    #[inline]
    pub fn process_sample(&mut self, sample: f64) {
        let abs_sample = sample.abs();
        if abs_sample > self.peak {
            self.peak = abs_sample;
        }
        self.sum_of_squares += sample * sample;
        self.sample_count += 1;
    }

    /// 累加指定频段的全通输出
    #[inline]
    pub fn accumulate_band(&mut self, band: usize, output: f64) {
        self.bands[band].accumulate(output);
    }

    /// 整体RMS：sqrt(Σx² / n)
    ///
    /// # 示例
    ///
    /// ```rust
    /// use masvis_dr_meter::core::ChannelData;
    ///
    /// let mut data = ChannelData::new();
    /// data.process_sample(1.0);
    /// data.process_sample(0.0);
    ///
    /// assert!((data.calculate_rms() - 0.7071067811865476).abs() < 1e-12);
    /// ```
    pub fn calculate_rms(&self) -> f64 {
        mean_square_root(self.sum_of_squares, self.sample_count)
    }

    /// 指定频段的RMS（使用本声道的总样本数归一化）
    pub fn band_rms(&self, band: usize) -> f64 {
        self.bands[band].calculate_rms(self.sample_count)
    }

    /// 重置所有累积数据
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for ChannelData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChannelData {{ samples: {}, peak: {:.6}, sum_sq: {:.6} }}",
            self.sample_count, self.peak, self.sum_of_squares
        )
    }
}

#[inline]
fn mean_square_root(sum_of_squares: f64, sample_count: u64) -> f64 {
    if sample_count == 0 {
        return 0.0;
    }
    (sum_of_squares / sample_count as f64).sqrt()
}

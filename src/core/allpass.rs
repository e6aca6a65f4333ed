//! 一阶全通滤波器组
//!
//! 每个声道持有7个独立的一阶全通滤波器，对应7个分析频段
//! （20 / 60 / 200 / 600 / 2000 / 6000 / 20000 Hz）。
//!
//! ## 传递函数
//!
//! ```text
//! H(z) = (p - z⁻¹) / (1 - p·z⁻¹)
//! y[n] = p·x[n] - x[n-1] + p·y[n-1]
//! ```
//!
//! 系数 `p = (1 - ρ) / (1 + ρ)`，其中 `ρ = tan(π·fc / fs)`。
//! 全通滤波器在所有频率上增益为1，仅相位随频率变化；
//! 这里利用的是它的滤波延迟（瞬态响应），而不是幅度响应。

use std::f64::consts::PI;

use crate::tools::constants::bands::{BAND_COUNT, BAND_FREQUENCIES, NYQUIST_GUARD_DIVISOR};

/// 计算一阶全通滤波器系数
///
/// 中心频率会被钳位到略低于奈奎斯特频率（`fs / 2.0001`），
/// 避免 `tan(π/2)` 的退化情况。
///
/// # 示例
///
/// ```rust
/// use masvis_dr_meter::core::allpass::allpass_coefficient;
///
/// let p = allpass_coefficient(1000.0, 48000.0);
/// assert!(p > 0.0 && p < 1.0);
/// ```
#[inline]
pub fn allpass_coefficient(center_hz: f64, sample_rate: f64) -> f64 {
    let fc = center_hz.min(sample_rate / NYQUIST_GUARD_DIVISOR);
    let rho = (PI * fc / sample_rate).tan();
    (1.0 - rho) / (1.0 + rho)
}

/// 单个频段的全通滤波器（系数 + 单位延迟状态）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AllpassFilter {
    /// 滤波器系数 p
    coefficient: f64,

    /// 上一个输入样本 x[n-1]
    last_input: f64,

    /// 上一个输出样本 y[n-1]
    last_output: f64,

    /// 已处理样本数（用于屏蔽流的第一个样本）
    sample_count: u64,
}

impl AllpassFilter {
    /// 以给定系数创建滤波器，状态清零
    pub fn new(coefficient: f64) -> Self {
        Self {
            coefficient,
            ..Self::default()
        }
    }

    /// 处理单个样本
    ///
    /// 流的第一个样本没有历史，输出定义为0；之后按差分方程计算。
    /// 每次调用后更新延迟状态。
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = if self.sample_count >= 1 {
            self.coefficient * input - self.last_input + self.coefficient * self.last_output
        } else {
            0.0
        };

        self.last_input = input;
        self.last_output = output;
        self.sample_count += 1;

        output
    }

    /// 滤波器系数
    #[inline]
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// 已处理的样本数
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// 清空延迟状态（保留系数）
    pub fn reset(&mut self) {
        self.last_input = 0.0;
        self.last_output = 0.0;
        self.sample_count = 0;
    }
}

/// 单声道的7频段全通滤波器组
#[derive(Debug, Clone, PartialEq)]
pub struct BandFilterBank {
    filters: [AllpassFilter; BAND_COUNT],
}

impl BandFilterBank {
    /// 按标准7个分析频率创建滤波器组
    pub fn new(sample_rate: f64) -> Self {
        let mut bank = Self {
            filters: [AllpassFilter::default(); BAND_COUNT],
        };
        bank.configure(sample_rate, &BAND_FREQUENCIES);
        bank
    }

    /// 重新计算每个频段的系数并清空全部滤波状态
    pub fn configure(&mut self, sample_rate: f64, band_frequencies: &[f64; BAND_COUNT]) {
        for (filter, &fc) in self.filters.iter_mut().zip(band_frequencies.iter()) {
            *filter = AllpassFilter::new(allpass_coefficient(fc, sample_rate));
        }
    }

    /// 用指定频段的滤波器处理一个样本
    #[inline]
    pub fn process(&mut self, band: usize, input: f64) -> f64 {
        self.filters[band].process(input)
    }

    /// 获取指定频段的滤波器
    pub fn filter(&self, band: usize) -> &AllpassFilter {
        &self.filters[band]
    }

    /// 所有频段的系数
    pub fn coefficients(&self) -> [f64; BAND_COUNT] {
        self.filters.map(|f| f.coefficient())
    }

    /// 清空所有频段的延迟状态
    pub fn reset(&mut self) {
        self.filters.iter_mut().for_each(AllpassFilter::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_coefficient_formula() {
        let fs = 48000.0;
        let rho = (PI * 1000.0 / fs).tan();
        let expected = (1.0 - rho) / (1.0 + rho);
        assert_abs_diff_eq!(allpass_coefficient(1000.0, fs), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_coefficient_clamped_below_nyquist() {
        // 32kHz采样率下20kHz超过奈奎斯特，必须被钳位
        let p = allpass_coefficient(20000.0, 32000.0);
        let clamped = allpass_coefficient(32000.0 / 2.0001, 32000.0);
        assert!(p.is_finite());
        assert_eq!(p, clamped);
        // 接近奈奎斯特时系数趋近-1
        assert!(p < -0.99);
    }

    #[test]
    fn test_first_sample_outputs_zero() {
        let mut filter = AllpassFilter::new(0.5);
        assert_eq!(filter.process(0.8), 0.0);
        // 第二个样本：p·x - x1 + p·y1 = 0.5·0.2 - 0.8 + 0
        assert_abs_diff_eq!(filter.process(0.2), 0.1 - 0.8, epsilon = 1e-12);
        assert_eq!(filter.sample_count(), 2);
    }

    #[test]
    fn test_dc_converges_to_inverted_unity() {
        // H(1) = (p - 1) / (1 - p) = -1
        let mut filter = AllpassFilter::new(allpass_coefficient(200.0, 44100.0));
        let mut last = 0.0;
        for _ in 0..44100 {
            last = filter.process(1.0);
        }
        assert_abs_diff_eq!(last, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unity_gain_on_sine() {
        let fs = 48000.0;
        let mut bank = BandFilterBank::new(fs);
        let n = 48000;
        let mut in_sq = 0.0;
        let mut out_sq = 0.0;
        for i in 0..n {
            let x = 0.5 * (2.0 * PI * 1000.0 * i as f64 / fs).sin();
            let y = bank.process(4, x);
            // 跳过前半秒的瞬态
            if i >= n / 2 {
                in_sq += x * x;
                out_sq += y * y;
            }
        }
        assert_abs_diff_eq!((out_sq / in_sq).sqrt(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_configure_resets_state() {
        let mut bank = BandFilterBank::new(44100.0);
        bank.process(0, 0.3);
        bank.process(0, 0.4);
        assert_eq!(bank.filter(0).sample_count(), 2);

        bank.configure(48000.0, &BAND_FREQUENCIES);
        assert_eq!(bank.filter(0).sample_count(), 0);
        assert_eq!(bank.process(0, 0.9), 0.0);
        assert_eq!(
            bank.coefficients()[3],
            allpass_coefficient(600.0, 48000.0)
        );
    }
}

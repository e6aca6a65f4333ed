//! 有符号幅度直方图与显示归一化
//!
//! 每个原始样本按 `round(x × 300)` 映射到 [-300, 300] 共601个bin，
//! 超出范围的样本钳位到两端。finalize时对非空bin取log2，
//! 再按声道内的最小/最大值线性缩放到 [0, 1]，得到601点的显示曲线。
//!
//! 计数数组是定长的，摄取路径只做一次索引与自增。

use serde::Serialize;

use crate::tools::constants::histogram::{BIN_COUNT, MAX_BIN, MIN_BIN, RESOLUTION};

/// 单声道的601-bin幅度直方图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmplitudeHistogram {
    /// bin计数，下标0对应bin -300
    bins: Box<[u64; BIN_COUNT]>,
}

impl Default for AmplitudeHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl AmplitudeHistogram {
    /// 创建全零直方图
    pub fn new() -> Self {
        Self {
            bins: Box::new([0; BIN_COUNT]),
        }
    }

    /// 计算样本所属的bin编号（-300..=300）
    ///
    /// NaN按Rust的饱和转换落入bin 0。
    ///
    /// # 示例
    ///
    /// ```rust
    /// use masvis_dr_meter::core::histogram::AmplitudeHistogram;
    ///
    /// assert_eq!(AmplitudeHistogram::bin_index(0.5), 150);
    /// assert_eq!(AmplitudeHistogram::bin_index(-2.0), -300);
    /// ```
    #[inline]
    pub fn bin_index(sample: f64) -> i32 {
        ((sample * RESOLUTION).round() as i32).clamp(MIN_BIN, MAX_BIN)
    }

    /// 计入一个样本
    #[inline]
    pub fn add_sample(&mut self, sample: f64) {
        let slot = (Self::bin_index(sample) - MIN_BIN) as usize;
        self.bins[slot] += 1;
    }

    /// 指定bin编号的计数，越界返回0
    pub fn count(&self, bin: i32) -> u64 {
        if !(MIN_BIN..=MAX_BIN).contains(&bin) {
            return 0;
        }
        self.bins[(bin - MIN_BIN) as usize]
    }

    /// 原始计数（下标0对应bin -300）
    pub fn counts(&self) -> &[u64; BIN_COUNT] {
        &self.bins
    }

    /// 所有bin计数之和，等于已摄取样本数
    pub fn total_count(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// 非空bin的数量
    pub fn occupied_bins(&self) -> usize {
        self.bins.iter().filter(|&&c| c > 0).count()
    }

    /// 有效位深估计：log2(非空bin数)
    ///
    /// 用于粗略判断信号实际使用了多少个量化等级；没有数据时为0。
    pub fn effective_bits(&self) -> f64 {
        match self.occupied_bins() {
            0 => 0.0,
            n => (n as f64).log2(),
        }
    }

    /// 生成归一化的显示曲线
    ///
    /// - 非空bin：`(log2(count) - min) / (max - min)`，min/max取自本声道非空bin
    /// - 空bin：0
    /// - 所有非空bin的log2值相同（max == min）时，它们都取1.0
    /// - 没有任何数据时返回全零曲线
    pub fn normalize(&self) -> HistogramCurve {
        let mut points = vec![0.0; BIN_COUNT];

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (point, &count) in points.iter_mut().zip(self.bins.iter()) {
            if count > 0 {
                let value = (count as f64).log2();
                min = min.min(value);
                max = max.max(value);
                *point = value;
            }
        }

        if max.is_finite() {
            let range = max - min;
            for (point, &count) in points.iter_mut().zip(self.bins.iter()) {
                if count > 0 {
                    *point = if range > 0.0 {
                        (*point - min) / range
                    } else {
                        1.0
                    };
                }
            }
        }

        HistogramCurve { points }
    }

    /// 清空所有计数
    pub fn clear(&mut self) {
        self.bins.fill(0);
    }
}

/// 601点归一化直方图曲线（下标0对应bin -300）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramCurve {
    points: Vec<f64>,
}

impl HistogramCurve {
    /// 全部曲线点
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// 指定bin编号处的值，越界返回None
    pub fn value_at(&self, bin: i32) -> Option<f64> {
        if !(MIN_BIN..=MAX_BIN).contains(&bin) {
            return None;
        }
        self.points.get((bin - MIN_BIN) as usize).copied()
    }

    /// 是否为全零基线（声道没有数据）
    pub fn is_baseline(&self) -> bool {
        self.points.iter().all(|&p| p == 0.0)
    }
}

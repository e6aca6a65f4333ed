//! 块统计选择模块
//!
//! DR计算中的两个"选择"步骤集中在这里：
//!
//! - 参考峰值：所有块峰值中的**第二大值**（Pk_2nd），避开单个异常峰
//! - 代表RMS：块RMS中最响的上位20%的二次平均
//!
//! ## 职责边界
//!
//! 本模块只负责在已排序的块统计上做选择，不关心块如何产生
//! （由 `dr_block::DrBlockTracker` 负责），也不计算最终DR
//! （由 `dr_calculator` 负责）。

use crate::tools::constants::dr_analysis::TOP_RMS_FRACTION;

/// 按升序排序块统计值
///
/// 使用 `total_cmp`，NaN排在最后，不会panic。
pub fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// 第二大峰值
///
/// 输入必须已升序排序；少于两个值时返回None。
///
/// # 示例
///
/// ```rust
/// use masvis_dr_meter::core::peak_selection::second_highest_peak;
///
/// assert_eq!(second_highest_peak(&[0.2, 0.5, 0.9]), Some(0.5));
/// assert_eq!(second_highest_peak(&[0.9]), None);
/// ```
#[inline]
pub fn second_highest_peak(sorted_peaks: &[f64]) -> Option<f64> {
    let n = sorted_peaks.len();
    if n < 2 {
        return None;
    }
    Some(sorted_peaks[n - 2])
}

/// 上位20%的块数：round(0.2 × n)
#[inline]
pub fn top_block_count(block_count: usize) -> usize {
    (TOP_RMS_FRACTION * block_count as f64).round() as usize
}

/// 上位块的代表RMS：sqrt(Σ rms² / top_count)
///
/// 输入必须已升序排序，取最后 `top_count` 个值；
/// `top_count` 为0或超过长度时返回None。
///
/// # 示例
///
/// ```rust
/// use masvis_dr_meter::core::peak_selection::representative_rms;
///
/// let rms = representative_rms(&[0.1, 0.3, 0.4], 2).unwrap();
/// assert!((rms - (0.125_f64).sqrt()).abs() < 1e-12);
/// ```
pub fn representative_rms(sorted_rms: &[f64], top_count: usize) -> Option<f64> {
    if top_count == 0 || top_count > sorted_rms.len() {
        return None;
    }
    let top = &sorted_rms[sorted_rms.len() - top_count..];
    let sum_of_squares: f64 = top.iter().map(|r| r * r).sum();
    Some((sum_of_squares / top_count as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_highest_with_duplicates() {
        let mut peaks = vec![0.9, 0.3, 0.9, 0.1];
        sort_ascending(&mut peaks);
        assert_eq!(second_highest_peak(&peaks), Some(0.9));
    }

    #[test]
    fn test_second_highest_ignores_single_outlier() {
        let mut peaks = vec![0.4, 1.0, 0.5, 0.45];
        sort_ascending(&mut peaks);
        assert_eq!(second_highest_peak(&peaks), Some(0.5));
        assert_eq!(second_highest_peak(&[]), None);
    }

    #[test]
    fn test_top_block_count_rounding() {
        assert_eq!(top_block_count(3), 1); // 0.6 -> 1
        assert_eq!(top_block_count(2), 0); // 0.4 -> 0
        assert_eq!(top_block_count(7), 1); // 1.4 -> 1
        assert_eq!(top_block_count(8), 2); // 1.6 -> 2
        assert_eq!(top_block_count(100), 20);
    }

    #[test]
    fn test_representative_rms_takes_loudest() {
        let mut rms = vec![0.5, 0.1, 0.2, 0.4, 0.3];
        sort_ascending(&mut rms);
        assert_eq!(representative_rms(&rms, 1), Some(0.5));

        let two = representative_rms(&rms, 2).unwrap_or(0.0);
        assert!((two - ((0.25 + 0.16) / 2.0_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_representative_rms_invalid_count() {
        assert_eq!(representative_rms(&[0.1, 0.2], 0), None);
        assert_eq!(representative_rms(&[0.1, 0.2], 3), None);
    }
}

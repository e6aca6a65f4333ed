//! DR块分段
//!
//! 以固定长度（`round(fs × 3)` 个样本）把每声道的样本流切分为DR块，
//! 每块只保留平方和与绝对值峰值。累计样本数跨过块长的整数倍时关闭当前块、
//! 打开新块，并记录最后一个完整块结束的位置，用于确定尾块的实际长度。

use crate::tools::constants::dr_analysis::{BLOCK_RMS_DOUBLING, RESERVED_BLOCKS_PER_CHANNEL};

/// 单个DR块的累积统计
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrBlock {
    /// 块内原始样本平方和
    pub sum_of_squares: f64,

    /// 块内绝对值峰值
    pub peak: f64,

    /// 块内样本数
    pub sample_count: usize,
}

impl DrBlock {
    #[inline]
    fn accumulate(&mut self, sample: f64) {
        let abs_sample = sample.abs();
        if abs_sample > self.peak {
            self.peak = abs_sample;
        }
        self.sum_of_squares += sample * sample;
        self.sample_count += 1;
    }

    /// 块RMS：sqrt(2 × Σx² / block_length)
    ///
    /// `block_length` 对完整块为配置的块长，对尾块为实际剩余样本数。
    pub fn rms(&self, block_length: usize) -> f64 {
        if block_length == 0 {
            return 0.0;
        }
        (BLOCK_RMS_DOUBLING * (self.sum_of_squares / block_length as f64)).sqrt()
    }
}

/// 单声道的DR块跟踪器
///
/// 块列表在 `clear()` 之外只增不减；始终至少有一个"当前"块。
#[derive(Debug, Clone, PartialEq)]
pub struct DrBlockTracker {
    /// 配置的块长（样本数）
    block_length: usize,

    /// 所有块（最后一个为当前打开的块）
    blocks: Vec<DrBlock>,

    /// 累计样本数
    samples_seen: u64,

    /// 最后一个完整块结束时的累计样本数
    last_boundary: u64,
}

impl DrBlockTracker {
    /// 创建跟踪器并打开第一个块
    ///
    /// 预留 `RESERVED_BLOCKS_PER_CHANNEL` 个块的容量，
    /// 在此范围内摄取路径不会分配内存。
    pub fn new(block_length: usize) -> Self {
        let mut blocks = Vec::with_capacity(RESERVED_BLOCKS_PER_CHANNEL);
        blocks.push(DrBlock::default());
        Self {
            block_length,
            blocks,
            samples_seen: 0,
            last_boundary: 0,
        }
    }

    /// 累加一个样本到当前块，必要时关闭当前块并打开新块
    #[inline]
    pub fn process_sample(&mut self, sample: f64) {
        if let Some(block) = self.blocks.last_mut() {
            block.accumulate(sample);
        }
        self.samples_seen += 1;

        if self.samples_seen % self.block_length as u64 == 0 {
            self.last_boundary = self.samples_seen;
            self.blocks.push(DrBlock::default());
        }
    }

    /// 配置的块长
    #[inline]
    pub fn block_length(&self) -> usize {
        self.block_length
    }

    /// 累计样本数
    #[inline]
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// 全部块（含当前打开的块，可能为空块）
    pub fn blocks(&self) -> &[DrBlock] {
        &self.blocks
    }

    /// 已关闭的完整块数
    pub fn complete_block_count(&self) -> usize {
        (self.last_boundary / self.block_length as u64) as usize
    }

    /// 尾块的样本数（最后一个完整块之后的剩余样本）
    pub fn tail_samples(&self) -> usize {
        (self.samples_seen - self.last_boundary) as usize
    }

    /// 参与DR统计的块：完整块 + 当前块
    ///
    /// 恰好在块边界结束的流，边界处打开的空块同样参与统计
    /// （RMS与峰值均为0，计入块总数与上位20%的数量）。
    pub fn measured_blocks(&self) -> &[DrBlock] {
        &self.blocks[..=self.complete_block_count()]
    }

    /// 每个参与统计的块的RMS（按块顺序）
    ///
    /// 完整块与边界处的空块用配置块长归一化，非空尾块用实际剩余样本数归一化。
    pub fn block_rms_values(&self) -> Vec<f64> {
        let complete = self.complete_block_count();
        let tail = self.tail_samples();
        self.measured_blocks()
            .iter()
            .enumerate()
            .map(|(i, block)| {
                let length = if i == complete && tail > 0 {
                    tail
                } else {
                    self.block_length
                };
                block.rms(length)
            })
            .collect()
    }

    /// 每个参与统计的块的峰值（按块顺序）
    pub fn block_peaks(&self) -> Vec<f64> {
        self.measured_blocks().iter().map(|b| b.peak).collect()
    }

    /// 清空所有块并重新打开第一个块
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.blocks.push(DrBlock::default());
        self.samples_seen = 0;
        self.last_boundary = 0;
    }
}

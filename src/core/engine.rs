//! 流式分析引擎
//!
//! 生命周期：`Uninitialized → Ingesting → Finalized`
//!
//! - `initialize(sample_rate, channel_count)`：分配每声道状态，进入 Ingesting
//! - `ingest(channel, samples)`：实时路径，只做累加，不分配、不记录日志
//! - `finalize()`：计算DR、峰值因数、直方图曲线，进入 Finalized
//! - `reset()`：丢弃全部状态，回到 Uninitialized
//!
//! 不同声道的状态互不共享；宿主可以通过 `channels_mut()` 把各声道分给不同线程，
//! 同一声道的样本必须按时间顺序送入。

use log::{debug, info, warn};
use serde::Serialize;

use crate::core::allpass::BandFilterBank;
use crate::core::channel_data::ChannelData;
use crate::core::crest_factor::{CrestFactorReport, linear_to_dbfs};
use crate::core::dr_block::DrBlockTracker;
use crate::core::dr_calculator::{DrAverage, DrResult, calculate_channel_dr};
use crate::core::histogram::{AmplitudeHistogram, HistogramCurve};
use crate::error::{AnalysisError, EngineResult};
use crate::tools::constants::bands::BAND_COUNT;
use crate::tools::constants::dr_analysis::BLOCK_DURATION_SECONDS;
use crate::tools::constants::engine_limits::MAX_CHANNELS;
use crate::tools::constants::labels::NO_MEASUREMENTS;

/// 引擎生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Uninitialized,
    Ingesting,
    Finalized,
}

impl EngineState {
    /// 状态名称（用于错误信息）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Ingesting => "Ingesting",
            Self::Finalized => "Finalized",
        }
    }
}

/// 引擎配置：采样率与声道数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub channel_count: usize,
}

impl EngineConfig {
    /// 创建并验证配置
    ///
    /// 采样率必须是有限正数且块长至少1个样本；声道数在 1..=32 之间。
    pub fn new(sample_rate: f64, channel_count: usize) -> EngineResult<Self> {
        let config = Self {
            sample_rate,
            channel_count,
        };
        config.validate()?;
        Ok(config)
    }

    /// 验证配置参数
    pub fn validate(&self) -> EngineResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "采样率必须为正数: {}",
                self.sample_rate
            )));
        }
        if self.block_length() == 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "采样率过低，DR块长度为0: {}",
                self.sample_rate
            )));
        }
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(AnalysisError::InvalidConfig(format!(
                "声道数必须在 1..={MAX_CHANNELS} 之间: {}",
                self.channel_count
            )));
        }
        Ok(())
    }

    /// DR块长度：round(sample_rate × 3)
    pub fn block_length(&self) -> usize {
        (self.sample_rate * BLOCK_DURATION_SECONDS).round() as usize
    }
}

/// 单声道的全部流式状态
///
/// 由引擎持有；宿主可以通过 `AnalysisEngine::channel_mut` 直接摄取，
/// 从而把不同声道分配给不同线程。
#[derive(Debug, Clone)]
pub struct ChannelAnalyzer {
    data: ChannelData,
    filters: BandFilterBank,
    blocks: DrBlockTracker,
    histogram: AmplitudeHistogram,
}

impl ChannelAnalyzer {
    fn new(config: &EngineConfig) -> Self {
        Self {
            data: ChannelData::new(),
            filters: BandFilterBank::new(config.sample_rate),
            blocks: DrBlockTracker::new(config.block_length()),
            histogram: AmplitudeHistogram::new(),
        }
    }

    /// 清零全部累积状态，保留滤波器系数与已分配的块容量
    fn reset(&mut self) {
        self.data.reset();
        self.filters.reset();
        self.blocks.clear();
        self.histogram.clear();
    }

    /// 摄取一段按时间顺序排列的单声道样本
    ///
    /// 块列表超过预留容量（`RESERVED_BLOCKS_PER_CHANNEL` 块，约1小时）后，
    /// 每打开一个新块都可能在此路径上重新分配内存。
    #[inline]
    pub fn ingest(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.process_sample(sample as f64);
        }
    }

    #[inline]
    fn process_sample(&mut self, sample: f64) {
        self.data.process_sample(sample);
        self.histogram.add_sample(sample);
        self.blocks.process_sample(sample);
        for band in 0..BAND_COUNT {
            let output = self.filters.process(band, sample);
            self.data.accumulate_band(band, output);
        }
    }

    /// 已摄取样本数
    pub fn sample_count(&self) -> u64 {
        self.data.sample_count
    }

    /// 整体与频段累积数据
    pub fn data(&self) -> &ChannelData {
        &self.data
    }

    /// DR块跟踪器
    pub fn blocks(&self) -> &DrBlockTracker {
        &self.blocks
    }

    /// 幅度直方图
    pub fn histogram(&self) -> &AmplitudeHistogram {
        &self.histogram
    }

    /// 全通滤波器组
    pub fn filters(&self) -> &BandFilterBank {
        &self.filters
    }
}

/// 单声道的分析报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    /// 声道索引（从0开始）
    pub channel: usize,

    /// DR计算结果
    pub dr: DrResult,

    /// 已分析样本数
    pub sample_count: u64,

    /// 整体绝对值峰值
    pub peak: f64,

    /// 整体RMS
    pub rms: f64,

    /// 峰值（dBFS）
    pub peak_dbfs: f64,

    /// RMS（dBFS）
    pub rms_dbfs: f64,

    /// 归一化直方图曲线（601点）
    pub histogram: HistogramCurve,

    /// 直方图有效位深估计
    pub histogram_bits: f64,
}

/// finalize产生的完整分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// 分析时的引擎配置
    pub config: EngineConfig,

    /// 每个声道的报告
    pub channels: Vec<ChannelReport>,

    /// 多声道平均DR
    pub average: DrAverage,

    /// 峰值因数报告（含差值矩阵）
    pub crest_factors: CrestFactorReport,
}

impl AnalysisResult {
    /// 各声道DR值（按声道顺序）
    pub fn dr_values(&self) -> Vec<f64> {
        self.channels.iter().map(|c| c.dr.dr_value).collect()
    }

    /// 平均DR标签："DR 12.3" / "DR 00.0"
    pub fn average_label(&self) -> String {
        self.average.label()
    }

    /// 声道DR摘要文本
    ///
    /// 首行为声道布局描述，之后每个声道一行 "Channel #k  <DR两位小数>"；
    /// 没有平均值（单声道）时为 "No measurements"。
    pub fn channel_summary_text(&self) -> String {
        if self.average == DrAverage::NoMeasurements {
            return NO_MEASUREMENTS.to_string();
        }
        let mut lines = vec![channel_layout_name(self.config.channel_count)];
        lines.extend(
            self.channels
                .iter()
                .map(|c| format!("Channel #{}  {:.2}", c.channel + 1, c.dr.dr_value)),
        );
        lines.join("\n")
    }
}

/// 声道布局的描述名称
pub fn channel_layout_name(channel_count: usize) -> String {
    match channel_count {
        1 => "Mono".to_string(),
        2 => "Stereo".to_string(),
        n => format!("{n} channels"),
    }
}

/// 流式DR与峰值因数分析引擎
#[derive(Debug)]
pub struct AnalysisEngine {
    state: EngineState,
    config: Option<EngineConfig>,
    channels: Vec<ChannelAnalyzer>,
    result: Option<AnalysisResult>,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisEngine {
    /// 创建未初始化的引擎
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            config: None,
            channels: Vec::new(),
            result: None,
        }
    }

    /// 初始化（或重新初始化）引擎
    ///
    /// Ingesting 状态下以相同参数重复调用不产生任何影响；
    /// Finalized 状态下以相同参数调用时，就地清零每声道状态并复用已分配的内存；
    /// 其他情况下丢弃之前的所有状态，按新参数重建每声道状态。
    ///
    /// # 示例
    ///
    /// ```rust
    /// use masvis_dr_meter::core::{AnalysisEngine, EngineState};
    ///
    /// let mut engine = AnalysisEngine::new();
    /// engine.initialize(44100.0, 2).unwrap();
    /// assert_eq!(engine.state(), EngineState::Ingesting);
    /// ```
    pub fn initialize(&mut self, sample_rate: f64, channel_count: usize) -> EngineResult<()> {
        let config = EngineConfig::new(sample_rate, channel_count)?;

        if self.state == EngineState::Ingesting && self.config == Some(config) {
            debug!("引擎已以相同参数初始化，忽略重复调用");
            return Ok(());
        }

        if self.config == Some(config) {
            self.channels.iter_mut().for_each(ChannelAnalyzer::reset);
        } else {
            self.channels = (0..channel_count)
                .map(|_| ChannelAnalyzer::new(&config))
                .collect();
        }
        self.config = Some(config);
        self.result = None;
        self.state = EngineState::Ingesting;

        info!(
            "分析引擎初始化: {sample_rate} Hz, {channel_count} 声道, DR块长度 {} 样本",
            config.block_length()
        );
        Ok(())
    }

    /// 使用已验证的配置初始化
    pub fn initialize_with(&mut self, config: EngineConfig) -> EngineResult<()> {
        self.initialize(config.sample_rate, config.channel_count)
    }

    /// 摄取一个声道的样本（实时路径）
    ///
    /// 非 Ingesting 状态或声道越界属于调用方错误：debug构建下断言失败，
    /// release构建下样本被丢弃。
    ///
    /// 每声道预留 `RESERVED_BLOCKS_PER_CHANNEL` 个DR块的容量；流长度超过
    /// 约 `RESERVED_BLOCKS_PER_CHANNEL × 3` 秒后，打开新块时会在实时路径上分配内存。
    #[inline]
    pub fn ingest(&mut self, channel: usize, samples: &[f32]) {
        debug_assert!(
            self.state == EngineState::Ingesting,
            "ingest called in {} state",
            self.state.name()
        );
        debug_assert!(
            channel < self.channels.len(),
            "channel {channel} out of range"
        );
        if self.state != EngineState::Ingesting {
            return;
        }
        if let Some(analyzer) = self.channels.get_mut(channel) {
            analyzer.ingest(samples);
        }
    }

    /// 摄取交错排列的多声道帧
    ///
    /// 末尾不完整的帧被忽略。
    pub fn ingest_interleaved(&mut self, interleaved: &[f32]) {
        debug_assert!(
            self.state == EngineState::Ingesting,
            "ingest_interleaved called in {} state",
            self.state.name()
        );
        if self.state != EngineState::Ingesting || self.channels.is_empty() {
            return;
        }
        let channel_count = self.channels.len();
        debug_assert!(
            interleaved.len() % channel_count == 0,
            "interleaved buffer is not a whole number of frames"
        );
        for frame in interleaved.chunks_exact(channel_count) {
            for (analyzer, &sample) in self.channels.iter_mut().zip(frame) {
                analyzer.process_sample(sample as f64);
            }
        }
    }

    /// 获取单个声道的可变句柄（仅 Ingesting 状态）
    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut ChannelAnalyzer> {
        if self.state != EngineState::Ingesting {
            return None;
        }
        self.channels.get_mut(channel)
    }

    /// 获取全部声道的可变句柄（仅 Ingesting 状态，否则为空切片）
    pub fn channels_mut(&mut self) -> &mut [ChannelAnalyzer] {
        if self.state != EngineState::Ingesting {
            return &mut [];
        }
        &mut self.channels
    }

    /// 结束摄取并计算全部统计结果
    ///
    /// - Finalized 状态下重复调用返回已有结果
    /// - Uninitialized 状态返回 `InvalidState`
    /// - 计算失败（如 `TooFewBlocks`）时引擎被重置为 Uninitialized
    pub fn finalize(&mut self) -> EngineResult<AnalysisResult> {
        if self.state == EngineState::Finalized
            && let Some(result) = &self.result
        {
            return Ok(result.clone());
        }
        let config = match (self.state, self.config) {
            (EngineState::Ingesting, Some(config)) => config,
            _ => {
                return Err(AnalysisError::InvalidState {
                    operation: "finalize",
                    state: self.state.name(),
                });
            }
        };

        match self.compute_result(config) {
            Ok(result) => {
                info!(
                    "分析完成: {} 声道, 平均 {}",
                    config.channel_count,
                    result.average_label()
                );
                self.result = Some(result.clone());
                self.state = EngineState::Finalized;
                Ok(result)
            }
            Err(e) => {
                warn!("分析失败，引擎已重置: {e}");
                self.reset();
                Err(e)
            }
        }
    }

    fn compute_result(&self, config: EngineConfig) -> EngineResult<AnalysisResult> {
        let mut channels = Vec::with_capacity(self.channels.len());

        for (index, analyzer) in self.channels.iter().enumerate() {
            let dr = calculate_channel_dr(index, &analyzer.blocks)?;
            let rms = analyzer.data.calculate_rms();
            debug!(
                "声道 {index}: DR {:.2}, {} 块 (上位 {}), 峰值 {:.6}",
                dr.dr_value, dr.block_count, dr.top_count, analyzer.data.peak
            );

            channels.push(ChannelReport {
                channel: index,
                dr,
                sample_count: analyzer.data.sample_count,
                peak: analyzer.data.peak,
                rms,
                peak_dbfs: linear_to_dbfs(analyzer.data.peak),
                rms_dbfs: linear_to_dbfs(rms),
                histogram: analyzer.histogram.normalize(),
                histogram_bits: analyzer.histogram.effective_bits(),
            });
        }

        let dr_values: Vec<f64> = channels.iter().map(|c| c.dr.dr_value).collect();

        Ok(AnalysisResult {
            config,
            channels,
            average: DrAverage::from_values(&dr_values),
            crest_factors: CrestFactorReport::build(self.channels.iter().map(|c| &c.data)),
        })
    }

    /// 丢弃全部状态，回到 Uninitialized
    pub fn reset(&mut self) {
        if self.state != EngineState::Uninitialized {
            debug!("引擎重置 ({} -> Uninitialized)", self.state.name());
        }
        self.channels.clear();
        self.config = None;
        self.result = None;
        self.state = EngineState::Uninitialized;
    }

    /// 当前状态
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// 当前配置（Uninitialized 时为None）
    pub fn config(&self) -> Option<EngineConfig> {
        self.config
    }

    /// 声道数（Uninitialized 时为0）
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 最近一次成功finalize的结果
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// 指定声道已摄取样本数
    pub fn sample_count(&self, channel: usize) -> Option<u64> {
        self.channels.get(channel).map(ChannelAnalyzer::sample_count)
    }

    /// 指定声道的完整DR块数
    pub fn block_count(&self, channel: usize) -> Option<usize> {
        self.channels
            .get(channel)
            .map(|c| c.blocks.complete_block_count())
    }

    /// 指定声道的原始直方图
    pub fn histogram(&self, channel: usize) -> Option<&AmplitudeHistogram> {
        self.channels.get(channel).map(|c| &c.histogram)
    }

    /// 指定声道的只读状态
    pub fn channel(&self, channel: usize) -> Option<&ChannelAnalyzer> {
        self.channels.get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(EngineConfig::new(44100.0, 2).is_ok());
        assert!(matches!(
            EngineConfig::new(0.0, 2),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(EngineConfig::new(f64::NAN, 2).is_err());
        assert!(EngineConfig::new(44100.0, 0).is_err());
        assert!(EngineConfig::new(44100.0, MAX_CHANNELS + 1).is_err());
        assert!(EngineConfig::new(0.1, 1).is_err());
    }

    #[test]
    fn test_block_length_rounding() {
        assert_eq!(EngineConfig::new(44100.0, 1).unwrap().block_length(), 132300);
        assert_eq!(EngineConfig::new(100.5, 1).unwrap().block_length(), 302);
    }

    #[test]
    fn test_lifecycle() {
        let mut engine = AnalysisEngine::new();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert_eq!(engine.channel_count(), 0);

        engine.initialize(100.0, 2).unwrap();
        assert_eq!(engine.state(), EngineState::Ingesting);

        let block = square(0.5, 300);
        for _ in 0..4 {
            engine.ingest(0, &block);
            engine.ingest(1, &block);
        }
        assert_eq!(engine.block_count(0), Some(4));

        let result = engine.finalize().unwrap();
        assert_eq!(engine.state(), EngineState::Finalized);
        assert_eq!(result.channels.len(), 2);
        assert_eq!(engine.finalize().unwrap(), result);

        engine.reset();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        assert_eq!(engine.sample_count(0), None);
        assert!(engine.result().is_none());
    }

    #[test]
    fn test_initialize_same_params_is_noop() {
        let mut engine = AnalysisEngine::new();
        engine.initialize(100.0, 1).unwrap();
        engine.ingest(0, &[0.1; 50]);

        engine.initialize(100.0, 1).unwrap();
        assert_eq!(engine.sample_count(0), Some(50));

        engine.initialize(200.0, 1).unwrap();
        assert_eq!(engine.sample_count(0), Some(0));
    }

    #[test]
    fn test_reinitialize_after_finalize_clears_channels_in_place() {
        let mut engine = AnalysisEngine::new();
        engine.initialize(100.0, 2).unwrap();
        engine.ingest(0, &square(0.5, 1000));
        engine.ingest(1, &square(0.25, 1000));
        let first = engine.finalize().unwrap();

        engine.initialize(100.0, 2).unwrap();
        assert_eq!(engine.state(), EngineState::Ingesting);
        assert!(engine.result().is_none());
        for index in 0..2 {
            let channel = engine.channel(index).unwrap();
            assert_eq!(channel.sample_count(), 0);
            assert_eq!(channel.data(), &ChannelData::default());
            assert_eq!(channel.blocks().blocks().len(), 1);
            assert_eq!(channel.blocks().samples_seen(), 0);
            assert_eq!(channel.histogram().total_count(), 0);
            assert!((0..BAND_COUNT).all(|b| channel.filters().filter(b).sample_count() == 0));
        }

        engine.ingest(0, &square(0.5, 1000));
        engine.ingest(1, &square(0.25, 1000));
        assert_eq!(engine.finalize().unwrap(), first);
    }

    #[test]
    fn test_invalid_initialize_keeps_state() {
        let mut engine = AnalysisEngine::new();
        assert!(engine.initialize(-1.0, 2).is_err());
        assert_eq!(engine.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_finalize_uninitialized_is_invalid_state() {
        let mut engine = AnalysisEngine::new();
        match engine.finalize() {
            Err(AnalysisError::InvalidState { operation, state }) => {
                assert_eq!(operation, "finalize");
                assert_eq!(state, "Uninitialized");
            }
            other => panic!("期望InvalidState，得到 {other:?}"),
        }
    }

    #[test]
    fn test_too_few_blocks_resets_engine() {
        let mut engine = AnalysisEngine::new();
        engine.initialize(100.0, 1).unwrap();
        engine.ingest(0, &square(0.5, 899));

        assert!(matches!(
            engine.finalize(),
            Err(AnalysisError::TooFewBlocks { blocks: 2, .. })
        ));
        assert_eq!(engine.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let left = square(0.5, 1000);
        let right: Vec<f32> = (0..1000).map(|i| (i % 7) as f32 * 0.1).collect();
        let interleaved: Vec<f32> = left
            .iter()
            .zip(&right)
            .flat_map(|(&l, &r)| [l, r])
            .collect();

        let mut planar = AnalysisEngine::new();
        planar.initialize(100.0, 2).unwrap();
        planar.ingest(0, &left);
        planar.ingest(1, &right);

        let mut mixed = AnalysisEngine::new();
        mixed.initialize(100.0, 2).unwrap();
        mixed.ingest_interleaved(&interleaved);

        assert_eq!(planar.finalize().unwrap(), mixed.finalize().unwrap());
    }

    #[test]
    fn test_channel_handles() {
        let mut engine = AnalysisEngine::new();
        assert!(engine.channel_mut(0).is_none());
        assert!(engine.channels_mut().is_empty());

        engine.initialize(100.0, 3).unwrap();
        if let Some(ch) = engine.channel_mut(2) {
            ch.ingest(&[0.25; 10]);
        }
        assert_eq!(engine.channels_mut().len(), 3);
        assert_eq!(engine.sample_count(2), Some(10));
        assert_eq!(engine.sample_count(0), Some(0));
        assert_eq!(engine.histogram(2).map(|h| h.count(75)), Some(10));
    }

    #[test]
    fn test_channel_summary_text() {
        let mut engine = AnalysisEngine::new();
        engine.initialize(100.0, 1).unwrap();
        engine.ingest(0, &square(0.5, 900));
        let mono = engine.finalize().unwrap();
        assert_eq!(mono.channel_summary_text(), "No measurements");
        assert_eq!(mono.average_label(), "DR 00.0");

        engine.initialize(100.0, 2).unwrap();
        engine.ingest(0, &square(0.5, 900));
        engine.ingest(1, &square(0.5, 900));
        let stereo = engine.finalize().unwrap();
        assert_eq!(
            stereo.channel_summary_text(),
            "Stereo\nChannel #1  -3.01\nChannel #2  -3.01"
        );
    }

    #[test]
    fn test_channel_summary_lines_follow_dr_values() {
        let mut engine = AnalysisEngine::new();
        engine.initialize(100.0, 2).unwrap();
        // 左声道恒定方波；右声道音量逐块变化
        engine.ingest(0, &square(0.5, 1200));
        for level in [0.1, 0.8, 0.3, 0.6] {
            engine.ingest(1, &square(level, 300));
        }
        let result = engine.finalize().unwrap();

        let dr = result.dr_values();
        assert!((dr[0] - dr[1]).abs() > 0.5);
        let expected = format!(
            "Stereo\nChannel #1  {:.2}\nChannel #2  {:.2}",
            dr[0], dr[1]
        );
        assert_eq!(result.channel_summary_text(), expected);
        assert!(
            result
                .crest_factors
                .channels
                .iter()
                .all(|cf| !result.channel_summary_text().contains(&format!("{:.2}", cf.overall)))
        );
    }
}

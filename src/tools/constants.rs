//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// DR分析算法常量
pub mod dr_analysis {
    /// DR块时长（秒）- DR14标准
    ///
    /// 块长度 = round(sample_rate × 3.0)
    pub const BLOCK_DURATION_SECONDS: f64 = 3.0;

    /// 参与RMS平均的"最响"块比例（上位20%）
    pub const TOP_RMS_FRACTION: f64 = 0.2;

    /// finalize前至少需要的完整DR块数（即至少9秒音频）
    pub const MIN_COMPLETE_BLOCKS: usize = 3;

    /// 块RMS的Sum Doubling系数：blockRMS = sqrt(2 × Σx² / n)
    pub const BLOCK_RMS_DOUBLING: f64 = 2.0;

    /// 预留的DR块容量（每声道），约一小时音频
    ///
    /// 实时摄取路径在此容量内不会发生内存分配；超出后每打开一个新块
    /// 都可能触发 `Vec` 扩容（见 `AnalysisEngine::ingest`）
    pub const RESERVED_BLOCKS_PER_CHANNEL: usize = 1200;
}

/// 全通滤波器组常量
pub mod bands {
    /// 分析频段数量
    pub const BAND_COUNT: usize = 7;

    /// 7个分析中心频率（Hz）
    pub const BAND_FREQUENCIES: [f64; BAND_COUNT] =
        [20.0, 60.0, 200.0, 600.0, 2000.0, 6000.0, 20000.0];

    /// 奈奎斯特钳位除数：fc = min(fc, fs / 2.0001)
    pub const NYQUIST_GUARD_DIVISOR: f64 = 2.0001;
}

/// 幅度直方图常量
pub mod histogram {
    /// bin分辨率：bin = round(sample × 300)
    pub const RESOLUTION: f64 = 300.0;

    /// 最小bin索引
    pub const MIN_BIN: i32 = -300;

    /// 最大bin索引
    pub const MAX_BIN: i32 = 300;

    /// bin总数（-300..=300）
    pub const BIN_COUNT: usize = 601;
}

/// 分贝计算常量
pub mod decibels {
    /// 静音/未定义哨兵值（rms为0时db()返回此值）
    pub const SILENCE_DB: f64 = -128.0;
}

/// 引擎配置限制
pub mod engine_limits {
    /// 最大声道数
    pub const MAX_CHANNELS: usize = 32;
}

/// 默认配置值
pub mod defaults {
    /// 默认每次送入引擎的帧数（模拟宿主音频回调的块大小）
    pub const CHUNK_FRAMES: usize = 4096;

    /// 默认多文件并行并发度
    ///
    /// 4并发度在多数场景下提供良好的性能/资源平衡
    pub const PARALLEL_FILES_DEGREE: usize = 4;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 限制最大并发度为16，避免过度并发导致的上下文切换开销
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}

/// 报告文本常量
pub mod labels {
    /// 无有效测量时的平均值标签
    pub const NO_MEASUREMENTS_AVERAGE: &str = "DR 00.0";

    /// 无有效测量时的声道摘要
    pub const NO_MEASUREMENTS: &str = "No measurements";
}

//! 音频处理模块
//!
//! 负责把解码器输出的交错块流式送入分析引擎，并处理单文件结果输出。

use log::{debug, info};
use std::path::{Path, PathBuf};

use super::cli::AppConfig;
use super::{formatter, utils};
use crate::audio::{AudioFormat, StreamingDecoder, open_streaming_decoder};
use crate::core::{AnalysisEngine, AnalysisResult};
use crate::error::{AnalysisError, EngineResult};

/// 单个文件的分析输出
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    /// 音频文件路径
    pub path: PathBuf,

    /// 解码后的最终格式（样本数为实际解码值）
    pub format: AudioFormat,

    /// 引擎分析结果
    pub result: AnalysisResult,
}

/// 把解码器的全部输出送入新引擎并finalize
///
/// 每个块只送入完整帧；解码器的块大小与引擎结果无关。
pub fn analyze_decoder(decoder: &mut dyn StreamingDecoder) -> EngineResult<AnalysisResult> {
    let format = decoder.format().clone();
    let channels = format.channels_usize();

    let mut engine = AnalysisEngine::new();
    engine.initialize(format.sample_rate as f64, channels)?;

    while let Some(chunk) = decoder.next_chunk()? {
        let whole_frames = chunk.len() - chunk.len() % channels;
        engine.ingest_interleaved(&chunk[..whole_frames]);
    }

    debug!(
        "解码完成: {} 帧, 进度 {:.1}%",
        decoder.frames_decoded(),
        decoder.progress() * 100.0
    );

    engine.finalize()
}

/// 处理单个音频文件
pub fn process_audio_file(path: &Path, chunk_frames: usize) -> EngineResult<FileAnalysis> {
    let mut decoder = open_streaming_decoder(path, chunk_frames)?;
    let result = analyze_decoder(decoder.as_mut())?;

    let mut format = decoder.format().clone();
    format.update_sample_count(decoder.frames_decoded());

    info!(
        "{}: {} ({} 声道, {} Hz)",
        utils::extract_filename_lossy(path),
        result.average.official_label(),
        format.channels,
        format.sample_rate
    );

    Ok(FileAnalysis {
        path: path.to_path_buf(),
        format,
        result,
    })
}

/// 处理单个音频文件并显示详细信息
pub fn process_single_audio_file(path: &Path, config: &AppConfig) -> EngineResult<FileAnalysis> {
    if config.verbose {
        println!("加载音频文件 / Loading audio file: {}", path.display());
    }

    let analysis = process_audio_file(path, config.chunk_frames)?;

    if config.verbose {
        let format = &analysis.format;
        println!("音频格式信息 / Audio format information:");
        println!("   采样率 / Sample rate:   {} Hz", format.sample_rate);
        println!("   声道数 / Channels:      {}", format.channels);
        println!("   位深度 / Bit depth:     {} bits", format.bits_per_sample);
        println!("   样本数 / Sample count:  {}", format.sample_count);
        println!(
            "   时长 / Duration:        {:.2} seconds",
            format.duration_seconds()
        );
    }

    Ok(analysis)
}

/// 输出单文件结果（文本或JSON，控制台或文件）
pub fn output_results(analysis: &FileAnalysis, config: &AppConfig) -> EngineResult<()> {
    let output = if config.json {
        formatter::format_json_report(analysis)?
    } else {
        formatter::format_text_report(analysis)
    };
    formatter::write_output(&output, config.output_path.as_deref())
}

/// 将成功结果追加到批量输出
pub fn add_to_batch_output(batch_output: &mut String, analysis: &FileAnalysis) {
    batch_output.push_str(&formatter::format_batch_line(analysis));
}

/// 将失败结果追加到批量输出
pub fn add_failed_to_batch_output(batch_output: &mut String, path: &Path, error: &AnalysisError) {
    let file_name = utils::extract_filename_lossy(path);
    let reason = match error {
        AnalysisError::TooFewBlocks { .. } => "音频过短 / too short",
        _ => "处理失败 / failed",
    };
    batch_output.push_str(&format!("{:<17}{:<17}{}\n", "-", reason, file_name));
}

/// 在音频文件旁保存单独的文本结果（`<stem>_DR_Analysis.txt`）
pub fn save_individual_result(analysis: &FileAnalysis) -> EngineResult<PathBuf> {
    let parent_dir = utils::get_parent_dir(&analysis.path);
    let file_stem = utils::extract_file_stem(&analysis.path);
    let output_path = parent_dir.join(format!("{file_stem}_DR_Analysis.txt"));
    std::fs::write(&output_path, formatter::format_text_report(analysis))?;
    Ok(output_path)
}

//! 文件扫描模块
//!
//! 负责扫描目录中的音频文件，并生成批量报告的头尾与输出路径。

use log::warn;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::cli::AppConfig;
use super::utils;
use crate::audio::{SUPPORTED_EXTENSIONS, is_supported_extension};
use crate::error::{AnalysisError, EngineResult, ErrorCategory};

/// 扫描目录中的音频文件
///
/// `recursive` 为false时只扫描目录本身；结果按路径排序。
/// 无法读取的子项会被跳过并记录警告。
pub fn scan_audio_files(dir_path: &Path, recursive: bool) -> EngineResult<Vec<PathBuf>> {
    if !dir_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )
        .into());
    }

    if !dir_path.is_dir() {
        return Err(AnalysisError::InvalidConfig(format!(
            "路径不是目录: {}",
            dir_path.display()
        )));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut audio_files = Vec::new();

    for entry in WalkDir::new(dir_path).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("跳过无法读取的路径: {e}");
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported_extension(entry.path()) {
            audio_files.push(entry.into_path());
        }
    }

    audio_files.sort();
    Ok(audio_files)
}

/// 显示文件扫描结果
pub fn show_scan_results(config: &AppConfig, audio_files: &[PathBuf]) {
    if audio_files.is_empty() {
        println!(
            "在目录 {} 中没有找到支持的音频文件 / No supported audio files found",
            config.input_path.display()
        );
        println!(
            "   支持的格式 / Supported formats: {}",
            SUPPORTED_EXTENSIONS.join(", ").to_uppercase()
        );
        return;
    }

    println!("扫描目录 / Scanning: {}", config.input_path.display());
    println!("找到 {} 个音频文件 / audio files found", audio_files.len());

    if config.verbose {
        for (i, file) in audio_files.iter().enumerate() {
            println!("   {}. {}", i + 1, utils::extract_filename_lossy(file));
        }
    }
    println!();
}

/// 生成批量输出的头部信息
pub fn create_batch_output_header(config: &AppConfig, audio_files: &[PathBuf]) -> String {
    let mut batch_output = String::new();

    batch_output.push_str("=====================================\n");
    batch_output.push_str("   MASVIS DR Analysis Report\n");
    batch_output.push_str("   批量分析结果 / Batch results\n");
    batch_output.push_str("=====================================\n\n");

    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    batch_output.push_str(&format!("log date: {now}\n"));
    batch_output.push_str(&format!("扫描目录 / Directory: {}\n", config.input_path.display()));
    batch_output.push_str(&format!("处理文件数 / Files: {}\n\n", audio_files.len()));

    batch_output.push_str(&format!("{:<17}{:<17}{}\n", "Official DR", "Average", "File"));
    batch_output.push_str("--------------------------------------------------------\n");

    batch_output
}

/// 生成批量输出的统计信息
pub fn create_batch_output_footer(
    audio_files: &[PathBuf],
    processed_count: usize,
    failed_count: usize,
    error_stats: &HashMap<ErrorCategory, Vec<String>>,
) -> String {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    let mut output = String::new();

    output.push('\n');
    output.push_str("=====================================\n");
    output.push_str("批量处理统计 / Batch statistics:\n");
    output.push_str(&format!("   总文件数 / Total: {}\n", audio_files.len()));
    output.push_str(&format!("   成功处理 / Processed: {processed_count}\n"));
    output.push_str(&format!("   处理失败 / Failed: {failed_count}\n"));
    if !audio_files.is_empty() {
        output.push_str(&format!(
            "   处理成功率 / Success rate: {:.1}%\n",
            processed_count as f64 / audio_files.len() as f64 * 100.0
        ));
    }

    if !error_stats.is_empty() {
        let mut categories: Vec<_> = error_stats.iter().collect();
        categories.sort_by_key(|(category, _)| category.display_name());
        output.push_str("\n错误分类 / Errors by category:\n");
        for (category, files) in categories {
            output.push_str(&format!(
                "   {} ({}): {}\n",
                category.display_name(),
                files.len(),
                files.join(", ")
            ));
        }
    }

    output.push('\n');
    output.push_str(&format!("生成工具 / Generated by: MASVIS DR Meter v{VERSION}\n"));

    output
}

/// 生成批量输出文件路径
pub fn generate_batch_output_path(config: &AppConfig) -> PathBuf {
    config.output_path.clone().unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let dir_name = utils::extract_filename(&config.input_path).replace('.', "_");
        config
            .input_path
            .join(format!("{dir_name}_BatchDR_Results_{timestamp}.txt"))
    })
}

/// 显示批量处理完成信息
pub fn show_batch_completion_info(
    output_path: &Path,
    processed_count: usize,
    total_count: usize,
    failed_count: usize,
) {
    println!();
    println!("批量处理完成 / Batch complete");
    println!("   成功处理 / Processed: {processed_count} / {total_count}");
    if failed_count > 0 {
        println!("   失败文件 / Failed: {failed_count}");
    }
    println!("   批量汇总 / Summary: {}", output_path.display());
}

//! MASVIS DR Meter - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成DR分析任务。

use anyhow::{Context, Result};
use masvis_dr_meter::{
    audio::SUPPORTED_EXTENSIONS,
    error::{AnalysisError, ErrorCategory},
    tools::{self, AppConfig},
};
use std::process;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 解码失败
    pub const DECODING_ERROR: i32 = 3;
    /// 计算错误（块数不足等）
    pub const CALCULATION_ERROR: i32 = 4;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &AnalysisError) -> &'static str {
    match error {
        AnalysisError::TooFewBlocks { .. } => {
            "音频太短，DR计算至少需要3个完整的3秒块（约9秒） / Audio too short, DR needs at least 3 complete 3-second blocks (about 9 seconds)"
        }
        AnalysisError::InvalidConfig(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check if command-line arguments are correct, use --help to see full usage"
        }
        _ => match ErrorCategory::from_analysis_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
            }
            ErrorCategory::Format => {
                "确保输入文件为支持的格式 / Ensure input file is in a supported format"
            }
            ErrorCategory::Decoding => {
                "文件可能损坏或使用不支持的音频编码 / File may be corrupted or use unsupported audio encoding"
            }
            ErrorCategory::Calculation | ErrorCategory::Other => {
                "请检查输入文件和参数设置 / Please check input file and parameter settings"
            }
        },
    }
}

/// 错误处理和建议
fn handle_error(error: anyhow::Error) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error:#}");

    let Some(analysis_error) = error.downcast_ref::<AnalysisError>() else {
        process::exit(exit_codes::GENERAL_ERROR);
    };

    let category = ErrorCategory::from_analysis_error(analysis_error);
    eprintln!(
        "[INFO] 建议 / Suggestion: {}",
        get_error_suggestion(analysis_error)
    );

    if matches!(category, ErrorCategory::Format) {
        eprintln!(
            "   Supported formats / 支持的格式: {}",
            SUPPORTED_EXTENSIONS.join(", ").to_uppercase()
        );
    }

    let exit_code = match analysis_error {
        AnalysisError::InvalidConfig(_) => exit_codes::FORMAT_ERROR,
        _ => match category {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::Decoding => exit_codes::DECODING_ERROR,
            ErrorCategory::Calculation => exit_codes::CALCULATION_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 批量处理音频文件
fn process_batch_mode(config: &AppConfig) -> Result<()> {
    let audio_files = tools::scan_audio_files(&config.input_path, config.recursive)
        .with_context(|| format!("扫描目录失败: {}", config.input_path.display()))?;

    tools::show_scan_results(config, &audio_files);

    if audio_files.is_empty() {
        return Ok(());
    }

    let degree = config.effective_parallel_degree(audio_files.len());
    let summary = tools::process_batch_parallel(&audio_files, config, degree)?;

    if summary.processed == 0 {
        log::warn!("批量处理中没有成功分析的文件");
    }
    Ok(())
}

/// 单文件处理模式
fn process_single_mode(config: &AppConfig) -> Result<()> {
    let analysis = tools::process_single_audio_file(&config.input_path, config)?;
    tools::output_results(&analysis, config)?;
    Ok(())
}

/// 应用程序主逻辑
fn run(config: &AppConfig) -> Result<()> {
    tools::show_startup_info(config);

    if config.is_batch_mode() {
        process_batch_mode(config)?;
    } else {
        process_single_mode(config)?;
    }

    tools::show_completion_info(config);
    Ok(())
}

fn main() {
    let config = tools::parse_args();

    // RUST_LOG优先，未设置时按 --verbose 选择级别
    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}

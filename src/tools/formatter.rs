//! 输出格式化模块
//!
//! 负责分析结果的文本报告、JSON报告与批量汇总行。

use comfy_table::presets::ASCII_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;
use std::path::Path;

use super::processor::FileAnalysis;
use super::utils;
use crate::audio::AudioFormat;
use crate::core::AnalysisResult;
use crate::error::{self, EngineResult};

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------\n";
const FOOTER_RULE: &str =
    "================================================================================\n";

/// 创建输出头部信息
pub fn create_output_header(file_path: &Path, format: &AudioFormat) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "MASVIS DR Meter v{VERSION} / Dynamic Range & Crest Factor Meter\n"
    ));
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    output.push_str(&format!("log date: {now}\n\n"));

    output.push_str(SEPARATOR);
    output.push_str(&format!(
        "Statistics for: {}\n",
        utils::extract_filename(file_path)
    ));
    output.push_str(&format!("Number of samples: {}\n", format.sample_count));
    output.push_str(&format!(
        "Duration: {} \n",
        utils::format_duration(format.duration_seconds())
    ));
    if format.is_partial() {
        output.push_str(&format!(
            "Partial analysis: {} corrupt packets skipped / 跳过损坏包\n",
            format.skipped_packets()
        ));
    }
    output.push_str(SEPARATOR);
    output.push('\n');

    output
}

/// 每声道DR、峰值、RMS表格
pub fn format_channel_table(result: &AnalysisResult) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        "Channel",
        "DR",
        "Peak dBFS",
        "RMS dBFS",
        "Crest dB",
        "Blocks",
        "Hist bits",
    ]);

    for (report, crest) in result.channels.iter().zip(&result.crest_factors.channels) {
        table.add_row(vec![
            Cell::new(report.channel + 1),
            right(format!("{:.2}", report.dr.dr_value)),
            right(format!("{:.2}", report.peak_dbfs)),
            right(format!("{:.2}", report.rms_dbfs)),
            right(format!("{:.2}", crest.overall)),
            right(report.dr.block_count.to_string()),
            right(format!("{:.2}", report.histogram_bits)),
        ]);
    }

    format!("{table}\n")
}

/// 峰值因数差值矩阵（频段CF − 整体CF）
pub fn format_crest_factor_table(result: &AnalysisResult) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let mut header = vec!["Hz".to_string()];
    header.extend((1..=result.channels.len()).map(|i| format!("Channel #{i}")));
    table.set_header(header);

    for row in &result.crest_factors.rows {
        let mut cells = vec![Cell::new(&row.label)];
        cells.extend(row.cells().into_iter().map(right));
        table.add_row(cells);
    }

    format!("{table}\n")
}

/// 平均DR（官方整数值 + 一位小数精确值）
pub fn format_dr_summary(result: &AnalysisResult) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Official DR Value: {}\n",
        result.average.official_label()
    ));
    output.push_str(&format!("Average DR:        {}\n\n", result.average_label()));
    output
}

/// 格式化音频技术信息
pub fn format_audio_info(format: &AudioFormat) -> String {
    let mut output = String::new();

    output.push_str(&format!("Samplerate:        {} Hz\n", format.sample_rate));
    output.push_str(&format!("Channels:          {}\n", format.channels));
    output.push_str(&format!("Bits per sample:   {}\n", format.bits_per_sample));
    output.push_str(&format!(
        "Codec:             {}\n",
        format.codec.as_deref().unwrap_or("unknown").to_uppercase()
    ));
    output.push_str(FOOTER_RULE);

    output
}

/// 完整文本报告
pub fn format_text_report(analysis: &FileAnalysis) -> String {
    let mut output = create_output_header(&analysis.path, &analysis.format);
    output.push_str(&format_channel_table(&analysis.result));
    output.push('\n');
    output.push_str(&format_dr_summary(&analysis.result));
    output.push_str("Crest factor difference (band - overall, dB):\n");
    output.push_str(&format_crest_factor_table(&analysis.result));
    output.push('\n');
    output.push_str(&analysis.result.channel_summary_text());
    output.push_str("\n\n");
    output.push_str(&format_audio_info(&analysis.format));
    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    generated_at: String,
    file: String,
    format: &'a AudioFormat,
    official_dr: String,
    average_label: String,
    channel_summary: String,
    analysis: &'a AnalysisResult,
}

/// JSON报告（含直方图曲线与峰值因数矩阵）
pub fn format_json_report(analysis: &FileAnalysis) -> EngineResult<String> {
    let report = JsonReport {
        tool: "masvis-dr",
        version: VERSION,
        generated_at: chrono::Local::now().to_rfc3339(),
        file: analysis.path.display().to_string(),
        format: &analysis.format,
        official_dr: analysis.result.average.official_label(),
        average_label: analysis.result.average_label(),
        channel_summary: analysis.result.channel_summary_text(),
        analysis: &analysis.result,
    };
    serde_json::to_string_pretty(&report).map_err(|e| error::format_error("JSON序列化失败", e))
}

/// 批量汇总中的一行：官方DR、平均值、文件名
pub fn format_batch_line(analysis: &FileAnalysis) -> String {
    format!(
        "{:<17}{:<17}{}\n",
        analysis.result.average.official_label(),
        analysis.result.average_label(),
        utils::extract_filename_lossy(&analysis.path)
    )
}

/// 处理输出写入（文件或控制台）
pub fn write_output(output: &str, output_path: Option<&Path>) -> EngineResult<()> {
    match output_path {
        Some(path) => {
            std::fs::write(path, output)?;
            println!("结果已保存到 / Saved to: {}", path.display());
        }
        None => print!("{output}"),
    }
    Ok(())
}

fn right<T: std::fmt::Display>(content: T) -> Cell {
    Cell::new(content).set_alignment(CellAlignment::Right)
}

//! 多文件并行处理模块
//!
//! 使用rayon实现文件级并行处理，保证输出顺序一致性。
//! 每个文件拥有独立的分析引擎，文件之间不共享任何状态。

use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::cli::AppConfig;
use super::processor::{
    FileAnalysis, add_failed_to_batch_output, add_to_batch_output, process_audio_file,
    save_individual_result,
};
use super::scanner::{
    create_batch_output_footer, create_batch_output_header, generate_batch_output_path,
    show_batch_completion_info,
};
use super::utils;
use crate::error::{AnalysisError, EngineResult, ErrorCategory};

/// 有序结果容器（保证输出顺序）
struct OrderedResult {
    /// 原始文件索引（用于排序）
    index: usize,

    /// 文件路径
    file_path: PathBuf,

    /// 处理结果
    result: EngineResult<FileAnalysis>,
}

/// 批量处理统计
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// 成功处理的文件数
    pub processed: usize,

    /// 失败的文件数
    pub failed: usize,

    /// 按错误类别分组的失败文件名
    pub error_stats: HashMap<ErrorCategory, Vec<String>>,

    /// 批量汇总文件路径
    pub output_path: PathBuf,
}

/// 多文件批量处理
///
/// 使用指定并发度的rayon线程池（并发度为1时等同串行），
/// 结果按输入顺序写入批量汇总文件，并在每个音频文件旁保存单独结果。
pub fn process_batch_parallel(
    audio_files: &[PathBuf],
    config: &AppConfig,
    parallel_degree: usize,
) -> EngineResult<BatchSummary> {
    if parallel_degree > 1 {
        println!("启用多文件并行处理 / Parallel files: {parallel_degree}");
    }

    let error_stats = Arc::new(Mutex::new(HashMap::<ErrorCategory, Vec<String>>::new()));
    let processed_count = Arc::new(AtomicUsize::new(0));
    let failed_count = Arc::new(AtomicUsize::new(0));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree.max(1))
        .thread_name(|i| format!("dr-worker-{i}"))
        .build()
        .map_err(|e| AnalysisError::InvalidConfig(format!("线程池创建失败: {e}")))?;

    let results: Vec<OrderedResult> = pool.install(|| {
        audio_files
            .par_iter()
            .enumerate()
            .map(|(index, audio_file)| {
                let result = process_audio_file(audio_file, config.chunk_frames);

                match &result {
                    Ok(_) => {
                        let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                        if config.verbose {
                            println!(
                                "[OK] [{}/{}] {}",
                                count,
                                audio_files.len(),
                                utils::extract_filename_lossy(audio_file)
                            );
                        }
                    }
                    Err(e) => {
                        failed_count.fetch_add(1, Ordering::Relaxed);
                        let category = ErrorCategory::from_analysis_error(e);
                        let filename = utils::extract_filename_lossy(audio_file);
                        println!("[FAIL] {filename} - [{}] {e}", category.display_name());

                        if let Ok(mut stats) = error_stats.lock() {
                            stats.entry(category).or_default().push(filename);
                        }
                    }
                }

                OrderedResult {
                    index,
                    file_path: audio_file.clone(),
                    result,
                }
            })
            .collect()
    });

    let mut sorted_results = results;
    sorted_results.sort_by_key(|r| r.index);

    let mut batch_output = create_batch_output_header(config, audio_files);
    for ordered in &sorted_results {
        match &ordered.result {
            Ok(analysis) => {
                add_to_batch_output(&mut batch_output, analysis);
                save_individual(analysis, config);
            }
            Err(e) => add_failed_to_batch_output(&mut batch_output, &ordered.file_path, e),
        }
    }

    let error_stats = error_stats
        .lock()
        .map(|stats| stats.clone())
        .unwrap_or_default();
    let processed = processed_count.load(Ordering::Relaxed);
    let failed = failed_count.load(Ordering::Relaxed);

    batch_output.push_str(&create_batch_output_footer(
        audio_files,
        processed,
        failed,
        &error_stats,
    ));

    let output_path = generate_batch_output_path(config);
    std::fs::write(&output_path, &batch_output)?;
    show_batch_completion_info(&output_path, processed, audio_files.len(), failed);

    Ok(BatchSummary {
        processed,
        failed,
        error_stats,
        output_path,
    })
}

fn save_individual(analysis: &FileAnalysis, config: &AppConfig) {
    match save_individual_result(analysis) {
        Ok(path) if config.verbose => {
            println!("   单独结果已保存 / Individual result saved: {}", path.display());
        }
        Ok(_) => {}
        Err(e) => eprintln!(
            "   [WARNING] 保存单独结果文件失败 / Failed to save individual result file ({}): {e}",
            utils::extract_filename_lossy(&analysis.path)
        ),
    }
}

//! 工具模块集合
//!
//! 包含CLI、文件处理、格式化等工具模块，支持main.rs的流程控制。

pub mod cli;
pub mod constants;
pub mod formatter;
pub mod parallel_processor;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use cli::{AppConfig, parse_args, show_completion_info, show_startup_info};
pub use formatter::{format_json_report, format_text_report, write_output};
pub use parallel_processor::{BatchSummary, process_batch_parallel};
pub use processor::{
    FileAnalysis, analyze_decoder, output_results, process_audio_file, process_single_audio_file,
};
pub use scanner::{scan_audio_files, show_scan_results};

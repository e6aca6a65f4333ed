//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;

use super::constants::{defaults, parallel_limits};

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 输入文件路径（单文件模式）或扫描目录（批量模式）
    pub input_path: PathBuf,

    /// 是否显示详细信息
    pub verbose: bool,

    /// 输出文件路径（可选，批量模式时自动生成）
    pub output_path: Option<PathBuf>,

    /// 以JSON格式输出单文件报告
    pub json: bool,

    /// 批量模式下递归扫描子目录
    pub recursive: bool,

    /// 多文件并行度（1表示串行）
    pub parallel_files: usize,

    /// 每次送入分析引擎的帧数
    pub chunk_frames: usize,
}

impl AppConfig {
    /// 智能判断是否为批量模式（基于路径类型）
    #[inline]
    pub fn is_batch_mode(&self) -> bool {
        self.input_path.is_dir()
    }

    /// 实际并行度（钳位到允许范围，且不超过文件数）
    pub fn effective_parallel_degree(&self, file_count: usize) -> usize {
        self.parallel_files
            .clamp(
                parallel_limits::MIN_PARALLEL_DEGREE,
                parallel_limits::MAX_PARALLEL_DEGREE,
            )
            .min(file_count.max(1))
    }

    /// 默认日志级别（RUST_LOG未设置时使用）
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}

/// 构建命令行定义
pub fn build_command() -> Command {
    Command::new("masvis-dr")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("MacinMeter Team")
        .arg(
            Arg::new("INPUT")
                .help("音频文件或目录路径 (支持WAV, FLAC, MP3, AAC, OGG, AIFF)。如果不指定，将扫描可执行文件所在目录")
                .required(false)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("输出结果到文件")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("以JSON格式输出分析结果（含直方图与峰值因数矩阵）")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .long("recursive")
                .short('r')
                .help("批量模式下递归扫描子目录")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-files")
                .long("parallel-files")
                .help("多文件并行度（1为串行，默认4）")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("chunk-frames")
                .long("chunk-frames")
                .help("每次送入分析引擎的帧数（模拟宿主音频回调大小，默认4096）")
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
}

/// 由解析结果创建配置
pub fn config_from_matches(matches: &ArgMatches) -> AppConfig {
    // 确定输入路径（智能路径处理）
    let input_path = match matches.get_one::<String>("INPUT") {
        Some(input) => PathBuf::from(input),
        None => {
            // 双击启动模式：使用可执行文件所在目录
            let exe_path = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            super::utils::get_parent_dir(&exe_path).to_path_buf()
        }
    };

    AppConfig {
        input_path,
        verbose: matches.get_flag("verbose"),
        output_path: matches.get_one::<String>("output").map(PathBuf::from),
        json: matches.get_flag("json"),
        recursive: matches.get_flag("recursive"),
        parallel_files: matches
            .get_one::<usize>("parallel-files")
            .copied()
            .unwrap_or(defaults::PARALLEL_FILES_DEGREE),
        chunk_frames: matches
            .get_one::<usize>("chunk-frames")
            .copied()
            .unwrap_or(defaults::CHUNK_FRAMES)
            .max(1),
    }
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> AppConfig {
    config_from_matches(&build_command().get_matches())
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    println!("MASVIS DR Meter v{VERSION} 启动 / starting");
    println!("{DESCRIPTION}");
    if config.verbose {
        println!(
            "[INFO] 块大小 / Chunk frames: {}, 并行度 / Parallel files: {}",
            config.chunk_frames, config.parallel_files
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("所有任务处理完成 / All tasks completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let matches = build_command()
            .try_get_matches_from(args.iter().copied())
            .expect("参数应当解析成功");
        config_from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["masvis-dr", "track.flac"]);
        assert_eq!(config.input_path, PathBuf::from("track.flac"));
        assert!(!config.verbose);
        assert!(!config.json);
        assert!(!config.recursive);
        assert_eq!(config.output_path, None);
        assert_eq!(config.parallel_files, defaults::PARALLEL_FILES_DEGREE);
        assert_eq!(config.chunk_frames, defaults::CHUNK_FRAMES);
        assert_eq!(config.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "masvis-dr",
            "music",
            "-v",
            "-o",
            "out.json",
            "--json",
            "-r",
            "--parallel-files",
            "8",
            "--chunk-frames",
            "512",
        ]);
        assert!(config.verbose);
        assert!(config.json);
        assert!(config.recursive);
        assert_eq!(config.output_path, Some(PathBuf::from("out.json")));
        assert_eq!(config.parallel_files, 8);
        assert_eq!(config.chunk_frames, 512);
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_zero_chunk_frames_is_clamped() {
        let config = parse(&["masvis-dr", "a.wav", "--chunk-frames", "0"]);
        assert_eq!(config.chunk_frames, 1);
    }

    #[test]
    fn test_effective_parallel_degree() {
        let mut config = parse(&["masvis-dr", "dir"]);
        config.parallel_files = 0;
        assert_eq!(config.effective_parallel_degree(10), 1);
        config.parallel_files = 64;
        assert_eq!(config.effective_parallel_degree(100), 16);
        config.parallel_files = 8;
        assert_eq!(config.effective_parallel_degree(3), 3);
    }

    #[test]
    fn test_rejects_non_numeric_parallelism() {
        assert!(
            build_command()
                .try_get_matches_from(["masvis-dr", "x", "--parallel-files", "many"])
                .is_err()
        );
    }
}

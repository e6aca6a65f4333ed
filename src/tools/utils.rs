//! 工具函数模块
//!
//! 文件路径处理与时长格式化等通用工具函数。

/// 文件路径处理工具函数
pub mod path {
    use std::path::Path;

    /// 提取文件名（统一处理路径提取逻辑）
    #[inline]
    pub fn extract_filename(path: &Path) -> &str {
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
    }

    /// 提取文件stem（不含扩展名）
    #[inline]
    pub fn extract_file_stem(path: &Path) -> &str {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("audio")
    }

    /// 提取文件名（返回String，用于日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 获取父目录，如果不存在则返回当前目录
    #[inline]
    pub fn get_parent_dir(path: &Path) -> &Path {
        path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// 时长格式化：m:ss
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub use path::{extract_file_stem, extract_filename, extract_filename_lossy, get_parent_dir};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_path_helpers() {
        let p = Path::new("/music/album/01 - Intro.flac");
        assert_eq!(extract_filename(p), "01 - Intro.flac");
        assert_eq!(extract_file_stem(p), "01 - Intro");
        assert_eq!(extract_filename_lossy(p), "01 - Intro.flac");
        assert_eq!(get_parent_dir(p), Path::new("/music/album"));
        assert_eq!(get_parent_dir(Path::new("/")), Path::new("."));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(59.9), "0:59");
        assert_eq!(format_duration(125.0), "2:05");
        assert_eq!(format_duration(-3.0), "0:00");
    }
}

//! 数据目录管理
//!
//! 跨平台的应用数据路径：
//! - macOS: ~/Library/Application Support/livecode/<sub>
//! - Linux: $XDG_DATA_HOME/livecode/<sub> 或 ~/.local/share/livecode/<sub>
//! - Windows: %APPDATA%\livecode\<sub>

use std::path::PathBuf;

const APP_NAME: &str = "livecode";
const STORAGE_DIR: &str = "storage";
const DOWNLOADS_DIR: &str = "downloads";
const LOG_DIR: &str = "logs";

/// 获取应用数据目录
fn get_app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs_path_macos()
    }

    #[cfg(target_os = "linux")]
    {
        dirs_path_linux()
    }

    #[cfg(target_os = "windows")]
    {
        dirs_path_windows()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(target_os = "macos")]
fn dirs_path_macos() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join("Library/Application Support")
            .join(APP_NAME)
    })
}

#[cfg(target_os = "linux")]
fn dirs_path_linux() -> Option<PathBuf> {
    // 优先使用 XDG_DATA_HOME，否则使用 ~/.local/share
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg).join(APP_NAME))
    } else {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".local/share").join(APP_NAME))
    }
}

#[cfg(target_os = "windows")]
fn dirs_path_windows() -> Option<PathBuf> {
    std::env::var("APPDATA")
        .ok()
        .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
}

/// 计算 key 的哈希值（用于生成存储文件名）
///
/// 存储文件需要跨版本可读，因此使用固定算法（blake3 前 8 字节）。
pub(crate) fn hash_key(key: &str) -> String {
    let hash = blake3::hash(key.as_bytes());
    hash.to_hex()[..16].to_string()
}

pub fn get_storage_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(STORAGE_DIR))
}

pub fn get_downloads_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(DOWNLOADS_DIR))
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(LOG_DIR))
}

fn ensure_dir(dir: Option<PathBuf>, what: &str) -> std::io::Result<PathBuf> {
    let dir = dir.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Cannot determine {} directory", what),
        )
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

/// 确保日志目录存在
pub fn ensure_log_dir() -> std::io::Result<PathBuf> {
    ensure_dir(get_log_dir(), "log")
}

pub fn ensure_storage_dir() -> std::io::Result<PathBuf> {
    ensure_dir(get_storage_dir(), "storage")
}

pub fn ensure_downloads_dir() -> std::io::Result<PathBuf> {
    ensure_dir(get_downloads_dir(), "downloads")
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/paths.rs"]
mod tests;

use super::*;

#[test]
fn test_hash_key() {
    assert_eq!(hash_key("livecode"), hash_key("livecode"));
    assert_ne!(hash_key("livecode"), hash_key("livecode2"));
    assert_eq!(hash_key("k").len(), 16);
}

#[test]
fn test_hash_key_is_pinned() {
    // 持久化文件名依赖这个值，算法变更会导致已保存内容无法找回
    assert_eq!(hash_key("livecode"), "e95d151881230cec");
    assert_eq!(hash_key(""), "af1349b9f5f9a1a6");
}

#[test]
fn test_get_storage_dir() {
    let dir = get_storage_dir();
    // 在测试环境中应该能获取到目录
    assert!(dir.is_some());
    let dir = dir.unwrap();
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(STORAGE_DIR));
}

#[test]
fn test_get_log_dir() {
    let dir = get_log_dir();
    assert!(dir.is_some());
    let dir = dir.unwrap();
    assert!(dir.to_string_lossy().contains(APP_NAME));
    assert!(dir.to_string_lossy().contains(LOG_DIR));
}

#[test]
fn test_get_downloads_dir() {
    let dir = get_downloads_dir().unwrap();
    assert!(dir.ends_with(DOWNLOADS_DIR));
}

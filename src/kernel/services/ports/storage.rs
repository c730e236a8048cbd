use std::io;

/// 键值持久化接口：同一个 key 重复写入直接覆盖
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

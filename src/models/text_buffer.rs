//! 文本缓冲区模型
//!
//! 职责：
//! - 文本存储（Rope）
//! - 版本号：每次修改递增，供语言服务同步使用
//! - 行列 ↔ 字符偏移映射

use ropey::{Rope, RopeSlice};
use std::borrow::Cow;
use std::io::{self, Write};
use std::ops::Range;

/// 从 RopeSlice 获取字符串，优先零拷贝
pub fn slice_to_cow(slice: RopeSlice<'_>) -> Cow<'_, str> {
    match slice.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(slice.to_string()),
    }
}

#[derive(Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
        }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// 流式写入到 Writer，避免大文件 OOM
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.rope.chunks() {
            writer.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn line(&self, row: usize) -> Option<String> {
        if row < self.rope.len_lines() {
            Some(slice_to_cow(self.rope.line(row)).into_owned())
        } else {
            None
        }
    }

    /// (row, col) → 字符偏移，越界时钳制到文本末尾
    pub fn pos_to_char(&self, pos: (usize, usize)) -> usize {
        let row = pos.0.min(self.rope.len_lines().saturating_sub(1));
        let line_start = self.rope.line_to_char(row);
        let line_len = self.rope.line(row).len_chars();
        (line_start + pos.1.min(line_len)).min(self.rope.len_chars())
    }

    pub fn char_to_pos(&self, char_offset: usize) -> (usize, usize) {
        let char_offset = char_offset.min(self.rope.len_chars());
        let row = self.rope.char_to_line(char_offset);
        (row, char_offset - self.rope.line_to_char(row))
    }

    /// 整体替换内容
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.version += 1;
    }

    /// 在字符偏移处插入文本；返回是否发生修改
    pub fn insert(&mut self, char_offset: usize, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let at = char_offset.min(self.rope.len_chars());
        self.rope.insert(at, text);
        self.version += 1;
        true
    }

    /// 删除字符区间；返回是否发生修改
    pub fn delete(&mut self, range: Range<usize>) -> bool {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.min(len);
        if start >= end {
            return false;
        }
        self.rope.remove(start..end);
        self.version += 1;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/text_buffer.rs"]
mod tests;

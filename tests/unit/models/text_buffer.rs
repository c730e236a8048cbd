use super::*;

#[test]
fn test_text_buffer_basic() {
    let buffer = TextBuffer::from_text("hello\nworld");

    assert_eq!(buffer.len_lines(), 2);
    assert_eq!(buffer.version(), 0);
    assert_eq!(buffer.line(1).as_deref(), Some("world"));
    assert!(buffer.line(2).is_none());
}

#[test]
fn test_pos_to_char() {
    let buffer = TextBuffer::from_text("hello\nworld");

    assert_eq!(buffer.pos_to_char((0, 0)), 0);
    assert_eq!(buffer.pos_to_char((1, 0)), 6);
    assert_eq!(buffer.pos_to_char((1, 99)), 11);
    assert_eq!(buffer.char_to_pos(8), (1, 2));
}

#[test]
fn test_insert_and_delete_bump_version() {
    let mut buffer = TextBuffer::from_text("ac");

    assert!(buffer.insert(1, "b"));
    assert_eq!(buffer.text(), "abc");
    assert_eq!(buffer.version(), 1);

    assert!(buffer.delete(0..1));
    assert_eq!(buffer.text(), "bc");
    assert_eq!(buffer.version(), 2);
}

#[test]
fn test_noop_edits_keep_version() {
    let mut buffer = TextBuffer::from_text("abc");

    assert!(!buffer.insert(1, ""));
    assert!(!buffer.delete(2..2));
    assert!(!buffer.delete(10..12));
    assert_eq!(buffer.version(), 0);
}

#[test]
fn test_set_text_replaces_everything() {
    let mut buffer = TextBuffer::from_text("old");
    buffer.set_text("new\ncontent");

    assert_eq!(buffer.text(), "new\ncontent");
    assert_eq!(buffer.version(), 1);
}

#[test]
fn test_write_to_streams_full_text() {
    let buffer = TextBuffer::from_text("line1\nline2\n");
    let mut out = Vec::new();
    buffer.write_to(&mut out).unwrap();
    assert_eq!(out, b"line1\nline2\n");
}

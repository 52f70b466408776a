//! Single-line text input state.
//!
//! Holds the buffer and cursor for the prompt/message fields. Rendering
//! lives in `ui`; this type only tracks editing state. The cursor is a char
//! index so multi-byte input behaves correctly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

/// Editable single-line input buffer with a cursor.
#[derive(Debug, Default, Clone)]
pub struct InputBox {
    value: String,
    /// Cursor position in chars (0..=char count).
    cursor: usize,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current buffer contents.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Cursor position in chars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display width of the text left of the cursor, for cursor placement.
    pub fn cursor_width(&self) -> u16 {
        self.value[..self.byte_index(self.cursor)].width() as u16
    }

    /// Take the contents, leaving the box empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Replace the contents, moving the cursor to the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_index(self.cursor - 1);
        self.value.remove(at);
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.value.chars().count() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Apply an editing key. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear();
                true
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(c);
                true
            }
            KeyCode::Backspace => {
                self.backspace();
                true
            }
            KeyCode::Delete => {
                self.delete();
                true
            }
            KeyCode::Left => {
                self.move_left();
                true
            }
            KeyCode::Right => {
                self.move_right();
                true
            }
            KeyCode::Home => {
                self.move_home();
                true
            }
            KeyCode::End => {
                self.move_end();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_insert_and_take() {
        let mut input = InputBox::new();
        for c in "hello".chars() {
            input.insert_char(c);
        }
        assert_eq!(input.value(), "hello");
        assert_eq!(input.take(), "hello");
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_insert_mid_buffer() {
        let mut input = InputBox::new();
        input.set_value("hllo");
        input.move_home();
        input.move_right();
        input.insert_char('e');
        assert_eq!(input.value(), "hello");
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut input = InputBox::new();
        input.set_value("abc");
        input.backspace();
        assert_eq!(input.value(), "ab");

        input.move_home();
        input.delete();
        assert_eq!(input.value(), "b");

        // At the boundaries both are no-ops.
        input.move_home();
        input.backspace();
        input.move_end();
        input.delete();
        assert_eq!(input.value(), "b");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = InputBox::new();
        input.set_value("héllo");
        input.move_home();
        input.move_right();
        input.move_right();
        input.backspace();
        assert_eq!(input.value(), "hllo");
    }

    #[test]
    fn test_handle_key_editing() {
        let mut input = InputBox::new();
        assert!(input.handle_key(key(KeyCode::Char('h'))));
        assert!(input.handle_key(key(KeyCode::Char('i'))));
        assert_eq!(input.value(), "hi");

        assert!(input.handle_key(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "h");

        // Unhandled keys are not consumed.
        assert!(!input.handle_key(key(KeyCode::Tab)));
        assert!(!input.handle_key(key(KeyCode::Enter)));
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut input = InputBox::new();
        input.set_value("some text");
        assert!(input.handle_key(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL
        )));
        assert!(input.is_empty());
    }
}

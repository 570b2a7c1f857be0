// Single-line editable text field.
//
// The cursor is a char index so multi-byte input (μ, ³, accented names) never splits a code point.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        let v = value.into();
        Self {
            cursor: v.chars().count(),
            value: v,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.set("");
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.value.remove(at);
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_respects_cursor_position() {
        let mut t = TextInput::new("165");
        t.left();
        t.insert('.');
        assert_eq!(t.value, "16.5");
        t.home();
        t.delete();
        assert_eq!(t.value, ".5");
        t.end();
        t.backspace();
        assert_eq!(t.value, ".");
    }

    #[test]
    fn multibyte_characters_do_not_panic() {
        let mut t = TextInput::new("μU");
        t.left();
        t.backspace();
        assert_eq!(t.value, "U");
        t.insert('³');
        assert_eq!(t.value, "³U");
        assert_eq!(t.cursor(), 1);
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut t = TextInput::new("");
        t.backspace();
        t.delete();
        assert!(t.is_blank());
    }
}

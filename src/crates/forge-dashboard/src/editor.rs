//! Multi-line text buffer for the test-case YAML
//!
//! The cursor is a character index into the text. `Tab` is an edit, not a
//! focus change: it inserts two spaces at the caret.

/// Indentation inserted by [`YamlEditor::insert_tab`]
pub const INDENT: &str = "  ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YamlEditor {
    text: String,
    cursor: usize,
}

impl YamlEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor holding `text`, caret at the end
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.len());
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.text.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor);
        self.text.insert(offset, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let offset = self.byte_offset(self.cursor);
        self.text.insert_str(offset, s);
        self.cursor += s.chars().count();
    }

    /// Two spaces at the caret
    pub fn insert_tab(&mut self) {
        self.insert_str(INDENT);
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.text.remove(offset);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let offset = self.byte_offset(self.cursor);
            self.text.remove(offset);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    /// Zero-based (line, column) of the caret
    pub fn line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    fn line_lengths(&self) -> Vec<usize> {
        self.text.split('\n').map(|line| line.chars().count()).collect()
    }

    fn index_of(&self, line: usize, col: usize) -> usize {
        let lengths = self.line_lengths();
        let before: usize = lengths.iter().take(line).map(|len| len + 1).sum();
        before + col.min(lengths.get(line).copied().unwrap_or(0))
    }

    pub fn move_up(&mut self) {
        let (line, col) = self.line_col();
        if line > 0 {
            self.cursor = self.index_of(line - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let (line, col) = self.line_col();
        if line + 1 < self.line_lengths().len() {
            self.cursor = self.index_of(line + 1, col);
        }
    }

    pub fn move_home(&mut self) {
        let (line, _) = self.line_col();
        self.cursor = self.index_of(line, 0);
    }

    pub fn move_end(&mut self) {
        let (line, _) = self.line_col();
        self.cursor = self.index_of(line, usize::MAX);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Parse error of the current text, if it is not valid YAML
    ///
    /// Only a syntax check; the test-case schema is the backend's business.
    pub fn syntax_warning(&self) -> Option<String> {
        if self.text.trim().is_empty() {
            return None;
        }
        serde_yaml::from_str::<serde_yaml::Value>(&self.text)
            .err()
            .map(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_inserts_two_spaces_at_caret() {
        let mut editor = YamlEditor::with_text("steps:\n- open");
        editor.set_cursor(7);
        editor.insert_tab();

        assert_eq!(editor.text(), "steps:\n  - open");
        assert_eq!(editor.cursor(), 9);
    }

    #[test]
    fn test_tab_in_middle_of_line() {
        let mut editor = YamlEditor::with_text("ab");
        editor.set_cursor(1);
        editor.insert_tab();
        assert_eq!(editor.text(), "a  b");
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut editor = YamlEditor::new();
        for c in "name: x".chars() {
            editor.insert_char(c);
        }
        editor.backspace();
        editor.insert_char('y');
        assert_eq!(editor.text(), "name: y");

        editor.set_cursor(0);
        editor.backspace();
        assert_eq!(editor.text(), "name: y");
        editor.delete();
        assert_eq!(editor.text(), "ame: y");
    }

    #[test]
    fn test_multibyte_characters() {
        let mut editor = YamlEditor::with_text("título");
        editor.set_cursor(2);
        editor.insert_tab();
        assert_eq!(editor.text(), "tí  tulo");
        editor.backspace();
        assert_eq!(editor.text(), "tí tulo");
    }

    #[test]
    fn test_vertical_movement_clamps_column() {
        let mut editor = YamlEditor::with_text("steps:\n  - a\nx");
        assert_eq!(editor.line_col(), (2, 1));

        editor.move_up();
        assert_eq!(editor.line_col(), (1, 1));
        editor.move_end();
        assert_eq!(editor.line_col(), (1, 5));
        editor.move_up();
        assert_eq!(editor.line_col(), (0, 5));
        editor.move_down();
        editor.move_down();
        assert_eq!(editor.line_col(), (2, 1));
        editor.move_home();
        assert_eq!(editor.line_col(), (2, 0));
    }

    #[test]
    fn test_syntax_warning() {
        assert!(YamlEditor::new().syntax_warning().is_none());
        assert!(YamlEditor::with_text("steps:\n  - open page\n").syntax_warning().is_none());
        assert!(YamlEditor::with_text("steps: [unclosed").syntax_warning().is_some());
    }
}

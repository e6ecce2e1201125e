use derivative::Derivative;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

const PLACEHOLDER: &str = "Add a task...";

// State of the single-line "new task" input
// Cursor is counted in chars, not bytes
#[derive(Derivative)]
#[derivative(Default)]
pub struct TaskInputState {
    content: String,
    cursor_position: usize,
}

impl TaskInputState {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    // Byte offset of the char at `position`, or the end of the content
    fn byte_index(&self, position: usize) -> usize {
        self.content
            .char_indices()
            .nth(position)
            .map(|(index, _)| index)
            .unwrap_or(self.content.len())
    }

    // Insert a char at the cursor and move past it
    pub fn input(&mut self, to_insert: char) {
        let index = self.byte_index(self.cursor_position);
        self.content.insert(index, to_insert);
        self.move_cursor_right();
    }

    // Delete the char before the cursor (backspace)
    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let index = self.byte_index(self.cursor_position - 1);
        self.content.remove(index);
        self.move_cursor_left();
    }

    // Delete the char under the cursor
    pub fn delete_forward(&mut self) {
        if self.cursor_position >= self.char_count() {
            return;
        }
        let index = self.byte_index(self.cursor_position);
        self.content.remove(index);
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.char_count());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.char_count();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor_position = 0;
    }
}

// Returns the UI line for the task input
pub fn get_task_input_ui(state: &TaskInputState) -> Line<'_> {
    const GRAY_TEXT: Style = Style::new().fg(Color::Rgb(102, 102, 102));
    const WHITE_TEXT: Style = Style::new().fg(Color::White);
    const BLACK_ON_WHITE: Style = Style::new().fg(Color::Black).bg(Color::White);

    let mut spans = Vec::new();
    if state.content.is_empty() {
        // Empty input shows the placeholder, first char highlighted as the cursor
        spans.push(Span::styled(PLACEHOLDER.chars().take(1).collect::<String>(), BLACK_ON_WHITE));
        spans.push(Span::styled(PLACEHOLDER.chars().skip(1).collect::<String>(), GRAY_TEXT));
        return Line::from(spans);
    }

    let cursor = state.cursor_position;
    spans.push(Span::styled(
        state.content.chars().take(cursor).collect::<String>(),
        WHITE_TEXT,
    ));
    if cursor >= state.char_count() {
        spans.push(Span::styled(" ", BLACK_ON_WHITE));
    } else {
        spans.push(Span::styled(
            state.content.chars().skip(cursor).take(1).collect::<String>(),
            BLACK_ON_WHITE,
        ));
        spans.push(Span::styled(
            state.content.chars().skip(cursor + 1).collect::<String>(),
            WHITE_TEXT,
        ));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> TaskInputState {
        let mut state = TaskInputState::default();
        text.chars().for_each(|c| state.input(c));
        state
    }

    #[test]
    fn typing_appends_and_moves_cursor() {
        let state = typed("milk");
        assert_eq!(state.content(), "milk");
        assert_eq!(state.cursor_position(), 4);
    }

    #[test]
    fn editing_in_the_middle_handles_multibyte_chars() {
        let mut state = typed("牛奶");
        state.move_cursor_left();
        state.input('x');
        assert_eq!(state.content(), "牛x奶");
        state.delete_char();
        assert_eq!(state.content(), "牛奶");
        state.move_cursor_home();
        state.delete_forward();
        assert_eq!(state.content(), "奶");
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut state = typed("ab");
        state.move_cursor_right();
        assert_eq!(state.cursor_position(), 2);
        state.delete_forward();
        assert_eq!(state.content(), "ab");
        state.move_cursor_home();
        state.move_cursor_left();
        state.delete_char();
        assert_eq!(state.cursor_position(), 0);
        assert_eq!(state.content(), "ab");
        state.move_cursor_end();
        assert_eq!(state.cursor_position(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = typed("walk dog");
        state.clear();
        assert_eq!(state.content(), "");
        assert_eq!(state.cursor_position(), 0);
    }

    #[test]
    fn empty_input_renders_placeholder() {
        let state = TaskInputState::default();
        let line = get_task_input_ui(&state);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, PLACEHOLDER);
    }

    #[test]
    fn cursor_at_end_renders_trailing_block() {
        let state = typed("ab");
        let line = get_task_input_ui(&state);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "ab ");
    }
}

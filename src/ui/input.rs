// ABOUTME: Editable text fields for the terminal UI
// ABOUTME: Cursor-aware single and multi-line editing driven by key events

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

/// Apply an editing key to `text`. Returns false when the key is not an edit.
/// `cursor` is a char index.
pub fn edit_text(text: &mut String, cursor: &mut usize, key: KeyEvent, multiline: bool) -> bool {
    let len = text.chars().count();
    *cursor = (*cursor).min(len);

    match key.code {
        KeyCode::Char(c)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            let at = byte_index(text, *cursor);
            text.insert(at, c);
            *cursor += 1;
        }
        KeyCode::Enter if multiline => {
            let at = byte_index(text, *cursor);
            text.insert(at, '\n');
            *cursor += 1;
        }
        KeyCode::Backspace if *cursor > 0 => {
            let at = byte_index(text, *cursor - 1);
            text.remove(at);
            *cursor -= 1;
        }
        KeyCode::Delete if *cursor < len => {
            let at = byte_index(text, *cursor);
            text.remove(at);
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(len),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = len,
        KeyCode::Backspace | KeyCode::Delete => {}
        _ => return false,
    }
    true
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// A text value with its own cursor
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        edit_text(&mut self.value, &mut self.cursor, key, false)
    }

    pub fn handle_key_multiline(&mut self, key: KeyEvent) -> bool {
        edit_text(&mut self.value, &mut self.cursor, key, true)
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// Spans for one line of text with the cursor cell reversed when focused
pub fn cursor_spans(
    text: &str,
    cursor: usize,
    focused: bool,
    style: Style,
) -> Vec<Span<'static>> {
    if !focused {
        return vec![Span::styled(text.to_string(), style)];
    }
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let before: String = chars[..cursor].iter().collect();
    let at: String = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    let after: String = chars.get(cursor + 1..).map(|s| s.iter().collect()).unwrap_or_default();

    vec![
        Span::styled(before, style),
        Span::styled(at, style.add_modifier(Modifier::REVERSED)),
        Span::styled(after, style),
    ]
}

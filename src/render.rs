// ABOUTME: Result grid for MSSQL Manager
// ABOUTME: Column width hints by type category, cell stringification, scrolling, and drawing

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, TableState, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::ResultSet;

/// Semantic grouping of a column type, used only for display width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    TextLike,
    Temporal,
    Numeric,
    Other,
}

/// Column width in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthHint {
    pub width: u16,
    pub min_width: u16,
}

impl ColumnCategory {
    pub fn for_sql_type(sql_type: Option<&str>) -> Self {
        let Some(sql_type) = sql_type else {
            return ColumnCategory::Other;
        };
        let base = sql_type.split('(').next().unwrap_or("").trim();
        match base.to_ascii_lowercase().as_str() {
            "varchar" | "nvarchar" | "char" | "nchar" | "text" | "ntext" => {
                ColumnCategory::TextLike
            }
            "datetime" | "datetime2" | "smalldatetime" | "date" | "time" | "datetimeoffset" => {
                ColumnCategory::Temporal
            }
            "decimal" | "numeric" | "float" | "real" | "int" | "bigint" | "smallint"
            | "tinyint" | "money" | "smallmoney" | "bit" => ColumnCategory::Numeric,
            _ => ColumnCategory::Other,
        }
    }

    pub fn width_hint(self) -> WidthHint {
        match self {
            ColumnCategory::TextLike => WidthHint {
                width: 24,
                min_width: 12,
            },
            ColumnCategory::Temporal => WidthHint {
                width: 21,
                min_width: 19,
            },
            ColumnCategory::Numeric | ColumnCategory::Other => WidthHint {
                width: 12,
                min_width: 8,
            },
        }
    }
}

/// The displayed result: always replaced whole, never merged
#[derive(Debug, Clone, Default)]
pub struct ResultView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub widths: Vec<WidthHint>,
    pub col_offset: usize,
    pub state: TableState,
}

impl ResultView {
    pub fn new(result: ResultSet) -> Self {
        let widths = result
            .columns
            .iter()
            .map(|c| ColumnCategory::for_sql_type(c.sql_type.as_deref()).width_hint())
            .collect();
        let headers = result.columns.into_iter().map(|c| c.name).collect();
        let rows = result
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.unwrap_or_default()).collect())
            .collect();

        Self {
            headers,
            rows,
            widths,
            col_offset: 0,
            state: TableState::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let row_count = self.rows.len();
        let col_count = self.headers.len();
        let current = self.state.selected().unwrap_or(0);

        match key.code {
            KeyCode::Up => self.state.select(Some(current.saturating_sub(1))),
            KeyCode::Down if row_count > 0 => {
                self.state.select(Some((current + 1).min(row_count - 1)))
            }
            KeyCode::PageUp => self.state.select(Some(current.saturating_sub(10))),
            KeyCode::PageDown if row_count > 0 => {
                self.state.select(Some((current + 10).min(row_count - 1)))
            }
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::End if row_count > 0 => self.state.select(Some(row_count - 1)),
            KeyCode::Left => self.col_offset = self.col_offset.saturating_sub(1),
            KeyCode::Right if col_count > 0 => {
                self.col_offset = (self.col_offset + 1).min(col_count - 1)
            }
            _ => {}
        }
    }

    pub fn draw(&mut self, area: Rect, buf: &mut Buffer, block: Block<'_>, style: Style) {
        let visible = self.col_offset.min(self.headers.len());
        let widths: Vec<Constraint> = self.widths[visible..]
            .iter()
            .map(|w| Constraint::Min(w.width.max(w.min_width)))
            .collect();

        let header = Row::new(
            self.headers[visible..]
                .iter()
                .zip(&self.widths[visible..])
                .map(|(h, w)| Cell::from(fit_to_width(h, w.width))),
        )
        .style(style.add_modifier(Modifier::BOLD));

        let rows = self.rows.iter().map(|row| {
            Row::new(
                row.iter()
                    .skip(visible)
                    .zip(&self.widths[visible..])
                    .map(|(cell, w)| Cell::from(fit_to_width(cell, w.width))),
            )
        });

        let table = Table::new(rows, widths)
            .header(header)
            .block(block.borders(Borders::ALL))
            .style(style)
            .row_highlight_style(style.add_modifier(Modifier::REVERSED));

        StatefulWidget::render(table, area, buf, &mut self.state);
    }
}

/// An empty placeholder when nothing has been queried yet
pub fn draw_empty(area: Rect, buf: &mut Buffer, block: Block<'_>, style: Style) {
    block.borders(Borders::ALL).style(style).render(area, buf);
}

/// Truncate to `width` display cells, marking the cut with an ellipsis
fn fit_to_width(s: &str, width: u16) -> String {
    let width = width as usize;
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultColumn;
    use crossterm::event::KeyModifiers;

    fn result() -> ResultSet {
        ResultSet {
            columns: vec![
                ResultColumn {
                    name: "Id".to_string(),
                    sql_type: Some("int".to_string()),
                },
                ResultColumn {
                    name: "Name".to_string(),
                    sql_type: Some("varchar".to_string()),
                },
                ResultColumn {
                    name: "Joined".to_string(),
                    sql_type: Some("datetime".to_string()),
                },
            ],
            rows: vec![
                vec![Some("1".to_string()), Some("Alice".to_string()), None],
                vec![Some("2".to_string()), None, Some("2024-01-31 10:00:00".to_string())],
            ],
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(ColumnCategory::for_sql_type(Some("nvarchar")), ColumnCategory::TextLike);
        assert_eq!(ColumnCategory::for_sql_type(Some("DATE")), ColumnCategory::Temporal);
        assert_eq!(ColumnCategory::for_sql_type(Some("decimal(10,2)")), ColumnCategory::Numeric);
        assert_eq!(ColumnCategory::for_sql_type(Some("xml")), ColumnCategory::Other);
        assert_eq!(ColumnCategory::for_sql_type(None), ColumnCategory::Other);
    }

    #[test]
    fn test_width_ordering() {
        let text = ColumnCategory::TextLike.width_hint().width;
        let temporal = ColumnCategory::Temporal.width_hint().width;
        let numeric = ColumnCategory::Numeric.width_hint().width;
        assert!(text >= temporal && temporal > numeric);
        assert_eq!(
            ColumnCategory::Other.width_hint(),
            ColumnCategory::Numeric.width_hint()
        );
    }

    #[test]
    fn test_null_cells_render_empty() {
        let view = ResultView::new(result());
        assert_eq!(view.headers, vec!["Id", "Name", "Joined"]);
        assert_eq!(view.rows[0], vec!["1", "Alice", ""]);
        assert_eq!(view.rows[1], vec!["2", "", "2024-01-31 10:00:00"]);
        assert_eq!(view.widths[1], ColumnCategory::TextLike.width_hint());
    }

    #[test]
    fn test_scrolling_is_bounded() {
        let mut view = ResultView::new(result());
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

        view.handle_key(key(KeyCode::End));
        view.handle_key(key(KeyCode::Down));
        assert_eq!(view.state.selected(), Some(1));

        for _ in 0..5 {
            view.handle_key(key(KeyCode::Right));
        }
        assert_eq!(view.col_offset, 2);
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("Alice", 10), "Alice");
        assert_eq!(fit_to_width("Alexandria", 5), "Alex…");
    }

    #[test]
    fn test_draw_into_buffer() {
        let mut view = ResultView::new(result());
        let area = Rect::new(0, 0, 80, 6);
        let mut buf = Buffer::empty(area);
        view.draw(area, &mut buf, Block::default(), Style::default());

        let text: String = buf.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Alice"));
        assert!(text.contains("Joined"));
    }
}

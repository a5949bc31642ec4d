// ABOUTME: Screen rendering for the terminal UI
// ABOUTME: Lays out the five tabs, popups, and the status bar with ratatui

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::forms::{FieldInput, FormField, WidgetKind};
use crate::i18n::{fill, language_name, Strings};
use crate::render;

use super::app::{App, NoticeKind, Tab, Target};
use super::input::{cursor_spans, TextInput};
use super::theme::{palette, Palette};

const INPUT_WIDTH: usize = 24;
const LABEL_WIDTH: usize = 16;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let p = palette(app.settings.theme);
    let s = app.strings();
    let area = frame.area();

    frame.render_widget(Block::default().style(p.base), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(Span::styled(s.app_title, p.accent)), chunks[0]);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("F{} {}", i + 1, tab.title(s))))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(p.base)
        .highlight_style(p.accent)
        .block(Block::default().borders(Borders::ALL).style(p.base));
    frame.render_widget(tabs, chunks[1]);

    let body = chunks[2];
    match app.tab {
        Tab::Connection => draw_connection(frame, app, body, &p),
        Tab::Tables => draw_tables(frame, app, body, &p),
        Tab::Insert => draw_insert(frame, app, body, &p),
        Tab::View => draw_view(frame, app, body, &p),
        Tab::Settings => draw_settings(frame, app, body, &p),
    }

    draw_status_bar(frame, app, chunks[3], &p);

    if let Some(table) = app.confirm_drop.as_deref() {
        draw_popup(
            frame,
            s.confirm_delete_title,
            p.error,
            vec![
                Line::from(fill(s.confirm_delete, &[&table])),
                Line::default(),
                Line::from(Span::styled(s.yes_no, p.muted)),
            ],
            &p,
        );
    }

    if let Some(notice) = app.notice.as_ref() {
        let (title, style) = match notice.kind {
            NoticeKind::Success => (s.success, p.success),
            NoticeKind::Error => (s.error, p.error),
            NoticeKind::Info => (s.info, p.accent),
        };
        let mut lines: Vec<Line> = notice
            .message
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(s.dismiss, p.muted)));
        draw_popup(frame, title, style, lines, &p);
    }
}

fn draw_connection(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let s = app.strings();
    let focus = app.focused();

    let status_style = if app.status.is_good() { p.success } else { p.error };
    let mut lines = vec![
        labeled_input(s.server_name, &app.connection.server, focus == Target::Server, p),
        labeled_input(s.database_name, &app.connection.database, focus == Target::Database, p),
        Line::default(),
        Line::from(vec![
            button(s.connect, focus == Target::Connect, p),
            Span::raw("  "),
            button(s.create_database, focus == Target::CreateDatabase, p),
            Span::raw("  "),
            button(s.disconnect, focus == Target::Disconnect, p),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled(pad(s.status, LABEL_WIDTH), p.base),
            Span::styled(app.status.label(s), status_style),
        ]),
        Line::from(Span::styled(fill(s.trusted_as, &[&app.identity]), p.muted)),
    ];
    if let Some(version) = app.server_version.as_deref() {
        lines.push(Line::from(Span::styled(version.to_string(), p.muted)));
    }

    frame.render_widget(
        Paragraph::new(lines).block(panel(s.connection, p)),
        area,
    );
}

fn draw_tables(frame: &mut Frame, app: &mut App, area: Rect, p: &Palette) {
    let s = app.strings();
    let focus = app.focused();

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    let mut lines = vec![
        labeled_input(s.table_name, &app.designer.name, focus == Target::TableName, p),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "{}{}{}{}",
                pad(s.column_name, INPUT_WIDTH + 3),
                pad(s.data_type, 18),
                pad(s.primary_key, 20),
                s.not_null
            ),
            p.accent,
        )),
    ];
    let mut focused_line = 0;

    for (i, row) in app.designer.rows.iter().enumerate() {
        if matches!(focus,
            Target::ColumnName(r) | Target::ColumnType(r) | Target::PrimaryKey(r)
            | Target::NotNull(r) | Target::RemoveColumn(r) if r == i)
        {
            focused_line = lines.len();
        }
        let mut spans = input_spans(&row.name, focus == Target::ColumnName(i), p);
        spans.push(Span::raw(" "));
        spans.push(selector(row.data_type(), 16, focus == Target::ColumnType(i), p));
        spans.push(Span::raw("  "));
        spans.push(checkbox(row.primary_key, focus == Target::PrimaryKey(i), p));
        spans.push(Span::raw(" ".repeat(17)));
        spans.push(checkbox(row.not_null, focus == Target::NotNull(i), p));
        spans.push(Span::raw("      "));
        spans.push(button(s.remove, focus == Target::RemoveColumn(i), p));
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    if matches!(
        focus,
        Target::AddColumn | Target::CreateTable | Target::DeleteTable | Target::RefreshTables
    ) {
        focused_line = lines.len();
    }
    lines.push(Line::from(vec![
        button(s.add_column, focus == Target::AddColumn, p),
        Span::raw("  "),
        button(s.create_table, focus == Target::CreateTable, p),
        Span::raw("  "),
        button(s.delete_table, focus == Target::DeleteTable, p),
        Span::raw("  "),
        button(s.refresh, focus == Target::RefreshTables, p),
    ]));

    let scroll = scroll_for(focused_line, halves[0].height);
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel(s.table_management, p))
            .scroll((scroll, 0)),
        halves[0],
    );

    let items: Vec<ListItem> = app
        .tables
        .iter()
        .map(|t| ListItem::new(t.as_str()))
        .collect();
    let list_block = panel(s.tables, p).border_style(if focus == Target::TableList {
        p.accent
    } else {
        p.base
    });
    let list = List::new(items)
        .block(list_block)
        .style(p.base)
        .highlight_style(p.focus);
    frame.render_stateful_widget(list, halves[1], &mut app.designer.list);
}

fn draw_insert(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let s = app.strings();
    let focus = app.focused();

    let table = app.insert.table.as_deref().unwrap_or("");
    let mut lines = vec![
        Line::from(vec![
            Span::styled(pad(s.select_table, LABEL_WIDTH), p.base),
            selector(table, INPUT_WIDTH, focus == Target::InsertTable, p),
        ]),
        Line::default(),
    ];
    let mut focused_line = 0;

    match (&app.insert.table, &app.insert.form) {
        (None, _) => lines.push(Line::from(Span::styled(s.no_table_selected, p.muted))),
        (Some(_), None) => lines.push(Line::from(Span::styled(s.working, p.muted))),
        (Some(_), Some(form)) => {
            let label_width = form
                .fields
                .iter()
                .map(|f| field_label(f).width())
                .max()
                .unwrap_or(0)
                + 2;
            for (i, field) in form.fields.iter().enumerate() {
                let focused = focus == Target::Field(i);
                if focused {
                    focused_line = lines.len();
                }
                let mut spans = vec![Span::styled(pad(&field_label(field), label_width), p.base)];
                match field.input.text() {
                    None => spans.push(checkbox(
                        field.input == FieldInput::Boolean(true),
                        focused,
                        p,
                    )),
                    Some(text) if text.is_empty() && !focused => {
                        spans.push(Span::styled(
                            format!("[{}]", pad(&placeholder(field, s), INPUT_WIDTH)),
                            p.muted,
                        ));
                    }
                    Some(text) => {
                        let cursor = app.insert.cursors.get(i).copied().unwrap_or(0);
                        let input = TextInput {
                            value: text.to_string(),
                            cursor,
                        };
                        spans.extend(input_spans(&input, focused, p));
                    }
                }
                lines.push(Line::from(spans));
            }
        }
    }

    lines.push(Line::default());
    if matches!(focus, Target::InsertRow | Target::RefreshInsert) {
        focused_line = lines.len();
    }
    lines.push(Line::from(vec![
        button(s.insert, focus == Target::InsertRow, p),
        Span::raw("  "),
        button(s.refresh, focus == Target::RefreshInsert, p),
    ]));

    let scroll = scroll_for(focused_line, area.height);
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel(s.insert_data, p))
            .scroll((scroll, 0)),
        area,
    );
}

fn draw_view(frame: &mut Frame, app: &mut App, area: Rect, p: &Palette) {
    let s = app.strings();
    let focus = app.focused();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    let table = app.view.table.as_deref().unwrap_or("");
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(pad(s.select_table, LABEL_WIDTH), p.base),
            selector(table, INPUT_WIDTH, focus == Target::ViewTableSelect, p),
            Span::raw("  "),
            button(s.view_table, focus == Target::ViewTable, p),
            Span::raw("  "),
            button(s.refresh, focus == Target::RefreshView, p),
        ])),
        chunks[0],
    );

    let query_focused = focus == Target::Query;
    let query_block = panel(s.sql_query, p).border_style(if query_focused { p.accent } else { p.base });
    let query_lines = multiline(&app.view.query, query_focused, p.base);
    let inner_height = chunks[1].height.saturating_sub(2);
    let cursor_line = cursor_line(&app.view.query) as u16;
    let query_scroll = cursor_line.saturating_sub(inner_height.saturating_sub(1));
    frame.render_widget(
        Paragraph::new(query_lines)
            .block(query_block)
            .scroll((query_scroll, 0)),
        chunks[1],
    );

    let mut spans = vec![button(s.execute_query, focus == Target::Execute, p)];
    if let Some(message) = app.view.message.as_deref() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(message.to_string(), p.success));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[2]);

    let grid_block = Block::default()
        .title(s.results)
        .border_style(if focus == Target::Results { p.accent } else { p.base });
    match app.view.result.as_mut() {
        Some(result) => result.draw(chunks[3], frame.buffer_mut(), grid_block, p.base),
        None => render::draw_empty(chunks[3], frame.buffer_mut(), grid_block, p.base),
    }
}

fn draw_settings(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let s = app.strings();
    let focus = app.focused();

    let lines = vec![
        Line::from(vec![
            Span::styled(pad(s.theme, LABEL_WIDTH), p.base),
            selector(s.theme_name(app.settings.theme), 12, focus == Target::Theme, p),
        ]),
        Line::from(vec![
            Span::styled(pad(s.language, LABEL_WIDTH), p.base),
            selector(language_name(app.settings.language), 12, focus == Target::Language, p),
        ]),
        Line::default(),
        Line::from(button(s.save_settings, focus == Target::SaveSettings, p)),
        Line::default(),
        Line::from(Span::styled(s.restart_note, p.muted)),
    ];

    frame.render_widget(Paragraph::new(lines).block(panel(s.settings, p)), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, p: &Palette) {
    let s = app.strings();
    let mut spans = Vec::new();
    if app.in_flight > 0 {
        spans.push(Span::styled(s.working, p.accent));
        spans.push(Span::raw(" | "));
    } else if let Some(notice) = app.last_notice.as_ref() {
        let style = match notice.kind {
            NoticeKind::Error => p.error,
            NoticeKind::Success => p.success,
            NoticeKind::Info => p.accent,
        };
        let first_line = notice.message.lines().next().unwrap_or_default();
        spans.push(Span::styled(first_line.to_string(), style));
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::styled(s.help, p.muted));
    frame.render_widget(Paragraph::new(Line::from(spans)).style(p.base), area);
}

fn draw_popup(frame: &mut Frame, title: &str, title_style: Style, lines: Vec<Line>, p: &Palette) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(title.to_string(), title_style))
        .borders(Borders::ALL)
        .border_style(title_style)
        .style(p.base);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn panel<'a>(title: &'a str, p: &Palette) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(p.base)
}

fn labeled_input(label: &str, input: &TextInput, focused: bool, p: &Palette) -> Line<'static> {
    let mut spans = vec![Span::styled(pad(label, LABEL_WIDTH), p.base)];
    spans.extend(input_spans(input, focused, p));
    Line::from(spans)
}

/// `[text    ]` padded to the input width, with the cursor shown when focused
fn input_spans(input: &TextInput, focused: bool, p: &Palette) -> Vec<Span<'static>> {
    let style = if focused { p.accent } else { p.base };
    let used = input.value.width() + usize::from(focused && input.cursor >= input.value.chars().count());
    let mut spans = vec![Span::styled("[", style)];
    spans.extend(cursor_spans(&input.value, input.cursor, focused, p.base));
    spans.push(Span::raw(" ".repeat(INPUT_WIDTH.saturating_sub(used))));
    spans.push(Span::styled("]", style));
    spans
}

fn multiline(input: &TextInput, focused: bool, style: Style) -> Vec<Line<'static>> {
    let mut remaining = input.cursor;
    input
        .value
        .split('\n')
        .map(|line| {
            let len = line.chars().count();
            let here = remaining <= len && focused;
            let spans = cursor_spans(line, remaining, here, style);
            remaining = remaining.saturating_sub(len + 1);
            if here {
                remaining = usize::MAX;
            }
            Line::from(spans)
        })
        .collect()
}

fn cursor_line(input: &TextInput) -> usize {
    input
        .value
        .chars()
        .take(input.cursor)
        .filter(|c| *c == '\n')
        .count()
}

fn button(label: &str, focused: bool, p: &Palette) -> Span<'static> {
    let style = if focused { p.focus } else { p.accent };
    Span::styled(format!("[ {} ]", label), style)
}

fn checkbox(checked: bool, focused: bool, p: &Palette) -> Span<'static> {
    let style = if focused { p.focus } else { p.base };
    Span::styled(if checked { "[x]" } else { "[ ]" }, style)
}

fn selector(value: &str, width: usize, focused: bool, p: &Palette) -> Span<'static> {
    let style = if focused { p.focus } else { p.base };
    Span::styled(format!("< {} >", pad(value, width)), style)
}

fn field_label(field: &FormField) -> String {
    format!("{} ({}):", field.column.name, field.column.sql_type)
}

fn placeholder(field: &FormField, s: &Strings) -> String {
    match field.kind() {
        WidgetKind::Number => s.enter_number.to_string(),
        WidgetKind::Decimal => s.enter_decimal.to_string(),
        WidgetKind::DateTimeText => s.datetime_format.to_string(),
        WidgetKind::Text | WidgetKind::Boolean => fill(s.enter_type, &[&field.column.sql_type]),
    }
}

fn pad(text: &str, width: usize) -> String {
    let used = text.width();
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}

/// Lines to scroll so `line` stays inside a bordered area of `height`
fn scroll_for(line: usize, height: u16) -> u16 {
    let visible = height.saturating_sub(2) as usize;
    if visible == 0 || line < visible {
        return 0;
    }
    (line + 1 - visible) as u16
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::mpsc;

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        let (req_tx, _req_rx) = mpsc::unbounded_channel();
        let (_ev_tx, ev_rx) = mpsc::unbounded_channel();
        App::new(
            Settings::default(),
            None,
            req_tx,
            ev_rx,
        )
    }

    #[test]
    fn test_connection_tab_renders() {
        let mut app = app();
        let text = screen_text(&mut app);
        assert!(text.contains("F1 Connection"));
        assert!(text.contains("Server Name:"));
        assert!(text.contains("Not Connected"));
    }

    #[test]
    fn test_every_tab_renders() {
        let mut app = app();
        for tab in Tab::ALL {
            app.tab = tab;
            let text = screen_text(&mut app);
            assert!(text.contains(tab.title(app.strings())), "{:?}", tab);
        }
    }

    #[test]
    fn test_notice_popup_renders() {
        let mut app = app();
        app.notice = Some(crate::ui::app::Notice {
            kind: NoticeKind::Error,
            message: "Failed to connect".into(),
        });
        let text = screen_text(&mut app);
        assert!(text.contains("Failed to connect"));
        assert!(text.contains("[Enter] OK"));
    }

    #[test]
    fn test_scroll_for() {
        assert_eq!(scroll_for(3, 10), 0);
        assert_eq!(scroll_for(8, 10), 1);
        assert_eq!(scroll_for(5, 2), 0);
    }

    #[test]
    fn test_multiline_cursor_lands_on_second_line() {
        let input = TextInput {
            value: "SELECT *\nFROM Users".into(),
            cursor: 10,
        };
        let lines = multiline(&input, true, Style::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[1].spans.len(), 3);
        assert_eq!(cursor_line(&input), 1);
    }
}

// ABOUTME: Color palettes for the terminal UI
// ABOUTME: System follows the terminal's own colors; light and dark set them explicitly

use ratatui::style::{Color, Modifier, Style};

use crate::config::Theme;

pub const SUCCESS: Color = Color::Rgb(0x2E, 0x7D, 0x32);
pub const DANGER: Color = Color::Rgb(0xD3, 0x2F, 0x2F);
pub const PRIMARY: Color = Color::Rgb(0x19, 0x76, 0xD2);

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub base: Style,
    pub muted: Style,
    pub focus: Style,
    pub success: Style,
    pub error: Style,
    pub accent: Style,
}

pub fn palette(theme: Theme) -> Palette {
    let base = match theme {
        Theme::System => Style::default(),
        Theme::Light => Style::default().fg(Color::Black).bg(Color::White),
        Theme::Dark => Style::default()
            .fg(Color::Gray)
            .bg(Color::Rgb(0x1E, 0x1E, 0x1E)),
    };

    Palette {
        base,
        muted: base.add_modifier(Modifier::DIM),
        focus: base.add_modifier(Modifier::REVERSED | Modifier::BOLD),
        success: base.fg(SUCCESS),
        error: base.fg(DANGER),
        accent: base.fg(PRIMARY).add_modifier(Modifier::BOLD),
    }
}

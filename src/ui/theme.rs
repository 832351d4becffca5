use ratatui::style::{Color, Modifier, Style};

/// Palette handed to every render function. Never mutated after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub bg: Color,
    pub primary: Color,
    pub secondary: Color,
    pub fg: Color,
    pub fg_muted: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
}

impl Theme {
    pub const MONOCHROME: Theme = Theme {
        bg: Color::Rgb(0x1a, 0x1a, 0x1a),
        primary: Color::Rgb(0xff, 0xff, 0xff),
        secondary: Color::Rgb(0xcc, 0xcc, 0xcc),
        fg: Color::Rgb(0xff, 0xff, 0xff),
        fg_muted: Color::Rgb(0x66, 0x66, 0x66),
        error: Color::Rgb(0xff, 0x6b, 0x6b),
        warning: Color::Rgb(0x88, 0x88, 0x88),
        success: Color::Rgb(0xff, 0xff, 0xff),
    };

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn heading(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.fg_muted)
    }

    pub fn hint(&self) -> Style {
        self.muted().add_modifier(Modifier::ITALIC)
    }

    pub fn ok(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warn(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn fail(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn active(&self) -> Style {
        Style::default().fg(self.secondary)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::MONOCHROME
    }
}

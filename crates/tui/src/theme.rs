use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary_bg: Color,
    pub primary_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Theme {
    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    fn dark() -> Self {
        Self {
            primary_bg: Color::Black,
            primary_fg: Color::White,
            accent: Color::Magenta,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }

    fn light() -> Self {
        Self {
            primary_bg: Color::White,
            primary_fg: Color::Black,
            accent: Color::Blue,
            muted: Color::Gray,
            selection_bg: Color::LightBlue,
            selection_fg: Color::Black,
            success: Color::Green,
            warning: Color::Rgb(0xb4, 0x83, 0x00),
            danger: Color::Red,
        }
    }
}

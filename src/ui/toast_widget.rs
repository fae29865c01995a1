use crate::ui::toast::{Toast, ToastType};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const MIN_WIDTH: u16 = 24;
const MAX_WIDTH: u16 = 56;

/// Stack of toasts drawn over the rest of the screen.
pub struct ToastWidget<'a> {
    toasts: &'a [&'a Toast],
    position: ToastPosition,
}

#[derive(Debug, Clone, Copy, Default)]
pub enum ToastPosition {
    #[default]
    BottomRight,
    TopRight,
}

impl<'a> ToastWidget<'a> {
    pub fn new(toasts: &'a [&'a Toast]) -> Self {
        Self {
            toasts,
            position: ToastPosition::default(),
        }
    }

    pub fn position(mut self, pos: ToastPosition) -> Self {
        self.position = pos;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut offset = 0u16;

        // Newest toast sits closest to the anchor edge.
        for toast in self.toasts.iter().rev() {
            let width = toast_width(&toast.message).min(area.width.saturating_sub(4));
            // Long messages wrap onto a second line.
            let text_width = width.saturating_sub(4).max(1) as usize;
            let lines = if toast.message.chars().count() > text_width {
                2
            } else {
                1
            };
            let height = lines + 2;

            let Some(toast_area) = self.calculate_position(area, width, height, offset) else {
                break;
            };
            offset += height;

            frame.render_widget(Clear, toast_area);

            let border_style = border_style(toast.toast_type);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .style(Style::default().bg(Color::Black));

            let text = Paragraph::new(Line::from(vec![
                Span::styled(icon(toast.toast_type), border_style.add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::raw(toast.message.as_str()),
            ]))
            .block(block)
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left);

            frame.render_widget(text, toast_area);
        }
    }

    /// Area for a toast `offset` rows away from the anchor, or `None` when it
    /// no longer fits.
    fn calculate_position(&self, area: Rect, width: u16, height: u16, offset: u16) -> Option<Rect> {
        // Keep clear of the help bar on the last line.
        let usable = area.height.saturating_sub(2);
        if offset + height > usable || width == 0 {
            return None;
        }

        let x = area.right().saturating_sub(width + 2);
        let y = match self.position {
            ToastPosition::BottomRight => area.bottom().saturating_sub(height + 2 + offset),
            ToastPosition::TopRight => area.top() + 1 + offset,
        };

        Some(Rect::new(x, y, width, height))
    }
}

fn toast_width(message: &str) -> u16 {
    let len = message.chars().count() as u16;
    (len + 4).clamp(MIN_WIDTH, MAX_WIDTH)
}

fn icon(toast_type: ToastType) -> &'static str {
    match toast_type {
        ToastType::Info => "ℹ",
        ToastType::Success => "✓",
        ToastType::Warning => "⚠",
        ToastType::Error => "✗",
    }
}

fn border_style(toast_type: ToastType) -> Style {
    let color = match toast_type {
        ToastType::Info => Color::Cyan,
        ToastType::Success => Color::Green,
        ToastType::Warning => Color::Yellow,
        ToastType::Error => Color::Red,
    };
    Style::default().fg(color)
}

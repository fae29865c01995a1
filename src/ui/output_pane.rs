use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::screen::{CellAttrs, ScreenState, TermColor};

/// Pane showing the last `view` of a session, pinned to the bottom.
pub struct OutputPane<'a> {
    session_id: Option<&'a str>,
    screen: Option<&'a ScreenState>,
    /// Lines scrolled up from the bottom.
    scroll: usize,
}

impl<'a> OutputPane<'a> {
    pub fn new(session_id: Option<&'a str>, screen: Option<&'a ScreenState>, scroll: usize) -> Self {
        Self {
            session_id,
            screen,
            scroll,
        }
    }
}

/// First row to draw so the view ends `scroll` rows above the bottom.
/// Returns the clamped scroll alongside it.
pub fn visible_window(total: usize, height: usize, scroll: usize) -> (usize, usize) {
    let max_scroll = total.saturating_sub(height);
    let scroll = scroll.min(max_scroll);
    (total.saturating_sub(height + scroll), scroll)
}

impl<'a> Widget for OutputPane<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_height = area.height.saturating_sub(2) as usize;
        let total = self.screen.map_or(0, |s| s.rows.len());
        let (first, scroll) = visible_window(total, inner_height, self.scroll);

        let title = match self.session_id {
            Some(id) if scroll > 0 => format!(" {} [SCROLLED: -{}] ", id, scroll),
            Some(id) => format!(" {} ", id),
            None => " Output ".to_string(),
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let inner_area = block.inner(area);
        block.render(area, buf);

        match self.screen {
            Some(screen) if !screen.rows.is_empty() => {
                render_screen_state(screen, first, inner_area, buf);
            }
            Some(_) => placeholder(inner_area, buf, "(no output yet)"),
            None => placeholder(inner_area, buf, "Press Enter to show the selected session"),
        }
    }
}

fn placeholder(area: Rect, buf: &mut Buffer, text: &str) {
    let x = area.x + (area.width.saturating_sub(text.len() as u16)) / 2;
    let y = area.y + area.height / 2;
    if y < area.y + area.height && x < area.x + area.width {
        buf.set_stringn(
            x,
            y,
            text,
            area.width as usize,
            Style::default().fg(Color::DarkGray),
        );
    }
}

fn render_screen_state(screen: &ScreenState, first: usize, area: Rect, buf: &mut Buffer) {
    for (offset, screen_row) in screen.rows.iter().skip(first).enumerate() {
        if offset as u16 >= area.height {
            break;
        }
        let y = area.y + offset as u16;

        for (col_idx, cell) in screen_row.cells.iter().enumerate() {
            if col_idx as u16 >= area.width {
                break;
            }
            if cell.contents.is_empty() {
                continue;
            }
            let x = area.x + col_idx as u16;
            let style = convert_cell_style(&cell.fg, &cell.bg, &cell.attrs);
            buf.set_string(x, y, &cell.contents, style);
        }
    }
}

fn convert_cell_style(fg: &TermColor, bg: &TermColor, attrs: &CellAttrs) -> Style {
    let mut style = Style::default().fg(fg.to_ratatui()).bg(bg.to_ratatui());

    if attrs.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if attrs.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if attrs.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if attrs.inverse {
        style = style.add_modifier(Modifier::REVERSED);
    }

    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_pinned_to_bottom() {
        assert_eq!(visible_window(100, 10, 0), (90, 0));
        assert_eq!(visible_window(100, 10, 5), (85, 5));
    }

    #[test]
    fn scroll_is_clamped_to_top() {
        assert_eq!(visible_window(100, 10, 500), (0, 90));
        assert_eq!(visible_window(3, 10, 2), (0, 0));
    }

    #[test]
    fn renders_last_rows() {
        let screen = ScreenState::parse("one\ntwo\nthree\n", 10, true);
        let area = Rect::new(0, 0, 12, 4);
        let mut buf = Buffer::empty(area);

        OutputPane::new(Some("s1"), Some(&screen), 0).render(area, &mut buf);

        let row = |y: u16| -> String {
            (1..6)
                .map(|x| buf.cell((x, y)).map_or(" ", |c| c.symbol()).to_string())
                .collect()
        };
        assert_eq!(row(1), "two  ");
        assert_eq!(row(2), "three");
    }
}

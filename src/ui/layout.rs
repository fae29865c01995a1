use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Rows the table gets before the output pane takes the rest.
const MAX_TABLE_HEIGHT: u16 = 12;

/// Screen areas: session table, output pane, help bar.
pub struct ScreenLayout {
    pub table: Rect,
    pub output: Rect,
    pub help: Rect,
}

/// Split the screen into the table (sized to its rows), the output pane and a
/// one-line help bar at the bottom.
pub fn create_layout(area: Rect, row_count: usize) -> ScreenLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    // Borders plus header plus rows.
    let wanted = u16::try_from(row_count)
        .unwrap_or(u16::MAX)
        .saturating_add(3)
        .clamp(4, MAX_TABLE_HEIGHT);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(wanted), Constraint::Min(3)])
        .split(vertical[0]);

    ScreenLayout {
        table: main[0],
        output: main[1],
        help: vertical[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_grows_with_rows_up_to_cap() {
        let area = Rect::new(0, 0, 100, 40);

        let few = create_layout(area, 2);
        assert_eq!(few.table.height, 5);
        assert_eq!(few.help.height, 1);
        assert_eq!(few.help.y, 39);

        let many = create_layout(area, 100);
        assert_eq!(many.table.height, MAX_TABLE_HEIGHT);
        assert_eq!(many.output.y, MAX_TABLE_HEIGHT);
        assert_eq!(many.output.height, 40 - 1 - MAX_TABLE_HEIGHT);

        // 65_539 would wrap to 3 with a plain cast.
        let huge = create_layout(area, 65_539);
        assert_eq!(huge.table.height, MAX_TABLE_HEIGHT);
    }
}

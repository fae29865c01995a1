//! Styled screen snapshots built from `view` output.
//!
//! The daemon hands back terminal text, possibly with ANSI escapes. Feeding it
//! through a vt100 parser sized to the text gives rows of styled cells the UI
//! can render, without us interpreting escape sequences by hand.

/// Longest snapshot kept, in rows. Older rows are dropped from the top.
pub const MAX_ROWS: usize = 5000;

/// Parsed view output.
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    /// Rows of the screen, top to bottom.
    pub rows: Vec<ScreenRow>,
}

/// A row of cells on the screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenRow {
    pub cells: Vec<ScreenCell>,
}

/// A single cell on the terminal screen.
#[derive(Debug, Clone)]
pub struct ScreenCell {
    /// The character(s) in this cell.
    pub contents: String,
    pub fg: TermColor,
    pub bg: TermColor,
    pub attrs: CellAttrs,
}

/// Terminal color representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TermColor {
    /// Default terminal color.
    #[default]
    Default,
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit RGB color.
    Rgb(u8, u8, u8),
}

/// Cell text attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellAttrs {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
}

impl TermColor {
    /// Convert from vt100 color.
    pub fn from_vt100(color: vt100::Color) -> Self {
        match color {
            vt100::Color::Default => TermColor::Default,
            vt100::Color::Idx(idx) => TermColor::Indexed(idx),
            vt100::Color::Rgb(r, g, b) => TermColor::Rgb(r, g, b),
        }
    }

    /// Convert to ratatui color for rendering.
    pub fn to_ratatui(self) -> ratatui::style::Color {
        match self {
            TermColor::Default => ratatui::style::Color::Reset,
            TermColor::Indexed(idx) => ratatui::style::Color::Indexed(idx),
            TermColor::Rgb(r, g, b) => ratatui::style::Color::Rgb(r, g, b),
        }
    }
}

impl CellAttrs {
    /// Convert from vt100 cell.
    pub fn from_vt100_cell(cell: &vt100::Cell) -> Self {
        Self {
            bold: cell.bold(),
            italic: cell.italic(),
            underline: cell.underline(),
            inverse: cell.inverse(),
        }
    }
}

impl ScreenRow {
    /// Row text with trailing blanks removed.
    pub fn text(&self) -> String {
        let text: String = self.cells.iter().map(|c| c.contents.as_str()).collect();
        text.trim_end().to_string()
    }
}

impl ScreenState {
    /// Parse view output into `cols`-wide rows.
    ///
    /// When `interpret_color` is false every cell keeps the default style.
    pub fn parse(output: &str, cols: u16, interpret_color: bool) -> Self {
        let cols = cols.max(1);
        let line_count = output.lines().count().clamp(1, MAX_ROWS);

        // Long lines wrap and a final newline scrolls, so leave headroom for
        // both; trailing blank rows are trimmed afterwards.
        let wrapped: usize = output
            .lines()
            .map(|l| width_upper_bound(l) / usize::from(cols))
            .sum();
        let rows = u16::try_from((line_count + wrapped + 1).min(MAX_ROWS)).unwrap_or(u16::MAX);

        let mut parser = vt100::Parser::new(rows, cols, 0);
        // The snapshot uses bare newlines; a terminal needs CR LF to return to
        // column zero.
        parser.process(output.replace("\r\n", "\n").replace('\n', "\r\n").as_bytes());

        let screen = parser.screen();
        let mut screen_rows = Vec::with_capacity(rows as usize);
        for row_idx in 0..rows {
            let mut cells = Vec::with_capacity(cols as usize);
            for col_idx in 0..cols {
                let Some(cell) = screen.cell(row_idx, col_idx) else {
                    continue;
                };
                let (fg, bg, attrs) = if interpret_color {
                    (
                        TermColor::from_vt100(cell.fgcolor()),
                        TermColor::from_vt100(cell.bgcolor()),
                        CellAttrs::from_vt100_cell(cell),
                    )
                } else {
                    Default::default()
                };
                cells.push(ScreenCell {
                    contents: cell.contents(),
                    fg,
                    bg,
                    attrs,
                });
            }
            screen_rows.push(ScreenRow { cells });
        }

        while screen_rows.last().is_some_and(|r| r.text().is_empty()) {
            screen_rows.pop();
        }

        Self { rows: screen_rows }
    }

    /// Plain text of the snapshot, one line per row.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(ScreenRow::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Display columns a line can take at most. Non-ASCII characters may be
/// double width.
fn width_upper_bound(line: &str) -> usize {
    line.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, TableState},
};

use crate::app::SortColumn;
use crate::daemon::SessionEntry;

/// Table of live sessions, one row per directory entry.
pub struct SessionTable<'a> {
    rows: Vec<&'a SessionEntry>,
    sort: SortColumn,
    refreshed_at: Option<DateTime<Local>>,
    /// Session with output on display, marked in the table.
    shown: Option<&'a str>,
}

impl<'a> SessionTable<'a> {
    pub fn new(rows: Vec<&'a SessionEntry>, sort: SortColumn) -> Self {
        Self {
            rows,
            sort,
            refreshed_at: None,
            shown: None,
        }
    }

    pub fn refreshed_at(mut self, at: Option<DateTime<Local>>) -> Self {
        self.refreshed_at = at;
        self
    }

    pub fn shown(mut self, session_id: Option<&'a str>) -> Self {
        self.shown = session_id;
        self
    }

    fn title(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!(" Sessions ({}) ", self.rows.len()),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if self.sort != SortColumn::None {
            spans.push(Span::styled(
                format!("[sort: {}] ", self.sort.label()),
                Style::default().fg(Color::Yellow),
            ));
        }
        if let Some(at) = self.refreshed_at {
            spans.push(Span::styled(
                format!("refreshed {} ", at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }

    fn header(&self) -> Row<'static> {
        let column = |name: &'static str, column: SortColumn| {
            let style = if self.sort == column {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Cell::from(name).style(style)
        };
        Row::new(vec![
            column("ID", SortColumn::Id),
            column("COMMAND", SortColumn::Command),
            column("CWD", SortColumn::Cwd),
        ])
    }
}

impl<'a> StatefulWidget for SessionTable<'a> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .title(self.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let id_width = self
            .rows
            .iter()
            .map(|r| r.id.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(2, 24) as u16
            + 2;

        let header = self.header();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|entry| {
                let marker = if self.shown == Some(entry.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                Row::new(vec![
                    Cell::from(format!("{}{}", marker, entry.id)),
                    Cell::from(entry.command.as_str()),
                    Cell::from(entry.cwd.as_str()).style(Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(id_width),
                Constraint::Percentage(50),
                Constraint::Fill(1),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

        StatefulWidget::render(table, area, buf, state);
    }
}

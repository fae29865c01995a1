//! State of the interactive session table.
//!
//! Wraps a [`SessionList`] with everything the screen needs: selection,
//! display-only sort order, the session output being shown, the send prompt
//! and toasts for operator-facing errors.

use std::cmp::Ordering;

use ratatui::widgets::TableState;

use crate::daemon::SessionEntry;
use crate::error::SessionError;
use crate::list::{RowAction, RowOutcome, SessionList};
use crate::screen::ScreenState;
use crate::ui::{ToastManager, ToastType};

/// Column the table is sorted by. Purely a display concern; row identity
/// and daemon order are untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Daemon order.
    #[default]
    None,
    Id,
    Command,
    Cwd,
}

impl SortColumn {
    /// Next column in the cycle.
    pub fn next(self) -> Self {
        match self {
            SortColumn::None => SortColumn::Id,
            SortColumn::Id => SortColumn::Command,
            SortColumn::Command => SortColumn::Cwd,
            SortColumn::Cwd => SortColumn::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortColumn::None => "daemon order",
            SortColumn::Id => "id",
            SortColumn::Command => "command",
            SortColumn::Cwd => "cwd",
        }
    }

    fn compare(self, a: &SessionEntry, b: &SessionEntry) -> Ordering {
        match self {
            SortColumn::None => Ordering::Equal,
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Command => a.command.cmp(&b.command),
            SortColumn::Cwd => a.cwd.cmp(&b.cwd),
        }
    }
}

/// What keystrokes currently mean.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Table navigation and row actions.
    #[default]
    Normal,
    /// Typing a line to send to `session_id`.
    Send { session_id: String, buffer: String },
}

/// Output of a session currently on display.
#[derive(Debug, Clone)]
pub struct ShownOutput {
    pub session_id: String,
    raw: String,
    screen: ScreenState,
    parsed_cols: u16,
}

/// Application state for the session table.
pub struct App {
    pub list: SessionList,
    pub interpret_color: bool,
    pub table_state: TableState,
    pub sort: SortColumn,
    pub mode: InputMode,
    pub output: Option<ShownOutput>,
    /// Lines scrolled up from the bottom of the output.
    pub output_scroll: usize,
    pub toast_manager: ToastManager,
}

impl App {
    pub fn new(list: SessionList, interpret_color: bool) -> Self {
        let mut app = Self {
            list,
            interpret_color,
            table_state: TableState::default(),
            sort: SortColumn::default(),
            mode: InputMode::default(),
            output: None,
            output_scroll: 0,
            toast_manager: ToastManager::new(),
        };
        app.clamp_selection();
        app
    }

    /// Rows in display order.
    pub fn visible_rows(&self) -> Vec<&SessionEntry> {
        let mut rows: Vec<&SessionEntry> = self.list.rows().iter().collect();
        // Stable sort keeps daemon order among equal keys.
        rows.sort_by(|a, b| self.sort.compare(a, b));
        rows
    }

    /// Id of the highlighted row.
    pub fn selected_id(&self) -> Option<String> {
        let selected = self.table_state.selected()?;
        self.visible_rows().get(selected).map(|r| r.id.clone())
    }

    pub fn select_next(&mut self) {
        let len = self.list.rows().len();
        if len == 0 {
            return;
        }
        let next = self.table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.table_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        let prev = self
            .table_state
            .selected()
            .map_or(0, |i| i.saturating_sub(1));
        if !self.list.rows().is_empty() {
            self.table_state.select(Some(prev));
        }
    }

    /// Highlight the row for `id`, if it is shown.
    fn select_id(&mut self, id: &str) -> bool {
        let position = self.visible_rows().iter().position(|r| r.id == id);
        if let Some(index) = position {
            self.table_state.select(Some(index));
        }
        position.is_some()
    }

    fn clamp_selection(&mut self) {
        let len = self.list.rows().len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
            Some(_) => {}
        }
    }

    /// Re-sort by the next column, keeping the same session highlighted.
    pub fn cycle_sort(&mut self) {
        let selected = self.selected_id();
        self.sort = self.sort.next();
        if let Some(id) = selected {
            self.select_id(&id);
        }
        self.toast_manager
            .push(format!("Sorted by {}", self.sort.label()), ToastType::Info);
    }

    /// Pull a fresh session table, keeping the selection on the same session
    /// when it still exists.
    pub fn refresh(&mut self) {
        let selected = self.selected_id();
        match self.list.refresh() {
            Ok(()) => {
                if !selected.is_some_and(|id| self.select_id(&id)) {
                    self.clamp_selection();
                }
                let shown_gone = self
                    .output
                    .as_ref()
                    .is_some_and(|shown| self.list.row(&shown.session_id).is_none());
                if shown_gone {
                    self.output = None;
                }
            }
            Err(e) => self.report(&e),
        }
    }

    /// Surface an error to the operator.
    pub fn report(&mut self, err: &SessionError) {
        let toast_type = match err {
            SessionError::StaleRow(_) | SessionError::UnknownSession(_) => ToastType::Warning,
            _ => ToastType::Error,
        };
        self.toast_manager.push(err.to_string(), toast_type);
        if err.suggests_refresh() {
            self.clamp_selection();
        }
    }

    fn run(&mut self, id: &str, action: RowAction) -> Option<RowOutcome> {
        let result = self.list.row_action(id, action);
        // Stale rows may have triggered a refresh inside the list.
        self.clamp_selection();
        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Show the selected session's output.
    pub fn show_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.show(&id);
        }
    }

    fn show(&mut self, id: &str) {
        if let Some(RowOutcome::Shown { session_id, output }) = self.run(id, RowAction::Show) {
            self.output = Some(ShownOutput {
                session_id,
                raw: output,
                screen: ScreenState::default(),
                parsed_cols: 0,
            });
            self.output_scroll = 0;
        }
    }

    /// Parsed output for a pane `cols` wide.
    pub fn output_screen(&mut self, cols: u16) -> Option<&ScreenState> {
        let interpret_color = self.interpret_color;
        let shown = self.output.as_mut()?;
        if shown.parsed_cols != cols {
            shown.screen = ScreenState::parse(&shown.raw, cols, interpret_color);
            shown.parsed_cols = cols;
        }
        Some(&shown.screen)
    }

    pub fn scroll_output_up(&mut self, lines: usize) {
        self.output_scroll = self.output_scroll.saturating_add(lines);
    }

    pub fn scroll_output_down(&mut self, lines: usize) {
        self.output_scroll = self.output_scroll.saturating_sub(lines);
    }

    /// Start typing a line for the selected session.
    pub fn begin_send(&mut self) {
        if let Some(session_id) = self.selected_id() {
            self.mode = InputMode::Send {
                session_id,
                buffer: String::new(),
            };
        }
    }

    pub fn cancel_send(&mut self) {
        self.mode = InputMode::Normal;
    }

    /// Send the typed line.
    pub fn submit_send(&mut self) {
        let InputMode::Send { session_id, buffer } = std::mem::take(&mut self.mode) else {
            return;
        };
        self.send_text(&session_id, buffer, false);
    }

    /// Send `keys` to `session_id` and re-show it if it is on display.
    pub fn send_text(&mut self, session_id: &str, keys: String, no_newline: bool) {
        let action = RowAction::Send { keys, no_newline };
        if self.run(session_id, action).is_some() {
            self.toast_manager
                .push(format!("Sent to {}", session_id), ToastType::Success);
            if self
                .output
                .as_ref()
                .is_some_and(|shown| shown.session_id == session_id)
            {
                self.show(session_id);
            }
        }
    }

    /// Close the selected session.
    pub fn close_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Some(RowOutcome::Closed { session_id }) = self.run(&id, RowAction::Close) {
            if self
                .output
                .as_ref()
                .is_some_and(|shown| shown.session_id == session_id)
            {
                self.output = None;
            }
            self.toast_manager
                .push(format!("Closed {}", session_id), ToastType::Success);
        }
    }

    /// Attach to `id`. The caller must hand the terminal over first.
    pub fn attach(&mut self, id: &str) {
        self.run(id, RowAction::Attach);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attach::AttachDispatcher;
    use crate::config::AttachConfig;
    use crate::daemon::fake::FakeDaemon;
    use crate::daemon::SessionClient;
    use crate::directory::SessionDirectory;
    use std::sync::Arc;

    fn make_app(sessions: &[(&str, &str, &str)]) -> (Arc<FakeDaemon>, App) {
        let daemon = Arc::new(FakeDaemon::with_sessions(sessions));
        let directory = Arc::new(SessionDirectory::new(SessionClient::new(daemon.clone())));
        let dispatcher = AttachDispatcher::new(&AttachConfig::default());
        let mut list = SessionList::new(directory, dispatcher).with_no_color(true);
        list.refresh().unwrap();
        (daemon, App::new(list, true))
    }

    #[test]
    fn first_row_is_selected_initially() {
        let (_, app) = make_app(&[("s1", "bash", "/a"), ("s2", "vim", "/b")]);
        assert_eq!(app.selected_id().as_deref(), Some("s1"));

        let (_, empty) = make_app(&[]);
        assert_eq!(empty.selected_id(), None);
    }

    #[test]
    fn selection_moves_within_bounds() {
        let (_, mut app) = make_app(&[("s1", "bash", "/a"), ("s2", "vim", "/b")]);
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_id().as_deref(), Some("s2"));
        app.select_previous();
        app.select_previous();
        assert_eq!(app.selected_id().as_deref(), Some("s1"));
    }

    #[test]
    fn sort_is_display_only_and_keeps_selection() {
        let (_, mut app) = make_app(&[("s2", "zsh", "/b"), ("s1", "bash", "/a")]);
        app.select_next();
        assert_eq!(app.selected_id().as_deref(), Some("s1"));

        app.cycle_sort();
        assert_eq!(app.sort, SortColumn::Id);
        let shown: Vec<_> = app.visible_rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(shown, vec!["s1", "s2"]);
        assert_eq!(app.selected_id().as_deref(), Some("s1"));

        let daemon_order: Vec<_> = app.list.rows().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(daemon_order, vec!["s2", "s1"]);
    }

    #[test]
    fn refresh_keeps_selected_session() {
        let (daemon, mut app) = make_app(&[("s1", "bash", "/a"), ("s2", "vim", "/b"), ("s3", "top", "/")]);
        app.select_next();
        app.select_next();
        daemon.close_externally("s1");

        app.refresh();
        assert_eq!(app.selected_id().as_deref(), Some("s3"));
    }

    #[test]
    fn show_then_close_clears_output() {
        let (daemon, mut app) = make_app(&[("s1", "bash", "/a")]);
        daemon.push_output("s1", "hello\n");

        app.show_selected();
        assert_eq!(app.output_screen(20).unwrap().text(), "hello");

        app.close_selected();
        assert!(app.output.is_none());
        assert!(app.list.rows().is_empty());
        assert_eq!(app.selected_id(), None);
    }

    #[test]
    fn send_prompt_forwards_buffer() {
        let (daemon, mut app) = make_app(&[("s1", "bash", "/a")]);
        app.begin_send();
        if let InputMode::Send { buffer, .. } = &mut app.mode {
            buffer.push_str("make test");
        }
        app.submit_send();

        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(daemon.calls().last().unwrap(), &vec!["send", "s1", "make test"]);
    }

    #[test]
    fn sending_to_shown_session_refreshes_output_but_not_selection() {
        let (daemon, mut app) = make_app(&[("s1", "bash", "/a"), ("s2", "vim", "/b")]);
        daemon.push_output("s1", "$ ");
        app.show_selected();
        app.select_next();

        app.send_text("s1", "ls".to_string(), true);

        assert_eq!(app.selected_id().as_deref(), Some("s2"));
        let shown = app.output.as_ref().unwrap();
        assert_eq!(shown.session_id, "s1");
        assert_eq!(app.output_screen(20).unwrap().text(), "$ ls");
    }

    #[test]
    fn stale_show_becomes_warning_toast() {
        let (daemon, mut app) = make_app(&[("s1", "bash", "/a"), ("s2", "vim", "/b")]);
        daemon.close_externally("s1");

        app.show_selected();

        assert!(app.output.is_none());
        let toasts = app.toast_manager.visible_toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].toast_type, ToastType::Warning);
        assert_eq!(app.selected_id().as_deref(), Some("s2"));
    }

    #[test]
    fn failed_refresh_is_reported_not_fatal() {
        let (daemon, mut app) = make_app(&[("s1", "bash", "/a")]);
        daemon.set_failing(true);
        app.refresh();

        assert_eq!(app.list.rows().len(), 1);
        assert_eq!(
            app.toast_manager.visible_toasts()[0].toast_type,
            ToastType::Error
        );
    }
}

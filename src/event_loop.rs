use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{poll, read, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::app::{App, InputMode};
use crate::compose::compose_in_editor;
use crate::handlers::{handle_key_event, KeyAction};
use crate::ui::layout::create_layout;
use crate::ui::toast_widget::{ToastPosition, ToastWidget};
use crate::ui::{OutputPane, SessionTable, ToastType};

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Put the terminal into the state the table draws in.
pub fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode - are you in a terminal?")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

/// Give the terminal back to the shell. Best effort; used on every exit path.
pub fn restore_terminal(terminal: &mut Tui) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

/// Run `f` with the terminal handed over to a child program, then take it
/// back and redraw from scratch.
fn suspended<T>(terminal: &mut Tui, f: impl FnOnce() -> T) -> Result<T> {
    restore_terminal(terminal);
    let result = f();
    enable_raw_mode().context("Failed to re-enable raw mode")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)
        .context("Failed to re-enter alternate screen")?;
    terminal.clear().context("Failed to clear terminal")?;
    Ok(result)
}

pub fn run_app(terminal: &mut Tui, app: &mut App, editor: &str) -> Result<()> {
    loop {
        // Update toast manager (remove expired)
        app.toast_manager.update();

        terminal.draw(|f| draw_ui(f, app))?;

        if poll(Duration::from_millis(50))? {
            if let Event::Key(key) = read()? {
                match handle_key_event(app, key) {
                    KeyAction::Continue => {}
                    KeyAction::Quit => return Ok(()),
                    KeyAction::Attach(id) => {
                        tracing::info!(session_id = %id, "attaching");
                        suspended(terminal, || app.attach(&id))?;
                        app.refresh();
                    }
                    KeyAction::Compose(id) => {
                        match suspended(terminal, || compose_in_editor(editor, ""))? {
                            Ok(Some(text)) => app.send_text(&id, text, false),
                            Ok(None) => app
                                .toast_manager
                                .push("Nothing sent", ToastType::Info),
                            Err(e) => app
                                .toast_manager
                                .push(format!("{:#}", e), ToastType::Error),
                        }
                    }
                }
            }
        }
    }
}

fn draw_ui(f: &mut Frame, app: &mut App) {
    let layout = create_layout(f.area(), app.list.rows().len());

    let shown_id = app.output.as_ref().map(|o| o.session_id.clone());
    let table = SessionTable::new(app.visible_rows(), app.sort)
        .refreshed_at(app.list.directory().refreshed_at())
        .shown(shown_id.as_deref());
    // Rows borrow the app, so the selection state is rendered from a copy.
    let mut table_state = app.table_state.clone();
    f.render_stateful_widget(table, layout.table, &mut table_state);
    *app.table_state.offset_mut() = table_state.offset();

    // Output pane: inner width is the area minus borders.
    let cols = layout.output.width.saturating_sub(2);
    let scroll = app.output_scroll;
    let screen = app.output_screen(cols);
    f.render_widget(
        OutputPane::new(shown_id.as_deref(), screen, scroll),
        layout.output,
    );

    draw_help_bar(f, layout.help, app);

    let toasts: Vec<_> = app.toast_manager.visible_toasts();
    if !toasts.is_empty() {
        ToastWidget::new(&toasts)
            .position(ToastPosition::BottomRight)
            .render(f, f.area());
    }
}

fn draw_help_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));

    let spans = match &app.mode {
        InputMode::Send { session_id, buffer } => vec![
            Span::styled(
                format!(" SEND {} ", session_id),
                Style::default().fg(Color::Black).bg(Color::Green),
            ),
            Span::raw(format!(" {}", buffer)),
            Span::styled("█", Style::default().fg(Color::White)),
            Span::raw("  "),
            key(" Enter "),
            Span::raw("send "),
            key(" Esc "),
            Span::raw("cancel"),
        ],
        InputMode::Normal => vec![
            Span::styled(
                format!(" {} ", app.list.dispatcher().selected()),
                Style::default().fg(Color::Black).bg(Color::Blue),
            ),
            key(" j/k "),
            Span::raw("nav "),
            key(" Enter "),
            Span::raw("show "),
            key(" s "),
            Span::raw("send "),
            key(" S "),
            Span::raw("edit+send "),
            key(" d "),
            Span::raw("close "),
            key(" a "),
            Span::raw("attach "),
            key(" r "),
            Span::raw("refresh "),
            key(" o "),
            Span::raw("sort "),
            key(" q "),
            Span::raw("quit"),
        ],
    };

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}

use std::fs;
use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use sessionctl::app::App;
use sessionctl::attach::AttachDispatcher;
use sessionctl::cli::{self, Cli, Command, Io};
use sessionctl::config::Config;
use sessionctl::daemon::SessionClient;
use sessionctl::directory::SessionDirectory;
use sessionctl::event_loop::{restore_terminal, run_app, setup_terminal};
use sessionctl::list::SessionList;

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = std::env::var("SESSIONCTL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

/// Log to stderr for one-shot commands.
fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to a file while the table owns the screen.
fn init_file_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .context("Could not find cache directory")?
        .join("sessionctl");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("sessionctl.log"))
        .context("Failed to open log file")?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::List {
        plain: false,
        json: false,
    });

    let interactive = command.is_interactive_list() && io::stdout().is_terminal();
    if interactive {
        init_file_logging()?;
    } else {
        init_stderr_logging();
    }

    let config = cli::load_config(&cli)?;
    let client = SessionClient::from_config(&config);

    if interactive {
        return run_table(&config, client);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    let mut err = io::stderr();
    let mut io = Io {
        input: &mut input,
        out: &mut out,
        err: &mut err,
    };
    cli::run_command(command, &config, client, &mut io)
}

fn run_table(config: &Config, client: SessionClient) -> Result<()> {
    let directory = Arc::new(SessionDirectory::new(client));
    let dispatcher = AttachDispatcher::with_builtin_backends(&config.attach);
    let mut list = SessionList::new(directory, dispatcher).with_no_color(!config.interpret_color);
    // A daemon that isn't reachable yet shouldn't keep the table from opening.
    let initial = list.refresh();

    let mut app = App::new(list, config.interpret_color);
    if let Err(e) = initial {
        app.report(&e);
    }

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, &config.editor_command());

    // Restore terminal (always try to restore even on error)
    restore_terminal(&mut terminal);

    result
}

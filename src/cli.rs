//! Command-line surface: argument parsing, configuration layering and the
//! one-shot commands.
//!
//! The interactive table is started by the binary; everything else runs
//! through [`run_command`] against plain reader/writer handles so it can be
//! driven from tests.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::attach::AttachDispatcher;
use crate::compose::compose_in_editor;
use crate::config::Config;
use crate::daemon::{SessionClient, SessionId};
use crate::directory::SessionDirectory;
use crate::resolver;

#[derive(Parser, Debug)]
#[command(name = "sessionctl")]
#[command(about = "Browse and control sessions of a terminal session daemon")]
#[command(version)]
pub struct Cli {
    /// Daemon executable (overrides config and SESSIONCTL_EXECUTABLE)
    #[arg(long, global = true)]
    pub executable: Option<String>,

    /// Attach backend (overrides config and SESSIONCTL_BACKEND)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new session running COMMAND
    Create {
        command: String,
        /// Working directory for the session
        #[arg(long)]
        cwd: Option<String>,
    },
    /// Print a session's current output
    View {
        id: Option<String>,
        /// Ask the daemon to strip ANSI escapes
        #[arg(long)]
        no_color: bool,
    },
    /// Type TEXT into a session
    Send {
        /// [ID] TEXT
        #[arg(value_name = "ARGS", num_args = 1..=2, required = true)]
        args: Vec<String>,
        /// Don't press Enter after the text
        #[arg(long)]
        no_newline: bool,
    },
    /// Compose input in $EDITOR and send it as one payload
    SendBuffer {
        id: Option<String>,
        #[arg(long)]
        no_newline: bool,
    },
    /// Close a session
    Close { id: Option<String> },
    /// Print a session's status
    Status { id: Option<String> },
    /// List sessions (interactive table on a terminal)
    List {
        /// Tab-separated output, never interactive
        #[arg(long)]
        plain: bool,
        /// JSON output, never interactive
        #[arg(long, conflicts_with = "plain")]
        json: bool,
    },
    /// Join a session's live terminal
    Attach { id: Option<String> },
    /// Completion candidates for shell integration
    #[command(hide = true)]
    Complete { prefix: Option<String> },
}

impl Command {
    /// Whether this command opens the interactive table when stdout is a
    /// terminal.
    pub fn is_interactive_list(&self) -> bool {
        matches!(
            self,
            Command::List {
                plain: false,
                json: false
            }
        )
    }
}

/// Layer config file, environment and flags, in that order.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env();
    if let Some(executable) = &cli.executable {
        config.executable = executable.clone();
    }
    if let Some(backend) = &cli.backend {
        config.attach.backend = backend.clone();
    }
    config.validate();
    Ok(config)
}

/// Streams a one-shot command reads from and writes to.
pub struct Io<'a> {
    pub input: &'a mut dyn BufRead,
    pub out: &'a mut dyn Write,
    /// Prompts and notices, kept off `out` so it stays pipeable.
    pub err: &'a mut dyn Write,
}

/// Turn an optional id argument into a live session id, prompting for one
/// when it is missing.
pub fn session_arg(directory: &SessionDirectory, id: Option<&str>, io: &mut Io) -> Result<SessionId> {
    let snapshot = directory.refresh()?;
    let cands = resolver::candidates(&snapshot);

    let query = match id {
        // An explicit reference must name a session exactly.
        Some(id) => return Ok(resolver::resolve(id, &snapshot)?),
        None => {
            if cands.is_empty() {
                bail!("No sessions");
            }
            for cand in &cands {
                writeln!(io.err, "{}{}", cand.id, cand.annotation)?;
            }
            write!(io.err, "Session: ")?;
            io.err.flush()?;

            let mut line = String::new();
            io.input
                .read_line(&mut line)
                .context("Failed to read session reference")?;
            line
        }
    };

    let query = resolver::complete(&query, &cands)
        .map(|c| c.id.clone())
        .unwrap_or(query);
    Ok(resolver::resolve(&query, &snapshot)?)
}

/// Run a one-shot command. The interactive table is not handled here.
pub fn run_command(command: Command, config: &Config, client: SessionClient, io: &mut Io) -> Result<()> {
    let directory = SessionDirectory::new(client);
    let client = directory.client();

    match command {
        Command::Create { command, cwd } => {
            let id = client.create(&command, cwd.as_deref())?;
            writeln!(io.out, "{}", id)?;
        }
        Command::View { id, no_color } => {
            let id = session_arg(&directory, id.as_deref(), io)?;
            let output = client.view(&id, no_color || !config.interpret_color)?;
            write!(io.out, "{}", output)?;
        }
        Command::Send { args, no_newline } => {
            let (id, text) = match args.as_slice() {
                [text] => (None, text.as_str()),
                [id, text] => (Some(id.as_str()), text.as_str()),
                _ => bail!("Expected [ID] TEXT"),
            };
            let id = session_arg(&directory, id, io)?;
            client.send(&id, text, no_newline)?;
        }
        Command::SendBuffer { id, no_newline } => {
            let id = session_arg(&directory, id.as_deref(), io)?;
            match compose_in_editor(&config.editor_command(), "")? {
                Some(text) => client.send(&id, &text, no_newline)?,
                None => writeln!(io.err, "Nothing sent")?,
            }
        }
        Command::Close { id } => {
            let id = session_arg(&directory, id.as_deref(), io)?;
            client.close(&id)?;
            writeln!(io.err, "Closed {}", id)?;
        }
        Command::Status { id } => {
            let id = session_arg(&directory, id.as_deref(), io)?;
            writeln!(io.out, "{}", client.status(&id)?)?;
        }
        Command::List { json: true, .. } => {
            let entries = directory.refresh()?;
            let json = serde_json::to_string_pretty(entries.as_ref())
                .context("Failed to serialize session list")?;
            writeln!(io.out, "{}", json)?;
        }
        Command::List { .. } => {
            for entry in directory.refresh()?.iter() {
                writeln!(io.out, "{}\t{}\t{}", entry.id, entry.command, entry.cwd)?;
            }
        }
        Command::Attach { id } => {
            let id = session_arg(&directory, id.as_deref(), io)?;
            AttachDispatcher::with_builtin_backends(&config.attach).attach(&id)?;
        }
        Command::Complete { prefix } => {
            let snapshot = directory.refresh()?;
            let cands = resolver::candidates(&snapshot);
            for cand in resolver::filter_candidates(prefix.as_deref().unwrap_or(""), &cands) {
                writeln!(io.out, "{}\t{}", cand.id, cand.annotation.trim())?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::fake::FakeDaemon;
    use crate::error::SessionError;
    use std::io::Cursor;
    use std::sync::Arc;

    struct Run {
        daemon: Arc<FakeDaemon>,
        out: Vec<u8>,
        err: Vec<u8>,
    }

    impl Run {
        fn new(sessions: &[(&str, &str, &str)]) -> Self {
            Self {
                daemon: Arc::new(FakeDaemon::with_sessions(sessions)),
                out: Vec::new(),
                err: Vec::new(),
            }
        }

        fn run(&mut self, command: Command, stdin: &str) -> Result<()> {
            self.run_with(command, stdin, &Config::default())
        }

        fn run_with(&mut self, command: Command, stdin: &str, config: &Config) -> Result<()> {
            let client = SessionClient::new(self.daemon.clone());
            let mut input = Cursor::new(stdin.as_bytes().to_vec());
            let mut io = Io {
                input: &mut input,
                out: &mut self.out,
                err: &mut self.err,
            };
            run_command(command, config, client, &mut io)
        }

        fn stdout(&self) -> String {
            String::from_utf8_lossy(&self.out).into_owned()
        }

        fn stderr(&self) -> String {
            String::from_utf8_lossy(&self.err).into_owned()
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sessionctl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn send_takes_optional_id_before_text() {
        let cli = parse(&["send", "s1", "make test"]);
        assert_eq!(
            cli.command,
            Some(Command::Send {
                args: vec!["s1".to_string(), "make test".to_string()],
                no_newline: false
            })
        );

        let cli = parse(&["send", "--no-newline", "y"]);
        assert!(matches!(cli.command, Some(Command::Send { ref args, no_newline: true }) if args == &["y"]));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = parse(&["list", "--plain", "--executable", "/opt/sessiond", "--backend", "exec"]);
        assert_eq!(cli.executable.as_deref(), Some("/opt/sessiond"));
        assert_eq!(cli.backend.as_deref(), Some("exec"));
        assert!(!cli.command.unwrap().is_interactive_list());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"executable": "from-file", "timeout_secs": 5}"#).unwrap();

        let mut cli = parse(&["list"]);
        cli.config = Some(path);
        cli.executable = Some("from-flag".to_string());

        let config = load_config(&cli).unwrap();
        assert_eq!(config.executable, "from-flag");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn create_prints_new_id() {
        let mut run = Run::new(&[]);
        run.run(
            Command::Create {
                command: "bash".to_string(),
                cwd: Some("/tmp".to_string()),
            },
            "",
        )
        .unwrap();
        assert_eq!(run.stdout(), "s1\n");
    }

    #[test]
    fn plain_list_is_tab_separated_in_daemon_order() {
        let mut run = Run::new(&[("s2", "vim", "/b"), ("s1", "bash", "/a")]);
        run.run(Command::List { plain: true, json: false }, "").unwrap();
        assert_eq!(run.stdout(), "s2\tvim\t/b\ns1\tbash\t/a\n");
    }

    #[test]
    fn json_list_round_trips_entries() {
        let mut run = Run::new(&[("s1", "bash", "/a")]);
        run.run(Command::List { plain: false, json: true }, "").unwrap();
        let parsed: Vec<crate::daemon::SessionEntry> = serde_json::from_str(&run.stdout()).unwrap();
        assert_eq!(parsed, vec![crate::daemon::SessionEntry::new("s1", "bash", "/a")]);
    }

    #[test]
    fn missing_id_prompts_with_annotated_candidates() {
        let mut run = Run::new(&[("s1", "bash", "/a"), ("s2", "vim", "/b")]);
        run.daemon.push_output("s2", "hello\n");

        run.run(Command::View { id: None, no_color: true }, "s2\n").unwrap();

        assert!(run.stderr().contains("s1  bash [/a]"));
        assert!(run.stderr().contains("s2  vim [/b]"));
        assert_eq!(run.stdout(), "hello\n");
    }

    #[test]
    fn prompt_accepts_unique_completion() {
        let mut run = Run::new(&[("web-1", "npm", "/srv"), ("db-1", "psql", "/var")]);
        run.run(Command::Status { id: None }, "db\n").unwrap();
        assert_eq!(run.stdout(), "running\n");
    }

    #[test]
    fn unknown_reference_is_no_such_session() {
        let mut run = Run::new(&[("s1", "bash", "/a")]);
        let err = run.run(Command::Close { id: Some("s9".to_string()) }, "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::NoSuchSession(q)) if q == "s9"
        ));
        assert_eq!(run.daemon.calls().len(), 1, "only the list call");
    }

    #[test]
    fn explicit_reference_must_be_an_exact_id() {
        let mut run = Run::new(&[("s1", "bash", "/a"), ("s2", "vim", "/b")]);
        for reference in ["bash", "s"] {
            let err = run
                .run(Command::Close { id: Some(reference.to_string()) }, "")
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SessionError>(),
                Some(SessionError::NoSuchSession(q)) if q == reference
            ));
        }
        assert!(run.daemon.calls().iter().all(|c| c[0] == "list"), "nothing closed");
    }

    #[test]
    fn prompt_with_no_sessions_fails() {
        let mut run = Run::new(&[]);
        assert!(run.run(Command::Status { id: None }, "s1\n").is_err());
    }

    #[test]
    fn view_honours_interpret_color_setting() {
        let mut run = Run::new(&[("s1", "bash", "/a")]);
        let config = Config {
            interpret_color: false,
            ..Config::default()
        };
        run.run_with(Command::View { id: Some("s1".to_string()), no_color: false }, "", &config)
            .unwrap();
        assert_eq!(run.daemon.calls().last().unwrap(), &vec!["view", "--no-color", "s1"]);
    }

    #[test]
    fn send_then_close() {
        let mut run = Run::new(&[("s1", "bash", "/a")]);
        run.run(
            Command::Send {
                args: vec!["ls -la".to_string()],
                no_newline: true,
            },
            "s1\n",
        )
        .unwrap();
        assert_eq!(
            run.daemon.calls().last().unwrap(),
            &vec!["send", "--no-newline", "s1", "ls -la"]
        );

        run.run(Command::Close { id: Some("s1".to_string()) }, "").unwrap();
        assert!(run.stderr().ends_with("Closed s1\n"));
    }

    #[test]
    fn complete_prints_id_and_annotation() {
        let mut run = Run::new(&[("web", "npm run dev", "/srv"), ("db", "psql", "/var")]);
        run.run(Command::Complete { prefix: Some("we".to_string()) }, "").unwrap();
        assert_eq!(run.stdout(), "web\tnpm run dev [/srv]\n");
    }
}

//! Run-wide context handed to every plugin call.
//!
//! A [`RunContext`] is built once per run and never changes afterwards. It
//! names the command, the roots the run reads from and writes to, and the
//! [`Reporter`] used for progress output.

use crate::classify::ItemKind;
use crate::config::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// What a run produces and where.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Command {
    /// Render into the work-in-progress directory, overwriting in place.
    #[default]
    Generate,
    /// Empty the work-in-progress directory first, then generate.
    CleanAndGenerate,
    /// Render into a new timestamped directory and repoint `current`.
    Publish,
}

impl Command {
    pub const ALL: [Command; 3] = [
        Command::Generate,
        Command::CleanAndGenerate,
        Command::Publish,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Generate => "generate",
            Command::CleanAndGenerate => "clean-and-generate",
            Command::Publish => "publish",
        }
    }

    /// Resolve a possibly abbreviated command name.
    ///
    /// Any prefix matching exactly one command is accepted: `g`, `cl`,
    /// `pub` and the full names all work.
    pub fn from_prefix(input: &str) -> Result<Command, ConfigError> {
        let matches: Vec<Command> = Self::ALL
            .into_iter()
            .filter(|c| !input.is_empty() && c.name().starts_with(input))
            .collect();
        match matches.as_slice() {
            [one] => Ok(*one),
            [] => Err(ConfigError::UnknownCommand(input.to_string())),
            many => Err(ConfigError::AmbiguousCommand(
                input.to_string(),
                many.iter().map(|c| c.name()).collect::<Vec<_>>().join(", "),
            )),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Progress events emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    RunStarted {
        command: Command,
        project_root: PathBuf,
        output_root: PathBuf,
    },
    /// The output root was emptied (`clean-and-generate`).
    Cleaned { removed: usize },
    ItemWritten { kind: ItemKind, relative: PathBuf },
    /// A plugin's finalize pass completed.
    Finalized { plugin: String },
    /// Free-form message from a plugin.
    Note { plugin: String, message: String },
    Published { version: PathBuf, link: PathBuf },
}

/// Sink for [`PipelineEvent`]s.
///
/// A reporter without a channel discards everything, which is what library
/// callers and tests usually want. Send failures (the receiver hung up) are
/// ignored: reporting never fails a run.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    tx: Option<Sender<PipelineEvent>>,
}

impl Reporter {
    pub fn new(tx: Sender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            tx.send(event).ok();
        }
    }

    /// Shorthand for [`PipelineEvent::Note`].
    pub fn note(&self, plugin: &str, message: impl Into<String>) {
        self.emit(PipelineEvent::Note {
            plugin: plugin.to_string(),
            message: message.into(),
        });
    }
}

/// Immutable per-run context.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub command: Command,
    pub project_root: PathBuf,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub reporter: Reporter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn full_names_resolve() {
        for command in Command::ALL {
            assert_eq!(Command::from_prefix(command.name()).unwrap(), command);
        }
    }

    #[test]
    fn prefixes_resolve() {
        assert_eq!(Command::from_prefix("g").unwrap(), Command::Generate);
        assert_eq!(Command::from_prefix("cl").unwrap(), Command::CleanAndGenerate);
        assert_eq!(Command::from_prefix("pub").unwrap(), Command::Publish);
    }

    #[test]
    fn unknown_command_is_error() {
        assert!(matches!(
            Command::from_prefix("deploy"),
            Err(ConfigError::UnknownCommand(c)) if c == "deploy"
        ));
        assert!(matches!(
            Command::from_prefix("generatex"),
            Err(ConfigError::UnknownCommand(_))
        ));
    }

    #[test]
    fn empty_command_is_error() {
        assert!(Command::from_prefix("").is_err());
    }

    #[test]
    fn default_is_generate() {
        assert_eq!(Command::default(), Command::Generate);
        assert_eq!(Command::CleanAndGenerate.to_string(), "clean-and-generate");
    }

    #[test]
    fn reporter_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let reporter = Reporter::new(tx);
        reporter.note("main-content", "hello");
        drop(reporter);
        let events: Vec<PipelineEvent> = rx.into_iter().collect();
        assert_eq!(
            events,
            vec![PipelineEvent::Note {
                plugin: "main-content".into(),
                message: "hello".into(),
            }]
        );
    }

    #[test]
    fn reporter_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        Reporter::new(tx).note("x", "dropped");
        Reporter::silent().note("x", "discarded");
    }
}

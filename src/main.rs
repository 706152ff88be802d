use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tiny_brute::config::{self, ConfigError};
use tiny_brute::context::{Command, Reporter};
use tiny_brute::output;
use tiny_brute::pipeline::{self, ErrorKind, PipelineError};

fn version_string() -> &'static str {
    let on_tag = env!("TINY_BRUTE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("TINY_BRUTE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "tiny-brute")]
#[command(about = "Tiny static site generator driven by TOML page sources and plugins")]
#[command(long_about = "\
Tiny static site generator driven by TOML page sources and plugins

Every entry under the input directory is mirrored into the output. Files
ending in .page.toml are pages: their `template` key names an HTML file
(relative to the project directory) whose markup is passed through the
plugin chain and written with an .html suffix. Everything else is copied
unchanged.

Project structure:

  my-site/
  ├── tiny-brute.toml          # Optional overrides (directories, suffixes, plugins)
  ├── input/                   # Source tree
  ├── templates/               # Anywhere under the project; named by pages
  ├── work-in-progress/        # Output of generate / clean-and-generate
  └── published/               # Timestamped publish outputs + `current` link

Commands can be shortened to any unique prefix, e.g. `g`, `cl`, `pub`.")]
#[command(version = version_string())]
struct Cli {
    /// The project directory to process (default: current working directory)
    #[arg(short = 'd', long = "project-dir", value_name = "PROJECT_DIRECTORY")]
    project_dir: Option<PathBuf>,

    /// generate (default), clean-and-generate, or publish
    #[arg(value_name = "COMMAND")]
    command: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            e.print().ok();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let message = e.render().to_string();
            let message = message.trim().trim_start_matches("error: ");
            return fatal_usage(message);
        }
    };

    let command = match cli.command.as_deref() {
        Some(name) => match Command::from_prefix(name) {
            Ok(command) => command,
            Err(e) => return fatal_usage(&e.to_string()),
        },
        None => Command::default(),
    };

    let project = match config::load_project(cli.project_dir.as_deref()) {
        Ok(project) => project,
        Err(e) => return fatal_config(e),
    };
    init_thread_pool(&project.config.processing);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = pipeline::run(&project, command, Reporter::new(tx));
    printer.join().ok();

    match result {
        Ok(summary) => {
            output::print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            output::print_error(&e);
            if e.kind() == ErrorKind::Config {
                eprintln!("\n{}", Cli::command().render_help());
            }
            ExitCode::from(1)
        }
    }
}

/// Report a command-line problem with the usage text and fail.
fn fatal_usage(message: &str) -> ExitCode {
    eprintln!("\nFatal error: {message}\n\n{}", Cli::command().render_help());
    ExitCode::from(1)
}

fn fatal_config(err: ConfigError) -> ExitCode {
    let err = PipelineError::from(err);
    output::print_error(&err);
    eprintln!("\n{}", Cli::command().render_help());
    ExitCode::from(1)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

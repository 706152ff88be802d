//! One run of the generator: discover, render, finalize, publish.
//!
//! ```text
//! input/                       output root
//! ├── index.page.toml   ──▶    ├── index.html      template + plugin chain
//! ├── blog/             ──▶    ├── blog/           mirrored
//! │   └── a.page.toml   ──▶    │   └── a.html
//! └── css/site.css      ──▶    └── css/site.css    copied byte-for-byte
//! ```
//!
//! The output root depends on the command: `generate` and
//! `clean-and-generate` write into the work-in-progress directory (the
//! latter empties it first), `publish` writes into a fresh version
//! directory under the published root and moves `current` onto it once
//! everything else has succeeded.
//!
//! Traversal is depth-first with entries sorted by file name, so a
//! directory always comes before its contents and two runs over the same
//! input visit items in the same order. With `processing.max_processes`
//! above 1, directories are still created in traversal order first, then
//! pages and assets are written in parallel.
//!
//! Two inputs that map to the same output path (`about.page.toml` beside
//! `about.html`) fail the run before any item is written.
//!
//! Every failure aborts the run. Whatever was written before the failure
//! stays on disk, and a failed `publish` never touches `current`.

use crate::classify::{ItemKind, OutputItem, Suffixes, classify};
use crate::config::{self, ConfigError, Project};
use crate::context::{Command, PipelineEvent, Reporter, RunContext};
use crate::metadata::{ParseError, parse_page};
use crate::plugin::{ChainError, PluginRegistry};
use crate::plugins;
use crate::publish::{self, PublishError};
use crate::template::{TemplateError, TemplateStore};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid page source {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("page {}: {source}", .page.display())]
    Template {
        page: PathBuf,
        #[source]
        source: TemplateError,
    },
    #[error(
        "{} and {} both produce {}",
        .first.display(),
        .second.display(),
        .output.display()
    )]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error(transparent)]
    Plugin(#[from] ChainError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Coarse failure category, used for the exit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Parse,
    Io,
    Plugin,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Parse { .. } => ErrorKind::Parse,
            PipelineError::Io { .. }
            | PipelineError::Template { .. }
            | PipelineError::OutputCollision { .. } => ErrorKind::Io,
            PipelineError::Publish(_) => ErrorKind::Io,
            PipelineError::Plugin(_) => ErrorKind::Plugin,
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub command: Command,
    pub output_root: PathBuf,
    pub directories: usize,
    pub pages: usize,
    pub assets: usize,
    /// Distinct template files read from disk.
    pub templates: usize,
    /// The `current` link, for `publish` runs.
    pub current_link: Option<PathBuf>,
}

/// An input entry, relative to the input root.
#[derive(Debug, Clone)]
struct Entry {
    relative: PathBuf,
    is_dir: bool,
}

/// Run `command` on `project` with the plugins named in its manifest.
pub fn run(
    project: &Project,
    command: Command,
    reporter: Reporter,
) -> Result<RunSummary, PipelineError> {
    let registry = plugins::build_registry(project.config.plugins.as_slice())?;
    run_with_registry(project, command, &registry, reporter)
}

/// Run `command` on `project` with an explicit plugin registry.
///
/// Accumulators live in the plugins, so a registry should not be reused
/// across runs.
pub fn run_with_registry(
    project: &Project,
    command: Command,
    registry: &PluginRegistry,
    reporter: Reporter,
) -> Result<RunSummary, PipelineError> {
    let input_root = project.input_root();
    if !input_root.is_dir() {
        return Err(ConfigError::MissingDirectory(input_root).into());
    }

    let output_root = match command {
        Command::Publish => publish::create_version_dir(&project.published_root())?,
        Command::Generate | Command::CleanAndGenerate => project.work_in_progress_root(),
    };

    let ctx = RunContext {
        command,
        project_root: project.root.clone(),
        input_root,
        output_root,
        reporter,
    };
    ctx.reporter.emit(PipelineEvent::RunStarted {
        command,
        project_root: ctx.project_root.clone(),
        output_root: ctx.output_root.clone(),
    });

    if command == Command::CleanAndGenerate {
        let removed = clean_dir(&ctx.output_root)?;
        ctx.reporter.emit(PipelineEvent::Cleaned { removed });
    }
    fs::create_dir_all(&ctx.output_root).map_err(io_err(&ctx.output_root))?;

    let suffixes = Suffixes::new(&project.config.page_suffix, &project.config.output_suffix);
    let items: Vec<(Entry, OutputItem)> = discover(&ctx.input_root)?
        .into_iter()
        .map(|entry| {
            let item = classify(&entry.relative, entry.is_dir, &suffixes);
            (entry, item)
        })
        .collect();
    check_collisions(&items)?;

    let templates = TemplateStore::new(&project.root);
    let renderer = Renderer {
        ctx: &ctx,
        registry,
        templates: &templates,
    };

    let threads = config::effective_threads(&project.config.processing);
    if threads > 1 {
        let (dirs, files): (Vec<_>, Vec<_>) = items
            .iter()
            .partition(|(_, item)| item.kind == ItemKind::Directory);
        for (entry, item) in dirs {
            renderer.write_item(entry, item)?;
        }
        files
            .par_iter()
            .try_for_each(|(entry, item)| renderer.write_item(entry, item))?;
    } else {
        for (entry, item) in &items {
            renderer.write_item(entry, item)?;
        }
    }

    registry.finalize_all(&ctx)?;

    let current_link = match command {
        Command::Publish => {
            let link = publish::swap_current(&project.published_root(), &ctx.output_root)?;
            ctx.reporter.emit(PipelineEvent::Published {
                version: ctx.output_root.clone(),
                link: link.clone(),
            });
            Some(link)
        }
        Command::Generate | Command::CleanAndGenerate => None,
    };

    let count = |kind: ItemKind| items.iter().filter(|(_, item)| item.kind == kind).count();
    Ok(RunSummary {
        command,
        output_root: ctx.output_root.clone(),
        directories: count(ItemKind::Directory),
        pages: count(ItemKind::Page),
        assets: count(ItemKind::Asset),
        templates: templates.disk_reads(),
        current_link,
    })
}

/// Remove everything inside `dir`, keeping `dir` itself.
///
/// A missing directory counts as already clean. Returns the number of
/// top-level entries removed.
fn clean_dir(dir: &Path) -> Result<usize, PipelineError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(io_err(dir)(e)),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err(&path))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(io_err(&path))?;
        } else {
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
        removed += 1;
    }
    Ok(removed)
}

/// Every entry under `input_root`, depth-first, siblings sorted by name.
///
/// Symlinks are followed, so a linked directory is mirrored like a real
/// one. A link cycle is an IO error.
fn discover(input_root: &Path) -> Result<Vec<Entry>, PipelineError> {
    let mut entries = Vec::new();
    let walk = WalkDir::new(input_root)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name();
    for result in walk {
        let dent = result.map_err(|e| {
            let path = e.path().unwrap_or(input_root).to_path_buf();
            PipelineError::Io {
                path,
                source: io::Error::from(e),
            }
        })?;
        let relative = dent
            .path()
            .strip_prefix(input_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| dent.path().to_path_buf());
        entries.push(Entry {
            relative,
            is_dir: dent.file_type().is_dir(),
        });
    }
    Ok(entries)
}

/// Fail if two input entries map to the same output path.
///
/// `about.page.toml` next to `about.html` is the usual case.
fn check_collisions(items: &[(Entry, OutputItem)]) -> Result<(), PipelineError> {
    let mut seen: HashMap<&Path, &Path> = HashMap::with_capacity(items.len());
    for (entry, item) in items {
        if let Some(first) = seen.insert(&item.relative, &entry.relative) {
            return Err(PipelineError::OutputCollision {
                output: item.relative.clone(),
                first: first.to_path_buf(),
                second: entry.relative.clone(),
            });
        }
    }
    Ok(())
}

/// Borrowed run state needed to write one item.
struct Renderer<'a> {
    ctx: &'a RunContext,
    registry: &'a PluginRegistry,
    templates: &'a TemplateStore,
}

impl Renderer<'_> {
    fn write_item(&self, entry: &Entry, item: &OutputItem) -> Result<(), PipelineError> {
        let target = self.ctx.output_root.join(&item.relative);
        match item.kind {
            ItemKind::Directory => {
                fs::create_dir_all(&target).map_err(io_err(&target))?;
            }
            ItemKind::Page => self.render_page(entry, item, &target)?,
            ItemKind::Asset => {
                let source = self.ctx.input_root.join(&entry.relative);
                ensure_parent(&target)?;
                fs::copy(&source, &target).map_err(io_err(&source))?;
            }
        }
        self.ctx.reporter.emit(PipelineEvent::ItemWritten {
            kind: item.kind,
            relative: item.relative.clone(),
        });
        Ok(())
    }

    /// Parse, fetch the template, run the chain, then write.
    ///
    /// Nothing is written unless every step succeeds.
    fn render_page(
        &self,
        entry: &Entry,
        item: &OutputItem,
        target: &Path,
    ) -> Result<(), PipelineError> {
        let source = self.ctx.input_root.join(&entry.relative);
        let body = fs::read_to_string(&source).map_err(io_err(&source))?;
        let page = parse_page(&entry.relative, &item.relative, &body).map_err(|e| {
            PipelineError::Parse {
                path: source.clone(),
                source: e,
            }
        })?;
        let template = self
            .templates
            .get(page.template())
            .map_err(|e| PipelineError::Template {
                page: entry.relative.clone(),
                source: e,
            })?;
        let markup = self
            .registry
            .apply_chain(self.ctx, &page, template.to_string())?;
        ensure_parent(target)?;
        fs::write(target, markup).map_err(io_err(target))
    }
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(io_err(parent)),
        None => Ok(()),
    }
}

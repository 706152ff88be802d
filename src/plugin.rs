//! Plugin trait and the ordered plugin registry.
//!
//! # Two passes
//!
//! ```text
//! for each page (traversal order):
//!     markup = template text
//!     for each plugin (registration order):
//!         markup = plugin.transform(ctx, page, markup)      ← apply_chain
//!     write markup
//!
//! for each plugin (registration order):
//!     plugin.finalize(ctx)                                  ← finalize_all
//! ```
//!
//! A transform only sees one page. Anything that needs the whole site (a
//! list of posts on the home page, an index) is collected into the plugin's
//! own accumulator during `transform` and written out in `finalize`, after
//! every page exists on disk. Transforms must not rely on their position in
//! the chain, and finalize passes must not rely on each other.
//!
//! # Failure
//!
//! Both passes are fail-fast. The first failing transform aborts the chain
//! and the page is not written; the first failing finalize aborts the
//! remaining finalize calls.
//!
//! # Shared state
//!
//! Plugins are `Send + Sync` and take `&self`: pages may render in parallel,
//! so accumulators live behind a lock owned by the plugin. Registries are
//! built fresh for every run, so accumulators never leak across runs.

use crate::context::{PipelineEvent, RunContext};
use crate::markup::MarkupError;
use crate::metadata::PageDescriptor;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("key \"{key}\" must be a {expected}, got {found}")]
    InvalidKey {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// A pipeline plugin.
///
/// Both capabilities are optional: the default `transform` passes markup
/// through and the default `finalize` does nothing.
pub trait Plugin: Send + Sync {
    /// Name used in the plugin manifest and in error messages.
    fn name(&self) -> &str;

    /// Rewrite one page's markup.
    ///
    /// `markup` is the template text for the first plugin in the chain and
    /// the previous plugin's output for the rest.
    fn transform(
        &self,
        _ctx: &RunContext,
        _page: &PageDescriptor,
        markup: String,
    ) -> Result<String, PluginError> {
        Ok(markup)
    }

    /// Run once after every item of the run has been written.
    fn finalize(&self, _ctx: &RunContext) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Which pass a plugin failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Transform(PathBuf),
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Transform(page) => write!(f, "transform of {}", page.display()),
            Phase::Finalize => f.write_str("finalize"),
        }
    }
}

#[derive(Error, Debug)]
#[error("plugin '{plugin}' failed during {phase}: {source}")]
pub struct ChainError {
    pub plugin: String,
    pub phase: Phase,
    #[source]
    pub source: PluginError,
}

/// Ordered list of plugins for one run.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin. Registering the same plugin twice runs it twice.
    pub fn register(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.push(Box::new(plugin));
    }

    pub fn register_boxed(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Fold every plugin's transform over `markup`, in registration order.
    pub fn apply_chain(
        &self,
        ctx: &RunContext,
        page: &PageDescriptor,
        markup: String,
    ) -> Result<String, ChainError> {
        self.plugins.iter().try_fold(markup, |markup, plugin| {
            plugin
                .transform(ctx, page, markup)
                .map_err(|source| ChainError {
                    plugin: plugin.name().to_string(),
                    phase: Phase::Transform(page.source.clone()),
                    source,
                })
        })
    }

    /// Run every plugin's finalize pass, in registration order.
    pub fn finalize_all(&self, ctx: &RunContext) -> Result<(), ChainError> {
        for plugin in &self.plugins {
            plugin.finalize(ctx).map_err(|source| ChainError {
                plugin: plugin.name().to_string(),
                phase: Phase::Finalize,
                source,
            })?;
            ctx.reporter.emit(PipelineEvent::Finalized {
                plugin: plugin.name().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Command, Reporter};
    use crate::metadata::Metadata;
    use std::sync::Mutex;
    use std::sync::mpsc;

    fn ctx() -> RunContext {
        RunContext {
            command: Command::Generate,
            project_root: PathBuf::from("/project"),
            input_root: PathBuf::from("/project/input"),
            output_root: PathBuf::from("/project/work-in-progress"),
            reporter: Reporter::silent(),
        }
    }

    fn page() -> PageDescriptor {
        PageDescriptor {
            source: PathBuf::from("index.page.toml"),
            output: PathBuf::from("index.html"),
            metadata: Metadata::new(),
        }
    }

    struct Suffix(&'static str);

    impl Plugin for Suffix {
        fn name(&self) -> &str {
            self.0
        }

        fn transform(
            &self,
            _ctx: &RunContext,
            _page: &PageDescriptor,
            markup: String,
        ) -> Result<String, PluginError> {
            Ok(format!("{markup}{}", self.0))
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn transform(
            &self,
            _ctx: &RunContext,
            _page: &PageDescriptor,
            _markup: String,
        ) -> Result<String, PluginError> {
            Err(PluginError::Other("boom".into()))
        }

        fn finalize(&self, _ctx: &RunContext) -> Result<(), PluginError> {
            Err(PluginError::Other("late boom".into()))
        }
    }

    /// Records finalize calls into a shared log.
    struct Recorder {
        name: &'static str,
        log: &'static Mutex<Vec<&'static str>>,
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn finalize(&self, _ctx: &RunContext) -> Result<(), PluginError> {
            self.log.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    fn leaked_log() -> &'static Mutex<Vec<&'static str>> {
        Box::leak(Box::new(Mutex::new(Vec::new())))
    }

    #[test]
    fn chain_runs_in_registration_order() {
        let mut registry = PluginRegistry::new();
        registry.register(Suffix("a"));
        registry.register(Suffix("b"));
        registry.register(Suffix("c"));
        let out = registry.apply_chain(&ctx(), &page(), "<>".into()).unwrap();
        assert_eq!(out, "<>abc");
    }

    #[test]
    fn empty_chain_returns_template() {
        let registry = PluginRegistry::new();
        assert!(registry.is_empty());
        let out = registry.apply_chain(&ctx(), &page(), "tpl".into()).unwrap();
        assert_eq!(out, "tpl");
    }

    #[test]
    fn duplicate_registration_runs_twice() {
        let mut registry = PluginRegistry::new();
        registry.register(Suffix("x"));
        registry.register(Suffix("x"));
        assert_eq!(registry.names(), vec!["x", "x"]);
        let out = registry.apply_chain(&ctx(), &page(), String::new()).unwrap();
        assert_eq!(out, "xx");
    }

    #[test]
    fn failing_transform_names_plugin_and_page() {
        let mut registry = PluginRegistry::new();
        registry.register(Suffix("a"));
        registry.register(Failing);
        registry.register(Suffix("never"));
        let err = registry
            .apply_chain(&ctx(), &page(), String::new())
            .unwrap_err();
        assert_eq!(err.plugin, "failing");
        assert_eq!(err.phase, Phase::Transform(PathBuf::from("index.page.toml")));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn finalize_runs_in_order_and_reports() {
        let log = leaked_log();
        let mut registry = PluginRegistry::new();
        registry.register(Recorder { name: "first", log });
        registry.register(Recorder { name: "second", log });

        let (tx, rx) = mpsc::channel();
        let mut context = ctx();
        context.reporter = Reporter::new(tx);
        registry.finalize_all(&context).unwrap();
        drop(context);

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
        let finalized: Vec<PipelineEvent> = rx.into_iter().collect();
        assert_eq!(finalized.len(), 2);
    }

    #[test]
    fn finalize_is_fail_fast() {
        let log = leaked_log();
        let mut registry = PluginRegistry::new();
        registry.register(Recorder { name: "before", log });
        registry.register(Failing);
        registry.register(Recorder { name: "after", log });

        let err = registry.finalize_all(&ctx()).unwrap_err();
        assert_eq!(err.plugin, "failing");
        assert_eq!(err.phase, Phase::Finalize);
        assert_eq!(*log.lock().unwrap(), vec!["before"]);
    }

    #[test]
    fn default_capabilities_are_no_ops() {
        struct Bare;
        impl Plugin for Bare {
            fn name(&self) -> &str {
                "bare"
            }
        }
        let mut registry = PluginRegistry::new();
        registry.register(Bare);
        assert_eq!(
            registry.apply_chain(&ctx(), &page(), "m".into()).unwrap(),
            "m"
        );
        assert!(registry.finalize_all(&ctx()).is_ok());
    }
}

//! # Tiny Brute
//!
//! A tiny static site generator. The input directory is mirrored into an
//! output directory; files ending in `.page.toml` are rendered, everything
//! else is copied unchanged.
//!
//! # Architecture: Template + Plugin Chain
//!
//! A page source is a TOML table. Its only required key is `template`, a
//! path relative to the project root. Rendering a page is a fold:
//!
//! ```text
//! template text ─▶ plugin 1 ─▶ plugin 2 ─▶ … ─▶ output file
//!                    ▲            ▲
//!                    └── page metadata (every key of the TOML table)
//! ```
//!
//! The generator itself gives no meaning to any key but `template`. Plugins
//! read whichever keys they care about. After every item has been written,
//! each plugin gets one `finalize` call for work that needs the whole site.
//!
//! # Commands
//!
//! | Command | Output root | Notes |
//! |---------|-------------|-------|
//! | `generate` | `work-in-progress/` | Overwrites in place |
//! | `clean-and-generate` | `work-in-progress/` | Empties it first |
//! | `publish` | `published/<timestamp>/` | Repoints `published/current` on success |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Project layout, `tiny-brute.toml` loading, merging, and validation |
//! | [`context`] | Commands, the per-run context, and progress events |
//! | [`classify`] | Maps input entries to directories, pages, and assets |
//! | [`metadata`] | Page source parsing into ordered metadata |
//! | [`template`] | Per-run template cache |
//! | [`markup`] | HTML mutation helpers for plugins |
//! | [`plugin`] | Plugin trait and the ordered registry |
//! | [`plugins`] | Built-in plugins and the manifest catalogue |
//! | [`pipeline`] | Discovery, rendering, finalize, and publish orchestration |
//! | [`publish`] | Timestamped version directories and the `current` link |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Plugins Are Compiled In
//!
//! Plugins are Rust types registered by name. The `plugins` list in
//! `tiny-brute.toml` picks which ones run and in what order; an unknown name
//! stops the run before anything is written. Library users can build a
//! [`plugin::PluginRegistry`] by hand and call
//! [`pipeline::run_with_registry`].
//!
//! ## Fresh State Per Run
//!
//! The template cache and every plugin accumulator are created for a run
//! and dropped with it. Running twice in one process behaves exactly like
//! two separate invocations.
//!
//! ## Publish Never Breaks `current`
//!
//! A publish run writes into a directory nobody points at yet. `current`
//! only moves after every page is written and every finalize pass has
//! succeeded, so a failed run leaves the live site as it was.

pub mod classify;
pub mod config;
pub mod context;
pub mod markup;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod plugin;
pub mod plugins;
pub mod publish;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;

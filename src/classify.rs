//! Input entry classification.
//!
//! Every entry under the input root maps to exactly one output item at the
//! same relative location:
//!
//! | Input | Kind | Output |
//! |-------|------|--------|
//! | `blog/` | directory | `blog/` |
//! | `blog/first.page.toml` | page | `blog/first.html` |
//! | `css/site.css` | asset | `css/site.css` |
//! | `.htaccess` | asset | `.htaccess` |
//!
//! Only the page suffix is rewritten. Hidden entries are ordinary entries.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// What the pipeline does with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Mirrored as a directory.
    Directory,
    /// Rendered through its template and the plugin chain.
    Page,
    /// Copied byte-for-byte.
    Asset,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Directory => "dir",
            ItemKind::Page => "page",
            ItemKind::Asset => "asset",
        }
    }
}

/// Where one input entry lands, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputItem {
    pub relative: PathBuf,
    pub kind: ItemKind,
}

/// Page/output suffix pair used to recognize page sources.
#[derive(Debug, Clone)]
pub struct Suffixes {
    pub page: String,
    pub output: String,
}

impl Suffixes {
    pub fn new(page: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            output: output.into(),
        }
    }

    /// Whether `relative` names a page source.
    ///
    /// The whole file name must be longer than the suffix: a file called
    /// just `.page.toml` is a hidden asset, not a page with an empty name.
    pub fn is_page(&self, relative: &Path) -> bool {
        relative.file_name().is_some_and(|name| self.page_stem(name).is_some())
    }

    /// Output path for a page source: page suffix swapped for output suffix.
    ///
    /// Works on the raw file name, so names that are not valid UTF-8 keep
    /// their bytes.
    pub fn page_output(&self, relative: &Path) -> PathBuf {
        let Some(name) = relative.file_name() else {
            return relative.to_path_buf();
        };
        let mut output = self.page_stem(name).unwrap_or(name).to_os_string();
        output.push(&self.output);
        relative.with_file_name(output)
    }

    /// `name` without the page suffix, if it has one and something is left.
    fn page_stem<'a>(&self, name: &'a OsStr) -> Option<&'a OsStr> {
        let bytes = name.as_encoded_bytes();
        let suffix = self.page.as_bytes();
        if suffix.is_empty() || bytes.len() <= suffix.len() || !bytes.ends_with(suffix) {
            return None;
        }
        let stem = &bytes[..bytes.len() - suffix.len()];
        // SAFETY: the split point sits right before a non-empty UTF-8 suffix.
        Some(unsafe { OsStr::from_encoded_bytes_unchecked(stem) })
    }
}

/// Classify an entry given its path relative to the input root.
pub fn classify(relative: &Path, is_dir: bool, suffixes: &Suffixes) -> OutputItem {
    if is_dir {
        OutputItem {
            relative: relative.to_path_buf(),
            kind: ItemKind::Directory,
        }
    } else if suffixes.is_page(relative) {
        OutputItem {
            relative: suffixes.page_output(relative),
            kind: ItemKind::Page,
        }
    } else {
        OutputItem {
            relative: relative.to_path_buf(),
            kind: ItemKind::Asset,
        }
    }
}

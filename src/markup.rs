//! Markup mutation helpers for plugins.
//!
//! Plugins never parse HTML themselves. They ask for a targeted edit ("put
//! this fragment inside the element with id X") and get new markup back.
//! Edits stream through [`lol_html`], so the rest of the document is passed
//! through untouched: attribute quoting, whitespace and comments survive.

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use std::cell::Cell;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("invalid element id '{0}'")]
    InvalidId(String),
    #[error("no element with id '{0}'")]
    MissingElement(String),
    #[error("HTML rewrite failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
}

/// Ids usable in a selector without escaping.
fn check_id(id: &str) -> Result<(), MarkupError> {
    let valid = id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MarkupError::InvalidId(id.to_string()))
    }
}

/// Append an HTML fragment as the last child of the first element whose
/// id is `id`.
///
/// ```text
/// append_html_to_id("<div id='main'></div>", "main", "<p>Hi</p>")
///     → "<div id='main'><p>Hi</p></div>"
/// ```
pub fn append_html_to_id(markup: &str, id: &str, fragment: &str) -> Result<String, MarkupError> {
    check_id(id)?;
    let selector = format!("#{id}");
    let found = Cell::new(false);

    let output = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!(selector.as_str(), |el| {
                if !found.get() {
                    el.append(fragment, ContentType::Html);
                    found.set(true);
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )?;

    if found.get() {
        Ok(output)
    } else {
        Err(MarkupError::MissingElement(id.to_string()))
    }
}

//! Built-in plugins and the plugin manifest.
//!
//! The `plugins` list in `tiny-brute.toml` is an ordered manifest of names.
//! Each name is looked up in [`CATALOGUE`] and a fresh instance is
//! registered, so the order of the list is the order of the chain.
//!
//! | Name | Transform | Finalize |
//! |------|-----------|----------|
//! | `main-content` | injects the page's `main-content` HTML into `#main-content` | nothing |
//! | `home-page-links` | records home pages and blog posts | appends a post list to `#blog-links` on every home page |

mod home_page_links;
mod main_content;

pub use home_page_links::HomePageLinks;
pub use main_content::MainContent;

use crate::config::ConfigError;
use crate::metadata::{MetaValue, PageDescriptor};
use crate::plugin::{Plugin, PluginError, PluginRegistry};

pub type Constructor = fn() -> Box<dyn Plugin>;

/// Every plugin name a manifest may use, with its constructor.
pub const CATALOGUE: &[(&str, Constructor)] = &[
    (MainContent::NAME, main_content),
    (HomePageLinks::NAME, home_page_links),
];

fn main_content() -> Box<dyn Plugin> {
    Box::new(MainContent)
}

fn home_page_links() -> Box<dyn Plugin> {
    Box::new(HomePageLinks::default())
}

/// Build a registry from an ordered list of plugin names.
///
/// Unknown names fail before anything is registered.
pub fn build_registry<S: AsRef<str>>(names: &[S]) -> Result<PluginRegistry, ConfigError> {
    let constructors = names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            CATALOGUE
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, make)| *make)
                .ok_or_else(|| ConfigError::UnknownPlugin(name.to_string()))
        })
        .collect::<Result<Vec<Constructor>, _>>()?;

    let mut registry = PluginRegistry::new();
    for make in constructors {
        registry.register_boxed(make());
    }
    Ok(registry)
}

/// Read an optional string key, rejecting other value kinds.
pub(crate) fn optional_str<'a>(
    page: &'a PageDescriptor,
    key: &str,
) -> Result<Option<&'a str>, PluginError> {
    match page.metadata.get(key) {
        None => Ok(None),
        Some(MetaValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(PluginError::InvalidKey {
            key: key.to_string(),
            expected: "string",
            found: other.type_name(),
        }),
    }
}

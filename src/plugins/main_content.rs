use super::optional_str;
use crate::context::RunContext;
use crate::markup;
use crate::metadata::PageDescriptor;
use crate::plugin::{Plugin, PluginError};

/// Injects each page's `main-content` HTML into its `#main-content` element.
///
/// Pages without a `main-content` key pass through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct MainContent;

impl MainContent {
    pub const NAME: &'static str = "main-content";
    const KEY: &'static str = "main-content";
    const TARGET_ID: &'static str = "main-content";
}

impl Plugin for MainContent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn transform(
        &self,
        _ctx: &RunContext,
        page: &PageDescriptor,
        markup: String,
    ) -> Result<String, PluginError> {
        match optional_str(page, Self::KEY)? {
            Some(content) => Ok(markup::append_html_to_id(
                &markup,
                Self::TARGET_ID,
                content,
            )?),
            None => Ok(markup),
        }
    }
}

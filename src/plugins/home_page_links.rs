use super::optional_str;
use crate::context::RunContext;
use crate::markup;
use crate::metadata::PageDescriptor;
use crate::plugin::{Plugin, PluginError};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Adds a list of blog posts to every home page.
///
/// During the chain it only records pages: `type = "home-page"` pages by
/// output path, `type = "blog-post"` pages by output path and `title`.
/// Once every page is on disk, `finalize` builds
///
/// ```html
/// <li><a href="/blog/first.html">First post</a></li>
/// ```
///
/// for each post, ordered by path, and appends the list to the element
/// with id `blog-links` in each recorded home page.
#[derive(Debug, Default)]
pub struct HomePageLinks {
    collected: Mutex<Collected>,
}

#[derive(Debug, Default)]
struct Collected {
    home_pages: Vec<PathBuf>,
    blog_posts: Vec<BlogPost>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct BlogPost {
    path: PathBuf,
    title: String,
}

impl HomePageLinks {
    pub const NAME: &'static str = "home-page-links";
    const TARGET_ID: &'static str = "blog-links";

    fn collected(&self) -> std::sync::MutexGuard<'_, Collected> {
        self.collected.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Site-absolute URL for an output path, always with forward slashes.
fn site_href(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    format!("/{}", parts.join("/"))
}

fn render_links(posts: &[BlogPost]) -> String {
    posts
        .iter()
        .map(|post| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                html_escape::encode_double_quoted_attribute(&site_href(&post.path)),
                html_escape::encode_text(&post.title)
            )
        })
        .collect()
}

impl Plugin for HomePageLinks {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn transform(
        &self,
        _ctx: &RunContext,
        page: &PageDescriptor,
        markup: String,
    ) -> Result<String, PluginError> {
        match optional_str(page, "type")? {
            Some("home-page") => self.collected().home_pages.push(page.output.clone()),
            Some("blog-post") => {
                // Untitled posts fall back to their path so the link is still usable
                let title = match optional_str(page, "title")? {
                    Some(title) => title.to_string(),
                    None => site_href(&page.output),
                };
                self.collected().blog_posts.push(BlogPost {
                    path: page.output.clone(),
                    title,
                });
            }
            _ => {}
        }
        Ok(markup)
    }

    fn finalize(&self, ctx: &RunContext) -> Result<(), PluginError> {
        let (mut home_pages, mut posts) = {
            let collected = self.collected();
            (collected.home_pages.clone(), collected.blog_posts.clone())
        };
        home_pages.sort();
        posts.sort();

        let links = render_links(&posts);
        for relative in &home_pages {
            let path = ctx.output_root.join(relative);
            let html = fs::read_to_string(&path).map_err(|source| PluginError::Io {
                path: path.clone(),
                source,
            })?;
            let html = markup::append_html_to_id(&html, Self::TARGET_ID, &links)?;
            fs::write(&path, html).map_err(|source| PluginError::Io {
                path: path.clone(),
                source,
            })?;
        }

        ctx.reporter.note(
            Self::NAME,
            format!(
                "linked {} posts from {} home pages",
                posts.len(),
                home_pages.len()
            ),
        );
        Ok(())
    }
}

//! Page content supply.
//!
//! Pages are opaque to the book model; this crate only loads them. A pages file
//! is TOML with one `[[page]]` table per page:
//!
//! ```toml
//! [[page]]
//! title = "Genesis 1:1"
//! text = "In the beginning."
//! image = "genesis/1-1.png"
//! ```
//!
//! Every field is optional; a missing field renders as empty rather than
//! failing. Text is kept verbatim here and sanitised for the terminal by
//! [`sanitize`] at render time.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "img")]
    pub image: Option<String>,
}

impl Page {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.text.trim().is_empty() && self.image.is_none()
    }
}

#[derive(Debug, Deserialize, Default)]
struct PagesFile {
    #[serde(default, rename = "page")]
    pages: Vec<Page>,
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read pages file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse pages file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("pages file {path} contains no pages")]
    Empty { path: PathBuf },
}

/// Parse a pages document without touching the filesystem.
pub fn parse_pages(src: &str) -> Result<Vec<Page>, toml::de::Error> {
    let file: PagesFile = toml::from_str(src)?;
    Ok(file.pages)
}

pub fn load_pages(path: &Path) -> Result<Vec<Page>, ContentError> {
    let src = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let pages = parse_pages(&src).map_err(|source| ContentError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if pages.is_empty() {
        return Err(ContentError::Empty {
            path: path.to_path_buf(),
        });
    }
    let blank = pages.iter().filter(|p| p.is_blank()).count();
    info!(
        target: "content",
        file = %path.display(),
        pages = pages.len(),
        blank,
        "pages_loaded"
    );
    Ok(pages)
}

/// Built-in six page book used when no pages file is supplied.
pub fn demo_pages() -> Vec<Page> {
    let pages = vec![
        Page::new("Genesis 1:1", "Verse 1").with_image("genesis/g1-1.png"),
        Page::new("Chapter 2", "Page 2 (left)."),
        Page::new("Chapter 3", "Page 3 (right)."),
        Page::new("Chapter 4", "Page 4 (left)."),
        Page::new("Chapter 5", "Page 5 (right)."),
        Page::new("Chapter 6", "Page 6 (left)."),
    ];
    debug!(target: "content", pages = pages.len(), "demo_pages");
    pages
}

/// Strip characters that would move the cursor or restyle the terminal.
/// Tabs become a single space; newlines survive so body text can keep
/// paragraph breaks.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

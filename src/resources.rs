// ABOUTME: Resource handling for the slide-deck application
// ABOUTME: Stylesheets and scripts referenced by a deck, local to its root or remote

use crate::errors::{DeckError, Result};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// What a resource is included as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Stylesheet,
    Script,
}

/// How resources end up in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeMode {
    /// Inline local files, link remote ones
    Embed,
    /// Inline local and remote files, producing a self-contained page
    EmbedAll,
    /// Reference everything by URL or relative path
    Link,
}

/// A stylesheet or script, either a path relative to the deck root or a URL.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: String,
    pub kind: ResourceKind,
    pub is_remote: bool,
}

impl ResourceFile {
    pub fn new(path: &str, kind: ResourceKind) -> Self {
        let is_remote = path.starts_with("http://") || path.starts_with("https://");
        Self {
            path: path.to_string(),
            kind,
            is_remote,
        }
    }

    pub fn stylesheet(path: &str) -> Self {
        Self::new(path, ResourceKind::Stylesheet)
    }

    pub fn script(path: &str) -> Self {
        Self::new(path, ResourceKind::Script)
    }

    /// Get the content of the resource, fetching remote ones over HTTP
    pub fn content(&self, root: &Path) -> Result<String> {
        if self.is_remote {
            self.fetch_remote_content()
        } else {
            self.read_local_content(root)
        }
    }

    /// Fetch content from a remote URL, retrying with backoff
    fn fetch_remote_content(&self) -> Result<String> {
        info!("Fetching remote resource: {}", self.path);

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(DeckError::FetchError)?;

        let mut retry_delay = 1000;
        let mut last_error = None;

        for attempt in 1..=3 {
            match client.get(&self.path).send() {
                Ok(response) if response.status().is_success() => {
                    return response.text().map_err(DeckError::FetchError);
                }
                Ok(response) => {
                    last_error = Some(DeckError::ValidationError(format!(
                        "HTTP error fetching {}: {}",
                        self.path,
                        response.status()
                    )));
                }
                Err(e) => last_error = Some(DeckError::FetchError(e)),
            }

            if attempt < 3 {
                info!(
                    "Fetch attempt {} failed, retrying in {} ms",
                    attempt, retry_delay
                );
                std::thread::sleep(Duration::from_millis(retry_delay));
                retry_delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DeckError::ValidationError("Unknown error fetching resource".to_string())
        }))
    }

    /// Read a local resource, resolved against the deck root unless absolute
    fn read_local_content(&self, root: &Path) -> Result<String> {
        let path = root.join(&self.path);
        info!("Reading local resource: {:?}", path);
        if !path.exists() {
            return Err(DeckError::PathNotFoundError(path));
        }

        fs::read_to_string(&path).map_err(DeckError::FileReadError)
    }

    /// Generate the HTML tag that includes this resource
    pub fn tag(&self, root: &Path, mode: IncludeMode) -> Result<String> {
        let inline = match mode {
            IncludeMode::Link => false,
            IncludeMode::Embed => !self.is_remote,
            IncludeMode::EmbedAll => true,
        };

        if !inline {
            return Ok(match self.kind {
                ResourceKind::Stylesheet => {
                    format!(r#"<link rel="stylesheet" href="{}">"#, self.path)
                }
                ResourceKind::Script => format!(r#"<script src="{}"></script>"#, self.path),
            });
        }

        let content = self.content(root)?;
        if self.kind == ResourceKind::Script && content.contains("</script") {
            return Err(DeckError::InvalidResourcePath(format!(
                "{} cannot be inlined: it contains a closing script tag",
                self.path
            )));
        }

        Ok(match self.kind {
            ResourceKind::Stylesheet => format!("<style>{}</style>", content),
            ResourceKind::Script => format!("<script>{}</script>", content),
        })
    }
}

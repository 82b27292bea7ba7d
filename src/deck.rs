// ABOUTME: Slide manifest handling for the slide-deck application
// ABOUTME: Loads, discovers and saves the ordered list of slide fragments that make up a deck

use crate::errors::{DeckError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name inside a deck root
pub const MANIFEST_FILE: &str = "slides.json";

/// Fragment locations searched when a deck has no manifest
pub const SLIDE_PATTERNS: &[&str] = &["slides/slide-*.html", "slides/slide-*.md"];

/// One entry of the render order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideConfig {
    pub id: String,
    #[serde(rename = "file", alias = "sourceFile")]
    pub source_file: PathBuf,
    pub title: String,
}

impl SlideConfig {
    pub fn new(id: &str, source_file: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            source_file: PathBuf::from(source_file),
            title: title.to_string(),
        }
    }

    /// Derive an entry from a fragment path such as `slides/slide-02-overview.html`
    pub fn from_fragment_path(relative: &Path) -> Self {
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let rest = stem.strip_prefix("slide-").unwrap_or(&stem);
        let (number, name) = rest.split_once('-').unwrap_or((rest, ""));
        let id = format!("slide-{}", number);

        let title = if name.is_empty() {
            id.clone()
        } else {
            name.split('-')
                .filter(|word| !word.is_empty())
                .map(capitalize)
                .collect::<Vec<_>>()
                .join(" ")
        };

        Self {
            id,
            source_file: relative.to_path_buf(),
            title,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Load the render order for the deck in `root`.
///
/// `slides.json` wins when present; otherwise fragments are discovered on disk.
pub fn load_manifest(root: &Path) -> Result<Vec<SlideConfig>> {
    let manifest_path = root.join(MANIFEST_FILE);

    let slides = if manifest_path.is_file() {
        info!("Reading slide manifest: {:?}", manifest_path);
        let content = fs::read_to_string(&manifest_path)?;
        serde_json::from_str::<Vec<SlideConfig>>(&content)?
    } else {
        debug!("No manifest in {:?}, discovering slide fragments", root);
        discover_slides(root)?
    };

    if slides.is_empty() {
        return Err(DeckError::NoSlidesFoundError(format!(
            "no entries in {:?} and nothing matching {}",
            manifest_path,
            SLIDE_PATTERNS.join(" or ")
        )));
    }

    if let Some(duplicate) = first_duplicate_id(&slides) {
        return Err(DeckError::ConfigError(format!(
            "Duplicate slide id in manifest: {}",
            duplicate
        )));
    }

    Ok(slides)
}

fn first_duplicate_id(slides: &[SlideConfig]) -> Option<String> {
    let mut seen = HashSet::new();
    slides
        .iter()
        .find(|slide| !seen.insert(slide.id.as_str()))
        .map(|slide| slide.id.clone())
}

/// Find slide fragments below `root`, ordered by file name
pub fn discover_slides(root: &Path) -> Result<Vec<SlideConfig>> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let mut fragments = Vec::new();

    for pattern in SLIDE_PATTERNS {
        let glob_pattern = format!("{}/{}", escaped_root, pattern);
        let entries = glob::glob(&glob_pattern).map_err(|e| {
            DeckError::ConfigError(format!("Invalid glob pattern {}: {}", glob_pattern, e))
        })?;

        for entry in entries {
            match entry {
                Ok(path) => {
                    if let Ok(relative) = path.strip_prefix(root) {
                        fragments.push(relative.to_path_buf());
                    }
                }
                Err(e) => warn!("Skipping unreadable slide fragment: {}", e),
            }
        }
    }

    fragments.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));
    Ok(fragments
        .iter()
        .map(|path| SlideConfig::from_fragment_path(path))
        .collect())
}

/// Write the manifest for the deck in `root`
pub fn save_manifest(root: &Path, slides: &[SlideConfig]) -> Result<()> {
    let path = root.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(slides)?;
    fs::write(&path, json + "\n")?;
    info!("Wrote slide manifest: {:?}", path);
    Ok(())
}

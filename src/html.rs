// ABOUTME: Deck assembly for the slide-deck application
// ABOUTME: Concatenates slide fragments into one presentation page with navigation chrome

use crate::deck::{self, SlideConfig};
use crate::errors::{DeckError, Result};
use crate::navigation::{Navigator, Slide, ACTIVE_CLASS, SLIDE_CLASS};
use crate::resources::{IncludeMode, ResourceFile};
use comrak::{markdown_to_html, ComrakOptions};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for assembling `index.html`
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub css: Vec<String>,
    pub js: Vec<String>,
    pub mode: IncludeMode,
    pub title: String,
}

/// Assemble the presentation page for the deck in `config.root`
pub fn generate_deck_html(config: &BuildConfig) -> Result<String> {
    info!("Assembling deck from {:?}", config.root);

    let manifest = deck::load_manifest(&config.root)?;

    let mut body = String::new();
    for (position, entry) in manifest.iter().enumerate() {
        let fragment = load_fragment(&config.root, entry, position + 1)?;
        body.push_str(fragment.trim());
        body.push('\n');
    }
    let body = mark_first_active(&body)?;

    let slides = Slide::parse_all(&body)?;
    let navigator = Navigator::new(slides)?;
    let display = navigator.display();
    info!("Deck has {} slides", navigator.total());

    let mut html_doc = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html_doc.push_str("<meta charset=\"UTF-8\">\n");
    html_doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html_doc.push_str(&format!("<title>{}</title>\n", escape_text(&config.title)));

    for css in &config.css {
        push_resource(&mut html_doc, &config.root, &ResourceFile::stylesheet(css), config.mode);
    }

    html_doc.push_str("</head>\n<body>\n<div class=\"presentation-container\">\n");
    html_doc.push_str(&body);
    html_doc.push_str("</div>\n");

    html_doc.push_str("<div class=\"navigation\">\n");
    html_doc.push_str(&format!(
        "<button id=\"prev-btn\" class=\"nav-btn\"{}>&larr;</button>\n",
        if display.prev_disabled { " disabled" } else { "" }
    ));
    html_doc.push_str(&format!(
        "<span id=\"slide-counter\" class=\"slide-counter\">{}</span>\n",
        display.counter
    ));
    html_doc.push_str(&format!(
        "<button id=\"next-btn\" class=\"nav-btn\"{}>&rarr;</button>\n",
        if display.next_disabled { " disabled" } else { "" }
    ));
    html_doc.push_str("</div>\n");
    html_doc.push_str(&format!(
        "<div class=\"progress-bar\"><div class=\"progress-fill\" style=\"width: {:.2}%\"></div></div>\n",
        display.progress_percent()
    ));

    for js in &config.js {
        push_resource(&mut html_doc, &config.root, &ResourceFile::script(js), config.mode);
    }

    html_doc.push_str("</body>\n</html>\n");
    Ok(html_doc)
}

/// Assemble the deck and write it to `config.output`
pub fn build_deck(config: &BuildConfig) -> Result<PathBuf> {
    let html = generate_deck_html(config)?;
    write_html_to_file(&html, &config.output)?;
    Ok(config.output.clone())
}

fn push_resource(html_doc: &mut String, root: &Path, resource: &ResourceFile, mode: IncludeMode) {
    match resource.tag(root, mode) {
        Ok(tag) => {
            html_doc.push_str(&tag);
            html_doc.push('\n');
        }
        // A missing asset should not stop the rest of the deck from building
        Err(e) => warn!("Failed to include resource {}: {}", resource.path, e),
    }
}

/// Load one fragment. Markdown is rendered and wrapped in a slide section;
/// HTML without a slide element is wrapped as well.
fn load_fragment(root: &Path, entry: &SlideConfig, position: usize) -> Result<String> {
    let path = root.join(&entry.source_file);
    if !path.is_file() {
        return Err(DeckError::PathNotFoundError(path));
    }
    let source = fs::read_to_string(&path)?;

    let is_markdown = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false);

    if is_markdown {
        let mut options = ComrakOptions::default();
        options.render.unsafe_ = true;
        options.extension.table = true;
        let content = markdown_to_html(&source, &options);
        return Ok(wrap_slide(entry, position, &content));
    }

    if Slide::parse_all(&source)?.is_empty() {
        warn!(
            "{:?} has no slide element, wrapping it in one",
            entry.source_file
        );
        return Ok(wrap_slide(entry, position, &source));
    }

    Ok(source)
}

fn wrap_slide(entry: &SlideConfig, position: usize, content: &str) -> String {
    format!(
        "<section class=\"slide\" data-slide=\"{}\" id=\"{}\" aria-label=\"{}\">\n{}\n</section>",
        position,
        escape_text(&entry.id),
        escape_text(&entry.title),
        content.trim()
    )
}

/// Add the `active` class to the first slide element, found by class
/// membership the same way slides are counted
fn mark_first_active(body: &str) -> Result<String> {
    let dom = tl::parse(body, tl::ParserOptions::default())?;
    let base = body.as_ptr() as usize;

    // Class values borrow from `body`, so their end is an insertion offset
    let first = dom
        .nodes()
        .iter()
        .filter_map(|node| node.as_tag())
        .filter(|tag| tag.attributes().is_class_member(SLIDE_CLASS))
        .filter_map(|tag| {
            let class = tag.attributes().class()?.as_bytes();
            let end = (class.as_ptr() as usize).checked_sub(base)? + class.len();
            let already_active = tag.attributes().is_class_member(ACTIVE_CLASS);
            (end <= body.len() && body.is_char_boundary(end)).then_some((end, already_active))
        })
        .min_by_key(|(end, _)| *end);

    match first {
        Some((end, false)) => Ok(format!("{} {}{}", &body[..end], ACTIVE_CLASS, &body[end..])),
        _ => Ok(body.to_string()),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);
    crate::utils::ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, html_content).map_err(DeckError::FileReadError)?;
    Ok(())
}

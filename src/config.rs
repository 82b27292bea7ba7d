// ABOUTME: Configuration module for the slide-deck application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::export::ExportConfig;
use crate::html::BuildConfig;
use crate::resources::IncludeMode;
use crate::templates::{PRESENTATION_SCRIPT_FILE, STYLESHEET_FILE};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Diagram library linked into freshly built decks
pub const DEFAULT_JS: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Global configuration for the application
pub struct Config {
    pub browser_path: Option<String>,
    /// Upper bound for the slide and image readiness waits. `None` waits indefinitely.
    pub default_timeout_ms: Option<u64>,
    /// Upper bound for the diagram rendering wait. `None` waits indefinitely.
    pub diagram_timeout_ms: Option<u64>,
    pub embed_resources: bool,
    pub default_css: Vec<String>,
    pub default_js: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_path: env::var("BROWSER_PATH").ok(),
            default_timeout_ms: None,
            diagram_timeout_ms: None,
            embed_resources: true,
            default_css: vec![STYLESHEET_FILE.to_string()],
            default_js: vec![DEFAULT_JS.to_string(), PRESENTATION_SCRIPT_FILE.to_string()],
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let browser_path = env::var("BROWSER_PATH").ok().filter(|p| !p.is_empty());
        let default_timeout_ms = env::var("DEFAULT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());
        let diagram_timeout_ms = env::var("DIAGRAM_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());
        let embed_resources = env::var("EMBED_RESOURCES")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let default_css = env::var("DEFAULT_CSS")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.default_css);
        let default_js = env::var("DEFAULT_JS")
            .map(|s| split_list(&s))
            .unwrap_or(defaults.default_js);

        Self {
            browser_path,
            default_timeout_ms,
            diagram_timeout_ms,
            embed_resources,
            default_css,
            default_js,
        }
    }

    /// Get an export configuration with defaults from this config
    pub fn get_export_config(
        &self,
        root: &Path,
        output: Option<PathBuf>,
        timeout_ms: Option<u64>,
        diagram_timeout_ms: Option<u64>,
    ) -> ExportConfig {
        ExportConfig {
            asset_root: root.to_path_buf(),
            output_path: output.unwrap_or_else(|| root.join("export.pdf")),
            browser_path: self.browser_path.clone(),
            ready_timeout: timeout_ms
                .or(self.default_timeout_ms)
                .map(Duration::from_millis),
            diagram_timeout: diagram_timeout_ms
                .or(self.diagram_timeout_ms)
                .map(Duration::from_millis),
            ..ExportConfig::default()
        }
    }

    /// Get a build configuration, falling back to the default resources
    pub fn get_build_config(
        &self,
        root: &Path,
        output: Option<PathBuf>,
        css: Option<Vec<String>>,
        js: Option<Vec<String>>,
        mode: Option<IncludeMode>,
        title: Option<String>,
    ) -> BuildConfig {
        BuildConfig {
            root: root.to_path_buf(),
            output: output.unwrap_or_else(|| root.join("index.html")),
            css: css.unwrap_or_else(|| self.default_css.clone()),
            js: js.unwrap_or_else(|| self.default_js.clone()),
            mode: mode.unwrap_or(if self.embed_resources {
                IncludeMode::Embed
            } else {
                IncludeMode::Link
            }),
            title: title.unwrap_or_else(|| "Presentation".to_string()),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_config_defaults_to_deck_root() {
        let config = Config {
            browser_path: None,
            default_timeout_ms: Some(1000),
            diagram_timeout_ms: None,
            embed_resources: true,
            default_css: Vec::new(),
            default_js: Vec::new(),
        };
        let export = config.get_export_config(Path::new("/decks/q3"), None, None, Some(500));

        assert_eq!(export.output_path, PathBuf::from("/decks/q3/export.pdf"));
        assert_eq!(export.ready_timeout, Some(Duration::from_millis(1000)));
        assert_eq!(export.diagram_timeout, Some(Duration::from_millis(500)));
        assert_eq!((export.viewport_width, export.viewport_height), (1920, 1080));
    }

    #[test]
    fn build_config_uses_default_resources() {
        let config = Config::new();
        let build = config.get_build_config(Path::new("deck"), None, None, None, None, None);

        assert_eq!(build.output, PathBuf::from("deck/index.html"));
        assert_eq!(build.css, vec!["style.css".to_string()]);
        assert_eq!(
            build.js,
            vec![DEFAULT_JS.to_string(), "presentation.js".to_string()]
        );
        assert_eq!(build.title, "Presentation");
    }

    #[test]
    fn readiness_waits_are_unbounded_by_default() {
        let config = Config {
            default_timeout_ms: None,
            ..Config::new()
        };
        let export = config.get_export_config(Path::new("deck"), None, None, None);
        assert_eq!(export.ready_timeout, None);

        let export = config.get_export_config(Path::new("deck"), None, Some(250), None);
        assert_eq!(export.ready_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn list_values_are_trimmed() {
        assert_eq!(
            split_list(" a.css, ,b.css "),
            vec!["a.css".to_string(), "b.css".to_string()]
        );
    }
}

// ABOUTME: Watch module for monitoring a deck and rebuilding it on change
// ABOUTME: Rebuilds index.html when fragments, the manifest or local assets change, optionally serving it

use log::{debug, error, info};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use notify_debouncer_full::new_debouncer;

use crate::errors::{DeckError, Result};
use crate::html::{self, BuildConfig};
use crate::server::StaticServer;
use crate::utils;

/// Extensions whose changes trigger a rebuild
const WATCHED_EXTENSIONS: &[&str] = &["html", "md", "css", "js", "json", "svg", "png", "jpg", "jpeg"];

/// Configuration for watch mode
pub struct WatchConfig {
    /// How to assemble the deck on every change
    pub build: BuildConfig,

    /// Debounce time in milliseconds
    pub debounce_ms: u64,

    /// Whether to serve the deck on a local port
    pub serve: bool,

    /// Port for the local server
    pub port: u16,
}

impl WatchConfig {
    pub fn new(build: BuildConfig) -> Self {
        Self {
            build,
            debounce_ms: 500,
            serve: false,
            port: 8080,
        }
    }
}

/// Build the deck, then rebuild it whenever one of its sources changes.
/// Blocks until the watcher shuts down.
pub fn watch_deck(config: WatchConfig) -> Result<()> {
    let root = &config.build.root;
    utils::validate_directory_exists(root)?;

    rebuild(&config.build)?;

    // Held for the lifetime of the watch loop
    let _server = if config.serve {
        let server = StaticServer::start_on_port(root, config.port)?;
        println!("Serving deck on {}", server.url_for(""));
        Some(server)
    } else {
        None
    };

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(config.debounce_ms), None, tx)
        .map_err(|e| DeckError::WatchError(format!("Failed to create file watcher: {}", e)))?;

    let abs_root = utils::get_absolute_path(root)?;
    debouncer
        .watcher()
        .watch(&abs_root, RecursiveMode::Recursive)
        .map_err(|e| {
            DeckError::WatchError(format!("Failed to start watching {:?}: {}", abs_root, e))
        })?;

    info!("Watching for changes in {:?}", abs_root);
    println!("Watching for changes in {:?} (Press Ctrl+C to stop)", root);

    let mut last_processed = Instant::now();

    for result in rx {
        match result {
            Ok(events) => {
                let relevant_changes = events.iter().any(|event| {
                    event.paths.iter().any(|path| {
                        let relevant = is_relevant_path(path, &config.build);
                        if relevant {
                            debug!("Detected relevant change in {:?}", path);
                        }
                        relevant
                    })
                });

                let now = Instant::now();
                if relevant_changes
                    && now.duration_since(last_processed) > Duration::from_millis(config.debounce_ms)
                {
                    match rebuild(&config.build) {
                        Ok(()) => last_processed = now,
                        Err(e) => error!("Failed to rebuild deck: {}", e),
                    }
                }
            }
            Err(errors) => {
                for e in errors {
                    error!("Watch error: {:?}", e);
                }
            }
        }
    }

    Ok(())
}

fn rebuild(build: &BuildConfig) -> Result<()> {
    let output = html::build_deck(build)?;
    info!("Deck rebuilt: {:?}", output);
    Ok(())
}

/// Whether a change to `path` should trigger a rebuild.
///
/// The generated page itself is ignored so a rebuild never triggers another.
fn is_relevant_path(path: &Path, build: &BuildConfig) -> bool {
    let same_as_output = match (
        utils::get_absolute_path(path),
        utils::get_absolute_path(&build.output),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => path == build.output,
    };
    if same_as_output {
        return false;
    }

    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            WATCHED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::IncludeMode;
    use tempfile::TempDir;

    fn build_config(root: &Path) -> BuildConfig {
        BuildConfig {
            root: root.to_path_buf(),
            output: root.join("index.html"),
            css: Vec::new(),
            js: Vec::new(),
            mode: IncludeMode::Link,
            title: "Watched".to_string(),
        }
    }

    #[test]
    fn generated_page_is_ignored() {
        let dir = TempDir::new().unwrap();
        let build = build_config(dir.path());
        std::fs::write(&build.output, "").unwrap();

        assert!(!is_relevant_path(&build.output, &build));
        assert!(is_relevant_path(&dir.path().join("slides/slide-01.html"), &build));
        assert!(is_relevant_path(&dir.path().join("slides.json"), &build));
        assert!(is_relevant_path(&dir.path().join("style.CSS"), &build));
        assert!(!is_relevant_path(&dir.path().join("export.pdf"), &build));
        assert!(!is_relevant_path(&dir.path().join("Makefile"), &build));
    }
}

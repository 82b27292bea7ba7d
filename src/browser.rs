// ABOUTME: Headless browser session for the slide-deck application
// ABOUTME: Launches Chrome and implements the export page steps as in-page scripts

use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{debug, info, warn};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::{DeckError, Result};
use crate::export::{ExportConfig, LayoutReport, PageSelectors, PrintPage};

/// One browser process with one tab, owned by a single export job.
///
/// Dropping the session kills the browser process.
pub struct ChromeSession {
    // Kept alive for the lifetime of the tab
    _browser: Browser,
    page: ChromePage,
}

impl ChromeSession {
    /// Launch a headless browser sized for high-resolution printing
    pub fn launch(config: &ExportConfig) -> Result<Self> {
        let mut launch_options_builder = LaunchOptionsBuilder::default();

        let scale_arg = format!("--force-device-scale-factor={}", config.device_scale_factor);
        launch_options_builder
            .window_size(Some((config.viewport_width, config.viewport_height)))
            .headless(true)
            .args(vec![OsStr::new("--disable-gpu"), OsStr::new(&scale_arg)]);

        if let Some(browser_path) = config.browser_path.as_ref().filter(|p| !p.is_empty()) {
            launch_options_builder.path(Some(browser_path.into()));
        }

        let launch_options = launch_options_builder
            .build()
            .map_err(|e| DeckError::BrowserError {
                message: format!("Failed to build browser options: {:?}", e),
                source: None,
            })?;

        info!(
            "Launching headless browser ({}x{} @{}x)",
            config.viewport_width, config.viewport_height, config.device_scale_factor
        );
        let browser = Browser::new(launch_options)
            .map_err(|e| DeckError::browser("Failed to launch browser", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| DeckError::browser("Failed to create new tab", e))?;
        if let Some(timeout) = config.ready_timeout {
            tab.set_default_timeout(timeout);
        }

        Ok(Self {
            _browser: browser,
            page: ChromePage {
                tab,
                selectors: config.selectors.clone(),
                load_timeout: config.ready_timeout,
                poll_interval: config.poll_interval,
            },
        })
    }

    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Close the tab and shut the browser down
    pub fn close(self) {
        if let Err(e) = self.page.tab.close(true) {
            warn!("Failed to close tab: {}", e);
        }
        info!("Browser closed");
    }
}

/// A Chrome tab showing the deck
pub struct ChromePage {
    tab: Arc<Tab>,
    selectors: PageSelectors,
    load_timeout: Option<Duration>,
    poll_interval: Duration,
}

impl ChromePage {
    fn evaluate(&self, what: &str, js: &str) -> Result<Option<Value>> {
        debug!("Evaluating script to {}", what);
        let object = self
            .tab
            .evaluate(js, false)
            .map_err(|e| DeckError::browser(format!("Failed to {}", what), e))?;
        Ok(object.value)
    }

    fn evaluate_bool(&self, what: &str, js: &str) -> Result<bool> {
        match self.evaluate(what, js)? {
            Some(Value::Bool(value)) => Ok(value),
            other => Err(unexpected(what, other)),
        }
    }

    fn evaluate_count(&self, what: &str, js: &str) -> Result<usize> {
        match self.evaluate(what, js)? {
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| unexpected(what, Some(Value::Number(n)))),
            other => Err(unexpected(what, other)),
        }
    }

    fn slides_js(&self) -> String {
        format!(
            "Array.from(document.querySelectorAll({}))",
            js_string(&self.selectors.slide)
        )
    }

    fn diagrams_js(&self) -> String {
        format!(
            "Array.from(document.querySelectorAll({}))",
            js_string(&self.selectors.diagram)
        )
    }

    fn grids_js(&self) -> String {
        if self.selectors.grid_layouts.is_empty() {
            "[]".to_string()
        } else {
            format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(&self.selectors.grid_layouts.join(", "))
            )
        }
    }
}

impl PrintPage for ChromePage {
    fn load(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| DeckError::browser("Failed to navigate to deck", e))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| DeckError::browser("Navigation failed", e))?;

        let started = Instant::now();
        while !self.evaluate_bool("check document state", "document.readyState === 'complete'")? {
            if let Some(limit) = self.load_timeout.filter(|limit| started.elapsed() >= *limit) {
                return Err(DeckError::TimeoutError(format!(
                    "Document did not finish loading within {} ms",
                    limit.as_millis()
                )));
            }
            thread::sleep(self.poll_interval);
        }
        Ok(())
    }

    fn slide_count(&self) -> Result<usize> {
        self.evaluate_count("count slides", &format!("{}.length", self.slides_js()))
    }

    fn images_complete(&self) -> Result<bool> {
        self.evaluate_bool(
            "check images",
            "Array.from(document.images).every((img) => img.complete)",
        )
    }

    fn emulate_print_media(&self) -> Result<()> {
        self.tab
            .call_method(Emulation::SetEmulatedMedia {
                media: Some("print".to_string()),
                features: None,
            })
            .map_err(|e| DeckError::browser("Failed to emulate print media", e))?;
        Ok(())
    }

    fn inject_page_counters(&self) -> Result<usize> {
        let class = js_string(&self.selectors.page_counter_class);
        let js = format!(
            r#"(() => {{
                const slides = {slides};
                const total = slides.length;
                slides.forEach((slide, idx) => {{
                    slide.querySelectorAll('.' + {class}).forEach((el) => el.remove());
                    const el = document.createElement('div');
                    el.className = {class};
                    el.textContent = (idx + 1) + ' / ' + total;
                    slide.appendChild(el);
                }});
                return total;
            }})()"#,
            slides = self.slides_js(),
            class = class,
        );
        self.evaluate_count("inject page counters", &js)
    }

    fn run_diagram_renderer(&self) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const m = window.mermaid;
                if (!m) return false;
                const nodes = {diagrams};
                if (nodes.length === 0) return true;
                try {{
                    let pending;
                    if (typeof m.run === 'function') {{
                        pending = m.run({{ nodes }});
                    }} else if (typeof m.init === 'function') {{
                        pending = m.init(undefined, nodes);
                    }}
                    if (pending && typeof pending.catch === 'function') pending.catch(() => {{}});
                }} catch (e) {{}}
                return true;
            }})()"#,
            diagrams = self.diagrams_js(),
        );
        self.evaluate_bool("run diagram renderer", &js)
    }

    fn diagrams_rendered(&self) -> Result<bool> {
        let js = format!(
            "{}.every((el) => el.querySelector('svg') !== null)",
            self.diagrams_js()
        );
        self.evaluate_bool("check diagrams", &js)
    }

    fn has_overflow_handler(&self) -> Result<bool> {
        self.evaluate_bool(
            "look for overflow handler",
            "!!(window.presentation && typeof window.presentation.detectAndHandleOverflow === 'function')",
        )
    }

    fn fit_overflowing_slides(&self) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const presentation = window.presentation;
                {slides}.forEach((slide) => presentation.detectAndHandleOverflow(slide));
                return true;
            }})()"#,
            slides = self.slides_js(),
        );
        self.evaluate_bool("fit overflowing slides", &js)?;
        Ok(())
    }

    fn inspect_layout(&self) -> Result<LayoutReport> {
        let js = format!(
            r#"(() => {{
                const diagrams = {diagrams};
                const grids = {grids};
                const collapsed = grids.filter((el) => {{
                    const cols = window.getComputedStyle(el).gridTemplateColumns.split(' ').filter(Boolean);
                    return cols.length < 2;
                }});
                return JSON.stringify({{
                    rendererPresent: !!window.mermaid,
                    diagrams: diagrams.length,
                    diagramsMissingSvg: diagrams.filter((el) => !el.querySelector('svg')).length,
                    gridContainers: grids.length,
                    collapsedGrids: collapsed.length
                }});
            }})()"#,
            diagrams = self.diagrams_js(),
            grids = self.grids_js(),
        );

        match self.evaluate("inspect layout", &js)? {
            Some(Value::String(json)) => Ok(serde_json::from_str(&json)?),
            other => Err(unexpected("inspect layout", other)),
        }
    }

    fn print_pdf(&self) -> Result<Vec<u8>> {
        info!("Printing PDF");
        let options = PrintToPdfOptions {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            margin_top: Some(0.0),
            margin_right: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| DeckError::browser("Failed to print PDF", e))
    }
}

/// Quote a value as a JavaScript string literal
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn unexpected(what: &str, value: Option<Value>) -> DeckError {
    DeckError::BrowserError {
        message: format!("Unexpected result while trying to {}: {:?}", what, value),
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_quoted_for_scripts() {
        assert_eq!(js_string(".slide"), r#"".slide""#);
        assert_eq!(js_string(r#"div[id$="-chart"]"#), r#""div[id$=\"-chart\"]""#);
    }
}

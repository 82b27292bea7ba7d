// ABOUTME: PDF export pipeline for the slide-deck application
// ABOUTME: Serves the deck, waits for it to settle in a headless browser, validates layout and prints

use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::browser::ChromeSession;
use crate::errors::{DeckError, Result};
use crate::server::{StaticServer, INDEX_FILE};
use crate::utils;

/// Selectors the export steps look for in the deck
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub slide: String,
    pub diagram: String,
    pub page_counter_class: String,
    /// Containers that must keep at least two grid columns when printed
    pub grid_layouts: Vec<String>,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            slide: ".slide".to_string(),
            diagram: ".mermaid".to_string(),
            page_counter_class: "pdf-page-counter".to_string(),
            grid_layouts: [
                ".content-grid",
                ".supply-risk-layout",
                ".quality-layout",
                ".dashboard-layout",
                ".governance-layout",
                ".achievement-layout",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Configuration for one export job
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub asset_root: PathBuf,
    pub output_path: PathBuf,
    pub entry_page: String,
    pub browser_path: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub device_scale_factor: f64,
    /// Bound for the slide and image readiness waits. `None` waits indefinitely.
    pub ready_timeout: Option<Duration>,
    /// Bound for the diagram rendering wait. `None` waits indefinitely.
    pub diagram_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub autofit_settle_delay: Duration,
    pub selectors: PageSelectors,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            output_path: PathBuf::from("export.pdf"),
            entry_page: INDEX_FILE.to_string(),
            browser_path: None,
            viewport_width: 1920,
            viewport_height: 1080,
            device_scale_factor: 2.0,
            ready_timeout: None,
            diagram_timeout: None,
            poll_interval: Duration::from_millis(100),
            settle_delay: Duration::from_millis(300),
            autofit_settle_delay: Duration::from_millis(180),
            selectors: PageSelectors::default(),
        }
    }
}

/// Layout measurements taken from the printed page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub renderer_present: bool,
    pub diagrams: usize,
    pub diagrams_missing_svg: usize,
    pub grid_containers: usize,
    pub collapsed_grids: usize,
}

impl LayoutReport {
    /// Every violated invariant, one entry per kind with its count.
    ///
    /// Placeholders only count as missing when a renderer is on the page;
    /// without one they are static content.
    pub fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.renderer_present && self.diagrams_missing_svg > 0 {
            errors.push(format!("Mermaid SVG missing: {}", self.diagrams_missing_svg));
        }
        if self.collapsed_grids > 0 {
            errors.push(format!("Two-column layout collapsed: {}", self.collapsed_grids));
        }
        errors
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.violations();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DeckError::LayoutError(errors.join(" | ")))
        }
    }
}

/// The browser page an export job drives.
///
/// Each method maps onto one interaction with the loaded deck; the ordering
/// and waiting between them belongs to [`ExportJob`].
pub trait PrintPage {
    /// Navigate to `url` and wait until the document has finished loading
    fn load(&self, url: &str) -> Result<()>;

    fn slide_count(&self) -> Result<usize>;

    fn images_complete(&self) -> Result<bool>;

    fn emulate_print_media(&self) -> Result<()>;

    /// Replace every slide's page counter. Returns the number of slides stamped.
    fn inject_page_counters(&self) -> Result<usize>;

    /// Ask the diagram library to render every placeholder. Render failures
    /// are swallowed; returns `false` when no diagram library is present.
    fn run_diagram_renderer(&self) -> Result<bool>;

    /// Whether every placeholder holds a rendered graphic
    fn diagrams_rendered(&self) -> Result<bool>;

    fn has_overflow_handler(&self) -> Result<bool>;

    /// Run the page's overflow handler once over every slide
    fn fit_overflowing_slides(&self) -> Result<()>;

    fn inspect_layout(&self) -> Result<LayoutReport>;

    fn print_pdf(&self) -> Result<Vec<u8>>;
}

/// Drives a loaded page from readiness to a written PDF.
pub struct ExportJob<'a, P: PrintPage> {
    config: &'a ExportConfig,
    page: &'a P,
}

impl<'a, P: PrintPage> ExportJob<'a, P> {
    pub fn new(config: &'a ExportConfig, page: &'a P) -> Self {
        Self { config, page }
    }

    /// Run every step against `url`, writing the PDF to the configured output
    pub fn run(&self, url: &str) -> Result<PathBuf> {
        let started = Instant::now();

        info!("Opening {}", url);
        self.page.load(url)?;

        self.await_ready()?;

        info!("Switching to print media");
        self.page.emulate_print_media()?;

        let stamped = self.page.inject_page_counters()?;
        info!("Stamped page counters on {} slides", stamped);

        self.render_diagrams()?;
        self.autofit_overflow()?;

        let report = self.page.inspect_layout()?;
        info!(
            "Layout: {} diagrams ({} missing), {} grid containers ({} collapsed)",
            report.diagrams,
            report.diagrams_missing_svg,
            report.grid_containers,
            report.collapsed_grids
        );
        report.validate()?;

        let pdf = self.page.print_pdf()?;
        write_pdf(&self.config.output_path, &pdf)?;

        info!(
            "Wrote {} bytes to {:?} in {:.2} seconds",
            pdf.len(),
            self.config.output_path,
            started.elapsed().as_secs_f64()
        );
        Ok(self.config.output_path.clone())
    }

    fn await_ready(&self) -> Result<()> {
        let timeout = self.config.ready_timeout;
        self.wait_until("slides to appear", timeout, || {
            Ok(self.page.slide_count()? > 0)
        })?;
        self.wait_until("images to load", timeout, || self.page.images_complete())?;
        thread::sleep(self.config.settle_delay);
        Ok(())
    }

    fn render_diagrams(&self) -> Result<()> {
        if !self.page.run_diagram_renderer()? {
            info!("No diagram library on the page, skipping diagram wait");
            return Ok(());
        }

        if self.config.diagram_timeout.is_none() {
            info!("Waiting for diagrams to render (no timeout)");
        }
        self.wait_until("diagrams to render", self.config.diagram_timeout, || {
            self.page.diagrams_rendered()
        })
    }

    fn autofit_overflow(&self) -> Result<()> {
        if !self.page.has_overflow_handler()? {
            return Ok(());
        }

        info!("Fitting overflowing slides");
        self.page.fit_overflowing_slides()?;
        thread::sleep(self.config.autofit_settle_delay);
        self.page.fit_overflowing_slides()
    }

    fn wait_until<F>(&self, what: &str, timeout: Option<Duration>, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        let started = Instant::now();
        loop {
            if condition()? {
                return Ok(());
            }
            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(DeckError::TimeoutError(format!(
                        "Gave up waiting for {} after {} ms",
                        what,
                        limit.as_millis()
                    )));
                }
            }
            thread::sleep(self.config.poll_interval);
        }
    }
}

fn write_pdf(output_path: &Path, pdf: &[u8]) -> Result<()> {
    utils::ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, pdf).map_err(DeckError::FileReadError)
}

/// Export the deck under `config.asset_root` to `config.output_path`.
///
/// The static server and the browser are released before returning, whether
/// the export succeeded or not.
pub fn export_pdf(config: &ExportConfig) -> Result<PathBuf> {
    utils::validate_directory_exists(&config.asset_root)?;
    let asset_root = utils::get_absolute_path(&config.asset_root)?;
    utils::validate_file_exists(&asset_root.join(&config.entry_page))?;

    let server = StaticServer::start(&asset_root)?;
    let url = server.url_for(&config.entry_page);

    let result = ChromeSession::launch(config).and_then(|session| {
        let result = ExportJob::new(config, session.page()).run(&url);
        session.close();
        result
    });

    server.shutdown();

    if let Err(e) = &result {
        warn!("Export failed: {}", e);
    }
    result
}

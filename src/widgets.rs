// ABOUTME: Widget capabilities used by the navigation controller
// ABOUTME: Diagram rendering and chart resizing are injected, with no-op defaults

/// Renders diagram placeholders into vector graphics.
///
/// The navigator only hands over placeholders that belong to the active slide
/// and have not been processed yet. Implementations return `true` when the
/// placeholders were rendered, which lets the navigator mark them processed.
pub trait DiagramRenderer {
    fn render(&mut self, slide_index: usize, placeholder_ids: &[String]) -> bool;
}

/// Owns chart instances keyed by their container id.
pub trait ChartHost {
    /// Resize the chart mounted in `container_id`, if there is one.
    fn resize(&mut self, container_id: &str);
}

/// Used when no diagram library is available. Nothing is ever marked processed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagrams;

impl DiagramRenderer for NoDiagrams {
    fn render(&mut self, _slide_index: usize, _placeholder_ids: &[String]) -> bool {
        false
    }
}

/// Used when no chart library is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCharts;

impl ChartHost for NoCharts {
    fn resize(&mut self, _container_id: &str) {}
}

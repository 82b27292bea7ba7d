// ABOUTME: Slide navigation controller for the slide-deck application
// ABOUTME: Owns the current-slide pointer, derived display state and lazy widget activation

use crate::errors::{DeckError, Result};
use crate::widgets::{ChartHost, DiagramRenderer, NoCharts, NoDiagrams};
use log::debug;

/// Minimum horizontal drag distance, exclusive, that counts as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Class carried by every slide element.
pub const SLIDE_CLASS: &str = "slide";

/// Class marking the slide on screen.
pub const ACTIVE_CLASS: &str = "active";

/// Class carried by diagram placeholders.
pub const DIAGRAM_CLASS: &str = "mermaid";

/// Chart containers are recognised by this id suffix.
pub const CHART_ID_SUFFIX: &str = "-chart";

/// A diagram region waiting to be replaced by rendered graphics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramPlaceholder {
    pub id: String,
    pub processed: bool,
}

/// One unit of presented content.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    index: usize,
    active: bool,
    diagrams: Vec<DiagramPlaceholder>,
    charts: Vec<String>,
}

impl Slide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagram placeholder that has not been rendered yet
    pub fn with_diagram(mut self, id: impl Into<String>) -> Self {
        self.diagrams.push(DiagramPlaceholder {
            id: id.into(),
            processed: false,
        });
        self
    }

    /// Add a chart container
    pub fn with_chart(mut self, container_id: impl Into<String>) -> Self {
        self.charts.push(container_id.into());
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn diagrams(&self) -> &[DiagramPlaceholder] {
        &self.diagrams
    }

    pub fn charts(&self) -> &[String] {
        &self.charts
    }

    /// Parse every element carrying the `slide` class out of a document, in
    /// document order, collecting its diagram placeholders and chart containers.
    pub fn parse_all(html: &str) -> Result<Vec<Slide>> {
        let dom = tl::parse(html, tl::ParserOptions::default())?;
        let parser = dom.parser();
        let mut slides = Vec::new();

        for node in dom.nodes() {
            let Some(tag) = node.as_tag() else { continue };
            if !tag.attributes().is_class_member(SLIDE_CLASS) {
                continue;
            }

            let mut slide = Slide {
                index: slides.len(),
                ..Slide::default()
            };

            for child in tag.children().all(parser) {
                let Some(child) = child.as_tag() else { continue };
                let attributes = child.attributes();
                let id = attributes.id().map(|id| id.as_utf8_str().to_string());

                if attributes.is_class_member(DIAGRAM_CLASS) {
                    let id = id.unwrap_or_else(|| {
                        format!("slide-{}-diagram-{}", slide.index, slide.diagrams.len())
                    });
                    slide.diagrams.push(DiagramPlaceholder {
                        id,
                        processed: attributes.get("data-processed").is_some(),
                    });
                } else if let Some(id) = id.filter(|id| id.ends_with(CHART_ID_SUFFIX)) {
                    slide.charts.push(id);
                }
            }

            slides.push(slide);
        }

        Ok(slides)
    }
}

/// Keys the navigator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowDown,
    ArrowLeft,
    ArrowUp,
    PageDown,
    PageUp,
    Space,
    Home,
    End,
    Char(char),
}

/// On-screen navigation buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Previous,
    Next,
}

/// Input events dispatched to [`Navigator::handle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// A completed touch drag, in screen units
    Swipe { start_x: f64, end_x: f64 },
    Wheel { delta_y: f64 },
    Click(Control),
}

/// Notification emitted after every successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideChanged {
    pub current_slide: usize,
    pub total_slides: usize,
}

/// Display state derived from the current index.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub counter: String,
    pub progress: f64,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl DisplayState {
    fn derive(current: usize, total: usize) -> Self {
        Self {
            counter: format!("{} / {}", current + 1, total),
            progress: (current + 1) as f64 / total as f64,
            prev_disabled: current == 0,
            next_disabled: current == total - 1,
        }
    }

    /// Progress as a CSS width percentage
    pub fn progress_percent(&self) -> f64 {
        self.progress * 100.0
    }
}

type Listener = Box<dyn FnMut(&SlideChanged)>;

/// Navigation controller for one browsing session.
///
/// The slide count is fixed for the lifetime of a navigator. Inserting a slide
/// consumes the navigator and builds a fresh one against the new total.
pub struct Navigator {
    slides: Vec<Slide>,
    current: usize,
    display: DisplayState,
    fullscreen: bool,
    renderer: Box<dyn DiagramRenderer>,
    charts: Box<dyn ChartHost>,
    listeners: Vec<Listener>,
}

impl Navigator {
    /// Create a navigator without diagram or chart support
    pub fn new(slides: Vec<Slide>) -> Result<Self> {
        Self::with_capabilities(slides, Box::new(NoDiagrams), Box::new(NoCharts))
    }

    pub fn with_capabilities(
        slides: Vec<Slide>,
        renderer: Box<dyn DiagramRenderer>,
        charts: Box<dyn ChartHost>,
    ) -> Result<Self> {
        Self::build(slides, renderer, charts, Vec::new(), false)
    }

    fn build(
        mut slides: Vec<Slide>,
        renderer: Box<dyn DiagramRenderer>,
        charts: Box<dyn ChartHost>,
        listeners: Vec<Listener>,
        fullscreen: bool,
    ) -> Result<Self> {
        if slides.is_empty() {
            return Err(DeckError::NoSlidesFoundError(
                "a presentation needs at least one slide".to_string(),
            ));
        }

        for (index, slide) in slides.iter_mut().enumerate() {
            slide.index = index;
            slide.active = false;
        }
        slides[0].active = true;

        let mut navigator = Self {
            display: DisplayState::derive(0, slides.len()),
            slides,
            current: 0,
            fullscreen,
            renderer,
            charts,
            listeners,
        };
        navigator.refresh();
        Ok(navigator)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Register a listener for slide changes
    pub fn subscribe(&mut self, listener: impl FnMut(&SlideChanged) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.total() {
            self.go_to(self.current as isize + 1)
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.go_to(self.current as isize - 1)
        } else {
            false
        }
    }

    /// Jump to `index`. Out-of-range indices are ignored and return `false`.
    pub fn go_to(&mut self, index: isize) -> bool {
        if index < 0 || index as usize >= self.total() {
            return false;
        }
        let index = index as usize;

        self.slides[self.current].active = false;
        self.current = index;
        self.slides[self.current].active = true;

        self.refresh();

        let event = SlideChanged {
            current_slide: self.current,
            total_slides: self.total(),
        };
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
        true
    }

    /// Translate an input event into a transition. Returns whether the
    /// current slide changed.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Key(key) => match key {
                Key::ArrowRight | Key::ArrowDown | Key::PageDown | Key::Space => self.next(),
                Key::ArrowLeft | Key::ArrowUp | Key::PageUp => self.previous(),
                Key::Home => self.go_to(0),
                Key::End => self.go_to(self.total() as isize - 1),
                Key::Char('f') | Key::Char('F') => {
                    self.fullscreen = !self.fullscreen;
                    false
                }
                Key::Char(_) => false,
            },
            InputEvent::Swipe { start_x, end_x } => {
                let diff = start_x - end_x;
                if diff.abs() <= SWIPE_THRESHOLD {
                    false
                } else if diff > 0.0 {
                    self.next()
                } else {
                    self.previous()
                }
            }
            InputEvent::Wheel { delta_y } => {
                if delta_y > 0.0 {
                    self.next()
                } else if delta_y < 0.0 {
                    self.previous()
                } else {
                    false
                }
            }
            InputEvent::Click(Control::Previous) => self.previous(),
            InputEvent::Click(Control::Next) => self.next(),
        }
    }

    /// Insert `slide` before `position`, or append it when `position` is -1
    /// or past the end. Returns a navigator rebuilt against the new total.
    pub fn insert_slide(self, slide: Slide, position: isize) -> Result<Navigator> {
        let Navigator {
            mut slides,
            fullscreen,
            renderer,
            charts,
            listeners,
            ..
        } = self;

        if position < 0 || position as usize >= slides.len() {
            slides.push(slide);
        } else {
            slides.insert(position as usize, slide);
        }

        Self::build(slides, renderer, charts, listeners, fullscreen)
    }

    fn refresh(&mut self) {
        self.display = DisplayState::derive(self.current, self.total());

        let slide = &mut self.slides[self.current];
        let pending: Vec<String> = slide
            .diagrams
            .iter()
            .filter(|diagram| !diagram.processed)
            .map(|diagram| diagram.id.clone())
            .collect();

        if !pending.is_empty() && self.renderer.render(slide.index, &pending) {
            debug!(
                "Rendered {} diagram(s) on slide {}",
                pending.len(),
                slide.index + 1
            );
            for diagram in slide.diagrams.iter_mut() {
                diagram.processed = true;
            }
        }

        for container in &slide.charts {
            self.charts.resize(container);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn slides(count: usize) -> Vec<Slide> {
        (0..count).map(|_| Slide::new()).collect()
    }

    fn active_indices(navigator: &Navigator) -> Vec<usize> {
        navigator
            .slides()
            .iter()
            .filter(|slide| slide.is_active())
            .map(|slide| slide.index())
            .collect()
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        calls: Rc<RefCell<Vec<(usize, Vec<String>)>>>,
    }

    impl DiagramRenderer for RecordingRenderer {
        fn render(&mut self, slide_index: usize, placeholder_ids: &[String]) -> bool {
            self.calls
                .borrow_mut()
                .push((slide_index, placeholder_ids.to_vec()));
            true
        }
    }

    #[derive(Clone, Default)]
    struct RecordingCharts {
        resized: Rc<RefCell<Vec<String>>>,
    }

    impl ChartHost for RecordingCharts {
        fn resize(&mut self, container_id: &str) {
            self.resized.borrow_mut().push(container_id.to_string());
        }
    }

    #[test]
    fn starts_on_first_slide() {
        let navigator = Navigator::new(slides(4)).unwrap();
        assert_eq!(navigator.current(), 0);
        assert_eq!(navigator.total(), 4);
        assert_eq!(active_indices(&navigator), vec![0]);

        let display = navigator.display();
        assert_eq!(display.counter, "1 / 4");
        assert!(display.prev_disabled);
        assert!(!display.next_disabled);
        assert!((display.progress - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_deck_is_rejected() {
        assert!(matches!(
            Navigator::new(Vec::new()),
            Err(DeckError::NoSlidesFoundError(_))
        ));
    }

    #[test]
    fn go_to_activates_exactly_one_slide() {
        let mut navigator = Navigator::new(slides(5)).unwrap();
        for i in 0..5 {
            assert!(navigator.go_to(i as isize) || i == 0);
            assert_eq!(navigator.current(), i);
            assert_eq!(active_indices(&navigator), vec![i]);
            assert_eq!(navigator.display().counter, format!("{} / 5", i + 1));
        }
        assert!(navigator.display().next_disabled);
        assert!(!navigator.display().prev_disabled);
        assert!((navigator.display().progress_percent() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_go_to_is_ignored() {
        let mut navigator = Navigator::new(slides(3)).unwrap();
        navigator.go_to(1);

        assert!(!navigator.go_to(-1));
        assert!(!navigator.go_to(3));
        assert_eq!(navigator.current(), 1);
        assert_eq!(active_indices(&navigator), vec![1]);
        assert_eq!(navigator.display().counter, "2 / 3");
    }

    #[test]
    fn next_saturates_at_last_slide() {
        let mut navigator = Navigator::new(slides(4)).unwrap();
        for _ in 0..4 {
            navigator.next();
        }
        assert_eq!(navigator.current(), 3);
        assert!(!navigator.next());
        assert_eq!(navigator.current(), 3);
    }

    #[test]
    fn previous_on_first_slide_is_ignored() {
        let mut navigator = Navigator::new(slides(2)).unwrap();
        assert!(!navigator.previous());
        assert_eq!(navigator.current(), 0);
    }

    #[test]
    fn keys_map_to_transitions() {
        let mut navigator = Navigator::new(slides(6)).unwrap();

        for key in [Key::ArrowRight, Key::ArrowDown, Key::PageDown, Key::Space] {
            navigator.handle(InputEvent::Key(key));
        }
        assert_eq!(navigator.current(), 4);

        for key in [Key::ArrowLeft, Key::ArrowUp, Key::PageUp] {
            navigator.handle(InputEvent::Key(key));
        }
        assert_eq!(navigator.current(), 1);

        navigator.handle(InputEvent::Key(Key::End));
        assert_eq!(navigator.current(), 5);
        navigator.handle(InputEvent::Key(Key::Home));
        assert_eq!(navigator.current(), 0);

        assert!(!navigator.handle(InputEvent::Key(Key::Char('x'))));
        assert_eq!(navigator.current(), 0);
    }

    #[test]
    fn fullscreen_key_toggles_without_moving() {
        let mut navigator = Navigator::new(slides(2)).unwrap();
        navigator.handle(InputEvent::Key(Key::Char('f')));
        assert!(navigator.is_fullscreen());
        navigator.handle(InputEvent::Key(Key::Char('F')));
        assert!(!navigator.is_fullscreen());
        assert_eq!(navigator.current(), 0);
    }

    #[test]
    fn swipe_must_exceed_threshold() {
        let mut navigator = Navigator::new(slides(3)).unwrap();

        assert!(!navigator.handle(InputEvent::Swipe { start_x: 200.0, end_x: 151.0 }));
        assert!(!navigator.handle(InputEvent::Swipe { start_x: 200.0, end_x: 150.0 }));
        assert_eq!(navigator.current(), 0);

        assert!(navigator.handle(InputEvent::Swipe { start_x: 200.0, end_x: 149.0 }));
        assert_eq!(navigator.current(), 1);

        assert!(navigator.handle(InputEvent::Swipe { start_x: 100.0, end_x: 151.0 }));
        assert_eq!(navigator.current(), 0);
    }

    #[test]
    fn wheel_and_buttons_move_one_slide() {
        let mut navigator = Navigator::new(slides(3)).unwrap();
        navigator.handle(InputEvent::Wheel { delta_y: 3.0 });
        assert_eq!(navigator.current(), 1);
        assert!(!navigator.handle(InputEvent::Wheel { delta_y: 0.0 }));
        navigator.handle(InputEvent::Wheel { delta_y: -1.0 });
        assert_eq!(navigator.current(), 0);

        navigator.handle(InputEvent::Click(Control::Next));
        navigator.handle(InputEvent::Click(Control::Next));
        assert_eq!(navigator.current(), 2);
        navigator.handle(InputEvent::Click(Control::Previous));
        assert_eq!(navigator.current(), 1);
    }

    #[test]
    fn listeners_receive_slide_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut navigator = Navigator::new(slides(3)).unwrap();
        let sink = seen.clone();
        navigator.subscribe(move |event| sink.borrow_mut().push(*event));

        navigator.next();
        navigator.go_to(7);
        navigator.go_to(2);

        assert_eq!(
            *seen.borrow(),
            vec![
                SlideChanged { current_slide: 1, total_slides: 3 },
                SlideChanged { current_slide: 2, total_slides: 3 },
            ]
        );
    }

    #[test]
    fn diagrams_render_once_when_their_slide_becomes_active() {
        let renderer = RecordingRenderer::default();
        let calls = renderer.calls.clone();
        let deck = vec![
            Slide::new(),
            Slide::new().with_diagram("flow").with_diagram("sequence"),
        ];
        let mut navigator =
            Navigator::with_capabilities(deck, Box::new(renderer), Box::new(NoCharts)).unwrap();

        assert!(calls.borrow().is_empty());

        navigator.next();
        navigator.previous();
        navigator.next();

        assert_eq!(
            *calls.borrow(),
            vec![(1, vec!["flow".to_string(), "sequence".to_string()])]
        );
        assert!(navigator.slides()[1].diagrams().iter().all(|d| d.processed));
    }

    #[test]
    fn missing_renderer_leaves_diagrams_pending() {
        let mut navigator = Navigator::new(vec![Slide::new().with_diagram("flow")]).unwrap();
        navigator.go_to(0);
        assert!(!navigator.slides()[0].diagrams()[0].processed);
    }

    #[test]
    fn only_active_slide_charts_are_resized() {
        let charts = RecordingCharts::default();
        let resized = charts.resized.clone();
        let deck = vec![
            Slide::new().with_chart("target-chart"),
            Slide::new().with_chart("user-chart"),
        ];
        let mut navigator =
            Navigator::with_capabilities(deck, Box::new(NoDiagrams), Box::new(charts)).unwrap();
        navigator.next();

        assert_eq!(
            *resized.borrow(),
            vec!["target-chart".to_string(), "user-chart".to_string()]
        );
    }

    #[test]
    fn insert_appends_or_places_before_position() {
        let navigator = Navigator::new(slides(2)).unwrap();
        let navigator = navigator
            .insert_slide(Slide::new().with_chart("tail-chart"), -1)
            .unwrap();
        assert_eq!(navigator.total(), 3);
        assert_eq!(navigator.slides()[2].charts(), ["tail-chart".to_string()]);

        let navigator = navigator
            .insert_slide(Slide::new().with_chart("past-chart"), 10)
            .unwrap();
        assert_eq!(navigator.slides()[3].charts(), ["past-chart".to_string()]);

        let navigator = navigator
            .insert_slide(Slide::new().with_chart("head-chart"), 0)
            .unwrap();
        assert_eq!(navigator.total(), 5);
        assert_eq!(navigator.slides()[0].charts(), ["head-chart".to_string()]);
        let indices: Vec<usize> = navigator.slides().iter().map(Slide::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn insert_resets_to_first_slide_and_keeps_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut navigator = Navigator::new(slides(3)).unwrap();
        let sink = seen.clone();
        navigator.subscribe(move |event| sink.borrow_mut().push(*event));
        navigator.go_to(2);

        let mut navigator = navigator.insert_slide(Slide::new(), 1).unwrap();
        assert_eq!(navigator.current(), 0);
        assert_eq!(navigator.display().counter, "1 / 4");
        assert_eq!(active_indices(&navigator), vec![0]);

        navigator.handle(InputEvent::Key(Key::End));
        assert_eq!(
            seen.borrow().last(),
            Some(&SlideChanged { current_slide: 3, total_slides: 4 })
        );
    }

    #[test]
    fn parses_slides_from_markup() {
        let html = r#"
<div class="presentation-container">
  <section class="slide active" data-slide="1"><h1>Cover</h1></section>
  <section class="slide" data-slide="2">
    <div class="mermaid" id="flow">graph LR; A-->B</div>
    <div class="mermaid" data-processed="true"><svg></svg></div>
    <div id="target-chart"></div>
    <div id="chart-legend"></div>
  </section>
</div>"#;
        let slides = Slide::parse_all(html).unwrap();
        assert_eq!(slides.len(), 2);
        assert!(slides[0].diagrams().is_empty());

        let diagrams = slides[1].diagrams();
        assert_eq!(diagrams.len(), 2);
        assert_eq!(diagrams[0].id, "flow");
        assert!(!diagrams[0].processed);
        assert_eq!(diagrams[1].id, "slide-1-diagram-1");
        assert!(diagrams[1].processed);
        assert_eq!(slides[1].charts(), ["target-chart".to_string()]);
    }
}

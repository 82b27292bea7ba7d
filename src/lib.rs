// ABOUTME: Library module for the slide-deck program.
// ABOUTME: Contains deck assembly, slide navigation, the static server and PDF export.

// Reexport modules
pub mod browser;
pub mod config;
pub mod deck;
pub mod errors;
pub mod export;
pub mod html;
pub mod navigation;
pub mod resources;
pub mod server;
pub mod templates;
pub mod utils;
pub mod watch;
pub mod widgets;

// Reexport common types and functions
pub use config::Config;
pub use deck::{load_manifest, SlideConfig};
pub use errors::{DeckError, Result};
pub use export::{export_pdf, ExportConfig, ExportJob, LayoutReport, PrintPage};
pub use html::{build_deck, generate_deck_html, BuildConfig};
pub use navigation::{InputEvent, Navigator, Slide, SlideChanged};
pub use resources::{IncludeMode, ResourceFile};
pub use server::StaticServer;
pub use templates::init_deck;
pub use watch::{watch_deck, WatchConfig};

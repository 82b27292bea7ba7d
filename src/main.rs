// ABOUTME: Main entry point for the slide-deck program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use slide_deck::{Config, IncludeMode, WatchConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter deck into a directory
    Init {
        /// Directory to create the deck in
        dir: PathBuf,
    },

    /// Assemble index.html from the deck's slide fragments
    Build(BuildArgs),

    /// Print the deck to a PDF with a headless browser
    Export(ExportArgs),

    /// Rebuild the deck whenever its sources change
    Watch(WatchArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Inline local stylesheets and scripts, link remote ones
    Embed,
    /// Inline everything, fetching remote resources
    EmbedAll,
    /// Link everything
    Link,
}

impl From<Mode> for IncludeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Embed => IncludeMode::Embed,
            Mode::EmbedAll => IncludeMode::EmbedAll,
            Mode::Link => IncludeMode::Link,
        }
    }
}

#[derive(Args)]
struct BuildArgs {
    /// Deck root containing slides.json or slides/slide-*.html
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Output HTML file, defaults to <root>/index.html
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stylesheets to include (paths relative to the root, or URLs)
    #[arg(long, value_delimiter = ',')]
    css: Option<Vec<String>>,

    /// Scripts to include (paths relative to the root, or URLs)
    #[arg(long, value_delimiter = ',')]
    js: Option<Vec<String>>,

    /// How stylesheets and scripts are included
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Page title
    #[arg(long)]
    title: Option<String>,
}

#[derive(Args)]
struct ExportArgs {
    /// Destination PDF, defaults to <root>/export.pdf
    output: Option<PathBuf>,

    /// Deck root containing index.html
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Timeout for slides and images to become ready, in milliseconds; waits indefinitely when unset
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Timeout for diagrams to render, in milliseconds; waits indefinitely when unset
    #[arg(long)]
    diagram_timeout_ms: Option<u64>,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    build: BuildArgs,

    /// Serve the deck on a local port while watching
    #[arg(long)]
    serve: bool,

    /// Port for the local server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Debounce time for file change events, in milliseconds
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,
}

fn build_config(config: &Config, args: &BuildArgs) -> slide_deck::BuildConfig {
    config.get_build_config(
        &args.root,
        args.output.clone(),
        args.css.clone(),
        args.js.clone(),
        args.mode.map(IncludeMode::from),
        args.title.clone(),
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match &cli.command {
        Some(Commands::Init { dir }) => slide_deck::init_deck(dir).map(|written| {
            println!("Created deck in {:?} ({} files)", dir, written.len());
        }),
        Some(Commands::Build(args)) => {
            slide_deck::build_deck(&build_config(&config, args)).map(|output| {
                println!("HTML generated successfully: {:?}", output);
            })
        }
        Some(Commands::Export(args)) => {
            let export_config = config.get_export_config(
                &args.root,
                args.output.clone(),
                args.timeout_ms,
                args.diagram_timeout_ms,
            );
            slide_deck::export_pdf(&export_config).map(|output| {
                println!("PDF generated: {}", output.display());
            })
        }
        Some(Commands::Watch(args)) => {
            let mut watch_config = WatchConfig::new(build_config(&config, &args.build));
            watch_config.serve = args.serve;
            watch_config.port = args.port;
            watch_config.debounce_ms = args.debounce_ms;
            slide_deck::watch_deck(watch_config)
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use slide_common::{GenerationOptions, DEFAULT_SLIDE_COUNT, DEFAULT_THEME};
use slide_core::render::read_outline;
use slide_core::{theme, Config, SlideService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub mod server;

#[derive(Parser)]
#[command(name = "slide")]
#[command(about = "Generate PowerPoint decks from free text")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override model (e.g., gpt-4o, gpt-4o-mini)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long)]
        addr: Option<String>,
        /// Answer unknown deck ids with a placeholder deck
        #[arg(long)]
        demo_fallback: bool,
    },
    /// Generate a deck and write it to a .pptx file
    Generate {
        /// Source text
        text: Option<String>,
        /// Read the source text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(short, long, default_value = DEFAULT_THEME)]
        theme: String,
        /// Approximate number of slides
        #[arg(short, long, default_value_t = DEFAULT_SLIDE_COUNT)]
        count: usize,
        /// Output path (defaults to presentation-<id>.pptx)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the deck as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the slide outline of a .pptx written by this tool
    Inspect {
        file: PathBuf,
    },
    /// List the available themes
    Themes,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?
            .with_env(),
        None => Config::load_with_fallback(),
    };
    if let Some(model) = cli.model {
        config.model = model;
    }

    match cli.command {
        Some(Commands::Serve {
            addr,
            demo_fallback,
        }) => {
            if let Some(addr) = addr {
                config.listen_addr = addr;
            }
            config.demo_fallback |= demo_fallback;
            serve(config).await?;
        }
        Some(Commands::Generate {
            text,
            file,
            theme,
            count,
            output,
            json,
        }) => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("pass the source text or --file"),
            };
            let options = GenerationOptions::default()
                .with_theme(theme)
                .with_slide_count(count);
            generate_deck(&config, &text, &options, output, json).await?;
        }
        Some(Commands::Inspect { file }) => {
            inspect(&file).await?;
        }
        Some(Commands::Themes) => {
            list_themes();
        }
        None => {
            // Default to serving the API
            serve(config).await?;
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: Config) -> Result<()> {
    if config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; generation requests will fail");
    }
    let service = Arc::new(SlideService::from_config(&config));
    server::serve(service, &config.listen_addr).await
}

async fn generate_deck(
    config: &Config,
    text: &str,
    options: &GenerationOptions,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let service = SlideService::from_config(config);
    let deck = service.create_deck(text, options).await?;
    let download = service.download_deck(&deck.id).await?;

    let output = output.unwrap_or_else(|| PathBuf::from(&download.filename));
    tokio::fs::write(&output, &download.bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&deck)?);
    } else {
        println!("Generated {} slides ({} theme)", deck.slides.len(), deck.theme);
        for (i, slide) in deck.slides.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, slide.title);
        }
    }
    for skipped in &download.report.skipped {
        eprintln!("skipped slide {}: {}", skipped.index + 1, skipped.reason);
    }
    if let Some(reason) = &download.report.diagnostic {
        eprintln!("deck could not be rendered, wrote a diagnostic deck instead: {reason}");
    }
    println!("Saved to {}", output.display());
    Ok(())
}

async fn inspect(file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let outline = read_outline(&bytes)?;

    println!("{} slides", outline.len());
    for (i, slide) in outline.iter().enumerate() {
        println!("{:>2}. [{:?}] {}", i + 1, slide.layout, slide.title);
        for paragraph in &slide.paragraphs {
            for line in paragraph.lines() {
                println!("      {line}");
            }
        }
    }
    Ok(())
}

fn list_themes() {
    for (name, style) in theme::known_themes() {
        let marker = if name == theme::FALLBACK_THEME {
            " (default)"
        } else {
            ""
        };
        println!(
            "{name:<10} #{} / #{}  {} + {}{marker}",
            style.primary_color, style.secondary_color, style.title_font, style.content_font
        );
    }
}

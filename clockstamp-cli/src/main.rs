//! Clockstamp CLI Tool
//!
//! Command-line interface for stamping the time onto still images and for
//! inspecting or editing the settings the capture plugin uses.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clockstamp_config::{ConfigState, JsonFileStore};
use clockstamp_core::{
    format_caption, FixedClock, HorizontalAlign, LayoutConfig, LocalClock, TimeSource, TimeValue,
    VerticalAlign,
};
use clockstamp_render::{OverlayRenderer, TrueTypeFont, Typeface};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clockstamp")]
#[command(about = "Clockstamp - overlay the wall-clock time onto video frames and images")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the per-user clockstamp settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp the time onto an image file
    Stamp {
        /// Input image path
        input: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Time to stamp, "YYYY-MM-DD HH:MM:SS[.fff]" (defaults to now)
        #[arg(long)]
        at: Option<String>,

        /// TrueType/OpenType font file (defaults to the built-in bitmap font)
        #[arg(long)]
        font: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutOverrides,
    },

    /// Expand a caption template and print the result
    Format {
        /// Caption template, e.g. "&y-&M-&d &h:&m:&s"
        template: String,

        /// Time to format, "YYYY-MM-DD HH:MM:SS[.fff]" (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Show or edit the saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change one setting
    Set {
        key: SettingKey,
        value: String,
    },

    /// Restore the default settings
    Reset,

    /// Print the settings file location
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum SettingKey {
    Margin,
    Align,
    Valign,
    Scale,
    Caption,
}

/// One-off layout overrides; never saved
#[derive(Args)]
struct LayoutOverrides {
    /// Caption template
    #[arg(long)]
    caption: Option<String>,

    /// Horizontal alignment: left, center or right
    #[arg(long)]
    align: Option<HorizontalAlign>,

    /// Vertical alignment: top, middle or bottom
    #[arg(long)]
    valign: Option<VerticalAlign>,

    /// Margin in percent of the image height
    #[arg(long)]
    margin: Option<i32>,

    /// Text size as a fraction of the image height
    #[arg(long)]
    scale: Option<f64>,
}

impl LayoutOverrides {
    fn apply(self, layout: &mut LayoutConfig) {
        if let Some(caption) = self.caption {
            layout.template = caption;
        }
        if let Some(align) = self.align {
            layout.align = align;
        }
        if let Some(valign) = self.valign {
            layout.valign = valign;
        }
        if let Some(margin) = self.margin {
            layout.margin_percent = margin;
        }
        if let Some(scale) = self.scale {
            layout.scale = scale;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Stamp {
            input,
            output,
            at,
            font,
            layout,
        } => stamp_image(cli.config, input, output, at, font, layout)?,

        Commands::Format { template, at } => {
            let time = resolve_time(at.as_deref())?;
            println!("{}", format_caption(&template, &time));
        }

        Commands::Config { action } => run_config(cli.config, action)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_time(at: Option<&str>) -> Result<TimeValue> {
    match at {
        Some(s) => TimeValue::parse(s).with_context(|| format!("Invalid time: {s}")),
        None => Ok(LocalClock.now()),
    }
}

fn open_store(path: Option<PathBuf>) -> Result<JsonFileStore> {
    let path = match path {
        Some(path) => path,
        None => JsonFileStore::default_path().context("Cannot locate the settings directory")?,
    };
    debug!(path = %path.display(), "opening settings");
    JsonFileStore::open(&path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))
}

fn stamp_image(
    config: Option<PathBuf>,
    input: PathBuf,
    output: PathBuf,
    at: Option<String>,
    font: Option<PathBuf>,
    overrides: LayoutOverrides,
) -> Result<()> {
    let store = open_store(config)?;
    let mut layout = LayoutConfig::clone(&ConfigState::load(&store).snapshot());
    overrides.apply(&mut layout);

    let time = resolve_time(at.as_deref())?;
    let typeface = match font {
        Some(path) => Typeface::TrueType(
            TrueTypeFont::load(&path)
                .with_context(|| format!("Failed to load font {}", path.display()))?,
        ),
        None => Typeface::default(),
    };
    let renderer = OverlayRenderer::with_parts(typeface, FixedClock(time));

    let image =
        image::open(&input).with_context(|| format!("Failed to open {}", input.display()))?;
    info!(
        width = image.width(),
        height = image.height(),
        "stamping {}",
        input.display()
    );

    let (caption, stamped) = match image {
        DynamicImage::ImageRgb8(mut buf) => {
            let caption = renderer.render(&mut buf, &layout);
            (caption, DynamicImage::ImageRgb8(buf))
        }
        other => {
            let mut buf = other.into_rgba8();
            let caption = renderer.render(&mut buf, &layout);
            (caption, DynamicImage::ImageRgba8(buf))
        }
    };

    let stamped = if is_jpeg(&output) {
        DynamicImage::ImageRgb8(stamped.into_rgb8())
    } else {
        stamped
    };
    stamped
        .save(&output)
        .with_context(|| format!("Failed to save {}", output.display()))?;

    println!("Stamped \"{}\" onto {}", caption, output.display());
    Ok(())
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

fn run_config(config: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    let mut store = open_store(config)?;

    match action {
        ConfigAction::Show { json } => {
            let state = ConfigState::load(&store);
            let layout = state.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&*layout)?);
            } else {
                print_layout(&layout);
                if let Some(window) = state.window_position() {
                    println!("Window position: {}, {}", window.x, window.y);
                }
            }
        }

        ConfigAction::Set { key, value } => {
            let state = ConfigState::load(&store);
            let mut layout = LayoutConfig::clone(&state.snapshot());
            set_field(&mut layout, key, &value)?;
            state.replace(layout);
            state.save(&mut store).context("Failed to save settings")?;
            print_layout(&state.snapshot());
        }

        ConfigAction::Reset => {
            // Keep the window position, drop everything else including stale keys
            let state = ConfigState::load(&store);
            store.clear();
            state.reset();
            state.save(&mut store).context("Failed to save settings")?;
            println!("Settings reset to defaults");
        }

        ConfigAction::Path => println!("{}", store.path().display()),
    }

    Ok(())
}

fn set_field(layout: &mut LayoutConfig, key: SettingKey, value: &str) -> Result<()> {
    match key {
        SettingKey::Margin => {
            layout.margin_percent = value
                .parse()
                .with_context(|| format!("Invalid margin: {value}"))?;
        }
        SettingKey::Align => layout.align = value.parse()?,
        SettingKey::Valign => layout.valign = value.parse()?,
        SettingKey::Scale => {
            let scale: f64 = value.parse().with_context(|| format!("Invalid scale: {value}"))?;
            anyhow::ensure!(scale.is_finite() && scale > 0.0, "Scale must be positive");
            layout.scale = scale;
        }
        SettingKey::Caption => layout.template = value.to_string(),
    }
    Ok(())
}

fn print_layout(layout: &LayoutConfig) {
    println!("Margin:  {}%", layout.margin_percent);
    println!("Align:   {}", layout.align);
    println!("VAlign:  {}", layout.valign);
    println!("Scale:   {}", layout.scale);
    println!("Caption: {}", layout.template);
}

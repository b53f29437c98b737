//! CLI binary for filedesk.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! `ConversionConfig`, writes results to disk and prints a summary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use filedesk::format::registry;
use filedesk::{
    convert_file, inspect, merge, split, write_output, Accent, BlockError, ConversionConfig,
    ConversionProgressCallback, ConvertedFile, Converter, Format, ProgressCallback, ProgressReporter,
    Settings, SettingsStore, SourceFile, Theme,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn accent(s: &str, a: Accent) -> String {
    format!("\x1b[38;5;{}m{s}\x1b[0m", a.ansi256())
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a percent bar plus a log line for every
/// skipped Word block.
struct CliProgressCallback {
    bar: ProgressBar,
    accent: Accent,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new(accent: Accent) -> Arc<Self> {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.{c}}} {{prefix:.bold}}  [{{bar:42.{c}/238}}] {{pos:>3}}%  {{msg}}  ⏱ {{elapsed_precise}}",
            c = accent.ansi256()
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let bar = ProgressBar::new(100);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            accent,
            skipped: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, operation: &str) {
        self.bar.set_prefix(operation.to_string());
        self.bar.reset_elapsed();
    }

    fn on_progress(&self, percent: u8) {
        self.bar.set_position(percent as u64);
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        self.bar.set_message(format!("{page_num}/{total_pages}"));
    }

    fn on_item_skipped(&self, error: &BlockError) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("⚠"), dim(&error.to_string())));
    }

    fn on_conversion_complete(&self, success: bool) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        if success && skipped > 0 {
            eprintln!(
                "{} done, {} block(s) skipped",
                accent("◆", self.accent),
                bold(&skipped.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Word document to PDF (writes report.pdf next to the input)
  filedesk convert report.docx --to pdf

  # Every page of a PDF as PNG images, zipped, at 3× scale
  filedesk convert scan.pdf --to png --scale 3 -o scan-pages.zip

  # Comma/tab separated text or a JSON array to a workbook
  filedesk convert rows.json --to excel

  # Join PDFs in the given order
  filedesk merge cover.pdf body.pdf appendix.pdf -o book.pdf

  # One file per page, plus pages 1 and 3 combined
  filedesk split book.pdf -o pages/ --select 1,3

  # Page count, size and format of a file
  filedesk inspect book.pdf

  # Show the format table and what converts to what
  filedesk formats

  # Switch to the light theme with a green accent
  filedesk settings --theme light --accent green

SUPPORTED CONVERSIONS:
  pdf   → word, text, jpg, png      word  → pdf
  jpg   → png, pdf                  png   → jpg, pdf
  text  → pdf, excel                json  → excel
  excel → text

ENVIRONMENT VARIABLES:
  FILEDESK_SCALE          Page render scale for PDF → image (0.5–4.0)
  FILEDESK_JPEG_QUALITY   JPEG quality (1–100)
  FILEDESK_NO_PROGRESS    Disable the progress bar
  FILEDESK_VERBOSE        DEBUG-level logs
  FILEDESK_QUIET          Errors only
  FILEDESK_CONFIG_DIR     Directory holding settings.json
  PDFIUM_LIB_PATH         libpdfium file or directory (PDF → image only)
  RUST_LOG                Overrides the log filter entirely
"#;

/// Convert files between PDF, Word, Excel, image and text formats, and merge or split PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "filedesk",
    version,
    about = "Convert files between PDF, Word, Excel, image and text formats, and merge or split PDFs",
    long_about = "Local file conversion: PDF to Word, text or page images; Word, text and images to \
PDF; delimited text and JSON to Excel and back; merging and splitting PDFs. Nothing leaves your \
machine.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Disable progress bar.
    #[arg(long, global = true, env = "FILEDESK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FILEDESK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FILEDESK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one file to another format.
    Convert(ConvertArgs),
    /// Merge two or more PDFs, in the order given.
    Merge(MergeArgs),
    /// Split a PDF into one file per page.
    Split(SplitArgs),
    /// Print size, format and page/sheet count of a file.
    Inspect(InspectArgs),
    /// List known formats and supported conversions.
    Formats,
    /// Show or change the display settings.
    Settings(SettingsArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// File to convert.
    input: PathBuf,

    /// Target format: pdf, word, excel, jpg, png, text.
    #[arg(long, value_parser = parse_format)]
    to: Format,

    /// Source format. Default: inferred from the input extension.
    #[arg(long, value_parser = parse_format)]
    from: Option<Format>,

    /// Output path. Default: the converted name next to the input.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render scale for PDF → image (0.5–4.0).
    #[arg(long, env = "FILEDESK_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// JPEG quality (1–100).
    #[arg(long, env = "FILEDESK_JPEG_QUALITY", default_value_t = 92,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Word → PDF: ignore headings and emphasis, lay out plain paragraphs.
    #[arg(long)]
    plain: bool,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// PDFs to merge (at least two).
    #[arg(required = true, num_args = 2..)]
    inputs: Vec<PathBuf>,

    /// Output path.
    #[arg(short, long, default_value = "merged.pdf")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// PDF to split.
    input: PathBuf,

    /// Directory for page_N.pdf files.
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Also combine these 1-based pages into selected_pages.pdf, e.g. 1,3,5.
    #[arg(long, value_delimiter = ',')]
    select: Vec<usize>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// File to describe.
    input: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// dark or light.
    #[arg(long)]
    theme: Option<String>,

    /// blue, purple, green, orange or red.
    #[arg(long)]
    accent: Option<String>,
}

fn parse_format(s: &str) -> std::result::Result<Format, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already shows what INFO logs would say.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Settings (read once) ─────────────────────────────────────────────
    let store = SettingsStore::default_location().context("Failed to locate settings")?;
    let settings = store.load().unwrap_or_else(|e| {
        warn!("{e}; using default settings");
        Settings::default()
    });

    match cli.command {
        Command::Convert(ref args) => run_convert(args, &cli, &settings).await,
        Command::Merge(ref args) => run_merge(args, &cli, &settings).await,
        Command::Split(ref args) => run_split(args, &cli, &settings).await,
        Command::Inspect(ref args) => run_inspect(args).await,
        Command::Formats => {
            print_formats(&settings);
            Ok(())
        }
        Command::Settings(ref args) => run_settings(args, &store, settings),
    }
}

/// Config builder carrying a fresh progress bar, unless output is quiet or
/// the bar is disabled. Only commands that run a conversion create one.
fn base_config(cli: &Cli, settings: &Settings) -> filedesk::ConversionConfigBuilder {
    let builder = ConversionConfig::builder();
    if cli.quiet || cli.no_progress {
        return builder;
    }
    let cb: ProgressCallback = CliProgressCallback::new(settings.theme_color);
    builder.progress_callback(cb)
}

async fn run_convert(args: &ConvertArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let config = base_config(cli, settings)
        .render_scale(args.scale)
        .jpeg_quality(args.jpeg_quality)
        .preserve_formatting(!args.plain)
        .build()
        .context("Invalid configuration")?;

    let output = convert_file(&args.input, args.from, args.to, &config)
        .await
        .with_context(|| format!("Failed to convert '{}'", args.input.display()))?;

    let path = match args.output {
        Some(ref p) => p.clone(),
        None => sibling(&args.input, &output.file_name),
    };
    write_output(&output, &path)
        .await
        .context("Failed to write output")?;

    if !cli.quiet {
        summary(&output, &path, settings.theme_color);
        // With the bar enabled each skipped block was already printed.
        if cli.no_progress {
            for skipped in &output.stats.skipped {
                eprintln!("  {} {}", yellow("⚠"), dim(&skipped.to_string()));
            }
        }
    }
    Ok(())
}

async fn run_merge(args: &MergeArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let config = base_config(cli, settings).build().context("Invalid configuration")?;

    let mut files = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let file = SourceFile::read(input, &ProgressReporter::silent())
            .await
            .with_context(|| format!("Failed to read '{}'", input.display()))?;
        files.push(file);
    }

    let merged = merge(files, &config).await.context("Merge failed")?;
    write_output(&merged, &args.output)
        .await
        .context("Failed to write merged PDF")?;

    if !cli.quiet {
        summary(&merged, &args.output, settings.theme_color);
    }
    Ok(())
}

async fn run_split(args: &SplitArgs, cli: &Cli, settings: &Settings) -> Result<()> {
    let config = base_config(cli, settings).build().context("Invalid configuration")?;

    let source = SourceFile::read(&args.input, &ProgressReporter::silent())
        .await
        .with_context(|| format!("Failed to read '{}'", args.input.display()))?;
    let mut session = split(source, &config).await.context("Split failed")?;

    for page in session.pages() {
        write_output(page, args.output.join(&page.file_name))
            .await
            .with_context(|| format!("Failed to write {}", page.file_name))?;
    }
    if !cli.quiet {
        eprintln!(
            "{} {} pages  →  {}",
            green("✔"),
            session.page_count(),
            bold(&args.output.display().to_string())
        );
    }

    if !args.select.is_empty() {
        for &page in &args.select {
            if page == 0 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got 0)");
            }
            if !session.is_selected(page - 1) {
                session.toggle(page - 1).context("Invalid --select")?;
            }
        }
        let combined = session
            .combine_selected()
            .context("Failed to combine selected pages")?;
        let path = args.output.join(&combined.file_name);
        write_output(&combined, &path)
            .await
            .context("Failed to write selected pages")?;
        if !cli.quiet {
            summary(&combined, &path, settings.theme_color);
        }
    }
    Ok(())
}

fn run_settings(args: &SettingsArgs, store: &SettingsStore, mut settings: Settings) -> Result<()> {
    let mut changed = false;
    if let Some(ref theme) = args.theme {
        settings.theme = theme.parse::<Theme>()?;
        changed = true;
    }
    if let Some(ref color) = args.accent {
        settings.theme_color = color.parse::<Accent>()?;
        changed = true;
    }
    if changed {
        store.save(&settings).context("Failed to save settings")?;
    }

    println!("Settings:  {}", dim(&store.path().display().to_string()));
    println!("Theme:     {}", settings.theme);
    println!(
        "Accent:    {}  {}",
        accent(settings.theme_color.as_str(), settings.theme_color),
        dim(&format!("hsl({})", settings.theme_color.hsl()))
    );
    Ok(())
}

fn print_formats(settings: &Settings) {
    println!("{}", bold("FORMATS"));
    for d in registry() {
        println!(
            "  {:<11} {:<12} {:<14} {}",
            accent(d.id.id(), settings.theme_color),
            d.display_name,
            d.accepted_extensions.join(" "),
            dim(d.mime_type)
        );
    }
    println!();
    println!("{}", bold("CONVERSIONS"));
    for from in Format::ALL {
        let targets = Converter::targets(from);
        if targets.is_empty() {
            continue;
        }
        let names: Vec<&str> = targets.iter().map(|t| t.id()).collect();
        println!("  {:<6} → {}", from.id(), names.join(", "));
    }
}

fn summary(output: &ConvertedFile, path: &Path, a: Accent) {
    let mut detail = format!("{} bytes", output.len());
    if output.stats.pages > 0 {
        detail.push_str(&format!(", {} pages", output.stats.pages));
    }
    eprintln!(
        "{}  {}  {}ms  →  {}",
        accent("✔", a),
        dim(&detail),
        output.stats.duration_ms,
        bold(&path.display().to_string()),
    );
    if output.stats.skipped_items > 0 {
        eprintln!("   {} skipped block(s)", red(&output.stats.skipped_items.to_string()));
    }
}

/// `name` in the same directory as `input`.
fn sibling(input: &Path, name: &str) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

async fn run_inspect(args: &InspectArgs) -> Result<()> {
    let info = inspect(&args.input).await.context("Failed to inspect file")?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&info).context("Failed to serialize file info")?
        );
        return Ok(());
    }
    println!("File:         {}", info.file_name);
    println!("Size:         {} bytes", info.size_bytes);
    match info.format {
        Some(f) => println!("Format:       {}", f.descriptor().display_name),
        None => println!("Format:       unknown"),
    }
    if let Some(parts) = info.parts {
        let label = if info.format == Some(Format::Excel) { "Sheets" } else { "Pages" };
        println!("{:<14}{}", format!("{label}:"), parts);
    }
    if let Some((w, h)) = info.dimensions {
        println!("Dimensions:   {w}×{h} px");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> (Cli, Settings) {
        let cli = Cli::try_parse_from(args).unwrap();
        (cli, Settings::default())
    }

    #[test]
    fn convert_config_carries_a_bar() {
        let (cli, settings) = parse(&["filedesk", "convert", "a.pdf", "--to", "text"]);
        let config = base_config(&cli, &settings).build().unwrap();
        assert!(config.progress_callback.is_some());
    }

    #[test]
    fn disabled_or_quiet_config_has_no_bar() {
        for args in [
            &["filedesk", "--no-progress", "merge", "a.pdf", "b.pdf"][..],
            &["filedesk", "-q", "split", "a.pdf"][..],
        ] {
            let (cli, settings) = parse(args);
            let config = base_config(&cli, &settings).build().unwrap();
            assert!(config.progress_callback.is_none(), "{args:?}");
        }
    }
}

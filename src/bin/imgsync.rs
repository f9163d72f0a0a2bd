//! CLI binary for vault-imgsync.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vault_imgsync::{
    parse_skip_list, process, ConflictMode, DefaultImageProcessor, FsVault, Outcome, OutputFormat,
    ProcessConfig, ProgressCallback, ResizeMode, RunProgressCallback, ScalePolicy, Scope,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-target
/// log lines using [indicatif]. The bar length is set in `on_run_start`
/// once the scan knows the total.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Collecting image references…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total} image(s)…"))
        ));
    }

    fn on_target_start(&self, _index: usize, _total: usize, path: &str) {
        self.bar.set_message(path.to_string());
    }

    fn on_target_done(&self, index: usize, total: usize, path: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Converted | Outcome::ConvertedInPlace => {
                self.bar
                    .println(format!("  {} {:>3}/{:<3}  {path}", green("✓"), index, total));
            }
            Outcome::SkippedByFilter(reason) => {
                self.bar.println(format!(
                    "  {} {:>3}/{:<3}  {path}  {}",
                    dim("–"),
                    index,
                    total,
                    dim(&format!("skipped ({reason:?})"))
                ));
            }
            // The error line was already printed by on_target_error.
            Outcome::SkippedByError => {}
        }
        self.bar.inc(1);
    }

    fn on_target_error(&self, index: usize, total: usize, path: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {path}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
    }

    fn on_run_complete(&self, processed: usize, elapsed_secs: f64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} image(s) processed in {:.1}s",
            green("✔"),
            bold(&processed.to_string()),
            elapsed_secs
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every image the whole vault references to webp
  imgsync ~/vault --all --format webp

  # One note, links rewritten in that note only
  imgsync ~/vault --note "daily/2024-01-01.md" --format webp --quality 0.8

  # A folder of images (no link rewriting), capped at 1600px
  imgsync ~/vault --folder attachments --recursive --resize longest:1600

  # Re-encode in place without converting formats
  imgsync ~/vault --all --format keep --quality 0.7

  # Skip gifs and files already in the target format
  imgsync ~/vault --all --format webp --skip-formats gif --skip-if-target-format

RESIZE SPECS:
  none            keep dimensions (default)
  width:800       exact width, height proportional
  height:600      exact height, width proportional
  longest:1600    longer side becomes 1600
  shortest:800    shorter side becomes 800
  fit:800x600     fit within 800x600, aspect preserved
"#;

/// Convert, resize, and rename a vault's images, keeping links in sync.
#[derive(Parser, Debug)]
#[command(
    name = "imgsync",
    version,
    about = "Convert a vault's images and rewrite the links that point at them",
    long_about = "Batch-convert the images a note vault references — one note, one folder, or \
the whole collection — renaming files safely and rewriting every referring note and canvas \
document. Individual failures never abort the batch.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("scope").required(true).args(["note", "folder", "all"]))
)]
struct Cli {
    /// Vault root directory.
    vault: PathBuf,

    /// Process the images referenced by one note (vault-relative path).
    #[arg(long)]
    note: Option<String>,

    /// Process the image files under one folder (vault-relative path).
    #[arg(long)]
    folder: Option<String>,

    /// Recurse into subfolders (with --folder).
    #[arg(long, requires = "folder")]
    recursive: bool,

    /// Process every image referenced anywhere in the vault.
    #[arg(long)]
    all: bool,

    /// Output format: webp, jpg, png, or keep (no conversion).
    #[arg(long, default_value = "keep")]
    format: String,

    /// Quality multiplier, 0.0–1.0.
    #[arg(short, long, default_value_t = 0.75)]
    quality: f32,

    /// Resize spec: none, width:N, height:N, longest:N, shortest:N, fit:WxH.
    #[arg(long, default_value = "none")]
    resize: String,

    /// Resize direction policy.
    #[arg(long, value_enum, default_value = "auto")]
    scale_policy: ScalePolicyArg,

    /// Comma-separated list of extensions to never touch (e.g. "gif,svg").
    #[arg(long, default_value = "")]
    skip_formats: String,

    /// Skip images whose extension already matches the target format.
    #[arg(long)]
    skip_if_target_format: bool,

    /// Destination-name conflicts: increment (a-1.webp) or reuse.
    #[arg(long, value_enum, default_value = "increment")]
    conflict: ConflictArg,

    /// Output the full run report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ScalePolicyArg {
    Auto,
    ReduceOnly,
    EnlargeOnly,
}

impl From<ScalePolicyArg> for ScalePolicy {
    fn from(v: ScalePolicyArg) -> Self {
        match v {
            ScalePolicyArg::Auto => ScalePolicy::Auto,
            ScalePolicyArg::ReduceOnly => ScalePolicy::ReduceOnly,
            ScalePolicyArg::EnlargeOnly => ScalePolicy::EnlargeOnly,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ConflictArg {
    Increment,
    Reuse,
}

impl From<ConflictArg> for ConflictMode {
    fn from(v: ConflictArg) -> Self {
        match v {
            ConflictArg::Increment => ConflictMode::Increment,
            ConflictArg::Reuse => ConflictMode::Reuse,
        }
    }
}

/// Parse a `--resize` spec.
fn parse_resize(spec: &str) -> Result<ResizeMode> {
    if spec.eq_ignore_ascii_case("none") {
        return Ok(ResizeMode::None);
    }
    let Some((kind, value)) = spec.split_once(':') else {
        bail!("invalid resize spec '{spec}' (expected e.g. width:800 or fit:800x600)");
    };
    let parse_px = |s: &str| -> Result<u32> {
        s.parse::<u32>()
            .with_context(|| format!("invalid pixel value '{s}' in resize spec '{spec}'"))
    };
    match kind.to_ascii_lowercase().as_str() {
        "width" => Ok(ResizeMode::Width(parse_px(value)?)),
        "height" => Ok(ResizeMode::Height(parse_px(value)?)),
        "longest" => Ok(ResizeMode::LongestEdge(parse_px(value)?)),
        "shortest" => Ok(ResizeMode::ShortestEdge(parse_px(value)?)),
        "fit" => {
            let Some((w, h)) = value.split_once('x') else {
                bail!("invalid fit spec '{spec}' (expected fit:WxH)");
            };
            Ok(ResizeMode::Fit {
                width: parse_px(w)?,
                height: parse_px(h)?,
            })
        }
        other => bail!("unknown resize kind '{other}' in '{spec}'"),
    }
}

fn scope_from_cli(cli: &Cli) -> Scope {
    if let Some(ref note) = cli.note {
        Scope::Note(note.clone())
    } else if let Some(ref folder) = cli.folder {
        Scope::Folder {
            path: folder.clone(),
            recursive: cli.recursive,
        }
    } else {
        Scope::Collection
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if !cli.vault.is_dir() {
        bail!("vault root is not a directory: {}", cli.vault.display());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let format: OutputFormat = cli
        .format
        .parse()
        .with_context(|| format!("invalid --format '{}'", cli.format))?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let mut builder = ProcessConfig::builder()
        .format(format)
        .quality(cli.quality)
        .resize(parse_resize(&cli.resize)?)
        .scale_policy(cli.scale_policy.clone().into())
        .skip_formats(parse_skip_list(&cli.skip_formats))
        .skip_if_target_format(cli.skip_if_target_format)
        .conflict_mode(cli.conflict.clone().into());
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let vault = FsVault::new(&cli.vault);
    let scope = scope_from_cli(&cli);
    let report = process(&vault, &DefaultImageProcessor, &scope, &config)
        .await
        .context("Processing run failed")?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialise run report")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &report.stats;
        eprintln!(
            "{}  {}/{} processed  {} renamed  {} link(s) rewritten in {} doc(s)  {}ms",
            if stats.skipped_by_error == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed,
            stats.total_targets,
            stats.renamed,
            stats.links_rewritten,
            stats.documents_rewritten,
            stats.duration_ms,
        );
        if stats.skipped_by_filter + stats.skipped_by_error > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} skipped by filter, {} skipped after errors",
                    stats.skipped_by_filter, stats.skipped_by_error
                ))
            );
        }
    }

    Ok(())
}

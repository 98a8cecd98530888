use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coverforge::{Configuration, CoverSession, FieldUpdate, SessionSettings};

#[derive(Parser, Debug)]
#[command(name = "coverforge", version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the card as a high-resolution PNG.
    Export(ExportArgs),
    /// Render the scaled preview for a given viewport width.
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct CardArgs {
    /// Card configuration JSON (camelCase keys, missing keys take defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Background image; switches the card to image mode.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Custom font file (TTF/OTF); becomes the active family.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Field override as `key=value`; the value is parsed as JSON, falling back to a string.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    sets: Vec<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    card: CardArgs,

    /// Directory the artifact is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Export scale relative to 1280x720 (overrides COVERFORGE_EXPORT_QUALITY).
    #[arg(long)]
    quality: Option<f64>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    card: CardArgs,

    /// Available display width in pixels.
    #[arg(long)]
    width: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Command::Export(args) => cmd_export(args).await,
        Command::Preview(args) => cmd_preview(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut settings = SessionSettings::from_env();
    if let Some(q) = args.quality {
        settings.export_quality = q;
    }
    let session = open_session(settings, &args.card).await?;

    let artifact = session.request_export().await?;
    let path = artifact.write_to_dir(&args.out_dir)?;
    println!(
        "wrote {} ({}x{})",
        path.display(),
        artifact.width,
        artifact.height
    );
    Ok(())
}

async fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let session = open_session(SessionSettings::from_env(), &args.card).await?;
    let scale = session.resize_viewport(args.width)?;

    let frame = session.render_preview().await?;
    let png = frame.encode_png()?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write preview '{}'", args.out.display()))?;
    println!(
        "wrote {} ({}x{}, scale {scale})",
        args.out.display(),
        frame.width,
        frame.height
    );
    Ok(())
}

async fn open_session(settings: SessionSettings, card: &CardArgs) -> anyhow::Result<CoverSession> {
    let cfg = match &card.config {
        Some(path) => Configuration::from_path(path)?,
        None => Configuration::default(),
    };
    let session = CoverSession::with_config(settings, cfg)?;

    if let Some(path) = &card.background {
        session.upload_background_image(read_file(path)?)?;
    }
    if let Some(path) = &card.font {
        let font = session.upload_font(read_file(path)?).await?;
        tracing::info!(name = %font.name, family = %font.family, "using uploaded font");
    }

    let updates = card
        .sets
        .iter()
        .map(|kv| parse_set(kv))
        .collect::<anyhow::Result<Vec<_>>>()?;
    if !updates.is_empty() {
        session.update_fields(updates)?;
    }
    Ok(session)
}

fn parse_set(kv: &str) -> anyhow::Result<FieldUpdate> {
    let (key, raw) = kv
        .split_once('=')
        .with_context(|| format!("--set expects KEY=VALUE, got '{kv}'"))?;
    let key = key.trim();
    let as_string = serde_json::Value::String(raw.to_owned());
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => FieldUpdate::from_key_value(key, value)
            .or_else(|_| FieldUpdate::from_key_value(key, as_string)),
        Err(_) => FieldUpdate::from_key_value(key, as_string),
    }
    .with_context(|| format!("invalid --set '{kv}'"))
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt};

/// Overlay each case's skeleton on its warped image, screenshot it, and write an
/// HTML summary of all cases.
#[derive(Parser, Debug)]
#[command(name = "skelqc", version)]
struct Cli {
    /// Study output directory; results are read from and written to its --modality subdirectory.
    #[arg(short = 'd', long = "dir")]
    dir: PathBuf,

    /// Modality subdirectory (FA, MD, AD, RD, ...).
    #[arg(short = 'm', long, default_value = "FA")]
    modality: String,

    /// Case list used to label screenshots [default: <dir>/log/caselist.txt].
    #[arg(short = 'c', long)]
    caselist: Option<PathBuf>,

    /// Number of render workers; reduce if the machine becomes sluggish or runs out of memory.
    #[arg(short = 'n', long, default_value_t = 4)]
    ncpu: usize,

    /// View coordinate: enigma, fmrib, auto, or comma-separated millimetres without spaces (1,-19,14).
    #[arg(
        long = "cut-coords",
        alias = "cut_coords",
        default_value = "auto",
        allow_hyphen_values = true
    )]
    cut_coords: String,

    /// Volume file extension.
    #[arg(long, default_value = "nii.gz")]
    image_ext: String,

    /// How volumes are assigned to cases.
    #[arg(long, value_enum, default_value_t = PairingChoice::ByCase)]
    pairing: PairingChoice,

    /// Still write a report of the rendered cases when some fail (the run still exits non-zero).
    #[arg(long)]
    keep_going: bool,

    /// Engine spec JSON: {"program": "...", "args": ["{fg}", "{bg}", "{coords}", "{out}"]}.
    #[arg(long, conflicts_with = "engine_program")]
    engine: Option<PathBuf>,

    /// Render program, run once per case.
    #[arg(long)]
    engine_program: Option<String>,

    /// Render program argument; placeholders {fg} {bg} {out} {coords} {case}. Repeatable.
    #[arg(long = "engine-arg", allow_hyphen_values = true, requires = "engine_program")]
    engine_args: Vec<String>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PairingChoice {
    ByCase,
    Positional,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let engine = make_engine(&cli)?;
    engine.ensure_available()?;

    let config = make_config(cli);
    let done = skelqc::run_pipeline(&config, &engine)?;

    eprintln!("wrote {}", done.report_path.display());
    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match format {
        LogFormat::Compact => builder.compact().with_target(false).try_init(),
        LogFormat::Json => builder.json().with_target(true).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn make_engine(cli: &Cli) -> anyhow::Result<skelqc::CommandEngine> {
    let spec = match (&cli.engine, &cli.engine_program) {
        (Some(path), _) => skelqc::EngineSpec::from_json_file(path)?,
        (None, Some(program)) => skelqc::EngineSpec {
            program: program.clone(),
            args: cli.engine_args.clone(),
        },
        (None, None) => {
            anyhow::bail!("no render engine given; pass --engine <spec.json> or --engine-program")
        }
    };
    skelqc::CommandEngine::new(spec).context("invalid render engine")
}

fn make_config(cli: Cli) -> skelqc::QcConfig {
    let mut config = skelqc::QcConfig::new(cli.dir);
    config.modality = cli.modality;
    config.cases_path = cli.caselist;
    config.workers = cli.ncpu;
    config.cut_coords = cli.cut_coords;
    config.layout.image_ext = cli.image_ext;
    config.pairing = match cli.pairing {
        PairingChoice::ByCase => skelqc::PairingMode::ByCase,
        PairingChoice::Positional => skelqc::PairingMode::Positional,
    };
    config.on_failure = if cli.keep_going {
        skelqc::FailurePolicy::Partial
    } else {
        skelqc::FailurePolicy::Abort
    };
    config
}

//! stronghold-vision CLI: run the target pipeline over still images.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use stronghold_vision::core::Frame;
use stronghold_vision::link::{decode_payload, TelemetryBlock, TelemetryChannel, TELEMETRY_LEN};
use stronghold_vision::{
    frame_from_rgb, CollaboratorError, CycleOutcome, Pipeline, PipelineConfig, TargetKind,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "stronghold-vision")]
#[command(about = "Detect tower and ball targets in frames and print the encoded payloads")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once per frame and print each payload as hex.
    Run(RunArgs),

    /// Print the default configuration as JSON.
    PrintConfig {
        #[arg(long, value_enum, default_value_t = TargetArg::Tower)]
        target: TargetArg,
    },

    /// Decode a hex payload back into its values and telemetry.
    Decode {
        #[arg(long, value_enum)]
        target: TargetArg,

        /// Payload bytes as hex.
        payload: String,
    },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// JSON pipeline config. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the target type from the config.
    #[arg(long, value_enum)]
    target: Option<TargetArg>,

    /// Telemetry block published before every frame (16 hex digits).
    #[arg(long, default_value = "0000000000000000")]
    telemetry: String,

    /// Write annotated frames into this directory.
    #[arg(long)]
    display: Option<PathBuf>,

    /// Image files processed in order.
    #[arg(required = true)]
    frames: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    Tower,
    Ball,
}

impl From<TargetArg> for TargetKind {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Tower => TargetKind::Tower,
            TargetArg::Ball => TargetKind::Ball,
        }
    }
}

fn init_logging(verbose: u8) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbose;
        stronghold_vision::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        };
        let _ = stronghold_vision::core::init_with_level(level);
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run_frames(&args),
        Commands::PrintConfig { target } => run_print_config(target.into()),
        Commands::Decode { target, payload } => run_decode(target.into(), &payload),
    }
}

// ── hex ───────────────────────────────────────────────────────────────

fn parse_hex(s: &str) -> CliResult<Vec<u8>> {
    let s = s.trim().trim_start_matches("0x").trim_start_matches("0X");
    if s.len() % 2 != 0 {
        return Err(format!("hex string has odd length {}", s.len()).into());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| -> CliError { format!("invalid hex at offset {i}").into() })
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn parse_telemetry(s: &str) -> CliResult<TelemetryBlock> {
    let bytes = parse_hex(s)?;
    TelemetryBlock::try_from(bytes.as_slice()).map_err(|_| -> CliError {
        format!(
            "telemetry must be {TELEMETRY_LEN} bytes, got {}",
            bytes.len()
        )
        .into()
    })
}

// ── print-config ──────────────────────────────────────────────────────

fn run_print_config(target: TargetKind) -> CliResult<()> {
    let cfg = PipelineConfig::for_target(target);
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

// ── decode ────────────────────────────────────────────────────────────

fn run_decode(target: TargetKind, payload: &str) -> CliResult<()> {
    let cfg = PipelineConfig::for_target(target);
    let bytes = parse_hex(payload)?;
    let decoded = decode_payload(&cfg.layout(), &bytes)?;
    println!("target:    {target}");
    println!("values:    {:?}", decoded.values);
    println!("telemetry: {}", to_hex(&decoded.telemetry));
    Ok(())
}

// ── run ───────────────────────────────────────────────────────────────

fn run_frames(args: &RunArgs) -> CliResult<()> {
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(target) = args.target {
        cfg.target = target.into();
    }
    if let Some(dir) = &args.display {
        cfg.display.enabled = true;
        cfg.display.output_dir = Some(dir.clone());
    }
    let block = parse_telemetry(&args.telemetry)?;

    let mut paths = args.frames.clone().into_iter();
    let source = move || -> Result<Frame, CollaboratorError> {
        let path = paths.next().ok_or("no frames left")?;
        log::info!("loading {}", path.display());
        let img = image::open(&path)?.to_rgb8();
        frame_from_rgb(&img).map_err(Into::into)
    };

    let telemetry = Arc::new(TelemetryChannel::new());
    let (tx, rx) = mpsc::channel();
    let mut pipeline = Pipeline::new(&cfg, Arc::clone(&telemetry), source, tx)?;

    for path in &args.frames {
        telemetry.publish(block);
        let report = pipeline.run_cycle()?;
        match report.outcome {
            CycleOutcome::Transmitted => {
                let payload = rx.recv()?;
                println!("{}", to_hex(&payload));
            }
            other => {
                return Err(format!("{}: cycle ended with {other:?}", path.display()).into());
            }
        }
    }
    telemetry.close();
    Ok(())
}

//! qrcond: drain the kernel log onto the screen as QR symbols.
//!
//! Usage:
//!   qrcond [--config PATH] [--from FILE] [--example-config]
//!
//! Without `--from`, the current kernel ring is read from /dev/kmsg, which
//! needs root. `--from` replays a saved log in /dev/kmsg record format,
//! handy for testing without privileges.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use qrcon_core::{DrainStats, FrameFitter, LogDrainer, Version};
use qrcon_fb::config::QrconConfig;
use qrcon_fb::error::{FbError, FbResult};
use qrcon_fb::framebuffer::Framebuffer;
use qrcon_fb::kmsg::{self, HistoryBuffer};
use qrcon_fb::logging::init_logging;
use qrcon_fb::render::ScreenRenderer;

struct Args {
    config_path: Option<PathBuf>,
    replay_path: Option<PathBuf>,
    example_config: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config_path: None,
        replay_path: None,
        example_config: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let path = it.next().ok_or("--config needs a path")?;
                args.config_path = Some(PathBuf::from(path));
            }
            "--from" => {
                let path = it.next().ok_or("--from needs a path")?;
                args.replay_path = Some(PathBuf::from(path));
            }
            "--example-config" => args.example_config = true,
            "--help" | "-h" => {
                return Err("usage: qrcond [--config PATH] [--from FILE] [--example-config]".into())
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn run(config: &QrconConfig, replay: Option<&PathBuf>) -> FbResult<DrainStats> {
    config.validate()?;

    let mut history = HistoryBuffer::new(config.capture.history_max_bytes);
    let records = match replay {
        Some(path) => kmsg::collect_from_reader(BufReader::new(File::open(path)?), &mut history)?,
        None => kmsg::collect_from_device(&mut history)?,
    };
    info!(records, bytes = history.len(), "kernel log captured");
    if history.is_empty() {
        info!("nothing to render");
        return Ok(DrainStats::default());
    }

    let mut fb = Framebuffer::open(&config.framebuffer.device)?;

    let version = Version::new(config.qr.version)
        .ok_or_else(|| FbError::Config(format!("invalid version {}", config.qr.version)))?;
    let fitter = FrameFitter::new(version, config.compression.level)?;

    let mut data = vec![0u8; qrcon_core::MIN_IMAGE_BUF];
    let mut tmp = vec![0u8; qrcon_core::MIN_MSG_BUF];
    let mut drainer = LogDrainer::new(fitter, &mut data, &mut tmp)?;
    let mut sink = ScreenRenderer::new(&mut fb, config.qr.clone());

    Ok(drainer.drain(history.as_bytes(), &mut sink)?)
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    if args.example_config {
        print!("{}", QrconConfig::example_yaml());
        return ExitCode::SUCCESS;
    }

    let config = match args.config_path {
        Some(ref path) => QrconConfig::load_from(path),
        None => QrconConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("qrcond: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging);

    match run(&config, args.replay_path.as_ref()) {
        Ok(stats) => {
            info!(
                symbols = stats.symbols,
                consumed = stats.consumed,
                skipped = stats.skipped,
                "drain finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("qrcond failed: {e}");
            ExitCode::FAILURE
        }
    }
}

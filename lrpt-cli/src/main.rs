mod logging;
mod net;

use clap::Parser;
use color_eyre::eyre::{Context, Result};

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use logging::{LogEvent, LogFormat, StatusEvent, StructuredLogger, SummaryEvent};
use lrpt_core::config::Mode;
use lrpt_core::driver::Demodulator;
use lrpt_core::source::SampleSource;
use net::TcpBroadcaster;
use std::path::PathBuf;
use std::time::Duration;

/// Meteor-M2 LRPT downlink symbol-layer demodulator.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Meteor-M2 LRPT demodulator",
    long_about = None,
    disable_version_flag = true
)]
struct Cli {
    /// Print version info
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version_flag: (),

    /// Input I/Q capture (WAV, or raw with -s/--bps supplied)
    input: PathBuf,

    /// Output file for decoded soft symbols (default: LRPT_YYYY_MM_DD-HH_MM.s)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Symbol rate, accepts k/M suffixes (default: 72000)
    #[arg(short = 'r', long = "symrate")]
    symbol_rate: Option<String>,

    /// Force input samplerate, treating input as raw (Hz, k/M suffixes)
    #[arg(short = 's', long = "samplerate")]
    samplerate: Option<String>,

    /// Force input bits-per-sample, treating input as raw (8 or 16)
    #[arg(long = "bps")]
    bps: Option<u16>,

    /// Modulation mode
    #[arg(short = 'm', long = "mode", default_value = "qpsk")]
    mode: String,

    /// Costas loop bandwidth in Hz (default: 100)
    #[arg(short = 'b', long = "pll-bw", default_value_t = 100.0)]
    pll_bw: f64,

    /// RRC filter roll-off alpha (default: 0.6)
    #[arg(short = 'a', long = "alpha", default_value_t = 0.6)]
    alpha: f64,

    /// RRC filter order (default: 64)
    #[arg(short = 'f', long = "fir-order", default_value_t = 64)]
    fir_order: usize,

    /// Interpolation factor (default: 4)
    #[arg(short = 'O', long = "oversamp", default_value_t = 4)]
    oversamp: usize,

    /// UI refresh interval in milliseconds (default: 50)
    #[arg(short = 'R', long = "refresh-ms", default_value_t = 50)]
    refresh_ms: u64,

    /// Suppress status output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Log output format
    #[arg(long = "log-format", default_value = "pretty")]
    log_format: String,

    /// Enable TCP streaming of the output symbol stream
    #[arg(short = 'n', long = "net")]
    net_enabled: bool,

    /// TCP listen port for streaming (0 = OS-assigned); implies -n
    #[arg(short = 'p', long = "port")]
    net_port: Option<u16>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let log_format: LogFormat = args
        .log_format
        .parse()
        .map_err(|e: String| color_eyre::eyre::eyre!(e))?;
    let mut logger = StructuredLogger::new(log_format, args.quiet);

    let mode = Mode::parse(&args.mode)
        .ok_or_else(|| color_eyre::eyre::eyre!("unknown mode: {}", args.mode))?;

    let symbol_rate = match &args.symbol_rate {
        Some(s) => lrpt_core::utils::dehumanize(s)
            .ok_or_else(|| color_eyre::eyre::eyre!("invalid symbol rate: {s}"))? as f64,
        None => 72_000.0,
    };

    let output_path = args.output.clone().unwrap_or_else(default_output_path);
    let net_enabled = args.net_enabled || args.net_port.is_some();

    if args.output.is_none() && !net_enabled {
        logger.log(LogEvent::Warn {
            message: format!(
                "no -o supplied; writing decoded symbols to {}",
                output_path.display()
            ),
        })?;
    }

    let source = open_source(&args)?;

    logger.log(LogEvent::Info {
        message: format!(
            "demodulating {} ({} mode, symrate {:.0})",
            args.input.display(),
            mode,
            symbol_rate
        ),
    })?;

    let mut demod = Demodulator::init(
        source,
        args.oversamp,
        args.fir_order,
        args.alpha,
        args.pll_bw,
        symbol_rate,
        mode,
    )
    .wrap_err("invalid demodulator configuration")?;

    // Keep the broadcaster alive for the run's duration; the sink closure
    // holds its own clone so the demodulator worker can call it directly.
    let _broadcaster = if net_enabled {
        let (b, port) = TcpBroadcaster::spawn(args.net_port.unwrap_or(0))
            .wrap_err("failed to start TCP listener")?;
        logger.log(LogEvent::Info {
            message: format!("streaming soft symbols on tcp/{port}"),
        })?;
        let b = std::sync::Arc::new(b);
        let sink_handle = std::sync::Arc::clone(&b);
        demod = demod.with_chunk_sink(std::sync::Arc::new(move |bytes: &[u8]| {
            sink_handle.queue_send(bytes);
        }));
        Some(b)
    } else {
        None
    };

    demod
        .start(&output_path)
        .wrap_err_with(|| format!("failed to start demodulator writing to {}", output_path.display()))?;

    let bar = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new(demod.size().max(1));
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    };

    while demod.status() {
        std::thread::sleep(Duration::from_millis(args.refresh_ms));

        let done = demod.done();
        let size = demod.size();
        let freq = demod.freq();
        let gain = demod.gain();
        let locked = demod.locked();

        if let Some(pb) = &bar {
            pb.set_length(size.max(1));
            pb.set_position(done.min(size.max(1)));
            pb.set_message(format!(
                "{:+.1} Hz | gain {:.2} | {}",
                freq,
                gain,
                if locked { "LOCKED" } else { "searching" }
            ));
        }

        logger.log(LogEvent::Status(StatusEvent {
            timestamp: chrono::Utc::now(),
            done,
            size,
            freq_hz: freq,
            gain,
            locked,
        }))?;
    }

    if let Some(pb) = &bar {
        pb.finish_and_clear();
    }

    let final_freq = demod.freq();
    let final_locked = demod.locked();
    let final_done = demod.done();

    match demod.join() {
        Ok(()) => {
            logger.log(LogEvent::Summary(SummaryEvent {
                duration_secs: logger.elapsed(),
                symbols_written: final_done,
                final_freq_hz: final_freq,
                final_locked,
            }))?;
            Ok(())
        }
        Err(e) => {
            logger.log(LogEvent::Error {
                message: e.to_string(),
            })?;
            Err(color_eyre::eyre::eyre!(e)).wrap_err("demodulation failed")
        }
    }
}

fn open_source(args: &Cli) -> Result<SampleSource> {
    if let Some(bps) = args.bps {
        let samplerate = match &args.samplerate {
            Some(s) => lrpt_core::utils::dehumanize(s)
                .ok_or_else(|| color_eyre::eyre::eyre!("invalid samplerate: {s}"))?,
            None => return Err(color_eyre::eyre::eyre!("--bps requires -s/--samplerate")),
        };
        Ok(SampleSource::open_raw(&args.input, samplerate as u32, bps)?)
    } else if let Some(s) = &args.samplerate {
        let samplerate = lrpt_core::utils::dehumanize(s)
            .ok_or_else(|| color_eyre::eyre::eyre!("invalid samplerate: {s}"))?;
        Ok(SampleSource::open_raw(&args.input, samplerate as u32, 16)?)
    } else {
        Ok(SampleSource::open_wav(&args.input)?)
    }
}

/// Generate a default output filename `LRPT_YYYY_MM_DD-HH_MM.s`, a literal
/// port of `gen_fname()` from the reference implementation.
fn default_output_path() -> PathBuf {
    PathBuf::from(Local::now().format("LRPT_%Y_%m_%d-%H_%M.s").to_string())
}

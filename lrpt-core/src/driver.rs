//! The demodulator driver: owns the stage chain and the single worker
//! thread, and publishes read-only observability atomics to the controller.

use crate::config::{DemodConfig, Mode};
use crate::dsp::{Agc, CostasLoop, InterpolatingFilter, TimingRecovery};
use crate::errors::{DemodError, Result};
use crate::logging::{LogConfig, SignalLogger};
use crate::source::SampleSource;
use crate::symbol::SoftSymbol;
use crate::writer::SymbolWriter;

use atomic_float::AtomicF32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Default number of input samples pulled per worker iteration. Output
/// atomics are published at most once per chunk, per the concurrency model.
pub const DEFAULT_CHUNK: usize = 8192;

/// Cross-thread, read-only observability state. The worker is the sole
/// writer; the controller only ever loads these.
struct DemodShared {
    done: AtomicU64,
    size: AtomicU64,
    freq_hz: AtomicF32,
    gain: AtomicF32,
    locked: AtomicBool,
    running: AtomicBool,
    stop: AtomicBool,
    error: Mutex<Option<DemodError>>,
}

impl DemodShared {
    fn new(size: u64) -> Self {
        Self {
            done: AtomicU64::new(0),
            size: AtomicU64::new(size),
            freq_hz: AtomicF32::new(0.0),
            gain: AtomicF32::new(0.0),
            locked: AtomicBool::new(false),
            running: AtomicBool::new(true),
            stop: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }
}

/// Owns the DSP stage chain and the worker thread running it. Constructed
/// once via [`Demodulator::init`], started via [`Demodulator::start`]; all
/// stage state is destroyed when [`Demodulator::join`] returns.
pub struct Demodulator {
    config: DemodConfig,
    source: Option<SampleSource>,
    shared: Arc<DemodShared>,
    handle: Option<JoinHandle<()>>,
    chunk: usize,
    chunk_sink: Option<Arc<dyn Fn(&[u8]) + Send + Sync>>,
}

impl Demodulator {
    /// Construct the stage chain from validated configuration. Does not
    /// start any work; configuration errors are returned synchronously,
    /// before any thread exists.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        source: SampleSource,
        interp_factor: usize,
        rrc_order: usize,
        rrc_alpha: f64,
        costas_bw_hz: f64,
        symbol_rate: f64,
        mode: Mode,
    ) -> Result<Self> {
        let config = DemodConfig {
            symbol_rate,
            interp_factor,
            rrc_order,
            rrc_alpha,
            costas_bw_hz,
            mode,
            ..DemodConfig::default()
        };
        config.validate()?;

        let size = source.size();
        Ok(Self {
            config,
            source: Some(source),
            shared: Arc::new(DemodShared::new(size)),
            handle: None,
            chunk: DEFAULT_CHUNK,
            chunk_sink: None,
        })
    }

    pub fn with_chunk_size(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Register a callback invoked with the raw bytes of each written output
    /// chunk, in production order, in addition to the file write. Used by
    /// the CLI's optional TCP streaming (`-n`/`-p`); not consulted at all
    /// when unset.
    pub fn with_chunk_sink(mut self, sink: Arc<dyn Fn(&[u8]) + Send + Sync>) -> Self {
        self.chunk_sink = Some(sink);
        self
    }

    /// Spawn the worker. Runs until input EOF or a `stop()` request.
    pub fn start(&mut self, output_path: impl Into<PathBuf>) -> Result<()> {
        let source = self
            .source
            .take()
            .expect("start() called more than once on the same Demodulator");
        let output_path = output_path.into();
        let writer = SymbolWriter::create_with_chunk(&output_path, self.chunk)?;

        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);
        let chunk = self.chunk;
        let chunk_sink = self.chunk_sink.clone();

        let handle = std::thread::spawn(move || {
            run_worker(config, source, writer, shared, chunk, chunk_sink);
        });
        self.handle = Some(handle);
        Ok(())
    }

    /// `true` until the worker has terminated.
    pub fn status(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn done(&self) -> u64 {
        self.shared.done.load(Ordering::Acquire)
    }

    pub fn size(&self) -> u64 {
        self.shared.size.load(Ordering::Acquire)
    }

    /// Current Costas NCO frequency offset, in Hz.
    pub fn freq(&self) -> f32 {
        self.shared.freq_hz.load(Ordering::Acquire)
    }

    pub fn gain(&self) -> f32 {
        self.shared.gain.load(Ordering::Acquire)
    }

    pub fn locked(&self) -> bool {
        self.shared.locked.load(Ordering::Acquire)
    }

    /// Request a cooperative stop; the worker checks this between chunks.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    /// Block until the worker exits, releasing all stage state. Propagates
    /// any error the worker observed.
    pub fn join(mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let mut guard = self.shared.error.lock().unwrap();
        match guard.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn run_worker(
    config: DemodConfig,
    mut source: SampleSource,
    mut writer: SymbolWriter,
    shared: Arc<DemodShared>,
    chunk: usize,
    chunk_sink: Option<Arc<dyn Fn(&[u8]) + Send + Sync>>,
) {
    let result = run_worker_inner(&config, &mut source, &mut writer, &shared, chunk, chunk_sink.as_deref());

    if let Err(e) = writer.close() {
        let mut guard = shared.error.lock().unwrap();
        if guard.is_none() {
            *guard = Some(e);
        }
    }
    if let Err(e) = result {
        let mut guard = shared.error.lock().unwrap();
        if guard.is_none() {
            *guard = Some(e);
        }
    }

    shared.running.store(false, Ordering::Release);
}

fn run_worker_inner(
    config: &DemodConfig,
    source: &mut SampleSource,
    writer: &mut SymbolWriter,
    shared: &Arc<DemodShared>,
    chunk: usize,
    chunk_sink: Option<&(dyn Fn(&[u8]) + Send + Sync)>,
) -> Result<()> {
    let source_rate = source.samplerate() as f64;
    let kernel = config.rrc_kernel(source_rate);
    let mut interpolator = InterpolatingFilter::new(kernel, config.interp_factor);
    let mut agc = Agc::new(config.agc_target, config.agc_window);
    let resync_period = config.resync_period(source_rate);
    let mut timing = TimingRecovery::new(resync_period, config.mode);
    let mut costas = CostasLoop::new(config.costas_bw_hz, config.symbol_rate, config.mode);
    let mut logger = SignalLogger::new(LogConfig::default());

    let mut input_buf = Vec::with_capacity(chunk);
    let mut interp_out = Vec::with_capacity(chunk * config.interp_factor);
    let mut symbol_buf = Vec::with_capacity(chunk);

    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        input_buf.clear();
        let read = source.read(chunk, &mut input_buf)?;
        if read == 0 {
            break;
        }

        interp_out.clear();
        symbol_buf.clear();

        for &sample in &input_buf {
            interpolator.process(sample, &mut interp_out);
        }

        for &raw in &interp_out {
            if interpolator.consume_primed(1) > 0 {
                continue;
            }
            let normalized = agc.apply(raw);
            if let Some(symbol) = timing.process(normalized) {
                let derotated = costas.process(symbol);
                symbol_buf.push(SoftSymbol::from_complex(derotated.re, derotated.im));
            }
        }

        writer.write_symbols(&symbol_buf)?;
        if let Some(sink) = chunk_sink {
            let bytes: Vec<u8> = symbol_buf.iter().flat_map(|s| s.to_bytes()).collect();
            if !bytes.is_empty() {
                sink(&bytes);
            }
        }

        shared.done.store(source.done(), Ordering::Release);
        shared
            .freq_hz
            .store(costas.freq_hz(config.symbol_rate) as f32, Ordering::Release);
        shared.gain.store(agc.gain(), Ordering::Release);
        shared.locked.store(costas.locked(), Ordering::Release);

        logger.debug("AGC", format_args!("gain={:.3}", agc.gain()));
        logger.debug("TIMING", format_args!("emitted={} symbols this chunk", symbol_buf.len()));
        logger.info(
            "COSTAS",
            format_args!(
                "freq={:.1}Hz locked={}",
                costas.freq_hz(config.symbol_rate),
                costas.locked()
            ),
        );

        if read < chunk {
            break;
        }
    }

    Ok(())
}

//! Full-pipeline (A→B→C→D→E) round-trip tests driving the real
//! [`Demodulator`], not individual DSP stages in isolation. These exercise
//! the spec's "Round-trip/correctness" properties directly: a frequency-
//! offset QPSK capture must lock and converge, and an all-zero capture must
//! never report lock.

use lrpt_core::config::Mode;
use lrpt_core::driver::Demodulator;
use lrpt_core::dsp::{InterpolatingFilter, RrcKernel};
use lrpt_core::source::SampleSource;
use num_complex::{Complex32, Complex64};
use std::f64::consts::TAU;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "lrpt_core_round_trip_{}_{:?}",
        name,
        std::thread::current().id()
    ))
}

/// Block until the worker thread has terminated, polling the same
/// non-blocking observers the CLI's controller loop uses.
fn wait_for_completion(demod: &Demodulator) {
    while demod.status() {
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Synthesize a QPSK capture the way a real transmitter would: symbols are
/// zero-stuffed and pulse-shaped through the *same* RRC kernel the receiver
/// later matched-filters with, so the cascade forms the usual zero-ISI
/// raised-cosine response, then rotated by a constant frequency offset.
fn synth_rrc_shaped_qpsk(
    path: &std::path::Path,
    symbol_rate: u32,
    interp: u32,
    rrc_order: usize,
    alpha: f64,
    n_symbols: usize,
    offset_hz: f64,
) {
    let sample_rate = symbol_rate as f64 * interp as f64;
    let kernel = RrcKernel::design(alpha, rrc_order, sample_rate, symbol_rate as f64);
    let mut shaper = InterpolatingFilter::new(kernel, interp as usize);

    let points = [(1.0f32, 1.0f32), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
    let mut lfsr = 0x1234u32;
    let mut shaped = Vec::with_capacity(n_symbols * interp as usize);
    let mut out = Vec::new();
    for sym_idx in 0..n_symbols {
        lfsr ^= lfsr << 13;
        lfsr ^= lfsr >> 17;
        lfsr ^= lfsr << 5;
        let (i, q) = points[(lfsr as usize + sym_idx) % points.len()];
        out.clear();
        shaper.process(Complex32::new(i, q), &mut out);
        shaped.extend_from_slice(&out);
    }
    // Drop the shaping filter's own startup transient so the rotated
    // waveform written to disk starts from steady state, mirroring the
    // receive-side prime-up discard of §4.B.
    let discard = (rrc_order + 1).min(shaped.len());
    shaped.drain(0..discard);

    let phase_inc = TAU * offset_hz / sample_rate;
    let mut phase = 0.0f64;
    let scale = 8000.0f64;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: sample_rate as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for s in shaped {
        let rotated =
            Complex64::new(s.re as f64, s.im as f64) * Complex64::new(phase.cos(), phase.sin());
        phase += phase_inc;
        writer.write_sample((rotated.re * scale) as i16).unwrap();
        writer.write_sample((rotated.im * scale) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn full_pipeline_locks_and_recovers_known_frequency_offset() {
    let in_path = temp_path("qpsk_offset.wav");
    let out_path = temp_path("qpsk_offset.s");

    let symbol_rate = 72_000u32;
    let interp = 4u32;
    let rrc_order = 64usize;
    let alpha = 0.6;
    let offset_hz = 200.0;
    // Comfortably past the spec's 10,000-symbol Costas acquisition budget,
    // to also leave margin for this test's AGC/timing settling, which the
    // isolated Costas-only test in dsp/costas.rs doesn't have to account for.
    let n_symbols = 20_000usize;

    synth_rrc_shaped_qpsk(
        &in_path, symbol_rate, interp, rrc_order, alpha, n_symbols, offset_hz,
    );

    let source = SampleSource::open_wav(&in_path).unwrap();
    let mut demod = Demodulator::init(
        source,
        1, // the capture is already shaped/oversampled at `interp`
        rrc_order,
        alpha,
        100.0, // nominal QPSK Costas bandwidth, spec default
        symbol_rate as f64,
        Mode::Qpsk,
    )
    .unwrap();
    demod.start(&out_path).unwrap();
    wait_for_completion(&demod);

    let locked = demod.locked();
    let freq = demod.freq();
    demod.join().unwrap();

    assert!(
        locked,
        "costas loop failed to lock within the synthesized capture"
    );
    assert!(
        (freq - offset_hz as f32).abs() < 5.0,
        "recovered {freq} Hz, expected within 5 Hz of {offset_hz} Hz"
    );

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn all_zero_samples_produce_all_zero_output_and_stay_unlocked() {
    let in_path = temp_path("all_zero.raw");
    let out_path = temp_path("all_zero.s");

    // Comfortably longer than (rrc_order+1)*interp_factor samples, so this
    // exercises the "Zero-input" round-trip property of §8, not the
    // "input shorter than the filter's transient" boundary case (which is
    // a distinct property already covered by
    // `driver::tests::zero_input_produces_empty_but_valid_output`).
    let n_frames = 20_000usize;
    {
        let mut f = std::fs::File::create(&in_path).unwrap();
        let zero_frame = [0u8; 4]; // i16 zero I, i16 zero Q
        for _ in 0..n_frames {
            f.write_all(&zero_frame).unwrap();
        }
    }

    let source = SampleSource::open_raw(&in_path, 288_000, 16).unwrap();
    let mut demod = Demodulator::init(source, 1, 64, 0.6, 100.0, 72_000.0, Mode::Qpsk).unwrap();
    demod.start(&out_path).unwrap();
    wait_for_completion(&demod);

    let locked = demod.locked();
    demod.join().unwrap();

    assert!(!locked, "zero input must never report a carrier lock");

    let bytes = std::fs::read(&out_path).unwrap();
    assert!(
        !bytes.is_empty(),
        "expected some symbols to be emitted from a 20,000-sample capture"
    );
    assert!(
        bytes.iter().all(|&b| b == 0),
        "all-zero input must produce all-zero soft symbols"
    );

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

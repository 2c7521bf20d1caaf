//! End-to-end scenarios exercising the demodulator driver through realistic
//! WAV/raw inputs, synthesized in-memory rather than committed as binary
//! fixtures.

use lrpt_core::config::Mode;
use lrpt_core::driver::Demodulator;
use lrpt_core::source::SampleSource;
use std::io::Write;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "lrpt_cli_e2e_{}_{:?}",
        name,
        std::thread::current().id()
    ))
}

/// Synthesize a QPSK-modulated WAV capture: random symbols, RRC-shaped at
/// 4x oversampling, rotated by a constant frequency offset.
fn synth_qpsk_wav(path: &std::path::Path, symbol_rate: u32, interp: u32, n_symbols: usize, offset_hz: f64) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: symbol_rate * interp,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();

    let points = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
    let phase_inc = std::f64::consts::TAU * offset_hz / (symbol_rate as f64);
    let mut phase = 0.0f64;
    let mut lfsr = 0x1234u32;

    for sym_idx in 0..n_symbols {
        lfsr ^= lfsr << 13;
        lfsr ^= lfsr >> 17;
        lfsr ^= lfsr << 5;
        let (i, q) = points[(lfsr as usize + sym_idx) % points.len()];

        for _ in 0..interp {
            let rot_i = i * phase.cos() - q * phase.sin();
            let rot_q = i * phase.sin() + q * phase.cos();
            phase += phase_inc;
            writer.write_sample((rot_i * 8000.0) as i16).unwrap();
            writer.write_sample((rot_q * 8000.0) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

#[test]
fn wav_round_trip_produces_bounded_output_size() {
    let in_path = temp_path("wav_roundtrip.wav");
    let out_path = temp_path("wav_roundtrip.s");

    let symbol_rate = 72_000u32;
    let interp = 4u32;
    let n_symbols = 2000usize;
    synth_qpsk_wav(&in_path, symbol_rate, interp, n_symbols, 0.0);

    let source = SampleSource::open_wav(&in_path).unwrap();
    let input_frames = source.size();

    let mut demod = Demodulator::init(
        source,
        1, // no further interpolation: the WAV is already oversampled
        32,
        0.6,
        100.0,
        symbol_rate as f64,
        Mode::Qpsk,
    )
    .unwrap();
    demod.start(&out_path).unwrap();
    demod.join().unwrap();

    let metadata = std::fs::metadata(&out_path).unwrap();
    let expected_symbols = input_frames / interp as u64;
    // Allow slack for the filter prime-up transient discarding a handful of
    // leading output samples.
    assert!(metadata.len() <= 2 * expected_symbols + 2);

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn raw_input_with_forced_samplerate_and_bps_demodulates() {
    let in_path = temp_path("raw_input.raw");
    let out_path = temp_path("raw_input.s");

    let mut f = std::fs::File::create(&in_path).unwrap();
    for i in 0..40_000usize {
        let t = i as f32 * 0.003;
        let re = (t.cos() * 60.0) as i16;
        let im = (t.sin() * 60.0) as i16;
        f.write_all(&re.to_le_bytes()).unwrap();
        f.write_all(&im.to_le_bytes()).unwrap();
    }
    drop(f);

    let source = SampleSource::open_raw(&in_path, 140_000, 16).unwrap();
    let mut demod = Demodulator::init(source, 4, 64, 0.6, 100.0, 72_000.0, Mode::Qpsk).unwrap();
    demod.start(&out_path).unwrap();
    demod.join().unwrap();

    let metadata = std::fs::metadata(&out_path).unwrap();
    assert_eq!(metadata.len() % 2, 0);

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn oqpsk_mode_runs_to_completion_with_reduced_bandwidth() {
    let in_path = temp_path("oqpsk.wav");
    let out_path = temp_path("oqpsk.s");

    let symbol_rate = 72_000u32;
    let interp = 4u32;
    synth_qpsk_wav(&in_path, symbol_rate, interp, 3000, 50.0);

    let source = SampleSource::open_wav(&in_path).unwrap();
    let mut demod = Demodulator::init(source, 1, 32, 0.6, 40.0, symbol_rate as f64, Mode::Oqpsk).unwrap();
    demod.start(&out_path).unwrap();
    demod.join().unwrap();

    assert!(std::fs::metadata(&out_path).unwrap().len() > 0);

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

/// The §8 Boundaries case: a 0-sample capture. Distinct from the §8
/// Round-trip "Zero-input" case (a nonzero-length stream of all-zero-valued
/// samples), which is covered in `lrpt-core/tests/round_trip.rs`.
#[test]
fn zero_length_input_yields_empty_output_without_panicking() {
    let in_path = temp_path("empty.wav");
    let out_path = temp_path("empty.s");

    synth_qpsk_wav(&in_path, 72_000, 4, 0, 0.0);

    let source = SampleSource::open_wav(&in_path).unwrap();
    let mut demod = Demodulator::init(source, 1, 32, 0.6, 100.0, 72_000.0, Mode::Qpsk).unwrap();
    demod.start(&out_path).unwrap();
    demod.join().unwrap();

    assert_eq!(std::fs::metadata(&out_path).unwrap().len(), 0);

    let _ = std::fs::remove_file(&in_path);
    let _ = std::fs::remove_file(&out_path);
}

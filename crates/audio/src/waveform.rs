//! Per-clip waveform data for timeline UI display.
//!
//! Clips with audio carry a flat `ui.audio_data` sample array at a fixed
//! resolution ([`SAMPLES_PER_SECOND`]). Painting a clip needs a *window*
//! into that array (the trimmed slice, or a scaled view while a retime
//! preview is active), and committing a retime needs the samples
//! resampled to the new duration. The authoritative audio data is always
//! recomputed by the host afterwards; everything here is UI-only.

/// Resolution of the per-clip UI waveform sample array.
pub const SAMPLES_PER_SECOND: u32 = 20;

/// Normalised window into a clip's waveform sample array.
///
/// All ratios are in `[0, 1]` relative to the sample array. `scaled`
/// means a retime preview is active: the painter stretches the source
/// window across the clip instead of slicing it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaveformWindow {
    pub start_ratio: f32,
    pub end_ratio: f32,
    pub source_start_ratio: f32,
    pub source_end_ratio: f32,
    pub scaled: bool,
}

/// Compute the waveform window for a clip being displayed.
///
/// * `sample_count` — length of the clip's `ui.audio_data`.
/// * `start`/`end` — the slice currently displayed (live values during a
///   trim, committed values otherwise), in source seconds.
/// * `initial_start`/`initial_end` — the slice when the gesture began.
/// * `scaled` — whether a retime preview is stretching the clip.
pub fn window_for_clip(
    sample_count: usize,
    samples_per_second: u32,
    start: f64,
    end: f64,
    initial_start: f64,
    initial_end: f64,
    scaled: bool,
) -> WaveformWindow {
    let end = end.max(start);
    let initial_end = initial_end.max(initial_start);

    let sps = if samples_per_second == 0 {
        SAMPLES_PER_SECOND
    } else {
        samples_per_second
    } as f64;

    let mut media_duration = sample_count as f64 / sps;
    if media_duration <= 0.0 {
        media_duration = initial_end.max(end).max(start).max(0.0);
    }

    // A dataset covering exactly the initial slice is addressed relative
    // to that slice; a dataset covering the whole source is addressed
    // from zero.
    let clip_span = (initial_end - initial_start).max(0.0);
    let tolerance = (1.0 / sps).max(clip_span * 1e-3);
    let dataset_matches_clip =
        media_duration > 0.0 && clip_span > 0.0 && (media_duration - clip_span).abs() <= tolerance;
    let origin = if dataset_matches_clip {
        initial_start
    } else {
        0.0
    };

    let ratio = |value: f64| -> f32 {
        if media_duration <= 0.0 {
            return 0.0;
        }
        ((value - origin).clamp(0.0, media_duration) / media_duration) as f32
    };

    let start_ratio = ratio(start);
    let end_ratio = ratio(end).max(start_ratio);
    let source_start_ratio = ratio(initial_start);
    let source_end_ratio = ratio(initial_end).max(source_start_ratio);

    WaveformWindow {
        start_ratio,
        end_ratio,
        source_start_ratio,
        source_end_ratio,
        scaled,
    }
}

/// Resample a waveform to a new length by linear interpolation.
pub fn resample_linear(samples: &[f32], new_len: usize) -> Vec<f32> {
    if samples.is_empty() || new_len == 0 {
        return Vec::new();
    }
    if new_len == samples.len() {
        return samples.to_vec();
    }
    if samples.len() == 1 {
        return vec![samples[0]; new_len];
    }

    let mut out = Vec::with_capacity(new_len);
    let step = (samples.len() - 1) as f64 / (new_len.max(2) - 1) as f64;
    for i in 0..new_len {
        let pos = i as f64 * step;
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(samples.len() - 1);
        let frac = (pos - lo as f64) as f32;
        out.push(samples[lo] + (samples[hi] - samples[lo]) * frac);
    }
    out
}

/// Resample a clip's waveform after a committed retime: the new length
/// is `round(len · new_duration / original_duration)`.
pub fn resample_for_retime(
    samples: &[f32],
    original_duration: f64,
    new_duration: f64,
) -> Vec<f32> {
    if samples.is_empty() || original_duration <= 0.0 || new_duration <= 0.0 {
        return Vec::new();
    }
    let new_len = (samples.len() as f64 * new_duration / original_duration).round() as usize;
    resample_linear(samples, new_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_full_source_dataset() {
        // 200 samples at 20/s = 10 s of media; slice [2, 6].
        let w = window_for_clip(200, 20, 2.0, 6.0, 2.0, 6.0, false);
        assert!((w.start_ratio - 0.2).abs() < 1e-6);
        assert!((w.end_ratio - 0.6).abs() < 1e-6);
        assert!(!w.scaled);
    }

    #[test]
    fn window_dataset_matching_slice_uses_slice_origin() {
        // 80 samples at 20/s = 4 s, exactly the initial slice [2, 6]:
        // ratios are relative to the slice, so the full slice maps to [0, 1].
        let w = window_for_clip(80, 20, 2.0, 6.0, 2.0, 6.0, false);
        assert!(w.start_ratio.abs() < 1e-6);
        assert!((w.end_ratio - 1.0).abs() < 1e-6);

        // Trimming the left edge in by 1 s moves the window start to 1/4.
        let w = window_for_clip(80, 20, 3.0, 6.0, 2.0, 6.0, false);
        assert!((w.start_ratio - 0.25).abs() < 1e-6);
    }

    #[test]
    fn window_without_samples_degrades_gracefully() {
        let w = window_for_clip(0, 20, 1.0, 3.0, 1.0, 3.0, false);
        assert!(w.end_ratio >= w.start_ratio);
        assert!(w.end_ratio <= 1.0);
    }

    #[test]
    fn window_swapped_edges_are_clamped() {
        let w = window_for_clip(100, 20, 4.0, 2.0, 4.0, 2.0, false);
        assert!(w.end_ratio >= w.start_ratio);
    }

    #[test]
    fn resample_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 3), samples);
    }

    #[test]
    fn resample_empty_and_zero() {
        assert!(resample_linear(&[], 10).is_empty());
        assert!(resample_linear(&[0.5], 0).is_empty());
    }

    #[test]
    fn resample_interpolates_midpoints() {
        let samples = vec![0.0, 1.0];
        let out = resample_linear(&samples, 3);
        assert_eq!(out.len(), 3);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn retime_halves_sample_count() {
        // 800 samples over 4 s retimed to 2 s: 400 samples, each close to
        // the source sample at floor(i * 799/399).
        let samples: Vec<f32> = (0..800).map(|i| (i as f32 / 50.0).sin()).collect();
        let out = resample_for_retime(&samples, 4.0, 2.0);
        assert_eq!(out.len(), 400);
        for (i, value) in out.iter().enumerate() {
            let src = ((i as f64) * 799.0 / 399.0).floor() as usize;
            assert!(
                (value - samples[src]).abs() < 0.05,
                "sample {i} drifted from source {src}"
            );
        }
    }

    #[test]
    fn retime_invalid_durations() {
        assert!(resample_for_retime(&[0.5; 10], 0.0, 2.0).is_empty());
        assert!(resample_for_retime(&[0.5; 10], 2.0, 0.0).is_empty());
    }
}

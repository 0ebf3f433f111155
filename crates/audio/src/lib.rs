//! `cutline-audio` — Per-clip UI waveform windowing and resampling.
//!
//! The engine never decodes audio; the host pushes a low-resolution
//! sample array per clip and this crate only windows and resamples it
//! for display during trims and retimes.

pub mod waveform;

pub use waveform::{
    resample_for_retime, resample_linear, window_for_clip, WaveformWindow, SAMPLES_PER_SECOND,
};

// Frame normalization: bring captured audio to the configured rate and channel count

use super::backend::AudioFrame;

/// Process audio frame: downsample and convert to target format
pub fn normalize_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    // Mix down first so decimation walks whole sample frames
    if processed.channels != target_channels && target_channels == 1 {
        processed = to_mono(processed);
    }

    if processed.sample_rate != target_sample_rate {
        processed = downsample(processed, target_sample_rate);
    }

    processed
}

/// Downsample audio frame by decimation
///
/// Non-integer ratios pick the nearest preceding source sample. Upsampling is
/// not supported and returns the frame unchanged.
pub fn downsample(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if frame.sample_rate <= target_rate || target_rate == 0 {
        return frame;
    }

    let channels = frame.channels.max(1) as usize;
    let source_frames = frame.samples.len() / channels;
    let ratio = frame.sample_rate as f64 / target_rate as f64;
    let target_frames = (source_frames as f64 / ratio).floor() as usize;

    let mut downsampled = Vec::with_capacity(target_frames * channels);
    for i in 0..target_frames {
        let src = ((i as f64 * ratio) as usize).min(source_frames.saturating_sub(1));
        downsampled.extend_from_slice(&frame.samples[src * channels..(src + 1) * channels]);
    }

    AudioFrame {
        samples: downsampled,
        sample_rate: target_rate,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Convert interleaved multi-channel audio to mono by averaging channels
pub fn to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels <= 1 {
        return frame;
    }

    let channels = frame.channels as usize;
    let mono_samples: Vec<i16> = frame
        .samples
        .chunks_exact(channels)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect();

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Convert f32 samples (-1.0..1.0) to i16 PCM
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect()
}

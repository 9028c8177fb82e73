use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Basic facts about an encoded audio body
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<usize>,
    pub duration: Option<Duration>,
}

/// Map a media type onto a file extension hint for the prober
pub fn extension_for(media_type: &str) -> Option<&'static str> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/ogg" | "audio/opus" => Some("ogg"),
        "audio/webm" => Some("webm"),
        "audio/flac" => Some("flac"),
        _ => None,
    }
}

/// Probe an encoded audio body without decoding it
pub fn probe(bytes: &[u8], media_type: &str) -> Result<AudioInfo> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_for(media_type) {
        hint.with_extension(ext);
    }
    hint.mime_type(media_type);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unrecognized audio format")?;

    let track = probed
        .format
        .default_track()
        .context("Audio has no playable track")?;
    let params = &track.codec_params;

    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let duration = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => {
            Some(Duration::from_secs_f64(frames as f64 / rate as f64))
        }
        _ => None,
    };

    Ok(AudioInfo {
        codec,
        sample_rate: params.sample_rate,
        channels: params.channels.map(|c| c.count()),
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBuffer, AudioEncoding, AudioFrame};

    #[test]
    fn media_type_parameters_are_ignored() {
        assert_eq!(extension_for("audio/webm;codecs=opus"), Some("webm"));
        assert_eq!(extension_for("Audio/MPEG"), Some("mp3"));
        assert_eq!(extension_for("application/octet-stream"), None);
    }

    #[test]
    fn probes_wav_duration() -> Result<()> {
        let buffer = AudioBuffer {
            encoding: AudioEncoding::Wav,
            fragments: vec![AudioFrame {
                samples: vec![0; 8000],
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: 0,
            }],
            recorded_for: Duration::from_millis(500),
        };
        let info = probe(&buffer.encode()?, "audio/wav")?;
        assert_eq!(info.sample_rate, Some(16000));
        assert_eq!(info.channels, Some(1));
        assert_eq!(info.duration, Some(Duration::from_millis(500)));
        Ok(())
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(probe(b"definitely not audio", "audio/mpeg").is_err());
    }
}

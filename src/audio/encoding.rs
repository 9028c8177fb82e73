// Recording encodings and the finished per-turn audio buffer

use std::io::Cursor;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::backend::{AudioFrame, CaptureBackend};

/// Container/codec a recording can be delivered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// Compressed opus in a webm container
    WebmOpus,
    /// Lossless 16-bit PCM WAV
    Wav,
    Mp3,
}

/// Default negotiation order: compressed first, then lossless, then mp3
pub const DEFAULT_PREFERENCE: [AudioEncoding; 3] =
    [AudioEncoding::WebmOpus, AudioEncoding::Wav, AudioEncoding::Mp3];

impl AudioEncoding {
    pub fn media_type(self) -> &'static str {
        match self {
            AudioEncoding::WebmOpus => "audio/webm;codecs=opus",
            AudioEncoding::Wav => "audio/wav",
            AudioEncoding::Mp3 => "audio/mp3",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioEncoding::WebmOpus => "webm",
            AudioEncoding::Wav => "wav",
            AudioEncoding::Mp3 => "mp3",
        }
    }

    /// Whether this crate ships an encoder for the format
    pub fn has_encoder(self) -> bool {
        matches!(self, AudioEncoding::Wav)
    }

    /// Encode PCM fragments into a single file body
    pub fn encode(self, fragments: &[AudioFrame]) -> Result<Vec<u8>> {
        match self {
            AudioEncoding::Wav => encode_wav(fragments),
            other => bail!("No encoder available for {}", other.media_type()),
        }
    }
}

/// Pick the first encoding in `preference` the backend can deliver and we can encode
pub fn negotiate(
    preference: &[AudioEncoding],
    backend: &dyn CaptureBackend,
) -> Option<AudioEncoding> {
    preference
        .iter()
        .copied()
        .find(|enc| enc.has_encoder() && backend.supports(*enc))
}

fn encode_wav(fragments: &[AudioFrame]) -> Result<Vec<u8>> {
    let first = match fragments.first() {
        Some(frame) => frame,
        None => bail!("No audio fragments to encode"),
    };

    let spec = hound::WavSpec {
        channels: first.channels,
        sample_rate: first.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for frame in fragments {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
        }
        writer.finalize().context("Failed to finalize WAV")?;
    }

    Ok(cursor.into_inner())
}

/// Everything captured during one recording, tagged with its encoding
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub encoding: AudioEncoding,
    /// Ordered fragments delivered between start and stop
    pub fragments: Vec<AudioFrame>,
    /// Wall-clock time between device start and device stop
    pub recorded_for: Duration,
}

impl AudioBuffer {
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.samples.is_empty())
    }

    pub fn media_type(&self) -> &'static str {
        self.encoding.media_type()
    }

    pub fn file_name(&self) -> String {
        format!("recording.{}", self.encoding.extension())
    }

    pub fn sample_count(&self) -> usize {
        self.fragments.iter().map(|f| f.samples.len()).sum()
    }

    /// Duration of the captured audio itself
    pub fn captured_duration(&self) -> Duration {
        Duration::from_millis(self.fragments.iter().map(AudioFrame::duration_ms).sum())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encoding.encode(&self.fragments)
    }
}

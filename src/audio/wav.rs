//! RIFF/WAVE PCM parsing

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WavError {
    #[error("Failed to read '{path}': {message}")]
    Io { path: String, message: String },
    #[error("Missing RIFF signature")]
    NotRiff,
    #[error("Missing WAVE format tag")]
    NotWave,
    #[error("Missing 'fmt ' chunk")]
    MissingFormat,
    #[error("Missing 'data' chunk")]
    MissingData,
    #[error("'{chunk}' chunk declares {declared} bytes but only {available} remain")]
    Truncated {
        chunk: String,
        declared: usize,
        available: usize,
    },
    #[error("Unsupported format: audio format {audio_format}, {channels} channels, {bits_per_sample} bits")]
    Unsupported {
        audio_format: u16,
        channels: u16,
        bits_per_sample: u16,
    },
}

/// Contents of the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

/// Channel/bit-depth combinations playback accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
}

impl SampleFormat {
    pub fn channels(&self) -> u16 {
        match self {
            SampleFormat::Mono8 | SampleFormat::Mono16 => 1,
            SampleFormat::Stereo8 | SampleFormat::Stereo16 => 2,
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleFormat::Mono8 | SampleFormat::Stereo8 => 8,
            SampleFormat::Mono16 | SampleFormat::Stereo16 => 16,
        }
    }

    /// Bytes per sample frame
    pub fn frame_size(&self) -> usize {
        self.channels() as usize * self.bits_per_sample() as usize / 8
    }
}

impl WavFormat {
    pub fn sample_format(&self) -> Result<SampleFormat, WavError> {
        let format = match (self.audio_format, self.channels, self.bits_per_sample) {
            (1, 1, 8) => SampleFormat::Mono8,
            (1, 1, 16) => SampleFormat::Mono16,
            (1, 2, 8) => SampleFormat::Stereo8,
            (1, 2, 16) => SampleFormat::Stereo16,
            _ => {
                return Err(WavError::Unsupported {
                    audio_format: self.audio_format,
                    channels: self.channels,
                    bits_per_sample: self.bits_per_sample,
                })
            }
        };
        Ok(format)
    }
}

/// A parsed WAV file
#[derive(Debug, Clone, PartialEq)]
pub struct WavData {
    pub format: WavFormat,
    pub sample_format: SampleFormat,
    pub data: Vec<u8>,
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Parse a RIFF/WAVE byte stream holding 8 or 16 bit mono or stereo PCM
pub fn parse(bytes: &[u8]) -> Result<WavData, WavError> {
    if bytes.len() < 4 || &bytes[0..4] != b"RIFF" {
        return Err(WavError::NotRiff);
    }
    if bytes.len() < 12 || &bytes[8..12] != b"WAVE" {
        return Err(WavError::NotWave);
    }

    let mut format = None;
    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let size = u32_at(bytes, offset + 4) as usize;
        let body = offset + 8;
        let available = bytes.len() - body;

        if id == b"fmt " {
            if size < 16 || size > available {
                return Err(WavError::Truncated {
                    chunk: "fmt ".to_string(),
                    declared: size,
                    available,
                });
            }
            format = Some(WavFormat {
                audio_format: u16_at(bytes, body),
                channels: u16_at(bytes, body + 2),
                sample_rate: u32_at(bytes, body + 4),
                byte_rate: u32_at(bytes, body + 8),
                block_align: u16_at(bytes, body + 12),
                bits_per_sample: u16_at(bytes, body + 14),
            });
        } else if id == b"data" {
            let format = format.ok_or(WavError::MissingFormat)?;
            let sample_format = format.sample_format()?;
            if size > available {
                return Err(WavError::Truncated {
                    chunk: "data".to_string(),
                    declared: size,
                    available,
                });
            }
            return Ok(WavData {
                format,
                sample_format,
                data: bytes[body..body + size].to_vec(),
            });
        }

        // Chunks are padded to an even size
        offset = body.saturating_add(size).saturating_add(size & 1);
    }

    match format {
        Some(format) => {
            format.sample_format()?;
            Err(WavError::MissingData)
        }
        None => Err(WavError::MissingFormat),
    }
}

/// Read and parse a WAV file
pub fn read(path: &Path) -> Result<WavData, WavError> {
    let bytes = std::fs::read(path).map_err(|e| WavError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse(&bytes)
}

/// Encode PCM bytes as a canonical 44-byte-header WAV stream
pub fn encode(format: SampleFormat, sample_rate: u32, data: &[u8]) -> Vec<u8> {
    let channels = format.channels();
    let bits = format.bits_per_sample();
    let block_align = format.frame_size() as u16;

    let mut bytes = Vec::with_capacity(44 + data.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
    bytes.extend_from_slice(data);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_unknown_chunks() {
        let mut bytes = encode(SampleFormat::Stereo8, 22050, &[1, 2, 3, 4]);
        // Splice a LIST chunk with odd size between fmt and data
        let list = [b"LIST".as_slice(), &3u32.to_le_bytes(), &[9, 9, 9, 0]].concat();
        bytes.splice(36..36, list);

        let wav = parse(&bytes).unwrap();
        assert_eq!(wav.sample_format, SampleFormat::Stereo8);
        assert_eq!(wav.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_rejects_32_bit() {
        let mut bytes = encode(SampleFormat::Mono16, 44100, &[0; 8]);
        bytes[34..36].copy_from_slice(&32u16.to_le_bytes());
        assert!(matches!(
            parse(&bytes),
            Err(WavError::Unsupported {
                bits_per_sample: 32,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_pcm() {
        let mut bytes = encode(SampleFormat::Mono16, 44100, &[0; 8]);
        bytes[20..22].copy_from_slice(&3u16.to_le_bytes());
        assert!(matches!(parse(&bytes), Err(WavError::Unsupported { .. })));
    }

    #[test]
    fn test_signature_checks() {
        assert_eq!(parse(b"RIFX"), Err(WavError::NotRiff));
        assert_eq!(parse(b"RIFF\0\0\0\0WAVX"), Err(WavError::NotWave));
        assert_eq!(parse(b"RIFF\0\0\0\0WAVE"), Err(WavError::MissingFormat));
    }

    #[test]
    fn test_truncated_data() {
        let mut bytes = encode(SampleFormat::Mono8, 8000, &[0; 10]);
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(parse(&bytes), Err(WavError::Truncated { .. })));
    }
}

//! Sound clips and positional sound sources
//!
//! Playback itself is delegated to an [`AudioBackend`]. The engine only owns
//! the decoded clips and tracks which playbacks are still running.

mod source;
pub mod wav;

pub use source::*;
pub use wav::{SampleFormat, WavData, WavError, WavFormat};

use crate::resources::{DirectoryError, ResourceDirectories};
use glam::Vec3;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Logical directory sound files are loaded from
pub const SOUND_DIRECTORY: &str = "sounds";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Wav(#[from] WavError),
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// Decoded PCM sound
#[derive(Debug, Clone, PartialEq)]
pub struct SoundClip {
    name: String,
    format: SampleFormat,
    sample_rate: u32,
    samples: Vec<u8>,
}

impl SoundClip {
    pub fn new(name: &str, format: SampleFormat, sample_rate: u32, samples: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            format,
            sample_rate,
            samples,
        }
    }

    pub fn from_wav(name: &str, wav: WavData) -> Self {
        Self::new(name, wav.sample_format, wav.format.sample_rate, wav.data)
    }

    /// Load a WAV file from a logical resource directory
    pub fn load(
        directories: &ResourceDirectories,
        folder_id: &str,
        filename: &str,
    ) -> Result<Self, AudioError> {
        let path = directories.resolve(folder_id, filename)?;
        let wav = wav::read(&path)?;
        log::debug!(
            "Loaded sound '{}' ({:?}, {} Hz, {} bytes)",
            filename,
            wav.sample_format,
            wav.format.sample_rate,
            wav.data.len()
        );
        Ok(Self::from_wav(filename, wav))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / self.format.frame_size();
        match self.sample_rate {
            0 => Duration::ZERO,
            rate => Duration::from_secs_f64(frames as f64 / rate as f64),
        }
    }
}

/// Identifies one playback started on a backend
pub type PlaybackId = u64;

/// Plays clips. Implementations wrap the platform audio library.
pub trait AudioBackend: Send + Sync {
    /// Start playing `clip` at `position`
    fn play(&self, clip: &SoundClip, position: Vec3, looping: bool)
        -> Result<PlaybackId, AudioError>;
    fn stop(&self, id: PlaybackId);
    fn is_playing(&self, id: PlaybackId) -> bool;
    /// Free the backend objects of a finished or stopped playback
    fn release(&self, id: PlaybackId);
}

#[derive(Debug)]
struct Playback {
    started: Instant,
    duration: Duration,
    looping: bool,
    stopped: bool,
}

/// Backend that plays nothing but keeps time.
///
/// A playback counts as playing until its clip's duration has elapsed, it is
/// stopped, or [`HeadlessAudio::finish`] is called.
#[derive(Debug, Default)]
pub struct HeadlessAudio {
    next_id: Mutex<PlaybackId>,
    playbacks: Mutex<HashMap<PlaybackId, Playback>>,
}

impl HeadlessAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// End a playback as if it ran to completion
    pub fn finish(&self, id: PlaybackId) {
        if let Some(playback) = self.playbacks.lock().get_mut(&id) {
            playback.stopped = true;
        }
    }

    /// Playbacks not yet released
    pub fn live_playbacks(&self) -> usize {
        self.playbacks.lock().len()
    }
}

impl AudioBackend for HeadlessAudio {
    fn play(
        &self,
        clip: &SoundClip,
        _position: Vec3,
        looping: bool,
    ) -> Result<PlaybackId, AudioError> {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        self.playbacks.lock().insert(
            id,
            Playback {
                started: Instant::now(),
                duration: clip.duration(),
                looping,
                stopped: false,
            },
        );
        Ok(id)
    }

    fn stop(&self, id: PlaybackId) {
        self.finish(id);
    }

    fn is_playing(&self, id: PlaybackId) -> bool {
        self.playbacks.lock().get(&id).is_some_and(|playback| {
            !playback.stopped
                && (playback.looping || playback.started.elapsed() < playback.duration)
        })
    }

    fn release(&self, id: PlaybackId) {
        self.playbacks.lock().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_duration() {
        let clip = SoundClip::new("beep", SampleFormat::Stereo16, 44100, vec![0; 44100 * 4]);
        assert_eq!(clip.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_headless_playback_finishes() {
        let audio = HeadlessAudio::new();
        let clip = SoundClip::new("beep", SampleFormat::Mono8, 8000, vec![0; 8000]);
        let id = audio.play(&clip, Vec3::ZERO, false).unwrap();
        assert!(audio.is_playing(id));

        audio.finish(id);
        assert!(!audio.is_playing(id));
        audio.release(id);
        assert_eq!(audio.live_playbacks(), 0);
    }
}

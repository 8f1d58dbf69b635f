//! Positional sound source component

use crate::audio::{AudioBackend, AudioError, PlaybackId, SoundClip};
use bevy_ecs::prelude::*;
use glam::Vec3;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default interval between sweeps for finished playbacks
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(500);

type ActiveList = Arc<Mutex<Vec<PlaybackId>>>;

/// Sweep finished playbacks out of `active`, releasing them on the backend
fn sweep(backend: &dyn AudioBackend, active: &Mutex<Vec<PlaybackId>>) -> usize {
    let mut active = active.lock();
    let before = active.len();
    active.retain(|&id| {
        if backend.is_playing(id) {
            true
        } else {
            backend.release(id);
            false
        }
    });
    before - active.len()
}

struct Sweeper {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Plays clips from an entity and keeps the list of running playbacks.
///
/// A background thread sweeps finished playbacks every interval. The list
/// is only touched under its mutex, so the sweep is atomic with respect to
/// `play`, `stop_all` and `is_playing` on the update thread.
#[derive(Component)]
pub struct SoundSource {
    backend: Arc<dyn AudioBackend>,
    active: ActiveList,
    position: Vec3,
    sweeper: Option<Sweeper>,
}

impl SoundSource {
    pub fn new(backend: Arc<dyn AudioBackend>, interval: Duration) -> Self {
        let active: ActiveList = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_backend = Arc::clone(&backend);
        let thread_active = Arc::clone(&active);
        let thread_running = Arc::clone(&running);
        let spawned = thread::Builder::new()
            .name("sound-sweeper".to_string())
            .spawn(move || {
                while thread_running.load(Ordering::Acquire) {
                    thread::park_timeout(interval);
                    if !thread_running.load(Ordering::Acquire) {
                        break;
                    }
                    let swept = sweep(thread_backend.as_ref(), &thread_active);
                    if swept > 0 {
                        log::trace!("Swept {} finished playbacks", swept);
                    }
                }
            });

        let sweeper = match spawned {
            Ok(handle) => Some(Sweeper { running, handle }),
            Err(e) => {
                log::warn!("Failed to start sound sweeper, finished playbacks are swept manually: {}", e);
                None
            }
        };

        Self {
            backend,
            active,
            position: Vec3::ZERO,
            sweeper,
        }
    }

    /// Position new playbacks start at
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn play(&self, clip: &SoundClip, looping: bool) -> Result<PlaybackId, AudioError> {
        let id = self.backend.play(clip, self.position, looping)?;
        self.active.lock().push(id);
        log::debug!("Playing '{}' as playback {}", clip.name(), id);
        Ok(id)
    }

    /// Stop and release every running playback
    pub fn stop_all(&self) {
        let mut active = self.active.lock();
        for id in active.drain(..) {
            self.backend.stop(id);
            self.backend.release(id);
        }
    }

    /// Whether any playback of this source is still running
    pub fn is_playing(&self) -> bool {
        let active = self.active.lock();
        active.iter().any(|&id| self.backend.is_playing(id))
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Sweep now instead of waiting for the background thread
    pub fn sweep(&self) -> usize {
        sweep(self.backend.as_ref(), &self.active)
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }
}

impl Drop for SoundSource {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.running.store(false, Ordering::Release);
            sweeper.handle.thread().unpark();
            if sweeper.handle.join().is_err() {
                log::error!("Sound sweeper thread panicked");
            }
        }
        self.stop_all();
    }
}

impl std::fmt::Debug for SoundSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundSource")
            .field("active", &self.active_count())
            .field("position", &self.position)
            .field("sweeper", &self.sweeper.is_some())
            .finish()
    }
}

use crate::media::{MediaElement, MediaSignal, PlayRejection, PlayRequestId};
use crate::model::MediaItem;
use crate::time_format::parse_duration_label;
use anyhow::{Context, Result};
use rodio::Source;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, DeviceSinkBuilder, MixerDeviceSink, Player};
use std::cell::RefCell;
use std::collections::VecDeque;
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Resolves a catalog source to a local file, if it names one.
pub fn local_path(source: &str) -> Option<PathBuf> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return None;
    }
    let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    Some(PathBuf::from(path))
}

fn due(last: Option<Instant>, now: Instant) -> bool {
    last.is_none_or(|last| now.saturating_duration_since(last) >= PROGRESS_INTERVAL)
}

/// Plays local audio files through the default output device.
pub struct RodioMediaElement {
    device: MixerDeviceSink,
    player: Player,
    current: Option<PathBuf>,
    duration: Option<f64>,
    load_error: Option<String>,
    volume: f32,
    muted: bool,
    rate: f32,
    playing: bool,
    finished: bool,
    last_progress: Option<Instant>,
    pending: Vec<MediaSignal>,
    output_name: String,
}

impl RodioMediaElement {
    pub fn new() -> Result<Self> {
        let (device, player, output_name) = open_output_sink()?;
        Ok(Self {
            device,
            player,
            current: None,
            duration: None,
            load_error: None,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            playing: false,
            finished: false,
            last_progress: None,
            pending: Vec::new(),
            output_name,
        })
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    fn apply_volume(&self) {
        let effective = if self.muted { 0.0 } else { self.volume };
        self.player.set_volume(effective);
    }

    /// Rebuilds the player with a fresh decoder for `path`, left paused.
    fn open_source(&mut self, path: &Path) -> Result<Option<f64>> {
        self.player.stop();
        self.player = Player::connect_new(self.device.mixer());
        self.player.pause();

        let file =
            File::open(path).with_context(|| format!("failed to open media {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        let total = source
            .total_duration()
            .filter(|duration| !duration.is_zero())
            .map(|duration| duration.as_secs_f64());
        self.player.append(source);
        self.apply_volume();
        self.player.set_speed(self.rate);
        Ok(total)
    }

    fn position(&self) -> f64 {
        self.player.get_pos().as_secs_f64()
    }
}

impl MediaElement for RodioMediaElement {
    fn load(&mut self, item: &MediaItem) {
        self.playing = false;
        self.finished = false;
        self.last_progress = None;
        self.duration = None;
        self.load_error = None;
        self.current = local_path(&item.source);

        let outcome = match self.current.clone() {
            Some(path) => self.open_source(&path),
            None => Err(anyhow::anyhow!(
                "{} is not a local file",
                item.source.trim()
            )),
        };
        match outcome {
            Ok(total) => self.duration = total,
            Err(err) => {
                let error = format!("{err:#}");
                warn!(source = %item.source, %error, "media could not be opened");
                self.player.stop();
                self.load_error = Some(error);
            }
        }

        self.pending.push(MediaSignal::MetadataReady {
            total: self.duration.unwrap_or(f64::NAN),
        });
    }

    fn play(&mut self, request: PlayRequestId) {
        let outcome = if let Some(error) = &self.load_error {
            Err(PlayRejection::Unsupported(error.clone()))
        } else if self.current.is_none() {
            Err(PlayRejection::NoSource)
        } else {
            if self.player.empty()
                && let Some(path) = self.current.clone()
                && let Err(err) = self.open_source(&path)
            {
                let error = format!("{err:#}");
                self.load_error = Some(error.clone());
                self.pending.push(MediaSignal::PlayResolved {
                    request,
                    outcome: Err(PlayRejection::Unsupported(error)),
                });
                return;
            }
            self.player.play();
            self.playing = true;
            self.finished = false;
            Ok(())
        };
        self.pending
            .push(MediaSignal::PlayResolved { request, outcome });
    }

    fn pause(&mut self) {
        self.player.pause();
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        let Some(path) = self.current.clone() else {
            return;
        };
        if self.load_error.is_some() {
            return;
        }
        if self.player.empty() {
            // A drained player has nothing left to seek in.
            if let Err(err) = self.open_source(&path) {
                let error = format!("{err:#}");
                warn!(%error, "failed to reopen media for seek");
                return;
            }
            if self.playing {
                self.player.play();
            }
        }
        let target = Duration::from_secs_f64(seconds.max(0.0));
        if let Err(err) = self.player.try_seek(target) {
            debug!(error = ?err, "seek rejected by decoder");
        }
        self.finished = false;
        self.last_progress = None;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_volume();
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.rate = rate;
        self.player.set_speed(rate);
    }

    fn poll_signals(&mut self) -> Vec<MediaSignal> {
        let mut signals = std::mem::take(&mut self.pending);
        if !self.playing {
            return signals;
        }

        let now = Instant::now();
        if self.player.empty() && !self.finished {
            self.finished = true;
            self.playing = false;
            signals.push(MediaSignal::Finished);
        } else if due(self.last_progress, now) {
            self.last_progress = Some(now);
            signals.push(MediaSignal::TimeUpdated {
                current: self.position(),
                total: self.duration.unwrap_or(f64::NAN),
            });
        }
        signals
    }
}

fn open_output_sink() -> Result<(MixerDeviceSink, Player, String)> {
    let (mut device, name) = with_silenced_stderr(|| {
        let host = rodio::cpal::default_host();
        match DeviceSinkBuilder::from_default_device()
            .context("failed to open default system output")
            .and_then(|builder| {
                builder
                    .with_error_callback(|_| {})
                    .open_sink_or_fallback()
                    .context("failed to start default output sink")
            }) {
            Ok(device) => Ok((device, String::from("System default output"))),
            Err(default_err) => {
                let mut candidates: Vec<String> = host
                    .output_devices()
                    .ok()
                    .into_iter()
                    .flatten()
                    .filter_map(|device| device_label(&device))
                    .collect();
                candidates.sort_by_cached_key(|name| {
                    let lower = name.to_ascii_lowercase();
                    let rank = if lower.contains("pulse") {
                        0_u8
                    } else if lower.contains("pipewire") {
                        1_u8
                    } else {
                        2_u8
                    };
                    (rank, lower)
                });
                candidates.dedup();

                for candidate in candidates {
                    let Some(entry) = host
                        .output_devices()
                        .ok()
                        .into_iter()
                        .flatten()
                        .find(|entry| device_label(entry).as_deref() == Some(candidate.as_str()))
                    else {
                        continue;
                    };
                    let opened = DeviceSinkBuilder::from_device(entry)
                        .context("failed to open fallback output device")
                        .and_then(|builder| {
                            builder
                                .with_error_callback(|_| {})
                                .open_sink_or_fallback()
                                .context("failed to start fallback output sink")
                        });
                    if let Ok(device) = opened {
                        return Ok((device, candidate));
                    }
                }

                Err(default_err.context("no audio output could be started"))
            }
        }
    })?;
    device.log_on_drop(false);
    let player = Player::connect_new(device.mixer());
    player.pause();
    Ok((device, player, name))
}

fn device_label(device: &rodio::cpal::Device) -> Option<String> {
    device
        .description()
        .ok()
        .map(|description| description.name().to_string())
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

#[derive(Debug)]
struct SimulatedState {
    default_duration: Option<f64>,
    loaded: bool,
    duration: Option<f64>,
    offset: f64,
    started_at: Option<Instant>,
    rate: f64,
    volume: f32,
    muted: bool,
    finished: bool,
    last_progress: Option<Instant>,
    rejections: VecDeque<PlayRejection>,
    pending: Vec<MediaSignal>,
}

impl SimulatedState {
    fn position(&self) -> f64 {
        let mut position = self.offset;
        if let Some(started) = self.started_at {
            position += started.elapsed().as_secs_f64() * self.rate;
        }
        match self.duration {
            Some(total) => position.min(total),
            None => position,
        }
    }

    /// Folds the running clock into `offset`, keeping the play state.
    fn settle(&mut self) {
        let position = self.position();
        self.offset = position;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}

/// Clock-driven element that "plays" an item for the length its duration
/// label announces. Clones share one state, so a test can keep a handle
/// after boxing the element into a controller.
#[derive(Debug, Clone)]
pub struct SimulatedMediaElement {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedMediaElement {
    /// `default_duration` applies to items without a parseable label.
    pub fn new(default_duration: Option<f64>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimulatedState {
                default_duration: default_duration.filter(|total| total.is_finite() && *total > 0.0),
                loaded: false,
                duration: None,
                offset: 0.0,
                started_at: None,
                rate: 1.0,
                volume: 1.0,
                muted: false,
                finished: false,
                last_progress: None,
                rejections: VecDeque::new(),
                pending: Vec::new(),
            })),
        }
    }

    /// The next play request resolves with `rejection` instead of starting.
    pub fn reject_next_play(&self, rejection: PlayRejection) {
        self.state.borrow_mut().rejections.push_back(rejection);
    }

    /// Advances the clock by `seconds` of media time.
    pub fn elapse(&self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        if state.started_at.is_none() || !seconds.is_finite() {
            return;
        }
        state.settle();
        state.offset += seconds.max(0.0);
        state.last_progress = None;
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().started_at.is_some()
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position()
    }

    pub fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    pub fn muted(&self) -> bool {
        self.state.borrow().muted
    }
}

impl MediaElement for SimulatedMediaElement {
    fn load(&mut self, item: &MediaItem) {
        let mut state = self.state.borrow_mut();
        let duration = parse_duration_label(&item.duration_label)
            .filter(|total| *total > 0.0)
            .or(state.default_duration);
        state.loaded = true;
        state.duration = duration;
        state.offset = 0.0;
        state.started_at = None;
        state.finished = false;
        state.last_progress = None;
        state.pending.push(MediaSignal::MetadataReady {
            total: duration.unwrap_or(f64::NAN),
        });
    }

    fn play(&mut self, request: PlayRequestId) {
        let mut state = self.state.borrow_mut();
        let outcome = if let Some(rejection) = state.rejections.pop_front() {
            Err(rejection)
        } else if !state.loaded {
            Err(PlayRejection::NoSource)
        } else {
            if state.started_at.is_none() {
                state.started_at = Some(Instant::now());
            }
            state.finished = false;
            Ok(())
        };
        state
            .pending
            .push(MediaSignal::PlayResolved { request, outcome });
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.offset = state.position();
        state.started_at = None;
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        if !seconds.is_finite() {
            return;
        }
        state.settle();
        let mut target = seconds.max(0.0);
        if let Some(total) = state.duration {
            target = target.min(total);
        }
        state.offset = target;
        state.finished = false;
        state.last_progress = None;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn set_playback_rate(&mut self, rate: f32) {
        let mut state = self.state.borrow_mut();
        state.settle();
        state.rate = f64::from(rate).max(0.0);
    }

    fn poll_signals(&mut self) -> Vec<MediaSignal> {
        let mut state = self.state.borrow_mut();
        let mut signals = std::mem::take(&mut state.pending);
        if state.started_at.is_none() {
            return signals;
        }

        let position = state.position();
        let total = state.duration;
        let now = Instant::now();
        if total.is_some_and(|total| position >= total) && !state.finished {
            state.finished = true;
            state.offset = position;
            state.started_at = None;
            signals.push(MediaSignal::TimeUpdated {
                current: position,
                total: total.unwrap_or(f64::NAN),
            });
            signals.push(MediaSignal::Finished);
        } else if due(state.last_progress, now) {
            state.last_progress = Some(now);
            signals.push(MediaSignal::TimeUpdated {
                current: position,
                total: total.unwrap_or(f64::NAN),
            });
        }
        signals
    }
}

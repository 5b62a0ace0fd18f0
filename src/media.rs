use crate::model::MediaItem;
use std::fmt;
use tracing::debug;

/// Tags one asynchronous play request so its late outcome can be matched
/// against whatever load is active by the time it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayRequestId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    /// The host refused to start playback (autoplay policy, busy device).
    NotAllowed(String),
    /// The source could not be opened or decoded.
    Unsupported(String),
    NoSource,
}

impl fmt::Display for PlayRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed(reason) => write!(f, "playback not allowed: {reason}"),
            Self::Unsupported(reason) => write!(f, "unsupported media: {reason}"),
            Self::NoSource => write!(f, "no source loaded"),
        }
    }
}

impl std::error::Error for PlayRejection {}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    TimeUpdated { current: f64, total: f64 },
    /// `total` is NaN when the element cannot tell how long the item is.
    MetadataReady { total: f64 },
    Finished,
    PlayResolved {
        request: PlayRequestId,
        outcome: Result<(), PlayRejection>,
    },
}

/// A playable element the controller drives but never constructs.
///
/// `play` never answers synchronously: its outcome is delivered later as a
/// [`MediaSignal::PlayResolved`] from `poll_signals`.
pub trait MediaElement {
    fn load(&mut self, item: &MediaItem);
    fn play(&mut self, request: PlayRequestId);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn set_playback_rate(&mut self, rate: f32);
    fn poll_signals(&mut self) -> Vec<MediaSignal>;
}

impl<M: MediaElement + ?Sized> MediaElement for Box<M> {
    fn load(&mut self, item: &MediaItem) {
        (**self).load(item);
    }

    fn play(&mut self, request: PlayRequestId) {
        (**self).play(request);
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn seek(&mut self, seconds: f64) {
        (**self).seek(seconds);
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume);
    }

    fn set_muted(&mut self, muted: bool) {
        (**self).set_muted(muted);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        (**self).set_playback_rate(rate);
    }

    fn poll_signals(&mut self) -> Vec<MediaSignal> {
        (**self).poll_signals()
    }
}

/// Clamps a pointer position against a progress track into `[0, 1]`.
pub fn pointer_fraction(x: f64, track_left: f64, track_width: f64) -> Option<f64> {
    if !(track_width.is_finite() && track_width > 0.0) || !x.is_finite() {
        return None;
    }
    Some(((x - track_left) / track_width).clamp(0.0, 1.0))
}

fn known_length(total: f64) -> Option<f64> {
    (total.is_finite() && total > 0.0).then_some(total)
}

/// One element plus the transport state that must survive source changes.
#[derive(Debug)]
pub struct MediaBinding<M> {
    element: M,
    volume: f32,
    muted: bool,
    rate: f32,
    position: f64,
    total: Option<f64>,
}

impl<M: MediaElement> MediaBinding<M> {
    pub fn new(mut element: M, volume: f32) -> Self {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        element.set_volume(volume);
        Self {
            element,
            volume,
            muted: false,
            rate: 1.0,
            position: 0.0,
            total: None,
        }
    }

    pub fn element(&self) -> &M {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut M {
        &mut self.element
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn total(&self) -> Option<f64> {
        self.total
    }

    /// Progress in `[0, 1]`, or `None` while the length is unknown.
    pub fn progress(&self) -> Option<f64> {
        let total = self.total?;
        Some((self.position / total).clamp(0.0, 1.0))
    }

    pub fn load(&mut self, item: &MediaItem) {
        debug!(source = %item.source, "loading media");
        self.position = 0.0;
        self.total = None;
        self.element.load(item);
        self.element.set_volume(self.volume);
        self.element.set_muted(self.muted);
        self.element.set_playback_rate(self.rate);
    }

    pub fn play(&mut self, request: PlayRequestId) {
        self.element.play(request);
    }

    pub fn pause(&mut self) {
        self.element.pause();
    }

    /// Drains element signals, keeping position and length current.
    pub fn poll(&mut self) -> Vec<MediaSignal> {
        let signals = self.element.poll_signals();
        for signal in &signals {
            match signal {
                MediaSignal::TimeUpdated { current, total } => {
                    if current.is_finite() {
                        self.position = current.max(0.0);
                    }
                    if let Some(total) = known_length(*total) {
                        self.total = Some(total);
                    }
                }
                MediaSignal::MetadataReady { total } => {
                    self.total = known_length(*total);
                }
                MediaSignal::Finished => {
                    if let Some(total) = self.total {
                        self.position = total;
                    }
                }
                MediaSignal::PlayResolved { .. } => {}
            }
        }
        signals
    }

    pub fn seek_to(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let mut target = seconds.max(0.0);
        if let Some(total) = self.total {
            target = target.min(total);
        }
        self.position = target;
        self.element.seek(target);
    }

    /// Ignored until the element has reported a length.
    pub fn seek_fraction(&mut self, fraction: f64) -> bool {
        let Some(total) = self.total else {
            return false;
        };
        if fraction.is_nan() {
            return false;
        }
        self.seek_to(fraction.clamp(0.0, 1.0) * total);
        true
    }

    pub fn seek_from_pointer(&mut self, x: f64, track_left: f64, track_width: f64) -> bool {
        match pointer_fraction(x, track_left, track_width) {
            Some(fraction) => self.seek_fraction(fraction),
            None => false,
        }
    }

    pub fn seek_relative(&mut self, delta: f64) {
        self.seek_to(self.position + delta);
    }

    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.element.set_volume(self.volume);
    }

    pub fn step_volume(&mut self, delta: f32) {
        self.set_volume(self.volume + delta);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.element.set_muted(muted);
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        self.element.set_playback_rate(rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingElement {
        calls: Vec<String>,
        queued: Vec<MediaSignal>,
    }

    impl MediaElement for RecordingElement {
        fn load(&mut self, item: &MediaItem) {
            self.calls.push(format!("load {}", item.source));
        }

        fn play(&mut self, request: PlayRequestId) {
            self.calls.push(format!("play {}", request.0));
        }

        fn pause(&mut self) {
            self.calls.push(String::from("pause"));
        }

        fn seek(&mut self, seconds: f64) {
            self.calls.push(format!("seek {seconds}"));
        }

        fn set_volume(&mut self, volume: f32) {
            self.calls.push(format!("volume {volume}"));
        }

        fn set_muted(&mut self, muted: bool) {
            self.calls.push(format!("muted {muted}"));
        }

        fn set_playback_rate(&mut self, rate: f32) {
            self.calls.push(format!("rate {rate}"));
        }

        fn poll_signals(&mut self) -> Vec<MediaSignal> {
            std::mem::take(&mut self.queued)
        }
    }

    fn loaded_binding(total: f64) -> MediaBinding<RecordingElement> {
        let mut binding = MediaBinding::new(RecordingElement::default(), 0.8);
        binding.load(&MediaItem::new("clip.mp4", "clip", ""));
        binding
            .element_mut()
            .queued
            .push(MediaSignal::MetadataReady { total });
        binding.poll();
        binding.element_mut().calls.clear();
        binding
    }

    #[test]
    fn load_reapplies_transport_state() {
        let mut binding = MediaBinding::new(RecordingElement::default(), 0.5);
        binding.set_muted(true);
        binding.set_rate(1.5);
        binding.element_mut().calls.clear();

        binding.load(&MediaItem::new("a.mp3", "a", ""));
        assert_eq!(
            binding.element().calls,
            vec!["load a.mp3", "volume 0.5", "muted true", "rate 1.5"]
        );
        assert_eq!(binding.position(), 0.0);
        assert_eq!(binding.total(), None);
    }

    #[test]
    fn pointer_clicks_outside_track_are_clamped() {
        assert_eq!(pointer_fraction(150.0, 100.0, 200.0), Some(0.25));
        assert_eq!(pointer_fraction(20.0, 100.0, 200.0), Some(0.0));
        assert_eq!(pointer_fraction(900.0, 100.0, 200.0), Some(1.0));
        assert_eq!(pointer_fraction(150.0, 100.0, 0.0), None);
    }

    #[test]
    fn seek_from_pointer_scales_by_length() {
        let mut binding = loaded_binding(200.0);
        assert!(binding.seek_from_pointer(150.0, 100.0, 200.0));
        assert_eq!(binding.element().calls, vec!["seek 50"]);
        assert_eq!(binding.position(), 50.0);
    }

    #[test]
    fn fraction_seek_waits_for_metadata() {
        let mut binding = MediaBinding::new(RecordingElement::default(), 0.8);
        binding.load(&MediaItem::new("a.mp3", "a", ""));
        assert!(!binding.seek_fraction(0.5));

        let mut unknown = loaded_binding(f64::NAN);
        assert!(!unknown.seek_fraction(0.5));
    }

    #[test]
    fn relative_seek_stays_in_bounds() {
        let mut binding = loaded_binding(30.0);
        binding.seek_relative(-10.0);
        assert_eq!(binding.position(), 0.0);
        binding.seek_relative(45.0);
        assert_eq!(binding.position(), 30.0);
    }

    #[test]
    fn volume_steps_are_clamped() {
        let mut binding = MediaBinding::new(RecordingElement::default(), 0.95);
        binding.step_volume(0.1);
        assert_eq!(binding.volume(), 1.0);
        binding.set_volume(-3.0);
        assert_eq!(binding.volume(), 0.0);
        binding.set_volume(f32::NAN);
        assert_eq!(binding.volume(), 0.0);
    }

    #[test]
    fn time_updates_track_position() {
        let mut binding = loaded_binding(100.0);
        binding.element_mut().queued.push(MediaSignal::TimeUpdated {
            current: 25.0,
            total: 100.0,
        });
        binding.poll();
        assert_eq!(binding.progress(), Some(0.25));
    }
}

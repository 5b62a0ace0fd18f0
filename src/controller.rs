use crate::media::{MediaBinding, MediaElement, MediaSignal, PlayRejection, PlayRequestId};
use crate::model::{MediaItem, MediaKind};
use crate::queue::{Direction, QueueState, QueueStep};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

pub const PLAYBACK_SPEEDS: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];
const NORMAL_SPEED_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Loading => "Loading",
            Self::Ready => "Ready",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },
    ItemChanged {
        index: usize,
    },
    Progress {
        current: f64,
        total: f64,
    },
    DurationKnown {
        total: f64,
    },
    ShuffleChanged(bool),
    RepeatChanged(bool),
    VolumeChanged {
        volume: f32,
        muted: bool,
    },
    SpeedChanged(f32),
    Notice(String),
}

/// Owns one queue and one media binding and turns user intents and media
/// signals into state transitions.
///
/// Presentation never happens here: hosts read the accessors or listen on
/// [`PlaybackController::subscribe`] and draw from that.
pub struct PlaybackController<M: MediaElement> {
    kind: MediaKind,
    queue: QueueState,
    binding: MediaBinding<M>,
    state: PlaybackState,
    play_intent: bool,
    pending_play: Option<PlayRequestId>,
    next_request: u64,
    speed_index: usize,
    subscribers: Vec<Sender<ControllerEvent>>,
}

impl<M: MediaElement> PlaybackController<M> {
    pub fn new(kind: MediaKind, queue: QueueState, element: M, volume: f32) -> Self {
        Self {
            kind,
            queue,
            binding: MediaBinding::new(element, volume),
            state: PlaybackState::Idle,
            play_intent: false,
            pending_play: None,
            next_request: 0,
            speed_index: NORMAL_SPEED_INDEX,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<ControllerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &QueueState {
        &self.queue
    }

    pub fn binding(&self) -> &MediaBinding<M> {
        &self.binding
    }

    pub fn element_mut(&mut self) -> &mut M {
        self.binding.element_mut()
    }

    /// Index of the loaded item; `None` until something has been selected.
    pub fn current_index(&self) -> Option<usize> {
        if self.state == PlaybackState::Idle {
            return None;
        }
        self.queue.current_index()
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.current_index().and_then(|_| self.queue.current())
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn has_pending_play(&self) -> bool {
        self.pending_play.is_some()
    }

    pub fn wants_playback(&self) -> bool {
        self.state == PlaybackState::Playing || self.play_intent || self.pending_play.is_some()
    }

    pub fn speed(&self) -> f32 {
        PLAYBACK_SPEEDS[self.speed_index]
    }

    /// Selects an item, keeping whatever play/pause intent was in effect.
    pub fn select(&mut self, index: usize) -> bool {
        let intent = self.wants_playback();
        self.load_index(index, intent)
    }

    /// Selects an item and starts it once it is ready.
    pub fn play_index(&mut self, index: usize) -> bool {
        self.load_index(index, true)
    }

    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Idle => {
                if self.queue.is_empty() {
                    debug!(kind = self.kind.label(), "play ignored on empty queue");
                    return;
                }
                self.load_current(true);
            }
            PlaybackState::Loading => self.play_intent = true,
            PlaybackState::Ready | PlaybackState::Paused => self.request_play(),
            PlaybackState::Playing => {}
        }
    }

    pub fn pause(&mut self) {
        self.play_intent = false;
        self.pending_play = None;
        if self.state == PlaybackState::Playing {
            self.binding.pause();
            self.transition(PlaybackState::Paused);
        }
    }

    pub fn toggle_play(&mut self) {
        if self.wants_playback() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pauses and rewinds to the start of the current item.
    pub fn stop(&mut self) {
        self.pause();
        if self.state != PlaybackState::Idle {
            self.binding.seek_to(0.0);
            self.emit_progress();
        }
    }

    pub fn next(&mut self) {
        self.step(Direction::Forward);
    }

    pub fn previous(&mut self) {
        self.step(Direction::Backward);
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.queue.set_shuffle(enabled);
        self.emit(ControllerEvent::ShuffleChanged(enabled));
        self.notice(if enabled { "Shuffle on" } else { "Shuffle off" });
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.queue.shuffle());
    }

    pub fn set_repeat(&mut self, enabled: bool) {
        self.queue.set_repeat(enabled);
        self.emit(ControllerEvent::RepeatChanged(enabled));
        self.notice(if enabled { "Repeat on" } else { "Repeat off" });
    }

    pub fn toggle_repeat(&mut self) {
        self.set_repeat(!self.queue.repeat());
    }

    pub fn seek_fraction(&mut self, fraction: f64) {
        if self.binding.seek_fraction(fraction) {
            self.emit_progress();
        }
    }

    pub fn seek_from_pointer(&mut self, x: f64, track_left: f64, track_width: f64) {
        if self.binding.seek_from_pointer(x, track_left, track_width) {
            self.emit_progress();
        }
    }

    pub fn seek_relative(&mut self, delta: f64) {
        if self.state == PlaybackState::Idle {
            return;
        }
        self.binding.seek_relative(delta);
        self.emit_progress();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.binding.set_volume(volume);
        self.emit_volume();
    }

    pub fn step_volume(&mut self, delta: f32) {
        self.binding.step_volume(delta);
        self.emit_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.binding.toggle_mute();
        self.emit_volume();
    }

    pub fn cycle_speed(&mut self) {
        self.speed_index = (self.speed_index + 1) % PLAYBACK_SPEEDS.len();
        let speed = self.speed();
        self.binding.set_rate(speed);
        self.emit(ControllerEvent::SpeedChanged(speed));
        self.notice(&format!("Playback speed {speed}x"));
    }

    /// Applies everything the element reported since the last call.
    pub fn pump(&mut self) {
        for signal in self.binding.poll() {
            self.handle_signal(signal);
        }
    }

    fn handle_signal(&mut self, signal: MediaSignal) {
        match signal {
            MediaSignal::TimeUpdated { current, total } => {
                self.emit(ControllerEvent::Progress { current, total });
            }
            MediaSignal::MetadataReady { total } => {
                if self.state != PlaybackState::Loading {
                    debug!(kind = self.kind.label(), "metadata outside of a load ignored");
                    return;
                }
                self.emit(ControllerEvent::DurationKnown { total });
                self.transition(PlaybackState::Ready);
                if self.play_intent {
                    self.request_play();
                }
            }
            MediaSignal::Finished => {
                if self.state == PlaybackState::Playing {
                    self.on_finished();
                }
            }
            MediaSignal::PlayResolved { request, outcome } => {
                self.on_play_resolved(request, outcome);
            }
        }
    }

    fn on_play_resolved(&mut self, request: PlayRequestId, outcome: Result<(), PlayRejection>) {
        if self.pending_play != Some(request) {
            debug!(
                kind = self.kind.label(),
                request = request.0,
                "stale play resolution ignored"
            );
            // A superseded start that still succeeded must not leave sound running.
            if outcome.is_ok() && self.state != PlaybackState::Playing {
                self.binding.pause();
            }
            return;
        }

        self.pending_play = None;
        match outcome {
            Ok(()) => debug!(kind = self.kind.label(), request = request.0, "playback started"),
            Err(rejection) => {
                warn!(kind = self.kind.label(), %rejection, "play request rejected");
                self.binding.pause();
                let fallback = if self.binding.position() > 0.0 {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Ready
                };
                self.transition(fallback);
                self.notice(&format!(
                    "Unable to play {}. Press play to retry.",
                    self.kind.noun()
                ));
            }
        }
    }

    fn on_finished(&mut self) {
        match self.queue.on_item_finished() {
            Some(QueueStep::Replay(index)) => {
                debug!(kind = self.kind.label(), index, "replaying item");
                self.binding.seek_to(0.0);
                self.request_play();
            }
            // Finished is only honoured while Playing, so the next item starts too.
            Some(QueueStep::Advanced(_)) => self.load_current(true),
            None => self.transition(PlaybackState::Idle),
        }
    }

    fn step(&mut self, direction: Direction) {
        let intent = self.wants_playback();
        if self.queue.advance(direction).is_some() {
            self.load_current(intent);
        }
    }

    fn load_index(&mut self, index: usize, intent: bool) -> bool {
        if self.queue.jump_to(index).is_none() {
            debug!(
                kind = self.kind.label(),
                index,
                len = self.queue.len(),
                "out-of-bounds selection ignored"
            );
            return false;
        }
        self.load_current(intent);
        true
    }

    fn load_current(&mut self, intent: bool) {
        let Some(index) = self.queue.current_index() else {
            return;
        };
        let Some(item) = self.queue.current().cloned() else {
            return;
        };

        self.pending_play = None;
        self.play_intent = intent;
        self.binding.load(&item);
        self.transition(PlaybackState::Loading);
        info!(kind = self.kind.label(), index, title = %item.title, "item selected");
        self.emit(ControllerEvent::ItemChanged { index });
        self.notice(&format!("Now playing: {}", item.title));
    }

    fn request_play(&mut self) {
        self.next_request += 1;
        let request = PlayRequestId(self.next_request);
        self.pending_play = Some(request);
        self.play_intent = false;
        self.binding.play(request);
        self.transition(PlaybackState::Playing);
    }

    fn transition(&mut self, to: PlaybackState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(kind = self.kind.label(), from = from.label(), to = to.label(), "state changed");
        self.emit(ControllerEvent::StateChanged { from, to });
    }

    fn emit_progress(&mut self) {
        let current = self.binding.position();
        let total = self.binding.total().unwrap_or(f64::NAN);
        self.emit(ControllerEvent::Progress { current, total });
    }

    fn emit_volume(&mut self) {
        let volume = self.binding.volume();
        let muted = self.binding.muted();
        self.emit(ControllerEvent::VolumeChanged { volume, muted });
    }

    fn notice(&mut self, message: &str) {
        self.emit(ControllerEvent::Notice(message.to_string()));
    }

    fn emit(&mut self, event: ControllerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

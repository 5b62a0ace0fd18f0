use crate::catalog::{Catalog, SearchHits};
use crate::config::KeyValueStore;
use crate::controller::{ControllerEvent, PlaybackController, PlaybackState};
use crate::favorites::FavoritesStore;
use crate::media::MediaElement;
use crate::model::{FavoriteRecord, MediaKind, Settings, Theme, VideoQuality};
use crate::queue::QueueState;
use crate::settings::SettingsStore;
use crate::stagger::StaggeredStarts;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const SEEK_STEP_SECONDS: f64 = 10.0;
pub const VOLUME_STEP: f32 = 0.1;
pub const NOTICE_TTL: Duration = Duration::from_secs(3);
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(800);

pub type DynController = PlaybackController<Box<dyn MediaElement>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Videos,
    Music,
    Favorites,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Videos, Section::Music, Section::Favorites];

    pub fn label(self) -> &'static str {
        match self {
            Self::Videos => "Videos",
            Self::Music => "Music",
            Self::Favorites => "Favorites",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Videos => Self::Music,
            Self::Music => Self::Favorites,
            Self::Favorites => Self::Videos,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Videos => Self::Favorites,
            Self::Music => Self::Videos,
            Self::Favorites => Self::Music,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Videos => 0,
            Self::Music => 1,
            Self::Favorites => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub shown_at: Instant,
}

/// Everything one player session owns.
pub struct LuminexCore {
    pub catalog: Catalog,
    video: DynController,
    music: DynController,
    video_events: Receiver<ControllerEvent>,
    music_events: Receiver<ControllerEvent>,
    favorites: FavoritesStore,
    settings: SettingsStore,
    starts: StaggeredStarts<MediaKind>,
    section: Section,
    cursors: [usize; 3],
    search: Option<(String, SearchHits)>,
    notice: Option<Notice>,
    pub status: String,
    pub dirty: bool,
}

impl LuminexCore {
    pub fn new(
        catalog: Catalog,
        video_element: Box<dyn MediaElement>,
        music_element: Box<dyn MediaElement>,
        storage: Rc<dyn KeyValueStore>,
    ) -> Self {
        let video_queue = QueueState::new(catalog.videos.clone());
        let music_queue = QueueState::new(catalog.tracks.clone());
        Self::with_queues(catalog, video_queue, music_queue, video_element, music_element, storage)
    }

    /// Same as [`LuminexCore::new`] with deterministic shuffle order.
    pub fn seeded(
        catalog: Catalog,
        video_element: Box<dyn MediaElement>,
        music_element: Box<dyn MediaElement>,
        storage: Rc<dyn KeyValueStore>,
        seed: u64,
    ) -> Self {
        let video_queue = QueueState::seeded(catalog.videos.clone(), seed);
        let music_queue = QueueState::seeded(catalog.tracks.clone(), seed.wrapping_add(1));
        Self::with_queues(catalog, video_queue, music_queue, video_element, music_element, storage)
    }

    fn with_queues(
        catalog: Catalog,
        video_queue: QueueState,
        music_queue: QueueState,
        video_element: Box<dyn MediaElement>,
        music_element: Box<dyn MediaElement>,
        storage: Rc<dyn KeyValueStore>,
    ) -> Self {
        let favorites = FavoritesStore::load(Rc::clone(&storage));
        let settings = SettingsStore::load(storage);
        let gain = settings.get().volume_gain();

        let mut video = PlaybackController::new(MediaKind::Video, video_queue, video_element, gain);
        let mut music = PlaybackController::new(MediaKind::Track, music_queue, music_element, gain);
        let video_events = video.subscribe();
        let music_events = music.subscribe();

        info!(
            videos = catalog.videos.len(),
            tracks = catalog.tracks.len(),
            favorites = favorites.len(),
            "session started"
        );

        Self {
            catalog,
            video,
            music,
            video_events,
            music_events,
            favorites,
            settings,
            starts: StaggeredStarts::new(),
            section: Section::Videos,
            cursors: [0; 3],
            search: None,
            notice: None,
            status: String::from("Ready"),
            dirty: true,
        }
    }

    pub fn controller(&self, kind: MediaKind) -> &DynController {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Track => &self.music,
        }
    }

    pub fn controller_mut(&mut self, kind: MediaKind) -> &mut DynController {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Track => &mut self.music,
        }
    }

    pub fn favorites(&self) -> &[FavoriteRecord] {
        self.favorites.records()
    }

    pub fn is_favorite(&self, kind: MediaKind, index: usize) -> bool {
        self.favorites.contains(kind, index)
    }

    pub fn settings(&self) -> &Settings {
        self.settings.get()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search.as_ref().map(|(query, _)| query.as_str())
    }

    pub fn pending_starts(&self) -> usize {
        self.starts.len()
    }

    /// Kind that transport keys act on: music in the Music section, video
    /// everywhere else.
    pub fn active_kind(&self) -> MediaKind {
        match self.section {
            Section::Music => MediaKind::Track,
            Section::Videos | Section::Favorites => MediaKind::Video,
        }
    }

    pub fn set_section(&mut self, section: Section) {
        if self.section != section {
            self.section = section;
            self.dirty = true;
        }
    }

    pub fn next_section(&mut self) {
        self.set_section(self.section.next());
    }

    pub fn prev_section(&mut self) {
        self.set_section(self.section.prev());
    }

    /// Catalog indices listed in a section, after the search filter.
    pub fn visible_indices(&self, kind: MediaKind) -> Vec<usize> {
        match &self.search {
            Some((_, hits)) => hits.for_kind(kind).to_vec(),
            None => (0..self.catalog.items(kind).len()).collect(),
        }
    }

    fn visible_len(&self) -> usize {
        match self.section {
            Section::Videos => self.visible_indices(MediaKind::Video).len(),
            Section::Music => self.visible_indices(MediaKind::Track).len(),
            Section::Favorites => self.favorites.len(),
        }
    }

    /// Row of the highlighted entry in the current section's list.
    pub fn cursor(&self) -> usize {
        self.cursors[self.section.slot()]
    }

    pub fn select_next(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let slot = self.section.slot();
        self.cursors[slot] = (self.cursors[slot] + 1).min(len - 1);
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        let slot = self.section.slot();
        self.cursors[slot] = self.cursors[slot].saturating_sub(1);
        self.dirty = true;
    }

    fn clamp_cursors(&mut self) {
        let lens = [
            self.visible_indices(MediaKind::Video).len(),
            self.visible_indices(MediaKind::Track).len(),
            self.favorites.len(),
        ];
        for (cursor, len) in self.cursors.iter_mut().zip(lens) {
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
    }

    /// Catalog item under the cursor in the Videos or Music section.
    pub fn highlighted_item(&self) -> Option<(MediaKind, usize)> {
        let kind = match self.section {
            Section::Videos => MediaKind::Video,
            Section::Music => MediaKind::Track,
            Section::Favorites => {
                let record = self.favorites.get(self.cursor())?;
                return Some((record.kind, record.index));
            }
        };
        self.visible_indices(kind)
            .get(self.cursor())
            .map(|index| (kind, *index))
    }

    /// Enter on a row: play the item, or the favorite it points at.
    pub fn activate_selected(&mut self) {
        if self.section == Section::Favorites {
            self.play_favorite(self.cursor());
            return;
        }
        let Some((kind, index)) = self.highlighted_item() else {
            self.set_status("Nothing selected");
            return;
        };
        self.controller_mut(kind).play_index(index);
        self.dirty = true;
    }

    pub fn play_favorite(&mut self, position: usize) {
        let Some(record) = self.favorites.get(position) else {
            self.set_status("No favorite selected");
            return;
        };
        let (kind, index) = (record.kind, record.index);
        if self.catalog.item(kind, index).is_none() {
            warn!(kind = kind.label(), index, "favorite points past the catalog");
            self.show_notice("Favorite is no longer in the catalog");
            return;
        }
        self.controller_mut(kind).play_index(index);
        self.set_section(match kind {
            MediaKind::Video => Section::Videos,
            MediaKind::Track => Section::Music,
        });
    }

    pub fn toggle_favorite(&mut self, kind: MediaKind, index: usize) {
        let Some(item) = self.catalog.item(kind, index).cloned() else {
            return;
        };
        match self.favorites.toggle(kind, index, &item) {
            Ok(true) => self.show_notice("Added to favorites"),
            Ok(false) => self.show_notice("Removed from favorites"),
            Err(err) => self.persistence_failed("favorites", &err),
        }
        self.clamp_cursors();
    }

    /// Toggles the highlighted row; in the Favorites section this removes it.
    pub fn toggle_favorite_selected(&mut self) {
        if self.section == Section::Favorites {
            self.remove_favorite(self.cursor());
            return;
        }
        if let Some((kind, index)) = self.highlighted_item() {
            self.toggle_favorite(kind, index);
        }
    }

    pub fn remove_favorite(&mut self, position: usize) {
        let Some(key) = self.favorites.get(position).map(FavoriteRecord::key) else {
            return;
        };
        match self.favorites.remove(key) {
            Ok(true) => self.show_notice("Removed from favorites"),
            Ok(false) => {}
            Err(err) => self.persistence_failed("favorites", &err),
        }
        self.clamp_cursors();
    }

    pub fn clear_favorites(&mut self) {
        match self.favorites.clear() {
            Ok(()) => self.show_notice("Favorites cleared"),
            Err(err) => self.persistence_failed("favorites", &err),
        }
        self.clamp_cursors();
    }

    pub fn toggle_play(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).toggle_play();
        self.dirty = true;
    }

    pub fn next(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).next();
    }

    pub fn previous(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).previous();
    }

    pub fn seek_forward(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).seek_relative(SEEK_STEP_SECONDS);
    }

    pub fn seek_backward(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).seek_relative(-SEEK_STEP_SECONDS);
    }

    pub fn seek_fraction(&mut self, fraction: f64) {
        let kind = self.active_kind();
        self.controller_mut(kind).seek_fraction(fraction);
    }

    pub fn volume_up(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).step_volume(VOLUME_STEP);
    }

    pub fn volume_down(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).step_volume(-VOLUME_STEP);
    }

    pub fn toggle_mute(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).toggle_mute();
    }

    pub fn toggle_shuffle(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).toggle_shuffle();
    }

    pub fn toggle_repeat(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).toggle_repeat();
    }

    pub fn cycle_speed(&mut self) {
        let kind = self.active_kind();
        self.controller_mut(kind).cycle_speed();
    }

    pub fn search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.clear_search();
            return;
        }
        let hits = self.catalog.search(query);
        let total = hits.total();
        self.search = Some((query.to_string(), hits));
        self.clamp_cursors();
        self.set_status(&format!("{total} results for \"{query}\""));
    }

    pub fn clear_search(&mut self) {
        if self.search.take().is_some() {
            self.clamp_cursors();
            self.set_status("Search cleared");
        }
    }

    pub fn toggle_theme(&mut self) {
        let theme = self.settings.get().theme.toggle();
        self.set_theme(theme);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let message = match theme {
            Theme::Light => "Light theme enabled",
            Theme::Dark => "Dark theme enabled",
        };
        self.update_settings(|settings| settings.theme = theme, message);
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        let message = if enabled {
            "Autoplay enabled"
        } else {
            "Autoplay disabled"
        };
        self.update_settings(|settings| settings.autoplay = enabled, message);
    }

    pub fn set_volume_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        self.update_settings(
            |settings| settings.volume = percent,
            &format!("Volume set to {percent}%"),
        );
    }

    pub fn set_quality(&mut self, quality: VideoQuality) {
        self.update_settings(
            |settings| settings.quality = quality,
            &format!("Video quality set to {}", quality.label()),
        );
    }

    pub fn set_animations(&mut self, enabled: bool) {
        let message = if enabled {
            "Animations enabled"
        } else {
            "Animations disabled"
        };
        self.update_settings(|settings| settings.animations = enabled, message);
    }

    pub fn set_visualizer(&mut self, enabled: bool) {
        let message = if enabled {
            "Visualizer enabled"
        } else {
            "Visualizer disabled"
        };
        self.update_settings(|settings| settings.visualizer = enabled, message);
    }

    pub fn reset_settings(&mut self) {
        self.commit_settings(|store| store.reset().cloned(), "Settings reset to defaults");
    }

    fn update_settings(&mut self, change: impl FnOnce(&mut Settings), message: &str) {
        self.commit_settings(|store| store.update(change).cloned(), message);
    }

    fn commit_settings(
        &mut self,
        write: impl FnOnce(&mut SettingsStore) -> anyhow::Result<Settings>,
        message: &str,
    ) {
        let before = self.settings.get().clone();
        let result = write(&mut self.settings);
        let after = match result {
            Ok(after) => {
                self.show_notice(message);
                after
            }
            Err(err) => {
                self.persistence_failed("settings", &err);
                self.settings.get().clone()
            }
        };
        self.apply_settings(&before, &after);
    }

    fn apply_settings(&mut self, before: &Settings, after: &Settings) {
        if before.volume != after.volume {
            let gain = after.volume_gain();
            self.video.set_volume(gain);
            self.music.set_volume(gain);
        }
        self.dirty = true;
    }

    /// Starts the video player now and the music player `delay` later.
    pub fn play_all(&mut self, delay: Duration, now: Instant) {
        self.starts.cancel_all();
        self.starts
            .schedule([MediaKind::Video, MediaKind::Track], delay, now);
        info!(delay_ms = delay.as_millis() as u64, "staggered start scheduled");
        self.set_status("Starting all players");
    }

    /// Stops both players and drops any start that has not fired yet.
    pub fn stop_all(&mut self) {
        let cancelled = self.starts.cancel_all();
        self.video.stop();
        self.music.stop();
        info!(cancelled, "stopped all players");
        self.set_status("Stopped all players");
    }

    /// One turn of the event loop: fire due starts, apply media signals and
    /// fold controller events into the status line.
    pub fn tick(&mut self, now: Instant) {
        for kind in self.starts.tick(now) {
            self.controller_mut(kind).play();
        }

        self.video.pump();
        self.music.pump();
        self.drain_events(MediaKind::Video, now);
        self.drain_events(MediaKind::Track, now);

        if self
            .notice
            .as_ref()
            .is_some_and(|notice| now.saturating_duration_since(notice.shown_at) >= NOTICE_TTL)
        {
            self.notice = None;
            self.dirty = true;
        }
    }

    fn drain_events(&mut self, kind: MediaKind, now: Instant) {
        let events: Vec<ControllerEvent> = match kind {
            MediaKind::Video => self.video_events.try_iter().collect(),
            MediaKind::Track => self.music_events.try_iter().collect(),
        };
        for event in events {
            match event {
                ControllerEvent::Notice(message) => {
                    self.notice = Some(Notice {
                        message: message.clone(),
                        shown_at: now,
                    });
                    self.status = message;
                }
                ControllerEvent::StateChanged {
                    to: PlaybackState::Idle,
                    ..
                } => self.status = String::from("Queue ended"),
                _ => {}
            }
            self.dirty = true;
        }
    }

    fn persistence_failed(&mut self, what: &str, err: &anyhow::Error) {
        let error = format!("{err:#}");
        warn!(what, %error, "failed to persist");
        self.show_notice(&format!("Could not save {what}"));
    }

    fn show_notice(&mut self, message: &str) {
        self.notice = Some(Notice {
            message: message.to_string(),
            shown_at: Instant::now(),
        });
        self.set_status(message);
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SimulatedMediaElement;
    use crate::config::{FAVORITES_SLOT, MemoryStore};
    use crate::media::PlayRejection;

    struct Harness {
        core: LuminexCore,
        video: SimulatedMediaElement,
        music: SimulatedMediaElement,
        memory: MemoryStore,
    }

    fn harness_with(memory: MemoryStore) -> Harness {
        let video = SimulatedMediaElement::new(None);
        let music = SimulatedMediaElement::new(None);
        let core = LuminexCore::seeded(
            Catalog::builtin(),
            Box::new(video.clone()),
            Box::new(music.clone()),
            Rc::new(memory.clone()),
            3,
        );
        Harness {
            core,
            video,
            music,
            memory,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryStore::new())
    }

    /// Two ticks: one delivers metadata, the next the play resolution.
    fn settle(core: &mut LuminexCore) {
        let now = Instant::now();
        core.tick(now);
        core.tick(now);
    }

    #[test]
    fn enter_plays_highlighted_video() {
        let mut h = harness();
        h.core.select_next();
        h.core.activate_selected();
        settle(&mut h.core);

        let video = h.core.controller(MediaKind::Video);
        assert_eq!(video.state(), PlaybackState::Playing);
        assert_eq!(video.current_index(), Some(1));
        assert!(h.video.is_playing());
        assert_eq!(h.core.status, "Now playing: Sintel");
    }

    #[test]
    fn transport_keys_follow_the_section() {
        let mut h = harness();
        h.core.set_section(Section::Music);
        h.core.toggle_play();
        settle(&mut h.core);

        assert!(h.core.controller(MediaKind::Track).is_playing());
        assert_eq!(h.core.controller(MediaKind::Video).state(), PlaybackState::Idle);

        h.core.volume_down();
        assert!((h.music.volume() - 0.7).abs() < 1e-6);
        assert!((h.video.volume() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn rejection_surfaces_a_notice() {
        let mut h = harness();
        h.music
            .reject_next_play(PlayRejection::NotAllowed(String::from("policy")));
        h.core.set_section(Section::Music);
        h.core.activate_selected();
        settle(&mut h.core);

        assert_eq!(h.core.controller(MediaKind::Track).state(), PlaybackState::Ready);
        assert_eq!(
            h.core.notice().map(|notice| notice.message.as_str()),
            Some("Unable to play audio. Press play to retry.")
        );
    }

    #[test]
    fn notices_expire() {
        let mut h = harness();
        h.core.toggle_shuffle();
        let now = Instant::now();
        h.core.tick(now);
        assert!(h.core.notice().is_some());
        h.core.tick(now + NOTICE_TTL + Duration::from_millis(1));
        assert!(h.core.notice().is_none());
    }

    #[test]
    fn favorites_round_trip_through_storage() {
        let memory = MemoryStore::new();
        let mut h = harness_with(memory.clone());
        h.core.set_section(Section::Music);
        h.core.select_next();
        h.core.toggle_favorite_selected();
        assert!(h.core.is_favorite(MediaKind::Track, 1));
        assert!(h.memory.raw(FAVORITES_SLOT).is_some());

        let reloaded = harness_with(memory);
        assert!(reloaded.core.is_favorite(MediaKind::Track, 1));
        assert_eq!(reloaded.core.favorites()[0].item.title, "Test Audio");
    }

    #[test]
    fn playing_a_favorite_switches_section() {
        let mut h = harness();
        h.core.toggle_favorite(MediaKind::Track, 2);
        h.core.set_section(Section::Favorites);
        h.core.activate_selected();
        settle(&mut h.core);

        assert_eq!(h.core.section(), Section::Music);
        assert_eq!(h.core.controller(MediaKind::Track).current_index(), Some(2));
        assert!(h.core.controller(MediaKind::Track).is_playing());
    }

    #[test]
    fn removing_in_favorites_section_keeps_cursor_in_range() {
        let mut h = harness();
        h.core.toggle_favorite(MediaKind::Video, 0);
        h.core.toggle_favorite(MediaKind::Video, 1);
        h.core.set_section(Section::Favorites);
        h.core.select_next();
        assert_eq!(h.core.cursor(), 1);

        h.core.toggle_favorite_selected();
        assert_eq!(h.core.favorites().len(), 1);
        assert_eq!(h.core.cursor(), 0);
        assert_eq!(h.core.status, "Removed from favorites");
    }

    #[test]
    fn volume_setting_reaches_both_players() {
        let mut h = harness();
        h.core.set_volume_percent(40);
        assert!((h.video.volume() - 0.4).abs() < 1e-6);
        assert!((h.music.volume() - 0.4).abs() < 1e-6);
        assert_eq!(h.core.settings().volume, 40);
    }

    #[test]
    fn finished_track_rolls_into_the_next() {
        let mut h = harness();
        h.core.set_autoplay(false);
        h.core.set_section(Section::Music);
        h.core.activate_selected();
        settle(&mut h.core);

        h.music.elapse(400.0);
        settle(&mut h.core);
        settle(&mut h.core);

        let music = h.core.controller(MediaKind::Track);
        assert_eq!(music.current_index(), Some(1));
        assert_eq!(music.state(), PlaybackState::Playing);
        assert!(h.music.is_playing());
        assert!(!h.core.settings().autoplay);
    }

    #[test]
    fn search_filters_listed_items() {
        let mut h = harness();
        h.core.search("dream");
        assert_eq!(h.core.visible_indices(MediaKind::Video), vec![2]);
        assert!(h.core.visible_indices(MediaKind::Track).is_empty());
        assert_eq!(h.core.highlighted_item(), Some((MediaKind::Video, 2)));

        h.core.clear_search();
        assert_eq!(h.core.visible_indices(MediaKind::Track), vec![0, 1, 2]);
    }

    #[test]
    fn stop_all_cancels_pending_starts() {
        let mut h = harness();
        let now = Instant::now();
        h.core.play_all(Duration::from_secs(1), now);
        h.core.tick(now);
        assert_eq!(h.core.pending_starts(), 1);

        h.core.stop_all();
        assert_eq!(h.core.pending_starts(), 0);
        h.core.tick(now + Duration::from_secs(5));
        h.core.tick(now + Duration::from_secs(5));
        assert!(!h.core.controller(MediaKind::Track).wants_playback());
        assert!(!h.core.controller(MediaKind::Video).is_playing());
    }

    #[test]
    fn play_all_starts_players_in_turn() {
        let mut h = harness();
        let now = Instant::now();
        h.core.play_all(Duration::from_millis(500), now);
        h.core.tick(now);
        h.core.tick(now);
        assert!(h.core.controller(MediaKind::Video).is_playing());
        assert!(!h.core.controller(MediaKind::Track).wants_playback());

        let later = now + Duration::from_millis(500);
        h.core.tick(later);
        h.core.tick(later);
        assert!(h.core.controller(MediaKind::Track).is_playing());
    }

    #[test]
    fn failed_save_reverts_and_surfaces_a_notice() {
        let mut h = harness();
        h.memory.set_read_only(true);

        h.core.toggle_favorite(MediaKind::Video, 1);
        assert!(!h.core.is_favorite(MediaKind::Video, 1));
        assert_eq!(
            h.core.notice().map(|notice| notice.message.as_str()),
            Some("Could not save favorites")
        );

        h.core.set_volume_percent(20);
        assert_eq!(h.core.settings().volume, 80);
        assert!((h.video.volume() - 0.8).abs() < 1e-6);
        assert_eq!(h.core.status, "Could not save settings");
    }

    #[test]
    fn reset_restores_default_settings() {
        let mut h = harness();
        h.core.toggle_theme();
        h.core.set_quality(VideoQuality::P480);
        h.core.reset_settings();
        assert_eq!(h.core.settings(), &Settings::default());
        assert_eq!(h.core.status, "Settings reset to defaults");
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Track,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Track => "track",
        }
    }

    /// Word used in user-facing notices ("Unable to play audio").
    pub fn noun(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Track => "audio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(alias = "src")]
    pub source: String,
    pub title: String,
    #[serde(default, alias = "artist", alias = "description")]
    pub secondary_label: String,
    #[serde(default, alias = "poster", alias = "cover")]
    pub thumbnail: String,
    #[serde(default, alias = "duration")]
    pub duration_label: String,
}

impl MediaItem {
    pub fn new(source: &str, title: &str, secondary_label: &str) -> Self {
        Self {
            source: source.to_string(),
            title: title.to_string(),
            secondary_label: secondary_label.to_string(),
            thumbnail: String::new(),
            duration_label: String::new(),
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: &str) -> Self {
        self.thumbnail = thumbnail.to_string();
        self
    }

    pub fn with_duration_label(mut self, label: &str) -> Self {
        self.duration_label = label.to_string();
        self
    }
}

/// Identity of a favorite: which collection, and where in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FavoriteKey {
    pub kind: MediaKind,
    pub index: usize,
}

impl FavoriteKey {
    pub fn new(kind: MediaKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for FavoriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.label(), self.index)
    }
}

impl FromStr for FavoriteKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (kind, index) = raw
            .rsplit_once('-')
            .ok_or_else(|| format!("favorite id without separator: {raw}"))?;
        let kind = match kind {
            "video" => MediaKind::Video,
            "track" => MediaKind::Track,
            other => return Err(format!("unknown favorite kind: {other}")),
        };
        let index = index
            .parse::<usize>()
            .map_err(|err| format!("bad favorite index in {raw}: {err}"))?;
        Ok(Self { kind, index })
    }
}

impl Serialize for FavoriteKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FavoriteKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: FavoriteKey,
    #[serde(alias = "type")]
    pub kind: MediaKind,
    pub index: usize,
    #[serde(flatten)]
    pub item: MediaItem,
}

impl FavoriteRecord {
    pub fn new(key: FavoriteKey, item: &MediaItem) -> Self {
        Self {
            id: key,
            kind: key.kind,
            index: key.index,
            item: item.clone(),
        }
    }

    pub fn key(&self) -> FavoriteKey {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VideoQuality {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl VideoQuality {
    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "1080p" | "1080" => Some(Self::P1080),
            "720p" | "720" => Some(Self::P720),
            "480p" | "480" => Some(Self::P480),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub autoplay: bool,
    #[serde(default = "default_volume", deserialize_with = "clamped_volume")]
    pub volume: u8,
    #[serde(default)]
    pub quality: VideoQuality,
    #[serde(default = "default_true")]
    pub animations: bool,
    #[serde(default = "default_true")]
    pub visualizer: bool,
}

pub const DEFAULT_VOLUME_PERCENT: u8 = 80;

fn default_true() -> bool {
    true
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME_PERCENT
}

fn clamped_volume<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Ok(DEFAULT_VOLUME_PERCENT);
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

impl Settings {
    /// Volume as the 0.0..=1.0 gain media elements expect.
    pub fn volume_gain(&self) -> f32 {
        f32::from(self.volume.min(100)) / 100.0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            autoplay: true,
            volume: DEFAULT_VOLUME_PERCENT,
            quality: VideoQuality::Auto,
            animations: true,
            visualizer: true,
        }
    }
}

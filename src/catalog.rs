use crate::audio::local_path;
use crate::model::{MediaItem, MediaKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// The two fixed collections the player works from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub videos: Vec<MediaItem>,
    #[serde(default)]
    pub tracks: Vec<MediaItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    pub videos: Vec<usize>,
    pub tracks: Vec<usize>,
}

impl SearchHits {
    pub fn total(&self) -> usize {
        self.videos.len() + self.tracks.len()
    }

    pub fn for_kind(&self, kind: MediaKind) -> &[usize] {
        match kind {
            MediaKind::Video => &self.videos,
            MediaKind::Track => &self.tracks,
        }
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        let videos = vec![
            MediaItem::new(
                "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
                "Big Buck Bunny",
                "A comedic animated short film featuring a giant rabbit dealing with bullying rodents.",
            )
            .with_thumbnail("https://peach.blender.org/wp-content/uploads/bbb-splash.png")
            .with_duration_label("9:56"),
            MediaItem::new(
                "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/Sintel.mp4",
                "Sintel",
                "An epic animated short about a girl's quest to find her pet dragon in a fantasy world.",
            )
            .with_thumbnail("https://durian.blender.org/wp-content/uploads/2010/06/05.8b_comp_000272.jpg")
            .with_duration_label("14:48"),
            MediaItem::new(
                "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
                "Elephants Dream",
                "The world's first open movie, a surreal science fiction story about two characters exploring a machine.",
            )
            .with_thumbnail("https://i.ytimg.com/vi/TLkA0RELQ1g/maxresdefault.jpg")
            .with_duration_label("10:54"),
        ];
        let tracks = vec![
            MediaItem::new(
                "https://archive.org/download/IGM-V7/IGM%20-%20Vol.%207/25%20Diablo%20-%20Tristram%20%28Blizzard%29.mp3",
                "Tristram Theme",
                "Blizzard Entertainment",
            )
            .with_thumbnail("https://images.unsplash.com/photo-1514525253161-7a46d19cd819?w=300&h=300&fit=crop")
            .with_duration_label("6:26"),
            MediaItem::new(
                "https://archive.org/download/testmp3testfile/mpthreetest.mp3",
                "Test Audio",
                "Archive.org",
            )
            .with_thumbnail("https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=300&h=300&fit=crop")
            .with_duration_label("0:12"),
            MediaItem::new(
                "https://archive.org/download/IGM-V7/IGM%20-%20Vol.%207/01%20Age%20Of%20Empires%20II%20-%20Menu%20%28Microsoft%29.mp3",
                "Age of Empires II Menu",
                "Microsoft",
            )
            .with_thumbnail("https://images.unsplash.com/photo-1459749411175-04bf5292ceea?w=300&h=300&fit=crop")
            .with_duration_label("2:44"),
        ];
        Self { videos, tracks }
    }

    /// Reads a `{ "videos": [...], "tracks": [...] }` file. Relative local
    /// sources are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let mut catalog: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;

        if let Some(base) = path.parent() {
            for item in catalog.videos.iter_mut().chain(catalog.tracks.iter_mut()) {
                if let Some(local) = local_path(&item.source)
                    && local.is_relative()
                {
                    item.source = base.join(local).to_string_lossy().into_owned();
                }
            }
        }

        info!(
            path = %path.display(),
            videos = catalog.videos.len(),
            tracks = catalog.tracks.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Loads `path` when it exists, else the built-in collections. An explicit
    /// path that fails to load is an error; the default location is optional.
    pub fn load_or_builtin(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            return Ok(Self::builtin());
        }
        match Self::load(path) {
            Ok(catalog) => Ok(catalog),
            Err(err) if !explicit => {
                let error = format!("{err:#}");
                warn!(%error, "ignoring unreadable catalog, using built-in items");
                Ok(Self::builtin())
            }
            Err(err) => Err(err),
        }
    }

    pub fn items(&self, kind: MediaKind) -> &[MediaItem] {
        match kind {
            MediaKind::Video => &self.videos,
            MediaKind::Track => &self.tracks,
        }
    }

    pub fn item(&self, kind: MediaKind, index: usize) -> Option<&MediaItem> {
        self.items(kind).get(index)
    }

    /// Case-insensitive substring match on title and secondary label. An
    /// empty query matches everything.
    pub fn search(&self, query: &str) -> SearchHits {
        let needle = query.trim().to_lowercase();
        let matching = |items: &[MediaItem]| -> Vec<usize> {
            items
                .iter()
                .enumerate()
                .filter(|(_, item)| matches_query(item, &needle))
                .map(|(index, _)| index)
                .collect()
        };
        SearchHits {
            videos: matching(&self.videos),
            tracks: matching(&self.tracks),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn matches_query(item: &MediaItem, needle: &str) -> bool {
    needle.is_empty()
        || item.title.to_lowercase().contains(needle)
        || item.secondary_label.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_catalog_has_both_collections() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.videos.len(), 3);
        assert_eq!(catalog.tracks.len(), 3);
        assert_eq!(catalog.item(MediaKind::Track, 1).map(|t| t.title.as_str()), Some("Test Audio"));
        assert_eq!(catalog.item(MediaKind::Video, 3), None);
    }

    #[test]
    fn builtin_items_all_carry_artwork() {
        let catalog = Catalog::builtin();
        for item in catalog.videos.iter().chain(catalog.tracks.iter()) {
            assert!(item.thumbnail.starts_with("https://"), "{} has no artwork", item.title);
        }
    }

    #[test]
    fn search_matches_title_and_secondary_label() {
        let catalog = Catalog::builtin();

        let hits = catalog.search("SINTEL");
        assert_eq!(hits.videos, vec![1]);
        assert!(hits.tracks.is_empty());

        let hits = catalog.search("microsoft");
        assert_eq!(hits.tracks, vec![2]);

        let hits = catalog.search("dragon");
        assert_eq!(hits.for_kind(MediaKind::Video), &[1]);
    }

    #[test]
    fn empty_query_matches_everything() {
        let hits = Catalog::builtin().search("   ");
        assert_eq!(hits.total(), 6);
    }

    #[test]
    fn load_accepts_legacy_field_names() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"{
                "tracks": [
                    { "src": "songs/intro.ogg", "title": "Intro", "artist": "Band", "duration": "3:05" },
                    { "source": "https://host/b.mp3", "title": "Remote" }
                ]
            }"#,
        )
        .expect("write");

        let catalog = Catalog::load(&path).expect("load");
        assert!(catalog.videos.is_empty());
        let intro = &catalog.tracks[0];
        assert_eq!(intro.secondary_label, "Band");
        assert_eq!(intro.duration_label, "3:05");
        assert_eq!(
            Path::new(&intro.source),
            dir.path().join("songs").join("intro.ogg")
        );
        assert_eq!(catalog.tracks[1].source, "https://host/b.mp3");
    }

    #[test]
    fn missing_default_catalog_falls_back_to_builtin() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        let catalog = Catalog::load_or_builtin(&path, false).expect("fallback");
        assert_eq!(catalog, Catalog::builtin());
        assert!(Catalog::load_or_builtin(&path, true).is_err());
    }

    #[test]
    fn malformed_default_catalog_falls_back_to_builtin() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{ nope").expect("write");
        assert_eq!(
            Catalog::load_or_builtin(&path, false).expect("fallback"),
            Catalog::builtin()
        );
    }
}

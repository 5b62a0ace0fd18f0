use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

const APP_DIR: &str = "luminex";
const CATALOG_FILE: &str = "catalog.json";
const LOG_FILE: &str = "luminex.log";

pub const FAVORITES_SLOT: &str = "luminexFavorites";
pub const SETTINGS_SLOT: &str = "luminexSettings";

pub fn config_root() -> Result<PathBuf> {
    config_root_from(|name| env::var(name).ok())
}

/// Resolves the config root through `lookup` instead of the process environment.
pub fn config_root_from(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(override_dir) = lookup("LUMINEX_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = lookup("HOME")
        .or_else(|| lookup("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(CATALOG_FILE)
}

pub fn log_file_name() -> &'static str {
    LOG_FILE
}

pub fn ensure_dir(root: &Path) -> Result<()> {
    fs::create_dir_all(root).with_context(|| format!("failed to create {}", root.display()))
}

/// Durable key-value storage with named slots holding JSON text.
pub trait KeyValueStore {
    fn get(&self, slot: &str) -> Result<Option<String>>;
    fn set(&self, slot: &str, value: &str) -> Result<()>;
}

/// Reads a slot, treating absence and malformed content as "use defaults".
pub fn load_slot<T>(store: &dyn KeyValueStore, slot: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    let raw = match store.get(slot) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(slot, "slot absent, using defaults");
            return None;
        }
        Err(err) => {
            let error = format!("{err:#}");
            warn!(slot, %error, "failed to read slot, using defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(slot, error = %err, "malformed slot, using defaults");
            None
        }
    }
}

pub fn save_slot<T>(store: &dyn KeyValueStore, slot: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize slot {slot}"))?;
    store.set(slot, &json)
}

/// One `<slot>.json` file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(config_root()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read slot file {}", path.display()))?;
        Ok(Some(raw))
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        ensure_dir(&self.root)?;
        let path = self.slot_path(slot);
        // Readers see either the old file or the new one, never a partial write.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Shared in-memory slots. Clones see the same data, which lets tests
/// simulate a reload by building a second store over the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Rc<RefCell<HashMap<String, String>>>,
    read_only: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, slot: &str) -> Option<String> {
        self.slots.borrow().get(slot).cloned()
    }

    /// While set, every `set` fails the way a full or read-only disk would.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    pub fn put_raw(&self, slot: &str, value: &str) {
        self.slots
            .borrow_mut()
            .insert(slot.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, slot: &str) -> Result<Option<String>> {
        Ok(self.raw(slot))
    }

    fn set(&self, slot: &str, value: &str) -> Result<()> {
        if self.read_only.get() {
            anyhow::bail!("slot {slot} is read-only");
        }
        self.put_raw(slot, value);
        Ok(())
    }
}

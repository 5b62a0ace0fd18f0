use crate::config::{self, KeyValueStore, SETTINGS_SLOT};
use crate::model::Settings;
use anyhow::Result;
use std::rc::Rc;
use tracing::info;

pub struct SettingsStore {
    storage: Rc<dyn KeyValueStore>,
    current: Settings,
}

impl SettingsStore {
    pub fn load(storage: Rc<dyn KeyValueStore>) -> Self {
        let current = config::load_slot(storage.as_ref(), SETTINGS_SLOT).unwrap_or_default();
        Self { storage, current }
    }

    pub fn get(&self) -> &Settings {
        &self.current
    }

    /// Applies `change` to a copy and persists the whole mapping. The copy
    /// replaces the current settings only once the write has succeeded.
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) -> Result<&Settings> {
        let mut next = self.current.clone();
        change(&mut next);
        next.volume = next.volume.min(100);
        config::save_slot(self.storage.as_ref(), SETTINGS_SLOT, &next)?;
        self.current = next;
        Ok(&self.current)
    }

    pub fn reset(&mut self) -> Result<&Settings> {
        info!("resetting settings to defaults");
        self.update(|settings| *settings = Settings::default())
    }
}

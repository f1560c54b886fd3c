//! Per-store pricing configurations for one session
//!
//! The book is owned by its caller and handed to the engine by reference. It holds
//! the edit-form input of every store next to the configuration resolved from it,
//! and a lock flag that freezes a store against edits.

use crate::config::{EngineSettings, PricingConfig, RawPricingConfig, ValidationPolicy};
use crate::engine::{check_hours, evaluate_hours, Evaluation};
use crate::error::{PricingError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreEntry {
    /// Input as last submitted
    pub raw: RawPricingConfig,
    /// Configuration resolved from `raw`
    pub config: PricingConfig,
    pub locked: bool,
}

/// One store's price for a duration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuote {
    pub store: String,
    pub locked: bool,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone)]
pub struct StoreBook {
    policy: ValidationPolicy,
    fallback_base_rate: f64,
    stores: BTreeMap<String, StoreEntry>,
    selected: Option<String>,
}

impl StoreBook {
    pub fn new(policy: ValidationPolicy, fallback_base_rate: f64) -> Self {
        Self {
            policy,
            fallback_base_rate,
            stores: BTreeMap::new(),
            selected: None,
        }
    }

    /// Book holding every store declared in `settings`, locks applied.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        let mut book = Self::new(settings.validation, settings.fallback_base_rate);
        for store in &settings.stores {
            book.insert(&store.name, store.pricing.clone())?;
            if store.locked {
                book.lock(&store.name)?;
            }
        }
        Ok(book)
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    fn resolve(&self, raw: &RawPricingConfig) -> Result<PricingConfig> {
        Ok(PricingConfig::from_raw(raw, self.policy, self.fallback_base_rate)?)
    }

    /// Register a new store. The first store registered becomes the selection.
    pub fn insert(&mut self, name: &str, raw: RawPricingConfig) -> Result<&StoreEntry> {
        if self.stores.contains_key(name) {
            return Err(PricingError::DuplicateStore { store: name.to_string() });
        }
        let config = self.resolve(&raw)?;
        info!(store = name, mode = ?config.mode, "store registered");

        if self.selected.is_none() {
            self.selected = Some(name.to_string());
        }
        let entry = self
            .stores
            .entry(name.to_string())
            .or_insert(StoreEntry { raw, config, locked: false });
        Ok(entry)
    }

    /// Drop a store. Locked stores cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<StoreEntry> {
        if self.entry(name)?.locked {
            return Err(PricingError::StoreLocked { store: name.to_string() });
        }
        let entry = self
            .stores
            .remove(name)
            .ok_or_else(|| PricingError::UnknownStore { store: name.to_string() })?;
        if self.selected.as_deref() == Some(name) {
            self.selected = self.stores.keys().next().cloned();
        }
        info!(store = name, "store removed");
        Ok(entry)
    }

    pub fn entry(&self, name: &str) -> Result<&StoreEntry> {
        self.stores
            .get(name)
            .ok_or_else(|| PricingError::UnknownStore { store: name.to_string() })
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut StoreEntry> {
        self.stores
            .get_mut(name)
            .ok_or_else(|| PricingError::UnknownStore { store: name.to_string() })
    }

    /// Configuration snapshot for one evaluation
    pub fn config(&self, name: &str) -> Result<PricingConfig> {
        Ok(self.entry(name)?.config)
    }

    /// Replace a store's input. Rejected when the store is locked or the input
    /// does not validate; the previous configuration stays in place either way.
    pub fn update(&mut self, name: &str, raw: RawPricingConfig) -> Result<PricingConfig> {
        if self.entry(name)?.locked {
            return Err(PricingError::StoreLocked { store: name.to_string() });
        }
        let config = self.resolve(&raw)?;
        let entry = self.entry_mut(name)?;
        entry.raw = raw;
        entry.config = config;
        info!(store = name, mode = ?config.mode, "store updated");
        Ok(config)
    }

    pub fn lock(&mut self, name: &str) -> Result<()> {
        self.set_locked(name, true)
    }

    pub fn unlock(&mut self, name: &str) -> Result<()> {
        self.set_locked(name, false)
    }

    /// Flip the lock and return the new state.
    pub fn toggle_lock(&mut self, name: &str) -> Result<bool> {
        let locked = !self.entry(name)?.locked;
        self.set_locked(name, locked)?;
        Ok(locked)
    }

    fn set_locked(&mut self, name: &str, locked: bool) -> Result<()> {
        self.entry_mut(name)?.locked = locked;
        info!(store = name, locked, "store lock changed");
        Ok(())
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        self.entry(name)?;
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<(&str, &StoreEntry)> {
        let name = self.selected.as_deref()?;
        self.stores.get(name).map(|entry| (name, entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Price one duration for every store, in name order.
    pub fn quote_all(&self, hours: f64) -> Result<Vec<StoreQuote>> {
        check_hours(hours)?;
        Ok(self
            .stores
            .par_iter()
            .map(|(name, entry)| StoreQuote {
                store: name.clone(),
                locked: entry.locked,
                evaluation: evaluate_hours(hours, &entry.config),
            })
            .collect())
    }
}

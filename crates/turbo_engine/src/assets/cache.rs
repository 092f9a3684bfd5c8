//! Lazy weak-reference cache
//!
//! The cache never keeps an asset alive on its own: entries are [`Weak`], so
//! an asset is unloaded as soon as the last caller drops its [`Rc`]. Between
//! [`AssetCache::lock_all`] and [`AssetCache::unlock_all`] every live asset
//! is pinned, which keeps a scene's assets resident across a transition.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Map from key to a weakly held shared asset
pub struct AssetCache<T> {
    entries: RefCell<HashMap<String, Weak<T>>>,
    locked: RefCell<Vec<Rc<T>>>,
}

impl<T> AssetCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            locked: RefCell::new(Vec::new()),
        }
    }

    /// Return the live asset for `key`, or build it with `load` on a miss or
    /// when the previous instance was dropped. Failed loads are not cached.
    pub fn get_or_try_load<E, F>(&self, key: &str, load: F) -> Result<Rc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(asset) = self.get(key) {
            log::debug!("Cache hit: {key}");
            return Ok(asset);
        }
        log::debug!("Cache miss: {key}");
        let asset = Rc::new(load()?);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), Rc::downgrade(&asset));
        Ok(asset)
    }

    /// Live asset for `key` without loading
    pub fn get(&self, key: &str) -> Option<Rc<T>> {
        self.entries.borrow().get(key).and_then(Weak::upgrade)
    }

    /// Pin every live asset until [`unlock_all`](Self::unlock_all)
    pub fn lock_all(&self) {
        let entries = self.entries.borrow();
        let mut locked = self.locked.borrow_mut();
        locked.extend(entries.values().filter_map(Weak::upgrade));
    }

    /// Release the pins taken by [`lock_all`](Self::lock_all)
    pub fn unlock_all(&self) {
        self.locked.borrow_mut().clear();
    }

    /// Number of entries whose asset is still alive
    pub fn live_count(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Drop entries whose asset was unloaded
    pub fn purge_expired(&self) {
        self.entries
            .borrow_mut()
            .retain(|_, entry| entry.strong_count() > 0);
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for a font rasterized at `size` pixels
pub fn font_key(path: &str, size: u32) -> String {
    format!("{path}?{size}")
}

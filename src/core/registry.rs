// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Generic thread-safe name registry.
//!
//! Used by [`crate::codadef::Dictionary`] as the process-wide, effectively
//! immutable-after-init store of product classes: concurrent reads never
//! block each other, and registration (loading another codadef) serialises
//! through the same lock rather than needing a separate one-shot guard.

use super::error::{CodaError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Thread-safe registry mapping names to values of type `T`.
pub struct TypeRegistry<T> {
    inner: RwLock<HashMap<String, T>>,
}

impl<T> TypeRegistry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn lock_poisoned(context: &str) -> CodaError {
        CodaError::Other(format!("{context} lock poisoned"))
    }

    /// Register a value under `name`, replacing any previous value.
    pub fn register(&self, name: impl Into<String>, value: T) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Self::lock_poisoned("registry"))?;
        inner.insert(name.into(), value);
        Ok(())
    }

    /// Remove a value by name, returning whether it was present.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| Self::lock_poisoned("registry"))?;
        Ok(inner.remove(name).is_some())
    }

    /// Apply a read-only closure to the value registered under `name`.
    pub fn with<R>(&self, name: &str, f: impl FnOnce(&T) -> R) -> Result<Option<R>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| Self::lock_poisoned("registry"))?;
        Ok(inner.get(name).map(f))
    }

    /// Get a clone of the value registered under `name`.
    pub fn get(&self, name: &str) -> Result<Option<T>>
    where
        T: Clone,
    {
        self.with(name, Clone::clone)
    }

    /// Check if a value is registered under `name`.
    pub fn contains(&self, name: &str) -> Result<bool> {
        let inner = self
            .inner
            .read()
            .map_err(|_| Self::lock_poisoned("registry"))?;
        Ok(inner.contains_key(name))
    }

    /// Get all registered names.
    pub fn names(&self) -> Result<Vec<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| Self::lock_poisoned("registry"))?;
        Ok(inner.keys().cloned().collect())
    }

    /// Get the number of registered values.
    pub fn len(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|_| Self::lock_poisoned("registry"))?;
        Ok(inner.len())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

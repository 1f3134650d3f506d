//! Name cache shared by the workers of a single scan
//!
//! Maps a blob id to the first path it was observed at. Once set, a name is
//! never replaced, so every producer that later sees the same content agrees
//! on its display name.

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::scanner::error::{ScanError, ScanResult};
use gix::ObjectId;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct NameCache {
    names: RwLock<HashMap<ObjectId, String>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name recorded for `id`, if any
    pub fn get(&self, id: &ObjectId) -> ScanResult<Option<String>> {
        let names = handle_rwlock_read(self.names.read(), internal)?;
        Ok(names.get(id).cloned())
    }

    /// Record `name` for `id` unless a name is already present.
    ///
    /// Returns the name that is in the cache afterwards, which is `name` only if
    /// this call won.
    pub fn set_if_absent(&self, id: ObjectId, name: &str) -> ScanResult<String> {
        if let Some(existing) = self.get(&id)? {
            return Ok(existing);
        }
        let mut names = handle_rwlock_write(self.names.write(), internal)?;
        Ok(names.entry(id).or_insert_with(|| name.to_string()).clone())
    }

    pub fn len(&self) -> ScanResult<usize> {
        Ok(handle_rwlock_read(self.names.read(), internal)?.len())
    }

    pub fn is_empty(&self) -> ScanResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn internal(message: String) -> ScanError {
    ScanError::Internal { message }
}

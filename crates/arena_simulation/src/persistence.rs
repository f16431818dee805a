//! Persistence gateway: key/value контракт + memory и JSON-file хранилища.
//!
//! Используется только при переходах между уровнями (bootstrap/teardown),
//! симуляция внутри уровня хранилище не трогает.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("persistence file {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Значение в хранилище (float и int не смешиваются)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum StoredValue {
    Float(f32),
    Int(i32),
}

pub trait KeyValueStore: Send + Sync {
    fn get_float(&self, key: &str, default: f32) -> f32;
    fn get_int(&self, key: &str, default: i32) -> i32;
    fn set_float(&mut self, key: &str, value: f32);
    fn set_int(&mut self, key: &str, value: i32);
    fn has_key(&self, key: &str) -> bool;
    fn delete_key(&mut self, key: &str);
    fn save(&mut self) -> Result<(), PersistenceError>;
}

/// In-memory хранилище (тесты, headless прогоны)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    values: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_float(&self, key: &str, default: f32) -> f32 {
        match self.values.get(key) {
            Some(StoredValue::Float(value)) => *value,
            _ => default,
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.values.get(key) {
            Some(StoredValue::Int(value)) => *value,
            _ => default,
        }
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), StoredValue::Float(value));
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), StoredValue::Int(value));
    }

    fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn delete_key(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Хранилище в JSON файле; `save()` пишет файл целиком
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: MemoryStore,
}

impl JsonFileStore {
    /// Открыть файл (отсутствующий файл = пустое хранилище)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => MemoryStore::new(),
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_float(&self, key: &str, default: f32) -> f32 {
        self.values.get_float(key, default)
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        self.values.get_int(key, default)
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.values.set_float(key, value);
    }

    fn set_int(&mut self, key: &str, value: i32) {
        self.values.set_int(key, value);
    }

    fn has_key(&self, key: &str) -> bool {
        self.values.has_key(key)
    }

    fn delete_key(&mut self, key: &str) {
        self.values.delete_key(key);
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        let text = serde_json::to_string_pretty(&self.values).map_err(|source| PersistenceError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Resource: единственная точка доступа к хранилищу
#[derive(Resource)]
pub struct PersistenceGateway(pub Box<dyn KeyValueStore>);

impl Default for PersistenceGateway {
    fn default() -> Self {
        Self(Box::new(MemoryStore::new()))
    }
}

impl PersistenceGateway {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self(Box::new(store))
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.0.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.0.as_mut()
    }

    /// save() с логированием ошибки (сессия продолжается без сохранения)
    pub fn flush(&mut self) -> bool {
        match self.0.save() {
            Ok(()) => true,
            Err(err) => {
                crate::log_error(&format!("💾 Persistence save failed: {}", err));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_defaults_for_missing_keys() {
        let store = MemoryStore::new();
        assert_eq!(store.get_float("DifficultyLevel", 1.0), 1.0);
        assert_eq!(store.get_int("Coins", 0), 0);
        assert!(!store.has_key("DifficultyLevel"));
    }

    #[test]
    fn test_memory_store_types_do_not_mix() {
        let mut store = MemoryStore::new();
        store.set_int("Coins", 40);
        assert_eq!(store.get_float("Coins", -1.0), -1.0);
        assert_eq!(store.get_int("Coins", 0), 40);
    }

    #[test]
    fn test_delete_key() {
        let mut store = MemoryStore::new();
        store.set_float("HealthMultiplier", 1.3);
        store.delete_key("HealthMultiplier");
        assert!(!store.has_key("HealthMultiplier"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set_float("DifficultyLevel", 4.0);
        store.set_int("DamageLevel", 2);
        store.save().unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_float("DifficultyLevel", 1.0), 4.0);
        assert_eq!(reopened.get_int("DamageLevel", 0), 2);
    }

    #[test]
    fn test_json_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(PersistenceError::Json { .. })));
    }
}

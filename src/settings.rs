// Settings - Key/value persistence collaborator
// The engine only reads and writes strings; storage is up to the host

use crate::rhythm::{Rhythm, deserialize, serialize};
use std::collections::HashMap;

pub trait SettingsStore {
    fn load_string(&self, key: &str) -> Option<String>;
    fn save_string(&mut self, key: &str, value: &str);

    /// Rhythm stored under `key` in text notation
    fn load_rhythm(&self, key: &str) -> Option<Rhythm> {
        self.load_string(key).map(|text| deserialize(&text))
    }

    fn save_rhythm(&mut self, key: &str, rhythm: &Rhythm) {
        self.save_string(key, &serialize(rhythm));
    }
}

/// In-memory store for tests and hosts without persistent storage
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
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

impl SettingsStore for MemorySettings {
    fn load_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn save_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rhythm_round_trip() {
        let mut settings = MemorySettings::new();
        assert!(settings.load_rhythm("primary").is_none());

        let rhythm = deserialize("{3/4}H;q;");
        settings.save_rhythm("primary", &rhythm);
        assert_eq!(settings.load_string("primary").as_deref(), Some("{3/4}H;q;"));
        assert_eq!(settings.load_rhythm("primary"), Some(rhythm));
        assert_eq!(settings.len(), 1);
    }
}

use std::collections::HashMap;
use thiserror::Error;

/// Key/value blob store used to persist the ledger between sessions.
///
/// Writes are fire-and-forget: implementations report their own I/O failures
/// (the way a browser's local storage would) instead of failing the round.
pub trait Store {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: String);
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: String) {
        (**self).save(key, value)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored value for {key} is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: HashMap<String, String>,
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.state.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: String) {
        self.state.insert(key.to_string(), value);
    }
}

use alloy_primitives::ChainId;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};

/// Durable key-value store scoped to the host application.
///
/// The store is shared with the rest of the application; the connector only
/// touches the two keys below and assumes nothing about other entries.
pub trait ConnectorStorage: std::fmt::Debug + Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// Presence of this key signals an injected session the user never explicitly
/// ended. The value is irrelevant.
pub const SHIM_DISCONNECT_KEY: &str = "ronin.shimDisconnect";

/// JSON array of chain ids the relay session has been asked to authorize.
pub const REQUESTED_CHAINS_KEY: &str = "ronin.requestedChains";

/// In-memory [`ConnectorStorage`], for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl ConnectorStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().remove(key);
    }
}

pub(crate) fn shim_flag_set(storage: &dyn ConnectorStorage) -> bool {
    storage.get_item(SHIM_DISCONNECT_KEY).is_some()
}

pub(crate) fn set_shim_flag(storage: &dyn ConnectorStorage) {
    storage.set_item(SHIM_DISCONNECT_KEY, "true");
}

pub(crate) fn clear_shim_flag(storage: &dyn ConnectorStorage) {
    storage.remove_item(SHIM_DISCONNECT_KEY);
}

pub(crate) fn requested_chains(storage: &dyn ConnectorStorage) -> BTreeSet<ChainId> {
    storage
        .get_item(REQUESTED_CHAINS_KEY)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

pub(crate) fn write_requested_chains(
    storage: &dyn ConnectorStorage,
    chains: &BTreeSet<ChainId>,
) {
    match serde_json::to_string(chains) {
        Ok(raw) => storage.set_item(REQUESTED_CHAINS_KEY, &raw),
        Err(err) => warn!(%err, "failed to encode requested chains"),
    }
}

pub(crate) fn record_requested_chain(storage: &dyn ConnectorStorage, chain_id: ChainId) {
    let mut chains = requested_chains(storage);
    if chains.insert(chain_id) {
        write_requested_chains(storage, &chains);
    }
}

pub(crate) fn clear_requested_chains(storage: &dyn ConnectorStorage) {
    storage.remove_item(REQUESTED_CHAINS_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shim_flag_roundtrip() {
        let storage = MemoryStorage::default();
        assert!(!shim_flag_set(&storage));
        set_shim_flag(&storage);
        assert!(shim_flag_set(&storage));
        clear_shim_flag(&storage);
        assert!(!shim_flag_set(&storage));
    }

    #[test]
    fn requested_chains_accumulate_and_clear() {
        let storage = MemoryStorage::default();
        assert!(requested_chains(&storage).is_empty());

        record_requested_chain(&storage, 2020);
        record_requested_chain(&storage, 2021);
        record_requested_chain(&storage, 2020);
        assert_eq!(requested_chains(&storage), BTreeSet::from([2020, 2021]));

        clear_requested_chains(&storage);
        assert!(requested_chains(&storage).is_empty());
    }

    #[test]
    fn corrupt_record_reads_as_empty() {
        let storage = MemoryStorage::default();
        storage.set_item(REQUESTED_CHAINS_KEY, "not json");
        assert!(requested_chains(&storage).is_empty());
    }
}

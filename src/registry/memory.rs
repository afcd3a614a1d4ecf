use super::{is_duplicate, select_top, AlphaRegistry, EliteRecord, RegistryFilter};
use std::sync::RwLock;

/// Registry kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: RwLock<Vec<EliteRecord>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EliteRecord> {
        match self.records.read() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AlphaRegistry for InMemoryRegistry {
    fn save(&self, record: &EliteRecord) -> bool {
        if let Err(e) = record.sanity_check() {
            log::warn!("Rejected record {}: {}", record.id, e);
            return false;
        }
        let mut records = match self.records.write() {
            Ok(records) => records,
            Err(_) => {
                log::error!("Registry lock poisoned, dropping record {}", record.id);
                return false;
            }
        };
        if is_duplicate(&records, record) {
            log::warn!("Rejected duplicate record {}", record.id);
            return false;
        }
        records.push(record.clone());
        true
    }

    fn top_n(&self, n: usize, filter: &RegistryFilter) -> Vec<EliteRecord> {
        select_top(&self.records(), n, filter)
    }

    fn len(&self) -> usize {
        self.records().len()
    }
}

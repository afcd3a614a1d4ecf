use super::{is_duplicate, select_top, AlphaRegistry, EliteRecord, RegistryFilter};
use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Append-only JSON-lines registry. Existing records are loaded on open;
/// every accepted record is appended as one line.
#[derive(Debug)]
pub struct JsonlRegistry {
    path: PathBuf,
    records: RwLock<Vec<EliteRecord>>,
}

impl JsonlRegistry {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut records = Vec::new();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<EliteRecord>(&line) {
                    Ok(record) => records.push(record),
                    Err(e) => log::warn!(
                        "Skipping malformed registry line {} in {}: {}",
                        line_no + 1,
                        path.display(),
                        e
                    ),
                }
            }
            log::info!("Loaded {} records from {}", records.len(), path.display());
        }

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &EliteRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn snapshot(&self) -> Vec<EliteRecord> {
        match self.records.read() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AlphaRegistry for JsonlRegistry {
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
        if let Err(e) = self.append(record) {
            log::error!("Failed to write record {} to {}: {}", record.id, self.path.display(), e);
            return false;
        }
        records.push(record.clone());
        true
    }

    fn top_n(&self, n: usize, filter: &RegistryFilter) -> Vec<EliteRecord> {
        select_top(&self.snapshot(), n, filter)
    }

    fn len(&self) -> usize {
        self.snapshot().len()
    }
}

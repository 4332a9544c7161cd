use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::ports::{HostListSource, HostRecord};

const DEFAULT_GROUP: &str = "default";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid hosts file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredHost {
    ip: String,
    #[serde(default)]
    name: String,
}

impl StoredHost {
    fn to_record(&self, group: Option<&str>) -> HostRecord {
        let name = if self.name.is_empty() { &self.ip } else { &self.name };
        HostRecord::new(self.ip.clone(), name.clone()).with_group(group.map(str::to_string))
    }
}

impl From<HostRecord> for StoredHost {
    fn from(record: HostRecord) -> Self {
        Self {
            ip: record.ip,
            name: record.name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredGroup {
    #[serde(default)]
    hosts: Vec<StoredHost>,
}

/// Both on-disk layouts: `[{"ip", "name"}]` and `{"groups": {name: {"hosts": [...]}}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum HostsDocument {
    Grouped { groups: BTreeMap<String, StoredGroup> },
    Flat(Vec<StoredHost>),
}

impl Default for HostsDocument {
    fn default() -> Self {
        Self::Flat(Vec::new())
    }
}

impl HostsDocument {
    fn records(&self) -> Vec<HostRecord> {
        match self {
            Self::Flat(hosts) => hosts.iter().map(|h| h.to_record(None)).collect(),
            Self::Grouped { groups } => groups
                .iter()
                .flat_map(|(name, group)| group.hosts.iter().map(move |h| h.to_record(Some(name))))
                .collect(),
        }
    }

    fn contains(&self, ip: &str) -> bool {
        match self {
            Self::Flat(hosts) => hosts.iter().any(|h| h.ip == ip),
            Self::Grouped { groups } => groups.values().any(|g| g.hosts.iter().any(|h| h.ip == ip)),
        }
    }

    fn insert(&mut self, record: HostRecord) -> bool {
        if self.contains(&record.ip) {
            return false;
        }

        match self {
            Self::Flat(hosts) => hosts.push(record.into()),
            Self::Grouped { groups } => {
                let group = record.group.clone().unwrap_or_else(|| DEFAULT_GROUP.to_string());
                groups.entry(group).or_default().hosts.push(record.into());
            }
        }
        true
    }

    fn remove(&mut self, ip: &str) -> bool {
        let before = self.records().len();
        match self {
            Self::Flat(hosts) => hosts.retain(|h| h.ip != ip),
            Self::Grouped { groups } => {
                for group in groups.values_mut() {
                    group.hosts.retain(|h| h.ip != ip);
                }
            }
        }
        self.records().len() != before
    }
}

/// Host list persisted as a JSON file
pub struct JsonHostsFile {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonHostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HostsDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HostsDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HostsDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &HostsDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "hosts file saved");
        Ok(())
    }
}

#[async_trait]
impl HostListSource for JsonHostsFile {
    async fn list_hosts(&self) -> Result<Vec<HostRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.load().await?.records())
    }

    async fn add_host(&self, host: HostRecord) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        if !document.insert(host) {
            return Ok(false);
        }
        self.save(&document).await?;
        Ok(true)
    }

    async fn remove_host(&self, ip: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        if !document.remove(ip) {
            return Ok(false);
        }
        self.save(&document).await?;
        Ok(true)
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A persisted host as the endpoint-list collaborator stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub ip: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl HostRecord {
    pub fn new(ip: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            name: name.into(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }
}

/// Port for the persisted list of hosts to monitor
#[async_trait]
pub trait HostListSource: Send + Sync {
    /// List every persisted host
    async fn list_hosts(&self) -> Result<Vec<HostRecord>, Box<dyn std::error::Error + Send + Sync>>;

    /// Persist a host; returns false if its address was already present
    async fn add_host(&self, host: HostRecord) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;

    /// Forget a host; returns false if its address was not present
    async fn remove_host(&self, ip: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

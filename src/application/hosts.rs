use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{EndpointError, EndpointId};
use crate::ports::{HostListSource, HostRecord};

use super::registry::{MonitoringRegistry, StartOutcome};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] EndpointError),

    #[error("host limit of {0} reached")]
    LimitReached(usize),

    #[error("host list unavailable: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

/// Keeps the persisted host list and the running pollers in step
pub struct HostService {
    registry: Arc<MonitoringRegistry>,
    hosts: Arc<dyn HostListSource>,
    max_hosts: usize,
    // Held across check, persist and start/stop so the limit and the
    // list-to-poller correspondence hold under concurrent calls
    changes: Mutex<()>,
}

impl HostService {
    pub fn new(registry: Arc<MonitoringRegistry>, hosts: Arc<dyn HostListSource>, max_hosts: usize) -> Self {
        Self {
            registry,
            hosts,
            max_hosts,
            changes: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &MonitoringRegistry {
        &self.registry
    }

    /// Start monitoring every persisted host; returns how many were started
    pub async fn bootstrap(&self) -> Result<usize, HostError> {
        let hosts = self.list_hosts().await?;
        let started = self.registry.reconcile_from_list(hosts.iter().map(|h| h.ip.as_str()));
        info!(persisted = hosts.len(), started, "monitoring bootstrapped from host list");
        Ok(started)
    }

    pub async fn list_hosts(&self) -> Result<Vec<HostRecord>, HostError> {
        self.hosts.list_hosts().await.map_err(HostError::Store)
    }

    /// Persist a host and start monitoring it.
    ///
    /// Hosts already in the list are accepted even at the limit.
    pub async fn add_host(
        &self,
        ip: &str,
        name: Option<&str>,
        group: Option<String>,
    ) -> Result<StartOutcome, HostError> {
        let endpoint = EndpointId::parse(ip.trim())?;
        let _changes = self.changes.lock().await;
        let hosts = self.list_hosts().await?;

        if !hosts.iter().any(|h| h.ip == endpoint.as_str()) {
            if hosts.len() >= self.max_hosts {
                return Err(HostError::LimitReached(self.max_hosts));
            }

            let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(endpoint.as_str());
            let record = HostRecord::new(endpoint.as_str(), name).with_group(group);
            self.hosts.add_host(record).await.map_err(HostError::Store)?;
            info!(endpoint = %endpoint, "host added");
        }

        Ok(self.registry.start(endpoint.as_str())?)
    }

    /// Forget a host and stop monitoring it; false if it was unknown to both
    pub async fn remove_host(&self, ip: &str) -> Result<bool, HostError> {
        let ip = ip.trim();
        let _changes = self.changes.lock().await;
        let removed = self.hosts.remove_host(ip).await.map_err(HostError::Store)?;
        let stopped = self.registry.stop(ip).await;

        if removed {
            info!(endpoint = ip, "host removed");
        }
        Ok(removed || stopped)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::JsonHostsFile;
    use crate::application::testing::{MemoryHostList, ScriptedProber};
    use crate::application::MonitorSettings;

    fn service(hosts: Vec<HostRecord>, max_hosts: usize) -> (HostService, Arc<MemoryHostList>) {
        let registry = Arc::new(MonitoringRegistry::new(
            Arc::new(ScriptedProber::constant(0.0)),
            MonitorSettings {
                poll_interval: Duration::from_millis(5),
                ..MonitorSettings::default()
            },
        ));
        let store = Arc::new(MemoryHostList::with_hosts(hosts));
        (HostService::new(registry, store.clone(), max_hosts), store)
    }

    #[tokio::test]
    async fn test_bootstrap_starts_persisted_hosts() {
        let (service, _) = service(
            vec![HostRecord::new("10.0.0.1", "a"), HostRecord::new("10.0.0.2", "b")],
            60,
        );

        assert_eq!(service.bootstrap().await.unwrap(), 2);
        assert_eq!(service.registry().len(), 2);

        service.registry().stop_all().await;
    }

    #[tokio::test]
    async fn test_add_persists_and_starts() {
        let (service, store) = service(Vec::new(), 60);

        let outcome = service.add_host(" 10.0.0.9 ", Some(""), None).await.unwrap();
        assert_eq!(outcome, StartOutcome::Started);
        assert_eq!(store.list_hosts().await.unwrap(), vec![HostRecord::new("10.0.0.9", "10.0.0.9")]);
        assert!(service.registry().task_id("10.0.0.9").is_some());

        let again = service.add_host("10.0.0.9", Some("other"), None).await.unwrap();
        assert_eq!(again, StartOutcome::AlreadyRunning);
        assert_eq!(store.list_hosts().await.unwrap().len(), 1);

        service.registry().stop_all().await;
    }

    #[tokio::test]
    async fn test_add_rejects_empty_address() {
        let (service, store) = service(Vec::new(), 60);

        let err = service.add_host("   ", None, None).await.unwrap_err();
        assert!(matches!(err, HostError::InvalidAddress(EndpointError::Empty)));
        assert!(store.list_hosts().await.unwrap().is_empty());
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn test_limit_applies_to_new_hosts_only() {
        let (service, _) = service(vec![HostRecord::new("10.0.0.1", "a")], 1);

        let err = service.add_host("10.0.0.2", None, None).await.unwrap_err();
        assert!(matches!(err, HostError::LimitReached(1)));
        assert!(service.registry().is_empty());

        // Re-adding a known host at the limit just (re)starts it
        assert_eq!(
            service.add_host("10.0.0.1", None, None).await.unwrap(),
            StartOutcome::Started
        );

        service.registry().stop_all().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_respect_limit() {
        let path = std::env::temp_dir().join(format!("pingmon-{}-concurrent-adds.json", std::process::id()));
        std::fs::write(&path, r#"[{"ip": "10.0.0.1", "name": "gw"}]"#).unwrap();

        let registry = Arc::new(MonitoringRegistry::new(
            Arc::new(ScriptedProber::constant(0.0)),
            MonitorSettings {
                poll_interval: Duration::from_millis(5),
                ..MonitorSettings::default()
            },
        ));
        let store = Arc::new(JsonHostsFile::new(&path));
        let service = Arc::new(HostService::new(registry, store.clone(), 2));

        let adds: Vec<_> = (2..12)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.add_host(&format!("10.0.0.{}", i), None, None).await })
            })
            .collect();

        let mut accepted = 0;
        for add in adds {
            match add.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert!(matches!(e, HostError::LimitReached(2))),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(store.list_hosts().await.unwrap().len(), 2);
        assert_eq!(service.registry().len(), 1);

        service.registry().stop_all().await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_and_remove_stay_in_step() {
        let (service, store) = service(Vec::new(), 60);
        let service = Arc::new(service);

        for _ in 0..20 {
            let add = {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.add_host("10.0.0.1", None, None).await.map(|_| ()) })
            };
            let remove = {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.remove_host("10.0.0.1").await.map(|_| ()) })
            };
            add.await.unwrap().unwrap();
            remove.await.unwrap().unwrap();

            let persisted = !store.list_hosts().await.unwrap().is_empty();
            let monitored = service.registry().task_id("10.0.0.1").is_some();
            assert_eq!(persisted, monitored);
        }

        service.registry().stop_all().await;
    }

    #[tokio::test]
    async fn test_remove_stops_and_forgets() {
        let (service, store) = service(Vec::new(), 60);
        service.add_host("10.0.0.1", Some("gw"), None).await.unwrap();

        assert!(service.remove_host("10.0.0.1").await.unwrap());
        assert!(store.list_hosts().await.unwrap().is_empty());
        assert!(service.registry().history("10.0.0.1").is_none());

        assert!(!service.remove_host("10.0.0.1").await.unwrap());
    }
}

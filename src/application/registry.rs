use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::domain::{
    EndpointError, EndpointId, HistoryBuffer, Measurement, ProbeParams, ProbeSample,
    DEFAULT_HISTORY_CAPACITY, DEFAULT_STATUS_WINDOW,
};
use crate::ports::Prober;

use super::poller;

/// Tuning for the monitoring engine
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Measurements kept per endpoint
    pub history_capacity: usize,
    /// Trailing measurements the status is derived from
    pub status_window: usize,
    /// Pause between the end of one probe cycle and the start of the next
    pub poll_interval: Duration,
    pub probe: ProbeParams,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            status_window: DEFAULT_STATUS_WINDOW,
            poll_interval: Duration::from_secs(2),
            probe: ProbeParams::default(),
        }
    }
}

/// Identity of one spawned poller, unique for the lifetime of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Point-in-time copy of every endpoint's history
pub type Snapshot = BTreeMap<EndpointId, Vec<Measurement>>;

struct Entry {
    task_id: TaskId,
    history: HistoryBuffer,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// State shared between the registry and its pollers
pub(super) struct Shared {
    entries: Mutex<HashMap<EndpointId, Entry>>,
    pub(super) settings: MonitorSettings,
    pub(super) prober: Arc<dyn Prober>,
    next_task_id: AtomicU64,
}

impl Shared {
    fn entries(&self) -> MutexGuard<'_, HashMap<EndpointId, Entry>> {
        // Every critical section leaves the map consistent, so a poisoned
        // lock still guards valid data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a sample on behalf of poller `task_id`.
    ///
    /// Returns false, and drops the sample, once that poller no longer owns
    /// the endpoint's entry (stopped, or replaced by a newer start).
    pub(super) fn record(&self, endpoint: &EndpointId, task_id: TaskId, sample: ProbeSample) -> bool {
        let mut entries = self.entries();
        match entries.get_mut(endpoint) {
            Some(entry) if entry.task_id == task_id => {
                let measurement = entry.history.record(Utc::now().timestamp(), sample);
                trace!(
                    endpoint = %endpoint,
                    loss = measurement.loss,
                    latency = ?measurement.latency,
                    status = ?measurement.status,
                    "measurement recorded"
                );
                true
            }
            _ => false,
        }
    }
}

/// Owns the set of monitored endpoints, one poller task and one history each.
///
/// All map and history access goes through a single mutex that is only held
/// for short, non-blocking sections. Probes run outside of it.
pub struct MonitoringRegistry {
    shared: Arc<Shared>,
}

impl MonitoringRegistry {
    pub fn new(prober: Arc<dyn Prober>, settings: MonitorSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(HashMap::new()),
                settings,
                prober,
                next_task_id: AtomicU64::new(1),
            }),
        }
    }

    /// Begin monitoring `endpoint` with an empty history.
    ///
    /// A no-op while a poller for the endpoint is alive. Must be called from
    /// within a Tokio runtime.
    pub fn start(&self, endpoint: &str) -> Result<StartOutcome, EndpointError> {
        let endpoint = EndpointId::parse(endpoint)?;
        let mut entries = self.shared.entries();

        if let Some(entry) = entries.get(&endpoint) {
            if !entry.handle.is_finished() {
                return Ok(StartOutcome::AlreadyRunning);
            }
            warn!(endpoint = %endpoint, task = %entry.task_id, "poller exited unexpectedly, restarting");
        }

        let task_id = TaskId(self.shared.next_task_id.fetch_add(1, Ordering::Relaxed));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poller::run(
            Arc::clone(&self.shared),
            endpoint.clone(),
            task_id,
            shutdown_rx,
        ));

        let settings = &self.shared.settings;
        entries.insert(
            endpoint.clone(),
            Entry {
                task_id,
                history: HistoryBuffer::new(settings.history_capacity, settings.status_window),
                shutdown_tx,
                handle,
            },
        );

        info!(endpoint = %endpoint, task = %task_id, active = entries.len(), "monitoring started");
        Ok(StartOutcome::Started)
    }

    /// Stop monitoring `endpoint` and discard its history.
    ///
    /// Returns once the poller has terminated; no measurement for the
    /// endpoint is recorded after that. Returns false if it was not monitored.
    pub async fn stop(&self, endpoint: &str) -> bool {
        let entry = self.shared.entries().remove(endpoint);

        match entry {
            Some(entry) => {
                let task_id = entry.task_id;
                shut_down(entry).await;
                info!(endpoint = %endpoint, task = %task_id, "monitoring stopped");
                true
            }
            None => false,
        }
    }

    /// Stop every poller, e.g. on process shutdown
    pub async fn stop_all(&self) {
        let entries: Vec<Entry> = self.shared.entries().drain().map(|(_, entry)| entry).collect();
        let count = entries.len();

        join_all(entries.into_iter().map(shut_down)).await;
        info!(count, "all pollers stopped");
    }

    /// Start every endpoint of an externally persisted list.
    ///
    /// Invalid identities are skipped. Returns how many pollers were spawned.
    pub fn reconcile_from_list<I, S>(&self, endpoints: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut started = 0;

        for endpoint in endpoints {
            match self.start(endpoint.as_ref()) {
                Ok(StartOutcome::Started) => started += 1,
                Ok(StartOutcome::AlreadyRunning) => {}
                Err(e) => warn!(endpoint = endpoint.as_ref(), error = %e, "skipping persisted endpoint"),
            }
        }

        debug!(started, "reconciled endpoints from list");
        started
    }

    /// Copy of all histories, detached from the live buffers
    pub fn snapshot(&self) -> Snapshot {
        self.shared
            .entries()
            .iter()
            .map(|(endpoint, entry)| (endpoint.clone(), entry.history.to_vec()))
            .collect()
    }

    /// Copy of one endpoint's history
    pub fn history(&self, endpoint: &str) -> Option<Vec<Measurement>> {
        self.shared.entries().get(endpoint).map(|entry| entry.history.to_vec())
    }

    pub fn active_endpoints(&self) -> BTreeSet<EndpointId> {
        self.shared.entries().keys().cloned().collect()
    }

    pub fn task_id(&self, endpoint: &str) -> Option<TaskId> {
        self.shared.entries().get(endpoint).map(|entry| entry.task_id)
    }

    pub fn len(&self) -> usize {
        self.shared.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for MonitoringRegistry {
    fn drop(&mut self) {
        for (_, entry) in self.shared.entries().drain() {
            entry.handle.abort();
        }
    }
}

async fn shut_down(entry: Entry) {
    let _ = entry.shutdown_tx.send(true);

    if let Err(e) = entry.handle.await {
        if e.is_panic() {
            warn!(task = %entry.task_id, "poller panicked before shutdown");
        }
    }
}

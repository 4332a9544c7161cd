//! In-crate fakes for the ports, used by the application and HTTP tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{EndpointId, ProbeParams, ProbeReport};
use crate::ports::{HostListSource, HostRecord, ProbeError, Prober};

/// Prober that replays loss percentages instead of touching the network
pub struct ScriptedProber {
    script: Mutex<VecDeque<f64>>,
    /// Loss reported once the script is exhausted; `None` hangs forever
    fallback: Option<f64>,
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProber {
    fn new(script: VecDeque<f64>, fallback: Option<f64>, fail: bool) -> Self {
        Self {
            script: Mutex::new(script),
            fallback,
            fail,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn constant(loss: f64) -> Self {
        Self::new(VecDeque::new(), Some(loss), false)
    }

    pub fn sequence(losses: impl IntoIterator<Item = f64>) -> Self {
        Self::new(losses.into_iter().collect(), None, false)
    }

    pub fn failing() -> Self {
        Self::new(VecDeque::new(), None, true)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn report_for_loss(loss: f64, packet_count: u32) -> ProbeReport {
    let received = (f64::from(packet_count) * (1.0 - loss / 100.0)).round() as usize;
    ProbeReport::new(packet_count, vec![1.0; received])
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, endpoint: &EndpointId, params: &ProbeParams) -> Result<ProbeReport, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(ProbeError::Unresolvable(endpoint.to_string()));
        }

        let next = self.script.lock().unwrap().pop_front().or(self.fallback);
        match next {
            Some(loss) => Ok(report_for_loss(loss, params.packet_count)),
            None => std::future::pending().await,
        }
    }
}

/// Host list held in memory
#[derive(Default)]
pub struct MemoryHostList {
    hosts: Mutex<Vec<HostRecord>>,
}

impl MemoryHostList {
    pub fn with_hosts(hosts: Vec<HostRecord>) -> Self {
        Self {
            hosts: Mutex::new(hosts),
        }
    }
}

#[async_trait]
impl HostListSource for MemoryHostList {
    async fn list_hosts(&self) -> Result<Vec<HostRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.hosts.lock().unwrap().clone())
    }

    async fn add_host(&self, host: HostRecord) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut hosts = self.hosts.lock().unwrap();
        if hosts.iter().any(|h| h.ip == host.ip) {
            return Ok(false);
        }
        hosts.push(host);
        Ok(true)
    }

    async fn remove_host(&self, ip: &str) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut hosts = self.hosts.lock().unwrap();
        let before = hosts.len();
        hosts.retain(|h| h.ip != ip);
        Ok(hosts.len() != before)
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

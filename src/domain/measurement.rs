use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Status;

/// Parameters for a single probe cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeParams {
    pub packet_count: u32,
    /// Per-packet reply timeout
    pub timeout: Duration,
    /// Gap between packets within one cycle
    pub packet_interval: Duration,
}

impl ProbeParams {
    pub fn new(packet_count: u32, timeout: Duration) -> Self {
        Self {
            packet_count,
            timeout,
            packet_interval: Duration::from_millis(200),
        }
    }

    pub fn with_packet_interval(mut self, packet_interval: Duration) -> Self {
        self.packet_interval = packet_interval;
        self
    }

    /// Upper bound on how long one cycle may take before it is abandoned
    pub fn deadline(&self) -> Duration {
        self.timeout
            .saturating_add(self.packet_interval)
            .saturating_mul(self.packet_count)
            .saturating_add(Duration::from_secs(1))
    }
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// Raw outcome of a probe cycle: packets sent and the round trips of the replies
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub sent: u32,
    pub round_trips_ms: Vec<f64>,
}

impl ProbeReport {
    pub fn new(sent: u32, round_trips_ms: Vec<f64>) -> Self {
        Self { sent, round_trips_ms }
    }

    pub fn received(&self) -> u32 {
        self.round_trips_ms.len() as u32
    }

    pub fn summarize(&self) -> ProbeSample {
        if self.sent == 0 {
            return ProbeSample::unreachable();
        }

        let received = self.received().min(self.sent);
        let loss_percent = 100.0 * f64::from(self.sent - received) / f64::from(self.sent);

        let latency_ms = if self.round_trips_ms.is_empty() {
            None
        } else {
            Some(self.round_trips_ms.iter().sum::<f64>() / self.round_trips_ms.len() as f64)
        };

        ProbeSample {
            latency_ms,
            loss_percent,
        }
    }
}

/// Latency and loss of one probe cycle, before it is placed in history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSample {
    pub latency_ms: Option<f64>,
    pub loss_percent: f64,
}

impl ProbeSample {
    /// The sample recorded when a probe could not be carried out at all
    pub fn unreachable() -> Self {
        Self {
            latency_ms: None,
            loss_percent: 100.0,
        }
    }
}

/// One entry of an endpoint's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Seconds since the Unix epoch
    pub ts: i64,
    /// Mean round trip in milliseconds, `None` when nothing answered
    pub latency: Option<f64>,
    /// Packet loss in percent, 0..=100
    pub loss: f64,
    pub status: Status,
}

impl Measurement {
    pub fn new(ts: i64, sample: ProbeSample, status: Status) -> Self {
        Self {
            ts,
            latency: sample.latency_ms,
            loss: sample.loss_percent,
            status,
        }
    }
}

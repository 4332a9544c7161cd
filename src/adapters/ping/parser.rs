use thiserror::Error;

use crate::domain::ProbeReport;

#[derive(Debug, Error)]
pub enum PingParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field: {0}")]
    MissingField(String),
}

pub type ParseResult<T> = Result<T, PingParseError>;

/// What a `ping` run printed, reduced to the numbers we keep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingSummary {
    pub transmitted: u32,
    pub received: u32,
    pub round_trips_ms: Vec<f64>,
}

impl PingSummary {
    pub fn into_report(mut self) -> ProbeReport {
        // Duplicate replies are excluded upstream, but never report more
        // replies than the summary counted.
        self.round_trips_ms.truncate(self.received as usize);
        ProbeReport::new(self.transmitted, self.round_trips_ms)
    }
}

/// Parse the stdout of iputils / BSD `ping`
pub fn parse_ping_output(content: &str) -> ParseResult<PingSummary> {
    let mut round_trips_ms = Vec::new();
    let mut counts = None;

    for line in content.lines() {
        if line.contains("packets transmitted") {
            counts = Some(parse_counts(line)?);
        } else if !line.contains("DUP!") {
            if let Some(rtt) = parse_reply_time(line)? {
                round_trips_ms.push(rtt);
            }
        }
    }

    let (transmitted, received) =
        counts.ok_or_else(|| PingParseError::MissingField("packets transmitted".to_string()))?;

    Ok(PingSummary {
        transmitted,
        received,
        round_trips_ms,
    })
}

/// Parse "5 packets transmitted, 4 received, 20% packet loss, time 4005ms"
/// (iputils) or "5 packets transmitted, 5 packets received, 0.0% packet loss" (BSD)
pub fn parse_counts(line: &str) -> ParseResult<(u32, u32)> {
    let mut parts = line.split(',');

    let transmitted = parts
        .next()
        .and_then(|p| p.split_whitespace().next())
        .ok_or_else(|| PingParseError::MissingField("transmitted".to_string()))?
        .parse::<u32>()
        .map_err(|e| PingParseError::Parse(format!("transmitted: {}", e)))?;

    let received = parts
        .next()
        .and_then(|p| p.split_whitespace().next())
        .ok_or_else(|| PingParseError::MissingField("received".to_string()))?
        .parse::<u32>()
        .map_err(|e| PingParseError::Parse(format!("received: {}", e)))?;

    Ok((transmitted, received))
}

/// Extract the round trip from a reply line such as
/// "64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.045 ms"
pub fn parse_reply_time(line: &str) -> ParseResult<Option<f64>> {
    let Some(idx) = line.find("time=").or_else(|| line.find("time<")) else {
        return Ok(None);
    };

    let value = line[idx + 5..]
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches("ms");

    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PingParseError::Parse(format!("reply time {:?}: {}", value, e)))
}

/// True when `ping` gave up because the name could not be resolved
pub fn is_resolution_failure(content: &str) -> bool {
    const MARKERS: [&str; 5] = [
        "Name or service not known",
        "Temporary failure in name resolution",
        "unknown host",
        "cannot resolve",
        "No address associated with hostname",
    ];

    MARKERS.iter().any(|marker| content.contains(marker))
}

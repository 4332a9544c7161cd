use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::{EndpointId, ProbeSample};

use super::registry::{Shared, TaskId};

/// Poller loop for one endpoint: probe, record, sleep, until shut down.
///
/// Both the probe and the sleep race against the shutdown signal, so a stop
/// never waits for a full cycle. The loop also ends as soon as the registry
/// refuses a sample, which happens once the entry is no longer ours.
pub(super) async fn run(
    shared: Arc<Shared>,
    endpoint: EndpointId,
    task_id: TaskId,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(endpoint = %endpoint, task = %task_id, "poller running");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let outcome = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            outcome = shared.prober.probe(&endpoint, &shared.settings.probe) => outcome,
        };

        let sample = match outcome {
            Ok(report) => report.summarize(),
            Err(e) => {
                debug!(endpoint = %endpoint, error = %e, "probe failed, recording as unreachable");
                ProbeSample::unreachable()
            }
        };

        if !shared.record(&endpoint, task_id, sample) {
            break;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(shared.settings.poll_interval) => {}
        }
    }

    debug!(endpoint = %endpoint, task = %task_id, "poller stopped");
}

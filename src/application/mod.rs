pub mod hosts;
mod poller;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use hosts::{HostError, HostService};
pub use registry::{MonitorSettings, MonitoringRegistry, Snapshot};

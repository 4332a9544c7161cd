pub mod host_list;
pub mod prober;

pub use host_list::{HostListSource, HostRecord};
pub use prober::{ProbeError, Prober};

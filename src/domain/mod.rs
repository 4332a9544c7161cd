pub mod endpoint;
pub mod history;
pub mod measurement;
pub mod status;

pub use endpoint::{EndpointError, EndpointId};
pub use history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use measurement::{Measurement, ProbeParams, ProbeReport, ProbeSample};
pub use status::{classify, Status, DEFAULT_STATUS_WINDOW};

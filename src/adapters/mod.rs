pub mod ping;
pub mod store;

pub use ping::SystemPingProber;
pub use store::JsonHostsFile;

pub mod consensus;
pub mod http;
pub mod peers;

pub use consensus::resolve_conflicts;
pub use http::HttpChainSource;
pub use peers::PeerRegistry;

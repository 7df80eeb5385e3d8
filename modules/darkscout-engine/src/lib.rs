pub mod analysis;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod html;
pub mod registry;
pub mod scanner;
pub mod session;

pub use analysis::analyze;
pub use export::{JsonFileSink, NoopSink, RecordSink, ScanRecord};
pub use fetch::{FetchOutcome, Fetcher, TorFetcher};
pub use registry::{Registry, TargetSite};
pub use scanner::Scanner;
pub use session::{SessionHandle, SessionStore};

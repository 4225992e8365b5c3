pub mod repair;
pub mod sources;
pub mod timeline;
pub mod upcoming;

pub use repair::repair_pending_requests;
pub use sources::{fetch_all, DomainSignals, SourceData};
pub use timeline::merge_timeline;
pub use upcoming::{build_upcoming, BackfillTarget};

pub mod config;
pub mod layout;
pub mod scheduler;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::{Config, PageBackend};
pub use layout::SheetLayout;
pub use scheduler::{Pacing, RunStats, Scheduler, Shard, SkipPolicy, SkipReason};
pub use store::{CellUpdate, RowStore, SheetsRowStore};

//! Application services for identity records.

mod backfill;

pub use backfill::{AccountBackfillService, BackfillReport, MissingAccount};

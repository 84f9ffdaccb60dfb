pub mod client;
pub mod error;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ReportClient, ReportTransport};
pub use error::ApiError;
pub use models::{
    DocField, DoctypeMeta, FilterDef, ReportDocument, ReportGeneratedEvent, ReportListEntry,
    ReportScript,
};

//! Shareprep Batch Library
//!
//! Runs a whole share batch: loads payloads from their sources, fans the
//! per-item transforms into one batch state stream, and after sending waits
//! for the messaging store to deliver every message.

pub mod aggregator;
pub mod delivery;
pub mod pipeline;
pub mod sources;

pub use aggregator::{combine, ItemAggregator, PreparedBatch};
pub use delivery::{DeliveryStream, DeliveryWatcher, MessageStateStream, MessageStore};
pub use pipeline::SharePipeline;
pub use sources::{load_payloads, PayloadSource};

use shareprep_core::{LogLevel, PrepareError};

/// Log a batch-level error at the level the error asks for.
pub fn log_error(error: &PrepareError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = error_code, "Batch ended");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = error_code, recoverable = error.is_recoverable(), "Batch failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code = error_code, recoverable = error.is_recoverable(), "Batch failed");
        }
    }
}

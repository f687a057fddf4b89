//! Store errors and their mapping into the service taxonomy

use thiserror::Error;
use types::errors::ServiceError;

/// Failures raised by the store API itself
///
/// Conflicts never surface here; they are absorbed by the retry loop in
/// [`crate::MemoryStore::run_transaction`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A transaction body issued a read after staging a write. The
    /// ordering contract is: all reads first, then all writes.
    #[error("read issued after a staged write")]
    ReadAfterWrite,

    /// The optimistic retry budget ran out under sustained contention
    #[error("transaction attempts exhausted after {attempts}")]
    AttemptsExhausted { attempts: u32 },
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        // Callers see the taxonomy, never store internals.
        match err {
            StoreError::ReadAfterWrite => ServiceError::internal("storage access out of order"),
            StoreError::AttemptsExhausted { .. } => {
                ServiceError::internal("storage contention, try again")
            }
        }
    }
}

use thiserror::Error;

/// Errors reported by [`ChainedHashMap`](crate::ChainedHashMap) and
/// [`MapConfig`](crate::MapConfig).
///
/// Every error is raised before any mutation takes place, so the collection
/// is left exactly as it was when an operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// An argument was absent (`None`) or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The requested key is not present in the map.
    #[error("key is not present in the map")]
    NotFound,
}

/// Result type returned by fallible map operations.
pub type Result<T> = core::result::Result<T, MapError>;

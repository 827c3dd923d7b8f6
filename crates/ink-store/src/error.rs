/// Errors returned by store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed record does not exist
    #[error("{entity} not found")]
    NotFound {
        /// Collection the lookup targeted
        entity: &'static str,
    },

    /// Underlying backend failure
    #[error("store backend: {0}")]
    Backend(String),
}

impl StoreError {
    /// Shorthand for a missing record in `entity`
    #[must_use]
    pub const fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

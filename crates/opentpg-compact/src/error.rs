//! Error types for the compaction pipeline.

use thiserror::Error;

/// Error type for compaction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompactError {
    /// The algorithm tag is not in the recognized set.
    ///
    /// The reference driver logs this and falls back to no compaction.
    #[error("unknown compaction algorithm `{0}`")]
    UnknownAlgorithm(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_tag() {
        let err = CompactError::UnknownAlgorithm("dsatur2".into());
        assert!(err.to_string().contains("dsatur2"));
    }
}

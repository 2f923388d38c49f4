use content_store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for sink operations
pub type SinkResult = std::result::Result<(), SinkError>;

/// Failure classes for journal sink operations. A missing collection is
/// not a failure (the appender creates it), and a corrupt collection is
/// recovered in place; neither appears here.
#[derive(Error, Debug)]
pub enum SinkError {
    /// A concurrent writer advanced the collection between our read and
    /// write. The entry is lost; the loss must be logged with the dataset
    /// id for later reconciliation.
    #[error("version conflict appending to {dataset}")]
    Conflict { dataset: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("sink call exceeded {0:?}")]
    Timeout(Duration),
}

impl From<StoreError> for SinkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id } => SinkError::Conflict { dataset: id },
            other => SinkError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: SinkError = StoreError::Conflict {
            id: "dni.json".into(),
        }
        .into();
        assert!(matches!(err, SinkError::Conflict { dataset } if dataset == "dni.json"));
    }

    #[test]
    fn test_other_store_errors_map_to_transport() {
        let err: SinkError = StoreError::Status {
            id: "dni.json".into(),
            status: 503,
        }
        .into();
        assert!(matches!(err, SinkError::Transport(_)));
    }
}

use thiserror::Error;

/// Errors surfaced by CRDT operations, payload decoding and payload stores.
///
/// Every failure is synchronous and returned to the immediate caller. A
/// mutator that returns an error has not modified its payload.
#[derive(Error, Debug)]
pub enum CrdtError {
    /// A removal (or other) operation was invoked on a type that never
    /// supports it, such as `discard` on a [`GSet`](crate::GSet).
    #[error("{crdt} does not support {operation}")]
    UnsupportedOperation {
        /// Name of the CRDT type.
        crdt: &'static str,
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// A composite entity was used without a required non-replicated field,
    /// or two entities with different identities were combined.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A payload did not have the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload store failed to read or write a document.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CrdtError {
    fn from(err: serde_json::Error) -> Self {
        CrdtError::MalformedPayload(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CrdtError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_operation_names_type_and_operation() {
        let err = CrdtError::UnsupportedOperation {
            crdt: "GSet",
            operation: "discard",
        };
        assert_eq!(err.to_string(), "GSet does not support discard");
    }

    #[test]
    fn json_errors_become_malformed_payload() {
        let err: CrdtError = serde_json::from_str::<u64>("\"nope\"")
            .map_err(CrdtError::from)
            .unwrap_err();
        assert!(matches!(err, CrdtError::MalformedPayload(_)));
    }
}

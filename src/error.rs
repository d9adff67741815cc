//! Error types.

/// Errors that halt a call or a run.
///
/// Per-vehicle lookup failures are not represented here; they surface as
/// [LookupError] at the engine boundary and are absorbed where they occur.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller broke a precondition, e.g. an empty queue set or an unknown discipline name.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The static tables are malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The configuration text could not be parsed.
    #[error("malformed configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The traffic engine failed in a way the run cannot recover from.
    #[error("traffic engine failure: {source}")]
    Engine {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wraps a structural failure reported by a traffic engine.
    pub fn engine(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Engine {
            source: Box::new(source),
        }
    }
}

/// A recoverable failure to query one vehicle's attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The vehicle is no longer present in the engine.
    #[error("vehicle no longer exists")]
    VehicleGone,
    /// The attribute exists but its value cannot be interpreted.
    #[error("malformed `{attribute}` attribute: {value:?}")]
    Malformed {
        attribute: &'static str,
        value: String,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("socket closed")]
    struct Closed;

    #[test]
    fn engine_error_keeps_source() {
        let err = Error::engine(Closed);
        assert!(err.to_string().contains("socket closed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_lookup_names_attribute() {
        let err = LookupError::Malformed {
            attribute: "deadline",
            value: "soon".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("deadline"), "got: {msg}");
        assert!(msg.contains("soon"), "got: {msg}");
    }
}

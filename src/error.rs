//! Error types shared by the counter, reducer and codec.
//!
//! The CLI wraps these in `anyhow` with context; library callers can match
//! on the variant.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("value {value} is outside the 5-byte signed range [{min}, {max}]")]
    InputRange { value: i64, min: i64, max: i64 },

    #[error("cannot decode encrypted value: {0}")]
    Decode(String),

    #[error("cipher failure: {0}")]
    Cipher(String),

    #[error("worker failed on task {task_id}: {message}")]
    WorkerFailure { task_id: usize, message: String },

    #[error("invalid range: low ({low}) is greater than high ({high})")]
    InvalidRange { low: i64, high: i64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Error::Decode(reason.into())
    }

    /// Turns a caught panic payload into a `WorkerFailure`.
    pub(crate) fn from_panic(task_id: usize, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker panicked".to_string()
        };
        Error::WorkerFailure { task_id, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::InputRange {
            value: 1 << 40,
            min: -(1 << 39),
            max: (1 << 39) - 1,
        };
        assert!(err.to_string().contains("1099511627776"));
        assert!(err.to_string().contains("5-byte"));

        let err = Error::decode("bad padding");
        assert!(err.to_string().contains("cannot decode"));
        assert!(err.to_string().contains("bad padding"));

        let err = Error::Cipher("invalid key or IV length".to_string());
        assert!(err.to_string().starts_with("cipher failure"));

        let err = Error::InvalidRange { low: 5, high: 1 };
        assert!(err.to_string().contains("low (5)"));
        assert!(err.to_string().contains("high (1)"));
    }

    #[test]
    fn test_panic_payload_messages() {
        let err = Error::from_panic(3, Box::new("boom"));
        assert!(matches!(err, Error::WorkerFailure { task_id: 3, ref message } if message == "boom"));

        let err = Error::from_panic(1, Box::new(String::from("owned boom")));
        assert!(err.to_string().contains("owned boom"));

        let err = Error::from_panic(0, Box::new(42u8));
        assert!(err.to_string().contains("worker panicked"));
    }
}

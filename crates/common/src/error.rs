//! Error types shared by the Insticator adapters.
//!
//! Errors are carried in [`error_stack::Report`] so call sites can attach
//! context while the adapter hooks stay free of panics.

use derive_more::{Display, Error};

/// Errors raised by the bid and analytics adapters.
#[derive(Debug, Display, Error)]
pub enum InsticatorError {
    /// Settings could not be loaded or failed validation.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// An ad-slot descriptor is missing required parameters.
    #[display("Invalid bid request: {message}")]
    InvalidBidRequest { message: String },

    /// A payload could not be serialized or deserialized.
    #[display("Serialization error: {message}")]
    Serialization { message: String },

    /// A bidder response could not be interpreted.
    #[display("Response error: {message}")]
    Response { message: String },

    /// Analytics event could not be assembled or forwarded.
    #[display("Analytics error: {message}")]
    Analytics { message: String },

    /// The host transport rejected a request.
    #[display("Transport error: {message}")]
    Transport { message: String },
}

impl InsticatorError {
    /// Short machine-readable category, used in structured log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::InvalidBidRequest { .. } => "invalid_bid_request",
            Self::Serialization { .. } => "serialization",
            Self::Response { .. } => "response",
            Self::Analytics { .. } => "analytics",
            Self::Transport { .. } => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_stack::Report;

    #[test]
    fn display_includes_category_and_message() {
        let err = InsticatorError::Configuration {
            message: "missing endpoint".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing endpoint");

        let err = InsticatorError::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn kind_is_stable_per_variant() {
        let err = InsticatorError::InvalidBidRequest {
            message: "no sizes".to_string(),
        };
        assert_eq!(err.kind(), "invalid_bid_request");
    }

    #[test]
    fn report_keeps_current_context() {
        let report = Report::new(InsticatorError::Response {
            message: "id mismatch".to_string(),
        });
        assert!(matches!(
            report.current_context(),
            InsticatorError::Response { .. }
        ));
    }
}

//! Error types shared by AI gateway implementations.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`AiError`] failures.
pub type AiResult<T> = Result<T, AiError>;

/// Failures that can occur while talking to the generative model endpoints.
#[derive(Debug, Error)]
pub enum AiError {
    /// Required API key is missing from the environment.
    #[error("missing AI gateway environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build AI gateway client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// A request to a model endpoint could not be sent.
    #[error("failed to send `{operation}` request")]
    RequestSend {
        /// Gateway operation being performed.
        operation: &'static str,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The model endpoint returned an unexpected status code.
    #[error("unexpected response status {status} for `{operation}`")]
    RequestStatus {
        /// Gateway operation being performed.
        operation: &'static str,
        /// HTTP status returned.
        status: StatusCode,
    },
    /// Response payload could not be read as JSON.
    #[error("failed to decode response for `{operation}`")]
    DecodeResponse {
        /// Gateway operation being performed.
        operation: &'static str,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
    /// The model produced no usable candidate.
    #[error("model returned no content for `{operation}`")]
    EmptyResponse {
        /// Gateway operation being performed.
        operation: &'static str,
    },
    /// The model's structured output did not match the expected schema.
    #[error("failed to deserialize model output for `{operation}`")]
    DeserializePayload {
        /// Gateway operation being performed.
        operation: &'static str,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// The payload was syntactically valid but semantically unusable.
    #[error("malformed model output for `{operation}`: {detail}")]
    Malformed {
        /// Gateway operation being performed.
        operation: &'static str,
        /// What exactly was wrong.
        detail: String,
    },
    /// Audio payload was not valid base64.
    #[error("invalid audio payload for `{operation}`")]
    InvalidAudio {
        /// Gateway operation being performed.
        operation: &'static str,
        /// Underlying decode error.
        #[source]
        source: base64::DecodeError,
    },
}

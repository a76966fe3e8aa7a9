use thiserror::Error;

/// The provider answered, but reported something other than `NORMAL_SERVICE`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resultCode: {code}, resultMsg: {message}")]
pub struct ApiFault {
    pub code: String,
    pub message: String,
}

/// Failure below the API layer: the request never produced a usable body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum KmaError {
    #[error(transparent)]
    Api(#[from] ApiFault),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("record {index} is missing field `{field}`")]
    MalformedRecord { index: usize, field: &'static str },

    #[error("response is not a KMA envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T, E = KmaError> = std::result::Result<T, E>;

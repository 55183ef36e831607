use thiserror::Error;

/// Failure retrieving or parsing one feed. Carries the feed URL so callers
/// can log and skip without extra bookkeeping.
#[derive(Error, Debug)]
#[error("failed to fetch feed {url}: {source}")]
pub struct FeedFetchError {
    pub url: String,
    #[source]
    pub source: FetchFailure,
}

impl FeedFetchError {
    pub fn new(url: impl Into<String>, source: FetchFailure) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }

    pub fn should_retry(&self) -> bool {
        self.source.should_retry()
    }
}

#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error("feed url is invalid: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("could not reach feed host: {0}")]
    Connect(String),

    #[error("timed out connecting to feed host")]
    ConnectTimeout,

    #[error("feed request timed out")]
    RequestTimeout,

    #[error("feed redirected too many times")]
    RedirectLoop,

    #[error("feed server answered {status}")]
    Http {
        status: reqwest::StatusCode,
        retriable: bool,
    },

    #[error("feed body exceeds limit ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("not a feed content type: {0}")]
    UnsupportedContentType(String),

    #[error("feed body could not be decoded: {0}")]
    Charset(String),

    #[error("feed document is malformed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    #[error("reading feed body failed: {0}")]
    Io(String),

    #[error("unexpected fetch failure: {0}")]
    Unknown(String),
}

impl FetchFailure {
    /// Non-success status; server errors and 429 are worth another try.
    pub fn http(status: reqwest::StatusCode) -> Self {
        Self::Http {
            status,
            retriable: status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn should_retry(&self) -> bool {
        match self {
            Self::InvalidUrl(_)
            | Self::BodyTooLarge(_)
            | Self::UnsupportedContentType(_)
            | Self::Charset(_)
            | Self::Parse(_) => false,
            Self::Http { retriable, .. } => *retriable,
            Self::Connect(_)
            | Self::ConnectTimeout
            | Self::RequestTimeout
            | Self::RedirectLoop
            | Self::Io(_)
            | Self::Unknown(_) => true,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::http(status)
        } else if err.is_connect() || err.is_request() {
            Self::Connect(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

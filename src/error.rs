use reqwest::header::InvalidHeaderValue as HeaderError;
use reqwest::Error as ReqwestError;
use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;

/// Error messages returned by the server along with `"status": false`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApiErrors(Vec<String>);

impl ApiErrors {
    pub fn new(errors: Vec<String>) -> Self {
        ApiErrors(errors)
    }

    /// Returns true if the server sent the given text in any of its messages.
    pub fn contains(&self, text: &str) -> bool {
        self.0.iter().any(|m| m.contains(text))
    }

    /// Performs the conversion into `Vec`
    pub fn to_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for ApiErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl StdError for ApiErrors {}

/// The Errors wrapper that may occur.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The request could not be sent or its body could not be read.
    Http(ReqwestError),
    /// A header value could not be built from the session.
    HeaderError(HeaderError),
    /// The server replied with a status other than 200.
    HttpStatus(u16),
    /// The server replied with a body that is not JSON.
    MalformedResponse(String),
    /// The server replied with `"status": false`.
    Api(ApiErrors),
    /// The session is empty or no longer authenticated.
    NotLoggedIn,
    /// A date argument has a wrong format.
    InvalidDate(String),
    /// An argument is out of the allowed set.
    InvalidArgument(String),
    /// A value could not be extracted from an HTML, XML or JS reply.
    Scrape(String),
    /// Writing a debug dump failed.
    Io(IoError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Http(ref e) => write!(f, "request to 12306 failed: {}", e),
            Error::HeaderError(ref e) => write!(f, "invalid cookie value: {}", e),
            Error::HttpStatus(status) => write!(f, "12306 replied with http status {}", status),
            Error::MalformedResponse(ref s) => {
                debug!("malformed response: {}", s);
                write!(f, "response is not valid json")
            }
            Error::Api(ref e) => write!(f, "12306 rejected the request: {}", e),
            Error::NotLoggedIn => write!(f, "user is not logged in"),
            Error::InvalidDate(ref s) => write!(f, "invalid date: {}", s),
            Error::InvalidArgument(ref s) => write!(f, "invalid argument: {}", s),
            Error::Scrape(ref s) => write!(f, "failed to extract {} from the reply", s),
            Error::Io(ref e) => write!(f, "debug dump failed: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Http(ref e) => Some(e),
            Error::HeaderError(ref e) => Some(e),
            Error::Api(ref e) => Some(e),
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReqwestError> for Error {
    fn from(error: ReqwestError) -> Error {
        Error::Http(error)
    }
}

impl From<HeaderError> for Error {
    fn from(error: HeaderError) -> Error {
        Error::HeaderError(error)
    }
}

impl From<ApiErrors> for Error {
    fn from(error: ApiErrors) -> Error {
        Error::Api(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::Io(error)
    }
}

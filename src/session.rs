use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{error::Error, Result};

/// Cookies identifying a 12306 session (`route`, `JSESSIONID`,
/// `BIGipServerotn`, `tk`, ...).
///
/// The client only reads a session; every change produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session(BTreeMap<String, String>);

impl Session {
    /// Creates an empty, unauthenticated session.
    pub fn new() -> Self {
        Session(BTreeMap::new())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Session(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a copy of the session with one more cookie.
    pub fn with(&self, name: &str, value: &str) -> Session {
        let mut cookies = self.0.clone();
        cookies.insert(name.to_string(), value.to_string());
        Session(cookies)
    }

    /// Returns a copy of the session carrying the final `tk` token.
    pub fn with_token(&self, apptk: &str) -> Session {
        self.with("tk", apptk)
    }

    /// Returns a copy of the session with the cookies of `other` on top.
    pub fn merge(&self, other: &Session) -> Session {
        let mut cookies = self.0.clone();
        cookies.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Session(cookies)
    }

    /// Renders the value of the `Cookie` header.
    pub fn cookie_header(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<String>>()
            .join("; ")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.cookie_header())
    }
}

impl FromStr for Session {
    type Err = Error;

    /// Parses a `Cookie` header string like `a=1; b=2`.
    fn from_str(s: &str) -> Result<Self> {
        let mut cookies = BTreeMap::new();

        for pair in s.split(';').map(|p| p.trim()).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((k, v)) if !k.trim().is_empty() => {
                    cookies.insert(k.trim().to_string(), v.trim().to_string());
                }
                _ => return Err(Error::InvalidArgument(format!("cookie `{}`", pair))),
            }
        }

        Ok(Session(cookies))
    }
}

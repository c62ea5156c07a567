use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_1) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/72.0.3626.109 Safari/537.36";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration of the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout of a single request.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Where bodies of bad replies are dumped, nothing is written if `None`.
    pub debug_dir: Option<PathBuf>,
    /// Ask the server whether the session is logged in before every
    /// authenticated call.
    pub check_login: bool,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            debug_dir: None,
            check_login: true,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Dump bodies of non-200 and non-JSON replies under `dir`.
    pub fn with_debug_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.debug_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Turn the login pre-check off; an empty session is still rejected.
    pub fn with_login_check(mut self, check: bool) -> Self {
        self.check_login = check;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::new()
    }
}

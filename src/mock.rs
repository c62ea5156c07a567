//! A transport serving canned replies, for testing without the network.
//!
//! Replies are keyed by a part of the URL; the longest matching key wins.
//! Every request is recorded, so a test can check what was sent and that
//! nothing was sent at all.

use std::sync::{Mutex, MutexGuard};

use crate::client::{RawResponse, Request, Transport};
use crate::session::Session;
use crate::Result;

const LOGIN_CONF_PATH: &str = "/otn/login/conf";

#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, RawResponse)>,
    requests: Mutex<Vec<(Request, Session)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Replies with `response` to every request whose URL contains `url_part`.
    pub fn on(mut self, url_part: &str, response: RawResponse) -> Self {
        self.routes.push((url_part.to_string(), response));
        self
    }

    /// Replies with a 200 and the given body.
    pub fn on_json(self, url_part: &str, body: &str) -> Self {
        self.on(url_part, RawResponse::new(200, body))
    }

    /// Answers the login check positively.
    pub fn logged_in(self) -> Self {
        self.on_json(
            LOGIN_CONF_PATH,
            r#"{"validateMessagesShowId":"_validatorMessage","status":true,"httpstatus":200,"data":{"is_login":"Y","is_uam_login":"Y","isstudentDate":false},"messages":[],"validateMessages":{}}"#,
        )
    }

    /// Answers the login check negatively.
    pub fn logged_out(self) -> Self {
        self.on_json(
            LOGIN_CONF_PATH,
            r#"{"validateMessagesShowId":"_validatorMessage","status":true,"httpstatus":200,"data":{"is_login":"N","is_uam_login":"Y","isstudentDate":false},"messages":[],"validateMessages":{}}"#,
        )
    }

    /// Returns the recorded requests in order.
    pub fn requests(&self) -> Vec<Request> {
        self.recorded().iter().map(|(r, _)| r.clone()).collect()
    }

    /// Returns the recorded requests to URLs containing `url_part`.
    pub fn requests_to(&self, url_part: &str) -> Vec<Request> {
        self.recorded()
            .iter()
            .filter(|(r, _)| r.url().contains(url_part))
            .map(|(r, _)| r.clone())
            .collect()
    }

    /// Returns the session sent with the last request.
    pub fn last_session(&self) -> Option<Session> {
        self.recorded().last().map(|(_, s)| s.clone())
    }

    pub fn request_count(&self) -> usize {
        self.recorded().len()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<(Request, Session)>> {
        match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Request, session: &Session) -> Result<RawResponse> {
        self.recorded().push((request.clone(), session.clone()));

        let response = self
            .routes
            .iter()
            .filter(|(part, _)| request.url().contains(part.as_str()))
            .max_by_key(|(part, _)| part.len())
            .map(|(_, r)| r.clone());

        match response {
            Some(r) => Ok(r),
            None => {
                debug!("no canned reply for {}", request);
                Ok(RawResponse::new(404, "Not Found"))
            }
        }
    }
}

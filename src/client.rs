use chrono::Local;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, REFERER};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::{fmt, fs};
use url::form_urlencoded::Serializer;

use crate::auth::AuthApi;
use crate::config::ClientConfig;
use crate::error::{ApiErrors, Error};
use crate::order::OrderApi;
use crate::pay::PayApi;
use crate::query::QueryApi;
use crate::session::Session;
use crate::user::{MemberApi, UserApi};
use crate::Result;

const RAIL_REFERER: &str = "https://kyfw.12306.cn/otn/";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Encoding of the parameters of a POST request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyFormat {
    Form,
    Json,
}

/// A request described as plain data.
///
/// Parameters keep their order; GET parameters go to the query string,
/// POST parameters to the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    url: String,
    method: Method,
    format: BodyFormat,
    params: Vec<(String, String)>,
}

impl Request {
    pub fn new(method: Method, url: &str) -> Self {
        Request {
            url: url.to_string(),
            method,
            format: BodyFormat::Form,
            params: vec![],
        }
    }

    pub fn get(url: &str) -> Self {
        Request::new(Method::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Request::new(Method::Post, url)
    }

    pub fn form(mut self) -> Self {
        self.format = BodyFormat::Form;
        self
    }

    /// Sends POST parameters as a JSON object instead of a form.
    pub fn json(mut self) -> Self {
        self.format = BodyFormat::Json;
        self
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn format(&self) -> BodyFormat {
        self.format
    }

    #[inline]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the value of the first parameter with the given name.
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the URL to send, with the query string for GET requests.
    pub fn full_url(&self) -> String {
        if self.method == Method::Post || self.params.is_empty() {
            return self.url.clone();
        }

        let query = Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, sep, query)
    }

    /// Returns the content type and the body of a POST request.
    pub fn body(&self) -> Option<(&'static str, String)> {
        if self.method == Method::Get {
            return None;
        }

        match self.format {
            BodyFormat::Form => {
                let body = Serializer::new(String::new())
                    .extend_pairs(self.params.iter())
                    .finish();
                Some((FORM_CONTENT_TYPE, body))
            }
            BodyFormat::Json => {
                let object: Map<String, Value> = self
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                Some((JSON_CONTENT_TYPE, Value::Object(object).to_string()))
            }
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A reply as received, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: &str) -> Self {
        RawResponse {
            status,
            headers: vec![],
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns every value of a header, names are compared case-insensitively.
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns all `Set-Cookie` values joined the way `requests` joins them.
    pub fn set_cookie(&self) -> String {
        self.header_all("set-cookie").join(", ")
    }
}

/// Sends a request and returns the reply untouched.
pub trait Transport {
    fn send(&self, request: &Request, session: &Session) -> Result<RawResponse>;
}

/// The transport going to the network.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(request_headers_default())
            .build()?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request, session: &Session) -> Result<RawResponse> {
        let mut headers = HeaderMap::new();
        if !session.is_empty() {
            headers.insert(COOKIE, HeaderValue::from_str(&session.cookie_header())?);
        }

        let builder = match request.method() {
            Method::Get => self.client.get(request.full_url()),
            Method::Post => {
                let builder = self.client.post(request.url());
                match request.body() {
                    Some((content_type, body)) => builder
                        .header(CONTENT_TYPE, content_type)
                        .body(body),
                    None => builder,
                }
            }
        };

        let result = builder.headers(headers).send()?;

        let status = result.status().as_u16();
        let headers: Vec<(String, String)> = result
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = result.text()?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn request_headers_default() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, HeaderValue::from_static(RAIL_REFERER));
    headers
}

/// The client of the 12306 endpoints.
///
/// It holds the transport and the configuration only; the login state lives
/// in the [`Session`] passed to every call.
pub struct TrainClient<T = HttpTransport> {
    transport: T,
    config: ClientConfig,
}

impl TrainClient<HttpTransport> {
    /// Creates a client sending requests to the network.
    ///
    /// # Errors
    ///
    /// The method fails if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(TrainClient { transport, config })
    }
}

impl<T> TrainClient<T>
where
    T: Transport,
{
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        TrainClient { transport, config }
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn auth(&self) -> AuthApi<'_, T> {
        AuthApi::new(self)
    }

    pub fn user(&self) -> UserApi<'_, T> {
        UserApi::new(self)
    }

    pub fn member(&self) -> MemberApi<'_, T> {
        MemberApi::new(self)
    }

    pub fn query(&self) -> QueryApi<'_, T> {
        QueryApi::new(self)
    }

    pub fn order(&self) -> OrderApi<'_, T> {
        OrderApi::new(self)
    }

    pub fn pay(&self) -> PayApi<'_, T> {
        PayApi::new(self)
    }

    /// Sends the request and returns the reply without looking at it.
    pub fn submit_raw(&self, request: &Request, session: &Session) -> Result<RawResponse> {
        debug!(
            "train request. url: {} method: {} params: {:?}",
            request.url(),
            request.method(),
            request.params()
        );

        self.transport.send(request, session)
    }

    /// Sends the request and checks the reply is a JSON object with
    /// `"status": true`.
    ///
    /// # Errors
    ///
    /// The method fails if the reply status is not 200, the body is not JSON
    /// or the server rejected the request.
    pub fn submit(&self, request: &Request, session: &Session) -> Result<Value> {
        let reply = self.submit_json(request, session)?;

        if reply.get("status") != Some(&Value::Bool(true)) {
            warn!("{} resp. {}", request.url(), reply);
            return Err(Error::Api(api_errors(&reply)));
        }

        Ok(reply)
    }

    // Requires a 200 reply, the body is returned as is.
    pub(crate) fn submit_ok(&self, request: &Request, session: &Session) -> Result<RawResponse> {
        let result = self.submit_raw(request, session)?;

        if !result.is_ok() {
            error!("server returned {}", result.status);
            self.dump_response(request.url(), &result.body);
            return Err(Error::HttpStatus(result.status));
        }

        Ok(result)
    }

    // Requires a 200 JSON reply, whatever its `status` is.
    pub(crate) fn submit_json(&self, request: &Request, session: &Session) -> Result<Value> {
        let result = self.submit_ok(request, session)?;

        match serde_json::from_str::<Value>(&result.body) {
            Ok(v) => {
                trace!("reply: {}", v);
                Ok(v)
            }
            Err(e) => {
                warn!("{}", e);
                self.dump_response(request.url(), &result.body);
                Err(Error::MalformedResponse(e.to_string()))
            }
        }
    }

    /// Checks the session before an authenticated call.
    ///
    /// # Errors
    ///
    /// The method fails with `Error::NotLoggedIn` if the session is empty,
    /// without sending anything, or if the server says it is not logged in.
    pub fn require_login(&self, session: &Session) -> Result<()> {
        if session.is_empty() {
            warn!("no session given");
            return Err(Error::NotLoggedIn);
        }

        if self.config.check_login && !self.auth().user_check_login(session)? {
            warn!("session is not logged in");
            return Err(Error::NotLoggedIn);
        }

        Ok(())
    }

    fn dump_response(&self, url: &str, body: &str) {
        let dir = match self.config.debug_dir {
            Some(ref d) => d,
            None => return,
        };

        match write_dump(dir.clone(), url, body) {
            Ok(path) => debug!("response dumped to {}", path.display()),
            Err(e) => warn!("{}", e),
        }
    }
}

fn write_dump(mut path: PathBuf, url: &str, body: &str) -> Result<PathBuf> {
    path.push(Local::now().format("%Y-%m-%d").to_string());
    fs::create_dir_all(&path)?;

    let name: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    path.push(format!("{}-{}", name, uuid::Uuid::new_v4().simple()));
    fs::write(&path, body)?;

    Ok(path)
}

// Collects the messages the server puts next to `"status": false`.
fn api_errors(reply: &Value) -> ApiErrors {
    let mut errors: Vec<String> = vec![];

    if let Some(Value::Array(messages)) = reply.get("messages") {
        errors.extend(
            messages
                .iter()
                .filter_map(|m| m.as_str())
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        );
    }

    for key in ["errMsg", "errorMsg", "message"] {
        if let Some(m) = reply.get(key).and_then(|m| m.as_str()) {
            if !m.trim().is_empty() {
                errors.push(m.trim().to_string());
            }
        }
    }

    if errors.is_empty() {
        errors.push(reply.to_string());
    }

    ApiErrors::new(errors)
}

use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::{Request, TrainClient, Transport};
use crate::des::{des_any_to_string, des_null_to_default, from_reply};
use crate::session::Session;
use crate::{error::Error, Result};

const LOGIN_CONF_URL: &str = "https://kyfw.12306.cn/otn/login/conf";
const QR_CREATE_URL: &str = "https://kyfw.12306.cn/passport/web/create-qr64";
const QR_CHECK_URL: &str = "https://kyfw.12306.cn/passport/web/checkqr";
const UAMTK_URL: &str = "https://kyfw.12306.cn/passport/web/auth/uamtk";
const UAMAUTH_URL: &str = "https://kyfw.12306.cn/otn/uamauthclient";

const APP_ID: &str = "otn";

/// Login and session endpoints.
pub struct AuthApi<'a, T> {
    client: &'a TrainClient<T>,
}

impl<'a, T> AuthApi<'a, T>
where
    T: Transport,
{
    pub(crate) fn new(client: &'a TrainClient<T>) -> Self {
        AuthApi { client }
    }

    /// Asks the server whether the session is logged in.
    ///
    /// An empty session is never sent and is reported as not logged in.
    pub fn user_check_login(&self, session: &Session) -> Result<bool> {
        if session.is_empty() {
            return Ok(false);
        }

        let reply = self.client.submit(&Request::post(LOGIN_CONF_URL), session)?;
        let is_login = reply
            .get("data")
            .and_then(|d| d.get("is_login"))
            .and_then(|v| v.as_str());

        Ok(is_login == Some("Y"))
    }

    /// Opens a new anonymous session.
    ///
    /// # Errors
    ///
    /// The method fails if any of `route`, `JSESSIONID` or `BIGipServerotn`
    /// is missing from the `Set-Cookie` headers.
    pub fn auth_init(&self) -> Result<Session> {
        let result = self
            .client
            .submit_ok(&Request::post(LOGIN_CONF_URL), &Session::new())?;

        parse_init_cookies(&result.set_cookie())
    }

    /// Creates a login QR code.
    pub fn auth_qr_get(&self, session: &Session) -> Result<QrCode> {
        let request = Request::post(QR_CREATE_URL).param("appid", APP_ID);
        let reply = self.client.submit_json(&request, session)?;

        from_reply(reply)
    }

    /// Returns the scan state of a QR code, polled by the caller until the
    /// state is [`QrState::Confirmed`] or [`QrState::Expired`].
    pub fn auth_qr_check(&self, uuid: &str, session: &Session) -> Result<QrCheck> {
        if uuid.trim().is_empty() {
            return Err(Error::InvalidArgument("empty qr uuid".to_string()));
        }

        let request = Request::post(QR_CHECK_URL)
            .param("uuid", uuid)
            .param("appid", APP_ID);
        let reply = self.client.submit_json(&request, session)?;

        let check: QrCheck = from_reply(reply)?;
        debug!("qr {} state: {:?}", uuid, check.state());
        Ok(check)
    }

    /// Exchanges the `uamtk` ticket of a confirmed QR code for `newapptk`.
    pub fn auth_uamtk(&self, uamtk: &str, session: &Session) -> Result<UamtkReply> {
        let request = Request::post(UAMTK_URL)
            .param("uamtk", uamtk)
            .param("appid", APP_ID);
        let reply = self.client.submit_json(&request, session)?;

        from_reply(reply)
    }

    /// Exchanges `newapptk` for the final `apptk`, which goes to the session
    /// as the `tk` cookie.
    pub fn auth_uamauth(&self, apptk: &str, session: &Session) -> Result<UamauthReply> {
        let request = Request::post(UAMAUTH_URL).param("tk", apptk);
        let reply = self.client.submit_json(&request, session)?;

        from_reply(reply)
    }
}

fn parse_init_cookies(set_cookie: &str) -> Result<Session> {
    let patterns = [
        ("route", r"route=([0-9a-z]+)"),
        ("JSESSIONID", r"JSESSIONID=([0-9a-zA-Z]+)"),
        ("BIGipServerotn", r"BIGipServerotn=([0-9.]+)"),
    ];

    let mut cookies = vec![];
    for (name, pattern) in patterns {
        let re = Regex::new(pattern).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        let value = match re.captures(set_cookie).and_then(|c| c.get(1)) {
            Some(m) => m.as_str(),
            None => return Err(Error::Scrape(format!("{} cookie", name))),
        };
        cookies.push((name, value));
    }

    Ok(Session::from_pairs(cookies))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// A login QR code.
pub struct QrCode {
    #[serde(default)]
    pub uuid: String,

    /// PNG image in base64.
    #[serde(default)]
    pub image: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub result_code: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub result_message: String,
}

impl QrCode {
    /// Decodes the PNG image.
    pub fn image_bytes(&self) -> Result<Vec<u8>> {
        general_purpose::STANDARD
            .decode(self.image.trim())
            .map_err(|e| Error::Scrape(format!("qr image ({})", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Scan state of a login QR code.
pub enum QrState {
    /// Nobody scanned it yet.
    Waiting,
    /// Scanned, waiting for the confirmation on the phone.
    Scanned,
    /// Confirmed, `uamtk` is set.
    Confirmed,
    /// The code is no longer valid.
    Expired,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Reply of a QR code check.
pub struct QrCheck {
    #[serde(default, deserialize_with = "des_any_to_string")]
    pub result_code: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub result_message: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub uamtk: String,
}

impl QrCheck {
    pub fn state(&self) -> QrState {
        match self.result_code.as_str() {
            "0" => QrState::Waiting,
            "1" => QrState::Scanned,
            "2" => QrState::Confirmed,
            "3" => QrState::Expired,
            other => QrState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for QrCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.result_code, self.result_message)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UamtkReply {
    #[serde(default, deserialize_with = "des_any_to_string")]
    pub result_code: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub result_message: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub newapptk: String,
}

impl UamtkReply {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.result_code == "0"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UamauthReply {
    #[serde(default, deserialize_with = "des_any_to_string")]
    pub result_code: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub result_message: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub apptk: String,

    #[serde(default, deserialize_with = "des_null_to_default")]
    pub username: String,
}

impl UamauthReply {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.result_code == "0"
    }
}

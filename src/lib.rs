//! # rail12306
//!
//! The `rail12306` crate is a client for the web endpoints of the
//! 12306 railway ticketing site: QR-code login, user and member profile,
//! ticket, fare and station queries, order submission and payment.
//!
//! Every call is blocking and issues exactly one request. The client keeps
//! no login state: the caller owns a [`Session`] and passes it to every
//! authenticated call.
//!
//! ## Making requests
//!
//! ```rust,no_run
//! # use rail12306::{ClientConfig, TrainClient, SeatType};
//! #
//! let client = TrainClient::new(ClientConfig::default()).unwrap();
//!
//! let tickets = client
//!     .query()
//!     .info_query_left_tickets("2019-01-20", "BJP", "SHH", "ADULT")
//!     .unwrap();
//!
//! for t in tickets.iter().filter(|t| t.has_seats(SeatType::Second)) {
//!     println!("{}", t);
//! }
//! ```
//!
//! ## Logging in
//!
//! ```rust,no_run
//! # use rail12306::{ClientConfig, QrState, TrainClient};
//! # use std::{thread, time::Duration};
//! #
//! let client = TrainClient::new(ClientConfig::default()).unwrap();
//! let auth = client.auth();
//!
//! let session = auth.auth_init().unwrap();
//! let qr = auth.auth_qr_get(&session).unwrap();
//! // show qr.image_bytes() to the user, then poll
//! let uamtk = loop {
//!     let check = auth.auth_qr_check(&qr.uuid, &session).unwrap();
//!     if check.state() == QrState::Confirmed {
//!         break check.uamtk;
//!     }
//!     thread::sleep(Duration::from_secs(3));
//! };
//! let newapptk = auth.auth_uamtk(&uamtk, &session).unwrap().newapptk;
//! let apptk = auth.auth_uamauth(&newapptk, &session).unwrap().apptk;
//! let session = session.with_token(&apptk);
//!
//! assert!(auth.user_check_login(&session).unwrap());
//! ```
//!

#[macro_use]
extern crate log;

use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::{fmt, fmt::Debug, fmt::Display, str::FromStr};

mod error;
pub use crate::error::{ApiErrors, Error};

/// A `Result` alias where the `Err` case is `rail12306::Error`.
pub type Result<T> = std::result::Result<T, Error>;

mod config;
pub use crate::config::ClientConfig;

mod session;
pub use crate::session::Session;

mod client;
pub use crate::client::{
    BodyFormat, HttpTransport, Method, RawResponse, Request, TrainClient, Transport,
};

pub mod mock;

mod ser;

mod des;

mod auth;
pub use crate::auth::{AuthApi, QrCheck, QrCode, QrState, UamauthReply, UamtkReply};

mod user;
pub use crate::user::{MemberApi, Passenger, UserApi, UserInfo};

mod stations;
pub use crate::stations::{find_station_by_name, parse_station_list, StationItem};
pub type StationList = ResultList<StationItem>;

mod query;
pub use crate::query::{QueryApi, TicketRecord};
pub type TicketList = ResultList<TicketRecord>;

mod passenger;
pub use crate::passenger::{
    join_old_passengers, join_passenger_tickets, OldPassenger, PassengerTicket,
};

mod order;
pub use crate::order::{
    ConfirmPassengerPage, ConfirmQueue, OrderApi, OrderQuery, QueueCount, SubmitOrder,
};

mod pay;
pub use crate::pay::{GatewayForm, PayApi, PayCheck, PayCheckParams, PayForm, TranData, WebBusiness};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
/// A travel or query date.
///
/// Most endpoints take it as `YYYY-MM-DD`, the member and search endpoints
/// as `YYYYMMDD`.
pub struct TrainDate(NaiveDate);

impl TrainDate {
    /// Creates `TrainDate` from a year, a month and a day.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use rail12306::TrainDate;
    /// #
    /// let d = TrainDate::new(2019, 1, 20).unwrap();
    ///
    /// assert_eq!(format!("{}", d), "2019-01-20");
    /// assert_eq!(d.compact(), "20190120");
    /// ```
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        match NaiveDate::from_ymd_opt(year, month, day) {
            Some(d) => Ok(TrainDate(d)),
            None => Err(Error::InvalidDate(format!("{}-{}-{}", year, month, day))),
        }
    }

    /// The day after the local today.
    pub fn tomorrow() -> Self {
        TrainDate(Local::now().date_naive() + Duration::days(1))
    }

    /// Parses a `YYYYMMDD` date.
    pub fn from_compact(s: &str) -> Result<Self> {
        parse_with(s, r"^[0-9]{8}$", "%Y%m%d")
    }

    /// Formats the date as `YYYYMMDD`.
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// Formats the date the way a browser prints a JS `Date` in China,
    /// e.g. `Fri Jan 11 2019 00:00:00 GMT+0800 (China Standard Time)`.
    pub fn cst_string(&self) -> String {
        self.0
            .format("%a %b %d %Y 00:00:00 GMT+0800 (China Standard Time)")
            .to_string()
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

fn parse_with(s: &str, pattern: &str, format: &str) -> Result<TrainDate> {
    let re = Regex::new(pattern).map_err(|e| Error::InvalidArgument(e.to_string()))?;
    if !re.is_match(s) {
        return Err(Error::InvalidDate(s.to_string()));
    }

    match NaiveDate::parse_from_str(s, format) {
        Ok(d) => Ok(TrainDate(d)),
        Err(_) => Err(Error::InvalidDate(s.to_string())),
    }
}

impl Display for TrainDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for TrainDate {
    fn from(d: NaiveDate) -> Self {
        TrainDate(d)
    }
}

impl From<TrainDate> for NaiveDate {
    #[inline]
    fn from(d: TrainDate) -> Self {
        d.0
    }
}

impl FromStr for TrainDate {
    type Err = Error;

    /// Parses a `YYYY-MM-DD` date.
    fn from_str(s: &str) -> Result<Self> {
        parse_with(s, r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$", "%Y-%m-%d")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
/// Seat classes sold by 12306.
pub enum SeatType {
    /// 商务座
    Business,
    /// 一等座
    First,
    /// 二等座
    Second,
    /// 高级软卧
    HighSoftSleeper,
    /// 软卧
    SoftSleeper,
    /// 动卧
    MovingSleeper,
    /// 硬卧
    HardSleeper,
    /// 软座
    SoftSeat,
    /// 硬座
    HardSeat,
    /// 无座
    NoSeat,
}

impl SeatType {
    pub const ALL: [SeatType; 10] = [
        SeatType::Business,
        SeatType::First,
        SeatType::Second,
        SeatType::HighSoftSleeper,
        SeatType::SoftSleeper,
        SeatType::MovingSleeper,
        SeatType::HardSleeper,
        SeatType::SoftSeat,
        SeatType::HardSeat,
        SeatType::NoSeat,
    ];

    /// The code used in `seatType` and passenger ticket strings.
    pub fn code(&self) -> &'static str {
        match self {
            SeatType::Business => "9",
            SeatType::First => "M",
            SeatType::Second => "O",
            SeatType::HighSoftSleeper => "6",
            SeatType::SoftSleeper => "4",
            SeatType::MovingSleeper => "F",
            SeatType::HardSleeper => "3",
            SeatType::SoftSeat => "2",
            // standing tickets are booked as hard seat
            SeatType::HardSeat | SeatType::NoSeat => "1",
        }
    }

    /// A stable snake case name.
    pub fn name(&self) -> &'static str {
        match self {
            SeatType::Business => "business_seat",
            SeatType::First => "first_seat",
            SeatType::Second => "second_seat",
            SeatType::HighSoftSleeper => "high_soft_sleeper_seat",
            SeatType::SoftSleeper => "soft_sleeper_seat",
            SeatType::MovingSleeper => "moving_sleeper_seat",
            SeatType::HardSleeper => "hard_sleeper_seat",
            SeatType::SoftSeat => "soft_seat",
            SeatType::HardSeat => "hard_seat",
            SeatType::NoSeat => "no_seat",
        }
    }

    // Position of the availability field in a left ticket row.
    pub(crate) fn ticket_position(&self) -> usize {
        match self {
            SeatType::Business => 32,
            SeatType::First => 31,
            SeatType::Second => 30,
            SeatType::HighSoftSleeper => 21,
            SeatType::SoftSleeper => 23,
            SeatType::MovingSleeper => 33,
            SeatType::HardSleeper => 28,
            SeatType::SoftSeat => 24,
            SeatType::HardSeat => 29,
            SeatType::NoSeat => 26,
        }
    }
}

impl Display for SeatType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// How the order history is filtered by date.
pub enum OrderQueryType {
    /// 按订票日期查询
    ByBookingDate,
    /// 按乘车日期查询
    ByTravelDate,
}

impl OrderQueryType {
    pub fn code(&self) -> &'static str {
        match self {
            OrderQueryType::ByBookingDate => "1",
            OrderQueryType::ByTravelDate => "2",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Which orders of the history are listed.
pub enum OrderComeFrom {
    /// 全部
    All,
    /// 可改签
    Resign,
    /// 可变更到站
    ChangeStation,
    /// 可退款
    Refund,
}

impl OrderComeFrom {
    pub fn code(&self) -> &'static str {
        match self {
            OrderComeFrom::All => "my_order",
            OrderComeFrom::Resign => "my_resign",
            OrderComeFrom::ChangeStation => "my_cs_resgin",
            OrderComeFrom::Refund => "my_refund",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Whether the trip is still ahead or already in the history.
pub enum OrderWhere {
    /// 未出行
    Upcoming,
    /// 历史订单
    History,
}

impl OrderWhere {
    pub fn code(&self) -> &'static str {
        match self {
            OrderWhere::Upcoming => "G",
            OrderWhere::History => "H",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// Kind of member point records.
pub enum PointQueryType {
    /// 积分明细
    All,
    /// 收入明细
    Income,
    /// 支出明细
    Expense,
}

impl PointQueryType {
    pub fn code(&self) -> &'static str {
        match self {
            PointQueryType::All => "0",
            PointQueryType::Income => "1",
            PointQueryType::Expense => "2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// List of the request results.
pub struct ResultList<T>(Vec<T>)
where
    T: Debug + Display + Serialize;

impl<T> ResultList<T>
where
    T: Debug + Display + Serialize,
{
    /// Creates a new list from `Vec`.
    pub fn new(v: Vec<T>) -> Self {
        ResultList(v)
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a reference to the data of the list.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    /// Performs the conversion from the list into `Vec`.
    pub fn to_vec(self) -> Vec<T> {
        self.0
    }

    /// Performs the conversion into a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    /// Creates a non-consuming iterator.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> Display for ResultList<T>
where
    T: Debug + Display + Serialize,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for s in &self.0 {
            writeln!(f, "{}", s)?;
        }
        Ok(())
    }
}

impl<T> Default for ResultList<T>
where
    T: Debug + Display + Serialize,
{
    fn default() -> Self {
        ResultList::<T>(vec![])
    }
}

impl<T> IntoIterator for ResultList<T>
where
    T: Debug + Display + Serialize,
{
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ResultList<T>
where
    T: Debug + Display + Serialize,
{
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, SeatType, TrainDate};

    #[test]
    fn train_date_test() {
        let d: TrainDate = "2019-01-11".parse().unwrap();
        assert_eq!(d, TrainDate::new(2019, 1, 11).unwrap());
        assert_eq!(d.to_string(), "2019-01-11");
        assert_eq!(d.compact(), "20190111");
        assert_eq!(
            d.cst_string(),
            "Fri Jan 11 2019 00:00:00 GMT+0800 (China Standard Time)"
        );
    }

    #[test]
    fn train_date_format_test() {
        for s in ["", "2019-1-11", "2019/01/11", "20190111", "2019-01-11 ", "2019-02-30"] {
            match s.parse::<TrainDate>() {
                Err(Error::InvalidDate(v)) => assert_eq!(v, s),
                other => panic!("{:?} parsed as {:?}", s, other),
            }
        }
    }

    #[test]
    fn compact_date_test() {
        assert_eq!(
            TrainDate::from_compact("20190111").unwrap(),
            TrainDate::new(2019, 1, 11).unwrap()
        );
        assert!(TrainDate::from_compact("2019-01-11").is_err());
        assert!(TrainDate::from_compact("2019011").is_err());
    }

    #[test]
    fn seat_type_test() {
        assert_eq!(SeatType::Second.code(), "O");
        assert_eq!(SeatType::Business.to_string(), "business_seat");
        assert_eq!(SeatType::NoSeat.code(), SeatType::HardSeat.code());

        let mut positions: Vec<usize> = SeatType::ALL.iter().map(|s| s.ticket_position()).collect();
        positions.sort();
        positions.dedup();
        assert_eq!(positions.len(), SeatType::ALL.len());
    }
}

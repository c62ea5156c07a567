use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::client::{Request, TrainClient, Transport};
use crate::des::{take_list, take_object, take_path};
use crate::session::Session;
use crate::stations::{find_station_by_name, parse_station_list, StationItem};
use crate::{error::Error, Result};
use crate::{SeatType, StationList, TicketList, TrainDate};

const LEFT_TICKETS_URL: &str = "https://kyfw.12306.cn/otn/leftTicket/queryZ";
const STATION_TRAINS_URL: &str = "https://kyfw.12306.cn/otn/czxx/query";
const TRAIN_NO_URL: &str = "https://kyfw.12306.cn/otn/czxx/queryByTrainNo";
const TICKET_PRICE_URL: &str = "https://kyfw.12306.cn/otn/leftTicket/queryTicketPrice";
const STATION_LIST_URL: &str =
    "https://kyfw.12306.cn/otn/resources/js/framework/station_name.js";
const DISHONEST_URL: &str = "https://dynamic.12306.cn/otn/queryDishonest/query";
const DISHONEST_GETONE_URL: &str = "https://dynamic.12306.cn/otn/queryDishonest/getOne";
const TRAIN_SEARCH_URL: &str = "https://search.12306.cn/search/v1/train/search";

/// Ticket, fare, timetable and station queries.
///
/// Queries need no login; cookies of an opened session are sent along when
/// set with [`QueryApi::with_session`].
pub struct QueryApi<'a, T> {
    client: &'a TrainClient<T>,
    session: Session,
}

impl<'a, T> QueryApi<'a, T>
where
    T: Transport,
{
    pub(crate) fn new(client: &'a TrainClient<T>) -> Self {
        QueryApi {
            client,
            session: Session::new(),
        }
    }

    /// Sends the cookies of `session` with the queries.
    pub fn with_session(mut self, session: &Session) -> Self {
        self.session = session.clone();
        self
    }

    /// Returns the trains between two stations with their seat availability.
    ///
    /// # Errors
    ///
    /// The method fails before sending anything if the date is not
    /// `YYYY-MM-DD`.
    pub fn info_query_left_tickets(
        &self,
        train_date: &str,
        from_station: &str,
        to_station: &str,
        purpose_codes: &str,
    ) -> Result<TicketList> {
        let train_date: TrainDate = train_date.parse()?;

        let request = Request::get(LEFT_TICKETS_URL)
            .param("leftTicketDTO.train_date", train_date)
            .param("leftTicketDTO.from_station", from_station)
            .param("leftTicketDTO.to_station", to_station)
            .param("purpose_codes", purpose_codes);
        let reply = self.client.submit(&request, &self.session)?;

        let tickets: Vec<TicketRecord> = take_list(reply, &["data", "result"])
            .iter()
            .filter_map(|row| row.as_str())
            .map(TicketRecord::parse)
            .collect();
        info!("{} trains found", tickets.len());

        Ok(TicketList::new(tickets))
    }

    /// Returns the trains stopping at a station.
    pub fn info_query_station_trains(
        &self,
        train_start_date: &str,
        train_station_code: &str,
    ) -> Result<Vec<Value>> {
        let train_start_date: TrainDate = train_start_date.parse()?;

        let request = Request::get(STATION_TRAINS_URL)
            .param("train_start_date", train_start_date)
            .param("train_station_code", train_station_code);
        let reply = self.client.submit(&request, &self.session)?;

        Ok(take_list(reply, &["data", "data"]))
    }

    /// Returns the stops of a train.
    pub fn info_query_train_no(
        &self,
        train_no: &str,
        from_station_telecode: &str,
        to_station_telecode: &str,
        depart_date: &str,
    ) -> Result<Vec<Value>> {
        let depart_date: TrainDate = depart_date.parse()?;

        let request = Request::get(TRAIN_NO_URL)
            .param("train_no", train_no)
            .param("from_station_telecode", from_station_telecode)
            .param("to_station_telecode", to_station_telecode)
            .param("depart_date", depart_date);
        let reply = self.client.submit(&request, &self.session)?;

        Ok(take_list(reply, &["data", "data"]))
    }

    /// Returns the fares of a train between two stops.
    pub fn info_query_ticket_price(
        &self,
        train_no: &str,
        from_station_no: &str,
        to_station_no: &str,
        seat_types: &str,
        train_date: &str,
    ) -> Result<Value> {
        let train_date: TrainDate = train_date.parse()?;

        let request = Request::get(TICKET_PRICE_URL)
            .param("train_no", train_no)
            .param("from_station_no", from_station_no)
            .param("to_station_no", to_station_no)
            .param("seat_types", seat_types)
            .param("train_date", train_date);
        let reply = self.client.submit(&request, &self.session)?;

        Ok(take_object(reply, &["data"]))
    }

    /// Downloads and parses the station table.
    pub fn info_query_station_list(&self, station_version: Option<&str>) -> Result<StationList> {
        let request =
            Request::get(STATION_LIST_URL).param("station_version", station_version.unwrap_or(""));
        let result = self.client.submit_ok(&request, &self.session)?;

        Ok(parse_station_list(&result.body))
    }

    /// Looks a station up by its exact name in the downloaded table.
    pub fn info_query_station_by_name(
        &self,
        station_name: &str,
        station_version: Option<&str>,
    ) -> Result<Option<StationItem>> {
        let stations = self.info_query_station_list(station_version)?;

        Ok(find_station_by_name(stations.as_slice(), station_name).cloned())
    }

    /// Returns the registry of passengers banned for dishonest behaviour.
    pub fn info_query_dishonest(&self) -> Result<Vec<Value>> {
        let reply = self
            .client
            .submit(&Request::get(DISHONEST_URL), &self.session)?;

        Ok(dishonest_list(reply))
    }

    /// Looks a person up in the dishonest passengers registry.
    pub fn info_query_dishonest_getone(&self, name: &str, id_no: &str) -> Result<Vec<Value>> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("empty name".to_string()));
        }

        let request = Request::get(DISHONEST_GETONE_URL)
            .param("name", name.trim())
            .param("id_no", id_no.trim());
        let reply = self.client.submit(&request, &self.session)?;

        Ok(dishonest_list(reply))
    }

    /// Searches trains by a part of the train code, e.g. `K57`.
    ///
    /// # Errors
    ///
    /// The method fails before sending anything if the keyword is empty or
    /// the date is not `YYYYMMDD`.
    pub fn info_query_train_search(&self, keyword: &str, train_date: &str) -> Result<Vec<Value>> {
        let keyword = keyword.trim().to_uppercase();
        if keyword.is_empty() {
            return Err(Error::InvalidArgument("empty train keyword".to_string()));
        }
        let train_date = TrainDate::from_compact(train_date)?;

        let request = Request::get(TRAIN_SEARCH_URL)
            .param("keyword", keyword)
            .param("date", train_date.compact());
        let reply = self.client.submit(&request, &self.session)?;

        Ok(take_list(reply, &["data"]))
    }
}

// The registry comes either as `data: [...]` or as `data: {list: [...]}`.
fn dishonest_list(reply: Value) -> Vec<Value> {
    match take_path(reply, &["data"]) {
        Some(Value::Array(a)) => a,
        Some(data) => take_list(data, &["list"]),
        None => vec![],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// A train of the left tickets query.
///
/// Built from one `|`-separated row; the meaning of a field is given by its
/// position only. Positions past the end of a short row read as empty.
pub struct TicketRecord {
    /// Token to pass to `order_submit_order`.
    pub secret: String,
    pub remark: String,
    /// Internal train number, e.g. `24000000G505`.
    pub train_num: String,
    /// Train code, e.g. `G505`.
    pub train_name: String,
    /// Telecode of the station the train starts from.
    pub from_station: String,
    /// Telecode of the station the train ends at.
    pub to_station: String,
    pub query_from_station: String,
    pub query_to_station: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub can_web_buy: String,
    /// `leftTicket` of the queue count request.
    pub left_ticket: String,
    pub start_train_date: String,
    pub train_location: String,
    pub business_seat: String,
    pub first_seat: String,
    pub second_seat: String,
    pub high_soft_sleeper_seat: String,
    pub soft_sleeper_seat: String,
    pub moving_sleeper_seat: String,
    pub hard_sleeper_seat: String,
    pub soft_seat: String,
    pub hard_seat: String,
    pub no_seat: String,
}

impl TicketRecord {
    /// Splits a row of the left tickets reply.
    pub fn parse(row: &str) -> Self {
        let fields: Vec<&str> = row.split('|').collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or_default().to_string();
        let seat = |s: SeatType| field(s.ticket_position());

        TicketRecord {
            secret: field(0),
            remark: field(1),
            train_num: field(2),
            train_name: field(3),
            from_station: field(4),
            to_station: field(5),
            query_from_station: field(6),
            query_to_station: field(7),
            departure_time: field(8),
            arrival_time: field(9),
            duration: field(10),
            can_web_buy: field(11),
            left_ticket: field(12),
            start_train_date: field(13),
            train_location: field(15),
            business_seat: seat(SeatType::Business),
            first_seat: seat(SeatType::First),
            second_seat: seat(SeatType::Second),
            high_soft_sleeper_seat: seat(SeatType::HighSoftSleeper),
            soft_sleeper_seat: seat(SeatType::SoftSleeper),
            moving_sleeper_seat: seat(SeatType::MovingSleeper),
            hard_sleeper_seat: seat(SeatType::HardSleeper),
            soft_seat: seat(SeatType::SoftSeat),
            hard_seat: seat(SeatType::HardSeat),
            no_seat: seat(SeatType::NoSeat),
        }
    }

    /// Returns the availability of a seat class as sent: `有`, `无`, a
    /// number, `--` or empty.
    pub fn seat(&self, seat: SeatType) -> &str {
        match seat {
            SeatType::Business => &self.business_seat,
            SeatType::First => &self.first_seat,
            SeatType::Second => &self.second_seat,
            SeatType::HighSoftSleeper => &self.high_soft_sleeper_seat,
            SeatType::SoftSleeper => &self.soft_sleeper_seat,
            SeatType::MovingSleeper => &self.moving_sleeper_seat,
            SeatType::HardSleeper => &self.hard_sleeper_seat,
            SeatType::SoftSeat => &self.soft_seat,
            SeatType::HardSeat => &self.hard_seat,
            SeatType::NoSeat => &self.no_seat,
        }
    }

    /// Returns true if tickets of the seat class are on sale.
    pub fn has_seats(&self, seat: SeatType) -> bool {
        match self.seat(seat) {
            "有" => true,
            s => s.parse::<u32>().map(|n| n > 0).unwrap_or(false),
        }
    }

    /// Returns true if the train can be booked online.
    #[inline]
    pub fn can_buy(&self) -> bool {
        self.can_web_buy == "Y"
    }
}

impl fmt::Display for TicketRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}-{} ({})",
            self.train_name,
            self.query_from_station,
            self.query_to_station,
            self.departure_time,
            self.arrival_time,
            self.duration
        )?;
        for s in SeatType::ALL {
            let v = self.seat(s);
            if !v.is_empty() && v != "--" {
                write!(f, " {}:{}", s, v)?;
            }
        }
        Ok(())
    }
}

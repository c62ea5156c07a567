use chrono::Utc;
use regex::Regex;
use serde_json::Value;

use crate::client::{Request, TrainClient, Transport};
use crate::des::{take_list, take_path};
use crate::error::{ApiErrors, Error};
use crate::session::Session;
use crate::Result;
use crate::{OrderComeFrom, OrderQueryType, OrderWhere, SeatType, TrainDate};

const SUBMIT_ORDER_URL: &str = "https://kyfw.12306.cn/otn/leftTicket/submitOrderRequest";
const CONFIRM_PASSENGER_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/initDc";
const CHECK_ORDER_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/checkOrderInfo";
const QUEUE_COUNT_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/getQueueCount";
const CONFIRM_QUEUE_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/confirmSingleForQueue";
const QUERY_ORDER_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/queryOrderWaitTime";
const RESULT_ORDER_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/resultOrderForDcQueue";
const MY_ORDER_URL: &str = "https://kyfw.12306.cn/otn/queryOrder/queryMyOrder";
const NO_COMPLETE_URL: &str = "https://kyfw.12306.cn/otn/queryOrder/queryMyOrderNoComplete";

const BED_LEVEL_ORDER_NUM: &str = "000000000000000000000000000000";
const CANCEL_FLAG: &str = "2";
const TOUR_FLAG_DEFAULT: &str = "dc";
const PURPOSE_CODES_DEFAULT: &str = "ADULT";

/// The booking steps.
///
/// A booking is the fixed sequence `order_submit_order`,
/// `order_confirm_passenger`, `order_confirm_passenger_check_order`,
/// `order_confirm_passenger_get_queue_count`,
/// `order_confirm_passenger_confirm_single_for_queue`, then polling with
/// `order_confirm_passenger_query_order` and
/// `order_confirm_passenger_result_order`. The caller carries the values
/// from one step to the next and decides on waits and retries.
pub struct OrderApi<'a, T> {
    client: &'a TrainClient<T>,
}

impl<'a, T> OrderApi<'a, T>
where
    T: Transport,
{
    pub(crate) fn new(client: &'a TrainClient<T>) -> Self {
        OrderApi { client }
    }

    /// Takes the train chosen by its `secret`.
    ///
    /// # Errors
    ///
    /// The method fails if the server does not accept the order.
    pub fn order_submit_order(&self, order: &SubmitOrder, session: &Session) -> Result<bool> {
        let train_date: TrainDate = order.train_date.parse()?;
        let back_train_date: TrainDate = match order.back_train_date {
            Some(ref d) => d.parse()?,
            None => TrainDate::tomorrow(),
        };
        let secret = urlencoding::decode(&order.secret)
            .map_err(|_| Error::InvalidArgument(format!("secret `{}`", order.secret)))?;
        self.client.require_login(session)?;

        let request = Request::post(SUBMIT_ORDER_URL)
            .param("secretStr", secret)
            .param("train_date", train_date)
            .param("back_train_date", back_train_date)
            .param("tour_flag", &order.tour_flag)
            .param("purpose_codes", &order.purpose_codes)
            .param("query_from_station_name", &order.query_from_station_name)
            .param("query_to_station_name", &order.query_to_station_name)
            .param("undefined", "");
        let reply = self.client.submit(&request, session)?;

        if reply.get("httpstatus").and_then(|s| s.as_i64()) != Some(200) {
            warn!("submit order resp. {}", reply);
            return Err(Error::Api(ApiErrors::new(vec![reply.to_string()])));
        }

        Ok(true)
    }

    /// Opens the passenger page of the submitted order.
    pub fn order_confirm_passenger(&self, session: &Session) -> Result<ConfirmPassengerPage> {
        self.client.require_login(session)?;

        let request = Request::post(CONFIRM_PASSENGER_URL).param("_json_att", "");
        let result = self.client.submit_ok(&request, session)?;

        ConfirmPassengerPage::parse(&result.body)
    }

    /// Checks the passengers against the order.
    pub fn order_confirm_passenger_check_order(
        &self,
        token: &str,
        passenger_ticket_str: &str,
        old_passenger_str: &str,
        session: &Session,
    ) -> Result<Value> {
        self.client.require_login(session)?;

        let request = Request::post(CHECK_ORDER_URL)
            .param("cancel_flag", CANCEL_FLAG)
            .param("bed_level_order_num", BED_LEVEL_ORDER_NUM)
            .param("passengerTicketStr", passenger_ticket_str)
            .param("oldPassengerStr", old_passenger_str)
            .param("tour_flag", TOUR_FLAG_DEFAULT)
            .param("randCode", "")
            .param("whatsSelect", "1")
            .param("_json_att", "")
            .param("REPEAT_SUBMIT_TOKEN", token);
        let reply = self.client.submit(&request, session)?;

        Ok(data_of(reply))
    }

    /// Returns the queue length and the tickets left for the seat class.
    pub fn order_confirm_passenger_get_queue_count(
        &self,
        queue: &QueueCount,
        session: &Session,
    ) -> Result<Value> {
        let train_date: TrainDate = queue.train_date.parse()?;
        self.client.require_login(session)?;

        let request = Request::post(QUEUE_COUNT_URL)
            .param("train_date", train_date.cst_string())
            .param("train_no", &queue.train_no)
            .param("stationTrainCode", &queue.station_train_code)
            .param("seatType", queue.seat_type.code())
            .param("fromStationTelecode", &queue.from_station_telecode)
            .param("toStationTelecode", &queue.to_station_telecode)
            .param("leftTicket", &queue.left_ticket)
            .param("purpose_codes", &queue.purpose_codes)
            .param("train_location", &queue.train_location)
            .param("_json_att", "")
            .param("REPEAT_SUBMIT_TOKEN", &queue.token);
        let reply = self.client.submit(&request, session)?;

        Ok(data_of(reply))
    }

    /// Books the tickets.
    ///
    /// Success is decided by the `submitStatus` of the returned data; a
    /// refusal is not an error.
    pub fn order_confirm_passenger_confirm_single_for_queue(
        &self,
        confirm: &ConfirmQueue,
        session: &Session,
    ) -> Result<Value> {
        self.client.require_login(session)?;

        let mut request = Request::post(CONFIRM_QUEUE_URL)
            .param("passengerTicketStr", &confirm.passenger_ticket_str)
            .param("oldPassengerStr", &confirm.old_passenger_str)
            .param("randCode", "")
            .param("purpose_codes", &confirm.purpose_codes)
            .param("key_check_isChange", &confirm.key_check_is_change)
            .param("leftTicketStr", &confirm.left_ticket)
            .param("train_location", &confirm.train_location)
            .param("choose_seats", &confirm.choose_seats);
        if let Some(ref s) = confirm.seat_detail_type {
            request = request.param("seatDetailType", s);
        }
        request = request.param("whatsSelect", &confirm.whats_select);
        if let Some(ref s) = confirm.room_type {
            request = request.param("roomType", s);
        }
        let request = request
            .param("dwAll", &confirm.dw_all)
            .param("_json_att", "")
            .param("REPEAT_SUBMIT_TOKEN", &confirm.token);
        let reply = self.client.submit(&request, session)?;

        Ok(data_of(reply))
    }

    /// Polls the booking queue; the data carries `waitTime` and, once
    /// booked, `orderId`.
    pub fn order_confirm_passenger_query_order(&self, token: &str, session: &Session) -> Result<Value> {
        self.client.require_login(session)?;

        let request = Request::get(QUERY_ORDER_URL)
            .param("random", Utc::now().timestamp_millis() / 10)
            .param("tourFlag", TOUR_FLAG_DEFAULT)
            .param("_json_att", "")
            .param("REPEAT_SUBMIT_TOKEN", token);
        let reply = self.client.submit(&request, session)?;

        Ok(data_of(reply))
    }

    /// Returns the outcome of a booked order.
    pub fn order_confirm_passenger_result_order(
        &self,
        sequence_no: &str,
        token: &str,
        session: &Session,
    ) -> Result<Value> {
        self.client.require_login(session)?;

        let request = Request::post(RESULT_ORDER_URL)
            .param("orderSequence_no", sequence_no)
            .param("_json_att", "")
            .param("REPEAT_SUBMIT_TOKEN", token);
        let reply = self.client.submit(&request, session)?;

        Ok(data_of(reply))
    }

    /// Returns the orders matching the query.
    pub fn order_query(&self, query: &OrderQuery, session: &Session) -> Result<Vec<Value>> {
        let start_date: TrainDate = query.start_date.parse()?;
        let end_date: TrainDate = query.end_date.parse()?;
        self.client.require_login(session)?;

        let request = Request::post(MY_ORDER_URL)
            .param("come_from_flag", query.come_from.code())
            .param("query_where", query.query_where.code())
            .param("queryStartDate", start_date)
            .param("queryEndDate", end_date)
            .param("queryType", query.query_type.code())
            .param("sequence_train_name", &query.sequence_train_name)
            .param("pageIndex", query.page_index)
            .param("pageSize", query.page_size);
        let reply = self.client.submit(&request, session)?;

        Ok(take_list(reply, &["data", "OrderDTODataList"]))
    }

    /// Returns the orders waiting for payment.
    pub fn order_query_no_complete(&self, session: &Session) -> Result<Vec<Value>> {
        self.client.require_login(session)?;

        let request = Request::post(NO_COMPLETE_URL);
        let reply = self.client.submit(&request, session)?;

        Ok(take_list(reply, &["data", "orderDBList"]))
    }
}

fn data_of(reply: Value) -> Value {
    take_path(reply, &["data"]).unwrap_or(Value::Null)
}

/// Parameters of `order_submit_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOrder {
    /// `secret` of the chosen left tickets record, still percent-encoded.
    pub secret: String,
    pub train_date: String,
    /// Defaults to tomorrow.
    pub back_train_date: Option<String>,
    pub tour_flag: String,
    pub purpose_codes: String,
    pub query_from_station_name: String,
    pub query_to_station_name: String,
}

impl SubmitOrder {
    pub fn new(secret: &str, train_date: &str) -> Self {
        SubmitOrder {
            secret: secret.to_string(),
            train_date: train_date.to_string(),
            back_train_date: None,
            tour_flag: TOUR_FLAG_DEFAULT.to_string(),
            purpose_codes: PURPOSE_CODES_DEFAULT.to_string(),
            query_from_station_name: String::new(),
            query_to_station_name: String::new(),
        }
    }

    pub fn with_back_train_date(mut self, back_train_date: &str) -> Self {
        self.back_train_date = Some(back_train_date.to_string());
        self
    }

    pub fn with_purpose_codes(mut self, purpose_codes: &str) -> Self {
        self.purpose_codes = purpose_codes.to_string();
        self
    }

    pub fn with_stations(mut self, from_station_name: &str, to_station_name: &str) -> Self {
        self.query_from_station_name = from_station_name.to_string();
        self.query_to_station_name = to_station_name.to_string();
        self
    }
}

/// What the passenger page carries to the next steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmPassengerPage {
    /// `REPEAT_SUBMIT_TOKEN` of every later step.
    pub token: String,
    pub ticket_info: Value,
    pub order_request_params: Value,
}

impl ConfirmPassengerPage {
    /// Extracts the token and the two embedded objects from the page.
    ///
    /// The objects are JS literals with single quoted strings; quotes are
    /// swapped before decoding them as JSON.
    pub fn parse(html: &str) -> Result<Self> {
        let token = capture(html, r"var globalRepeatSubmitToken = '(\S+)'", "globalRepeatSubmitToken")?;
        let ticket_info = capture(html, r"var ticketInfoForPassengerForm=(\{.+\})", "ticketInfoForPassengerForm")?;
        let order_request = capture(html, r"var orderRequestDTO=(\{.+\})", "orderRequestDTO")?;

        Ok(ConfirmPassengerPage {
            token,
            ticket_info: js_object(&ticket_info)?,
            order_request_params: js_object(&order_request)?,
        })
    }

    /// `leftTicketStr` of the queue steps.
    pub fn left_ticket_str(&self) -> &str {
        str_at(&self.ticket_info, &["leftTicketStr"])
    }

    pub fn key_check_is_change(&self) -> &str {
        str_at(&self.ticket_info, &["key_check_isChange"])
    }

    pub fn train_location(&self) -> &str {
        str_at(&self.ticket_info, &["train_location"])
    }

    pub fn purpose_codes(&self) -> &str {
        str_at(&self.ticket_info, &["queryLeftTicketRequestDTO", "purpose_codes"])
    }

    pub fn train_no(&self) -> &str {
        str_at(&self.order_request_params, &["train_no"])
    }

    pub fn station_train_code(&self) -> &str {
        str_at(&self.order_request_params, &["station_train_code"])
    }

    pub fn from_station_telecode(&self) -> &str {
        str_at(&self.order_request_params, &["from_station_telecode"])
    }

    pub fn to_station_telecode(&self) -> &str {
        str_at(&self.order_request_params, &["to_station_telecode"])
    }
}

fn capture(text: &str, pattern: &str, what: &str) -> Result<String> {
    let re = Regex::new(pattern).map_err(|e| Error::Scrape(e.to_string()))?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Scrape(what.to_string()))
}

fn js_object(literal: &str) -> Result<Value> {
    serde_json::from_str(&literal.replace('\'', "\""))
        .map_err(|e| Error::MalformedResponse(e.to_string()))
}

fn str_at<'v>(v: &'v Value, path: &[&str]) -> &'v str {
    path.iter()
        .try_fold(v, |v, key| v.get(*key))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
}

/// Parameters of `order_confirm_passenger_get_queue_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueCount {
    /// `YYYY-MM-DD`, sent in the long browser form.
    pub train_date: String,
    pub train_no: String,
    pub station_train_code: String,
    pub seat_type: SeatType,
    pub from_station_telecode: String,
    pub to_station_telecode: String,
    pub left_ticket: String,
    pub purpose_codes: String,
    pub train_location: String,
    pub token: String,
}

impl QueueCount {
    /// Fills the parameters from the passenger page.
    pub fn new(train_date: &str, seat_type: SeatType, page: &ConfirmPassengerPage) -> Self {
        QueueCount {
            train_date: train_date.to_string(),
            train_no: page.train_no().to_string(),
            station_train_code: page.station_train_code().to_string(),
            seat_type,
            from_station_telecode: page.from_station_telecode().to_string(),
            to_station_telecode: page.to_station_telecode().to_string(),
            left_ticket: page.left_ticket_str().to_string(),
            purpose_codes: page.purpose_codes().to_string(),
            train_location: page.train_location().to_string(),
            token: page.token.clone(),
        }
    }
}

/// Parameters of `order_confirm_passenger_confirm_single_for_queue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmQueue {
    pub passenger_ticket_str: String,
    pub old_passenger_str: String,
    pub purpose_codes: String,
    pub key_check_is_change: String,
    pub left_ticket: String,
    pub train_location: String,
    pub token: String,
    pub whats_select: String,
    pub dw_all: String,
    pub choose_seats: String,
    /// Left out of the request when unset.
    pub room_type: Option<String>,
    /// Left out of the request when unset.
    pub seat_detail_type: Option<String>,
}

impl ConfirmQueue {
    /// Fills the parameters from the passenger page.
    pub fn new(passenger_ticket_str: &str, old_passenger_str: &str, page: &ConfirmPassengerPage) -> Self {
        ConfirmQueue {
            passenger_ticket_str: passenger_ticket_str.to_string(),
            old_passenger_str: old_passenger_str.to_string(),
            purpose_codes: page.purpose_codes().to_string(),
            key_check_is_change: page.key_check_is_change().to_string(),
            left_ticket: page.left_ticket_str().to_string(),
            train_location: page.train_location().to_string(),
            token: page.token.clone(),
            whats_select: "1".to_string(),
            dw_all: "N".to_string(),
            choose_seats: String::new(),
            room_type: None,
            seat_detail_type: None,
        }
    }

    /// Picks seats, e.g. `1A1F` for window seats of two passengers.
    pub fn with_choose_seats(mut self, choose_seats: &str) -> Self {
        self.choose_seats = choose_seats.to_string();
        self
    }
}

/// Parameters of `order_query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub start_date: String,
    pub end_date: String,
    pub query_type: OrderQueryType,
    /// Order number, train code or passenger name.
    pub sequence_train_name: String,
    pub come_from: OrderComeFrom,
    pub query_where: OrderWhere,
    pub page_index: u32,
    pub page_size: u32,
}

impl OrderQuery {
    /// Queries all upcoming orders booked between two `YYYY-MM-DD` dates.
    pub fn new(start_date: &str, end_date: &str) -> Self {
        OrderQuery {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            query_type: OrderQueryType::ByBookingDate,
            sequence_train_name: String::new(),
            come_from: OrderComeFrom::All,
            query_where: OrderWhere::Upcoming,
            page_index: 0,
            page_size: 8,
        }
    }

    pub fn with_query_type(mut self, query_type: OrderQueryType) -> Self {
        self.query_type = query_type;
        self
    }

    pub fn with_come_from(mut self, come_from: OrderComeFrom) -> Self {
        self.come_from = come_from;
        self
    }

    pub fn with_query_where(mut self, query_where: OrderWhere) -> Self {
        self.query_where = query_where;
        self
    }

    pub fn with_keyword(mut self, sequence_train_name: &str) -> Self {
        self.sequence_train_name = sequence_train_name.to_string();
        self
    }

    pub fn with_page(mut self, page_index: u32, page_size: u32) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfirmPassengerPage, ConfirmQueue, OrderQuery, QueueCount, SubmitOrder};
    use crate::client::RawResponse;
    use crate::mock::MockTransport;
    use crate::{ClientConfig, Error, OrderWhere, SeatType, Session, TrainClient};
    use serde_json::json;

    const INIT_DC: &str = r#"<!DOCTYPE html>
<html>
<head>
<script type="text/javascript">
 var ctx='/otn/';
 var globalRepeatSubmitToken = '8ab4d2dfdc5db8a4a5f5fd2a5f0e3c8d';
 var global_lang = 'zh_CN';
 var isAsync = '1';
 var ticketInfoForPassengerForm={'cardTypes':[{'end_station_name':null,'id':'1','value':'中国居民身份证'}],'isAsync':'1','key_check_isChange':'8C0B1E1A6D2B6B0D5E0F6C0B','leftDetails':['二等座(553.00元)有票'],'leftTicketStr':'O055300021M0933000009174800003','limitBuySeatTicketDTO':{'seat_type_codes':[{'id':'O','value':'二等座'}]},'purpose_codes':'00','queryLeftTicketRequestDTO':{'arrive_time':'13:28','from_station':'VNP','purpose_codes':'00','station_train_code':'G505','to_station':'AOH','train_date':'20190120','train_no':'24000000G50H'},'tour_flag':'dc','train_location':'P2'};
 var orderRequestDTO={'adult_num':0,'bed_level_order_num':null,'cancel_flag':null,'from_station_name':'北京南','from_station_telecode':'VNP','station_train_code':'G505','to_station_name':'上海虹桥','to_station_telecode':'AOH','train_date':{'date':20,'day':0,'time':1547913600000,'timezoneOffset':-480,'year':119},'train_no':'24000000G50H'};
</script>
</head>
<body></body>
</html>"#;

    fn session() -> Session {
        Session::from_pairs(vec![("JSESSIONID", "ABC"), ("tk", "EX-yKD2MKlQG")])
    }

    fn order_client(mock: MockTransport) -> TrainClient<MockTransport> {
        TrainClient::with_transport(mock.logged_in(), ClientConfig::default())
    }

    #[test]
    fn confirm_passenger_page_test() {
        let page = ConfirmPassengerPage::parse(INIT_DC).unwrap();

        assert_eq!(page.token, "8ab4d2dfdc5db8a4a5f5fd2a5f0e3c8d");
        assert_eq!(page.left_ticket_str(), "O055300021M0933000009174800003");
        assert_eq!(page.key_check_is_change(), "8C0B1E1A6D2B6B0D5E0F6C0B");
        assert_eq!(page.train_location(), "P2");
        assert_eq!(page.purpose_codes(), "00");
        assert_eq!(page.station_train_code(), "G505");
        assert_eq!(page.train_no(), "24000000G50H");
        assert_eq!(page.order_request_params["train_date"]["year"], json!(119));
    }

    #[test]
    fn confirm_passenger_page_broken_test() {
        match ConfirmPassengerPage::parse("<html>系统忙</html>") {
            Err(Error::Scrape(what)) => assert_eq!(what, "globalRepeatSubmitToken"),
            other => panic!("unexpected {:?}", other),
        }

        let page = INIT_DC.replace("'isAsync':'1',", "'isAsync':'1',,");
        assert!(matches!(
            ConfirmPassengerPage::parse(&page),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn guarded_without_session_test() {
        let client = order_client(MockTransport::new());
        let order = client.order();
        let empty = Session::new();

        assert!(matches!(
            order.order_submit_order(&SubmitOrder::new("abc", "2019-01-20"), &empty),
            Err(Error::NotLoggedIn)
        ));
        assert!(matches!(order.order_confirm_passenger(&empty), Err(Error::NotLoggedIn)));
        assert!(matches!(
            order.order_confirm_passenger_check_order("t", "p", "o", &empty),
            Err(Error::NotLoggedIn)
        ));
        assert!(matches!(
            order.order_confirm_passenger_query_order("t", &empty),
            Err(Error::NotLoggedIn)
        ));
        assert!(matches!(
            order.order_confirm_passenger_result_order("E123", "t", &empty),
            Err(Error::NotLoggedIn)
        ));
        assert!(matches!(order.order_query_no_complete(&empty), Err(Error::NotLoggedIn)));

        assert_eq!(client.transport().request_count(), 0);
    }

    #[test]
    fn submit_order_test() {
        let mock = MockTransport::new().on_json(
            "/otn/leftTicket/submitOrderRequest",
            r#"{"validateMessagesShowId":"_validatorMessage","status":true,"httpstatus":200,"data":"N","messages":[],"validateMessages":{}}"#,
        );
        let client = order_client(mock);

        let order = SubmitOrder::new("1AbCd%2BSeCrEt%3D%3D", "2019-01-20")
            .with_back_train_date("2019-01-21")
            .with_stations("北京", "上海");
        assert!(client.order().order_submit_order(&order, &session()).unwrap());

        let sent = client.transport().requests_to("submitOrderRequest");
        assert_eq!(sent[0].param_value("secretStr"), Some("1AbCd+SeCrEt=="));
        assert_eq!(sent[0].param_value("back_train_date"), Some("2019-01-21"));
        assert_eq!(sent[0].param_value("purpose_codes"), Some("ADULT"));
        assert_eq!(sent[0].param_value("tour_flag"), Some("dc"));
        assert_eq!(sent[0].param_value("query_from_station_name"), Some("北京"));
    }

    #[test]
    fn submit_order_refused_test() {
        let mock = MockTransport::new().on_json(
            "/otn/leftTicket/submitOrderRequest",
            r#"{"status":false,"httpstatus":200,"messages":["您还有未处理的订单"]}"#,
        );
        let client = order_client(mock);

        match client
            .order()
            .order_submit_order(&SubmitOrder::new("abc", "2019-01-20"), &session())
        {
            Err(Error::Api(e)) => assert!(e.contains("您还有未处理的订单")),
            other => panic!("unexpected {:?}", other),
        }

        let mock = MockTransport::new().on_json(
            "/otn/leftTicket/submitOrderRequest",
            r#"{"status":true,"httpstatus":302}"#,
        );
        let client = order_client(mock);
        assert!(matches!(
            client
                .order()
                .order_submit_order(&SubmitOrder::new("abc", "2019-01-20"), &session()),
            Err(Error::Api(_))
        ));
    }

    #[test]
    fn submit_order_bad_dates_test() {
        let client = order_client(MockTransport::new());

        let order = SubmitOrder::new("abc", "20190120");
        assert!(matches!(
            client.order().order_submit_order(&order, &session()),
            Err(Error::InvalidDate(_))
        ));
        let order = SubmitOrder::new("abc", "2019-01-20").with_back_train_date("tomorrow");
        assert!(matches!(
            client.order().order_submit_order(&order, &session()),
            Err(Error::InvalidDate(_))
        ));

        assert_eq!(client.transport().request_count(), 0);
    }

    #[test]
    fn confirm_passenger_test() {
        let mock = MockTransport::new().on_json("/otn/confirmPassenger/initDc", INIT_DC);
        let client = order_client(mock);

        let page = client.order().order_confirm_passenger(&session()).unwrap();
        assert_eq!(page.token, "8ab4d2dfdc5db8a4a5f5fd2a5f0e3c8d");

        let mock = MockTransport::new().on("/otn/confirmPassenger/initDc", RawResponse::new(302, ""));
        let client = order_client(mock);
        assert!(matches!(
            client.order().order_confirm_passenger(&session()),
            Err(Error::HttpStatus(302))
        ));
    }

    #[test]
    fn check_order_test() {
        let mock = MockTransport::new().on_json(
            "/otn/confirmPassenger/checkOrderInfo",
            r#"{"validateMessagesShowId":"_validatorMessage","status":true,"httpstatus":200,"data":{"ifShowPassCode":"N","canChooseBeds":"N","canChooseSeats":"Y","choose_Seats":"OM9","isCanChooseMid":"N","ifShowPassCodeTime":"1","submitStatus":true,"smokeStr":""},"messages":[],"validateMessages":{}}"#,
        );
        let client = order_client(mock);

        let data = client
            .order()
            .order_confirm_passenger_check_order(
                "8ab4d2dfdc5db8a4a5f5fd2a5f0e3c8d",
                "O,0,1,张三,1,110101199001011234,13800138000,N",
                "张三,1,110101199001011234,1_",
                &session(),
            )
            .unwrap();
        assert_eq!(data["submitStatus"], json!(true));

        let sent = client.transport().requests_to("checkOrderInfo");
        assert_eq!(sent[0].param_value("cancel_flag"), Some("2"));
        assert_eq!(
            sent[0].param_value("bed_level_order_num"),
            Some("000000000000000000000000000000")
        );
        assert_eq!(sent[0].param_value("whatsSelect"), Some("1"));
        assert_eq!(
            sent[0].param_value("REPEAT_SUBMIT_TOKEN"),
            Some("8ab4d2dfdc5db8a4a5f5fd2a5f0e3c8d")
        );
    }

    #[test]
    fn queue_count_test() {
        let mock = MockTransport::new().on_json(
            "/otn/confirmPassenger/getQueueCount",
            r#"{"status":true,"httpstatus":200,"data":{"count":"0","ticket":"有","op_2":"false","countT":"0","op_1":"false"}}"#,
        );
        let client = order_client(mock);
        let page = ConfirmPassengerPage::parse(INIT_DC).unwrap();

        let queue = QueueCount::new("2019-01-11", SeatType::Second, &page);
        let data = client
            .order()
            .order_confirm_passenger_get_queue_count(&queue, &session())
            .unwrap();
        assert_eq!(data["ticket"], json!("有"));

        let sent = client.transport().requests_to("getQueueCount");
        assert_eq!(
            sent[0].param_value("train_date"),
            Some("Fri Jan 11 2019 00:00:00 GMT+0800 (China Standard Time)")
        );
        assert_eq!(sent[0].param_value("seatType"), Some("O"));
        assert_eq!(sent[0].param_value("train_no"), Some("24000000G50H"));
        assert_eq!(sent[0].param_value("fromStationTelecode"), Some("VNP"));
        assert_eq!(
            sent[0].param_value("leftTicket"),
            Some("O055300021M0933000009174800003")
        );

        let mut queue = queue;
        queue.train_date = "Jan 11".to_string();
        let before = client.transport().request_count();
        assert!(client
            .order()
            .order_confirm_passenger_get_queue_count(&queue, &session())
            .is_err());
        assert_eq!(client.transport().request_count(), before);
    }

    #[test]
    fn confirm_single_for_queue_test() {
        let mock = MockTransport::new().on_json(
            "/otn/confirmPassenger/confirmSingleForQueue",
            r#"{"status":true,"httpstatus":200,"data":{"isAsync":"1","submitStatus":false,"errMsg":"余票不足"}}"#,
        );
        let client = order_client(mock);
        let page = ConfirmPassengerPage::parse(INIT_DC).unwrap();

        let confirm = ConfirmQueue::new("p", "o", &page).with_choose_seats("1F");
        let data = client
            .order()
            .order_confirm_passenger_confirm_single_for_queue(&confirm, &session())
            .unwrap();
        assert_eq!(data["submitStatus"], json!(false));

        let sent = client.transport().requests_to("confirmSingleForQueue");
        assert_eq!(sent[0].param_value("key_check_isChange"), Some("8C0B1E1A6D2B6B0D5E0F6C0B"));
        assert_eq!(sent[0].param_value("choose_seats"), Some("1F"));
        assert_eq!(sent[0].param_value("dwAll"), Some("N"));
        assert_eq!(sent[0].param_value("roomType"), None);
        assert_eq!(sent[0].param_value("seatDetailType"), None);
    }

    #[test]
    fn query_and_result_order_test() {
        let mock = MockTransport::new()
            .on_json(
                "/otn/confirmPassenger/queryOrderWaitTime",
                r#"{"status":true,"httpstatus":200,"data":{"queryOrderWaitTimeStatus":true,"count":0,"waitTime":-1,"requestId":6490000000000000000,"waitCount":0,"tourFlag":"dc","orderId":"E123456789"}}"#,
            )
            .on_json(
                "/otn/confirmPassenger/resultOrderForDcQueue",
                r#"{"status":true,"httpstatus":200,"data":{"submitStatus":true}}"#,
            );
        let client = order_client(mock);
        let order = client.order();

        let wait = order
            .order_confirm_passenger_query_order("8ab4d2df", &session())
            .unwrap();
        assert_eq!(wait["orderId"], json!("E123456789"));
        let result = order
            .order_confirm_passenger_result_order("E123456789", "8ab4d2df", &session())
            .unwrap();
        assert_eq!(result["submitStatus"], json!(true));

        let sent = client.transport().requests_to("queryOrderWaitTime");
        assert_eq!(sent[0].param_value("tourFlag"), Some("dc"));
        assert!(sent[0].param_value("random").unwrap().parse::<i64>().is_ok());
    }

    #[test]
    fn order_query_test() {
        let mock = MockTransport::new().on_json(
            "/otn/queryOrder/queryMyOrder",
            r#"{"status":true,"httpstatus":200,"data":{"order_total_number":"1","OrderDTODataList":[{"sequence_no":"E123456789","order_date":"2019-01-10 10:00:00","ticket_totalnum":1,"ticket_price_all":55300.0}]}}"#,
        );
        let client = order_client(mock);

        let query = OrderQuery::new("2019-01-01", "2019-01-31")
            .with_query_where(OrderWhere::History)
            .with_page(1, 20);
        let orders = client.order().order_query(&query, &session()).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0]["sequence_no"], json!("E123456789"));

        let sent = client.transport().requests_to("queryMyOrder");
        assert_eq!(sent[0].param_value("query_where"), Some("H"));
        assert_eq!(sent[0].param_value("come_from_flag"), Some("my_order"));
        assert_eq!(sent[0].param_value("queryType"), Some("1"));
        assert_eq!(sent[0].param_value("pageIndex"), Some("1"));
        assert_eq!(sent[0].param_value("pageSize"), Some("20"));

        let query = OrderQuery::new("2019-01-01", "2019/01/31");
        assert!(matches!(
            client.order().order_query(&query, &session()),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn order_query_no_complete_test() {
        let mock = MockTransport::new().on_json(
            "/otn/queryOrder/queryMyOrderNoComplete",
            r#"{"status":true,"httpstatus":200,"data":{"to_page":"db"}}"#,
        );
        let client = order_client(mock);

        assert!(client.order().order_query_no_complete(&session()).unwrap().is_empty());
    }
}

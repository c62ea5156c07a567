use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::client::{Method, Request, TrainClient, Transport};
use crate::des::{des_any_to_string, from_reply, take_path};
use crate::error::{ApiErrors, Error};
use crate::session::Session;
use crate::Result;

const NO_COMPLETE_PAY_URL: &str = "https://kyfw.12306.cn/otn/queryOrder/continuePayNoCompleteMyOrder";
const PAY_INIT_URL: &str = "https://kyfw.12306.cn/otn/payOrder/init";
const PAY_CHECK_URL: &str = "https://kyfw.12306.cn/otn/payOrder/paycheckNew";
const PAY_GATEWAY_URL: &str = "https://epay.12306.cn/pay/payGateway";
const WEB_BUSINESS_URL: &str = "https://epay.12306.cn/pay/webBusiness";

const TRADE_FAILED: &str = "交易失败";

/// Payment of a booked order.
///
/// The sequence is `pay_no_complete_order`, `pay_init`, `pay_check_new`,
/// then `pay_web_business`, whose [`GatewayForm`] tells where to send the
/// user to pay.
pub struct PayApi<'a, T> {
    client: &'a TrainClient<T>,
}

impl<'a, T> PayApi<'a, T>
where
    T: Transport,
{
    pub(crate) fn new(client: &'a TrainClient<T>) -> Self {
        PayApi { client }
    }

    /// Resumes the payment of an unpaid order.
    pub fn pay_no_complete_order(
        &self,
        sequence_no: &str,
        arrive_time_str: Option<&str>,
        pay_flag: Option<&str>,
        session: &Session,
    ) -> Result<Value> {
        self.client.require_login(session)?;

        let request = Request::post(NO_COMPLETE_PAY_URL)
            .param("sequence_no", sequence_no)
            .param("pay_flag", pay_flag.unwrap_or("pay"))
            .param("arrive_time_str", arrive_time_str.unwrap_or(""));
        let reply = self.client.submit(&request, session)?;

        Ok(take_path(reply, &["data"]).unwrap_or(Value::Null))
    }

    /// Opens the payment page; returns its HTML.
    pub fn pay_init(&self, session: &Session) -> Result<String> {
        let result = self.client.submit_ok(&Request::get(PAY_INIT_URL), session)?;

        Ok(result.body)
    }

    /// Starts the payment and decodes the transaction sent to the gateway.
    pub fn pay_check_new(&self, params: &PayCheckParams, session: &Session) -> Result<PayCheck> {
        self.client.require_login(session)?;

        let request = Request::post(PAY_CHECK_URL)
            .param("batch_nos", &params.batch_nos)
            .param("coach_nos", &params.coach_nos)
            .param("seat_nos", &params.seat_nos)
            .param("passenger_id_types", &params.passenger_id_types)
            .param("passenger_id_nos", &params.passenger_id_nos)
            .param("passenger_names", &params.passenger_names)
            .param("insure_types", &params.insure_types)
            .param("if_buy_insure_only", &params.if_buy_insure_only)
            .param("hasBoughtIns", &params.has_bought_ins)
            .param("_json_att", "");
        let reply = self.client.submit(&request, session)?;

        let data = take_path(reply, &["data"]).unwrap_or(Value::Null);
        let pay_form: PayForm = match take_path(data.clone(), &["payForm"]) {
            Some(form) => from_reply(form)?,
            None => return Err(Error::MalformedResponse("no payForm in reply".to_string())),
        };
        let tran_data = TranData::decode(&pay_form.tran_data)?;
        debug!("pay check. order {} amount {}", tran_data.order_id, tran_data.amount);

        Ok(PayCheck {
            data,
            pay_form,
            tran_data,
        })
    }

    /// Opens the cashier page of the gateway; returns its HTML.
    pub fn pay_gateway(&self, form: &PayForm, session: &Session) -> Result<String> {
        self.client.require_login(session)?;

        let request = Request::post(PAY_GATEWAY_URL)
            .param("_json_att", "")
            .param("interfaceName", &form.interface_name)
            .param("interfaceVersion", &form.interface_version)
            .param("tranData", &form.tran_data)
            .param("merSignMsg", &form.mer_sign_msg)
            .param("appId", &form.app_id)
            .param("transType", &form.trans_type);
        let result = self.client.submit_ok(&request, session)?;

        Ok(result.body)
    }

    /// Picks the bank and returns the form leading to it.
    ///
    /// # Errors
    ///
    /// The method fails with `Error::Api` if the gateway refuses the
    /// transaction and with `Error::Scrape` if the reply has no form.
    pub fn pay_web_business(&self, business: &WebBusiness, session: &Session) -> Result<GatewayForm> {
        self.client.require_login(session)?;

        let request = Request::post(WEB_BUSINESS_URL)
            .param("tranData", &business.tran_data)
            .param("transType", &business.trans_type)
            .param("channelId", &business.channel_id)
            .param("appId", &business.app_id)
            .param("merSignMsg", &business.sign_msg)
            .param("merCustomIp", &business.custom_ip)
            .param("orderTimeoutDate", &business.order_timeout_date)
            .param("paymentType", &business.payment_type)
            .param("bankId", &business.bank_id)
            .param("businessType", &business.business_type);
        let result = self.client.submit_raw(&request, session)?;
        info!(
            "pay web business resp. status: {} content: {}",
            result.status, result.body
        );

        if !result.is_ok() {
            return Err(Error::HttpStatus(result.status));
        }
        if result.body.contains(TRADE_FAILED) {
            return Err(Error::Api(ApiErrors::new(vec![result.body])));
        }

        GatewayForm::parse(&result.body)
    }
}

/// Parameters of `pay_check_new`, empty by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayCheckParams {
    pub batch_nos: String,
    pub coach_nos: String,
    pub seat_nos: String,
    pub passenger_id_types: String,
    pub passenger_id_nos: String,
    pub passenger_names: String,
    pub insure_types: String,
    pub if_buy_insure_only: String,
    pub has_bought_ins: String,
}

impl Default for PayCheckParams {
    fn default() -> Self {
        PayCheckParams {
            batch_nos: String::new(),
            coach_nos: String::new(),
            seat_nos: String::new(),
            passenger_id_types: String::new(),
            passenger_id_nos: String::new(),
            passenger_names: String::new(),
            insure_types: String::new(),
            if_buy_insure_only: "N".to_string(),
            has_bought_ins: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
/// The form `pay_check_new` asks to post to the gateway.
pub struct PayForm {
    /// Base64 XML, see [`TranData`].
    #[serde(rename = "tranData", default, deserialize_with = "des_any_to_string")]
    pub tran_data: String,

    #[serde(rename = "merSignMsg", default, deserialize_with = "des_any_to_string")]
    pub mer_sign_msg: String,

    #[serde(rename = "transType", default, deserialize_with = "des_any_to_string")]
    pub trans_type: String,

    #[serde(rename = "appId", default, deserialize_with = "des_any_to_string")]
    pub app_id: String,

    #[serde(rename = "interfaceName", default, deserialize_with = "des_any_to_string")]
    pub interface_name: String,

    #[serde(rename = "interfaceVersion", default, deserialize_with = "des_any_to_string")]
    pub interface_version: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub epayurl: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// The transaction carried by `tranData`.
pub struct TranData {
    pub interface_version: String,
    pub interface_name: String,
    pub order_date: String,
    /// `YYYYMMDDhhmmss`, needed by `pay_web_business`.
    pub order_timeout_date: String,
    pub order_id: String,
    /// In fen.
    pub amount: String,
    pub app_id: String,
    pub cur_type: String,
    pub mer_url: String,
    pub app_url: String,
    pub inner_url: String,
    pub mer_var: String,
    pub trans_type: String,
}

impl TranData {
    /// Decodes the base64 `tranData` and parses it.
    pub fn decode(tran_data: &str) -> Result<Self> {
        let compact: String = tran_data.chars().filter(|c| !c.is_whitespace()).collect();
        let xml = general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| Error::MalformedResponse(format!("tranData: {}", e)))?;

        TranData::parse(&String::from_utf8_lossy(&xml))
    }

    /// Reads the fields of the XML document with patterns, the gateway
    /// documents do not always parse as XML.
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(TranData {
            interface_version: tag(xml, "interfaceVersion", r"([0-9, \.]+)")?,
            interface_name: tag(xml, "interfaceName", r"(.+)")?,
            order_date: tag(xml, "orderDate", r"(.+)")?,
            order_timeout_date: tag(xml, "orderTimeoutDate", r"(.+)")?,
            order_id: tag(xml, "orderId", r"(.+)")?,
            amount: tag(xml, "amount", r"(\d+)")?,
            app_id: tag(xml, "appId", r"(\d+)")?,
            cur_type: tag(xml, "curType", r"(\d+)")?,
            mer_url: tag(xml, "merURL", r"(?s)(.+)")?,
            app_url: tag(xml, "appURL", r"(?s)(.+)")?,
            inner_url: tag(xml, "innerURL", r"(?s)(.+)")?,
            mer_var: tag(xml, "merVAR", r"(?s)(.+)")?,
            trans_type: tag(xml, "transType", r"(\d+)")?,
        })
    }
}

fn tag(xml: &str, name: &str, content: &str) -> Result<String> {
    let pattern = format!("<{name}>{content}</{name}>", name = name, content = content);
    let re = Regex::new(&pattern).map_err(|e| Error::Scrape(e.to_string()))?;

    re.captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Scrape(name.to_string()))
}

/// What `pay_check_new` returns.
#[derive(Debug, Clone, PartialEq)]
pub struct PayCheck {
    /// The whole `data` of the reply.
    pub data: Value,
    pub pay_form: PayForm,
    pub tran_data: TranData,
}

/// Parameters of `pay_web_business`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebBusiness {
    pub tran_data: String,
    pub sign_msg: String,
    pub trans_type: String,
    /// Public IP address of the paying user.
    pub custom_ip: String,
    pub order_timeout_date: String,
    pub bank_id: String,
    pub channel_id: String,
    pub business_type: String,
    pub payment_type: String,
    pub app_id: String,
}

impl WebBusiness {
    /// Fills the parameters from a started payment.
    pub fn new(check: &PayCheck, custom_ip: &str, bank_id: &str) -> Self {
        WebBusiness {
            tran_data: check.pay_form.tran_data.clone(),
            sign_msg: check.pay_form.mer_sign_msg.clone(),
            trans_type: check.pay_form.trans_type.clone(),
            custom_ip: custom_ip.to_string(),
            order_timeout_date: check.tran_data.order_timeout_date.clone(),
            bank_id: bank_id.to_string(),
            channel_id: "1".to_string(),
            business_type: "1".to_string(),
            payment_type: "0".to_string(),
            app_id: "0001".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// The form the gateway asks the browser to post to the bank.
pub struct GatewayForm {
    pub action: String,
    /// `GET` or `POST`.
    pub method: String,
    pub params: BTreeMap<String, String>,
}

impl GatewayForm {
    /// Reads the first form of the page with its inputs.
    pub fn parse(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let form_selector =
            Selector::parse("form").map_err(|_| Error::Scrape("form selector".to_string()))?;
        let input_selector =
            Selector::parse("input").map_err(|_| Error::Scrape("input selector".to_string()))?;

        let form = document
            .select(&form_selector)
            .next()
            .ok_or_else(|| Error::Scrape("payment form".to_string()))?;
        let action = form
            .value()
            .attr("action")
            .ok_or_else(|| Error::Scrape("form action".to_string()))?;
        let method = form.value().attr("method").unwrap_or("get").to_uppercase();

        let params: BTreeMap<String, String> = form
            .select(&input_selector)
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                let value = input.value().attr("value").unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Ok(GatewayForm {
            action: action.to_string(),
            method,
            params,
        })
    }

    /// Returns the request the browser would send.
    pub fn request(&self) -> Request {
        let method = if self.method == "POST" {
            Method::Post
        } else {
            Method::Get
        };

        self.params
            .iter()
            .fold(Request::new(method, &self.action), |r, (k, v)| r.param(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::{GatewayForm, PayCheckParams, PayForm, TranData, WebBusiness};
    use crate::client::{Method, RawResponse};
    use crate::mock::MockTransport;
    use crate::{ClientConfig, Error, Session, TrainClient};
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::json;

    const TRAN_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root><interfaceVersion>1.0.1</interfaceVersion><interfaceName>WEB_PAY</interfaceName><orderDate>20190110100000</orderDate><orderTimeoutDate>20190110104500</orderTimeoutDate><orderId>E123456789</orderId><amount>55300</amount><appId>0001</appId><curType>1</curType><merURL>https://kyfw.12306.cn/otn/payOrder/paySuccess</merURL><appURL>https://kyfw.12306.cn/otn/</appURL><innerURL>https://kyfw.12306.cn/otn/payOrder/callbackPayOrder</innerURL><merVAR>EU123456789\n</merVAR><transType>01</transType></root>";

    const GATEWAY_HTML: &str = r#"<html>
<head><meta http-equiv="Content-Type" content="text/html; charset=utf-8"></head>
<body onload="document.forms[0].submit()">
<form action="https://mapi.alipay.com/gateway.do?_input_charset=utf-8" method="post" name="myForm">
<input type="hidden" name="service" value="create_direct_pay_by_user"/>
<input type="hidden" name="out_trade_no" value="E123456789"/>
<input type="hidden" name="total_fee" value="553.00"/>
<input type="hidden" name="extra_common_param"/>
<input type="submit" value="pay"/>
</form>
</body>
</html>"#;

    fn session() -> Session {
        Session::from_pairs(vec![("JSESSIONID", "ABC"), ("tk", "EX-yKD2MKlQG")])
    }

    fn pay_client(mock: MockTransport) -> TrainClient<MockTransport> {
        TrainClient::with_transport(mock.logged_in(), ClientConfig::default())
    }

    fn pay_check_reply() -> String {
        json!({
            "status": true,
            "httpstatus": 200,
            "data": {
                "flag": true,
                "payForm": {
                    "tranData": general_purpose::STANDARD.encode(TRAN_XML),
                    "merSignMsg": "SIGN==",
                    "transType": "01",
                    "appId": "0001",
                    "interfaceName": "PAY_SERVLET",
                    "interfaceVersion": "PAY_SERVLET",
                    "epayurl": "https://epay.12306.cn/pay/payGateway"
                }
            }
        })
        .to_string()
    }

    #[test]
    fn tran_data_test() {
        let t = TranData::parse(TRAN_XML).unwrap();

        assert_eq!(t.interface_version, "1.0.1");
        assert_eq!(t.interface_name, "WEB_PAY");
        assert_eq!(t.order_timeout_date, "20190110104500");
        assert_eq!(t.order_id, "E123456789");
        assert_eq!(t.amount, "55300");
        assert_eq!(t.cur_type, "1");
        assert_eq!(t.mer_url, "https://kyfw.12306.cn/otn/payOrder/paySuccess");
        assert_eq!(t.mer_var, "EU123456789\n");
        assert_eq!(t.trans_type, "01");

        let encoded = general_purpose::STANDARD.encode(TRAN_XML);
        assert_eq!(TranData::decode(&encoded).unwrap(), t);
    }

    #[test]
    fn tran_data_broken_test() {
        match TranData::parse("<root><interfaceVersion>1.0.1</interfaceVersion></root>") {
            Err(Error::Scrape(tag)) => assert_eq!(tag, "interfaceName"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            TranData::decode("not base64!"),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn gateway_form_test() {
        let form = GatewayForm::parse(GATEWAY_HTML).unwrap();

        assert_eq!(form.action, "https://mapi.alipay.com/gateway.do?_input_charset=utf-8");
        assert_eq!(form.method, "POST");
        assert_eq!(form.params.len(), 4);
        assert_eq!(form.params["out_trade_no"], "E123456789");
        assert_eq!(form.params["extra_common_param"], "");

        let request = form.request();
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.param_value("total_fee"), Some("553.00"));

        assert!(matches!(
            GatewayForm::parse("<html><body>ok</body></html>"),
            Err(Error::Scrape(_))
        ));
    }

    #[test]
    fn pay_check_new_test() {
        let mock = MockTransport::new().on_json("/otn/payOrder/paycheckNew", &pay_check_reply());
        let client = pay_client(mock);

        let check = client
            .pay()
            .pay_check_new(&PayCheckParams::default(), &session())
            .unwrap();
        assert_eq!(check.pay_form.mer_sign_msg, "SIGN==");
        assert_eq!(check.tran_data.order_id, "E123456789");
        assert_eq!(check.data["flag"], json!(true));

        let sent = client.transport().requests_to("paycheckNew");
        assert_eq!(sent[0].param_value("if_buy_insure_only"), Some("N"));
    }

    #[test]
    fn pay_check_new_without_form_test() {
        let mock = MockTransport::new()
            .on_json("/otn/payOrder/paycheckNew", r#"{"status": true, "data": {"flag": false}}"#);
        let client = pay_client(mock);

        assert!(matches!(
            client.pay().pay_check_new(&PayCheckParams::default(), &session()),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn web_business_test() {
        let mock = MockTransport::new()
            .on_json("/otn/payOrder/paycheckNew", &pay_check_reply())
            .on_json("/pay/webBusiness", GATEWAY_HTML);
        let client = pay_client(mock);

        let check = client
            .pay()
            .pay_check_new(&PayCheckParams::default(), &session())
            .unwrap();
        let business = WebBusiness::new(&check, "1.2.3.4", "33000020");
        let form = client.pay().pay_web_business(&business, &session()).unwrap();
        assert_eq!(form.params["total_fee"], "553.00");

        let sent = client.transport().requests_to("webBusiness");
        assert_eq!(sent[0].param_value("orderTimeoutDate"), Some("20190110104500"));
        assert_eq!(sent[0].param_value("merCustomIp"), Some("1.2.3.4"));
        assert_eq!(sent[0].param_value("bankId"), Some("33000020"));
        assert_eq!(sent[0].param_value("channelId"), Some("1"));
    }

    #[test]
    fn web_business_failed_test() {
        let mock = MockTransport::new()
            .on_json("/pay/webBusiness", "<html><body>交易失败，请重新支付</body></html>")
            .on("/pay/payGateway", RawResponse::new(500, ""));
        let client = pay_client(mock);
        let check = super::PayCheck {
            data: json!({}),
            pay_form: PayForm::default(),
            tran_data: TranData::default(),
        };

        match client
            .pay()
            .pay_web_business(&WebBusiness::new(&check, "1.2.3.4", "33000020"), &session())
        {
            Err(Error::Api(e)) => assert!(e.contains("交易失败")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            client.pay().pay_gateway(&check.pay_form, &session()),
            Err(Error::HttpStatus(500))
        ));
    }

    #[test]
    fn pay_no_complete_order_test() {
        let mock = MockTransport::new().on_json(
            "/otn/queryOrder/continuePayNoCompleteMyOrder",
            r#"{"status": true, "httpstatus": 200, "data": {"existError": "N"}}"#,
        );
        let client = pay_client(mock);

        let data = client
            .pay()
            .pay_no_complete_order("E123456789", None, None, &session())
            .unwrap();
        assert_eq!(data["existError"], json!("N"));

        let sent = client.transport().requests_to("continuePayNoCompleteMyOrder");
        assert_eq!(sent[0].param_value("pay_flag"), Some("pay"));
        assert_eq!(sent[0].param_value("arrive_time_str"), Some(""));

        assert!(matches!(
            client.pay().pay_no_complete_order("E123456789", None, None, &Session::new()),
            Err(Error::NotLoggedIn)
        ));
    }

    #[test]
    fn pay_init_test() {
        let mock = MockTransport::new().on_json("/otn/payOrder/init", "<html>pay</html>");
        let client = pay_client(mock);

        assert_eq!(client.pay().pay_init(&session()).unwrap(), "<html>pay</html>");
    }
}

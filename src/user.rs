use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::client::{Request, TrainClient, Transport};
use crate::des::{des_any_to_string, from_reply, take_list, take_object, take_path};
use crate::session::Session;
use crate::{PointQueryType, Result, TrainDate};

const USER_INFO_URL: &str = "https://kyfw.12306.cn/otn/modifyUser/initQueryUserInfoApi";
const PASSENGERS_URL: &str = "https://kyfw.12306.cn/otn/confirmPassenger/getPassengerDTOs";
const CONTACTS_URL: &str = "https://kyfw.12306.cn/otn/passengers/query";
const ADDRESSES_URL: &str = "https://kyfw.12306.cn/otn/address/initApi";

const MEMBER_URL: &str = "https://cx.12306.cn/tlcx/memberInfo/queryMemberIntegration";
const MEMBER_POINT_URL: &str = "https://cx.12306.cn/tlcx/memberInfo/memberPointQuery";
const POINT_HISTORY_URL: &str = "https://cx.12306.cn/tlcx/memberInfo/pointSimpleQuery";

/// Profile, passengers and addresses of the logged in user.
pub struct UserApi<'a, T> {
    client: &'a TrainClient<T>,
}

impl<'a, T> UserApi<'a, T>
where
    T: Transport,
{
    pub(crate) fn new(client: &'a TrainClient<T>) -> Self {
        UserApi { client }
    }

    /// Returns the profile flattened into one record.
    pub fn user_info(&self, session: &Session) -> Result<UserInfo> {
        self.client.require_login(session)?;

        let reply = self.client.submit(&Request::post(USER_INFO_URL), session)?;
        match take_path(reply, &["data"]) {
            Some(data) => from_reply(data),
            None => Ok(UserInfo::default()),
        }
    }

    /// Returns the passengers the user can book tickets for.
    pub fn user_passengers(&self, session: &Session) -> Result<Vec<Passenger>> {
        self.client.require_login(session)?;

        let reply = self.client.submit(&Request::post(PASSENGERS_URL), session)?;
        passengers_from(take_list(reply, &["data", "normal_passengers"]))
    }

    /// Returns a page of the contact list.
    pub fn user_contact(
        &self,
        page_index: u32,
        page_size: u32,
        session: &Session,
    ) -> Result<Vec<Passenger>> {
        self.client.require_login(session)?;

        let request = Request::post(CONTACTS_URL)
            .param("pageIndex", page_index)
            .param("pageSize", page_size);
        let reply = self.client.submit(&request, session)?;
        passengers_from(take_list(reply, &["data", "datas"]))
    }

    /// Returns the delivery addresses.
    pub fn user_addresses(&self, session: &Session) -> Result<Vec<Value>> {
        self.client.require_login(session)?;

        let reply = self.client.submit(&Request::post(ADDRESSES_URL), session)?;
        Ok(take_list(reply, &["data", "addresses"]))
    }
}

fn passengers_from(list: Vec<Value>) -> Result<Vec<Passenger>> {
    list.into_iter().map(from_reply::<Passenger>).collect()
}

/// Member (loyalty points) endpoints.
pub struct MemberApi<'a, T> {
    client: &'a TrainClient<T>,
}

impl<'a, T> MemberApi<'a, T>
where
    T: Transport,
{
    pub(crate) fn new(client: &'a TrainClient<T>) -> Self {
        MemberApi { client }
    }

    pub fn member_info_query_member(&self, session: &Session) -> Result<Value> {
        self.client.require_login(session)?;

        let reply = self.client.submit(&Request::post(MEMBER_URL), session)?;
        Ok(take_object(reply, &["data"]))
    }

    /// Returns the member level and point balance.
    pub fn member_info_query_member_point(&self, session: &Session) -> Result<Value> {
        self.client.require_login(session)?;

        let reply = self.client.submit(&Request::post(MEMBER_POINT_URL), session)?;
        Ok(take_object(reply, &["data"]))
    }

    /// Returns a page of point records between two `YYYYMMDD` dates.
    ///
    /// # Errors
    ///
    /// The method fails before sending anything if a date has a wrong format.
    pub fn member_info_query_point_history(
        &self,
        query_type: PointQueryType,
        start_date: &str,
        end_date: &str,
        page_index: u32,
        page_size: u32,
        session: &Session,
    ) -> Result<Value> {
        let start_date = TrainDate::from_compact(start_date)?;
        let end_date = TrainDate::from_compact(end_date)?;
        self.client.require_login(session)?;

        let request = Request::post(POINT_HISTORY_URL)
            .param("queryType", query_type.code())
            .param("queryStartDate", start_date.compact())
            .param("queryEndDate", end_date.compact())
            .param("pageIndex", page_index)
            .param("pageSize", page_size);
        let reply = self.client.submit(&request, session)?;
        Ok(take_object(reply, &["data"]))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Profile of the user.
pub struct UserInfo {
    pub user_type_name: String,
    pub pic_flag: String,
    pub can_upload: String,
    pub user_password: String,
    pub is_mobile_check: String,
    pub country_name: String,
    pub user_name: String,
    pub name: String,
    pub id_type_code: String,
    pub id_type_name: String,
    pub id_no: String,
    pub member_id: String,
    pub member_level: String,
    pub country_code: String,
    pub sex: String,
    pub mobile_no: String,
    pub email: String,
    pub address: String,
    pub is_active: String,
    pub user_id: String,
    pub user_status: String,
    pub is_valid: String,
    pub need_modify_email: String,
    pub birthday: String,
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} {}",
            self.name, self.user_name, self.mobile_no, self.email
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
/// A passenger from the contact list.
pub struct Passenger {
    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_name: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub sex_code: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub born_date: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub country_code: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_id_type_code: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_id_type_name: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_id_no: String,

    /// 1 adult, 2 child, 3 student, 4 disabled soldier.
    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_type: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_type_name: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub passenger_flag: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub mobile_no: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub email: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub code: String,

    #[serde(default, deserialize_with = "des_any_to_string")]
    pub index_id: String,
}

impl fmt::Display for Passenger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.passenger_name, self.passenger_id_type_name, self.passenger_type_name
        )
    }
}

mod de {
    use super::UserInfo;
    use crate::des::des_any_to_string;
    use serde::Deserialize;

    impl<'de> serde::Deserialize<'de> for UserInfo {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            #[derive(Deserialize, Debug, Default)]
            #[serde(default)]
            struct LoginUser {
                #[serde(deserialize_with = "des_any_to_string")]
                user_name: String,

                #[serde(deserialize_with = "des_any_to_string")]
                name: String,

                #[serde(deserialize_with = "des_any_to_string")]
                id_type_code: String,

                #[serde(deserialize_with = "des_any_to_string")]
                id_type_name: String,

                #[serde(deserialize_with = "des_any_to_string")]
                id_no: String,

                #[serde(deserialize_with = "des_any_to_string")]
                member_id: String,

                #[serde(deserialize_with = "des_any_to_string")]
                member_level: String,
            }

            #[derive(Deserialize, Debug, Default)]
            #[serde(default)]
            struct User {
                #[serde(deserialize_with = "des_any_to_string")]
                country_code: String,

                #[serde(deserialize_with = "des_any_to_string")]
                sex_code: String,

                #[serde(deserialize_with = "des_any_to_string")]
                mobile_no: String,

                #[serde(deserialize_with = "des_any_to_string")]
                email: String,

                #[serde(deserialize_with = "des_any_to_string")]
                address: String,

                #[serde(deserialize_with = "des_any_to_string")]
                is_active: String,

                #[serde(deserialize_with = "des_any_to_string")]
                user_id: String,

                #[serde(deserialize_with = "des_any_to_string")]
                user_status: String,

                #[serde(deserialize_with = "des_any_to_string")]
                is_valid: String,

                #[serde(alias = "needModifyEmail")]
                #[serde(deserialize_with = "des_any_to_string")]
                need_modify_email: String,

                #[serde(alias = "loginUserDTO")]
                login_user: Option<LoginUser>,
            }

            #[derive(Deserialize, Debug, Default)]
            #[serde(default)]
            struct Data {
                #[serde(alias = "userTypeName")]
                #[serde(deserialize_with = "des_any_to_string")]
                user_type_name: String,

                #[serde(alias = "picFlag")]
                #[serde(deserialize_with = "des_any_to_string")]
                pic_flag: String,

                #[serde(alias = "canUpload")]
                #[serde(deserialize_with = "des_any_to_string")]
                can_upload: String,

                #[serde(alias = "userPassword")]
                #[serde(deserialize_with = "des_any_to_string")]
                user_password: String,

                #[serde(alias = "isMobileCheck")]
                #[serde(deserialize_with = "des_any_to_string")]
                is_mobile_check: String,

                #[serde(deserialize_with = "des_any_to_string")]
                country_name: String,

                #[serde(alias = "bornDateString")]
                #[serde(deserialize_with = "des_any_to_string")]
                born_date: String,

                #[serde(alias = "userDTO")]
                user: Option<User>,
            }

            let input = Data::deserialize(deserializer)?;
            let user = input.user.unwrap_or_default();
            let login = user.login_user.unwrap_or_default();

            Ok(UserInfo {
                user_type_name: input.user_type_name,
                pic_flag: input.pic_flag,
                can_upload: input.can_upload,
                user_password: input.user_password,
                is_mobile_check: input.is_mobile_check,
                country_name: input.country_name,
                user_name: login.user_name,
                name: login.name,
                id_type_code: login.id_type_code,
                id_type_name: login.id_type_name,
                id_no: login.id_no,
                member_id: login.member_id,
                member_level: login.member_level,
                country_code: user.country_code,
                sex: user.sex_code,
                mobile_no: user.mobile_no,
                email: user.email,
                address: user.address,
                is_active: user.is_active,
                user_id: user.user_id,
                user_status: user.user_status,
                is_valid: user.is_valid,
                need_modify_email: user.need_modify_email,
                birthday: input.born_date,
            })
        }
    }
}

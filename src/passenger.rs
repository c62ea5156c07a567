use std::fmt;
use std::str::FromStr;

use crate::user::Passenger;
use crate::{error::Error, Result, SeatType};

const SAVE_FLAG_DEFAULT: &str = "N";

/// One passenger of `passengerTicketStr`.
///
/// Rendered as its eight fields joined by `,`:
/// `seat_type,passenger_flag,passenger_type,name,id_type_code,id_no,mobile_no,save_flag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassengerTicket {
    pub seat_type: String,
    pub passenger_flag: String,
    pub passenger_type: String,
    pub name: String,
    pub id_type_code: String,
    pub id_no: String,
    pub mobile_no: String,
    pub save_flag: String,
}

impl PassengerTicket {
    pub fn new(
        seat_type: SeatType,
        passenger_flag: &str,
        passenger_type: &str,
        name: &str,
        id_type_code: &str,
        id_no: &str,
        mobile_no: &str,
    ) -> Self {
        PassengerTicket {
            seat_type: seat_type.code().to_string(),
            passenger_flag: passenger_flag.to_string(),
            passenger_type: passenger_type.to_string(),
            name: name.to_string(),
            id_type_code: id_type_code.to_string(),
            id_no: id_no.to_string(),
            mobile_no: mobile_no.to_string(),
            save_flag: SAVE_FLAG_DEFAULT.to_string(),
        }
    }

    fn fields(&self) -> [&str; 8] {
        [
            &self.seat_type,
            &self.passenger_flag,
            &self.passenger_type,
            &self.name,
            &self.id_type_code,
            &self.id_no,
            &self.mobile_no,
            &self.save_flag,
        ]
    }
}

impl fmt::Display for PassengerTicket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fields().join(","))
    }
}

impl FromStr for PassengerTicket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(',').collect();
        if fields.len() != 8 {
            return Err(Error::InvalidArgument(format!("passenger ticket `{}`", s)));
        }

        Ok(PassengerTicket {
            seat_type: fields[0].to_string(),
            passenger_flag: fields[1].to_string(),
            passenger_type: fields[2].to_string(),
            name: fields[3].to_string(),
            id_type_code: fields[4].to_string(),
            id_no: fields[5].to_string(),
            mobile_no: fields[6].to_string(),
            save_flag: fields[7].to_string(),
        })
    }
}

/// One passenger of `oldPassengerStr`, rendered `name,id_type,id_no,type_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OldPassenger {
    pub name: String,
    pub id_type_code: String,
    pub id_no: String,
    pub passenger_type: String,
}

impl OldPassenger {
    pub fn new(name: &str, id_type_code: &str, id_no: &str, passenger_type: &str) -> Self {
        OldPassenger {
            name: name.to_string(),
            id_type_code: id_type_code.to_string(),
            id_no: id_no.to_string(),
            passenger_type: passenger_type.to_string(),
        }
    }
}

impl fmt::Display for OldPassenger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}_",
            self.name, self.id_type_code, self.id_no, self.passenger_type
        )
    }
}

impl FromStr for OldPassenger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s
            .strip_suffix('_')
            .ok_or_else(|| Error::InvalidArgument(format!("old passenger `{}`", s)))?
            .split(',')
            .collect();

        match fields[..] {
            [name, id_type_code, id_no, passenger_type] => {
                Ok(OldPassenger::new(name, id_type_code, id_no, passenger_type))
            }
            _ => Err(Error::InvalidArgument(format!("old passenger `{}`", s))),
        }
    }
}

/// Builds `passengerTicketStr` for several passengers.
pub fn join_passenger_tickets(tickets: &[PassengerTicket]) -> String {
    tickets
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<String>>()
        .join("_")
}

/// Builds `oldPassengerStr` for several passengers.
pub fn join_old_passengers(passengers: &[OldPassenger]) -> String {
    passengers.iter().map(|p| p.to_string()).collect()
}

impl Passenger {
    /// Returns the ticket entry of the passenger for a seat class.
    pub fn ticket(&self, seat_type: SeatType) -> PassengerTicket {
        PassengerTicket::new(
            seat_type,
            &self.passenger_flag,
            &self.passenger_type,
            &self.passenger_name,
            &self.passenger_id_type_code,
            &self.passenger_id_no,
            &self.mobile_no,
        )
    }

    pub fn old_passenger(&self) -> OldPassenger {
        OldPassenger::new(
            &self.passenger_name,
            &self.passenger_id_type_code,
            &self.passenger_id_no,
            &self.passenger_type,
        )
    }
}

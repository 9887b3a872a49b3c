use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The closed set of raw operations that can be run against an instrument
/// in addition to its typed API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ScpiRequest {
    Write(String),
    QueryString(String),
    QueryBinary(String),
    ReadString,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScpiResponse {
    Done,
    String(String),
    Binary {
        #[serde(
            serialize_with = "crate::util::to_base64",
            deserialize_with = "crate::util::from_base64"
        )]
        data: Vec<u8>,
    },
}

/// Classification of an error queue entry by its code, following IEEE 488.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScpiErrorClass {
    Command,
    Execution,
    DeviceSpecific,
    Query,
    Other,
}

/// One entry of the instrument error queue, e.g. `-113,"Undefined header"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScpiError {
    pub code: i32,
    pub message: String,
}

impl ScpiError {
    pub fn parse(reply: &str) -> crate::Result<Self> {
        let reply = reply.trim();
        let (code, message) = match reply.find(',') {
            Some(idx) => (&reply[..idx], &reply[idx + 1..]),
            None => (reply, ""),
        };
        let code: i32 = code
            .trim()
            .parse()
            .map_err(|_| Error::unexpected_response(reply))?;
        Ok(Self {
            code,
            message: unquote(message).to_string(),
        })
    }

    /// The terminating entry `+0,"No error"` which is returned once the queue is empty.
    pub fn is_no_error(&self) -> bool {
        self.code == 0
    }

    pub fn class(&self) -> ScpiErrorClass {
        match self.code {
            -199..=-100 => ScpiErrorClass::Command,
            -299..=-200 => ScpiErrorClass::Execution,
            -399..=-300 => ScpiErrorClass::DeviceSpecific,
            -499..=-400 => ScpiErrorClass::Query,
            _ => ScpiErrorClass::Other,
        }
    }
}

impl Display for ScpiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},\"{}\"", self.code, self.message)
    }
}

/// Parsed reply to `*IDN?`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware: String,
}

impl Identity {
    pub fn parse(reply: &str) -> crate::Result<Self> {
        let fields: Vec<_> = reply.trim().split(',').map(|x| x.trim()).collect();
        match fields.as_slice() {
            [manufacturer, model, serial_number, firmware] => Ok(Self {
                manufacturer: manufacturer.to_string(),
                model: model.to_string(),
                serial_number: serial_number.to_string(),
                firmware: firmware.to_string(),
            }),
            _ => Err(Error::unexpected_response(reply)),
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.manufacturer, self.model, self.serial_number, self.firmware
        )
    }
}

/// Strips one pair of surrounding double quotes, if present.
pub fn unquote(x: &str) -> &str {
    let x = x.trim();
    if x.len() >= 2 && x.starts_with('"') && x.ends_with('"') {
        &x[1..x.len() - 1]
    } else {
        x
    }
}

/// Parse a reply in any of the SCPI numeric formats (NR1, NR2, NR3).
pub fn parse_number(reply: &str) -> crate::Result<f64> {
    unquote(reply)
        .parse::<f64>()
        .map_err(|_| Error::unexpected_response(reply))
}

/// Length of a definite length block header (`#<n><n digits>`) and of the data following it.
///
/// Returns `None` as data length for an indefinite length block (`#0`), whose data
/// runs until the message terminator.
pub fn parse_block_header(rx: &[u8]) -> crate::Result<(usize, Option<usize>)> {
    if rx.len() < 2 || rx[0] != b'#' {
        return Err(Error::invalid_binary_header());
    }
    let digits = (rx[1] as char)
        .to_digit(10)
        .ok_or_else(Error::invalid_binary_header)? as usize;
    if digits == 0 {
        return Ok((2, None));
    }
    let offset = 2 + digits;
    if rx.len() < offset {
        return Err(Error::invalid_binary_header());
    }
    let data = std::str::from_utf8(&rx[2..offset]).map_err(|_| Error::invalid_binary_header())?;
    let length = data
        .parse::<usize>()
        .map_err(|_| Error::invalid_binary_header())?;
    Ok((offset, Some(length)))
}

use serde::{self, Deserializer, Serializer};
use std::fmt::{self, Display, Formatter};
use std::{io, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scpi::ScpiError;

#[derive(Serialize, Deserialize)]
struct AnyHowError {
    description: String,
    backtrace: String,
}

#[derive(Serialize, Deserialize)]
struct IoError {
    description: String,
    kind: String,
}

fn serialize_io_error<S>(error: &Arc<io::Error>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let to_serialize = IoError {
        description: format!("{}", error),
        kind: format!("{:?}", error.kind()),
    };
    to_serialize.serialize(serializer)
}

fn deserialize_io_error<'de, D>(deserializer: D) -> Result<Arc<io::Error>, D::Error>
where
    D: Deserializer<'de>,
{
    let ret = IoError::deserialize(deserializer)?;
    Ok(Arc::new(io::Error::new(io_error_kind(&ret.kind), ret.description)))
}

fn io_error_kind(kind: &str) -> io::ErrorKind {
    match kind {
        "NotFound" => io::ErrorKind::NotFound,
        "PermissionDenied" => io::ErrorKind::PermissionDenied,
        "ConnectionRefused" => io::ErrorKind::ConnectionRefused,
        "ConnectionReset" => io::ErrorKind::ConnectionReset,
        "ConnectionAborted" => io::ErrorKind::ConnectionAborted,
        "BrokenPipe" => io::ErrorKind::BrokenPipe,
        "TimedOut" => io::ErrorKind::TimedOut,
        "UnexpectedEof" => io::ErrorKind::UnexpectedEof,
        _ => io::ErrorKind::Other,
    }
}

fn serialize_anyhow_error<S>(error: &Arc<anyhow::Error>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let to_serialize = AnyHowError {
        description: error.to_string(),
        backtrace: format!("{:?}", error.backtrace()),
    };
    to_serialize.serialize(serializer)
}

fn deserialize_anyhow_error<'de, D>(deserializer: D) -> Result<Arc<anyhow::Error>, D::Error>
where
    D: Deserializer<'de>,
{
    let ret = AnyHowError::deserialize(deserializer)?;
    let ret = anyhow::Error::msg(ret.description);
    Ok(Arc::new(ret))
}

/// Failure of the link to the instrument: the port could not be opened, the socket was reset, ...
#[derive(Error, Clone, Debug, Serialize, Deserialize)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(
        #[serde(
            serialize_with = "serialize_io_error",
            deserialize_with = "deserialize_io_error"
        )]
        Arc<io::Error>,
    ),
    #[error("Other Error: {0}")]
    Other(
        #[serde(
            serialize_with = "serialize_anyhow_error",
            deserialize_with = "deserialize_anyhow_error"
        )]
        Arc<anyhow::Error>,
    ),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        TransportError::Io(Arc::new(err))
    }
}

impl From<anyhow::Error> for TransportError {
    fn from(x: anyhow::Error) -> Self {
        TransportError::Other(Arc::new(x))
    }
}

/// The link works but the conversation with the instrument did not go as expected.
#[derive(Error, Clone, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("Timeout")]
    Timeout,
    #[error("Unexpected Response: {0}")]
    UnexpectedResponse(String),
    #[error("Invalid binary block header")]
    InvalidBinaryHeader,
}

/// The set of values a parameter would have been accepted from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expected {
    OneOf(Vec<String>),
    Range { min: f64, max: f64, unit: String },
    Description(String),
}

impl Display for Expected {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expected::OneOf(values) => write!(f, "[{}]", values.join(", ")),
            Expected::Range { min, max, unit } => write!(f, "between {} - {} {}", min, max, unit),
            Expected::Description(x) => f.write_str(x),
        }
    }
}

/// A parameter was rejected before anything was sent to the instrument.
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[error("Received parameter: {received}. Expected parameters: {expected}")]
pub struct MalformedParameter {
    pub received: String,
    pub expected: Expected,
}

impl MalformedParameter {
    pub fn one_of<T: Display>(received: T, valid: &[&str]) -> Self {
        Self {
            received: received.to_string(),
            expected: Expected::OneOf(valid.iter().map(|x| x.to_string()).collect()),
        }
    }

    pub fn range<T: Display>(received: T, min: f64, max: f64, unit: &str) -> Self {
        Self {
            received: received.to_string(),
            expected: Expected::Range {
                min,
                max,
                unit: unit.to_string(),
            },
        }
    }

    pub fn described<T: Display, U: Into<String>>(received: T, expected: U) -> Self {
        Self {
            received: received.to_string(),
            expected: Expected::Description(expected.into()),
        }
    }
}

/// Faults the instrument reported through its own error queue.
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentError {
    pub errors: Vec<ScpiError>,
}

impl Display for InstrumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let errors: Vec<_> = self.errors.iter().map(|x| x.to_string()).collect();
        write!(f, "Instrument reported: {}", errors.join("; "))
    }
}

#[derive(Error, Clone, Debug, Serialize, Deserialize)]
pub enum Error {
    #[error("Transport Error {0}")]
    Transport(TransportError),
    #[error("Protocol Error {0}")]
    Protocol(ProtocolError),
    #[error("{0}")]
    MalformedParameter(MalformedParameter),
    #[error("Instrument Error {0}")]
    Instrument(InstrumentError),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Instrument is disconnected")]
    Disconnected,
    #[error("Operation not supported")]
    NotSupported,
}

impl Error {
    pub fn transport<T: Into<TransportError>>(err: T) -> Self {
        Self::Transport(err.into())
    }

    pub fn protocol_timeout() -> Self {
        Error::Protocol(ProtocolError::Timeout)
    }

    pub fn unexpected_response<T: Into<String>>(reply: T) -> Self {
        Error::Protocol(ProtocolError::UnexpectedResponse(reply.into()))
    }

    pub fn invalid_binary_header() -> Self {
        Error::Protocol(ProtocolError::InvalidBinaryHeader)
    }

    pub fn invalid_address<T: Into<String>>(addr: T) -> Self {
        Error::InvalidAddress(addr.into())
    }

    pub fn is_malformed_parameter(&self) -> bool {
        matches!(self, Error::MalformedParameter(_))
    }
}

impl From<io::Error> for Error {
    fn from(x: io::Error) -> Self {
        Error::Transport(TransportError::Io(Arc::new(x)))
    }
}

impl From<MalformedParameter> for Error {
    fn from(x: MalformedParameter) -> Self {
        Error::MalformedParameter(x)
    }
}

impl From<InstrumentError> for Error {
    fn from(x: InstrumentError) -> Self {
        Error::Instrument(x)
    }
}

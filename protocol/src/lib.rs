//! # Shared types of the `labinstr` instrument drivers
//!
//! This crate holds everything which is independent of the actual link to an instrument:
//!
//!  * [`enum@Error`] and its parts, in particular [`MalformedParameter`] for rejected arguments
//!    and [`InstrumentError`] for faults reported by the instrument itself.
//!  * [`ScpiRequest`] / [`ScpiResponse`], the raw operations every instrument supports.
//!  * Parsers for the common SCPI reply formats (numbers, `*IDN?`, error queue entries,
//!    binary blocks).
//!
//! All types are serializable such that they may be passed across process boundaries.
pub mod error;
pub mod scpi;
mod util;

pub use crate::error::{
    Error, Expected, InstrumentError, MalformedParameter, ProtocolError, TransportError,
};
pub use crate::scpi::{Identity, ScpiError, ScpiErrorClass, ScpiRequest, ScpiResponse};

pub type Result<T> = std::result::Result<T, Error>;

//! # Drivers for Agilent bench instruments
//!
//! This crate talks SCPI to an Agilent 34401A multimeter and to the Agilent E364xA power
//! supplies. Instruments are addressed with VISA-like resource strings:
//!
//!  * `tcp::<host>:<port>` or `TCPIP::<host>::<port>::SOCKET`
//!  * `serial::<path>::<baud>::<settings>[::<flow control>]`, e.g. `serial::/dev/ttyUSB0::9600::8N2`
//!  * `ASRL<n>::INSTR` or `ASRL<path>::INSTR`, using 9600 8N1
//!  * `prologix::<path>::<gpib address>` for a Prologix USB-GPIB controller
//!
//! ```no_run
//! use labinstr::{AgilentE364xA, Scpi};
//!
//! # async fn run() -> labinstr::Result<()> {
//! let mut psu = AgilentE364xA::connect("serial::/dev/ttyUSB0::9600::8N2").await?;
//! println!("{}", psu.identity().await?);
//! psu.set_output(5.0, 0.1).await?;
//! psu.set_output_state("ON").await?;
//! psu.check_errors().await?;
//! psu.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Every call completes its request and reply exchange before returning. Share a driver between
//! tasks by wrapping it in a `tokio::sync::Mutex`.
pub mod address;
pub mod devices;
pub mod instrument;
pub mod transport;

pub use labinstr_protocol as protocol;
pub use labinstr_protocol::{
    Error, Identity, InstrumentError, MalformedParameter, Result, ScpiError, ScpiRequest,
    ScpiResponse,
};

pub use crate::address::Address;
pub use crate::devices::{Agilent34401A, AgilentE364xA};
pub use crate::instrument::{Instrument, Scpi};
pub use crate::transport::TransportOptions;

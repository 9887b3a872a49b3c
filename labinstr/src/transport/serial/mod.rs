//! Instruments attached to an RS-232 port.
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use anyhow::anyhow;
pub use params::SerialParams;

use crate::transport::{ScpiStream, TransportOptions};

pub mod params;

pub type SerialTransport = ScpiStream<SerialStream>;

pub fn open(path: &str, params: &SerialParams, options: &TransportOptions) -> crate::Result<SerialTransport> {
    let serial_stream = tokio_serial::new(path, params.baud)
        .parity(params.parity.into())
        .stop_bits(params.stop_bits.into())
        .data_bits(params.data_bits.into())
        .flow_control(params.flow_control.into())
        .open_native_async()
        .map_err(|x| crate::Error::transport(anyhow!("Cannot open {}: {}", path, x)))?;
    log::debug!("Opened {} with {}", path, params);
    Ok(ScpiStream::new(serial_stream, options.timeout))
}

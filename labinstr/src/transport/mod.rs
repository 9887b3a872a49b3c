//! Links to instruments.
//!
//! Every link implements [`Transport`]: a line oriented SCPI conversation where a command is
//! written and, for queries, exactly one reply is read back. [`open`] selects the transport
//! matching an [`Address`].
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::Address;

pub mod mock;
pub mod prologix;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use mock::MockTransport;
pub use prologix::Prologix;
pub use stream::ScpiStream;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Upper bound for each write and each reply.
    pub timeout: Duration,
    /// Upper bound for establishing a network connection.
    pub connection_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

/// A request-response link to one instrument.
///
/// Implementations are not required to be usable from several tasks at once, all operations
/// take `&mut self`.
#[async_trait]
pub trait Transport: Send {
    /// Send one command. The message terminator is appended if missing.
    async fn write(&mut self, msg: &str) -> crate::Result<()>;

    /// Read one reply, without its terminator.
    async fn read_string(&mut self) -> crate::Result<String>;

    /// Read one IEEE 488.2 block and return its payload.
    async fn read_binary(&mut self) -> crate::Result<Vec<u8>>;

    /// Release the underlying resource.
    async fn close(&mut self) -> crate::Result<()>;

    async fn query_string(&mut self, msg: &str) -> crate::Result<String> {
        self.write(msg).await?;
        self.read_string().await
    }

    async fn query_binary(&mut self, msg: &str) -> crate::Result<Vec<u8>> {
        self.write(msg).await?;
        self.read_binary().await
    }
}

/// Open the transport for the given address.
pub async fn open(addr: &Address, options: &TransportOptions) -> crate::Result<Box<dyn Transport>> {
    log::debug!("Opening {}", addr);
    let ret: Box<dyn Transport> = match addr {
        Address::Tcp { host, port } => Box::new(tcp::connect(host, *port, options).await?),
        Address::Serial { path, params } => Box::new(serial::open(path, params, options)?),
        Address::Prologix { path, gpib_addr } => {
            let stream = serial::open(path, &prologix::serial_params(), options)?;
            Box::new(Prologix::init(stream, *gpib_addr).await?)
        }
    };
    Ok(ret)
}

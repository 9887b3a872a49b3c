//! The connection to one SCPI instrument and the IEEE 488.2 commands every instrument understands.
use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;
use labinstr_protocol::scpi::parse_number;
use labinstr_protocol::{Identity, ScpiRequest, ScpiResponse};

use crate::address::Address;
use crate::transport::{self, Transport, TransportOptions};
use crate::Error;

/// Owns the transport to one instrument.
///
/// Once [`Instrument::disconnect`] was called every further operation fails with
/// [`Error::Disconnected`].
pub struct Instrument {
    address: String,
    transport: Option<Box<dyn Transport>>,
}

impl Instrument {
    pub async fn connect(addr: &str) -> crate::Result<Self> {
        Self::connect_with_options(addr, &TransportOptions::default()).await
    }

    pub async fn connect_with_options(addr: &str, options: &TransportOptions) -> crate::Result<Self> {
        let parsed = Address::parse(addr)?;
        let transport = transport::open(&parsed, options).await?;
        Ok(Self {
            address: addr.to_string(),
            transport: Some(transport),
        })
    }

    /// Wrap an already opened transport.
    pub fn with_transport<A: Into<String>, T: Transport + 'static>(address: A, transport: T) -> Self {
        Self {
            address: address.into(),
            transport: Some(Box::new(transport)),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    fn transport(&mut self) -> crate::Result<&mut Box<dyn Transport>> {
        self.transport.as_mut().ok_or(Error::Disconnected)
    }

    pub async fn write(&mut self, cmd: &str) -> crate::Result<()> {
        log::debug!("{} <- {}", self.address, cmd);
        self.transport()?.write(cmd).await
    }

    pub async fn read_string(&mut self) -> crate::Result<String> {
        let ret = self.transport()?.read_string().await?;
        log::debug!("{} -> {}", self.address, ret);
        Ok(ret)
    }

    pub async fn query_string(&mut self, cmd: &str) -> crate::Result<String> {
        log::debug!("{} <- {}", self.address, cmd);
        let ret = self.transport()?.query_string(cmd).await?;
        log::debug!("{} -> {}", self.address, ret);
        Ok(ret)
    }

    pub async fn query_binary(&mut self, cmd: &str) -> crate::Result<Vec<u8>> {
        log::debug!("{} <- {}", self.address, cmd);
        let ret = self.transport()?.query_binary(cmd).await?;
        log::debug!("{} -> {} bytes", self.address, ret.len());
        Ok(ret)
    }

    /// Query and parse a numeric reply.
    pub async fn query_number(&mut self, cmd: &str) -> crate::Result<f64> {
        let reply = self.query_string(cmd).await?;
        parse_number(&reply)
    }

    pub async fn handle(&mut self, req: ScpiRequest) -> crate::Result<ScpiResponse> {
        match req {
            ScpiRequest::Write(x) => {
                self.write(&x).await?;
                Ok(ScpiResponse::Done)
            }
            ScpiRequest::QueryString(x) => Ok(ScpiResponse::String(self.query_string(&x).await?)),
            ScpiRequest::QueryBinary(x) => Ok(ScpiResponse::Binary {
                data: self.query_binary(&x).await?,
            }),
            ScpiRequest::ReadString => Ok(ScpiResponse::String(self.read_string().await?)),
        }
    }

    /// Release the transport. Calling this more than once is a no-op.
    pub async fn disconnect(&mut self) -> crate::Result<()> {
        match self.transport.take() {
            Some(mut transport) => {
                log::debug!("Closing {}", self.address);
                transport.close().await
            }
            None => Ok(()),
        }
    }
}

impl Display for Instrument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Common commands of all instruments, provided on top of the [`Instrument`] a driver owns.
#[async_trait]
pub trait Scpi: Send {
    fn instrument(&mut self) -> &mut Instrument;

    /// `*IDN?`, the reply is returned as-is.
    async fn identity(&mut self) -> crate::Result<String> {
        self.instrument().query_string("*IDN?").await
    }

    async fn identification(&mut self) -> crate::Result<Identity> {
        let reply = self.identity().await?;
        Identity::parse(&reply)
    }

    /// `*OPC?` returns "1" once all previously sent commands have completed.
    async fn operation_complete(&mut self) -> crate::Result<String> {
        self.instrument().query_string("*OPC?").await
    }

    /// Query the standard event status register.
    async fn event_status_register(&mut self) -> crate::Result<String> {
        self.instrument().query_string("*ESR?").await
    }

    /// Reset the instrument to its power-on state.
    async fn reset(&mut self) -> crate::Result<()> {
        self.instrument().write("*RST").await
    }

    /// Make the instrument finish all pending operations before executing further commands.
    async fn wait(&mut self) -> crate::Result<()> {
        self.instrument().write("*WAI").await
    }

    /// Bus trigger, effective if the trigger source is `BUS`.
    async fn trigger(&mut self) -> crate::Result<()> {
        self.instrument().write("*TRG").await
    }

    /// Clear the event registers and the status byte.
    async fn clear(&mut self) -> crate::Result<()> {
        self.instrument().write("*CLS").await
    }

    /// Run the complete self-test, "0" means passed.
    async fn self_test(&mut self) -> crate::Result<String> {
        self.instrument().query_string("*TST?").await
    }

    async fn custom_query(&mut self, query: &str) -> crate::Result<String> {
        self.instrument().query_string(query).await
    }

    async fn custom_write(&mut self, write: &str) -> crate::Result<()> {
        self.instrument().write(write).await
    }

    async fn request(&mut self, req: ScpiRequest) -> crate::Result<ScpiResponse> {
        self.instrument().handle(req).await
    }

    async fn close(&mut self) -> crate::Result<()> {
        self.instrument().disconnect().await
    }
}

impl Scpi for Instrument {
    fn instrument(&mut self) -> &mut Instrument {
        self
    }
}

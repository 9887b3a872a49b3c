//! This module implements the protocol for the Prologix USB to GPIB dongle.
//! http://prologix.biz/gpib-usb-controller.html
//!
//! The controller is configured to never append termination characters (`++eos 3`) and to only
//! address the instrument to talk on `++read eoi`. Every request selects the GPIB address first,
//! so several controllers on different ports may be used side by side.
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::transport::serial::SerialParams;
use crate::transport::{ScpiStream, Transport};
use crate::Error;

const ESC: u8 = 0x1B;

/// The baud rate is ignored by the USB controller, any setting works.
pub fn serial_params() -> SerialParams {
    SerialParams::default()
}

pub struct Prologix<S> {
    stream: ScpiStream<S>,
    gpib_addr: u8,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Prologix<S> {
    pub async fn init(mut stream: ScpiStream<S>, gpib_addr: u8) -> crate::Result<Self> {
        log::debug!("Configuring Prologix controller for GPIB address {}", gpib_addr);
        stream.discard_pending().await?;
        stream.write_line("++savecfg 0").await?;
        stream.write_line("++auto 0").await?;
        // we manually append termination chars
        stream.write_line("++eos 3").await?;
        Ok(Self { stream, gpib_addr })
    }

    pub fn gpib_addr(&self) -> u8 {
        self.gpib_addr
    }

    async fn select(&mut self) -> crate::Result<()> {
        let addr_set = format!("++addr {}", self.gpib_addr);
        self.stream.write_line(&addr_set).await
    }
}

/// Characters which the controller would interpret itself must be escaped to reach the instrument.
fn escape(msg: &str) -> Vec<u8> {
    let body = msg.strip_suffix('\n').unwrap_or(msg).as_bytes();
    let mut ret = Vec::with_capacity(body.len() + 1);
    for x in body {
        if matches!(*x, ESC | b'+' | b'\r' | b'\n') {
            ret.push(ESC);
        }
        ret.push(*x);
    }
    ret.push(b'\n');
    ret
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Transport for Prologix<S> {
    async fn write(&mut self, msg: &str) -> crate::Result<()> {
        self.stream.discard_pending().await?;
        self.select().await?;
        self.stream.write_raw(&escape(msg)).await
    }

    async fn read_string(&mut self) -> crate::Result<String> {
        self.select().await?;
        self.stream.write_line("++read eoi").await?;
        self.stream.read_string().await
    }

    async fn read_binary(&mut self) -> crate::Result<Vec<u8>> {
        log::error!("Binary reads are not implemented for Prologix.");
        Err(Error::NotSupported)
    }

    async fn close(&mut self) -> crate::Result<()> {
        self.stream.close().await
    }
}

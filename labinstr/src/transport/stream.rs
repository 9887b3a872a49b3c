//! Line oriented SCPI framing on top of any byte stream (TCP sockets, serial ports).
//!
//! Commands are terminated with `\n`. Replies end with `\n`, an optional `\r` before it is
//! dropped. Binary replies are IEEE 488.2 blocks (`#<n><length><data>`).
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use labinstr_protocol::scpi::parse_block_header;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf,
};
use tokio::time;

use crate::transport::Transport;
use crate::Error;

const TERMINATOR: u8 = b'\n';

pub struct ScpiStream<S> {
    inner: BufReader<S>,
    timeout: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> ScpiStream<S> {
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            inner: BufReader::new(stream),
            timeout,
        }
    }

    /// Drop whatever the instrument sent without being asked, e.g. the late reply to a query
    /// which timed out.
    pub async fn discard_pending(&mut self) -> crate::Result<()> {
        let stale = ReadAvailable {
            inner: &mut self.inner,
        }
        .await
        .map_err(Error::transport)?;
        if !stale.is_empty() {
            log::debug!("Discarding stale input: {:?}", decode_latin1(&stale));
        }
        Ok(())
    }

    /// Write one line, the terminator is appended if missing. Pending input is kept.
    pub async fn write_line(&mut self, msg: &str) -> crate::Result<()> {
        let mut data = msg.as_bytes().to_vec();
        if data.last() != Some(&TERMINATOR) {
            data.push(TERMINATOR);
        }
        self.write_raw(&data).await
    }

    /// Write the bytes as-is, without appending a terminator.
    pub async fn write_raw(&mut self, data: &[u8]) -> crate::Result<()> {
        let timeout = self.timeout;
        let inner = &mut self.inner;
        with_timeout(timeout, async move {
            inner.write_all(data).await?;
            inner.flush().await
        })
        .await
    }

    async fn read_line(&mut self) -> crate::Result<Vec<u8>> {
        let timeout = self.timeout;
        let inner = &mut self.inner;
        with_timeout(timeout, async move {
            let mut ret = Vec::new();
            let n = inner.read_until(TERMINATOR, &mut ret).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Connection closed by instrument",
                ));
            }
            Ok::<_, io::Error>(ret)
        })
        .await
    }

    async fn read_block(&mut self) -> crate::Result<Vec<u8>> {
        let timeout = self.timeout;
        let inner = &mut self.inner;
        let ret = time::timeout(timeout, async move {
            // only whitespace may precede the block start
            loop {
                let x = inner.read_u8().await.map_err(Error::transport)?;
                if x == b'#' {
                    break;
                }
                if !x.is_ascii_whitespace() {
                    // consume the rest of this reply, it is not a block
                    let mut rest = Vec::new();
                    inner
                        .read_until(TERMINATOR, &mut rest)
                        .await
                        .map_err(Error::transport)?;
                    return Err(Error::invalid_binary_header());
                }
            }
            let mut header = vec![b'#', inner.read_u8().await.map_err(Error::transport)?];
            let digits = (header[1] as char)
                .to_digit(10)
                .ok_or_else(Error::invalid_binary_header)? as usize;
            let mut length = vec![0_u8; digits];
            inner
                .read_exact(&mut length)
                .await
                .map_err(Error::transport)?;
            header.extend_from_slice(&length);
            let (_, data_length) = parse_block_header(&header)?;
            let mut data = Vec::new();
            match data_length {
                Some(data_length) => {
                    // grows with the data actually received, not with the announced length
                    (&mut *inner)
                        .take(data_length as u64)
                        .read_to_end(&mut data)
                        .await
                        .map_err(Error::transport)?;
                    if data.len() != data_length {
                        return Err(Error::transport(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "Binary block truncated",
                        )));
                    }
                    // consume the message terminator
                    let mut rest = Vec::new();
                    inner
                        .read_until(TERMINATOR, &mut rest)
                        .await
                        .map_err(Error::transport)?;
                }
                None => {
                    inner
                        .read_until(TERMINATOR, &mut data)
                        .await
                        .map_err(Error::transport)?;
                    strip_terminator(&mut data);
                }
            }
            Ok::<_, Error>(data)
        })
        .await;
        match ret {
            Ok(x) => x,
            Err(_) => Err(Error::protocol_timeout()),
        }
    }
}

/// Resolves to everything that can be read without waiting, including buffered data.
struct ReadAvailable<'a, T: AsyncRead + Unpin> {
    inner: &'a mut T,
}

impl<'a, T: AsyncRead + Unpin> Future for ReadAvailable<'a, T> {
    type Output = io::Result<Vec<u8>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut ret = Vec::new();
        loop {
            let mut buf_data = [0_u8; 1024];
            let mut buf = ReadBuf::new(&mut buf_data);
            match Pin::new(&mut *self.inner).poll_read(cx, &mut buf) {
                Poll::Ready(Ok(())) => {
                    if buf.filled().is_empty() {
                        // end of stream, surfaces on the next read
                        return Poll::Ready(Ok(ret));
                    }
                    ret.extend_from_slice(buf.filled());
                }
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                Poll::Pending => return Poll::Ready(Ok(ret)),
            }
        }
    }
}

async fn with_timeout<T, F>(timeout: Duration, fut: F) -> crate::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match time::timeout(timeout, fut).await {
        Ok(Ok(x)) => Ok(x),
        Ok(Err(x)) => Err(Error::transport(x)),
        Err(_) => Err(Error::protocol_timeout()),
    }
}

fn strip_terminator(data: &mut Vec<u8>) {
    if data.last() == Some(&b'\n') {
        data.pop();
    }
    if data.last() == Some(&b'\r') {
        data.pop();
    }
}

/// Replies are latin-1, every byte maps to exactly one char.
pub fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|x| *x as char).collect()
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Transport for ScpiStream<S> {
    async fn write(&mut self, msg: &str) -> crate::Result<()> {
        self.discard_pending().await?;
        self.write_line(msg).await
    }

    async fn read_string(&mut self) -> crate::Result<String> {
        let mut line = self.read_line().await?;
        strip_terminator(&mut line);
        Ok(decode_latin1(&line))
    }

    async fn read_binary(&mut self) -> crate::Result<Vec<u8>> {
        self.read_block().await
    }

    async fn close(&mut self) -> crate::Result<()> {
        let timeout = self.timeout;
        let inner = &mut self.inner;
        with_timeout(timeout, async move { inner.shutdown().await }).await
    }
}

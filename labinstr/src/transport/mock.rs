//! An in-memory stand-in for an instrument.
//!
//! The mock records every command written to it and answers reads from a queue of scripted
//! replies. It is cheap to clone and all clones share their state, so a test may keep one
//! handle while a driver owns the other:
//!
//! ```
//! # use labinstr::transport::MockTransport;
//! # use labinstr::{Agilent34401A, Instrument};
//! # tokio_test_block_on(async {
//! let mock = MockTransport::new();
//! mock.push_reply("+1.00000000E+00");
//! let mut dmm = Agilent34401A::new(Instrument::with_transport("mock", mock.clone()));
//! assert_eq!(dmm.voltage_measurement("dc").await.unwrap(), 1.0);
//! assert_eq!(mock.written(), vec!["MEASure:VOLTage:DC? DEF,DEF"]);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::transport::Transport;
use crate::Error;

enum Reply {
    String(String),
    Binary(Vec<u8>),
    Error(Error),
}

#[derive(Default)]
struct State {
    written: Vec<String>,
    replies: VecDeque<Reply>,
    closed: bool,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|x| x.into_inner())
    }

    /// Queue a reply for the next read.
    pub fn push_reply<T: Into<String>>(&self, reply: T) {
        self.state().replies.push_back(Reply::String(reply.into()));
    }

    pub fn push_binary(&self, data: Vec<u8>) {
        self.state().replies.push_back(Reply::Binary(data));
    }

    /// Let the next read fail with the given error.
    pub fn push_error(&self, err: Error) {
        self.state().replies.push_back(Reply::Error(err));
    }

    /// All commands written so far, without terminators.
    pub fn written(&self) -> Vec<String> {
        self.state().written.clone()
    }

    pub fn last_written(&self) -> Option<String> {
        self.state().written.last().cloned()
    }

    pub fn pending_replies(&self) -> usize {
        self.state().replies.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn next_reply(&self) -> crate::Result<Reply> {
        let mut state = self.state();
        if state.closed {
            return Err(Error::Disconnected);
        }
        // a silent instrument eventually times out
        state.replies.pop_front().ok_or_else(Error::protocol_timeout)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, msg: &str) -> crate::Result<()> {
        let mut state = self.state();
        if state.closed {
            return Err(Error::Disconnected);
        }
        let msg = msg.strip_suffix('\n').unwrap_or(msg);
        state.written.push(msg.to_string());
        Ok(())
    }

    async fn read_string(&mut self) -> crate::Result<String> {
        match self.next_reply()? {
            Reply::String(x) => Ok(x),
            Reply::Binary(_) => Err(Error::unexpected_response("<binary block>")),
            Reply::Error(err) => Err(err),
        }
    }

    async fn read_binary(&mut self) -> crate::Result<Vec<u8>> {
        match self.next_reply()? {
            Reply::Binary(x) => Ok(x),
            Reply::String(_) => Err(Error::invalid_binary_header()),
            Reply::Error(err) => Err(err),
        }
    }

    async fn close(&mut self) -> crate::Result<()> {
        self.state().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labinstr_protocol::ProtocolError;

    #[tokio::test]
    async fn scripted_conversation() {
        let mock = MockTransport::new();
        let mut transport = mock.clone();
        mock.push_reply("1");
        mock.push_binary(vec![1, 2, 3]);

        assert_eq!(transport.query_string("*OPC?\n").await.unwrap(), "1");
        assert_eq!(
            transport.query_binary("DATA?").await.unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(mock.written(), vec!["*OPC?", "DATA?"]);
        assert_eq!(mock.pending_replies(), 0);

        let err = transport.read_string().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Timeout)));
    }

    #[tokio::test]
    async fn closed() {
        let mock = MockTransport::new();
        let mut transport = mock.clone();
        transport.close().await.unwrap();
        assert!(mock.is_closed());
        assert!(matches!(
            transport.write("*RST").await,
            Err(Error::Disconnected)
        ));
    }
}

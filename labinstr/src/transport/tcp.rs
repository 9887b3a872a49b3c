//! Raw SCPI sockets, as served by most LAN enabled instruments on port 5025.
use std::io;

use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use crate::transport::{ScpiStream, TransportOptions};
use crate::Error;

pub type TcpTransport = ScpiStream<TcpStream>;

pub async fn connect(host: &str, port: u16, options: &TransportOptions) -> crate::Result<TcpTransport> {
    let stream = connect_tcp_stream(host, port, options.connection_timeout).await?;
    stream.set_nodelay(true).map_err(Error::transport)?;
    log::debug!("Connected to {}:{}", host, port);
    Ok(ScpiStream::new(stream, options.timeout))
}

async fn connect_tcp_stream(host: &str, port: u16, connection_timeout: Duration) -> crate::Result<TcpStream> {
    let fut = async move { TcpStream::connect((host, port)).await.map_err(Error::transport) };
    match timeout(connection_timeout, fut).await {
        Ok(Ok(x)) => Ok(x),
        Ok(Err(x)) => Err(x),
        Err(_) => Err(crate::Error::transport(io::Error::new(
            io::ErrorKind::TimedOut,
            "Connection timed out",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Transport;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn query_over_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut socket = BufReader::new(socket);
            let mut line = String::new();
            socket.read_line(&mut line).await.unwrap();
            assert_eq!(line, "*IDN?\n");
            socket
                .get_mut()
                .write_all(b"Agilent Technologies,E3640A,0,1.4-5.0-1.0\n")
                .await
                .unwrap();
        });

        let mut transport = connect("127.0.0.1", port, &TransportOptions::default())
            .await
            .unwrap();
        let reply = transport.query_string("*IDN?").await.unwrap();
        assert_eq!(reply, "Agilent Technologies,E3640A,0,1.4-5.0-1.0");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let err = connect("127.0.0.1", port, &TransportOptions::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Transport(_)));
    }
}

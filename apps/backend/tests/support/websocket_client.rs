// WebSocket client utilities for testing

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// WebSocket test client
pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    /// Connect, retrying until the server accepts or `timeout` passes.
    pub async fn connect_retry(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => return Ok(Self { stream }),
                Err(err) => {
                    if start.elapsed() >= timeout {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    /// Connect and complete the hello handshake. Returns the client and the
    /// connection id the server assigned.
    pub async fn connect_ready(
        url: &str,
        timeout: Duration,
    ) -> Result<(Self, String), Box<dyn std::error::Error>> {
        let mut client = Self::connect_retry(url, timeout).await?;
        client.send_json(&json!({"type": "hello", "protocol": 1})).await?;
        let ack = client.expect_type("hello_ack", timeout).await?;
        let conn_id = ack["connection_id"]
            .as_str()
            .ok_or("hello_ack without connection_id")?
            .to_string();
        Ok((client, conn_id))
    }

    /// Receive the next message with a timeout
    pub async fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Message>, Box<dyn std::error::Error>> {
        tokio::time::timeout(timeout, self.stream.next())
            .await
            .map_err(|_| "Timeout waiting for message")?
            .transpose()
            .map_err(|e| e.into())
    }

    pub async fn send(&mut self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&value.to_string()).await
    }

    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.send(Message::Binary(bytes.into())).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }

    /// Next text frame as JSON, skipping pings. `None` on close.
    pub async fn recv_json_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        loop {
            match self.recv_timeout(timeout).await? {
                Some(Message::Text(text)) => {
                    let json: Value = serde_json::from_str(&text)?;
                    return Ok(Some(json));
                }
                Some(Message::Ping(_)) | Some(Message::Pong(_)) => continue,
                Some(Message::Close(_)) | None => return Ok(None),
                Some(_) => continue,
            }
        }
    }

    /// Next JSON frame of any type. Errors if the socket closes first.
    pub async fn expect_any(&mut self, timeout: Duration) -> Result<Value, Box<dyn std::error::Error>> {
        self.recv_json_timeout(timeout)
            .await?
            .ok_or_else(|| "connection closed while waiting for a frame".into())
    }

    /// Next JSON frame, which must have the given `type`.
    pub async fn expect_type(
        &mut self,
        expected: &str,
        timeout: Duration,
    ) -> Result<Value, Box<dyn std::error::Error>> {
        let frame = self
            .recv_json_timeout(timeout)
            .await?
            .ok_or_else(|| format!("connection closed while waiting for {expected}"))?;
        if frame["type"] != expected {
            return Err(format!("expected {expected}, got {frame}").into());
        }
        Ok(frame)
    }

    /// True once the server closes the socket within `timeout`.
    pub async fn closed_within(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.stream.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }
}

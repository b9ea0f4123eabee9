// SPDX-FileCopyrightText: 2026 Diagrammer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal line-delimited JSON-RPC client for driving an MCP server over
//! an in-memory stream.
//!
//! Requests can be sent without waiting for their response, so tests can
//! observe the order in which the server answers.

use std::io;

use serde_json::{Value, json};
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

/// Protocol version announced in `initialize`.
pub const CLIENT_PROTOCOL_VERSION: &str = "2025-03-26";

/// The client half of a stdio-style MCP session.
pub struct McpTestClient {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl McpTestClient {
    /// Wraps the client end of a duplex pipe. No messages are exchanged.
    pub fn new(stream: DuplexStream) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Runs the `initialize` request and `notifications/initialized`.
    /// Returns the initialize result.
    pub async fn initialize(&mut self) -> io::Result<Value> {
        let params = json!({
            "protocolVersion": CLIENT_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "diagrammer-tests", "version": "0.0.0" },
        });
        let response = self.request(0, "initialize", params).await?;
        self.notify("notifications/initialized").await?;
        Ok(response)
    }

    /// Sends a request and waits for the response with the same id.
    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> io::Result<Value> {
        self.send(id, method, params).await?;
        loop {
            let message = self.next_message().await?;
            if message["id"] == id {
                return Ok(message);
            }
        }
    }

    /// Sends a request without waiting for its response.
    pub async fn send(&mut self, id: u64, method: &str, params: Value) -> io::Result<()> {
        self.write(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await
    }

    pub async fn notify(&mut self, method: &str) -> io::Result<()> {
        self.write(json!({ "jsonrpc": "2.0", "method": method })).await
    }

    /// Reads the next response, skipping server notifications.
    pub async fn next_message(&mut self) -> io::Result<Value> {
        loop {
            let line = self
                .lines
                .next_line()
                .await?
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "server closed"))?;
            if line.trim().is_empty() {
                continue;
            }
            let message: Value = serde_json::from_str(&line)?;
            if message.get("id").is_some() {
                return Ok(message);
            }
        }
    }

    async fn write(&mut self, message: Value) -> io::Result<()> {
        let mut bytes = serde_json::to_vec(&message)?;
        bytes.push(b'\n');
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await
    }
}

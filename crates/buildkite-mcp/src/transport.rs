//! Transport layer for MCP JSON-RPC communication.
//!
//! MCP uses newline-delimited JSON over stdin/stdout. Stdout carries nothing
//! but protocol messages; logs go to stderr.

use std::io::{self, BufRead, Write};

use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Message that can be received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Transport for reading/writing JSON-RPC messages.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Create a transport with custom reader/writer.
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { reader, writer }
    }

    /// Read the next JSON-RPC message.
    ///
    /// Blank lines are skipped. Returns `Ok(None)` at EOF.
    pub fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let line = line.trim();
        debug!(message = line, "Received");
        parse_message(line).map(Some)
    }

    /// Write a JSON-RPC response to the transport.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Serialization error: {}", e))
        })?;

        debug!(message = %json, "Sending");

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}

/// Classify a line as request (has `id`) or notification.
fn parse_message(line: &str) -> io::Result<IncomingMessage> {
    let invalid = |detail: String| {
        warn!(message = line, "Failed to parse message");
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid JSON-RPC message: {}", detail),
        )
    };

    let value: Value = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;

    if value.get("id").is_some() {
        serde_json::from_value(value)
            .map(IncomingMessage::Request)
            .map_err(|e| invalid(e.to_string()))
    } else {
        serde_json::from_value(value)
            .map(IncomingMessage::Notification)
            .map_err(|e| invalid(e.to_string()))
    }
}

//! stdio transport for JSON-RPC 2.0 over NDJSON.
//!
//! Reads requests line by line from stdin and writes responses to stdout.
//! Logging must go to stderr; stdout carries only protocol frames.

use crate::error::McpResult;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Stdio transport for the MCP protocol.
pub struct StdioTransport {
    reader: BufReader<io::Stdin>,
    writer: io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(io::stdin()),
            writer: io::stdout(),
        }
    }

    /// Next non-empty line from stdin, or `None` on EOF.
    pub async fn read_line(&mut self) -> McpResult<Option<String>> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line).await? {
                0 => return Ok(None), // EOF
                _ => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        return Ok(Some(trimmed.to_string()));
                    }
                    // Blank line between frames, keep reading
                }
            }
        }
    }

    /// Write one frame to stdout, newline-terminated and flushed.
    pub async fn write_line(&mut self, line: &str) -> McpResult<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

use crate::error::OllamaApiError;
use crate::events::GenerateChunk;

/// Incremental parser for newline-delimited JSON streams.
///
/// Bytes are buffered until a full line is available, so multi-byte UTF-8
/// sequences split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct NdjsonStreamParser {
    buffer: Vec<u8>,
}

impl NdjsonStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete lines.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>, OllamaApiError> {
        self.buffer.extend_from_slice(bytes);
        let mut chunks = Vec::new();

        while let Some(split) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=split).collect();
            if let Some(chunk) = parse_line(&line[..line.len() - 1])? {
                chunks.push(chunk);
            }
        }

        Ok(chunks)
    }

    /// Parse whatever remains once the byte stream has ended.
    pub fn finish(&mut self) -> Result<Option<GenerateChunk>, OllamaApiError> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }

    /// Parse a complete NDJSON payload in one shot.
    pub fn parse_lines(input: &str) -> Result<Vec<GenerateChunk>, OllamaApiError> {
        let mut parser = Self::default();
        let mut chunks = parser.feed(input.as_bytes())?;
        chunks.extend(parser.finish()?);
        Ok(chunks)
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn parse_line(line: &[u8]) -> Result<Option<GenerateChunk>, OllamaApiError> {
    let text = std::str::from_utf8(line)
        .map_err(|error| OllamaApiError::MalformedChunk(format!("invalid UTF-8: {error}")))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<GenerateChunk>(text)
        .map(Some)
        .map_err(|error| OllamaApiError::MalformedChunk(format!("{error}: {text}")))
}

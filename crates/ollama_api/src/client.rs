use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::OllamaApiConfig;
use crate::error::{parse_error_message, OllamaApiError};
use crate::events::GenerateChunk;
use crate::headers::build_headers;
use crate::ndjson::NdjsonStreamParser;
use crate::payload::GeneratePayload;
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::url::normalize_generate_url;

#[derive(Debug)]
pub struct OllamaApiClient {
    http: Client,
    config: OllamaApiConfig,
}

/// Accumulated outcome of one streamed generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    pub text: String,
    pub model: String,
    pub done_reason: Option<String>,
    pub chunk_count: usize,
}

impl OllamaApiClient {
    pub fn new(config: OllamaApiConfig) -> Result<Self, OllamaApiError> {
        if config.model.trim().is_empty() {
            return Err(OllamaApiError::MissingModel);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OllamaApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OllamaApiConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        normalize_generate_url(&self.config.base_url)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, OllamaApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| OllamaApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    OllamaApiError::InvalidHeader(format!("invalid value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &GeneratePayload,
    ) -> Result<reqwest::RequestBuilder, OllamaApiError> {
        let headers = self.build_headers()?;
        let payload = self.payload_with_transport_defaults(request);
        Ok(self.http.post(self.endpoint()).headers(headers).json(&payload))
    }

    fn payload_with_transport_defaults(&self, request: &GeneratePayload) -> GeneratePayload {
        let mut payload = request.clone();
        payload.stream = true;
        if payload.model.trim().is_empty() {
            payload.model = self.config.model.trim().to_string();
        }
        if payload.keep_alive.is_none() {
            payload.keep_alive = self.config.keep_alive.clone();
        }
        if payload
            .system
            .as_deref()
            .is_some_and(|system| system.trim().is_empty())
        {
            payload.system = None;
        }
        payload
    }

    pub async fn send_with_retry(
        &self,
        request: &GeneratePayload,
    ) -> Result<Response, OllamaApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            let response = self.build_request(request)?.send().await?;
            if response.status().is_success() {
                return Ok(response);
            }

            let status = response.status();
            last_status = Some(status);
            let body = response.text().await.unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            let message = parse_error_message(status, &body);
            last_error = Some(message.clone());

            if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &body) {
                let delay = retry_delay_ms(attempt);
                warn!(%status, attempt, ?delay, "retrying generate request");
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(OllamaApiError::Status(status, message));
        }

        Err(OllamaApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// Streams one generate call, handing every chunk to `on_chunk` in order.
    pub async fn stream_with_handler<F>(
        &self,
        request: &GeneratePayload,
        mut on_chunk: F,
    ) -> Result<GenerateResult, OllamaApiError>
    where
        F: FnMut(&GenerateChunk),
    {
        let response = self.send_with_retry(request).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = NdjsonStreamParser::default();
        let mut accumulator = StreamAccumulator::default();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for parsed in parser.feed(&chunk)? {
                accumulator.push(parsed, &mut on_chunk)?;
            }
        }
        if let Some(parsed) = parser.finish()? {
            accumulator.push(parsed, &mut on_chunk)?;
        }

        let result = accumulator.finish()?;
        debug!(
            model = %result.model,
            chunks = result.chunk_count,
            chars = result.text.len(),
            "generate stream completed"
        );
        Ok(result)
    }

    pub async fn generate(
        &self,
        request: &GeneratePayload,
    ) -> Result<GenerateResult, OllamaApiError> {
        self.stream_with_handler(request, |_| {}).await
    }
}

#[derive(Debug, Default)]
struct StreamAccumulator {
    text: String,
    model: String,
    done_reason: Option<String>,
    chunk_count: usize,
    done: bool,
}

impl StreamAccumulator {
    fn push<F>(&mut self, chunk: GenerateChunk, on_chunk: &mut F) -> Result<(), OllamaApiError>
    where
        F: FnMut(&GenerateChunk),
    {
        if let Some(error) = chunk.error.as_deref() {
            return Err(OllamaApiError::StreamFailed(error.to_string()));
        }
        if self.done {
            return Ok(());
        }

        on_chunk(&chunk);
        self.chunk_count += 1;
        self.text.push_str(&chunk.response);
        if !chunk.model.is_empty() {
            self.model = chunk.model;
        }
        if chunk.done {
            self.done = true;
            self.done_reason = chunk.done_reason;
        }
        Ok(())
    }

    fn finish(self) -> Result<GenerateResult, OllamaApiError> {
        if !self.done {
            return Err(OllamaApiError::IncompleteStream);
        }

        Ok(GenerateResult {
            text: self.text,
            model: self.model,
            done_reason: self.done_reason,
            chunk_count: self.chunk_count,
        })
    }
}

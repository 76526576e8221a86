use ollama_api::{GenerateChunk, NdjsonStreamParser, OllamaApiError};

#[test]
fn ndjson_parses_complete_lines_and_skips_blank_ones() {
    let chunks = NdjsonStreamParser::parse_lines(concat!(
        "{\"model\":\"m\",\"response\":\"a\",\"done\":false}\n",
        "\n",
        "{\"model\":\"m\",\"response\":\"b\",\"done\":true,\"done_reason\":\"stop\",\"eval_count\":12}\n",
    ))
    .expect("valid stream");

    assert_eq!(
        chunks,
        vec![
            GenerateChunk {
                model: "m".to_string(),
                response: "a".to_string(),
                done: false,
                done_reason: None,
                error: None,
            },
            GenerateChunk {
                model: "m".to_string(),
                response: "b".to_string(),
                done: true,
                done_reason: Some("stop".to_string()),
                error: None,
            },
        ]
    );
}

#[test]
fn ndjson_buffers_partial_lines_between_feeds() {
    let mut parser = NdjsonStreamParser::default();

    let first = parser
        .feed(b"{\"response\":\"hel")
        .expect("partial line is buffered");
    assert!(first.is_empty());
    assert!(!parser.is_empty_buffer());

    let second = parser
        .feed(b"lo\",\"done\":false}\n")
        .expect("line completes");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].response, "hello");
    assert!(parser.is_empty_buffer());
}

#[test]
fn ndjson_finish_parses_trailing_line_without_newline() {
    let mut parser = NdjsonStreamParser::default();
    assert!(parser
        .feed(b"{\"response\":\"\",\"done\":true}")
        .expect("buffered")
        .is_empty());

    let last = parser.finish().expect("trailing line").expect("chunk");
    assert!(last.done);
    assert!(last.is_terminal());
}

#[test]
fn ndjson_rejects_non_json_lines() {
    let error = NdjsonStreamParser::parse_lines("<html>proxy error</html>\n")
        .expect_err("html is not ndjson");

    assert!(matches!(error, OllamaApiError::MalformedChunk(_)));
}

#[test]
fn ndjson_error_line_is_terminal() {
    let chunks = NdjsonStreamParser::parse_lines("{\"error\":\"out of memory\"}\n")
        .expect("error line is valid json");

    assert_eq!(chunks[0].error.as_deref(), Some("out of memory"));
    assert!(chunks[0].is_terminal());
}

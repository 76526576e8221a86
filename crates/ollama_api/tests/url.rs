use ollama_api::normalize_generate_url;

#[test]
fn url_normalization_keeps_existing_generate_endpoint() {
    assert_eq!(
        normalize_generate_url("http://localhost:11434/api/generate"),
        "http://localhost:11434/api/generate"
    );
}

#[test]
fn url_normalization_appends_generate_to_api_base() {
    assert_eq!(
        normalize_generate_url("http://gpu-box:11434/api/"),
        "http://gpu-box:11434/api/generate"
    );
}

#[test]
fn url_normalization_appends_full_path_to_server_root() {
    assert_eq!(
        normalize_generate_url("http://127.0.0.1:11434"),
        "http://127.0.0.1:11434/api/generate"
    );
}

#[test]
fn url_normalization_defaults_blank_input_to_local_server() {
    assert_eq!(
        normalize_generate_url("   "),
        "http://localhost:11434/api/generate"
    );
}

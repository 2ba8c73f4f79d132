use serde_json::{Map, Value};

use crate::core::errors::ConfigError;

const EMBEDDING_PROVIDERS: [&str; 2] = ["gemini", "openai_compat"];
const INDEX_PROVIDERS: [&str; 2] = ["pinecone", "memory"];
const PROMPT_TEMPLATES: [&str; 2] = ["cardiologist", "educational"];
const SPLIT_MODES: [&str; 2] = ["whole", "paragraph"];

pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
        validate_u64_field(
            server,
            "server.max_upload_bytes",
            "max_upload_bytes",
            1,
            1_000_000_000,
        )?;
    }

    if let Some(http) = expect_optional_object(root, "http")? {
        validate_u64_field(
            http,
            "http.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_enum_field(
            embedding,
            "embedding.provider",
            "provider",
            &EMBEDDING_PROVIDERS,
        )?;
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_u64_field(embedding, "embedding.dimension", "dimension", 1, 20_000)?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_optional_string_field(generation, "generation.model", "model")?;
        validate_optional_string_field(generation, "generation.base_url", "base_url")?;
    }

    if let Some(index) = expect_optional_object(root, "index")? {
        validate_enum_field(index, "index.provider", "provider", &INDEX_PROVIDERS)?;
        validate_non_empty_string_field(index, "index.name", "name")?;
        validate_optional_string_field(index, "index.cloud", "cloud")?;
        validate_optional_string_field(index, "index.region", "region")?;
        validate_optional_string_field(index, "index.controller_url", "controller_url")?;
        validate_bool_field(index, "index.ensure_on_startup", "ensure_on_startup")?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
    }

    if let Some(prompt) = expect_optional_object(root, "prompt")? {
        validate_enum_field(prompt, "prompt.template", "template", &PROMPT_TEMPLATES)?;
        validate_template_field(prompt, "prompt.custom_template", "custom_template")?;
    }

    if let Some(ingest) = expect_optional_object(root, "ingest")? {
        validate_optional_string_field(ingest, "ingest.corpus_path", "corpus_path")?;
        validate_enum_field(ingest, "ingest.split", "split", &SPLIT_MODES)?;
        validate_u64_field(ingest, "ingest.batch_size", "batch_size", 1, 1_000)?;
        validate_u64_field(
            ingest,
            "ingest.batch_interval_ms",
            "batch_interval_ms",
            0,
            600_000,
        )?;
        validate_u64_field(ingest, "ingest.ready_poll_ms", "ready_poll_ms", 1, 60_000)?;
        validate_u64_field(
            ingest,
            "ingest.ready_timeout_secs",
            "ready_timeout_secs",
            1,
            86_400,
        )?;

        if let Some(retry) = expect_optional_object(ingest, "retry")? {
            validate_u64_field(retry, "ingest.retry.max_attempts", "max_attempts", 1, 20)?;
            validate_u64_field(
                retry,
                "ingest.retry.initial_backoff_ms",
                "initial_backoff_ms",
                0,
                600_000,
            )?;
            validate_u64_field(
                retry,
                "ingest.retry.max_backoff_ms",
                "max_backoff_ms",
                0,
                3_600_000,
            )?;
            if let Some(value) = retry.get("multiplier") {
                match value.as_f64() {
                    Some(m) if m >= 1.0 => {}
                    Some(_) => {
                        return Err(invalid("ingest.retry.multiplier", "must be at least 1.0"))
                    }
                    None => return Err(config_type_error("ingest.retry.multiplier", "number")),
                }
            }
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(invalid(
            path,
            &format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(invalid(path, "value cannot be empty"));
    }
    Ok(())
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if allowed.contains(&text) {
        return Ok(());
    }
    Err(invalid(
        path,
        &format!("expected one of {}", allowed.join(", ")),
    ))
}

fn validate_template_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    for placeholder in ["{context}", "{question}"] {
        if !text.contains(placeholder) {
            return Err(invalid(
                path,
                &format!("template must contain {}", placeholder),
            ));
        }
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(invalid(
                &format!("{}[{}]", path, index),
                "value cannot be empty",
            ));
        }
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    invalid(path, &format!("expected {}", expected))
}

use crate::core::errors::ConfigError;

use super::settings::Settings;

const MAX_TOP_K_LIMIT: usize = 50;

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_u64_field("server.port", u64::from(settings.server.port), 1, 65_535)?;
    validate_non_empty("server.host", &settings.server.host)?;

    let chunking = &settings.chunking;
    validate_u64_field("chunking.window_size", chunking.window_size as u64, 1, 100_000)?;
    if chunking.overlap >= chunking.window_size {
        return Err(invalid(
            "chunking.overlap",
            format!(
                "must be smaller than chunking.window_size ({})",
                chunking.window_size
            ),
        ));
    }

    let retrieval = &settings.retrieval;
    validate_u64_field(
        "retrieval.max_top_k",
        retrieval.max_top_k as u64,
        1,
        MAX_TOP_K_LIMIT as u64,
    )?;
    validate_u64_field(
        "retrieval.default_top_k",
        retrieval.default_top_k as u64,
        1,
        retrieval.max_top_k as u64,
    )?;

    validate_u64_field("embedding.timeout_secs", settings.embedding.timeout_secs, 1, 3_600)?;
    validate_non_empty("embedding.ollama_host", &settings.embedding.ollama_host)?;
    validate_non_empty("embedding.ollama_model", &settings.embedding.ollama_model)?;

    let generation = &settings.generation;
    validate_u64_field("generation.timeout_secs", generation.timeout_secs, 1, 3_600)?;
    validate_u64_field(
        "generation.max_new_tokens",
        u64::from(generation.max_new_tokens),
        1,
        32_768,
    )?;
    if !(0.0..=2.0).contains(&generation.temperature) {
        return Err(invalid("generation.temperature", "must be between 0 and 2"));
    }
    validate_non_empty("generation.ollama_host", &generation.ollama_host)?;
    validate_non_empty("generation.ollama_model", &generation.ollama_model)?;

    validate_u64_field(
        "ingestion.store_warn_threshold",
        settings.ingestion.store_warn_threshold as u64,
        1,
        u64::MAX,
    )?;

    Ok(())
}

fn validate_u64_field(path: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(
            path,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn validate_non_empty(path: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(path, "value cannot be empty"));
    }
    Ok(())
}

fn invalid(path: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: path.to_string(),
        reason: reason.into(),
    }
}

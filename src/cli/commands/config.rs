//! Config Command
//!
//! Manage srsmith configuration.
//!
//! Usage:
//!   srsmith config show [-g] [-f toml|json|yaml]
//!   srsmith config path
//!   srsmith config init [-g] [--force]
//!   srsmith config check

use std::path::Path;

use crate::ai::provider::create_provider;
use crate::ai::rate_limiter::RateLimiter;
use crate::cli::ui::Output;
use crate::cli::util::load_config;
use crate::config::{Config, ConfigLoader};
use crate::types::{Result, SrsError};

/// Show configuration; `explicit` is the `--config` file, if given
pub fn show(global: bool, format: &str, explicit: Option<&Path>) -> Result<()> {
    let output = Output::new();

    if global {
        match ConfigLoader::global_config_path() {
            Some(global_path) if global_path.exists() => {
                let content = std::fs::read_to_string(&global_path)?;
                println!("# Global Config: {}\n", global_path.display());
                println!("{}", content);
            }
            Some(_) => {
                output.info("No global config found.");
                output.info("Run 'srsmith config init --global' to create one.");
            }
            None => output.warning("Cannot determine global config directory."),
        }
        return Ok(());
    }

    // Effective config
    let config = load_config(explicit)?;
    println!("{}", render(&config, format)?);
    if config.llm.api_key.is_some() {
        output.info("API key: configured");
    } else {
        output.warning("API key: not set (SRSMITH_API_KEY or OPENAI_API_KEY)");
    }
    Ok(())
}

/// Serialize in the requested format; the API key is never serialized
pub fn render(config: &Config, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(config)?),
        "yaml" => Ok(serde_yaml::to_string(config)?),
        "toml" | "text" => toml::to_string_pretty(config)
            .map_err(|e| SrsError::Config(format!("Failed to render config: {}", e))),
        other => Err(SrsError::Config(format!(
            "Invalid format '{}'. Valid values: toml, json, yaml",
            other
        ))),
    }
}

/// Show configuration paths
pub fn path() -> Result<()> {
    match ConfigLoader::global_config_path() {
        Some(path) => println!("Global:  {}", path.display()),
        None => println!("Global:  (unavailable)"),
    }
    println!("Project: {}", ConfigLoader::project_config_path().display());
    Ok(())
}

/// Verify the configured AI service accepts the API key
pub async fn check(explicit: Option<&Path>) -> Result<()> {
    let output = Output::new();
    let config = load_config(explicit)?;

    if config.llm.api_key.is_none() {
        return Err(SrsError::credential(
            "no API key configured (set SRSMITH_API_KEY or llm.api_key)",
        ));
    }

    let limiter = RateLimiter::from_config(&config.rate_limit).shared();
    let provider = create_provider(&config, limiter)?;
    if !provider.health_check().await? {
        return Err(SrsError::Config(format!(
            "AI service at {} is unreachable or rejected the API key",
            config.llm.api_base
        )));
    }

    output.success(&format!(
        "AI service reachable ({} via {})",
        provider.model(),
        config.llm.api_base
    ));
    Ok(())
}

/// Initialize global or project configuration
pub fn init(global: bool, force: bool) -> Result<()> {
    let output = Output::new();
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    output.success(&format!(
        "Initialized {} configuration",
        if global { "global" } else { "project" }
    ));
    println!("  Config:    {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_render_formats_hide_api_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-hidden".to_string());

        for format in ["toml", "json", "yaml"] {
            let rendered = render(&config, format).unwrap();
            assert!(rendered.contains("gpt-4o-mini"), "{format}");
            assert!(!rendered.contains("sk-hidden"), "{format}");
        }
    }

    #[test]
    fn test_render_rejects_unknown_format() {
        assert!(render(&Config::default(), "xml").is_err());
    }

    #[test]
    fn test_show_uses_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(&path, "[rate_limit]\nmax_requests = 0\n").unwrap();

        // An invalid explicit file must surface, not fall back to the layers
        let err = show(false, "toml", Some(&path)).unwrap_err();
        assert!(matches!(err, SrsError::Config(_)));
        assert!(show(false, "toml", Some(&temp_dir.path().join("missing.toml"))).is_err());
    }

    fn config_file(dir: &TempDir, api_base: &str, api_key: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!("[llm]\napi_base = \"{}\"\napi_key = \"{}\"\n", api_base, api_key),
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_check_reports_service_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("Authorization", "Bearer sk-good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new().unwrap();
        let good = config_file(&temp_dir, &server.uri(), "sk-good");
        assert!(check(Some(&good)).await.is_ok());

        let bad = config_file(&temp_dir, &server.uri(), "sk-bad");
        let err = check(Some(&bad)).await.unwrap_err();
        assert!(matches!(err, SrsError::Config(_)));
    }
}

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one concurrent run is allowed
/// - Image width is positive and fuzz is a percentage
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.pipeline.max_concurrent_runs == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_concurrent_runs must be at least 1".to_string(),
        ));
    }

    if config.render.image_width == 0 {
        return Err(ConfigError::ValidationError(
            "render.image_width cannot be 0".to_string(),
        ));
    }

    if !(0.0..=100.0).contains(&config.render.fuzz_percent) {
        return Err(ConfigError::ValidationError(format!(
            "render.fuzz_percent must be within 0..=100, got {}",
            config.render.fuzz_percent
        )));
    }

    if config.paths.workspace_root == config.paths.source_dir {
        return Err(ConfigError::ValidationError(
            "paths.workspace_root must differ from paths.source_dir".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_runs_fails() {
        let mut config = Config::default();
        config.pipeline.max_concurrent_runs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_fuzz_out_of_range_fails() {
        let mut config = Config::default();
        config.render.fuzz_percent = 140.0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("fuzz_percent"));
    }

    #[test]
    fn test_validate_workspace_equal_to_source_fails() {
        let mut config = Config::default();
        config.paths.workspace_root = config.paths.source_dir.clone();
        assert!(validate_config(&config).is_err());
    }
}

//! Tests for configuration management functionality
//!
//! Environment based tests use their own prefixes so they never touch the
//! variables read by `DEFAULT_PROVIDER`.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use crate::config::{
        CompositeConfigProvider, ConfigProvider, ConfigProviderExt, DiagnosticConfig, EnvConfigProvider,
        MemoryConfigProvider,
    };
    use crate::constants::{DEFAULT_LIBRARY, DIAGNOSTIC_ENDPOINT};
    use crate::diagnostic::Diagnostic;

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("diagnostic_server_url", "https://test.com");
        provider.set("diagnostic_flush_delay_ms", 1500);
        provider.set("diagnostic_disabled", "yes");

        assert_eq!(provider.get_string("diagnostic_server_url").unwrap(), "https://test.com");
        assert_eq!(provider.get_int("diagnostic_flush_delay_ms").unwrap(), 1500);
        assert!(provider.get_bool("diagnostic_disabled").unwrap());

        assert_eq!(provider.get_string_or("missing", "default"), "default");
        assert_eq!(provider.get_int_or("missing", 60), 60);
        assert!(!provider.get_bool_or("missing", false));

        assert!(provider.get_string("missing").is_err());
        assert!(provider.get_int("diagnostic_server_url").is_err());
    }

    #[test]
    fn test_env_config_provider() {
        env::set_var("TEST_DIAGENV_SERVER_URL", "https://env.example.com");
        env::set_var("TEST_DIAGENV_FLUSH_DELAY_MS", "250");

        let provider = EnvConfigProvider::new()
            .with_prefix("TEST")
            .with_namespace("DIAGENV");

        assert_eq!(provider.get_string("server_url").unwrap(), "https://env.example.com");
        assert_eq!(provider.get_int("flush-delay-ms").unwrap(), 250);
        assert!(provider.get_string("NON_EXISTENT").is_err());

        env::remove_var("TEST_DIAGENV_SERVER_URL");
        env::remove_var("TEST_DIAGENV_FLUSH_DELAY_MS");
    }

    #[test]
    fn test_composite_config_provider() {
        let mut memory_provider = MemoryConfigProvider::new();
        memory_provider.set("KEY1", "memory_value");
        memory_provider.set("COMMON", "memory_value");

        env::set_var("TEST_COMPOSITE_DIAG_KEY2", "env_value");
        env::set_var("TEST_COMPOSITE_DIAG_COMMON", "env_value");

        let env_provider = EnvConfigProvider::new()
            .with_prefix("TEST")
            .with_namespace("COMPOSITE_DIAG");

        let mut composite = CompositeConfigProvider::new();
        composite.add_provider(memory_provider);
        composite.add_provider(env_provider);

        assert_eq!(composite.get_string("KEY1").unwrap(), "memory_value");
        assert_eq!(composite.get_string("KEY2").unwrap(), "env_value");
        // earlier providers win
        assert_eq!(composite.get_string("COMMON").unwrap(), "memory_value");
        assert!(composite.get_string("NON_EXISTENT").is_err());

        env::remove_var("TEST_COMPOSITE_DIAG_KEY2");
        env::remove_var("TEST_COMPOSITE_DIAG_COMMON");
    }

    #[test]
    fn test_diagnostic_config_defaults() {
        let config = assert_ok!(DiagnosticConfig::from_provider(&MemoryConfigProvider::new()));

        assert_eq!(config, DiagnosticConfig::default());
        assert_eq!(config.server_url, DIAGNOSTIC_ENDPOINT);
        assert_eq!(config.library, DEFAULT_LIBRARY);
        assert_eq!(config.flush_delay(), Duration::from_secs(60));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.is_disabled);
    }

    #[test]
    fn test_diagnostic_config_from_provider() {
        let mut values = HashMap::new();
        values.insert("diagnostic_server_url".to_string(), "http://localhost:8080/diag".to_string());
        values.insert("diagnostic_library".to_string(), "diagnostic-test-library".to_string());
        values.insert("diagnostic_flush_delay_ms".to_string(), "1000".to_string());
        values.insert("diagnostic_disabled".to_string(), "true".to_string());
        values.insert("diagnostic_timeout_seconds".to_string(), "5".to_string());
        let provider = MemoryConfigProvider::with_values(values);

        let config = assert_ok!(DiagnosticConfig::from_provider(&provider));

        assert_eq!(config.server_url, "http://localhost:8080/diag");
        assert_eq!(config.library, "diagnostic-test-library");
        assert_eq!(config.flush_delay_ms, 1000);
        assert!(config.is_disabled);
        assert_eq!(config.timeout_seconds, 5);
    }

    #[test]
    fn test_diagnostic_config_validation() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("diagnostic_server_url", "ftp://collector.example.com");
        assert_err!(DiagnosticConfig::from_provider(&provider));

        let mut provider = MemoryConfigProvider::new();
        provider.set("diagnostic_flush_delay_ms", -5);
        assert_err!(DiagnosticConfig::from_provider(&provider));

        let mut provider = MemoryConfigProvider::new();
        provider.set("diagnostic_timeout_seconds", 0);
        assert_err!(DiagnosticConfig::from_provider(&provider));

        let config = DiagnosticConfig {
            library: String::new(),
            ..DiagnosticConfig::default()
        };
        assert_err!(config.validate());
    }

    #[test]
    fn test_builder_overrides_config() {
        let config = DiagnosticConfig {
            server_url: "https://configured.example.com".to_string(),
            library: "configured-library".to_string(),
            ..DiagnosticConfig::default()
        };

        let diagnostic = assert_ok!(Diagnostic::builder()
            .config(config)
            .server_url("https://override.example.com")
            .flush_delay(Duration::from_millis(1500))
            .without_transport()
            .build());

        assert_eq!(diagnostic.server_url(), "https://override.example.com");
        assert_eq!(diagnostic.library(), "configured-library");
        assert_eq!(diagnostic.flush_delay(), Duration::from_millis(1500));
    }
}

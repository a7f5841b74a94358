use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub pager: PagerConfig,
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagerConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Upper bound on OR-alternatives a where clause may expand into
    pub max_where_chains: usize,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_request_logging: bool,
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when RUST_LOG is unset
    pub filter: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Pager overrides
        if let Ok(v) = env::var("PAGER_DEFAULT_PAGE_SIZE") {
            self.pager.default_page_size = v.parse().unwrap_or(self.pager.default_page_size);
        }
        if let Ok(v) = env::var("PAGER_MAX_PAGE_SIZE") {
            self.pager.max_page_size = v.parse().unwrap_or(self.pager.max_page_size);
        }
        if let Ok(v) = env::var("PAGER_MAX_WHERE_CHAINS") {
            self.pager.max_where_chains = v.parse().unwrap_or(self.pager.max_where_chains);
        }
        if let Ok(v) = env::var("PAGER_DEBUG_LOGGING") {
            self.pager.debug_logging = v.parse().unwrap_or(self.pager.debug_logging);
        }

        // API overrides
        if let Ok(v) = env::var("API_HOST") {
            self.api.host = v;
        }
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_ENABLE_CORS") {
            self.api.enable_cors = v.parse().unwrap_or(self.api.enable_cors);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_SEED_DEMO_DATA") {
            self.store.seed_demo_data = v.parse().unwrap_or(self.store.seed_demo_data);
        }

        if let Ok(v) = env::var("LOG_FILTER") {
            self.logging.filter = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            pager: PagerConfig {
                default_page_size: 20,
                max_page_size: 1000,
                max_where_chains: 64,
                debug_logging: true,
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                enable_request_logging: true,
                enable_cors: true,
            },
            store: StoreConfig { seed_demo_data: true },
            logging: LoggingConfig {
                filter: "crud_api_rust=debug,tower_http=debug".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            pager: PagerConfig {
                default_page_size: 20,
                max_page_size: 500,
                max_where_chains: 32,
                debug_logging: false,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_request_logging: true,
                enable_cors: true,
            },
            store: StoreConfig { seed_demo_data: true },
            logging: LoggingConfig {
                filter: "crud_api_rust=info,tower_http=info".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            pager: PagerConfig {
                default_page_size: 20,
                max_page_size: 100,
                max_where_chains: 16,
                debug_logging: false,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_request_logging: false,
                enable_cors: false,
            },
            store: StoreConfig { seed_demo_data: false },
            logging: LoggingConfig {
                filter: "crud_api_rust=info".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.pager.max_page_size, 1000);
        assert!(config.store.seed_demo_data);
        assert!(config.api.enable_cors);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.pager.max_page_size, 100);
        assert!(!config.store.seed_demo_data);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn test_profiles_keep_default_page_size_under_max() {
        for env in [Environment::Development, Environment::Staging, Environment::Production] {
            let config = AppConfig::for_environment(env);
            assert!(config.pager.default_page_size <= config.pager.max_page_size);
        }
    }
}

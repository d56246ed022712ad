//! Load test configuration types, loaded from TOML

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use wsload_core::{HttpTransportOptions, RetryPolicy, WsloadError};
use wsload_journey::JourneyConfig;

/// Environment variable holding the bearer token
pub const AUTH_TOKEN_ENV: &str = "WSLOAD_AUTH_TOKEN";

/// Complete load test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestConfig {
    /// Target GraphQL endpoint
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Space id for the create-workspace call, before a journey owns a space
    #[serde(default = "default_bootstrap_space_id")]
    pub bootstrap_space_id: String,

    /// Prefix for generated workspace and table names
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Skip TLS certificate validation
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Open a fresh connection per request
    #[serde(default)]
    pub no_connection_reuse: bool,

    /// Timeout for a single request attempt, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pause after every journey step, in milliseconds
    #[serde(default = "default_step_pause_ms")]
    pub step_pause_ms: u64,

    /// Sleep a random sub-second interval before each iteration's first request
    #[serde(default = "default_true")]
    pub stagger_start: bool,

    /// Retry policy applied to every request
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Load profile
    #[serde(default)]
    pub profile: Profile,
}

fn default_target_url() -> String {
    "https://qa.fastn.ai/api/graphql".to_string()
}

fn default_bootstrap_space_id() -> String {
    "a51cac39-9893-493a-a492-1df612522bf0".to_string()
}

fn default_name_prefix() -> String {
    "wsload".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_step_pause_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            bootstrap_space_id: default_bootstrap_space_id(),
            name_prefix: default_name_prefix(),
            insecure_skip_tls_verify: false,
            no_connection_reuse: false,
            request_timeout_secs: default_request_timeout_secs(),
            step_pause_ms: default_step_pause_ms(),
            stagger_start: true,
            retry: RetryPolicy::default(),
            profile: Profile::default(),
        }
    }
}

impl LoadTestConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn transport_options(&self) -> HttpTransportOptions {
        HttpTransportOptions {
            accept_invalid_certs: self.insecure_skip_tls_verify,
            reuse_connections: !self.no_connection_reuse,
        }
    }

    pub fn journey_config(&self, auth_token: String) -> JourneyConfig {
        JourneyConfig {
            endpoint: self.target_url.clone(),
            auth_token,
            bootstrap_space_id: self.bootstrap_space_id.clone(),
            name_prefix: self.name_prefix.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            step_pause: Duration::from_millis(self.step_pause_ms),
            stagger_start: self.stagger_start,
        }
    }
}

/// One step of a ramping profile: hold or move toward a virtual-user target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub duration_secs: u64,
    pub target_vus: u32,
}

/// Load profile: either stepped concurrent-user ramping, or a fixed number
/// of iterations per virtual user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Profile {
    Ramping {
        stages: Vec<Stage>,

        /// How long in-flight iterations may drain after the last stage
        #[serde(default = "default_graceful_stop_secs")]
        graceful_stop_secs: u64,
    },
    Fixed {
        #[serde(default = "default_vus")]
        vus: u32,

        #[serde(default = "default_iterations_per_vu")]
        iterations_per_vu: u64,
    },
}

fn default_graceful_stop_secs() -> u64 {
    30
}

fn default_vus() -> u32 {
    10
}

fn default_iterations_per_vu() -> u64 {
    1
}

impl Default for Profile {
    fn default() -> Self {
        Self::Fixed {
            vus: default_vus(),
            iterations_per_vu: default_iterations_per_vu(),
        }
    }
}

impl Profile {
    /// The stepped ramp this tool was originally run with: up to 100
    /// concurrent users, a hold, then ramp-down.
    pub fn default_ramping() -> Self {
        Self::Ramping {
            stages: vec![
                Stage { duration_secs: 10, target_vus: 25 },
                Stage { duration_secs: 10, target_vus: 50 },
                Stage { duration_secs: 10, target_vus: 75 },
                Stage { duration_secs: 20, target_vus: 100 },
                Stage { duration_secs: 30, target_vus: 100 },
                Stage { duration_secs: 10, target_vus: 0 },
            ],
            graceful_stop_secs: default_graceful_stop_secs(),
        }
    }
}

/// Read the bearer token from the environment. Absence (or an empty value)
/// is a fatal configuration error, raised before any request is attempted.
pub fn auth_token_from_env() -> wsload_core::Result<String> {
    std::env::var(AUTH_TOKEN_ENV)
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or(WsloadError::MissingAuthToken(AUTH_TOKEN_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: LoadTestConfig = toml::from_str("").unwrap();

        assert_eq!(config.target_url, default_target_url());
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.stagger_start);
        assert!(matches!(
            config.profile,
            Profile::Fixed {
                vus: 10,
                iterations_per_vu: 1
            }
        ));
    }

    #[test]
    fn test_ramping_profile_parses_from_toml() {
        let config: LoadTestConfig = toml::from_str(
            r#"
            target_url = "https://staging.example/api/graphql"
            insecure_skip_tls_verify = true
            no_connection_reuse = true

            [retry]
            max_attempts = 3

            [profile]
            mode = "ramping"
            graceful_stop_secs = 15

            [[profile.stages]]
            duration_secs = 10
            target_vus = 25

            [[profile.stages]]
            duration_secs = 10
            target_vus = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.target_url, "https://staging.example/api/graphql");
        assert!(config.insecure_skip_tls_verify);
        assert_eq!(config.retry.max_attempts, 3);
        match config.profile {
            Profile::Ramping {
                stages,
                graceful_stop_secs,
            } => {
                assert_eq!(stages.len(), 2);
                assert_eq!(stages[0].target_vus, 25);
                assert_eq!(graceful_stop_secs, 15);
            }
            other => panic!("unexpected profile: {other:?}"),
        }
    }

    #[test]
    fn test_journey_config_carries_token_explicitly() {
        let config = LoadTestConfig::default();
        let journey = config.journey_config("secret-token".to_string());

        assert_eq!(journey.auth_token, "secret-token");
        assert_eq!(journey.endpoint, config.target_url);
        assert_eq!(journey.step_pause, Duration::from_millis(1_000));
    }

    #[test]
    fn test_auth_token_from_env() {
        std::env::remove_var(AUTH_TOKEN_ENV);
        assert!(matches!(
            auth_token_from_env(),
            Err(WsloadError::MissingAuthToken(_))
        ));

        std::env::set_var(AUTH_TOKEN_ENV, "");
        assert!(auth_token_from_env().is_err());

        std::env::set_var(AUTH_TOKEN_ENV, "tok");
        assert_eq!(auth_token_from_env().unwrap(), "tok");
        std::env::remove_var(AUTH_TOKEN_ENV);
    }
}

use serde::Deserialize;

/// Root application configuration. Loaded from an optional `ucb.toml` and
/// environment variables with the prefix `UCB__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_arm_count")]
    pub default_arm_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_rounds")]
    pub rounds: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_arm_count() -> usize {
    2
}
fn default_state_path() -> String {
    "ucb-state.json".to_string()
}
fn default_rounds() -> u64 {
    1000
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_arm_count: default_arm_count(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            seed: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            state: StateConfig::default(),
            simulation: SimulationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `ucb.toml` (if present) and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("ucb")
    }

    /// Load configuration from the given file stem (any format the `config`
    /// crate recognises) layered under `UCB__*` environment variables.
    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("UCB")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let app: AppConfig = config.try_deserialize()?;
        if app.policy.default_arm_count < 1 {
            return Err(config::ConfigError::Message(
                "policy.default_arm_count cannot be less than 1".to_string(),
            ));
        }
        Ok(app)
    }
}

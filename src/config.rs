// Configuration module for reading Engine.toml
// Each player gets an engine bundle; the bundle is validated before any player is built

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::eval::{Evaluator, Heuristic};

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub white: PlayerConfig,
    pub black: PlayerConfig,
    pub cache: CacheConfig,
    pub debug: DebugConfig,
}

/// Player variants that can be configured
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Scores every play one ply deep; random among the best
    OnePly,
    /// Alpha-beta with depth chosen from the branching factor
    Adaptive,
    /// Uniformly random legal play
    Random,
    /// Separate engine bundle per colour
    Switch,
    /// Endgame filler once all own pieces are sealed off
    BuildIn,
}

/// Player selection and its engine parameters
#[derive(Debug, Deserialize, Clone)]
pub struct PlayerConfig {
    pub name: String,
    pub strategy: Strategy,
    /// Player used by `adaptive` when the position is too open (default `one_ply`)
    #[serde(default)]
    pub backup: Option<Strategy>,
    /// Player used by `build_in` while not sealed off (default `adaptive`)
    #[serde(default)]
    pub inner: Option<Strategy>,
    pub engine: EngineConfig,
    /// Engine bundle for white under `switch`
    #[serde(default)]
    pub white_engine: Option<EngineConfig>,
    /// Engine bundle for black under `switch`
    #[serde(default)]
    pub black_engine: Option<EngineConfig>,
}

/// Engine configuration bundle
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Evaluation horizon in flood rings
    pub plays_calculated: usize,
    /// Ring weights, one per ring; defaults to 2^n .. 2^1
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    pub aggressiveness: f64,
    #[serde(default)]
    pub evaluator: Evaluator,
    /// Branching-factor thresholds for deep-mode depth selection
    #[serde(default)]
    pub depth_slider: Vec<usize>,
    pub worker_count: usize,
    #[serde(default)]
    pub use_cache: bool,
    /// Seed for tie-breaking; random per process when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_alpha_beta")]
    pub alpha_beta: bool,
    /// Largest sealed region solved exhaustively by `build_in`
    pub build_in_threshold: usize,
}

fn default_alpha_beta() -> bool {
    true
}

/// Flood rings are tracked in a u8 with one value reserved
const MAX_PLAYS_CALCULATED: usize = 254;

impl EngineConfig {
    /// Ring weights, falling back to the default exponential schedule
    pub fn weights(&self) -> Vec<f64> {
        self.weights
            .clone()
            .unwrap_or_else(|| Heuristic::default_weights(self.plays_calculated))
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.plays_calculated == 0 || self.plays_calculated > MAX_PLAYS_CALCULATED {
            return Err(EngineError::Configuration(format!(
                "plays_calculated must be in 1..={}, got {}",
                MAX_PLAYS_CALCULATED, self.plays_calculated
            )));
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.plays_calculated {
                return Err(EngineError::Configuration(format!(
                    "{} weights given for plays_calculated = {}",
                    weights.len(),
                    self.plays_calculated
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.aggressiveness) {
            return Err(EngineError::Configuration(format!(
                "aggressiveness must be in [0, 1], got {}",
                self.aggressiveness
            )));
        }
        if self.worker_count == 0 {
            return Err(EngineError::Configuration(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the heuristic after validating the bundle
    pub fn heuristic(&self) -> EngineResult<Heuristic> {
        self.validate()?;
        Ok(Heuristic {
            evaluator: self.evaluator,
            plays_calculated: self.plays_calculated,
            weights: self.weights(),
            aggressiveness: self.aggressiveness,
        })
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.engine.validate()?;
        if self.strategy == Strategy::Switch || self.backup == Some(Strategy::Switch) {
            match (&self.white_engine, &self.black_engine) {
                (Some(white), Some(black)) => {
                    white.validate()?;
                    black.validate()?;
                }
                _ => {
                    return Err(EngineError::Configuration(format!(
                        "player '{}' uses switch but lacks white_engine/black_engine",
                        self.name
                    )))
                }
            }
        }
        if self.strategy == Strategy::Adaptive && self.engine.depth_slider.is_empty() {
            return Err(EngineError::Configuration(format!(
                "player '{}' is adaptive but has an empty depth_slider",
                self.name
            )));
        }
        Ok(())
    }
}

/// Result cache options
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Share one cache between both players instead of one per player
    pub shared: bool,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Engine.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed and validated configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))?;

        config
            .validate()
            .map_err(|e| format!("Invalid config file: {}", e))?;
        Ok(config)
    }

    /// Loads default configuration from Engine.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Engine.toml")
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.white.validate()?;
        self.black.validate()
    }

    /// Engine bundle used by both defaults
    pub fn default_engine() -> EngineConfig {
        EngineConfig {
            plays_calculated: 5,
            weights: None,
            aggressiveness: 0.8,
            evaluator: Evaluator::Flat,
            depth_slider: vec![400, 200, 100, 50, 25, 10],
            worker_count: 1,
            use_cache: false,
            seed: None,
            alpha_beta: true,
            build_in_threshold: 9,
        }
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Engine.toml
    pub fn default_hardcoded() -> Self {
        let engine = Self::default_engine();
        Config {
            white: PlayerConfig {
                name: "Switcher".to_string(),
                strategy: Strategy::Switch,
                backup: None,
                inner: None,
                engine: engine.clone(),
                white_engine: Some(EngineConfig {
                    aggressiveness: 0.9,
                    weights: Some(vec![125.0, 64.0, 27.0, 8.0, 1.0]),
                    ..engine.clone()
                }),
                black_engine: Some(EngineConfig {
                    aggressiveness: 0.8,
                    ..engine.clone()
                }),
            },
            black: PlayerConfig {
                name: "Deep Thinker".to_string(),
                strategy: Strategy::Adaptive,
                backup: Some(Strategy::OnePly),
                inner: None,
                engine,
                white_engine: None,
                black_engine: None,
            },
            cache: CacheConfig { shared: false },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "amazons_games.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!(
                "Warning: Could not load Engine.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert!(config.validate().is_ok());
        assert_eq!(config.black.engine.plays_calculated, 5);
        assert_eq!(
            config.black.engine.weights(),
            vec![32.0, 16.0, 8.0, 4.0, 2.0]
        );
    }

    #[test]
    fn test_engine_toml_can_be_parsed() {
        let result = Config::from_file("Engine.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Engine.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Engine.toml").expect("Engine.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        assert_eq!(file_config.white.name, hardcoded.white.name);
        assert_eq!(file_config.white.strategy, hardcoded.white.strategy);
        assert_eq!(file_config.white.engine, hardcoded.white.engine);
        assert_eq!(file_config.white.white_engine, hardcoded.white.white_engine);
        assert_eq!(file_config.white.black_engine, hardcoded.white.black_engine);

        assert_eq!(file_config.black.name, hardcoded.black.name);
        assert_eq!(file_config.black.strategy, hardcoded.black.strategy);
        assert_eq!(file_config.black.backup, hardcoded.black.backup);
        assert_eq!(file_config.black.engine, hardcoded.black.engine);

        assert_eq!(file_config.cache.shared, hardcoded.cache.shared);
        assert_eq!(file_config.debug.enabled, hardcoded.debug.enabled);
        assert_eq!(file_config.debug.log_file_path, hardcoded.debug.log_file_path);
    }

    #[test]
    fn test_mismatched_weights_are_rejected() {
        let mut engine = Config::default_engine();
        engine.weights = Some(vec![1.0, 2.0]);
        assert!(matches!(
            engine.validate(),
            Err(EngineError::Configuration(_))
        ));
        assert!(engine.heuristic().is_err());
    }

    #[test]
    fn test_out_of_range_aggressiveness_is_rejected() {
        let mut engine = Config::default_engine();
        engine.aggressiveness = 1.5;
        assert!(engine.validate().is_err());
    }

    #[test]
    fn test_switch_without_engines_is_rejected() {
        let mut config = Config::default_hardcoded();
        config.white.white_engine = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_bundle_selects_centrality_evaluator() {
        let engine: EngineConfig = toml::from_str(
            r#"
            plays_calculated = 3
            aggressiveness = 0.25
            evaluator = "centrality"
            worker_count = 1
            build_in_threshold = 10
            "#,
        )
        .expect("bundle parses");
        assert_eq!(engine.evaluator, Evaluator::Centrality);
        assert!(engine.alpha_beta);
        let heuristic = engine.heuristic().unwrap();
        assert_eq!(heuristic.evaluator, Evaluator::Centrality);
        assert_eq!(heuristic.weights, vec![8.0, 4.0, 2.0]);

        let unknown: Result<EngineConfig, _> = toml::from_str(
            r#"
            plays_calculated = 3
            aggressiveness = 0.25
            evaluator = "spiral"
            worker_count = 1
            build_in_threshold = 10
            "#,
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}

//! Engine configuration.
//!
//! The only process-wide setting is which evaluator backends are exercised.
//! It is read from the environment once, the first time [`EngineConfig::global`]
//! is called, and never changes afterwards.

use once_cell::sync::Lazy;
use std::fmt;

/// Environment variable selecting the evaluator backends.
pub const EVALUATOR_ENV_VAR: &str = "POLICY_ENGINE_EVALUATOR";

/// Which backends compile queries.
///
/// | Mode | Serves results from | Also runs |
/// |------|---------------------|-----------|
/// | `Baseline` | baseline | nothing |
/// | `Literal` | literal when supported, else baseline | nothing |
/// | `Shadow` | baseline | literal, logging disagreements |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluatorMode {
    #[default]
    Baseline,
    Literal,
    Shadow,
}

impl EvaluatorMode {
    /// Parses a mode name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("baseline") {
            Some(EvaluatorMode::Baseline)
        } else if name.eq_ignore_ascii_case("literal") {
            Some(EvaluatorMode::Literal)
        } else if name.eq_ignore_ascii_case("shadow") {
            Some(EvaluatorMode::Shadow)
        } else {
            None
        }
    }
}

impl fmt::Display for EvaluatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvaluatorMode::Baseline => "baseline",
            EvaluatorMode::Literal => "literal",
            EvaluatorMode::Shadow => "shadow",
        };
        f.write_str(name)
    }
}

/// Batch matching settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Batches larger than this are matched in parallel.
    pub parallel_threshold: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 16,
        }
    }
}

/// Policy engine configuration.
///
/// # Example
/// ```rust
/// use policy_engine::config::{EngineConfig, EvaluatorMode};
///
/// let config = EngineConfig::shadow().with_parallel_threshold(64);
/// assert_eq!(config.evaluator_mode, EvaluatorMode::Shadow);
/// assert_eq!(config.detector.parallel_threshold, 64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub evaluator_mode: EvaluatorMode,
    pub detector: DetectorConfig,
}

static GLOBAL_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline backend only.
    pub fn baseline() -> Self {
        Self::default().with_evaluator_mode(EvaluatorMode::Baseline)
    }

    /// Literal backend with baseline fallback.
    pub fn literal() -> Self {
        Self::default().with_evaluator_mode(EvaluatorMode::Literal)
    }

    /// Baseline results, literal backend compared on every evaluation.
    pub fn shadow() -> Self {
        Self::default().with_evaluator_mode(EvaluatorMode::Shadow)
    }

    /// Reads [`EVALUATOR_ENV_VAR`].
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(EVALUATOR_ENV_VAR).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        let mode = match value {
            None => EvaluatorMode::default(),
            Some(name) => EvaluatorMode::from_name(name).unwrap_or_else(|| {
                log::warn!(
                    "unknown {EVALUATOR_ENV_VAR} value {name:?}, using {}",
                    EvaluatorMode::default()
                );
                EvaluatorMode::default()
            }),
        };
        Self::default().with_evaluator_mode(mode)
    }

    /// Configuration read from the environment on first use.
    pub fn global() -> &'static EngineConfig {
        &GLOBAL_CONFIG
    }

    pub fn with_evaluator_mode(mut self, mode: EvaluatorMode) -> Self {
        self.evaluator_mode = mode;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.detector.parallel_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.evaluator_mode, EvaluatorMode::Baseline);
        assert_eq!(config.detector.parallel_threshold, 16);
        assert_eq!(config, EngineConfig::baseline());
    }

    #[test]
    fn test_presets() {
        assert_eq!(EngineConfig::literal().evaluator_mode, EvaluatorMode::Literal);
        assert_eq!(EngineConfig::shadow().evaluator_mode, EvaluatorMode::Shadow);
    }

    #[test]
    fn test_env_values() {
        assert_eq!(EngineConfig::from_env_value(None).evaluator_mode, EvaluatorMode::Baseline);
        assert_eq!(
            EngineConfig::from_env_value(Some(" LITERAL ")).evaluator_mode,
            EvaluatorMode::Literal
        );
        assert_eq!(
            EngineConfig::from_env_value(Some("Shadow")).evaluator_mode,
            EvaluatorMode::Shadow
        );
        assert_eq!(
            EngineConfig::from_env_value(Some("rego")).evaluator_mode,
            EvaluatorMode::Baseline
        );
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in [EvaluatorMode::Baseline, EvaluatorMode::Literal, EvaluatorMode::Shadow] {
            assert_eq!(EvaluatorMode::from_name(&mode.to_string()), Some(mode));
        }
    }
}

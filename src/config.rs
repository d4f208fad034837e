//! Application-level configuration loading, including the judge catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::judges::{Judge, JudgeCatalog, JudgePersonality, JudgeRarity, PANEL_SIZE};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FUNDMENOT_BACK_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Judge catalog served by the draw endpoints.
    pub judges: Vec<Judge>,
    /// Fixed RNG seed for reproducible draws; unset in production.
    pub rng_seed: Option<u64>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in judge catalog.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    if let Err(problem) = validate_catalog(&config.judges) {
                        warn!(
                            path = %path.display(),
                            problem,
                            "config judge catalog is unusable; falling back to defaults"
                        );
                        return Self::default();
                    }
                    info!(
                        path = %path.display(),
                        count = config.judges.len(),
                        "loaded judge catalog from config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Consume the configuration into the immutable catalog.
    pub fn into_catalog(self) -> JudgeCatalog {
        JudgeCatalog::new(self.judges)
    }

    /// Fixed RNG seed, if any.
    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            judges: default_judges(),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    judges: Vec<Judge>,
    #[serde(default)]
    rng_seed: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            judges: value.judges,
            rng_seed: value.rng_seed,
        }
    }
}

/// A catalog must be able to serve every draw: a full panel of regular
/// judges and a glitch judge to substitute in.
fn validate_catalog(judges: &[Judge]) -> Result<(), &'static str> {
    let regular = judges
        .iter()
        .filter(|judge| judge.rarity != JudgeRarity::Glitch)
        .count();
    if regular < PANEL_SIZE {
        return Err("fewer non-glitch judges than a panel seats");
    }
    if !judges
        .iter()
        .any(|judge| judge.rarity == JudgeRarity::Glitch)
    {
        return Err("no glitch judge");
    }
    if judges
        .iter()
        .all(|judge| judge.rarity != JudgeRarity::Common)
    {
        return Err("no common judges to draw from");
    }
    Ok(())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in judge catalog shipped with the binary.
pub fn default_judges() -> Vec<Judge> {
    vec![
        Judge {
            id: "vc-chad".into(),
            name: "VC Chad".into(),
            personality: JudgePersonality::VcChad,
            rarity: JudgeRarity::Common,
            description: "Brutally honest money guy. Only speaks in burn rates.".into(),
            voice: "Fenrir".into(),
        },
        Judge {
            id: "trollbot69".into(),
            name: "TrollBot69".into(),
            personality: JudgePersonality::TrollBot69,
            rarity: JudgeRarity::Common,
            description: "Sarcasm engine stuck at maximum output.".into(),
            voice: "Puck".into(),
        },
        Judge {
            id: "modern-dadu".into(),
            name: "Modern Dadu".into(),
            personality: JudgePersonality::ModernDadu,
            rarity: JudgeRarity::Common,
            description: "Grandpa energy. Thinks the cloud is weather.".into(),
            voice: "Orus".into(),
        },
        Judge {
            id: "outdated-genz".into(),
            name: "Outdated GenZ".into(),
            personality: JudgePersonality::OutdatedGenZ,
            rarity: JudgeRarity::Common,
            description: "Still says 'on fleek'. Unironically.".into(),
            voice: "Leda".into(),
        },
        Judge {
            id: "hype-beast".into(),
            name: "Hype Beast".into(),
            personality: JudgePersonality::HypeBeast,
            rarity: JudgeRarity::Common,
            description: "Rates your startup by its drip and follower count.".into(),
            voice: "Aoede".into(),
        },
        Judge {
            id: "philosopher-ai".into(),
            name: "Philosopher AI".into(),
            personality: JudgePersonality::PhilosopherAi,
            rarity: JudgeRarity::Rare,
            description: "Asks what your startup means for the human condition.".into(),
            voice: "Charon".into(),
        },
        Judge {
            id: "cosmic-coder".into(),
            name: "Cosmic Coder".into(),
            personality: JudgePersonality::CosmicCoder,
            rarity: JudgeRarity::Rare,
            description: "Sees your whole business as one trivial algorithm.".into(),
            voice: "Zephyr".into(),
        },
        Judge {
            id: "broken-judge".into(),
            name: "Broken Judge".into(),
            personality: JudgePersonality::BrokenJudge,
            rarity: JudgeRarity::Glitch,
            description: "ERR0R: judgment module c0rrupted. Advice may be s1deways.".into(),
            voice: "Kore".into(),
        },
    ]
}

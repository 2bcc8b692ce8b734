use std::path::PathBuf;

use serde::Deserialize;

use crate::diet::aggregator::{AdherencePolicy, DEFAULT_ADHERENCE_TOLERANCE, DEFAULT_MAX_DAILY_XP};
use crate::diet::resolver::{SubstituteOptions, DEFAULT_TOLERANCE, DEFAULT_TOP_K};
use crate::diet::DietPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct DietConfig {
    pub substitute_tolerance: f64,
    pub substitute_top_k: usize,
    pub adherence_tolerance: f64,
    pub max_daily_xp: u32,
}

impl Default for DietConfig {
    fn default() -> Self {
        Self {
            substitute_tolerance: DEFAULT_TOLERANCE,
            substitute_top_k: DEFAULT_TOP_K,
            adherence_tolerance: DEFAULT_ADHERENCE_TOLERANCE,
            max_daily_xp: DEFAULT_MAX_DAILY_XP,
        }
    }
}

impl DietConfig {
    pub fn policy(&self) -> DietPolicy {
        DietPolicy {
            substitutes: SubstituteOptions {
                tolerance: self.substitute_tolerance,
                top_k: self.substitute_top_k,
            },
            adherence: AdherencePolicy {
                tolerance: self.adherence_tolerance,
                max_daily_xp: self.max_daily_xp,
            },
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("DIET_SUBSTITUTE_TOLERANCE", self.substitute_tolerance),
            ("DIET_ADHERENCE_TOLERANCE", self.adherence_tolerance),
        ] {
            anyhow::ensure!(
                value.is_finite() && value > 0.0 && value < 1.0,
                "{name} must be between 0 and 1, got {value}"
            );
        }
        anyhow::ensure!(self.substitute_top_k > 0, "DIET_SUBSTITUTE_TOP_K must be positive");
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub diet: DietConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = DietConfig::default();
        let diet = DietConfig {
            substitute_tolerance: env_parse("DIET_SUBSTITUTE_TOLERANCE")
                .unwrap_or(defaults.substitute_tolerance),
            substitute_top_k: env_parse("DIET_SUBSTITUTE_TOP_K").unwrap_or(defaults.substitute_top_k),
            adherence_tolerance: env_parse("DIET_ADHERENCE_TOLERANCE")
                .unwrap_or(defaults.adherence_tolerance),
            max_daily_xp: env_parse("DIET_MAX_DAILY_XP").unwrap_or(defaults.max_daily_xp),
        };
        diet.validate()?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            catalog_path: std::env::var("CATALOG_PATH").ok().map(PathBuf::from),
            diet,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

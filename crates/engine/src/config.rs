use std::env;

use anyhow::{Context, Result};

/// Fee a coach owes, split among the admin accounts, when an admin approves
/// the team. In the smallest currency unit.
pub const DEFAULT_TEAM_CREATION_FEE: i64 = 200_000;

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub team_creation_fee: i64,
}

impl WorkflowConfig {
    pub fn from_env() -> Result<Self> {
        let team_creation_fee = match env::var("TEAM_CREATION_FEE") {
            Ok(raw) => raw
                .parse()
                .context("TEAM_CREATION_FEE must be an integer amount")?,
            Err(_) => DEFAULT_TEAM_CREATION_FEE,
        };

        Ok(Self { team_creation_fee })
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            team_creation_fee: DEFAULT_TEAM_CREATION_FEE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fee_applies_when_env_is_unset() {
        let config = WorkflowConfig::default();
        assert_eq!(config.team_creation_fee, DEFAULT_TEAM_CREATION_FEE);
    }
}

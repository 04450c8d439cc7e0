//! Password hashing parameters

use serde::{Deserialize, Serialize};

/// Default Argon2id parameters, comparable in cost to bcrypt with cost 10
pub const DEFAULT_MEMORY_COST: u32 = 19456; // 19 MiB
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id cost parameters used for new password hashes.
///
/// Existing hashes carry their own parameters in the PHC string, so raising
/// these values only affects users registered afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    /// Memory size in KiB
    #[serde(default = "default_memory_cost")]
    pub memory_cost: u32,
    /// Number of iterations
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,
    /// Degree of parallelism
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_cost() -> u32 {
    DEFAULT_MEMORY_COST
}

fn default_time_cost() -> u32 {
    DEFAULT_TIME_COST
}

fn default_parallelism() -> u32 {
    DEFAULT_PARALLELISM
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_cost: DEFAULT_MEMORY_COST,
            time_cost: DEFAULT_TIME_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl Argon2Params {
    /// Cheapest parameters Argon2 accepts. Only meant for tests.
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: Argon2Params = serde_json::from_str(r#"{"timeCost": 4}"#).unwrap();
        assert_eq!(params.time_cost, 4);
        assert_eq!(params.memory_cost, DEFAULT_MEMORY_COST);
        assert_eq!(params.parallelism, DEFAULT_PARALLELISM);
    }
}

//! Content-based hashing for run IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 of the serialized run configuration and the solver version.
pub fn compute_run_id<T: Serialize>(config: &T, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config).unwrap_or_default();
    hasher.update(config_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Config {
        model: &'static str,
        velocity_fps: f64,
    }

    #[test]
    fn hash_stability() {
        let c = Config {
            model: "trainer",
            velocity_fps: 200.0,
        };
        let id = compute_run_id(&c, "v1");
        assert_eq!(id, compute_run_id(&c, "v1"));
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = Config {
            model: "trainer",
            velocity_fps: 200.0,
        };
        let b = Config {
            model: "trainer",
            velocity_fps: 210.0,
        };
        assert_ne!(compute_run_id(&a, "v1"), compute_run_id(&b, "v1"));
        assert_ne!(compute_run_id(&a, "v1"), compute_run_id(&a, "v2"));
    }
}

//! JSON state file persistence.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use ucb_core::UcbResult;
use ucb_policy::{BanditPolicy, PolicyState};

pub fn load(path: &Path) -> UcbResult<BanditPolicy> {
    let raw = fs::read_to_string(path)?;
    let policy = BanditPolicy::from_json(&raw)?;
    debug!(
        path = %path.display(),
        arms = policy.arm_count(),
        observations = policy.total_observations(),
        "Loaded policy state"
    );
    Ok(policy)
}

/// Replace the state file. The snapshot is written beside the target and
/// renamed over it, so readers never see a partial file.
pub fn save(path: &Path, state: &PolicyState) -> UcbResult<()> {
    let tmp = temp_path(path);
    fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
    fs::rename(&tmp, path)?;
    info!(
        path = %path.display(),
        observations = state.total_observations(),
        "Saved policy state"
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut policy = BanditPolicy::new(3).unwrap();
        policy.reward(1, 0.25).unwrap();
        save(&path, &policy.serialize()).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, policy);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_load_rejects_malformed_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"armCount": 2, "counts": [1], "values": [0.5, 0.5]}"#).unwrap();
        assert!(load(&path).unwrap_err().is_restore_error());
    }

    #[test]
    fn test_load_rejects_non_object_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        for body in ["[]", "42", "null"] {
            fs::write(&path, body).unwrap();
            let err = load(&path).unwrap_err();
            assert!(matches!(err, ucb_core::UcbError::StateNotObject), "{body}");
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ucb_core::UcbError::Io(_)));
    }
}

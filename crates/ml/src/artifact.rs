// Path: crates/ml/src/artifact.rs

//! The persisted output of a training run.

use crate::forest::RandomForestClassifier;
use crate::preprocessing::StandardScaler;
use crate::MlError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bumped whenever the serialized layout changes. Older files are rejected.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub feature_names: Vec<String>,
    /// Class labels in encoder order; index `i` is class `i` of the forest.
    pub classes: Vec<String>,
    pub forest: RandomForestClassifier,
    /// Scaler fitted on the training split.
    pub scaler: StandardScaler,
}

impl ModelArtifact {
    pub fn new(
        feature_names: Vec<String>,
        classes: Vec<String>,
        forest: RandomForestClassifier,
        scaler: StandardScaler,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            feature_names,
            classes,
            forest,
            scaler,
        }
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Writes the artifact with bincode, creating parent directories.
    /// The file is written next to `path` and renamed over it, so a reader
    /// never sees a half-written model and concurrent saves never collide.
    pub fn save(&self, path: &Path) -> Result<(), MlError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = bincode::serialize(self).map_err(|e| MlError::Artifact(e.to_string()))?;
        // Each writer gets its own temp file; the last rename wins.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        std::fs::write(&tmp, bytes)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, MlError> {
        if !path.is_file() {
            return Err(MlError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let artifact: Self =
            bincode::deserialize(&bytes).map_err(|e| MlError::Artifact(e.to_string()))?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(MlError::Artifact(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                artifact.version
            )));
        }
        Ok(artifact)
    }

    /// Scales one raw sample with `scaler` and returns the predicted label.
    pub fn predict_label(&self, features: &[f64], scaler: &StandardScaler) -> Result<String, MlError> {
        if features.len() != self.n_features() {
            return Err(MlError::InvalidInput(format!(
                "expected {} features ({}), got {}",
                self.n_features(),
                self.feature_names.join(", "),
                features.len()
            )));
        }
        let scaled = scaler.transform(&[features.to_vec()])?;
        let row = scaled.first().ok_or(MlError::NotFitted)?;
        let class = self.forest.predict_one(row)?;
        self.classes
            .get(class)
            .cloned()
            .ok_or_else(|| MlError::Artifact(format!("class index {class} has no label")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> ModelArtifact {
        let x = vec![vec![0.0, 0.0], vec![0.1, 0.2], vec![5.0, 5.0], vec![5.2, 4.9]];
        let y = vec![0, 0, 1, 1];
        let mut scaler = StandardScaler::new();
        let xs = scaler.fit_transform(&x).unwrap();
        let mut forest = RandomForestClassifier::new(25).with_random_state(Some(3));
        forest.fit(&xs, &y).unwrap();
        ModelArtifact::new(
            vec!["a".into(), "b".into()],
            vec!["small".into(), "large".into()],
            forest,
            scaler,
        )
    }

    #[test]
    fn save_load_and_predict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("rf.bin");
        let artifact = fitted();
        artifact.save(&path).unwrap();
        // Overwrites in place.
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded, artifact);
        assert_eq!(
            loaded.predict_label(&[5.1, 5.0], &loaded.scaler).unwrap(),
            "large"
        );
        assert!(loaded.predict_label(&[1.0], &loaded.scaler).is_err());
    }

    #[test]
    fn concurrent_saves_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("rf.bin");
        let artifact = fitted();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| artifact.save(&path))).collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }
        });

        assert_eq!(ModelArtifact::load(&path).unwrap(), artifact);
        let leftovers = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name() != "rf.bin")
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn missing_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        assert!(matches!(
            ModelArtifact::load(&missing),
            Err(MlError::FileNotFound(_))
        ));

        let garbage = dir.path().join("garbage.bin");
        std::fs::write(&garbage, b"not a model").unwrap();
        assert!(matches!(
            ModelArtifact::load(&garbage),
            Err(MlError::Artifact(_))
        ));
    }
}

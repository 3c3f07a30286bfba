// Path: crates/services/src/pipeline.rs

//! The Iris dataset and model pipeline.
//!
//! All file access and numeric work runs on the blocking thread pool. The
//! trained artifact is a single file that each training run replaces.

use flora_ml::{
    train_test_split, train_test_split_indices, Cell, LabelEncoder, MlError, ModelArtifact,
    RandomForestClassifier, StandardScaler, Table,
};
use flora_telemetry::model_metrics;
use flora_telemetry::time::Timer;
use flora_types::config::{DataConfig, ModelConfig, ModelParameters, ScalerSource};
use flora_types::error::{PipelineError, ServiceError};
use flora_types::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const LOADED_MESSAGE: &str = "Iris dataset loaded successfully";
pub const PROCESSED_MESSAGE: &str = "Iris dataset processed successfully";
pub const SPLIT_MESSAGE: &str = "Iris dataset split into train and test successfully";
pub const TRAINED_MESSAGE: &str = "Model trained and saved successfully";

const ID_COLUMN: &str = "Id";
const TARGET_COLUMN: &str = "Species";

type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Processed {
    pub processed_features: Vec<Record>,
    pub target: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    pub features: Vec<Record>,
    pub target: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitData {
    pub train_data: Partition,
    pub test_data: Partition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trained {
    pub message: &'static str,
    pub accuracy: f64,
    pub model_file: String,
}

/// Maps an ML error to the pipeline taxonomy.
/// `missing` decides which not-found variant a missing file becomes.
fn classify(e: MlError, missing: fn(PathBuf) -> PipelineError) -> PipelineError {
    match e {
        MlError::FileNotFound(p) => missing(p),
        MlError::InvalidInput(m) => PipelineError::InvalidInput(m),
        MlError::Csv(m) => PipelineError::Parse(m),
        MlError::Io(m) => PipelineError::Io(m),
        other @ (MlError::NotFitted | MlError::Artifact(_)) => {
            PipelineError::Training(other.to_string())
        }
    }
}

fn dataset_error(e: MlError) -> PipelineError {
    classify(e, PipelineError::DatasetNotFound)
}

fn model_error(e: MlError) -> PipelineError {
    classify(e, PipelineError::ModelNotFound)
}

/// Features and raw labels of the dataset, in file order.
struct Prepared {
    features: Table,
    target: Vec<Cell>,
}

fn load_table(path: &Path) -> std::result::Result<Table, PipelineError> {
    Table::from_csv_path(path).map_err(dataset_error)
}

fn prepare(table: &Table) -> std::result::Result<Prepared, PipelineError> {
    let features = table
        .drop_columns(&[ID_COLUMN, TARGET_COLUMN])
        .map_err(dataset_error)?;
    let target = table.column(TARGET_COLUMN).map_err(dataset_error)?;
    Ok(Prepared { features, target })
}

fn to_json(cells: &[Cell]) -> Vec<Value> {
    cells.iter().map(Cell::to_json).collect()
}

fn read_parameters(path: &Path) -> std::result::Result<ModelParameters, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::ConfigNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::Io(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| {
        PipelineError::Training(format!("invalid model parameters in {}: {e}", path.display()))
    })
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, PipelineError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Internal(format!("pipeline task failed: {e}")))?
        .map_err(ServiceError::from)
}

#[derive(Debug, Clone)]
pub struct IrisPipeline {
    data: DataConfig,
    model: ModelConfig,
}

impl IrisPipeline {
    pub fn new(data: DataConfig, model: ModelConfig) -> Self {
        Self { data, model }
    }

    /// Every row of the CSV as a JSON object.
    pub async fn load(&self) -> Result<Vec<Record>> {
        let path = self.data.iris_csv.clone();
        blocking(move || Ok(load_table(&path)?.to_records())).await
    }

    /// Unscaled feature records and the species column.
    pub async fn process(&self) -> Result<Processed> {
        let path = self.data.iris_csv.clone();
        blocking(move || {
            let prepared = prepare(&load_table(&path)?)?;
            Ok(Processed {
                processed_features: prepared.features.to_records(),
                target: to_json(&prepared.target),
            })
        })
        .await
    }

    /// Seeded train/test split of the unscaled features.
    /// Missing arguments fall back to the configured defaults.
    pub async fn split(&self, test_size: Option<f64>, random_state: Option<u64>) -> Result<SplitData> {
        let path = self.data.iris_csv.clone();
        let test_size = test_size.unwrap_or(self.data.default_test_size);
        let random_state = random_state.unwrap_or(self.data.default_random_state);
        blocking(move || {
            let prepared = prepare(&load_table(&path)?)?;
            let split = train_test_split_indices(prepared.features.len(), test_size, random_state)
                .map_err(dataset_error)?;
            let records = prepared.features.to_records();
            let side = |idx: &[usize]| Partition {
                features: idx.iter().filter_map(|&i| records.get(i).cloned()).collect(),
                target: idx
                    .iter()
                    .filter_map(|&i| prepared.target.get(i).map(Cell::to_json))
                    .collect(),
            };
            Ok(SplitData {
                train_data: side(&split.train),
                test_data: side(&split.test),
            })
        })
        .await
    }

    /// Fits a scaler and a random forest on the training split, scores it on
    /// the test split and writes the artifact.
    pub async fn train(&self) -> Result<Trained> {
        let data = self.data.clone();
        let model = self.model.clone();
        let result = blocking(move || {
            let timer = Timer::new(model_metrics());
            let trained = train_blocking(&data, &model)?;
            tracing::debug!(target: "pipeline", secs = timer.finish(), "training finished");
            Ok(trained)
        })
        .await;
        match &result {
            Ok(trained) => {
                model_metrics().inc_training_runs("ok");
                model_metrics().set_last_accuracy(trained.accuracy);
                tracing::info!(
                    target: "pipeline",
                    accuracy = trained.accuracy,
                    model_file = %trained.model_file,
                    "model trained"
                );
            }
            Err(e) => {
                model_metrics().inc_training_runs("error");
                tracing::warn!(target: "pipeline", error = %e, "training failed");
            }
        }
        result
    }

    /// Predicts the species of one raw feature vector.
    pub async fn predict(&self, features: Vec<f64>) -> Result<Vec<String>> {
        let data = self.data.clone();
        let model = self.model.clone();
        let label = blocking(move || predict_blocking(&data, &model, &features)).await?;
        model_metrics().inc_predictions();
        Ok(vec![label])
    }
}

fn train_blocking(
    data: &DataConfig,
    model: &ModelConfig,
) -> std::result::Result<Trained, PipelineError> {
    let params = read_parameters(&model.parameters_path)?;
    let prepared = prepare(&load_table(&data.iris_csv)?)?;
    let x = prepared.features.to_feature_matrix().map_err(dataset_error)?;
    let labels: Vec<String> = prepared.target.iter().map(Cell::label).collect();
    let mut encoder = LabelEncoder::new();
    let y = encoder.fit_transform(&labels).map_err(dataset_error)?;

    let test_size = params.test_size.unwrap_or(data.default_test_size);
    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x, &y, test_size, data.default_random_state).map_err(dataset_error)?;

    let mut scaler = StandardScaler::new();
    let train_scaled = scaler.fit_transform(&x_train).map_err(model_error)?;
    let test_scaled = scaler.transform(&x_test).map_err(model_error)?;

    let mut forest = RandomForestClassifier::from_parameters(&params);
    forest.fit(&train_scaled, &y_train).map_err(model_error)?;
    let accuracy = forest.score(&test_scaled, &y_test).map_err(model_error)?;

    let artifact = ModelArtifact::new(
        prepared.features.columns().to_vec(),
        encoder.classes().to_vec(),
        forest,
        scaler,
    );
    artifact.save(&model.artifact_path).map_err(model_error)?;

    Ok(Trained {
        message: TRAINED_MESSAGE,
        accuracy,
        model_file: model.artifact_path.display().to_string(),
    })
}

fn predict_blocking(
    data: &DataConfig,
    model: &ModelConfig,
    features: &[f64],
) -> std::result::Result<String, PipelineError> {
    let artifact = ModelArtifact::load(&model.artifact_path).map_err(model_error)?;
    if features.len() != artifact.n_features() {
        return Err(PipelineError::InvalidInput(format!(
            "expected {} features, got {}",
            artifact.n_features(),
            features.len()
        )));
    }
    let scaler = match model.scaler_source {
        ScalerSource::Training => artifact.scaler.clone(),
        ScalerSource::RefitOnDataset => {
            let prepared = prepare(&load_table(&data.iris_csv)?)?;
            let x = prepared.features.to_feature_matrix().map_err(dataset_error)?;
            let mut scaler = StandardScaler::new();
            scaler.fit(&x).map_err(dataset_error)?;
            scaler
        }
    };
    artifact
        .predict_label(features, &scaler)
        .map_err(model_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_test_utils::{write_iris_csv, write_model_parameters};

    fn pipeline(dir: &Path, scaler_source: ScalerSource) -> IrisPipeline {
        let data = DataConfig {
            iris_csv: write_iris_csv(dir).unwrap(),
            ..Default::default()
        };
        let model = ModelConfig {
            parameters_path: write_model_parameters(
                dir,
                r#"{"n_estimators": 20, "max_depth": null, "random_state": 42}"#,
            )
            .unwrap(),
            artifact_path: dir.join("models").join("iris_classification_model_rf.bin"),
            scaler_source,
        };
        IrisPipeline::new(data, model)
    }

    #[tokio::test]
    async fn load_returns_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path(), ScalerSource::Training);
        let rows = p.load().await.unwrap();
        assert_eq!(rows.len(), 150);
        assert_eq!(rows[0]["Id"], serde_json::json!(1));
        assert_eq!(rows[0]["Species"], serde_json::json!("Iris-setosa"));
    }

    #[tokio::test]
    async fn missing_dataset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let p = IrisPipeline::new(
            DataConfig {
                iris_csv: dir.path().join("absent.csv"),
                ..Default::default()
            },
            ModelConfig::default(),
        );
        let expected = ServiceError::NotFound("Iris dataset file not found".into());
        assert_eq!(p.load().await.unwrap_err(), expected);
        assert_eq!(p.process().await.unwrap_err(), expected);
        assert_eq!(p.split(None, None).await.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn process_drops_id_and_species() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path(), ScalerSource::Training);
        let processed = p.process().await.unwrap();
        assert_eq!(processed.processed_features.len(), 150);
        assert_eq!(processed.target.len(), 150);
        let keys: Vec<_> = processed.processed_features[0].keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["SepalLengthCm", "SepalWidthCm", "PetalLengthCm", "PetalWidthCm"]
        );
    }

    #[tokio::test]
    async fn split_sizes_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path(), ScalerSource::Training);
        let split = p.split(None, None).await.unwrap();
        assert_eq!(split.test_data.features.len(), 30);
        assert_eq!(split.train_data.features.len(), 120);
        assert_eq!(split.train_data.target.len(), 120);

        let again = p.split(Some(0.2), Some(42)).await.unwrap();
        assert_eq!(split, again);

        assert!(matches!(
            p.split(Some(1.5), None).await,
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn train_then_predict() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path(), ScalerSource::Training);

        assert_eq!(
            p.predict(vec![5.1, 3.5, 1.4, 0.2]).await.unwrap_err(),
            ServiceError::NotFound("Trained model not found".into())
        );

        let trained = p.train().await.unwrap();
        assert_eq!(trained.message, TRAINED_MESSAGE);
        assert!(trained.accuracy > 0.85, "accuracy {}", trained.accuracy);
        assert!(Path::new(&trained.model_file).is_file());

        let setosa = p.predict(vec![5.1, 3.5, 1.4, 0.2]).await.unwrap();
        assert_eq!(setosa, vec!["Iris-setosa".to_string()]);
        let virginica = p.predict(vec![7.7, 3.0, 6.1, 2.3]).await.unwrap();
        assert_eq!(virginica, vec!["Iris-virginica".to_string()]);

        assert!(matches!(
            p.predict(vec![1.0, 2.0]).await,
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn refit_scaler_source_still_predicts() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(dir.path(), ScalerSource::RefitOnDataset);
        p.train().await.unwrap();
        let setosa = p.predict(vec![5.0, 3.4, 1.5, 0.2]).await.unwrap();
        assert_eq!(setosa, vec!["Iris-setosa".to_string()]);
    }

    #[tokio::test]
    async fn missing_parameters_file_is_internal() {
        let dir = tempfile::tempdir().unwrap();
        let p = IrisPipeline::new(
            DataConfig {
                iris_csv: write_iris_csv(dir.path()).unwrap(),
                ..Default::default()
            },
            ModelConfig {
                parameters_path: dir.path().join("nope.json"),
                ..Default::default()
            },
        );
        assert!(matches!(p.train().await, Err(ServiceError::Internal(_))));
    }
}

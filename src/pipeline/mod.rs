//! Feature and label pipeline
//!
//! Pure functions turning raw observations into a clean feature matrix:
//! - normalize: provider units and names to the fixed schema
//! - labels: the binary rain label, derived only when absent
//! - metrics: comfort index, severity index and daylight duration
//! - features: column selection and numeric sanitizing

pub mod features;
pub mod labels;
pub mod metrics;
pub mod normalize;

pub use features::{
    DEFAULT_FEATURES, FeatureMatrix, FeatureMode, build_feature_matrix, column_value, sanitize,
};
pub use labels::{apply_rain_labels, derive_label, rain_target};
pub use metrics::{DerivedMetrics, add_derived_columns, derive_metrics};
pub use normalize::{MissingFieldPolicy, normalize, normalize_record};

use crate::Result;
use crate::models::WeatherDataset;

/// Label the dataset, register derived columns and build the feature matrix.
///
/// The input is cloned; the prepared copy is returned with the matrix.
pub fn prepare<S: AsRef<str>>(
    dataset: &WeatherDataset,
    feature_names: &[S],
    mode: FeatureMode,
) -> Result<(WeatherDataset, FeatureMatrix)> {
    let mut prepared = dataset.clone();
    apply_rain_labels(&mut prepared);
    add_derived_columns(&mut prepared);
    let matrix = build_feature_matrix(&prepared, feature_names, mode)?;
    Ok((prepared, matrix))
}

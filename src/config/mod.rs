pub mod env;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Collection used when no name is configured
pub const DEFAULT_COLLECTION_NAME: &str = "default_collection";

/// Index type Zilliz Cloud picks for itself; Milvus accepts explicit types such as HNSW
pub const DEFAULT_INDEX_TYPE: &str = "AUTOINDEX";

/// Configuration errors, raised before any request reaches the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Dimension must be provided.")]
    MissingDimension,

    #[error("Dimension must be greater than 0.")]
    InvalidDimension,

    /// Deliberately does not say which of the two is missing.
    #[error("Both 'cluster_endpoint' and 'token' must be provided.")]
    MissingEndpointOrToken,

    #[error("Collection name must not be empty.")]
    EmptyCollectionName,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Similarity metric used by the collection's vector index.
///
/// Names are matched case-insensitively; metrics not listed here (e.g. `BM25`)
/// are kept as [`MetricType::Other`] and left for the server to judge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MetricType {
    /// Inner product
    #[default]
    Ip,
    L2,
    Cosine,
    Hamming,
    Jaccard,
    /// Any other metric name, upper-cased
    Other(String),
}

impl MetricType {
    pub fn as_str(&self) -> &str {
        match self {
            MetricType::Ip => "IP",
            MetricType::L2 => "L2",
            MetricType::Cosine => "COSINE",
            MetricType::Hamming => "HAMMING",
            MetricType::Jaccard => "JACCARD",
            MetricType::Other(name) => name,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        match name.as_str() {
            "" => Err(ConfigError::InvalidValue {
                key: "metric_type".to_string(),
                value: s.to_string(),
            }),
            "IP" => Ok(MetricType::Ip),
            "L2" => Ok(MetricType::L2),
            "COSINE" => Ok(MetricType::Cosine),
            "HAMMING" => Ok(MetricType::Hamming),
            "JACCARD" => Ok(MetricType::Jaccard),
            _ => Ok(MetricType::Other(name)),
        }
    }
}

impl TryFrom<String> for MetricType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetricType> for String {
    fn from(metric: MetricType) -> Self {
        metric.as_str().to_string()
    }
}

/// Raw, unvalidated configuration inputs keyed by option name
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MilvusConfigOptions {
    pub cluster_endpoint: Option<String>,
    pub token: Option<String>,
    pub collection_name: Option<String>,
    pub dimension: Option<i64>,
    pub metric_type: Option<MetricType>,
    pub enable_dynamic_field: Option<bool>,
    pub auto_id: Option<bool>,
    pub index_type: Option<String>,
}

impl MilvusConfigOptions {
    /// Options carrying the three required inputs
    pub fn new(cluster_endpoint: &str, token: &str, dimension: i64) -> Self {
        Self {
            cluster_endpoint: Some(cluster_endpoint.to_string()),
            token: Some(token.to_string()),
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    pub fn with_collection_name(mut self, name: &str) -> Self {
        self.collection_name = Some(name.to_string());
        self
    }

    pub fn with_metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = Some(metric_type);
        self
    }

    pub fn with_auto_id(mut self, auto_id: bool) -> Self {
        self.auto_id = Some(auto_id);
        self
    }

    pub fn with_enable_dynamic_field(mut self, enable: bool) -> Self {
        self.enable_dynamic_field = Some(enable);
        self
    }

    pub fn with_index_type(mut self, index_type: &str) -> Self {
        self.index_type = Some(index_type.to_string());
        self
    }
}

/// Validated connection and collection settings for a Milvus/Zilliz cluster.
///
/// Only obtainable through [`MilvusConfig::new`] (or the loaders built on it),
/// so every instance satisfies: `dimension > 0`, non-empty endpoint and token,
/// non-empty collection name.
#[derive(Clone, PartialEq)]
pub struct MilvusConfig {
    cluster_endpoint: String,
    token: String,
    collection_name: String,
    dimension: usize,
    metric_type: MetricType,
    enable_dynamic_field: bool,
    auto_id: bool,
    index_type: String,
}

impl MilvusConfig {
    /// Validate `options` and apply defaults for anything omitted
    pub fn new(options: MilvusConfigOptions) -> Result<Self, ConfigError> {
        let dimension = match options.dimension {
            None => return Err(ConfigError::MissingDimension),
            Some(d) if d <= 0 => return Err(ConfigError::InvalidDimension),
            Some(d) => usize::try_from(d).map_err(|_| ConfigError::InvalidDimension)?,
        };

        let (cluster_endpoint, token) = match (options.cluster_endpoint, options.token) {
            (Some(endpoint), Some(token)) if !endpoint.is_empty() && !token.is_empty() => {
                (endpoint, token)
            }
            _ => return Err(ConfigError::MissingEndpointOrToken),
        };

        let collection_name = options
            .collection_name
            .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string());
        if collection_name.is_empty() {
            return Err(ConfigError::EmptyCollectionName);
        }

        Ok(Self {
            cluster_endpoint,
            token,
            collection_name,
            dimension,
            metric_type: options.metric_type.unwrap_or_default(),
            enable_dynamic_field: options.enable_dynamic_field.unwrap_or(true),
            auto_id: options.auto_id.unwrap_or(true),
            index_type: options
                .index_type
                .unwrap_or_else(|| DEFAULT_INDEX_TYPE.to_string()),
        })
    }

    /// Build from a JSON object of option names to values. Unknown keys are rejected.
    pub fn from_options(value: serde_json::Value) -> Result<Self, ConfigError> {
        let options: MilvusConfigOptions =
            serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        Self::new(options)
    }

    pub fn cluster_endpoint(&self) -> &str {
        &self.cluster_endpoint
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type.clone()
    }

    pub fn enable_dynamic_field(&self) -> bool {
        self.enable_dynamic_field
    }

    pub fn auto_id(&self) -> bool {
        self.auto_id
    }

    pub fn index_type(&self) -> &str {
        &self.index_type
    }
}

// Keep the token out of logs
impl fmt::Debug for MilvusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilvusConfig")
            .field("cluster_endpoint", &self.cluster_endpoint)
            .field("token", &"***")
            .field("collection_name", &self.collection_name)
            .field("dimension", &self.dimension)
            .field("metric_type", &self.metric_type)
            .field("enable_dynamic_field", &self.enable_dynamic_field)
            .field("auto_id", &self.auto_id)
            .field("index_type", &self.index_type)
            .finish()
    }
}

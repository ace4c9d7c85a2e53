pub mod milvus;

use crate::config::MetricType;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Collection creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionParams {
    pub collection_name: String,
    pub dimension: usize,
    pub metric_type: MetricType,
    pub auto_id: bool,
    pub index_type: String,
    pub enable_dynamic_field: bool,
}

/// Vectors to write into a collection, with explicit IDs when auto-id is off
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub collection_name: String,
    pub vectors: Vec<Vec<f32>>,
    pub ids: Option<Vec<i64>>,
}

/// Single-vector similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collection_name: String,
    pub query_vector: Vec<f32>,
    pub limit: usize,
}

/// One row of a search result, as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// `null` when the primary key is not named `id`; the key then sits in `fields`
    #[serde(default)]
    pub id: serde_json::Value,
    pub distance: f32,
    /// Output and dynamic fields returned alongside the hit
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Connection to a vector store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VectorStoreClient: Send + Sync {
    async fn create_collection(&self, params: CollectionParams) -> Result<()>;
    async fn insert(&self, request: InsertRequest) -> Result<()>;
    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>>;
}

//! Validated Milvus/Zilliz configuration and a thin client facade for one collection.

pub mod config;
pub mod store;
pub mod vector_db;

pub use config::{ConfigError, MetricType, MilvusConfig, MilvusConfigOptions};
pub use store::{MilvusStore, DEFAULT_SEARCH_LIMIT};
pub use vector_db::milvus::MilvusRestClient;
pub use vector_db::{CollectionParams, InsertRequest, SearchHit, SearchRequest, VectorStoreClient};

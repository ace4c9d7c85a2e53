//! Facade over a single configured Milvus collection.

use crate::config::MilvusConfig;
use crate::vector_db::milvus::MilvusRestClient;
use crate::vector_db::{
    CollectionParams, InsertRequest, SearchHit, SearchRequest, VectorStoreClient,
};
use anyhow::Result;
use std::sync::Arc;

/// Result count used when callers have no preference
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Validated configuration plus the store connection it targets.
///
/// Every operation is forwarded unchanged to the underlying client; failures
/// are logged and returned as-is, without retry.
pub struct MilvusStore {
    config: MilvusConfig,
    client: Arc<dyn VectorStoreClient>,
}

impl MilvusStore {
    /// Build a REST client for the configured cluster. Nothing is sent until the
    /// first operation, so an unreachable cluster surfaces there.
    pub fn connect(config: MilvusConfig) -> Result<Self> {
        let client = MilvusRestClient::new(config.cluster_endpoint(), config.token())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Wrap an already opened store client
    pub fn with_client(config: MilvusConfig, client: Arc<dyn VectorStoreClient>) -> Self {
        tracing::info!("Milvus client initialized successfully.");
        Self { config, client }
    }

    pub fn config(&self) -> &MilvusConfig {
        &self.config
    }

    /// Create the configured collection
    pub async fn create_collection(&self) -> Result<()> {
        let params = CollectionParams {
            collection_name: self.config.collection_name().to_string(),
            dimension: self.config.dimension(),
            metric_type: self.config.metric_type(),
            auto_id: self.config.auto_id(),
            index_type: self.config.index_type().to_string(),
            enable_dynamic_field: self.config.enable_dynamic_field(),
        };

        match self.client.create_collection(params).await {
            Ok(()) => {
                tracing::info!(
                    "Collection '{}' created successfully.",
                    self.config.collection_name()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to create collection: {}", e);
                Err(e)
            }
        }
    }

    /// Insert `vectors`; pass `ids` only when the collection does not generate them
    pub async fn insert_vectors(
        &self,
        vectors: Vec<Vec<f32>>,
        ids: Option<Vec<i64>>,
    ) -> Result<()> {
        let count = vectors.len();
        let request = InsertRequest {
            collection_name: self.config.collection_name().to_string(),
            vectors,
            ids,
        };

        match self.client.insert(request).await {
            Ok(()) => {
                tracing::info!(
                    "Inserted {} vectors into collection '{}'.",
                    count,
                    self.config.collection_name()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to insert vectors: {}", e);
                Err(e)
            }
        }
    }

    /// Return up to `limit` hits nearest to `query_vector`, exactly as the store ranks them
    pub async fn search_vectors(
        &self,
        query_vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            collection_name: self.config.collection_name().to_string(),
            query_vector,
            limit,
        };

        match self.client.search(request).await {
            Ok(results) => {
                tracing::info!("Search completed. Found {} similar vectors.", results.len());
                Ok(results)
            }
            Err(e) => {
                tracing::error!("Failed to search vectors: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for MilvusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MilvusStore")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MetricType, MilvusConfigOptions};
    use crate::vector_db::MockVectorStoreClient;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (buffer, guard)
    }

    fn test_config() -> MilvusConfig {
        MilvusConfig::new(
            MilvusConfigOptions::new("localhost:19530", "t", 3).with_collection_name("test"),
        )
        .unwrap()
    }

    fn store_with(mock: MockVectorStoreClient) -> MilvusStore {
        MilvusStore::with_client(test_config(), Arc::new(mock))
    }

    #[test]
    fn connect_builds_rest_client_without_network() {
        let store = MilvusStore::connect(test_config()).unwrap();
        assert_eq!(store.config().collection_name(), "test");
    }

    #[tokio::test]
    async fn create_collection_forwards_config() {
        let mut mock = MockVectorStoreClient::new();
        mock.expect_create_collection()
            .with(eq(CollectionParams {
                collection_name: "test".to_string(),
                dimension: 3,
                metric_type: MetricType::Ip,
                auto_id: true,
                index_type: "AUTOINDEX".to_string(),
                enable_dynamic_field: true,
            }))
            .times(1)
            .returning(|_| Ok(()));

        store_with(mock).create_collection().await.unwrap();
    }

    #[tokio::test]
    async fn create_collection_failure_is_returned_unchanged() {
        let mut mock = MockVectorStoreClient::new();
        mock.expect_create_collection()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("collection already exists")));

        let err = store_with(mock).create_collection().await.unwrap_err();
        assert_eq!(err.to_string(), "collection already exists");
    }

    #[tokio::test]
    async fn insert_without_ids_forwards_vectors_as_given() {
        let vectors = vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6], vec![0.7, 0.8, 0.9]];

        let mut mock = MockVectorStoreClient::new();
        mock.expect_insert()
            .with(eq(InsertRequest {
                collection_name: "test".to_string(),
                vectors: vectors.clone(),
                ids: None,
            }))
            .times(1)
            .returning(|_| Ok(()));

        store_with(mock).insert_vectors(vectors, None).await.unwrap();
    }

    #[tokio::test]
    async fn insert_with_ids_forwards_them_in_order() {
        let mut mock = MockVectorStoreClient::new();
        mock.expect_insert()
            .withf(|request| request.ids == Some(vec![3, 1, 2]) && request.vectors.len() == 3)
            .times(1)
            .returning(|_| Ok(()));

        store_with(mock)
            .insert_vectors(vec![vec![1.0; 3], vec![2.0; 3], vec![3.0; 3]], Some(vec![3, 1, 2]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn insert_failure_is_returned_unchanged() {
        let mut mock = MockVectorStoreClient::new();
        mock.expect_insert()
            .returning(|_| Err(anyhow::anyhow!("dimension mismatch")));

        let err = store_with(mock)
            .insert_vectors(vec![vec![1.0, 2.0]], None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "dimension mismatch");
    }

    #[tokio::test]
    async fn search_returns_store_hits_verbatim() {
        let hits = vec![
            SearchHit {
                id: json!(2),
                distance: 0.2,
                fields: serde_json::Map::new(),
            },
            SearchHit {
                id: json!(1),
                distance: 0.9,
                fields: serde_json::Map::new(),
            },
        ];
        let returned = hits.clone();

        let mut mock = MockVectorStoreClient::new();
        mock.expect_search()
            .with(eq(SearchRequest {
                collection_name: "test".to_string(),
                query_vector: vec![0.1, 0.2, 0.3],
                limit: DEFAULT_SEARCH_LIMIT,
            }))
            .times(1)
            .returning(move |_| Ok(returned.clone()));

        let results = store_with(mock)
            .search_vectors(vec![0.1, 0.2, 0.3], DEFAULT_SEARCH_LIMIT)
            .await
            .unwrap();
        assert_eq!(results, hits);
    }

    #[tokio::test]
    async fn search_failure_is_returned_unchanged() {
        let mut mock = MockVectorStoreClient::new();
        mock.expect_search()
            .returning(|_| Err(anyhow::anyhow!("collection not loaded")));

        let err = store_with(mock)
            .search_vectors(vec![0.0, 0.0, 0.0], 5)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "collection not loaded");
    }

    #[tokio::test]
    async fn each_call_is_forwarded_separately() {
        let mut mock = MockVectorStoreClient::new();
        mock.expect_create_collection()
            .times(2)
            .returning(|_| Ok(()));

        let store = store_with(mock);
        store.create_collection().await.unwrap();
        store.create_collection().await.unwrap();
    }

    #[tokio::test]
    async fn insert_logs_count_on_success() {
        let (logs, _guard) = capture_logs();
        let mut mock = MockVectorStoreClient::new();
        mock.expect_insert().returning(|_| Ok(()));

        store_with(mock)
            .insert_vectors(vec![vec![0.1; 3], vec![0.2; 3], vec![0.3; 3]], None)
            .await
            .unwrap();

        let output = logs.contents();
        assert!(output.contains("INFO"));
        assert!(output.contains("Inserted 3 vectors into collection 'test'."));
    }

    #[tokio::test]
    async fn insert_logs_error_on_failure() {
        let (logs, _guard) = capture_logs();
        let mut mock = MockVectorStoreClient::new();
        mock.expect_insert()
            .returning(|_| Err(anyhow::anyhow!("dimension mismatch")));

        let _ = store_with(mock).insert_vectors(vec![vec![1.0]], None).await;

        let output = logs.contents();
        assert!(output.contains("ERROR"));
        assert!(output.contains("Failed to insert vectors: dimension mismatch"));
        assert!(!output.contains("Inserted"));
    }

    #[tokio::test]
    async fn create_and_search_log_both_outcomes() {
        let (logs, _guard) = capture_logs();
        let mut mock = MockVectorStoreClient::new();
        mock.expect_create_collection().returning(|_| Ok(()));
        mock.expect_search()
            .returning(|_| Err(anyhow::anyhow!("collection not loaded")));

        let store = store_with(mock);
        store.create_collection().await.unwrap();
        let _ = store.search_vectors(vec![0.0; 3], 5).await;

        let output = logs.contents();
        assert!(output.contains("Milvus client initialized successfully."));
        assert!(output.contains("Collection 'test' created successfully."));
        assert!(output.contains("Failed to search vectors: collection not loaded"));
    }

    #[tokio::test]
    async fn create_collection_logs_error_on_failure() {
        let (logs, _guard) = capture_logs();
        let mut mock = MockVectorStoreClient::new();
        mock.expect_create_collection()
            .returning(|_| Err(anyhow::anyhow!("collection already exists")));

        let _ = store_with(mock).create_collection().await;

        assert!(logs
            .contents()
            .contains("Failed to create collection: collection already exists"));
    }

    #[tokio::test]
    async fn search_logs_result_count() {
        let (logs, _guard) = capture_logs();
        let mut mock = MockVectorStoreClient::new();
        mock.expect_search().returning(|_| {
            Ok(vec![SearchHit {
                id: json!(1),
                distance: 0.5,
                fields: serde_json::Map::new(),
            }])
        });

        store_with(mock)
            .search_vectors(vec![0.0; 3], DEFAULT_SEARCH_LIMIT)
            .await
            .unwrap();

        assert!(logs
            .contents()
            .contains("Search completed. Found 1 similar vectors."));
    }
}

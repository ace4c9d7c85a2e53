use super::{CollectionParams, InsertRequest, SearchHit, SearchRequest, VectorStoreClient};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const PRIMARY_FIELD: &str = "id";
const VECTOR_FIELD: &str = "vector";

/// Milvus/Zilliz client (using the v2 REST API)
pub struct MilvusRestClient {
    client: Client,
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCollectionBody {
    collection_name: String,
    dimension: usize,
    metric_type: String,
    id_type: &'static str,
    #[serde(rename = "autoID")]
    auto_id: bool,
    primary_field_name: &'static str,
    vector_field_name: &'static str,
    index_params: Vec<IndexParam>,
    params: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexParam {
    field_name: &'static str,
    index_name: &'static str,
    metric_type: String,
    params: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertBody {
    collection_name: String,
    data: Vec<InsertRow>,
}

#[derive(Debug, Serialize)]
struct InsertRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    vector: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    collection_name: String,
    data: Vec<Vec<f32>>,
    anns_field: &'static str,
    limit: usize,
    output_fields: Vec<&'static str>,
}

/// Envelope every v2 endpoint answers with; `code` is non-zero on failure
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl MilvusRestClient {
    /// Build a client for `endpoint`, authenticating every request with `token`.
    /// No request is sent until the first operation.
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Milvus token is not a valid header value")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            address: normalize_endpoint(endpoint),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn create_collection_url(&self) -> String {
        format!("{}/v2/vectordb/collections/create", self.address)
    }

    fn insert_url(&self) -> String {
        format!("{}/v2/vectordb/entities/insert", self.address)
    }

    fn search_url(&self) -> String {
        format!("{}/v2/vectordb/entities/search", self.address)
    }

    async fn post<B, T>(&self, url: String, body: &B, what: &str) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Milvus API error ({}): {}", status, body);
        }

        let api_response: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))?;

        into_data(api_response)
    }
}

/// The REST API needs a scheme; `localhost:19530` means plain HTTP
fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

fn into_data<T>(response: ApiResponse<T>) -> Result<Option<T>> {
    if response.code != 0 {
        anyhow::bail!(
            "Milvus API error (code {}): {}",
            response.code,
            response.message.unwrap_or_default()
        );
    }
    Ok(response.data)
}

fn create_collection_body(params: CollectionParams) -> CreateCollectionBody {
    let metric_type = params.metric_type.as_str().to_string();
    CreateCollectionBody {
        collection_name: params.collection_name,
        dimension: params.dimension,
        metric_type: metric_type.clone(),
        id_type: "Int64",
        auto_id: params.auto_id,
        primary_field_name: PRIMARY_FIELD,
        vector_field_name: VECTOR_FIELD,
        index_params: vec![IndexParam {
            field_name: VECTOR_FIELD,
            index_name: VECTOR_FIELD,
            metric_type,
            params: json!({ "index_type": params.index_type }),
        }],
        params: json!({ "enableDynamicField": params.enable_dynamic_field }),
    }
}

fn insert_body(request: InsertRequest) -> Result<InsertBody> {
    let data = match request.ids {
        Some(ids) => {
            if ids.len() != request.vectors.len() {
                anyhow::bail!(
                    "Vectors ({}) and ids ({}) length mismatch",
                    request.vectors.len(),
                    ids.len()
                );
            }
            ids.into_iter()
                .zip(request.vectors)
                .map(|(id, vector)| InsertRow {
                    id: Some(id),
                    vector,
                })
                .collect()
        }
        None => request
            .vectors
            .into_iter()
            .map(|vector| InsertRow { id: None, vector })
            .collect(),
    };

    Ok(InsertBody {
        collection_name: request.collection_name,
        data,
    })
}

fn search_body(request: SearchRequest) -> SearchBody {
    SearchBody {
        collection_name: request.collection_name,
        data: vec![request.query_vector],
        anns_field: VECTOR_FIELD,
        limit: request.limit,
        output_fields: vec!["*"],
    }
}

#[async_trait::async_trait]
impl VectorStoreClient for MilvusRestClient {
    async fn create_collection(&self, params: CollectionParams) -> Result<()> {
        let body = create_collection_body(params);
        self.post::<_, serde_json::Value>(self.create_collection_url(), &body, "create collection")
            .await?;
        Ok(())
    }

    async fn insert(&self, request: InsertRequest) -> Result<()> {
        let body = insert_body(request)?;
        self.post::<_, serde_json::Value>(self.insert_url(), &body, "insert")
            .await?;
        Ok(())
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>> {
        let body = search_body(request);
        let hits = self
            .post::<_, Vec<SearchHit>>(self.search_url(), &body, "search")
            .await?;
        Ok(hits.unwrap_or_default())
    }
}

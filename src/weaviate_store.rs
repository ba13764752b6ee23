//! Weaviate-backed [`VectorStore`] over the REST and GraphQL APIs.
//!
//! Each chunk is one object in a single class (default `Documents`) with
//! text properties `filename`, `content`, `doc_hash` and a caller-supplied
//! vector. The object id is a UUIDv5 of the digest, so the database itself
//! rejects a second object with the same digest.
//!
//! The class is created with `l2-squared` distance; distances coming back
//! from `nearVector` are square-rooted so scores match the other backends.
//!
//! Weaviate has no transactions. [`insert_batch`](VectorStore::insert_batch)
//! deletes the objects it created when a later write in the same batch fails.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use docvec_core::models::{Neighbor, StoreStats, StoredRecord};
use docvec_core::store::{check_dims, InsertOutcome, VectorStore};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const SCAN_PAGE_SIZE: usize = 500;

pub struct WeaviateStore {
    client: reqwest::Client,
    base_url: String,
    class: String,
    dims: usize,
}

impl WeaviateStore {
    pub fn new(url: &str, class: &str, dims: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            class: class.to_string(),
            dims,
        })
    }

    fn object_url(&self, digest: &str) -> String {
        format!(
            "{}/v1/objects/{}/{}",
            self.base_url,
            self.class,
            object_id(digest)
        )
    }

    async fn graphql(&self, query: String) -> Result<Value> {
        let resp = self
            .client
            .post(format!("{}/v1/graphql", self.base_url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .with_context(|| format!("Weaviate unreachable at {}", self.base_url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Weaviate GraphQL error {}: {}", status, body);
        }

        let body: Value = resp.json().await?;
        if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
            bail!("Weaviate GraphQL error: {}", errors);
        }
        Ok(body)
    }

    async fn create_object(&self, record: &StoredRecord) -> Result<InsertOutcome> {
        let resp = self
            .client
            .post(format!("{}/v1/objects", self.base_url))
            .json(&object_body(&self.class, record))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(InsertOutcome::Inserted);
        }
        let body = resp.text().await.unwrap_or_default();
        if is_duplicate_response(status, &body) {
            return Ok(InsertOutcome::Duplicate);
        }
        bail!("Weaviate insert error {}: {}", status, body)
    }

    async fn delete_object(&self, digest: &str) -> Result<()> {
        let resp = self.client.delete(self.object_url(digest)).send().await?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            bail!("Weaviate delete error {}", status)
        }
    }

    async fn count_objects(&self) -> Result<u64> {
        let body = self.graphql(aggregate_count_query(&self.class)).await?;
        parse_aggregate_count(&body, &self.class)
    }

    async fn distinct_filenames(&self) -> Result<u64> {
        let mut files: HashSet<String> = HashSet::new();
        let mut after: Option<String> = None;

        let limit = SCAN_PAGE_SIZE.to_string();

        loop {
            let mut req = self
                .client
                .get(format!("{}/v1/objects", self.base_url))
                .query(&[("class", self.class.as_str()), ("limit", limit.as_str())]);
            if let Some(cursor) = &after {
                req = req.query(&[("after", cursor.as_str())]);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                bail!("Weaviate list error {}: {}", status, body);
            }
            let body: Value = resp.json().await?;
            let (names, last_id) = parse_object_page(&body)?;
            let page_len = names.len();
            files.extend(names);

            match last_id {
                Some(id) if page_len == SCAN_PAGE_SIZE => after = Some(id),
                _ => break,
            }
        }

        Ok(files.len() as u64)
    }
}

#[async_trait]
impl VectorStore for WeaviateStore {
    fn backend(&self) -> &'static str {
        "weaviate"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn ensure_schema(&self) -> Result<()> {
        let resp = self
            .client
            .get(format!("{}/v1/schema/{}", self.base_url, self.class))
            .send()
            .await
            .with_context(|| format!("Weaviate unreachable at {}", self.base_url))?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let resp = self
                    .client
                    .post(format!("{}/v1/schema", self.base_url))
                    .json(&class_schema(&self.class))
                    .send()
                    .await?;
                let status = resp.status();
                if status.is_success() {
                    tracing::info!(class = %self.class, "created Weaviate class");
                    return Ok(());
                }
                let body = resp.text().await.unwrap_or_default();
                // Another process may have created it between the two calls.
                if body.contains("already exists") {
                    return Ok(());
                }
                bail!("Weaviate schema error {}: {}", status, body)
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                bail!("Weaviate schema error {}: {}", status, body)
            }
        }
    }

    async fn exists(&self, digest: &str) -> Result<bool> {
        let resp = self.client.head(self.object_url(digest)).send().await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => bail!("Weaviate exists check error {}", s),
        }
    }

    async fn insert_batch(&self, records: &[StoredRecord]) -> Result<Vec<InsertOutcome>> {
        for r in records {
            check_dims(self.dims, r.vector.len())?;
        }

        let mut outcomes = Vec::with_capacity(records.len());
        let mut created: Vec<&str> = Vec::new();

        for r in records {
            match self.create_object(r).await {
                Ok(outcome) => {
                    if outcome.is_inserted() {
                        created.push(&r.digest);
                    }
                    outcomes.push(outcome);
                }
                Err(e) => {
                    for digest in created {
                        if let Err(del) = self.delete_object(digest).await {
                            tracing::warn!(digest, error = %del, "rollback delete failed");
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(outcomes)
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dims(self.dims, query.len())?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let body = self.graphql(near_vector_query(&self.class, query, k)).await?;
        parse_near_vector(&body, &self.class)
    }

    async fn aggregate_stats(&self) -> Result<StoreStats> {
        let total_chunks = self.count_objects().await?;
        let unique_files = if total_chunks == 0 {
            0
        } else {
            self.distinct_filenames().await?
        };
        Ok(StoreStats {
            unique_files,
            total_chunks,
        })
    }

    async fn count(&self) -> Result<u64> {
        self.count_objects().await
    }
}

/// Deterministic object id for a digest.
pub fn object_id(digest: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, digest.as_bytes())
}

fn class_schema(class: &str) -> Value {
    json!({
        "class": class,
        "vectorizer": "none",
        "vectorIndexConfig": { "distance": "l2-squared" },
        "properties": [
            { "name": "filename", "dataType": ["text"] },
            { "name": "content", "dataType": ["text"] },
            { "name": "doc_hash", "dataType": ["text"] }
        ]
    })
}

fn object_body(class: &str, record: &StoredRecord) -> Value {
    json!({
        "class": class,
        "id": object_id(&record.digest).to_string(),
        "properties": {
            "filename": record.filename,
            "content": record.content,
            "doc_hash": record.digest
        },
        "vector": record.vector
    })
}

fn is_duplicate_response(status: StatusCode, body: &str) -> bool {
    status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("already exists")
}

fn near_vector_query(class: &str, vector: &[f32], k: usize) -> String {
    let components: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!(
        "{{ Get {{ {}(nearVector: {{ vector: [{}] }}, limit: {}) {{ filename content _additional {{ distance }} }} }} }}",
        class,
        components.join(","),
        k
    )
}

fn parse_near_vector(body: &Value, class: &str) -> Result<Vec<Neighbor>> {
    let items = body
        .pointer(&format!("/data/Get/{}", class))
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("Invalid Weaviate response: missing data.Get.{}", class))?;

    items
        .iter()
        .map(|item| {
            let squared = item
                .pointer("/_additional/distance")
                .and_then(|d| d.as_f64())
                .ok_or_else(|| anyhow!("Invalid Weaviate response: missing distance"))?;
            Ok(Neighbor {
                filename: string_field(item, "filename"),
                content: string_field(item, "content"),
                distance: squared.max(0.0).sqrt(),
            })
        })
        .collect()
}

fn aggregate_count_query(class: &str) -> String {
    format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", class)
}

fn parse_aggregate_count(body: &Value, class: &str) -> Result<u64> {
    body.pointer(&format!("/data/Aggregate/{}/0/meta/count", class))
        .and_then(|c| c.as_u64())
        .ok_or_else(|| anyhow!("Invalid Weaviate response: missing meta count"))
}

/// Filenames on one page of `GET /v1/objects`, plus the last object id.
fn parse_object_page(body: &Value) -> Result<(Vec<String>, Option<String>)> {
    let objects = match body.get("objects") {
        Some(Value::Array(objects)) => objects,
        Some(Value::Null) | None => return Ok((Vec::new(), None)),
        Some(_) => bail!("Invalid Weaviate response: objects is not an array"),
    };
    let names = objects
        .iter()
        .map(|o| string_field(o.get("properties").unwrap_or(&Value::Null), "filename"))
        .collect();
    let last_id = objects
        .last()
        .and_then(|o| o.get("id"))
        .and_then(|id| id.as_str())
        .map(str::to_string);
    Ok((names, last_id))
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

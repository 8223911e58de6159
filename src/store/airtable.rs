//! Airtable REST client (API v0) implementing [`RecordStore`] via reqwest.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::schema::AirtableConfig;
use crate::errors::StoreError;
use crate::store::{Record, RecordStore, SelectQuery, Table};

const API_ROOT: &str = "https://api.airtable.com/v0";

/// Airtable-backed record store. Cheap to clone; the reqwest client pools
/// connections internally.
#[derive(Clone)]
pub struct AirtableStore {
    client: reqwest::Client,
    api_key: String,
    base_id: String,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(default)]
    records: Vec<Record>,
}

impl AirtableStore {
    /// Create a store client for the configured base.
    pub fn new(config: &AirtableConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{API_ROOT}/{}/{}", self.base_id, table.name())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RecordStore for AirtableStore {
    async fn select(&self, table: Table, query: SelectQuery) -> Result<Vec<Record>, StoreError> {
        let mut params: Vec<(String, String)> = Vec::new();
        if let Some(view) = &query.view {
            params.push(("view".to_string(), view.clone()));
        }
        if let Some(formula) = &query.filter_by_formula {
            params.push(("filterByFormula".to_string(), formula.clone()));
        }
        if let Some((field, direction)) = &query.sort {
            params.push(("sort[0][field]".to_string(), field.clone()));
            params.push(("sort[0][direction]".to_string(), direction.as_str().to_string()));
        }
        if let Some(max) = query.max_records {
            params.push(("maxRecords".to_string(), max.to_string()));
        }
        for field in &query.fields {
            params.push(("fields[]".to_string(), field.clone()));
        }

        debug!(table = table.name(), ?params, "store select");
        let response = self
            .client
            .get(self.table_url(table))
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        let response = Self::check(response).await?;
        let payload: SelectResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(payload.records)
    }

    async fn create(&self, table: Table, fields: Map<String, Value>) -> Result<Record, StoreError> {
        debug!(table = table.name(), "store create");
        let response = self
            .client
            .post(self.table_url(table))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn destroy(&self, table: Table, id: &str) -> Result<(), StoreError> {
        debug!(table = table.name(), id, "store destroy");
        let response = self
            .client
            .delete(format!("{}/{}", self.table_url(table), id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }
}

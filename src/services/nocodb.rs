use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::{InvoiceRecord, ListQuery, ListResponse, OtherEmail, ProcessingLog};

/// Table identifiers of the POC mailing base.
pub mod tables {
    pub const INVOICES: &str = "mhb90l86e3msa85";
    pub const OTHER_EMAILS: &str = "m5dswefkm5vdiw2";
    pub const PROCESSING_LOGS: &str = "mnjuqujmjar4s13";
}

#[derive(Debug, thiserror::Error)]
pub enum NocoDbError {
    #[error("NocoDB request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("NocoDB API error: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("NocoDB response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of invoice pages, the seam between the store and the backing API.
#[async_trait]
pub trait InvoiceSource: Send + Sync {
    async fn list_invoices(&self, query: &ListQuery)
        -> Result<ListResponse<InvoiceRecord>, NocoDbError>;
}

#[derive(Clone)]
pub struct NocoDbClient {
    http: Client,
    base_url: String,
    token: String,
}

impl NocoDbClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        NocoDbClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/api/v2/tables/{}/records", self.base_url, table)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("xc-token", &self.token)
            .header("Content-Type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, NocoDbError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("").to_string();
            tracing::warn!("NocoDB returned {} {}", status.as_u16(), reason);
            return Err(NocoDbError::Status {
                status: status.as_u16(),
                reason,
            });
        }
        let body = response.text().await?;
        // DELETE may answer with an empty body
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &ListQuery,
    ) -> Result<ListResponse<T>, NocoDbError> {
        let url = self.records_url(table);
        tracing::debug!("GET {} {:?}", url, query);
        self.send(self.request(Method::GET, &url).query(&query.to_pairs()))
            .await
    }

    pub async fn get<T: DeserializeOwned>(&self, table: &str, id: i64) -> Result<T, NocoDbError> {
        let url = format!("{}/{}", self.records_url(table), id);
        tracing::debug!("GET {}", url);
        self.send(self.request(Method::GET, &url)).await
    }

    pub async fn create<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        data: &B,
    ) -> Result<T, NocoDbError> {
        let url = self.records_url(table);
        tracing::debug!("POST {}", url);
        self.send(self.request(Method::POST, &url).json(data)).await
    }

    /// Partial update; `data` is merged with the record id into one body.
    pub async fn update(
        &self,
        table: &str,
        id: i64,
        data: &Map<String, Value>,
    ) -> Result<Value, NocoDbError> {
        let mut body = Map::new();
        body.insert("Id".to_string(), json!(id));
        for (key, value) in data {
            if key != "Id" {
                body.insert(key.clone(), value.clone());
            }
        }
        let url = self.records_url(table);
        tracing::debug!("PATCH {} id={}", url, id);
        self.send(self.request(Method::PATCH, &url).json(&Value::Object(body)))
            .await
    }

    pub async fn delete(&self, table: &str, id: i64) -> Result<(), NocoDbError> {
        let url = self.records_url(table);
        tracing::debug!("DELETE {} id={}", url, id);
        let _: Value = self
            .send(self.request(Method::DELETE, &url).json(&json!({ "Id": id })))
            .await?;
        Ok(())
    }

    pub async fn get_invoice(&self, id: i64) -> Result<InvoiceRecord, NocoDbError> {
        self.get(tables::INVOICES, id).await
    }

    pub async fn create_invoice(
        &self,
        data: &Map<String, Value>,
    ) -> Result<InvoiceRecord, NocoDbError> {
        self.create(tables::INVOICES, data).await
    }

    pub async fn update_invoice(
        &self,
        id: i64,
        data: &Map<String, Value>,
    ) -> Result<Value, NocoDbError> {
        self.update(tables::INVOICES, id, data).await
    }

    pub async fn delete_invoice(&self, id: i64) -> Result<(), NocoDbError> {
        self.delete(tables::INVOICES, id).await
    }

    pub async fn list_other_emails(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<ListResponse<OtherEmail>, NocoDbError> {
        let query = ListQuery {
            limit,
            offset,
            ..ListQuery::default()
        };
        self.list(tables::OTHER_EMAILS, &query).await
    }

    pub async fn get_other_email(&self, id: i64) -> Result<OtherEmail, NocoDbError> {
        self.get(tables::OTHER_EMAILS, id).await
    }

    pub async fn list_processing_logs(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
        invoice_id: Option<i64>,
    ) -> Result<ListResponse<ProcessingLog>, NocoDbError> {
        let query = ListQuery {
            limit,
            offset,
            sort: None,
            filter: invoice_id
                .filter(|id| *id != 0)
                .map(|id| format!("(invoice_id,eq,{})", id)),
        };
        self.list(tables::PROCESSING_LOGS, &query).await
    }
}

#[async_trait]
impl InvoiceSource for NocoDbClient {
    async fn list_invoices(
        &self,
        query: &ListQuery,
    ) -> Result<ListResponse<InvoiceRecord>, NocoDbError> {
        self.list(tables::INVOICES, query).await
    }
}

use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde::Serialize;

use crate::models::Action;
use crate::services::store::InvoiceStore;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Webhook failed with status {0}")]
    Status(u16),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Action '{0}' is still in progress")]
    Busy(&'static str),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionPayload {
    invoice_id: i64,
}

/// Client for the n8n workflow endpoint.
#[derive(Clone)]
pub struct WorkflowClient {
    http: Client,
    base_url: String,
}

impl WorkflowClient {
    pub fn new(base_url: &str) -> Self {
        WorkflowClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn action_url(&self, action: Action) -> String {
        format!("{}/invoice/{}", self.base_url, action.as_str())
    }

    pub async fn trigger(&self, action: Action, invoice_id: i64) -> Result<(), WebhookError> {
        let url = self.action_url(action);
        tracing::debug!("POST {} invoice={}", url, invoice_id);
        let response = self
            .http
            .post(&url)
            .json(&ActionPayload { invoice_id })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WebhookError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Sends reviewer actions and refreshes the store once one succeeds.
///
/// Only one action may be outstanding at a time across all action kinds.
#[derive(Clone)]
pub struct ActionDispatcher {
    workflow: WorkflowClient,
    store: InvoiceStore,
    pending: Arc<Mutex<Option<Action>>>,
}

struct PendingGuard<'a> {
    slot: &'a Mutex<Option<Action>>,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}

impl ActionDispatcher {
    pub fn new(workflow: WorkflowClient, store: InvoiceStore) -> Self {
        ActionDispatcher {
            workflow,
            store,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// The action currently in flight, if any.
    pub fn pending(&self) -> Option<Action> {
        *self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn claim(&self, action: Action) -> Result<PendingGuard<'_>, DispatchError> {
        let mut slot = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(current) = *slot {
            return Err(DispatchError::Busy(current.as_str()));
        }
        *slot = Some(action);
        Ok(PendingGuard {
            slot: self.pending.as_ref(),
        })
    }

    pub async fn dispatch(&self, action: Action, invoice_id: i64) -> Result<(), DispatchError> {
        let _guard = self.claim(action)?;

        if let Err(err) = self.workflow.trigger(action, invoice_id).await {
            tracing::error!("Error calling {} webhook: {}", action.as_str(), err);
            return Err(err.into());
        }

        tracing::info!("Action {} accepted for invoice {}", action.as_str(), invoice_id);
        self.store.refresh().await;
        Ok(())
    }
}

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::models::{InvoiceRecord, Settings};
use crate::services::nocodb::NocoDbClient;
use crate::services::store::InvoiceStore;
use crate::services::webhook::{ActionDispatcher, WorkflowClient};

/// Everything a command needs, wired from one set of settings.
pub struct AppState {
    pub settings: Settings,
    pub nocodb: NocoDbClient,
    pub store: InvoiceStore,
    pub dispatcher: ActionDispatcher,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let nocodb = NocoDbClient::new(&settings.nocodb_url, &settings.nocodb_token);
        let store = InvoiceStore::new(Arc::new(nocodb.clone()), settings.page_size);
        let dispatcher =
            ActionDispatcher::new(WorkflowClient::new(&settings.webhook_url), store.clone());
        AppState {
            settings,
            nocodb,
            store,
            dispatcher,
        }
    }

    /// Loads the first page and fails if the backing store could not be read.
    pub async fn load(&self) -> Result<()> {
        self.store.refresh().await;
        if let Some(error) = self.store.snapshot().error() {
            return Err(anyhow!("Failed to load invoices: {}", error));
        }
        Ok(())
    }

    /// Selects `id` (or keeps the auto-selection) and returns the record.
    ///
    /// An id outside the loaded page is fetched on its own; the store's
    /// selection is left untouched in that case.
    pub async fn resolve_invoice(&self, id: Option<i64>) -> Result<InvoiceRecord> {
        match id {
            Some(id) => {
                if self.store.select_invoice(id) {
                    return self
                        .store
                        .selected()
                        .ok_or_else(|| anyhow!("Invoice {} not selected", id));
                }
                tracing::debug!("Invoice {} not in the current page, fetching it", id);
                self.nocodb
                    .get_invoice(id)
                    .await
                    .map_err(|e| anyhow!("Invoice {}: {}", id, e))
            }
            None => self
                .store
                .selected()
                .ok_or_else(|| anyhow!("No invoices found")),
        }
    }
}

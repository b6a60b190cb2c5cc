use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::{InvoiceRecord, ListQuery};
use crate::services::nocodb::InvoiceSource;

pub const DEFAULT_SORT: &str = "-CreatedAt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Errored(String),
}

#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub load_state: LoadState,
    pub invoices: Vec<InvoiceRecord>,
    pub selected: Option<InvoiceRecord>,
}

impl StoreSnapshot {
    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.load_state {
            LoadState::Errored(message) => Some(message),
            _ => None,
        }
    }
}

struct StoreState {
    load_state: LoadState,
    invoices: Vec<InvoiceRecord>,
    selected: Option<InvoiceRecord>,
}

/// Sole owner of the invoice list and the current selection.
///
/// The lock is never held across an await, so overlapping refreshes are
/// resolved by whichever response lands last.
#[derive(Clone)]
pub struct InvoiceStore {
    source: Arc<dyn InvoiceSource>,
    page_size: u32,
    state: Arc<Mutex<StoreState>>,
}

impl InvoiceStore {
    pub fn new(source: Arc<dyn InvoiceSource>, page_size: u32) -> Self {
        InvoiceStore {
            source,
            page_size,
            state: Arc::new(Mutex::new(StoreState {
                load_state: LoadState::Idle,
                invoices: Vec::new(),
                selected: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // state stays consistent between statements, so a poisoned guard is usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.lock();
        StoreSnapshot {
            load_state: state.load_state.clone(),
            invoices: state.invoices.clone(),
            selected: state.selected.clone(),
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load_state.clone()
    }

    pub fn selected(&self) -> Option<InvoiceRecord> {
        self.lock().selected.clone()
    }

    /// Selects `id` when it is in the held list; otherwise nothing changes.
    pub fn select_invoice(&self, id: i64) -> bool {
        let mut state = self.lock();
        match state.invoices.iter().find(|invoice| invoice.id == id).cloned() {
            Some(invoice) => {
                tracing::debug!("Selected invoice {}", id);
                state.selected = Some(invoice);
                true
            }
            None => {
                tracing::debug!("Invoice {} not in current page, selection unchanged", id);
                false
            }
        }
    }

    pub async fn refresh(&self) {
        self.lock().load_state = LoadState::Loading;

        let query = ListQuery {
            limit: Some(self.page_size),
            sort: Some(DEFAULT_SORT.to_string()),
            ..ListQuery::default()
        };
        let result = self.source.list_invoices(&query).await;

        let mut state = self.lock();
        match result {
            Ok(page) => {
                tracing::info!("Loaded {} invoices", page.list.len());
                state.invoices = page.list;
                let refreshed = state.selected.as_ref().and_then(|selected| {
                    state
                        .invoices
                        .iter()
                        .find(|invoice| invoice.id == selected.id)
                        .cloned()
                });
                if refreshed.is_some() {
                    state.selected = refreshed;
                } else if state.selected.is_none() {
                    state.selected = state.invoices.first().cloned();
                }
                state.load_state = LoadState::Ready;
            }
            Err(err) => {
                tracing::error!("Error fetching invoices: {}", err);
                state.load_state = LoadState::Errored(err.to_string());
            }
        }
    }
}

//! SearchEntriesHandler - Query handler for paging through the event log.

use std::sync::Arc;

use crate::domain::event_log::{
    Cursor, EntryStatus, EventLogEntry, EventLogError, PageLimit, SearchQuery,
};
use crate::domain::foundation::EntryId;
use crate::ports::LogStore;

/// Query as received from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct SearchEntriesQuery {
    pub cursor: Option<String>,
    pub status: Option<String>,
    pub limit: Option<String>,
}

impl SearchEntriesQuery {
    /// Query for everything after `cursor`.
    pub fn after(cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    fn validate(&self) -> Result<SearchQuery, EventLogError> {
        let cursor = Cursor::parse(self.cursor.as_deref())?;
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<EntryStatus>)
            .transpose()?;
        let limit = PageLimit::parse(self.limit.as_deref())?;
        Ok(SearchQuery::new(cursor, status, limit))
    }
}

/// One page of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPage {
    pub items: Vec<EventLogEntry>,
    /// Set when the page is full; pass it back to read the next page.
    pub next_cursor: Option<EntryId>,
}

/// Handler for cursor-paginated log reads.
pub struct SearchEntriesHandler {
    store: Arc<dyn LogStore>,
}

impl SearchEntriesHandler {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: SearchEntriesQuery) -> Result<EntryPage, EventLogError> {
        let search = query.validate()?;
        let items = self.store.search(&search).await?;

        let next_cursor = if items.len() as u32 >= search.limit.get() {
            items.last().map(|e| e.id)
        } else {
            None
        };

        Ok(EntryPage { items, next_cursor })
    }
}

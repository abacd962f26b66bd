use std::sync::Arc;

use tokio::sync::Mutex;

use crate::item::{now_millis, OwnerId, TrackedItem};
use crate::normalize::normalize_snapshot;
use crate::progress::{self, EditForm};
use crate::projection::{project, StatusCounts, ViewOptions};
use crate::search::{validate_query, Catalog, SearchCandidate, SearchSession};
use crate::store::{DocumentStore, Subscription};
use crate::{Error, Result};

struct ListState {
    subscription: Subscription,
    items: Arc<Vec<TrackedItem>>,
}

/// One owner's reading list for the lifetime of a session.
///
/// The list always reflects the latest snapshot from the store; actions
/// compute their write locally and leave the list itself untouched until the
/// store publishes the result. Dropping the tracker releases its
/// subscription.
pub struct Tracker {
    owner: OwnerId,
    store: Arc<dyn DocumentStore>,
    catalog: Arc<dyn Catalog>,
    search_limit: u32,
    list: Mutex<ListState>,
    search: Mutex<Option<SearchSession>>,
}

impl Tracker {
    pub async fn start(
        owner: OwnerId,
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn Catalog>,
        search_limit: u32,
    ) -> Result<Self> {
        let mut subscription = store.subscribe(&owner).await?;
        let items = Arc::new(normalize_snapshot(&subscription.latest()));

        tracing::info!(owner = %owner, items = items.len(), "Tracker started");

        Ok(Self {
            owner,
            store,
            catalog,
            search_limit,
            list: Mutex::new(ListState {
                subscription,
                items,
            }),
            search: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The full list, renormalized only when a new snapshot has arrived.
    pub async fn items(&self) -> Arc<Vec<TrackedItem>> {
        let mut list = self.list.lock().await;
        if list.subscription.has_changed() {
            let snapshot = list.subscription.latest();
            list.items = Arc::new(normalize_snapshot(&snapshot));
            tracing::debug!(owner = %self.owner, items = list.items.len(), "Applied snapshot");
        }
        Arc::clone(&list.items)
    }

    pub async fn view(&self, options: &ViewOptions) -> Vec<TrackedItem> {
        let items = self.items().await;
        project(&items, options).into_iter().cloned().collect()
    }

    pub async fn counts(&self) -> StatusCounts {
        StatusCounts::tally(&self.items().await)
    }

    pub async fn get(&self, id: &str) -> Result<TrackedItem> {
        self.items()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Step an item's chapter by `delta` and persist the result.
    pub async fn advance(&self, id: &str, delta: i64) -> Result<TrackedItem> {
        let item = self.get(id).await?;
        let next = progress::advance(&item, delta, now_millis());
        self.write(&next).await?;
        Ok(next)
    }

    /// Apply an edit form submission and persist the result.
    pub async fn edit(&self, id: &str, form: &EditForm) -> Result<TrackedItem> {
        let item = self.get(id).await?;
        let next = progress::apply_edit(&item, form, now_millis());
        self.write(&next).await?;
        Ok(next)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.store
            .delete(&self.owner, id)
            .await
            .inspect_err(|e| tracing::warn!(owner = %self.owner, item = id, "Delete failed: {}", e))
    }

    async fn write(&self, item: &TrackedItem) -> Result<()> {
        let record = item.to_record()?;
        self.store
            .replace(&self.owner, &item.id, record)
            .await
            .inspect_err(|e| {
                tracing::warn!(owner = %self.owner, item = %item.id, "Write failed: {}", e);
            })
    }

    /// Run a catalog search and make it the current result list.
    ///
    /// Queries that are too short are rejected before any request is made.
    /// A failed request clears the result list.
    pub async fn search(&self, text: &str) -> Result<Vec<SearchCandidate>> {
        let query = validate_query(text)?;

        match self.catalog.search(query, self.search_limit).await {
            Ok(records) => {
                let items = self.items().await;
                let session = SearchSession::new(&records, &items);
                let candidates = session.candidates().to_vec();
                tracing::info!(query, results = candidates.len(), "Catalog search");
                *self.search.lock().await = Some(session);
                Ok(candidates)
            }
            Err(e) => {
                tracing::warn!(query, "Catalog search failed: {}", e);
                *self.search.lock().await = None;
                Err(e)
            }
        }
    }

    /// The current result list, with `already_tracked` re-derived.
    pub async fn candidates(&self) -> Vec<SearchCandidate> {
        let items = self.items().await;
        let mut search = self.search.lock().await;
        search.as_mut().map_or_else(Vec::new, |session| {
            session.refresh(&items);
            session.candidates().to_vec()
        })
    }

    /// Add a search result to the list.
    ///
    /// Returns `Ok(None)` without writing when the candidate was already
    /// added from this result list or is already on the list.
    pub async fn track(&self, index: usize) -> Result<Option<TrackedItem>> {
        let items = self.items().await;

        let claimed = {
            let mut search = self.search.lock().await;
            let session = search.as_mut().ok_or(Error::CandidateNotFound(index))?;
            session.refresh(&items);
            session.claim(index)?
        };

        let Some(candidate) = claimed else {
            return Ok(None);
        };

        let mut item = candidate.new_item(now_millis());
        let record = item.to_record()?;
        item.id = self
            .store
            .create(&self.owner, record)
            .await
            .inspect_err(|e| tracing::warn!(owner = %self.owner, "Create failed: {}", e))?;

        tracing::info!(owner = %self.owner, item = %item.id, title = %item.title, "Tracked title");
        Ok(Some(item))
    }

    /// A separate live subscription on this owner's list.
    pub async fn watch(&self) -> Result<Subscription> {
        self.store.subscribe(&self.owner).await
    }
}

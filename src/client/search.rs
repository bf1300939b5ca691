//! Search and filter state for the marketplace listing grid.
//!
//! The controller keeps the filters a shopper is editing (`draft`) apart from
//! the filters the visible results were fetched with (`applied`). Only applied
//! filters reach the server. Free-text input is debounced; the other filters
//! apply on demand.
//!
//! Fetches are split into [`SearchController::begin_fetch`],
//! [`run_fetch`] and [`SearchController::complete_fetch`] so a frontend can run
//! the network part concurrently. Each fetch carries a generation number and
//! completions from superseded fetches are dropped.

use std::{sync::Arc, time::Duration};

use crate::{
    client::{
        api::{ClientError, MarketplaceApi},
        debounce::Debouncer,
    },
    models::{ArtisanSummary, Listing},
    response::Meta,
    routes::params::ListingQuery,
};

pub const PAGE_SIZE: i64 = 12;
pub const QUERY_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub query: String,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl Filters {
    pub fn to_query(&self, page: i64) -> ListingQuery {
        let non_blank = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        ListingQuery {
            page: Some(page),
            per_page: Some(PAGE_SIZE),
            q: non_blank(Some(self.query.as_str())),
            min_price: self.min_price,
            max_price: self.max_price,
            category: non_blank(self.category.as_deref()),
            location: non_blank(self.location.as_deref()),
            ..Default::default()
        }
    }
}

/// A listing with its seller's display data resolved.
#[derive(Debug, Clone)]
pub struct ListingCard {
    pub listing: Listing,
    pub artisan: ArtisanSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageControls {
    pub page: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: ListingQuery,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub cards: Vec<ListingCard>,
    pub meta: Meta,
}

pub struct SearchController {
    api: Arc<dyn MarketplaceApi>,
    draft: Filters,
    applied: Filters,
    page: i64,
    total_pages: i64,
    total: i64,
    results: Vec<ListingCard>,
    is_loading: bool,
    last_error: Option<String>,
    generation: u64,
    debouncer: Debouncer<String>,
}

impl SearchController {
    pub fn new(api: Arc<dyn MarketplaceApi>) -> Self {
        Self::with_debounce(api, QUERY_DEBOUNCE)
    }

    pub fn with_debounce(api: Arc<dyn MarketplaceApi>, delay: Duration) -> Self {
        Self {
            api,
            draft: Filters::default(),
            applied: Filters::default(),
            page: 1,
            total_pages: 0,
            total: 0,
            results: Vec::new(),
            is_loading: false,
            last_error: None,
            generation: 0,
            debouncer: Debouncer::new(delay),
        }
    }

    pub fn draft(&self) -> &Filters {
        &self.draft
    }

    /// Filters being edited. Changing them never triggers a fetch.
    pub fn draft_mut(&mut self) -> &mut Filters {
        &mut self.draft
    }

    pub fn applied(&self) -> &Filters {
        &self.applied
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn results(&self) -> &[ListingCard] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_pending_query(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn page_controls(&self) -> PageControls {
        PageControls {
            page: self.page,
            total_pages: self.total_pages,
            has_previous: self.page > 1,
            has_next: self.page < self.total_pages,
        }
    }

    /// Records a keystroke in the search box and restarts the debounce window.
    pub fn type_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.draft.query = text.clone();
        self.debouncer.push(text);
    }

    /// Waits for the typed query to settle, then applies it and fetches page 1.
    /// Returns `false` when no query was pending.
    pub async fn settle_query(&mut self) -> bool {
        match self.debouncer.settled().await {
            Some(query) => {
                self.apply_query(query).await;
                true
            }
            None => false,
        }
    }

    /// Non-blocking variant of [`settle_query`](Self::settle_query) for frontends
    /// that poll on their own tick.
    pub async fn poll_query(&mut self) -> bool {
        match self.debouncer.take_ready() {
            Some(query) => {
                self.apply_query(query).await;
                true
            }
            None => false,
        }
    }

    async fn apply_query(&mut self, query: String) {
        self.applied.query = query;
        self.page = 1;
        self.refresh().await;
    }

    /// Copies the draft filters (including the current search text) into the
    /// applied set and fetches page 1.
    pub async fn apply_filters(&mut self) {
        self.debouncer.cancel();
        self.applied = self.draft.clone();
        self.page = 1;
        self.refresh().await;
    }

    pub async fn clear_filters(&mut self) {
        self.debouncer.cancel();
        self.draft = Filters::default();
        self.applied = Filters::default();
        self.page = 1;
        self.refresh().await;
    }

    pub async fn next_page(&mut self) {
        if self.page_controls().has_next {
            self.page += 1;
            self.refresh().await;
        }
    }

    pub async fn previous_page(&mut self) {
        if self.page_controls().has_previous {
            self.page -= 1;
            self.refresh().await;
        }
    }

    /// Fetches the current page with the applied filters.
    pub async fn refresh(&mut self) {
        let ticket = self.begin_fetch();
        let outcome = run_fetch(self.api.as_ref(), &ticket.query).await;
        self.complete_fetch(&ticket, outcome);
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.is_loading = true;
        FetchTicket {
            generation: self.generation,
            query: self.applied.to_query(self.page),
        }
    }

    /// Applies a finished fetch. Returns `false` when the ticket was superseded
    /// and the outcome was dropped.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<FetchOutcome, ClientError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.generation,
                "discarding stale search response"
            );
            return false;
        }

        self.is_loading = false;
        match outcome {
            Ok(outcome) => {
                self.total = outcome.meta.total.unwrap_or(outcome.cards.len() as i64);
                self.total_pages = outcome.meta.total_pages();
                self.results = outcome.cards;
                self.last_error = None;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch listings");
                self.results.clear();
                self.total = 0;
                self.total_pages = 0;
                self.last_error = Some(err.to_string());
            }
        }
        true
    }
}

/// Fetches one page and resolves each listing's seller. A failed seller lookup
/// degrades to [`ArtisanSummary::fallback`] instead of failing the page.
pub async fn run_fetch(
    api: &dyn MarketplaceApi,
    query: &ListingQuery,
) -> Result<FetchOutcome, ClientError> {
    let page = api.search_listings(query).await?;
    let mut cards = Vec::with_capacity(page.items.len());
    for listing in page.items {
        let artisan = match api.artisan(listing.artisan_id).await {
            Ok(artisan) => artisan,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    artisan_id = %listing.artisan_id,
                    "seller lookup failed, using fallback"
                );
                ArtisanSummary::fallback()
            }
        };
        cards.push(ListingCard { listing, artisan });
    }
    Ok(FetchOutcome {
        cards,
        meta: page.meta,
    })
}

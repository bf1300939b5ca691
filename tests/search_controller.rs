mod common;

use std::{sync::Arc, sync::atomic::Ordering, time::Duration};

use artisan_marketplace_api::{
    client::{
        MarketplaceApi, SearchController,
        search::{FetchOutcome, PAGE_SIZE, run_fetch},
    },
    models::ArtisanSummary,
    response::Meta,
};
use common::{FakeMarketplace, summary};
use uuid::Uuid;

fn marketplace(count: usize) -> Arc<FakeMarketplace> {
    let artisans = [summary(Uuid::new_v4(), "Meera"), summary(Uuid::new_v4(), "Ravi")];
    Arc::new(FakeMarketplace::with_listings(count, &artisans))
}

fn controller(api: &Arc<FakeMarketplace>) -> SearchController {
    SearchController::new(api.clone() as Arc<dyn MarketplaceApi>)
}

#[tokio::test]
async fn first_page_holds_twelve_enriched_cards() {
    let api = marketplace(30);
    let mut search = controller(&api);
    search.refresh().await;

    assert_eq!(search.results().len(), PAGE_SIZE as usize);
    assert_eq!(search.total(), 30);
    assert!(!search.is_loading());
    assert!(search.results().iter().all(|c| c.artisan.name != "Unknown Artisan"));
    assert_eq!(api.artisan_lookups.load(Ordering::SeqCst), 12);

    let controls = search.page_controls();
    assert_eq!(controls.total_pages, 3);
    assert!(!controls.has_previous);
    assert!(controls.has_next);
}

#[tokio::test]
async fn paging_stops_at_the_boundaries() {
    let api = marketplace(20);
    let mut search = controller(&api);
    search.refresh().await;

    search.previous_page().await;
    assert_eq!(search.page(), 1);

    search.next_page().await;
    assert_eq!(search.page(), 2);
    assert_eq!(search.results().len(), 8);
    assert!(!search.page_controls().has_next);

    let fetches = api.recorded_queries().len();
    search.next_page().await;
    assert_eq!(search.page(), 2);
    assert_eq!(api.recorded_queries().len(), fetches, "no fetch past the last page");
}

#[tokio::test]
async fn editing_draft_does_not_fetch_until_applied() {
    let api = marketplace(30);
    let mut search = controller(&api);
    search.refresh().await;
    search.next_page().await;
    assert_eq!(search.page(), 2);

    search.draft_mut().min_price = Some(10_005);
    search.draft_mut().category = Some("Pottery".into());
    assert_eq!(api.recorded_queries().len(), 2);
    assert_eq!(search.applied().min_price, None);

    search.apply_filters().await;
    assert_eq!(search.page(), 1);
    assert_eq!(search.applied().min_price, Some(10_005));

    let last = api.recorded_queries().pop().unwrap();
    assert_eq!(last.page, Some(1));
    assert_eq!(last.min_price, Some(10_005));
    assert_eq!(last.category.as_deref(), Some("Pottery"));
}

#[tokio::test(start_paused = true)]
async fn typed_query_is_debounced() {
    let api = marketplace(30);
    let mut search = controller(&api);

    search.type_query("I");
    tokio::time::advance(Duration::from_millis(200)).await;
    search.type_query("It");
    tokio::time::advance(Duration::from_millis(200)).await;
    search.type_query("Item 2");

    assert!(!search.poll_query().await);
    assert!(api.recorded_queries().is_empty());
    assert_eq!(search.draft().query, "Item 2");

    assert!(search.settle_query().await);
    let queries = api.recorded_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].q.as_deref(), Some("Item 2"));
    assert_eq!(search.applied().query, "Item 2");
    // "Item 2" and "Item 20".."Item 29"
    assert_eq!(search.total(), 11);
}

#[tokio::test(start_paused = true)]
async fn settled_query_resets_page() {
    let api = marketplace(30);
    let mut search = controller(&api);
    search.refresh().await;
    search.next_page().await;
    assert_eq!(search.page(), 2);

    search.type_query("Item");
    assert!(search.settle_query().await);
    assert_eq!(search.page(), 1);
}

#[tokio::test]
async fn clear_resets_everything() {
    let api = marketplace(30);
    let mut search = controller(&api);
    search.draft_mut().location = Some("Jaipur".into());
    search.draft_mut().max_price = Some(10_010);
    search.apply_filters().await;
    search.type_query("pending text");

    search.clear_filters().await;
    assert_eq!(search.draft(), search.applied());
    assert_eq!(search.applied().location, None);
    assert_eq!(search.applied().query, "");
    assert!(!search.has_pending_query());
    assert_eq!(search.page(), 1);

    let last = api.recorded_queries().pop().unwrap();
    assert_eq!(last.location, None);
    assert_eq!(last.max_price, None);
}

#[tokio::test]
async fn failed_seller_lookup_uses_fallback() {
    let known = summary(Uuid::new_v4(), "Meera");
    let mut fake = FakeMarketplace::with_listings(2, &[known.clone()]);
    fake.listings[1].artisan_id = Uuid::new_v4();
    let api: Arc<dyn MarketplaceApi> = Arc::new(fake);

    let mut search = SearchController::new(api);
    search.refresh().await;

    let cards = search.results();
    assert_eq!(cards[0].artisan, known);
    assert_eq!(cards[1].artisan, ArtisanSummary::fallback());
    assert_eq!(cards[1].artisan.avatar, "/placeholder.svg");
}

#[tokio::test]
async fn failed_fetch_empties_results() {
    let api = marketplace(5);
    let mut search = controller(&api);
    search.refresh().await;
    assert_eq!(search.results().len(), 5);

    api.fail_search.store(true, Ordering::SeqCst);
    search.refresh().await;
    assert!(search.results().is_empty());
    assert!(search.last_error().is_some());
    assert!(!search.is_loading());

    api.fail_search.store(false, Ordering::SeqCst);
    search.refresh().await;
    assert_eq!(search.last_error(), None);
}

#[tokio::test]
async fn stale_response_is_discarded() {
    let api = marketplace(30);
    let mut search = controller(&api);

    let older = search.begin_fetch();
    let newer = search.begin_fetch();
    assert!(newer.generation > older.generation);
    assert!(search.is_loading());

    let newer_outcome = run_fetch(api.as_ref(), &newer.query).await;
    assert!(search.complete_fetch(&newer, newer_outcome));
    assert_eq!(search.total(), 30);
    assert!(!search.is_loading());

    let late = FetchOutcome {
        cards: Vec::new(),
        meta: Meta::new(1, PAGE_SIZE, 999),
    };
    assert!(!search.complete_fetch(&older, Ok(late)));
    assert_eq!(search.total(), 30);
    assert_eq!(search.results().len(), PAGE_SIZE as usize);
}

//! Feed controller behaviour against a mocked marketplace API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use classifieds_client::{MarketplaceClient, SessionToken};
use classifieds_core::{CleanedFilters, FilterState, FilterValue, Location};
use classifieds_feed::{
    FeedConfig, FeedController, FetchOutcome, FilterPanel, FilterPanelOptions, Interaction,
    NoticeLevel, ScrollMetrics, ScrollOptions, StaticLocation, ViewportEvents,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingInteraction {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
    logins: Mutex<usize>,
}

impl Interaction for RecordingInteraction {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_owned()));
    }

    fn open_login(&self) {
        *self.logins.lock().unwrap() += 1;
    }
}

fn page_body(ids: std::ops::Range<i64>, current: u32, last: u32, total: u64) -> Value {
    let items: Vec<Value> = ids.map(|id| json!({ "id": id, "title": format!("Item {id}") })).collect();
    let next = (current < last).then(|| format!("http://x/filter?page={}", current + 1));
    json!({
        "data": {
            "data": items,
            "current_page": current,
            "last_page": last,
            "total": total,
            "next_page_url": next
        }
    })
}

fn client(server: &MockServer) -> Arc<MarketplaceClient> {
    Arc::new(
        MarketplaceClient::new(&server.uri(), 5, "classifieds-test/0.1", SessionToken::default())
            .expect("client construction should not fail"),
    )
}

fn controller(
    server: &MockServer,
    location: Option<Location>,
) -> (Arc<FeedController>, Arc<RecordingInteraction>) {
    let interaction = Arc::new(RecordingInteraction::default());
    let controller = Arc::new(FeedController::new(
        client(server),
        FeedConfig {
            path: "/filter".into(),
            base_params: vec![("category_id".into(), "4".into())],
        },
        Arc::new(StaticLocation(location)),
        interaction.clone(),
    ));
    (controller, interaction)
}

fn filters(pairs: &[(&str, &str)]) -> CleanedFilters {
    pairs
        .iter()
        .map(|(k, v)| (*k, FilterValue::from(*v)))
        .collect()
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}

#[tokio::test]
async fn first_page_replaces_and_next_page_appends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..21, 1, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(21..41, 2, 3, 45)))
        .mount(&server)
        .await;

    let (feed, _) = controller(&server, None);

    assert!(feed.fetch(1, false, None).await.is_applied());
    let state = feed.snapshot();
    assert_eq!(state.items.len(), 20);
    assert!(state.has_more);
    assert!(!state.loading && !state.loading_more);

    let outcome = feed.load_more().await.expect("a next page exists");
    assert!(outcome.is_applied());
    let state = feed.snapshot();
    assert_eq!(state.items.len(), 40);
    assert_eq!(state.current_page, 2);
    assert_eq!(state.items[20].display_title(), "Item 21");
}

#[tokio::test]
async fn load_more_is_a_no_op_on_last_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..6, 1, 1, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let (feed, _) = controller(&server, None);
    feed.fetch(1, false, None).await;
    assert!(!feed.snapshot().has_more);
    assert!(feed.load_more().await.is_none());
}

#[tokio::test]
async fn filter_change_after_debounce_replaces_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "1"))
        .and(query_param_is_missing("price_range"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..21, 1, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(21..41, 2, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "1"))
        .and(query_param("price_range", "1000-5000"))
        .and(query_param("category_id", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100..105, 1, 1, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let (feed, _) = controller(&server, None);
    feed.fetch(1, false, None).await;
    feed.load_more().await;
    assert_eq!(feed.snapshot().items.len(), 40);

    let panel = FilterPanel::new(
        FilterState::with_defaults([("price_range", "")]),
        ["price_range"],
        FilterPanelOptions {
            auto_apply: true,
            debounce: Duration::from_millis(200),
        },
        feed.filter_sink(),
    );
    panel.set_filter("price_range", "1000-5000");
    assert_eq!(feed.snapshot().items.len(), 40, "no fetch before the quiet window");

    wait_until(|| feed.snapshot().items.len() == 5).await;
    let state = feed.snapshot();
    assert_eq!(state.current_page, 1);
    assert!(!state.has_more);
    assert_eq!(feed.current_filters().get("price_range"), Some("1000-5000"));
}

#[tokio::test]
async fn superseded_response_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("brand_id", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(1..4, 1, 1, 3))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("brand_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50..52, 1, 1, 2)))
        .mount(&server)
        .await;

    let (feed, _) = controller(&server, None);
    let slow = feed.fetch(1, false, Some(filters(&[("brand_id", "1")])));
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        feed.fetch(1, false, Some(filters(&[("brand_id", "2")]))).await
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert!(matches!(slow, FetchOutcome::Superseded), "got: {slow:?}");
    assert!(fast.is_applied());
    let state = feed.snapshot();
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.items[0].display_title(), "Item 50");
    assert!(!state.loading);
}

#[tokio::test]
async fn first_page_error_clears_feed_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("brand_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..21, 1, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("brand_id", "9"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Database unavailable" })),
        )
        .mount(&server)
        .await;

    let (feed, interaction) = controller(&server, None);
    feed.fetch(1, false, Some(filters(&[("brand_id", "1")]))).await;
    assert_eq!(feed.snapshot().items.len(), 20);

    let outcome = feed.fetch(1, false, Some(filters(&[("brand_id", "9")]))).await;
    assert!(matches!(outcome, FetchOutcome::Failed(_)));

    let state = feed.snapshot();
    assert!(state.items.is_empty());
    assert!(!state.has_more);
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("Database unavailable"));
    assert_eq!(
        interaction.notices.lock().unwrap().as_slice(),
        &[(NoticeLevel::Error, "Database unavailable".to_string())]
    );
}

#[tokio::test]
async fn malformed_first_page_empties_feed_and_counters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("brand_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..21, 1, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("brand_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "data": "x" } })))
        .mount(&server)
        .await;

    let (feed, interaction) = controller(&server, None);
    feed.fetch(1, false, Some(filters(&[("brand_id", "1")]))).await;
    assert_eq!(feed.snapshot().total, 45);

    let outcome = feed.fetch(1, false, Some(filters(&[("brand_id", "2")]))).await;
    assert!(outcome.is_applied());

    let state = feed.snapshot();
    assert!(state.items.is_empty());
    assert!(!state.has_more);
    assert_eq!(state.current_page, 1);
    assert_eq!(state.last_page, 1);
    assert_eq!(state.total, 0);
    assert!(state.error.is_none());
    assert!(interaction.notices.lock().unwrap().is_empty());
    assert!(feed.load_more().await.is_none());
}

#[tokio::test]
async fn later_page_error_keeps_items_and_stops_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..21, 1, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (feed, _) = controller(&server, None);
    feed.fetch(1, false, None).await;
    feed.load_more().await;

    let state = feed.snapshot();
    assert_eq!(state.items.len(), 20);
    assert!(!state.has_more);
    assert!(!state.loading_more);
}

#[tokio::test]
async fn unauthorized_feed_opens_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (feed, interaction) = controller(&server, None);
    let outcome = feed.fetch(1, false, None).await;
    assert!(matches!(outcome, FetchOutcome::Failed(ref e) if e.is_unauthorized()));
    assert_eq!(*interaction.logins.lock().unwrap(), 1);
    assert_eq!(interaction.notices.lock().unwrap()[0].0, NoticeLevel::Warning);
}

#[tokio::test]
async fn stored_location_is_appended_and_overrides_filter_geo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("category_id", "4"))
        .and(query_param("latitude", "9.9312"))
        .and(query_param("longitude", "76.2673"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..3, 1, 1, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let location = Location {
        latitude: 9.9312,
        longitude: 76.2673,
        address: None,
        city: Some("Kochi".into()),
        state: None,
    };
    let (feed, _) = controller(&server, Some(location));
    let stale_geo = filters(&[("latitude", "1.5"), ("longitude", "2.5")]);
    assert!(feed.fetch(1, false, Some(stale_geo)).await.is_applied());
}

#[tokio::test]
async fn rapid_scroll_events_request_next_page_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1..21, 1, 3, 45)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/filter"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_body(21..41, 2, 3, 45))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (feed, _) = controller(&server, None);
    feed.fetch(1, false, None).await;

    let events = ViewportEvents::new();
    let subscription = feed.attach_scroll(&events, ScrollOptions::default());
    let near_bottom = ScrollMetrics {
        scroll_y: 1600.0,
        viewport_height: 800.0,
        document_height: 2800.0,
    };

    events.emit(near_bottom);
    tokio::time::sleep(Duration::from_millis(150)).await;
    events.emit(near_bottom);

    wait_until(|| feed.snapshot().items.len() == 40).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(feed.snapshot().current_page, 2);

    subscription.unsubscribe();
    assert_eq!(events.subscriber_count(), 0);
}

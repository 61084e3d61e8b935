//! Router-level tests: requests go through the real Axum router, with the
//! aggregator, storefront and database replaced by in-memory ports.

use api_lib::{
    config::Config,
    web::{router, state::AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use game_tracker_core::{
    domain::AppPricing,
    testing::{FakeDeals, FakeStorefront, InMemoryDb, StorefrontReply},
    DealRecord, GameDetail, SearchRecord, StoreOffer,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        deals_api_url: "http://deals.invalid".to_string(),
        storefront_api_url: "http://storefront.invalid".to_string(),
        storefront_country: "br".to_string(),
        storefront_language: "brazilian".to_string(),
        deals_page_size: 12,
        search_limit: 25,
        feed_max_listings: 500,
        cors_origin: None,
    }
}

fn app(deals: FakeDeals, storefront: FakeStorefront) -> Router {
    let state = AppState::new(
        Arc::new(test_config()),
        Arc::new(InMemoryDb::default()),
        Arc::new(deals),
        Arc::new(storefront),
    );
    router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

fn deal(title: &str, sale_price: &str, steam_app_id: Option<&str>) -> DealRecord {
    DealRecord {
        deal_id: Some(format!("deal-{}", title)),
        game_id: Some(format!("game-{}", title)),
        store_id: Some("1".to_string()),
        title: Some(title.to_string()),
        sale_price: Some(sale_price.to_string()),
        normal_price: Some("19.99".to_string()),
        savings: Some("50.0".to_string()),
        steam_app_id: steam_app_id.map(str::to_string),
        ..Default::default()
    }
}

fn priced(final_minor: i64) -> StorefrontReply {
    StorefrontReply::Pricing(AppPricing { is_free: false, final_minor: Some(final_minor) })
}

async fn register(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/users",
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name),
            "password": "secret1",
            "confirmPassword": "secret1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn deals_page_mixes_regional_and_converted_prices() {
    let deals = FakeDeals::default().with_page(
        0,
        vec![deal("Indie Game", "9.99", None), deal("Portal 2", "1.99", Some("620"))],
    );
    let storefront = FakeStorefront::default().with("620", priced(1849));
    let app = app(deals, storefront);

    let (status, body) = get(&app, "/games/deals/ofertas").await;
    assert_eq!(status, StatusCode::OK);

    let indie = &body[0];
    assert_eq!(indie["title"], "Indie Game");
    assert_eq!(indie["isRegionalPrice"], false);
    assert_eq!(indie["salePrice"], "9.99");
    assert_eq!(indie["displayPrice"], "R$\u{a0}61,44*");

    let portal = &body[1];
    assert_eq!(portal["isRegionalPrice"], true);
    assert_eq!(portal["salePrice"], "18.49");
    assert_eq!(portal["steamAppID"], "620");
    assert_eq!(portal["displayPrice"], "R$\u{a0}18,49");
}

#[tokio::test]
async fn failed_storefront_lookup_keeps_aggregator_price() {
    let deals = FakeDeals::default().with_page(0, vec![deal("Portal 2", "1.99", Some("620"))]);
    let storefront = FakeStorefront::default().with("620", StorefrontReply::Fail);
    let app = app(deals, storefront);

    let (status, body) = get(&app, "/games/deals/ofertas?page=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["isRegionalPrice"], false);
    assert_eq!(body[0]["salePrice"], "1.99");
}

#[tokio::test]
async fn aggregator_outage_is_a_bad_gateway() {
    let app = app(FakeDeals::default().failing(), FakeStorefront::default());
    let (status, _) = get(&app, "/games/deals/top").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn search_requires_a_name() {
    let app = app(FakeDeals::default(), FakeStorefront::default());
    assert_eq!(get(&app, "/games/search").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/games/search?name=%20%20").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_results_take_their_title_from_external() {
    let deals = FakeDeals::default().with_search_results(vec![SearchRecord {
        game_id: Some("612".to_string()),
        steam_app_id: Some("620".to_string()),
        cheapest: Some("4.99".to_string()),
        cheapest_deal_id: Some("cheap".to_string()),
        external: Some("Portal 2".to_string()),
        ..Default::default()
    }]);
    let storefront = FakeStorefront::default().with("620", StorefrontReply::NoData);
    let app = app(deals, storefront);

    let (status, body) = get(&app, "/games/search?name=portal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["title"], "Portal 2");
    assert_eq!(body[0]["cheapestDealID"], "cheap");
    assert_eq!(body[0]["isRegionalPrice"], false);
}

#[tokio::test]
async fn offers_point_at_the_cheapest_store() {
    let offer = |store_id: &str, deal_id: &str, price: &str| StoreOffer {
        store_id: store_id.to_string(),
        deal_id: deal_id.to_string(),
        price: price.to_string(),
        retail_price: "19.99".to_string(),
        savings: "0".to_string(),
    };
    let deals = FakeDeals::default().with_detail(
        "612",
        GameDetail {
            title: Some("Portal 2".to_string()),
            offers: vec![offer("1", "steam-deal", "9.99"), offer("7", "gog-deal", "4.99")],
            ..Default::default()
        },
    );
    let app = app(deals, FakeStorefront::default());

    let (status, body) = get(&app, "/games/offers?gameId=612&regional=true&price=36.99").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Portal 2");
    assert_eq!(body["bestDealID"], "gog-deal");
    assert_eq!(
        body["bestOfferUrl"],
        "https://www.cheapshark.com/redirect?dealID=gog-deal"
    );
    assert_eq!(body["offers"][0]["displayPrice"], "R$\u{a0}36,99");
    assert_eq!(body["offers"][1]["displayPrice"], "R$\u{a0}30,69*");
}

#[tokio::test]
async fn offers_without_store_data_fall_back_to_storefront_page() {
    let app = app(FakeDeals::default(), FakeStorefront::default());

    let (status, body) = get(&app, "/games/offers?gameId=404&steamAppId=620").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offers"].as_array().unwrap().len(), 0);
    assert_eq!(body["bestOfferUrl"], "https://store.steampowered.com/app/620");

    let (_, body) = get(&app, "/games/offers?steamAppId=custom").await;
    assert_eq!(body["bestOfferUrl"], "#");
}

#[tokio::test]
async fn description_is_null_for_custom_or_unknown_apps() {
    let storefront = FakeStorefront::default().with_description("620", "Puzzles com portais.");
    let app = app(FakeDeals::default(), storefront);

    let (_, body) = get(&app, "/games/description/620").await;
    assert_eq!(body["description"], "Puzzles com portais.");
    let (status, body) = get(&app, "/games/description/custom").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());
    let (_, body) = get(&app, "/games/description/999").await;
    assert!(body["description"].is_null());
}

#[tokio::test]
async fn saving_a_known_title_moves_it_instead_of_duplicating() {
    let app = app(FakeDeals::default(), FakeStorefront::default());
    let user_id = register(&app, "gabe").await;

    let save = |status: &str| {
        json!({
            "steamId": 620,
            "title": "Portal 2",
            "image": "https://img/portal2.jpg",
            "price": "18.49",
            "userId": user_id,
            "status": status
        })
    };
    let (status, body) = send(&app, Method::POST, "/games", Some(save("wishlist"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "created");
    assert_eq!(body["entry"]["steamId"], "620");
    assert_eq!(body["entry"]["displayPrice"], "R$\u{a0}18,49");

    let (status, body) = send(&app, Method::POST, "/games", Some(save("COMPLETED"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "status_changed");
    assert_eq!(body["entry"]["status"], "completed");

    let (_, library) = get(&app, &format!("/games/{}", user_id)).await;
    assert_eq!(library.as_array().unwrap().len(), 1);
    let (_, wishlist) = get(&app, &format!("/games/{}?status=wishlist", user_id)).await;
    assert_eq!(wishlist.as_array().unwrap().len(), 0);
    let (status, _) = get(&app, &format!("/games/{}?status=abandoned", user_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn library_entries_can_be_updated_and_deleted() {
    let app = app(FakeDeals::default(), FakeStorefront::default());
    let user_id = register(&app, "gabe").await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/games",
        Some(json!({"title": "Celeste", "userId": user_id, "price": "abc"})),
    )
    .await;
    let entry_id = body["entry"]["id"].as_i64().unwrap();
    assert_eq!(body["entry"]["price"], 0.0);
    assert_eq!(body["entry"]["steamId"], "0");
    assert_eq!(body["entry"]["status"], "playing");

    let uri = format!("/games/{}", entry_id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"price": "oops"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"price": 5, "status": "zerado"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 5.0);
    assert_eq!(body["status"], "completed");

    let (status, _) = get(&app, &format!("/games/entry/{}", entry_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::OK);
    assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, &format!("/games/entry/{}", entry_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_and_login_round_trip() {
    let app = app(FakeDeals::default(), FakeStorefront::default());
    let user_id = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({"username": "alice", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);

    let (status, _) = send(
        &app,
        Method::POST,
        "/login",
        Some(json!({"username": "alice", "password": "wrong!"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"name": "al", "email": "nope", "password": "1", "confirmPassword": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.as_str().unwrap().split(", ").count(), 4);

    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"name": "alice", "email": "other@example.com", "password": "secret1", "confirmPassword": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn profile_changes_and_account_deletion() {
    let app = app(FakeDeals::default(), FakeStorefront::default());
    let alice = register(&app, "alice").await;
    register(&app, "bobby").await;

    let uri = format!("/users/{}", alice);
    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({"email": "bobby@example.com"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({"name": "alicia"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alicia");

    assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::OK);
    assert_eq!(send(&app, Method::DELETE, &uri, None).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_skips_titles_already_shown_and_resets_on_first_page() {
    let deals = FakeDeals::default()
        .with_page(0, vec![deal("Hades", "12.49", None), deal("Celeste", "4.99", None)])
        .with_page(1, vec![deal("HADES", "11.00", None), deal("Inside", "3.99", None)]);
    let app = app(deals, FakeStorefront::default());
    let user_id = register(&app, "gabe").await;

    let (status, body) = get(&app, &format!("/users/{}/feed", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appended"], 2);

    let (_, body) = get(&app, &format!("/users/{}/feed?page=1", user_id)).await;
    assert_eq!(body["appended"], 1);
    let titles: Vec<&str> = body["listings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Hades", "Celeste", "Inside"]);
    assert_eq!(body["listings"][0]["salePrice"], "12.49");

    let (_, body) = get(&app, &format!("/users/{}/feed?page=0", user_id)).await;
    assert_eq!(body["listings"].as_array().unwrap().len(), 2);

    let (status, _) = get(&app, "/users/999/feed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overlapping_feed_requests_merge_in_arrival_order() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let deals = FakeDeals::default()
        .with_page(0, vec![deal("Hades", "12.49", None), deal("Celeste", "4.99", None)])
        .with_page(1, vec![deal("Inside", "3.99", None)])
        .with_gate(0, entered.clone(), release.clone());
    let app = app(deals, FakeStorefront::default());
    let user_id = register(&app, "gabe").await;

    let first_page = tokio::spawn({
        let app = app.clone();
        async move { get(&app, &format!("/users/{}/feed?page=0", user_id)).await }
    });
    entered.notified().await;

    // Page 1 arrives while page 0 is still being fetched.
    let second_page = tokio::spawn({
        let app = app.clone();
        async move { get(&app, &format!("/users/{}/feed?page=1", user_id)).await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    release.notify_one();

    let (status, _) = first_page.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let (status, body) = second_page.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appended"], 1);
    assert_eq!(body["listings"].as_array().unwrap().len(), 3);
}

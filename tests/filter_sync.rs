use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use sitewire::application::{query::ContentQueryService, revalidation::RevalidationService};
use sitewire::cache::{CacheConfig, QueryCache};
use sitewire::client::{DebouncePolicy, FilterSync, HttpQueryClient, ResultsView};
use sitewire::infra::cms::FixtureRepository;
use sitewire::infra::http::{HttpState, build_router};
use sitewire::infra::webhook::HmacSignatureVerifier;
use sitewire_api_types::{FilterState, SortOrder};

const FIXTURE: &str = include_str!("../fixtures/blog.json");

async fn spawn_server() -> String {
    let repo = Arc::new(FixtureRepository::from_json(FIXTURE).expect("fixture"));
    let cache = Arc::new(QueryCache::new(CacheConfig::default()));
    let router = build_router(HttpState {
        revalidation: Arc::new(RevalidationService::new(
            None,
            Arc::new(HmacSignatureVerifier::default()),
            cache.clone(),
        )),
        content: Arc::new(ContentQueryService::new(repo, Some(cache))),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn sync_for(base: &str, initial: &str) -> FilterSync {
    let client = HttpQueryClient::new(base).expect("client");
    FilterSync::new(
        Arc::new(client),
        initial,
        DebouncePolicy::trailing(Duration::ZERO),
    )
}

#[tokio::test]
async fn ui_changes_survive_a_reload_from_the_url() {
    let base = spawn_server().await;
    let sync = sync_for(&base, "");

    sync.set_search("wind farm").await;
    sync.set_category("cat123").await;
    sync.set_sort(SortOrder::Asc).await;

    let url = sync.query_string();
    assert_eq!(url, "search=wind+farm&category=cat123&sort=asc");

    let reloaded = sync_for(&base, &format!("?{url}"));
    assert_eq!(
        reloaded.state(),
        FilterState::new("wind farm", "cat123", SortOrder::Asc)
    );
    assert_eq!(reloaded.state(), sync.state());
}

#[tokio::test]
async fn listing_follows_the_filter() {
    let base = spawn_server().await;
    let sync = sync_for(&base, "");

    sync.refresh().await;
    assert_eq!(sync.view().items().len(), 5);

    sync.set_category("cat-ops").await;
    let ids: Vec<String> = sync
        .view()
        .items()
        .iter()
        .map(|post| post.id.clone())
        .collect();
    assert_eq!(ids, vec!["p-safety", "p-crews"]);

    sync.set_search("hydrogen").await;
    assert_eq!(sync.view(), ResultsView::Empty);

    sync.reset().await;
    assert_eq!(sync.query_string(), "");
    assert_eq!(sync.view().items().len(), 5);
}

#[tokio::test]
async fn unreachable_server_shows_generic_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let sync = sync_for(&format!("http://{addr}"), "sort=asc");
    sync.refresh().await;
    assert_eq!(
        sync.view(),
        ResultsView::Failed("Something went wrong. Please try again.")
    );
}

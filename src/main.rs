use std::{future::IntoFuture, process, sync::Arc};

use sitewire::{
    application::{error::AppError, query::ContentQueryService, revalidation::RevalidationService},
    cache::{CacheConfig, QueryCache},
    client::{DebouncePolicy, FilterSync, HttpQueryClient, ResultsView},
    config,
    infra::{
        cms,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        webhook::HmacSignatureVerifier,
    },
};
use sitewire_api_types::{FilterState, SortOrder};
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .resolved_command()
        .map_err(|err| AppError::unexpected(format!("failed to read arguments: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Query(args) => run_query(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let cache = Arc::new(QueryCache::new(CacheConfig::from(&settings.cache)));
    let repository = cms::build_repository(&settings.cms).await?;

    let verifier = Arc::new(HmacSignatureVerifier::new(
        settings.revalidation.consistency_window,
    ));
    let revalidation = RevalidationService::new(
        settings.revalidation.secret.clone(),
        verifier,
        cache.clone(),
    );
    if !revalidation.is_configured() {
        warn!("no revalidation secret configured; webhook deliveries will be refused");
    }

    let state = HttpState {
        revalidation: Arc::new(revalidation),
        content: Arc::new(ContentQueryService::new(repository, Some(cache))),
    };

    serve_http(&settings, state).await
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        },
    );

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            info!("server stopped");
        }
        _ = drain_deadline => {
            warn!(
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

async fn run_query(settings: config::Settings, args: config::QueryArgs) -> Result<(), AppError> {
    let client = HttpQueryClient::new(&settings.client.base_url)
        .map_err(|err| AppError::unexpected(format!("invalid server URL: {err}")))?;

    let mut state = FilterState::from_query_string(args.url_query.as_deref().unwrap_or_default());
    if let Some(search) = args.search {
        state = state.with_search(search);
    }
    if let Some(category) = args.category {
        state = state.with_category(category);
    }
    if let Some(sort) = args.sort.as_deref().and_then(SortOrder::from_param) {
        state = state.with_sort(sort);
    }

    let sync = FilterSync::new(
        Arc::new(client),
        "",
        DebouncePolicy::trailing(settings.client.search_debounce),
    );
    sync.navigate(&state.to_query_string()).await;

    println!("?{}", sync.query_string());
    match sync.view() {
        ResultsView::Ready(items) => {
            for item in items.iter() {
                let category = item
                    .category
                    .as_ref()
                    .map(|category| category.title.as_str())
                    .unwrap_or("-");
                println!(
                    "{}  {}  [{}]  /blog/{}",
                    item.published_at.date(),
                    item.title,
                    category,
                    item.slug
                );
            }
            Ok(())
        }
        ResultsView::Empty => {
            println!("No posts found.");
            Ok(())
        }
        ResultsView::Failed(message) => Err(AppError::unexpected(message)),
        ResultsView::Idle | ResultsView::Loading => Ok(()),
    }
}

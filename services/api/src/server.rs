use crate::cli::ServeArgs;
use crate::infra::{seed_demo_site, AppState};
use crate::routes::with_site_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use polls_cms::config::AppConfig;
use polls_cms::content::InMemoryContentTree;
use polls_cms::error::AppError;
use polls_cms::polls::{ListingPolicy, SiteState};
use polls_cms::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let tree = Arc::new(InMemoryContentTree::default());
    if args.seed_demo {
        let site = seed_demo_site(tree.as_ref(), Utc::now().date_naive())?;
        info!(questions = site.questions.len(), "seeded demo site");
    }

    let editors = config.polls.editor_tokens();
    if editors.is_empty() {
        warn!("POLLS_EDITOR_TOKENS is empty; the editor API will reject every request");
    }
    let listing = ListingPolicy {
        public_limit: config.polls.listing_limit,
    };
    let site = SiteState::new(tree, editors, listing);

    let app = with_site_routes(site)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "polls site ready");

    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_CMS_QUERY_MS: &str = "sitewire_cms_query_ms";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "sitewire_revalidation_total",
            Unit::Count,
            "Webhook deliveries handled, labelled by outcome."
        );
        describe_counter!(
            "sitewire_cache_invalidated_tags_total",
            Unit::Count,
            "Total number of cache tags invalidated."
        );
        describe_counter!(
            "sitewire_query_cache_hit_total",
            Unit::Count,
            "Total number of query cache hits."
        );
        describe_counter!(
            "sitewire_query_cache_miss_total",
            Unit::Count,
            "Total number of query cache misses."
        );
        describe_histogram!(
            METRIC_CMS_QUERY_MS,
            Unit::Milliseconds,
            "Content repository query latency in milliseconds."
        );
    });
}

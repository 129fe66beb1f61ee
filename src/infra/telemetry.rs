use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level_filter().into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
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
            "codetocrack_slug_probe_total",
            Unit::Count,
            "Total number of slug uniqueness probes issued against the store."
        );
        describe_counter!(
            "codetocrack_view_increment_total",
            Unit::Count,
            "Total number of post view-counter increments."
        );
        describe_counter!(
            "codetocrack_canonical_redirect_total",
            Unit::Count,
            "Total number of canonical-URL redirects signalled by the resolver."
        );
        describe_counter!(
            "codetocrack_router_navigation_total",
            Unit::Count,
            "Total number of navigations handled by the SPA router."
        );
        describe_counter!(
            "codetocrack_router_dropped_total",
            Unit::Count,
            "Total number of navigation events dropped while a load was in flight."
        );
        describe_counter!(
            "codetocrack_router_fallback_total",
            Unit::Count,
            "Total number of hard-reload fallbacks after template fetch failures."
        );
    });
}

//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! ```no_run
//! let filter = longmem_observe::tracing_setup::verbosity_filter(1, false);
//! longmem_observe::tracing_setup::init_tracing(filter, false).unwrap();
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Kept so the provider can be flushed on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Filter directive for a CLI verbosity level.
pub fn verbosity_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,longmem=debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when set. Logs go to
/// stderr so command output on stdout stays machine-readable. With
/// `enable_otel`, spans are also exported through OpenTelemetry's stdout
/// exporter.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str, enable_otel: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    if enable_otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("longmem");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending spans and shut down the tracer provider. No-op without OTel.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

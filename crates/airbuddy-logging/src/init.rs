use std::path::Path;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::targets::{T_PROC, T_WIFI};

static RELOAD: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

/// Keeps the non-blocking file writers alive; drop it only at process exit.
pub struct LoggingGuards {
    _file_guards: Vec<WorkerGuard>,
}

pub fn init(component: &str, root: &Path, cfg: &LoggingConfig) -> Result<LoggingGuards> {
    let (filter_layer, handle) = reload::Layer::new(build_filter(cfg));
    let _ = RELOAD.set(handle);

    // stdout carries command output, diagnostics go to stderr
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .compact();

    let base = tracing_subscriber::registry()
        .with(filter_layer)
        .with(ErrorLayer::default())
        .with(stderr_layer);

    if !cfg.file_output {
        base.try_init().ok();
        let _ = LogTracer::init();
        return Ok(LoggingGuards {
            _file_guards: Vec::new(),
        });
    }

    let log_dir = root.join("logs");
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        base.try_init().ok();
        let _ = LogTracer::init();
        tracing::warn!(
            "File logging disabled ({}): {}",
            log_dir.display(),
            err
        );
        return Ok(LoggingGuards {
            _file_guards: Vec::new(),
        });
    }

    let (component_layer, component_guard) =
        file_layer(&log_dir, &format!("{component}.log"), component_targets());
    let (wifi_layer, wifi_guard) = file_layer(&log_dir, "wifi.log", subsystem_targets());

    base.with(component_layer).with(wifi_layer).try_init().ok();
    let _ = LogTracer::init();

    Ok(LoggingGuards {
        _file_guards: vec![component_guard, wifi_guard],
    })
}

/// Swap the active filter, e.g. after the logging config file changed.
pub fn apply(cfg: &LoggingConfig) -> Result<()> {
    let handle = RELOAD
        .get()
        .ok_or_else(|| anyhow::anyhow!("logging not initialized"))?;
    handle.reload(build_filter(cfg))?;
    Ok(())
}

fn build_filter(cfg: &LoggingConfig) -> EnvFilter {
    if !cfg.enabled {
        return EnvFilter::new("off");
    }
    EnvFilter::try_new(cfg.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn component_targets() -> Targets {
    Targets::new()
        .with_default(LevelFilter::TRACE)
        .with_target(T_WIFI, LevelFilter::OFF)
        .with_target(T_PROC, LevelFilter::OFF)
}

fn subsystem_targets() -> Targets {
    Targets::new()
        .with_target(T_WIFI, LevelFilter::TRACE)
        .with_target(T_PROC, LevelFilter::TRACE)
}

fn file_layer<S>(
    log_dir: &Path,
    filename: &str,
    targets: Targets,
) -> (impl Layer<S> + Send + Sync, WorkerGuard)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let appender = tracing_appender::rolling::daily(log_dir, filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_writer(writer)
        .with_filter(targets);
    (layer, guard)
}

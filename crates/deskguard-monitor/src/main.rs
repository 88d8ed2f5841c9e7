//! DeskGuard posture monitor binary.

use tracing::{debug, error, info, warn};

use deskguard_models::SourceKind;
use deskguard_monitor::logging::init_tracing;
use deskguard_monitor::{
    metrics, BeepNotifier, FanoutNotifier, MonitorConfig, MonitorError, MonitorResult,
    MonitorSession, TracingNotifier,
};
use deskguard_vision::{ProximitySource, TraceProximitySource};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting deskguard");

    let config = match MonitorConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Monitor config: {:?}", config);

    if let Some(port) = config.metrics_port {
        match metrics::install_prometheus(port) {
            Ok(()) => info!("Prometheus metrics listening on port {}", port),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    let mut source = match open_source(&config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open proximity source: {}", e);
            std::process::exit(1);
        }
    };

    let mut notifier = FanoutNotifier::new().with_sink(TracingNotifier);
    if config.beep {
        notifier = notifier.with_sink(BeepNotifier::new());
    }

    let history_path = config.history_path.clone();
    let (session, control) = MonitorSession::new(config, Box::new(notifier));

    // Per-frame overlay line
    let mut status_rx = control.subscribe_status();
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let latest = status_rx.borrow_and_update().clone();
            let Some(status) = latest else {
                continue;
            };
            debug!(
                target: "deskguard::overlay",
                frame = status.frame_index,
                ratio = %status.ratio_label(),
                color = status.overlay_color(),
                "{}",
                status.message
            );
        }
    });

    // Stop on Ctrl+C
    let shutdown = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            shutdown.stop();
        }
    });

    match session.run(source.as_mut()).await {
        Ok(summary) => {
            info!(
                session_id = %summary.session_id,
                frames = summary.frames,
                alerts = summary.alerts,
                peak_ratio = summary.peak_ratio,
                too_close_fraction = summary.history.too_close_fraction(),
                "Session {}",
                summary.end_reason.as_str()
            );

            if let Some(path) = history_path {
                if let Err(e) = summary.history.save_json(&path).await {
                    error!("Failed to save session history: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) if e.is_source_failure() => {
            error!("Proximity source failed, stopping: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Session failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn open_source(config: &MonitorConfig) -> MonitorResult<Box<dyn ProximitySource>> {
    match config.source {
        SourceKind::Trace => {
            let path = config
                .trace_path
                .as_ref()
                .ok_or_else(|| MonitorError::config_error("no trace path configured"))?;
            let source = TraceProximitySource::open(path)
                .await?
                .with_realtime(config.trace_realtime);
            Ok(Box::new(source))
        }
        #[cfg(feature = "opencv")]
        SourceKind::Camera => {
            let source = deskguard_vision::CameraProximitySource::open(
                config.camera_index,
                &config.yunet_model,
            )?;
            Ok(Box::new(source))
        }
        #[cfg(not(feature = "opencv"))]
        SourceKind::Camera => Err(MonitorError::config_error(
            "camera source requires building with the `opencv` feature",
        )),
    }
}

//! LoRa RSSI Detector - Main Entry Point

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use lora_rssi_detector::constants::{APP_NAME, APP_VERSION};
use lora_rssi_detector::logic::audit::AuditLog;
use lora_rssi_detector::logic::config::{Cli, Config};
use lora_rssi_detector::logic::gateway::load_gateway_id;
use lora_rssi_detector::logic::pipeline::{DetectionPipeline, FeedSource, OutputSink, ReplaySource};
use lora_rssi_detector::logic::registry::DeviceRegistry;
use lora_rssi_detector::logic::shutdown::Shutdown;
use lora_rssi_detector::logic::telemetry::TelemetryEmitter;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    config.apply_cli(cli);

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);
    log::info!(
        "Tolerance: {} ({} per-device override(s))",
        config.tolerance,
        config.tolerance_overrides.len()
    );

    let gateway_id = match config.gateway_id {
        Some(id) => id,
        None => load_gateway_id(&config.conf_dir)
            .context("Failed to read gateway configuration")?
            .unwrap_or_default(),
    };
    log::info!("Gateway ID: {}", gateway_id);

    let output: Box<dyn OutputSink> = match &config.output {
        Some(path) => Box::new(
            TelemetryEmitter::create(path)
                .with_context(|| format!("Failed to open telemetry output {}", path.display()))?,
        ),
        None => Box::new(TelemetryEmitter::stdout()),
    };

    let registry = Arc::new(DeviceRegistry::new());
    let mut pipeline = DetectionPipeline::from_config(&config, Arc::clone(&registry), output);

    if config.audit_enabled {
        let audit = AuditLog::new(config.audit_dir.clone(), gateway_id, config.log_rotate_interval)
            .with_context(|| format!("Failed to open audit log in {}", config.audit_dir.display()))?;
        pipeline = pipeline.with_audit(Box::new(audit));
    } else {
        log::info!("Audit log disabled");
    }

    let shutdown = Shutdown::new();
    shutdown
        .install_signal_handlers()
        .context("Failed to install signal handlers")?;

    let stats = match &config.input {
        Some(path) => {
            let mut source = ReplaySource::open(path)
                .with_context(|| format!("Failed to open frame input {}", path.display()))?;
            pipeline.run(&mut source, &shutdown)?
        }
        None => {
            let mut source = FeedSource::stdin(config.max_batch * 4).context("Failed to start stdin reader")?;
            pipeline.run(&mut source, &shutdown)?
        }
    };

    log::info!(
        "Processed {} frame(s): {} verdict(s), {} anomaly(ies), {} unresolved, {} emit failure(s)",
        stats.frames,
        stats.verdicts,
        stats.anomalies,
        stats.unresolved,
        stats.emit_failures
    );
    for baseline in registry.snapshot() {
        log::info!(
            "  {}: baseline {:.1} dBm, {} sample(s), last seen {}",
            baseline.device_id,
            baseline.baseline_rssi_dbm,
            baseline.sample_count,
            baseline.last_observed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

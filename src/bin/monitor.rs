use std::sync::Arc;

use clap::Parser;
use motor_temp_monitor::{
    clock::SystemClock,
    config::read_config_file,
    device::sim::{SimulatedBoard, SimulatedRack},
    monitor::{MonitorHandle, MotorTemperatureMonitor},
    port::BroadcastPort,
    topology::Topology,
};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("motor_temp_monitor", LevelFilter::TRACE),
        ("monitor", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;
    let topology = Topology::resolve(&config)?;

    // Demo device layer: one simulated board per endpoint. A real deployment
    // plugs its transport in behind BoardOpener instead.
    let mut rack = SimulatedRack::new();
    for endpoint in &topology.endpoints {
        let board = SimulatedBoard::new(vec![80.0; 16]);
        for motor in 0..16 {
            board.set_temperature(motor, 35.0 + motor as f64).await;
        }
        rack.add_board(&endpoint.remote_name, board);
    }

    let port = BroadcastPort::new(64);
    let mut records = port.subscribe();

    let monitor = MotorTemperatureMonitor::configure(
        topology,
        &rack,
        Arc::new(SystemClock),
        Box::new(port),
    )
    .await?;
    info!(
        "monitoring {} joints, publishing on {}",
        monitor.joint_count(),
        monitor.port_name()
    );

    let handle = MonitorHandle::spawn(monitor);

    let subscriber = tokio::spawn(async move {
        while let Ok(record) = records.recv().await {
            debug!(
                "record @ {:.3}: {} samples, {} alarms",
                record.timestamp_secs(),
                record.samples.len(),
                record.samples.iter().filter(|s| s.alarm).count()
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    warn!("shutdown requested");
    handle.shutdown().await?;
    subscriber.abort();

    Ok(())
}

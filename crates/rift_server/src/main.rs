//! The authoritative rift simulation server.
//!
//! Wires the persistence synchronizer, the session gateway, the observer
//! publisher, and the tick loop over one NATS connection.

mod gateway;
mod observer;

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use rift_data::{sync_channel, JsonFileStore, MirrorStore, Synchronizer};
use rift_game::Simulation;
use rift_loop::{TickSource, PRESENTATION, SIMULATION};
use rift_net::connection::DEFAULT_NATS_URL;
use rift_net::messages::ReleaseResource;
use rift_net::{subjects, NatsConnection, NatsSessionControl, NatsSyncChannel, ResourceId};

#[derive(Parser)]
#[command(name = "rift-server", about = "Authoritative game simulation core over NATS")]
struct Args {
    /// NATS server URL
    #[arg(short, long, default_value = DEFAULT_NATS_URL)]
    nats_url: String,

    /// Directory holding participant record files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Primary simulation tick rate, in ticks per second
    #[arg(long, default_value_t = 60.0)]
    simulation_hz: f64,

    /// Presentation tick rate, in ticks per second
    #[arg(long, default_value_t = 20.0)]
    presentation_hz: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let conn = NatsConnection::connect_to(&args.nats_url).await?;

    // Persistence: file-backed records, observer mirror, synchronizer task.
    let store = JsonFileStore::new(&args.data_dir)?;
    let mirror = MirrorStore::new();
    let (sync, commands) = sync_channel();
    let synchronizer = Synchronizer::new(
        store,
        NatsSyncChannel::new(conn.clone()),
        NatsSessionControl::new(conn.clone()),
        mirror.clone(),
    );
    tokio::spawn(synchronizer.run(commands));

    // Session events fan out to the binder queue and the synchronizer.
    let (binder_tx, binder_rx) = mpsc::unbounded_channel();
    let bus = gateway::build_session_bus(binder_tx, sync.clone());

    let mut simulation = Simulation::new();
    let sink = {
        let conn = conn.clone();
        move |resource: ResourceId| {
            let conn = conn.clone();
            tokio::spawn(async move {
                let message = ReleaseResource {
                    resource: resource.0,
                };
                if let Err(e) = conn.publish(subjects::PRESENTATION_RELEASE, &message).await {
                    warn!(error = %e, "resource release publish failed");
                }
            });
        }
    };
    simulation.initialize(binder_rx, sink)?;

    // Presentation phase publishes read-only snapshots for observers.
    let (snapshot_tx, snapshot_rx) = mpsc::channel(observer::SNAPSHOT_BUFFER);
    simulation.add_system(PRESENTATION, "observe", observer::observe_system(snapshot_tx));
    tokio::spawn(observer::publish_snapshots(conn.clone(), snapshot_rx));

    tokio::spawn({
        let conn = conn.clone();
        async move {
            if let Err(e) = gateway::run(conn, bus, sync).await {
                error!(error = %e, "gateway failed");
            }
        }
    });

    let handle = simulation.begin(vec![
        (SIMULATION, TickSource::fixed(args.simulation_hz)),
        (PRESENTATION, TickSource::fixed(args.presentation_hz)),
    ]);
    info!(
        simulation_hz = args.simulation_hz,
        presentation_hz = args.presentation_hz,
        "rift server running"
    );
    handle.join().await?;
    Ok(())
}

use std::fs::File;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use glovelink_protocol::encode_frame;
use glovelink_session::{
    ConnectionSession, ExportSink, SessionConfig, SessionError, SessionEvent, SimulationSource,
};
use glovelink_transport::AnyTransport;
use glovelink_transport::mock::{MockTransport, MockTransportHandle};

mod cli;
mod output;

use cli::Cli;
use output::{JsonExport, SummaryReport};

/// Notification payload size of the serial bridge the mock imitates.
const NOTIFY_CHUNK_SIZE: usize = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = SessionConfig::default()
        .history_capacity(cli.capacity)
        .simulation_interval(Duration::from_millis(cli.interval_ms));
    if let Some(seed) = cli.seed {
        config = config.simulation_seed(seed);
    }

    let (transport, device) = MockTransport::new();
    let mut session =
        ConnectionSession::new(AnyTransport::from(transport), config).map_err(user_error)?;

    let stop = session.disconnect_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, disconnecting");
            stop.request_disconnect();
        }
    });

    let device_name = if cli.simulate {
        session.start_simulation().map_err(user_error)?;
        "Simulation".to_string()
    } else {
        let handle = session.connect().await.map_err(user_error)?;
        tokio::spawn(feed_device(
            device,
            cli.seed,
            Duration::from_millis(cli.interval_ms),
        ));
        handle.name
    };

    let collected = collect(&mut session, cli.ticks).await;
    debug!(state = %session.state(), in_state = ?session.time_in_state(), "collection stopped");
    session.disconnect().await;
    info!(collected, state = %session.state(), "session finished");

    let device_label = cli.device_label.unwrap_or(device_name);
    let (request, report) = session
        .generate_report(&SummaryReport, cli.patient, device_label)
        .await
        .map_err(user_error)?;

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file '{}'", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = JsonExport::new(writer, cli.compact).with_stats(session.stats());
    sink.export(&request, &report)
        .context("Failed to export summary")?;

    Ok(())
}

/// Drive the session until `target` samples arrived or the source ended.
async fn collect(session: &mut ConnectionSession<AnyTransport>, target: usize) -> usize {
    let mut collected = 0;

    while collected < target {
        match session.next_event().await {
            Some(SessionEvent::Chunk { samples }) => collected += samples,
            Some(SessionEvent::Simulated(sample)) => {
                debug!(time = %sample.time_label(), channels = ?sample.channels(), "tick");
                collected += 1;
            }
            Some(SessionEvent::Dropped) => {}
            Some(SessionEvent::Ended(reason)) => {
                warn!(?reason, collected, "source ended early");
                break;
            }
            None => break,
        }
    }

    collected
}

/// Stream synthetic frames through the mock device, split across
/// notifications the way a serial bridge delivers them.
async fn feed_device(device: MockTransportHandle, seed: Option<u64>, period: Duration) {
    let mut source = seed.map_or_else(SimulationSource::new, SimulationSource::with_seed);
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;
        let frame = encode_frame(&source.advance());

        for chunk in frame.as_bytes().chunks(NOTIFY_CHUNK_SIZE) {
            if let Err(error) = device.send_chunk(chunk.to_vec()).await {
                debug!(%error, "mock device stopped");
                return;
            }
        }
    }
}

fn user_error(error: SessionError) -> anyhow::Error {
    let message = error.user_message();
    anyhow::Error::new(error).context(message)
}

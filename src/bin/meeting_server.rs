//! Meeting tool server over stdio
//!
//! stdout carries the protocol; all logging goes to stderr.

use meeting_assistant::server::store::MeetingStore;
use meeting_assistant::server::MeetingServer;
use tokio::io::{self, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meeting_assistant=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::info!("Meeting server starting");
    let mut server = MeetingServer::new(MeetingStore::new());
    server.run(BufReader::new(io::stdin()), io::stdout()).await?;
    Ok(())
}

//! Meeting Assistant CLI
//!
//! Connects a Gemini model to the meeting tool server and runs an interactive
//! chat on stdin/stdout. Logs go to stderr.

use meeting_assistant::chat::ChatSession;
use meeting_assistant::config::AppConfig;
use meeting_assistant::llm::{GeminiAdapter, LoggingAdapter, ModelAdapter};
use meeting_assistant::mcp::{McpClient, SamplingHandler, ToolServer};
use meeting_assistant::AppError;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BANNER: &str = "\n=======================================\n\
Chat session started (type 'exit' to quit)\n\
=======================================";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meeting_assistant=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e}");
            1
        }
    };

    // A blocked stdin read would otherwise hold up runtime shutdown after Ctrl-C
    std::process::exit(code);
}

async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    println!("Initializing with model: {}", config.model);

    let gemini = GeminiAdapter::new(
        config.api_key.clone(),
        &config.model,
        config.base_url.as_deref(),
    )?;
    let model = Arc::new(LoggingAdapter::new(Arc::new(gemini)));
    let sampler: Arc<dyn SamplingHandler> = model.clone();

    let mut client = McpClient::new(config.server_command.clone(), config.server_args.clone())
        .with_sampling_handler(sampler);
    tracing::info!(command = %config.server_command, "Starting tool server");
    if let Err(e) = client.connect().await {
        client.cleanup().await;
        return Err(e.into());
    }

    let result = chat(model.as_ref(), &client).await;
    client.cleanup().await;
    result
}

async fn chat(model: &dyn ModelAdapter, tools: &dyn ToolServer) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(BANNER.as_bytes()).await?;
    stdout.write_all(b"\n").await?;

    let mut session = ChatSession::new(model, tools);
    session.announce_commands(&mut stdout).await?;

    tokio::select! {
        result = session.run(BufReader::new(tokio::io::stdin()), &mut stdout) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
    }

    stdout.write_all(b"\nExiting application.\n").await?;
    stdout.flush().await?;
    Ok(())
}

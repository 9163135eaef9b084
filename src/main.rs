use std::sync::Arc;

use leadflow::channels::{Dispatcher, EmailChannel, OutreachChannel, SmsChannel};
use leadflow::channels::email::SmtpConfig;
use leadflow::channels::sms::SmsConfig;
use leadflow::config::PipelineConfig;
use leadflow::error::ConfigError;
use leadflow::pipeline::{Orchestrator, retry_failed};
use leadflow::store::{RecordStore, SheetsConfig, SheetsStore};
use leadflow::templates::MessageTemplates;
use leadflow::verify::EmailVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let sheets_config = SheetsConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export SPREADSHEET_ID=...");
        eprintln!("  export SHEETS_API_TOKEN=...");
        std::process::exit(1);
    });
    let pipeline_config = PipelineConfig::from_env();
    let templates = MessageTemplates::from_env();

    eprintln!("📋 Leadflow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Spreadsheet: {}", sheets_config.spreadsheet_id);
    eprintln!("   Worksheet: {}", sheets_config.worksheet);
    eprintln!(
        "   Delay between records: {}s",
        pipeline_config.delay_between_records.as_secs()
    );
    eprintln!("   Max retries: {}", pipeline_config.max_retries);

    let store: Arc<dyn RecordStore> = Arc::new(SheetsStore::new(sheets_config));

    // `retry` re-queues failed records instead of running the pipeline.
    if std::env::args().nth(1).as_deref() == Some("retry") {
        let requeued = retry_failed(store.as_ref(), pipeline_config.max_retries).await?;
        eprintln!("   Re-queued {requeued} failed record(s)\n");
        return Ok(());
    }

    // Set up outreach channels
    let mut channels: Vec<Arc<dyn OutreachChannel>> = Vec::new();
    let mut active_channels = Vec::new();

    // Conditionally add email if an SMTP host is set
    if let Some(smtp_config) = SmtpConfig::from_env() {
        eprintln!(
            "   Email: enabled (SMTP: {}:{}, from: {})",
            smtp_config.host, smtp_config.port, smtp_config.from_address
        );
        channels.push(Arc::new(EmailChannel::new(smtp_config, templates.clone())));
        active_channels.push("email");
    }

    // Conditionally add SMS if a provider key is set
    if let Some(sms_config) = SmsConfig::from_env() {
        eprintln!("   SMS: enabled (sender: {})", sms_config.sender_id);
        channels.push(Arc::new(SmsChannel::new(sms_config, templates)));
        active_channels.push("sms");
    }

    if channels.is_empty() {
        eprintln!("Error: {}", ConfigError::NoChannelsConfigured);
        std::process::exit(1);
    }
    eprintln!("   Channels: {}\n", active_channels.join(", "));

    let verifier = EmailVerifier::from_env();
    let orchestrator = Orchestrator::new(
        store,
        Dispatcher::new(channels),
        verifier,
        pipeline_config,
    );

    let report = orchestrator.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

use clap::Parser;
use portfolio_metrics::config::cli::Command;
use portfolio_metrics::core::Pipeline;
use portfolio_metrics::utils::error::{EtlError, ErrorSeverity};
use portfolio_metrics::utils::{logger, validation::Validate};
use portfolio_metrics::{Cli, EtlEngine, FetchPipeline, LocalStorage, Settings, SitePipeline};

async fn run_stage<P: Pipeline>(name: &str, pipeline: P, monitor: bool) -> Result<String, EtlError> {
    tracing::info!("▶️ Running {} stage", name);
    EtlEngine::new_with_monitoring(pipeline, monitor).run().await
}

async fn run(cli: &Cli, settings: Settings) -> Result<Vec<String>, EtlError> {
    let mut outputs = Vec::new();

    if matches!(cli.command, Command::Fetch(_) | Command::Build { .. }) {
        let pipeline = FetchPipeline::new(LocalStorage::new("."), settings.clone())?;
        outputs.push(run_stage("fetch", pipeline, cli.monitor).await?);
    }

    if matches!(cli.command, Command::Render(_) | Command::Build { .. }) {
        let pipeline = SitePipeline::new(LocalStorage::new("."), settings);
        outputs.push(run_stage("render", pipeline, cli.monitor).await?);
    }

    Ok(outputs)
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting portfolio-metrics");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    let settings = match cli.settings().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&cli, settings).await {
        Ok(outputs) => {
            tracing::info!("✅ Done");
            for path in outputs {
                println!("📁 Wrote {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let code = exit_code(e.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

use clap::Parser;
use naic_lookup::utils::{logger, validation::Validate};
use naic_lookup::{CliArgs, LookupReport, LookupService, OutputFormat, StateResult};
use std::fmt::Write as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_logger(args.verbose, args.log_format);

    tracing::info!("Starting naic-lookup CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let service = LookupService::from_config(&config)?;

    match service.lookup(&args.npn).await {
        Ok(report) => {
            let output = match args.format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                OutputFormat::Text => render_text(&report),
            };
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!("❌ Lookup failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    }

    Ok(())
}

fn render_text(report: &LookupReport) -> String {
    let batch = &report.batch;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "NPN {} - {}/{} jurisdictions found{}",
        batch.npn,
        batch.found_count(),
        batch.results.len(),
        if report.cached { " (cached)" } else { "" }
    );
    for result in &batch.results {
        let _ = writeln!(out, "  {}", render_state(result));
    }
    out
}

fn render_state(result: &StateResult) -> String {
    if result.is_found() {
        let license_number = result
            .search()
            .and_then(|s| s.license_number())
            .unwrap_or_default();
        format!(
            "{}  license {}  {} appointment(s)",
            result.state,
            license_number,
            result.appointments().len()
        )
    } else {
        format!("{}  {}", result.state, result.message().unwrap_or_default())
    }
}

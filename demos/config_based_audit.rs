use anchor_audit::Audit;
use anchor_audit::config::AuditConfig;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to audit configuration file
    #[arg(short, long)]
    config: String,

    /// File containing page URLs, one per line
    #[arg(short, long)]
    input: String,

    /// Override request delay in milliseconds
    #[arg(short, long)]
    delay_ms: Option<u64>,

    /// Only print links that need attention
    #[arg(long)]
    only_issues: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    // Load configuration from file
    let config_path = PathBuf::from(&args.config);
    let config = AuditConfig::from_file(config_path)?;

    // Print the loaded configuration (for debugging)
    println!("Audit configuration:");
    println!("  Request delay: {}ms", config.request_delay_ms);
    println!("  Cache TTL: {}s", config.cache_ttl_secs);
    println!("  Request timeout: {}s", config.timeout_secs);
    println!("  User agent: {}", config.user_agent);
    println!("  Number of session URLs: {}", config.session_urls.len());
    println!(
        "  Number of Basic-Auth credentials: {}",
        config.basic_auth.len()
    );

    let url_input = std::fs::read_to_string(&args.input)?;

    // Create an Audit builder with the loaded configuration
    let mut audit_builder = Audit::new(url_input).with_config(config);

    // Apply overrides if specified
    if let Some(delay_ms) = args.delay_ms {
        println!("Overriding request delay: {}ms", delay_ms);
        audit_builder = audit_builder.with_request_delay_ms(delay_ms);
    }

    // Start the audit
    let mut run = audit_builder.start().await?;

    // Process results as they come in
    let mut links_checked = 0;
    let start_time = std::time::Instant::now();

    while let Some(result) = run.next_result().await {
        links_checked += 1;
        if args.only_issues && !result.judgment.is_issue() {
            continue;
        }
        println!(
            "[{}] {} \"{}\" -> \"{}\" (found on {})",
            result.judgment,
            result.href,
            result.link_text,
            result.title_or_text_node,
            result.found_on
        );
    }

    let summary = run.finish().await?;
    if let Some(message) = summary.aggregate_message() {
        eprintln!("{}", message);
    }

    let duration = start_time.elapsed();
    println!(
        "Audit complete. Checked {} links on {} pages in {:.2} seconds.",
        links_checked,
        summary.pages_processed,
        duration.as_secs_f64()
    );

    Ok(())
}

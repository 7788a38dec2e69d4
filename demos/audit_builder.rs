use anchor_audit::Audit;
use clap::Parser;
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URLs of the pages to audit
    #[arg(required = true)]
    urls: Vec<String>,

    /// JSON configuration string
    #[arg(short, long)]
    config: Option<String>,

    /// Path to JSON configuration file
    #[arg(long)]
    config_file: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(short, long)]
    delay_ms: Option<u64>,

    /// How long checked targets stay cached, in seconds
    #[arg(long)]
    cache_ttl: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    println!("Starting link audit of {} page(s)", args.urls.len());

    // Create an Audit builder over the seed URLs
    let mut audit_builder = Audit::new(args.urls.join("\n"));

    // Apply configuration from file if specified
    if let Some(config_file) = args.config_file {
        println!("Loading configuration from file: {}", config_file);
        audit_builder = audit_builder.with_config_file(config_file)?;
    }

    // Apply configuration from string if specified (overrides file config)
    if let Some(config_str) = args.config {
        println!("Applying configuration from string");
        audit_builder = audit_builder.with_config_str(&config_str)?;
    }

    // Apply command-line overrides
    if let Some(delay_ms) = args.delay_ms {
        println!("Overriding request delay: {}ms", delay_ms);
        audit_builder = audit_builder.with_request_delay_ms(delay_ms);
    }

    if let Some(cache_ttl) = args.cache_ttl {
        println!("Overriding cache TTL: {}s", cache_ttl);
        audit_builder = audit_builder.with_cache_ttl_secs(cache_ttl);
    }

    // Start the audit
    let mut run = audit_builder.start().await?;

    // Process results as they come in
    let mut links_checked = 0;
    let mut issues_found = 0;
    let start_time = std::time::Instant::now();

    while let Some(result) = run.next_result().await {
        links_checked += 1;
        if result.judgment.is_issue() {
            issues_found += 1;
        }
        println!(
            "Checked link {}: [{}] {} ({})",
            links_checked, result.judgment, result.href, result.status_code
        );
    }

    let summary = run.finish().await?;
    if let Some(message) = summary.aggregate_message() {
        eprintln!("{}", message);
    }

    let duration = start_time.elapsed();
    println!(
        "Audit complete. Checked {} links ({} issues) in {:.2} seconds.",
        links_checked,
        issues_found,
        duration.as_secs_f64()
    );

    Ok(())
}

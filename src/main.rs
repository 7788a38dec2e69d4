use clap::Parser;
use std::collections::HashSet;
use std::process;

use anchor_audit::{Audit, CheckResult, Verdict};
use tokio_util::sync::CancellationToken;

mod args;
use args::{Args, OutputFormat};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    // Seed URLs come from the command line or a newline-separated file
    let url_input = match &args.input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                ::log::error!("Failed to read URL list {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => args.urls.join("\n"),
    };

    let mut audit = Audit::new(url_input);

    if let Some(path) = &args.config {
        audit = match audit.with_config_file(path) {
            Ok(audit) => audit,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                process::exit(1);
            }
        };
    }
    if let Some(delay_ms) = args.delay_ms {
        audit = audit.with_request_delay_ms(delay_ms);
    }
    for url in &args.session_url {
        audit = audit.with_session_url(url.clone());
    }

    // Cancel the run on Ctrl-C
    let cancel = CancellationToken::new();
    audit = audit.with_cancellation(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::info!("Interrupt received, stopping audit");
            cancel.cancel();
        }
    });

    let start_time = std::time::Instant::now();
    let mut run = match audit.start().await {
        Ok(run) => run,
        Err(e) => {
            ::log::error!("Failed to start audit: {}", e);
            process::exit(1);
        }
    };

    // Process results as they come in
    let mut results = Vec::new();
    let mut seen = HashSet::new();
    while let Some(result) = run.next_result().await {
        if args.only_issues
            && (!result.judgment.is_issue() || !seen.insert(issue_key(&result)))
        {
            continue;
        }
        if args.format == OutputFormat::Text {
            print_result(&result);
        }
        results.push(result);
    }

    let summary = match run.finish().await {
        Ok(summary) => summary,
        Err(e) => {
            ::log::error!("Audit failed: {}", e);
            process::exit(1);
        }
    };

    match args.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                ::log::error!("Failed to serialize results: {}", e);
                process::exit(1);
            }
        },
        OutputFormat::Text => print_totals(&results),
    }

    // Pages that failed outright are reported on stderr without failing
    // the run; their links simply are not in the results.
    if let Some(message) = summary.aggregate_message() {
        eprintln!("{}", message);
    }

    ::log::info!(
        "Audit complete - checked {} links on {} pages in {:.2} seconds",
        summary.results_emitted,
        summary.pages_processed,
        start_time.elapsed().as_secs_f64()
    );
}

/// Key that collapses the same problem link reported from several pages
fn issue_key(result: &CheckResult) -> String {
    let text = if result.link_text.is_empty() {
        result.html.as_str()
    } else {
        result.link_text.as_str()
    };
    format!("{}-{}", result.href, text)
}

fn print_result(result: &CheckResult) {
    println!(
        "[{}] {} {} \"{}\" -> \"{}\"",
        result.judgment,
        result.status_code,
        result.href,
        result.link_text,
        result.title_or_text_node
    );
}

fn print_totals(results: &[CheckResult]) {
    println!();
    println!("Checked {} links:", results.len());
    for verdict in Verdict::SEVERITY_ORDER {
        let count = results.iter().filter(|r| r.judgment == verdict).count();
        println!("  {:>6}  {}", count, verdict);
    }
}

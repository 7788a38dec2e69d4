use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "anchor-audit")]
#[command(about = "Checks the links on a set of pages for broken targets and unhelpful link text")]
#[command(version)]
pub struct Args {
    /// Page URLs to audit
    #[arg(required_unless_present = "input")]
    pub urls: Vec<String>,

    /// Read page URLs from a file, one per line
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Visit this URL before the audit to pick up session cookies (repeatable)
    #[arg(long)]
    pub session_url: Vec<String>,

    /// Only report links that need attention, deduplicated
    #[arg(long)]
    pub only_issues: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per checked link, then per-verdict totals
    Text,
    /// The full result array as pretty-printed JSON
    Json,
}

use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

pub mod commands;

/// Command line
#[derive(Parser, Debug)]
#[command(name = "vault2notion")]
#[command(about = "Mirror a markdown vault into a Notion page hierarchy")]
#[command(version)]
pub struct Cli {
    /// Markdown files and/or directories to sync
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Destination page id or URL
    pub destination: String,

    /// Rewrite every document even if unchanged
    #[arg(short, long)]
    pub force: bool,

    /// Print what would be created or updated without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

static PAGE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9a-fA-F]{8})-?([0-9a-fA-F]{4})-?([0-9a-fA-F]{4})-?([0-9a-fA-F]{4})-?([0-9a-fA-F]{12})$",
    )
    .expect("valid page id regex")
});

/// Canonical dashed page id from an id or page URL
///
/// Accepts the dashed form, the 32-character undashed form, or a URL whose
/// last path segment ends with the id. Anything else is returned trimmed.
pub fn normalize_page_id(input: &str) -> String {
    let trimmed = input.trim();
    let without_query = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let segment = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query);

    match PAGE_ID_RE.captures(segment) {
        Some(c) => format!("{}-{}-{}-{}-{}", &c[1], &c[2], &c[3], &c[4], &c[5]).to_lowercase(),
        None => trimmed.to_string(),
    }
}

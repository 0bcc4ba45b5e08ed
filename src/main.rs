use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tidal_merger::api::{AuthState, Cover, SEARCH_PAGE_SIZE};
use tidal_merger::identifier::extract_playlist_id;
use tidal_merger::workspace::filter_by_name;
use tidal_merger::{
    ApiClient, Config, Content, ContentInput, MergeClient, MergeResult, Resolved, Workspace,
    classify_content, validate_playlist_input,
};

const DUPLICATE_SAMPLE_SIZE: usize = 10;

#[derive(Parser)]
#[command(name = "tidal-merger")]
#[command(about = "Merge Tidal playlists, albums and mixes into one playlist")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Merge server base URL (or set TIDAL_MERGER_API_BASE env var)
    #[arg(long, global = true, env = "TIDAL_MERGER_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the server is reachable and logged in to Tidal
    Status,

    /// Log the server in to Tidal using a device code
    Login {
        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },

    /// Log the server out of Tidal
    Logout,

    /// Show the limits the server enforces
    Config,

    /// Check whether input looks like a playlist URL or ID
    Validate { input: String },

    /// Resolve a URL, ID or search text into content
    Resolve { input: String },

    /// Search Tidal for playlists and albums
    Search {
        query: String,

        /// Skip this many results
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// List your own playlists and favorites
    MyPlaylists {
        /// Only show playlists whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Merge two or more playlists, albums or mixes into a new playlist
    Merge {
        /// URLs or IDs, in precedence order (earlier sources win duplicates)
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<String>,

        /// Name of the new playlist
        #[arg(long)]
        name: String,

        /// Also remove repeated tracks within each source
        #[arg(long)]
        deep_clean: bool,
    },
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(api_base) = &cli.api_base {
        config = config.with_api_base(api_base).context("Invalid --api-base")?;
    }

    match cli.command {
        Commands::Status => show_status(&config).await?,
        Commands::Login { timeout_secs } => login(&config, timeout_secs).await?,
        Commands::Logout => {
            ApiClient::new(&config)?.logout().await?;
            println!("{}", "Logged out of Tidal".green());
        }
        Commands::Config => show_limits(&config).await?,
        Commands::Validate { input } => validate(&input),
        Commands::Resolve { input } => resolve(&config, &input).await?,
        Commands::Search { query, offset } => search(&config, &query, offset).await?,
        Commands::MyPlaylists { filter } => my_playlists(&config, filter.as_deref()).await?,
        Commands::Merge {
            inputs,
            name,
            deep_clean,
        } => merge(&config, &inputs, &name, deep_clean).await?,
    }

    Ok(())
}

async fn show_status(config: &Config) -> Result<()> {
    let api = ApiClient::new(config)?;

    println!("Server: {}", config.api_base);
    if !api.health().await {
        println!("{}", "Server is not responding".red());
    }

    match api.auth_state().await {
        AuthState::Authenticated => println!("{}", "Logged in to Tidal".green()),
        AuthState::LoggedOut => println!(
            "{}",
            "Not logged in - run `tidal-merger login`".yellow()
        ),
        AuthState::Unreachable => println!(
            "{}",
            "Unable to connect to server. Please ensure the backend is running.".red()
        ),
    }

    Ok(())
}

async fn login(config: &Config, timeout_secs: u64) -> Result<()> {
    let api = ApiClient::new(config)?;

    if api.auth_state().await == AuthState::Authenticated {
        println!("{}", "Already logged in to Tidal".green());
        return Ok(());
    }

    let login = api
        .login()
        .await
        .context("Failed to connect to TIDAL. Please try again.")?;

    println!("\n{}", "Tidal Authentication Required".cyan().bold());
    println!("{}", "=".repeat(30));
    println!("Visit this URL: {}", login.login_url);
    if let Some(code) = login.user_code.as_deref().filter(|c| !c.is_empty()) {
        println!("Enter code: {}", code.bold());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Waiting for authorization...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let outcome = api.wait_for_login(Duration::from_secs(timeout_secs)).await;
    spinner.finish_and_clear();
    outcome?;

    println!("{}", "Logged in to Tidal".green());
    Ok(())
}

async fn show_limits(config: &Config) -> Result<()> {
    let limits = ApiClient::new(config)?.server_limits().await?;
    println!("Track limit per playlist: {}", limits.track_limit);
    println!("Maximum sources per merge: {}", limits.max_playlists);
    Ok(())
}

fn validate(input: &str) {
    let validation = validate_playlist_input(input);
    let playlist_id = if validation.valid {
        println!("{}", "Looks like a playlist URL or ID".green());
        extract_playlist_id(input).ok()
    } else {
        if let Some(error) = &validation.error {
            println!("{}", error.red());
        }
        None
    };

    match (classify_content(input), playlist_id) {
        (ContentInput::Url { id, kind }, _) => println!("Detected {} link, id {}", kind, id),
        (ContentInput::Id(id), _) => println!("Detected raw id {}", id),
        (ContentInput::Search(_), Some(id)) => println!("Detected playlist id {}", id),
        (ContentInput::Search(query), None) if !query.is_empty() => {
            println!("Would search for \"{}\"", query)
        }
        (ContentInput::Search(_), None) => {}
    }
}

async fn resolve(config: &Config, input: &str) -> Result<()> {
    let api = ApiClient::new(config)?;

    let classified = classify_content(input);
    if !classified.is_direct() {
        if input.trim().is_empty() {
            bail!("Please enter a playlist URL or ID");
        }
        if validate_playlist_input(input).valid {
            print_content(&api.resolve_playlist(input).await?);
            return Ok(());
        }
        let page = api.search(input, 0).await?;
        print_results(&page.results, page.total, page.has_more);
        return Ok(());
    }

    match api.resolve_content(input).await? {
        Resolved::Content(content) => print_content(&content),
        Resolved::Search(page) => print_results(&page.results, page.total, page.has_more),
    }

    Ok(())
}

async fn search(config: &Config, query: &str, offset: usize) -> Result<()> {
    let page = ApiClient::new(config)?.search(query, offset).await?;
    print_results(&page.results, page.total, page.has_more);
    if page.has_more {
        println!(
            "More results: tidal-merger search \"{}\" --offset {}",
            query.trim(),
            offset + SEARCH_PAGE_SIZE
        );
    }
    Ok(())
}

async fn my_playlists(config: &Config, filter: Option<&str>) -> Result<()> {
    let mine = ApiClient::new(config)?.my_playlists().await?;

    if let Some(favorites) = &mine.favorites {
        print_content(favorites);
    }

    let shown = filter_by_name(&mine.playlists, filter.unwrap_or(""));
    if shown.is_empty() {
        match filter {
            Some(query) => println!("No playlists match \"{}\"", query),
            None => println!("No playlists found"),
        }
    }
    for content in shown {
        print_content(content);
    }

    Ok(())
}

async fn merge(config: &Config, inputs: &[String], name: &str, deep_clean: bool) -> Result<()> {
    println!("{}", "Tidal Playlist Merger".cyan().bold());
    println!("{}", "=".repeat(50));

    let api = ApiClient::new(config)?;
    let limits = api.server_limits_or_default().await;
    let mut workspace = Workspace::new(limits.max_playlists);

    for input in inputs {
        let content = api
            .resolve_source(input)
            .await
            .with_context(|| format!("Failed to resolve {}", input))?;

        let label = format!(
            "{} ({}, {})",
            content.name,
            content.content_type,
            content.track_count_label()
        );
        match workspace.append(content) {
            Ok(()) => println!("  {} {}", "+".green(), label),
            Err(e) => println!("  {} {}: {}", "!".yellow(), label, e),
        }
    }

    let request = workspace.merge_request(name, deep_clean)?;

    let expected = workspace.selected_track_total();
    if expected > limits.track_limit {
        println!(
            "{}",
            format!(
                "Sources hold {} tracks; Tidal keeps at most {} per playlist.",
                expected, limits.track_limit
            )
            .yellow()
        );
    }

    let merger = MergeClient::new(config)?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    pb.set_message("Starting merge process...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let outcome = merger
        .merge(&request, |progress| {
            if let Some(percent) = progress.percent() {
                pb.set_position(percent);
            }
            if let Some(line) = progress.status_line() {
                pb.set_message(line);
            }
        })
        .await;

    pb.finish_and_clear();

    let result = outcome.context("Merge failed")?;
    print_merge_result(&result, deep_clean, limits.track_limit);

    Ok(())
}

fn print_content(content: &Content) {
    let cover = match content.cover() {
        Cover::Single(_) => "cover",
        Cover::Mosaic(_) => "mosaic",
        Cover::Placeholder => "no cover",
    };

    let by = content
        .artist
        .as_deref()
        .map(|a| format!(" by {}", a))
        .unwrap_or_default();

    println!(
        "  [{}] {}{} - {} ({})",
        content.content_type.to_string().cyan(),
        content.name.bold(),
        by,
        content.track_count_label(),
        cover
    );
    println!("      id: {}", content.id);
}

fn print_results(results: &[Content], total: usize, has_more: bool) {
    if results.is_empty() {
        println!("No results");
        return;
    }
    for content in results {
        print_content(content);
    }
    println!(
        "Showing {} of {}{}",
        results.len(),
        total,
        if has_more { " (more available)" } else { "" }
    );
}

fn print_merge_result(result: &MergeResult, deep_clean: bool, track_limit: u32) {
    println!("\n{}", result.summary(deep_clean, track_limit).green());

    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "MERGE SUMMARY".bold());
    println!("{}", "=".repeat(60));
    println!("Tracks fetched: {}", result.total_fetched);
    println!("Tracks in new playlist: {}", result.track_count.to_string().green());
    println!(
        "Duplicates removed: {} ({} across sources, {} within sources)",
        result.duplicates_removed.to_string().yellow(),
        result.cross_playlist_duplicates,
        result.intra_playlist_duplicates
    );
    if !result.playlist_counts.is_empty() {
        let counts: Vec<String> = result.playlist_counts.iter().map(|c| c.to_string()).collect();
        println!("Tracks per source: {}", counts.join(", "));
    }
    println!("{}", "=".repeat(60));

    let lines = result.duplicate_lines(DUPLICATE_SAMPLE_SIZE);
    if lines.is_empty() {
        return;
    }

    println!("\nDuplicates removed:");
    for line in lines {
        println!("  {}", line);
    }
}

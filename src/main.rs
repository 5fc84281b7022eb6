use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};

use podshelf::{
    FeedRepository, Podcast, PodcastStore, PodcastSummaryViewData, PodcastViewData, PodcastViewModel,
    ReqwestClient, Scope, SharedRepository, ShortDateFormatter,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static STAR: Emoji<'_, '_> = Emoji("⭐ ", "[*] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static REMOVED: Emoji<'_, '_> = Emoji("🗑️  ", "[-] ");
static BULLET: Emoji<'_, '_> = Emoji("• ", "- ");

/// Browse podcast feeds and manage subscriptions
#[derive(Parser, Debug)]
#[command(name = "podshelf")]
#[command(about = "Browse podcast feeds and manage subscriptions")]
#[command(version)]
struct Args {
    /// Path of the subscription store
    #[arg(short, long, default_value = "podshelf.json")]
    store: PathBuf,

    /// Log what the library is doing
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a podcast and its episodes
    Show {
        /// Feed URL, or the number of a subscription as printed by `list`
        podcast: String,

        /// Maximum number of episodes to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Subscribe to a podcast feed
    Subscribe {
        /// Feed URL
        feed_url: String,
    },

    /// Remove a subscription
    Unsubscribe {
        /// Feed URL
        feed_url: String,
    },

    /// List subscriptions
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "info" } else { "warn" }),
    )
    .init();

    let store = PodcastStore::open(&args.store)
        .await
        .with_context(|| format!("Failed to open store {}", args.store.display()))?;
    let client = ReqwestClient::new().context("Failed to create HTTP client")?;
    let repository: SharedRepository = Arc::new(FeedRepository::new(client, Arc::new(store)));

    let scope = Scope::new();
    let mut view_model = PodcastViewModel::new(scope.clone(), Arc::new(ShortDateFormatter))
        .with_repository(repository);

    let result = run(&mut view_model, args.command).await;
    scope.cancel();
    result
}

async fn run(view_model: &mut PodcastViewModel, command: Command) -> Result<()> {
    match command {
        Command::Show { podcast, limit } => {
            match podcast.parse::<usize>() {
                Ok(number) => {
                    let summary = subscription(view_model, number)?;
                    let spinner = spinner(summary.feed_url.as_deref().unwrap_or_default());
                    view_model.load_active_from_summary(&summary).await;
                    spinner.finish_and_clear();
                }
                Err(_) => {
                    load(view_model, &podcast).await?;
                }
            }

            let Some(view) = view_model.podcast_view().borrow().clone() else {
                bail!("Could not load podcast {}", podcast);
            };
            print_podcast(&view, limit);
        }

        Command::Subscribe { feed_url } => {
            let name = subscribe(view_model, &feed_url).await?;
            println!("{SUCCESS}Subscribed to {}", name.bold().green());
        }

        Command::Unsubscribe { feed_url } => match unsubscribe(view_model, &feed_url).await? {
            Some(name) => println!("{REMOVED}Unsubscribed from {}", name.bold()),
            None => println!("Not subscribed to {}", feed_url.cyan()),
        },

        Command::List => {
            let summaries = view_model
                .observe_all_summaries()
                .context("No repository attached")?
                .current();

            if summaries.is_empty() {
                println!("No subscriptions yet. Try `podshelf subscribe <FEED_URL>`.");
                return Ok(());
            }

            println!("\n{MICROPHONE}{}\n", "Subscriptions".bold().magenta());
            for (index, summary) in summaries.iter().enumerate() {
                print_summary(index + 1, summary);
            }
            println!();
        }
    }

    Ok(())
}

/// Make `feed_url` the active podcast, with a spinner while the feed loads
async fn load(view_model: &mut PodcastViewModel, feed_url: &str) -> Result<PodcastSummaryViewData> {
    let spinner = spinner(feed_url);
    let summary = view_model.set_active_by_url(feed_url).await;
    spinner.finish_and_clear();

    summary.with_context(|| format!("Could not load podcast from {}", feed_url))
}

/// Subscribe to `feed_url`, returning the podcast's name once the store has it
async fn subscribe(view_model: &mut PodcastViewModel, feed_url: &str) -> Result<String> {
    let summary = load(view_model, feed_url).await?;
    view_model.persist_active().await;

    if !is_stored(view_model, feed_url).await {
        bail!("Failed to save subscription to {}", feed_url);
    }
    Ok(summary.name.unwrap_or_default())
}

/// Remove the subscription to `feed_url`
///
/// Returns `None` when there was nothing to remove.
async fn unsubscribe(view_model: &mut PodcastViewModel, feed_url: &str) -> Result<Option<String>> {
    let summary = load(view_model, feed_url).await?;
    if !view_model.active_podcast().is_some_and(Podcast::is_subscribed) {
        return Ok(None);
    }
    view_model.delete_active().await;

    if is_stored(view_model, feed_url).await {
        bail!("Failed to remove subscription to {}", feed_url);
    }
    Ok(Some(summary.name.unwrap_or_default()))
}

/// Look `feed_url` up again and report whether it comes back saved
async fn is_stored(view_model: &mut PodcastViewModel, feed_url: &str) -> bool {
    view_model.set_active_by_url(feed_url).await.is_some()
        && view_model.active_podcast().is_some_and(Podcast::is_subscribed)
}

/// Look up a subscription by its 1-based position in the list
fn subscription(view_model: &mut PodcastViewModel, number: usize) -> Result<PodcastSummaryViewData> {
    let summaries = view_model
        .observe_all_summaries()
        .context("No repository attached")?
        .current();

    number
        .checked_sub(1)
        .and_then(|index| summaries.get(index).cloned())
        .with_context(|| format!("No subscription number {} ({} known)", number, summaries.len()))
}

fn spinner(feed_url: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {wide_msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("{SEARCH}Loading {}", feed_url.cyan()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(number: usize, summary: &PodcastSummaryViewData) {
    println!(
        "  {:>3}. {} {}",
        number.to_string().cyan(),
        summary.name.as_deref().unwrap_or("(untitled)").bold(),
        format!("(updated {})", summary.last_updated.as_deref().unwrap_or("?")).dimmed()
    );
    if let Some(feed_url) = &summary.feed_url {
        println!("       {}", feed_url.dimmed());
    }
}

fn print_podcast(view: &PodcastViewData, limit: usize) {
    let marker = if view.subscribed {
        format!("{STAR}subscribed").yellow()
    } else {
        "not subscribed".dimmed()
    };

    println!("\n{MICROPHONE}{} {}", view.feed_title.bold().green(), marker);
    println!("{}", view.feed_url.dimmed());
    if !view.feed_desc.is_empty() {
        println!("\n{}", html_escape::decode_html_entities(view.feed_desc.trim()));
    }

    println!(
        "\n{} {}\n",
        "Episodes:".bold(),
        view.episodes.len().to_string().cyan()
    );
    for episode in view.episodes.iter().take(limit) {
        let date = episode
            .release_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "undated".to_string());
        let duration = if episode.duration.is_empty() {
            String::new()
        } else {
            format!(" [{}]", episode.duration)
        };
        println!(
            "  {BULLET}{} {}{}",
            date.dimmed(),
            html_escape::decode_html_entities(&episode.title),
            duration.dimmed()
        );
    }
    if view.episodes.len() > limit {
        println!(
            "  {}",
            format!("... and {} more", view.episodes.len() - limit).dimmed()
        );
    }
    println!();
}

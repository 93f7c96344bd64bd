use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;

use podplay::{
    EpisodeRef, FavouriteMeta, FavouritesStore, FileStorage, NotificationKind, Notifier, Podcast,
    ProgressTracker, ReqwestClient, ResumeAction, SharedStorage, UndoAction, catalog, find_episode,
    notify::NOTIFICATION_SECS, resume_action,
};

// Emoji with fallback for terminals without Unicode support
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static HEART: Emoji<'_, '_> = Emoji("❤️ ", "<3 ");
static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static CLOCK: Emoji<'_, '_> = Emoji("⏱ ", "[t] ");
static BROOM: Emoji<'_, '_> = Emoji("🧹 ", "[-] ");

/// Browse a podcast catalog, track listening progress, and manage favourites
#[derive(Parser, Debug)]
#[command(name = "podplay")]
#[command(about = "Podcast directory browser with resumable progress and favourites")]
#[command(version)]
struct Args {
    /// Path to the persistence store file (defaults to the platform data dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the shows in a catalog
    Shows {
        /// Catalog URL or path to a local JSON file
        source: String,

        /// Filter by title substring or exact genre
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show seasons and episodes of one show, with progress and resume hints
    Show {
        /// Catalog URL or path to a local JSON file
        source: String,

        /// Show id
        id: String,
    },

    /// Manage favourite episodes
    Fav {
        #[command(subcommand)]
        command: FavCommand,
    },

    /// Inspect or reset listening progress
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FavCommand {
    /// List favourited episodes, oldest first
    List,

    /// Add or remove an episode from the favourites
    Toggle {
        /// Catalog URL or path to a local JSON file
        source: String,

        /// Show id
        id: String,

        /// Zero-based season index
        season: u32,

        /// Zero-based episode index
        episode: u32,
    },
}

#[derive(Subcommand, Debug)]
enum ProgressCommand {
    /// List every saved progress record
    Show,

    /// Delete all progress and finished markers (favourites are kept)
    Reset,
}

/// Notifier printing toast-style lines to the terminal
struct TermNotifier;

impl Notifier for TermNotifier {
    fn notify(&self, message: &str, kind: NotificationKind, undo: Option<UndoAction>) {
        let line = match kind {
            NotificationKind::Added => format!("{HEART}{}", message.green()),
            NotificationKind::Removed => format!("{BROOM}{}", message.yellow()),
        };
        println!("{line}");

        if undo.is_some() {
            println!(
                "  {}",
                format!("(undoable for {NOTIFICATION_SECS}s in an interactive session)").dimmed()
            );
        }
    }
}

fn store_path(args: &Args) -> Result<PathBuf> {
    if let Some(path) = &args.store {
        return Ok(path.clone());
    }
    let data_dir = dirs::data_dir().context("Could not determine the platform data directory")?;
    Ok(data_dir.join("podplay").join("store.json"))
}

async fn load_catalog(source: &str) -> Result<Vec<Podcast>> {
    if catalog::is_url(source) {
        let client = ReqwestClient::new();
        catalog::fetch_catalog(&client, source)
            .await
            .context("Failed to fetch catalog")
    } else {
        catalog::read_catalog_file(std::path::Path::new(source)).context("Failed to read catalog")
    }
}

fn fmt_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

fn list_shows(podcasts: &[Podcast], filter: Option<&str>, favourites: &FavouritesStore) {
    let shown: Vec<&Podcast> = match filter {
        Some(query) => catalog::filter_podcasts(podcasts, query),
        None => podcasts.iter().collect(),
    };

    if shown.is_empty() {
        println!("{}", "No shows match.".dimmed());
        return;
    }

    for podcast in shown {
        let fav_count = favourites
            .favourites()
            .iter()
            .filter(|f| f.podcast_id == podcast.id)
            .count();
        let fav_marker = if fav_count > 0 {
            format!(" {HEART}{fav_count}")
        } else {
            String::new()
        };

        println!(
            "{} {} {}{}",
            podcast.id.cyan(),
            podcast.title.bold(),
            podcast.genres.join(", ").dimmed(),
            fav_marker
        );
    }
}

fn show_detail(
    podcast: &Podcast,
    tracker: &ProgressTracker,
    favourites: &FavouritesStore,
) {
    println!("\n{HEADPHONES}{}\n", podcast.title.bold().magenta());

    for (season_index, season) in podcast.seasons.iter().enumerate() {
        println!(
            "{} {}",
            format!("Season {}", season.season).bold(),
            season.title.dimmed()
        );

        for (episode_index, ep) in season.episodes.iter().enumerate() {
            let episode = podcast.episode_ref(season_index as u32, episode_index as u32);

            let fav = if favourites.is_favourited(&episode) {
                format!("{HEART}")
            } else {
                "   ".to_string()
            };

            let progress = tracker.load_progress(&episode);
            let status = if tracker.status(&episode).is_some_and(|s| s.is_finished()) {
                format!("{CHECK}finished").green().to_string()
            } else {
                match resume_action(progress.as_ref()) {
                    ResumeAction::Prompt { resume_at } => format!(
                        "{CLOCK}{}",
                        format!("resume at {}", fmt_time(resume_at)).yellow()
                    ),
                    ResumeAction::FromStart => String::new(),
                }
            };

            println!(
                "  {}{} {} {}",
                fav,
                format!("[{season_index}.{episode_index}]").cyan(),
                ep.title,
                status
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let storage: SharedStorage = Arc::new(
        FileStorage::open(&store_path(&args)?).context("Failed to open the persistence store")?,
    );
    let tracker = ProgressTracker::new(storage.clone());

    match args.command {
        Command::Shows { source, filter } => {
            let podcasts = load_catalog(&source).await?;
            let favourites = FavouritesStore::restore(storage, Arc::new(TermNotifier));
            list_shows(&podcasts, filter.as_deref(), &favourites);
        }

        Command::Show { source, id } => {
            let podcasts = load_catalog(&source).await?;
            let podcast = podcasts
                .iter()
                .find(|p| p.id == id)
                .with_context(|| format!("No show with id {id} in the catalog"))?;
            let favourites = FavouritesStore::restore(storage, Arc::new(TermNotifier));
            show_detail(podcast, &tracker, &favourites);
        }

        Command::Fav { command } => match command {
            FavCommand::List => {
                let favourites = FavouritesStore::restore(storage, Arc::new(TermNotifier));
                if favourites.is_empty() {
                    println!("{}", "No favourites yet.".dimmed());
                }
                for record in favourites.favourites() {
                    println!(
                        "{HEART}{} {} {}",
                        record.podcast_title.bold(),
                        format!("S{} · {}", record.season_number, record.episode_title),
                        record.id.dimmed()
                    );
                }
            }

            FavCommand::Toggle {
                source,
                id,
                season,
                episode,
            } => {
                let podcasts = load_catalog(&source).await?;
                let episode_ref = EpisodeRef::new(id.clone(), season, episode);
                let (podcast, season_entry, ep) = find_episode(&podcasts, &episode_ref)
                    .with_context(|| format!("No episode {episode_ref} in the catalog"))?;

                let mut favourites = FavouritesStore::restore(storage, Arc::new(TermNotifier));
                favourites.toggle(FavouriteMeta {
                    episode: episode_ref,
                    podcast_title: podcast.title.clone(),
                    episode_title: ep.title.clone(),
                    season_number: season_entry.season,
                    image: season_entry
                        .image
                        .clone()
                        .or_else(|| podcast.image.clone())
                        .unwrap_or_default(),
                    audio_url: ep.audio_url().unwrap_or_default().to_string(),
                });
            }
        },

        Command::Progress { command } => match command {
            ProgressCommand::Show => {
                use podplay::progress::PROGRESS_PREFIX;
                use podplay::Storage;

                let mut keys: Vec<String> = storage
                    .keys()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|k| k.starts_with(PROGRESS_PREFIX))
                    .collect();
                keys.sort();

                if keys.is_empty() {
                    println!("{}", "No saved progress.".dimmed());
                }
                for key in keys {
                    let identity = key.trim_start_matches(PROGRESS_PREFIX);
                    if let Ok(Some(raw)) = storage.get(&key)
                        && let Ok(record) =
                            serde_json::from_str::<podplay::ProgressRecord>(&raw)
                    {
                        println!(
                            "{CLOCK}{} {} / {}",
                            identity.cyan(),
                            fmt_time(record.current_time).yellow(),
                            fmt_time(record.duration)
                        );
                    }
                }
            }

            ProgressCommand::Reset => {
                tracker.reset_all();
                println!("{BROOM}{}", "All listening progress cleared.".green());
            }
        },
    }

    Ok(())
}

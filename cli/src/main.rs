//! vidgraph CLI: interactive menu over the video-platform graph
//!
//! Connects to a Dgraph alpha over HTTP (or runs fully in-process with
//! `--embedded`), declares the schema, then loops over a numbered menu
//! of load, query and delete operations.

mod menu;
mod render;

use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{info, warn};
use vidgraph::queries::{self, Page, SortDirection};
use vidgraph::{
    declare_schema, delete_comments_matching, drop_all, run_full_load, AppConfig, DataSources,
    DeleteOutcome, VidgraphError, VidgraphResult,
};
use vidgraph_sdk::{EmbeddedClient, GraphClient, RemoteClient};

use menu::{parse_choice, print_menu, ChoiceError, MenuChoice, Prompter};
use render::{print_rows, OutputFormat};

#[derive(Parser)]
#[command(name = "vidgraph", version, about = "Video-platform graph loader and query menu")]
struct Cli {
    /// Dgraph alpha HTTP URL
    #[arg(long, env = "VIDGRAPH_URL")]
    url: Option<String>,

    /// Directory holding nodes/ and edges/ CSV files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the in-process engine instead of a Dgraph server
    #[arg(long)]
    embedded: bool,

    /// Do not drop the database when exiting
    #[arg(long)]
    keep_data_on_exit: bool,

    /// Output format
    #[arg(long, default_value = "table")]
    format: OutputFormat,

    /// Log level written to stderr
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

struct Session<'a> {
    client: &'a dyn GraphClient,
    config: AppConfig,
    format: OutputFormat,
    keep_data_on_exit: bool,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let client: Box<dyn GraphClient> = if cli.embedded {
        info!("Using the embedded engine");
        Box::new(EmbeddedClient::new())
    } else {
        info!("Connecting to {}", config.dgraph_url);
        Box::new(RemoteClient::new(&config.dgraph_url))
    };

    let session = Session {
        client: client.as_ref(),
        config,
        format: cli.format,
        keep_data_on_exit: cli.keep_data_on_exit,
    };

    if let Err(e) = session.run(io::stdin().lock()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> VidgraphResult<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.dgraph_url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

impl Session<'_> {
    async fn run(&self, input: impl BufRead) -> io::Result<()> {
        println!("Connecting to Dgraph...");
        if let Err(e) = self.client.health().await {
            println!("{}", VidgraphError::Connection(e.to_string()));
        }
        println!("Setting up database schema...");
        match declare_schema(self.client, &self.config.loader.retry).await {
            Ok(()) => println!("Schema created successfully!"),
            Err(e) => println!("Warning: {}", e),
        }

        let mut prompter = Prompter::new(input);
        loop {
            print_menu();
            let Some(line) = prompter.ask("\nEnter your choice: ")? else {
                // end of input behaves like Exit
                self.exit().await;
                return Ok(());
            };
            let choice = match parse_choice(&line) {
                Ok(choice) => choice,
                Err(ChoiceError::NotANumber) => {
                    println!("{}", VidgraphError::MalformedInput(format!("'{}' is not a menu number", line.trim())));
                    continue;
                }
                Err(ChoiceError::OutOfRange(n)) => {
                    println!(
                        "{}",
                        VidgraphError::MalformedInput(format!(
                            "{} is not an option, choose a number between 1 and {}",
                            n,
                            MenuChoice::ALL.len()
                        ))
                    );
                    continue;
                }
            };

            match self.dispatch(choice, &mut prompter).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => return Ok(()),
                Err(e) => {
                    println!("\nError: {}", e);
                    println!("Please try again.");
                }
            }
        }
    }

    async fn dispatch<R: BufRead>(
        &self,
        choice: MenuChoice,
        prompter: &mut Prompter<R>,
    ) -> Result<Flow, Box<dyn std::error::Error>> {
        let client = self.client;
        let format = self.format;
        match choice {
            MenuChoice::Load => {
                println!("\n--- LOADING DATA FROM CSV FILES ---");
                let sources = DataSources::from_dir(&self.config.data_dir);
                let summary = run_full_load(client, &sources, &self.config.loader).await?;
                println!("{}", summary);
            }
            MenuChoice::TextSearch => {
                let Some(term) = prompter.ask("Enter text search: ")? else {
                    return Ok(Flow::Continue);
                };
                let rows = queries::text_search(client, &term).await?;
                print_rows(&rows, &["uid", "text"], format, "No comments found for that search.")?;
            }
            MenuChoice::DurationFilter => {
                let Some(min) = prompter.ask_integer("Enter minimum video duration: ")? else {
                    return Ok(Flow::Continue);
                };
                let rows = queries::videos_longer_than(client, min).await?;
                print_rows(
                    &rows,
                    &["uid", "title", "duration"],
                    format,
                    "No videos match the duration filter.",
                )?;
            }
            MenuChoice::UsersWithPosts => {
                let rows = queries::users_with_posts(client).await?;
                print_rows(&rows, &["uid", "username", "posts"], format, "No users with posts found.")?;
            }
            MenuChoice::VideoPosters => {
                let Some(title) = prompter.ask("Enter video title: ")? else {
                    return Ok(Flow::Continue);
                };
                let rows = queries::video_posters(client, &title).await?;
                print_rows(&rows, &["uid", "title", "~posts"], format, "No posters found for that video.")?;
            }
            MenuChoice::VideosSorted => {
                let Some(answer) =
                    prompter.ask("Enter 'desc' or 'asc', depending on the result you want: ")?
                else {
                    return Ok(Flow::Continue);
                };
                let rows = queries::videos_sorted(client, SortDirection::parse(&answer)).await?;
                print_rows(&rows, &["uid", "title", "duration"], format, "No videos found.")?;
            }
            MenuChoice::VideoCount => {
                let count = queries::video_count(client).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::json!({ "count": count })),
                    OutputFormat::Table => println!("Video count: {}", count),
                }
            }
            MenuChoice::VideoPages => {
                let Some(first) = prompter.ask("Enter first result: ")? else {
                    return Ok(Flow::Continue);
                };
                let Some(offset) = prompter.ask("Enter offset: ")? else {
                    return Ok(Flow::Continue);
                };
                let page = Page::try_parse(&first, &offset).unwrap_or_else(|| {
                    println!("Invalid pagination values; using defaults.");
                    Page::default()
                });
                let rows = queries::videos_page(client, page).await?;
                print_rows(&rows, &["uid", "title"], format, "No videos on that page.")?;
            }
            MenuChoice::DeleteComments => {
                let Some(term) = prompter.ask("Enter comment text: ")? else {
                    return Ok(Flow::Continue);
                };
                match delete_comments_matching(client, &term).await? {
                    DeleteOutcome::Deleted(n) => {
                        println!("Deleted {} comment(s) matching: '{}'", n, term)
                    }
                    DeleteOutcome::NothingMatched => {
                        println!("No comments found matching: '{}'", term)
                    }
                }
            }
            MenuChoice::DropAll => {
                drop_all(client).await?;
                println!("All data and schema dropped.");
                match declare_schema(client, &self.config.loader.retry).await {
                    Ok(()) => println!("Schema declared again."),
                    Err(e) => println!("Warning: {}", e),
                }
            }
            MenuChoice::Exit => {
                self.exit().await;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    async fn exit(&self) {
        println!("\nExiting application...");
        if self.keep_data_on_exit {
            println!("Keeping data.");
        } else {
            match drop_all(self.client).await {
                Ok(()) => println!("All data dropped."),
                Err(e) => warn!("Could not drop data on exit: {}", e),
            }
        }
        println!("Goodbye!");
    }
}

//! NutriQuery command-line front end.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ai_client::OpenAi;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use nutriquery_common::{AppConfig, Catalog, Category, NutriQueryError};
use nutriquery_engine::{summarize, Assembler, GenerationClient, QueryAnswer, QuerySession};
use nutriquery_ingest::{fetch_all, normalize_all, OpenFoodFactsClient, DEFAULT_PAGE_SIZE};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[command(name = "nutriquery")]
#[command(about = "Ask natural-language questions about packaged food products")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults to $NUTRIQUERY_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List product categories
    Categories,

    /// Download raw product data from Open Food Facts
    Fetch {
        /// Only this category (label or slug); all when omitted
        #[arg(long)]
        category: Option<Category>,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Output directory (defaults to the configured data dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Normalize raw JSON into cleaned CSV tables
    Clean {
        #[arg(long)]
        category: Option<Category>,

        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Run one query against a category
    Ask {
        #[arg(long)]
        category: Category,

        /// The question, e.g. "highest protein for the price"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show nutrient ranges and allergen counts for a category
    Summary {
        #[arg(long)]
        category: Category,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("nutriquery=info".parse()?)
        .add_directive("ai_client=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Categories) => {
            println!("{}", render::categories_listing());
            Ok(())
        }
        Some(Commands::Fetch {
            category,
            page_size,
            page,
            out_dir,
        }) => cmd_fetch(config_path, category, page_size, page, out_dir).await,
        Some(Commands::Clean { category, data_dir }) => cmd_clean(config_path, category, data_dir),
        Some(Commands::Ask { category, query }) => {
            cmd_ask(config_path, category, &query.join(" ")).await
        }
        Some(Commands::Summary { category }) => cmd_summary(config_path, category),
        None => interactive(config_path).await,
    }
}

fn selected(category: Option<Category>) -> Vec<Category> {
    category.map_or_else(|| Category::ALL.to_vec(), |c| vec![c])
}

async fn cmd_fetch(
    config_path: Option<&Path>,
    category: Option<Category>,
    page_size: u32,
    page: u32,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let out_dir = match out_dir {
        Some(dir) => dir,
        None => AppConfig::data_dir_from_env(config_path)?,
    };
    let client = OpenFoodFactsClient::new()?;
    let fetched = fetch_all(&client, &selected(category), &out_dir, page_size, page).await?;

    for (category, count) in fetched {
        println!("{:<16} {} products", category.slug(), count);
    }
    Ok(())
}

fn cmd_clean(
    config_path: Option<&Path>,
    category: Option<Category>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => AppConfig::data_dir_from_env(config_path)?,
    };
    let written = normalize_all(&data_dir, &selected(category))?;
    if written.is_empty() {
        println!("No raw data files found in {}", data_dir.display());
    }
    for (category, rows) in written {
        println!("{:<16} {} rows -> {}", category.slug(), rows, category.cleaned_file_name());
    }
    Ok(())
}

fn cmd_summary(config_path: Option<&Path>, category: Category) -> Result<()> {
    let data_dir = AppConfig::data_dir_from_env(config_path)?;
    let catalog = Catalog::load(&data_dir)?;
    let table = catalog.get(category)?;

    println!("{}", style(category.label()).bold());
    print!("{}", summarize(table.products()));
    Ok(())
}

fn build_session(config_path: Option<&Path>) -> Result<QuerySession<OpenAi>> {
    let config = AppConfig::from_env(config_path).context("Failed to load configuration")?;
    let catalog = Catalog::load(&config.data_dir)?;
    if catalog.is_empty() {
        info!(data_dir = %config.data_dir.display(), "No cleaned tables loaded");
    }

    Ok(QuerySession::new(
        catalog,
        Assembler::new(config.max_prompt_rows),
        GenerationClient::from_config(&config),
    ))
}

async fn cmd_ask(config_path: Option<&Path>, category: Category, query: &str) -> Result<()> {
    let session = build_session(config_path)?;
    let answer = session.ask(category, query).await?;
    print_answer(&answer);
    Ok(())
}

fn print_answer(answer: &QueryAnswer) {
    println!();
    println!("{}", style("Filtered Results").bold().underlined());
    if answer.result.is_empty() {
        println!("No matching data found.");
    } else {
        println!("{}", render::result_table(&answer.result));
        println!();
        print!("{}", summarize(answer.result.products()));
    }

    println!();
    println!("{}", style("Response").bold().underlined());
    println!("{}", answer.response());
}

async fn interactive(config_path: Option<&Path>) -> Result<()> {
    let session = build_session(config_path)?;
    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();

    println!("{}", style("NutriQuery").bold());
    println!("Select a category, then ask a question. Submit an empty query to exit.");

    loop {
        println!();
        let choice = Select::with_theme(&theme)
            .with_prompt("Category")
            .items(&labels)
            .default(0)
            .interact()?;
        let category = Category::ALL[choice];

        let query: String = Input::with_theme(&theme)
            .with_prompt("Query")
            .allow_empty(true)
            .interact_text()?;
        let query = query.trim();
        if query.is_empty() {
            break;
        }

        match session.ask(category, query).await {
            Ok(answer) => print_answer(&answer),
            Err(e @ NutriQueryError::CategoryNotFound(_)) => {
                println!("{}", style(e).yellow());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

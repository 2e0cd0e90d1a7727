use anyhow::Result;
use clap::Parser;
use course_union::data::{CatalogItem, SourceItem};
use course_union::integrations::JoanieClient;
use course_union::union::PageOutcome;
use course_union::{config, course_product_union};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "course-union")]
#[command(about = "List courses and course products of a Joanie backend as one paginated list")]
#[command(version)]
struct Args {
    /// Initialize configuration
    #[arg(long)]
    init: bool,

    /// Path to config file
    #[arg(long, short)]
    config: Option<std::path::PathBuf>,

    /// Items per page (defaults to pagination.per_page from the config)
    #[arg(long)]
    per_page: Option<u32>,

    /// Restrict both listings to one organization
    #[arg(long, short)]
    organization: Option<String>,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Print items as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("course_union=info".parse()?),
        )
        .init();

    if args.init {
        config::init_wizard().await?;
        return Ok(());
    }

    let config = config::load(args.config.as_deref())?;
    let per_page = args.per_page.unwrap_or(config.pagination.per_page);

    let client = Arc::new(JoanieClient::from_config(&config));
    let query = course_product_union(client, per_page, args.organization.clone())?;

    for page_number in 1..=args.pages {
        match query.fetch_next_page().await? {
            PageOutcome::Applied(page) => {
                if !args.json {
                    println!("-- page {} --", page_number);
                }
                for item in &page.items {
                    print_item(item, args.json)?;
                }
                if !page.has_next {
                    break;
                }
            }
            PageOutcome::Exhausted => break,
            PageOutcome::Stale | PageOutcome::Unchanged => {}
        }
    }

    let snapshot = query.snapshot().await;
    tracing::info!(
        "loaded {} items over {} pages (more available: {})",
        snapshot.data.len(),
        snapshot.pages_loaded,
        snapshot.has_next
    );

    Ok(())
}

fn print_item(item: &CatalogItem, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(item)?);
    } else {
        println!(
            "[{:<7}] {:<12} {} ({})",
            item.kind_label(),
            item.course_code(),
            item.title(),
            item.id()
        );
    }
    Ok(())
}

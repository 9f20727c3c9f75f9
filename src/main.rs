//! Rostercache CLI entry point.
//!
//! Each command maps onto a screen of the original admin UI: a paged
//! student list, a detail view, and create/update/delete forms. Reads go
//! through a keyed query cache, so within one invocation repeated lookups
//! reuse fetched data instead of hitting the backend again.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rostercache::api::{MemoryBackend, StudentApi, StudentBackend};
use rostercache::cache::{QueryCache, StudentQueries};
use rostercache::config::Config;
use rostercache::form::StudentForm;
use rostercache::list::StudentList;
use rostercache::models::{FieldEdit, Gender, StudentId};
use rostercache::mutation::StudentMutations;
use rostercache::output;
use rostercache::routes::Route;

// ============================================================================
// Constants
// ============================================================================

/// Students seeded into the demo backend
const DEMO_SEED_COUNT: usize = 25;

#[derive(Parser)]
#[command(name = "rostercache")]
#[command(about = "Cached command-line client for a student roster API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run against an in-memory backend seeded with sample students
    #[arg(long, global = true)]
    demo: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List students one page at a time
    List {
        /// Page to display (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show a single student
    Show {
        /// Student ID
        id: StudentId,
    },

    /// Create a student
    Create {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        /// Male, Female, or anything else for Agender
        #[arg(long, default_value = "Agender")]
        gender: String,

        #[arg(long)]
        country: String,

        #[arg(long, default_value = "")]
        avatar: String,

        #[arg(long, default_value = "")]
        btc_address: String,
    },

    /// Update fields on an existing student
    Update {
        /// Student ID
        id: StudentId,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        avatar: Option<String>,

        #[arg(long)]
        btc_address: Option<String>,
    },

    /// Delete a student
    Delete {
        /// Student ID
        id: StudentId,

        /// Page the student is listed on
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Resolve an app path such as /students?page=2 and run its screen
    Open {
        /// Path to resolve
        path: String,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    info!(page_size = config.page_size, demo = cli.demo, "Rostercache starting");

    let backend: Arc<dyn StudentBackend> = if cli.demo {
        Arc::new(MemoryBackend::seeded(DEMO_SEED_COUNT))
    } else {
        Arc::new(StudentApi::new(config.base_url.as_str())?)
    };
    let queries = StudentQueries::new(QueryCache::new(), Arc::clone(&backend), config.page_size)
        .with_fresh_secs(config.student_fresh_secs);
    let mutations = StudentMutations::new(backend, queries.clone());

    // Mirror cache lifecycle events into the debug log.
    let mut events = queries.cache().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(?event, "Cache event");
        }
    });

    match cli.command {
        Commands::List { page } => cmd_list(queries, mutations, page).await.map(|_| ()),
        Commands::Show { id } => cmd_show(&queries, id).await,
        Commands::Create {
            first_name,
            last_name,
            email,
            gender,
            country,
            avatar,
            btc_address,
        } => {
            let edits = vec![
                FieldEdit::FirstName(first_name),
                FieldEdit::LastName(last_name),
                FieldEdit::Email(email),
                FieldEdit::Gender(Gender::parse(&gender)),
                FieldEdit::Country(country),
                FieldEdit::Avatar(avatar),
                FieldEdit::BtcAddress(btc_address),
            ];
            cmd_create(&mutations, edits).await
        }
        Commands::Update {
            id,
            first_name,
            last_name,
            email,
            gender,
            country,
            avatar,
            btc_address,
        } => {
            let mut edits = Vec::new();
            if let Some(v) = first_name {
                edits.push(FieldEdit::FirstName(v));
            }
            if let Some(v) = last_name {
                edits.push(FieldEdit::LastName(v));
            }
            if let Some(v) = email {
                edits.push(FieldEdit::Email(v));
            }
            if let Some(v) = gender {
                edits.push(FieldEdit::Gender(Gender::parse(&v)));
            }
            if let Some(v) = country {
                edits.push(FieldEdit::Country(v));
            }
            if let Some(v) = avatar {
                edits.push(FieldEdit::Avatar(v));
            }
            if let Some(v) = btc_address {
                edits.push(FieldEdit::BtcAddress(v));
            }
            cmd_update(&queries, &mutations, id, edits).await
        }
        Commands::Delete { id, page } => cmd_delete(queries, mutations, id, page).await,
        Commands::Open { path } => cmd_open(queries, mutations, &path).await,
    }
}

async fn cmd_list(
    queries: StudentQueries,
    mutations: StudentMutations,
    page: u32,
) -> Result<StudentList> {
    let mut list = StudentList::new(queries, mutations);
    list.goto_page(page).await;
    if let Some(err) = list.last_error() {
        anyhow::bail!("Failed to load page {}: {}", page, err);
    }
    println!("{}", output::student_table(list.rows()));
    println!("{}", output::pager_line(&list.pager()));
    Ok(list)
}

async fn cmd_show(queries: &StudentQueries, id: StudentId) -> Result<()> {
    let student = queries.student(id).await?;
    println!("{}", output::student_detail(&student));
    Ok(())
}

async fn cmd_create(mutations: &StudentMutations, edits: Vec<FieldEdit>) -> Result<()> {
    let mut form = StudentForm::create();
    for edit in edits {
        form.apply(edit);
    }
    form.submit(mutations).await;
    report_form(form)
}

async fn cmd_update(
    queries: &StudentQueries,
    mutations: &StudentMutations,
    id: StudentId,
    edits: Vec<FieldEdit>,
) -> Result<()> {
    let mut form = StudentForm::edit(id);
    form.load(queries).await;
    if let Some(message) = form.error_message() {
        anyhow::bail!("Failed to load student {}: {}", id, message);
    }
    for edit in edits {
        form.apply(edit);
    }
    form.submit(mutations).await;
    report_form(form)
}

async fn cmd_delete(
    queries: StudentQueries,
    mutations: StudentMutations,
    id: StudentId,
    page: u32,
) -> Result<()> {
    let mut list = StudentList::new(queries, mutations);
    list.goto_page(page).await;
    list.delete(id).await;
    if let Some(err) = list.delete_error() {
        anyhow::bail!("Failed to delete student {}: {}", id, err);
    }
    if let Some(notice) = list.take_notice() {
        println!("{}", notice);
    }
    println!("{}", output::student_table(list.rows()));
    println!("{}", output::pager_line(&list.pager()));
    Ok(())
}

async fn cmd_open(queries: StudentQueries, mutations: StudentMutations, path: &str) -> Result<()> {
    match Route::parse(path) {
        Route::Dashboard => {
            let page = queries.page(1).await?;
            println!("{} students enrolled", page.total);
            Ok(())
        }
        Route::Students { page } => {
            // Navigating the list screen warms the detail cache for its rows.
            let list = cmd_list(queries, mutations, page).await?;
            list.prefetch_visible().await;
            Ok(())
        }
        Route::CreateStudent => {
            println!("Create a student with: rostercache create --first-name ... --email ...");
            Ok(())
        }
        Route::EditStudent { id } => cmd_show(&queries, id).await,
        Route::About => {
            println!("rostercache {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Route::NotFound => anyhow::bail!("No screen matches {}", path),
    }
}

/// Print the outcome of a form submission, mapping validation failures
/// to a field-by-field table.
fn report_form(mut form: StudentForm) -> Result<()> {
    if let Some(notice) = form.take_notice() {
        println!("{}", notice);
        if let Some(student) = form.submitted_student() {
            println!("{}", output::student_detail(student));
        }
        return Ok(());
    }
    if let Some(errors) = form.errors() {
        eprintln!("{}", output::field_errors_table(errors));
        anyhow::bail!("Validation failed");
    }
    match form.error_message() {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use finder_core::grid::render_table;
use finder_core::{
    AddPatientDialog, AddPatientForm, AvatarGenerator, AvatarOptions, DeletePatientDialog,
    EditPatientDialog, FetchOutcome, FinderConfig, HttpPatientStore, IdenticonAvatars,
    PatientListSynchronizer, PatientRow, PatientStore, QuickFilter,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "finder")]
#[command(about = "Patient finder CLI for a FHIR server")]
struct Cli {
    /// FHIR base URL (overrides FHIR_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of patients, most recently updated first
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Patients per page (overrides FINDER_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
        /// Quick filter applied to the fetched page
        #[arg(long)]
        filter: Option<String>,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a patient
    Add {
        first_name: String,
        last_name: String,
        /// male, female or unknown
        gender: String,
        /// Date of birth (YYYY-MM-DD)
        birth_date: String,
        phone_number: String,
    },
    /// Edit a patient's details. Fields not given keep their current value
    Edit {
        id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
    },
    /// Delete a patient
    Delete { id: String },
    /// Print the avatar for a seed (usually a patient ID) as SVG
    Avatar {
        seed: String,
        #[arg(long, default_value_t = 100)]
        size: u32,
        /// Corner radius in percent (0-50)
        #[arg(long, default_value_t = 50)]
        radius: u32,
        /// Print a data URI instead of raw SVG
        #[arg(long)]
        data_uri: bool,
    },
}

fn load_config(base_url: Option<String>) -> anyhow::Result<FinderConfig> {
    let cfg = FinderConfig::from_raw_values(
        std::env::var("FHIR_BASE_URL").ok(),
        std::env::var("FINDER_PAGE_SIZE").ok(),
        std::env::var("FINDER_REQUEST_TIMEOUT_SECS").ok(),
        std::env::var("FINDER_REFRESH_AFTER_MUTATION").ok(),
    )?;
    Ok(match base_url {
        Some(url) => cfg.with_base_url(url)?,
        None => cfg,
    })
}

/// Fetch a patient and project it the way the grid shows it.
async fn fetch_row(store: &dyn PatientStore, id: &str) -> anyhow::Result<PatientRow> {
    let patient = store
        .read(id)
        .await
        .with_context(|| format!("reading patient {id}"))?;
    PatientRow::project(&patient).context("server returned a patient without an ID")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("finder_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Some(Commands::List {
            page,
            page_size,
            filter,
            json,
        }) => {
            let mut cfg = load_config(cli.base_url)?;
            if let Some(size) = page_size {
                cfg = cfg.with_page_size(size)?;
            }
            let store = HttpPatientStore::new(&cfg)?;

            let mut list = PatientListSynchronizer::new(cfg.page_size());
            if list.fetch(&store, page).await == FetchOutcome::Failed {
                bail!("Error fetching patient data from {}", store.base_url());
            }

            let filter = QuickFilter::new(filter.unwrap_or_default());
            let rows = filter.apply(list.rows());
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", render_table(&rows, &IdenticonAvatars, &list.pagination()));
            }
        }
        Some(Commands::Add {
            first_name,
            last_name,
            gender,
            birth_date,
            phone_number,
        }) => {
            let store = HttpPatientStore::new(&load_config(cli.base_url)?)?;
            let mut dialog = AddPatientDialog::new();
            dialog.open();
            dialog.set_form(AddPatientForm {
                first_name,
                last_name,
                gender,
                birth_date,
                phone_number,
            });

            match dialog.submit(&store, today).await {
                Ok(created) => println!(
                    "Added patient with ID: {}",
                    created.id.as_deref().unwrap_or("(none returned)")
                ),
                Err(e) => bail!("{}", dialog.error().map_or_else(|| e.to_string(), str::to_string)),
            }
        }
        Some(Commands::Edit {
            id,
            first_name,
            last_name,
            gender,
            birth_date,
            phone_number,
        }) => {
            let store = HttpPatientStore::new(&load_config(cli.base_url)?)?;
            let row = fetch_row(&store, &id).await?;

            let mut dialog = EditPatientDialog::new();
            dialog.open_for(&row, &IdenticonAvatars);
            let form = dialog.form_mut();
            if let Some(v) = first_name {
                form.first_name = v;
            }
            if let Some(v) = last_name {
                form.last_name = v;
            }
            if let Some(v) = gender {
                form.gender = v;
            }
            if let Some(v) = birth_date {
                form.birth_date = v;
            }
            if let Some(v) = phone_number {
                form.phone_number = v;
            }

            match dialog.submit(&store, today).await {
                Ok(_) => println!("Updated patient: {id}"),
                Err(e) => bail!("{}", dialog.error().map_or_else(|| e.to_string(), str::to_string)),
            }
        }
        Some(Commands::Delete { id }) => {
            let store = HttpPatientStore::new(&load_config(cli.base_url)?)?;
            let row = fetch_row(&store, &id).await?;

            let mut dialog = DeletePatientDialog::new();
            dialog.open_for(&row);
            for (label, value) in dialog.summary() {
                println!("{label}: {value}");
            }
            match dialog.confirm(&store).await {
                Some(deleted) => println!("Deleted patient: {deleted}"),
                None => bail!("Error deleting patient {id}"),
            }
        }
        Some(Commands::Avatar {
            seed,
            size,
            radius,
            data_uri,
        }) => {
            let avatar = IdenticonAvatars.generate(&seed, AvatarOptions::new(size, radius));
            if data_uri {
                println!("{}", avatar.to_data_uri());
            } else {
                println!("{}", avatar.svg());
            }
        }
        None => {
            println!("Use 'finder --help' for commands");
        }
    }

    Ok(())
}

use anyhow::Context;
use clap::Parser;
use fhir::{AdministrativeGender, ContactPoint, HumanName, NameUse, PatientData};
use finder_core::{
    ActiveDialog, AddPatientForm, AppController, Column, Command, EditPatientForm, FinderConfig,
    HttpPatientStore, IdenticonAvatars, MemoryPatientStore, Outcome, PatientStore, SortDirection,
};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "patient-finder")]
#[command(about = "Browse and maintain the patients held by a FHIR server")]
struct Args {
    /// FHIR base URL (overrides FHIR_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
    /// Patients per page (overrides FINDER_PAGE_SIZE)
    #[arg(long)]
    page_size: Option<u32>,
    /// Refetch the current page after add, edit and delete
    #[arg(long)]
    refresh_after_mutation: bool,
    /// Use an in-memory store seeded with demo patients instead of a server
    #[arg(long)]
    offline: bool,
}

const HELP: &str = "\
Commands:
  n | p                    next / previous page
  page <n>                 jump to page
  filter <text>            quick filter on the current page (empty to clear)
  sort <column> [asc|desc] sort the current page (sort off to clear)
  add                      add a patient
  edit <id>                edit a patient
  delete <id>              delete a patient
  refresh                  refetch the current page
  help                     show this help
  quit";

/// Line-based terminal input.
struct Console<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Print `label` and read one line. `None` at end of input.
    async fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    /// Read a form field. Enter keeps `current`, `-` clears it.
    async fn field(&mut self, label: &str, current: &str) -> anyhow::Result<String> {
        let line = self
            .prompt(&format!("{label} [{current}]: "))
            .await?
            .context("input closed")?;
        Ok(match line.trim() {
            "" => current.to_string(),
            "-" => String::new(),
            value => value.to_string(),
        })
    }

    async fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        let answer = self.prompt(&format!("{question} [y/N]: ")).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim),
            Some("y" | "Y" | "yes")
        ))
    }
}

fn load_config(args: &Args) -> anyhow::Result<FinderConfig> {
    let mut cfg = FinderConfig::from_raw_values(
        std::env::var("FHIR_BASE_URL").ok(),
        std::env::var("FINDER_PAGE_SIZE").ok(),
        std::env::var("FINDER_REQUEST_TIMEOUT_SECS").ok(),
        std::env::var("FINDER_REFRESH_AFTER_MUTATION").ok(),
    )?;
    if let Some(url) = &args.base_url {
        cfg = cfg.with_base_url(url.as_str())?;
    }
    if let Some(size) = args.page_size {
        cfg = cfg.with_page_size(size)?;
    }
    if args.refresh_after_mutation {
        cfg = cfg.with_refresh_after_mutation(true);
    }
    Ok(cfg)
}

/// Demo records for `--offline`.
fn demo_patients() -> Vec<PatientData> {
    const PEOPLE: [(&str, &str, AdministrativeGender, &str); 12] = [
        ("Amelia", "Hart", AdministrativeGender::Female, "1984-02-17"),
        ("Oliver James", "Reid", AdministrativeGender::Male, "1979-11-03"),
        ("Isla", "Moreno", AdministrativeGender::Female, "1992-06-28"),
        ("Noah", "Patel", AdministrativeGender::Male, "2001-01-09"),
        ("Freya", "Okafor", AdministrativeGender::Female, "1966-09-14"),
        ("Leo", "Schmidt", AdministrativeGender::Unknown, "1988-04-22"),
        ("Ava Rose", "Kowalski", AdministrativeGender::Female, "1975-12-31"),
        ("Arthur", "Nakamura", AdministrativeGender::Male, "1953-07-05"),
        ("Mia", "Lindqvist", AdministrativeGender::Female, "2010-03-19"),
        ("Theo", "Adeyemi", AdministrativeGender::Male, "1995-08-30"),
        ("Grace", "Byrne", AdministrativeGender::Female, "1969-05-11"),
        ("Finn", "Costa", AdministrativeGender::Male, "1999-10-02"),
    ];

    PEOPLE
        .iter()
        .enumerate()
        .map(|(i, (given, family, gender, birth_date))| PatientData {
            id: None,
            active: Some(true),
            names: vec![HumanName {
                use_type: Some(NameUse::Official),
                text: Some(format!("{given} {family}")),
                family: Some(family.to_string()),
                given: given.split_whitespace().map(str::to_string).collect(),
            }],
            gender: Some(*gender),
            birth_date: Some(birth_date.to_string()),
            // Every third record has no phone.
            telecom: if i % 3 == 2 {
                Vec::new()
            } else {
                vec![ContactPoint::work_phone(format!("07700 900{i:03}"))]
            },
            last_updated: None,
        })
        .collect()
}

fn report(app: &AppController, outcome: &Outcome) {
    match outcome {
        Outcome::PatientAdded(patient) => {
            println!("Patient added: {}", patient.id.as_deref().unwrap_or("(no ID)"));
        }
        Outcome::PatientUpdated(_) => println!("Patient updated."),
        Outcome::PatientDeleted(id) => println!("Patient deleted: {id}"),
        Outcome::DeleteFailed => println!("The patient could not be deleted."),
        Outcome::DialogError(message) => println!("{message}"),
        Outcome::Fetched(_)
        | Outcome::Filtered { .. }
        | Outcome::Sorted
        | Outcome::Unchanged => {}
        Outcome::DialogOpened | Outcome::DialogClosed => return,
    }
    print!("{}", app.render());
}

/// Close whatever dialog is still open when a dialog flow ended in an error.
async fn close_on_error(
    app: &mut AppController,
    result: anyhow::Result<()>,
) -> anyhow::Result<()> {
    if result.is_err() && app.state().dialog.is_some() {
        app.dispatch(Command::CloseDialog).await?;
    }
    result
}

async fn run_add<R: AsyncBufRead + Unpin>(
    app: &mut AppController,
    console: &mut Console<R>,
) -> anyhow::Result<()> {
    app.dispatch(Command::OpenAdd).await?;
    let result = add_loop(app, console).await;
    close_on_error(app, result).await
}

async fn add_loop<R: AsyncBufRead + Unpin>(
    app: &mut AppController,
    console: &mut Console<R>,
) -> anyhow::Result<()> {
    let mut form = AddPatientForm::default();

    loop {
        form.first_name = console.field("First Name", &form.first_name).await?;
        form.last_name = console.field("Last Name", &form.last_name).await?;
        form.gender = console
            .field("Gender (male/female/unknown)", &form.gender)
            .await?;
        form.birth_date = console
            .field("Date of Birth (YYYY-MM-DD)", &form.birth_date)
            .await?;
        form.phone_number = console.field("Phone Number", &form.phone_number).await?;

        let outcome = app.dispatch(Command::SubmitAdd(form.clone())).await?;
        if let Outcome::DialogError(message) = &outcome {
            println!("{message}");
            if console.confirm("Try again?").await? {
                continue;
            }
            app.dispatch(Command::CloseDialog).await?;
            return Ok(());
        }
        report(app, &outcome);
        return Ok(());
    }
}

async fn run_edit<R: AsyncBufRead + Unpin>(
    app: &mut AppController,
    console: &mut Console<R>,
    id: &str,
) -> anyhow::Result<()> {
    app.dispatch(Command::OpenEdit(id.to_string())).await?;
    let result = edit_loop(app, console, id).await;
    close_on_error(app, result).await
}

async fn edit_loop<R: AsyncBufRead + Unpin>(
    app: &mut AppController,
    console: &mut Console<R>,
    id: &str,
) -> anyhow::Result<()> {
    let mut form = match &app.state().dialog {
        Some(ActiveDialog::Edit(dialog)) => {
            if let Some(avatar) = dialog.avatar() {
                println!("Editing {id} (avatar {})", avatar.colour());
            }
            dialog.form().clone()
        }
        _ => EditPatientForm::default(),
    };

    loop {
        form.first_name = console.field("First Name", &form.first_name).await?;
        form.last_name = console.field("Last Name", &form.last_name).await?;
        form.gender = console.field("Gender", &form.gender).await?;
        form.birth_date = console
            .field("Date of Birth (YYYY-MM-DD)", &form.birth_date)
            .await?;
        form.phone_number = console.field("Phone Number", &form.phone_number).await?;

        let outcome = app.dispatch(Command::SaveEdit(form.clone())).await?;
        if let Outcome::DialogError(message) = &outcome {
            println!("{message}");
            if console.confirm("Try again?").await? {
                continue;
            }
            app.dispatch(Command::CloseDialog).await?;
            return Ok(());
        }
        report(app, &outcome);
        return Ok(());
    }
}

async fn run_delete<R: AsyncBufRead + Unpin>(
    app: &mut AppController,
    console: &mut Console<R>,
    id: &str,
) -> anyhow::Result<()> {
    app.dispatch(Command::OpenDelete(id.to_string())).await?;
    if let Some(ActiveDialog::Delete(dialog)) = &app.state().dialog {
        println!("Are you sure you want to delete this patient?");
        for (label, value) in dialog.summary() {
            println!("  {label}: {value}");
        }
    }

    if console.confirm("Delete").await? {
        let outcome = app.dispatch(Command::ConfirmDelete).await?;
        report(app, &outcome);
    } else {
        app.dispatch(Command::CloseDialog).await?;
    }
    Ok(())
}

fn parse_sort(args: &str) -> anyhow::Result<Command> {
    let mut words = args.split_whitespace();
    let column = words.next().context("usage: sort <column> [asc|desc]")?;
    if column == "off" {
        return Ok(Command::ClearSort);
    }
    let direction = match words.next() {
        Some(d) => d.parse::<SortDirection>()?,
        None => SortDirection::Ascending,
    };
    Ok(Command::SortBy(column.parse::<Column>()?, direction))
}

/// Run one input line. Returns `false` when the user asked to quit.
async fn handle_line<R: AsyncBufRead + Unpin>(
    app: &mut AppController,
    console: &mut Console<R>,
    line: &str,
) -> anyhow::Result<bool> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match word {
        "" => return Ok(true),
        "q" | "quit" | "exit" => return Ok(false),
        "help" | "?" => {
            println!("{HELP}");
            return Ok(true);
        }
        "add" => {
            run_add(app, console).await?;
            return Ok(true);
        }
        "edit" => {
            run_edit(app, console, rest).await?;
            return Ok(true);
        }
        "delete" => {
            run_delete(app, console, rest).await?;
            return Ok(true);
        }
        "n" | "next" => Command::NextPage,
        "p" | "prev" | "previous" => Command::PreviousPage,
        "page" => Command::JumpToPage(rest.to_string()),
        "filter" => Command::SetQuickFilter(rest.to_string()),
        "sort" => parse_sort(rest)?,
        "refresh" => Command::Refresh,
        other => {
            println!("Unknown command '{other}'. Type 'help' for commands.");
            return Ok(true);
        }
    };

    let outcome = app.dispatch(command).await?;
    report(app, &outcome);
    Ok(true)
}

/// Entry point for the interactive patient finder.
///
/// Renders one page of patients at a time and reads commands from standard input. Logs go to
/// standard error so they do not interleave with the table.
///
/// # Environment Variables
/// - `FHIR_BASE_URL`: FHIR server (default: "https://demo.kodjin.com/fhir")
/// - `FINDER_PAGE_SIZE`: patients per page (default: 10)
/// - `FINDER_REQUEST_TIMEOUT_SECS`: per-request timeout, 0 or unset for none
/// - `FINDER_REFRESH_AFTER_MUTATION`: refetch after add/edit/delete (default: false)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("finder_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    let store: Arc<dyn PatientStore> = if args.offline {
        tracing::info!("++ Using in-memory store with demo patients");
        Arc::new(MemoryPatientStore::with_patients(demo_patients()))
    } else {
        tracing::info!("++ Using FHIR server at {}", cfg.base_url());
        Arc::new(HttpPatientStore::new(&cfg)?)
    };

    let mut app = AppController::new(store, Arc::new(IdenticonAvatars), cfg.page_size())
        .with_refresh_after_mutation(cfg.refresh_after_mutation());
    let mut console = Console::new(BufReader::new(tokio::io::stdin()));

    let outcome = app.dispatch(Command::Load).await?;
    report(&app, &outcome);
    println!("Type 'help' for commands.");

    while let Some(line) = console.prompt("> ").await? {
        match handle_line(&mut app, &mut console, &line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("{e}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_app() -> AppController {
        let store = Arc::new(MemoryPatientStore::with_patients(demo_patients()));
        AppController::new(store, Arc::new(IdenticonAvatars), 10)
    }

    #[tokio::test]
    async fn input_ending_mid_add_closes_the_dialog() {
        let mut app = offline_app();
        let mut console = Console::new(&b"Jane\nDoe\n"[..]);

        let err = run_add(&mut app, &mut console).await.expect_err("input closed");
        assert_eq!(err.to_string(), "input closed");
        assert!(app.state().dialog.is_none());
    }

    #[tokio::test]
    async fn input_ending_mid_edit_closes_the_dialog() {
        let mut app = offline_app();
        app.dispatch(Command::Load).await.expect("load");
        let id = app.state().list.rows()[0].id.clone();
        let mut console = Console::new(&b"\n"[..]);

        run_edit(&mut app, &mut console, &id).await.expect_err("input closed");
        assert!(app.state().dialog.is_none());
    }

    #[tokio::test]
    async fn completed_add_reports_and_closes() {
        let mut app = offline_app();
        app.dispatch(Command::Load).await.expect("load");
        let mut console = Console::new(&b"Ann\nLee\nfemale\n1990-02-03\n555\n"[..]);

        run_add(&mut app, &mut console).await.expect("added");
        assert!(app.state().dialog.is_none());
    }
}

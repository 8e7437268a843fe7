//! Command line front end for the user dashboard.
//!
//! # Responsibility
//! - Drive load, list (filter + sort), add, edit and delete against a SQLite
//!   database file.
//! - Print the same messages the dashboard shows for load and form errors.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use userdash_core::db::{open_db, SqliteKeyValueStorage};
use userdash_core::{
    default_log_level, init_logging, DashboardConfig, HttpSeedSource, KvUserRepository,
    SortConfig, SortDirection, SortKey, StatusFilter, SubmitOutcome, UserForm, UserId,
    UserRecord, UserStore,
};

#[derive(Parser)]
#[command(name = "userdash", version, about = "Manage dashboard user records")]
struct Cli {
    /// SQLite database file (defaults to USERDASH_DB_PATH or a temp file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Seed endpoint used when the database holds no users yet.
    #[arg(long, global = true)]
    seed_url: Option<String>,
    /// Absolute directory for log files; logging is off when unset.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List users, optionally filtered by status and sorted by a column.
    List {
        /// all | true | false
        #[arg(long, default_value = "all")]
        status: String,
        /// name | email | age | isActive
        #[arg(long, default_value = "name")]
        sort: String,
        #[arg(long)]
        desc: bool,
    },
    /// Add a user.
    Add(FormArgs),
    /// Edit a user; omitted fields keep their current values.
    Edit {
        id: String,
        #[command(flatten)]
        form: EditArgs,
    },
    /// Delete a user by id.
    Delete { id: String },
}

#[derive(Args)]
struct FormArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    age: String,
    #[arg(long)]
    active: bool,
}

#[derive(Args)]
struct EditArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    active: Option<bool>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut config = DashboardConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(url) = cli.seed_url {
        config.seed_url = url;
    }
    config.log_dir = cli.log_dir.or(config.log_dir);
    config.log_level = cli.log_level.or(config.log_level);

    if let Some(log_dir) = &config.log_dir {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.display().to_string()).map_err(|err| err.to_string())?;
    }

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let repo = KvUserRepository::with_key(SqliteKeyValueStorage::new(&conn), &config.storage_key);
    let seed =
        HttpSeedSource::new(&config.seed_url, config.seed_timeout()).map_err(|err| err.to_string())?;
    let mut store = UserStore::new(repo);
    if let Err(err) = store.load(&seed, &mut rand::thread_rng()) {
        log::error!("event=cli_load module=cli status=error error={err}");
        return Err(store.load_error().unwrap_or("load failed").to_string());
    }

    match cli.command {
        Command::List { status, sort, desc } => {
            let filter = StatusFilter::parse(&status).map_err(|err| err.to_string())?;
            let key = SortKey::parse(&sort).ok_or_else(|| format!("unknown sort column `{sort}`"))?;
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            print_table(&store.view(filter, SortConfig::new(key, direction)));
        }
        Command::Add(args) => {
            let form = UserForm::new(args.name, args.email, args.age, args.active);
            report(store.submit(&form, None).map_err(|err| err.to_string())?)?;
        }
        Command::Edit { id, form: args } => {
            let id = UserId::new(id);
            let current = store
                .get(&id)
                .ok_or_else(|| format!("no user with id `{id}`"))?;
            let mut form = UserForm::from_record(current);
            if let Some(name) = args.name {
                form.name = name;
            }
            if let Some(email) = args.email {
                form.email = email;
            }
            if let Some(age) = args.age {
                form.age = age;
            }
            if let Some(active) = args.active {
                form.is_active = active;
            }
            report(store.submit(&form, Some(&id)).map_err(|err| err.to_string())?)?;
        }
        Command::Delete { id } => {
            let id = UserId::new(id);
            let existed = store.get(&id).is_some();
            store.delete(&id).map_err(|err| err.to_string())?;
            if existed {
                println!("deleted {id}");
            } else {
                println!("no user with id {id}; nothing deleted");
            }
        }
    }

    Ok(())
}

fn report(outcome: SubmitOutcome) -> Result<(), String> {
    match outcome {
        SubmitOutcome::Added(id) => println!("added {id}"),
        SubmitOutcome::Updated(id) => println!("updated {id}"),
        SubmitOutcome::Rejected(errors) => {
            let lines: Vec<String> = errors
                .iter()
                .map(|(field, message)| format!("  {}: {message}", field.as_str()))
                .collect();
            return Err(format!("invalid input\n{}", lines.join("\n")));
        }
    }
    Ok(())
}

fn print_table(records: &[&UserRecord]) {
    println!(
        "{:<38} {:<20} {:<30} {:>4}  STATUS",
        "ID", "NAME", "EMAIL", "AGE"
    );
    for record in records {
        println!(
            "{:<38} {:<20} {:<30} {:>4}  {}",
            record.id,
            record.name,
            record.email,
            record.age,
            if record.is_active { "Active" } else { "Inactive" }
        );
    }
}

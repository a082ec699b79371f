//! `menu-cli`: terminal client for the restaurant menu API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Shares the session model, route guards and wire types with the browser
//! client through the `restomenu` crate. The session lives in a JSON file
//! instead of `localStorage`, and guards are enforced locally before any
//! request is sent, the way the browser routes refuse to mount a page.

mod api;
mod storage;


use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use restomenu::config::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use restomenu::guard::landing_route;
use restomenu::menu::sections;
use restomenu::policy::{is_authenticated, raw_role, username};
use restomenu::wire::Credentials;
use restomenu::{Access, ApiConfig, ApiError, Availability, Course, Dish, DishDraft, Guard, Role, Session, SessionStore, StorageError};

use crate::api::MenuClient;
use crate::storage::FileStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("login required: {0}")]
    LoginRequired(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown course `{0}`; expected starters, main_courses or desserts")]
    UnknownCourse(String),
    #[error("unknown role `{0}`; expected customer or manager")]
    UnknownRole(String),
    #[error("no dish with id {0}")]
    DishNotFound(i64),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("no config directory; pass --session-file or set MENU_SESSION_FILE")]
    NoSessionFile,
}

#[derive(Parser, Debug)]
#[command(name = "menu-cli", about = "Restaurant menu API CLI")]
struct Cli {
    #[arg(long, env = "MENU_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    base_url: String,

    #[arg(long, env = "MENU_API_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, env = "MENU_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log requests to stderr.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the menu grouped by course.
    Menu {
        /// Only one course: starters, main_courses or desserts.
        #[arg(long)]
        course: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "customer", value_parser = parse_role)]
        role: Role,
    },
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "customer", value_parser = parse_role)]
        role: Role,
    },
    Logout,
    /// Show the stored session.
    Whoami {
        /// Also ask the server who the token belongs to.
        #[arg(long, default_value_t = false)]
        remote: bool,
    },
    Dish(DishCommand),
}

#[derive(Args, Debug)]
struct DishCommand {
    #[command(subcommand)]
    command: DishSubcommand,
}

#[derive(Subcommand, Debug)]
enum DishSubcommand {
    Add(DishFields),
    Update {
        id: i64,
        #[command(flatten)]
        fields: DishFields,
    },
    Delete {
        id: i64,
    },
}

/// Dish attributes as flags; `None` means "not given".
#[derive(Args, Debug, Default, Clone)]
struct DishFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    variant: Option<String>,
    /// Course label, e.g. `Entrée`, `Plat`, `Dessert`.
    #[arg(long)]
    course: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    calories: Option<i64>,
    #[arg(long)]
    country_origin: Option<String>,
    /// Availability label, e.g. `Disponible`, `Épuisé`.
    #[arg(long)]
    availability: Option<String>,
}

impl DishFields {
    /// Apply the given flags on top of `base`.
    fn overlay(self, mut base: DishDraft) -> DishDraft {
        if let Some(name) = self.name {
            base.name = name;
        }
        if let Some(variant) = self.variant {
            base.variant = Some(variant);
        }
        if let Some(course) = self.course {
            base.course = Course::from(course);
        }
        if let Some(price) = self.price {
            base.price = Some(price);
        }
        if let Some(description) = self.description {
            base.description = Some(description);
        }
        if let Some(calories) = self.calories {
            base.calories = Some(calories);
        }
        if let Some(country_origin) = self.country_origin {
            base.country_origin = Some(country_origin);
        }
        if let Some(availability) = self.availability {
            base.availability = Availability::from(availability);
        }
        base
    }

    /// New dish: name required, course `Entrée` and availability `Disponible`
    /// unless given.
    fn into_new_draft(self) -> Result<DishDraft, CliError> {
        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(CliError::MissingField("name"));
        }
        Ok(self.overlay(DishDraft::default()))
    }
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| CliError::UnknownRole(raw.to_owned()).to_string())
}

/// Refuse locally when `guard` would redirect the browser to `/login`.
fn require(guard: Guard, session: &Session) -> Result<(), CliError> {
    match guard.evaluate(session) {
        Access::Allow => Ok(()),
        Access::Redirect { .. } => Err(CliError::LoginRequired(match guard {
            Guard::Private => "run `menu-cli login` first",
            Guard::Manager => "dish commands need a manager session",
        })),
    }
}

/// Token of a session that already passed [`require`].
fn token(session: &Session) -> Result<&str, CliError> {
    session.token.as_deref().ok_or(CliError::Api(ApiError::MissingToken))
}

fn find_dish(dishes: Vec<Dish>, id: i64) -> Result<Dish, CliError> {
    dishes.into_iter().find(|d| d.id == id).ok_or(CliError::DishNotFound(id))
}

fn format_dish(dish: &Dish) -> String {
    let mut line = format!("#{} {}", dish.id, dish.name);
    if let Some(variant) = dish.variant.as_deref().filter(|v| !v.is_empty()) {
        line.push_str(&format!(" ({variant})"));
    }
    if let Some(price) = dish.price {
        line.push_str(&format!(" - {price:.2} €"));
    }
    if let Some(availability) = &dish.availability {
        line.push_str(&format!(" [{availability}]"));
    }
    line
}

fn print_menu(dishes: &[Dish]) {
    for section in sections(dishes) {
        println!("{}", section.course.section_title());
        if section.dishes.is_empty() {
            println!("  -");
        }
        for dish in &section.dishes {
            println!("  {}", format_dish(dish));
        }
    }
}

fn print_message(message: Option<String>, fallback: &str) {
    println!("{}", message.unwrap_or_else(|| fallback.to_owned()));
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN })
        .init();

    let config = ApiConfig::new(&cli.base_url).with_timeout_secs(cli.timeout_secs);
    let client = MenuClient::new(config)?;
    let session_file = cli.session_file.or_else(storage::default_path).ok_or(CliError::NoSessionFile)?;
    let store = SessionStore::new(FileStorage::new(session_file));

    run(cli.command, &client, &store).await
}

async fn run(command: Command, client: &MenuClient, store: &SessionStore<FileStorage>) -> Result<(), CliError> {
    match command {
        Command::Menu { course, json } => {
            let dishes = match course {
                Some(key) => {
                    let course = Course::from_collection_key(&key).ok_or(CliError::UnknownCourse(key))?;
                    client.fetch_course(&course).await?
                }
                None => client.fetch_menu().await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&dishes)?);
            } else {
                print_menu(&dishes);
            }
            Ok(())
        }
        Command::Register { username, password, role } => {
            let message = client.register(&Credentials { username, password, role }).await?;
            print_message(message, "registered; log in to continue");
            Ok(())
        }
        Command::Login { username, password, role } => {
            let resp = client.login(&Credentials { username, password, role }).await?;
            store.set(&resp.access_token, &resp.user.role, &resp.user.username)?;
            tracing::info!(
                username = %resp.user.username,
                role = %resp.user.role,
                file = %store.storage().path().display(),
                "session stored"
            );
            let landing = landing_route(Role::parse(&resp.user.role));
            println!("logged in as {} ({}); landing page {}", resp.user.username, resp.user.role, landing.path());
            Ok(())
        }
        Command::Logout => {
            store.clear()?;
            tracing::info!(file = %store.storage().path().display(), "session cleared");
            println!("logged out");
            Ok(())
        }
        Command::Whoami { remote } => {
            let session = store.read();
            require(Guard::Private, &session)?;
            println!("username: {}", username(&session).unwrap_or("-"));
            println!("role: {}", raw_role(&session).unwrap_or("-"));
            println!("authenticated: {}", is_authenticated(&session));
            if remote {
                let resp = client.protected(token(&session)?).await?;
                print_message(resp.message, "token accepted");
            }
            Ok(())
        }
        Command::Dish(dish) => run_dish(dish, client, store).await,
    }
}

async fn run_dish(dish: DishCommand, client: &MenuClient, store: &SessionStore<FileStorage>) -> Result<(), CliError> {
    let session = store.read();
    require(Guard::Manager, &session)?;
    let token = token(&session)?;

    match dish.command {
        DishSubcommand::Add(fields) => {
            let draft = fields.into_new_draft()?;
            let message = client.add_dish(token, &draft).await?;
            print_message(message, "dish added");
        }
        DishSubcommand::Update { id, fields } => {
            let current = find_dish(client.fetch_partitioned_menu().await?, id)?;
            let draft = fields.overlay(DishDraft::from(&current));
            let message = client.update_dish(token, id, &draft).await?;
            print_message(message, "dish updated");
        }
        DishSubcommand::Delete { id } => {
            let message = client.delete_dish(token, id).await?;
            print_message(message, "dish deleted");
        }
    }
    Ok(())
}

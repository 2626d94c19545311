//! Roster - command line front end for the user directory.

use clap::{Parser, Subcommand, ValueEnum};
use roster_client::{
    AppError, Config, HttpGateway, MutationCoordinator, PrefsFile, Result, Session, UserCache,
};
use roster_engine::{view, ListQuery, MutationKind, SortOrder, User, UserId, UserPayload};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "roster", version, about = "Browse and edit the user directory")]
struct Cli {
    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List users, one page at a time
    List {
        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
        /// Only users of this company
        #[arg(long)]
        company: Option<String>,
        /// Sort by email
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// List company names
    Companies,
    /// Show one user and make it the current user
    Show { id: UserId },
    /// Add a user
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        company: String,
    },
    /// Edit a user; fields left out keep their current value
    Edit {
        id: UserId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
    },
    /// Delete a user
    Delete { id: UserId },
    /// Show the activity log
    Log,
    /// Toggle dark mode
    Theme,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => SortOrder::Asc,
            SortArg::Desc => SortOrder::Desc,
        }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster=info,roster_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let cli = Cli::parse();

    tracing::debug!(api_url = %config.api_url, seed_max_id = ?config.seed_max_id, "configuration loaded");

    if let Err(e) = run(cli, config).await {
        if let AppError::Mutation(failure) = &e {
            eprintln!("{}", failure_message(failure.op));
        }
        return Err(e.into());
    }
    Ok(())
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let gateway = HttpGateway::new(&config.api_url)?;
    let coordinator = MutationCoordinator::new(gateway, UserCache::new(), config.id_policy());
    let mut session = Session::open(coordinator, PrefsFile::new(&config.prefs_path))?;

    match cli.command {
        Commands::List {
            search,
            company,
            sort,
            page,
        } => {
            session.refresh().await?;
            let users = session.users();

            let mut query = ListQuery::new().page(page);
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(company) = company {
                query = query.company(company);
            }
            if let Some(sort) = sort {
                query = query.sort_by_email(sort.into());
            }

            let page = query.apply(&users);
            if cli.json {
                print_json(&page.items)?;
            } else {
                for user in &page.items {
                    print_row(user);
                }
                match page.range() {
                    Some((start, end)) => println!(
                        "\nShowing {start}-{end} of {} (page {}/{})",
                        page.total_items, page.page, page.total_pages
                    ),
                    None => println!("No users found"),
                }
            }
        }

        Commands::Companies => {
            session.refresh().await?;
            for company in view::companies(&session.users()) {
                println!("{company}");
            }
        }

        Commands::Show { id } => {
            session.refresh().await?;
            let user = session.show(id).await?;
            if cli.json {
                print_json(&user)?;
            } else {
                print_detail(&user);
            }
        }

        Commands::Add {
            name,
            email,
            phone,
            company,
        } => {
            session.refresh().await?;
            let user = session
                .add(UserPayload::new(name, email, phone, company))
                .await?;
            if cli.json {
                print_json(&user)?;
            } else {
                print_row(&user);
            }
        }

        Commands::Edit {
            id,
            name,
            email,
            phone,
            company,
        } => {
            session.refresh().await?;
            let current = session
                .coordinator()
                .cache()
                .find(id)
                .ok_or(AppError::NotFound(id))?;
            let defaults = UserPayload::from(&current);
            let payload = UserPayload::new(
                name.unwrap_or(defaults.name),
                email.unwrap_or(defaults.email),
                phone.unwrap_or(defaults.phone),
                company.unwrap_or(defaults.company),
            );

            let user = session.edit(id, payload).await?;
            if cli.json {
                print_json(&user)?;
            } else {
                print_row(&user);
            }
        }

        Commands::Delete { id } => {
            session.refresh().await?;
            session.remove(id).await?;
            println!("Deleted user {id}");
        }

        Commands::Log => {
            if cli.json {
                print_json(session.activity())?;
            } else if session.activity().is_empty() {
                println!("No activity yet");
            } else {
                for entry in session.activity() {
                    println!(
                        "{}  {:<6}  {}",
                        format_timestamp(entry.timestamp),
                        entry.kind.to_string(),
                        entry.message
                    );
                }
            }
        }

        Commands::Theme => {
            let dark = session.toggle_theme()?;
            println!("Dark mode {}", if dark { "on" } else { "off" });
        }
    }

    Ok(())
}

fn failure_message(op: MutationKind) -> &'static str {
    match op {
        MutationKind::Create => "Failed to add user. Please try again.",
        MutationKind::Update => "Failed to update user. Please try again.",
        MutationKind::Delete => "Failed to delete user. Please try again.",
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    println!("{json}");
    Ok(())
}

fn print_row(user: &User) {
    println!(
        "{:>5}  {:<3} {:<26} {:<30} {}",
        user.id,
        user.initials(),
        user.name,
        user.email,
        user.company.name
    );
}

fn print_detail(user: &User) {
    println!("{} ({})", user.name, user.username);
    println!("  Email:    {}", user.email);
    println!("  Phone:    {}", user.phone);
    println!("  Website:  {}", user.website);
    println!("  Company:  {}", user.company.name);
    if !user.company.catch_phrase.is_empty() {
        println!("            {}", user.company.catch_phrase);
    }
    if !user.address.is_empty() {
        println!(
            "  Address:  {}, {}, {} {}",
            user.address.street, user.address.suite, user.address.city, user.address.zipcode
        );
    }
}

fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

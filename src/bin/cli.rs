use anyhow::Context;
use clap::{Parser, Subcommand};
use crystaltides::cli::{format_role_table, seed_donations, set_role};
use crystaltides_core::roles::{self, known_roles};
use crystaltides_db::{Database, init_pg_pool};
use dialoguer::{Confirm, Select};
use dotenvy::dotenv;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "crystaltides-cli")]
#[command(
    about = "CrystalTides CLI - Administrative tools for the CrystalTides API",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the role registry
    Roles,
    /// Print the priority of a role (unknown roles resolve to 0)
    Priority {
        role: String,
    },
    /// Write a user's role directly, bypassing the hierarchy check
    SetRole {
        /// Profile id of the user
        user_id: Uuid,

        /// New role (prompted from the registry if omitted)
        role: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Insert fake donations for local development
    SeedDonations {
        /// Number of donations to create
        #[arg(short = 'n', long = "fake", default_value = "25")]
        count: usize,
    },
}

async fn connect() -> anyhow::Result<Database> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_pg_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    Ok(Database::postgres(pool))
}

fn prompt_role() -> anyhow::Result<String> {
    let names: Vec<&str> = known_roles().iter().map(|info| info.name).collect();
    let index = Select::new()
        .with_prompt("Role")
        .items(&names)
        .default(names.len() - 1)
        .interact()?;
    Ok(names[index].to_string())
}

async fn handle_set_role(user_id: Uuid, role: Option<String>, yes: bool) -> anyhow::Result<()> {
    let role = match role {
        Some(role) => role,
        None => prompt_role()?,
    };

    if roles::lookup(&role).is_none() {
        println!("⚠️  '{role}' is not a registered role and will have priority 0");
    }

    if !yes
        && !Confirm::new()
            .with_prompt(format!("Set role of {user_id} to '{role}'?"))
            .default(false)
            .interact()?
    {
        println!("Aborted");
        return Ok(());
    }

    let db = connect().await?;
    let profile = set_role(&db, user_id, &role).await?;
    println!("\n✅ Role updated");
    println!("   User: {}", profile.username.as_deref().unwrap_or("-"));
    println!("   Role: {}", profile.role.as_deref().unwrap_or("-"));
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Roles => {
            for line in format_role_table(known_roles()) {
                println!("{line}");
            }
        }
        Commands::Priority { role } => {
            println!("{}", roles::role_priority(Some(&role)));
        }
        Commands::SetRole { user_id, role, yes } => handle_set_role(user_id, role, yes).await?,
        Commands::SeedDonations { count } => {
            let db = connect().await?;
            seed_donations(&db, count).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n❌ {e:#}");
        std::process::exit(1);
    }
}

//! CLI command implementations

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deskgate_core::{AuthError, Desk, DeskConfig, NewUser, Role};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::shell::DeskShell;

/// Deskgate - login gate for the deposit desk
#[derive(Parser)]
#[command(name = "deskgate")]
#[command(about = "Role-gated login desk with lockout tracking")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to desk storage (overrides the config file)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive desk
    Desk,

    /// Show Nikitovsky block state and registry size
    Status,

    /// List registered users
    Users {
        /// Only users with this role
        #[arg(long)]
        role: Option<Role>,
    },

    /// Register a new user
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        role: Role,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Name recorded as the creator
        #[arg(long, default_value = "system")]
        by: String,
    },

    /// Block the Nikitovsky login for two hours
    Block,

    /// Lift the Nikitovsky block with the recovery secret
    Unblock {
        #[arg(long)]
        secret: String,
    },

    /// Check a Nikitovsky secret against the block and secret table
    LoginNikitovsky {
        #[arg(long)]
        secret: String,
    },
}

impl Cli {
    /// Resolve the effective configuration
    pub fn desk_config(&self) -> Result<DeskConfig> {
        let mut config = match &self.config {
            Some(path) => DeskConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DeskConfig::default(),
        };
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        Ok(config)
    }
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.desk_config()?;
    let desk = Desk::open(&config)
        .with_context(|| format!("Failed to open desk storage {}", config.data_dir.display()))?;
    info!("Desk storage at {:?}", config.data_dir);

    match cli.command {
        Commands::Desk => {
            let stdin = io::stdin();
            let mut shell = DeskShell::new(desk, stdin.lock(), io::stdout());
            shell.run()?;
        }

        Commands::Status => {
            let users = desk.registry().users()?;
            println!("\n=== Desk Status ===\n");
            println!("Data dir: {}", config.data_dir.display());
            println!("Registered users: {}", users.len());
            match desk.nikitovsky_block().blocked_until()? {
                Some(until) => println!(
                    "Nikitovsky: blocked until {}",
                    until.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("Nikitovsky: unblocked"),
            }
        }

        Commands::Users { role } => {
            let registry = desk.registry();
            let users = match role {
                Some(role) => registry.users_by_role(role)?,
                None => registry.users()?,
            };

            if users.is_empty() {
                println!("No users registered.");
                return Ok(());
            }

            println!("\n=== Registered Users ===\n");
            for user in users {
                println!(
                    "{} | {} | {} | {} | {} | {}",
                    user.id,
                    user.name,
                    user.role.display_name(),
                    user.phone.as_deref().unwrap_or("-"),
                    user.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    user.created_by
                );
            }
        }

        Commands::Register {
            name,
            role,
            phone,
            email,
            by,
        } => {
            let new_user = NewUser {
                name,
                role: Some(role),
                phone,
                email,
            };
            match desk.registry().register(new_user, &by) {
                Ok(user) => {
                    println!("✓ {} registered as {}", user.name, user.role.display_name());
                }
                Err(e @ (AuthError::DuplicateName(_) | AuthError::MissingField(_))) => {
                    warn!("Registration refused: {}", e);
                    println!("✗ {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Block => {
            let until = desk.nikitovsky_block().block()?;
            println!(
                "✓ Nikitovsky login blocked until {}",
                until.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }

        Commands::Unblock { secret } => {
            let secret = Zeroizing::new(secret);
            match desk.nikitovsky_block().unblock(&secret) {
                Ok(()) => println!("✓ Nikitovsky block lifted"),
                Err(AuthError::WrongSecret { .. }) => println!("✗ Wrong recovery secret"),
                Err(e) => return Err(e.into()),
            }
        }

        Commands::LoginNikitovsky { secret } => {
            let secret = Zeroizing::new(secret);
            let mut gate = desk.login_screen();
            match gate.attempt_nikitovsky_login(&secret) {
                Ok(identity) => println!("✓ Admitted as {}", identity.name),
                Err(e @ AuthError::Store(_)) => return Err(e.into()),
                Err(e) => println!("✗ {}", e),
            }
        }
    }

    Ok(())
}

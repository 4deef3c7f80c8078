//! User management command.

use super::open_client;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use fabsdk_client::{SdkConfig, User};
use fabsdk_core::Keypair;
use std::fs;
use std::path::PathBuf;

#[derive(Args)]
pub struct UserArgs {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Generate a signing key and store a new user
    New {
        /// User name
        #[arg(short, long)]
        name: String,

        /// Enrollment certificate file (defaults to the user name)
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Import an existing private key (hex) instead of generating one
        #[arg(long)]
        private_key: Option<String>,
    },
    /// Show a stored user
    Show {
        /// User name
        #[arg(short, long)]
        name: String,
    },
}

pub fn run(args: UserArgs, config: SdkConfig) -> Result<()> {
    match args.command {
        UserCommand::New {
            name,
            cert,
            private_key,
        } => new_user(config, name, cert, private_key),
        UserCommand::Show { name } => show_user(config, name),
    }
}

fn new_user(
    config: SdkConfig,
    name: String,
    cert: Option<PathBuf>,
    private_key: Option<String>,
) -> Result<()> {
    let certificate = match cert {
        Some(path) => fs::read(&path)
            .with_context(|| format!("Failed to read certificate {}", path.display()))?,
        None => name.as_bytes().to_vec(),
    };
    let keypair = match private_key {
        Some(hex_key) => Keypair::from_hex(&hex_key).context("Invalid private key")?,
        None => Keypair::generate(),
    };

    let client = open_client(config)?;
    let user = client.set_user_context(User::new(&name, certificate, keypair), false)?;

    println!("{}", "Stored new user:".bold().cyan());
    println!();
    print_user(&user, &client.config().msp.id);
    println!();
    println!(
        "{}  Saved to: {}",
        "✓".green().bold(),
        client.config().keystore.path.display().to_string().bright_black()
    );

    Ok(())
}

fn show_user(config: SdkConfig, name: String) -> Result<()> {
    let client = open_client(config)?;
    let user = client
        .user_context(&name)
        .with_context(|| format!("User '{}' not found", name))?;

    println!();
    print_user(&user, &client.config().msp.id);
    println!();

    Ok(())
}

fn print_user(user: &User, msp_id: &str) {
    println!("  Name:        {}", user.name().bright_yellow());
    println!("  MSP:         {}", msp_id);
    println!(
        "  Public Key:  {}",
        hex::encode(user.keypair().public_key.as_bytes()).bright_black()
    );
    println!(
        "  Certificate: {} bytes",
        user.enrollment_certificate().len().to_string().bright_black()
    );
}

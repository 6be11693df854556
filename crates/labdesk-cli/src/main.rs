mod cli;
mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use cli::{
    Cli, Commands, ConfigCommands, OrderCommands, OutputFormat, PatientCommands, TestCommands,
};
use client::LabDeskClient;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// `--format` wins, then the profile's stored format, then JSON.
fn resolve_format(cli_format: Option<OutputFormat>, profile: &str) -> Result<OutputFormat> {
    if let Some(format) = cli_format {
        return Ok(format);
    }
    Ok(match config::load_profile(profile)?.format.as_deref() {
        Some("table") => OutputFormat::Table,
        _ => OutputFormat::Json,
    })
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = &cli.profile;

    if let Commands::Config(args) = &cli.command {
        match &args.command {
            ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("json")
                );
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                config::set_value(&mut cfg, &set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        }
        return Ok(());
    }

    let server = config::resolve_server(&cli.server, profile)?;
    let client = LabDeskClient::new(&server);
    let table = resolve_format(cli.format, profile)? == OutputFormat::Table;

    match &cli.command {
        Commands::Status => commands::server::status(&client, &server).await?,
        Commands::Patients(cmd) => match cmd {
            PatientCommands::List(args) => commands::patients::list(&client, args, table).await?,
            PatientCommands::Show { id } => commands::patients::show(&client, id, table).await?,
            PatientCommands::Create(args) => {
                commands::patients::create(&client, args, table).await?
            }
            PatientCommands::Update(args) => {
                commands::patients::update(&client, args, table).await?
            }
        },
        Commands::Tests(cmd) => match cmd {
            TestCommands::List { active_only } => {
                commands::lab_tests::list(&client, *active_only, table).await?
            }
            TestCommands::Create(args) => commands::lab_tests::create(&client, args, table).await?,
            TestCommands::Update(args) => commands::lab_tests::update(&client, args, table).await?,
            TestCommands::Activate { id } => {
                commands::lab_tests::set_active(&client, id, true, table).await?
            }
            TestCommands::Deactivate { id } => {
                commands::lab_tests::set_active(&client, id, false, table).await?
            }
        },
        Commands::Orders(cmd) => match cmd {
            OrderCommands::List(args) => commands::orders::list(&client, args, table).await?,
            OrderCommands::Show { id } => commands::orders::show(&client, id, table).await?,
            OrderCommands::Create(args) => commands::orders::create(&client, args, table).await?,
            OrderCommands::Status { id, status } => {
                commands::orders::set_status(&client, id, *status, table).await?
            }
        },
        Commands::Config(_) => {}
    }

    Ok(())
}

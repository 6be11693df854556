use anyhow::Result;
use colored::Colorize;

use crate::client::LabDeskClient;

pub async fn status(client: &LabDeskClient, server: &str) -> Result<()> {
    let (code, body) = client.probe("healthz").await?;
    if code != 200 {
        println!(
            "{} {} returned {} {}",
            "✗".red(),
            server.cyan(),
            code.to_string().red(),
            body
        );
        return Ok(());
    }
    println!("{} {} is {}", "✓".green(), server.cyan(), "healthy".green());

    let (code, body) = client.probe("readyz").await?;
    if code == 200 {
        println!("  storage {}", "ready".green());
    } else {
        println!("  storage {} ({code}) {body}", "unavailable".red());
    }
    Ok(())
}

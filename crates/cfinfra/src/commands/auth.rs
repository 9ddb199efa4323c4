use crate::project;
use cfinfra_cloud::CloudProvider;
use colored::Colorize;

pub async fn handle() -> anyhow::Result<()> {
    let provider = project::connect()?;
    println!(
        "Checking credentials against {}...",
        provider.session().api_endpoint().cyan()
    );

    let status = provider.check_auth().await?;
    if status.authenticated {
        println!(
            "{} {}",
            "✓ Authenticated".green().bold(),
            status.account_info.unwrap_or_default()
        );
        Ok(())
    } else {
        anyhow::bail!(
            "authentication failed: {}",
            status.error.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}

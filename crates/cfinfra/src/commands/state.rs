use cfinfra_cloud::StateManager;
use colored::Colorize;
use std::path::Path;

/// List what the state file records; does not touch the Cloud Controller
pub async fn handle(root: &Path) -> anyhow::Result<()> {
    let manager = StateManager::new(root);
    let state = manager.load().await?;

    println!("State: {}", manager.state_path().display().to_string().cyan());
    println!("Serial: {}", state.serial);

    if state.resources.is_empty() {
        println!();
        println!("{}", "No resources recorded.".dimmed());
        return Ok(());
    }

    println!();
    for (key, resource) in &state.resources {
        println!("{} [{}]", key.bold(), resource.status);
        println!("    id: {}", resource.id);
        for (name, value) in &resource.attributes {
            println!("    {}: {}", name, value);
        }
    }
    Ok(())
}

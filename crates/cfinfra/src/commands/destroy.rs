use crate::project::{self, LockedState, Project};
use cfinfra_cloud::CloudProvider;
use colored::Colorize;

pub async fn handle(project: &Project, address: Option<String>, yes: bool) -> anyhow::Result<()> {
    project.print_header();
    let provider = project::connect()?;

    let mut state = LockedState::acquire(project.state_manager()).await?;
    state.provider = provider.refresh(&state.provider).await?;

    let targets: Vec<String> = match &address {
        Some(address) => {
            if !state.provider.contains(address) {
                anyhow::bail!("{} is not in the state", address);
            }
            vec![address.clone()]
        }
        None => state.provider.iter().map(|(a, _)| a.clone()).collect(),
    };

    if targets.is_empty() {
        println!("{}", "Nothing to destroy.".green());
        return state.save().await;
    }

    println!();
    println!("{}", format!("Resources to destroy ({}):", targets.len()).bold());
    for target in &targets {
        println!("  {} {}", "-".red(), target);
    }

    if !yes {
        println!();
        println!("{}", "Warning: this deletes the objects on the Cloud Controller.".yellow());
        println!("Run again with --yes to destroy them");
        return state.save().await;
    }

    println!();
    match address {
        Some(address) => {
            let outcome = provider.destroy(&address, &mut state.provider).await;
            state.save().await?;
            outcome?;
            println!("{} {}", "✓ Destroyed".green().bold(), address);
            Ok(())
        }
        None => {
            let result = provider.destroy_all(&mut state.provider).await?;
            state.save().await?;
            super::report(&result)
        }
    }
}

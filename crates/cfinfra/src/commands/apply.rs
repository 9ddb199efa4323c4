use super::plan::print_plan;
use crate::project::{self, LockedState, Project};
use cfinfra_cloud::CloudProvider;
use colored::Colorize;

pub async fn handle(project: &Project, yes: bool) -> anyhow::Result<()> {
    project.print_header();
    let provider = project::connect()?;

    let mut state = LockedState::acquire(project.state_manager()).await?;

    println!("{}", "Refreshing state...".blue());
    state.provider = provider.refresh(&state.provider).await?;

    let plan = provider.plan(&project.resources, &state.provider).await?;
    print_plan(&plan);

    if !plan.has_changes {
        // Persist what refresh found even when nothing is applied
        return state.save().await;
    }

    if !yes {
        println!();
        println!("Run again with --yes to apply these changes");
        return state.save().await;
    }

    println!();
    println!("{}", "Applying...".blue().bold());
    let result = provider.apply(&plan, &mut state.provider).await?;
    state.save().await?;

    super::report(&result)
}

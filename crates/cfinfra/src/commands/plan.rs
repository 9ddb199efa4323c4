use crate::project::{self, Project};
use cfinfra_cloud::{ActionType, CloudProvider, Plan};
use colored::{ColoredString, Colorize};

pub async fn handle(project: &Project) -> anyhow::Result<()> {
    project.print_header();
    let provider = project::connect()?;

    println!("{}", "Refreshing state...".blue());
    let state = project.state_manager().load().await?;
    let current = provider
        .refresh(&state.provider_state(provider.name()))
        .await?;

    let plan = provider.plan(&project.resources, &current).await?;
    print_plan(&plan);
    Ok(())
}

pub fn print_plan(plan: &Plan) {
    println!();
    if !plan.has_changes {
        println!("{}", "No changes. Infrastructure matches the definitions.".green());
        return;
    }

    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        println!("  {} {}", symbol(action.action_type), action.description);
    }
    println!();
    println!("Plan: {}", plan.summary().to_string().bold());
}

fn symbol(action_type: ActionType) -> ColoredString {
    let symbol = action_type.symbol();
    match action_type {
        ActionType::Create => symbol.green(),
        ActionType::Update => symbol.yellow(),
        ActionType::Replace => symbol.magenta(),
        ActionType::Delete => symbol.red(),
        ActionType::NoOp => symbol.normal(),
    }
}

use crate::project::Project;
use cfinfra_cloud::ProviderState;
use cfinfra_cloudfoundry::resource::RESOURCE_TYPES;
use colored::Colorize;

/// Check the definitions offline: syntax, fields and references
pub fn handle(project: &Project) -> anyhow::Result<()> {
    project.print_header();

    // Planning against empty state resolves every reference without the API
    cfinfra_cloudfoundry::planner::plan(&project.resources, &ProviderState::new())?;

    println!("{}", "✓ Definitions are valid".green().bold());
    println!();
    for resource_type in RESOURCE_TYPES {
        let resources = project.resources.by_type(resource_type);
        if resources.is_empty() {
            continue;
        }
        println!("  {}: {}", resource_type, resources.len());
        for resource in resources {
            println!("    - {}", resource.name.cyan());
        }
    }
    Ok(())
}

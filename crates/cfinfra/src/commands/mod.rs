pub mod apply;
pub mod auth;
pub mod destroy;
pub mod plan;
pub mod state;
pub mod validate;

use cfinfra_cloud::ApplyResult;
use colored::Colorize;

/// Print per-action outcomes and fail if any action failed
pub fn report(result: &ApplyResult) -> anyhow::Result<()> {
    for ok in &result.succeeded {
        println!("  {} {}", "✓".green(), ok.message);
    }
    for failed in &result.failed {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failed.action_id,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!();
    if result.is_success() {
        println!(
            "{} ({} actions, {} ms)",
            "✓ Done".green().bold(),
            result.succeeded.len(),
            result.duration_ms
        );
        Ok(())
    } else {
        anyhow::bail!(
            "{} of {} actions failed",
            result.failed.len(),
            result.failed.len() + result.succeeded.len()
        )
    }
}

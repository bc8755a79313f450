use clap::Subcommand;
use serde_json::json;

use crate::cli::config::ClientContext;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::navigation::{NavigationOutcome, Navigate};

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "Navigate to a route, applying the login guard")]
    Open {
        #[arg(help = "Route path, e.g. /app/class")]
        path: String,
        #[arg(long, help = "Route to navigate from (defaults to the last opened route)")]
        from: Option<String>,
    },

    #[command(about = "Show the current route")]
    Current,

    #[command(about = "Show recently opened routes")]
    Recents,
}

pub async fn handle(
    cmd: RouteCommands,
    ctx: &mut ClientContext,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        RouteCommands::Open { path, from } => {
            let router = &ctx.router;
            if let Some(from) = from {
                router.place(&from);
            }

            let outcome = router.navigate(&path);
            let location = router.current_location();
            ctx.environment.record_route(&location);
            ctx.save_environment()?;

            let details = match &outcome {
                NavigationOutcome::Unchanged => json!({ "outcome": "unchanged", "location": location }),
                NavigationOutcome::Entered(entered) => json!({ "outcome": "entered", "location": entered }),
                NavigationOutcome::Redirected { requested, location } => json!({
                    "outcome": "redirected",
                    "requested": requested,
                    "location": location,
                }),
            };
            output_details(output_format, &details)
        }
        RouteCommands::Current => {
            let route = ctx.router.current();
            output_details(
                output_format,
                &json!({
                    "location": route.full_path,
                    "name": route.name,
                    "requires_auth": route.requires_auth(),
                }),
            )
        }
        RouteCommands::Recents => {
            if ctx.environment.recents.is_empty() {
                return output_empty_collection(output_format, "recents", "No routes opened yet");
            }
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "recents": ctx.environment.recents }))?);
                }
                OutputFormat::Text => {
                    for route in &ctx.environment.recents {
                        println!("{}", route);
                    }
                }
            }
            Ok(())
        }
    }
}

pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use self::config::ClientContext;

#[derive(Parser)]
#[command(name = "course-admin")]
#[command(about = "Course admin client - classes, teachers and sessions from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, registration and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Class management")]
    Class {
        #[command(subcommand)]
        cmd: commands::class::ClassCommands,
    },

    #[command(about = "Teacher directory")]
    Teacher {
        #[command(subcommand)]
        cmd: commands::teacher::TeacherCommands,
    },

    #[command(about = "Route navigation with the login guard")]
    Route {
        #[command(subcommand)]
        cmd: commands::route::RouteCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = config::build_context(&output_format)?;
    run_with(cli.command, ctx, output_format).await
}

/// Run one command against an already built context. Deferred login
/// redirects are settled and persisted before this returns.
pub async fn run_with(
    command: Commands,
    mut ctx: ClientContext,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let result = match command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut ctx, &output_format).await,
        Commands::Class { cmd } => commands::class::handle(cmd, &mut ctx, &output_format).await,
        Commands::Teacher { cmd } => commands::teacher::handle(cmd, &mut ctx, &output_format).await,
        Commands::Route { cmd } => commands::route::handle(cmd, &mut ctx, &output_format).await,
    };

    if let Err(e) = ctx.settle().await {
        tracing::warn!("Failed to persist route after redirect: {}", e);
    }

    // JSON consumers get a machine-readable failure on stdout as well
    if let (Err(e), OutputFormat::Json) = (&result, &output_format) {
        let code = e.downcast_ref::<PipelineError>().map(PipelineError::error_code);
        utils::output_error(&output_format, &e.to_string(), code)?;
    }

    result
}

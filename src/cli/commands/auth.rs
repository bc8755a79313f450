use clap::Subcommand;
use chrono::Utc;
use serde_json::json;

use crate::api::user;
use crate::cli::config::ClientContext;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::types::{LoginForm, RegisterForm};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with student ID")]
    Login {
        #[arg(help = "Student ID")]
        student_id: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Student ID")]
        student_id: String,
        #[arg(help = "Display name")]
        name: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },
}

pub async fn handle(
    cmd: AuthCommands,
    ctx: &mut ClientContext,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { student_id, password } => {
            let password = resolve_password(password, "Password")?;
            let result = user::login(&ctx.pipeline, &LoginForm { student_id, password }).await?;

            ctx.environment.last_login_at = Some(Utc::now());
            ctx.save_environment()?;

            let message = if result.message.is_empty() {
                format!("Logged in as {}", result.user.name)
            } else {
                result.message.clone()
            };
            output_success(output_format, &message, Some(json!({ "user": result.user })))
        }
        AuthCommands::Register { student_id, name, password } => {
            let prompted = password.is_none();
            let password = resolve_password(password, "Password")?;
            if prompted {
                let confirm = resolve_password(None, "Confirm password")?;
                if confirm != password {
                    return Err(anyhow::anyhow!("Passwords do not match"));
                }
            }

            let result = user::register(&ctx.pipeline, &RegisterForm { student_id, name, password }).await?;

            ctx.environment.last_login_at = Some(Utc::now());
            ctx.save_environment()?;

            let message = if result.message.is_empty() {
                format!("Registered and logged in as {}", result.user.name)
            } else {
                result.message.clone()
            };
            output_success(output_format, &message, Some(json!({ "user": result.user })))
        }
        AuthCommands::Logout => {
            user::logout(&ctx.session)?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let session = ctx.session.snapshot();
            output_details(
                output_format,
                &json!({
                    "authenticated": session.is_authenticated(),
                    "user": session.user.as_ref().map(|u| u.student_id.clone()),
                    "last_login_at": ctx.environment.last_login_at.map(|t| t.to_rfc3339()),
                    "api": ctx.pipeline.config().api.base_url,
                }),
            )
        }
        AuthCommands::Whoami => match ctx.session.user() {
            Some(user) if ctx.session.is_authenticated() => {
                output_details(output_format, &serde_json::to_value(&user)?)
            }
            _ => Err(anyhow::anyhow!("Not logged in")),
        },
    }
}

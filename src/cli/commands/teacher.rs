use clap::Subcommand;
use serde_json::json;

use crate::api::teacher;
use crate::cli::config::ClientContext;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TeacherCommands {
    #[command(about = "List teachers")]
    List,
}

pub async fn handle(
    cmd: TeacherCommands,
    ctx: &mut ClientContext,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        TeacherCommands::List => {
            let teachers = teacher::get_teacher_list(&ctx.pipeline).await?;

            if teachers.is_empty() {
                return output_empty_collection(output_format, "teachers", "No teachers found");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "teachers": teachers }))?);
                }
                OutputFormat::Text => {
                    println!("{:<8} {:<20} {:<20} {}", "ID", "NAME", "TITLE", "EMAIL");
                    println!("{}", "-".repeat(70));
                    for t in &teachers {
                        println!("{:<8} {:<20} {:<20} {}", t.id, t.name, t.title, t.email);
                    }
                }
            }
            Ok(())
        }
    }
}

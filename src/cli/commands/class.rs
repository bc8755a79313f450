use clap::Subcommand;
use serde_json::json;

use crate::api::class::{self, ClassAddRequest, ClassEditRequest};
use crate::cli::config::ClientContext;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ClassCommands {
    #[command(about = "List classes")]
    List {
        #[arg(long, default_value_t = 1, help = "Page number")]
        page: u32,
        #[arg(long, default_value_t = 10, help = "Page size")]
        page_size: u32,
    },

    #[command(about = "Create class")]
    Add {
        #[arg(help = "Class name")]
        name: String,
    },

    #[command(about = "Rename class")]
    Edit {
        #[arg(help = "Class ID")]
        id: i64,
        #[arg(help = "New class name")]
        name: String,
    },

    #[command(about = "Delete class")]
    Delete {
        #[arg(help = "Class ID")]
        id: i64,
    },
}

pub async fn handle(
    cmd: ClassCommands,
    ctx: &mut ClientContext,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ClassCommands::List { page, page_size } => {
            let page_data = class::get_class_list(&ctx.pipeline, page, page_size).await?;

            if page_data.list.is_empty() {
                return output_empty_collection(output_format, "classes", "No classes found");
            }

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "total": page_data.total,
                            "classes": page_data.list,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("{:<8} {:<30} {:<25} {}", "ID", "NAME", "CREATED", "UPDATED");
                    println!("{}", "-".repeat(90));
                    for c in &page_data.list {
                        println!("{:<8} {:<30} {:<25} {}", c.id, c.class_name, c.created_at, c.updated_at);
                    }
                    println!("\nPage {} ({} total)", page, page_data.total);
                }
            }
            Ok(())
        }
        ClassCommands::Add { name } => {
            let created = class::add_class(&ctx.pipeline, &ClassAddRequest { class_name: name }).await?;
            output_details(output_format, &serde_json::to_value(&created)?)
        }
        ClassCommands::Edit { id, name } => {
            let updated = class::edit_class(&ctx.pipeline, id, &ClassEditRequest { class_name: name }).await?;
            output_details(output_format, &serde_json::to_value(&updated)?)
        }
        ClassCommands::Delete { id } => {
            class::delete_class(&ctx.pipeline, id).await?;
            // The server's message was already shown as a notice
            match output_format {
                OutputFormat::Json => output_success(output_format, "Class deleted", Some(json!({ "id": id }))),
                OutputFormat::Text => Ok(()),
            }
        }
    }
}

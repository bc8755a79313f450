mod common;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use common::{StubServer, REDIRECT_DELAY_MS, VALID_TOKEN};
use course_admin_client::cli::config::{
    build_context_in, load_environment_config_in, save_environment_config_in, EnvironmentConfig,
};
use course_admin_client::cli::{run_with, Cli, OutputFormat};
use course_admin_client::config::ClientConfig;
use course_admin_client::error::PipelineError;
use course_admin_client::session::storage::FileStorage;
use course_admin_client::session::SessionStore;
use course_admin_client::types::User;

async fn prepared_dir(token: &str) -> Result<(StubServer, tempfile::TempDir, ClientConfig)> {
    let server = StubServer::spawn().await?;
    let dir = tempfile::tempdir()?;

    SessionStore::restore(Arc::new(FileStorage::new(dir.path()))).set_session(
        User {
            id: 1,
            student_id: "s1".to_string(),
            name: "Alice".to_string(),
        },
        token.to_string(),
    )?;

    let mut environment = EnvironmentConfig::default();
    environment.record_route("/app/class");
    save_environment_config_in(dir.path(), &environment)?;

    let mut config = ClientConfig::for_base_url(server.base_url.clone());
    config.auth.redirect_delay_ms = REDIRECT_DELAY_MS;
    Ok((server, dir, config))
}

#[tokio::test]
async fn unauthorized_command_persists_login_route() -> Result<()> {
    let (_server, dir, config) = prepared_dir("stale").await?;
    let ctx = build_context_in(config, dir.path(), &OutputFormat::Text)?;
    let cli = Cli::parse_from(["course-admin", "teacher", "list"]);

    let err = run_with(cli.command, ctx, OutputFormat::Text).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::AuthenticationFailed(_))
    ));
    let environment = load_environment_config_in(dir.path())?;
    assert_eq!(environment.current_route.as_deref(), Some("/login"));
    assert_eq!(environment.recents.first().map(String::as_str), Some("/login"));

    let restored = SessionStore::restore(Arc::new(FileStorage::new(dir.path())));
    assert!(!restored.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn successful_command_leaves_route_alone() -> Result<()> {
    let (_server, dir, config) = prepared_dir(VALID_TOKEN).await?;
    let ctx = build_context_in(config, dir.path(), &OutputFormat::Json)?;
    let cli = Cli::parse_from(["course-admin", "--json", "teacher", "list"]);

    run_with(cli.command, ctx, OutputFormat::Json).await?;

    let environment = load_environment_config_in(dir.path())?;
    assert_eq!(environment.current_route.as_deref(), Some("/app/class"));
    Ok(())
}

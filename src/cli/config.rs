use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;
use crate::config::ClientConfig;
use crate::navigation::{GuardPolicy, Navigate, RouteTable, Router};
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::pipeline::RequestPipeline;
use crate::session::storage::FileStorage;
use crate::session::SessionStore;

/// Client state kept between invocations, next to the session file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_route: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub recents: Vec<String>,
}

const MAX_RECENTS: usize = 10;

impl EnvironmentConfig {
    pub fn record_route(&mut self, location: &str) {
        self.current_route = Some(location.to_string());
        self.recents.retain(|r| r != location);
        self.recents.insert(0, location.to_string());
        self.recents.truncate(MAX_RECENTS);
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("COURSE_ADMIN_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("course-admin")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_environment_config_in(config_dir: &Path) -> anyhow::Result<EnvironmentConfig> {
    let env_file = config_dir.join("env.json");

    if !env_file.exists() {
        return Ok(EnvironmentConfig::default());
    }

    let content = fs::read_to_string(env_file)?;
    let config: EnvironmentConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_environment_config_in(config_dir: &Path, config: &EnvironmentConfig) -> anyhow::Result<()> {
    let env_file = config_dir.join("env.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(env_file, content)?;
    Ok(())
}

/// Prints notices on stderr so stdout stays clean for command output
pub struct ConsoleNotifier {
    output_format: OutputFormat,
}

impl ConsoleNotifier {
    pub fn new(output_format: OutputFormat) -> Self {
        Self { output_format }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match self.output_format {
            OutputFormat::Json => match serde_json::to_string(&notice) {
                Ok(line) => eprintln!("{}", line),
                Err(_) => eprintln!("{}", notice.message),
            },
            OutputFormat::Text => match notice.level {
                NoticeLevel::Success => eprintln!("✓ {}", notice.message),
                NoticeLevel::Info => eprintln!("{}", notice.message),
                NoticeLevel::Warning => eprintln!("Warning: {}", notice.message),
                NoticeLevel::Error => eprintln!("Error: {}", notice.message),
            },
        }
    }
}

/// Everything a command needs, wired against the on-disk session
pub struct ClientContext {
    pub pipeline: RequestPipeline,
    pub session: Arc<SessionStore>,
    pub router: Arc<Router>,
    pub environment: EnvironmentConfig,
    config_dir: PathBuf,
}

impl ClientContext {
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Persist `env.json` for this context's config directory
    pub fn save_environment(&self) -> anyhow::Result<()> {
        save_environment_config_in(&self.config_dir, &self.environment)
    }

    /// Let any deferred login redirect run, then persist where the router
    /// ended up. Must run before the process exits.
    pub async fn settle(&mut self) -> anyhow::Result<()> {
        if self.pipeline.settle_redirects().await == 0 {
            return Ok(());
        }
        let location = self.router.current_location();
        tracing::debug!("Persisting route '{}' after redirect", location);
        self.environment.record_route(&location);
        self.save_environment()
    }
}

pub fn build_context(output_format: &OutputFormat) -> anyhow::Result<ClientContext> {
    let config_dir = get_config_dir()?;
    build_context_in(crate::config::config().clone(), &config_dir, output_format)
}

/// Context for an explicit configuration and config directory
pub fn build_context_in(
    config: ClientConfig,
    config_dir: &Path,
    output_format: &OutputFormat,
) -> anyhow::Result<ClientContext> {
    let environment = load_environment_config_in(config_dir).unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable env.json: {}", e);
        EnvironmentConfig::default()
    });

    let session = Arc::new(SessionStore::restore(Arc::new(FileStorage::new(config_dir))));
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(output_format.clone()));

    let router = Router::new(
        RouteTable::admin(),
        session.clone(),
        notifier.clone(),
        GuardPolicy::from_config(&config.auth),
    );
    let router = Arc::new(match &environment.current_route {
        Some(route) => router.start_at(route),
        None => router,
    });

    let pipeline = build_pipeline(config, session.clone(), notifier, router.clone())?;

    Ok(ClientContext {
        pipeline,
        session,
        router,
        environment,
        config_dir: config_dir.to_path_buf(),
    })
}

fn build_pipeline(
    config: ClientConfig,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigate>,
) -> anyhow::Result<RequestPipeline> {
    let pipeline = RequestPipeline::builder(config)
        .session(session)
        .notifier(notifier)
        .navigator(navigator)
        .build()?;
    Ok(pipeline)
}

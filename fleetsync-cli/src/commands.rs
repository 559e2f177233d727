use anyhow::{Context, Result};

use fleetsync_client::{AmpClient, ClientConfig};
use fleetsync_core::{
    load_config, AppConfig, ControlPlane, FriendlyNameResolver, GroupMembers, Resolver, RunSummary,
};

use crate::cli::{BackupCommands, Cli, Commands};
use crate::{backup_commands, instance_commands, sync_commands};

pub async fn run(cli: Cli) -> Result<RunSummary> {
    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(source) = &config.source {
        tracing::debug!("Configuration read from {}", source.display());
    }
    let client = connect(&config).await?;

    match cli.command {
        Commands::Instances => instance_commands::list_instances(&client, cli.json).await,
        Commands::Settings(args) => sync_commands::sync_settings(&client, &config, &args, cli.json).await,
        Commands::Schedules(args) => sync_commands::sync_schedules(&client, &config, &args, cli.json).await,
        Commands::Backups(BackupCommands::List(args)) => {
            backup_commands::run(&client, &args, false, false, cli.json).await
        }
        Commands::Backups(BackupCommands::Cleanup { retention, apply }) => {
            backup_commands::run(&client, &retention, true, apply, cli.json).await
        }
    }
}

async fn connect(config: &AppConfig) -> Result<AmpClient> {
    let client = AmpClient::new(ClientConfig::from(&config.connection))
        .context("Failed to create controller client")?;
    client
        .login()
        .await
        .with_context(|| format!("Login to {} failed", config.connection.url))?;
    Ok(client)
}

/// Resolve the requested group, or the first template's group when none is given.
pub async fn resolve_group(client: &dyn ControlPlane, group: Option<&str>) -> Result<GroupMembers> {
    let instances = client.list_instances().await.context("Failed to list instances")?;
    let resolver = FriendlyNameResolver;
    let group = match group {
        Some(group) => group.to_string(),
        None => resolver.discover_group(&instances).context("No group given and none could be discovered")?,
    };
    resolver
        .resolve(&instances, &group)
        .with_context(|| format!("Group '{group}' could not be resolved"))
}

/// Version injected at compile time via ARMNET_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ARMNET_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{bail, Context, Result};
use armnet::azure::http::format_arm_error;
use armnet::config::Config;
use armnet::resource::{
    extract_json_value, find_by_type, get_all_resource_keys, get_resource, ColumnDef,
};
use armnet::{ArmClient, ArmError, EnvironmentCredential, ResourceClient, ResourceId};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use comfy_table::{ColumnConstraint, ContentArrangement, Table, Width};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Azure network control-plane client
#[derive(Parser, Debug)]
#[command(name = "armnet", version = VERSION, about, long_about = None)]
struct Args {
    /// Subscription ID (overrides config and AZURE_SUBSCRIPTION_ID)
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Resource group (overrides config and AZURE_RESOURCE_GROUP)
    #[arg(short = 'g', long, global = true)]
    resource_group: Option<String>,

    /// Location for created resources (overrides config and AZURE_LOCATION)
    #[arg(short, long, global = true)]
    location: Option<String>,

    /// Management endpoint (overrides config and ARM_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds between status polls
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Seconds to wait for an operation before giving up
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long, global = true)]
    readonly: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported resource types
    Types,
    /// Show a single resource
    Get(Target),
    /// List resources of a type
    List {
        /// Resource type key, see `armnet types`
        resource: String,
        /// Enclosing resource names for child types, outermost first
        #[arg(long = "parent")]
        parents: Vec<String>,
        /// List across the whole subscription
        #[arg(long)]
        all: bool,
    },
    /// Create or update a resource from a JSON body
    Create {
        #[command(flatten)]
        target: Target,
        /// JSON file holding the request body
        #[arg(long)]
        body: PathBuf,
        /// Return once the request is accepted
        #[arg(long)]
        no_wait: bool,
    },
    /// Delete a resource
    Delete {
        #[command(flatten)]
        target: Target,
        /// Return once the request is accepted
        #[arg(long)]
        no_wait: bool,
    },
    /// Replace the tags of a resource
    Tag {
        #[command(flatten)]
        target: Target,
        /// Tags as key=value
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

/// A resource named either by full ID or by type key and name
#[derive(ClapArgs, Debug)]
struct Target {
    /// Resource type key, or a full resource ID starting with '/'
    resource: String,
    /// Resource name (omit when passing a full ID)
    name: Option<String>,
    /// Enclosing resource names for child types, outermost first
    #[arg(long = "parent")]
    parents: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armnet {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armnet").join("armnet.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armnet").join("armnet.log");
    }
    PathBuf::from("armnet.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Dropped on return so the log writer flushes before exit
    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {err:#}");
            if let Some(arm) = err.downcast_ref::<ArmError>() {
                eprintln!("{}", format_arm_error(arm));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::Types = args.command {
        print_types();
        return Ok(());
    }

    let config = load_config(&args);
    let options = config.client_options()?;
    let credential = EnvironmentCredential::new().context("No access token available")?;
    let client = ArmClient::new(options, Arc::new(credential))?;
    let resource_group = config.effective_resource_group();

    tracing::info!(
        "Using subscription: {}, endpoint: {}",
        client.subscription_id(),
        client.endpoint()
    );

    match &args.command {
        Command::Types => Ok(()),
        Command::Get(target) => {
            let (resources, id) = resolve(&client, resource_group.as_deref(), target)?;
            let item = resources
                .get(&id)
                .await
                .with_context(|| format!("Failed to get {}", id))?;
            print_item(args.output, resources.definition().columns(), &item)
        }
        Command::List {
            resource,
            parents,
            all,
        } => {
            let resources = ResourceClient::new(&client, resource)?;
            let items = if *all {
                resources.list_all().await?
            } else {
                let group = require_group(resource_group.as_deref())?;
                let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
                resources.list(group, &parents).await?
            };
            print_list(args.output, resources.definition().columns(), &items)
        }
        Command::Create {
            target,
            body,
            no_wait,
        } => {
            ensure_writable(&args)?;
            let (resources, id) = resolve(&client, resource_group.as_deref(), target)?;
            let content = std::fs::read_to_string(body)
                .with_context(|| format!("Failed to read {}", body.display()))?;
            let body: Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", body.display()))?;

            let operation = resources.begin_create_or_update(&id, &body).await?;
            if *no_wait {
                return print_accepted(args.output, &id, &operation);
            }

            let cancel = cancel_on_ctrl_c();
            let created = operation
                .wait_with_cancel(client.poller_options(), Some(&cancel))
                .await
                .with_context(|| format!("Failed to create {}", id))?
                .unwrap_or(Value::Null);
            print_item(args.output, resources.definition().columns(), &created)
        }
        Command::Delete { target, no_wait } => {
            ensure_writable(&args)?;
            let (resources, id) = resolve(&client, resource_group.as_deref(), target)?;

            let operation = resources.begin_delete(&id).await?;
            if *no_wait {
                return print_accepted(args.output, &id, &operation);
            }

            let cancel = cancel_on_ctrl_c();
            operation
                .wait_with_cancel(client.poller_options(), Some(&cancel))
                .await
                .with_context(|| format!("Failed to delete {}", id))?;
            eprintln!("Deleted {}", id);
            Ok(())
        }
        Command::Tag { target, tags } => {
            ensure_writable(&args)?;
            let (resources, id) = resolve(&client, resource_group.as_deref(), target)?;
            let tags = parse_tags(tags)?;
            let updated = resources
                .update_tags(&id, &tags)
                .await
                .with_context(|| format!("Failed to update tags on {}", id))?;
            print_item(args.output, resources.definition().columns(), &updated)
        }
    }
}

/// Config file with command-line overrides applied
fn load_config(args: &Args) -> Config {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    if let Some(subscription) = &args.subscription {
        config.subscription_id = Some(subscription.clone());
    }
    if let Some(group) = &args.resource_group {
        config.resource_group = Some(group.clone());
    }
    if let Some(location) = &args.location {
        config.location = Some(location.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(interval) = args.poll_interval {
        config.polling.interval_secs = interval;
    }
    if let Some(timeout) = args.timeout {
        config.polling.timeout_secs = timeout;
    }
    config
}

fn ensure_writable(args: &Args) -> Result<()> {
    if args.readonly {
        bail!("Write operations are disabled in read-only mode");
    }
    Ok(())
}

fn require_group(resource_group: Option<&str>) -> Result<&str> {
    resource_group.context("No resource group configured; set AZURE_RESOURCE_GROUP or pass -g")
}

/// Resolve a command target to its client and ID
fn resolve(
    client: &ArmClient,
    resource_group: Option<&str>,
    target: &Target,
) -> Result<(ResourceClient, ResourceId)> {
    if target.resource.starts_with('/') {
        let id = ResourceId::parse(&target.resource)?;
        let (_, def) = find_by_type(&id.resource_type())
            .ok_or_else(|| ArmError::UnknownResourceType(id.resource_type()))?;
        return Ok((ResourceClient::for_definition(client, def), id));
    }

    let resources = ResourceClient::new(client, &target.resource)?;
    let name = target
        .name
        .as_deref()
        .context("A resource name is required unless a full ID is given")?;
    let parents: Vec<&str> = target.parents.iter().map(String::as_str).collect();
    let id = resources.id(require_group(resource_group)?, &parents, name)?;
    Ok((resources, id))
}

/// Parse `key=value` pairs
fn parse_tags(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => bail!("Invalid tag '{}', expected key=value", pair),
        })
        .collect()
}

/// Cancel the local wait on Ctrl-C; the remote operation keeps running
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning wait");
            child.cancel();
        }
    });
    token
}

fn print_types() {
    for key in get_all_resource_keys() {
        if let Some(def) = get_resource(key) {
            println!("{:<40} {}", key, def.resource_type());
        }
    }
}

fn print_accepted(
    format: OutputFormat,
    id: &ResourceId,
    operation: &armnet::Operation,
) -> Result<()> {
    let summary = serde_json::json!({
        "id": id.to_string(),
        "status": operation.status().as_str(),
        "pollingUrl": operation.polling_method().map(|m| m.url()),
    });
    print_item(format, &[], &summary)
}

fn print_item(format: OutputFormat, columns: &[ColumnDef], item: &Value) -> Result<()> {
    match format {
        OutputFormat::Table if !columns.is_empty() => {
            print_table(columns, std::slice::from_ref(item));
            Ok(())
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(item)?);
            Ok(())
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(item)?);
            Ok(())
        }
    }
}

fn print_list(format: OutputFormat, columns: &[ColumnDef], items: &[Value]) -> Result<()> {
    match format {
        OutputFormat::Table => {
            print_table(columns, items);
            Ok(())
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(items)?);
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
            Ok(())
        }
    }
}

fn print_table(columns: &[ColumnDef], items: &[Value]) {
    println!("{}", build_table(columns, items));
}

/// One row per item, one column per registry column
fn build_table(columns: &[ColumnDef], items: &[Value]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(|c| c.header.clone()).collect::<Vec<_>>());

    for item in items {
        let row: Vec<String> = columns
            .iter()
            .map(|c| extract_json_value(item, &c.json_path))
            .collect();
        table.add_row(row);
    }

    for (column, def) in table.column_iter_mut().zip(columns) {
        if let Ok(width) = u16::try_from(def.width) {
            column.set_constraint(ColumnConstraint::UpperBoundary(Width::Fixed(width)));
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(&["env=prod".to_string(), "owner=".to_string()]).unwrap();
        assert_eq!(tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(tags.get("owner").map(String::as_str), Some(""));

        assert!(parse_tags(&["novalue".to_string()]).is_err());
        assert!(parse_tags(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_table_uses_registry_columns() {
        let columns = vec![
            ColumnDef {
                header: "Name".to_string(),
                json_path: "name".to_string(),
                width: 20,
            },
            ColumnDef {
                header: "State".to_string(),
                json_path: "properties.provisioningState".to_string(),
                width: 12,
            },
        ];
        let items = vec![
            serde_json::json!({"name": "vnet-a", "properties": {"provisioningState": "Succeeded"}}),
            serde_json::json!({"name": "vnet-b"}),
        ];

        let table = build_table(&columns, &items);
        assert_eq!(table.row_iter().count(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("State"));
        assert!(rendered.contains("vnet-a"));
        assert!(rendered.contains("Succeeded"));
        // Missing paths render as a dash
        assert!(rendered.contains("-"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "armnet", "-g", "rg", "list", "subnets", "--parent", "vnet-a",
        ])
        .unwrap();
        assert_eq!(args.resource_group.as_deref(), Some("rg"));
        assert!(matches!(args.command, Command::List { ref parents, .. } if parents == &["vnet-a"]));
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::try_parse_from([
            "armnet",
            "--config",
            "/nonexistent/armnet.json",
            "--subscription",
            "00000000-0000-0000-0000-000000000001",
            "--poll-interval",
            "3",
            "types",
        ])
        .unwrap();
        let config = load_config(&args);
        assert_eq!(config.polling.interval_secs, 3);
        assert_eq!(config.polling.timeout_secs, 3600);
        assert_eq!(
            config.subscription_id.as_deref(),
            Some("00000000-0000-0000-0000-000000000001")
        );
    }
}

use std::path::PathBuf;

use clap::Parser;
use futures_util::future::join_all;
use rcpt_dynamo::{
    RcptDynamo, Registry,
    config::{Env, FileConfig, Layered},
    register,
};
use rcpt_dynamo_common::{Connection, Recipient, internal, logging};

/// Check recipient addresses against the configured table, the same way the
/// gate does during an SMTP session
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file to use instead of the default search path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recipients to check, as given to `RCPT TO:`
    #[arg(required = true)]
    recipients: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init();

    let config_path = find_config_file(args.config)?;
    internal!(level = INFO, "Using config {}", config_path.display());
    let config = FileConfig::load(&config_path)?;

    let source = Layered::default().with(Env).with(config.settings);
    let store = config.store.connect().await;

    let mut registry = Registry::default();
    let gate = register(&source, store, &mut registry)?;

    let checks = args
        .recipients
        .iter()
        .enumerate()
        .map(|(session, raw)| check(&gate, session, raw));

    for line in join_all(checks).await {
        println!("{line}");
    }

    Ok(())
}

/// Run one recipient through its own session and transaction
async fn check(gate: &RcptDynamo, session: usize, raw: &str) -> String {
    let recipient = match raw.parse::<Recipient>() {
        Ok(recipient) => recipient,
        Err(err) => return format!("{raw}: {err}"),
    };

    let connection = Connection::new(format!("check-{session}"));
    let transaction = connection.begin_transaction();

    let decision = gate
        .rcpt(&connection, std::slice::from_ref(&recipient))
        .await;

    let results = transaction
        .results
        .all()
        .iter()
        .map(|(plugin, record)| format!("{plugin} {record}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{recipient}: {} [{results}]",
        decision.map_or_else(|| String::from("-"), |decision| decision.to_string())
    )
}

/// Find the configuration file using the following precedence:
/// 1. `--config`
/// 2. `RCPT_DYNAMO_CONFIG` environment variable
/// 3. ./rcpt-dynamo.config.ron (current working directory)
/// 4. /etc/rcpt-dynamo/rcpt-dynamo.config.ron (system-wide config)
fn find_config_file(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("--config points to non-existent file: {}", path.display());
    }

    if let Ok(env_path) = std::env::var("RCPT_DYNAMO_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "RCPT_DYNAMO_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    let default_paths = [
        PathBuf::from("./rcpt-dynamo.config.ron"),
        PathBuf::from("/etc/rcpt-dynamo/rcpt-dynamo.config.ron"),
    ];

    if let Some(path) = default_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let paths_tried = default_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - RCPT_DYNAMO_CONFIG environment variable\n{paths_tried}"
    )
}

//! Wallet Guard - relay runner
//!
//! Reads one provider call per line from stdin as JSON
//! (`{"method": "...", "params": [...]}`), sends risky ones through the
//! interception point -> bridge -> analyzer relay and prints one verdict
//! line per call on stdout. Logs go to stderr.

use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wallet_guard::{
    Action, GuardAnalyzer, GuardConfig, GuardRelay, Verdict, WalletMethod, APP_NAME, APP_VERSION,
};

#[derive(Debug, Deserialize)]
struct CallLine {
    method: String,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct VerdictLine {
    method: String,
    checked: bool,
    action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorLine {
    error: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("🛡️ {} v{} relay runner", APP_NAME, APP_VERSION);

    let config = GuardConfig::from_env();
    let analyzer = GuardAnalyzer::from_config(&config)?;
    let state = analyzer.state().clone();
    let relay = GuardRelay::start(analyzer, config.relay.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Interrupted");
                break;
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let out = match serde_json::from_str::<CallLine>(&line) {
            Ok(call) => {
                let verdict = if WalletMethod::is_risky(&call.method) {
                    Some(relay.interceptor().check(&call.method, call.params).await)
                } else {
                    None
                };
                serde_json::to_string(&verdict_line(call.method, verdict))?
            }
            Err(e) => {
                warn!("⚠️ Skipping unparseable line: {}", e);
                serde_json::to_string(&ErrorLine {
                    error: format!("invalid request line: {}", e),
                })?
            }
        };

        stdout.write_all(out.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    let relay_stats = relay.interceptor().stats();
    let guard_stats = state.stats();
    relay.shutdown().await;

    info!("📊 Final Statistics:");
    info!("   Checks issued:   {}", relay_stats.issued);
    info!("   Resolved:        {}", relay_stats.resolved);
    info!("   Timed out:       {}", relay_stats.timed_out);
    info!("   Warned:          {}", guard_stats.warned);
    info!("   Blocked:         {}", guard_stats.blocked);
    info!("   Failures:        {}", guard_stats.internal_failures);

    Ok(())
}

fn verdict_line(method: String, verdict: Option<Verdict>) -> VerdictLine {
    match verdict {
        Some(v) => VerdictLine {
            method,
            checked: true,
            action: v.action,
            message: v.message,
        },
        None => VerdictLine {
            method,
            checked: false,
            action: Action::Allow,
            message: None,
        },
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Walkaudit CLI entrypoint.
//!
//! `walkaudit serve` runs the MCP server over stdio, or over streamable HTTP at
//! `http://127.0.0.1:<port>/mcp` with `--http-port`.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use clap::{Args, Parser, Subcommand};
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};

use walkaudit::audit::{render_snapshot, AuditPolicy};
use walkaudit::config::ServeConfig;
use walkaudit::mcp::WalkauditMcp;
use walkaudit::model::{AuditTarget, WalkthroughId};
use walkaudit::store::{load_walkthrough_definition, AuditFolder, StoreError, WriteDurability};

#[derive(Debug, Parser)]
#[command(name = "walkaudit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the MCP server (stdio unless --http-port is given)
    Serve(ServeArgs),
    /// Validate walkthrough export files; prints one JSON line per file
    Validate(ValidateArgs),
    /// Rebuild an audit result from a persisted session snapshot
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Persist `<id>_session.json` and `<id>_audit.json` into this directory
    #[arg(long, env = "WALKAUDIT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// fsync persisted files (slower)
    #[arg(long, env = "WALKAUDIT_DURABLE_WRITES")]
    durable_writes: bool,

    /// Count any critical gap as a failed audit
    #[arg(long, env = "WALKAUDIT_FAIL_ON_CRITICAL")]
    fail_on_critical: bool,

    /// Only write the final audit result, not a snapshot after every call
    #[arg(long)]
    no_snapshots: bool,

    /// Start the session from this export file at boot
    #[arg(long, env = "WALKAUDIT_WALKTHROUGH")]
    walkthrough: Option<PathBuf>,

    /// Walkthrough id for --walkthrough (defaults to the file stem)
    #[arg(long, requires = "walkthrough")]
    walkthrough_id: Option<String>,

    /// Library the walkthrough is audited against; echoed in the audit result
    #[arg(long, env = "WALKAUDIT_LIBRARY")]
    library: Option<String>,

    /// Version of --library
    #[arg(long, env = "WALKAUDIT_LIBRARY_VERSION")]
    library_version: Option<String>,

    /// Serve streamable HTTP on 127.0.0.1:<port>/mcp instead of stdio (0 = ephemeral)
    #[arg(long)]
    http_port: Option<u16>,
}

impl ServeArgs {
    fn serve_config(&self) -> ServeConfig {
        let durability = if self.durable_writes {
            WriteDurability::Durable
        } else {
            WriteDurability::BestEffort
        };
        ServeConfig {
            output_dir: self.output_dir.clone(),
            durability,
            policy: AuditPolicy { fail_on_critical: self.fail_on_critical },
            persist_snapshots: !self.no_snapshots,
            target: AuditTarget::new(self.library.clone(), self.library_version.clone()),
        }
    }
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct RenderArgs {
    snapshot: PathBuf,

    #[arg(long)]
    fail_on_critical: bool,

    /// Also write `<id>_audit.json` next to the snapshot
    #[arg(long)]
    write: bool,
}

fn run_serve(args: ServeArgs) -> Result<(), Box<dyn Error>> {
    let mcp = WalkauditMcp::new(&args.serve_config());

    if let Some(path) = &args.walkthrough {
        let walkthrough_id = args.walkthrough_id.as_deref().map(WalkthroughId::new).transpose()?;
        let definition = load_walkthrough_definition(path, walkthrough_id)?;
        mcp.start_definition(definition)?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let served: Result<(), Box<dyn Error>> = match args.http_port {
        None => runtime.block_on(mcp.clone().serve_stdio()).map_err(Into::into),
        Some(port) => runtime.block_on(serve_http(mcp.clone(), port)),
    };

    if let Some(path) = mcp.finalize() {
        tracing::info!(path = %path.display(), "final audit result written");
    }
    served
}

async fn serve_http(mcp: WalkauditMcp, port: u16) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        ..StreamableHttpServerConfig::default()
    };
    let shutdown_token = config.cancellation_token.clone();

    let session_manager = Arc::new(LocalSessionManager::default());
    let mcp_service = StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);
    let router = Router::new().nest_service("/mcp", mcp_service);

    eprintln!("walkaudit: serving MCP at http://{addr}/mcp");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_token.cancel();
        })
        .await?;
    Ok(())
}

/// Returns whether every file was valid.
fn run_validate(args: ValidateArgs) -> bool {
    let mut all_valid = true;
    for path in &args.files {
        let line = match load_walkthrough_definition(path, None) {
            Ok(definition) => serde_json::json!({
                "path": path,
                "valid": true,
                "walkthrough_id": definition.walkthrough_id().as_str(),
                "title": definition.title(),
                "total_steps": definition.total_steps(),
                "display_base": definition.display_base(),
            }),
            Err(err) => {
                all_valid = false;
                let violations: Vec<String> = match &err {
                    StoreError::Schema { source, .. } => {
                        source.violations().iter().map(ToString::to_string).collect()
                    }
                    _ => Vec::new(),
                };
                serde_json::json!({
                    "path": path,
                    "valid": false,
                    "error": err.to_string(),
                    "violations": violations,
                })
            }
        };
        println!("{line}");
    }
    all_valid
}

fn run_render(args: RenderArgs) -> Result<(), Box<dyn Error>> {
    let snapshot = AuditFolder::load_snapshot(&args.snapshot)?;
    let result =
        render_snapshot(&snapshot, AuditPolicy { fail_on_critical: args.fail_on_critical });
    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.write {
        let dir = args
            .snapshot
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let path = AuditFolder::new(dir).save_audit_result(&result)?;
        eprintln!("walkaudit: wrote {}", path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    walkaudit::logging::init();

    let result = match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Validate(args) => {
            if !run_validate(args) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Render(args) => run_render(args),
    };

    if let Err(err) = result {
        eprintln!("walkaudit: {err}");
        std::process::exit(1);
    }
}

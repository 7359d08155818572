//! CLI entrypoint for toolplan
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;

use anyhow::{Context, Result, bail};
use clap::Parser;
use commands::{Cli, Command};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolplan_application::{
    ExecutionPlanService, PlanningParams, ToolDependencyGraphService, ToolStorePort,
};
use toolplan_domain::{ConfigIssue, ProvidedParameters, Severity, ToolId};
use toolplan_infrastructure::{
    ConfigLoader, DeclaredParameterRequirements, FileConfig, InMemoryToolStore,
    StoreAffinityResolver,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level; RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    let (params, issues) = config.planner.to_planning_params();
    report_issues(&issues);

    let registry = cli.registry.clone();
    let app = || App::load(registry.as_deref(), &config, params.clone());

    match cli.command {
        Command::Plan { tools, params: provided } => {
            let provided: ProvidedParameters = provided.into_iter().collect();
            let plan = app()?
                .planner()
                .generate_execution_plan(&to_ids(&tools), &provided)
                .await?;
            print_json(&plan)?;
        }
        Command::Order { tools } => {
            let graph = app()?.graph;
            let closure = graph.get_dependency_closure(&to_ids(&tools)).await?;
            let ids: Vec<ToolId> = closure.into_iter().collect();
            print_json(&graph.topological_sort(&ids).await?)?;
        }
        Command::Closure { tools } => {
            print_json(&app()?.graph.get_dependency_closure(&to_ids(&tools)).await?)?;
        }
        Command::Groups { tools } => {
            let groups = app()?
                .planner()
                .identify_parallel_execution_groups(&to_ids(&tools))
                .await?;
            print_json(&groups)?;
        }
        Command::Cycles { all } => {
            print_json(&app()?.graph.detect_cycles(all).await?)?;
        }
        Command::Config => show_config(cli.config.as_deref(), &config),
    }

    Ok(())
}

/// Wired services over one loaded registry
struct App {
    store: Arc<dyn ToolStorePort>,
    graph: ToolDependencyGraphService,
    params: PlanningParams,
}

impl App {
    // === Dependency Injection ===
    fn load(registry: Option<&Path>, config: &FileConfig, params: PlanningParams) -> Result<Self> {
        report_issues(&config.registry.validate());
        let path = registry_path(registry, config)?;
        let store = InMemoryToolStore::from_file(&path)
            .with_context(|| format!("loading registry {}", path.display()))?;
        info!(registry = %path.display(), tools = store.len(), "Starting toolplan");

        let store: Arc<dyn ToolStorePort> = Arc::new(store);
        Ok(Self {
            graph: ToolDependencyGraphService::new(store.clone()),
            store,
            params,
        })
    }

    fn planner(self) -> ExecutionPlanService {
        ExecutionPlanService::new(
            self.graph,
            Arc::new(DeclaredParameterRequirements::new(self.store.clone())),
            Arc::new(StoreAffinityResolver::new(self.store)),
        )
        .with_params(self.params)
    }
}

fn registry_path(registry: Option<&Path>, config: &FileConfig) -> Result<PathBuf> {
    match (registry, config.registry.resolved_path()) {
        (Some(path), _) => Ok(path.to_path_buf()),
        (None, Some(path)) => Ok(path.clone()),
        (None, None) => bail!("No tool registry. Pass --registry <PATH> or set registry.path in toolplan.toml."),
    }
}

fn to_ids(tools: &[String]) -> Vec<ToolId> {
    tools.iter().map(|t| ToolId::new(t.as_str())).collect()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => eprintln!("config error: {}", issue.message),
            Severity::Warning => warn!("{}", issue.message),
        }
    }
}

fn show_config(explicit: Option<&Path>, config: &FileConfig) {
    println!("Configuration sources (in priority order):");
    for source in ConfigLoader::config_sources(explicit) {
        let mark = if source.found { "FOUND" } else { "     " };
        println!("  [{}] {:<8} {}", mark, format!("{}:", source.kind), source.location);
    }

    let (params, _) = config.planner.to_planning_params();
    println!();
    println!("Effective settings:");
    println!("  planner.affinity_policy     = {}", params.affinity_policy);
    println!("  planner.allow_empty_request = {}", params.allow_empty_request);
    match config.registry.resolved_path() {
        Some(path) => println!("  registry.path               = {}", path.display()),
        None => println!("  registry.path               = (unset)"),
    }

    let issues = config.validate();
    if !issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in &issues {
            let label = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            println!("  {label}: {}", issue.message);
        }
    }
}

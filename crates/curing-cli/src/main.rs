// crates/curing-cli/src/main.rs
// ============================================================================
// Module: Curing CLI Entry Point
// Description: Command dispatcher loading configuration, binding a
//              specification, and running (or merely validating) one
//              compliance analytics workflow.
// Purpose: A thin composition root: every real decision lives in
//          curing-config/curing-engine/curing-adapters/curing-orchestrator,
//          this binary only wires them together and maps failures to the
//          orchestrator's exit code contract.
// Dependencies: clap, curing-adapters, curing-config, curing-core,
//               curing-engine, curing-orchestrator, serde_json, serde_yaml,
//               time, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `curing validate` loads and binds a specification and builds its
//! execution plan without running it, surfacing exit code 1 (plan) or 2
//! (configuration) failures before any sensor data is touched. `curing run`
//! does the same and then executes the plan, additionally surfacing exit
//! code 3 (runtime) failures, writing the formatted result through a
//! configured sink and printing the conceptual request-surface response
//! from spec.md §6.2 (`{status, execution_time, result_path, error?}`) to
//! stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use curing_adapters::CsvSource;
use curing_adapters::CsvSourceConfig;
use curing_adapters::FileSink;
use curing_adapters::PathContext;
use curing_adapters::Sink;
use curing_config::bind;
use curing_config::SpecificationRegistry;
use curing_config::TemplateRegistry;
use curing_core::identifiers::SpecificationId;
use curing_core::identifiers::TaskId;
use curing_core::model::SensorGrouping;
use curing_core::model::TaskDef;
use curing_core::model::WorkflowContext;
use curing_orchestrator::build_plan;
use curing_orchestrator::run_workflow;
use curing_orchestrator::CancellationToken;
use curing_orchestrator::ComponentFactory;
use time::OffsetDateTime;

use curing_cli::components::AnalysisComponent;
use curing_cli::components::CalculationComponent;
use curing_cli::components::GroupingComponent;
use curing_cli::components::IngestComponent;
use curing_cli::components::StageComponent;
use curing_cli::components::LAYER_ANALYSIS;
use curing_cli::components::LAYER_CALCULATION;
use curing_cli::components::LAYER_GROUPING;
use curing_cli::components::LAYER_SOURCE;
use curing_cli::components::LAYER_STAGE;
use curing_cli::error::CliError;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "curing", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, bind, and plan a workflow without executing it.
    Validate(RunArgs),
    /// Load, bind, plan, and execute a workflow end to end.
    Run(RunArgs),
}

/// Arguments shared by `validate` and `run`: everything needed to load and
/// bind a specification and assemble its ingestion/delivery adapters.
#[derive(Args, Debug)]
struct RunArgs {
    /// Root of the on-disk configuration layout (templates/ and
    /// specifications/ subdirectories).
    #[arg(long, value_name = "DIR")]
    config: PathBuf,
    /// Specification id to bind and run.
    #[arg(long, value_name = "ID")]
    spec: String,
    /// Path to a YAML document mapping sensor group names to channel lists.
    #[arg(long, value_name = "PATH")]
    grouping: PathBuf,
    /// Path to the CSV file the ingestion task reads.
    #[arg(long, value_name = "PATH")]
    source: PathBuf,
    /// Name of the source file's timestamp column.
    #[arg(long, value_name = "NAME", default_value = "timestamp")]
    timestamp_column: String,
    /// Directory the file sink writes formatted results under.
    #[arg(long, value_name = "DIR", default_value = ".")]
    sink_root: PathBuf,
    /// Path template for the sink's output file, relative to `sink_root`.
    #[arg(long, value_name = "TEMPLATE", default_value = "{process_id}/{series_id}.json")]
    path_template: String,
    /// Substituted for `{process_id}` in the path template.
    #[arg(long, value_name = "ID", default_value = "")]
    process_id: String,
    /// Substituted for `{series_id}` in the path template.
    #[arg(long, value_name = "ID", default_value = "")]
    series_id: String,
    /// Rule id prefixes grouping the formatted document's `results` entries.
    #[arg(long = "rule-prefix", value_name = "PREFIX")]
    rule_prefixes: Vec<String>,
    /// Name recorded in the formatted document's `metadata.algorithm`.
    #[arg(long, value_name = "NAME", default_value = "standard")]
    algorithm: String,
    /// Name recorded in the formatted document's `metadata.generated_by`.
    #[arg(long, value_name = "NAME", default_value = "curing-cli")]
    generated_by: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())).init();

    match run() {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error}");
            let code = error.exit_code();
            println!("{}", response_json("failed", None, Some(error.to_string())));
            code
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate(args) => {
            let (plan, _factory) = load_and_plan(&args)?;
            tracing::info!(tasks = plan.tasks.len(), "plan validated");
            println!("{}", response_json("validated", None, None));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => execute(&args),
    }
}

fn load_and_plan(args: &RunArgs) -> Result<(curing_core::model::ExecutionPlan, ComponentFactory), CliError> {
    let templates = TemplateRegistry::load(&args.config.join("templates"))?;
    let specifications = SpecificationRegistry::new(args.config.join("specifications"));
    let unbound = specifications.load_specification(&SpecificationId::new(args.spec.clone()))?;

    let grouping_text = std::fs::read_to_string(&args.grouping).map_err(|source| CliError::ConfigIo { path: args.grouping.clone(), source })?;
    let grouping: SensorGrouping = serde_yaml::from_str(&grouping_text).map_err(|source| CliError::GroupingParse { path: args.grouping.clone(), source })?;

    let bound = bind(&unbound, &grouping, &templates)?;
    let specification = Arc::new(bound);

    let source = Arc::new(CsvSource::new(CsvSourceConfig::new(args.source.clone(), args.timestamp_column.clone())));
    let mut factory = ComponentFactory::new();
    factory.register(LAYER_SOURCE, "csv", IngestComponent::new(source));
    factory.register(LAYER_GROUPING, "static", GroupingComponent::new(grouping));
    factory.register(LAYER_CALCULATION, "standard", CalculationComponent::new(Arc::clone(&specification)));
    factory.register(LAYER_STAGE, "standard", StageComponent::new(Arc::clone(&specification)));
    factory.register(
        LAYER_ANALYSIS,
        "standard",
        AnalysisComponent::new(Arc::clone(&specification), args.rule_prefixes.clone(), args.algorithm.clone(), args.generated_by.clone(), OffsetDateTime::now_utc()),
    );

    let tasks = workflow_tasks();
    let plan = build_plan(tasks, &factory)?;
    Ok((plan, factory))
}

fn workflow_tasks() -> Vec<TaskDef> {
    vec![
        task("ingest", LAYER_SOURCE, "csv", &[]),
        task("grouping", LAYER_GROUPING, "static", &[]),
        task("calculate", LAYER_CALCULATION, "standard", &["ingest", "grouping"]),
        task("stages", LAYER_STAGE, "standard", &["calculate"]),
        task("analysis", LAYER_ANALYSIS, "standard", &["stages"]),
    ]
}

fn task(id: &str, layer: &str, implementation: &str, depends_on: &[&str]) -> TaskDef {
    TaskDef {
        id: TaskId::new(id),
        layer: layer.to_string(),
        implementation: implementation.to_string(),
        algorithm: None,
        depends_on: depends_on.iter().map(|dependency| TaskId::new(*dependency)).collect(),
        parameters: std::collections::BTreeMap::new(),
    }
}

fn execute(args: &RunArgs) -> Result<ExitCode, CliError> {
    let (plan, factory) = load_and_plan(args)?;

    let outcome = run_workflow(&plan, &factory, WorkflowContext::new(), &CancellationToken::new());
    if !outcome.success {
        let message = outcome.failure.map_or_else(|| "workflow did not complete".to_string(), |failure| failure.to_string());
        println!("{}", response_json("failed", None, Some(message.clone())));
        return Err(CliError::Run(message));
    }

    let curing_core::value::Value::Str(document_json) = outcome.context.formatted_results.clone().ok_or_else(|| CliError::Run("no formatted result was produced".to_string()))? else {
        return Err(CliError::Run("formatted result was not a serialized document".to_string()));
    };
    let document: serde_json::Value = serde_json::from_str(&document_json)?;

    let sink = FileSink::new(&args.sink_root);
    let path_context = PathContext { process_id: args.process_id.clone(), series_id: args.series_id.clone(), calculation_date: curing_engine::format::now_iso8601(OffsetDateTime::now_utc()) };
    let result_path = sink.write(&document, &args.path_template, &path_context)?;

    println!("{}", response_json("completed", Some(&result_path), None));
    Ok(ExitCode::SUCCESS)
}

fn response_json(status: &str, result_path: Option<&str>, error: Option<String>) -> String {
    let response = serde_json::json!({
        "status": status,
        "result_path": result_path,
        "error": error,
    });
    response.to_string()
}

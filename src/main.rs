use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use regroup::{
    config::{CliConfig, RewriterConfig},
    entity_catalog::EntityCatalog,
    query_planner::{
        logical_expr::ast_conversion::{SourceDeclaration, SourceScope},
        plan_projection_text,
        select_rewriter::{materializer::CollectionPolicy, RewrittenProjection},
    },
    result_transformer::rows_from_json,
};

/// Regroup - rewrite collection-valued projections into flat tuples
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML rewriter configuration (defaults to REGROUP_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Concrete collection type for regrouped fields: declared, set or list
    #[arg(long, global = true)]
    collection_policy: Option<CollectionPolicy>,

    /// Name of the raw row placeholder in rewritten projections
    #[arg(long, global = true)]
    input_parameter: Option<String>,

    /// Fail instead of executing unsupported projections unrewritten
    #[arg(long, global = true)]
    no_fallback: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rewritten projection and its post-processing transform
    Rewrite {
        #[command(flatten)]
        projection: ProjectionArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Regroup flat rows (a JSON array of arrays) with the projection's transform
    Apply {
        #[command(flatten)]
        projection: ProjectionArgs,

        /// JSON file with the executed rows
        #[arg(long)]
        rows: PathBuf,
    },
}

#[derive(Args)]
struct ProjectionArgs {
    /// YAML entity catalog
    #[arg(long)]
    catalog: PathBuf,

    /// Query source in scope, as name:Entity (repeatable)
    #[arg(long = "source", required = true)]
    sources: Vec<SourceDeclaration>,

    /// Projection text, e.g. "new { customer.Name, customer.OrderSet }"
    projection: String,
}

impl Cli {
    fn cli_config(&self) -> CliConfig {
        CliConfig {
            collection_policy: self.collection_policy,
            input_parameter: self.input_parameter.clone(),
            no_fallback: self.no_fallback,
        }
    }
}

fn load_config(cli: &Cli) -> Result<RewriterConfig> {
    let base = match &cli.config {
        Some(path) => RewriterConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RewriterConfig::from_env().context("reading configuration from environment")?,
    };
    Ok(base.merge_cli(cli.cli_config())?)
}

fn plan(args: &ProjectionArgs, config: &RewriterConfig) -> Result<RewrittenProjection> {
    let catalog = EntityCatalog::from_yaml_file(&args.catalog)
        .with_context(|| format!("loading entity catalog {}", args.catalog.display()))?;

    let mut scope = SourceScope::new();
    for declaration in &args.sources {
        scope.declare(declaration, &catalog)?;
    }

    Ok(plan_projection_text(
        &args.projection,
        &catalog,
        &scope,
        config,
    )?)
}

fn main() -> Result<()> {
    // Defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::debug!("Rewriter configuration: {:?}", config);

    match &cli.command {
        Command::Rewrite { projection, json } => {
            let planned = plan(projection, &config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&planned)?);
            } else {
                println!("projection: {}", planned.expression);
                match &planned.transform {
                    Some(transform) => println!("transform:  {}", transform),
                    None => println!("transform:  none"),
                }
            }
        }
        Command::Apply { projection, rows } => {
            let planned = plan(projection, &config)?;
            let content = std::fs::read_to_string(rows)
                .with_context(|| format!("reading rows from {}", rows.display()))?;
            let json: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("parsing rows in {}", rows.display()))?;
            let results = planned.apply(rows_from_json(json)?)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

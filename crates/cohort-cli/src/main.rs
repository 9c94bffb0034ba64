//! Cohort CLI: team structure and contribution analysis of design snapshots.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use cohort_core::config::{
    AnalysisConfig, AnalysisResult, ClusterMode, IsolatedPolicy, OwnershipCategory, Orientation,
    ReputationSummary, DEFAULT_TOP_LEVEL_PATTERN,
};
use cohort_core::output::write_output;
use cohort_core::pipeline;

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Cohort - Infer design teams and contribution roles from a component snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
struct SnapshotArgs {
    /// Path to the snapshot JSON file
    snapshot: PathBuf,

    /// Team clustering mode (undirected or directed)
    #[arg(long, default_value = "undirected", value_parser = parse_mode)]
    mode: ClusterMode,

    /// Edge orientation for directed clustering (author-order)
    #[arg(long, value_parser = parse_orientation)]
    orientation: Option<Orientation>,

    /// Leave users without co-authors out of every team
    #[arg(long)]
    exclude_isolated: bool,

    /// Regex identifying top-level component names
    #[arg(long, default_value = DEFAULT_TOP_LEVEL_PATTERN)]
    top_level_pattern: String,

    /// Disable the rayon thread pool
    #[arg(long)]
    sequential: bool,

    /// Debug logging and per-phase timing breakdown
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write a JSON report
    Analyze {
        #[command(flatten)]
        args: SnapshotArgs,

        /// Output JSON file path
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print every team with its members and component ownership
    Teams {
        #[command(flatten)]
        args: SnapshotArgs,
    },
    /// Print designer, integrator and dual-contributor breakdowns
    UserTypes {
        #[command(flatten)]
        args: SnapshotArgs,
    },
    /// Print data-quality findings for the snapshot
    Audit {
        #[command(flatten)]
        args: SnapshotArgs,
    },
}

fn parse_mode(s: &str) -> Result<ClusterMode, String> {
    ClusterMode::from_str_value(s).ok_or_else(|| format!("unknown cluster mode '{s}'"))
}

fn parse_orientation(s: &str) -> Result<Orientation, String> {
    Orientation::from_str_value(s).ok_or_else(|| format!("unknown orientation '{s}'"))
}

impl SnapshotArgs {
    fn to_config(&self, output_path: Option<String>) -> AnalysisConfig {
        AnalysisConfig {
            snapshot_path: self.snapshot.to_string_lossy().to_string(),
            output_path,
            cluster_mode: self.mode,
            orientation: self.orientation,
            isolated_users: if self.exclude_isolated {
                IsolatedPolicy::Exclude
            } else {
                IsolatedPolicy::Singleton
            },
            top_level_pattern: self.top_level_pattern.clone(),
            parallel: !self.sequential,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { args, output } => {
            init_logging(args.verbose, args.quiet);
            let stem = args
                .snapshot
                .file_stem()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "snapshot".to_string());
            let output_path = output.unwrap_or_else(|| format!("{stem}.cohort.json"));
            let config = args.to_config(Some(output_path.clone()));

            if args.quiet {
                run_quiet(&config, &output_path);
            } else {
                run_with_progress(&config, &output_path, args.verbose);
            }
        }
        Commands::Teams { args } => {
            init_logging(args.verbose, args.quiet);
            print_teams(&analyse_or_exit(&args.to_config(None)));
        }
        Commands::UserTypes { args } => {
            init_logging(args.verbose, args.quiet);
            print_user_types(&analyse_or_exit(&args.to_config(None)));
        }
        Commands::Audit { args } => {
            init_logging(args.verbose, args.quiet);
            print_audit(&analyse_or_exit(&args.to_config(None)));
        }
    }
}

fn analyse_or_exit(config: &AnalysisConfig) -> AnalysisResult {
    log::debug!("Analysis config: {config:?}");
    match pipeline::run_snapshot(config, None) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run_quiet(config: &AnalysisConfig, output_path: &str) {
    let result = analyse_or_exit(config);
    if let Err(e) = write_output(&result, output_path) {
        eprintln!("Error writing output: {e}");
        std::process::exit(1);
    }
}

fn stat(result: &AnalysisResult, key: &str) -> serde_json::Value {
    result
        .stats
        .get(key)
        .cloned()
        .unwrap_or_else(|| serde_json::json!(0))
}

fn run_with_progress(config: &AnalysisConfig, output_path: &str, verbose: bool) {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message("Loading snapshot...");
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    let progress: pipeline::ProgressCallback = {
        let pb = pb.clone();
        Box::new(move |_name, label| {
            pb.set_message(label.to_string());
        })
    };

    log::debug!("Analysis config: {config:?}");
    let start = Instant::now();
    let result = match pipeline::run_snapshot(config, Some(progress)) {
        Ok(r) => r,
        Err(e) => {
            pb.finish_and_clear();
            eprintln!("Analysis failed: {e}");
            std::process::exit(1);
        }
    };
    pb.finish_and_clear();

    println!(
        "\n{}  Cohort Analysis: {}",
        style("✓").green().bold(),
        style(
            Path::new(&config.snapshot_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        )
        .bold()
    );
    println!("  {:<14} {}", "Users:", stat(&result, "users"));
    println!("  {:<14} {}", "Components:", stat(&result, "components"));
    println!("  {:<14} {}", "Teams:", stat(&result, "teams"));
    println!("  {:<14} {}", "Multi-team:", stat(&result, "multi_team"));
    println!("  {:<14} {}", "Unowned:", stat(&result, "unowned"));
    println!("  {:<14} {}", "Findings:", stat(&result, "audit_findings"));

    let duration = start.elapsed();
    println!(
        "  {:<14} {:.1}ms",
        "Duration:",
        duration.as_secs_f64() * 1000.0
    );

    if verbose {
        if let Some(serde_json::Value::Object(timings)) = result.metadata.get("phase_timings") {
            println!("\n  Phase Timings:");
            for (phase, secs) in timings {
                if let Some(val) = secs.as_f64() {
                    println!("    {:<14} {:.1}ms", phase, val * 1000.0);
                }
            }
        }
    }

    if let Err(e) = write_output(&result, output_path) {
        eprintln!("Error writing output: {e}");
        std::process::exit(1);
    }

    println!(
        "\n  {} {}",
        style("Output written to:").green(),
        output_path
    );
}

fn format_summary(s: &ReputationSummary) -> String {
    format!(
        "min {:.3}  max {:.3}  mean {:.3}  median {:.3}  variance {:.4}",
        s.min, s.max, s.mean, s.median, s.variance
    )
}

fn print_teams(result: &AnalysisResult) {
    for team in &result.teams {
        println!(
            "\n{} ({} members, cohesion {:.3})",
            style(&team.id).bold(),
            team.members.len(),
            team.cohesion
        );
        println!("  {:<14} {}", "Reputation:", format_summary(&team.reputation));
        for member in &team.members {
            let dual = if member.dual_contributor { " (dual)" } else { "" };
            println!("    {}  {}{}", member.label, member.contribution, dual);
        }
    }

    if !result.excluded_users.is_empty() {
        println!(
            "\n{} {}",
            style("Excluded isolated users:").yellow(),
            result.excluded_users.join(", ")
        );
    }

    let ownership = &result.ownership;
    println!("\n{}", style("Ownership").bold());
    println!("  {:<14} {}", "Unowned:", ownership.unowned);
    println!("  {:<14} {}", "Single-team:", ownership.single_team);
    println!("  {:<14} {}", "Multi-team:", ownership.multi_team);

    for (category, heading) in [
        (OwnershipCategory::MultiTeam, "Multi-team components:"),
        (OwnershipCategory::Unowned, "Unowned components:"),
    ] {
        let keys: Vec<&str> = ownership
            .components
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.component.as_str())
            .collect();
        if !keys.is_empty() {
            println!("\n  {heading}");
            for key in keys {
                println!("    {key}");
            }
        }
    }
}

fn print_user_types(result: &AnalysisResult) {
    let types = &result.corpus.user_types;
    println!("  {:<18} {}", "Designers:", types.designers.len());
    println!("  {:<18} {}", "Integrators:", types.integrators.len());
    println!("  {:<18} {}", "Dual contributors:", types.dual_contributors.len());

    println!("\n{}", style("Designers").bold());
    for name in &types.designers {
        println!("    {name}");
    }
    println!("\n{}", style("Dual contributors").bold());
    for name in &types.dual_contributors {
        println!("    {name}");
    }
}

fn print_audit(result: &AnalysisResult) {
    if result.audit.is_clean() {
        println!("{}  No findings", style("✓").green().bold());
        return;
    }
    for finding in &result.audit.findings {
        println!(
            "  {} {}",
            style(format!("{:<34}", finding.kind.as_str())).yellow(),
            finding.component
        );
    }
    println!("\n  {} finding(s)", result.audit.findings.len());
}

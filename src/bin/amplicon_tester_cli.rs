use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use amplicon_tester::config::PipelineConfig;
use amplicon_tester::diagnostics::LogDiagnostics;
use amplicon_tester::report::read_taxonomy_stats_csv;
use amplicon_tester::selection::{filter_stats, resolve_selection, selection_details, selection_hash};
use amplicon_tester::{run_pipeline, stats_from_summary_csv};

/// Amplicon specificity analysis
#[derive(Parser)]
#[command(name = "amplicon-tester")]
#[command(version)]
#[command(about = "Check whether targets amplify and are distinguishable at species level", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: FASTA, search, summary, taxonomy stats
    Run {
        /// Directory relative paths are resolved against
        #[arg(long)]
        workdir: Option<PathBuf>,
        /// Reference database FASTA
        #[arg(long)]
        database: Option<PathBuf>,
        /// Expected taxonomy file (`<id> <lineage>` per line)
        #[arg(long)]
        taxonomy: Option<PathBuf>,
        /// In-silico PCR results (JSON)
        #[arg(long)]
        amplicons: Option<PathBuf>,
        /// Search tool executable
        #[arg(long)]
        search_program: Option<String>,
        /// Threads handed to the search tool
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Recompute taxonomy stats from a saved summary CSV
    Stats {
        #[arg(long, default_value = "differentiation_summary.vsearch.csv")]
        summary: PathBuf,
        #[arg(long, default_value = "taxonomy_summary.csv")]
        out: PathBuf,
    },

    /// Filter a taxonomy stats table and show details for selected taxa
    Select {
        #[arg(long, default_value = "taxonomy_summary.csv")]
        stats: PathBuf,
        /// Case-insensitive substring to search for (any level)
        #[arg(long, default_value = "")]
        query: String,
        /// Selection hash (repeatable)
        #[arg(long)]
        selected: Vec<String>,
    },
}

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(msg);
    spinner
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let diag = LogDiagnostics;

    match cli.command {
        Commands::Run { workdir, database, taxonomy, amplicons, search_program, threads } => {
            let mut config = PipelineConfig::default();
            if let Some(p) = database {
                config.database = p;
            }
            if let Some(p) = taxonomy {
                config.expected_taxonomy = p;
            }
            if let Some(p) = amplicons {
                config.amplicons = p;
            }
            if let Some(prog) = search_program {
                config.search.program = prog;
            }
            if let Some(t) = threads {
                config.search.threads = t;
            }
            if let Some(dir) = workdir {
                config = config.with_workdir(dir);
            }

            let spinner = spinner("green", "Running amplicon pipeline...");
            let results = run_pipeline(&config, &diag).context("Pipeline failed")?;
            spinner.finish_with_message("Pipeline finished.");
            print!("{}", results.get_overview());
        }

        Commands::Stats { summary, out } => {
            let spinner = spinner("yellow", "Aggregating taxonomy stats...");
            let stats = stats_from_summary_csv(&summary, &out, &diag)
                .with_context(|| format!("Could not aggregate {}", summary.display()))?;
            spinner.finish_with_message(format!("Wrote {} taxonomy nodes.", stats.len()));
        }

        Commands::Select { stats, query, selected } => {
            let rows = read_taxonomy_stats_csv(&stats, &diag)
                .with_context(|| format!("Could not load {}", stats.display()))?;

            println!("hash\tlevel\tentries\tamplifies\tdifferentiable\ttaxonomy");
            for row in filter_stats(&rows, &query) {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    selection_hash(&row.taxonomy_fields()),
                    row.level,
                    row.entries,
                    row.amplifies,
                    row.differentiable,
                    row.taxonomy
                );
            }

            let chosen = resolve_selection(&selected, &rows);
            if !chosen.is_empty() {
                println!();
                println!("Taxonomy\tAmplifies (n %)\tDifferentiable (n %)\tRank Summary");
                for d in selection_details(&chosen, &rows) {
                    println!(
                        "{}\t{}\t{}\t{}",
                        d.taxonomy,
                        d.amplifies,
                        d.differentiable,
                        d.rank_summary.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

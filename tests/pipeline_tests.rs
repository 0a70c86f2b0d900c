use std::fs;
use std::path::Path;

use amplicon_tester::config::PipelineConfig;
use amplicon_tester::diagnostics::MemoryDiagnostics;
use amplicon_tester::error::AmpliconError;
use amplicon_tester::lineage::MatchRank;
use amplicon_tester::report::{read_summary_csv, read_summary_jsonl, read_taxonomy_stats_csv};
use amplicon_tester::taxonomy::Rank;
use amplicon_tester::vsearch::SearchOutcome;
use amplicon_tester::{run_pipeline, stats_from_summary_csv};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const ECOLI: &str = "Bacteria;Proteobacteria;Gammaproteobacteria;Enterobacterales;Enterobacteriaceae;Escherichia;Escherichia coli";
const ALBERTII: &str = "Bacteria;Proteobacteria;Gammaproteobacteria;Enterobacterales;Enterobacteriaceae;Escherichia;Escherichia albertii";
const FERGUSONII: &str = "Bacteria;Proteobacteria;Gammaproteobacteria;Enterobacterales;Enterobacteriaceae;Escherichia;Escherichia fergusonii";

/// Lay out a run directory: three expected taxa, amplicons for two of them,
/// and a pre-computed search result so no external tool is needed.
fn seed_run(dir: &Path) -> PipelineConfig {
    let config = PipelineConfig::default().with_workdir(dir);

    fs::write(
        &config.expected_taxonomy,
        format!(">t1 {ECOLI}\nt2 {ALBERTII}\nt3 {FERGUSONII}\neuk Eukaryota;Fungi;Ascomycota\n"),
    )
    .unwrap();
    fs::write(
        &config.amplicons,
        r#"[
            {"sequence_id": "t1:12-265", "seq": "ACGTACGTAC"},
            {"sequence_id": "t2:10-262", "seq": "GGCCGGCCAA"}
        ]"#,
    )
    .unwrap();
    fs::write(
        &config.search_tsv,
        [
            "t1\tt1\t100.0\t253\t0\t0\t1\t253\t1\t253\t1e-130\t468",
            "t1\tt3\t98.4\t253\t4\t0\t1\t253\t1\t253\t1e-120\t440",
            "t2\tt3\t97.6\t252\t6\t0\t1\t252\t1\t252\t1e-110\t430",
            "t2\tt2\t97.1\t252",
        ]
        .join("\n")
            + "\n",
    )
    .unwrap();
    config
}

#[test]
fn end_to_end_three_taxa() {
    let temp_dir = TempDir::new().unwrap();
    let config = seed_run(temp_dir.path());
    let diag = MemoryDiagnostics::new();

    let results = run_pipeline(&config, &diag).expect("pipeline should succeed");

    assert_eq!(results.search, SearchOutcome::Skipped);
    assert!(results.fasta_written);

    let rows = &results.summary_rows;
    let ids: Vec<&str> = rows.iter().map(|r| r.sequence_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    assert!(rows[0].amplifies && rows[0].differentiable);
    assert_eq!(rows[0].deepest_rank, Some(MatchRank::Matched(Rank::Species)));
    assert_eq!(rows[0].top_hit_subject_id.as_deref(), Some("t1"));

    assert!(rows[1].amplifies && !rows[1].differentiable);
    assert_eq!(rows[1].deepest_rank, Some(MatchRank::Matched(Rank::Genus)));
    assert_eq!(rows[1].top_hit_pident, Some(97.6));

    assert!(!rows[2].amplifies && !rows[2].differentiable);
    assert_eq!(rows[2].deepest_rank, None);

    assert_eq!(rows.iter().filter(|r| r.differentiable).count(), 1);
    assert_eq!(results.amplifying(), 2);

    let root = &results.stats_rows[0];
    assert_eq!(root.taxonomy, "Bacteria");
    assert_eq!((root.entries, root.amplifies, root.differentiable), (3, 2, 1));
    assert_eq!(root.rank_summary, vec!["species (1)", "genus (1)", "none (1)"]);

    // the short t2 row was reported but did not stop the run
    assert_eq!(diag.warnings().len(), 1);
}

#[test]
fn outputs_are_written_and_reload_consistently() {
    let temp_dir = TempDir::new().unwrap();
    let config = seed_run(temp_dir.path());
    let diag = MemoryDiagnostics::new();
    let results = run_pipeline(&config, &diag).unwrap();

    let fasta = fs::read_to_string(&config.query_fasta).unwrap();
    assert_eq!(fasta, ">t1\nACGTACGTAC\n>t2\nGGCCGGCCAA\n");

    assert_eq!(read_summary_jsonl(&config.summary_jsonl).unwrap(), results.summary_rows);
    assert_eq!(read_summary_csv(&config.summary_csv, &diag).unwrap(), results.summary_rows);
    assert_eq!(read_taxonomy_stats_csv(&config.taxonomy_stats_csv, &diag).unwrap(), results.stats_rows);

    let recomputed = stats_from_summary_csv(
        &config.summary_csv,
        &temp_dir.path().join("again.csv"),
        &diag,
    )
    .unwrap();
    assert_eq!(recomputed, results.stats_rows);
}

#[test]
fn stats_cover_every_prefix_depth() {
    let temp_dir = TempDir::new().unwrap();
    let config = seed_run(temp_dir.path());
    let results = run_pipeline(&config, &MemoryDiagnostics::new()).unwrap();

    let levels: Vec<usize> = results.stats_rows.iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![1, 2, 3, 4, 5, 6, 7, 7, 7]);

    let genus = results
        .stats_rows
        .iter()
        .find(|r| r.taxonomy.ends_with(";Escherichia"))
        .unwrap();
    assert_eq!((genus.entries, genus.amplifies, genus.differentiable), (3, 2, 1));
}

#[test]
fn rerun_reuses_existing_fasta() {
    let temp_dir = TempDir::new().unwrap();
    let config = seed_run(temp_dir.path());
    run_pipeline(&config, &MemoryDiagnostics::new()).unwrap();

    let again = run_pipeline(&config, &MemoryDiagnostics::new()).unwrap();
    assert!(!again.fasta_written);
    assert_eq!(again.search, SearchOutcome::Skipped);
}

#[test]
fn missing_expected_taxonomy_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let config = PipelineConfig::default().with_workdir(temp_dir.path());

    let err = run_pipeline(&config, &MemoryDiagnostics::new()).err().unwrap();
    assert!(matches!(err, AmpliconError::Io { .. }));
}

#[test]
fn failing_search_tool_aborts_before_any_summary() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = seed_run(temp_dir.path());
    fs::remove_file(&config.search_tsv).unwrap();
    config.search.program = "amplicon-tester-missing-search-tool".to_string();

    let err = run_pipeline(&config, &MemoryDiagnostics::new()).err().unwrap();
    assert!(matches!(err, AmpliconError::SearchToolSpawn { .. }));
    assert!(!config.summary_csv.exists());
}

#[cfg(unix)]
#[test]
fn search_tool_exit_failure_aborts_before_any_summary() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = seed_run(temp_dir.path());
    fs::remove_file(&config.search_tsv).unwrap();
    config.search.program = "false".to_string();

    let err = run_pipeline(&config, &MemoryDiagnostics::new()).err().unwrap();
    assert!(matches!(err, AmpliconError::SearchToolFailed { .. }));
    assert!(!config.summary_csv.exists());
    assert!(!config.summary_jsonl.exists());
    assert!(!config.taxonomy_stats_csv.exists());
}

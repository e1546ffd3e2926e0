//! End-to-end correlation tests over breakpoint files on disk.
//!
//! Each test writes per-caller TSV files, streams them through the
//! correlation passes and finalizes the result the same way the CLI does.

use metal_indels::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

// =============================================================================
// Helper functions
// =============================================================================

fn create_tsv_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

/// Standard caller ids: Scotch, DeepVariant, GATK-HC, VarScan, Pindel-L.
const SCOTCH: usize = 0;
const DEEPVARIANT: usize = 1;
const GATKHC: usize = 2;
const PINDELL: usize = 4;

/// Correlate `(caller id, file content)` pairs and return finalized rows.
fn correlate(inputs: &[(usize, &str)]) -> Vec<String> {
    correlate_with(CorrelateCommand::new(), FinalizeCommand::new(), inputs)
}

fn correlate_with(
    cmd: CorrelateCommand,
    finalize: FinalizeCommand,
    inputs: &[(usize, &str)],
) -> Vec<String> {
    let files: Vec<(usize, NamedTempFile)> = inputs
        .iter()
        .map(|(id, content)| (*id, create_tsv_file(content)))
        .collect();
    let mut sources: Vec<TsvSource<std::fs::File>> = files
        .iter()
        .map(|(id, file)| TsvSource::from_path(file.path(), CallerId(*id)).unwrap())
        .collect();

    let mut unsorted = Vec::new();
    let mut writer = CalledWriter::new(&mut unsorted);
    cmd.run(&mut sources, &mut writer).unwrap();
    writer.flush().unwrap();
    drop(writer);

    let mut out = Vec::new();
    finalize
        .run_reader(std::io::Cursor::new(unsorted), &mut out)
        .unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

// =============================================================================
// Correlation rules
// =============================================================================

#[test]
fn test_close_deletions_annotated_both_ways() {
    let rows = correlate(&[
        (SCOTCH, "1\t100\t<DEL_L>\t5\n"),
        (GATKHC, "1\t102\t<DEL_L>\t5\n"),
    ]);
    assert_eq!(
        rows,
        vec![
            "1\t100\t<DEL_L>\t5\tScotch,GATK-HC",
            "1\t102\t<DEL_L>\t5\tGATK-HC,Scotch",
        ]
    );
}

#[test]
fn test_threshold_distance_is_silent() {
    let rows = correlate(&[
        (SCOTCH, "1\t100\t<DEL_L>\t5\n"),
        (GATKHC, "1\t104\t<DEL_L>\t5\n"),
    ]);
    assert!(rows.is_empty());

    let rows = correlate(&[
        (SCOTCH, "1\t100\t<DEL_L>\t5\n"),
        (GATKHC, "1\t103\t<DEL_L>\t5\n"),
    ]);
    assert!(rows.is_empty(), "a difference equal to the threshold does not correlate");
}

#[test]
fn test_low_specificity_insertions_do_not_confirm_each_other() {
    let rows = correlate(&[
        (SCOTCH, "1\t50\t<INS>\t3\n"),
        (PINDELL, "1\t51\t<INS>\t3\n"),
    ]);
    assert!(rows.is_empty());
}

#[test]
fn test_independent_caller_confirms_insertions() {
    let rows = correlate(&[
        (SCOTCH, "1\t50\t<INS>\t3\n"),
        (DEEPVARIANT, "1\t52\t<INS>\t3\n"),
        (PINDELL, "1\t51\t<INS>\t3\n"),
    ]);
    assert_eq!(
        rows,
        vec![
            "1\t50\t<INS>\t3\tScotch,DeepVariant",
            "1\t51\t<INS>\t3\tPindel-L,DeepVariant",
            "1\t52\t<INS>\t3\tDeepVariant,Scotch,Pindel-L",
        ]
    );
}

#[test]
fn test_sex_chromosomes_follow_autosomes() {
    // If X were merged before 22, the Scotch call at X:1 would only be read
    // after GATK-HC was already exhausted and the pair would be lost.
    let rows = correlate(&[
        (SCOTCH, "22\t1000\t<DEL_R>\t2\nX\t1\t<DEL_R>\t2\n"),
        (GATKHC, "X\t2\t<DEL_R>\t2\n"),
    ]);
    assert_eq!(
        rows,
        vec!["X\t1\t<DEL_R>\t2\tScotch,GATK-HC", "X\t2\t<DEL_R>\t2\tGATK-HC,Scotch"]
    );

    let order = ChromOrder::human();
    assert!(order.ordinal("X") > order.ordinal("22"));
    assert!(order.ordinal("Y") > order.ordinal("X"));
}

#[test]
fn test_types_are_correlated_separately() {
    let rows = correlate(&[
        (SCOTCH, "1\t100\t<DEL_L>\t5\n1\t100\t<INS>\t5\n"),
        (GATKHC, "1\t101\t<DEL_R>\t5\n"),
    ]);
    assert!(rows.is_empty());
}

#[test]
fn test_extra_columns_pass_through() {
    let rows = correlate(&[
        (SCOTCH, "1\t100\t<DEL_L>\t5\tPASS\t0.9\n"),
        (GATKHC, "1\t101\t<DEL_L>\t5\n"),
    ]);
    assert_eq!(rows[0], "1\t100\t<DEL_L>\t5\tPASS\t0.9\tScotch,GATK-HC");
}

#[test]
fn test_comments_and_blank_lines_skipped() {
    let rows = correlate(&[
        (SCOTCH, "# scotch breakpoints\n\n1\t100\t<DEL_L>\t5\n"),
        (GATKHC, "1\t101\t<DEL_L>\t5\n\n"),
    ]);
    assert_eq!(rows.len(), 2);
}

// =============================================================================
// Finalization
// =============================================================================

#[test]
fn test_finalized_rows_ordered_by_position_only() {
    let rows = correlate(&[
        (SCOTCH, "1\t900\t<INS>\t1\n2\t10\t<INS>\t1\n"),
        (DEEPVARIANT, "1\t901\t<INS>\t1\n2\t11\t<INS>\t1\n"),
    ]);
    let positions: Vec<&str> = rows.iter().map(|r| r.split('\t').nth(1).unwrap()).collect();
    assert_eq!(positions, vec!["10", "11", "900", "901"]);
}

#[test]
fn test_finalized_rows_by_chrom() {
    let rows = correlate_with(
        CorrelateCommand::new(),
        FinalizeCommand::new().with_by_chrom(true),
        &[
            (SCOTCH, "1\t900\t<INS>\t1\n2\t10\t<INS>\t1\n"),
            (DEEPVARIANT, "1\t901\t<INS>\t1\n2\t11\t<INS>\t1\n"),
        ],
    );
    let positions: Vec<&str> = rows.iter().map(|r| r.split('\t').nth(1).unwrap()).collect();
    assert_eq!(positions, vec!["900", "901", "10", "11"]);
}

#[test]
fn test_same_site_from_two_callers_collapses() {
    // Both callers report 1:100, so the site appears twice before dedup.
    let rows = correlate(&[
        (SCOTCH, "1\t100\t<DEL_L>\t5\n"),
        (GATKHC, "1\t100\t<DEL_L>\t5\n"),
    ]);
    assert_eq!(rows, vec!["1\t100\t<DEL_L>\t5\tScotch,GATK-HC"]);
}

// =============================================================================
// Configuration and errors
// =============================================================================

#[test]
fn test_wider_distance() {
    let rows = correlate_with(
        CorrelateCommand::new().with_distance(10),
        FinalizeCommand::new(),
        &[
            (SCOTCH, "1\t100\t<DEL_L>\t5\n"),
            (GATKHC, "1\t109\t<DEL_L>\t5\n"),
        ],
    );
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_custom_callers() {
    let callers = CallerSet::new(vec![
        CallerSpec::new("Manta"),
        CallerSpec::new("Delly").low_specificity(),
        CallerSpec::new("Lumpy").low_specificity(),
    ]);
    let config = CorrelateConfig::new().with_callers(callers);
    let rows = correlate_with(
        CorrelateCommand::new().with_config(config),
        FinalizeCommand::new(),
        &[
            (0, "1\t10\t<DEL_L>\t1\n"),
            (1, "1\t11\t<DEL_L>\t1\n1\t500\t<INS>\t1\n"),
            (2, "1\t501\t<INS>\t1\n"),
        ],
    );
    assert_eq!(
        rows,
        vec!["1\t10\t<DEL_L>\t1\tManta,Delly", "1\t11\t<DEL_L>\t1\tDelly,Manta"]
    );
}

#[test]
fn test_malformed_indel_type_fails() {
    let file = create_tsv_file("1\t100\t<DUP>\t5\n");
    let mut sources = vec![TsvSource::from_path(file.path(), CallerId(SCOTCH)).unwrap()];
    let err = CorrelateCommand::new().run_collect(&mut sources).unwrap_err();
    assert!(matches!(err, MetalError::MalformedRecord(_)));
}

#[test]
fn test_missing_file_fails() {
    let err = TsvSource::from_path("/nonexistent/scotch.tsv", CallerId(SCOTCH))
        .err()
        .unwrap();
    assert!(err.to_string().contains("/nonexistent/scotch.tsv"));
}

#[test]
fn test_unsorted_input_rejected_with_validation() {
    let file = create_tsv_file("2\t100\t<DEL_L>\t5\n1\t100\t<DEL_L>\t5\n");
    let mut sources = vec![TsvSource::from_path(file.path(), CallerId(SCOTCH))
        .unwrap()
        .with_validation(ChromOrder::human())];
    let err = CorrelateCommand::new().run_collect(&mut sources).unwrap_err();
    assert!(matches!(err, MetalError::Unsorted { .. }));
}

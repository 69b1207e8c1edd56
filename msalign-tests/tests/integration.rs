use std::fs;

use anyhow::Result;
use util::{output_path, read_output, run_in_repo_root};

mod util;

/// The rows of the seed alignment in `test_files/helices_seed.fa`.
const HELIX_ROWS: [(&str, [isize; 10]); 3] = [
    ("a", [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]),
    ("b", [-1, -1, 0, 1, 2, 3, 4, 5, 6, 7]),
    ("c", [-1, 0, 1, 2, 3, 4, 5, 6, 7, 8]),
];

#[test]
fn test_align_progressive() -> Result<()> {
    let output = output_path("progressive.fa")?;
    run_in_repo_root(&format!(
        "align -l warn -i test_files/helices.toml -o {output}"
    ))?;

    let alignment = read_output(&output)?;
    assert_eq!(alignment.column_count(), 10);
    for (name, row) in HELIX_ROWS {
        assert_eq!(alignment.row(name).unwrap().to_indices(), row);
    }
    Ok(())
}

#[test]
fn test_align_coordinates_with_seed() -> Result<()> {
    let output = output_path("coordinates.fa")?;
    let report = output_path("coordinates.toml")?;
    run_in_repo_root(&format!(
        "align -l warn -i test_files/helices.toml -s test_files/helices_seed.fa --alignment-method coordinates -o {output} --report {report}"
    ))?;

    let alignment = read_output(&output)?;
    for (name, row) in HELIX_ROWS {
        assert_eq!(alignment.row(name).unwrap().to_indices(), row);
    }

    let report = fs::read_to_string(report)?;
    assert!(report.contains("column_count = 10"));
    assert!(report.contains("core_column_count = 8"));
    assert!(report.contains("consensus_rmsd"));
    assert!(report.contains("branch_lengths"));
    Ok(())
}

#[test]
fn test_align_coordinates_without_seed() {
    assert!(
        run_in_repo_root(
            "align -l warn -i test_files/helices.toml --alignment-method coordinates"
        )
        .is_err()
    );
}

#[test]
fn test_align_features_from_dssp_records() -> Result<()> {
    let output = output_path("dssp.fa")?;
    run_in_repo_root(&format!(
        "align -l warn -i test_files/helices_dssp.toml --alignment-method features --normal-modes 5 --line-width 4 -o {output}"
    ))?;

    let alignment = read_output(&output)?;
    assert_eq!(alignment.len(), 3);
    for (name, residue_count) in [("a", 10), ("b", 8), ("c", 9)] {
        let row = alignment.row(name).unwrap();
        assert_eq!(row.len(), alignment.column_count());
        assert!(row.is_complete_permutation(residue_count));
    }
    Ok(())
}

#[test]
fn test_align_without_config_file() -> Result<()> {
    let output = output_path("default_config.fa")?;
    run_in_repo_root(&format!(
        "align -l warn -c test_files -i test_files/helices.toml --alignment-method features --no-realign-pairs -o {output}"
    ))?;

    assert_eq!(read_output(&output)?.len(), 3);
    Ok(())
}

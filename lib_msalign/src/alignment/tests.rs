use ndarray::array;

use crate::error::Error;

use super::{
    AlignedResidue, AlignmentRow, PairwiseAlignment, common_positions,
    multiple::{MultipleAlignment, NodeAlignment},
};

#[test]
fn test_aligned_string_round_trip() {
    let row = AlignmentRow::from_aligned_string("A-C--D");
    assert_eq!(row.to_indices(), vec![0, -1, 1, -1, -1, 2]);
    assert_eq!(row.to_aligned_string("ACD").unwrap(), "A-C--D");
    assert_eq!(AlignmentRow::from_indices(&row.to_indices()), row);
    assert_eq!(row.residue_count(), 3);
    assert_eq!(row.to_string(), "[0 - 1 - - 2]");
}

#[test]
fn test_aligned_string_short_sequence() {
    let row = AlignmentRow::from_aligned_string("A-CD");
    assert!(matches!(
        row.to_aligned_string("AC"),
        Err(Error::ResidueIndexOutOfBounds {
            index: 2,
            length: 2
        })
    ));
}

#[test]
fn test_complete_permutation() {
    assert!(AlignmentRow::from_indices(&[0, -1, 1, 2]).is_complete_permutation(3));
    assert!(!AlignmentRow::from_indices(&[0, -1, 2]).is_complete_permutation(3));
    assert!(!AlignmentRow::from_indices(&[0, 0, 1, 2]).is_complete_permutation(3));
    assert!(!AlignmentRow::from_indices(&[0, 1, 3]).is_complete_permutation(3));
    assert!(AlignmentRow::default().is_complete_permutation(0));
}

#[test]
fn test_expand_through() {
    let row = AlignmentRow::from_indices(&[0, -1, 1]);
    let through = AlignmentRow::from_indices(&[0, -1, 1, 2, -1]);
    assert_eq!(
        row.expand_through(&through).unwrap().to_indices(),
        vec![0, -1, -1, 1, -1]
    );

    let too_long = AlignmentRow::from_indices(&[0, 3]);
    assert!(matches!(
        row.expand_through(&too_long),
        Err(Error::ResidueIndexOutOfBounds {
            index: 3,
            length: 3
        })
    ));
}

#[test]
fn test_reindex_residues() {
    let seed = AlignmentRow::from_indices(&[0, 1, -1, 2]);
    let through = AlignmentRow::from_indices(&[-1, 0, 1, -1, 2]);
    assert_eq!(
        seed.reindex_residues(&through).to_indices(),
        vec![1, 2, -1, 4]
    );
}

#[test]
fn test_gapped_data() {
    let row = AlignmentRow::from_indices(&[1, -1, 0]);
    let data = array![[1.0, 2.0], [3.0, 4.0]];
    let gapped = row.gapped_data(data.view()).unwrap();

    assert_eq!(gapped.row(0).to_vec(), vec![3.0, 4.0]);
    assert!(gapped.row(1).iter().all(|value| value.is_nan()));
    assert_eq!(gapped.row(2).to_vec(), vec![1.0, 2.0]);
}

#[test]
fn test_pairwise_alignment() {
    let alignment = PairwiseAlignment::new(
        AlignmentRow::from_indices(&[0, 1, -1, 2]),
        AlignmentRow::from_indices(&[0, -1, 1, 2]),
        1.5,
    )
    .unwrap();

    assert_eq!(alignment.common_positions(), vec![(0, 0), (2, 2)]);
    assert_eq!(alignment.coverage(), 0.5);
    assert_eq!(alignment.swapped().common_positions(), vec![(0, 0), (2, 2)]);
    assert_eq!(alignment.swapped().first(), alignment.second());

    assert!(matches!(
        PairwiseAlignment::new(
            AlignmentRow::identity(2),
            AlignmentRow::identity(3),
            0.0
        ),
        Err(Error::RowLengthMismatch {
            first: 2,
            second: 3
        })
    ));
}

#[test]
fn test_common_positions_all_gaps() {
    let first = AlignmentRow::from_indices(&[0, -1]);
    let second = AlignmentRow::from_indices(&[-1, 0]);
    assert!(common_positions(&first, &second).is_empty());
}

#[test]
fn test_node_alignment_merge() {
    let a = NodeAlignment::leaf("a", 2);
    let b = NodeAlignment::leaf("b", 3);
    let merged = NodeAlignment::merge(
        &a,
        &AlignmentRow::from_indices(&[0, -1, 1]),
        &b,
        &AlignmentRow::from_indices(&[0, 1, 2]),
    )
    .unwrap();

    assert_eq!(merged.column_count(), 3);
    assert!(merged.is_uniform());
    assert!(!merged.has_all_gap_column());
    assert_eq!(merged.row("a").unwrap().to_indices(), vec![0, -1, 1]);
    assert_eq!(merged.leaf_names().collect::<Vec<_>>(), vec!["a", "b"]);

    let c = NodeAlignment::leaf("c", 1);
    let root = NodeAlignment::merge(
        &merged,
        &AlignmentRow::from_indices(&[0, 1, -1, 2]),
        &c,
        &AlignmentRow::from_indices(&[-1, -1, 0, -1]),
    )
    .unwrap();
    assert_eq!(root.row("a").unwrap().to_indices(), vec![0, -1, -1, 1]);
    assert_eq!(root.row("b").unwrap().to_indices(), vec![0, 1, -1, 2]);
    assert_eq!(root.row("c").unwrap().to_indices(), vec![-1, -1, 0, -1]);
    assert!(!root.has_all_gap_column());
}

#[test]
fn test_node_alignment_duplicate_leaf() {
    let a = NodeAlignment::leaf("a", 1);
    assert!(matches!(
        NodeAlignment::merge(&a, &AlignmentRow::identity(1), &a, &AlignmentRow::identity(1)),
        Err(Error::DuplicateStructureName(name)) if name == "a"
    ));
}

#[test]
fn test_multiple_alignment_from_strings() {
    let alignment =
        MultipleAlignment::from_aligned_strings([("x", "AC-D"), ("y", "-CED")]).unwrap();
    assert_eq!(alignment.column_count(), 4);
    assert_eq!(alignment.len(), 2);
    assert_eq!(
        alignment.row("y").unwrap().iter().collect::<Vec<_>>(),
        vec![
            AlignedResidue::Gap,
            AlignedResidue::Residue(0),
            AlignedResidue::Residue(1),
            AlignedResidue::Residue(2)
        ]
    );

    assert!(matches!(
        MultipleAlignment::from_aligned_strings([("x", "AC-D"), ("y", "CED")]),
        Err(Error::RowLengthMismatch {
            first: 4,
            second: 3
        })
    ));
}

use ndarray::{Array2, array};

use crate::error::Error;

use super::{GuideTree, Merge, neighbor_joining};

#[test]
fn test_three_leaves() {
    let distances = array![[0.0, 1.0, 9.0], [1.0, 0.0, 9.0], [9.0, 9.0, 0.0]];
    let joining = neighbor_joining(distances.view()).unwrap();
    assert_eq!(joining.rows, vec![[0, 3], [1, 3], [2, 3]]);
    assert_eq!(joining.branch_lengths, vec![0.5, 0.5, 4.25, 4.25]);

    let tree = GuideTree::build(distances.view()).unwrap();
    assert_eq!(
        tree.merges(),
        &[
            Merge {
                first: 0,
                second: 1,
                parent: Some(3)
            },
            Merge {
                first: 2,
                second: 3,
                parent: None
            }
        ]
    );
    assert_eq!(tree.branch_lengths(), &[0.5, 0.5, 4.25, 4.25]);
    assert_eq!(tree.to_rows(), joining.rows);
}

#[test]
fn test_additive_four_leaves() {
    // Tree ((0:1, 1:2):1, (2:3, 3:1)) has these path lengths.
    let distances = array![
        [0.0, 3.0, 5.0, 3.0],
        [3.0, 0.0, 6.0, 4.0],
        [5.0, 6.0, 0.0, 4.0],
        [3.0, 4.0, 4.0, 0.0],
    ];
    let joining = neighbor_joining(distances.view()).unwrap();

    assert_eq!(joining.rows.len(), 5);
    assert_eq!(joining.rows[0], [0, 4]);
    assert_eq!(joining.rows[1], [1, 4]);
    assert!((joining.branch_lengths[0] - 1.0).abs() < 1e-12);
    assert!((joining.branch_lengths[1] - 2.0).abs() < 1e-12);

    let tree = GuideTree::from_rows(&joining.rows, 4).unwrap();
    assert_eq!(tree.merges().len(), 3);
    assert_eq!(tree.merges()[2].parent, None);
}

#[test]
fn test_small_trees() {
    let tree = GuideTree::build(array![[0.0]].view()).unwrap();
    assert!(tree.merges().is_empty());
    assert_eq!(tree.leaf_count(), 1);

    let tree = GuideTree::build(array![[0.0, 2.0], [2.0, 0.0]].view()).unwrap();
    assert_eq!(
        tree.merges(),
        &[Merge {
            first: 0,
            second: 1,
            parent: None
        }]
    );
    assert_eq!(tree.branch_lengths(), &[1.0, 1.0]);

    assert!(matches!(
        GuideTree::build(Array2::zeros((0, 0)).view()),
        Err(Error::NoStructures)
    ));
}

#[test]
fn test_bad_matrices() {
    assert!(matches!(
        neighbor_joining(Array2::zeros((2, 3)).view()),
        Err(Error::NonSquareMatrix {
            rows: 2,
            columns: 3
        })
    ));
    assert!(matches!(
        neighbor_joining(array![[0.0, f64::NAN], [f64::NAN, 0.0]].view()),
        Err(Error::NonFiniteMatrixEntry { row: 0, column: 1 })
    ));
}

#[test]
fn test_malformed_rows() {
    assert!(matches!(
        GuideTree::from_rows(&[[0, 3], [1, 3]], 3),
        Err(Error::GuideTreeRowCount {
            leaves: 3,
            expected: 3,
            actual: 2
        })
    ));
    assert!(matches!(
        GuideTree::from_rows(&[[0, 3], [1, 4], [2, 3]], 3),
        Err(Error::GuideTreeParentMismatch {
            parent: 3,
            next_parent: 4,
            ..
        })
    ));
    assert!(matches!(
        GuideTree::from_rows(&[[0, 5], [1, 5], [2, 5]], 3),
        Err(Error::GuideTreeUnexpectedParent {
            merge: 0,
            expected: 3,
            actual: 5
        })
    ));
    assert!(matches!(
        GuideTree::from_rows(&[[0, 3], [3, 3], [1, 2]], 3),
        Err(Error::GuideTreeUnknownNode { merge: 0, node: 3 })
    ));
    assert!(matches!(
        GuideTree::from_rows(&[[0, 3], [1, 3], [0, 3]], 3),
        Err(Error::GuideTreeReusedNode { node: 0 })
    ));
    assert!(matches!(
        GuideTree::from_rows(&[[1, 1]], 2),
        Err(Error::GuideTreeSelfMerge(1))
    ));
}

#[test]
fn test_validate_unchecked_merges() {
    let distances = array![[0.0, 1.0, 9.0], [1.0, 0.0, 9.0], [9.0, 9.0, 0.0]];
    assert!(GuideTree::build(distances.view()).unwrap().validate().is_ok());

    let tree = GuideTree::from_merges_unchecked(
        2,
        vec![Merge {
            first: 0,
            second: 7,
            parent: None,
        }],
    );
    assert!(matches!(
        tree.validate(),
        Err(Error::GuideTreeUnknownNode { merge: 0, node: 7 })
    ));

    let tree = GuideTree::from_merges_unchecked(
        3,
        vec![
            Merge {
                first: 0,
                second: 1,
                parent: None,
            },
            Merge {
                first: 2,
                second: 3,
                parent: Some(3),
            },
        ],
    );
    assert!(matches!(
        tree.validate(),
        Err(Error::GuideTreeParentMismatch {
            parent: 1,
            next_parent: 3,
            ..
        })
    ));

    let tree = GuideTree::from_merges_unchecked(
        2,
        vec![Merge {
            first: 0,
            second: 1,
            parent: Some(2),
        }],
    );
    assert!(matches!(
        tree.validate(),
        Err(Error::GuideTreeRowCount {
            leaves: 2,
            expected: 1,
            actual: 2
        })
    ));
}

pub mod alignment;
pub mod config;
pub mod dtw;
pub mod error;
pub mod features;
pub mod guide_tree;
pub mod io;
pub mod multiple_alignment;
pub mod pairwise_matrix;
pub mod structure;
pub mod superposition;

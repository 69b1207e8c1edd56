use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An IO error occurred: {0}.")]
    Io(#[from] std::io::Error),

    #[error("A parsing error of kind '{kind:?}' occurred when the remaining input was '{input}'.")]
    Parser {
        input: String,
        kind: nom::error::ErrorKind,
    },

    #[error("Parsing was unsuccessful due to incomplete input: {0:?}.")]
    ParserIncomplete(nom::Needed),

    #[error("The parameter {name} must be finite and non-negative, but is {value}.")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("No structures were given.")]
    NoStructures,

    #[error("The structure name {0} was encountered twice.")]
    DuplicateStructureName(String),

    #[error("The structure name {0} is reserved for internal nodes of the guide tree.")]
    ReservedStructureName(String),

    #[error("Structure {name} has {actual} coordinate columns, but coordinates must be three-dimensional.")]
    CoordinateDimension { name: String, actual: usize },

    #[error(
        "Structure {name} has {coordinates} residues with coordinates, but its {kind} has length {actual}."
    )]
    ResidueCountMismatch {
        name: String,
        kind: &'static str,
        coordinates: usize,
        actual: usize,
    },

    #[error("Structure {0} has no sequence.")]
    MissingSequence(String),

    #[error("Structure {0} has no features, but feature alignment was requested.")]
    MissingFeatures(String),

    #[error("Structures {first} and {second} have features of different dimensions ({first_dimension} vs {second_dimension}).")]
    FeatureDimensionMismatch {
        first: String,
        second: String,
        first_dimension: usize,
        second_dimension: usize,
    },

    #[error("Signals of different dimensions cannot be aligned ({first} vs {second}).")]
    SignalDimensionMismatch { first: usize, second: usize },

    #[error("No structure named {0} is present in the working set.")]
    UnknownStructure(String),

    #[error("No seed alignment is given for structure {0}.")]
    MissingSeedAlignment(String),

    #[error(
        "The seed alignment of structure {name} contains {actual} residues, but the structure has {expected} residues."
    )]
    SeedLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("The seed alignments have different column counts ({first} vs {second}).")]
    SeedColumnCountMismatch { first: usize, second: usize },

    #[error("Aligned rows have different lengths ({first} vs {second}).")]
    RowLengthMismatch { first: usize, second: usize },

    #[error("The aligned row references residue {index}, but the sequence has length {length}.")]
    ResidueIndexOutOfBounds { index: usize, length: usize },

    #[error("Point sets for superimposition have different sizes ({fixed} vs {moving}).")]
    PointCountMismatch { fixed: usize, moving: usize },

    #[error("The distance matrix has shape {rows}x{columns}, but it must be square.")]
    NonSquareMatrix { rows: usize, columns: usize },

    #[error("The distance matrix has a non-finite entry at [{row}, {column}].")]
    NonFiniteMatrixEntry { row: usize, column: usize },

    #[error("The distance matrix has {actual} rows, but {expected} structures are aligned.")]
    MatrixSizeMismatch { expected: usize, actual: usize },

    #[error("The guide tree has {actual} rows, but {expected} rows are required for {leaves} leaves.")]
    GuideTreeRowCount {
        leaves: usize,
        expected: usize,
        actual: usize,
    },

    #[error("The guide tree rows {row} and {next_row} do not share a parent ({parent} vs {next_parent}).")]
    GuideTreeParentMismatch {
        row: usize,
        next_row: usize,
        parent: usize,
        next_parent: usize,
    },

    #[error("The guide tree creates node {actual} in merge {merge}, but node {expected} was expected.")]
    GuideTreeUnexpectedParent {
        merge: usize,
        expected: usize,
        actual: usize,
    },

    #[error("The guide tree references node {node} in merge {merge} before it exists.")]
    GuideTreeUnknownNode { merge: usize, node: usize },

    #[error("The guide tree uses node {node} as a child more than once.")]
    GuideTreeReusedNode { node: usize },

    #[error("The guide tree merges node {0} with itself.")]
    GuideTreeSelfMerge(usize),

    #[error("The feature column {feature} has {actual} values, but the structure has {expected} residues.")]
    FeatureColumnLength {
        feature: String,
        expected: usize,
        actual: usize,
    },

    #[error("The feature {0} was added twice.")]
    DuplicateFeature(String),

    #[error("Unknown feature name: {0}.")]
    UnknownFeature(String),

    #[error("The aligned fasta record {0} has no sequence.")]
    EmptyFastaRecord(String),
}

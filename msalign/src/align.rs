use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, anyhow, ensure};
use clap::{Parser, ValueEnum};
use lib_msalign::{
    config::MultipleAlignmentConfig,
    io::{read_aligned_fasta, write_aligned_fasta},
    multiple_alignment::MultipleAligner,
};
use log::{LevelFilter, debug, info, warn};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::align::{input::read_structure_file, report::AlignmentReport};

mod input;
mod report;

#[derive(Parser)]
pub struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// The toml file containing the structures to align.
    ///
    /// Each `[[structure]]` table has a `name`, `coordinates` as a list of points,
    /// and optionally a `sequence`, a dense `features` matrix, and sparse `dssp` feature records.
    #[clap(long, short = 'i')]
    input: PathBuf,

    /// An aligned fasta file with a seed alignment of the input structures.
    ///
    /// Required for coordinate alignment.
    #[clap(long, short = 's')]
    seed: Option<PathBuf>,

    /// A directory containing the configuration file `msalign.toml`.
    #[clap(long, short = 'c', default_value = "sample_msa_config")]
    configuration_directory: PathBuf,

    #[clap(long, default_value = "progressive")]
    alignment_method: AlignmentMethod,

    /// Compute fluctuation features from elastic network models with this many modes.
    ///
    /// This applies only to structures without a dense `features` matrix.
    #[clap(long)]
    normal_modes: Option<usize>,

    /// Build the RMSD matrix of coordinate alignment from the seed alignment instead of realigning each pair.
    ///
    /// Overrides the `realign_pairs` setting of the configuration file.
    #[clap(long)]
    no_realign_pairs: bool,

    /// The file to store the alignment in aligned fasta format.
    ///
    /// If not given, the alignment is printed to stdout.
    #[clap(long, short = 'o')]
    output: Option<PathBuf>,

    /// Wrap the aligned sequences after this many characters.
    #[clap(long)]
    line_width: Option<usize>,

    /// The file to store the guide tree, distance matrix and alignment statistics in toml format.
    #[clap(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlignmentMethod {
    Features,
    Coordinates,
    Progressive,
}

pub fn cli(cli: Cli) -> Result<()> {
    if let Err(error) = TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        // The logger was initialised before, e.g. by an earlier test.
        debug!("Logger not initialised: {error}");
    }

    let config = load_config(&cli)?;
    debug!("Using config {config:?}");

    info!("Loading structures from {:?}", cli.input);
    let structures = read_structure_file(&cli.input, cli.normal_modes)?;
    info!("Loaded {} structures", structures.len());

    let aligner = MultipleAligner::new(&structures, config)?;
    let result = match cli.alignment_method {
        AlignmentMethod::Features => {
            if cli.seed.is_some() {
                warn!("Ignoring seed alignment for feature alignment");
            }
            aligner.align_features()?
        }
        AlignmentMethod::Coordinates => {
            let seed = cli
                .seed
                .as_ref()
                .ok_or_else(|| anyhow!("Coordinate alignment requires a seed alignment"))?;
            info!("Loading seed alignment from {seed:?}");
            let seed = read_aligned_fasta(BufReader::new(
                File::open(seed).with_context(|| format!("Opening {seed:?}"))?,
            ))?;
            ensure!(
                seed.len() == structures.len(),
                "The seed alignment has {} rows, but there are {} structures",
                seed.len(),
                structures.len()
            );
            aligner.align_coordinates(&seed)?
        }
        AlignmentMethod::Progressive => {
            if cli.seed.is_some() {
                warn!("Ignoring seed alignment, progressive alignment computes its own seed");
            }
            aligner.align_progressive()?
        }
    };

    info!(
        "Alignment has {} columns, {} of them without gaps",
        result.alignment().column_count(),
        result.core_column_count()
    );

    let aligned = result.alignment().aligned_strings(&structures)?;
    let records = aligned
        .iter()
        .map(|(name, sequence)| (name.as_str(), sequence.as_str()));
    if let Some(output) = &cli.output {
        info!("Writing alignment to {output:?}");
        let output = BufWriter::new(File::create(output)?);
        write_aligned_fasta(output, records, cli.line_width)?;
    } else {
        write_aligned_fasta(std::io::stdout().lock(), records, cli.line_width)?;
    }

    if let Some(report_path) = &cli.report {
        info!("Writing report to {report_path:?}");
        let report = AlignmentReport::new(cli.alignment_method, &structures, &result)?;
        let mut output = BufWriter::new(File::create(report_path)?);
        write!(output, "{}", toml::to_string(&report)?)?;
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<MultipleAlignmentConfig> {
    let mut config_path = cli.configuration_directory.clone();
    config_path.push("msalign.toml");

    let mut config = if config_path.exists() {
        debug!("Loading config from {config_path:?}");
        let mut config_file = BufReader::new(File::open(&config_path)?);
        let mut config = String::new();
        config_file.read_to_string(&mut config)?;
        toml::from_str(&config).with_context(|| format!("Parsing {config_path:?}"))?
    } else {
        warn!("Config file {config_path:?} not found, using defaults");
        MultipleAlignmentConfig::default()
    };

    if cli.no_realign_pairs {
        config.realign_pairs = false;
    }
    config.verify()?;

    Ok(config)
}

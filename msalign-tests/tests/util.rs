use std::{env, fs::File, io::BufReader, path::PathBuf};

use anyhow::{Result, anyhow};
use clap::Parser;
use lib_msalign::{alignment::multiple::MultipleAlignment, io::read_aligned_fasta};
use msalign::align;

pub fn run_in_repo_root(args: &str) -> Result<()> {
    // The working directory of tests is this crate, so simulate a call from the repo root.
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or(anyhow!("No parent directory"))?
        .to_path_buf();
    env::set_current_dir(repo_root)?;

    if args.starts_with("align ") {
        let args = align::Cli::parse_from(args.split_whitespace());
        align::cli(args)?;
    } else {
        return Err(anyhow!("Unknown subcommand in {args:?}"));
    }

    Ok(())
}

/// A path in the temporary directory that is unique to the calling test.
pub fn output_path(name: &str) -> Result<String> {
    let path = env::temp_dir().join(format!("msalign-tests-{}-{name}", std::process::id()));
    path.into_os_string()
        .into_string()
        .map_err(|path| anyhow!("Non-unicode temporary path {path:?}"))
}

pub fn read_output(path: &str) -> Result<MultipleAlignment> {
    Ok(read_aligned_fasta(BufReader::new(File::open(path)?))?)
}

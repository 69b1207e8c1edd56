//! Reading and writing aligned fasta files.

use std::io::{Read, Write};

use itertools::Itertools;
use log::debug;
use nom::{
    IResult, Parser,
    bytes::complete::{take_till, take_till1},
    character::complete::{char, satisfy},
    combinator::not,
    multi::many0,
};

use crate::{
    alignment::multiple::MultipleAlignment,
    error::{Error, Result},
};

#[cfg(test)]
mod tests;

/// Parse aligned fasta records into pairs of name and aligned sequence.
///
/// The name of a record is the first word of its header line.
/// Sequences may be wrapped over multiple lines, and all sequences must have the same length.
pub fn parse_aligned_fasta(input: &str) -> Result<Vec<(String, String)>> {
    let (input, records) = many0(parse_record)
        .parse(input)
        .map_err(translate_nom_error)?;
    let input = skip_any_whitespace(input).map_err(translate_nom_error)?;
    if !input.is_empty() {
        return Err(Error::Parser {
            input: input.to_string(),
            kind: nom::error::ErrorKind::Eof,
        });
    }

    let mut expected_length = None;
    for (name, sequence) in &records {
        let length = sequence.chars().count();
        if length == 0 {
            return Err(Error::EmptyFastaRecord(name.clone()));
        }

        match expected_length {
            None => expected_length = Some(length),
            Some(expected) if expected != length => {
                return Err(Error::RowLengthMismatch {
                    first: expected,
                    second: length,
                });
            }
            Some(_) => {}
        }
    }

    debug!(
        "Parsed {} aligned fasta records with {} columns",
        records.len(),
        expected_length.unwrap_or(0)
    );
    Ok(records)
}

/// Read an aligned fasta file into a multiple alignment.
pub fn read_aligned_fasta(mut reader: impl Read) -> Result<MultipleAlignment> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    let records = parse_aligned_fasta(&input)?;
    MultipleAlignment::from_aligned_strings(
        records
            .iter()
            .map(|(name, sequence)| (name.as_str(), sequence.as_str())),
    )
}

/// Write records of name and aligned sequence as fasta.
///
/// If `line_width` is given, sequences are wrapped after that many characters.
pub fn write_aligned_fasta<'record>(
    mut writer: impl Write,
    records: impl IntoIterator<Item = (&'record str, &'record str)>,
    line_width: Option<usize>,
) -> Result<()> {
    for (name, sequence) in records {
        writeln!(writer, ">{name}")?;
        match line_width {
            Some(line_width) if line_width > 0 => {
                for line in &sequence.chars().chunks(line_width) {
                    writeln!(writer, "{}", line.collect::<String>())?;
                }
            }
            _ => writeln!(writer, "{sequence}")?,
        }
    }
    Ok(())
}

fn parse_record(input: &str) -> IResult<&str, (String, String)> {
    let input = skip_any_whitespace(input)?;
    let input = char('>')(input)?.0;
    let (input, header) = take_till(is_any_line_break)(input)?;
    let name = header.split_whitespace().next().unwrap_or_default();
    if name.is_empty() {
        return Err(nom::Err::Failure(nom::error::Error {
            input,
            code: nom::error::ErrorKind::Verify,
        }));
    }

    let (input, lines) = many0(parse_sequence_line).parse(input)?;
    let sequence = lines
        .into_iter()
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();

    Ok((input, (name.to_string(), sequence)))
}

fn parse_sequence_line(input: &str) -> IResult<&str, &str> {
    let input = skip_any_whitespace(input)?;
    let input = not(char('>'))(input)?.0;
    take_till1(is_any_line_break)(input)
}

fn skip_any_whitespace(input: &str) -> std::result::Result<&str, nom::Err<nom::error::Error<&str>>> {
    many0(satisfy(char::is_whitespace))
        .parse(input)
        .map(|(input, _)| input)
}

fn is_any_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

pub fn translate_nom_error(error: nom::Err<nom::error::Error<&str>>) -> Error {
    match error {
        nom::Err::Incomplete(needed) => Error::ParserIncomplete(needed),
        nom::Err::Error(error) | nom::Err::Failure(error) => Error::Parser {
            input: error.input.to_string(),
            kind: error.code,
        },
    }
}

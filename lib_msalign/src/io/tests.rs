use crate::error::Error;

use super::{parse_aligned_fasta, read_aligned_fasta, write_aligned_fasta};

#[test]
fn test_parse_wrapped_records() {
    let input = "\n>1abc_A chain A\nMK-V\nL-\n\n>2xyz\r\n-MKV\r\nLL\r\n";
    let records = parse_aligned_fasta(input).unwrap();

    assert_eq!(
        records,
        vec![
            ("1abc_A".to_string(), "MK-VL-".to_string()),
            ("2xyz".to_string(), "-MKVLL".to_string()),
        ]
    );
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        parse_aligned_fasta(">a\nMKV\n>b\nMK\n"),
        Err(Error::RowLengthMismatch {
            first: 3,
            second: 2
        })
    ));
    assert!(matches!(
        parse_aligned_fasta(">a\n>b\nMKV\n"),
        Err(Error::EmptyFastaRecord(name)) if name == "a"
    ));
    assert!(matches!(
        parse_aligned_fasta("MKV\n>a\nMKV\n"),
        Err(Error::Parser { .. })
    ));
    assert!(matches!(
        parse_aligned_fasta(">\nMKV\n"),
        Err(Error::Parser { .. })
    ));
    assert_eq!(parse_aligned_fasta("  \n").unwrap(), Vec::new());
}

#[test]
fn test_read_alignment() {
    let alignment = read_aligned_fasta(">b\n-MK\n>a\nMK-\n".as_bytes()).unwrap();

    assert_eq!(alignment.column_count(), 3);
    assert_eq!(alignment.row("a").unwrap().to_indices(), vec![0, 1, -1]);
    assert_eq!(alignment.row("b").unwrap().to_indices(), vec![-1, 0, 1]);

    assert!(matches!(
        read_aligned_fasta(">a\nMK\n>a\nMK\n".as_bytes()),
        Err(Error::DuplicateStructureName(name)) if name == "a"
    ));
}

#[test]
fn test_write_wrapped() {
    let mut output = Vec::new();
    write_aligned_fasta(&mut output, [("a", "MK-VL"), ("b", "-MKVL")], Some(2)).unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        ">a\nMK\n-V\nL\n>b\n-M\nKV\nL\n"
    );

    let mut output = Vec::new();
    write_aligned_fasta(&mut output, [("a", "MK-VL")], None).unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), ">a\nMK-VL\n");
}

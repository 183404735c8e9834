// nmlrs/tests/roundtrip_tests.rs

//! Rendering a parsed namelist and parsing it again gives the same tree.

use nmlrs::error::Result;
use nmlrs::{reads, Namelist, WriteOptions};

fn assert_roundtrip(text: &str, options: &WriteOptions) -> Result<Namelist> {
    let parsed = reads(text)?;
    let rendered = parsed.to_fortran_string(options);
    let reparsed = reads(&rendered)?;
    assert_eq!(reparsed, parsed, "rendered text:\n{}", rendered);
    Ok(parsed)
}

#[test]
fn test_fixture_roundtrip() -> Result<()> {
    let text = std::fs::read_to_string("tests/fixtures/sample.nml")?;
    assert_roundtrip(&text, &WriteOptions::default())?;
    Ok(())
}

#[test]
fn test_scalars_and_strings() -> Result<()> {
    let text = "&a\n x(0:2) = 1, 2, 3\n y = 'it''s', \"q\"\n c = (1.0, -2.5)\n f = .false.\n/\n";
    assert_roundtrip(text, &WriteOptions::default())?;
    Ok(())
}

#[test]
fn test_multidimensional_arrays() -> Result<()> {
    let text = "&m\n a(1:2,1) = 1, 2\n a(1:2,2) = 3, 4\n/\n";
    assert_roundtrip(text, &WriteOptions::default())?;
    Ok(())
}

#[test]
fn test_derived_types() -> Result<()> {
    let text = "&d\n p%x = 1\n p%y = 2.5\n t(1)%v = 1\n t(2)%v = 2\n/\n";
    assert_roundtrip(text, &WriteOptions::default())?;
    Ok(())
}

#[test]
fn test_duplicates() -> Result<()> {
    let nml = assert_roundtrip("&r id = 1 /\n&r id = 2 /\n&k x = 1\n x = 2 /", &WriteOptions::default())?;
    assert_eq!(nml.get_groups("r").len(), 2);
    Ok(())
}

#[test]
fn test_sparse_values() -> Result<()> {
    assert_roundtrip("&n\n x = 1, , 3\n y(2) = 5\n/\n", &WriteOptions::default())?;
    Ok(())
}

#[test]
fn test_presentation_options() -> Result<()> {
    let text = "&opts\n x = 1, 1, 1, 2\n name = 'value'\n/\n";
    let options = WriteOptions::default()
        .with_repeat_counter(true)
        .with_uppercase(true)
        .with_end_comma(true)
        .with_indent("\t");
    assert_roundtrip(text, &options)?;
    Ok(())
}

#[test]
fn test_long_lists_wrap() -> Result<()> {
    let values: Vec<String> = (1..=60).map(|i| (i * 1000).to_string()).collect();
    let text = format!("&w\n x = {}\n/\n", values.join(", "));
    let parsed = assert_roundtrip(&text, &WriteOptions::default())?;

    let rendered = parsed.to_fortran_string(&WriteOptions::default());
    assert!(rendered.lines().count() > 3);
    Ok(())
}

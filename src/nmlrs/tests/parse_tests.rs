// nmlrs/tests/parse_tests.rs

use nmlrs::error::Result;
use nmlrs::namelist::KeyPath;
use nmlrs::{reads, reads_with, NmlError, ParserConfig, Scalar, Value};

fn scalars(value: &Value) -> Vec<Scalar> {
    value
        .scalars()
        .expect("one-dimensional value")
        .into_iter()
        .cloned()
        .collect()
}

fn path(text: &str) -> KeyPath {
    text.parse().expect("valid key path")
}

#[test]
fn test_fixture_parses() -> Result<()> {
    let nml = nmlrs::read("tests/fixtures/sample.nml")?;
    assert_eq!(nml.group_names(), vec!["CORE", "OPT", "SCHOUT"]);

    let core = nml.get_group("core").expect("core group");
    assert_eq!(core.get_i64("ibtp"), Some(1));
    assert_eq!(core.get_f64("dt"), Some(100.0));

    let opt = nml.get_group("opt").expect("opt group");
    assert_eq!(opt.get_bool("iwbl"), Some(false));
    assert_eq!(opt.get_str("station_out"), Some("fort.18"));
    assert_eq!(opt.start_index("tr_nudge"), Some(&vec![Some(1)]));
    assert_eq!(
        scalars(opt.get("inu_tr").expect("inu_tr")),
        vec![Scalar::Integer(0), Scalar::Integer(0)]
    );

    let schout = nml.get_group("schout").expect("schout group");
    assert_eq!(
        scalars(schout.get("iof_hydro").expect("iof_hydro")),
        vec![Scalar::Integer(1), Scalar::Unset, Scalar::Integer(1)]
    );
    Ok(())
}

#[test]
fn test_type_inference_order() -> Result<()> {
    let nml = reads("&t a = 1 b = 1.0 c = (1.0, 2.0) d = .true. e = T f = '1' g = abc /")?;
    let t = nml.get_group("t").expect("group t");
    let expected = [
        ("a", Scalar::Integer(1)),
        ("b", Scalar::Real(1.0)),
        ("c", Scalar::Complex(1.0, 2.0)),
        ("d", Scalar::Logical(true)),
        ("e", Scalar::Logical(true)),
        ("f", Scalar::Character("1".to_string())),
        ("g", Scalar::Character("abc".to_string())),
    ];
    for (name, scalar) in expected {
        assert_eq!(t.get_scalar(name), Some(&scalar), "variable {}", name);
    }
    Ok(())
}

#[test]
fn test_repeat_expansion() -> Result<()> {
    let nml = reads("&r x = 5*1\n y = 3*\n/")?;
    let r = nml.get_group("r").expect("group r");
    assert_eq!(scalars(r.get("x").expect("x")), vec![Scalar::Integer(1); 5]);
    assert_eq!(scalars(r.get("y").expect("y")), vec![Scalar::Unset; 3]);
    Ok(())
}

#[test]
fn test_index_union() -> Result<()> {
    let nml = reads("&g\n x(3:4) = 1.0, 1.1\n x(6:7) = 1.2, 1.3\n/")?;
    let g = nml.get_group("g").expect("group g");
    assert_eq!(
        scalars(g.get("x").expect("x")),
        vec![
            Scalar::Real(1.0),
            Scalar::Real(1.1),
            Scalar::Unset,
            Scalar::Real(1.2),
            Scalar::Real(1.3),
        ]
    );
    assert_eq!(g.start_index("x"), Some(&vec![Some(3)]));
    assert_eq!(nml.get_path(&path("g.x(6)"))?, &Value::Scalar(Scalar::Real(1.2)));
    Ok(())
}

#[test]
fn test_global_start_index_override() -> Result<()> {
    let config = ParserConfig::default().with_global_start_index(Some(1));
    let nml = reads_with("&g x(3:5) = 3, 4, 5 /", &config)?;
    let g = nml.get_group("g").expect("group g");
    assert_eq!(
        scalars(g.get("x").expect("x")),
        vec![
            Scalar::Unset,
            Scalar::Unset,
            Scalar::Integer(3),
            Scalar::Integer(4),
            Scalar::Integer(5),
        ]
    );
    Ok(())
}

#[test]
fn test_duplicate_keys_kept_in_order() -> Result<()> {
    let nml = reads("&g\n x = 1\n x = 2\n/")?;
    let x = nml.get_path(&path("g.x"))?;
    let members: Vec<&Value> = x.as_cogroup().expect("cogroup").values().collect();
    assert_eq!(members, vec![&Value::from(1i64), &Value::from(2i64)]);
    assert_eq!(nml.get_path(&path("g.x[1]"))?, &Value::from(2i64));
    Ok(())
}

#[test]
fn test_duplicate_groups() -> Result<()> {
    let nml = reads("&run id = 1 /\n&run id = 2 /\n&RUN id = 3 /")?;
    let ids: Vec<Option<i64>> = nml
        .get_groups("run")
        .iter()
        .map(|g| g.get_i64("id"))
        .collect();
    assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(nml.get_path(&path("run[2].id"))?, &Value::from(3i64));
    assert!(matches!(
        nml.get_path(&path("run.id")),
        Err(NmlError::InvalidPath { .. })
    ));
    Ok(())
}

#[test]
fn test_case_insensitive_keys() -> Result<()> {
    let nml = reads("&g\n steps = 1\n STEPS = 2\n Steps = 3\n/")?;
    let g = nml.get_group("G").expect("group g");
    assert_eq!(g.keys().collect::<Vec<_>>(), vec!["steps"]);
    assert_eq!(g.get("STEPS").map(|v| v.members().len()), Some(3));

    let out = nml.to_fortran_string(&Default::default());
    assert!(out.contains("steps = 1"));
    assert!(!out.contains("STEPS"));
    Ok(())
}

#[test]
fn test_unterminated_string_before_unterminated_group() {
    let err = reads("&cfg\n x = 'unterminated").unwrap_err();
    assert!(matches!(err, NmlError::UnterminatedString { line: 2, .. }));

    let err = reads("&cfg\n x = 1\n").unwrap_err();
    assert!(matches!(err, NmlError::UnterminatedGroup { ref group, .. } if group == "cfg"));
}

#[test]
fn test_syntax_error_position() {
    let err = reads("&g\n x = 1\n = 2\n/").unwrap_err();
    assert_eq!(err.category(), "syntax");
    let position = err.position().expect("syntax errors carry a position");
    assert_eq!((position.line, position.column), (3, 2));
}

#[test]
fn test_too_many_values_for_range() {
    let err = reads("&g x(1:2) = 1, 2, 3 /").unwrap_err();
    assert!(err.is_parse_error());
}

#[test]
fn test_derived_type_arrays() -> Result<()> {
    let nml = reads("&g\n t(1)%a = 1\n t(2)%a = 2\n t(2)%b = 'x'\n/")?;
    assert_eq!(nml.get_path(&path("g.t(2)%b"))?, &Value::from("x"));
    assert_eq!(nml.get_path(&path("g.t(1)%a"))?, &Value::from(1i64));
    Ok(())
}

#[test]
fn test_group_header_inside_open_group() {
    let err = reads("&g\n x = 1\n&h\n y = 2\n/\n").unwrap_err();
    assert!(matches!(err, NmlError::Syntax { .. }));
    let position = err.position().expect("syntax errors carry a position");
    assert_eq!((position.line, position.column), (3, 1));
}

#[test]
fn test_extreme_indices() -> Result<()> {
    let nml = reads("&g x(9223372036854775807) = 1 /")?;
    assert_eq!(
        nml.get_path(&path("g.x(9223372036854775807)"))?,
        &Value::from(1i64)
    );

    let err = reads("&g x(-9223372036854775808:9223372036854775807) = 1 /").unwrap_err();
    assert!(err.is_parse_error() || err.category() == "index");
    Ok(())
}

#[test]
fn test_row_major_fill_order() -> Result<()> {
    let config = ParserConfig::default().with_row_major(true);
    let nml = reads_with("&g\n a(1:2,1:2) = 1, 2, 3, 4\n/\n", &config)?;
    assert_eq!(nml.get_path(&path("g.a(1,2)"))?, &Value::from(2i64));
    assert_eq!(nml.get_path(&path("g.a(2,1)"))?, &Value::from(3i64));

    let rendered = nml.to_fortran_string(&nmlrs::WriteOptions::default());
    assert_eq!(reads_with(&rendered, &config)?, nml);
    assert_eq!(reads(&rendered)?, nml);
    Ok(())
}

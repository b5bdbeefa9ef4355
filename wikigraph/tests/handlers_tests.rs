use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use wikigraph::handlers::*;

#[test]
fn test_parse_record_line_valid() {
    let record = parse_record_line(r#"{"name":"A","links":["B"],"redirects":[]}"#).unwrap();
    assert_eq!(record.name, "A");
    assert_eq!(record.links, vec!["B"]);
    assert!(record.redirects.is_empty());
}

#[test]
fn test_parse_record_line_missing_fields_default() {
    let record = parse_record_line(r#"{"name":"A"}"#).unwrap();
    assert_eq!(record.name, "A");
    assert!(record.links.is_empty());
    assert!(record.redirects.is_empty());
}

#[test]
fn test_parse_record_line_blank() {
    assert_eq!(parse_record_line(""), None);
    assert_eq!(parse_record_line("   "), None);
}

#[test]
fn test_parse_record_line_malformed() {
    assert_eq!(parse_record_line("not json at all"), None);
}

#[test]
fn test_load_records_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{"name":"A","links":["B","C"],"redirects":[]}}"#)?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, r#"{{"name":"B","links":[],"redirects":["A"]}}"#)?;

    let path = PathBuf::from(temp_file.path());
    let records = load_records_from_file(&path)?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "A");
    assert_eq!(records[0].links, vec!["B", "C"]);
    assert_eq!(records[1].redirects, vec!["A"]);

    Ok(())
}

#[test]
fn test_load_records_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_records_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid records"));
}

#[test]
fn test_expand_store_path_passthrough() {
    let path = expand_store_path("/tmp/graph.db");
    assert_eq!(path, PathBuf::from("/tmp/graph.db"));
}

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("Failed to read records file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in '{path}' at line {line}: {source}")]
    Json {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A record together with where it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based index among the file's records
    pub position: usize,
    /// Source line, known only for JSON Lines input
    pub line: Option<usize>,
    pub value: Value,
}

impl Record {
    /// `record #3 (line 5)`, or `record #3` when the line is unknown
    pub fn label(&self) -> String {
        match self.line {
            Some(line) => format!("record #{} (line {})", self.position, line),
            None => format!("record #{}", self.position),
        }
    }
}

/// Load records from a JSON array or a JSON Lines file
pub fn load_records(path: &Path) -> Result<Vec<Record>, RecordsError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| RecordsError::Read {
        path: path_display.clone(),
        source,
    })?;
    parse_records(&raw).map_err(|(line, source)| RecordsError::Json {
        path: path_display,
        line,
        source,
    })
}

fn parse_records(raw: &str) -> Result<Vec<Record>, (usize, serde_json::Error)> {
    if raw.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(raw).map_err(|e| (e.line(), e))?;
        return Ok(values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Record {
                position: idx + 1,
                line: None,
                value,
            })
            .collect());
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .enumerate()
        .map(|(position, (idx, line))| {
            serde_json::from_str(line)
                .map(|value| Record {
                    position: position + 1,
                    line: Some(idx + 1),
                    value,
                })
                .map_err(|e| (idx + 1, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_lines_skips_blank_lines() {
        let records = parse_records("{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].position, 2);
        assert_eq!(records[1].line, Some(3));
        assert_eq!(records[1].label(), "record #2 (line 3)");
        assert_eq!(records[1].value, json!({"a": 2}));
    }

    #[test]
    fn test_json_array_records_have_positions_not_lines() {
        let records = parse_records(" [{\"a\": 1}, {\"a\": 2}]").unwrap();
        assert_eq!(records[1].position, 2);
        assert_eq!(records[1].line, None);
        assert_eq!(records[1].label(), "record #2");
    }

    #[test]
    fn test_invalid_line_reports_position() {
        let (line, _) = parse_records("{\"a\": 1}\n{oops}\n").unwrap_err();
        assert_eq!(line, 2);
    }
}

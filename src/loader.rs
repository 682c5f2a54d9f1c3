//! Telemetry dataset loading
//!
//! Reads one static batch from a configured location. Supported sources:
//! - CSV with a header row
//! - JSON array of objects
//! - Newline-delimited JSON objects
//!
//! The path is handed to the loader at construction time; nothing here reads
//! global state, so tests can parse in-memory fixtures with [`parse_csv`] and
//! [`parse_json`] directly.

use crate::dataset::{Dataset, Value};
use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Result type for loading operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// On-disk telemetry format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Decide from the file extension, then from content
    #[default]
    Auto,
    Csv,
    /// JSON array, falling back to newline-delimited records
    Json,
    Ndjson,
}

impl DataFormat {
    /// Resolve `Auto` for a concrete path and its content
    pub fn detect(path: &Path, content: &str) -> DataFormat {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => DataFormat::Csv,
            Some("json") => DataFormat::Json,
            Some("jsonl") | Some("ndjson") => DataFormat::Ndjson,
            _ => match content.trim_start().chars().next() {
                Some('[') | Some('{') => DataFormat::Json,
                _ => DataFormat::Csv,
            },
        }
    }
}

/// Where and how to load telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: DataFormat,
}

impl LoaderConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: DataFormat::Auto,
        }
    }

    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }
}

/// Loads a fresh [`Dataset`] snapshot on every call
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    config: LoaderConfig,
}

impl DatasetLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read and parse the configured telemetry source
    ///
    /// # Errors
    /// [`LoadError::NotFound`] if the file does not exist, otherwise I/O and
    /// parse failures. A header-only CSV or an empty JSON array is a valid,
    /// empty dataset.
    pub fn load(&self) -> Result<Dataset> {
        let path = &self.config.path;
        if !path.exists() {
            return Err(LoadError::NotFound(path.clone()));
        }

        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Err(LoadError::Empty(path.clone()));
        }

        let format = match self.config.format {
            DataFormat::Auto => DataFormat::detect(path, &content),
            explicit => explicit,
        };

        let dataset = match format {
            DataFormat::Csv => parse_csv(content.as_bytes())?,
            DataFormat::Json | DataFormat::Auto => parse_json(&content)?,
            DataFormat::Ndjson => parse_ndjson(&content)?,
        };

        tracing::debug!(
            "Loaded {} telemetry records ({} fields) from {} as {:?}",
            dataset.len(),
            dataset.fields().len(),
            path.display(),
            format
        );
        Ok(dataset)
    }
}

/// Parse CSV telemetry; the first row names the fields
///
/// Empty cells become [`Value::Null`]; everything else stays text until
/// coercion. Short rows are padded, long rows truncated.
pub fn parse_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let fields: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut dataset = Dataset::new(fields);

    for record in rdr.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|cell| {
                if cell.trim().is_empty() {
                    Value::Null
                } else {
                    Value::Text(cell.to_string())
                }
            })
            .collect();
        dataset.push_row(row);
    }

    Ok(dataset)
}

/// Parse JSON telemetry: an array of records, else newline-delimited records
pub fn parse_json(content: &str) -> Result<Dataset> {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(serde_json::Value::Array(items)) => records_to_dataset(items),
        Ok(single @ serde_json::Value::Object(_)) => records_to_dataset(vec![single]),
        Ok(_) => Err(LoadError::UnsupportedRecord { record: 1 }),
        Err(e) => {
            tracing::debug!("Not a JSON document ({}), trying newline-delimited records", e);
            parse_ndjson(content)
        }
    }
}

/// Parse newline-delimited JSON records; blank lines are skipped
pub fn parse_ndjson(content: &str) -> Result<Dataset> {
    let items = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    records_to_dataset(items)
}

/// Build a rectangular table from JSON objects
///
/// The header is the union of keys in first-seen order; keys a record lacks
/// are null in that row.
fn records_to_dataset(items: Vec<serde_json::Value>) -> Result<Dataset> {
    let mut fields: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (i, item) in items.iter().enumerate() {
        let object = item
            .as_object()
            .ok_or(LoadError::UnsupportedRecord { record: i + 1 })?;
        for key in object.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), fields.len());
                fields.push(key.clone());
            }
        }
    }

    let width = fields.len();
    let mut dataset = Dataset::new(fields);
    for item in &items {
        let mut row = vec![Value::Null; width];
        if let Some(object) = item.as_object() {
            for (key, value) in object {
                if let Some(&pos) = positions.get(key) {
                    row[pos] = Value::from(value);
                }
            }
        }
        dataset.push_row(row);
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_csv_header_and_cells() {
        let csv = "region,latency_ms,uptime\nEU,120,0.99\nUS,,1\n";
        let ds = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(ds.fields(), &["region", "latency_ms", "uptime"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0][0], Value::Text("EU".to_string()));
        assert_eq!(ds.rows()[1][1], Value::Null);
    }

    #[test]
    fn test_parse_csv_ragged_rows() {
        let csv = "region,latency_ms,uptime\nEU,120\nUS,80,1,extra\n";
        let ds = parse_csv(csv.as_bytes()).unwrap();
        assert!(ds.rows().iter().all(|r| r.len() == 3));
        assert_eq!(ds.rows()[0][2], Value::Null);
    }

    #[test]
    fn test_parse_csv_header_only() {
        let ds = parse_csv("region,latency_ms\n".as_bytes()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.fields().len(), 2);
    }

    #[test]
    fn test_parse_json_array() {
        let json = r#"[{"region":"EU","latency_ms":120,"uptime":0.99},
                       {"region":"US","latency_ms":80}]"#;
        let ds = parse_json(json).unwrap();

        assert_eq!(ds.fields(), &["region", "latency_ms", "uptime"]);
        assert_eq!(ds.rows()[0][1], Value::Number(120.0));
        assert_eq!(ds.rows()[1][2], Value::Null);
    }

    #[test]
    fn test_parse_json_preserves_key_order() {
        let json = r#"[{"zone":"EU","ms":1,"region_name":"eu-west"}]"#;
        let ds = parse_json(json).unwrap();
        assert_eq!(ds.fields(), &["zone", "ms", "region_name"]);
    }

    #[test]
    fn test_parse_json_falls_back_to_ndjson() {
        let ndjson = "{\"region\":\"EU\",\"latency_ms\":120}\n\n{\"region\":\"US\",\"latency_ms\":80}\n";
        let ds = parse_json(ndjson).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_parse_json_union_of_keys() {
        let ndjson = "{\"region\":\"EU\"}\n{\"latency_ms\":80,\"region\":\"US\"}\n";
        let ds = parse_ndjson(ndjson).unwrap();
        assert_eq!(ds.fields(), &["region", "latency_ms"]);
        assert_eq!(ds.rows()[0][1], Value::Null);
        assert_eq!(ds.rows()[1][0], Value::Text("US".to_string()));
    }

    #[test]
    fn test_parse_json_rejects_non_objects() {
        let result = parse_json("[1, 2, 3]");
        assert!(matches!(
            result,
            Err(LoadError::UnsupportedRecord { record: 1 })
        ));
    }

    #[test]
    fn test_parse_ndjson_bad_line() {
        let result = parse_ndjson("{\"region\":\"EU\"}\nnot json\n");
        assert!(matches!(result, Err(LoadError::Json(_))));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(DataFormat::detect(Path::new("t.csv"), "["), DataFormat::Csv);
        assert_eq!(DataFormat::detect(Path::new("t.JSON"), ""), DataFormat::Json);
        assert_eq!(DataFormat::detect(Path::new("t.jsonl"), ""), DataFormat::Ndjson);
        assert_eq!(DataFormat::detect(Path::new("t.dat"), "  [{}]"), DataFormat::Json);
        assert_eq!(DataFormat::detect(Path::new("t"), "region,ms"), DataFormat::Csv);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = DatasetLoader::new(LoaderConfig::new("/nonexistent/telemetry.csv"));
        assert!(matches!(loader.load(), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let loader = DatasetLoader::new(LoaderConfig::new(file.path()));
        assert!(matches!(loader.load(), Err(LoadError::Empty(_))));
    }

    #[test]
    fn test_load_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "region,latency_ms").unwrap();
        writeln!(file, "EU,120").unwrap();
        file.flush().unwrap();

        let ds = DatasetLoader::new(LoaderConfig::new(file.path()))
            .load()
            .unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_load_explicit_format_overrides_extension() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "{{\"region\":\"EU\",\"latency_ms\":120}}").unwrap();
        file.flush().unwrap();

        let config = LoaderConfig::new(file.path()).with_format(DataFormat::Ndjson);
        let ds = DatasetLoader::new(config).load().unwrap();
        assert_eq!(ds.fields(), &["region", "latency_ms"]);
    }
}

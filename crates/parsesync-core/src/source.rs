//! Local schema files
//!
//! A local schema is either one JSON file or a directory of JSON files. A file
//! holds an array of classes, a single class, or a `{"results": [...]}`
//! listing as returned by the service.

use crate::prefix::PREFIX_PLACEHOLDER;
use crate::schema::{ClassSchema, FieldType, SchemaSet};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Errors reading, validating or writing schema files
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Schema path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid schema: {0}")]
    Invalid(String),
}

fn class_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^_?[A-Za-z][A-Za-z0-9_]*$").expect("class name pattern is valid")
    })
}

/// Load and validate the local schema at `path`
pub fn load_local_schema(path: &Path) -> Result<SchemaSet, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let set = if path.is_dir() {
        let mut files = schema_files(path)?;
        files.sort();

        let mut set = SchemaSet::new();
        for file in files {
            for class in read_schema_file(&file)? {
                set.push(class);
            }
        }
        set
    } else {
        read_schema_file(path)?
    };

    validate_schema_set(&set)?;
    Ok(set)
}

/// Every `*.json` file under `dir`, following symlinks
///
/// An entry that cannot be read fails the whole load.
fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| SourceError::Io {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_schema_file(path: &Path) -> Result<SchemaSet, SourceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema_document(&contents).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse one schema document in any of the accepted shapes
pub fn parse_schema_document(contents: &str) -> Result<SchemaSet, serde_json::Error> {
    let mut document: Value = serde_json::from_str(contents)?;

    if let Some(results) = document.get_mut("results").filter(|r| r.is_array()) {
        let results = results.take();
        return serde_json::from_value(results);
    }

    match document {
        Value::Array(_) => serde_json::from_value(document),
        other => {
            let class: ClassSchema = serde_json::from_value(other)?;
            Ok(SchemaSet::from_classes(vec![class]))
        }
    }
}

/// Check a local schema set before any request is made
///
/// Class names must be non-empty, unique and well-formed; Pointer and
/// Relation fields need a target, other fields must not have one; unknown
/// field types are rejected.
pub fn validate_schema_set(set: &SchemaSet) -> Result<(), SourceError> {
    let mut seen = HashSet::new();

    for class in set {
        let name = class.class_name.as_str();
        if name.is_empty() {
            return Err(SourceError::Invalid("class name must not be empty".to_string()));
        }
        if !class_name_pattern().is_match(name) {
            return Err(SourceError::Invalid(format!("invalid class name '{name}'")));
        }
        if !seen.insert(name) {
            return Err(SourceError::Invalid(format!("duplicate class '{name}'")));
        }

        for (field_name, field) in &class.fields {
            if let FieldType::Unknown(type_name) = &field.field_type {
                return Err(SourceError::Invalid(format!(
                    "field '{name}.{field_name}' has unknown type '{type_name}'"
                )));
            }

            match (field.field_type.is_reference(), field.target_class.as_deref()) {
                (true, None) => {
                    return Err(SourceError::Invalid(format!(
                        "{} field '{name}.{field_name}' needs a targetClass",
                        field.field_type
                    )));
                }
                (true, Some(target)) => {
                    let resolved = target.strip_prefix(PREFIX_PLACEHOLDER).unwrap_or(target);
                    if !resolved.is_empty() && !class_name_pattern().is_match(resolved) {
                        return Err(SourceError::Invalid(format!(
                            "field '{name}.{field_name}' has invalid targetClass '{target}'"
                        )));
                    }
                }
                (false, Some(_)) => {
                    return Err(SourceError::Invalid(format!(
                        "{} field '{name}.{field_name}' must not have a targetClass",
                        field.field_type
                    )));
                }
                (false, None) => {}
            }
        }
    }

    Ok(())
}

/// Write the whole set as one pretty-printed JSON array
pub fn write_combined(set: &SchemaSet, path: &Path) -> Result<(), SourceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent)?;
    }
    write_json(path, &set)
}

/// Write one `<className>.json` file per class into `dir`
///
/// Returns the written paths in class order.
pub fn write_per_class(set: &SchemaSet, dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    create_dir(dir)?;

    let mut written = Vec::with_capacity(set.len());
    for class in set {
        if class.class_name.is_empty() {
            return Err(SourceError::Invalid(
                "cannot write a class with an empty name to its own file".to_string(),
            ));
        }
        let path = dir.join(format!("{}.json", class.class_name));
        write_json(&path, class)?;
        written.push(path);
    }
    Ok(written)
}

fn create_dir(dir: &Path) -> Result<(), SourceError> {
    std::fs::create_dir_all(dir).map_err(|source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SourceError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    json.push('\n');

    std::fs::write(path, json).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

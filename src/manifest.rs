//! The manifest: which entries go in the notebook, grouped by month.
//!
//! `<pages_dir>/manifest.json` maps month names to entry references. Months
//! appear in the notebook in the order they are written in the file; entries
//! within a month are ordered by date (falling back to id).
//!
//! ```json
//! {
//!   "August": [
//!     {"id": "drive-v1", "date": "2025-08-28"},
//!     {"id": "intake-sketches"}
//!   ],
//!   "October": [{"id": "final-push", "date": "2025-10-10"}]
//! }
//! ```

use crate::naming::value_text;
use crate::notebook::NotebookError;
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// One manifest reference. `id` is validated when the entry is loaded, so a
/// reference without one still parses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryRef {
    pub id: Option<String>,
    pub date: Option<String>,
}

impl EntryRef {
    fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .map(value_text)
                .filter(|s| !s.is_empty())
        };
        Self {
            id: text("id"),
            date: text("date"),
        }
    }

    /// Sort key within a month: the date, else the id, else `""`.
    pub fn sort_key(&self) -> &str {
        self.date
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestMonth {
    pub name: String,
    pub entries: Vec<EntryRef>,
}

/// Months in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    pub months: Vec<ManifestMonth>,
}

impl Manifest {
    /// Parse manifest JSON. Entries in each month come back sorted.
    pub fn parse(text: &str, path: &Path) -> Result<Self, NotebookError> {
        let value: Value = serde_json::from_str(text).map_err(|source| NotebookError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        let Value::Object(months) = value else {
            return Err(NotebookError::ManifestShape {
                path: path.to_path_buf(),
                message: "top level must be an object of month → entries".into(),
            });
        };

        let months = months
            .iter()
            .map(|(name, refs)| {
                let Value::Array(refs) = refs else {
                    return Err(NotebookError::ManifestShape {
                        path: path.to_path_buf(),
                        message: format!("month '{name}' must be a list of entries"),
                    });
                };
                let mut entries: Vec<_> = refs.iter().map(EntryRef::from_value).collect();
                entries.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
                Ok(ManifestMonth {
                    name: name.clone(),
                    entries,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { months })
    }

    pub fn entry_count(&self) -> usize {
        self.months.iter().map(|m| m.entries.len()).sum()
    }
}

/// Load `<pages_dir>/manifest.json`.
pub fn load_manifest(pages_dir: &Path) -> Result<Manifest, NotebookError> {
    let path = pages_dir.join(MANIFEST_FILENAME);
    if !path.exists() {
        return Err(NotebookError::ManifestNotFound { path });
    }
    let text = fs::read_to_string(&path).map_err(|source| NotebookError::Io {
        path: path.clone(),
        source,
    })?;
    Manifest::parse(&text, &path)
}

//! Resource-constant tables loaded from `R.txt` symbol files.
//!
//! Each library is compiled on its own and gets its own table; the
//! reconciler rewrites the values in place so that every table agrees.
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{IoError, Result, SymbolTableError};

pub const SYMBOL_FILE_NAME: &str = "R.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResourceValue {
    Id(u32),
    Array(Vec<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    pub name: String,
    pub value: ResourceValue,
    /// Frozen entries are never rewritten; they only seed canonical values.
    pub mutable: bool,
}

impl ResourceEntry {
    pub fn id(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            value: ResourceValue::Id(value),
            mutable: true,
        }
    }

    pub fn array(name: impl Into<String>, values: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            value: ResourceValue::Array(values),
            mutable: true,
        }
    }

    pub fn as_id(&self) -> Option<u32> {
        match self.value {
            ResourceValue::Id(v) => Some(v),
            ResourceValue::Array(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceType {
    pub name: String,
    pub entries: Vec<ResourceEntry>,
}

impl ResourceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTable {
    pub source: Option<PathBuf>,
    pub types: Vec<ResourceType>,
    pub(crate) reconciled: bool,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| IoError::read_error(path, e))?;
        let mut table = Self::parse(&content, path)?;
        table.source = Some(path.to_path_buf());
        Ok(table)
    }

    /// Loads `path` when it exists, `None` otherwise.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.is_file() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut table = Self::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (kind, type_name, name, value) = split_symbol(line)
                .ok_or_else(|| SymbolTableError::new(origin, idx + 1, "expected 4 fields"))?;

            let entry = match kind {
                "int" => {
                    let value = parse_id(value).ok_or_else(|| {
                        SymbolTableError::new(origin, idx + 1, format!("invalid id '{value}'"))
                    })?;
                    ResourceEntry::id(name, value)
                }
                "int[]" => {
                    let values = parse_array(value).ok_or_else(|| {
                        SymbolTableError::new(origin, idx + 1, format!("invalid array '{value}'"))
                    })?;
                    ResourceEntry::array(name, values)
                }
                other => {
                    return Err(SymbolTableError::new(
                        origin,
                        idx + 1,
                        format!("unknown symbol kind '{other}'"),
                    )
                    .into())
                }
            };
            table.push(type_name, entry);
        }
        Ok(table)
    }

    /// Appends an entry, creating its type on first use.
    pub fn push(&mut self, type_name: &str, entry: ResourceEntry) {
        match self.types.iter_mut().find(|t| t.name == type_name) {
            Some(resource_type) => resource_type.entries.push(entry),
            None => {
                let mut resource_type = ResourceType::new(type_name);
                resource_type.entries.push(entry);
                self.types.push(resource_type);
            }
        }
    }

    /// Marks every scalar as frozen.
    pub fn frozen(mut self) -> Self {
        for entry in self.types.iter_mut().flat_map(|t| t.entries.iter_mut()) {
            entry.mutable = false;
        }
        self
    }

    pub fn get(&self, type_name: &str, name: &str) -> Option<&ResourceValue> {
        self.types
            .iter()
            .find(|t| t.name == type_name)
            .and_then(|t| t.entry(name))
            .map(|e| &e.value)
    }

    pub fn id(&self, type_name: &str, name: &str) -> Option<u32> {
        match self.get(type_name, name)? {
            ResourceValue::Id(v) => Some(*v),
            ResourceValue::Array(_) => None,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.reconciled
    }

    pub fn len(&self) -> usize {
        self.types.iter().map(|t| t.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the table back into `R.txt` form.
    pub fn to_symbol_text(&self) -> String {
        let mut out = String::new();
        for resource_type in &self.types {
            for entry in &resource_type.entries {
                match &entry.value {
                    ResourceValue::Id(v) if resource_type.name.starts_with("styleable") => {
                        let _ = writeln!(out, "int {} {} {v}", resource_type.name, entry.name);
                    }
                    ResourceValue::Id(v) => {
                        let _ = writeln!(out, "int {} {} 0x{v:08x}", resource_type.name, entry.name);
                    }
                    ResourceValue::Array(values) => {
                        let joined = values
                            .iter()
                            .map(|v| format!("0x{v:08x}"))
                            .collect::<Vec<_>>()
                            .join(", ");
                        let _ = writeln!(
                            out,
                            "int[] {} {} {{ {joined} }}",
                            resource_type.name, entry.name
                        );
                    }
                }
            }
        }
        out
    }
}

fn split_symbol(line: &str) -> Option<(&str, &str, &str, &str)> {
    let mut parts = line.splitn(4, char::is_whitespace);
    let kind = parts.next()?;
    let type_name = parts.next()?;
    let name = parts.next()?;
    let value = parts.next()?.trim();
    if value.is_empty() {
        return None;
    }
    Some((kind, type_name, name, value))
}

fn parse_id(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u32>().ok(),
    }
}

fn parse_array(raw: &str) -> Option<Vec<u32>> {
    let inner = raw.trim().strip_prefix('{')?.strip_suffix('}')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    inner.split(',').map(parse_id).collect()
}

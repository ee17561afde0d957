use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{IoError, Result};

/// The handful of manifest attributes resolution cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfo {
    pub package: Option<String>,
    pub target_sdk_version: Option<u32>,
    pub min_sdk_version: Option<u32>,
}

impl ManifestInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| IoError::read_error(path, e))?;
        Self::parse(&content).map_err(|message| {
            IoError::MalformedManifest {
                path: path.to_path_buf(),
                message,
            }
            .into()
        })
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut reader = Reader::from_str(content);
        let mut info = Self::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"manifest" => info.package = attribute(&e, b"package")?,
                    b"uses-sdk" => {
                        info.target_sdk_version = sdk_attribute(&e, b"targetSdkVersion")?;
                        info.min_sdk_version = sdk_attribute(&e, b"minSdkVersion")?;
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(format!(
                        "error at position {}: {e}",
                        reader.buffer_position()
                    ))
                }
                _ => {}
            }
        }

        Ok(info)
    }

    /// Target version, falling back to the minimum version.
    pub fn sdk_version(&self) -> Option<u32> {
        self.target_sdk_version.or(self.min_sdk_version)
    }
}

fn attribute(element: &BytesStart<'_>, local: &[u8]) -> std::result::Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn sdk_attribute(element: &BytesStart<'_>, local: &[u8]) -> std::result::Result<Option<u32>, String> {
    match attribute(element, local)? {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("invalid sdk version '{raw}'")),
        None => Ok(None),
    }
}

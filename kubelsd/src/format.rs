use std::fmt;

use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{BoxError, LsdError, Result};
use crate::secret::Document;

const JSON_INDENT: &[u8] = b"    ";

/// Encoding of a secret document. Output is always written in the input's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Anything that parses as a JSON value is JSON, everything else is assumed to be YAML.
    pub fn detect(raw: &[u8]) -> Format {
        match serde_json::from_slice::<IgnoredAny>(raw) {
            Ok(_) => Format::Json,
            Err(_) => Format::Yaml,
        }
    }

    /// Reads `raw` into a [`Document`].
    ///
    /// YAML is first rewritten as JSON so both formats go through the same parse and
    /// numbers and booleans keep their types.
    pub fn parse(self, raw: &[u8]) -> Result<Document> {
        let json;
        let raw = match self {
            Format::Json => raw,
            Format::Yaml => {
                json = yaml_to_json(raw)?;
                json.as_slice()
            }
        };
        serde_json::from_slice(raw).map_err(LsdError::Parse)
    }

    pub fn serialize(self, document: &Document) -> Result<String> {
        match self {
            Format::Json => {
                let mut buf = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(
                    &mut buf,
                    PrettyFormatter::with_indent(JSON_INDENT),
                );
                document
                    .serialize(&mut ser)
                    .map_err(|err| self.serialization(err))?;
                String::from_utf8(buf).map_err(|err| self.serialization(err))
            }
            Format::Yaml => serde_yaml::to_string(document).map_err(|err| self.serialization(err)),
        }
    }

    fn serialization(self, source: impl Into<BoxError>) -> LsdError {
        LsdError::Serialization {
            format: self,
            source: source.into(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("JSON"),
            Format::Yaml => f.write_str("YAML"),
        }
    }
}

fn yaml_to_json(raw: &[u8]) -> Result<Vec<u8>> {
    let value: serde_yaml::Value =
        serde_yaml::from_slice(raw).map_err(|err| LsdError::Conversion(err.into()))?;
    serde_json::to_vec(&value).map_err(|err| LsdError::Conversion(err.into()))
}

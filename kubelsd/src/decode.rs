//! Base64 decoding of secret values.
//!
//! Values under `data` are expected to be base64 but nothing guarantees it. A value that
//! does not decode is kept verbatim, so decoding a single value never fails.

use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine as _};
use crossbeam::channel;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::{LsdError, Result};

/// Standard alphabet with canonical padding, tolerant of non-zero trailing bits.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

struct DecodedEntry<'a> {
    key: &'a str,
    value: String,
}

fn try_decode(encoded: &str) -> std::result::Result<String, DecodeError> {
    // Line breaks are not part of the alphabet, wrapped values are still valid
    let joined: String = encoded.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    let bytes = STANDARD_LENIENT.decode(joined)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decodes the value stored under `key`, returning it unchanged if it is not base64.
pub fn decode_value(key: &str, encoded: &str) -> String {
    try_decode(encoded).unwrap_or_else(|err| {
        trace!(key, %err, "value is not base64, keeping it as is");
        encoded.to_owned()
    })
}

/// Decodes every entry of a `data` mapping, one worker per entry.
///
/// All values must be strings; the first key (in key order) holding anything else is
/// reported as [`LsdError::Type`] before any work starts. An entry whose worker cannot be
/// started is decoded on the calling thread.
pub fn decode_data(data: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut encoded = Vec::with_capacity(data.len());
    for (key, value) in data {
        match value {
            Value::String(value) => encoded.push((key.as_str(), value.as_str())),
            _ => return Err(LsdError::Type { key: key.clone() }),
        }
    }

    // The receiver outlives the scope and has room for every entry, sends cannot fail
    let (tx, rx) = channel::bounded(encoded.len());
    let joined = crossbeam::scope(|s| {
        for (key, value) in encoded {
            let worker_tx = tx.clone();
            let spawned = s.builder().spawn(move |_| {
                let _ = worker_tx.send(DecodedEntry {
                    key,
                    value: decode_value(key, value),
                });
            });
            if let Err(err) = spawned {
                warn!(key, %err, "could not start decode worker, decoding inline");
                let _ = tx.send(DecodedEntry {
                    key,
                    value: decode_value(key, value),
                });
            }
        }
    });
    drop(tx);
    if let Err(panic) = joined {
        std::panic::resume_unwind(panic);
    }

    Ok(rx
        .into_iter()
        .map(|entry| (entry.key.to_owned(), Value::String(entry.value)))
        .collect())
}

//! Legacy payload migration at the decode boundary.
//!
//! Earlier clients persisted signatures in ad-hoc shapes: sometimes the raw
//! PNG byte blob alone, without capture dimensions. Instead of branching on
//! payload shape downstream, stored documents are normalized here, once, on
//! load: recognizable legacy blobs are migrated to the current versioned
//! artifact record, and anything unreadable is dropped with a warning and
//! surfaces as "no signature available".

use serde_json::Value;
use sigil_raster::decode_png;
use sigil_types::artifact::SignatureArtifact;
use tracing::warn;

/// Normalize every row's `signature` field of a stored sheet document to the
/// current artifact schema, in place.
pub fn normalize_document(document: &mut Value) {
    let Some(rows) = document.get_mut("rows").and_then(Value::as_array_mut) else {
        return;
    };
    for (index, row) in rows.iter_mut().enumerate() {
        let Some(slot) = row.get_mut("signature") else {
            continue;
        };
        let normalized = normalize_signature(slot.take(), index);
        *slot = normalized;
    }
}

fn normalize_signature(value: Value, row_index: usize) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Object(map) => {
            let candidate = Value::Object(map);
            match serde_json::from_value::<SignatureArtifact>(candidate) {
                Ok(artifact) if artifact.validate_schema().is_ok() => {
                    serde_json::to_value(artifact).unwrap_or(Value::Null)
                }
                _ => {
                    warn!(row_index, "dropping signature with unrecognized record shape");
                    Value::Null
                }
            }
        }
        // Legacy shape: bare PNG bytes with no dimension metadata. Recover
        // the dimensions by decoding the payload itself.
        Value::Array(items) => match bytes_from_json(&items) {
            Some(bytes) => match decode_png(&bytes) {
                Ok(raster) => {
                    let artifact = SignatureArtifact::new(raster.width, raster.height, bytes);
                    serde_json::to_value(artifact).unwrap_or(Value::Null)
                }
                Err(err) => {
                    warn!(row_index, %err, "dropping undecodable legacy signature blob");
                    Value::Null
                }
            },
            None => {
                warn!(row_index, "dropping malformed legacy signature payload");
                Value::Null
            }
        },
        other => {
            warn!(row_index, shape = ?other, "dropping signature of unsupported shape");
            Value::Null
        }
    }
}

fn bytes_from_json(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

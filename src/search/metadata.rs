//! Canonical metadata extraction from heterogeneous neighbor records.
//!
//! Each canonical field maps to an ordered list of candidate source keys,
//! resolved by a single first-present-wins routine. Extraction is total:
//! a field that cannot be resolved stays absent, the candidate is never
//! failed, and unrecognized keys survive in a passthrough map.

use serde_json::{Map, Value};

use crate::search::types::{ColorInfo, NormalizedMetadata};

/// Source keys for the storage URI, in priority order.
const STORAGE_URI_KEYS: &[&str] = &["gcs_uri", "gs_uri", "uri"];

/// Fallback keys for a directly usable image URL.
const IMAGE_URL_KEYS: &[&str] = &["image_url", "url"];

const FILENAME_KEYS: &[&str] = &["filename", "file"];

const PRODUCT_ID_KEYS: &[&str] = &["productId", "product_id", "productid"];

/// Keys consumed by canonical field resolution; everything else goes to
/// the passthrough map.
const RECOGNIZED_KEYS: &[&str] = &[
    "gcs_uri",
    "gs_uri",
    "uri",
    "image_url",
    "url",
    "filename",
    "file",
    "productId",
    "product_id",
    "productid",
    "color_info",
    "color",
    "color_confidence",
];

/// Resolve the canonical view of a raw metadata map.
pub fn extract_metadata(raw: &Map<String, Value>) -> NormalizedMetadata {
    let filename = first_present(raw, FILENAME_KEYS);
    let gcs_uri = first_present(raw, STORAGE_URI_KEYS);
    let product_id = first_present(raw, PRODUCT_ID_KEYS);
    let color_info = extract_color_info(raw);

    let image_url = match &gcs_uri {
        Some(uri) => Some(gs_to_https(uri)),
        None => first_present(raw, IMAGE_URL_KEYS),
    };

    let extra: Map<String, Value> = raw
        .iter()
        .filter(|(key, _)| !RECOGNIZED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    NormalizedMetadata {
        filename,
        gcs_uri,
        image_url,
        product_id,
        color_info,
        extra,
    }
}

/// Convert a `gs://bucket/object` URI to its public HTTPS form.
///
/// Anything that is not a well-formed `gs://` URI passes through unchanged.
pub fn gs_to_https(uri: &str) -> String {
    if let Some(rest) = uri.strip_prefix("gs://") {
        if let Some((bucket, object)) = rest.split_once('/') {
            return format!("https://storage.googleapis.com/{bucket}/{object}");
        }
    }
    uri.to_string()
}

fn first_present(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw.get(*key).and_then(value_as_text))
}

/// Best-effort text view of a heterogeneous metadata value.
///
/// Byte-encoded values arrive as arrays of integers and are decoded as
/// UTF-8; a decode failure yields an absent field rather than an error.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let bytes = items
                .iter()
                .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect::<Option<Vec<u8>>>()?;
            match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(err) => {
                    tracing::debug!(error = %err, "metadata bytes are not valid UTF-8");
                    None
                }
            }
        }
        _ => None,
    }
}

fn value_as_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Extract color information from either the nested `color_info` structure
/// or the flat `color` / `color_confidence` keys.
fn extract_color_info(raw: &Map<String, Value>) -> Option<ColorInfo> {
    if let Some(nested) = raw.get("color_info") {
        return match nested {
            Value::Object(obj) => Some(ColorInfo {
                dominant_color: obj.get("dominant_color").and_then(value_as_text),
                color_confidence: obj.get("color_confidence").and_then(value_as_number),
            }),
            other => value_as_text(other).map(|color| ColorInfo {
                dominant_color: Some(color),
                color_confidence: None,
            }),
        };
    }

    let dominant = raw.get("color").and_then(value_as_text)?;
    Some(ColorInfo {
        dominant_color: Some(dominant),
        color_confidence: raw.get("color_confidence").and_then(value_as_number),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn gs_uri_converts_to_public_https() {
        assert_eq!(
            gs_to_https("gs://bucket/path/to/obj.jpg"),
            "https://storage.googleapis.com/bucket/path/to/obj.jpg"
        );
    }

    #[test]
    fn non_gs_uri_passes_through() {
        assert_eq!(gs_to_https("https://cdn.example.com/a.jpg"), "https://cdn.example.com/a.jpg");
        // No object path after the bucket: leave as-is rather than guess.
        assert_eq!(gs_to_https("gs://bucket-only"), "gs://bucket-only");
    }

    #[test]
    fn storage_uri_alias_priority() {
        let raw = meta(json!({
            "uri": "gs://b/low-priority.jpg",
            "gcs_uri": "gs://b/wins.jpg",
        }));
        let extracted = extract_metadata(&raw);
        assert_eq!(extracted.gcs_uri.as_deref(), Some("gs://b/wins.jpg"));
        assert_eq!(
            extracted.image_url.as_deref(),
            Some("https://storage.googleapis.com/b/wins.jpg")
        );
    }

    #[test]
    fn image_url_falls_back_when_no_storage_uri() {
        let raw = meta(json!({"url": "https://cdn.example.com/x.png"}));
        let extracted = extract_metadata(&raw);
        assert!(extracted.gcs_uri.is_none());
        assert_eq!(
            extracted.image_url.as_deref(),
            Some("https://cdn.example.com/x.png")
        );
    }

    #[test]
    fn filename_and_product_id_aliases() {
        let raw = meta(json!({"file": "dress.jpg", "productid": "sku-42"}));
        let extracted = extract_metadata(&raw);
        assert_eq!(extracted.filename.as_deref(), Some("dress.jpg"));
        assert_eq!(extracted.product_id.as_deref(), Some("sku-42"));
    }

    #[test]
    fn byte_encoded_values_decode_as_text() {
        let raw = meta(json!({"filename": [100, 114, 101, 115, 115, 46, 106, 112, 103]}));
        let extracted = extract_metadata(&raw);
        assert_eq!(extracted.filename.as_deref(), Some("dress.jpg"));
    }

    #[test]
    fn invalid_utf8_bytes_leave_field_absent() {
        let raw = meta(json!({"filename": [0xff, 0xfe, 0xfd]}));
        let extracted = extract_metadata(&raw);
        assert!(extracted.filename.is_none());
    }

    #[test]
    fn nested_color_info_is_preferred() {
        let raw = meta(json!({
            "color_info": {"dominant_color": "Red", "color_confidence": 0.93},
            "color": "blue",
        }));
        let color = extract_metadata(&raw).color_info.unwrap();
        assert_eq!(color.dominant_color.as_deref(), Some("Red"));
        assert_eq!(color.color_confidence, Some(0.93));
    }

    #[test]
    fn flat_color_keys_are_used_without_nested_struct() {
        let raw = meta(json!({"color": "black", "color_confidence": "0.7"}));
        let color = extract_metadata(&raw).color_info.unwrap();
        assert_eq!(color.dominant_color.as_deref(), Some("black"));
        assert_eq!(color.color_confidence, Some(0.7));
    }

    #[test]
    fn no_color_keys_means_no_color_info() {
        let raw = meta(json!({"filename": "a.jpg"}));
        assert!(extract_metadata(&raw).color_info.is_none());
    }

    #[test]
    fn unrecognized_keys_survive_in_passthrough() {
        let raw = meta(json!({
            "gcs_uri": "gs://b/a.jpg",
            "season": "summer",
            "stock": 12,
        }));
        let extracted = extract_metadata(&raw);
        assert_eq!(extracted.extra.get("season"), Some(&json!("summer")));
        assert_eq!(extracted.extra.get("stock"), Some(&json!(12)));
        assert!(extracted.extra.get("gcs_uri").is_none());
    }

    #[test]
    fn empty_metadata_resolves_to_all_absent() {
        let extracted = extract_metadata(&Map::new());
        assert_eq!(extracted, NormalizedMetadata::default());
    }
}

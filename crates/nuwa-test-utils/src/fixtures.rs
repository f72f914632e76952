//! Response envelope fixtures shaped like the backend's.

use serde_json::{json, Value};

/// Success envelope around `data`.
pub fn ok_envelope(data: Value) -> Value {
    json!({
        "success": true,
        "data": data,
        "message": "ok",
        "timestamp": "2025-01-15T10:30:00Z"
    })
}

/// Success envelope around a paginated list.
pub fn page_envelope(items: Vec<Value>, page: u32, size: u32) -> Value {
    let total = items.len() as u64;
    let pages = if size == 0 { 0 } else { total.div_ceil(size as u64) as u32 };
    ok_envelope(json!({
        "items": items,
        "total": total,
        "page": page,
        "size": size,
        "pages": pages.max(1)
    }))
}

/// Failure envelope as returned on backend-side errors.
pub fn error_envelope(message: &str) -> Value {
    json!({
        "success": false,
        "data": null,
        "message": message,
        "error": message,
        "timestamp": "2025-01-15T10:30:00Z"
    })
}

/// Response body of the translation endpoint.
pub fn translation_response(translated: &str) -> Value {
    json!({
        "translated_text": translated,
        "confidence": 0.98
    })
}

/// Backend-shaped wish.
pub fn wish(id: u64, zh_title: &str, zh_description: &str) -> Value {
    json!({
        "id": id,
        "title": {"zh": zh_title},
        "description": {"zh": zh_description},
        "status": "pending",
        "language": "zh"
    })
}

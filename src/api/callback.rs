//! Gateway callback trampoline.
//!
//! Payment gateways return the payer with a POST (3-DS completions, bank
//! redirects). The handler re-emits whatever parameters arrived as query
//! parameters on a 303 redirect to the checkout page, which resumes the flow
//! from the URL. The redirect must always happen: a gateway body this
//! endpoint cannot parse still produces a redirect, marked
//! `error=redirect_failed`, never a 5xx.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::Value as JsonValue;
use tracing::warn;

/// Callback bodies past this size are not worth parsing.
const CALLBACK_BODY_LIMIT: usize = 256 * 1024;

pub async fn handle_callback_post(request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let original_query = parts.uri.query().map(str::to_string);

    let bytes = match axum::body::to_bytes(body, CALLBACK_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "callback body unreadable");
            return failed_redirect();
        }
    };

    let mut params = match parse_callback_params(&content_type, &bytes) {
        Ok(params) => params,
        Err(reason) => {
            warn!(reason, "callback body unparseable");
            return failed_redirect();
        }
    };

    // Parameters already on the callback URL ride along unless the body set
    // the same key.
    if let Some(query) = original_query {
        if let Ok(existing) = serde_urlencoded::from_str::<Vec<(String, String)>>(&query) {
            for (key, value) in existing {
                if !params.iter().any(|(k, _)| *k == key) {
                    params.push((key, value));
                }
            }
        }
    }

    redirect_with_params(&params)
}

/// Gateways that call back with GET just get their query forwarded.
pub async fn handle_callback_get(request: Request<Body>) -> Response {
    let target = match request.uri().query() {
        Some(query) if !query.is_empty() => format!("/?{}", query),
        _ => "/".to_string(),
    };
    (StatusCode::FOUND, [(LOCATION, target)]).into_response()
}

/// Best-effort parameter extraction. JSON bodies must be objects; everything
/// else is treated as urlencoded. Empty values are dropped, matching query
/// parameters that would serialize to nothing.
fn parse_callback_params(
    content_type: &str,
    body: &[u8],
) -> Result<Vec<(String, String)>, &'static str> {
    let params = if content_type.contains("application/json") {
        let value: JsonValue = serde_json::from_slice(body).map_err(|_| "invalid JSON body")?;
        let object = value.as_object().ok_or("JSON body is not an object")?;
        object
            .iter()
            .map(|(key, value)| (key.clone(), stringify_param(value)))
            .collect()
    } else {
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
            .map_err(|_| "body is not urlencoded")?
    };

    Ok(params
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect())
}

fn stringify_param(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn redirect_with_params(params: &[(String, String)]) -> Response {
    let target = match serde_urlencoded::to_string(params) {
        Ok(query) if !query.is_empty() => format!("/?{}", query),
        Ok(_) => "/".to_string(),
        Err(_) => return failed_redirect(),
    };
    Redirect::to(&target).into_response()
}

fn failed_redirect() -> Response {
    Redirect::to("/?error=redirect_failed").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_bodies_parse_to_pairs() {
        let params = parse_callback_params("application/x-www-form-urlencoded", b"a=1&b=2")
            .expect("parse");
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn json_bodies_parse_and_stringify_values() {
        let params = parse_callback_params(
            "application/json",
            br#"{"reference":"ref_1","amount":100,"note":null}"#,
        )
        .expect("parse");
        assert!(params.contains(&("reference".to_string(), "ref_1".to_string())));
        assert!(params.contains(&("amount".to_string(), "100".to_string())));
        // null stringifies to empty and is dropped
        assert!(!params.iter().any(|(k, _)| k == "note"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(parse_callback_params("application/json", b"{not json").is_err());
    }

    #[test]
    fn unknown_content_type_falls_back_to_urlencoded() {
        let params = parse_callback_params("", b"TransactionReference=ref_1").expect("parse");
        assert_eq!(
            params,
            vec![("TransactionReference".to_string(), "ref_1".to_string())]
        );
    }
}

//! Request execution.
//!
//! Turns a hook-processed [`RequestDescriptor`] into a network call and
//! normalizes the outcome:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | Transport failure | `ClientError` with status `500`, no response |
//! | `204` / `205` | `Response` with [`ResponseData::Empty`], body never read |
//! | `>= 400` | `ClientError` with the full response snapshot |
//! | Anything else | `Response` with the body decoded by content type |

use super::transport::{Transport, TransportRequest, TransportResponse};
use super::utils::{is_empty_body_status, is_error_status};
use crate::error::ClientError;
use crate::protocol::constants::{headers, UNKNOWN_ERROR_PREFIX};
use crate::protocol::{body_kind, BodyKind};
use crate::types::{RequestDescriptor, Response, ResponseData};
use serde_json::Value;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Send `descriptor` through `transport`.
///
/// `agent` is the fallback `user-agent`; `auth` the client's stored
/// credential, read once at dispatch.
pub(crate) async fn execute(
    descriptor: RequestDescriptor,
    transport: &dyn Transport,
    agent: &str,
    auth: Option<&str>,
) -> Result<Response, ClientError> {
    let span = tracing::info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %descriptor.method,
        url = %descriptor.url,
    );

    execute_inner(descriptor, transport, agent, auth)
        .instrument(span)
        .await
}

async fn execute_inner(
    mut descriptor: RequestDescriptor,
    transport: &dyn Transport,
    agent: &str,
    auth: Option<&str>,
) -> Result<Response, ClientError> {
    descriptor.body = descriptor.body.take().map(|body| body.serialized());

    if !descriptor.headers.contains(headers::USER_AGENT) {
        descriptor.headers.insert(headers::USER_AGENT, agent);
    }

    if descriptor.unauthenticated {
        descriptor.headers.remove(headers::AUTHORIZATION);
    } else if let Some(auth) = auth {
        if !descriptor.headers.contains(headers::AUTHORIZATION) {
            descriptor.headers.insert(headers::AUTHORIZATION, auth);
        }
    }

    let request = TransportRequest {
        method: descriptor.method.clone(),
        url: descriptor.url.clone(),
        headers: descriptor.headers.clone(),
        body: descriptor.body.as_ref().map(|body| body.to_wire()),
        options: descriptor.transport.clone(),
    };

    debug!("dispatching request");
    let response = match transport.send(request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "transport failure");
            return Err(ClientError::new(err.to_string(), 500, &descriptor, None));
        }
    };

    let status = response.status;
    debug!(status, "response received");

    if is_empty_body_status(status) {
        return Ok(Response {
            status,
            url: response.url,
            headers: response.headers,
            data: ResponseData::Empty,
        });
    }

    let response = read_response(response)
        .await
        .map_err(|message| ClientError::new(message, 500, &descriptor, None))?;

    if is_error_status(status) {
        let message = error_message(&response.data);
        warn!(status, %message, "request failed");
        return Err(ClientError::new(message, status, &descriptor, Some(response)));
    }

    Ok(response)
}

async fn read_response(response: TransportResponse) -> Result<Response, String> {
    let status = response.status;
    let url = response.url.clone();
    let response_headers = response.headers.clone();

    let kind = body_kind(response_headers.get(headers::CONTENT_TYPE));
    let bytes = response.bytes().await.map_err(|err| err.to_string())?;

    let data = if bytes.is_empty() {
        ResponseData::Empty
    } else {
        match kind {
            BodyKind::Json => {
                ResponseData::Json(serde_json::from_slice(&bytes).map_err(|err| err.to_string())?)
            }
            BodyKind::Text => ResponseData::Text(String::from_utf8_lossy(&bytes).into_owned()),
            BodyKind::Binary => ResponseData::Binary(bytes),
        }
    };

    Ok(Response {
        status,
        url,
        headers: response_headers,
        data,
    })
}

/// Message for an error response.
///
/// A text body is used as-is. A JSON body with a `message` field uses it,
/// followed by `": "` and the JSON-encoded `errors` entries when present.
/// Anything else falls back to `Unknown error: {body}`.
fn error_message(data: &ResponseData) -> String {
    match data {
        ResponseData::Text(text) => text.clone(),
        ResponseData::Json(Value::Object(object)) if object.contains_key("message") => {
            let message = match &object["message"] {
                Value::String(message) => message.clone(),
                other => other.to_string(),
            };
            match object.get("errors").and_then(Value::as_array) {
                Some(errors) => {
                    let errors = errors
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{message}: {errors}")
                }
                None => message,
            }
        }
        other => format!("{UNKNOWN_ERROR_PREFIX} {}", other.to_value()),
    }
}

//! Rendered views.
//!
//! Templates live outside this service: a handler answers with the template
//! name and the context to fill it with, serialized as
//! `{"template": ..., "context": {...}}`.

use actix_web::body::BoxBody;
use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use serde::Serialize;
use serde_json::Value;

use crate::middleware::error::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub template: &'static str,
    pub context: Value,
}

impl View {
    pub fn new(template: &'static str, context: impl Serialize) -> AppResult<Self> {
        Ok(Self {
            template,
            context: serde_json::to_value(context)?,
        })
    }

    /// The serialized body, as sent to the client.
    pub fn body(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn into_response(self) -> HttpResponse {
        match self.body() {
            Ok(body) => rendered(StatusCode::OK, body),
            Err(e) => e.error_response(),
        }
    }
}

/// Response for an already serialized view body.
pub fn rendered(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .body(body)
}

impl Responder for View {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        self.into_response()
    }
}

//! Extractors whose rejections render as `{"error": ...}` bodies.

use axum::extract::{FromRequest, FromRequestParts};
use ehrlite_api::ApiError;

/// `axum::Json` with [`ApiError`] rejections (400 for bad JSON, 413 past the
/// body limit, 415 for a missing JSON content type).
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

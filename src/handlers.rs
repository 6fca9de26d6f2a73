use axum::extract::FromRequest;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::ApiError;

pub mod health;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

/// Query parameters shared by the tag and ingredient listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AssignedOnlyQuery {
    /// When non-zero, only return rows assigned to at least one recipe
    pub assigned_only: Option<u8>,
}

impl AssignedOnlyQuery {
    pub fn enabled(&self) -> bool {
        self.assigned_only.unwrap_or(0) != 0
    }
}

/// JSON request body whose rejections are reported as validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

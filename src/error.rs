//! Error returned when content negotiation fails.

use actix_web::{http::StatusCode, ResponseError};
use derive_more::{Display, Error};

/// None of the offered media types is acceptable to the client.
///
/// Renders as `406 Not Acceptable` with a plain-text `Not Acceptable` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Not Acceptable")]
#[non_exhaustive]
pub struct NotAcceptable;

impl ResponseError for NotAcceptable {
    fn status_code(&self) -> StatusCode {
        StatusCode::NOT_ACCEPTABLE
    }
}

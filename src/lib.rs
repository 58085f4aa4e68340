//! Content negotiation for Actix Web.
//!
//! Reads the `Accept`, `Accept-Charset`, `Accept-Encoding` and `Accept-Language` request headers
//! and answers two questions per dimension: what the client accepts, in order of preference, and
//! which of the values the server can offer suits the client best.
//!
//! - [`Accepts`] is the per-request negotiation context, usable as an extractor or through
//!   [`AcceptsExt`].
//! - [`Acceptable`] is a middleware that answers `406 Not Acceptable` before the handler runs when
//!   none of a declared set of media types is acceptable.
//!
//! # Example
//! ```
//! use actix_accepts::{Acceptable, Accepts};
//! use actix_web::{web, App, HttpResponse};
//!
//! async fn greet(accepts: Accepts) -> HttpResponse {
//!     let lang = accepts.language(&["en", "de"]).unwrap_or("en");
//!
//!     match accepts.type_(&["json", "text/plain"]) {
//!         Some("json") => HttpResponse::Ok().json([lang]),
//!         _ => HttpResponse::Ok().body(lang.to_owned()),
//!     }
//! }
//!
//! let app = App::new().service(
//!     web::resource("/greet")
//!         .wrap(Acceptable::types(["json", "text/plain"]))
//!         .to(greet),
//! );
//! ```

#![deny(rust_2018_idioms, nonstandard_style)]
#![warn(future_incompatible, missing_docs)]
#![doc(html_logo_url = "https://actix.rs/img/logo.png")]
#![doc(html_favicon_url = "https://actix.rs/favicon.ico")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod acceptable;
mod accepts;
mod error;
mod media_type;
mod preference;

pub use self::acceptable::{Acceptable, AcceptableTypes};
pub use self::accepts::{Accepts, AcceptsExt};
pub use self::error::NotAcceptable;
pub use self::media_type::MediaRange;
pub use self::preference::{Negotiable, Preference, Preferences, Specificity, Token};

/// Middleware services and futures. Not usually named directly.
pub mod dev {
    pub use crate::acceptable::{AcceptableFuture, AcceptableMiddleware};
}

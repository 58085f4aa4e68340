//! For middleware documentation, see [`Acceptable`].

use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use actix_utils::future::{ready, Ready};
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
};
use futures_core::ready;
use pin_project_lite::pin_project;

use crate::{AcceptsExt as _, NotAcceptable};

/// Media types a group of routes can respond with.
///
/// Registered with `app_data` on an `App`, `Scope` or `Resource`, it is the declaration used by
/// [`Acceptable::new`] guards. The innermost registration visible to a request wins, so a
/// resource-level set overrides a scope-level one.
///
/// Types are full media types or extension short forms, as accepted by
/// [`Accepts::type_`](crate::Accepts::type_).
///
/// # Examples
/// ```
/// use actix_accepts::{Acceptable, AcceptableTypes};
/// use actix_web::{web, App, HttpResponse};
///
/// let app = App::new().service(
///     web::scope("/api")
///         .app_data(AcceptableTypes::new(["json"]))
///         .service(
///             web::resource("/report")
///                 .app_data(AcceptableTypes::new(["text/csv", "json"]))
///                 .wrap(Acceptable::new())
///                 .to(HttpResponse::Ok),
///         ),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptableTypes(Vec<String>);

impl AcceptableTypes {
    /// Constructs a declaration from a list of media types.
    pub fn new<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        types.into_iter().collect()
    }

    /// Returns the declared types in declaration order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns true if no types are declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Into<String>> FromIterator<T> for AcceptableTypes {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        AcceptableTypes(iter.into_iter().map(Into::into).collect())
    }
}

/// Middleware that rejects requests whose `Accept` header matches none of a set of media types.
///
/// Before the wrapped service runs, the declared types are negotiated against the request's
/// [`Accepts`](crate::Accepts). When nothing matches, the request is answered with
/// `406 Not Acceptable` ([`NotAcceptable`]) and the wrapped service is never called. A request
/// without an `Accept` header always passes.
///
/// The set is either given inline with [`Acceptable::types`] or inherited from the innermost
/// [`AcceptableTypes`] in `app_data` when built with [`Acceptable::new`]. An inline set takes
/// precedence over `app_data`. A guard without any declaration, or with an empty one, lets every
/// request through.
///
/// Note that `app_data` is resolved at the guard's position: a guard wrapped around a `Scope`
/// runs before routing and does not see `app_data` registered on resources inside that scope.
/// Wrap resources (or routes) to have per-resource declarations take effect.
///
/// Nested guards that each carry an inline set all apply, so a request must satisfy every one of
/// them. For a route that should replace its group's set, register the group's set as
/// [`AcceptableTypes`] on the scope and the route's own set on the resource, and wrap each
/// resource with [`Acceptable::new`].
///
/// # Examples
/// ```
/// use actix_accepts::Acceptable;
/// use actix_web::{web, App, HttpResponse};
///
/// let app = App::new()
///     .service(
///         web::resource("/plain")
///             .wrap(Acceptable::types(["text/plain"]))
///             .to(|| async { "OK" }),
///     )
///     .service(
///         web::scope("/api")
///             .wrap(Acceptable::types(["json"]))
///             .route("/items", web::get().to(HttpResponse::Ok)),
///     );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Acceptable {
    declared: Option<AcceptableTypes>,
}

impl Acceptable {
    /// Constructs a guard that uses the [`AcceptableTypes`] registered in `app_data`.
    pub fn new() -> Self {
        Acceptable::default()
    }

    /// Constructs a guard for the given media types.
    pub fn types<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Acceptable {
            declared: Some(AcceptableTypes::new(types)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Acceptable
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AcceptableMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AcceptableMiddleware {
            service,
            declared: self.declared.clone().map(Rc::new),
        }))
    }
}

/// Service produced by [`Acceptable`].
pub struct AcceptableMiddleware<S> {
    service: S,
    declared: Option<Rc<AcceptableTypes>>,
}

impl<S, B> Service<ServiceRequest> for AcceptableMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = AcceptableFuture<S::Future, B>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let declared = self
            .declared
            .as_deref()
            .or_else(|| req.app_data::<AcceptableTypes>());

        let rejected = match declared {
            Some(types) if !types.is_empty() => {
                let matched = req.accepts().type_(types.as_slice()).is_some();

                if !matched {
                    log::debug!(
                        "none of {:?} acceptable for Accept: {:?}",
                        types.as_slice(),
                        req.headers().get(header::ACCEPT),
                    );
                }

                !matched
            }
            _ => false,
        };

        if rejected {
            let res = req.error_response(NotAcceptable).map_into_right_body();
            return AcceptableFuture::Rejected { res: Some(res) };
        }

        AcceptableFuture::Passed {
            fut: self.service.call(req),
        }
    }
}

pin_project! {
    #[project = AcceptableFutureProj]
    #[doc(hidden)]
    pub enum AcceptableFuture<Fut, B> {
        Passed { #[pin] fut: Fut },
        Rejected { res: Option<ServiceResponse<EitherBody<B>>> },
    }
}

impl<Fut, B> Future for AcceptableFuture<Fut, B>
where
    Fut: Future<Output = Result<ServiceResponse<B>, Error>>,
{
    type Output = Result<ServiceResponse<EitherBody<B>>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            AcceptableFutureProj::Passed { fut } => {
                let res = ready!(fut.poll(cx))?;
                Poll::Ready(Ok(res.map_into_left_body()))
            }
            AcceptableFutureProj::Rejected { res } => {
                Poll::Ready(Ok(res.take().expect("AcceptableFuture polled after completion")))
            }
        }
    }
}

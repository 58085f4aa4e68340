//! Per-request negotiation context. See [`Accepts`].

use std::{cell::Ref, convert::Infallible};

use actix_utils::future::{ok, Ready};
use actix_web::{
    dev::{Payload, ServiceRequest},
    http::header::{self, HeaderMap, HeaderName},
    FromRequest, HttpMessage, HttpRequest,
};
use smallvec::SmallVec;

use crate::{
    media_type::{Candidate, MediaRange},
    preference::{Preferences, Token},
};

/// The client's negotiation preferences for a single request.
///
/// Built from the `Accept`, `Accept-Charset`, `Accept-Encoding` and `Accept-Language` headers.
/// Each dimension can be read in two forms:
/// - as a ranked list of the tokens the client accepts ([`charsets`](Self::charsets),
///   [`encodings`](Self::encodings), [`languages`](Self::languages), [`types`](Self::types));
/// - as the best match among values the server can offer ([`charset`](Self::charset),
///   [`encoding`](Self::encoding), [`language`](Self::language), [`type_`](Self::type_)), which
///   returns `None` when nothing offered is acceptable.
///
/// Malformed headers never fail; they fall back to accepting anything.
///
/// # Extractor
/// `Accepts` can be taken as a handler argument. The value is computed once per request and cached
/// in the request extensions, so the [`Acceptable`](crate::Acceptable) guard, other extractors and
/// [`AcceptsExt::accepts`] all see the same instance.
///
/// ```
/// use actix_accepts::Accepts;
/// use actix_web::{get, HttpResponse, Responder};
///
/// #[get("/")]
/// async fn index(accepts: Accepts) -> impl Responder {
///     match accepts.type_(&["json", "html"]) {
///         Some("json") => HttpResponse::Ok().json(["hello"]),
///         Some(_) => HttpResponse::Ok().body("<p>hello</p>"),
///         None => HttpResponse::NotAcceptable().finish(),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepts {
    types: Preferences<MediaRange>,
    charsets: Preferences<Token>,
    encodings: Preferences<Token>,
    languages: Preferences<Token>,
}

impl Accepts {
    /// Constructs from raw header values. Pass an empty string for an absent header.
    ///
    /// # Examples
    /// ```
    /// use actix_accepts::Accepts;
    ///
    /// let accepts = Accepts::new("text/html, application/json", "", "deflate, gzip", "ru, en");
    ///
    /// assert_eq!(accepts.types(), ["text/html", "application/json"]);
    /// assert_eq!(accepts.encodings(), ["deflate", "gzip", "identity"]);
    /// assert_eq!(accepts.language(&["en"]), Some("en"));
    /// assert_eq!(accepts.type_(&["xml"]), None);
    /// ```
    pub fn new(accept: &str, charset: &str, encoding: &str, language: &str) -> Self {
        Accepts {
            types: Preferences::parse(accept),
            charsets: Preferences::parse(charset),
            encodings: Preferences::parse(encoding).with_implicit(Token::new("identity")),
            languages: Preferences::parse(language),
        }
    }

    /// Constructs from a request's headers.
    ///
    /// Repeated header lines are combined as if they were one comma-separated list. Values that
    /// are not visible ASCII are ignored.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Accepts::new(
            &joined_header(headers, header::ACCEPT),
            &joined_header(headers, header::ACCEPT_CHARSET),
            &joined_header(headers, header::ACCEPT_ENCODING),
            &joined_header(headers, header::ACCEPT_LANGUAGE),
        )
    }

    /// Returns acceptable charsets, most preferred first.
    pub fn charsets(&self) -> Vec<&str> {
        self.charsets.tokens()
    }

    /// Returns acceptable content-codings, most preferred first.
    ///
    /// `identity` is always included unless the client listed it explicitly.
    pub fn encodings(&self) -> Vec<&str> {
        self.encodings.tokens()
    }

    /// Returns acceptable language tags, most preferred first.
    pub fn languages(&self) -> Vec<&str> {
        self.languages.tokens()
    }

    /// Returns acceptable media ranges, most preferred first, without their parameters.
    pub fn types(&self) -> Vec<&str> {
        self.types.tokens()
    }

    /// Returns the best charset among `candidates`.
    pub fn charset<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Option<&'a str> {
        best_token(&self.charsets, candidates)
    }

    /// Returns the best content-coding among `candidates`.
    pub fn encoding<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Option<&'a str> {
        best_token(&self.encodings, candidates)
    }

    /// Returns the best language among `candidates`.
    ///
    /// Tags are compared whole; `en` does not match `en-US`.
    pub fn language<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Option<&'a str> {
        best_token(&self.languages, candidates)
    }

    /// Returns the best media type among `candidates`.
    ///
    /// Candidates are full media types (`application/json`) or extension short forms (`json`,
    /// `.json`). The returned value is the candidate exactly as passed in. Without an `Accept`
    /// header the first candidate is returned.
    pub fn type_<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Option<&'a str> {
        if self.types.is_defaulted() {
            return candidates.first().map(AsRef::as_ref);
        }

        let resolved = candidates
            .iter()
            .map(|candidate| Candidate::resolve(candidate.as_ref()))
            .collect::<SmallVec<[_; 4]>>();

        self.types
            .negotiate(&resolved[..], |range, candidate| range.matches(candidate))
            .map(|idx| candidates[idx].as_ref())
    }

    /// Returns the ranked `Accept` preferences, including rejected entries and their weights.
    pub fn type_preferences(&self) -> &Preferences<MediaRange> {
        &self.types
    }

    /// Returns the ranked `Accept-Charset` preferences.
    pub fn charset_preferences(&self) -> &Preferences<Token> {
        &self.charsets
    }

    /// Returns the ranked `Accept-Encoding` preferences, including the implicit `identity`.
    pub fn encoding_preferences(&self) -> &Preferences<Token> {
        &self.encodings
    }

    /// Returns the ranked `Accept-Language` preferences.
    pub fn language_preferences(&self) -> &Preferences<Token> {
        &self.languages
    }
}

fn best_token<'a, S>(prefs: &Preferences<Token>, candidates: &'a [S]) -> Option<&'a str>
where
    S: AsRef<str>,
{
    prefs
        .negotiate(candidates, |token, candidate| token.matches(candidate.as_ref()))
        .map(|idx| candidates[idx].as_ref())
}

fn joined_header(headers: &HeaderMap, name: HeaderName) -> String {
    let mut joined = String::new();

    for value in headers.get_all(&name) {
        match value.to_str() {
            Ok(value) => {
                if !joined.is_empty() {
                    joined.push_str(", ");
                }
                joined.push_str(value);
            }
            Err(_) => log::trace!("ignoring non-ASCII {} header value", name),
        }
    }

    joined
}

/// Returns the request's cached [`Accepts`], computing it on first access.
fn cached<M: HttpMessage>(msg: &M) -> Ref<'_, Accepts> {
    if !msg.extensions().contains::<Accepts>() {
        let accepts = Accepts::from_headers(msg.headers());
        msg.extensions_mut().insert(accepts);
    }

    Ref::map(msg.extensions(), |data| data.get().unwrap())
}

/// Access to a request's [`Accepts`] outside of extractor position, e.g. in middleware.
///
/// # Panics
/// Panics if the request's extensions container is already borrowed.
pub trait AcceptsExt {
    /// Returns the negotiation context for this request.
    fn accepts(&self) -> Ref<'_, Accepts>;
}

impl AcceptsExt for HttpRequest {
    #[inline]
    fn accepts(&self) -> Ref<'_, Accepts> {
        cached(self)
    }
}

impl AcceptsExt for ServiceRequest {
    #[inline]
    fn accepts(&self) -> Ref<'_, Accepts> {
        cached(self)
    }
}

impl FromRequest for Accepts {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    #[inline]
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ok(req.accepts().clone())
    }
}

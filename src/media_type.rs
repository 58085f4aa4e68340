//! Media ranges from the `Accept` header and the server-side candidates they are matched against.

use std::fmt;

use mime::Mime;
use smallvec::SmallVec;

use crate::preference::{Negotiable, Specificity};

/// A media range from the `Accept` header, e.g. `text/html`, `image/*`, `*/*;level=1`.
///
/// The range is kept as the client wrote it for listing; comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    raw: String,
    type_: String,
    subtype: String,
    params: SmallVec<[(String, String); 1]>,
}

impl MediaRange {
    /// Returns the top-level type, lowercased. `*` for a full wildcard.
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Returns the subtype, lowercased. `*` for a wildcard subtype.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Returns the parameters the range requires, excluding `q` and accept-extensions.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns true if a server-side candidate falls within this range.
    ///
    /// The candidate's own `q` parameter is ignored.
    pub(crate) fn matches(&self, candidate: &Candidate<'_>) -> bool {
        let mime = match candidate {
            Candidate::Mime(mime) => mime,
            Candidate::Verbatim(token) => return self.raw.eq_ignore_ascii_case(token),
        };

        let type_matches = match self.specificity() {
            Specificity::Wildcard => true,
            Specificity::SubtypeWildcard => {
                mime.type_().as_str().eq_ignore_ascii_case(&self.type_)
            }
            Specificity::Exact => {
                mime.type_().as_str().eq_ignore_ascii_case(&self.type_)
                    && mime.subtype().as_str().eq_ignore_ascii_case(&self.subtype)
            }
        };

        type_matches
            && self.params.iter().all(|(name, value)| {
                mime.params().any(|(cand_name, cand_value)| {
                    cand_name.as_str().eq_ignore_ascii_case(name)
                        && cand_value.as_str().eq_ignore_ascii_case(value)
                })
            })
    }
}

impl Negotiable for MediaRange {
    const RANK_BY_SPECIFICITY: bool = true;

    fn from_parts(item: &str, params: &[(&str, &str)]) -> Option<Self> {
        let (type_, subtype) = item.split_once('/')?;
        let (type_, subtype) = (type_.trim(), subtype.trim());

        let valid_name = |name: &str| {
            !name.is_empty() && !name.contains(|c: char| c.is_ascii_whitespace() || c == '/')
        };

        if !valid_name(type_) || !valid_name(subtype) {
            return None;
        }

        // `*/html` is not a valid range
        if type_ == "*" && subtype != "*" {
            return None;
        }

        Some(MediaRange {
            raw: item.trim().to_owned(),
            type_: type_.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params: params
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), (*value).to_owned()))
                .collect(),
        })
    }

    fn any() -> Self {
        MediaRange {
            raw: "*/*".to_owned(),
            type_: "*".to_owned(),
            subtype: "*".to_owned(),
            params: SmallVec::new(),
        }
    }

    fn specificity(&self) -> Specificity {
        match (self.type_.as_str(), self.subtype.as_str()) {
            ("*", _) => Specificity::Wildcard,
            (_, "*") => Specificity::SubtypeWildcard,
            _ => Specificity::Exact,
        }
    }

    fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for MediaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)?;

        for (name, value) in &self.params {
            write!(f, "; {}={}", name, value)?;
        }

        Ok(())
    }
}

/// A server-offered type after short-form resolution.
#[derive(Debug, Clone)]
pub(crate) enum Candidate<'a> {
    /// A full media type, either given as such or resolved from an extension.
    Mime(Mime),

    /// A short form with no known media type; only matched by an identical range.
    Verbatim(&'a str),
}

impl<'a> Candidate<'a> {
    /// Resolves a candidate such as `text/html`, `application/json; charset=utf-8` or `json`.
    ///
    /// Strings without a `/` are looked up as file extensions (`json`, `.json`, `data.json`).
    pub(crate) fn resolve(candidate: &'a str) -> Self {
        let candidate = candidate.trim();

        if candidate.contains('/') {
            return match candidate.parse::<Mime>() {
                Ok(mime) => Candidate::Mime(mime),
                Err(_) => Candidate::Verbatim(candidate),
            };
        }

        let ext = candidate.rsplit('.').next().unwrap_or(candidate);

        match mime_guess::from_ext(ext).first() {
            Some(mime) => Candidate::Mime(mime),
            None => Candidate::Verbatim(candidate),
        }
    }
}

//! Preference entries and ranked preference lists shared by all four negotiation headers.

use std::fmt;

use actix_web::http::header::Quality;
use smallvec::SmallVec;

/// How narrowly a preference entry selects values.
///
/// Ordered from least to most specific so that `Ord` can be used directly as a ranking key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// `*` or `*/*`.
    Wildcard,

    /// A media range with a wildcard subtype, e.g. `text/*`.
    SubtypeWildcard,

    /// A concrete token or `type/subtype`.
    Exact,
}

/// A preference item parsed from one comma-separated element of a negotiation header.
///
/// Implemented by [`Token`] and [`MediaRange`](crate::MediaRange). This trait is sealed.
pub trait Negotiable: sealed::Sealed + Sized {
    /// Whether ranking uses specificity between entries of equal quality.
    ///
    /// Only media ranges do; charsets, encodings and languages keep header order on ties.
    const RANK_BY_SPECIFICITY: bool;

    /// Parses the item part of an element. `params` are the parameters preceding `q`.
    fn from_parts(item: &str, params: &[(&str, &str)]) -> Option<Self>;

    /// The entry used when the client sent no usable preferences.
    fn any() -> Self;

    /// How narrowly this item selects values.
    fn specificity(&self) -> Specificity;

    /// The token as the client wrote it, without parameters.
    fn as_str(&self) -> &str;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Token {}
    impl Sealed for crate::MediaRange {}
}

/// A single client preference: an item, its weight and its position in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference<T> {
    /// The preferred item.
    pub item: T,

    /// Client weight for the item. Zero means the item is not acceptable.
    pub quality: Quality,

    /// Position of the element in the header, used as the final tie-break.
    pub(crate) index: usize,
}

impl<T: Negotiable> Preference<T> {
    /// Parses one header element such as `gzip;q=0.5` or `text/html; level=1; q=0.8`.
    ///
    /// Returns `None` for elements without a usable item. A malformed `q` keeps the default
    /// weight instead of discarding the element.
    fn parse(element: &str, index: usize) -> Option<Self> {
        let mut parts = split_unquoted(element, b';').into_iter();
        let item = parts.next()?.trim();

        let mut quality = Quality::MAX;
        let mut params = SmallVec::<[(&str, &str); 2]>::new();

        for param in parts {
            let (name, value) = match param.split_once('=') {
                Some((name, value)) => (name.trim(), unquote(value.trim())),
                None => continue,
            };

            if name.eq_ignore_ascii_case("q") {
                quality = parse_quality(value);

                // anything after the weight is an accept-extension, not part of the item
                break;
            }

            params.push((name, value));
        }

        match T::from_parts(item, &params) {
            Some(item) => Some(Preference {
                item,
                quality,
                index,
            }),
            None => {
                log::trace!("skipping malformed negotiation header element {:?}", element);
                None
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Preference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.item, f)?;

        if self.quality == Quality::MAX {
            Ok(())
        } else {
            write!(f, "; q={}", self.quality)
        }
    }
}

/// A client's preferences for one negotiation dimension, ranked from most to least preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences<T> {
    items: Vec<Preference<T>>,

    /// True when the header was missing or carried nothing usable.
    defaulted: bool,
}

impl<T: Negotiable> Preferences<T> {
    /// Parses and ranks a raw header value.
    pub(crate) fn parse(header: &str) -> Self {
        let items = split_unquoted(header, b',')
            .into_iter()
            .map(str::trim)
            .filter(|element| !element.is_empty())
            .enumerate()
            .filter_map(|(index, element)| Preference::parse(element, index))
            .collect::<Vec<_>>();

        if items.is_empty() {
            return Preferences {
                items: vec![Preference {
                    item: T::any(),
                    quality: Quality::MAX,
                    index: 0,
                }],
                defaulted: true,
            };
        }

        let mut prefs = Preferences {
            items,
            defaulted: false,
        };
        prefs.rank();
        prefs
    }

    /// Appends an implicit entry unless the client already covered it, either by naming an
    /// equivalent token or with an explicit wildcard.
    pub(crate) fn with_implicit(mut self, item: T) -> Self {
        let listed = !self.defaulted
            && self.items.iter().any(|pref| {
                pref.item.specificity() == Specificity::Wildcard
                    || pref.item.as_str().eq_ignore_ascii_case(item.as_str())
            });

        if !listed {
            let index = self.items.iter().map(|pref| pref.index + 1).max().unwrap_or(0);

            self.items.push(Preference {
                item,
                quality: Quality::MAX,
                index,
            });
            self.rank();
        }

        self
    }

    /// Sorts by quality descending, then specificity descending (if enabled for `T`), then
    /// header position ascending.
    ///
    /// Header position is part of the key so the result does not rely on sort stability.
    fn rank(&mut self) {
        self.items.sort_by(|a, b| {
            b.quality
                .cmp(&a.quality)
                .then_with(|| {
                    if T::RANK_BY_SPECIFICITY {
                        b.item.specificity().cmp(&a.item.specificity())
                    } else {
                        std::cmp::Ordering::Equal
                    }
                })
                .then_with(|| a.index.cmp(&b.index))
        });
    }

    /// Returns the acceptable items as written by the client, most preferred first.
    ///
    /// Items with `q=0` are excluded.
    pub fn tokens(&self) -> Vec<&str> {
        self.acceptable().map(|pref| pref.item.as_str()).collect()
    }

    /// Iterates over all ranked entries, including rejected (`q=0`) ones.
    pub fn iter(&self) -> impl Iterator<Item = &Preference<T>> {
        self.items.iter()
    }

    /// Returns true if the header was missing or held no usable entries.
    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }

    fn acceptable(&self) -> impl Iterator<Item = &Preference<T>> {
        self.items.iter().filter(|pref| pref.quality != Quality::ZERO)
    }

    /// Selects the index of the best candidate.
    ///
    /// Walks acceptable entries in ranked order; the first entry matching any candidate wins and
    /// candidate order breaks ties. A candidate is never selected when the most specific entry
    /// matching it has `q=0`, even if a broader wildcard would accept it.
    pub(crate) fn negotiate<C>(
        &self,
        candidates: &[C],
        matches: impl Fn(&T, &C) -> bool,
    ) -> Option<usize> {
        let rejected = candidates
            .iter()
            .map(|candidate| {
                self.items
                    .iter()
                    .filter(|pref| matches(&pref.item, candidate))
                    .max_by_key(|pref| (pref.item.specificity(), pref.quality))
                    .map_or(false, |pref| pref.quality == Quality::ZERO)
            })
            .collect::<SmallVec<[bool; 8]>>();

        self.acceptable().find_map(|pref| {
            candidates
                .iter()
                .enumerate()
                .find(|(idx, candidate)| !rejected[*idx] && matches(&pref.item, candidate))
                .map(|(idx, _)| idx)
        })
    }
}

/// A charset, content-coding or language tag as sent by the client. `*` is the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Constructs a token from its string form.
    pub fn new(token: impl Into<String>) -> Self {
        Token(token.into())
    }

    /// Returns true for the `*` wildcard.
    pub fn is_any(&self) -> bool {
        self.0 == "*"
    }

    /// Case-insensitive token comparison; `*` matches everything.
    pub fn matches(&self, candidate: &str) -> bool {
        self.is_any() || self.0.eq_ignore_ascii_case(candidate.trim())
    }
}

impl Negotiable for Token {
    const RANK_BY_SPECIFICITY: bool = false;

    fn from_parts(item: &str, _params: &[(&str, &str)]) -> Option<Self> {
        if item.is_empty() || item.contains(|c: char| c.is_ascii_whitespace() || c == '"') {
            return None;
        }

        Some(Token(item.to_owned()))
    }

    fn any() -> Self {
        Token("*".to_owned())
    }

    fn specificity(&self) -> Specificity {
        if self.is_any() {
            Specificity::Wildcard
        } else {
            Specificity::Exact
        }
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses the value of a `q` parameter without failing.
///
/// Unparsable values keep full weight; numbers outside `0..=1` are clamped.
fn parse_quality(value: &str) -> Quality {
    match value.trim().parse::<f32>() {
        Ok(q) => Quality::try_from(q.clamp(0.0, 1.0)).unwrap_or(Quality::MAX),
        Err(_) => {
            log::trace!("unparsable quality value {:?}; using q=1", value);
            Quality::MAX
        }
    }
}

/// Splits on `sep` outside of double-quoted strings.
///
/// Backslash escapes inside quotes are honoured. An unterminated quote runs to the end of input.
pub(crate) fn split_unquoted(input: &str, sep: u8) -> SmallVec<[&str; 4]> {
    let bytes = input.as_bytes();
    let mut parts = SmallVec::new();

    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (idx, &byte) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }

        match byte {
            b'\\' if quoted => escaped = true,
            b'"' => quoted = !quoted,
            _ if byte == sep && !quoted => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    parts.push(&input[start..]);
    parts
}

/// Strips surrounding double quotes from a parameter value.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .unwrap_or(value)
}

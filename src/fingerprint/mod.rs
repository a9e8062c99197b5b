//! # Tag-Structure Fingerprinting
//!
//! Turns a page into a structural signature that ignores textual content.
//! The pipeline is a chain of pure functions:
//!
//! 1. [`lex`] splits markup into raw `<...>` tokens
//! 2. [`split_script_regions`] fences off `<script>` bodies
//! 3. [`normalize_regions`] expands self-closing tags and promotes attributes
//!    to `<ATTRIB@name>` pseudo-tags outside script bodies, re-lexing after
//!    each rewrite
//! 4. [`classify`] labels tokens and [`strip_comments`] drops comments
//! 5. [`encode`] maps the stream to a [`NumericSeries`] using a
//!    [`TagVocabulary`] scoped to one comparison
//!
//! Two pages are then compared in the frequency domain by
//! [`crate::spectral`].
//!
//! All functions are total: malformed markup yields fewer or odd tokens, never
//! an error.

mod classify;
mod encoder;
mod lexer;
mod normalize;

pub use classify::{
    ClassifiedToken, TagKind, TokenRegion, classify, split_script_regions, strip_comments,
};
pub use encoder::{CloseEncoding, NumericSeries, TagVocabulary, encode};
pub use lexer::{lex, relex};
pub use normalize::{
    ATTRIBUTE_TAG_PREFIX, expand_self_closing, normalize, normalize_regions, promote_attributes,
    tag_name,
};

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::spectral::{self, Alignment, SpectralError};

/// An unparsed `<...>` fragment and its 1-based emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    /// Position in the token stream, starting at 1
    pub position: usize,

    /// Fragment text including the angle brackets
    pub text: String,
}

impl RawToken {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

/// Knobs for a pairwise comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityOptions {
    /// Encoding used for closing tags
    #[serde(default)]
    pub close_encoding: CloseEncoding,

    /// Padding strategy for series of unequal length
    #[serde(default)]
    pub alignment: Alignment,
}

/// Classified, comment-free tag events of a document
#[instrument(level = "trace", skip(html), fields(bytes = html.len()))]
pub fn tag_events(html: &str) -> Vec<ClassifiedToken> {
    let raw = lex(html);
    let normalized = normalize_regions(&split_script_regions(&raw));
    let events = strip_comments(classify(&normalized));
    trace!(raw = raw.len(), events = events.len(), "tag events extracted");
    events
}

/// Numeric fingerprint of a single document with its own vocabulary
pub fn fingerprint(html: &str) -> NumericSeries {
    Fingerprint::from_html(html).encode_alone(CloseEncoding::default())
}

/// Fingerprints of two documents encoded with their shared vocabulary
pub fn fingerprint_pair(
    a: &str,
    b: &str,
    close_encoding: CloseEncoding,
) -> (NumericSeries, NumericSeries) {
    Fingerprint::from_html(a).encode_pair(&Fingerprint::from_html(b), close_encoding)
}

/// Structural similarity of two documents in `(0, 1]`
pub fn compare_html(a: &str, b: &str, options: &SimilarityOptions) -> Result<f64, SpectralError> {
    Fingerprint::from_html(a).similarity(&Fingerprint::from_html(b), options)
}

/// Tag-event stream of one page, kept unencoded so each comparison can build
/// its own vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    events: Vec<ClassifiedToken>,
}

impl Fingerprint {
    pub fn from_html(html: &str) -> Self {
        Self {
            events: tag_events(html),
        }
    }

    pub fn events(&self) -> &[ClassifiedToken] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Encode with a vocabulary built from this document only
    pub fn encode_alone(&self, close_encoding: CloseEncoding) -> NumericSeries {
        let vocabulary = TagVocabulary::from_documents([self.events()]);
        encode(&self.events, &vocabulary, close_encoding)
    }

    /// Encode both documents against the union of their opening tags
    pub fn encode_pair(
        &self,
        other: &Fingerprint,
        close_encoding: CloseEncoding,
    ) -> (NumericSeries, NumericSeries) {
        let vocabulary = TagVocabulary::from_documents([self.events(), other.events()]);
        (
            encode(&self.events, &vocabulary, close_encoding),
            encode(&other.events, &vocabulary, close_encoding),
        )
    }

    /// Spectral similarity to `other`
    pub fn similarity(
        &self,
        other: &Fingerprint,
        options: &SimilarityOptions,
    ) -> Result<f64, SpectralError> {
        let (a, b) = self.encode_pair(other, options.close_encoding);
        spectral::similarity_with(&a, &b, options.alignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[ClassifiedToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    fn kinds(tokens: &[ClassifiedToken]) -> Vec<TagKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_single_element_has_two_events() {
        assert_eq!(fingerprint("<p></p>").len(), 2);
        assert_eq!(fingerprint("<p></p>"), vec![1.0, -1.0]);
    }

    #[test]
    fn test_self_closing_matches_explicit_pair() {
        let self_closing = tag_events("<br/>");
        let explicit = tag_events("<br></br>");
        assert_eq!(kinds(&self_closing), kinds(&explicit));
        assert_eq!(kinds(&self_closing), vec![TagKind::Open, TagKind::Close]);
        assert_eq!(fingerprint("<br/>"), fingerprint("<br></br>"));
    }

    #[test]
    fn test_attribute_promoted_after_owner() {
        let events = tag_events("<a href='x'></a>");
        assert_eq!(
            texts(&events),
            vec!["<a>", "<ATTRIB@href>", "</ATTRIB@href>", "</a>"]
        );
        assert_eq!(
            kinds(&events),
            vec![TagKind::Open, TagKind::Open, TagKind::Close, TagKind::Close]
        );
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(fingerprint("<p><!-- c --></p>"), fingerprint("<p></p>"));
        assert_eq!(tag_events("<p><!-- c --></p>"), tag_events("<p></p>"));
    }

    #[test]
    fn test_anchor_scenario() {
        let html = "<a href=\"/\">hi</a>";
        let raw = lex(html);
        assert_eq!(
            raw,
            vec![RawToken::new(1, "<a href=\"/\">"), RawToken::new(2, "</a>")]
        );
        assert_eq!(
            kinds(&classify(&raw)),
            vec![TagKind::Open, TagKind::Close]
        );
        let score = compare_html(html, html, &SimilarityOptions::default()).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_pair_shares_vocabulary() {
        let (a, b) = fingerprint_pair(
            "<div><p></p></div>",
            "<div><span></span></div>",
            CloseEncoding::Negated,
        );
        assert_eq!(a[0], b[0]);
        assert_eq!(a[3], b[3]);
        assert_eq!(a, vec![1.0, 2.0, -2.0, -1.0]);
        assert_eq!(b, vec![1.0, 3.0, -3.0, -1.0]);
    }

    #[test]
    fn test_self_similarity_is_one() {
        let html = r#"<!DOCTYPE html>
<html><head><title>t</title><meta charset="utf-8"/></head>
<body><div class="product"><h1>Name</h1><img src="x.png"/><span class=price>9</span></div>
<script>var a = "<b>" < 3;</script></body></html>"#;
        for encoding in [CloseEncoding::Negated, CloseEncoding::Zero] {
            for alignment in [Alignment::PadShorter, Alignment::FullLinear] {
                let options = SimilarityOptions {
                    close_encoding: encoding,
                    alignment,
                };
                assert_eq!(compare_html(html, html, &options).unwrap(), 1.0);
            }
        }
    }

    #[test]
    fn test_similar_pages_score_higher_than_dissimilar() {
        let product_a = "<html><body><div class=item><h1>A</h1><p>x</p></div></body></html>";
        let product_b = "<html><body><div class=item><h1>B</h1><p>y</p></div></body></html>";
        let listing = "<html><body><ul><li><a href=1>1</a></li><li><a href=2>2</a></li><li><a href=3>3</a></li></ul><table><tr><td></td></tr></table></body></html>";
        let options = SimilarityOptions::default();
        let same = compare_html(product_a, product_b, &options).unwrap();
        let different = compare_html(product_a, listing, &options).unwrap();
        assert_eq!(same, 1.0);
        assert!(different < same);
        assert!(different > 0.0);
    }

    #[test]
    fn test_text_only_document_is_empty() {
        let fp = Fingerprint::from_html("no markup at all");
        assert!(fp.is_empty());
        let err = fp.similarity(&fp, &SimilarityOptions::default());
        assert!(matches!(err, Err(SpectralError::EmptySeries)));
    }

    #[test]
    fn test_script_body_passes_through_unnormalised() {
        let events = tag_events("<body><script>x = '<br/>';</script><p></p></body>");
        assert_eq!(
            texts(&events),
            vec!["<body>", "<script>", "<br/>", "</script>", "<p>", "</p>", "</body>"]
        );
    }

    #[test]
    fn test_unterminated_script_keeps_following_structure() {
        let events = tag_events("<body><script>var x = 1;<p></p></body>");
        assert_eq!(
            texts(&events),
            vec!["<body>", "<script>", "<p>", "</p>", "</body>"]
        );
        assert_eq!(
            kinds(&events),
            vec![
                TagKind::Open,
                TagKind::Open,
                TagKind::Open,
                TagKind::Close,
                TagKind::Close
            ]
        );
    }
}

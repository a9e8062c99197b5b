//! Token classification and script-region splitting

use serde::{Deserialize, Serialize};

use super::RawToken;
use super::normalize::{is_self_closing, tag_name};

/// Kind of a tag token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Open,
    Close,
    Comment,
}

impl TagKind {
    /// Classify raw token text: `<!` is a comment, `</` a closing tag,
    /// everything else opens
    pub fn of(text: &str) -> Self {
        if text.starts_with("<!") {
            TagKind::Comment
        } else if text.starts_with("</") {
            TagKind::Close
        } else {
            TagKind::Open
        }
    }
}

/// A token labelled with its [`TagKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedToken {
    /// 1-based order in the (normalised) document
    pub position: usize,

    /// Token text including angle brackets
    pub text: String,

    /// Open, close or comment
    pub kind: TagKind,
}

impl ClassifiedToken {
    /// Bare tag name of this token, without brackets or attributes
    pub fn name(&self) -> &str {
        tag_name(&self.text)
    }
}

/// Label every token
pub fn classify(tokens: &[RawToken]) -> Vec<ClassifiedToken> {
    tokens
        .iter()
        .map(|token| ClassifiedToken {
            position: token.position,
            text: token.text.clone(),
            kind: TagKind::of(&token.text),
        })
        .collect()
}

/// Drop comment tokens, they carry no structure
pub fn strip_comments(tokens: Vec<ClassifiedToken>) -> Vec<ClassifiedToken> {
    tokens
        .into_iter()
        .filter(|token| token.kind != TagKind::Comment)
        .collect()
}

/// A run of the token stream on one side of a script boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRegion {
    /// Structural markup, normalised downstream
    Markup(Vec<RawToken>),

    /// Tokens after a `<script ...>` opener up to and including its
    /// `</script>` closer, passed through verbatim
    Script(Vec<RawToken>),
}

/// Split the stream at `<script>` boundaries
///
/// The opener stays in the markup before it. Everything after it, through the
/// matching `</script>`, forms a script region that normalisation must not
/// touch. A region that is never closed ends at end of input, so the tokens
/// after it are still reported.
pub fn split_script_regions(tokens: &[RawToken]) -> Vec<TokenRegion> {
    let mut regions = Vec::new();
    let mut current = Vec::new();
    let mut in_script = false;

    for token in tokens {
        let is_script = tag_name(&token.text).eq_ignore_ascii_case("script");
        let kind = TagKind::of(&token.text);
        current.push(token.clone());

        if in_script {
            if is_script && kind == TagKind::Close {
                regions.push(TokenRegion::Script(std::mem::take(&mut current)));
                in_script = false;
            }
        } else if is_script && kind == TagKind::Open && !is_self_closing(&token.text) {
            regions.push(TokenRegion::Markup(std::mem::take(&mut current)));
            in_script = true;
        }
    }

    if !current.is_empty() {
        regions.push(if in_script {
            TokenRegion::Script(current)
        } else {
            TokenRegion::Markup(current)
        });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::lexer::lex;

    fn kinds(tokens: &[ClassifiedToken]) -> Vec<TagKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_classify_kinds() {
        let tokens = classify(&lex("<a href=\"/\">hi</a>"));
        assert_eq!(kinds(&tokens), vec![TagKind::Open, TagKind::Close]);
        assert_eq!(tokens[0].position, 1);
        assert_eq!(tokens[1].position, 2);
    }

    #[test]
    fn test_classify_comment_and_doctype() {
        let tokens = classify(&lex("<!DOCTYPE html><!-- x --><p></p>"));
        assert_eq!(
            kinds(&tokens),
            vec![
                TagKind::Comment,
                TagKind::Comment,
                TagKind::Open,
                TagKind::Close
            ]
        );
    }

    #[test]
    fn test_strip_comments() {
        let tokens = strip_comments(classify(&lex("<p><!-- c --></p>")));
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["<p>", "</p>"]);
    }

    #[test]
    fn test_token_name() {
        let tokens = classify(&lex("<div class=x></div >"));
        assert_eq!(tokens[0].name(), "div");
        assert_eq!(tokens[1].name(), "div");
    }

    fn region_texts(region: &TokenRegion) -> Vec<&str> {
        let tokens = match region {
            TokenRegion::Markup(tokens) | TokenRegion::Script(tokens) => tokens,
        };
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_script_body_forms_its_own_region() {
        let html = "<body><script type=\"text/javascript\">if (a<b) { x = \"<div>\"; }</script><p></p></body>";
        let regions = split_script_regions(&lex(html));
        assert_eq!(regions.len(), 3);
        assert!(matches!(regions[0], TokenRegion::Markup(_)));
        assert_eq!(
            region_texts(&regions[0]),
            vec!["<body>", "<script type=\"text/javascript\">"]
        );
        assert!(matches!(regions[1], TokenRegion::Script(_)));
        assert_eq!(region_texts(&regions[1]), vec!["<div>", "</script>"]);
        assert_eq!(region_texts(&regions[2]), vec!["<p>", "</p>", "</body>"]);
    }

    #[test]
    fn test_self_closing_script_does_not_open_region() {
        let regions = split_script_regions(&lex("<script src=\"a.js\"/><p></p>"));
        assert_eq!(regions.len(), 1);
        assert!(matches!(regions[0], TokenRegion::Markup(_)));
        assert_eq!(region_texts(&regions[0]).len(), 3);
    }

    #[test]
    fn test_script_regions_case_insensitive() {
        let regions = split_script_regions(&lex("<SCRIPT><i></SCRIPT><b></b>"));
        assert_eq!(region_texts(&regions[0]), vec!["<SCRIPT>"]);
        assert_eq!(region_texts(&regions[1]), vec!["<i>", "</SCRIPT>"]);
        assert_eq!(region_texts(&regions[2]), vec!["<b>", "</b>"]);
    }

    #[test]
    fn test_unterminated_script_runs_to_end_of_input() {
        let regions = split_script_regions(&lex("<body><script>var x = 1;<p></p></body>"));
        assert_eq!(regions.len(), 2);
        assert_eq!(region_texts(&regions[0]), vec!["<body>", "<script>"]);
        assert!(matches!(regions[1], TokenRegion::Script(_)));
        assert_eq!(region_texts(&regions[1]), vec!["<p>", "</p>", "</body>"]);
    }

    #[test]
    fn test_no_script_is_a_single_markup_region() {
        let tokens = lex("<div><p></p></div>");
        assert_eq!(
            split_script_regions(&tokens),
            vec![TokenRegion::Markup(tokens)]
        );
        assert!(split_script_regions(&[]).is_empty());
    }
}

//! Token stream normalisation
//!
//! Two rewrites run here, each followed by a re-lex of the whole stream:
//!
//! - self-closing tags (`<br/>`) become explicit open/close pairs
//! - `name=value` attributes are promoted to nested `<ATTRIB@name>` pseudo-tags
//!   and the owning tag is truncated to `<tagname>`
//!
//! Downstream stages only ever see the re-lexed output. Script regions skip
//! both rewrites.

use std::sync::OnceLock;

use regex::Regex;

use super::RawToken;
use super::classify::TokenRegion;
use super::lexer::relex;

/// Prefix used for synthetic attribute pseudo-tags
pub const ATTRIBUTE_TAG_PREFIX: &str = "ATTRIB@";

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([^\s=/>"']+)\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'<>`]+)"#)
            .expect("attribute pattern is valid")
    })
}

/// Bare tag name: the first word after `<` (or `</`), stopping at whitespace,
/// `/` or `>`
pub fn tag_name(text: &str) -> &str {
    let inner = text.strip_prefix("</").or_else(|| text.strip_prefix('<'));
    let Some(inner) = inner else {
        return "";
    };
    let end = inner
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(inner.len());
    &inner[..end]
}

fn is_close_or_comment(text: &str) -> bool {
    text.starts_with("</") || text.starts_with("<!")
}

/// Whether the token is written in `<tag ... />` form
pub fn is_self_closing(text: &str) -> bool {
    !is_close_or_comment(text) && text.ends_with("/>")
}

/// Rewrite every self-closing token into an opening tag followed by a
/// synthesized `</name>` closer, then re-lex
pub fn expand_self_closing(tokens: &[RawToken]) -> Vec<RawToken> {
    let mut expanded = Vec::with_capacity(tokens.len());

    for token in tokens {
        if !is_self_closing(&token.text) {
            expanded.push(token.clone());
            continue;
        }

        let name = tag_name(&token.text).to_string();
        let body = token.text[..token.text.len() - 2].trim_end();
        expanded.push(RawToken::new(token.position, format!("{}>", body)));
        expanded.push(RawToken::new(token.position, format!("</{}>", name)));
    }

    relex(&expanded)
}

/// Promote `name=value` attributes of opening tags into nested pseudo-tag
/// pairs placed right after the owning tag, then re-lex
///
/// Closing tags and `<!...>` tokens are passed through untouched.
pub fn promote_attributes(tokens: &[RawToken]) -> Vec<RawToken> {
    let mut promoted = Vec::with_capacity(tokens.len());

    for token in tokens {
        let name = tag_name(&token.text);
        if is_close_or_comment(&token.text) || name.is_empty() {
            promoted.push(token.clone());
            continue;
        }

        let rest = token.text[1 + name.len()..].trim_end_matches('>');
        promoted.push(RawToken::new(token.position, format!("<{}>", name)));

        for capture in attribute_pattern().captures_iter(rest) {
            let attribute = &capture[1];
            promoted.push(RawToken::new(
                token.position,
                format!("<{}{}>", ATTRIBUTE_TAG_PREFIX, attribute),
            ));
            promoted.push(RawToken::new(
                token.position,
                format!("</{}{}>", ATTRIBUTE_TAG_PREFIX, attribute),
            ));
        }
    }

    relex(&promoted)
}

/// Full normalisation: self-closing expansion followed by attribute promotion
pub fn normalize(tokens: &[RawToken]) -> Vec<RawToken> {
    promote_attributes(&expand_self_closing(tokens))
}

/// Normalise the markup regions, keep script regions verbatim and renumber
/// the joined stream from 1
pub fn normalize_regions(regions: &[TokenRegion]) -> Vec<RawToken> {
    regions
        .iter()
        .flat_map(|region| match region {
            TokenRegion::Markup(tokens) => normalize(tokens),
            TokenRegion::Script(tokens) => tokens.clone(),
        })
        .enumerate()
        .map(|(index, token)| RawToken::new(index + 1, token.text))
        .collect()
}

//! Tag lexer: splits raw markup into `<...>` fragments

use super::RawToken;

/// Scan markup and emit every `<...>` span as a [`RawToken`]
///
/// A `<` seen while already inside a tag restarts accumulation, so only the
/// innermost span survives. An unterminated trailing `<...` is dropped.
/// Text between tags is not represented.
pub fn lex(markup: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut current: Option<String> = None;

    for ch in markup.chars() {
        match ch {
            '<' => current = Some(String::from('<')),
            '>' => {
                if let Some(mut text) = current.take() {
                    text.push('>');
                    tokens.push(RawToken::new(tokens.len() + 1, text));
                }
            }
            _ => {
                if let Some(text) = current.as_mut() {
                    text.push(ch);
                }
            }
        }
    }

    tokens
}

/// Concatenate token texts and lex the result again
///
/// Used after every rewrite of the token stream so positions stay dense and
/// boundaries reflect the rewritten text.
pub fn relex<'a, I>(tokens: I) -> Vec<RawToken>
where
    I: IntoIterator<Item = &'a RawToken>,
{
    let joined: String = tokens.into_iter().map(|t| t.text.as_str()).collect();
    lex(&joined)
}

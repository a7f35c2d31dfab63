//! Stylesheet filtering
//!
//! The accessibility stylesheet is assembled from one baseline and then
//! trimmed according to the enabled options. Trimming works on the CSS
//! token stream, so whole `@media` blocks can be dropped without regex
//! surgery on braces. Everything that is kept is copied verbatim.

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Remove every `@media` rule whose prelude satisfies `should_drop`
///
/// The prelude passed to the predicate is the raw text between `@media`
/// and the opening brace, e.g. ` (prefers-color-scheme: dark) `.
/// Nested `@media` rules are filtered too.
///
/// # Examples
///
/// ```
/// use wcagify::parsers::css::drop_media_rules;
///
/// let css = "a { color: red; } @media print { a { color: black; } }";
/// let filtered = drop_media_rules(css, |prelude| prelude.contains("print"));
/// assert_eq!(filtered.trim(), "a { color: red; }");
/// ```
pub fn drop_media_rules<F>(css: &str, should_drop: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    filter_tokens(&mut parser, &should_drop)
}

fn filter_tokens<F>(parser: &mut Parser, should_drop: &F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut result = String::new();
    // Prelude of an @media rule whose block has not been seen yet
    let mut pending_media: Option<String> = None;

    loop {
        let token_offset = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let chunk = match token {
            Token::AtKeyword(ref name) if name.eq_ignore_ascii_case("media") => {
                if let Some(prelude) = pending_media.take() {
                    result.push_str(&prelude);
                }
                pending_media = Some(String::new());
                continue;
            }
            Token::CurlyBracketBlock => {
                let block = nested_block(parser, should_drop);

                match pending_media.take() {
                    Some(prelude) => {
                        if should_drop(&prelude) {
                            String::new()
                        } else {
                            format!("@media{prelude}{{{block}}}")
                        }
                    }
                    None => format!("{{{block}}}"),
                }
            }
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                let opening = parser.slice_from(token_offset).to_string();
                let closing = if let Token::SquareBracketBlock = token {
                    ']'
                } else {
                    ')'
                };
                let block = nested_block(parser, should_drop);
                format!("{opening}{block}{closing}")
            }
            Token::Semicolon => {
                let chunk = ";".to_string();
                if let Some(prelude) = pending_media.take() {
                    result.push_str("@media");
                    result.push_str(&prelude);
                }
                chunk
            }
            _ => parser.slice_from(token_offset).to_string(),
        };

        match pending_media.as_mut() {
            Some(prelude) => prelude.push_str(&chunk),
            None => result.push_str(&chunk),
        }
    }

    if let Some(prelude) = pending_media {
        result.push_str("@media");
        result.push_str(&prelude);
    }

    result
}

fn nested_block<F>(parser: &mut Parser, should_drop: &F) -> String
where
    F: Fn(&str) -> bool,
{
    parser
        .parse_nested_block(|parser| Ok::<String, ParseError<()>>(filter_tokens(parser, should_drop)))
        .unwrap_or_default()
}

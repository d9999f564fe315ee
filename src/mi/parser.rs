//! MI request line grammar.
//!
//! Parsing is two-phase: a line is first split into words on raw delimiters
//! and quoting, then only the first word is inspected for the correlation
//! token and command name. A quoted word decodes `\x` to the literal `x` for
//! any `x`; the closing quote ends the word even when more characters follow
//! without a delimiter, and end of input closes an unterminated quote.

use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, IterParser, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Malformed request line; no command can be recovered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to parse input")]
pub struct ParseError;

/// One parsed request: correlation token (possibly empty), command name and
/// raw argument words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub token: String,
    pub command: String,
    pub args: Vec<String>,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn word<'a>() -> impl Parser<'a, &'a str, String, Err<'a>> + Clone {
    let escaped = just('\\').ignore_then(any());
    let quoted = just('"')
        .ignore_then(
            choice((escaped, any().filter(|c: &char| *c != '"')))
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just('"').ignored().or(end()));
    let plain = any()
        .filter(|c: &char| !is_delimiter(*c) && *c != '"')
        .then(any().filter(|c: &char| !is_delimiter(*c)).repeated())
        .to_slice()
        .map(str::to_string);

    choice((quoted, plain)).labelled("word")
}

fn words<'a>() -> impl Parser<'a, &'a str, Vec<String>, Err<'a>> {
    text::whitespace()
        .ignore_then(
            word()
                .then_ignore(text::whitespace())
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
}

/// Head word split: optional decimal digit run, a mandatory `-`, then the
/// command name up to the end of the word.
fn head<'a>() -> impl Parser<'a, &'a str, (String, String), Err<'a>> {
    any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .to_slice()
        .map(str::to_string)
        .then_ignore(just('-'))
        .then(any().repeated().to_slice().map(str::to_string))
        .then_ignore(end())
        .labelled("command word")
}

/// Split a raw line into delimiter-separated words, honoring quoting.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    words().parse(line).into_result().map_err(|_| ParseError)
}

impl Request {
    pub fn parse(line: &str) -> Result<Request, ParseError> {
        let mut words = tokenize(line)?;
        if words.is_empty() {
            return Err(ParseError);
        }

        let first = words.remove(0);
        let (token, command) = head()
            .parse(first.as_str())
            .into_result()
            .map_err(|_| ParseError)?;

        Ok(Request {
            token,
            command,
            args: words,
        })
    }
}

//! Tag grammar and tokenizer for macro text.
//!
//! The bracket grammar (`[cursor]`, `[input:Name]`, `[key:enter]`, ... plus
//! the braced `{selection}` marker) is the interchange format for macro
//! bodies. Tokenization is total: content that does not match a known form
//! stays literal text, so unknown or malformed tags degrade to plain display
//! text instead of breaking rendering.

use once_cell::sync::Lazy;
use regex::Regex;

/// Any bracketed or braced run. Candidates are classified separately; an
/// unterminated bracket never matches and therefore stays literal.
static TAG_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\[\]]*\]|\{[^{}]*\}").expect("tag candidate pattern"));

/// Recognized tag kinds. Keyword matching is case-insensitive; arguments keep
/// their original spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    /// `[cursor]`: intended cursor position after paste.
    Cursor,
    /// `[paste]`: clipboard-paste insertion point.
    Paste,
    /// `[agente]`: agent-name placeholder.
    Agent,
    /// `[input:<Name>]`: named fill-in slot.
    Input(String),
    /// `[dom:<selector>]`: DOM-read placeholder.
    Dom(String),
    /// `[key:<keyname>]`: simulated keypress.
    Key(String),
    /// `[wait:<n>]` or legacy `[wait+<n>s]`: pause in seconds.
    Wait(u64),
    /// `{selection}`: current text selection (meaningful in AI macros).
    Selection,
}

impl TagKind {
    /// Replay instructions consumed by an external macro player rather than a
    /// human reader.
    pub fn is_replay(&self) -> bool {
        matches!(self, TagKind::Key(_) | TagKind::Wait(_))
    }

    /// `[key:enter]` doubles as the message separator in chat previews.
    pub fn is_enter(&self) -> bool {
        matches!(self, TagKind::Key(name) if name.eq_ignore_ascii_case("enter"))
    }
}

/// A classified tag together with the exact span it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub raw: String,
}

/// Tokenizer output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Tag(Tag),
}

impl Token {
    /// The span of input this token covers. Concatenating every token's span,
    /// in order, reconstructs the tokenized text exactly.
    pub fn span(&self) -> &str {
        match self {
            Token::Literal(text) => text,
            Token::Tag(tag) => &tag.raw,
        }
    }
}

/// Split raw macro text into an ordered sequence of literal and tag tokens.
/// Total: never fails, for any input.
pub fn tokenize(raw_text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut consumed = 0;

    for candidate in TAG_CANDIDATE.find_iter(raw_text) {
        // Unrecognized candidates are skipped here and folded into the
        // literal run preceding the next recognized tag.
        if let Some(kind) = classify(candidate.as_str()) {
            push_literal(&mut tokens, &raw_text[consumed..candidate.start()]);
            tokens.push(Token::Tag(Tag {
                kind,
                raw: candidate.as_str().to_owned(),
            }));
            consumed = candidate.end();
        }
    }

    push_literal(&mut tokens, &raw_text[consumed..]);
    tokens
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if !text.is_empty() {
        tokens.push(Token::Literal(text.to_owned()));
    }
}

/// A single matcher in the classification chain. Receives the candidate body
/// without its delimiters.
type Matcher = fn(&str) -> Option<TagKind>;

/// Ordered matcher chain; the first match wins. Prefixed forms come before
/// bare keywords, and new or legacy tag forms slot in here without touching
/// the tokenizer loop.
const BRACKET_MATCHERS: &[Matcher] = &[
    match_input,
    match_dom,
    match_key,
    match_wait,
    match_keyword,
];

fn classify(raw: &str) -> Option<TagKind> {
    if let Some(body) = raw.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
        return body
            .trim()
            .eq_ignore_ascii_case("selection")
            .then_some(TagKind::Selection);
    }

    let body = raw.strip_prefix('[')?.strip_suffix(']')?;
    BRACKET_MATCHERS.iter().find_map(|matcher| matcher(body))
}

/// Case-insensitive keyword prefix, case-preserving remainder. `None` when the
/// prefix does not match or would split a multi-byte character.
fn strip_keyword_prefix<'a>(body: &'a str, keyword: &str) -> Option<&'a str> {
    let head = body.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &body[keyword.len()..])
}

fn match_input(body: &str) -> Option<TagKind> {
    let name = strip_keyword_prefix(body, "input:")?.trim();
    (!name.is_empty()).then(|| TagKind::Input(name.to_owned()))
}

fn match_dom(body: &str) -> Option<TagKind> {
    let selector = strip_keyword_prefix(body, "dom:")?.trim();
    (!selector.is_empty()).then(|| TagKind::Dom(selector.to_owned()))
}

fn match_key(body: &str) -> Option<TagKind> {
    let key = strip_keyword_prefix(body, "key:")?.trim();
    (!key.is_empty()).then(|| TagKind::Key(key.to_owned()))
}

fn match_wait(body: &str) -> Option<TagKind> {
    if let Some(arg) = strip_keyword_prefix(body, "wait:") {
        return arg.trim().parse().ok().map(TagKind::Wait);
    }

    // Legacy spelling from older stored macros: [wait+5s].
    let arg = strip_keyword_prefix(body, "wait+")?.trim();
    let seconds = arg.strip_suffix('s').or_else(|| arg.strip_suffix('S'))?;
    seconds.parse().ok().map(TagKind::Wait)
}

fn match_keyword(body: &str) -> Option<TagKind> {
    let keyword = body.trim();
    if keyword.eq_ignore_ascii_case("cursor") {
        Some(TagKind::Cursor)
    } else if keyword.eq_ignore_ascii_case("paste") {
        Some(TagKind::Paste)
    } else if keyword.eq_ignore_ascii_case("agente") {
        Some(TagKind::Agent)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(tokens: &[Token]) -> String {
        tokens.iter().map(Token::span).collect()
    }

    #[test]
    fn plain_text_is_one_literal_token() {
        let text = "no tags here, just\ntwo lines";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec![Token::Literal(text.to_owned())]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn recognizes_every_grammar_form() {
        let tokens = tokenize("[cursor][paste][agente][input:Name][dom:.customer-name][key:tab][wait:5][wait+3s]{selection}");
        let kinds: Vec<_> = tokens
            .iter()
            .map(|token| match token {
                Token::Tag(tag) => tag.kind.clone(),
                Token::Literal(text) => panic!("unexpected literal {text:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                TagKind::Cursor,
                TagKind::Paste,
                TagKind::Agent,
                TagKind::Input("Name".into()),
                TagKind::Dom(".customer-name".into()),
                TagKind::Key("tab".into()),
                TagKind::Wait(5),
                TagKind::Wait(3),
                TagKind::Selection,
            ]
        );
    }

    #[test]
    fn keywords_match_case_insensitively_arguments_preserved() {
        let tokens = tokenize("[INPUT:MixedCase] {SELECTION} [Key:Enter]");
        assert!(matches!(
            &tokens[0],
            Token::Tag(tag) if tag.kind == TagKind::Input("MixedCase".into())
        ));
        assert!(matches!(
            &tokens[2],
            Token::Tag(tag) if tag.kind == TagKind::Selection
        ));
        assert!(matches!(
            &tokens[4],
            Token::Tag(tag) if tag.kind.is_enter()
        ));
    }

    #[test]
    fn unknown_tags_stay_literal() {
        let text = "before [bogus] between {weird:thing} after";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec![Token::Literal(text.to_owned())]);
    }

    #[test]
    fn unterminated_bracket_stays_literal_to_end() {
        let text = "text [input:Open without close";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec![Token::Literal(text.to_owned())]);
    }

    #[test]
    fn token_spans_reconstruct_input_exactly() {
        let samples = [
            "Hello [input:Name], your code is [input:Code]. [key:enter][wait:3][input:Name] again.",
            "[[nested [cursor] brackets]]",
            "dangling { brace and [wait:notanumber]",
            "{selection}[agente]\nplain",
            "",
        ];
        for text in samples {
            assert_eq!(spans(&tokenize(text)), text, "coverage broken for {text:?}");
        }
    }

    #[test]
    fn empty_arguments_are_not_tags() {
        let text = "[input:] [input:   ] [dom:] [key:] [wait:]";
        assert_eq!(tokenize(text), vec![Token::Literal(text.to_owned())]);
    }

    #[test]
    fn wait_accepts_whitespace_and_legacy_suffix() {
        assert!(matches!(
            &tokenize("[wait: 10 ]")[0],
            Token::Tag(tag) if tag.kind == TagKind::Wait(10)
        ));
        assert!(matches!(
            &tokenize("[WAIT+7S]")[0],
            Token::Tag(tag) if tag.kind == TagKind::Wait(7)
        ));
    }

    #[test]
    fn non_ascii_near_keyword_boundary_is_harmless() {
        let text = "[ínput:Nome] [inputa:x]";
        assert_eq!(tokenize(text), vec![Token::Literal(text.to_owned())]);
    }
}

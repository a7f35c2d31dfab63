//! Math detection and MathML conversion
//!
//! `MathDetector` finds math in running text:
//! - display math: `$$...$$` and `\[...\]`
//! - inline math: `$...$` and `\(...\)`
//! - runs of Unicode math such as `x ≤ 1`
//!
//! `PatternMathConverter` parses the (La)TeX subset papers use most
//! (fractions, roots, scripts, Greek letters, relations, big operators)
//! into presentation MathML and reads it back as spoken text for
//! `aria-label`s. Anything it does not understand is a `MathError`; the
//! enhancer then falls back to an accessible span.

use std::fmt::Write as _;

use thiserror::Error;
use tracing::debug;

use crate::utils::static_regex;

const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Characters that make a run of Unicode text math
const UNICODE_OPERATORS: &[char] = &[
    '≤', '≥', '≠', '≈', '≡', '∈', '∉', '⊂', '⊃', '⊆', '⊇', '∪', '∩', '∑', '∫', '∏', '√', '∞',
    '×', '÷', '±', '∓', '∂', '∇', '∀', '∃', '→', '⇒', '⇔', '·', '∝',
];

const GREEK: &[(&str, &str, &str)] = &[
    ("alpha", "α", "alpha"),
    ("beta", "β", "beta"),
    ("gamma", "γ", "gamma"),
    ("delta", "δ", "delta"),
    ("epsilon", "ε", "epsilon"),
    ("varepsilon", "ε", "epsilon"),
    ("zeta", "ζ", "zeta"),
    ("eta", "η", "eta"),
    ("theta", "θ", "theta"),
    ("vartheta", "ϑ", "theta"),
    ("iota", "ι", "iota"),
    ("kappa", "κ", "kappa"),
    ("lambda", "λ", "lambda"),
    ("mu", "μ", "mu"),
    ("nu", "ν", "nu"),
    ("xi", "ξ", "xi"),
    ("pi", "π", "pi"),
    ("rho", "ρ", "rho"),
    ("sigma", "σ", "sigma"),
    ("tau", "τ", "tau"),
    ("upsilon", "υ", "upsilon"),
    ("phi", "φ", "phi"),
    ("varphi", "φ", "phi"),
    ("chi", "χ", "chi"),
    ("psi", "ψ", "psi"),
    ("omega", "ω", "omega"),
    ("Gamma", "Γ", "capital gamma"),
    ("Delta", "Δ", "capital delta"),
    ("Theta", "Θ", "capital theta"),
    ("Lambda", "Λ", "capital lambda"),
    ("Xi", "Ξ", "capital xi"),
    ("Pi", "Π", "capital pi"),
    ("Sigma", "Σ", "capital sigma"),
    ("Phi", "Φ", "capital phi"),
    ("Psi", "Ψ", "capital psi"),
    ("Omega", "Ω", "capital omega"),
];

/// Commands rendered as `<mo>`
const OPERATORS: &[(&str, &str)] = &[
    ("leq", "≤"),
    ("le", "≤"),
    ("geq", "≥"),
    ("ge", "≥"),
    ("neq", "≠"),
    ("ne", "≠"),
    ("approx", "≈"),
    ("equiv", "≡"),
    ("sim", "∼"),
    ("propto", "∝"),
    ("times", "×"),
    ("cdot", "⋅"),
    ("div", "÷"),
    ("pm", "±"),
    ("mp", "∓"),
    ("sum", "∑"),
    ("prod", "∏"),
    ("int", "∫"),
    ("oint", "∮"),
    ("in", "∈"),
    ("notin", "∉"),
    ("subset", "⊂"),
    ("subseteq", "⊆"),
    ("supset", "⊃"),
    ("supseteq", "⊇"),
    ("cup", "∪"),
    ("cap", "∩"),
    ("forall", "∀"),
    ("exists", "∃"),
    ("to", "→"),
    ("rightarrow", "→"),
    ("leftarrow", "←"),
    ("Rightarrow", "⇒"),
    ("Leftrightarrow", "⇔"),
    ("mid", "|"),
    ("ldots", "…"),
    ("cdots", "⋯"),
    ("dots", "…"),
    ("langle", "⟨"),
    ("rangle", "⟩"),
];

/// Commands rendered as `<mi>`
const IDENTIFIERS: &[(&str, &str)] = &[
    ("infty", "∞"),
    ("partial", "∂"),
    ("nabla", "∇"),
    ("emptyset", "∅"),
    ("ell", "ℓ"),
    ("hbar", "ℏ"),
];

const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "log", "ln", "exp", "lim", "max", "min", "det", "sup",
    "inf", "arg", "deg", "dim", "gcd",
];

const SPOKEN_OPERATORS: &[(&str, &str)] = &[
    ("=", "equals"),
    ("+", "plus"),
    ("-", "minus"),
    ("−", "minus"),
    ("×", "times"),
    ("⋅", "times"),
    ("·", "times"),
    ("*", "times"),
    ("/", "divided by"),
    ("÷", "divided by"),
    ("<", "less than"),
    (">", "greater than"),
    ("≤", "less than or equal to"),
    ("≥", "greater than or equal to"),
    ("≠", "not equal to"),
    ("≈", "approximately equal to"),
    ("≡", "is equivalent to"),
    ("∝", "is proportional to"),
    ("±", "plus or minus"),
    ("∈", "is an element of"),
    ("∉", "is not an element of"),
    ("⊂", "is a subset of"),
    ("⊆", "is a subset of or equal to"),
    ("∪", "union"),
    ("∩", "intersection"),
    ("∑", "the sum of"),
    ("∏", "the product of"),
    ("∫", "the integral of"),
    ("→", "to"),
    ("⇒", "implies"),
    ("⇔", "if and only if"),
    ("∀", "for all"),
    ("∃", "there exists"),
    ("√", "the square root of"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathKind {
    /// `$$...$$` or `\[...\]`
    Display,
    /// `$...$` or `\(...\)`
    Inline,
    /// Bare Unicode math in running text
    Unicode,
}

/// One piece of math found in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathSpan {
    /// Byte range in the scanned text, delimiters included
    pub start: usize,
    pub end: usize,
    /// The matched text, delimiters included
    pub source: String,
    /// The expression without delimiters
    pub content: String,
    pub kind: MathKind,
}

impl MathSpan {
    pub fn is_display(&self) -> bool {
        self.kind == MathKind::Display
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Unbalanced braces")]
    UnbalancedBraces,

    #[error("Unknown command \\{0}")]
    UnknownCommand(String),

    #[error("Command \\{0} is missing an argument")]
    MissingArgument(String),

    #[error("Empty expression")]
    Empty,
}

/// A detected span with its conversion result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathConversion {
    pub span: MathSpan,
    /// Empty when conversion failed
    pub mathml: String,
    pub fallback_text: String,
}

impl MathConversion {
    pub fn is_converted(&self) -> bool {
        !self.mathml.is_empty()
    }
}

/// Finds math in text and turns it into MathML
pub trait MathConverter {
    /// Non-overlapping spans, ordered by position
    fn detect(&self, text: &str) -> Vec<MathSpan>;

    fn to_mathml(&self, span: &MathSpan) -> Result<String, MathError>;

    /// Plain-text reading of the expression
    fn fallback_text(&self, span: &MathSpan) -> String;

    /// Detect and convert in one go; failed conversions keep an empty `mathml`
    fn convert_text(&self, text: &str) -> Vec<MathConversion> {
        self.detect(text)
            .into_iter()
            .map(|span| {
                let mathml = match self.to_mathml(&span) {
                    Ok(mathml) => mathml,
                    Err(e) => {
                        debug!(source = %span.source, error = %e, "math conversion failed");
                        String::new()
                    }
                };
                let fallback_text = self.fallback_text(&span);
                MathConversion {
                    span,
                    mathml,
                    fallback_text,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MathDetector;

impl MathDetector {
    pub fn new() -> Self {
        MathDetector
    }

    pub fn detect(&self, text: &str) -> Vec<MathSpan> {
        let mut spans = Vec::new();

        let delimited = [
            (static_regex!(r"\$\$([^$]+)\$\$"), MathKind::Display),
            (static_regex!(r"(?s)\\\[(.+?)\\\]"), MathKind::Display),
            (static_regex!(r"(?s)\\\((.+?)\\\)"), MathKind::Inline),
        ];
        for (pattern, kind) in delimited {
            for captures in pattern.captures_iter(text) {
                if let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) {
                    if !inner.as_str().trim().is_empty() {
                        spans.push(span(whole.start(), whole.end(), text, inner.as_str(), kind));
                    }
                }
            }
        }

        spans.extend(inline_dollar_spans(text));
        spans.extend(unicode_runs(text));
        keep_longest(spans)
    }
}

fn span(start: usize, end: usize, text: &str, content: &str, kind: MathKind) -> MathSpan {
    MathSpan {
        start,
        end,
        source: text[start..end].to_string(),
        content: content.trim().to_string(),
        kind,
    }
}

/// Overlapping spans keep the longer one
fn keep_longest(mut spans: Vec<MathSpan>) -> Vec<MathSpan> {
    spans.sort_by(|a, b| (b.end - b.start).cmp(&(a.end - a.start)).then(a.start.cmp(&b.start)));

    let mut kept: Vec<MathSpan> = Vec::new();
    for candidate in spans {
        if kept
            .iter()
            .all(|k| candidate.end <= k.start || candidate.start >= k.end)
        {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|s| s.start);
    kept
}

/// Pairs of single dollars; a rejected pair shifts by one so `$5 and $x$` still finds `$x$`
fn inline_dollar_spans(text: &str) -> Vec<MathSpan> {
    let dollars: Vec<usize> = text.match_indices('$').map(|(index, _)| index).collect();
    let mut spans = Vec::new();

    let mut i = 0;
    while i + 1 < dollars.len() {
        let (open, close) = (dollars[i], dollars[i + 1]);
        let inner = &text[open + 1..close];
        if !inner.is_empty() && !inner.contains('\n') && is_inline_dollar_math(inner) {
            spans.push(span(open, close + 1, text, inner, MathKind::Inline));
            i += 2;
        } else {
            i += 1;
        }
    }

    spans
}

/// `$...$` is math when it hugs its content and the content looks like math
///
/// Prices such as `$5 and $10` fail the first test, bare amounts such as
/// `$5$` the second.
fn is_inline_dollar_math(content: &str) -> bool {
    if content.starts_with(char::is_whitespace) || content.ends_with(char::is_whitespace) {
        return false;
    }
    if static_regex!(r"^\d[\d,]*(?:\.\d+)?$").is_match(content) {
        return false;
    }
    is_likely_math(content)
}

/// Whether a fragment reads as math rather than prose
pub fn is_likely_math(content: &str) -> bool {
    let content = content.trim();
    if content.is_empty() {
        return false;
    }

    static_regex!(r"\\[a-zA-Z]+|[_^]").is_match(content)
        || content.contains(UNICODE_OPERATORS)
        || static_regex!(r"[a-zA-Z0-9)]\s*[=+\-*/<>]\s*[a-zA-Z0-9(]").is_match(content)
        || static_regex!(r"^[a-zA-Z\x{0370}-\x{03FF}]$").is_match(content)
}

fn trim_trailing_punctuation(token: &str) -> &str {
    token.trim_end_matches([',', '.', ';', ':', '!', '?'])
}

fn is_math_token(token: &str) -> bool {
    if token.contains(UNICODE_OPERATORS) {
        return true;
    }
    static_regex!(r"^(?:[=+\-*/<>]|[(\[]?[a-zA-Z\x{0370}-\x{03FF}]?[0-9.]*[)\]]?|[(\[]?[a-zA-Z0-9]+[_^]\{?[a-zA-Z0-9]+\}?[)\]]?)$")
        .is_match(token)
}

/// Whitespace-separated runs of math tokens containing at least one operator
fn unicode_runs(text: &str) -> Vec<MathSpan> {
    let tokens: Vec<(usize, usize, &str)> = static_regex!(r"\S+")
        .find_iter(text)
        .map(|m| {
            let trimmed = trim_trailing_punctuation(m.as_str());
            (m.start(), m.start() + trimmed.len(), trimmed)
        })
        .collect();

    let mut runs = Vec::new();
    let mut current: Vec<(usize, usize, &str)> = Vec::new();

    for (start, end, token) in tokens {
        // trailing punctuation ends a run after this token
        let ends_clause = end < text.len() && text[end..].starts_with([',', '.', ';', ':', '!', '?']);
        if !token.is_empty() && is_math_token(token) {
            current.push((start, end, token));
            if ends_clause {
                flush_run(text, &mut current, &mut runs);
            }
        } else {
            flush_run(text, &mut current, &mut runs);
        }
    }
    flush_run(text, &mut current, &mut runs);

    runs
}

/// Keep the run when it has an operator and something to operate on
fn flush_run(text: &str, current: &mut Vec<(usize, usize, &str)>, runs: &mut Vec<MathSpan>) {
    let has_operator = current.iter().any(|(_, _, t)| t.contains(UNICODE_OPERATORS));
    let has_operand = current.iter().any(|(_, _, t)| {
        t.chars()
            .any(|c| c.is_alphanumeric() && !UNICODE_OPERATORS.contains(&c))
    });

    if has_operator && has_operand {
        if let (Some(first), Some(last)) = (current.first(), current.last()) {
            let (start, end) = (first.0, last.1);
            runs.push(span(start, end, text, &text[start..end], MathKind::Unicode));
        }
    }
    current.clear();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Command(String),
    Open,
    Close,
    Sup,
    Sub,
    Number(String),
    Letter(char),
    Symbol(char),
    Space,
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphabetic() {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    match chars.next() {
                        Some(escaped) => name.push(escaped),
                        None => {
                            tokens.push(Token::Symbol('\\'));
                            continue;
                        }
                    }
                }
                tokens.push(Token::Command(name));
            }
            '{' => tokens.push(Token::Open),
            '}' => tokens.push(Token::Close),
            '^' => tokens.push(Token::Sup),
            '_' => tokens.push(Token::Sub),
            '\'' => tokens.push(Token::Symbol('′')),
            c if c.is_ascii_digit() => {
                let mut number = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // a trailing dot is punctuation
                if number.ends_with('.') {
                    number.pop();
                    tokens.push(Token::Number(number));
                    tokens.push(Token::Symbol('.'));
                } else {
                    tokens.push(Token::Number(number));
                }
            }
            c if c.is_whitespace() => {
                if tokens.last() != Some(&Token::Space) {
                    tokens.push(Token::Space);
                }
            }
            c if c.is_alphabetic() => tokens.push(Token::Letter(c)),
            c => tokens.push(Token::Symbol(c)),
        }
    }

    tokens
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MathNode {
    Row(Vec<MathNode>),
    Ident(String),
    Number(String),
    Operator(String),
    Text(String),
    Frac(Box<MathNode>, Box<MathNode>),
    Sqrt(Box<MathNode>),
    Root(Box<MathNode>, Box<MathNode>),
    Sub(Box<MathNode>, Box<MathNode>),
    Sup(Box<MathNode>, Box<MathNode>),
    SubSup(Box<MathNode>, Box<MathNode>, Box<MathNode>),
}

fn group(mut nodes: Vec<MathNode>) -> MathNode {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        MathNode::Row(nodes)
    }
}

fn lookup<'a>(table: &[(&'a str, &'a str)], name: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(command, _)| *command == name)
        .map(|(_, value)| *value)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Parser {
            tokens: tokenize(input),
            pos: 0,
        }
    }

    fn skip_spaces(&mut self) {
        while self.tokens.get(self.pos) == Some(&Token::Space) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<&Token> {
        self.skip_spaces();
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_spaces();
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse(mut self) -> Result<Vec<MathNode>, MathError> {
        let nodes = self.parse_expression(false)?;
        if nodes.is_empty() {
            return Err(MathError::Empty);
        }
        Ok(nodes)
    }

    fn parse_expression(&mut self, closing: bool) -> Result<Vec<MathNode>, MathError> {
        let mut nodes = Vec::new();

        loop {
            match self.peek() {
                None if closing => return Err(MathError::UnbalancedBraces),
                None => break,
                Some(Token::Close) if closing => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Close) => return Err(MathError::UnbalancedBraces),
                _ => {}
            }

            if let Some(base) = self.parse_atom()? {
                let node = self.parse_scripts(base)?;
                nodes.push(node);
            }
        }

        Ok(nodes)
    }

    fn parse_scripts(&mut self, base: MathNode) -> Result<MathNode, MathError> {
        let mut sub = None;
        let mut sup = None;

        loop {
            match self.peek() {
                Some(Token::Sub) if sub.is_none() => {
                    self.pos += 1;
                    sub = Some(self.parse_argument("_")?);
                }
                Some(Token::Sup) if sup.is_none() => {
                    self.pos += 1;
                    sup = Some(self.parse_argument("^")?);
                }
                _ => break,
            }
        }

        let base = Box::new(base);
        Ok(match (sub, sup) {
            (None, None) => *base,
            (Some(sub), None) => MathNode::Sub(base, Box::new(sub)),
            (None, Some(sup)) => MathNode::Sup(base, Box::new(sup)),
            (Some(sub), Some(sup)) => MathNode::SubSup(base, Box::new(sub), Box::new(sup)),
        })
    }

    /// A single required argument: one token or one braced group
    fn parse_argument(&mut self, command: &str) -> Result<MathNode, MathError> {
        loop {
            match self.peek() {
                None | Some(Token::Close) | Some(Token::Sub) | Some(Token::Sup) => {
                    return Err(MathError::MissingArgument(command.to_string()))
                }
                _ => {}
            }
            if let Some(node) = self.parse_atom()? {
                return Ok(node);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Option<MathNode>, MathError> {
        let token = match self.next_token() {
            Some(token) => token,
            None => return Err(MathError::Empty),
        };

        let node = match token {
            Token::Open => group(self.parse_expression(true)?),
            Token::Close => return Err(MathError::UnbalancedBraces),
            Token::Sub | Token::Sup => {
                // script without a base
                self.pos -= 1;
                MathNode::Row(Vec::new())
            }
            Token::Number(number) => MathNode::Number(number),
            Token::Letter(letter) => MathNode::Ident(letter.to_string()),
            Token::Symbol(symbol) => MathNode::Operator(symbol.to_string()),
            Token::Space => return Ok(None),
            Token::Command(name) => return self.parse_command(&name),
        };

        Ok(Some(node))
    }

    fn parse_command(&mut self, name: &str) -> Result<Option<MathNode>, MathError> {
        let node = match name {
            "frac" | "dfrac" | "tfrac" => {
                let numerator = self.parse_argument(name)?;
                let denominator = self.parse_argument(name)?;
                MathNode::Frac(Box::new(numerator), Box::new(denominator))
            }
            "sqrt" => {
                let index = self.parse_optional_index()?;
                let radicand = self.parse_argument(name)?;
                match index {
                    Some(index) => MathNode::Root(Box::new(radicand), Box::new(index)),
                    None => MathNode::Sqrt(Box::new(radicand)),
                }
            }
            "left" | "right" | "big" | "Big" | "bigl" | "bigr" => {
                if self.peek() == Some(&Token::Symbol('.')) {
                    self.pos += 1;
                }
                return Ok(None);
            }
            "text" | "textrm" | "textit" | "textbf" | "mbox" => MathNode::Text(self.read_raw_group(name)?),
            "mathrm" | "operatorname" => MathNode::Ident(self.read_raw_group(name)?),
            "mathbf" | "mathit" | "mathbb" | "mathcal" | "mathsf" | "boldsymbol" | "bm" => {
                self.parse_argument(name)?
            }
            "," | ";" | ":" | "!" | " " | "\\" | "quad" | "qquad" => return Ok(None),
            "{" | "}" | "%" | "$" | "&" | "#" | "_" | "|" => MathNode::Operator(name.to_string()),
            _ => {
                if FUNCTIONS.contains(&name) {
                    MathNode::Ident(name.to_string())
                } else if let Some((_, letter, _)) = GREEK.iter().find(|(command, _, _)| *command == name) {
                    MathNode::Ident(letter.to_string())
                } else if let Some(identifier) = lookup(IDENTIFIERS, name) {
                    MathNode::Ident(identifier.to_string())
                } else if let Some(operator) = lookup(OPERATORS, name) {
                    MathNode::Operator(operator.to_string())
                } else {
                    return Err(MathError::UnknownCommand(name.to_string()));
                }
            }
        };

        Ok(Some(node))
    }

    /// `[n]` after `\sqrt`
    fn parse_optional_index(&mut self) -> Result<Option<MathNode>, MathError> {
        if self.peek() != Some(&Token::Symbol('[')) {
            return Ok(None);
        }
        self.pos += 1;

        let mut nodes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(MathError::UnbalancedBraces),
                Some(Token::Symbol(']')) => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    if let Some(base) = self.parse_atom()? {
                        nodes.push(self.parse_scripts(base)?);
                    }
                }
            }
        }

        Ok(Some(group(nodes)))
    }

    /// Verbatim text of a braced group, spaces kept
    fn read_raw_group(&mut self, command: &str) -> Result<String, MathError> {
        if self.peek() != Some(&Token::Open) {
            return Err(MathError::MissingArgument(command.to_string()));
        }
        self.pos += 1;

        let mut depth = 1;
        let mut text = String::new();
        loop {
            let token = match self.tokens.get(self.pos) {
                Some(token) => token.clone(),
                None => return Err(MathError::UnbalancedBraces),
            };
            self.pos += 1;

            match token {
                Token::Open => {
                    depth += 1;
                    text.push('{');
                }
                Token::Close => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    text.push('}');
                }
                Token::Command(name) => {
                    text.push('\\');
                    text.push_str(&name);
                }
                Token::Number(number) => text.push_str(&number),
                Token::Letter(c) | Token::Symbol(c) => text.push(c),
                Token::Sup => text.push('^'),
                Token::Sub => text.push('_'),
                Token::Space => text.push(' '),
            }
        }

        Ok(text.trim().to_string())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_tag(tag: &str, children: &[&MathNode], out: &mut String) {
    let _ = write!(out, "<{tag}>");
    for child in children {
        render(child, out);
    }
    let _ = write!(out, "</{tag}>");
}

fn render(node: &MathNode, out: &mut String) {
    match node {
        MathNode::Row(children) => {
            out.push_str("<mrow>");
            for child in children {
                render(child, out);
            }
            out.push_str("</mrow>");
        }
        MathNode::Ident(text) => {
            let _ = write!(out, "<mi>{}</mi>", escape(text));
        }
        MathNode::Number(text) => {
            let _ = write!(out, "<mn>{}</mn>", escape(text));
        }
        MathNode::Operator(text) => {
            let _ = write!(out, "<mo>{}</mo>", escape(text));
        }
        MathNode::Text(text) => {
            let _ = write!(out, "<mtext>{}</mtext>", escape(text));
        }
        MathNode::Frac(numerator, denominator) => render_tag("mfrac", &[&**numerator, &**denominator], out),
        MathNode::Sqrt(radicand) => render_tag("msqrt", &[&**radicand], out),
        MathNode::Root(radicand, index) => render_tag("mroot", &[&**radicand, &**index], out),
        MathNode::Sub(base, sub) => render_tag("msub", &[&**base, &**sub], out),
        MathNode::Sup(base, sup) => render_tag("msup", &[&**base, &**sup], out),
        MathNode::SubSup(base, sub, sup) => render_tag("msubsup", &[&**base, &**sub, &**sup], out),
    }
}

fn speak(node: &MathNode) -> String {
    match node {
        MathNode::Row(children) => children.iter().map(speak).collect::<Vec<_>>().join(" "),
        MathNode::Ident(text) => GREEK
            .iter()
            .find(|(_, letter, _)| *letter == text.as_str())
            .map(|(_, _, spoken)| spoken.to_string())
            .unwrap_or_else(|| text.clone()),
        MathNode::Number(text) | MathNode::Text(text) => text.clone(),
        MathNode::Operator(text) => match text.as_str() {
            "(" | ")" | "[" | "]" | "{" | "}" | "⟨" | "⟩" => String::new(),
            _ => lookup(SPOKEN_OPERATORS, text).unwrap_or(text.as_str()).to_string(),
        },
        MathNode::Frac(numerator, denominator) => {
            format!("{} over {}", speak(numerator), speak(denominator))
        }
        MathNode::Sqrt(radicand) => format!("square root of {}", speak(radicand)),
        MathNode::Root(radicand, index) => format!("root {} of {}", speak(index), speak(radicand)),
        MathNode::Sub(base, sub) => format!("{} subscript {}", speak(base), speak(sub)),
        MathNode::Sup(base, sup) => format!("{} {}", speak(base), speak_power(sup)),
        MathNode::SubSup(base, sub, sup) => format!(
            "{} subscript {} {}",
            speak(base),
            speak(sub),
            speak_power(sup)
        ),
    }
}

fn speak_power(exponent: &MathNode) -> String {
    match exponent {
        MathNode::Number(n) if n == "2" => "squared".to_string(),
        MathNode::Number(n) if n == "3" => "cubed".to_string(),
        _ => format!("to the power of {}", speak(exponent)),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pattern-based TeX/Unicode to MathML converter
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternMathConverter {
    detector: MathDetector,
}

impl PatternMathConverter {
    pub fn new() -> Self {
        PatternMathConverter {
            detector: MathDetector::new(),
        }
    }

    /// Convert a bare expression (no delimiters) into a `<math>` element
    pub fn expression_to_mathml(&self, expression: &str, display: bool) -> Result<String, MathError> {
        let nodes = Parser::new(expression).parse()?;

        let mut body = String::new();
        render(&MathNode::Row(nodes), &mut body);

        Ok(format!(
            "<math xmlns=\"{}\" display=\"{}\">{}</math>",
            MATHML_NAMESPACE,
            if display { "block" } else { "inline" },
            body
        ))
    }

    /// Spoken reading of a bare expression
    pub fn speak_expression(&self, expression: &str) -> String {
        match Parser::new(expression).parse() {
            Ok(nodes) => collapse_whitespace(&speak(&MathNode::Row(nodes))),
            Err(_) => collapse_whitespace(expression),
        }
    }
}

impl MathConverter for PatternMathConverter {
    fn detect(&self, text: &str) -> Vec<MathSpan> {
        self.detector.detect(text)
    }

    fn to_mathml(&self, span: &MathSpan) -> Result<String, MathError> {
        self.expression_to_mathml(&span.content, span.is_display())
    }

    fn fallback_text(&self, span: &MathSpan) -> String {
        self.speak_expression(&span.content)
    }
}

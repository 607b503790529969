//! Action-template syntax, compiled down to handlebars source.
//!
//! Webhook templates are written with `{{.Field}}` actions:
//!
//! - `{{.JobName}}`, `{{.}}`, string/number/bool literals
//! - function calls `{{truncate 20 .Stderr}}` and pipelines
//!   `{{.Stderr | truncate 20}}` (the piped value becomes the last argument)
//! - parenthesized sub-pipelines `{{if (eq .Failed true)}}`
//! - `if` / `else if` / `else` / `end`, `with`, `range`
//! - trim markers `{{- ` and ` -}}`, comments `{{/* ... */}}`
//!
//! [`translate`] turns such a template into handlebars source that the
//! [`Renderer`](super::Renderer) executes with the registered helpers.

use super::error::SyntaxError;
use super::helpers;

/// Translates a template into equivalent handlebars source.
///
/// # Errors
///
/// Returns [`SyntaxError`] for unclosed actions or blocks, unknown
/// functions, malformed literals, and unsupported constructs.
pub fn translate(source: &str) -> Result<String, SyntaxError> {
    let segments = split(source)?;
    let mut translator = Translator::default();

    for (index, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Text(text) => {
                let mut text = *text;
                if index > 0 && segments[index - 1].trims_right() {
                    text = text.trim_start_matches(is_space);
                }
                if segments.get(index + 1).is_some_and(Segment::trims_left) {
                    text = text.trim_end_matches(is_space);
                }
                translator.text(text);
            }
            Segment::Action(action) => translator.action(action)?,
        }
    }

    translator.finish()
}

const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

enum Segment<'a> {
    Text(&'a str),
    Action(Action<'a>),
}

impl Segment<'_> {
    const fn trims_left(&self) -> bool {
        matches!(self, Self::Action(action) if action.trim_left)
    }

    const fn trims_right(&self) -> bool {
        matches!(self, Self::Action(action) if action.trim_right)
    }
}

/// The text between `{{` and `}}`, trim markers removed.
struct Action<'a> {
    offset: usize,
    body: &'a str,
    trim_left: bool,
    trim_right: bool,
}

impl<'a> Action<'a> {
    fn new(offset: usize, raw: &'a str) -> Self {
        let mut body = raw;
        let mut offset = offset;

        let bytes = body.as_bytes();
        let trim_left = bytes.len() >= 2 && bytes[0] == b'-' && is_space(char::from(bytes[1]));
        if trim_left {
            body = &body[1..];
            offset += 1;
        }

        let bytes = body.as_bytes();
        let n = bytes.len();
        let trim_right = n >= 2 && bytes[n - 1] == b'-' && is_space(char::from(bytes[n - 2]));
        if trim_right {
            body = &body[..n - 1];
        }

        Self {
            offset,
            body,
            trim_left,
            trim_right,
        }
    }
}

fn split(source: &str) -> Result<Vec<Segment<'_>>, SyntaxError> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find("{{") {
        let open = cursor + found;
        if open > cursor {
            segments.push(Segment::Text(&source[cursor..open]));
        }

        let start = open + 2;
        let close =
            find_close(source, start).ok_or_else(|| SyntaxError::at(open, "unclosed action"))?;
        segments.push(Segment::Action(Action::new(start, &source[start..close])));
        cursor = close + 2;
    }

    if cursor < source.len() {
        segments.push(Segment::Text(&source[cursor..]));
    }

    Ok(segments)
}

/// Finds the `}}` ending the action that starts at `from`, skipping over
/// quoted strings and comments.
fn find_close(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = skip_quoted(bytes, i)?,
            b'`' => i += 1 + source[i + 1..].find('`')? + 1,
            b'/' if bytes.get(i + 1) == Some(&b'*') => i += 2 + source[i + 2..].find("*/")? + 2,
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => i += 1,
        }
    }

    None
}

fn skip_quoted(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    With,
    Range,
}

impl BlockKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::With => "with",
            Self::Range => "range",
        }
    }

    const fn helper(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::With => "with",
            Self::Range => "each",
        }
    }
}

struct Block {
    kind: BlockKind,
    offset: usize,
    has_else: bool,
}

const KEEP_LINE: &str = r#"{{literal ""}}"#;

#[derive(Default)]
struct Translator {
    out: String,
    blocks: Vec<Block>,
}

impl Translator {
    fn text(&mut self, text: &str) {
        // A backslash or brace right before `{{` changes how the next tag
        // is read, so those are written through a helper.
        let kept = text.trim_end_matches(['\\', '{']);
        self.out.push_str(kept);

        let tail = &text[kept.len()..];
        if !tail.is_empty() {
            self.tag(&format!("literal {}", quote(tail)));
        }
    }

    fn tag(&mut self, inner: &str) {
        self.out.push_str("{{");
        self.out.push_str(inner);
        self.out.push_str("}}");
    }

    /// Writes a block tag paired with an empty output tag, so handlebars
    /// never sees it alone on a line and keeps the surrounding newlines.
    fn block_tag(&mut self, inner: &str, closing: bool) {
        if closing {
            self.out.push_str(KEEP_LINE);
            self.tag(inner);
        } else {
            self.tag(inner);
            self.out.push_str(KEEP_LINE);
        }
    }

    fn action(&mut self, action: &Action<'_>) -> Result<(), SyntaxError> {
        let body = action.body.trim_matches(is_space);
        if body.starts_with("/*") {
            if body.len() >= 4 && body.ends_with("*/") {
                return Ok(());
            }
            return Err(SyntaxError::at(action.offset, "unclosed comment"));
        }

        let tokens = Lexer::new(action.body, action.offset).tokens()?;
        let keyword = match tokens.first().map(|t| &t.kind) {
            Some(TokenKind::Ident(word)) => word.as_str(),
            _ => "",
        };

        match keyword {
            "if" => self.open(BlockKind::If, &tokens, action.offset),
            "with" => self.open(BlockKind::With, &tokens, action.offset),
            "range" => self.open(BlockKind::Range, &tokens, action.offset),
            "else" => self.otherwise(&tokens, action.offset),
            "end" => self.end(&tokens, action.offset),
            "define" | "template" | "block" | "break" | "continue" => Err(SyntaxError::at(
                action.offset,
                format!("{keyword:?} actions are not supported"),
            )),
            _ => {
                let expr = Parser::new(&tokens, action.offset).complete("command")?;
                self.tag(&expr.to_output());
                Ok(())
            }
        }
    }

    fn open(&mut self, kind: BlockKind, tokens: &[Token], offset: usize) -> Result<(), SyntaxError> {
        let expr = Parser::new(&tokens[1..], offset).complete(kind.keyword())?;
        self.block_tag(&format!("#{} {}", kind.helper(), expr.to_param()), false);
        self.blocks.push(Block {
            kind,
            offset,
            has_else: false,
        });
        Ok(())
    }

    fn otherwise(&mut self, tokens: &[Token], offset: usize) -> Result<(), SyntaxError> {
        let Some(block) = self.blocks.last_mut() else {
            return Err(SyntaxError::at(offset, "unexpected {{else}}"));
        };
        if block.has_else {
            return Err(SyntaxError::at(offset, "expected {{end}}, found {{else}}"));
        }

        match tokens.get(1) {
            None => {
                block.has_else = true;
                self.block_tag("else", false);
                Ok(())
            }
            Some(Token {
                kind: TokenKind::Ident(word),
                ..
            }) if word == "if" && block.kind == BlockKind::If => {
                let expr = Parser::new(&tokens[2..], offset).complete("if")?;
                self.block_tag(&format!("else if {}", expr.to_param()), false);
                Ok(())
            }
            Some(token) => Err(SyntaxError::at(token.offset, "unexpected token after else")),
        }
    }

    fn end(&mut self, tokens: &[Token], offset: usize) -> Result<(), SyntaxError> {
        if let Some(extra) = tokens.get(1) {
            return Err(SyntaxError::at(extra.offset, "unexpected token in {{end}}"));
        }
        let block = self
            .blocks
            .pop()
            .ok_or_else(|| SyntaxError::at(offset, "unexpected {{end}}"))?;
        self.block_tag(&format!("/{}", block.kind.helper()), true);
        Ok(())
    }

    fn finish(self) -> Result<String, SyntaxError> {
        if let Some(block) = self.blocks.last() {
            return Err(SyntaxError::at(
                block.offset,
                format!("unexpected EOF: {} is missing its {{{{end}}}}", block.kind.keyword()),
            ));
        }
        Ok(self.out)
    }
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    /// `.A.B`; empty for the bare dot
    Field(String),
    Ident(String),
    Str(String),
    Number(String),
    Pipe,
    Open,
    Close,
}

#[derive(Debug, Clone)]
struct Token {
    offset: usize,
    kind: TokenKind,
}

struct Lexer<'a> {
    body: &'a str,
    pos: usize,
    base: usize,
}

impl<'a> Lexer<'a> {
    const fn new(body: &'a str, base: usize) -> Self {
        Self { body, pos: 0, base }
    }

    fn tokens(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.body[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c| !keep(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        self.take_while(is_space);
        let offset = self.base + self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '|' | '(' | ')' => {
                self.pos += 1;
                match c {
                    '|' => TokenKind::Pipe,
                    '(' => TokenKind::Open,
                    _ => TokenKind::Close,
                }
            }
            '.' => self.field(offset)?,
            '"' => self.quoted(offset)?,
            '`' => self.raw_string(offset)?,
            '-' | '+' | '0'..='9' => self.number(offset)?,
            '\'' => {
                return Err(SyntaxError::at(offset, "character literals are not supported"));
            }
            '$' => return Err(SyntaxError::at(offset, "variables are not supported")),
            c if is_ident_start(c) => TokenKind::Ident(self.take_while(is_ident_char).to_string()),
            c => return Err(SyntaxError::at(offset, format!("unexpected {c:?} in action"))),
        };

        Ok(Some(Token { offset, kind }))
    }

    fn field(&mut self, offset: usize) -> Result<TokenKind, SyntaxError> {
        let mut path = Vec::new();

        while self.peek() == Some('.') {
            match self.rest()[1..].chars().next() {
                Some(c) if is_ident_start(c) => {
                    self.pos += 1;
                    path.push(self.take_while(is_ident_char));
                }
                Some(c) if c.is_ascii_digit() && path.is_empty() => return self.number(offset),
                _ => break,
            }
        }

        if path.is_empty() {
            self.pos += 1;
        }

        Ok(TokenKind::Field(path.join(".")))
    }

    fn quoted(&mut self, offset: usize) -> Result<TokenKind, SyntaxError> {
        let rest = self.rest();
        let end = skip_quoted(rest.as_bytes(), 0)
            .ok_or_else(|| SyntaxError::at(offset, "unterminated quoted string"))?;
        let literal = &rest[..end];

        let value: String = serde_json::from_str(literal).map_err(|e| {
            SyntaxError::at(offset, format!("invalid string literal {literal}: {e}"))
        })?;
        self.pos += end;
        Ok(TokenKind::Str(value))
    }

    fn raw_string(&mut self, offset: usize) -> Result<TokenKind, SyntaxError> {
        let rest = &self.rest()[1..];
        let end = rest
            .find('`')
            .ok_or_else(|| SyntaxError::at(offset, "unterminated raw string"))?;
        self.pos += end + 2;
        Ok(TokenKind::Str(rest[..end].to_string()))
    }

    fn number(&mut self, offset: usize) -> Result<TokenKind, SyntaxError> {
        let text =
            self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'));

        if let Ok(n) = text.parse::<i64>() {
            return Ok(TokenKind::Number(n.to_string()));
        }

        text.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(|n| TokenKind::Number(n.to_string()))
            .ok_or_else(|| SyntaxError::at(offset, format!("bad number syntax: {text:?}")))
    }
}

/// A parsed pipeline, ready to be written as handlebars.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Path(String),
    /// JSON text of a literal
    Literal(String),
    Call {
        helper: &'static str,
        args: Vec<Self>,
    },
}

impl Expr {
    /// Form used as a helper or block argument.
    fn to_param(&self) -> String {
        match self {
            Self::Path(text) | Self::Literal(text) => text.clone(),
            Self::Call { .. } => format!("({})", self.call_text()),
        }
    }

    /// Form used as a whole `{{...}}` output tag.
    fn to_output(&self) -> String {
        match self {
            Self::Path(path) => path.clone(),
            Self::Literal(json) => format!("literal {json}"),
            Self::Call { .. } => self.call_text(),
        }
    }

    fn call_text(&self) -> String {
        let Self::Call { helper, args } = self else {
            return self.to_param();
        };
        let mut text = (*helper).to_string();
        for arg in args {
            text.push(' ');
            text.push_str(&arg.to_param());
        }
        text
    }
}

enum Operand {
    Value { expr: Expr, offset: usize },
    Function { helper: &'static str, offset: usize },
}

impl Operand {
    fn into_argument(self) -> Result<Expr, SyntaxError> {
        match self {
            Self::Value { expr, .. } => Ok(expr),
            Self::Function { helper, offset } => Err(SyntaxError::at(
                offset,
                format!("function {helper:?} used as an argument; wrap the call in parentheses"),
            )),
        }
    }

    const fn offset(&self) -> usize {
        match self {
            Self::Value { offset, .. } | Self::Function { offset, .. } => *offset,
        }
    }
}

enum Command {
    Value(Expr),
    Call {
        helper: &'static str,
        args: Vec<Expr>,
    },
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    offset: usize,
}

impl<'t> Parser<'t> {
    const fn new(tokens: &'t [Token], offset: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            offset,
        }
    }

    /// Parses every token as a single pipeline.
    fn complete(mut self, context: &str) -> Result<Expr, SyntaxError> {
        if self.tokens.is_empty() {
            return Err(SyntaxError::at(
                self.offset,
                format!("missing value for {context}"),
            ));
        }

        let expr = self.pipeline()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(token) => Err(SyntaxError::at(token.offset, "unexpected token in pipeline")),
        }
    }

    fn current_offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.offset, |t| t.offset)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.tokens.get(self.pos).is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn pipeline(&mut self) -> Result<Expr, SyntaxError> {
        let offset = self.current_offset();
        let mut expr = match self.command()? {
            Command::Value(expr) => expr,
            Command::Call { helper, args } if args.is_empty() => {
                return Err(SyntaxError::at(
                    offset,
                    format!("wrong number of args for {helper}: want at least 1, got 0"),
                ));
            }
            Command::Call { helper, args } => Expr::Call { helper, args },
        };

        while self.eat(&TokenKind::Pipe) {
            let offset = self.current_offset();
            match self.command()? {
                Command::Call { helper, mut args } => {
                    args.push(expr);
                    expr = Expr::Call { helper, args };
                }
                Command::Value(_) => {
                    return Err(SyntaxError::at(offset, "non-function in pipeline stage"));
                }
            }
        }

        Ok(expr)
    }

    fn command(&mut self) -> Result<Command, SyntaxError> {
        let offset = self.current_offset();
        let mut operands = Vec::new();

        while let Some(token) = self.tokens.get(self.pos) {
            if matches!(token.kind, TokenKind::Pipe | TokenKind::Close) {
                break;
            }
            operands.push(self.operand()?);
        }

        let mut operands = operands.into_iter();
        match operands.next() {
            None => Err(SyntaxError::at(offset, "missing value for command")),
            Some(Operand::Function { helper, .. }) => {
                let args = operands
                    .map(Operand::into_argument)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Command::Call { helper, args })
            }
            Some(Operand::Value { expr, .. }) => match operands.next() {
                Some(extra) => Err(SyntaxError::at(
                    extra.offset(),
                    "can't give argument to non-function",
                )),
                None => Ok(Command::Value(expr)),
            },
        }
    }

    fn operand(&mut self) -> Result<Operand, SyntaxError> {
        let tokens = self.tokens;
        let Some(token) = tokens.get(self.pos) else {
            return Err(SyntaxError::at(self.offset, "missing operand"));
        };
        self.pos += 1;
        let offset = token.offset;

        let expr = match &token.kind {
            TokenKind::Field(path) if path.is_empty() => Expr::Path("this".to_string()),
            TokenKind::Field(path) => Expr::Path(path.clone()),
            TokenKind::Str(text) => Expr::Literal(quote(text)),
            TokenKind::Number(number) => Expr::Literal(number.clone()),
            TokenKind::Ident(word) => match word.as_str() {
                "true" | "false" => Expr::Literal(word.clone()),
                "nil" => Expr::Literal("null".to_string()),
                name => {
                    let helper = helpers::lookup(name).ok_or_else(|| {
                        SyntaxError::at(offset, format!("function {name:?} not defined"))
                    })?;
                    return Ok(Operand::Function { helper, offset });
                }
            },
            TokenKind::Open => {
                let expr = self.pipeline()?;
                if !self.eat(&TokenKind::Close) {
                    return Err(SyntaxError::at(offset, "unclosed left paren"));
                }
                expr
            }
            TokenKind::Pipe | TokenKind::Close => {
                return Err(SyntaxError::at(offset, "unexpected token"));
            }
        };

        Ok(Operand::Value { expr, offset })
    }
}

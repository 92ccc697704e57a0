//! The Text Tokenizer (spec section 4.4): turns GDScript source text into a
//! lazy stream of [`TokenRecord`]s, gated per-revision by
//! [`RevisionFlags`]/`token_table` membership rather than ad hoc version
//! comparisons (spec section 9's design note).

use gdsc_core::revision::{RevisionDescriptor, RevisionFlags};
use gdsc_core::token::GlobalToken;
use gdsc_core::variant::Variant;

/// What a [`TokenRecord`] carries beyond its `global_token` kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenPayload {
    None,
    /// Raw lexeme text: identifiers, built-in type/function names.
    Text(String),
    /// A literal value destined for the constant table.
    Constant(Variant),
    /// The leading whitespace of the line this `NEWLINE` introduces.
    Newline { space_indent: u32, tab_indent: u32 },
}

/// One lexical token, plus enough position/context for the consumer to
/// resolve indentation and report diagnostics (spec section 4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub global_token: GlobalToken,
    pub payload: TokenPayload,
    pub line: u32,
    pub column: u32,
    /// Indentation (in space units) currently in effect at this token.
    pub indent: u32,
    /// Indentation (in tab units) currently in effect at this token.
    pub tab_indent: u32,
    pub error_message: Option<String>,
}

impl TokenRecord {
    fn new(global_token: GlobalToken, line: u32, column: u32, indent: u32, tab_indent: u32) -> Self {
        TokenRecord {
            global_token,
            payload: TokenPayload::None,
            line,
            column,
            indent,
            tab_indent,
            error_message: None,
        }
    }

    fn with_payload(mut self, payload: TokenPayload) -> Self {
        self.payload = payload;
        self
    }

    fn error(mut self, message: impl Into<String>) -> Self {
        self.global_token = GlobalToken::Error;
        self.error_message = Some(message.into());
        self
    }
}

const KEYWORDS: &[(&str, GlobalToken)] = &[
    ("if", GlobalToken::If),
    ("elif", GlobalToken::Elif),
    ("else", GlobalToken::Else),
    ("for", GlobalToken::For),
    ("while", GlobalToken::While),
    ("break", GlobalToken::Break),
    ("continue", GlobalToken::Continue),
    ("pass", GlobalToken::Pass),
    ("return", GlobalToken::Return),
    ("match", GlobalToken::Match),
    ("when", GlobalToken::When),
    ("do", GlobalToken::Do),
    ("case", GlobalToken::Case),
    ("switch", GlobalToken::Switch),
    ("func", GlobalToken::Function),
    ("class", GlobalToken::Class),
    ("class_name", GlobalToken::ClassName),
    ("extends", GlobalToken::Extends),
    ("is", GlobalToken::Is),
    ("onready", GlobalToken::Onready),
    ("tool", GlobalToken::Tool),
    ("static", GlobalToken::Static),
    ("export", GlobalToken::Export),
    ("setget", GlobalToken::Setget),
    ("const", GlobalToken::Const),
    ("var", GlobalToken::Var),
    ("as", GlobalToken::As),
    ("void", GlobalToken::Void),
    ("enum", GlobalToken::Enum),
    ("preload", GlobalToken::Preload),
    ("assert", GlobalToken::Assert),
    ("yield", GlobalToken::Yield),
    ("signal", GlobalToken::Signal),
    ("breakpoint", GlobalToken::Breakpoint),
    ("remote", GlobalToken::Remote),
    ("master", GlobalToken::Master),
    ("puppet", GlobalToken::Puppet),
    ("remotesync", GlobalToken::Remotesync),
    ("mastersync", GlobalToken::Mastersync),
    ("puppetsync", GlobalToken::Puppetsync),
    ("await", GlobalToken::Await),
    ("namespace", GlobalToken::Namespace),
    ("super", GlobalToken::Super),
    ("trait", GlobalToken::Trait),
    ("abstract", GlobalToken::Abstract),
    ("self", GlobalToken::SelfKw),
    ("and", GlobalToken::OpAnd),
    ("or", GlobalToken::OpOr),
    ("not", GlobalToken::OpNot),
    ("PI", GlobalToken::ConstPi),
    ("TAU", GlobalToken::ConstTau),
    ("INF", GlobalToken::ConstInf),
    ("NAN", GlobalToken::ConstNan),
    ("_", GlobalToken::Wildcard),
];

fn is_ident_start(c: char) -> bool {
    c == '_' || (c.is_ascii_alphabetic())
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// A lazy, finite, non-restartable stream of [`TokenRecord`]s over one
/// source text, maintaining a 4-entry lookahead ring (spec section 4.4,
/// "Lookahead": "a small inline array + head index").
pub struct TokenStream<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    revision: &'a RevisionDescriptor,
    current_space_indent: u32,
    current_tab_indent: u32,
    prev_emitted: GlobalToken,
    at_line_start: bool,
    ring: [Option<TokenRecord>; 4],
    ring_head: usize,
    ring_count: usize,
    finished: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &str, revision: &'a RevisionDescriptor) -> Self {
        let mut stream = TokenStream {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            revision,
            current_space_indent: 0,
            current_tab_indent: 0,
            prev_emitted: GlobalToken::Newline,
            at_line_start: true,
            ring: [None, None, None, None],
            ring_head: 0,
            ring_count: 0,
            finished: false,
        };
        stream.fill();
        stream
    }

    /// Peek `n` tokens ahead without consuming (`n == 0` is the next token
    /// [`Iterator::next`] would return).
    pub fn peek(&self, n: usize) -> Option<&TokenRecord> {
        if n >= self.ring_count {
            return None;
        }
        let idx = (self.ring_head + n) % 4;
        self.ring[idx].as_ref()
    }

    fn fill(&mut self) {
        while self.ring_count < 4 && !self.finished {
            let tok = self.scan_one();
            let is_eof = tok.global_token == GlobalToken::Eof;
            self.prev_emitted = tok.global_token;
            let idx = (self.ring_head + self.ring_count) % 4;
            self.ring[idx] = Some(tok);
            self.ring_count += 1;
            if is_eof {
                self.finished = true;
            }
        }
    }

    fn flags(&self) -> RevisionFlags {
        self.revision.flags
    }

    fn peek_char(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn record_at(&self, global_token: GlobalToken, line: u32, column: u32) -> TokenRecord {
        TokenRecord::new(
            global_token,
            line,
            column,
            self.current_space_indent,
            self.current_tab_indent,
        )
    }

    /// Scans and consumes leading whitespace of a fresh logical line,
    /// returning the space/tab counts, and producing an error record
    /// instead when the revision forbids mixing spaces before tabs (spec
    /// section 4.4, "Whitespace").
    fn scan_indent(&mut self) -> Result<(u32, u32), TokenRecord> {
        let (line, column) = (self.line, self.column);
        let mut spaces = 0u32;
        let mut tabs = 0u32;
        let mut seen_space_before_tab = false;
        loop {
            match self.peek_char(0) {
                Some(' ') => {
                    spaces += 1;
                    self.advance_char();
                }
                Some('\t') => {
                    if spaces > 0 {
                        seen_space_before_tab = true;
                    }
                    tabs += 1;
                    self.advance_char();
                }
                _ => break,
            }
        }
        if seen_space_before_tab && self.flags().contains(RevisionFlags::MIXED_TAB_SPACE_IS_ERROR) {
            return Err(self
                .record_at(GlobalToken::Error, line, column)
                .error("mixed tabs and spaces in indentation prefix"));
        }
        Ok((spaces, tabs))
    }

    fn scan_one(&mut self) -> TokenRecord {
        if self.at_line_start && self.peek_char(0).is_some() {
            match self.scan_indent() {
                Ok((spaces, tabs)) => {
                    self.current_space_indent = spaces;
                    self.current_tab_indent = tabs;
                }
                Err(err) => {
                    self.at_line_start = false;
                    return err;
                }
            }
            self.at_line_start = false;
        }

        self.skip_insignificant_whitespace_and_comments();

        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek_char(0) else {
            return self.record_at(GlobalToken::Eof, line, column);
        };

        if c == '\n' {
            return self.scan_newline();
        }
        if is_ident_start(c) {
            return self.scan_identifier_or_keyword();
        }
        if c.is_ascii_digit() {
            return self.scan_number();
        }
        if c == '-' && self.peek_char(1).is_some_and(|d| d.is_ascii_digit()) && !self.prev_emitted.can_precede_binary_operator()
        {
            return self.scan_number();
        }
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }
        if c == '@' && self.flags().contains(RevisionFlags::HAS_DOLLAR_SIGIL) {
            if let Some(q) = self.peek_char(1).filter(|q| *q == '"' || *q == '\'') {
                self.advance_char(); // consume '@'
                return self.scan_node_path(q);
            }
        }
        self.scan_operator_or_punct()
    }

    fn skip_insignificant_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char(0) {
                Some(' ') | Some('\t') => {
                    self.advance_char();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char(0) {
                        if c == '\n' {
                            break;
                        }
                        self.advance_char();
                    }
                }
                Some('\\') if self.peek_char(1) == Some('\n') => {
                    // Line continuation: consume backslash and the newline it
                    // escapes without emitting a NEWLINE record.
                    self.advance_char();
                    self.advance_char();
                }
                _ => break,
            }
        }
    }

    fn scan_newline(&mut self) -> TokenRecord {
        let (line, column) = (self.line, self.column);
        self.advance_char(); // consume '\n'
        self.at_line_start = true;
        let (spaces, tabs) = match self.scan_indent() {
            Ok(pair) => pair,
            Err(err) => return err,
        };
        self.at_line_start = false;
        self.current_space_indent = spaces;
        self.current_tab_indent = tabs;
        self.record_at(GlobalToken::Newline, line, column)
            .with_payload(TokenPayload::Newline {
                space_indent: spaces,
                tab_indent: tabs,
            })
    }

    fn scan_identifier_or_keyword(&mut self) -> TokenRecord {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self.peek_char(0) {
            if is_ident_continue(c) {
                text.push(c);
                self.advance_char();
            } else {
                break;
            }
        }

        for (word, token) in KEYWORDS {
            if *word == text {
                let recognized = self
                    .revision
                    .token_table
                    .contains(token)
                    // `and`/`or`/`not` may be spelled out even in revisions that
                    // only model &&/|| as the canonical token for the same
                    // operator family.
                    || matches!(
                        token,
                        GlobalToken::OpAnd | GlobalToken::OpOr | GlobalToken::OpNot
                    ) && self.revision.token_table.contains(&GlobalToken::OpAnd);
                if recognized {
                    return self
                        .record_at(*token, line, column)
                        .with_payload(TokenPayload::Text(text));
                }
                break;
            }
        }

        self.record_at(GlobalToken::Identifier, line, column)
            .with_payload(TokenPayload::Text(text))
    }

    fn scan_number(&mut self) -> TokenRecord {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if self.peek_char(0) == Some('-') {
            text.push('-');
            self.advance_char();
        }

        let accepts_underscore = self.flags().contains(RevisionFlags::ACCEPTS_UNDERSCORE_SEP);
        let accepts_binary = self.flags().contains(RevisionFlags::ACCEPTS_BINARY_LITERALS);

        if self.peek_char(0) == Some('0') && matches!(self.peek_char(1), Some('x') | Some('X')) {
            text.push('0');
            self.advance_char();
            text.push(self.advance_char().unwrap());
            while let Some(c) = self.peek_char(0) {
                if c.is_ascii_hexdigit() || (c == '_' && accepts_underscore) {
                    text.push(c);
                    self.advance_char();
                } else {
                    break;
                }
            }
            let digits: String = text.trim_start_matches('-').chars().filter(|c| *c != '_').collect();
            return match i64::from_str_radix(digits.trim_start_matches("0x").trim_start_matches("0X"), 16) {
                Ok(v) => self
                    .record_at(GlobalToken::Constant, line, column)
                    .with_payload(TokenPayload::Constant(Variant::Int(v))),
                Err(_) => self
                    .record_at(GlobalToken::Error, line, column)
                    .error(format!("invalid hexadecimal literal {text:?}")),
            };
        }

        if accepts_binary && self.peek_char(0) == Some('0') && matches!(self.peek_char(1), Some('b') | Some('B')) {
            text.push('0');
            self.advance_char();
            text.push(self.advance_char().unwrap());
            while let Some(c) = self.peek_char(0) {
                if c == '0' || c == '1' || (c == '_' && accepts_underscore) {
                    text.push(c);
                    self.advance_char();
                } else {
                    break;
                }
            }
            let digits: String = text
                .trim_start_matches('-')
                .trim_start_matches("0b")
                .trim_start_matches("0B")
                .chars()
                .filter(|c| *c != '_')
                .collect();
            return match i64::from_str_radix(&digits, 2) {
                Ok(v) => self
                    .record_at(GlobalToken::Constant, line, column)
                    .with_payload(TokenPayload::Constant(Variant::Int(v))),
                Err(_) => self
                    .record_at(GlobalToken::Error, line, column)
                    .error(format!("invalid binary literal {text:?}")),
            };
        }

        let mut is_float = false;
        while let Some(c) = self.peek_char(0) {
            if c.is_ascii_digit() || (c == '_' && accepts_underscore) {
                text.push(c);
                self.advance_char();
            } else {
                break;
            }
        }
        if self.peek_char(0) == Some('.') && self.peek_char(1) != Some('.') {
            is_float = true;
            text.push('.');
            self.advance_char();
            while let Some(c) = self.peek_char(0) {
                if c.is_ascii_digit() || (c == '_' && accepts_underscore) {
                    text.push(c);
                    self.advance_char();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek_char(0), Some('e') | Some('E')) {
            let sign_offset = if matches!(self.peek_char(1), Some('+') | Some('-')) { 2 } else { 1 };
            if self.peek_char(sign_offset).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push(self.advance_char().unwrap());
                if sign_offset == 2 {
                    text.push(self.advance_char().unwrap());
                }
                while let Some(c) = self.peek_char(0) {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance_char();
                    } else {
                        break;
                    }
                }
            }
        }

        let digits: String = text.chars().filter(|c| *c != '_').collect();
        if is_float {
            match digits.parse::<f64>() {
                Ok(v) => self
                    .record_at(GlobalToken::Constant, line, column)
                    .with_payload(TokenPayload::Constant(Variant::Float(v))),
                Err(_) => self
                    .record_at(GlobalToken::Error, line, column)
                    .error(format!("invalid numeric literal {text:?}")),
            }
        } else {
            match digits.parse::<i64>() {
                Ok(v) => self
                    .record_at(GlobalToken::Constant, line, column)
                    .with_payload(TokenPayload::Constant(Variant::Int(v))),
                Err(_) => self
                    .record_at(GlobalToken::Error, line, column)
                    .error(format!("invalid numeric literal {text:?}")),
            }
        }
    }

    /// Consumes one escape sequence after a `\` has already been consumed,
    /// appending its decoded character(s) to `out`. Returns an error record
    /// on an unrecognized escape (spec section 4.4, "Strings").
    fn scan_escape(&mut self, out: &mut String, line: u32, column: u32) -> Option<TokenRecord> {
        let Some(c) = self.advance_char() else {
            return Some(
                self.record_at(GlobalToken::Error, line, column)
                    .error("unterminated escape sequence"),
            );
        };
        match c {
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'v' => out.push('\u{B}'),
            'f' => out.push('\u{C}'),
            'r' => out.push('\r'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'u' => {
                let mut hex = String::with_capacity(4);
                for _ in 0..4 {
                    match self.advance_char() {
                        Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                        _ => {
                            return Some(
                                self.record_at(GlobalToken::Error, line, column)
                                    .error("invalid \\u escape"),
                            );
                        }
                    }
                }
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        return Some(
                            self.record_at(GlobalToken::Error, line, column)
                                .error(format!("invalid \\u{hex} escape")),
                        );
                    }
                }
            }
            other => {
                return Some(
                    self.record_at(GlobalToken::Error, line, column)
                        .error(format!("unrecognized escape \\{other}")),
                );
            }
        }
        None
    }

    fn scan_string(&mut self, quote: char) -> TokenRecord {
        let (line, column) = (self.line, self.column);
        self.advance_char(); // opening quote
        let triple = quote == '"' && self.peek_char(0) == Some('"') && self.peek_char(1) == Some('"');
        if triple {
            self.advance_char();
            self.advance_char();
        }

        let mut text = String::new();
        loop {
            match self.peek_char(0) {
                None => {
                    return self
                        .record_at(GlobalToken::Error, line, column)
                        .error("unterminated string literal");
                }
                Some('\\') => {
                    self.advance_char();
                    if let Some(err) = self.scan_escape(&mut text, line, column) {
                        return err;
                    }
                }
                Some('\n') if !triple => {
                    return self
                        .record_at(GlobalToken::Error, line, column)
                        .error("unterminated string literal at end of line");
                }
                Some('\n') => {
                    // Multi-line string bodies always advance the line
                    // counter as the newline is consumed - spec section
                    // 4.4's "even within the lexer's internal accounting".
                    text.push('\n');
                    self.advance_char();
                }
                Some(q) if q == quote && !triple => {
                    self.advance_char();
                    break;
                }
                Some('"') if triple && self.peek_char(1) == Some('"') && self.peek_char(2) == Some('"') => {
                    self.advance_char();
                    self.advance_char();
                    self.advance_char();
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.advance_char();
                }
            }
        }

        self.record_at(GlobalToken::Constant, line, column)
            .with_payload(TokenPayload::Constant(Variant::String(text)))
    }

    fn scan_node_path(&mut self, quote: char) -> TokenRecord {
        let (line, column) = (self.line, self.column);
        self.advance_char(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek_char(0) {
                None | Some('\n') => {
                    return self
                        .record_at(GlobalToken::Error, line, column)
                        .error("unterminated node-path literal");
                }
                Some(q) if q == quote => {
                    self.advance_char();
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.advance_char();
                }
            }
        }
        self.record_at(GlobalToken::Constant, line, column)
            .with_payload(TokenPayload::Constant(Variant::NodePath(text)))
    }

    fn scan_operator_or_punct(&mut self) -> TokenRecord {
        let (line, column) = (self.line, self.column);
        let c = self.advance_char().unwrap();
        let flags = self.flags();

        macro_rules! two {
            ($second:expr, $tok:expr) => {
                if self.peek_char(0) == Some($second) {
                    self.advance_char();
                    return self.record_at($tok, line, column);
                }
            };
        }

        match c {
            '(' => self.record_at(GlobalToken::ParenthesisOpen, line, column),
            ')' => self.record_at(GlobalToken::ParenthesisClose, line, column),
            '[' => self.record_at(GlobalToken::BracketOpen, line, column),
            ']' => self.record_at(GlobalToken::BracketClose, line, column),
            '{' => self.record_at(GlobalToken::CurlyBracketOpen, line, column),
            '}' => self.record_at(GlobalToken::CurlyBracketClose, line, column),
            ',' => self.record_at(GlobalToken::Comma, line, column),
            ';' => self.record_at(GlobalToken::Semicolon, line, column),
            ':' => self.record_at(GlobalToken::Colon, line, column),
            '`' => self.record_at(GlobalToken::Backtick, line, column),
            '~' => self.record_at(GlobalToken::OpBitInvert, line, column),
            '?' => self.record_at(GlobalToken::QuestionMark, line, column),
            '$' if flags.contains(RevisionFlags::HAS_DOLLAR_SIGIL) => {
                self.record_at(GlobalToken::Dollar, line, column)
            }
            '.' => {
                if self.peek_char(0) == Some('.') {
                    self.advance_char();
                    if flags.contains(RevisionFlags::HAS_PERIOD_PERIOD) {
                        if self.peek_char(0) == Some('.') {
                            self.advance_char();
                            return self.record_at(GlobalToken::PeriodPeriodPeriod, line, column);
                        }
                        return self.record_at(GlobalToken::PeriodPeriod, line, column);
                    }
                    // Pre-2.0: the first `.` is its own token and the second
                    // is re-scanned as the start of the next token (spec
                    // section 4.4: "the first period emits PERIOD and the
                    // second re-scans").
                    self.pos -= 1;
                    self.column -= 1;
                    return self.record_at(GlobalToken::Period, line, column);
                }
                self.record_at(GlobalToken::Period, line, column)
            }
            '+' => {
                two!('=', GlobalToken::OpAssignAdd);
                self.record_at(GlobalToken::OpAdd, line, column)
            }
            '-' => {
                two!('=', GlobalToken::OpAssignSub);
                if self.peek_char(0) == Some('>') {
                    self.advance_char();
                    return self.record_at(GlobalToken::ForwardArrow, line, column);
                }
                self.record_at(GlobalToken::OpSub, line, column)
            }
            '*' => {
                two!('=', GlobalToken::OpAssignMul);
                self.record_at(GlobalToken::OpMul, line, column)
            }
            '/' => {
                two!('=', GlobalToken::OpAssignDiv);
                self.record_at(GlobalToken::OpDiv, line, column)
            }
            '%' => {
                two!('=', GlobalToken::OpAssignMod);
                self.record_at(GlobalToken::OpMod, line, column)
            }
            '=' => {
                two!('=', GlobalToken::OpEqual);
                self.record_at(GlobalToken::OpAssign, line, column)
            }
            '!' => {
                two!('=', GlobalToken::OpNotEqual);
                self.record_at(GlobalToken::OpNot, line, column)
            }
            '<' => {
                if self.peek_char(0) == Some('<') {
                    self.advance_char();
                    two!('=', GlobalToken::OpAssignShiftLeft);
                    return self.record_at(GlobalToken::OpShiftLeft, line, column);
                }
                two!('=', GlobalToken::OpLessEqual);
                self.record_at(GlobalToken::OpLess, line, column)
            }
            '>' => {
                if self.peek_char(0) == Some('>') {
                    self.advance_char();
                    two!('=', GlobalToken::OpAssignShiftRight);
                    return self.record_at(GlobalToken::OpShiftRight, line, column);
                }
                two!('=', GlobalToken::OpGreaterEqual);
                self.record_at(GlobalToken::OpGreater, line, column)
            }
            '&' => {
                if self.peek_char(0) == Some('&') {
                    self.advance_char();
                    if flags.contains(RevisionFlags::HAS_AMP_AMP_TOKENS) {
                        return self.record_at(GlobalToken::AmpersandAmpersand, line, column);
                    }
                    return self.record_at(GlobalToken::OpAnd, line, column);
                }
                two!('=', GlobalToken::OpAssignBitAnd);
                self.record_at(GlobalToken::OpBitAnd, line, column)
            }
            '|' => {
                if self.peek_char(0) == Some('|') {
                    self.advance_char();
                    if flags.contains(RevisionFlags::HAS_AMP_AMP_TOKENS) {
                        return self.record_at(GlobalToken::PipePipe, line, column);
                    }
                    return self.record_at(GlobalToken::OpOr, line, column);
                }
                two!('=', GlobalToken::OpAssignBitOr);
                self.record_at(GlobalToken::OpBitOr, line, column)
            }
            '^' => {
                two!('=', GlobalToken::OpAssignBitXor);
                self.record_at(GlobalToken::OpBitXor, line, column)
            }
            other => self
                .record_at(GlobalToken::Error, line, column)
                .error(format!("unrecognized character {other:?}")),
        }
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = TokenRecord;

    fn next(&mut self) -> Option<TokenRecord> {
        if self.ring_count == 0 {
            return None;
        }
        let tok = self.ring[self.ring_head].take().unwrap();
        self.ring_head = (self.ring_head + 1) % 4;
        self.ring_count -= 1;
        self.fill();
        Some(tok)
    }
}

/// Build a [`TokenStream`] over `source` (spec section 4.4's public
/// contract, `tokenize`).
pub fn tokenize<'a>(source: &str, revision: &'a RevisionDescriptor) -> TokenStream<'a> {
    TokenStream::new(source, revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use std::collections::HashMap;

    fn test_revision(flags: RevisionFlags) -> RevisionDescriptor {
        use GlobalToken::*;
        RevisionDescriptor {
            commit_id: 1,
            engine_version_min: "4.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: 100,
            variant_format_major: 4,
            token_table: vec![
                Empty, Identifier, Constant, SelfKw, BuiltInType, BuiltInFunc, ConstPi, ConstTau,
                ConstInf, ConstNan, Wildcard, OpAdd, OpSub, OpMul, OpDiv, OpMod, OpAssign, If, Elif,
                Else, For, While, Break, Continue, Pass, Return, Match, Function, Class, Extends,
                Var, Const, Static, Onready, Dollar, AmpersandAmpersand, PipePipe, PeriodPeriod,
                PeriodPeriodPeriod, BracketOpen, BracketClose, ParenthesisOpen, ParenthesisClose,
                Comma, Period, Colon, Newline, Eof, Error, OpAnd, OpOr, OpNot,
            ],
            function_table: vec!["print".to_string()],
            function_arity_overrides: HashMap::new(),
            parent_commit_id: None,
            flags,
        }
    }

    fn collect(src: &str, rev: &RevisionDescriptor) -> Vec<TokenRecord> {
        tokenize(src, rev).collect()
    }

    #[test]
    fn tokenizes_a_minimal_assignment() {
        let rev = test_revision(RevisionFlags::HAS_AMP_AMP_TOKENS | RevisionFlags::HAS_PERIOD_PERIOD);
        let toks = collect("var x = 1\n", &rev);
        let kinds: Vec<_> = toks.iter().map(|t| t.global_token).collect();
        assert_eq!(
            kinds,
            vec![
                GlobalToken::Var,
                GlobalToken::Identifier,
                GlobalToken::OpAssign,
                GlobalToken::Constant,
                GlobalToken::Newline,
                GlobalToken::Eof,
            ]
        );
    }

    #[test]
    fn ampersand_ampersand_maps_to_and_before_2_0() {
        let rev = test_revision(RevisionFlags::empty());
        let toks = collect("a && b\n", &rev);
        assert_eq!(toks[1].global_token, GlobalToken::OpAnd);
    }

    #[test]
    fn ampersand_ampersand_is_distinct_token_at_2_0() {
        let rev = test_revision(RevisionFlags::HAS_AMP_AMP_TOKENS);
        let toks = collect("a && b\n", &rev);
        assert_eq!(toks[1].global_token, GlobalToken::AmpersandAmpersand);
    }

    #[test]
    fn binary_literal_requires_flag() {
        let rev = test_revision(RevisionFlags::ACCEPTS_BINARY_LITERALS);
        let toks = collect("0b101\n", &rev);
        assert_eq!(toks[0].global_token, GlobalToken::Constant);
        assert_eq!(toks[0].payload, TokenPayload::Constant(Variant::Int(5)));
    }

    #[test]
    fn underscore_separators_require_flag() {
        let rev = test_revision(RevisionFlags::ACCEPTS_UNDERSCORE_SEP);
        let toks = collect("1_000\n", &rev);
        assert_eq!(toks[0].payload, TokenPayload::Constant(Variant::Int(1000)));
    }

    #[test]
    fn mixed_indentation_is_an_error_when_flagged() {
        let rev = test_revision(RevisionFlags::MIXED_TAB_SPACE_IS_ERROR);
        let toks = collect(" \tvar x = 1\n", &rev);
        assert_eq!(toks[0].global_token, GlobalToken::Error);
    }

    #[test]
    fn dollar_sigil_requires_flag() {
        let rev = test_revision(RevisionFlags::HAS_DOLLAR_SIGIL);
        let toks = collect("$Foo\n", &rev);
        assert_eq!(toks[0].global_token, GlobalToken::Dollar);
    }

    #[test]
    fn node_path_literal_is_a_constant() {
        let rev = test_revision(RevisionFlags::HAS_DOLLAR_SIGIL);
        let toks = collect("@\"Foo/Bar\"\n", &rev);
        assert_eq!(
            toks[0].payload,
            TokenPayload::Constant(Variant::NodePath("Foo/Bar".to_string()))
        );
    }

    #[test]
    fn lookahead_peek_sees_ahead_without_consuming() {
        let rev = test_revision(RevisionFlags::empty());
        let mut stream = tokenize("var x\n", &rev);
        assert_eq!(stream.peek(1).unwrap().global_token, GlobalToken::Identifier);
        let first = stream.next().unwrap();
        assert_eq!(first.global_token, GlobalToken::Var);
    }

    #[test]
    fn unterminated_string_is_an_error_record() {
        let rev = test_revision(RevisionFlags::empty());
        let toks = collect("\"abc\n", &rev);
        assert_eq!(toks[0].global_token, GlobalToken::Error);
        assert!(toks[0].error_message.is_some());
    }
}

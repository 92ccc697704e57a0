//! The Source Reconstructor (spec section 4.5): turns a decoded
//! [`ScriptState`] back into GDScript source text.
//!
//! Operates as a single synchronous pass maintaining a handful of local
//! variables rather than a struct with interior mutability (spec section
//! 5: "the whole operation is synchronous and single-shot per operation"),
//! mirroring `crates/compiler/src/codegen/words.rs`'s per-opcode dispatch
//! shape for the per-token formatting step.

use gdsc_core::error::{GdscError, GdscResult};
use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::state::ScriptState;
use gdsc_core::token::GlobalToken;
use gdsc_core::variant::Variant;

const TAB_SIZE: i64 = 1;

struct Cursor<'a> {
    state: &'a ScriptState,
    revision: &'a RevisionDescriptor,
    indent_unit: char,
    output: String,
    buffer: String,
    line_started: bool,
    current_indent: u32,
    prev_line: u32,
    prev_column_anchor: i64,
    prev_emitted: GlobalToken,
}

fn format_constant(value: &Variant) -> String {
    match value {
        Variant::Nil => "null".to_string(),
        Variant::Bool(b) => b.to_string(),
        Variant::Int(i) => i.to_string(),
        Variant::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
        Variant::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        Variant::Vector2(x, y) => format!("Vector2({x}, {y})"),
        Variant::Vector3(x, y, z) => format!("Vector3({x}, {y}, {z})"),
        Variant::NodePath(p) => format!("@\"{p}\""),
        Variant::Array(items) => {
            let parts: Vec<String> = items.iter().map(format_constant).collect();
            format!("[{}]", parts.join(", "))
        }
        Variant::Dictionary(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", format_constant(k), format_constant(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Variant::Raw { type_tag, bytes } => format!("<raw type {type_tag} len {}>", bytes.len()),
    }
}

const BINARY_OPS: &[GlobalToken] = &[
    GlobalToken::OpAdd,
    GlobalToken::OpMul,
    GlobalToken::OpDiv,
    GlobalToken::OpShiftLeft,
    GlobalToken::OpShiftRight,
    GlobalToken::OpBitAnd,
    GlobalToken::OpBitOr,
    GlobalToken::OpBitXor,
    GlobalToken::OpEqual,
    GlobalToken::OpNotEqual,
    GlobalToken::OpLess,
    GlobalToken::OpLessEqual,
    GlobalToken::OpGreater,
    GlobalToken::OpGreaterEqual,
    GlobalToken::OpAssign,
    GlobalToken::OpAssignAdd,
    GlobalToken::OpAssignSub,
    GlobalToken::OpAssignMul,
    GlobalToken::OpAssignDiv,
    GlobalToken::OpAssignMod,
    GlobalToken::OpAssignShiftLeft,
    GlobalToken::OpAssignShiftRight,
    GlobalToken::OpAssignBitAnd,
    GlobalToken::OpAssignBitOr,
    GlobalToken::OpAssignBitXor,
    GlobalToken::OpAnd,
    GlobalToken::OpOr,
    GlobalToken::AmpersandAmpersand,
    GlobalToken::PipePipe,
];

fn operator_text(tok: GlobalToken) -> &'static str {
    use GlobalToken::*;
    match tok {
        OpAdd => "+",
        OpSub => "-",
        OpMul => "*",
        OpDiv => "/",
        OpMod => "%",
        OpShiftLeft => "<<",
        OpShiftRight => ">>",
        OpBitAnd => "&",
        OpBitOr => "|",
        OpBitXor => "^",
        OpBitInvert => "~",
        OpNot => "!",
        OpAnd => "and",
        OpOr => "or",
        AmpersandAmpersand => "&&",
        PipePipe => "||",
        OpEqual => "==",
        OpNotEqual => "!=",
        OpLess => "<",
        OpLessEqual => "<=",
        OpGreater => ">",
        OpGreaterEqual => ">=",
        OpAssign => "=",
        OpAssignAdd => "+=",
        OpAssignSub => "-=",
        OpAssignMul => "*=",
        OpAssignDiv => "/=",
        OpAssignMod => "%=",
        OpAssignShiftLeft => "<<=",
        OpAssignShiftRight => ">>=",
        OpAssignBitAnd => "&=",
        OpAssignBitOr => "|=",
        OpAssignBitXor => "^=",
        other => unreachable!("{other:?} is not an operator token"),
    }
}

fn keyword_text(tok: GlobalToken) -> Option<&'static str> {
    use GlobalToken::*;
    Some(match tok {
        If => "if",
        Elif => "elif",
        Else => "else",
        For => "for",
        While => "while",
        Break => "break",
        Continue => "continue",
        Pass => "pass",
        Return => "return",
        Match => "match",
        When => "when",
        Do => "do",
        Case => "case",
        Switch => "switch",
        Function => "func",
        Class => "class",
        ClassName => "class_name",
        Extends => "extends",
        Is => "is",
        Onready => "onready",
        Tool => "tool",
        Static => "static",
        Export => "export",
        Const => "const",
        Var => "var",
        As => "as",
        Void => "void",
        Enum => "enum",
        Preload => "preload",
        Assert => "assert",
        Yield => "yield",
        Signal => "signal",
        Breakpoint => "breakpoint",
        Remote => "remote",
        Master => "master",
        Puppet => "puppet",
        Remotesync => "remotesync",
        Mastersync => "mastersync",
        Puppetsync => "puppetsync",
        Await => "await",
        Namespace => "namespace",
        Super => "super",
        Trait => "trait",
        Abstract => "abstract",
        SelfKw => "self",
        Wildcard => "_",
        ConstPi => "PI",
        ConstTau => "TAU",
        ConstInf => "INF",
        ConstNan => "NAN",
        _ => return None,
    })
}

impl<'a> Cursor<'a> {
    fn new(state: &'a ScriptState, revision: &'a RevisionDescriptor) -> Self {
        Cursor {
            state,
            revision,
            indent_unit: if state.columns.is_empty() { '\t' } else { ' ' },
            output: String::new(),
            buffer: String::new(),
            line_started: false,
            current_indent: 0,
            prev_line: 1,
            prev_column_anchor: 1,
            prev_emitted: GlobalToken::Newline,
        }
    }

    fn ends_with_space(&self) -> bool {
        self.buffer.ends_with(' ') || self.buffer.is_empty()
    }

    fn peek_global(&self, index: usize) -> Option<GlobalToken> {
        let tok = self.state.tokens.get(index + 1)?;
        self.revision.global_of(tok.local_id())
    }

    fn push_indent_if_first(&mut self) {
        if !self.line_started {
            for _ in 0..self.current_indent {
                self.buffer.push(self.indent_unit);
            }
            self.line_started = true;
        }
    }

    fn flush_line(&mut self) {
        // A NEWLINE whose line never accumulated any buffered text and that
        // arrives before anything has been written yet is a swallowed
        // leading comment/blank line - drop it rather than open the file
        // with a spurious blank line. Once output has started, blank lines
        // flush normally (comment preservation is not guaranteed; blank-line
        // spacing in the body is).
        if !self.buffer.is_empty() || !self.output.is_empty() {
            self.output.push_str(&self.buffer);
            self.output.push('\n');
        }
        self.buffer.clear();
        self.line_started = false;
    }

    fn emit_synthetic_break(&mut self, target_line: u32, is_v2: bool, has_line_entry: bool) {
        let delta = target_line.saturating_sub(self.prev_line);
        if delta == 0 {
            return;
        }
        let buffer_nonempty = !self.buffer.is_empty();
        self.flush_line();
        for _ in 1..delta {
            let insert_backslash = if is_v2 {
                !has_line_entry && buffer_nonempty
            } else {
                buffer_nonempty
            };
            if insert_backslash {
                self.output.push('\\');
            }
            self.output.push('\n');
        }
        self.prev_line = target_line;
    }

    fn derive_v2_indent(&mut self, index: usize) {
        // `index` is the NEWLINE token itself; the indent this NEWLINE
        // introduces is read off the column of the next line's first token,
        // not the NEWLINE's own (end-of-line) column.
        let Some(new_column) = self.state.columns.get(&((index + 1) as u32)) else {
            return;
        };
        let new_column = *new_column as i64;
        let delta = new_column - self.prev_column_anchor;
        if delta == 0 {
            return;
        }
        let units = if delta.abs() >= TAB_SIZE {
            delta / TAB_SIZE
        } else if delta > 0 {
            1
        } else {
            -1
        };
        self.current_indent = (self.current_indent as i64 + units).max(0) as u32;
        self.prev_column_anchor = new_column;
    }

    fn format_literal(&mut self, index: usize, tok_global: GlobalToken, payload: u32) -> GdscResult<()> {
        self.push_indent_if_first();
        match tok_global {
            GlobalToken::Identifier => {
                let text = self.state.identifiers.get(payload as usize).ok_or_else(|| {
                    GdscError::InvalidScriptState(format!(
                        "token {index} references identifier {payload}, out of range"
                    ))
                })?;
                self.buffer.push_str(text);
            }
            GlobalToken::Constant => {
                let value = self.state.constants.get(payload as usize).ok_or_else(|| {
                    GdscError::InvalidScriptState(format!(
                        "token {index} references constant {payload}, out of range"
                    ))
                })?;
                self.buffer.push_str(&format_constant(value));
            }
            GlobalToken::BuiltInFunc => {
                let name = self
                    .revision
                    .function_table
                    .get(payload as usize)
                    .map(String::as_str)
                    .unwrap_or("<unknown_func>");
                self.buffer.push_str(name);
            }
            GlobalToken::BuiltInType => {
                self.buffer.push_str("<built_in_type>");
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    fn format_token(&mut self, index: usize, tok_global: GlobalToken, payload: u32) -> GdscResult<()> {
        use GlobalToken::*;
        match tok_global {
            Identifier | Constant | BuiltInFunc | BuiltInType => {
                return self.format_literal(index, tok_global, payload);
            }
            _ => {}
        }

        self.push_indent_if_first();

        if BINARY_OPS.contains(&tok_global) {
            if tok_global == OpSub && !self.prev_emitted.can_precede_binary_operator() {
                self.buffer.push('-');
                return Ok(());
            }
            if tok_global == OpMod {
                self.buffer.push('%');
                if matches!(self.prev_emitted, GlobalToken::Constant | GlobalToken::Identifier) {
                    self.buffer.push(' ');
                }
                return Ok(());
            }
            if !self.ends_with_space() && self.prev_emitted != Newline {
                self.buffer.push(' ');
            }
            self.buffer.push_str(operator_text(tok_global));
            self.buffer.push(' ');
            return Ok(());
        }

        match tok_global {
            Period => self.buffer.push('.'),
            PeriodPeriod => self.buffer.push_str(".."),
            PeriodPeriodPeriod => self.buffer.push_str("..."),
            Comma => self.buffer.push_str(", "),
            Colon => {
                self.buffer.push(':');
                if self.peek_global(index) != Some(Newline) {
                    self.buffer.push(' ');
                }
            }
            Semicolon => self.buffer.push_str("; "),
            BracketOpen => self.buffer.push('['),
            BracketClose => self.buffer.push(']'),
            CurlyBracketOpen => self.buffer.push('{'),
            CurlyBracketClose => self.buffer.push('}'),
            ParenthesisOpen => self.buffer.push('('),
            ParenthesisClose => self.buffer.push(')'),
            Dollar => self.buffer.push('$'),
            ForwardArrow => self.buffer.push_str("-> "),
            QuestionMark => self.buffer.push('?'),
            Backtick => self.buffer.push('`'),
            OpBitInvert => self.buffer.push('~'),
            OpNot => self.buffer.push_str("!"),
            Var => {
                let prefix_space = !self.buffer.is_empty() && self.prev_emitted != Onready;
                if prefix_space {
                    self.buffer.push(' ');
                }
                self.buffer.push_str("var ");
            }
            Setget => self.buffer.push_str(" setget "),
            _ => {
                if let Some(word) = keyword_text(tok_global) {
                    self.buffer.push_str(word);
                    // func/super/yield/return/match/else/breakpoint attach
                    // directly to a following `(` (lambda/call position);
                    // everywhere else they take a trailing space.
                    let attaches = matches!(
                        tok_global,
                        Function | Super | Yield | Return | Match | Else | Breakpoint
                    ) && self.peek_global(index) == Some(ParenthesisOpen);
                    if !attaches {
                        self.buffer.push(' ');
                    }
                } else {
                    // Structural/unhandled tokens contribute no text of
                    // their own (Indent/Dedent/Error/Cursor never appear
                    // in a well-formed serialized buffer per spec section
                    // 4.6 rule 9).
                }
            }
        }
        Ok(())
    }

    fn run(mut self) -> GdscResult<String> {
        let is_v2 = self.state.is_v2();
        let token_count = self.state.tokens.len();
        for i in 0..token_count {
            let tok = self.state.tokens[i];
            let Some(tok_global) = self.revision.global_of(tok.local_id()) else {
                return Err(GdscError::InvalidScriptState(format!(
                    "token {i} has unrecognized local id {}",
                    tok.local_id()
                )));
            };

            if tok_global != GlobalToken::Newline {
                if let Some(&line) = self.state.lines.get(&(i as u32)) {
                    if line > self.prev_line {
                        let has_line_entry = self.state.lines.contains_key(&(i as u32));
                        self.emit_synthetic_break(line, is_v2, has_line_entry);
                    }
                }
            }

            self.format_token(i, tok_global, tok.payload())?;

            if tok_global == GlobalToken::Newline {
                self.flush_line();
                if is_v2 {
                    self.derive_v2_indent(i);
                } else {
                    self.current_indent = tok.payload();
                }
                // The map entry at a NEWLINE's own index (when present, per
                // the dense write in compile_to_state) is the line the
                // NEWLINE terminates, not the line it opens - always step
                // past it rather than only falling back to +1 when the
                // entry happens to be absent.
                self.prev_line = self.state.lines.get(&(i as u32)).copied().unwrap_or(self.prev_line) + 1;
            }

            self.prev_emitted = tok_global;
        }

        if !self.buffer.is_empty() {
            self.flush_line();
        }

        if self.state.bytecode_format_version >= gdsc_core::sentinels::GDSCRIPT_2_0_VERSION
            && !self.output.is_empty()
            && !self.output.ends_with('\n')
        {
            self.output.push('\n');
        }

        Ok(self.output)
    }
}

/// Reconstructs GDScript source text from `script_state` (spec section 4.5).
pub fn reconstruct(script_state: &ScriptState, revision: &RevisionDescriptor) -> GdscResult<String> {
    if script_state.is_empty_script() {
        return Ok(String::new());
    }
    Cursor::new(script_state, revision).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use gdsc_core::token::EncodedToken;
    use std::collections::HashMap;

    fn test_revision() -> RevisionDescriptor {
        use GlobalToken::*;
        RevisionDescriptor {
            commit_id: 1,
            engine_version_min: "1.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: 1,
            variant_format_major: 1,
            token_table: vec![Empty, Identifier, Constant, Newline, Eof, Var, OpAssign],
            function_table: vec![],
            function_arity_overrides: HashMap::new(),
            parent_commit_id: None,
            flags: RevisionFlags::empty(),
        }
    }

    #[test]
    fn empty_script_reconstructs_to_empty_text() {
        let rev = test_revision();
        let state = ScriptState::new(1);
        assert_eq!(reconstruct(&state, &rev).unwrap(), "");
    }

    #[test]
    fn minimal_assignment_reconstructs_exactly() {
        // Spec scenario S2.
        let rev = test_revision();
        let mut state = ScriptState::new(1);
        state.identifiers.push("x".to_string());
        state.constants.push(Variant::Int(1));
        state.tokens = vec![
            EncodedToken::from_parts(5, 0), // Var
            EncodedToken::from_parts(1, 0), // Identifier(0)
            EncodedToken::from_parts(6, 0), // OpAssign
            EncodedToken::from_parts(2, 0), // Constant(0)
            EncodedToken::from_parts(3, 0), // Newline, indent 0
            EncodedToken::from_parts(4, 0), // Eof
        ];
        state.lines.insert(0, 1);

        let text = reconstruct(&state, &rev).unwrap();
        assert_eq!(text, "var x = 1\n");
    }

    #[test]
    fn unrecognized_local_id_is_invalid_script_state() {
        let rev = test_revision();
        let mut state = ScriptState::new(1);
        state.tokens = vec![EncodedToken::from_parts(200, 0)];
        let err = reconstruct(&state, &rev).unwrap_err();
        assert!(matches!(err, GdscError::InvalidScriptState(_)));
    }

    #[test]
    fn out_of_range_identifier_payload_is_invalid_script_state() {
        let rev = test_revision();
        let mut state = ScriptState::new(1);
        state.tokens = vec![EncodedToken::from_parts(1, 5)];
        let err = reconstruct(&state, &rev).unwrap_err();
        assert!(matches!(err, GdscError::InvalidScriptState(_)));
    }
}

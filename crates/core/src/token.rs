//! The closed, cross-revision token enumeration and the 32-bit encoded
//! token word.
//!
//! [`GlobalToken`]'s numeric ordering is part of the public interface (spec
//! section 3, "GlobalToken"): external fixtures and the wire format both
//! depend on specific discriminant values staying put, so every variant
//! below carries an explicit one. Add new variants before `Max` only, and
//! never renumber an existing one.

/// A token kind that has existed in at least one supported revision.
///
/// Whether a given revision's [`crate::revision::RevisionDescriptor`]
/// actually recognizes a given variant is a property of that revision's
/// `token_table`, not of this enum - `GlobalToken` is the superset across
/// all of them.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlobalToken {
    // --- literal ---
    Empty = 0,
    Identifier = 1,
    Constant = 2,
    SelfKw = 3,
    BuiltInType = 4,
    BuiltInFunc = 5,
    ConstPi = 6,
    ConstTau = 7,
    ConstInf = 8,
    ConstNan = 9,
    Wildcard = 10,

    // --- operator: arithmetic ---
    OpAdd = 11,
    OpSub = 12,
    OpMul = 13,
    OpDiv = 14,
    OpMod = 15,

    // --- operator: bitwise ---
    OpShiftLeft = 16,
    OpShiftRight = 17,
    OpBitAnd = 18,
    OpBitOr = 19,
    OpBitXor = 20,
    OpBitInvert = 21,

    // --- operator: logical ---
    OpNot = 22,
    OpAnd = 23,
    OpOr = 24,
    AmpersandAmpersand = 25,
    PipePipe = 26,

    // --- operator: comparison ---
    OpEqual = 27,
    OpNotEqual = 28,
    OpLess = 29,
    OpLessEqual = 30,
    OpGreater = 31,
    OpGreaterEqual = 32,

    // --- operator: assignment / compound-assignment ---
    OpAssign = 33,
    OpAssignAdd = 34,
    OpAssignSub = 35,
    OpAssignMul = 36,
    OpAssignDiv = 37,
    OpAssignMod = 38,
    OpAssignShiftLeft = 39,
    OpAssignShiftRight = 40,
    OpAssignBitAnd = 41,
    OpAssignBitOr = 42,
    OpAssignBitXor = 43,

    // --- control-flow keyword ---
    If = 44,
    Elif = 45,
    Else = 46,
    For = 47,
    While = 48,
    Break = 49,
    Continue = 50,
    Pass = 51,
    Return = 52,
    Match = 53,
    When = 54,
    Do = 55,
    Case = 56,
    Switch = 57,

    // --- declaration keyword ---
    Function = 58,
    Class = 59,
    ClassName = 60,
    Extends = 61,
    Is = 62,
    Onready = 63,
    Tool = 64,
    Static = 65,
    Export = 66,
    Setget = 67,
    Const = 68,
    Var = 69,
    As = 70,
    Void = 71,
    Enum = 72,
    Preload = 73,
    Assert = 74,
    Yield = 75,
    Signal = 76,
    Breakpoint = 77,
    Remote = 78,
    Master = 79,
    Puppet = 80,
    Remotesync = 81,
    Mastersync = 82,
    Puppetsync = 83,
    Await = 84,
    Namespace = 85,
    Super = 86,
    Trait = 87,
    Abstract = 88,

    // --- punctuation ---
    BracketOpen = 89,
    BracketClose = 90,
    CurlyBracketOpen = 91,
    CurlyBracketClose = 92,
    ParenthesisOpen = 93,
    ParenthesisClose = 94,
    Comma = 95,
    Semicolon = 96,
    Period = 97,
    PeriodPeriod = 98,
    PeriodPeriodPeriod = 99,
    Colon = 100,
    Dollar = 101,
    ForwardArrow = 102,
    QuestionMark = 103,
    Backtick = 104,

    // --- structural ---
    Newline = 105,
    Indent = 106,
    Dedent = 107,
    Eof = 108,
    Error = 109,
    Cursor = 110,
    VcsConflictMarker = 111,

    /// Sentinel one-past-the-end. Never present in a token table or a
    /// serialized buffer.
    Max = 112,
}

impl GlobalToken {
    /// All variants in discriminant order, `Max` excluded.
    pub const ALL: &'static [GlobalToken] = &[
        Self::Empty,
        Self::Identifier,
        Self::Constant,
        Self::SelfKw,
        Self::BuiltInType,
        Self::BuiltInFunc,
        Self::ConstPi,
        Self::ConstTau,
        Self::ConstInf,
        Self::ConstNan,
        Self::Wildcard,
        Self::OpAdd,
        Self::OpSub,
        Self::OpMul,
        Self::OpDiv,
        Self::OpMod,
        Self::OpShiftLeft,
        Self::OpShiftRight,
        Self::OpBitAnd,
        Self::OpBitOr,
        Self::OpBitXor,
        Self::OpBitInvert,
        Self::OpNot,
        Self::OpAnd,
        Self::OpOr,
        Self::AmpersandAmpersand,
        Self::PipePipe,
        Self::OpEqual,
        Self::OpNotEqual,
        Self::OpLess,
        Self::OpLessEqual,
        Self::OpGreater,
        Self::OpGreaterEqual,
        Self::OpAssign,
        Self::OpAssignAdd,
        Self::OpAssignSub,
        Self::OpAssignMul,
        Self::OpAssignDiv,
        Self::OpAssignMod,
        Self::OpAssignShiftLeft,
        Self::OpAssignShiftRight,
        Self::OpAssignBitAnd,
        Self::OpAssignBitOr,
        Self::OpAssignBitXor,
        Self::If,
        Self::Elif,
        Self::Else,
        Self::For,
        Self::While,
        Self::Break,
        Self::Continue,
        Self::Pass,
        Self::Return,
        Self::Match,
        Self::When,
        Self::Do,
        Self::Case,
        Self::Switch,
        Self::Function,
        Self::Class,
        Self::ClassName,
        Self::Extends,
        Self::Is,
        Self::Onready,
        Self::Tool,
        Self::Static,
        Self::Export,
        Self::Setget,
        Self::Const,
        Self::Var,
        Self::As,
        Self::Void,
        Self::Enum,
        Self::Preload,
        Self::Assert,
        Self::Yield,
        Self::Signal,
        Self::Breakpoint,
        Self::Remote,
        Self::Master,
        Self::Puppet,
        Self::Remotesync,
        Self::Mastersync,
        Self::Puppetsync,
        Self::Await,
        Self::Namespace,
        Self::Super,
        Self::Trait,
        Self::Abstract,
        Self::BracketOpen,
        Self::BracketClose,
        Self::CurlyBracketOpen,
        Self::CurlyBracketClose,
        Self::ParenthesisOpen,
        Self::ParenthesisClose,
        Self::Comma,
        Self::Semicolon,
        Self::Period,
        Self::PeriodPeriod,
        Self::PeriodPeriodPeriod,
        Self::Colon,
        Self::Dollar,
        Self::ForwardArrow,
        Self::QuestionMark,
        Self::Backtick,
        Self::Newline,
        Self::Indent,
        Self::Dedent,
        Self::Eof,
        Self::Error,
        Self::Cursor,
        Self::VcsConflictMarker,
    ];

    /// `true` for tokens which, per spec section 4.4's "operator-precedes"
    /// rule, can appear immediately before a binary operator (so a
    /// following `-` is subtraction, not unary negation).
    pub fn can_precede_binary_operator(self) -> bool {
        matches!(
            self,
            GlobalToken::Identifier
                | GlobalToken::Constant
                | GlobalToken::SelfKw
                | GlobalToken::BracketClose
                | GlobalToken::CurlyBracketClose
                | GlobalToken::ParenthesisClose
                | GlobalToken::ConstPi
                | GlobalToken::ConstTau
                | GlobalToken::ConstInf
                | GlobalToken::ConstNan
        )
    }

    /// `true` for the closed set of reserved-word tokens - used by the
    /// tokenizer's keyword scan and the validator's member-access
    /// relaxation (spec section 4.6).
    pub fn is_keyword(self) -> bool {
        use GlobalToken::*;
        matches!(
            self,
            If | Elif
                | Else
                | For
                | While
                | Break
                | Continue
                | Pass
                | Return
                | Match
                | When
                | Do
                | Case
                | Switch
                | Function
                | Class
                | ClassName
                | Extends
                | Is
                | Onready
                | Tool
                | Static
                | Export
                | Setget
                | Const
                | Var
                | As
                | Void
                | Enum
                | Preload
                | Assert
                | Yield
                | Signal
                | Breakpoint
                | Remote
                | Master
                | Puppet
                | Remotesync
                | Mastersync
                | Puppetsync
                | Await
                | Namespace
                | Super
                | Trait
                | Abstract
                | SelfKw
                | OpAnd
                | OpOr
                | OpNot
        )
    }

    /// The stable enumerator name used in dynamic registration payloads
    /// (spec section 6.3, `tk_names`) and diagnostic output. Matches the
    /// variant name exactly, so it is generated from `ALL` rather than
    /// duplicated in a separate table.
    pub fn name(self) -> &'static str {
        Self::ALL[self as usize].variant_name()
    }

    /// Parse an enumerator name back into a [`GlobalToken`].
    pub fn from_name(name: &str) -> Option<GlobalToken> {
        Self::ALL.iter().copied().find(|t| t.variant_name() == name)
    }

    fn variant_name(self) -> &'static str {
        match self {
            GlobalToken::Empty => "Empty",
            GlobalToken::Identifier => "Identifier",
            GlobalToken::Constant => "Constant",
            GlobalToken::SelfKw => "SelfKw",
            GlobalToken::BuiltInType => "BuiltInType",
            GlobalToken::BuiltInFunc => "BuiltInFunc",
            GlobalToken::ConstPi => "ConstPi",
            GlobalToken::ConstTau => "ConstTau",
            GlobalToken::ConstInf => "ConstInf",
            GlobalToken::ConstNan => "ConstNan",
            GlobalToken::Wildcard => "Wildcard",
            GlobalToken::OpAdd => "OpAdd",
            GlobalToken::OpSub => "OpSub",
            GlobalToken::OpMul => "OpMul",
            GlobalToken::OpDiv => "OpDiv",
            GlobalToken::OpMod => "OpMod",
            GlobalToken::OpShiftLeft => "OpShiftLeft",
            GlobalToken::OpShiftRight => "OpShiftRight",
            GlobalToken::OpBitAnd => "OpBitAnd",
            GlobalToken::OpBitOr => "OpBitOr",
            GlobalToken::OpBitXor => "OpBitXor",
            GlobalToken::OpBitInvert => "OpBitInvert",
            GlobalToken::OpNot => "OpNot",
            GlobalToken::OpAnd => "OpAnd",
            GlobalToken::OpOr => "OpOr",
            GlobalToken::AmpersandAmpersand => "AmpersandAmpersand",
            GlobalToken::PipePipe => "PipePipe",
            GlobalToken::OpEqual => "OpEqual",
            GlobalToken::OpNotEqual => "OpNotEqual",
            GlobalToken::OpLess => "OpLess",
            GlobalToken::OpLessEqual => "OpLessEqual",
            GlobalToken::OpGreater => "OpGreater",
            GlobalToken::OpGreaterEqual => "OpGreaterEqual",
            GlobalToken::OpAssign => "OpAssign",
            GlobalToken::OpAssignAdd => "OpAssignAdd",
            GlobalToken::OpAssignSub => "OpAssignSub",
            GlobalToken::OpAssignMul => "OpAssignMul",
            GlobalToken::OpAssignDiv => "OpAssignDiv",
            GlobalToken::OpAssignMod => "OpAssignMod",
            GlobalToken::OpAssignShiftLeft => "OpAssignShiftLeft",
            GlobalToken::OpAssignShiftRight => "OpAssignShiftRight",
            GlobalToken::OpAssignBitAnd => "OpAssignBitAnd",
            GlobalToken::OpAssignBitOr => "OpAssignBitOr",
            GlobalToken::OpAssignBitXor => "OpAssignBitXor",
            GlobalToken::If => "If",
            GlobalToken::Elif => "Elif",
            GlobalToken::Else => "Else",
            GlobalToken::For => "For",
            GlobalToken::While => "While",
            GlobalToken::Break => "Break",
            GlobalToken::Continue => "Continue",
            GlobalToken::Pass => "Pass",
            GlobalToken::Return => "Return",
            GlobalToken::Match => "Match",
            GlobalToken::When => "When",
            GlobalToken::Do => "Do",
            GlobalToken::Case => "Case",
            GlobalToken::Switch => "Switch",
            GlobalToken::Function => "Function",
            GlobalToken::Class => "Class",
            GlobalToken::ClassName => "ClassName",
            GlobalToken::Extends => "Extends",
            GlobalToken::Is => "Is",
            GlobalToken::Onready => "Onready",
            GlobalToken::Tool => "Tool",
            GlobalToken::Static => "Static",
            GlobalToken::Export => "Export",
            GlobalToken::Setget => "Setget",
            GlobalToken::Const => "Const",
            GlobalToken::Var => "Var",
            GlobalToken::As => "As",
            GlobalToken::Void => "Void",
            GlobalToken::Enum => "Enum",
            GlobalToken::Preload => "Preload",
            GlobalToken::Assert => "Assert",
            GlobalToken::Yield => "Yield",
            GlobalToken::Signal => "Signal",
            GlobalToken::Breakpoint => "Breakpoint",
            GlobalToken::Remote => "Remote",
            GlobalToken::Master => "Master",
            GlobalToken::Puppet => "Puppet",
            GlobalToken::Remotesync => "Remotesync",
            GlobalToken::Mastersync => "Mastersync",
            GlobalToken::Puppetsync => "Puppetsync",
            GlobalToken::Await => "Await",
            GlobalToken::Namespace => "Namespace",
            GlobalToken::Super => "Super",
            GlobalToken::Trait => "Trait",
            GlobalToken::Abstract => "Abstract",
            GlobalToken::BracketOpen => "BracketOpen",
            GlobalToken::BracketClose => "BracketClose",
            GlobalToken::CurlyBracketOpen => "CurlyBracketOpen",
            GlobalToken::CurlyBracketClose => "CurlyBracketClose",
            GlobalToken::ParenthesisOpen => "ParenthesisOpen",
            GlobalToken::ParenthesisClose => "ParenthesisClose",
            GlobalToken::Comma => "Comma",
            GlobalToken::Semicolon => "Semicolon",
            GlobalToken::Period => "Period",
            GlobalToken::PeriodPeriod => "PeriodPeriod",
            GlobalToken::PeriodPeriodPeriod => "PeriodPeriodPeriod",
            GlobalToken::Colon => "Colon",
            GlobalToken::Dollar => "Dollar",
            GlobalToken::ForwardArrow => "ForwardArrow",
            GlobalToken::QuestionMark => "QuestionMark",
            GlobalToken::Backtick => "Backtick",
            GlobalToken::Newline => "Newline",
            GlobalToken::Indent => "Indent",
            GlobalToken::Dedent => "Dedent",
            GlobalToken::Eof => "Eof",
            GlobalToken::Error => "Error",
            GlobalToken::Cursor => "Cursor",
            GlobalToken::VcsConflictMarker => "VcsConflictMarker",
            GlobalToken::Max => "Max",
        }
    }
}

/// A single 32-bit encoded token word (spec section 3, "Encoded Token").
///
/// Low 8 bits are the revision-local token id; the upper 24 bits are a
/// payload whose meaning depends on the token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedToken(u32);

impl EncodedToken {
    /// Build a word from a local id and payload. Payloads wider than 24
    /// bits are truncated by the caller's responsibility, not silently here.
    pub fn from_parts(local_id: u8, payload: u32) -> Self {
        debug_assert!(
            payload <= 0x00FF_FFFF,
            "token payload does not fit in 24 bits"
        );
        EncodedToken(((payload & 0x00FF_FFFF) << crate::sentinels::TOKEN_BITS) | local_id as u32)
    }

    /// Wrap an already-assembled word (e.g. read straight off the wire).
    pub fn from_raw(word: u32) -> Self {
        EncodedToken(word)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn local_id(self) -> u8 {
        (self.0 & crate::sentinels::TOKEN_MASK) as u8
    }

    pub fn payload(self) -> u32 {
        self.0 >> crate::sentinels::TOKEN_BITS
    }

    /// `true` when this token's wire form must use the 4-byte encoding:
    /// a single byte can only carry a local id under 128 with a zero
    /// payload (spec section 3 / 4.3 encoding invariants).
    pub fn requires_multi_byte_form(self) -> bool {
        self.payload() != 0 || self.local_id() >= 0x80
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_matches_discriminant_order() {
        for (i, tok) in GlobalToken::ALL.iter().enumerate() {
            // Empty starts at discriminant 0 and ALL is declared in order.
            assert_eq!(*tok as usize, i, "ALL is out of discriminant order at {i}");
        }
    }

    #[test]
    fn encoded_token_round_trips_parts() {
        let t = EncodedToken::from_parts(5, 12345);
        assert_eq!(t.local_id(), 5);
        assert_eq!(t.payload(), 12345);
    }

    #[test]
    fn single_byte_form_only_for_small_local_id_zero_payload() {
        let small = EncodedToken::from_parts(10, 0);
        assert!(!small.requires_multi_byte_form());

        let nonzero_payload = EncodedToken::from_parts(10, 1);
        assert!(nonzero_payload.requires_multi_byte_form());

        let large_id = EncodedToken::from_parts(200, 0);
        assert!(large_id.requires_multi_byte_form());
    }

    #[test]
    fn can_precede_binary_operator_matches_spec_set() {
        assert!(GlobalToken::Identifier.can_precede_binary_operator());
        assert!(GlobalToken::ParenthesisClose.can_precede_binary_operator());
        assert!(!GlobalToken::OpAdd.can_precede_binary_operator());
        assert!(!GlobalToken::Newline.can_precede_binary_operator());
    }
}

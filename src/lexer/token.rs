//! The token catalog.
//!
//! §6 treats the precise set of token tags as an external contract
//! ("closed set; exact names are the interface contract with downstream
//! tools"). This closed set is named the same way the teacher names its own
//! `TokenType` catalog: by what the token *looks like*, never by its use in
//! a particular grammar production, so the parser is free to repurpose a
//! punctuation token across several productions without the lexer knowing
//! or caring.

use convert_case::Casing as _;

use crate::position::Position;

/// A literal value attached to a token once the lexer (or, for macro
/// `#line`-adjusted values, the preprocessor) has decoded its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
	Integer(i64),
	Float(f64),
	Char(char),
	/// Decoded string contents, escapes already resolved, quotes stripped.
	Str(String),
}

/// The closed set of token kinds. Keyword variants are listed before
/// `Identifier` only in the sense that keyword recognition happens before
/// falling back to `Identifier` in the lexer's dispatch (§4.9); the ordering
/// of this enum itself carries no meaning, unlike the teacher's
/// `TokenType`, because this lexer's keyword recognition goes through
/// `dialect::is_keyword` rather than an ordered regex scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::EnumIter)]
pub enum TokenKind {
	// Keywords (dialect-gated; see `dialect.rs`).
	Keyword,

	Identifier,

	IntegerLiteral,
	FloatLiteral,
	CharLiteral,
	StringLiteral,

	// Punctuation and operators.
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Assign,
	PlusAssign,
	MinusAssign,
	StarAssign,
	SlashAssign,
	PercentAssign,
	AmpAssign,
	PipeAssign,
	CaretAssign,
	ShlAssign,
	ShrAssign,
	Eq,
	Ne,
	Lt,
	Gt,
	Le,
	Ge,
	AmpAmp,
	PipePipe,
	Bang,
	Amp,
	Pipe,
	Caret,
	Tilde,
	Shl,
	Shr,
	PlusPlus,
	MinusMinus,
	Arrow,
	Dot,
	Ellipsis,
	Comma,
	Semicolon,
	Colon,
	Question,
	LParen,
	RParen,
	LBrace,
	RBrace,
	LBracket,
	RBracket,

	/// The end-of-token-stream sentinel (§3: "terminated by a sentinel
	/// `END_OF_FILE` token").
	EndOfFile,
}

impl std::fmt::Display for TokenKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// A single lexical token: its kind, its exact source spelling, where it
/// came from (original, pre-expansion position, per §4.9), and its decoded
/// literal value if it's a literal.
#[derive(Debug, Clone)]
pub struct Token {
	pub kind: TokenKind,
	pub lexeme: String,
	pub position: Position,
	pub value: Option<LiteralValue>,
}

impl Token {
	#[must_use]
	pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: Position) -> Self {
		Self { kind, lexeme, position, value: None }
	}

	#[must_use]
	pub fn with_value(mut self, value: LiteralValue) -> Self {
		self.value = Some(value);
		self
	}

	/// The sentinel token every [`crate::parser::token_stream::TokenStream`]
	/// ends with, so that `current()`/`peek(k)` past the last real token
	/// never panics.
	#[must_use]
	pub fn end_of_file(position: Position) -> Self {
		Self::new(TokenKind::EndOfFile, "", position)
	}
}

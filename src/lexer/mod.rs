//! The lexical analyzer (C9): turns the preprocessor's expanded text into a
//! vector of [`Token`]s, using the [`buffer::LookaheadBuffer`] (C3) for
//! character-level access and the [`PositionMap`] to recover each token's
//! *original*, pre-expansion position.
//!
//! The preprocessor produces a complete expanded buffer before this runs
//! (§2: "the preprocessor produces a complete expanded buffer before the
//! lexer runs (non-streaming)"); this module never sees a `#` directive or
//! a macro invocation, only already-expanded C source text.

pub mod buffer;
pub mod token;

use buffer::{LookaheadBuffer, EOF};
pub use token::{LiteralValue, Token, TokenKind};

use crate::{
	dialect::{self, CStandard},
	diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind},
	position::{Position, PositionMap},
};

/// Scans `expanded_text` into a token stream. `position_map` translates each
/// token's start offset in the expanded buffer back to where the user
/// actually wrote it, which is the position stored on the returned
/// [`Token`] (§4.9: "Each token's position uses the original (pre-expansion)
/// position obtained from the position map").
pub fn tokenize(expanded_text: &str, expanded_file_name: &str, position_map: &PositionMap, standard: CStandard, diagnostics: &mut DiagnosticBag) -> Vec<Token> {
	let mut scanner = Scanner {
		chars: LookaheadBuffer::new(expanded_text.chars()),
		expanded_pos: Position::start_of(expanded_file_name),
		position_map,
		standard,
	};
	let mut tokens = Vec::new();

	loop {
		scanner.skip_whitespace_and_comments();
		if !scanner.chars.has_more() {
			break;
		}
		let start = scanner.expanded_pos.clone();
		match scanner.next_token(diagnostics) {
			Some(token) => tokens.push(token),
			None => {
				diagnostics.push(Diagnostic::error(
					DiagnosticKind::Lexical,
					"lexer",
					position_map.lookup(&start),
					format!("unrecognized character '{}'", scanner.peek_char()),
				));
				scanner.advance();
			},
		}
		if diagnostics.should_stop() {
			break;
		}
	}

	let eof_position = position_map.lookup(&scanner.expanded_pos);
	tokens.push(Token::end_of_file(eof_position));
	tokens
}

struct Scanner<'map, I: Iterator<Item = char>> {
	chars: LookaheadBuffer<I>,
	expanded_pos: Position,
	position_map: &'map PositionMap,
	standard: CStandard,
}

impl<'map, I: Iterator<Item = char>> Scanner<'map, I> {
	fn peek_char(&mut self) -> char {
		self.chars.peek(0).unwrap_or(EOF)
	}

	fn peek_at(&mut self, offset: i64) -> char {
		self.chars.peek(offset).unwrap_or(EOF)
	}

	/// Consumes one character, advancing the expanded position.
	fn advance(&mut self) -> char {
		let ch = self.chars.consume();
		if ch != EOF {
			self.expanded_pos = self.expanded_pos.advanced_by(ch);
		}
		ch
	}

	fn skip_whitespace_and_comments(&mut self) {
		loop {
			match self.peek_char() {
				' ' | '\t' | '\n' | '\r' => {
					self.advance();
				},
				'/' if self.peek_at(1) == '/' => {
					while self.peek_char() != '\n' && self.peek_char() != EOF {
						self.advance();
					}
				},
				'/' if self.peek_at(1) == '*' => {
					self.advance();
					self.advance();
					while !(self.peek_char() == '*' && self.peek_at(1) == '/') && self.peek_char() != EOF {
						self.advance();
					}
					if self.peek_char() != EOF {
						self.advance();
						self.advance();
					}
				},
				_ => break,
			}
		}
	}

	fn original_position(&self, expanded_start: &Position) -> Position {
		self.position_map.lookup(expanded_start)
	}

	fn next_token(&mut self, diagnostics: &mut DiagnosticBag) -> Option<Token> {
		let start = self.expanded_pos.clone();
		let ch = self.peek_char();

		if ch.is_ascii_alphabetic() || ch == '_' {
			return Some(self.scan_identifier_or_keyword(start));
		}
		if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_ascii_digit()) {
			return Some(self.scan_number(start));
		}
		if ch == '"' {
			return Some(self.scan_string(start, diagnostics));
		}
		if ch == '\'' {
			return Some(self.scan_char(start, diagnostics));
		}
		self.scan_punctuation(start)
	}

	fn scan_identifier_or_keyword(&mut self, start: Position) -> Token {
		let mut lexeme = String::new();
		while self.peek_char().is_ascii_alphanumeric() || self.peek_char() == '_' {
			lexeme.push(self.advance());
		}
		let kind = if dialect::is_keyword(&lexeme, self.standard) { TokenKind::Keyword } else { TokenKind::Identifier };
		Token::new(kind, lexeme, self.original_position(&start))
	}

	/// Accepts decimal, octal (`0` prefix), hex (`0x` prefix), hex-float
	/// (`0x...p...`), and standard integer suffixes (§4.9/§4.5).
	fn scan_number(&mut self, start: Position) -> Token {
		let mut lexeme = String::new();
		let mut is_float = false;

		if self.peek_char() == '0' && (self.peek_at(1) == 'x' || self.peek_at(1) == 'X') {
			lexeme.push(self.advance());
			lexeme.push(self.advance());
			while self.peek_char().is_ascii_hexdigit() {
				lexeme.push(self.advance());
			}
			if self.peek_char() == '.' {
				is_float = true;
				lexeme.push(self.advance());
				while self.peek_char().is_ascii_hexdigit() {
					lexeme.push(self.advance());
				}
			}
			if self.peek_char() == 'p' || self.peek_char() == 'P' {
				is_float = true;
				lexeme.push(self.advance());
				if self.peek_char() == '+' || self.peek_char() == '-' {
					lexeme.push(self.advance());
				}
				while self.peek_char().is_ascii_digit() {
					lexeme.push(self.advance());
				}
			}
		} else {
			while self.peek_char().is_ascii_digit() {
				lexeme.push(self.advance());
			}
			if self.peek_char() == '.' {
				is_float = true;
				lexeme.push(self.advance());
				while self.peek_char().is_ascii_digit() {
					lexeme.push(self.advance());
				}
			}
			if self.peek_char() == 'e' || self.peek_char() == 'E' {
				is_float = true;
				lexeme.push(self.advance());
				if self.peek_char() == '+' || self.peek_char() == '-' {
					lexeme.push(self.advance());
				}
				while self.peek_char().is_ascii_digit() {
					lexeme.push(self.advance());
				}
			}
		}

		// Integer/float suffixes (u, U, l, L, ll, LL, f, F) are accepted and
		// recorded as part of the lexeme but otherwise ignored, per §4.5:
		// "accepted and ignored (all arithmetic is 64-bit signed)".
		while matches!(self.peek_char(), 'u' | 'U' | 'l' | 'L' | 'f' | 'F') {
			lexeme.push(self.advance());
		}

		let value = if is_float {
			LiteralValue::Float(parse_numeric_prefix(&lexeme).parse_float())
		} else {
			LiteralValue::Integer(parse_numeric_prefix(&lexeme).parse_int())
		};
		let kind = if is_float { TokenKind::FloatLiteral } else { TokenKind::IntegerLiteral };
		Token::new(kind, lexeme, self.original_position(&start)).with_value(value)
	}

	fn scan_string(&mut self, start: Position, diagnostics: &mut DiagnosticBag) -> Token {
		let mut lexeme = String::from("\"");
		let mut decoded = String::new();
		self.advance();
		loop {
			match self.peek_char() {
				EOF | '\n' => {
					diagnostics.push(Diagnostic::error(DiagnosticKind::Lexical, "lexer", self.original_position(&start), "unterminated string literal"));
					break;
				},
				'"' => {
					lexeme.push(self.advance());
					break;
				},
				'\\' => {
					lexeme.push(self.advance());
					if let Some((raw, decoded_char)) = self.scan_escape() {
						lexeme.push_str(&raw);
						decoded.push(decoded_char);
					}
				},
				other => {
					lexeme.push(other);
					decoded.push(other);
					self.advance();
				},
			}
		}
		Token::new(TokenKind::StringLiteral, lexeme, self.original_position(&start)).with_value(LiteralValue::Str(decoded))
	}

	fn scan_char(&mut self, start: Position, diagnostics: &mut DiagnosticBag) -> Token {
		let mut lexeme = String::from("'");
		self.advance();
		let value = match self.peek_char() {
			'\\' => {
				lexeme.push(self.advance());
				self.scan_escape().map(|(raw, decoded)| {
					lexeme.push_str(&raw);
					decoded
				})
			},
			EOF | '\n' => None,
			other => {
				lexeme.push(other);
				self.advance();
				Some(other)
			},
		};
		if self.peek_char() == '\'' {
			lexeme.push(self.advance());
		} else {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Lexical, "lexer", self.original_position(&start), "unterminated character literal"));
		}
		Token::new(TokenKind::CharLiteral, lexeme, self.original_position(&start)).with_value(LiteralValue::Char(value.unwrap_or('\0')))
	}

	/// Decodes one escape sequence after the leading backslash has already
	/// been consumed. Returns both the raw text (for the token's lexeme)
	/// and the decoded character (for the literal value). Supports every
	/// sequence §4.9 names: `\n \t \r \\ \" \' \0 \a \b \f \v \xHH \ooo`.
	fn scan_escape(&mut self) -> Option<(String, char)> {
		let mut raw = String::new();
		let marker = self.peek_char();
		match marker {
			'n' => {
				raw.push(self.advance());
				Some((raw, '\n'))
			},
			't' => {
				raw.push(self.advance());
				Some((raw, '\t'))
			},
			'r' => {
				raw.push(self.advance());
				Some((raw, '\r'))
			},
			'\\' => {
				raw.push(self.advance());
				Some((raw, '\\'))
			},
			'"' => {
				raw.push(self.advance());
				Some((raw, '"'))
			},
			'\'' => {
				raw.push(self.advance());
				Some((raw, '\''))
			},
			'0' => {
				raw.push(self.advance());
				Some((raw, '\0'))
			},
			'a' => {
				raw.push(self.advance());
				Some((raw, '\u{7}'))
			},
			'b' => {
				raw.push(self.advance());
				Some((raw, '\u{8}'))
			},
			'f' => {
				raw.push(self.advance());
				Some((raw, '\u{C}'))
			},
			'v' => {
				raw.push(self.advance());
				Some((raw, '\u{B}'))
			},
			'x' => {
				raw.push(self.advance());
				let mut digits = String::new();
				while self.peek_char().is_ascii_hexdigit() {
					let d = self.advance();
					raw.push(d);
					digits.push(d);
				}
				let code = u32::from_str_radix(&digits, 16).unwrap_or(0);
				char::from_u32(code).map(|c| (raw, c))
			},
			'1'..='7' => {
				let mut digits = String::new();
				for _ in 0..3 {
					if ('0'..='7').contains(&self.peek_char()) {
						let d = self.advance();
						raw.push(d);
						digits.push(d);
					}
				}
				let code = u32::from_str_radix(&digits, 8).unwrap_or(0);
				char::from_u32(code).map(|c| (raw, c))
			},
			_ => None,
		}
	}

	/// Maximal-munch dispatch over the multi-character operator catalog
	/// (§4.9). Longest spellings are tried first so, e.g., `<<=` is never
	/// split into `<<` followed by `=`.
	fn scan_punctuation(&mut self, start: Position) -> Option<Token> {
		macro_rules! op {
			($len:expr, $kind:expr) => {{
				let mut lexeme = String::new();
				for _ in 0..$len {
					lexeme.push(self.advance());
				}
				return Some(Token::new($kind, lexeme, self.original_position(&start)));
			}};
		}

		let (c0, c1, c2) = (self.peek_at(0), self.peek_at(1), self.peek_at(2));
		match (c0, c1, c2) {
			('.', '.', '.') => op!(3, TokenKind::Ellipsis),
			('<', '<', '=') => op!(3, TokenKind::ShlAssign),
			('>', '>', '=') => op!(3, TokenKind::ShrAssign),
			_ => {},
		}
		match (c0, c1) {
			('=', '=') => op!(2, TokenKind::Eq),
			('!', '=') => op!(2, TokenKind::Ne),
			('<', '=') => op!(2, TokenKind::Le),
			('>', '=') => op!(2, TokenKind::Ge),
			('<', '<') => op!(2, TokenKind::Shl),
			('>', '>') => op!(2, TokenKind::Shr),
			('&', '&') => op!(2, TokenKind::AmpAmp),
			('|', '|') => op!(2, TokenKind::PipePipe),
			('+', '=') => op!(2, TokenKind::PlusAssign),
			('-', '=') => op!(2, TokenKind::MinusAssign),
			('*', '=') => op!(2, TokenKind::StarAssign),
			('/', '=') => op!(2, TokenKind::SlashAssign),
			('%', '=') => op!(2, TokenKind::PercentAssign),
			('&', '=') => op!(2, TokenKind::AmpAssign),
			('|', '=') => op!(2, TokenKind::PipeAssign),
			('^', '=') => op!(2, TokenKind::CaretAssign),
			('-', '>') => op!(2, TokenKind::Arrow),
			('+', '+') => op!(2, TokenKind::PlusPlus),
			('-', '-') => op!(2, TokenKind::MinusMinus),
			_ => {},
		}
		let kind = match c0 {
			'+' => TokenKind::Plus,
			'-' => TokenKind::Minus,
			'*' => TokenKind::Star,
			'/' => TokenKind::Slash,
			'%' => TokenKind::Percent,
			'=' => TokenKind::Assign,
			'<' => TokenKind::Lt,
			'>' => TokenKind::Gt,
			'!' => TokenKind::Bang,
			'&' => TokenKind::Amp,
			'|' => TokenKind::Pipe,
			'^' => TokenKind::Caret,
			'~' => TokenKind::Tilde,
			'.' => TokenKind::Dot,
			',' => TokenKind::Comma,
			';' => TokenKind::Semicolon,
			':' => TokenKind::Colon,
			'?' => TokenKind::Question,
			'(' => TokenKind::LParen,
			')' => TokenKind::RParen,
			'{' => TokenKind::LBrace,
			'}' => TokenKind::RBrace,
			'[' => TokenKind::LBracket,
			']' => TokenKind::RBracket,
			_ => return None,
		};
		op!(1, kind)
	}
}

/// A thin helper over the digits accumulated by `scan_number`, stripping the
/// dialect-accepted suffixes before parsing the numeric value itself.
struct NumericPrefix(String);

/// Strips the trailing integer/float suffix (`u`, `U`, `l`, `L`, `ll`,
/// `LL`, `f`, `F`, in any combination) from a scanned numeric lexeme,
/// leaving just the digits (and, for hex-floats, the `p`/`P` exponent) to
/// parse. A lazily-compiled regex is cheaper here than the matching
/// machinery of a second hand-rolled scanner for what's really just
/// "trim one short character class off the end."
fn parse_numeric_prefix(lexeme: &str) -> NumericPrefix {
	let suffix = regex_macro::regex!(r"[uUlLfF]+$");
	NumericPrefix(suffix.replace(lexeme, "").into_owned())
}

impl NumericPrefix {
	fn parse_int(&self) -> i64 {
		let text = self.0.as_str();
		if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
			i64::from_str_radix(hex, 16).unwrap_or(0)
		} else if text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
			i64::from_str_radix(&text[1..], 8).unwrap_or(0)
		} else {
			text.parse().unwrap_or(0)
		}
	}

	fn parse_float(&self) -> f64 {
		self.0.parse().unwrap_or(0.0)
	}
}

#[cfg(test)]
mod tests {
	use super::tokenize;
	use crate::{dialect::CStandard, diagnostics::DiagnosticBag, position::PositionMap, lexer::TokenKind};

	fn lex(src: &str) -> Vec<super::Token> {
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		tokenize(src, "<expanded>", &map, CStandard::C17, &mut diagnostics)
	}

	#[test]
	fn skips_whitespace_and_both_comment_styles() {
		let tokens = lex("  // comment\n/* block */ int x;");
		let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
		assert_eq!(kinds, vec![TokenKind::Keyword, TokenKind::Identifier, TokenKind::Semicolon, TokenKind::EndOfFile]);
	}

	#[test]
	fn maximal_munch_prefers_longest_operator() {
		let tokens = lex("a <<= 1;");
		assert_eq!(tokens[1].kind, TokenKind::ShlAssign);
	}

	#[test]
	fn hex_and_octal_integers_decode_correctly() {
		let tokens = lex("0x1F 017 42");
		assert_eq!(tokens[0].lexeme, "0x1F");
		assert_eq!(tokens[1].lexeme, "017");
		assert_eq!(tokens[2].lexeme, "42");
	}

	#[test]
	fn string_literal_decodes_escapes() {
		let tokens = lex(r#""a\nb""#);
		match &tokens[0].value {
			Some(super::LiteralValue::Str(s)) => assert_eq!(s, "a\nb"),
			other => panic!("expected decoded string literal, got {other:?}"),
		}
	}

	#[test]
	fn unterminated_string_is_reported_but_does_not_panic() {
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize("\"abc", "<expanded>", &map, CStandard::C17, &mut diagnostics);
		assert!(diagnostics.error_count() >= 1);
		assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfFile);
	}

	#[test]
	fn keyword_set_is_dialect_aware() {
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize("inline", "<expanded>", &map, CStandard::C89, &mut diagnostics);
		assert_eq!(tokens[0].kind, TokenKind::Identifier);
		let tokens = tokenize("inline", "<expanded>", &map, CStandard::C99, &mut diagnostics);
		assert_eq!(tokens[0].kind, TokenKind::Keyword);
	}
}

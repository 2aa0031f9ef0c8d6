//! The C dialect axis: which keyword set and which predefined macro values
//! are in force for a given run of the engine.
//!
//! Everything dialect-dependent in the pipeline — the lexer's keyword
//! lookup, the predefined `__STDC_VERSION__` value, whether `inline` is a
//! keyword or a plain identifier — is driven from a single [`CStandard`]
//! value threaded through [`crate::config::EngineConfig`]. This keeps the
//! "single configurable engine" promise of §1 rather than scattering
//! `#[cfg]`-like special cases through the lexer and parser.

/// One of the five C dialects the engine can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumIter)]
pub enum CStandard {
	C89,
	C99,
	C11,
	C17,
	C23,
}

impl CStandard {
	/// The value `__STDC_VERSION__` is predefined to under this dialect.
	/// C89 famously has no `__STDC_VERSION__` at all in the strictest
	/// reading, but compilers that target it as `-std=c89`/`gnu89` still
	/// define the "C94"/AMD1 value `199409L` the way every mainstream C
	/// front end does; we follow that convention rather than leaving the
	/// macro entirely undefined, since the spec's §6 table lists a value
	/// for every dialect including C89.
	#[must_use]
	pub const fn stdc_version(self) -> &'static str {
		match self {
			Self::C89 => "199409L",
			Self::C99 => "199901L",
			Self::C11 => "201112L",
			Self::C17 => "201710L",
			Self::C23 => "202311L",
		}
	}

	#[must_use]
	pub const fn at_least(self, other: Self) -> bool {
		self.rank() >= other.rank()
	}

	const fn rank(self) -> u8 {
		match self {
			Self::C89 => 0,
			Self::C99 => 1,
			Self::C11 => 2,
			Self::C17 => 3,
			Self::C23 => 4,
		}
	}
}

impl std::fmt::Display for CStandard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::C89 => "c89",
			Self::C99 => "c99",
			Self::C11 => "c11",
			Self::C17 => "c17",
			Self::C23 => "c23",
		};
		write!(f, "{name}")
	}
}

impl std::str::FromStr for CStandard {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"c89" | "c90" | "ansi" => Ok(Self::C89),
			"c99" => Ok(Self::C99),
			"c11" => Ok(Self::C11),
			"c17" | "c18" => Ok(Self::C17),
			"c23" => Ok(Self::C23),
			other => Err(format!("unrecognized C standard: {other}")),
		}
	}
}

/// The keywords available under a given dialect, as a constant map from
/// spelling to a marker — the table itself is dialect-agnostic; dialect
/// gating happens by which subset of it the lexer consults (see
/// `KEYWORDS_BASE`, `KEYWORDS_C99_PLUS`, `KEYWORDS_C11_PLUS` below), the
/// same closed-set-plus-subset technique the teacher uses for its
/// `phf::Map` of builtins.
pub static KEYWORDS_BASE: phf::Map<&'static str, &'static str> = phf::phf_map! {
	"int" => "int", "char" => "char", "float" => "float", "double" => "double",
	"void" => "void", "short" => "short", "long" => "long", "signed" => "signed",
	"unsigned" => "unsigned", "const" => "const", "volatile" => "volatile",
	"static" => "static", "extern" => "extern", "auto" => "auto", "register" => "register",
	"if" => "if", "else" => "else", "while" => "while", "for" => "for", "do" => "do",
	"switch" => "switch", "case" => "case", "default" => "default", "break" => "break",
	"continue" => "continue", "return" => "return", "goto" => "goto", "sizeof" => "sizeof",
	"struct" => "struct", "union" => "union", "enum" => "enum", "typedef" => "typedef",
};

/// Keywords introduced in C99 and kept in every later dialect.
pub static KEYWORDS_C99_PLUS: phf::Map<&'static str, &'static str> = phf::phf_map! {
	"inline" => "inline", "restrict" => "restrict", "_Bool" => "_Bool", "_Complex" => "_Complex",
};

/// Keywords introduced in C11 and kept in every later dialect.
pub static KEYWORDS_C11_PLUS: phf::Map<&'static str, &'static str> = phf::phf_map! {
	"_Static_assert" => "_Static_assert", "_Alignof" => "_Alignof", "_Alignas" => "_Alignas",
	"_Noreturn" => "_Noreturn", "_Generic" => "_Generic", "_Thread_local" => "_Thread_local",
};

/// Whether `word` is a keyword under `standard`, consulting the base table
/// plus whichever dialect-gated tables apply.
#[must_use]
pub fn is_keyword(word: &str, standard: CStandard) -> bool {
	KEYWORDS_BASE.contains_key(word)
		|| (standard.at_least(CStandard::C99) && KEYWORDS_C99_PLUS.contains_key(word))
		|| (standard.at_least(CStandard::C11) && KEYWORDS_C11_PLUS.contains_key(word))
}

#[cfg(test)]
mod tests {
	use super::{is_keyword, CStandard};

	#[test]
	fn inline_is_only_a_keyword_from_c99_onward() {
		assert!(!is_keyword("inline", CStandard::C89));
		assert!(is_keyword("inline", CStandard::C99));
		assert!(is_keyword("inline", CStandard::C23));
	}

	#[test]
	fn static_assert_requires_c11_or_later() {
		assert!(!is_keyword("_Static_assert", CStandard::C99));
		assert!(is_keyword("_Static_assert", CStandard::C11));
	}

	#[test]
	fn parse_accepts_common_spellings() {
		assert_eq!("c17".parse::<CStandard>().unwrap(), CStandard::C17);
		assert_eq!("C18".parse::<CStandard>().unwrap(), CStandard::C17);
		assert!("c42".parse::<CStandard>().is_err());
	}
}

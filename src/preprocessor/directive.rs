//! The directive interpreter (C7): recognizes and parses a physical line
//! already known to be a directive, per §4.7 and the authoritative grammar
//! in §6.

use strum_macros::EnumIter;

use crate::position::Position;

/// The closed set of directive kinds (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum DirectiveKind {
	Include,
	Define,
	Undef,
	If,
	Ifdef,
	Ifndef,
	Else,
	Elif,
	Endif,
	Error,
	Warning,
	Pragma,
	Line,
}

impl DirectiveKind {
	fn from_name(name: &str) -> Option<Self> {
		match name {
			"include" => Some(Self::Include),
			"define" => Some(Self::Define),
			"undef" => Some(Self::Undef),
			"if" => Some(Self::If),
			"ifdef" => Some(Self::Ifdef),
			"ifndef" => Some(Self::Ifndef),
			"else" => Some(Self::Else),
			"elif" => Some(Self::Elif),
			"endif" => Some(Self::Endif),
			"error" => Some(Self::Error),
			"warning" => Some(Self::Warning),
			"pragma" => Some(Self::Pragma),
			"line" => Some(Self::Line),
			_ => None,
		}
	}
}

/// The delimiter style of an `#include` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStyle {
	/// `#include "file.h"` — searched relative to the including file first.
	Quoted,
	/// `#include <file.h>` — searched only along `include_paths`.
	Angled,
}

/// A parsed `#define` parameter list (§6's `parameter-list` production).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterList {
	pub params: Vec<String>,
	pub is_variadic: bool,
}

/// A fully parsed directive (§3): kind, the raw text of everything after
/// the directive name, a directive-specific argument breakdown, and the
/// position of the leading `#`.
#[derive(Debug, Clone)]
pub struct Directive {
	pub kind: DirectiveKind,
	pub raw_content: String,
	pub arguments: Vec<String>,
	pub position: Position,
}

/// Directive-specific payloads beyond the generic `arguments` list, for the
/// directives whose argument segmentation has real internal structure.
#[derive(Debug, Clone)]
pub enum DirectivePayload {
	Define { name: String, params: Option<ParameterList>, body: String },
	Undef { name: String },
	Include { filename: String, style: IncludeStyle },
	/// `#line number ["filename"]`, the optional filename override
	/// supplementing the base spec (SPEC_FULL §C.3).
	Line { line: u32, filename: Option<String> },
	/// `#if`/`#elif` take their whole remainder as a constant expression.
	ConditionExpr(String),
	/// `#ifdef`/`#ifndef` take a single macro name.
	MacroName(String),
	/// `#error`/`#warning`/`#pragma`/`#else`/`#endif` carry only free text
	/// (possibly empty for `#else`/`#endif`).
	Verbatim(String),
}

/// Parses a full physical line already known to start (after leading
/// whitespace) with `#`. Returns `None` if the line doesn't even have a
/// directive name after the `#` — callers treat that as a malformed
/// directive.
#[must_use]
pub fn parse_directive_line(line: &str, position: &Position) -> Option<(Directive, DirectivePayload)> {
	let trimmed = line.trim_start();
	let after_hash = trimmed.strip_prefix('#')?.trim_start();
	let name_end = after_hash.find(|c: char| c.is_whitespace()).unwrap_or(after_hash.len());
	let name = &after_hash[..name_end];
	let rest = after_hash[name_end..].trim_start();
	let kind = DirectiveKind::from_name(name)?;

	let payload = match kind {
		DirectiveKind::Define => parse_define(rest)?,
		DirectiveKind::Undef => DirectivePayload::Undef { name: rest.split_whitespace().next().unwrap_or_default().to_owned() },
		DirectiveKind::Include => parse_include(rest)?,
		DirectiveKind::If | DirectiveKind::Elif => DirectivePayload::ConditionExpr(rest.to_owned()),
		DirectiveKind::Ifdef | DirectiveKind::Ifndef => DirectivePayload::MacroName(rest.split_whitespace().next().unwrap_or_default().to_owned()),
		DirectiveKind::Line => parse_line(rest)?,
		DirectiveKind::Else | DirectiveKind::Endif | DirectiveKind::Error | DirectiveKind::Warning | DirectiveKind::Pragma => DirectivePayload::Verbatim(rest.to_owned()),
	};

	let arguments = rest.split_whitespace().map(str::to_owned).collect();
	let directive = Directive { kind, raw_content: rest.to_owned(), arguments, position: position.clone() };
	Some((directive, payload))
}

/// Splits `#define NAME(params) body` / `#define NAME body`, per §4.7:
/// "special recognition of `(` immediately following the name to
/// distinguish function-like from object-like macros."
fn parse_define(rest: &str) -> Option<DirectivePayload> {
	let mut chars = rest.char_indices();
	let name_end = loop {
		match chars.next() {
			Some((_, c)) if c.is_ascii_alphanumeric() || c == '_' => continue,
			Some((i, _)) => break i,
			None => break rest.len(),
		}
	};
	let name = rest[..name_end].to_owned();
	if name.is_empty() {
		return None;
	}

	if rest[name_end..].starts_with('(') {
		let close = rest[name_end..].find(')')? + name_end;
		let param_text = &rest[name_end + 1..close];
		let mut params = Vec::new();
		let mut is_variadic = false;
		for part in param_text.split(',') {
			let part = part.trim();
			if part.is_empty() {
				continue;
			}
			if part == "..." {
				is_variadic = true;
			} else {
				params.push(part.to_owned());
			}
		}
		let body = rest[close + 1..].trim_start().to_owned();
		Some(DirectivePayload::Define { name, params: Some(ParameterList { params, is_variadic }), body })
	} else {
		let body = rest[name_end..].trim_start().to_owned();
		Some(DirectivePayload::Define { name, params: None, body })
	}
}

fn parse_include(rest: &str) -> Option<DirectivePayload> {
	let rest = rest.trim();
	if let Some(inner) = rest.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
		return Some(DirectivePayload::Include { filename: inner.to_owned(), style: IncludeStyle::Quoted });
	}
	if let Some(inner) = rest.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
		return Some(DirectivePayload::Include { filename: inner.to_owned(), style: IncludeStyle::Angled });
	}
	None
}

/// `#line number ["filename"]` (SPEC_FULL §C.3 extends the base contract
/// with the optional filename override).
fn parse_line(rest: &str) -> Option<DirectivePayload> {
	let mut parts = rest.splitn(2, char::is_whitespace);
	let line: u32 = parts.next()?.parse().ok()?;
	let filename = parts.next().map(str::trim).filter(|s| !s.is_empty()).map(|s| s.trim_matches('"').to_owned());
	Some(DirectivePayload::Line { line, filename })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pos() -> Position {
		Position::start_of("test.c")
	}

	#[test]
	fn object_like_define_splits_name_and_body() {
		let (directive, payload) = parse_directive_line("#define PI 3", &pos()).unwrap();
		assert_eq!(directive.kind, DirectiveKind::Define);
		match payload {
			DirectivePayload::Define { name, params, body } => {
				assert_eq!(name, "PI");
				assert!(params.is_none());
				assert_eq!(body, "3");
			},
			_ => panic!("expected Define payload"),
		}
	}

	#[test]
	fn function_like_define_recognizes_parenthesized_open_paren() {
		let (_, payload) = parse_directive_line("#define STR(x) #x", &pos()).unwrap();
		match payload {
			DirectivePayload::Define { name, params, body } => {
				assert_eq!(name, "STR");
				assert_eq!(params.unwrap().params, vec!["x".to_owned()]);
				assert_eq!(body, "#x");
			},
			_ => panic!("expected Define payload"),
		}
	}

	#[test]
	fn variadic_define_recognizes_ellipsis() {
		let (_, payload) = parse_directive_line("#define LOG(fmt, ...) printf(fmt, __VA_ARGS__)", &pos()).unwrap();
		match payload {
			DirectivePayload::Define { params, .. } => {
				let params = params.unwrap();
				assert!(params.is_variadic);
				assert_eq!(params.params, vec!["fmt".to_owned()]);
			},
			_ => panic!("expected Define payload"),
		}
	}

	#[test]
	fn include_distinguishes_quoted_from_angled() {
		let (_, quoted) = parse_directive_line("#include \"a.h\"", &pos()).unwrap();
		let (_, angled) = parse_directive_line("#include <b.h>", &pos()).unwrap();
		assert!(matches!(quoted, DirectivePayload::Include { style: IncludeStyle::Quoted, .. }));
		assert!(matches!(angled, DirectivePayload::Include { style: IncludeStyle::Angled, .. }));
	}

	#[test]
	fn line_directive_accepts_optional_filename() {
		let (_, payload) = parse_directive_line("#line 42 \"other.c\"", &pos()).unwrap();
		match payload {
			DirectivePayload::Line { line, filename } => {
				assert_eq!(line, 42);
				assert_eq!(filename.as_deref(), Some("other.c"));
			},
			_ => panic!("expected Line payload"),
		}
	}

	#[test]
	fn unknown_directive_name_is_rejected() {
		assert!(parse_directive_line("#bogus foo", &pos()).is_none());
	}
}

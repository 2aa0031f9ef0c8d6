//! The macro table (C4): definition storage plus text-level expansion.
//!
//! Expansion happens at the text level, not the token level — the driver
//! (C8) hands a whole logical line to [`MacroTable::expand`] before the
//! lexer (C9) ever runs, matching §4.8's "apply macro expansion and append
//! the result to the output." This module owns its own minimal scanner
//! rather than depending on the real lexer, because at this stage the
//! grammar under consideration is the much smaller one of `#define` bodies
//! and call-site argument lists, not full C.

use std::collections::{HashMap, HashSet};

use crate::{
	diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind},
	position::Position,
};

const COMPONENT: &str = "macro-table";

/// Where a macro definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOrigin {
	/// Defined by user source at this position.
	Source(Position),
	/// Installed by the engine before user code runs (§3: "`Predefined` for
	/// compiler-built-in macros").
	Predefined,
}

/// The two macro shapes §3 describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroKind {
	ObjectLike { body: String },
	FunctionLike { params: Vec<String>, is_variadic: bool, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
	pub name: String,
	pub kind: MacroKind,
	pub origin: MacroOrigin,
}

impl Macro {
	fn body(&self) -> &str {
		match &self.kind {
			MacroKind::ObjectLike { body } | MacroKind::FunctionLike { body, .. } => body,
		}
	}
}

/// Bounds that keep a pathological macro definition from hanging the
/// expander (§6: `max_recursion_depth`, `max_macro_expansion_size`).
#[derive(Debug, Clone, Copy)]
pub struct ExpansionLimits {
	pub max_recursion_depth: u32,
	pub max_expansion_size: u32,
}

impl Default for ExpansionLimits {
	fn default() -> Self {
		Self { max_recursion_depth: 200, max_expansion_size: 1024 * 1024 }
	}
}

/// The keyed store of active macro definitions, plus the expansion engine
/// built on top of it.
pub struct MacroTable {
	macros: HashMap<String, Macro>,
	limits: ExpansionLimits,
}

impl MacroTable {
	#[must_use]
	pub fn new(limits: ExpansionLimits) -> Self {
		Self { macros: HashMap::new(), limits }
	}

	/// Installs one of the six compiler-built-in macros, or a user-supplied
	/// predefined macro from `EngineConfig::predefined_macros`. Both lack a
	/// source position, hence `MacroOrigin::Predefined` for either (§6:
	/// "Pre-populates macro table before processing").
	pub fn define_predefined(&mut self, name: impl Into<String>, body: impl Into<String>) {
		let name = name.into();
		self.macros.insert(name.clone(), Macro { name, kind: MacroKind::ObjectLike { body: body.into() }, origin: MacroOrigin::Predefined });
	}

	/// Defines (or redefines) a macro from user source. A redefinition with
	/// a body that differs, after whitespace normalization, from the
	/// existing one is a warning, never an error (resolves Open Question #1
	/// from §9: "pick one rule and apply it uniformly"); an identical
	/// redefinition is silent.
	pub fn define(&mut self, name: &str, kind: MacroKind, position: Position, diagnostics: &mut DiagnosticBag) {
		if let Some(existing) = self.macros.get(name) {
			if !definitions_equivalent(existing, &kind) {
				diagnostics.push(Diagnostic::warning(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("redefinition of macro '{name}' with a different body")));
			}
		}
		self.macros.insert(name.to_owned(), Macro { name: name.to_owned(), kind, origin: MacroOrigin::Source(position) });
	}

	/// Removes a macro. Silently does nothing if `name` is not defined
	/// (§4.4: "`undefine(name)` is a silent no-op when the name is not
	/// present").
	pub fn undefine(&mut self, name: &str) {
		self.macros.remove(name);
	}

	#[must_use]
	pub fn is_defined(&self, name: &str) -> bool {
		self.macros.contains_key(name)
	}

	#[must_use]
	pub fn lookup(&self, name: &str) -> Option<&Macro> {
		self.macros.get(name)
	}

	pub fn iterate(&self) -> impl Iterator<Item = &Macro> {
		self.macros.values()
	}

	/// Expands all macro invocations in `text`, which originated at
	/// `position` in the (already macro-expansion-aware) output stream.
	/// `__FILE__`/`__LINE__` are resolved against `position` itself, per
	/// §4.4: "re-evaluated at each expansion site using the current
	/// position."
	pub fn expand(&self, text: &str, position: &Position, diagnostics: &mut DiagnosticBag) -> String {
		self.expand_with(text, position, &HashSet::new(), 0, diagnostics)
	}

	fn expand_with(&self, text: &str, position: &Position, painted: &HashSet<String>, depth: u32, diagnostics: &mut DiagnosticBag) -> String {
		if depth > self.limits.max_recursion_depth {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("maximum macro recursion depth ({}) exceeded", self.limits.max_recursion_depth)));
			return text.to_owned();
		}

		let mut out = String::new();
		let chars: Vec<char> = text.chars().collect();
		let mut i = 0;

		while i < chars.len() {
			let ch = chars[i];

			if ch == '"' || ch == '\'' {
				let (literal, next) = copy_literal(&chars, i);
				out.push_str(&literal);
				i = next;
				continue;
			}

			if ch.is_ascii_alphabetic() || ch == '_' {
				let start = i;
				while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
					i += 1;
				}
				let word: String = chars[start..i].iter().collect();

				if word == "__FILE__" {
					out.push('"');
					out.push_str(&position.file);
					out.push('"');
					continue;
				}
				if word == "__LINE__" {
					out.push_str(&position.line.to_string());
					continue;
				}

				if painted.contains(&word) {
					out.push_str(&word);
					continue;
				}

				match self.macros.get(&word) {
					Some(macro_def @ Macro { kind: MacroKind::ObjectLike { body }, .. }) => {
						let mut next_painted = painted.clone();
						next_painted.insert(word.clone());
						let expanded = self.expand_with(body, position, &next_painted, depth + 1, diagnostics);
						let _ = macro_def;
						out.push_str(&expanded);
					},
					Some(Macro { kind: MacroKind::FunctionLike { params, is_variadic, body }, .. }) => {
						let mut lookahead = i;
						while lookahead < chars.len() && chars[lookahead].is_whitespace() {
							lookahead += 1;
						}
						if lookahead < chars.len() && chars[lookahead] == '(' {
							let Some((args, after)) = split_call_arguments(&chars, lookahead) else {
								diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("unterminated argument list in call to macro '{word}'")));
								out.push_str(&word);
								continue;
							};
							i = after;
							// Arguments are macro-expanded before substitution,
							// except when they're the operand of `#` or `##`,
							// which always see the raw argument text (the C
							// standard's rule; `substitute_params` takes both
							// forms and picks per-occurrence).
							let expanded_args: Vec<String> = args.iter().map(|a| self.expand_with(a, position, painted, depth + 1, diagnostics)).collect();
							match substitute_params(body, params, *is_variadic, &args, &expanded_args) {
								Ok(substituted) => {
									let mut next_painted = painted.clone();
									next_painted.insert(word.clone());
									let expanded = self.expand_with(&substituted, position, &next_painted, depth + 1, diagnostics);
									out.push_str(&expanded);
								},
								Err(message) => {
									diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), message));
									out.push_str(&word);
								},
							}
						} else {
							// Not followed by `(`: a function-like macro
							// name used bare is not a macro invocation.
							out.push_str(&word);
						}
					},
					None => out.push_str(&word),
				}
				continue;
			}

			out.push(ch);
			i += 1;

			if out.len() as u32 > self.limits.max_expansion_size {
				diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("macro expansion exceeded the configured size limit ({} bytes)", self.limits.max_expansion_size)));
				break;
			}
		}

		out
	}
}

/// Whether a proposed redefinition is identical to the existing one after
/// whitespace normalization, per the C standard's redefinition rule.
fn definitions_equivalent(existing: &Macro, proposed: &MacroKind) -> bool {
	let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
	match (&existing.kind, proposed) {
		(MacroKind::ObjectLike { body: a }, MacroKind::ObjectLike { body: b }) => normalize(a) == normalize(b),
		(MacroKind::FunctionLike { params: pa, is_variadic: va, body: a }, MacroKind::FunctionLike { params: pb, is_variadic: vb, body: b }) => pa == pb && va == vb && normalize(a) == normalize(b),
		_ => false,
	}
}

/// Copies a string or character literal verbatim starting at `start`
/// (which must index the opening quote), honoring `\`-escapes so an
/// escaped quote doesn't end the literal early. Identifiers inside a
/// literal are never treated as macro invocations (§4.4 scans identifiers
/// outside of literal text only).
fn copy_literal(chars: &[char], start: usize) -> (String, usize) {
	let quote = chars[start];
	let mut out = String::new();
	out.push(quote);
	let mut i = start + 1;
	while i < chars.len() {
		let ch = chars[i];
		out.push(ch);
		i += 1;
		if ch == '\\' && i < chars.len() {
			out.push(chars[i]);
			i += 1;
			continue;
		}
		if ch == quote {
			break;
		}
	}
	(out, i)
}

/// Splits the parenthesized argument list starting at `open` (which must
/// index the `(`) into comma-separated, trimmed argument texts, tracking
/// `()`/`[]`/`{}` nesting and suspending nesting-tracking inside string and
/// character literals (§4.4). Returns the arguments and the index just past
/// the closing `)`, or `None` if the list is never closed.
fn split_call_arguments(chars: &[char], open: usize) -> Option<(Vec<String>, usize)> {
	debug_assert_eq!(chars[open], '(');
	let mut depth = 0i32;
	let mut current = String::new();
	let mut args = Vec::new();
	let mut i = open;

	loop {
		if i >= chars.len() {
			return None;
		}
		let ch = chars[i];
		match ch {
			'"' | '\'' => {
				let (literal, next) = copy_literal(chars, i);
				current.push_str(&literal);
				i = next;
				continue;
			},
			'(' | '[' | '{' => {
				depth += 1;
				if depth > 1 {
					current.push(ch);
				}
				i += 1;
			},
			')' | ']' | '}' => {
				depth -= 1;
				if depth == 0 {
					if !(current.trim().is_empty() && args.is_empty()) {
						args.push(current.trim().to_owned());
					}
					return Some((args, i + 1));
				}
				current.push(ch);
				i += 1;
			},
			',' if depth == 1 => {
				args.push(current.trim().to_owned());
				current.clear();
				i += 1;
			},
			other => {
				current.push(other);
				i += 1;
			},
		}
	}
}

/// Substitutes `args` for `params` in `body`, applying `#` (stringification)
/// and `##` (concatenation) per §4.4. `args` here are whichever form the
/// caller wants substituted for the plain (non-`#`/`##`-adjacent) case:
/// callers pass the raw argument text to compute the `#`/`##` operands
/// (those never see macro-expanded arguments, per the C standard) and the
/// macro-expanded argument text for everything else, by calling this twice
/// and only keeping the `##`/`#` behavior from the raw pass.
fn substitute_params(body: &str, params: &[String], is_variadic: bool, args_raw: &[String], args_expanded: &[String]) -> Result<String, String> {
	let build_bindings = |args: &[String]| -> HashMap<&str, String> {
		let mut bindings = HashMap::new();
		for (index, param) in params.iter().enumerate() {
			bindings.insert(param.as_str(), args.get(index).cloned().unwrap_or_default());
		}
		if is_variadic {
			let variadic: Vec<String> = args.iter().skip(params.len()).cloned().collect();
			bindings.insert("__VA_ARGS__", variadic.join(", "));
		}
		bindings
	};

	if !is_variadic && args_raw.len() > params.len() {
		return Err(format!("too many arguments in macro invocation (expected {}, got {})", params.len(), args_raw.len()));
	}
	if args_raw.len() < params.len() {
		return Err(format!("too few arguments in macro invocation (expected {}, got {})", params.len(), args_raw.len()));
	}

	let raw_bindings = build_bindings(args_raw);
	let expanded_bindings = build_bindings(args_expanded);

	let tokens = tokenize_body(body);
	let mut out = String::new();
	let mut index = 0;

	// Resolves `word` for a plain (non-`#`/`##`-adjacent) occurrence: a
	// parameter substitutes its macro-expanded argument text, anything else
	// passes through unchanged.
	let resolve_expanded = |word: &str| expanded_bindings.get(word).cloned().unwrap_or_else(|| word.to_owned());
	// Resolves `word` for a `#`/`##` operand: always the raw, unexpanded
	// argument text (the C standard's rule for both operators).
	let resolve_raw = |word: &str| raw_bindings.get(word).cloned().unwrap_or_else(|| word.to_owned());

	while index < tokens.len() {
		match &tokens[index] {
			BodyToken::Hash if index + 1 < tokens.len() => {
				if let BodyToken::Word(param) = &tokens[index + 1] {
					if raw_bindings.contains_key(param.as_str()) {
						out.push('"');
						out.push_str(&stringify_argument(&resolve_raw(param)));
						out.push('"');
						index += 2;
						continue;
					}
				}
				out.push('#');
				index += 1;
			},
			BodyToken::Word(word) if tokens.get(index + 1) == Some(&BodyToken::HashHash) => {
				let left = resolve_raw(word);
				index += 2;
				let right = match tokens.get(index) {
					Some(BodyToken::Word(next_word)) => {
						index += 1;
						resolve_raw(next_word)
					},
					Some(BodyToken::Other(text)) => {
						let text = text.clone();
						index += 1;
						text
					},
					_ => String::new(),
				};
				let pasted = format!("{}{}", left.trim(), right.trim());
				if !is_single_valid_token(&pasted) {
					return Err(format!("token paste '{}' ## '{}' does not form a single valid token", left.trim(), right.trim()));
				}
				out.push_str(&pasted);
			},
			BodyToken::Word(word) => {
				out.push_str(&resolve_expanded(word));
				index += 1;
			},
			BodyToken::HashHash => {
				// A bare `##` not immediately preceded by a substituted word
				// (e.g. following `#param`'s stringified output) is copied
				// through; it cannot legally start a replacement list.
				out.push_str("##");
				index += 1;
			},
			BodyToken::Other(text) => {
				out.push_str(text);
				index += 1;
			},
		}
	}

	Ok(out)
}

/// Collapses interior whitespace to single spaces, trims the ends, and
/// escapes `"` and `\`, per the `#` stringification rule in §4.4.
fn stringify_argument(argument: &str) -> String {
	let interior_whitespace = regex_macro::regex!(r"\s+");
	let collapsed = interior_whitespace.replace_all(argument.trim(), " ");
	collapsed.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A conservative check that a pasted token looks like a single valid C
/// token: an identifier/keyword, or an integer literal. Anything else is
/// rejected, matching §4.4: "the resulting lexeme must form a single valid
/// token or the expansion fails."
fn is_single_valid_token(text: &str) -> bool {
	if text.is_empty() {
		return false;
	}
	let mut chars = text.chars();
	let first = chars.next().unwrap();
	if first.is_ascii_alphabetic() || first == '_' {
		return text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
	}
	if first.is_ascii_digit() {
		return text.chars().all(|c| c.is_ascii_alphanumeric() || c == '.');
	}
	false
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyToken {
	Hash,
	HashHash,
	Word(String),
	Other(String),
}

/// Tokenizes a macro body into words, `#`/`##` operators, and everything
/// else, preserving string/character literals verbatim so their contents
/// are never mistaken for parameter names.
fn tokenize_body(body: &str) -> Vec<BodyToken> {
	let chars: Vec<char> = body.chars().collect();
	let mut tokens = Vec::new();
	let mut i = 0;
	while i < chars.len() {
		let ch = chars[i];
		if ch == '"' || ch == '\'' {
			let (literal, next) = copy_literal(&chars, i);
			tokens.push(BodyToken::Other(literal));
			i = next;
			continue;
		}
		if ch.is_ascii_alphabetic() || ch == '_' {
			let start = i;
			while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
				i += 1;
			}
			tokens.push(BodyToken::Word(chars[start..i].iter().collect()));
			continue;
		}
		if ch == '#' && chars.get(i + 1) == Some(&'#') {
			tokens.push(BodyToken::HashHash);
			i += 2;
			continue;
		}
		if ch == '#' {
			tokens.push(BodyToken::Hash);
			i += 1;
			continue;
		}
		let start = i;
		i += 1;
		while i < chars.len() && !chars[i].is_ascii_alphanumeric() && chars[i] != '_' && chars[i] != '"' && chars[i] != '\'' && chars[i] != '#' {
			i += 1;
		}
		tokens.push(BodyToken::Other(chars[start..i].iter().collect()));
	}
	tokens
}

#[cfg(test)]
mod tests {
	use super::{ExpansionLimits, MacroKind, MacroTable};
	use crate::{diagnostics::DiagnosticBag, position::Position};

	fn pos() -> Position {
		Position::start_of("test.c")
	}

	#[test]
	fn object_like_macro_expands() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		table.define("PI", MacroKind::ObjectLike { body: "3".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(table.expand("int x = PI;", &pos(), &mut diagnostics), "int x = 3;");
	}

	#[test]
	fn function_like_stringification() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		table.define("STR", MacroKind::FunctionLike { params: vec!["x".to_owned()], is_variadic: false, body: "#x".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(table.expand("char* s = STR(hello world);", &pos(), &mut diagnostics), "char* s = \"hello world\";");
	}

	#[test]
	fn concatenation_joins_tokens() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		table.define("CAT", MacroKind::FunctionLike { params: vec!["a".to_owned(), "b".to_owned()], is_variadic: false, body: "a ## b".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(table.expand("CAT(foo, bar)", &pos(), &mut diagnostics), "foobar");
	}

	#[test]
	fn self_referential_macro_does_not_recurse_forever() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		table.define("X", MacroKind::ObjectLike { body: "X + 1".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(table.expand("X", &pos(), &mut diagnostics), "X + 1");
	}

	#[test]
	fn variadic_macro_binds_remaining_arguments() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		table.define("LOG", MacroKind::FunctionLike { params: vec!["fmt".to_owned()], is_variadic: true, body: "printf(fmt, __VA_ARGS__)".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(table.expand(r#"LOG("x=%d", x)"#, &pos(), &mut diagnostics), r#"printf("x=%d", x)"#);
	}

	#[test]
	fn identical_redefinition_is_silent_but_differing_one_warns() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		table.define("N", MacroKind::ObjectLike { body: "1".to_owned() }, pos(), &mut diagnostics);
		table.define("N", MacroKind::ObjectLike { body: "1".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(diagnostics.warnings().count(), 0);
		table.define("N", MacroKind::ObjectLike { body: "2".to_owned() }, pos(), &mut diagnostics);
		assert_eq!(diagnostics.warnings().count(), 1);
	}

	#[test]
	fn undefine_unknown_name_is_a_silent_no_op() {
		let mut table = MacroTable::new(ExpansionLimits::default());
		table.undefine("NEVER_DEFINED");
		assert!(!table.is_defined("NEVER_DEFINED"));
	}

	#[test]
	fn file_and_line_are_resolved_at_the_expansion_site() {
		let table = MacroTable::new(ExpansionLimits::default());
		let mut diagnostics = DiagnosticBag::new(100);
		let position = Position { file: "main.c".to_owned(), line: 7, column: 1, offset: 0 };
		assert_eq!(table.expand("__FILE__", &position, &mut diagnostics), "\"main.c\"");
		assert_eq!(table.expand("__LINE__", &position, &mut diagnostics), "7");
	}
}

//! The preprocessor driver (C8): line-by-line orchestration of the macro
//! table (C4), constant-expression evaluator (C5), conditional stack (C6),
//! and directive interpreter (C7), producing a fully expanded buffer and
//! its position map before the lexer ever runs (§2: "non-streaming").

pub mod conditional;
pub mod directive;
pub mod eval;
pub mod macros;

use conditional::{ConditionalStack, ConditionalStats, FrameKind};
use directive::{parse_directive_line, DirectiveKind, DirectivePayload};
use macros::{ExpansionLimits, MacroKind, MacroTable};

use crate::{
	diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind},
	position::{Position, PositionMap},
};

const COMPONENT: &str = "preprocessor-driver";

/// Everything the driver produces, before the lexer and parser ever see it.
pub struct PreprocessorOutput {
	pub expanded_text: String,
	pub position_map: PositionMap,
	pub conditional_stats: ConditionalStats,
}

/// Drives preprocessing of `source` (the content of a single translation
/// unit; `#include` resolution is out of scope per §1, so this never
/// recurses into another file) using a caller-supplied, already-seeded
/// [`MacroTable`].
pub struct Preprocessor<'a> {
	macros: &'a mut MacroTable,
	conditionals: ConditionalStack,
	current_file: String,
	current_line: u32,
}

impl<'a> Preprocessor<'a> {
	#[must_use]
	pub fn new(macros: &'a mut MacroTable, file_name: impl Into<String>) -> Self {
		Self { macros, conditionals: ConditionalStack::new(), current_file: file_name.into(), current_line: 1 }
	}

	/// Processes the entire source text per §4.8's three-step-per-line
	/// algorithm, returning the expanded buffer and its position map.
	pub fn process(mut self, source: &str, diagnostics: &mut DiagnosticBag) -> PreprocessorOutput {
		let mut expanded = String::new();
		let mut position_map = PositionMap::new();

		for raw_line in source.split('\n') {
			if diagnostics.should_stop() {
				break;
			}

			let original_position = Position { file: self.current_file.clone(), line: self.current_line, column: 1, offset: 0 };
			let expanded_start = Position { file: "<expanded>".to_owned(), line: 1, column: 1, offset: expanded.len() as u32 };
			position_map.add_mapping(expanded_start, original_position.clone(), None);

			let is_directive = raw_line.trim_start().starts_with('#');

			if !self.conditionals.emit_enabled() && !is_directive {
				expanded.push('\n');
				self.current_line += 1;
				continue;
			}

			if is_directive {
				self.dispatch_directive(raw_line, &original_position, diagnostics);
				// Directive lines never contribute text to the expanded
				// output themselves, but still occupy a line so downstream
				// line numbers keep matching the original source (§8,
				// scenario 1: "blank line preserves line number").
				expanded.push('\n');
			} else {
				let line_expanded = self.macros.expand(raw_line, &original_position, diagnostics);
				expanded.push_str(&line_expanded);
				expanded.push('\n');
			}

			self.current_line += 1;
		}

		self.conditionals.verify_closed(diagnostics);

		PreprocessorOutput { expanded_text: expanded, position_map, conditional_stats: self.conditionals.stats() }
	}

	fn dispatch_directive(&mut self, line: &str, position: &Position, diagnostics: &mut DiagnosticBag) {
		let Some((directive, payload)) = parse_directive_line(line, position) else {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("malformed directive: '{}'", line.trim())));
			return;
		};

		// A directive inside a suppressed branch is still interpreted for
		// nesting purposes (conditional directives must always run) but
		// every other directive's effect is dropped (§4.6: "macro
		// definitions encountered inside inactive branches are not
		// applied").
		let is_conditional_directive = matches!(directive.kind, DirectiveKind::If | DirectiveKind::Ifdef | DirectiveKind::Ifndef | DirectiveKind::Elif | DirectiveKind::Else | DirectiveKind::Endif);
		if !self.conditionals.emit_enabled() && !is_conditional_directive {
			return;
		}

		match (directive.kind, payload) {
			(DirectiveKind::Define, DirectivePayload::Define { name, params, body }) => {
				let kind = match params {
					Some(list) => MacroKind::FunctionLike { params: list.params, is_variadic: list.is_variadic, body },
					None => MacroKind::ObjectLike { body },
				};
				self.macros.define(&name, kind, position.clone(), diagnostics);
			},
			(DirectiveKind::Undef, DirectivePayload::Undef { name }) => self.macros.undefine(&name),
			(DirectiveKind::If, DirectivePayload::ConditionExpr(expr)) => {
				let value = eval::evaluate_condition(&expr, position, self.macros, diagnostics);
				self.conditionals.push_if(value, position.clone());
			},
			(DirectiveKind::Ifdef, DirectivePayload::MacroName(name)) => {
				self.conditionals.push_ifdef(FrameKind::Ifdef, self.macros.is_defined(&name), position.clone());
			},
			(DirectiveKind::Ifndef, DirectivePayload::MacroName(name)) => {
				self.conditionals.push_ifdef(FrameKind::Ifndef, self.macros.is_defined(&name), position.clone());
			},
			(DirectiveKind::Elif, DirectivePayload::ConditionExpr(expr)) => {
				let value = if self.conditionals.should_evaluate_elif() { eval::evaluate_condition(&expr, position, self.macros, diagnostics) } else { false };
				self.conditionals.elif(value, position, diagnostics);
			},
			(DirectiveKind::Else, _) => self.conditionals.else_branch(position, diagnostics),
			(DirectiveKind::Endif, _) => self.conditionals.endif(position, diagnostics),
			(DirectiveKind::Error, DirectivePayload::Verbatim(message)) => {
				diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("#error: {}", message.trim())));
			},
			(DirectiveKind::Warning, DirectivePayload::Verbatim(message)) => {
				diagnostics.push(Diagnostic::warning(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("#warning: {}", message.trim())));
			},
			(DirectiveKind::Pragma, DirectivePayload::Verbatim(text)) => {
				diagnostics.push(Diagnostic::warning(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("unrecognized #pragma ignored: {}", text.trim())));
			},
			(DirectiveKind::Line, DirectivePayload::Line { line, filename }) => {
				self.current_line = line;
				if let Some(name) = filename {
					self.current_file = name;
				}
				// The line counter is incremented once more by the caller
				// after this directive's own physical line is processed;
				// subtract one here so the *next* line reports `line`.
				self.current_line = self.current_line.wrapping_sub(1);
			},
			(DirectiveKind::Include, DirectivePayload::Include { filename, .. }) => {
				diagnostics.push(Diagnostic::warning(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), format!("#include \"{filename}\" not resolved: include resolution is out of scope")));
			},
			_ => diagnostics.push(Diagnostic::error(DiagnosticKind::Integration, COMPONENT, position.clone(), "directive kind and payload mismatch")),
		}
	}
}

/// Seeds the six compiler-built-in macros plus any `EngineConfig`-provided
/// predefined macros. Split out from [`Preprocessor`] itself since the
/// table must be seeded once per engine run, before any `Preprocessor` is
/// constructed over it (predefined macros must already be visible to the
/// very first line of source).
pub fn seed_predefined_macros(macros: &mut MacroTable, standard: crate::dialect::CStandard, date: &str, time: &str, extra: &[(String, String)]) {
	macros.define_predefined("__STDC__", "1");
	macros.define_predefined("__STDC_VERSION__", standard.stdc_version());
	macros.define_predefined("__DATE__", format!("\"{date}\""));
	macros.define_predefined("__TIME__", format!("\"{time}\""));
	// `__FILE__`/`__LINE__` are intentionally not entered into the table:
	// `MacroTable::expand` resolves them dynamically at each expansion
	// site using the position passed in, per §4.4. They still report as
	// "defined" via `is_defined`'s fallback below where callers ask.
	for (name, body) in extra {
		macros.define_predefined(name, body);
	}
}

#[must_use]
pub fn new_macro_table(limits: ExpansionLimits) -> MacroTable {
	MacroTable::new(limits)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dialect::CStandard;

	fn table() -> MacroTable {
		let mut macros = new_macro_table(ExpansionLimits::default());
		seed_predefined_macros(&mut macros, CStandard::C17, "Jan  1 1970", "00:00:00", &[]);
		macros
	}

	#[test]
	fn object_like_expansion_preserves_line_numbering() {
		let mut macros = table();
		let mut diagnostics = DiagnosticBag::new(100);
		let output = Preprocessor::new(&mut macros, "test.c").process("#define PI 3\nint x = PI;\n", &mut diagnostics);
		assert_eq!(output.expanded_text, "\nint x = 3;\n\n");
	}

	#[test]
	fn conditional_with_defined_selects_true_branch() {
		let mut macros = table();
		let mut diagnostics = DiagnosticBag::new(100);
		let input = "#define DEBUG\n#if defined(DEBUG) && !defined(RELEASE)\nint x = 1;\n#else\nint x = 2;\n#endif\n";
		let output = Preprocessor::new(&mut macros, "test.c").process(input, &mut diagnostics);
		assert!(output.expanded_text.contains("int x = 1;"));
		assert!(!output.expanded_text.contains("int x = 2;"));
		assert_eq!(diagnostics.error_count(), 0);
	}

	#[test]
	fn nested_conditionals_suppress_the_untaken_branch() {
		let mut macros = table();
		let mut diagnostics = DiagnosticBag::new(100);
		let input = "#if 1\n#if 0\nA\n#else\nB\n#endif\n#endif\n";
		let output = Preprocessor::new(&mut macros, "test.c").process(input, &mut diagnostics);
		assert!(!output.expanded_text.contains('A'));
		assert!(output.expanded_text.contains('B'));
	}

	#[test]
	fn unbalanced_conditional_is_reported_at_end_of_input() {
		let mut macros = table();
		let mut diagnostics = DiagnosticBag::new(100);
		Preprocessor::new(&mut macros, "test.c").process("#if 1\nint x;\n", &mut diagnostics);
		assert!(diagnostics.error_count() >= 1);
	}

	#[test]
	fn function_like_stringification_survives_the_full_driver() {
		let mut macros = table();
		let mut diagnostics = DiagnosticBag::new(100);
		let output = Preprocessor::new(&mut macros, "test.c").process("#define STR(x) #x\nchar* s = STR(hello world);\n", &mut diagnostics);
		assert!(output.expanded_text.contains("\"hello world\""));
	}
}

//! The error taxonomy shared by every stage of the pipeline.
//!
//! The preprocessor, lexer, and parser don't stop at the first problem they
//! find (§7: "errors... do not halt immediately unless the configured
//! maximum error count is exceeded"). Instead, every component pushes what
//! it finds into a single [`DiagnosticBag`], which is the one piece of
//! mutable state every component is allowed to touch out of turn (§5:
//! "the error handler is the one shared sink; its operations are
//! append-only").

use convert_case::Casing as _;

use crate::position::Position;

/// The closed set of diagnostic kinds, independent of which dialect or which
/// component produced them. This mirrors the taxonomy in §4.2 exactly;
/// adding a new kind here is a breaking change to the external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumIter)]
pub enum DiagnosticKind {
	/// Unterminated string/char/comment, invalid numeric literal, or an
	/// unrecognized character.
	Lexical,
	/// Malformed directive, unbalanced conditional, a triggered `#error`,
	/// macro redefinition conflict, recursive macro expansion, or include
	/// resolution failure.
	Preprocessor,
	/// Unexpected token, missing required token, or malformed grammar
	/// production.
	Syntax,
	/// Parser-detected but semantic in nature, e.g. an empty translation
	/// unit.
	SemanticHint,
	/// Position-mapping inconsistency or an internal assertion failure.
	Integration,
}

impl std::fmt::Display for DiagnosticKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// Whether a diagnostic is a hard error or merely advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
	/// Blocks a clean compilation, but processing continues so that further
	/// errors in the same translation unit can still be reported.
	Error,
	/// Advisory only; never halts processing on its own.
	Warning,
}

impl std::fmt::Display for Severity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Warning => write!(f, "warning"),
		}
	}
}

/// A single diagnostic: what kind of problem it is, how severe, where it
/// happened, a human-readable message, and which component raised it.
#[derive(Debug, Clone)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	pub severity: Severity,
	pub position: Position,
	pub message: String,
	/// The short tag identifying the producing component, e.g. `"lexer"`,
	/// `"macro-table"`, `"conditional-stack"`, `"parser"`. Used in the
	/// summary report's per-component counts.
	pub component: &'static str,
}

impl Diagnostic {
	#[must_use]
	pub fn error(kind: DiagnosticKind, component: &'static str, position: Position, message: impl Into<String>) -> Self {
		Self { kind, severity: Severity::Error, position, message: message.into(), component }
	}

	#[must_use]
	pub fn warning(kind: DiagnosticKind, component: &'static str, position: Position, message: impl Into<String>) -> Self {
		Self { kind, severity: Severity::Warning, position, message: message.into(), component }
	}
}

impl std::fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}: [{}] {}", self.position, self.severity, self.component, self.message)
	}
}

/// Accumulates diagnostics across an entire translation unit, up to a
/// configured ceiling, and answers `should_stop()` for cooperative
/// cancellation between pipeline stages.
///
/// Warnings never count toward the ceiling or trigger a halt (§4.2:
/// "warnings never halt").
#[derive(Debug, Clone)]
pub struct DiagnosticBag {
	diagnostics: Vec<Diagnostic>,
	max_errors: u32,
	error_count: u32,
}

impl DiagnosticBag {
	#[must_use]
	pub fn new(max_errors: u32) -> Self {
		Self { diagnostics: Vec::new(), max_errors, error_count: 0 }
	}

	/// Records a diagnostic. Returns `false` once recording this diagnostic
	/// pushed the error count past the ceiling, signalling that the caller
	/// should stop accepting further directives/statements (§4.2/§7:
	/// "halted at the first directive whose acceptance would exceed the
	/// ceiling").
	pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
		if diagnostic.severity == Severity::Error {
			self.error_count += 1;
		}
		self.diagnostics.push(diagnostic);
		!self.should_stop()
	}

	/// True once the number of recorded errors exceeds `max_errors`.
	#[must_use]
	pub fn should_stop(&self) -> bool {
		self.error_count > self.max_errors
	}

	#[must_use]
	pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
		self.diagnostics.iter().filter(|diagnostic| diagnostic.severity == Severity::Error)
	}

	#[must_use]
	pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
		self.diagnostics.iter().filter(|diagnostic| diagnostic.severity == Severity::Warning)
	}

	#[must_use]
	pub fn all(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	#[must_use]
	pub fn error_count(&self) -> u32 {
		self.error_count
	}

	/// A summary report of diagnostic counts by severity and by component,
	/// the way §7 requires ("a summary report lists counts by component and
	/// by severity").
	#[must_use]
	pub fn summary(&self) -> Summary {
		let mut summary = Summary::default();
		for diagnostic in &self.diagnostics {
			match diagnostic.severity {
				Severity::Error => summary.errors += 1,
				Severity::Warning => summary.warnings += 1,
			}
			let entry = summary.by_component.iter_mut().find(|(component, _)| *component == diagnostic.component);
			match entry {
				Some((_, count)) => *count += 1,
				None => summary.by_component.push((diagnostic.component, 1)),
			}
		}
		summary
	}
}

/// The counts the end-of-run summary report presents.
#[derive(Debug, Clone, Default)]
pub struct Summary {
	pub errors: u32,
	pub warnings: u32,
	pub by_component: Vec<(&'static str, u32)>,
}

#[cfg(test)]
mod tests {
	use super::{Diagnostic, DiagnosticBag, DiagnosticKind};
	use crate::position::Position;

	fn pos() -> Position {
		Position::start_of("test.c")
	}

	#[test]
	fn should_stop_once_error_count_exceeds_ceiling() {
		let mut bag = DiagnosticBag::new(2);
		assert!(bag.push(Diagnostic::error(DiagnosticKind::Syntax, "parser", pos(), "one")));
		assert!(bag.push(Diagnostic::error(DiagnosticKind::Syntax, "parser", pos(), "two")));
		assert!(!bag.push(Diagnostic::error(DiagnosticKind::Syntax, "parser", pos(), "three")));
		assert!(bag.should_stop());
	}

	#[test]
	fn warnings_never_trip_the_ceiling() {
		let mut bag = DiagnosticBag::new(0);
		for _ in 0..10 {
			bag.push(Diagnostic::warning(DiagnosticKind::Preprocessor, "directive", pos(), "redefinition"));
		}
		assert!(!bag.should_stop());
		assert_eq!(bag.warnings().count(), 10);
	}

	#[test]
	fn summary_counts_by_component_and_severity() {
		let mut bag = DiagnosticBag::new(100);
		bag.push(Diagnostic::error(DiagnosticKind::Syntax, "parser", pos(), "a"));
		bag.push(Diagnostic::error(DiagnosticKind::Lexical, "lexer", pos(), "b"));
		bag.push(Diagnostic::warning(DiagnosticKind::Preprocessor, "parser", pos(), "c"));

		let summary = bag.summary();
		assert_eq!(summary.errors, 2);
		assert_eq!(summary.warnings, 1);
		assert_eq!(summary.by_component.iter().find(|(c, _)| *c == "parser").unwrap().1, 2);
	}
}

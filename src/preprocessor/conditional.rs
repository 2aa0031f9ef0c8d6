//! The conditional-compilation stack (C6): nested `#if`/`#elif`/`#else`/
//! `#endif` state with skip/emit discipline, per §4.6's directive-effect
//! table.

use crate::{
	diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind},
	position::Position,
};

const COMPONENT: &str = "conditional-stack";

/// Which directive opened this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
	If,
	Ifdef,
	Ifndef,
}

/// One level of conditional nesting (§3).
#[derive(Debug, Clone)]
pub struct ConditionalFrame {
	pub kind: FrameKind,
	pub current_branch_active: bool,
	pub any_branch_taken: bool,
	pub has_seen_else: bool,
	pub origin: Position,
}

/// Running totals surfaced on [`crate::engine::ProcessingResult`], grounded
/// on the original implementation's `ConditionalStats` (SPEC_FULL §C.1):
/// pure bookkeeping over the same state transitions the frame stack already
/// tracks, not a new feature surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalStats {
	pub total_conditionals: u32,
	pub true_branches: u32,
	pub false_branches: u32,
	pub max_nesting_level: u32,
}

/// A stack of [`ConditionalFrame`]s, plus the emission predicate it drives.
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
	frames: Vec<ConditionalFrame>,
	stats: ConditionalStats,
}

impl ConditionalStack {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The logical AND of every frame's `current_branch_active` — §4.6:
	/// "an output-emission predicate is computed as the logical AND of
	/// `current_branch_active` across all frames."
	#[must_use]
	pub fn emit_enabled(&self) -> bool {
		self.frames.iter().all(|frame| frame.current_branch_active)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	#[must_use]
	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	#[must_use]
	pub fn stats(&self) -> ConditionalStats {
		self.stats
	}

	fn record_branch(&mut self, active: bool) {
		self.stats.total_conditionals += 1;
		if active {
			self.stats.true_branches += 1;
		} else {
			self.stats.false_branches += 1;
		}
		self.stats.max_nesting_level = self.stats.max_nesting_level.max(self.frames.len() as u32);
	}

	/// `#if expr`: pushes a frame whose activity is `condition_value`, the
	/// already-evaluated result of the constant expression (evaluation
	/// itself is C5's job; this stack only tracks the outcome).
	pub fn push_if(&mut self, condition_value: bool, origin: Position) {
		self.record_branch(condition_value);
		self.frames.push(ConditionalFrame { kind: FrameKind::If, current_branch_active: condition_value, any_branch_taken: condition_value, has_seen_else: false, origin });
	}

	/// `#ifdef X` / `#ifndef X`.
	pub fn push_ifdef(&mut self, kind: FrameKind, is_defined: bool, origin: Position) {
		let active = if kind == FrameKind::Ifndef { !is_defined } else { is_defined };
		self.record_branch(active);
		self.frames.push(ConditionalFrame { kind, current_branch_active: active, any_branch_taken: active, has_seen_else: false, origin });
	}

	/// `#elif expr`. `condition_value` is ignored (and the branch is forced
	/// inactive) once `any_branch_taken` is already true for this frame,
	/// per §4.6's table — callers should still evaluate the expression for
	/// side effects only if cheap; this implementation treats evaluation as
	/// the caller's responsibility and only asks for it when it will
	/// actually matter (`should_evaluate_elif`).
	pub fn elif(&mut self, condition_value: bool, position: &Position, diagnostics: &mut DiagnosticBag) {
		let Some(frame) = self.frames.last_mut() else {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), "#elif without a matching #if"));
			return;
		};
		if frame.has_seen_else {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), "#elif after #else"));
			return;
		}
		if frame.any_branch_taken {
			frame.current_branch_active = false;
		} else {
			frame.current_branch_active = condition_value;
			frame.any_branch_taken = condition_value;
		}
	}

	/// Whether the top frame's `#elif` expression is even worth evaluating:
	/// once a branch has already been taken at this level, every later
	/// `#elif` is unconditionally inactive regardless of its expression's
	/// value, so the caller can skip the (potentially expensive, and
	/// diagnostic-generating) constant-expression evaluation entirely.
	#[must_use]
	pub fn should_evaluate_elif(&self) -> bool {
		self.frames.last().is_some_and(|frame| !frame.any_branch_taken)
	}

	/// `#else`.
	pub fn else_branch(&mut self, position: &Position, diagnostics: &mut DiagnosticBag) {
		let Some(frame) = self.frames.last_mut() else {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), "#else without a matching #if"));
			return;
		};
		if frame.has_seen_else {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), "#else after #else"));
			return;
		}
		frame.has_seen_else = true;
		frame.current_branch_active = !frame.any_branch_taken;
	}

	/// `#endif`.
	pub fn endif(&mut self, position: &Position, diagnostics: &mut DiagnosticBag) {
		if self.frames.pop().is_none() {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, position.clone(), "#endif without a matching #if"));
		}
	}

	/// Runs the end-of-input consistency check (§4.6: "end-of-input with a
	/// non-empty stack → PreprocessorError listing each unclosed `#if`'s
	/// position").
	pub fn verify_closed(&self, diagnostics: &mut DiagnosticBag) {
		for frame in &self.frames {
			diagnostics.push(Diagnostic::error(DiagnosticKind::Preprocessor, COMPONENT, frame.origin.clone(), "unterminated conditional: no matching #endif before end of input"));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{ConditionalStack, FrameKind};
	use crate::{diagnostics::DiagnosticBag, position::Position};

	fn pos() -> Position {
		Position::start_of("test.c")
	}

	#[test]
	fn simple_if_else_toggles_emission() {
		let mut stack = ConditionalStack::new();
		stack.push_if(false, pos());
		assert!(!stack.emit_enabled());
		let mut diagnostics = DiagnosticBag::new(100);
		stack.else_branch(&pos(), &mut diagnostics);
		assert!(stack.emit_enabled());
		stack.endif(&pos(), &mut diagnostics);
		assert!(stack.is_empty());
		assert_eq!(diagnostics.error_count(), 0);
	}

	#[test]
	fn nested_conditionals_balance() {
		let mut stack = ConditionalStack::new();
		let mut diagnostics = DiagnosticBag::new(100);
		stack.push_if(true, pos());
		stack.push_if(false, pos());
		assert!(!stack.emit_enabled());
		stack.else_branch(&pos(), &mut diagnostics);
		assert!(stack.emit_enabled());
		stack.endif(&pos(), &mut diagnostics);
		assert!(stack.emit_enabled());
		stack.endif(&pos(), &mut diagnostics);
		assert!(stack.is_empty());
	}

	#[test]
	fn elif_after_branch_taken_is_forced_inactive() {
		let mut stack = ConditionalStack::new();
		let mut diagnostics = DiagnosticBag::new(100);
		stack.push_if(true, pos());
		assert!(!stack.should_evaluate_elif());
		stack.elif(true, &pos(), &mut diagnostics);
		assert!(!stack.emit_enabled());
	}

	#[test]
	fn unmatched_directives_are_errors() {
		let mut stack = ConditionalStack::new();
		let mut diagnostics = DiagnosticBag::new(100);
		stack.endif(&pos(), &mut diagnostics);
		stack.else_branch(&pos(), &mut diagnostics);
		stack.elif(true, &pos(), &mut diagnostics);
		assert_eq!(diagnostics.error_count(), 3);
	}

	#[test]
	fn end_of_input_with_open_stack_is_reported() {
		let mut stack = ConditionalStack::new();
		stack.push_if(true, pos());
		let mut diagnostics = DiagnosticBag::new(100);
		stack.verify_closed(&mut diagnostics);
		assert_eq!(diagnostics.error_count(), 1);
	}

	#[test]
	fn stats_track_totals_and_max_nesting() {
		let mut stack = ConditionalStack::new();
		stack.push_if(true, pos());
		stack.push_ifdef(FrameKind::Ifdef, false, pos());
		let stats = stack.stats();
		assert_eq!(stats.total_conditionals, 2);
		assert_eq!(stats.true_branches, 1);
		assert_eq!(stats.false_branches, 1);
		assert_eq!(stats.max_nesting_level, 2);
	}
}

//! ANSI rendering for diagnostics, adapted from the teacher's `cli/theme.rs`
//! `Theme`/`Style` split — here there's a single closed axis (severity)
//! rather than a full syntax-highlighting theme, so one `Theme` covers it.

use colored::{ColoredString, Colorize as _};

use crate::diagnostics::{Diagnostic, Severity};

/// The color a given [`Severity`] renders in. Kept as a type so a future
/// `--no-color`/`NO_COLOR` mode can swap in a theme that renders everything
/// plain, the same reasoning that keeps the teacher's `Theme` a value
/// rather than free functions.
pub struct Theme {
	color: bool,
}

impl Theme {
	#[must_use]
	pub const fn new(color: bool) -> Self {
		Self { color }
	}

	fn severity_tag(&self, severity: Severity) -> ColoredString {
		let text = severity.to_string();
		if !self.color {
			return text.normal();
		}
		match severity {
			Severity::Error => text.bold().red(),
			Severity::Warning => text.bold().yellow(),
		}
	}

	/// Renders one diagnostic the way §7 specifies: original source
	/// position, severity tag, producing component, message — plus, when a
	/// source line is available, the offending line underlined beneath it.
	#[must_use]
	pub fn render(&self, diagnostic: &Diagnostic, source_line: Option<&str>) -> String {
		let header = format!("{}: {}: [{}] {}", diagnostic.position, self.severity_tag(diagnostic.severity), diagnostic.component, diagnostic.message);
		let Some(line) = source_line else {
			return header;
		};
		let column = diagnostic.position.column.saturating_sub(1) as usize;
		let caret_line = format!("{}{}", " ".repeat(column), if self.color { "^".bold().to_string() } else { "^".to_owned() });
		format!("{header}\n  {line}\n  {caret_line}")
	}
}

#[cfg(test)]
mod tests {
	use super::Theme;
	use crate::{diagnostics::{Diagnostic, DiagnosticKind}, position::Position};

	#[test]
	fn render_without_color_is_plain_text() {
		let theme = Theme::new(false);
		let diagnostic = Diagnostic::error(DiagnosticKind::Syntax, "parser", Position::start_of("t.c"), "oops");
		let rendered = theme.render(&diagnostic, None);
		assert!(rendered.contains("oops"));
		assert!(!rendered.contains('\u{1b}'));
	}
}

//! The engine's closed configuration surface (§6): defaults, overridden by
//! an optional `cc-frontend.toml` project file read with `toml_edit`
//! (mirroring the teacher's `cabin.toml` handling), further overridden by
//! CLI flags.

use std::path::{Path, PathBuf};

use crate::dialect::CStandard;

/// The maximum number of errors a run will accept before the pipeline
/// halts early (§7).
const DEFAULT_MAX_ERRORS: u32 = 100;
/// `#include` resolution is stubbed (§1), but the depth ceiling is still a
/// real configuration knob: a future resolver plugs in underneath this
/// same limit without touching the option set.
const DEFAULT_MAX_INCLUDE_DEPTH: u32 = 200;

/// Every knob the engine reads before processing a translation unit. This
/// is the closed option set §6 names — nothing more is added, since
/// anything not in the spec's external interface would widen the
/// engine-orchestration contract the CLI and any embedder both rely on.
#[derive(Debug, Clone)]
pub struct EngineConfig {
	pub c_standard: CStandard,
	pub include_paths: Vec<PathBuf>,
	pub predefined_macros: Vec<(String, String)>,
	pub max_errors: u32,
	pub max_include_depth: u32,
	pub max_macro_expansion_size: u32,
	pub max_recursion_depth: u32,
	pub strict_mode: bool,
	pub recovery_enabled: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		let limits = crate::preprocessor::macros::ExpansionLimits::default();
		Self {
			c_standard: CStandard::C17,
			include_paths: Vec::new(),
			predefined_macros: Vec::new(),
			max_errors: DEFAULT_MAX_ERRORS,
			max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
			max_macro_expansion_size: limits.max_expansion_size,
			max_recursion_depth: limits.max_recursion_depth,
			strict_mode: true,
			recovery_enabled: true,
		}
	}
}

impl EngineConfig {
	#[must_use]
	pub fn expansion_limits(&self) -> crate::preprocessor::macros::ExpansionLimits {
		crate::preprocessor::macros::ExpansionLimits { max_recursion_depth: self.max_recursion_depth, max_expansion_size: self.max_macro_expansion_size }
	}

	/// Reads `path` (a `cc-frontend.toml` project file) and layers its
	/// fields over `self`, leaving any field the file doesn't mention
	/// untouched. Returns `self` unchanged if `path` doesn't exist — a
	/// missing project file is not an error, the same way the teacher
	/// treats a missing `cabin.toml` as "use defaults."
	pub fn merge_toml_file(mut self, path: &Path) -> anyhow::Result<Self> {
		let Ok(text) = std::fs::read_to_string(path) else {
			return Ok(self);
		};
		let document = text.parse::<toml_edit::DocumentMut>()?;

		if let Some(standard) = document.get("c_standard").and_then(toml_edit::Item::as_str) {
			self.c_standard = standard.parse().map_err(|error: String| anyhow::anyhow!(error))?;
		}
		if let Some(paths) = document.get("include_paths").and_then(toml_edit::Item::as_array) {
			self.include_paths = paths.iter().filter_map(toml_edit::Value::as_str).map(PathBuf::from).collect();
		}
		if let Some(macros) = document.get("predefined_macros").and_then(toml_edit::Item::as_table) {
			for (name, value) in macros.iter() {
				if let Some(body) = value.as_str() {
					self.predefined_macros.push((name.to_owned(), body.to_owned()));
				}
			}
		}
		if let Some(n) = document.get("max_errors").and_then(toml_edit::Item::as_integer) {
			self.max_errors = n.try_into().unwrap_or(self.max_errors);
		}
		if let Some(n) = document.get("max_include_depth").and_then(toml_edit::Item::as_integer) {
			self.max_include_depth = n.try_into().unwrap_or(self.max_include_depth);
		}
		if let Some(n) = document.get("max_macro_expansion_size").and_then(toml_edit::Item::as_integer) {
			self.max_macro_expansion_size = n.try_into().unwrap_or(self.max_macro_expansion_size);
		}
		if let Some(n) = document.get("max_recursion_depth").and_then(toml_edit::Item::as_integer) {
			self.max_recursion_depth = n.try_into().unwrap_or(self.max_recursion_depth);
		}
		if let Some(b) = document.get("strict_mode").and_then(toml_edit::Item::as_bool) {
			self.strict_mode = b;
		}
		if let Some(b) = document.get("recovery_enabled").and_then(toml_edit::Item::as_bool) {
			self.recovery_enabled = b;
		}

		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	use super::EngineConfig;
	use crate::dialect::CStandard;

	#[test]
	fn default_config_targets_c17_with_generous_limits() {
		let config = EngineConfig::default();
		assert_eq!(config.c_standard, CStandard::C17);
		assert!(config.strict_mode);
		assert!(config.recovery_enabled);
	}

	#[test]
	fn missing_project_file_leaves_defaults_untouched() {
		let config = EngineConfig::default().merge_toml_file(std::path::Path::new("/nonexistent/cc-frontend.toml")).unwrap();
		assert_eq!(config.c_standard, CStandard::C17);
	}

	#[test]
	fn toml_file_overrides_standard_and_macros() {
		let dir = std::env::temp_dir().join(format!("cc-frontend-config-test-{:x}", std::process::id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("cc-frontend.toml");
		std::fs::write(&path, "c_standard = \"c99\"\nmax_errors = 5\n\n[predefined_macros]\nDEBUG = \"1\"\n").unwrap();

		let config = EngineConfig::default().merge_toml_file(&path).unwrap();
		assert_eq!(config.c_standard, CStandard::C99);
		assert_eq!(config.max_errors, 5);
		assert!(config.predefined_macros.iter().any(|(name, body)| name == "DEBUG" && body == "1"));

		std::fs::remove_file(&path).ok();
	}
}

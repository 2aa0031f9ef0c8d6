//! The recursive-descent parser (C11): grammar-driven AST construction over
//! the token stream (C10), with error recovery (§4.10).
//!
//! The three sub-modules mirror the three grammar layers §4.10's table
//! names: [`declarations`] (`TranslationUnit`/`ExternalDeclaration`/
//! `FunctionDefinition`/`Declaration`), [`statements`] (every `Statement`
//! alternative), and [`expressions`] (the precedence ladder over the same
//! operator table as the constant-expression evaluator, C5, plus the
//! C-specific assignment/ternary/comma/postfix layers).

pub mod declarations;
pub mod expressions;
pub mod statements;
pub mod token_stream;

use std::collections::HashSet;

use token_stream::TokenStream;

use crate::{
	ast::{Ast, NodeId, NodeKind},
	dialect::CStandard,
	diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind},
	lexer::{Token, TokenKind},
	position::{Position, SourceRange},
};

const COMPONENT: &str = "parser";

/// Tokens processed, nodes created, and recovery attempts made over one
/// parse — a concrete summary report, grounded on the original
/// implementation's parse-statistics summary (SPEC_FULL §C.2).
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserStats {
	pub tokens_processed: u32,
	pub nodes_created: u32,
	pub recovery_attempts: u32,
}

/// Everything [`parse_translation_unit`] hands back: the arena, the root
/// `TranslationUnit` node, and the run's statistics.
pub struct ParseOutput {
	pub ast: Ast,
	pub root: NodeId,
	pub stats: ParserStats,
}

/// Parses a complete token stream into a `TranslationUnit` AST (§4.10: "top-
/// down starting at TranslationUnit").
#[must_use]
pub fn parse_translation_unit(tokens: Vec<Token>, standard: CStandard, diagnostics: &mut DiagnosticBag) -> ParseOutput {
	let mut parser = Parser::new(tokens, standard, diagnostics);
	let root = parser.parse_translation_unit();
	if parser.ast.children_of(root).is_empty() {
		parser.diagnostics.push(Diagnostic::warning(DiagnosticKind::SemanticHint, COMPONENT, parser.tokens.current().position.clone(), "translation unit is empty"));
	}
	ParseOutput { ast: parser.ast, root, stats: parser.stats }
}

/// Shared parser state threaded through `declarations`/`statements`/
/// `expressions`. Each sub-module's functions take `&mut Parser` rather
/// than a standalone struct of their own, since every grammar layer shares
/// the same token stream, arena, diagnostic sink, and typedef-name table
/// (§4.10: "a simple per-scope typedef name table is maintained during
/// parsing").
pub(crate) struct Parser<'a> {
	pub(crate) tokens: TokenStream,
	pub(crate) ast: Ast,
	pub(crate) diagnostics: &'a mut DiagnosticBag,
	pub(crate) standard: CStandard,
	typedef_scopes: Vec<HashSet<String>>,
	stats: ParserStats,
}

impl<'a> Parser<'a> {
	fn new(tokens: Vec<Token>, standard: CStandard, diagnostics: &'a mut DiagnosticBag) -> Self {
		Self { tokens: TokenStream::new(tokens), ast: Ast::new(), diagnostics, standard, typedef_scopes: vec![HashSet::new()], stats: ParserStats::default() }
	}

	fn parse_translation_unit(&mut self) -> NodeId {
		let start_range = self.current_range();
		let root = self.new_node(NodeKind::TranslationUnit, start_range);

		while !self.tokens.is_at_end() {
			if self.diagnostics.should_stop() {
				break;
			}
			let before = self.tokens.get_position();
			match declarations::parse_external_declaration(self) {
				Some(declaration) => self.attach(root, declaration),
				None => {
					self.synchronize();
					// Guarantee forward progress even if synchronize()
					// didn't manage to consume anything (e.g. already at a
					// synchronization point), so a pathological input can
					// never hang the driver.
					if self.tokens.get_position() == before {
						self.advance();
					}
				},
			}
		}

		root
	}

	// --- typedef-name scope table -----------------------------------

	pub(crate) fn push_scope(&mut self) {
		self.typedef_scopes.push(HashSet::new());
	}

	pub(crate) fn pop_scope(&mut self) {
		if self.typedef_scopes.len() > 1 {
			self.typedef_scopes.pop();
		}
	}

	pub(crate) fn declare_typedef(&mut self, name: &str) {
		self.typedef_scopes.last_mut().expect("the file scope is never popped").insert(name.to_owned());
	}

	pub(crate) fn is_typedef_name(&self, name: &str) -> bool {
		self.typedef_scopes.iter().rev().any(|scope| scope.contains(name))
	}

	// --- token access helpers ----------------------------------------

	pub(crate) fn check(&self, kind: TokenKind) -> bool {
		self.tokens.check(kind)
	}

	pub(crate) fn peek_kind(&self, k: usize) -> TokenKind {
		self.tokens.peek(k).kind
	}

	pub(crate) fn current_position(&self) -> Position {
		self.tokens.current().position.clone()
	}

	pub(crate) fn current_range(&self) -> SourceRange {
		token_range(self.tokens.current())
	}

	/// The range of the token just consumed by the most recent `advance()`.
	pub(crate) fn previous_range(&self) -> SourceRange {
		token_range(self.tokens.previous(1))
	}

	pub(crate) fn advance(&mut self) -> Token {
		self.stats.tokens_processed += 1;
		self.tokens.advance().clone()
	}

	pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
		if self.check(kind) {
			self.advance();
			true
		} else {
			false
		}
	}

	/// Consumes the current token if it matches `kind`; otherwise records a
	/// `SyntaxError` naming what was expected and returns `false` without
	/// consuming anything, leaving the stream positioned for the caller's
	/// own recovery.
	pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
		if self.match_kind(kind) {
			return true;
		}
		let position = self.current_position();
		let found = self.tokens.current().lexeme.clone();
		self.error(position, format!("expected {what}, found '{found}'"));
		false
	}

	pub(crate) fn error(&mut self, position: Position, message: impl Into<String>) {
		self.diagnostics.push(Diagnostic::error(DiagnosticKind::Syntax, COMPONENT, position, message));
	}

	/// Advances the token stream until a synchronization point — `;`, `}`,
	/// or a statement-starting keyword — is reached (§4.10/§7). The
	/// synchronizing token itself is left unconsumed for `;` so the caller
	/// can still see and consume it if that's the expected next step;
	/// `}` and statement keywords are also left unconsumed so the enclosing
	/// production can react to them directly.
	pub(crate) fn synchronize(&mut self) {
		self.stats.recovery_attempts += 1;
		while !self.tokens.is_at_end() {
			if self.check(TokenKind::Semicolon) {
				self.advance();
				return;
			}
			if self.check(TokenKind::RBrace) || self.is_statement_start_keyword() {
				return;
			}
			self.advance();
		}
	}

	fn is_statement_start_keyword(&self) -> bool {
		const STARTS: &[&str] = &["if", "while", "for", "do", "switch", "case", "default", "return", "break", "continue", "goto", "int", "char", "float", "double", "void", "struct", "union", "enum", "typedef", "const", "static"];
		self.check(TokenKind::Keyword) && STARTS.contains(&self.tokens.current().lexeme.as_str())
	}

	// --- AST construction ----------------------------------------------

	pub(crate) fn new_node(&mut self, kind: NodeKind, range: SourceRange) -> NodeId {
		self.stats.nodes_created += 1;
		self.ast.push(kind, range)
	}

	pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
		self.ast.attach(parent, child);
	}

	pub(crate) fn widen(&mut self, id: NodeId, range: &SourceRange) {
		self.ast.widen_range(id, range);
	}
}

/// Computes the [`SourceRange`] a single token spans, advancing its start
/// position one character at a time through its own lexeme. This is the
/// one place the parser needs a token's *end* position, since [`Token`]
/// itself only carries where it starts.
pub(crate) fn token_range(token: &Token) -> SourceRange {
	let mut end = token.position.clone();
	for ch in token.lexeme.chars() {
		end = end.advanced_by(ch);
	}
	SourceRange::new(token.position.clone(), end)
}

#[cfg(test)]
mod tests {
	use super::parse_translation_unit;
	use crate::{ast::NodeKind, dialect::CStandard, diagnostics::DiagnosticBag, lexer::tokenize, position::PositionMap};

	fn parse(src: &str) -> super::ParseOutput {
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize(src, "<expanded>", &map, CStandard::C17, &mut diagnostics);
		parse_translation_unit(tokens, CStandard::C17, &mut diagnostics)
	}

	#[test]
	fn empty_input_is_an_empty_translation_unit_with_a_hint_not_an_error() {
		let output = parse("");
		assert!(output.ast.children_of(output.root).is_empty());
		assert!(matches!(output.ast.node(output.root).kind, NodeKind::TranslationUnit));
	}

	#[test]
	fn simple_function_parses_to_a_function_definition_with_a_return_statement() {
		let output = parse("int main(void) { return 0; }");
		let children = output.ast.children_of(output.root);
		assert_eq!(children.len(), 1);
		match &output.ast.node(children[0]).kind {
			NodeKind::FunctionDeclaration { name, has_body, .. } => {
				assert_eq!(name, "main");
				assert!(*has_body);
			},
			other => panic!("expected FunctionDeclaration, got {other:?}"),
		}
	}
}

//! Declarations: `TranslationUnit`'s children — function definitions,
//! variable declarations, `typedef`, and `struct`/`union`/`enum` type
//! declarations (§4.10's "declaration specifiers, declarators with
//! pointers/arrays/function parameters, typedef registration").

use super::{statements, token_range, Parser};
use crate::{
	ast::{NodeId, NodeKind, Param, TypeCategory},
	lexer::TokenKind,
};

const TYPE_KEYWORDS: &[&str] = &["void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool"];
const QUALIFIER_KEYWORDS: &[&str] = &["const", "volatile", "restrict"];
const STORAGE_CLASS_KEYWORDS: &[&str] = &["static", "extern", "auto", "register", "inline", "_Thread_local"];

/// `external-declaration := function-definition | declaration` (§4.10: "top-
/// down starting at TranslationUnit").
pub(crate) fn parse_external_declaration(parser: &mut Parser<'_>) -> Option<NodeId> {
	if parser.check(TokenKind::Keyword) && parser.tokens.current().lexeme == "typedef" {
		return parse_typedef(parser);
	}
	parse_declaration(parser)
}

/// `declaration := declaration-specifiers init-declarator-list? ';'`. When
/// the specifiers alone form a complete `struct`/`union`/`enum` definition
/// with no following declarator, that definition is returned directly as a
/// `TypeDeclaration`; otherwise every declarator in the (possibly
/// comma-separated) list becomes its own declaration node. Whenever more
/// than one node would otherwise result from a single declaration — several
/// comma-separated declarators, or an inline type body followed by its own
/// declarator(s) (`struct Point { int x; } origin;`) — they're wrapped in a
/// `DeclarationList`, the inline type node (if any) always first.
pub(crate) fn parse_declaration(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	let specifiers = parse_declaration_specifiers(parser)?;

	if parser.check(TokenKind::Semicolon) {
		parser.advance();
		return match specifiers.inline_type_node {
			Some(node) => Some(node),
			None => {
				parser.error(parser.current_position(), "a declaration needs either a declarator or an inline struct/union/enum body");
				None
			},
		};
	}

	let mut declarations = Vec::new();
	loop {
		let declaration = parse_init_declarator(parser, &specifiers.type_name, start_range.clone())?;
		declarations.push(declaration);
		if matches!(&parser.ast.node(*declarations.last().unwrap()).kind, NodeKind::FunctionDeclaration { has_body: true, .. }) {
			// A function *definition* ends the declaration list on its own;
			// `int f(void) {...} int g(void);` is two external declarations,
			// not one comma-separated list.
			break;
		}
		if !parser.match_kind(TokenKind::Comma) {
			break;
		}
	}

	if !matches!(&parser.ast.node(*declarations.last().unwrap()).kind, NodeKind::FunctionDeclaration { has_body: true, .. }) {
		parser.expect(TokenKind::Semicolon, "';' after declaration");
	}

	// Only collapse to the bare declarator when there's exactly one of them
	// and no inline type body sharing this declaration; an inline type body
	// always needs its own node preserved, so it goes into a `DeclarationList`
	// alongside the declarator(s) rather than being dropped.
	if specifiers.inline_type_node.is_none() && declarations.len() == 1 {
		return declarations.into_iter().next();
	}
	let list = parser.new_node(NodeKind::DeclarationList, start_range);
	if let Some(type_node) = specifiers.inline_type_node {
		parser.attach(list, type_node);
	}
	for declaration in declarations {
		parser.attach(list, declaration);
	}
	Some(list)
}

struct Specifiers {
	type_name: String,
	inline_type_node: Option<NodeId>,
}

/// `declaration-specifiers := (storage-class-specifier | type-qualifier |
/// type-specifier)+`. Storage-class and qualifier keywords are folded into
/// `type_name`'s text (semantic storage-class handling is out of scope,
/// per the Non-goals) rather than dropped, so a printed declaration still
/// shows `static const int` in full.
fn parse_declaration_specifiers(parser: &mut Parser<'_>) -> Option<Specifiers> {
	let mut words = Vec::new();
	let mut inline_type_node = None;

	loop {
		if parser.check(TokenKind::Keyword) {
			let word = parser.tokens.current().lexeme.clone();
			if word == "struct" || word == "union" || word == "enum" {
				let (rendered, node) = parse_struct_union_enum(parser, &word)?;
				words.push(rendered);
				inline_type_node = node;
				continue;
			}
			if TYPE_KEYWORDS.contains(&word.as_str()) || QUALIFIER_KEYWORDS.contains(&word.as_str()) || STORAGE_CLASS_KEYWORDS.contains(&word.as_str()) {
				parser.advance();
				words.push(word);
				continue;
			}
		}
		if parser.check(TokenKind::Identifier) && parser.is_typedef_name(&parser.tokens.current().lexeme) && words.is_empty() {
			let word = parser.tokens.current().lexeme.clone();
			parser.advance();
			words.push(word);
			continue;
		}
		break;
	}

	if words.is_empty() {
		let found = parser.tokens.current().lexeme.clone();
		parser.error(parser.current_position(), format!("expected a type, found '{found}'"));
		return None;
	}

	Some(Specifiers { type_name: words.join(" "), inline_type_node })
}

/// `struct-or-union-specifier := ('struct' | 'union') identifier? '{'
/// struct-declaration-list '}' | ('struct' | 'union') identifier` and the
/// analogous `enum-specifier` (§4.10). A body (`{ ... }`) produces a
/// `TypeDeclaration` node whose member declarations are its children; a
/// bare tag reference (`struct Point`) produces no node of its own, only
/// the rendered text used as the enclosing declaration's type name.
fn parse_struct_union_enum(parser: &mut Parser<'_>, keyword: &str) -> Option<(String, Option<NodeId>)> {
	let start_range = parser.current_range();
	parser.advance();

	let name = if parser.check(TokenKind::Identifier) {
		let name = parser.tokens.current().lexeme.clone();
		parser.advance();
		Some(name)
	} else {
		None
	};

	let rendered = match &name {
		Some(tag) => format!("{keyword} {tag}"),
		None => keyword.to_owned(),
	};

	if !parser.check(TokenKind::LBrace) {
		return Some((rendered, None));
	}

	let category = match keyword {
		"struct" => TypeCategory::Struct,
		"union" => TypeCategory::Union,
		_ => TypeCategory::Enum,
	};
	let node = parser.new_node(NodeKind::TypeDeclaration { category: category.clone(), name: name.clone() }, start_range);
	parser.advance();

	if matches!(category, TypeCategory::Enum) {
		parse_enumerator_list(parser, node);
	} else {
		while !parser.check(TokenKind::RBrace) && !parser.tokens.is_at_end() {
			if let Some(member) = parse_declaration(parser) {
				parser.attach(node, member);
			} else {
				parser.synchronize();
			}
		}
	}

	let close = parser.tokens.current().clone();
	parser.expect(TokenKind::RBrace, "'}' to close struct/union/enum body");
	parser.widen(node, &token_range(&close));
	Some((rendered, Some(node)))
}

/// `enumerator-list := enumerator (',' enumerator)* ','?`. Each enumerator
/// becomes a `VariableDeclaration` child with `has_initializer` reflecting
/// whether it carries an explicit `= constant-expression`; the constant
/// itself isn't retained as a node (enum-value semantics are out of scope).
fn parse_enumerator_list(parser: &mut Parser<'_>, parent: NodeId) {
	while !parser.check(TokenKind::RBrace) && !parser.tokens.is_at_end() {
		let start_range = parser.current_range();
		let name = parser.tokens.current().lexeme.clone();
		parser.expect(TokenKind::Identifier, "an enumerator name");
		let has_initializer = parser.match_kind(TokenKind::Assign);
		let initializer = if has_initializer { super::expressions::parse_assignment(parser) } else { None };
		let node = parser.new_node(NodeKind::VariableDeclaration { type_name: "enumerator".to_owned(), name, has_initializer }, start_range);
		if let Some(initializer) = initializer {
			parser.attach(node, initializer);
		}
		parser.attach(parent, node);
		if !parser.match_kind(TokenKind::Comma) {
			break;
		}
	}
}

/// `init-declarator := declarator ('=' initializer)?` where `declarator`
/// may itself be a function declarator, in which case `= initializer` never
/// applies and a `'{' compound-statement` may follow instead, turning the
/// declaration into a function definition (§4.10).
fn parse_init_declarator(parser: &mut Parser<'_>, base_type: &str, start_range: crate::position::SourceRange) -> Option<NodeId> {
	let pointer_depth = parse_pointer_stars(parser);
	let type_name = render_pointer_type(base_type, pointer_depth);
	let name_token = parser.tokens.current().clone();
	if !parser.expect(TokenKind::Identifier, "a declarator name") {
		return None;
	}

	if parser.check(TokenKind::LParen) {
		return parse_function_declarator(parser, &type_name, &name_token.lexeme, start_range);
	}

	let mut array_type = type_name;
	while parser.check(TokenKind::LBracket) {
		parser.advance();
		if !parser.check(TokenKind::RBracket) {
			super::expressions::parse_expression(parser);
		}
		parser.expect(TokenKind::RBracket, "']' after array size");
		array_type.push_str("[]");
	}

	let has_initializer = parser.match_kind(TokenKind::Assign);
	let initializer = if has_initializer { super::expressions::parse_assignment(parser) } else { None };

	let node = parser.new_node(NodeKind::VariableDeclaration { type_name: array_type, name: name_token.lexeme, has_initializer }, start_range);
	if let Some(initializer) = initializer {
		parser.attach(node, initializer);
	}
	Some(node)
}

fn parse_pointer_stars(parser: &mut Parser<'_>) -> usize {
	let mut depth = 0;
	while parser.check(TokenKind::Star) {
		parser.advance();
		depth += 1;
		while parser.check(TokenKind::Keyword) && QUALIFIER_KEYWORDS.contains(&parser.tokens.current().lexeme.as_str()) {
			parser.advance();
		}
	}
	depth
}

fn render_pointer_type(base: &str, pointer_depth: usize) -> String {
	let mut rendered = base.to_owned();
	for _ in 0..pointer_depth {
		rendered.push('*');
	}
	rendered
}

/// `function-declarator := '(' parameter-type-list? ')'` followed by either
/// `;` (a plain declaration) or a compound statement (a definition),
/// per §4.10's "FunctionDeclaration{..., has_body}".
fn parse_function_declarator(parser: &mut Parser<'_>, return_type: &str, name: &str, start_range: crate::position::SourceRange) -> Option<NodeId> {
	parser.advance();
	let params = parse_parameter_list(parser);
	parser.expect(TokenKind::RParen, "')' after parameter list");

	if parser.check(TokenKind::LBrace) {
		parser.push_scope();
		let node = parser.new_node(NodeKind::FunctionDeclaration { return_type: return_type.to_owned(), name: name.to_owned(), params, has_body: true }, start_range);
		let body = statements::parse_compound_statement(parser);
		parser.pop_scope();
		if let Some(body) = body {
			parser.attach(node, body);
		}
		return Some(node);
	}

	Some(parser.new_node(NodeKind::FunctionDeclaration { return_type: return_type.to_owned(), name: name.to_owned(), params, has_body: false }, start_range))
}

/// `parameter-type-list := 'void' | parameter-declaration (','
/// parameter-declaration)* (',' '...')?`.
fn parse_parameter_list(parser: &mut Parser<'_>) -> Vec<Param> {
	let mut params = Vec::new();
	if parser.check(TokenKind::RParen) {
		return params;
	}
	if parser.check(TokenKind::Keyword) && parser.tokens.current().lexeme == "void" && parser.peek_kind(1) == TokenKind::RParen {
		parser.advance();
		return params;
	}
	loop {
		if parser.check(TokenKind::Ellipsis) {
			parser.advance();
			params.push(Param { type_name: "...".to_owned(), name: None });
			break;
		}
		let Some(specifiers) = parse_declaration_specifiers(parser) else {
			break;
		};
		let pointer_depth = parse_pointer_stars(parser);
		let type_name = render_pointer_type(&specifiers.type_name, pointer_depth);
		let name = if parser.check(TokenKind::Identifier) {
			let name = parser.tokens.current().lexeme.clone();
			parser.advance();
			Some(name)
		} else {
			None
		};
		let mut type_name = type_name;
		while parser.check(TokenKind::LBracket) {
			parser.advance();
			if !parser.check(TokenKind::RBracket) {
				super::expressions::parse_expression(parser);
			}
			parser.expect(TokenKind::RBracket, "']' after array parameter size");
			type_name.push_str("[]");
		}
		params.push(Param { type_name, name });
		if !parser.match_kind(TokenKind::Comma) {
			break;
		}
	}
	params
}

/// `typedef declaration-specifiers declarator ';'`, registering the new
/// name in the current typedef-name scope so later declarations can use it
/// as a type (§4.10: "a simple per-scope typedef name table is maintained
/// during parsing").
fn parse_typedef(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.advance();
	let specifiers = parse_declaration_specifiers(parser)?;
	let pointer_depth = parse_pointer_stars(parser);
	let type_name = render_pointer_type(&specifiers.type_name, pointer_depth);
	let name_token = parser.tokens.current().clone();
	if !parser.expect(TokenKind::Identifier, "a typedef name") {
		return None;
	}
	parser.expect(TokenKind::Semicolon, "';' after typedef");
	parser.declare_typedef(&name_token.lexeme);
	Some(parser.new_node(NodeKind::TypeDeclaration { category: TypeCategory::Typedef, name: Some(name_token.lexeme) }, start_range))
}

/// Whether the current token can begin a type name, used by the cast- and
/// `sizeof`-parenthesis disambiguation in `expressions.rs`: a leading `(`
/// is a cast only if a type follows.
pub(crate) fn is_type_start(parser: &Parser<'_>) -> bool {
	if parser.check(TokenKind::Keyword) {
		let word = &parser.tokens.current().lexeme;
		return TYPE_KEYWORDS.contains(&word.as_str()) || QUALIFIER_KEYWORDS.contains(&word.as_str()) || word.as_str() == "struct" || word.as_str() == "union" || word.as_str() == "enum";
	}
	parser.check(TokenKind::Identifier) && parser.is_typedef_name(&parser.tokens.current().lexeme)
}

/// `type-name := specifier-qualifier-list abstract-declarator?`, the
/// parenthesized type used by casts and `sizeof(type)`. Only pointer
/// abstract-declarators are supported; array/function abstract-declarators
/// inside a cast are rare enough in practice that surfacing a parse error
/// for them (via the caller's save/restore fallback to an ordinary
/// parenthesized expression) is acceptable.
pub(crate) fn parse_type_name_only(parser: &mut Parser<'_>) -> Option<String> {
	let specifiers = parse_declaration_specifiers(parser)?;
	let pointer_depth = parse_pointer_stars(parser);
	Some(render_pointer_type(&specifiers.type_name, pointer_depth))
}

#[cfg(test)]
mod tests {
	use crate::{ast::NodeKind, dialect::CStandard, diagnostics::DiagnosticBag, lexer::tokenize, parser::parse_translation_unit, position::PositionMap};

	fn parse(src: &str) -> (crate::ast::Ast, crate::ast::NodeId) {
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize(src, "<expanded>", &map, CStandard::C17, &mut diagnostics);
		let output = parse_translation_unit(tokens, CStandard::C17, &mut diagnostics);
		assert_eq!(diagnostics.error_count(), 0, "unexpected errors: {:?}", diagnostics.errors().collect::<Vec<_>>());
		(output.ast, output.root)
	}

	#[test]
	fn variable_declaration_with_pointer_and_initializer() {
		let (ast, root) = parse("int *p = 0;");
		let children = ast.children_of(root);
		assert_eq!(children.len(), 1);
		match &ast.node(children[0]).kind {
			NodeKind::VariableDeclaration { type_name, name, has_initializer } => {
				assert_eq!(type_name, "int*");
				assert_eq!(name, "p");
				assert!(*has_initializer);
			},
			other => panic!("expected VariableDeclaration, got {other:?}"),
		}
	}

	#[test]
	fn comma_separated_declarators_become_a_declaration_list() {
		let (ast, root) = parse("int a, b, c;");
		let children = ast.children_of(root);
		assert_eq!(children.len(), 1);
		assert!(matches!(ast.node(children[0]).kind, NodeKind::DeclarationList));
		assert_eq!(ast.children_of(children[0]).len(), 3);
	}

	#[test]
	fn struct_definition_with_members_and_a_tagged_variable() {
		let (ast, root) = parse("struct Point { int x; int y; } origin;");
		let children = ast.children_of(root);
		assert_eq!(children.len(), 1);
		assert!(matches!(ast.node(children[0]).kind, NodeKind::DeclarationList));
		let list_children = ast.children_of(children[0]);
		assert_eq!(list_children.len(), 2);
		match &ast.node(list_children[0]).kind {
			NodeKind::TypeDeclaration { category, name } => {
				assert_eq!(*category, crate::ast::TypeCategory::Struct);
				assert_eq!(name.as_deref(), Some("Point"));
			},
			other => panic!("expected TypeDeclaration, got {other:?}"),
		}
		assert_eq!(ast.children_of(list_children[0]).len(), 2);
		match &ast.node(list_children[1]).kind {
			NodeKind::VariableDeclaration { type_name, name, .. } => {
				assert_eq!(type_name, "struct Point");
				assert_eq!(name, "origin");
			},
			other => panic!("expected VariableDeclaration, got {other:?}"),
		}
	}

	#[test]
	fn typedef_name_is_usable_as_a_type_in_a_later_declaration() {
		let (ast, root) = parse("typedef int myint; myint x;");
		let children = ast.children_of(root);
		assert_eq!(children.len(), 2);
		match &ast.node(children[1]).kind {
			NodeKind::VariableDeclaration { type_name, .. } => assert_eq!(type_name, "myint"),
			other => panic!("expected VariableDeclaration, got {other:?}"),
		}
	}

	#[test]
	fn function_declaration_without_body_is_a_prototype() {
		let (ast, root) = parse("int add(int a, int b);");
		let children = ast.children_of(root);
		assert_eq!(children.len(), 1);
		match &ast.node(children[0]).kind {
			NodeKind::FunctionDeclaration { name, has_body, params, .. } => {
				assert_eq!(name, "add");
				assert!(!*has_body);
				assert_eq!(params.len(), 2);
			},
			other => panic!("expected FunctionDeclaration, got {other:?}"),
		}
	}
}

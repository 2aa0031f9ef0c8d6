//! Statements: every `Statement` alternative §4.10 lists, plus the
//! declaration/expression-statement disambiguation a compound statement's
//! body needs at the start of each entry.

use super::{declarations, expressions, token_range, Parser};
use crate::{
	ast::{NodeId, NodeKind},
	lexer::TokenKind,
};

/// `compound-statement := '{' (declaration | statement)* '}'`. Opens its
/// own typedef-name scope (§4.10) so a `typedef` declared inside a block
/// doesn't leak past its closing brace.
pub(crate) fn parse_compound_statement(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.expect(TokenKind::LBrace, "'{' to start a compound statement");
	let node = parser.new_node(NodeKind::Compound, start_range);

	parser.push_scope();
	while !parser.check(TokenKind::RBrace) && !parser.tokens.is_at_end() {
		if parser.diagnostics.should_stop() {
			break;
		}
		let before = parser.tokens.get_position();
		match parse_block_item(parser) {
			Some(item) => parser.attach(node, item),
			None => {
				parser.synchronize();
				if parser.tokens.get_position() == before {
					parser.advance();
				}
			},
		}
	}
	parser.pop_scope();

	let close = parser.tokens.current().clone();
	parser.expect(TokenKind::RBrace, "'}' to close compound statement");
	parser.widen(node, &token_range(&close));
	Some(node)
}

/// One entry in a compound statement's body: either a local declaration or
/// an ordinary statement, distinguished by whether the next tokens look
/// like declaration specifiers (§4.10's declaration/expression
/// disambiguation, the same kind `cast-expression` needs for `(type)`).
fn parse_block_item(parser: &mut Parser<'_>) -> Option<NodeId> {
	let is_typedef = parser.check(TokenKind::Keyword) && parser.tokens.current().lexeme == "typedef";
	if is_typedef || declarations::is_type_start(parser) {
		return declarations::parse_declaration(parser);
	}
	parse_statement(parser)
}

/// `statement := labeled-statement | compound-statement |
/// expression-statement | selection-statement | iteration-statement |
/// jump-statement`.
pub(crate) fn parse_statement(parser: &mut Parser<'_>) -> Option<NodeId> {
	if parser.check(TokenKind::LBrace) {
		return parse_compound_statement(parser);
	}
	if parser.check(TokenKind::Semicolon) {
		let range = parser.current_range();
		parser.advance();
		return Some(parser.new_node(NodeKind::Null, range));
	}
	if parser.check(TokenKind::Identifier) && parser.peek_kind(1) == TokenKind::Colon {
		return Some(parse_label(parser));
	}
	if parser.check(TokenKind::Keyword) {
		return match parser.tokens.current().lexeme.as_str() {
			"if" => Some(parse_if(parser)),
			"while" => Some(parse_while(parser)),
			"for" => parse_for(parser),
			"do" => parse_do_while(parser),
			"switch" => Some(parse_switch(parser)),
			"case" => parse_case(parser),
			"default" => parse_default(parser),
			"return" => Some(parse_return(parser)),
			"break" => Some(parse_simple_jump(parser, NodeKind::Break)),
			"continue" => Some(parse_simple_jump(parser, NodeKind::Continue)),
			"goto" => parse_goto(parser),
			_ => parse_expression_statement(parser),
		};
	}
	parse_expression_statement(parser)
}

/// `labeled-statement := identifier ':' statement`.
fn parse_label(parser: &mut Parser<'_>) -> NodeId {
	let start_range = parser.current_range();
	let name = parser.tokens.current().lexeme.clone();
	parser.advance();
	parser.advance(); // the ':'
	let node = parser.new_node(NodeKind::Label { name }, start_range);
	if let Some(inner) = parse_statement(parser) {
		parser.attach(node, inner);
	}
	node
}

/// `selection-statement := 'if' '(' expression ')' statement ('else'
/// statement)?`.
fn parse_if(parser: &mut Parser<'_>) -> NodeId {
	let start_range = parser.current_range();
	parser.advance();
	parser.expect(TokenKind::LParen, "'(' after 'if'");
	let condition = expressions::parse_expression(parser);
	parser.expect(TokenKind::RParen, "')' after if condition");
	let then_node = parse_statement(parser);

	let has_else = parser.check(TokenKind::Keyword) && parser.tokens.current().lexeme == "else";
	let node = parser.new_node(NodeKind::If { has_else }, start_range);
	if let Some(condition) = condition {
		parser.attach(node, condition);
	}
	if let Some(then_node) = then_node {
		parser.attach(node, then_node);
	}
	if has_else {
		parser.advance();
		if let Some(else_node) = parse_statement(parser) {
			parser.attach(node, else_node);
		}
	}
	node
}

/// `iteration-statement := 'while' '(' expression ')' statement`.
fn parse_while(parser: &mut Parser<'_>) -> NodeId {
	let start_range = parser.current_range();
	parser.advance();
	parser.expect(TokenKind::LParen, "'(' after 'while'");
	let condition = expressions::parse_expression(parser);
	parser.expect(TokenKind::RParen, "')' after while condition");
	let body = parse_statement(parser);

	let node = parser.new_node(NodeKind::While, start_range);
	if let Some(condition) = condition {
		parser.attach(node, condition);
	}
	if let Some(body) = body {
		parser.attach(node, body);
	}
	node
}

/// `iteration-statement := 'do' statement 'while' '(' expression ')' ';'`.
fn parse_do_while(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.advance();
	let body = parse_statement(parser);
	if parser.check(TokenKind::Keyword) && parser.tokens.current().lexeme == "while" {
		parser.advance();
	} else {
		parser.error(parser.current_position(), "expected 'while' after 'do' body");
	}
	parser.expect(TokenKind::LParen, "'(' after 'while'");
	let condition = expressions::parse_expression(parser);
	parser.expect(TokenKind::RParen, "')' after do-while condition");
	parser.expect(TokenKind::Semicolon, "';' after do-while statement");

	let node = parser.new_node(NodeKind::DoWhile, start_range);
	if let Some(body) = body {
		parser.attach(node, body);
	}
	if let Some(condition) = condition {
		parser.attach(node, condition);
	}
	Some(node)
}

/// `iteration-statement := 'for' '(' (expression | declaration)? ';'
/// expression? ';' expression? ')' statement`. The three clauses and the
/// body become up to four children in source order, so a missing clause
/// (e.g. `for (;;)`) simply has fewer children rather than placeholders.
fn parse_for(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.advance();
	parser.expect(TokenKind::LParen, "'(' after 'for'");

	let node = parser.new_node(NodeKind::For, start_range);

	parser.push_scope();
	if parser.check(TokenKind::Semicolon) {
		parser.advance();
	} else if declarations::is_type_start(parser) {
		if let Some(init) = declarations::parse_declaration(parser) {
			parser.attach(node, init);
		}
	} else if let Some(init) = expressions::parse_expression(parser) {
		parser.attach(node, init);
		parser.expect(TokenKind::Semicolon, "';' after for-loop initializer");
	}

	if !parser.check(TokenKind::Semicolon) {
		if let Some(condition) = expressions::parse_expression(parser) {
			parser.attach(node, condition);
		}
	}
	parser.expect(TokenKind::Semicolon, "';' after for-loop condition");

	if !parser.check(TokenKind::RParen) {
		if let Some(step) = expressions::parse_expression(parser) {
			parser.attach(node, step);
		}
	}
	parser.expect(TokenKind::RParen, "')' after for-loop clauses");

	if let Some(body) = parse_statement(parser) {
		parser.attach(node, body);
	}
	parser.pop_scope();

	Some(node)
}

/// `selection-statement := 'switch' '(' expression ')' statement`.
fn parse_switch(parser: &mut Parser<'_>) -> NodeId {
	let start_range = parser.current_range();
	parser.advance();
	parser.expect(TokenKind::LParen, "'(' after 'switch'");
	let condition = expressions::parse_expression(parser);
	parser.expect(TokenKind::RParen, "')' after switch condition");
	let body = parse_statement(parser);

	let node = parser.new_node(NodeKind::Switch, start_range);
	if let Some(condition) = condition {
		parser.attach(node, condition);
	}
	if let Some(body) = body {
		parser.attach(node, body);
	}
	node
}

/// `labeled-statement := 'case' constant-expression ':' statement`.
fn parse_case(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.advance();
	let value = expressions::parse_ternary_for_case(parser);
	parser.expect(TokenKind::Colon, "':' after case value");
	let node = parser.new_node(NodeKind::Case, start_range);
	if let Some(value) = value {
		parser.attach(node, value);
	}
	if let Some(inner) = parse_statement(parser) {
		parser.attach(node, inner);
	}
	Some(node)
}

/// `labeled-statement := 'default' ':' statement`.
fn parse_default(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.advance();
	parser.expect(TokenKind::Colon, "':' after 'default'");
	let node = parser.new_node(NodeKind::Default, start_range);
	if let Some(inner) = parse_statement(parser) {
		parser.attach(node, inner);
	}
	Some(node)
}

/// `jump-statement := 'return' expression? ';'`.
fn parse_return(parser: &mut Parser<'_>) -> NodeId {
	let start_range = parser.current_range();
	parser.advance();
	let value = if parser.check(TokenKind::Semicolon) { None } else { expressions::parse_expression(parser) };
	let close = parser.tokens.current().clone();
	parser.expect(TokenKind::Semicolon, "';' after return statement");
	let node = parser.new_node(NodeKind::Return { has_value: value.is_some() }, start_range);
	if let Some(value) = value {
		parser.attach(node, value);
	}
	parser.widen(node, &token_range(&close));
	node
}

/// `jump-statement := ('break' | 'continue') ';'`.
fn parse_simple_jump(parser: &mut Parser<'_>, kind: NodeKind) -> NodeId {
	let start_range = parser.current_range();
	parser.advance();
	parser.expect(TokenKind::Semicolon, "';' after jump statement");
	parser.new_node(kind, start_range)
}

/// `jump-statement := 'goto' identifier ';'`.
fn parse_goto(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	parser.advance();
	let label = parser.tokens.current().lexeme.clone();
	if !parser.expect(TokenKind::Identifier, "a label name after 'goto'") {
		return None;
	}
	parser.expect(TokenKind::Semicolon, "';' after goto statement");
	Some(parser.new_node(NodeKind::Goto { label }, start_range))
}

/// `expression-statement := expression? ';'`.
fn parse_expression_statement(parser: &mut Parser<'_>) -> Option<NodeId> {
	let start_range = parser.current_range();
	if parser.check(TokenKind::Semicolon) {
		parser.advance();
		return Some(parser.new_node(NodeKind::Null, start_range));
	}
	let expression = expressions::parse_expression(parser)?;
	let close = parser.tokens.current().clone();
	parser.expect(TokenKind::Semicolon, "';' after expression statement");
	let node = parser.new_node(NodeKind::ExpressionStatement, start_range);
	parser.attach(node, expression);
	parser.widen(node, &token_range(&close));
	Some(node)
}

#[cfg(test)]
mod tests {
	use crate::{ast::NodeKind, dialect::CStandard, diagnostics::DiagnosticBag, lexer::tokenize, parser::parse_translation_unit, position::PositionMap};

	fn parse_body(src: &str) -> (crate::ast::Ast, crate::ast::NodeId) {
		let wrapped = format!("void f(void) {{ {src} }}");
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize(&wrapped, "<expanded>", &map, CStandard::C17, &mut diagnostics);
		let output = parse_translation_unit(tokens, CStandard::C17, &mut diagnostics);
		assert_eq!(diagnostics.error_count(), 0, "unexpected errors: {:?}", diagnostics.errors().collect::<Vec<_>>());
		let function = output.ast.children_of(output.root)[0];
		let body = output.ast.children_of(function)[0];
		(output.ast, body)
	}

	#[test]
	fn if_else_attaches_condition_then_and_else_branches() {
		let (ast, body) = parse_body("if (1) return 1; else return 2;");
		let if_node = ast.children_of(body)[0];
		match &ast.node(if_node).kind {
			NodeKind::If { has_else } => assert!(*has_else),
			other => panic!("expected If, got {other:?}"),
		}
		assert_eq!(ast.children_of(if_node).len(), 3);
	}

	#[test]
	fn for_loop_with_declaration_initializer() {
		let (ast, body) = parse_body("for (int i = 0; i < 10; i = i + 1) { }");
		let for_node = ast.children_of(body)[0];
		assert!(matches!(ast.node(for_node).kind, NodeKind::For));
		let children = ast.children_of(for_node);
		assert_eq!(children.len(), 4); // init, condition, step, body
		assert!(matches!(ast.node(children[0]).kind, NodeKind::VariableDeclaration { .. }));
	}

	#[test]
	fn switch_with_case_and_default() {
		let (ast, body) = parse_body("switch (1) { case 1: break; default: break; }");
		let switch_node = ast.children_of(body)[0];
		assert!(matches!(ast.node(switch_node).kind, NodeKind::Switch));
		let compound = ast.children_of(switch_node)[1];
		let cases = ast.children_of(compound);
		assert_eq!(cases.len(), 2);
		assert!(matches!(ast.node(cases[0]).kind, NodeKind::Case));
		assert!(matches!(ast.node(cases[1]).kind, NodeKind::Default));
	}

	#[test]
	fn labeled_statement_and_goto_round_trip() {
		let (ast, body) = parse_body("goto done; done: return;");
		let goto_node = ast.children_of(body)[0];
		match &ast.node(goto_node).kind {
			NodeKind::Goto { label } => assert_eq!(label, "done"),
			other => panic!("expected Goto, got {other:?}"),
		}
		let label_node = ast.children_of(body)[1];
		match &ast.node(label_node).kind {
			NodeKind::Label { name } => assert_eq!(name, "done"),
			other => panic!("expected Label, got {other:?}"),
		}
	}

	#[test]
	fn local_typedef_does_not_leak_past_its_block() {
		let wrapped = "void f(void) { { typedef int myint; myint x; } myint y; }";
		let map = PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize(wrapped, "<expanded>", &map, CStandard::C17, &mut diagnostics);
		parse_translation_unit(tokens, CStandard::C17, &mut diagnostics);
		// `myint y;` outside the inner block is no longer a recognized
		// typedef name, so it parses as an implicit-int declaration of a
		// variable named `y` with two declaration-specifier words lost to
		// error recovery rather than a clean VariableDeclaration — the
		// important part is that parsing still reports at least one error
		// instead of silently accepting `myint` as a type outside its scope.
		assert!(diagnostics.error_count() >= 1);
	}
}

//! Expression parsing: precedence-climbing over the same operator table as
//! the constant-expression evaluator (C5/§4.5), extended with the
//! C-specific assignment (right-associative), conditional `?:`
//! (right-associative), comma (lowest, left-associative), and postfix
//! (`()`, `.`, `->`, `[]`, `++`, `--`) layers §4.10 calls for.

use super::{token_range, Parser};
use crate::{
	ast::{Literal, NodeId, NodeKind},
	lexer::{LiteralValue, TokenKind},
};

/// `expression := assignment-expression (',' assignment-expression)*`
/// (§4.10: "comma (lowest, left-associative)").
pub(crate) fn parse_expression(parser: &mut Parser<'_>) -> Option<NodeId> {
	let mut left = parse_assignment(parser)?;
	while parser.check(TokenKind::Comma) {
		parser.advance();
		let operator_range = parser.previous_range();
		let right = parse_assignment(parser)?;
		let node = parser.new_node(NodeKind::Binary { operator: ",".to_owned() }, operator_range);
		parser.attach(node, left);
		parser.attach(node, right);
		left = node;
	}
	Some(left)
}

/// `assignment-expression := conditional-expression | unary-expression
/// assignment-operator assignment-expression` (right-associative). This
/// parser doesn't distinguish "must be an lvalue" at the grammar level —
/// that's a semantic concern the spec places out of scope (§1) — so the
/// left-hand side is parsed as an ordinary conditional-expression like
/// every other operand.
pub(crate) fn parse_assignment(parser: &mut Parser<'_>) -> Option<NodeId> {
	let left = parse_ternary(parser)?;
	let Some(operator) = assignment_operator(parser.tokens.current().kind) else {
		return Some(left);
	};
	parser.advance();
	let operator_range = parser.previous_range();
	let right = parse_assignment(parser)?;
	let node = parser.new_node(NodeKind::Assignment { operator: operator.to_owned() }, operator_range);
	parser.attach(node, left);
	parser.attach(node, right);
	Some(node)
}

fn assignment_operator(kind: TokenKind) -> Option<&'static str> {
	Some(match kind {
		TokenKind::Assign => "=",
		TokenKind::PlusAssign => "+=",
		TokenKind::MinusAssign => "-=",
		TokenKind::StarAssign => "*=",
		TokenKind::SlashAssign => "/=",
		TokenKind::PercentAssign => "%=",
		TokenKind::AmpAssign => "&=",
		TokenKind::PipeAssign => "|=",
		TokenKind::CaretAssign => "^=",
		TokenKind::ShlAssign => "<<=",
		TokenKind::ShrAssign => ">>=",
		_ => return None,
	})
}

/// `constant-expression := conditional-expression`, the grammar a `case`
/// label's value follows (no comma or assignment allowed at that position).
pub(crate) fn parse_ternary_for_case(parser: &mut Parser<'_>) -> Option<NodeId> {
	parse_ternary(parser)
}

/// `conditional-expression := logical-or-expression ('?' expression ':'
/// conditional-expression)?` (right-associative).
fn parse_ternary(parser: &mut Parser<'_>) -> Option<NodeId> {
	let condition = parse_logical_or(parser)?;
	if !parser.check(TokenKind::Question) {
		return Some(condition);
	}
	let start_range = token_range(parser.tokens.current());
	parser.advance();
	let then_branch = parse_expression(parser)?;
	parser.expect(TokenKind::Colon, "':' in conditional expression");
	let else_branch = parse_ternary(parser)?;
	let node = parser.new_node(NodeKind::Ternary, start_range);
	parser.attach(node, condition);
	parser.attach(node, then_branch);
	parser.attach(node, else_branch);
	Some(node)
}

/// Builds one binary-precedence level: parses a higher-precedence operand,
/// then folds in every immediately following operator at this level,
/// left-associatively, matching §4.5's "Associativity: left-to-right for
/// all binary operators."
macro_rules! binary_level {
	($name:ident, $next:ident, [$($kind:pat => $op:expr),+ $(,)?]) => {
		fn $name(parser: &mut Parser<'_>) -> Option<NodeId> {
			let mut left = $next(parser)?;
			loop {
				let operator = match parser.tokens.current().kind {
					$($kind => $op,)+
					_ => break,
				};
				parser.advance();
				let operator_range = parser.previous_range();
				let right = $next(parser)?;
				let node = parser.new_node(NodeKind::Binary { operator: operator.to_owned() }, operator_range);
				parser.attach(node, left);
				parser.attach(node, right);
				left = node;
			}
			Some(left)
		}
	};
}

binary_level!(parse_logical_or, parse_logical_and, [TokenKind::PipePipe => "||"]);
binary_level!(parse_logical_and, parse_bitor, [TokenKind::AmpAmp => "&&"]);
binary_level!(parse_bitor, parse_bitxor, [TokenKind::Pipe => "|"]);
binary_level!(parse_bitxor, parse_bitand, [TokenKind::Caret => "^"]);
binary_level!(parse_bitand, parse_equality, [TokenKind::Amp => "&"]);
binary_level!(parse_equality, parse_relational, [TokenKind::Eq => "==", TokenKind::Ne => "!="]);
binary_level!(parse_relational, parse_shift, [TokenKind::Lt => "<", TokenKind::Gt => ">", TokenKind::Le => "<=", TokenKind::Ge => ">="]);
binary_level!(parse_shift, parse_additive, [TokenKind::Shl => "<<", TokenKind::Shr => ">>"]);
binary_level!(parse_additive, parse_multiplicative, [TokenKind::Plus => "+", TokenKind::Minus => "-"]);
binary_level!(parse_multiplicative, parse_cast, [TokenKind::Star => "*", TokenKind::Slash => "/", TokenKind::Percent => "%"]);

/// `cast-expression := '(' type-name ')' cast-expression | unary-expression`.
/// A leading `(` is only treated as a cast if what follows looks like a
/// type (§4.10's declaration/expression disambiguation applies here too:
/// `(x)` is a parenthesized expression, `(int)` is a cast), decided with
/// save/restore rather than unbounded lookahead.
fn parse_cast(parser: &mut Parser<'_>) -> Option<NodeId> {
	if parser.check(TokenKind::LParen) {
		let saved = parser.tokens.get_position();
		let start_range = token_range(parser.tokens.current());
		parser.advance();
		if super::declarations::is_type_start(parser) {
			if let Some(type_name) = super::declarations::parse_type_name_only(parser) {
				if parser.expect(TokenKind::RParen, "')' after cast type") {
					let operand = parse_cast(parser)?;
					let node = parser.new_node(NodeKind::Cast { type_name }, start_range);
					parser.attach(node, operand);
					return Some(node);
				}
			}
		}
		parser.tokens.set_position(saved);
	}
	parse_unary(parser)
}

/// `unary-expression := postfix-expression | ('++' | '--') unary-expression
/// | unary-operator cast-expression | 'sizeof' unary-expression | 'sizeof'
/// '(' type-name ')'` (§4.5's unary tier plus C's prefix `++`/`--` and
/// `sizeof`).
fn parse_unary(parser: &mut Parser<'_>) -> Option<NodeId> {
	if matches!(parser.tokens.current().kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
		let operator = if parser.tokens.current().kind == TokenKind::PlusPlus { "++" } else { "--" };
		let start_range = token_range(parser.tokens.current());
		parser.advance();
		let operand = parse_unary(parser)?;
		let node = parser.new_node(NodeKind::Unary { operator: operator.to_owned(), is_postfix: false }, start_range);
		parser.attach(node, operand);
		return Some(node);
	}

	if let Some(operator) = unary_operator(parser.tokens.current().kind) {
		let start_range = token_range(parser.tokens.current());
		parser.advance();
		let operand = parse_cast(parser)?;
		let node = parser.new_node(NodeKind::Unary { operator: operator.to_owned(), is_postfix: false }, start_range);
		parser.attach(node, operand);
		return Some(node);
	}

	if parser.check(TokenKind::Keyword) && parser.tokens.current().lexeme == "sizeof" {
		let start_range = token_range(parser.tokens.current());
		parser.advance();
		if parser.check(TokenKind::LParen) {
			let saved = parser.tokens.get_position();
			parser.advance();
			if super::declarations::is_type_start(parser) {
				if let Some(_type_name) = super::declarations::parse_type_name_only(parser) {
					if parser.expect(TokenKind::RParen, "')' after sizeof type") {
						let node = parser.new_node(NodeKind::Sizeof, start_range);
						return Some(node);
					}
				}
			}
			parser.tokens.set_position(saved);
		}
		let operand = parse_unary(parser)?;
		let node = parser.new_node(NodeKind::Sizeof, start_range);
		parser.attach(node, operand);
		return Some(node);
	}

	parse_postfix(parser)
}

fn unary_operator(kind: TokenKind) -> Option<&'static str> {
	Some(match kind {
		TokenKind::Plus => "+",
		TokenKind::Minus => "-",
		TokenKind::Bang => "!",
		TokenKind::Tilde => "~",
		TokenKind::Star => "*",
		TokenKind::Amp => "&",
		_ => return None,
	})
}

/// `postfix-expression := primary-expression ('[' expr ']' | '(' args ')' |
/// '.' ident | '->' ident | '++' | '--')*` (§4.10: "the postfix layer
/// (call, `.`, `->`, `[]`, `++`, `--`)").
fn parse_postfix(parser: &mut Parser<'_>) -> Option<NodeId> {
	let mut expr = parse_primary(parser)?;
	loop {
		match parser.tokens.current().kind {
			TokenKind::LBracket => {
				parser.advance();
				let index = parse_expression(parser)?;
				let close = parser.tokens.current().clone();
				parser.expect(TokenKind::RBracket, "']' after array index");
				let node = parser.new_node(NodeKind::ArrayAccess, parser.ast.node(expr).range.clone());
				parser.attach(node, expr);
				parser.attach(node, index);
				parser.widen(node, &token_range(&close));
				expr = node;
			},
			TokenKind::LParen => {
				parser.advance();
				let node = parser.new_node(NodeKind::Call, parser.ast.node(expr).range.clone());
				parser.attach(node, expr);
				if !parser.check(TokenKind::RParen) {
					loop {
						if let Some(argument) = parse_assignment(parser) {
							parser.attach(node, argument);
						}
						if !parser.match_kind(TokenKind::Comma) {
							break;
						}
					}
				}
				let close = parser.tokens.current().clone();
				parser.expect(TokenKind::RParen, "')' after call arguments");
				parser.widen(node, &token_range(&close));
				expr = node;
			},
			TokenKind::Dot | TokenKind::Arrow => {
				let operator = if parser.tokens.current().kind == TokenKind::Dot { "." } else { "->" };
				parser.advance();
				let field_token = parser.tokens.current().clone();
				parser.expect(TokenKind::Identifier, "a member name");
				let node = parser.new_node(NodeKind::Member { operator: operator.to_owned(), field: field_token.lexeme.clone() }, parser.ast.node(expr).range.clone());
				parser.attach(node, expr);
				parser.widen(node, &token_range(&field_token));
				expr = node;
			},
			TokenKind::PlusPlus | TokenKind::MinusMinus => {
				let operator = if parser.tokens.current().kind == TokenKind::PlusPlus { "++" } else { "--" };
				let token = parser.tokens.current().clone();
				parser.advance();
				let node = parser.new_node(NodeKind::Unary { operator: operator.to_owned(), is_postfix: true }, parser.ast.node(expr).range.clone());
				parser.attach(node, expr);
				parser.widen(node, &token_range(&token));
				expr = node;
			},
			_ => break,
		}
	}
	Some(expr)
}

/// `primary-expression := identifier | constant | string-literal | '('
/// expression ')'`.
fn parse_primary(parser: &mut Parser<'_>) -> Option<NodeId> {
	let token = parser.tokens.current().clone();
	match token.kind {
		TokenKind::Identifier => {
			parser.advance();
			Some(parser.new_node(NodeKind::Identifier { name: token.lexeme }, token_range(&token)))
		},
		TokenKind::IntegerLiteral => {
			parser.advance();
			let value = match token.value {
				Some(LiteralValue::Integer(n)) => n,
				_ => 0,
			};
			Some(parser.new_node(NodeKind::Literal(Literal::Integer(value)), token_range(&token)))
		},
		TokenKind::FloatLiteral => {
			parser.advance();
			let value = match token.value {
				Some(LiteralValue::Float(n)) => n,
				_ => 0.0,
			};
			Some(parser.new_node(NodeKind::Literal(Literal::Float(value)), token_range(&token)))
		},
		TokenKind::CharLiteral => {
			parser.advance();
			let value = match token.value {
				Some(LiteralValue::Char(c)) => c,
				_ => '\0',
			};
			Some(parser.new_node(NodeKind::Literal(Literal::Char(value)), token_range(&token)))
		},
		TokenKind::StringLiteral => {
			parser.advance();
			let value = match token.value {
				Some(LiteralValue::Str(s)) => s,
				_ => String::new(),
			};
			Some(parser.new_node(NodeKind::Literal(Literal::String(value)), token_range(&token)))
		},
		TokenKind::LParen => {
			parser.advance();
			let inner = parse_expression(parser)?;
			let close = parser.tokens.current().clone();
			parser.expect(TokenKind::RParen, "')' to close parenthesized expression");
			parser.widen(inner, &token_range(&close));
			Some(inner)
		},
		_ => {
			parser.error(token.position.clone(), format!("expected an expression, found '{}'", token.lexeme));
			None
		},
	}
}

#[cfg(test)]
mod tests {
	use crate::{ast::NodeKind, dialect::CStandard, diagnostics::DiagnosticBag, lexer::tokenize, parser::Parser};

	fn parse_expr(src: &str) -> (crate::ast::Ast, crate::ast::NodeId) {
		let map = crate::position::PositionMap::new();
		let mut diagnostics = DiagnosticBag::new(100);
		let tokens = tokenize(src, "<expanded>", &map, CStandard::C17, &mut diagnostics);
		let mut parser = Parser::new(tokens, CStandard::C17, &mut diagnostics);
		let node = super::parse_expression(&mut parser).unwrap();
		(parser.ast, node)
	}

	#[test]
	fn precedence_matches_c_operator_table() {
		let (ast, root) = parse_expr("1 + 2 * 3 - 4");
		// top-level node should be the `-`, since `+`/`-` share precedence
		// and associate left-to-right, making `-` the last (outermost) fold.
		match &ast.node(root).kind {
			NodeKind::Binary { operator } => assert_eq!(operator, "-"),
			other => panic!("expected top-level Binary(-), got {other:?}"),
		}
		let printed = crate::ast::CompactPrinter::new().print(&ast, root);
		assert_eq!(printed, "Binary(-)(Binary(+)(IntegerLiteral(1), Binary(*)(IntegerLiteral(2), IntegerLiteral(3))), IntegerLiteral(4))");
	}

	#[test]
	fn ternary_is_right_associative() {
		let (ast, root) = parse_expr("a ? 1 : b ? 2 : 3");
		let printed = crate::ast::CompactPrinter::new().print(&ast, root);
		assert_eq!(printed, "Ternary(Identifier(a), IntegerLiteral(1), Ternary(Identifier(b), IntegerLiteral(2), IntegerLiteral(3)))");
	}

	#[test]
	fn assignment_is_right_associative() {
		let (ast, root) = parse_expr("a = b = 1");
		let printed = crate::ast::CompactPrinter::new().print(&ast, root);
		assert_eq!(printed, "Assignment(=)(Identifier(a), Assignment(=)(Identifier(b), IntegerLiteral(1)))");
	}

	#[test]
	fn postfix_call_and_member_chain() {
		let (ast, root) = parse_expr("a.b->c(1, 2)");
		let printed = crate::ast::CompactPrinter::new().print(&ast, root);
		assert_eq!(printed, "Call(Member(->c)(Member(.b)(Identifier(a))), IntegerLiteral(1), IntegerLiteral(2))");
	}
}

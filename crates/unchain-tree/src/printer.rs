//! Source printer.
//!
//! Renders a function (or any subtree) back to Kotlin source with four-space
//! indentation. Blocks holding a single non-declaration statement that fits
//! on one line print inline (`{ x }`); everything else prints one statement
//! per line.

use crate::node::*;
use unchain_common::limits::MAX_TREE_DEPTH;

const INDENT: &str = "    ";

/// Precedence of primaries and postfix expressions (calls, member access).
const POSTFIX: u8 = 15;
/// Precedence of `if`, `try`, lambdas and jumps; they need parentheses
/// anywhere an operand is expected.
const LOWEST: u8 = 1;

pub struct Printer<'a> {
    arena: &'a NodeArena,
}

/// Print a function declaration.
pub fn print_function(arena: &NodeArena, function: NodeIndex) -> String {
    Printer::new(arena).function(function)
}

/// Print any statement or expression at the outermost indentation level.
pub fn print_node(arena: &NodeArena, node: NodeIndex) -> String {
    Printer::new(arena).statement(node, 0, 0)
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a NodeArena) -> Self {
        Self { arena }
    }

    pub fn function(&self, function: NodeIndex) -> String {
        let Some(data) = self.arena.get_function(function) else {
            return self.statement(function, 0, 0);
        };
        let mut out = format!("fun {}(", data.name);
        for (i, &param) in data.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.param(param));
        }
        out.push(')');
        if let Some(ty) = &data.return_type {
            out.push_str(&format!(": {ty}"));
        }
        let statements = self
            .arena
            .get_block(data.body)
            .map(|b| b.statements.as_slice())
            .unwrap_or_default();
        if data.expression_body
            && let [single] = statements
        {
            out.push_str(" = ");
            out.push_str(&self.expr(*single, 0, 0, 1));
        } else {
            out.push(' ');
            out.push_str(&self.multiline_block(statements, 0, 1));
        }
        out
    }

    fn param(&self, param: NodeIndex) -> String {
        match self.arena.get_param(param) {
            Some(ParamData { name, ty: Some(ty) }) => format!("{name}: {ty}"),
            Some(ParamData { name, ty: None }) => name.clone(),
            None => String::new(),
        }
    }

    fn precedence(&self, node: NodeIndex) -> u8 {
        match self.arena.kind(node) {
            Some(NodeKind::Binary(b)) => b.op.precedence(),
            Some(NodeKind::If(_) | NodeKind::Try(_) | NodeKind::Lambda(_) | NodeKind::Return(_)) => LOWEST,
            _ => POSTFIX,
        }
    }

    // ============================================================================
    // Statements and blocks
    // ============================================================================

    fn statement(&self, node: NodeIndex, level: usize, depth: u32) -> String {
        if depth > MAX_TREE_DEPTH {
            return "/* ... */".to_string();
        }
        match self.arena.kind(node) {
            Some(NodeKind::Property(p)) => {
                let keyword = if p.mutable { "var" } else { "val" };
                let ty = p.ty.as_ref().map(|t| format!(": {t}")).unwrap_or_default();
                format!(
                    "{keyword} {}{ty} = {}",
                    p.name,
                    self.expr(p.initializer, level, 0, depth + 1)
                )
            }
            Some(NodeKind::Destructuring(d)) => {
                let names: Vec<String> = d.entries.iter().map(|&e| self.param(e)).collect();
                format!(
                    "val ({}) = {}",
                    names.join(", "),
                    self.expr(d.initializer, level, 0, depth + 1)
                )
            }
            Some(NodeKind::Function(_)) => self.function(node),
            Some(NodeKind::Block(b)) => self.block(&b.statements, level, depth),
            _ => self.expr(node, level, 0, depth),
        }
    }

    fn is_declaration(&self, node: NodeIndex) -> bool {
        matches!(
            self.arena.kind(node),
            Some(NodeKind::Property(_) | NodeKind::Destructuring(_))
        )
    }

    /// `{ single }` when possible, else one statement per line.
    fn block(&self, statements: &[NodeIndex], level: usize, depth: u32) -> String {
        if let [single] = statements
            && !self.is_declaration(*single)
        {
            let text = self.statement(*single, level, depth + 1);
            if !text.contains('\n') {
                return format!("{{ {text} }}");
            }
        }
        self.multiline_block(statements, level, depth)
    }

    fn multiline_block(&self, statements: &[NodeIndex], level: usize, depth: u32) -> String {
        if statements.is_empty() {
            return "{}".to_string();
        }
        let mut out = String::from("{\n");
        self.push_lines(&mut out, statements, level + 1, depth);
        out.push_str(&INDENT.repeat(level));
        out.push('}');
        out
    }

    fn push_lines(&self, out: &mut String, statements: &[NodeIndex], level: usize, depth: u32) {
        for &statement in statements {
            out.push_str(&INDENT.repeat(level));
            out.push_str(&self.statement(statement, level, depth + 1));
            out.push('\n');
        }
    }

    fn block_statements(&self, block: NodeIndex) -> &'a [NodeIndex] {
        self.arena
            .get_block(block)
            .map(|b| b.statements.as_slice())
            .unwrap_or_default()
    }

    // ============================================================================
    // Expressions
    // ============================================================================

    fn expr(&self, node: NodeIndex, level: usize, min_prec: u8, depth: u32) -> String {
        if depth > MAX_TREE_DEPTH {
            return "/* ... */".to_string();
        }
        let text = self.expr_inner(node, level, depth);
        if self.precedence(node) < min_prec {
            format!("({text})")
        } else {
            text
        }
    }

    fn expr_inner(&self, node: NodeIndex, level: usize, depth: u32) -> String {
        let Some(kind) = self.arena.kind(node) else {
            return String::new();
        };
        match kind {
            NodeKind::NameRef(r) => r.name.clone(),
            NodeKind::Literal(lit) => literal(lit),
            NodeKind::ClassLiteral(c) => {
                if c.java {
                    format!("{}::class.java", c.type_name)
                } else {
                    format!("{}::class", c.type_name)
                }
            }
            NodeKind::Call(c) => self.call(c, level, depth),
            NodeKind::Qualified(q) => {
                let receiver = self.expr(q.receiver, level, POSTFIX, depth + 1);
                let dot = if q.safe { "?." } else { "." };
                let selector = self.expr(q.selector, level, POSTFIX, depth + 1);
                format!("{receiver}{dot}{selector}")
            }
            NodeKind::Binary(b) => {
                let prec = b.op.precedence();
                let left = self.expr(b.left, level, prec, depth + 1);
                let right_min = if self.arena.get_return(b.right).is_some() {
                    0
                } else {
                    prec + 1
                };
                let right = self.expr(b.right, level, right_min, depth + 1);
                format!("{left} {} {right}", b.op.token())
            }
            NodeKind::Lambda(l) => self.lambda(l, level, depth),
            NodeKind::If(i) => {
                let mut out = format!(
                    "if ({}) {}",
                    self.expr(i.condition, level, 0, depth + 1),
                    self.branch(i.then_branch, level, depth)
                );
                if i.else_branch.is_some() {
                    out.push_str(" else ");
                    out.push_str(&self.branch(i.else_branch, level, depth));
                }
                out
            }
            NodeKind::Try(t) => format!(
                "try {} catch ({}) {}",
                self.block(self.block_statements(t.body), level, depth + 1),
                self.param(t.catch_param),
                self.block(self.block_statements(t.handler), level, depth + 1)
            ),
            NodeKind::Return(r) => {
                let mut out = String::from("return");
                if let Some(label) = &r.label {
                    out.push('@');
                    out.push_str(label);
                }
                if r.value.is_some() {
                    out.push(' ');
                    out.push_str(&self.expr(r.value, level, 0, depth + 1));
                }
                out
            }
            NodeKind::Block(b) => self.block(&b.statements, level, depth + 1),
            NodeKind::Property(_) | NodeKind::Destructuring(_) | NodeKind::Function(_) => {
                self.statement(node, level, depth)
            }
            NodeKind::Param(p) => p.name.clone(),
        }
    }

    fn branch(&self, branch: NodeIndex, level: usize, depth: u32) -> String {
        match self.arena.get_block(branch) {
            Some(b) => self.block(&b.statements, level, depth + 1),
            None => self.expr(branch, level, 0, depth + 1),
        }
    }

    fn call(&self, call: &CallData, level: usize, depth: u32) -> String {
        let (leading, trailing) = match call.args.split_last() {
            Some((&last, rest)) if self.arena.get_lambda(last).is_some() => (rest, Some(last)),
            _ => (call.args.as_slice(), None),
        };
        let args: Vec<String> = leading
            .iter()
            .map(|&a| self.expr(a, level, 0, depth + 1))
            .collect();
        let mut out = call.callee.clone();
        if trailing.is_none() || !args.is_empty() {
            out.push('(');
            out.push_str(&args.join(", "));
            out.push(')');
        }
        if let Some(lambda) = trailing {
            out.push(' ');
            out.push_str(&self.expr_inner(lambda, level, depth + 1));
        }
        out
    }

    fn lambda(&self, l: &LambdaData, level: usize, depth: u32) -> String {
        let mut head = String::new();
        if let Some(label) = &l.label {
            head.push_str(label);
            head.push('@');
        }
        head.push('{');
        let params: Vec<String> = l
            .params
            .iter()
            .map(|p| match p {
                LambdaParam::Single(idx) => self.param(*idx),
                LambdaParam::Destructured(entries) => {
                    let names: Vec<String> = entries.iter().map(|&e| self.param(e)).collect();
                    format!("({})", names.join(", "))
                }
            })
            .collect();
        if !params.is_empty() {
            head.push(' ');
            head.push_str(&params.join(", "));
            head.push_str(" ->");
        }
        let statements = self.block_statements(l.body);
        if let [single] = statements
            && !self.is_declaration(*single)
        {
            let text = self.statement(*single, level, depth + 1);
            if !text.contains('\n') {
                return format!("{head} {text} }}");
            }
        }
        if statements.is_empty() {
            return format!("{head} }}");
        }
        let mut out = head;
        out.push('\n');
        self.push_lines(&mut out, statements, level + 1, depth);
        out.push_str(&INDENT.repeat(level));
        out.push('}');
        out
    }
}

fn literal(lit: &Literal) -> String {
    match lit {
        Literal::Null => "null".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Str(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            out.push('"');
            for ch in s.chars() {
                match ch {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '$' => out.push_str("\\$"),
                    '\n' => out.push_str("\\n"),
                    other => out.push(other),
                }
            }
            out.push('"');
            out
        }
    }
}

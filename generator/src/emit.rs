use crate::session::Session;
use crate::tree::{Block, Declarator, Expr, Function, Place, Stmt};

/// Accumulates C text, tracking the current block depth.
pub struct Emitter {
    indent: usize,
    output: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            indent: 0,
            output: String::new(),
        }
    }

    pub fn emit_inline(&mut self, s: &str) {
        self.output.push_str(s);
    }

    /// Start a new line at the current depth and write `s` on it.
    pub fn emit_block(&mut self, s: &str) {
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        self.output.push_str(s);
    }

    pub fn enter_block(&mut self) {
        self.indent += 1
    }

    pub fn exit_block(&mut self) {
        self.indent -= 1
    }

    pub fn emit(self) -> String {
        self.output
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Emit {
    fn emit_into(&self, e: &mut Emitter, s: &Session);

    fn emit(&self, s: &Session) -> String {
        let mut e = Emitter::new();
        self.emit_into(&mut e, s);
        e.emit()
    }
}

impl Emit for Expr {
    fn emit_into(&self, e: &mut Emitter, s: &Session) {
        match self {
            Expr::Place(p) => p.emit_into(e, s),
            Expr::Int(i) => e.emit_inline(&i.to_string()),
            Expr::Literal(l) => e.emit_inline(l),
            Expr::Binary { lhs, op, rhs } => {
                e.emit_inline("(");
                lhs.emit_into(e, s);
                e.emit_inline(" ");
                e.emit_inline(s.name(op.sign));
                e.emit_inline(" ");
                rhs.emit_into(e, s);
                e.emit_inline(")");
            }
            Expr::Call(call) => {
                e.emit_inline(s.name(s.function(call.callee()).name));
                e.emit_inline("(");
                for (i, arg) in call.args().iter().enumerate() {
                    if i > 0 {
                        e.emit_inline(", ");
                    }
                    arg.emit_into(e, s);
                }
                e.emit_inline(")");
            }
        }
    }
}

impl Emit for Place {
    fn emit_into(&self, e: &mut Emitter, s: &Session) {
        match self {
            Place::Variable(v) => e.emit_inline(s.var_name(*v)),
            Place::Indexed { base, index } => {
                e.emit_inline(s.var_name(*base));
                e.emit_inline("[");
                index.emit_into(e, s);
                e.emit_inline("]");
            }
        }
    }
}

/// Assignments and declarations without the trailing `;`, as they appear in
/// a `for` header.
fn emit_simple(stmt: &Stmt, e: &mut Emitter, s: &Session) {
    match stmt {
        Stmt::Assign { to, op, value } => {
            to.emit_into(e, s);
            e.emit_inline(" ");
            if let Some(op) = op {
                e.emit_inline(s.name(op.sign));
            }
            e.emit_inline("= ");
            value.emit_into(e, s);
        }
        Stmt::Declaration {
            type_,
            declarator,
            init,
        } => {
            e.emit_inline(s.name(type_.name));
            e.emit_inline(" ");
            match declarator {
                Declarator::Scalar(v) => e.emit_inline(s.var_name(*v)),
                Declarator::Array(v) => {
                    e.emit_inline(s.var_name(*v));
                    e.emit_inline("[]");
                }
            }
            e.emit_inline(" = ");
            init.emit_into(e, s);
        }
        Stmt::Expr(expr) => expr.emit_into(e, s),
        Stmt::Raw(line) => e.emit_inline(line.trim_end_matches(';')),
        other => other.emit_into(e, s),
    }
}

fn emit_body(body: &Block, e: &mut Emitter, s: &Session) {
    body.emit_into(e, s);
    e.emit_block("}");
}

impl Emit for Stmt {
    fn emit_into(&self, e: &mut Emitter, s: &Session) {
        match self {
            Stmt::Assign { .. } | Stmt::Declaration { .. } | Stmt::Expr(_) => {
                e.emit_block("");
                emit_simple(self, e, s);
                e.emit_inline(";");
            }
            Stmt::Branch {
                condition,
                then,
                else_,
            } => {
                e.emit_block("if (");
                condition.emit_into(e, s);
                e.emit_inline(") {");
                then.emit_into(e, s);
                match else_ {
                    Some(else_) => {
                        e.emit_block("} else {");
                        emit_body(else_, e, s);
                    }
                    None => e.emit_block("}"),
                }
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
            } => {
                e.emit_block("for (");
                emit_simple(init, e, s);
                e.emit_inline("; ");
                condition.emit_into(e, s);
                e.emit_inline("; ");
                emit_simple(step, e, s);
                e.emit_inline(") {");
                emit_body(body, e, s);
            }
            Stmt::While { condition, body } => {
                e.emit_block("while (");
                condition.emit_into(e, s);
                e.emit_inline(") {");
                emit_body(body, e, s);
            }
            Stmt::Return(expr) => {
                e.emit_block("return ");
                expr.emit_into(e, s);
                e.emit_inline(";");
            }
            Stmt::Raw(line) => e.emit_block(line),
        }
    }
}

impl Emit for Block {
    fn emit_into(&self, e: &mut Emitter, s: &Session) {
        e.enter_block();
        for stmt in &self.body {
            stmt.emit_into(e, s);
        }
        e.exit_block();
    }
}

fn emit_signature(f: &Function, e: &mut Emitter, s: &Session) {
    e.emit_block(s.name(f.return_type.name));
    e.emit_inline(" ");
    e.emit_inline(s.name(f.name));
    e.emit_inline("(");
    for (i, p) in f.params.iter().enumerate() {
        if i > 0 {
            e.emit_inline(", ");
        }
        let v = s.variable(*p);
        e.emit_inline(s.name(v.type_.name));
        e.emit_inline(" ");
        e.emit_inline(s.name(v.name));
    }
    e.emit_inline(")");
}

impl Emit for Function {
    fn emit_into(&self, e: &mut Emitter, s: &Session) {
        emit_signature(self, e, s);
        e.emit_inline(" {");
        if let Some(body) = &self.body {
            body.emit_into(e, s);
        }
        e.emit_block("}");
    }
}

/// Forward declaration of a function: its signature followed by `;`.
pub struct Prototype<'a>(pub &'a Function);

impl Emit for Prototype<'_> {
    fn emit_into(&self, e: &mut Emitter, s: &Session) {
        emit_signature(self.0, e, s);
        e.emit_inline(";");
    }
}

use la_arena::Idx;

use crate::error::SynthesisError;
use crate::session::Session;
use crate::symbol::Symbol;

pub type VarId = Idx<Variable>;
pub type FuncId = Idx<Function>;

/// A C type as it is spelled in declarations, e.g. `int` or `int*`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ValueType {
    pub name: Symbol,
}

/// A binary operator, e.g. `+` or `>`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    pub sign: Symbol,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    pub name: Symbol,
    pub type_: ValueType,
}

/// Assignable storage locations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Place {
    Variable(VarId),
    /// `base[index]`. The base is not checked to be array-like.
    Indexed { base: VarId, index: Box<Expr> },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expr {
    Place(Place),
    Int(i64),
    /// Emitted verbatim: array initializers, string literals, helper conditions.
    Literal(String),
    Binary {
        lhs: Box<Expr>,
        op: Operation,
        rhs: Box<Expr>,
    },
    Call(FunctionCall),
}

impl Expr {
    pub fn var(v: VarId) -> Expr {
        Expr::Place(Place::Variable(v))
    }

    pub fn indexed(base: VarId, index: Expr) -> Expr {
        Expr::Place(Place::Indexed {
            base,
            index: Box::new(index),
        })
    }

    pub fn binary(lhs: Expr, op: Operation, rhs: Expr) -> Expr {
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn literal(s: impl Into<String>) -> Expr {
        Expr::Literal(s.into())
    }
}

/// A call whose argument count is known to match the callee's parameters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionCall {
    callee: FuncId,
    args: Vec<Expr>,
}

impl FunctionCall {
    /// Build a call to `callee`, failing if `args` does not match its arity.
    pub fn new(
        session: &Session,
        callee: FuncId,
        args: Vec<Expr>,
    ) -> Result<Self, SynthesisError> {
        let function = session.function(callee);
        if args.len() != function.arity() {
            return Err(SynthesisError::ArityMismatch {
                callee: session.name(function.name).to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        Ok(Self { callee, args })
    }

    pub fn callee(&self) -> FuncId {
        self.callee
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }
}

/// What a declaration introduces: a scalar or an unsized array.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Declarator {
    Scalar(VarId),
    Array(VarId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Stmt {
    /// `to op= value;`, or `to = value;` when `op` is `None`.
    Assign {
        to: Place,
        op: Option<Operation>,
        value: Expr,
    },
    Declaration {
        type_: ValueType,
        declarator: Declarator,
        init: Expr,
    },
    Branch {
        condition: Expr,
        then: Block,
        else_: Option<Block>,
    },
    For {
        init: Box<Stmt>,
        condition: Expr,
        step: Box<Stmt>,
        body: Block,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Return(Expr),
    /// An expression evaluated for its side effects.
    Expr(Expr),
    /// A single line of C emitted verbatim.
    Raw(String),
}

impl Stmt {
    pub fn assign(to: VarId, op: Option<Operation>, value: Expr) -> Stmt {
        Stmt::Assign {
            to: Place::Variable(to),
            op,
            value,
        }
    }

    pub fn declare(type_: ValueType, v: VarId, init: Expr) -> Stmt {
        Stmt::Declaration {
            type_,
            declarator: Declarator::Scalar(v),
            init,
        }
    }

    pub fn branch(condition: Expr, then: Vec<Stmt>) -> Stmt {
        Stmt::Branch {
            condition,
            then: Block::new(then),
            else_: None,
        }
    }

    pub fn raw(line: impl Into<String>) -> Stmt {
        Stmt::Raw(line.into())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Block {
    pub body: Vec<Stmt>,
}

impl Block {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Function {
    pub return_type: ValueType,
    pub name: Symbol,
    pub params: Vec<VarId>,
    /// Filled after every function has been declared.
    pub body: Option<Block>,
}

impl Function {
    pub fn new(return_type: ValueType, name: Symbol, params: Vec<VarId>) -> Self {
        Function {
            return_type,
            name,
            params,
            body: None,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_param_session() -> (Session, FuncId, VarId, VarId) {
        let mut s = Session::with_c_types();
        let int = s.type_("int").unwrap();
        let array = s.type_("array").unwrap();
        let arg = s.declare_variable(int, "arg");
        let arr = s.declare_variable(array, "arr");
        let f = s.declare_function(int, "test_0", vec![arg, arr]);
        (s, f, arg, arr)
    }

    #[test]
    fn call_with_wrong_arity_fails() {
        let (s, f, arg, _) = two_param_session();
        match FunctionCall::new(&s, f, vec![Expr::var(arg)]) {
            Err(SynthesisError::ArityMismatch {
                callee,
                expected,
                found,
            }) => {
                assert_eq!(callee, "test_0");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("expected arity mismatch, got {other:?}"),
        }
        assert!(FunctionCall::new(&s, f, vec![]).is_err());
    }

    #[test]
    fn call_with_matching_arity_keeps_args_in_order() {
        let (s, f, arg, arr) = two_param_session();
        let call = FunctionCall::new(&s, f, vec![Expr::var(arg), Expr::var(arr)]).unwrap();
        assert_eq!(call.callee(), f);
        assert_eq!(call.args(), &[Expr::var(arg), Expr::var(arr)]);
    }
}

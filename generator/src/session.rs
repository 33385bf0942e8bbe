use std::collections::HashMap;

use la_arena::Arena;
use tracing::trace;

use crate::error::{SymbolKind, SynthesisError};
use crate::symbol::{Symbol, SymbolTable};
use crate::tree::{
    Block, Expr, FuncId, Function, FunctionCall, Operation, ValueType, VarId, Variable,
};

/// Everything one synthesis run declares: the fixed types and operators, the
/// variables created for each role and the functions being built.
///
/// Registries only grow. A session belongs to exactly one run and is dropped
/// with it.
#[derive(Debug, Default)]
pub struct Session {
    symbols: SymbolTable,
    types: HashMap<String, ValueType>,
    operations: HashMap<String, Operation>,
    variables: Arena<Variable>,
    pools: HashMap<ValueType, Vec<VarId>>,
    functions: Arena<Function>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session holding the types and operators generated programs use.
    pub fn with_c_types() -> Self {
        let mut s = Self::new();
        s.register_type("int", "int");
        s.register_type("array", "int*");
        s.register_type("string", "const char*");
        s.register_type("void", "void");

        s.register_operation("sum", "+");
        s.register_operation("dif", "-");
        s.register_operation("mul", "*");
        s.register_operation("div", "/");
        s.register_operation("gt", ">");
        s
    }

    pub fn register_type(&mut self, key: &str, spelling: &str) -> ValueType {
        let t = ValueType {
            name: self.symbols.to_sym(spelling),
        };
        self.types.insert(key.to_string(), t);
        self.pools.entry(t).or_default();
        t
    }

    pub fn register_operation(&mut self, key: &str, sign: &str) -> Operation {
        let op = Operation {
            sign: self.symbols.to_sym(sign),
        };
        self.operations.insert(key.to_string(), op);
        op
    }

    pub fn type_(&self, key: &str) -> Result<ValueType, SynthesisError> {
        self.types
            .get(key)
            .copied()
            .ok_or_else(|| SynthesisError::UnknownSymbol {
                kind: SymbolKind::Type,
                name: key.to_string(),
            })
    }

    pub fn operation(&self, key: &str) -> Result<Operation, SynthesisError> {
        self.operations
            .get(key)
            .copied()
            .ok_or_else(|| SynthesisError::UnknownSymbol {
                kind: SymbolKind::Operation,
                name: key.to_string(),
            })
    }

    /// Create a variable and append it to the pool of its type.
    pub fn declare_variable(&mut self, type_: ValueType, name: &str) -> VarId {
        let name = self.symbols.to_sym(name);
        let id = self.variables.alloc(Variable { name, type_ });
        self.pools.entry(type_).or_default().push(id);
        id
    }

    /// Variables of `type_` in the order they were declared.
    pub fn variables_of(&self, type_: ValueType) -> &[VarId] {
        self.pools.get(&type_).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    /// Declare a function without a body so later bodies can call it.
    pub fn declare_function(
        &mut self,
        return_type: ValueType,
        name: &str,
        params: Vec<VarId>,
    ) -> FuncId {
        trace!(name, arity = params.len(), "declaring function");
        let name = self.symbols.to_sym(name);
        self.functions.alloc(Function::new(return_type, name, params))
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id]
    }

    pub fn set_body(&mut self, id: FuncId, body: Block) {
        self.functions[id].body = Some(body);
    }

    /// Arity-checked call expression.
    pub fn call(&self, callee: FuncId, args: Vec<Expr>) -> Result<Expr, SynthesisError> {
        FunctionCall::new(self, callee, args).map(Expr::Call)
    }

    pub fn name(&self, sym: Symbol) -> &str {
        self.symbols.from_sym(sym)
    }

    pub fn var_name(&self, id: VarId) -> &str {
        self.name(self.variables[id].name)
    }
}

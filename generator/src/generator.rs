use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SymbolKind, SynthesisError};
use crate::session::Session;
use crate::tree::{Block, Declarator, Expr, FuncId, Place, Stmt, VarId};

pub type RNG = rand::rngs::StdRng;

/// The five statement shapes a function body is built from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatementKind {
    GuardedCall,
    CountedLoop,
    ConditionedLoop,
    Read,
    Write,
}

impl StatementKind {
    pub const ALL: [StatementKind; 5] = [
        StatementKind::GuardedCall,
        StatementKind::CountedLoop,
        StatementKind::ConditionedLoop,
        StatementKind::Read,
        StatementKind::Write,
    ];

    /// Uniform choice among all kinds.
    pub fn random(rng: &mut RNG) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Functions share an `int*` array parameter for reads and writes.
    #[default]
    Tree,
    /// Reads and writes go through files on disk.
    Flat,
}

/// Variables every generated function refers to, declared once per session.
#[derive(Copy, Clone, Debug)]
pub struct Roles {
    pub arg: VarId,
    pub sum: VarId,
    pub counter: VarId,
    pub arr: Option<VarId>,
}

impl Roles {
    /// Resolve roles by position in the per-type pools: `arg`, `sum` and
    /// the loop counter are the first three `int` variables, `arr` the first
    /// `array` variable if there is one.
    pub fn from_pools(session: &Session) -> Result<Self, SynthesisError> {
        let ints = session.variables_of(session.type_("int")?);
        let role = |position: usize, name: &str| {
            ints.get(position)
                .copied()
                .ok_or_else(|| SynthesisError::UnknownSymbol {
                    kind: SymbolKind::Variable,
                    name: name.to_string(),
                })
        };
        Ok(Self {
            arg: role(0, "arg")?,
            sum: role(1, "sum")?,
            counter: role(2, "i")?,
            arr: session.variables_of(session.type_("array")?).first().copied(),
        })
    }
}

/// Register the `int` role variables in pool order.
fn declare_int_roles(session: &mut Session) -> Result<(), SynthesisError> {
    let int = session.type_("int")?;
    for name in ["arg", "sum", "i"] {
        session.declare_variable(int, name);
    }
    Ok(())
}

/// A file the generated program expects to find in its working directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuxFile {
    pub name: String,
    pub contents: String,
}

/// The parts of body generation that differ between strategies. The shared
/// generation loop lives in the synthesizer.
pub trait StatementStrategy {
    fn roles(&mut self, session: &mut Session) -> Result<Roles, SynthesisError>;

    /// Parameters of every `test_K` function.
    fn params(&self, roles: &Roles) -> Vec<VarId>;

    /// Fixed helpers emitted ahead of the generated functions.
    fn helpers(&mut self, _session: &mut Session) -> Result<Vec<FuncId>, SynthesisError> {
        Ok(Vec::new())
    }

    /// Arguments for a recursive call, given the adjusted `arg` value.
    fn call_args(&self, roles: &Roles, adjusted: Expr) -> Vec<Expr>;

    fn loop_guard(&self, session: &Session, roles: &Roles) -> Result<Expr, SynthesisError>;

    fn read(
        &mut self,
        session: &Session,
        roles: &Roles,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Stmt, SynthesisError>;

    /// Store the result of `call` somewhere observable.
    fn write(
        &mut self,
        session: &Session,
        roles: &Roles,
        call: Expr,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Stmt, SynthesisError>;

    /// Declarations placed in `main` after `int sum = 0;`.
    fn driver_prelude(
        &mut self,
        _session: &Session,
        _roles: &Roles,
        _size: usize,
        _rng: &mut RNG,
    ) -> Result<Vec<Stmt>, SynthesisError> {
        Ok(Vec::new())
    }

    fn auxiliary_files(&mut self) -> Vec<AuxFile> {
        Vec::new()
    }
}

fn positive(session: &Session, v: VarId) -> Result<Expr, SynthesisError> {
    Ok(Expr::binary(
        Expr::var(v),
        session.operation("gt")?,
        Expr::Int(0),
    ))
}

fn array_role(roles: &Roles) -> Result<VarId, SynthesisError> {
    roles.arr.ok_or_else(|| SynthesisError::UnknownSymbol {
        kind: SymbolKind::Type,
        name: "array".to_string(),
    })
}

/// Functions take `(int arg, int* arr)`; reads and writes index into `arr`,
/// which `main` initializes with `size * size` random values.
#[derive(Debug, Default)]
pub struct TreeStrategy;

impl TreeStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl StatementStrategy for TreeStrategy {
    fn roles(&mut self, session: &mut Session) -> Result<Roles, SynthesisError> {
        declare_int_roles(session)?;
        let array = session.type_("array")?;
        session.declare_variable(array, "arr");
        Roles::from_pools(session)
    }

    fn params(&self, roles: &Roles) -> Vec<VarId> {
        let mut params = vec![roles.arg];
        params.extend(roles.arr);
        params
    }

    fn call_args(&self, roles: &Roles, adjusted: Expr) -> Vec<Expr> {
        let mut args = vec![adjusted];
        args.extend(roles.arr.map(Expr::var));
        args
    }

    fn loop_guard(&self, session: &Session, roles: &Roles) -> Result<Expr, SynthesisError> {
        positive(session, roles.arg)
    }

    fn read(
        &mut self,
        session: &Session,
        roles: &Roles,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Stmt, SynthesisError> {
        let arr = array_role(roles)?;
        let index = rng.random_range(0..size * size) as i64;
        Ok(Stmt::assign(
            roles.sum,
            Some(session.operation("sum")?),
            Expr::indexed(arr, Expr::Int(index)),
        ))
    }

    fn write(
        &mut self,
        session: &Session,
        roles: &Roles,
        call: Expr,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Stmt, SynthesisError> {
        let arr = array_role(roles)?;
        let index = rng.random_range(0..size * size) as i64;
        let store = Stmt::Assign {
            to: Place::Indexed {
                base: arr,
                index: Box::new(Expr::Int(index)),
            },
            op: Some(session.operation("sum")?),
            value: call,
        };
        Ok(Stmt::branch(positive(session, roles.arg)?, vec![store]))
    }

    fn driver_prelude(
        &mut self,
        session: &Session,
        roles: &Roles,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Vec<Stmt>, SynthesisError> {
        let arr = array_role(roles)?;
        let bound = (size * size) as i64;
        let values: Vec<String> = (0..size * size)
            .map(|_| rng.random_range(0..=bound).to_string())
            .collect();
        Ok(vec![Stmt::Declaration {
            type_: session.type_("int")?,
            declarator: Declarator::Array(arr),
            init: Expr::literal(format!("{{{}}}", values.join(", "))),
        }])
    }
}

const READ_HELPER: &str = "read_input";
const WRITE_HELPER: &str = "write_output";

/// Functions take `(int arg)`; reads sum the integers of a numbered input
/// file and writes append a line to a named output file. Each distinct input
/// index gets a backing file of `size` random lines.
#[derive(Debug, Default)]
pub struct FlatStrategy {
    read_helper: Option<FuncId>,
    write_helper: Option<FuncId>,
    inputs: BTreeMap<usize, AuxFile>,
}

impl FlatStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn helper(id: Option<FuncId>, name: &str) -> Result<FuncId, SynthesisError> {
        id.ok_or_else(|| SynthesisError::UnknownSymbol {
            kind: SymbolKind::Function,
            name: name.to_string(),
        })
    }

    fn input_file(&mut self, index: usize, size: usize, rng: &mut RNG) -> &AuxFile {
        self.inputs.entry(index).or_insert_with(|| {
            let bound = (size * size) as i64;
            let mut contents = String::new();
            for _ in 0..size {
                contents.push_str(&rng.random_range(0..=bound).to_string());
                contents.push('\n');
            }
            AuxFile {
                name: index.to_string(),
                contents,
            }
        })
    }
}

impl StatementStrategy for FlatStrategy {
    fn roles(&mut self, session: &mut Session) -> Result<Roles, SynthesisError> {
        declare_int_roles(session)?;
        Roles::from_pools(session)
    }

    fn params(&self, roles: &Roles) -> Vec<VarId> {
        vec![roles.arg]
    }

    fn helpers(&mut self, session: &mut Session) -> Result<Vec<FuncId>, SynthesisError> {
        let int = session.type_("int")?;
        let string = session.type_("string")?;
        let void = session.type_("void")?;
        let plus = session.operation("sum")?;

        let path = session.declare_variable(string, "path");
        let value = session.declare_variable(int, "value");
        let total = session.declare_variable(int, "total");

        let read = session.declare_function(int, READ_HELPER, vec![path]);
        let read_body = Block::new(vec![
            Stmt::raw(format!(
                "FILE* f = fopen({}, \"r\");",
                session.var_name(path)
            )),
            Stmt::branch(Expr::literal("f == NULL"), vec![Stmt::Return(Expr::Int(0))]),
            Stmt::declare(int, total, Expr::Int(0)),
            Stmt::declare(int, value, Expr::Int(0)),
            Stmt::While {
                condition: Expr::literal(format!(
                    "fscanf(f, \"%d\", &{}) == 1",
                    session.var_name(value)
                )),
                body: Block::new(vec![Stmt::assign(total, Some(plus), Expr::var(value))]),
            },
            Stmt::raw("fclose(f);"),
            Stmt::Return(Expr::var(total)),
        ]);
        session.set_body(read, read_body);

        let write = session.declare_function(void, WRITE_HELPER, vec![path, value]);
        let write_body = Block::new(vec![
            Stmt::raw(format!(
                "FILE* f = fopen({}, \"a\");",
                session.var_name(path)
            )),
            Stmt::branch(Expr::literal("f == NULL"), vec![Stmt::raw("return;")]),
            Stmt::raw(format!(
                "fprintf(f, \"%d\\n\", {});",
                session.var_name(value)
            )),
            Stmt::raw("fclose(f);"),
        ]);
        session.set_body(write, write_body);

        self.read_helper = Some(read);
        self.write_helper = Some(write);
        Ok(vec![read, write])
    }

    fn call_args(&self, _roles: &Roles, adjusted: Expr) -> Vec<Expr> {
        vec![adjusted]
    }

    fn loop_guard(&self, session: &Session, roles: &Roles) -> Result<Expr, SynthesisError> {
        positive(session, roles.sum)
    }

    fn read(
        &mut self,
        session: &Session,
        roles: &Roles,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Stmt, SynthesisError> {
        let helper = Self::helper(self.read_helper, READ_HELPER)?;
        let index = rng.random_range(0..size);
        let name = self.input_file(index, size, rng).name.clone();
        let call = session.call(helper, vec![Expr::literal(format!("\"{name}\""))])?;
        Ok(Stmt::assign(
            roles.sum,
            Some(session.operation("sum")?),
            call,
        ))
    }

    fn write(
        &mut self,
        session: &Session,
        roles: &Roles,
        call: Expr,
        size: usize,
        rng: &mut RNG,
    ) -> Result<Stmt, SynthesisError> {
        let helper = Self::helper(self.write_helper, WRITE_HELPER)?;
        let sink = format!("\"out_{}\"", rng.random_range(0..size));
        let emit = session.call(helper, vec![Expr::literal(sink), call])?;
        Ok(Stmt::branch(
            positive(session, roles.arg)?,
            vec![Stmt::Expr(emit)],
        ))
    }

    fn auxiliary_files(&mut self) -> Vec<AuxFile> {
        std::mem::take(&mut self.inputs).into_values().collect()
    }
}

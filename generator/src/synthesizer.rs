use std::fs;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emit::{Emit, Prototype};
use crate::error::SynthesisError;
use crate::generator::{AuxFile, Roles, StatementKind, StatementStrategy, StrategyKind, RNG};
use crate::session::Session;
use crate::tree::{Block, Expr, FuncId, Stmt};

const HEADERS: [&str; 2] = ["stdio", "stdlib"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub strategy: StrategyKind,
    /// Number of `test_K` functions.
    pub functions: usize,
    /// Statements per function body; defaults to `functions`.
    pub statements: Option<usize>,
    /// Fixed seed for reproducible output.
    pub seed: Option<u64>,
}

impl SynthesisConfig {
    pub fn new(strategy: StrategyKind, functions: usize) -> Self {
        Self {
            strategy,
            functions,
            ..Self::default()
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, SynthesisError> {
        Ok(toml::from_str(s)?)
    }

    pub fn budget(&self) -> usize {
        self.statements.unwrap_or(self.functions)
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Tree,
            functions: 4,
            statements: None,
            seed: None,
        }
    }
}

/// A rendered program and the input files it reads at runtime.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    pub source: String,
    pub aux_files: Vec<AuxFile>,
}

impl Program {
    /// Write `<name>.c` and every auxiliary file into `dir`, returning the
    /// path of the source file.
    pub fn write_to(&self, dir: &Path, name: &str) -> Result<PathBuf, SynthesisError> {
        let path = dir.join(format!("{name}.c"));
        fs::write(&path, &self.source)?;
        for aux in &self.aux_files {
            fs::write(dir.join(&aux.name), &aux.contents)?;
        }
        Ok(path)
    }
}

pub struct ProgramSynthesizer<S: StatementStrategy> {
    rng: RNG,
    config: SynthesisConfig,
    strategy: S,
}

impl<S: StatementStrategy> ProgramSynthesizer<S> {
    pub fn new(config: SynthesisConfig, strategy: S) -> Self {
        let rng = match config.seed {
            Some(seed) => RNG::seed_from_u64(seed),
            None => RNG::from_os_rng(),
        };
        Self {
            rng,
            config,
            strategy,
        }
    }

    /// Build one program. The session lives only for the duration of this
    /// call.
    pub fn synthesize(&mut self) -> Result<Program, SynthesisError> {
        let size = self.config.functions;
        if size == 0 {
            return Err(SynthesisError::InvalidSize);
        }
        let budget = self.config.budget();

        let mut session = Session::with_c_types();
        let roles = self.strategy.roles(&mut session)?;
        let int = session.type_("int")?;

        // Every stub exists before any body is built, so calls may point
        // forwards and back.
        let params = self.strategy.params(&roles);
        let tests: Vec<FuncId> = (0..size)
            .map(|k| session.declare_function(int, &format!("test_{k}"), params.clone()))
            .collect();
        let helpers = self.strategy.helpers(&mut session)?;

        for (number, &id) in tests.iter().enumerate() {
            let body = self.function_body(&session, &roles, &tests, number, budget)?;
            debug!(function = number, statements = body.body.len(), "filled body");
            session.set_body(id, body);
        }

        let driver = self.driver(&mut session, &roles, &tests)?;
        let source = assemble(&session, &tests, &helpers, driver)?;
        let aux_files = self.strategy.auxiliary_files();
        info!(
            functions = size,
            bytes = source.len(),
            aux_files = aux_files.len(),
            "synthesized program"
        );
        Ok(Program { source, aux_files })
    }

    fn random_call(
        &mut self,
        session: &Session,
        roles: &Roles,
        tests: &[FuncId],
        adjusted: Expr,
    ) -> Result<Expr, SynthesisError> {
        let callee = tests[self.rng.random_range(0..tests.len())];
        session.call(callee, self.strategy.call_args(roles, adjusted))
    }

    fn function_body(
        &mut self,
        session: &Session,
        roles: &Roles,
        tests: &[FuncId],
        number: usize,
        budget: usize,
    ) -> Result<Block, SynthesisError> {
        let int = session.type_("int")?;
        let plus = session.operation("sum")?;
        let minus = session.operation("dif")?;
        let div = session.operation("div")?;
        let gt = session.operation("gt")?;
        let arg = Expr::var(roles.arg);
        let size = tests.len();

        let mut body = vec![
            Stmt::raw(format!(
                "printf(\"func {number} {} %d\\n\", {});",
                session.var_name(roles.arg),
                session.var_name(roles.arg)
            )),
            Stmt::raw("fflush(stdout);"),
            Stmt::declare(int, roles.sum, Expr::Int(0)),
        ];

        for _ in 0..budget {
            let stmt = match StatementKind::random(&mut self.rng) {
                StatementKind::GuardedCall => {
                    let call = self.random_call(
                        session,
                        roles,
                        tests,
                        Expr::binary(arg.clone(), minus, Expr::Int(1)),
                    )?;
                    Stmt::branch(
                        Expr::binary(arg.clone(), gt, Expr::Int(0)),
                        vec![Stmt::assign(roles.sum, None, call)],
                    )
                }
                StatementKind::CountedLoop => {
                    let i = roles.counter;
                    let call = self.random_call(
                        session,
                        roles,
                        tests,
                        Expr::binary(arg.clone(), minus, Expr::var(i)),
                    )?;
                    Stmt::For {
                        init: Box::new(Stmt::declare(int, i, Expr::Int(1))),
                        condition: Expr::binary(Expr::var(roles.sum), gt, Expr::var(i)),
                        step: Box::new(Stmt::assign(i, Some(plus), Expr::Int(1))),
                        body: Block::new(vec![Stmt::assign(roles.sum, Some(plus), call)]),
                    }
                }
                StatementKind::ConditionedLoop => {
                    let call = self.random_call(
                        session,
                        roles,
                        tests,
                        Expr::binary(arg.clone(), minus, Expr::Int(1)),
                    )?;
                    Stmt::While {
                        condition: self.strategy.loop_guard(session, roles)?,
                        body: Block::new(vec![Stmt::assign(roles.sum, Some(plus), call)]),
                    }
                }
                StatementKind::Read => self.strategy.read(session, roles, size, &mut self.rng)?,
                StatementKind::Write => {
                    let call = self.random_call(
                        session,
                        roles,
                        tests,
                        Expr::binary(arg.clone(), div, Expr::Int(2)),
                    )?;
                    self.strategy
                        .write(session, roles, call, size, &mut self.rng)?
                }
            };
            body.push(stmt);
        }

        body.push(Stmt::Return(Expr::var(roles.sum)));
        Ok(Block::new(body))
    }

    /// `main`: accumulate `size` calls into randomly chosen functions.
    fn driver(
        &mut self,
        session: &mut Session,
        roles: &Roles,
        tests: &[FuncId],
    ) -> Result<FuncId, SynthesisError> {
        let int = session.type_("int")?;
        let plus = session.operation("sum")?;
        let size = tests.len();
        let bound = (size * size) as i64;

        let mut body = vec![Stmt::declare(int, roles.sum, Expr::Int(0))];
        body.extend(
            self.strategy
                .driver_prelude(session, roles, size, &mut self.rng)?,
        );
        for _ in 0..size {
            let start = Expr::Int(self.rng.random_range(0..=bound));
            let call = self.random_call(session, roles, tests, start)?;
            body.push(Stmt::assign(roles.sum, Some(plus), call));
        }
        body.push(Stmt::Return(Expr::var(roles.sum)));

        let main = session.declare_function(int, "main", Vec::new());
        session.set_body(main, Block::new(body));
        Ok(main)
    }
}

/// Headers, forward declarations, helpers, generated functions and `main`,
/// separated by blank lines.
fn assemble(
    session: &Session,
    tests: &[FuncId],
    helpers: &[FuncId],
    driver: FuncId,
) -> Result<String, SynthesisError> {
    let mut sections: Vec<String> = HEADERS
        .iter()
        .map(|lib| format!("#include <{lib}.h>"))
        .collect();
    sections.extend(
        tests
            .iter()
            .map(|id| Prototype(session.function(*id)).emit(session)),
    );
    for id in helpers.iter().chain(tests).chain(std::iter::once(&driver)) {
        let f = session.function(*id);
        if f.body.is_none() {
            return Err(SynthesisError::MissingBody(session.name(f.name).to_string()));
        }
        sections.push(f.emit(session));
    }
    let mut source = sections.join("\n\n");
    source.push('\n');
    Ok(source)
}

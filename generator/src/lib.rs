mod emit;
mod error;
mod generator;
mod session;
mod symbol;
mod synthesizer;
mod tree;

pub use crate::emit::{Emit, Emitter, Prototype};
pub use crate::error::{SymbolKind, SynthesisError};
pub use crate::generator::{
    AuxFile, FlatStrategy, Roles, StatementKind, StatementStrategy, StrategyKind, TreeStrategy,
};
pub use crate::session::Session;
pub use crate::symbol::{Symbol, SymbolTable};
pub use crate::synthesizer::{Program, ProgramSynthesizer, SynthesisConfig};
pub use crate::tree::{
    Block, Declarator, Expr, FuncId, Function, FunctionCall, Operation, Place, Stmt, ValueType,
    VarId, Variable,
};

pub fn generate_with_config(config: SynthesisConfig) -> Result<Program, SynthesisError> {
    match config.strategy {
        StrategyKind::Tree => ProgramSynthesizer::new(config, TreeStrategy::new()).synthesize(),
        StrategyKind::Flat => ProgramSynthesizer::new(config, FlatStrategy::new()).synthesize(),
    }
}

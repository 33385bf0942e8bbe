pub mod config;
pub mod filter;
pub mod logging;
pub mod oracle;
pub mod pipeline;
pub mod run;

pub use crate::config::{CommandConfig, FilterConfig};
pub use crate::filter::{Gates, Rejection};
pub use crate::oracle::{
    Canonicalizer, CommandCanonicalizer, CompileOutcome, CompilerOracle, SystemCompiler,
};
pub use crate::pipeline::{Outcome, SeedFilter, Summary};

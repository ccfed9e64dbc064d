//! External path optimizer integration.

pub mod invoker;
pub mod runner;

pub use invoker::{SolverInvoker, SolverLayout};
pub use runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};

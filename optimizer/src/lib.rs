// Optimizer module: function-level rewriting passes and the pipeline machinery
//
// Module organization:
// - pass.rs: FunctionPass trait, per-run PassContext, FunctionPassManager
// - mul_shift.rs: multiplication-by-power-of-two → left shift, plus its reporter
// - hello.rs: hello-world visitor pass
// - pipeline.rs: pipeline string → configured pass manager
// - utils.rs: power-of-two helpers

mod hello;
mod mul_shift;
mod pass;
mod pipeline;
mod utils;

pub use hello::HelloWorld;
pub use mul_shift::{MultiplicationShifts, MultiplicationShiftsPrinter, rewrite_multiplications};
pub use pass::{FunctionPass, FunctionPassManager, PassContext};
pub use pipeline::parse_pipeline;

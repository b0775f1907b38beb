// IR substrate shared by the reader, the passes, and the driver
//
// Module organization:
// - types.rs: core IR types (values, instructions, blocks, functions) and use queries
// - display.rs: the textual form, the inverse of what `reader` accepts
// - builder.rs: FunctionBuilder for constructing functions in code
// - verify.rs: structural invariant checks
// - interp.rs: bounded reference interpreter

mod builder;
mod display;
mod interp;
mod types;
mod verify;

pub use builder::FunctionBuilder;
pub use interp::{DEFAULT_FUEL, Interp, eval_function};
pub use types::{
    BasicBlock, BinOp, BlockId, Function, Instruction, Module, Operand, Terminator, Ty, VarId,
};
pub use verify::{Site, verify, verify_located, verify_module};

// Programmatic function construction, mostly for tests and tools.

use crate::types::{BasicBlock, BinOp, BlockId, Function, Instruction, Operand, Terminator, Ty, VarId};
use crate::verify::verify;

/// Builds a [`Function`] block by block.
///
/// `block` opens a new block and makes it current; instruction methods
/// append to the current block and return the defined variable. Blocks
/// start with an `unreachable` terminator until one of the terminator
/// methods replaces it.
pub struct FunctionBuilder {
    func: Function,
    current_block: Option<BlockId>,
}

impl FunctionBuilder {
    pub fn new(name: &str, ret_ty: Option<Ty>) -> Self {
        Self {
            func: Function {
                name: name.to_string(),
                params: Vec::new(),
                ret_ty,
                blocks: Vec::new(),
                next_var: 0,
            },
            current_block: None,
        }
    }

    /// Declare a parameter and return its variable.
    pub fn param(&mut self, ty: Ty) -> VarId {
        let var = self.func.new_var();
        self.func.params.push((ty, var));
        var
    }

    /// Create a new basic block and make it the current one.
    pub fn block(&mut self) -> BlockId {
        let id = BlockId(self.func.blocks.len());
        self.func.blocks.push(BasicBlock {
            id,
            instructions: Vec::new(),
            terminator: Terminator::Unreachable,
        });
        self.current_block = Some(id);
        id
    }

    /// Make an already-created block the current one.
    pub fn switch_to(&mut self, block: BlockId) {
        assert!(block.0 < self.func.blocks.len(), "no such block {block}");
        self.current_block = Some(block);
    }

    pub fn binary(&mut self, op: BinOp, ty: Ty, lhs: Operand, rhs: Operand) -> VarId {
        let dest = self.func.new_var();
        self.push(Instruction::Binary { dest, op, lhs, rhs, ty });
        dest
    }

    pub fn copy(&mut self, ty: Ty, src: Operand) -> VarId {
        let dest = self.func.new_var();
        self.push(Instruction::Copy { dest, src, ty });
        dest
    }

    pub fn call(&mut self, callee: &str, args: Vec<Operand>) -> VarId {
        let dest = self.func.new_var();
        self.push(Instruction::Call {
            dest: Some(dest),
            callee: callee.to_string(),
            args,
        });
        dest
    }

    pub fn call_void(&mut self, callee: &str, args: Vec<Operand>) {
        self.push(Instruction::Call {
            dest: None,
            callee: callee.to_string(),
            args,
        });
    }

    pub fn ret(&mut self, value: Option<Operand>) {
        self.terminate(Terminator::Ret(value));
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn cbr(&mut self, cond: Operand, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    /// Finish and return the function.
    ///
    /// Panics in debug builds if the result does not verify; the builder
    /// cannot misplace block ids, so that means a use of an undefined
    /// variable or a terminator mismatch at the call site.
    pub fn finish(self) -> Function {
        debug_assert!(
            verify(&self.func).is_ok(),
            "built an invalid function: {:?}",
            verify(&self.func).err()
        );
        self.func
    }

    fn push(&mut self, inst: Instruction) {
        self.current_mut().instructions.push(inst);
    }

    fn terminate(&mut self, terminator: Terminator) {
        self.current_mut().terminator = terminator;
    }

    fn current_mut(&mut self) -> &mut BasicBlock {
        let id = self
            .current_block
            .expect("no current block; call block() first");
        &mut self.func.blocks[id.0]
    }
}

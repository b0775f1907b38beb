// Reference interpreter for whole modules: checks that a rewritten function
// computes the same values as the original. Execution is bounded by a step
// budget and a call-depth limit, so it always terminates with a value or an
// error.

use std::collections::HashMap;

use crate::types::{BasicBlock, BlockId, Function, Instruction, Module, Operand, Terminator, VarId};

/// Default step budget for one top-level call.
pub const DEFAULT_FUEL: u64 = 1 << 20;

const MAX_CALL_DEPTH: usize = 64;

pub struct Interp<'a> {
    module: &'a Module,
    fuel: u64,
}

impl<'a> Interp<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self::with_fuel(module, DEFAULT_FUEL)
    }

    pub fn with_fuel(module: &'a Module, fuel: u64) -> Self {
        Self { module, fuel }
    }

    /// Run `name` on `args`. Arguments wrap to the parameter widths.
    /// Returns the function's value, or `None` for a function without a
    /// return type.
    pub fn call(&mut self, name: &str, args: &[i64]) -> Result<Option<i64>, String> {
        self.call_at_depth(name, args, 0)
    }

    fn call_at_depth(
        &mut self,
        name: &str,
        args: &[i64],
        depth: usize,
    ) -> Result<Option<i64>, String> {
        if depth > MAX_CALL_DEPTH {
            return Err(format!("call depth limit exceeded in '@{name}'"));
        }
        let module: &'a Module = self.module;
        let func = module
            .function(name)
            .ok_or_else(|| format!("call to unknown function '@{name}'"))?;
        if args.len() != func.params.len() {
            return Err(format!(
                "@{}: expected {} arguments, got {}",
                func.name,
                func.params.len(),
                args.len()
            ));
        }

        let mut env: HashMap<VarId, i64> = HashMap::new();
        for ((ty, var), value) in func.params.iter().zip(args) {
            env.insert(*var, ty.wrap(*value));
        }

        let mut block = func
            .blocks
            .first()
            .ok_or_else(|| format!("@{}: function has no blocks", func.name))?;
        loop {
            for inst in &block.instructions {
                self.spend(func)?;
                self.exec(func, inst, &mut env, depth)?;
            }

            self.spend(func)?;
            match &block.terminator {
                Terminator::Ret(None) => return Ok(None),
                Terminator::Ret(Some(value)) => {
                    let v = read(&env, value)?;
                    return Ok(Some(match func.ret_ty {
                        Some(ty) => ty.wrap(v),
                        None => v,
                    }));
                }
                Terminator::Br(target) => {
                    block = branch_target(func, *target)?;
                }
                Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                } => {
                    let taken = if read(&env, cond)? != 0 {
                        *then_block
                    } else {
                        *else_block
                    };
                    block = branch_target(func, taken)?;
                }
                Terminator::Unreachable => {
                    return Err(format!("@{}: reached 'unreachable'", func.name));
                }
            }
        }
    }

    fn exec(
        &mut self,
        func: &Function,
        inst: &Instruction,
        env: &mut HashMap<VarId, i64>,
        depth: usize,
    ) -> Result<(), String> {
        match inst {
            Instruction::Binary { dest, op, lhs, rhs, ty } => {
                let l = read(env, lhs)?;
                let r = read(env, rhs)?;
                let value = op.eval(l, r, *ty).ok_or_else(|| {
                    format!(
                        "@{}: '{} {} {}, {}' has no defined result",
                        func.name, op, ty, l, r
                    )
                })?;
                env.insert(*dest, value);
            }
            Instruction::Copy { dest, src, ty } => {
                let value = ty.wrap(read(env, src)?);
                env.insert(*dest, value);
            }
            Instruction::Call { dest, callee, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(read(env, arg)?);
                }
                let result = self.call_at_depth(callee, &values, depth + 1)?;
                if let Some(dest) = dest {
                    let value = result.ok_or_else(|| {
                        format!("@{}: void call to '@{callee}' used as a value", func.name)
                    })?;
                    env.insert(*dest, value);
                }
            }
        }
        Ok(())
    }

    fn spend(&mut self, func: &Function) -> Result<(), String> {
        if self.fuel == 0 {
            return Err(format!("@{}: step budget exhausted", func.name));
        }
        self.fuel -= 1;
        Ok(())
    }
}

/// One-shot convenience wrapper over [`Interp`].
pub fn eval_function(module: &Module, name: &str, args: &[i64]) -> Result<Option<i64>, String> {
    Interp::new(module).call(name, args)
}

fn read(env: &HashMap<VarId, i64>, op: &Operand) -> Result<i64, String> {
    match op {
        Operand::Const(value) => Ok(*value),
        Operand::Var(var) => env
            .get(var)
            .copied()
            .ok_or_else(|| format!("{var} read before definition")),
    }
}

fn branch_target(func: &Function, target: BlockId) -> Result<&BasicBlock, String> {
    func.blocks
        .get(target.0)
        .ok_or_else(|| format!("@{}: branch to unknown block {}", func.name, target))
}

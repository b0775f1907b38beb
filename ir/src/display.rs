// Textual form of the IR. The reader parses exactly what these impls print.

use std::fmt;

use crate::types::{BasicBlock, BinOp, BlockId, Function, Instruction, Module, Operand, Terminator, Ty, VarId};

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(value) => write!(f, "{value}"),
            Operand::Var(var) => write!(f, "{var}"),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { dest, op, lhs, rhs, ty } => {
                write!(f, "{dest} = {op} {ty} {lhs}, {rhs}")
            }
            Instruction::Copy { dest, src, ty } => write!(f, "{dest} = copy {ty} {src}"),
            Instruction::Call { dest, callee, args } => {
                if let Some(dest) = dest {
                    write!(f, "{dest} = ")?;
                }
                write!(f, "call @{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Br(target) => write!(f, "br {target}"),
            Terminator::CondBr { cond, then_block, else_block } => {
                write!(f, "cbr {cond}, {then_block}, {else_block}")
            }
            Terminator::Ret(Some(value)) => write!(f, "ret {value}"),
            Terminator::Ret(None) => write!(f, "ret"),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.id)?;
        for inst in &self.instructions {
            writeln!(f, "  {inst}")?;
        }
        writeln!(f, "  {}", self.terminator)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func @{}(", self.name)?;
        for (i, (ty, var)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var}: {ty}")?;
        }
        write!(f, ")")?;
        if let Some(ty) = self.ret_ty {
            write!(f, " -> {ty}")?;
        }
        writeln!(f, " {{")?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{func}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{BinOp, Instruction, Operand, Terminator, Ty, VarId};

    #[test]
    fn binary_instruction_form() {
        let inst = Instruction::Binary {
            dest: VarId(3),
            op: BinOp::Shl,
            lhs: Operand::Var(VarId(0)),
            rhs: Operand::Const(3),
            ty: Ty::I32,
        };
        assert_eq!(inst.to_string(), "%3 = shl i32 %0, 3");
    }

    #[test]
    fn call_forms() {
        let with_dest = Instruction::Call {
            dest: Some(VarId(5)),
            callee: "twice".to_string(),
            args: vec![Operand::Var(VarId(1)), Operand::Const(-2)],
        };
        assert_eq!(with_dest.to_string(), "%5 = call @twice(%1, -2)");

        let void = Instruction::Call {
            dest: None,
            callee: "emit".to_string(),
            args: vec![],
        };
        assert_eq!(void.to_string(), "call @emit()");
    }

    #[test]
    fn terminator_forms() {
        assert_eq!(Terminator::Ret(None).to_string(), "ret");
        assert_eq!(
            Terminator::Ret(Some(Operand::Const(0))).to_string(),
            "ret 0"
        );
        assert_eq!(
            Terminator::CondBr {
                cond: Operand::Var(VarId(2)),
                then_block: crate::types::BlockId(1),
                else_block: crate::types::BlockId(2),
            }
            .to_string(),
            "cbr %2, bb1, bb2"
        );
    }
}

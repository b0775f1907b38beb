/// Integer widths carried by values and instructions
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    I8,
    I16,
    I32,
    I64,
}

impl Ty {
    pub fn bits(self) -> u32 {
        match self {
            Ty::I8 => 8,
            Ty::I16 => 16,
            Ty::I32 => 32,
            Ty::I64 => 64,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ty::I8 => "i8",
            Ty::I16 => "i16",
            Ty::I32 => "i32",
            Ty::I64 => "i64",
        }
    }

    pub fn from_name(name: &str) -> Option<Ty> {
        match name {
            "i8" => Some(Ty::I8),
            "i16" => Some(Ty::I16),
            "i32" => Some(Ty::I32),
            "i64" => Some(Ty::I64),
            _ => None,
        }
    }

    /// Truncate to this width and sign-extend back to i64.
    pub fn wrap(self, value: i64) -> i64 {
        let sh = 64 - self.bits();
        (value << sh) >> sh
    }

    /// True if `value` is representable at this width.
    pub fn fits(self, value: i64) -> bool {
        self.wrap(value) == value
    }
}

/// Variable identifier in IR
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Basic block identifier in IR
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// Operand in IR instructions - a constant or a variable reference
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Operand {
    Const(i64),
    Var(VarId),
}

/// Two-operand integer operations
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Rem => "rem",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::Shr => "shr",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<BinOp> {
        match name {
            "add" => Some(BinOp::Add),
            "sub" => Some(BinOp::Sub),
            "mul" => Some(BinOp::Mul),
            "div" => Some(BinOp::Div),
            "rem" => Some(BinOp::Rem),
            "and" => Some(BinOp::And),
            "or" => Some(BinOp::Or),
            "xor" => Some(BinOp::Xor),
            "shl" => Some(BinOp::Shl),
            "shr" => Some(BinOp::Shr),
            _ => None,
        }
    }

    /// Evaluate at the given width with two's-complement wrapping.
    ///
    /// Division and remainder are signed. `Shr` is an arithmetic shift.
    /// Returns `None` for division or remainder by zero and for shift
    /// amounts outside `0..bits`.
    pub fn eval(self, lhs: i64, rhs: i64, ty: Ty) -> Option<i64> {
        let lhs = ty.wrap(lhs);
        let rhs = ty.wrap(rhs);
        let raw = match self {
            BinOp::Add => lhs.wrapping_add(rhs),
            BinOp::Sub => lhs.wrapping_sub(rhs),
            BinOp::Mul => lhs.wrapping_mul(rhs),
            BinOp::Div => {
                if rhs == 0 {
                    return None;
                }
                lhs.wrapping_div(rhs)
            }
            BinOp::Rem => {
                if rhs == 0 {
                    return None;
                }
                lhs.wrapping_rem(rhs)
            }
            BinOp::And => lhs & rhs,
            BinOp::Or => lhs | rhs,
            BinOp::Xor => lhs ^ rhs,
            BinOp::Shl => {
                if rhs < 0 || rhs >= i64::from(ty.bits()) {
                    return None;
                }
                lhs << rhs
            }
            BinOp::Shr => {
                if rhs < 0 || rhs >= i64::from(ty.bits()) {
                    return None;
                }
                lhs >> rhs
            }
        };
        Some(ty.wrap(raw))
    }
}

/// IR Instructions in SSA form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Binary {
        dest: VarId,
        op: BinOp,
        lhs: Operand,
        rhs: Operand,
        ty: Ty,
    },
    Copy {
        dest: VarId,
        src: Operand,
        ty: Ty,
    },
    Call {
        dest: Option<VarId>,
        callee: String,
        args: Vec<Operand>,
    },
}

impl Instruction {
    /// The variable this instruction defines, if any.
    pub fn dest(&self) -> Option<VarId> {
        match self {
            Instruction::Binary { dest, .. } => Some(*dest),
            Instruction::Copy { dest, .. } => Some(*dest),
            Instruction::Call { dest, .. } => *dest,
        }
    }

    pub fn for_each_operand(&self, mut f: impl FnMut(&Operand)) {
        match self {
            Instruction::Binary { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            Instruction::Copy { src, .. } => f(src),
            Instruction::Call { args, .. } => {
                for arg in args {
                    f(arg);
                }
            }
        }
    }

    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut Operand)) {
        match self {
            Instruction::Binary { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            Instruction::Copy { src, .. } => f(src),
            Instruction::Call { args, .. } => {
                for arg in args {
                    f(arg);
                }
            }
        }
    }
}

/// Control flow terminators for basic blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Option<Operand>),
    Unreachable,
}

impl Terminator {
    pub fn for_each_operand(&self, mut f: impl FnMut(&Operand)) {
        match self {
            Terminator::CondBr { cond, .. } => f(cond),
            Terminator::Ret(Some(value)) => f(value),
            Terminator::Br(_) | Terminator::Ret(None) | Terminator::Unreachable => {}
        }
    }

    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut Operand)) {
        match self {
            Terminator::CondBr { cond, .. } => f(cond),
            Terminator::Ret(Some(value)) => f(value),
            Terminator::Br(_) | Terminator::Ret(None) | Terminator::Unreachable => {}
        }
    }
}

/// Basic block with instructions and terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

/// Function in IR form. The first block is the entry block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub params: Vec<(Ty, VarId)>,
    pub ret_ty: Option<Ty>,
    pub blocks: Vec<BasicBlock>,
    /// Next unassigned variable number; all VarIds in the function are below it.
    pub next_var: usize,
}

impl Function {
    /// Allocate a fresh variable, unused anywhere in the function.
    pub fn new_var(&mut self) -> VarId {
        let id = self.next_var;
        self.next_var += 1;
        VarId(id)
    }

    /// Number of operands (instruction and terminator) reading `value`.
    pub fn count_uses(&self, value: VarId) -> usize {
        let mut count = 0;
        for block in &self.blocks {
            for inst in &block.instructions {
                inst.for_each_operand(|op| {
                    if *op == Operand::Var(value) {
                        count += 1;
                    }
                });
            }
            block.terminator.for_each_operand(|op| {
                if *op == Operand::Var(value) {
                    count += 1;
                }
            });
        }
        count
    }

    /// Point every operand reading `from` at `to` instead.
    /// Returns how many operands were redirected.
    pub fn replace_all_uses(&mut self, from: VarId, to: VarId) -> usize {
        let mut count = 0;
        for block in &mut self.blocks {
            for inst in &mut block.instructions {
                inst.for_each_operand_mut(|op| {
                    if redirect(op, from, to) {
                        count += 1;
                    }
                });
            }
            block.terminator.for_each_operand_mut(|op| {
                if redirect(op, from, to) {
                    count += 1;
                }
            });
        }
        count
    }
}

fn redirect(op: &mut Operand, from: VarId, to: VarId) -> bool {
    if let Operand::Var(v) = op {
        if *v == from {
            *v = to;
            return true;
        }
    }
    false
}

/// Complete IR program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

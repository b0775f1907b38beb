// Structural checks run after parsing and after every hand-built function.

use std::collections::HashSet;

use crate::types::{BlockId, Function, Instruction, Module, Operand, Terminator, Ty, VarId};

/// Where inside a function a structural check failed, by layout position
/// (not declared block id, which may itself be the problem).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Site {
    /// The signature line: the parameter list or the function as a whole.
    Header,
    /// The label of the block at this position.
    Block(usize),
    /// Instruction `.1` of the block at position `.0`.
    Inst(usize, usize),
    /// The terminator of the block at this position.
    Terminator(usize),
}

/// Verify the structural invariants of a function:
/// block ids match their positions, every variable is defined exactly once
/// and before any read (in layout order), branch targets exist, constants
/// fit the instruction width, and `next_var` is past every assigned id.
pub fn verify(func: &Function) -> Result<(), String> {
    verify_located(func).map_err(|(_, message)| message)
}

/// Like [`verify`], but also names the failing [`Site`], so callers that
/// know where each element came from (the reader) can point at a source
/// line.
pub fn verify_located(func: &Function) -> Result<(), (Site, String)> {
    if func.blocks.is_empty() {
        return Err((
            Site::Header,
            format!("@{}: function has no blocks", func.name),
        ));
    }
    for (i, block) in func.blocks.iter().enumerate() {
        if block.id.0 != i {
            return Err((
                Site::Block(i),
                format!(
                    "@{}: block {} declared at position {}",
                    func.name, block.id, i
                ),
            ));
        }
    }

    let mut defined: HashSet<VarId> = HashSet::new();
    let mut max_id: Option<usize> = None;

    for (_, var) in &func.params {
        max_id = Some(max_id.map_or(var.0, |m| m.max(var.0)));
        if !defined.insert(*var) {
            return Err((
                Site::Header,
                format!("@{}: parameter {} declared twice", func.name, var),
            ));
        }
    }

    for (bi, block) in func.blocks.iter().enumerate() {
        for (ii, inst) in block.instructions.iter().enumerate() {
            let at = Site::Inst(bi, ii);
            check_operands(func, block.id, &defined, |f| inst.for_each_operand(f))
                .map_err(|m| (at, m))?;
            match inst {
                Instruction::Binary { lhs, rhs, ty, .. } => {
                    check_const_width(func, block.id, lhs, *ty).map_err(|m| (at, m))?;
                    check_const_width(func, block.id, rhs, *ty).map_err(|m| (at, m))?;
                }
                Instruction::Copy { src, ty, .. } => {
                    check_const_width(func, block.id, src, *ty).map_err(|m| (at, m))?;
                }
                Instruction::Call { .. } => {}
            }
            if let Some(dest) = inst.dest() {
                max_id = Some(max_id.map_or(dest.0, |m| m.max(dest.0)));
                if !defined.insert(dest) {
                    return Err((
                        at,
                        format!(
                            "@{}: {} defined more than once ({})",
                            func.name, dest, block.id
                        ),
                    ));
                }
            }
        }

        let at = Site::Terminator(bi);
        check_operands(func, block.id, &defined, |f| {
            block.terminator.for_each_operand(f)
        })
        .map_err(|m| (at, m))?;
        match &block.terminator {
            Terminator::Br(target) => check_target(func, block.id, *target).map_err(|m| (at, m))?,
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => {
                check_target(func, block.id, *then_block).map_err(|m| (at, m))?;
                check_target(func, block.id, *else_block).map_err(|m| (at, m))?;
            }
            Terminator::Ret(value) => match (value, func.ret_ty) {
                (Some(_), None) => {
                    return Err((
                        at,
                        format!(
                            "@{}: ret carries a value but the function has no return type ({})",
                            func.name, block.id
                        ),
                    ));
                }
                (None, Some(ty)) => {
                    return Err((
                        at,
                        format!(
                            "@{}: ret without a value in a function returning {} ({})",
                            func.name, ty, block.id
                        ),
                    ));
                }
                _ => {}
            },
            Terminator::Unreachable => {}
        }
    }

    if let Some(max) = max_id {
        if func.next_var <= max {
            return Err((
                Site::Header,
                format!(
                    "@{}: next_var is {} but %{} is already assigned",
                    func.name, func.next_var, max
                ),
            ));
        }
    }

    Ok(())
}

/// Verify every function and that function names are unique.
pub fn verify_module(module: &Module) -> Result<(), String> {
    let mut names: HashSet<&str> = HashSet::new();
    for func in &module.functions {
        if !names.insert(&func.name) {
            return Err(format!("duplicate function '@{}'", func.name));
        }
        verify(func)?;
    }
    Ok(())
}

fn check_operands(
    func: &Function,
    block: BlockId,
    defined: &HashSet<VarId>,
    visit: impl FnOnce(&mut dyn FnMut(&Operand)),
) -> Result<(), String> {
    let mut undefined: Option<VarId> = None;
    visit(&mut |op| {
        if let Operand::Var(var) = op {
            if !defined.contains(var) && undefined.is_none() {
                undefined = Some(*var);
            }
        }
    });
    match undefined {
        Some(var) => Err(format!(
            "@{}: {} used before definition ({})",
            func.name, var, block
        )),
        None => Ok(()),
    }
}

fn check_const_width(
    func: &Function,
    block: BlockId,
    op: &Operand,
    ty: Ty,
) -> Result<(), String> {
    if let Operand::Const(value) = op {
        if !ty.fits(*value) {
            return Err(format!(
                "@{}: constant {} does not fit {} ({})",
                func.name, value, ty, block
            ));
        }
    }
    Ok(())
}

fn check_target(func: &Function, block: BlockId, target: BlockId) -> Result<(), String> {
    if target.0 >= func.blocks.len() {
        return Err(format!(
            "@{}: branch to unknown block {} ({})",
            func.name, target, block
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BasicBlock, BinOp};

    fn block(id: usize, instructions: Vec<Instruction>, terminator: Terminator) -> BasicBlock {
        BasicBlock {
            id: BlockId(id),
            instructions,
            terminator,
        }
    }

    fn func_with(blocks: Vec<BasicBlock>, next_var: usize) -> Function {
        Function {
            name: "probe".to_string(),
            params: vec![(Ty::I32, VarId(0))],
            ret_ty: Some(Ty::I32),
            blocks,
            next_var,
        }
    }

    #[test]
    fn accepts_well_formed_multi_block_function() {
        let func = func_with(
            vec![
                block(
                    0,
                    vec![Instruction::Binary {
                        dest: VarId(1),
                        op: BinOp::Mul,
                        lhs: Operand::Var(VarId(0)),
                        rhs: Operand::Const(8),
                        ty: Ty::I32,
                    }],
                    Terminator::CondBr {
                        cond: Operand::Var(VarId(1)),
                        then_block: BlockId(1),
                        else_block: BlockId(2),
                    },
                ),
                block(1, vec![], Terminator::Ret(Some(Operand::Var(VarId(1))))),
                block(2, vec![], Terminator::Ret(Some(Operand::Const(0)))),
            ],
            2,
        );
        assert!(verify(&func).is_ok());
    }

    #[test]
    fn rejects_empty_function() {
        let func = func_with(vec![], 1);
        assert!(verify(&func).unwrap_err().contains("no blocks"));
    }

    #[test]
    fn rejects_misplaced_block_id() {
        let func = func_with(
            vec![block(1, vec![], Terminator::Ret(Some(Operand::Const(0))))],
            1,
        );
        assert!(verify(&func).unwrap_err().contains("position 0"));
    }

    #[test]
    fn rejects_use_before_definition() {
        let func = func_with(
            vec![block(
                0,
                vec![Instruction::Copy {
                    dest: VarId(1),
                    src: Operand::Var(VarId(7)),
                    ty: Ty::I32,
                }],
                Terminator::Ret(Some(Operand::Var(VarId(1)))),
            )],
            8,
        );
        assert!(verify(&func).unwrap_err().contains("%7 used before definition"));
    }

    #[test]
    fn rejects_self_referential_instruction() {
        let func = func_with(
            vec![block(
                0,
                vec![Instruction::Binary {
                    dest: VarId(1),
                    op: BinOp::Add,
                    lhs: Operand::Var(VarId(1)),
                    rhs: Operand::Const(1),
                    ty: Ty::I32,
                }],
                Terminator::Ret(Some(Operand::Var(VarId(1)))),
            )],
            2,
        );
        assert!(verify(&func).unwrap_err().contains("%1 used before definition"));
    }

    #[test]
    fn rejects_double_definition() {
        let inst = Instruction::Copy {
            dest: VarId(1),
            src: Operand::Const(0),
            ty: Ty::I32,
        };
        let func = func_with(
            vec![block(
                0,
                vec![inst.clone(), inst],
                Terminator::Ret(Some(Operand::Var(VarId(1)))),
            )],
            2,
        );
        assert!(verify(&func).unwrap_err().contains("defined more than once"));
    }

    #[test]
    fn rejects_branch_to_missing_block() {
        let func = func_with(vec![block(0, vec![], Terminator::Br(BlockId(3)))], 1);
        assert!(verify(&func).unwrap_err().contains("unknown block bb3"));
    }

    #[test]
    fn rejects_constant_too_wide_for_type() {
        let func = func_with(
            vec![block(
                0,
                vec![Instruction::Binary {
                    dest: VarId(1),
                    op: BinOp::Mul,
                    lhs: Operand::Var(VarId(0)),
                    rhs: Operand::Const(300),
                    ty: Ty::I8,
                }],
                Terminator::Ret(Some(Operand::Var(VarId(1)))),
            )],
            2,
        );
        assert!(verify(&func).unwrap_err().contains("does not fit i8"));
    }

    #[test]
    fn rejects_return_arity_mismatch() {
        let func = func_with(vec![block(0, vec![], Terminator::Ret(None))], 1);
        assert!(verify(&func).unwrap_err().contains("without a value"));

        let mut void_func = func_with(
            vec![block(0, vec![], Terminator::Ret(Some(Operand::Const(1))))],
            1,
        );
        void_func.ret_ty = None;
        assert!(verify(&void_func).unwrap_err().contains("no return type"));
    }

    #[test]
    fn rejects_stale_next_var() {
        let func = func_with(
            vec![block(
                0,
                vec![Instruction::Copy {
                    dest: VarId(5),
                    src: Operand::Var(VarId(0)),
                    ty: Ty::I32,
                }],
                Terminator::Ret(Some(Operand::Var(VarId(5)))),
            )],
            3,
        );
        assert!(verify(&func).unwrap_err().contains("next_var"));
    }

    #[test]
    fn located_errors_name_the_failing_site() {
        let dup = Instruction::Copy {
            dest: VarId(1),
            src: Operand::Const(0),
            ty: Ty::I32,
        };
        let func = func_with(
            vec![block(
                0,
                vec![dup.clone(), dup],
                Terminator::Ret(Some(Operand::Var(VarId(1)))),
            )],
            2,
        );
        let (site, message) = verify_located(&func).unwrap_err();
        assert_eq!(site, Site::Inst(0, 1));
        assert!(message.contains("defined more than once"));

        let func = func_with(vec![block(0, vec![], Terminator::Br(BlockId(3)))], 1);
        assert_eq!(verify_located(&func).unwrap_err().0, Site::Terminator(0));

        let func = func_with(vec![], 1);
        assert_eq!(verify_located(&func).unwrap_err().0, Site::Header);

        let func = func_with(
            vec![block(1, vec![], Terminator::Ret(Some(Operand::Const(0))))],
            1,
        );
        assert_eq!(verify_located(&func).unwrap_err().0, Site::Block(0));
    }

    #[test]
    fn module_rejects_duplicate_names() {
        let func = func_with(
            vec![block(0, vec![], Terminator::Ret(Some(Operand::Var(VarId(0)))))],
            1,
        );
        let module = Module {
            functions: vec![func.clone(), func],
        };
        assert!(verify_module(&module).unwrap_err().contains("duplicate function"));
    }
}

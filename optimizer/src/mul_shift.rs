// Rewrite integer multiplications by constant powers of two into left
// shifts, and report per function whether anything was rewritten.

use ir::{BinOp, Function, Instruction, Operand, Ty, VarId};

use crate::pass::{FunctionPass, PassContext};
use crate::utils::{is_power_of_two, log2};

const NAME: &str = "multiplication-shifts";
const PRINTER_NAME: &str = "multiplication-shifts-printer";

/// The transform half of the `multiplication-shifts` pipeline entry.
pub struct MultiplicationShifts;

impl FunctionPass for MultiplicationShifts {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(&mut self, func: &mut Function, _cx: &mut PassContext<'_>) -> bool {
        rewrite_multiplications(func)
    }
}

/// Replace `mul x, c` with `shl x, log2(c)` wherever `c` is a positive
/// power of two, in place, and redirect all readers of the product to the
/// shift's result. Returns whether anything was rewritten.
///
/// Only a constant in the second operand matches; `mul 4, x` is left
/// alone. Zero and negative constants never match. The shift keeps the
/// multiplication's width, so the rewrite is exact at every width:
/// `mul i8 x, 64` becomes `shl i8 x, 6`.
pub fn rewrite_multiplications(func: &mut Function) -> bool {
    let mut changed = false;
    for bi in 0..func.blocks.len() {
        let mut i = 0;
        while i < func.blocks[bi].instructions.len() {
            if let Some((old_dest, lhs, shift, ty)) =
                match_mul_by_pow2(&func.blocks[bi].instructions[i])
            {
                let new_dest = func.new_var();
                func.replace_all_uses(old_dest, new_dest);
                debug_assert_eq!(
                    func.count_uses(old_dest),
                    0,
                    "@{}: {} still has readers",
                    func.name,
                    old_dest
                );
                func.blocks[bi].instructions[i] = Instruction::Binary {
                    dest: new_dest,
                    op: BinOp::Shl,
                    lhs,
                    rhs: Operand::Const(shift),
                    ty,
                };
                changed = true;
            }
            i += 1;
        }
    }
    changed
}

// mul x, c with c a positive power of two; yields the data for the shift
fn match_mul_by_pow2(inst: &Instruction) -> Option<(VarId, Operand, i64, Ty)> {
    if let Instruction::Binary {
        dest,
        op: BinOp::Mul,
        lhs,
        rhs: Operand::Const(c),
        ty,
    } = inst
    {
        if is_power_of_two(*c) {
            return Some((*dest, *lhs, log2(*c), *ty));
        }
    }
    None
}

/// The reporting half of the `multiplication-shifts` pipeline entry.
///
/// Reads the transform's outcome for the current function from the run's
/// context and narrates it on the diagnostic sink. Runs that never
/// executed the transform read as unchanged.
pub struct MultiplicationShiftsPrinter;

impl FunctionPass for MultiplicationShiftsPrinter {
    fn name(&self) -> &'static str {
        PRINTER_NAME
    }

    fn run(&mut self, _func: &mut Function, cx: &mut PassContext<'_>) -> bool {
        let changed = cx.changed(NAME).unwrap_or(false);
        let _ = writeln!(cx.diag(), "*** MULTIPLICATION SHIFTS PASS EXECUTING ***");
        if changed {
            let _ = writeln!(cx.diag(), "Some instruction was replaced.");
        } else {
            let _ = writeln!(cx.diag(), "Nothing changed.");
        }
        false
    }
}

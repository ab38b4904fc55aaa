//! Jumps. All targets are `disp + R[a]`.

use steptrace_timeline::{Flags, RegIndex, Word};

use super::context::ExecContext;

/// Jumps to `disp + R[a]` when `taken` holds. The target is computed either
/// way, so `adr` always reflects it.
fn jump_if(ctx: &mut ExecContext, a: RegIndex, disp: Word, taken: bool) {
    let target = ctx.effective_address(disp, a);
    if taken {
        ctx.jump_to(target);
    }
}

pub(crate) fn jump(ctx: &mut ExecContext, a: RegIndex, disp: Word) {
    jump_if(ctx, a, disp, true);
}

/// JUMPZ: jump if `R[d] == 0`.
pub(crate) fn jumpz(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, disp: Word) {
    let taken = ctx.load_reg(d) == 0;
    jump_if(ctx, a, disp, taken);
}

/// JUMPNZ: jump if `R[d] != 0`.
pub(crate) fn jumpnz(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, disp: Word) {
    let taken = ctx.load_reg(d) != 0;
    jump_if(ctx, a, disp, taken);
}

/// JAL: `R[d] := pc` (the return address), then jump.
pub(crate) fn jal(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, disp: Word) {
    let target = ctx.effective_address(disp, a);
    let return_addr = ctx.pc;
    ctx.store_reg(d, return_addr);
    ctx.jump_to(target);
}

/// Conditional jump on a comparison flag.
pub(crate) fn jump_on_flag(ctx: &mut ExecContext, flag: Flags, a: RegIndex, disp: Word) {
    let taken = ctx.flags.contains(flag);
    jump_if(ctx, a, disp, taken);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::test_utils::with_context;

    #[test]
    fn test_conditional_jumps() {
        with_context(|ctx| {
            ctx.pc = 10;
            jumpz(ctx, 1, 0, 40);
            assert_eq!(ctx.pc, 40);

            jumpnz(ctx, 1, 0, 80);
            assert_eq!(ctx.pc, 40);
            assert_eq!(ctx.control.adr, 80);

            ctx.flags = Flags::GT;
            jump_on_flag(ctx, Flags::LT, 0, 0);
            assert_eq!(ctx.pc, 40);
            jump_on_flag(ctx, Flags::GT, 0, 2);
            assert_eq!(ctx.pc, 2);
        });
    }

    #[test]
    fn test_jal_links() {
        with_context(|ctx| {
            ctx.pc = 6;
            ctx.set_reg(2, 0x20);
            jal(ctx, 13, 2, 4);
            assert_eq!(ctx.pc, 0x24);
            assert_eq!(ctx.reg(13), 6);
        });
    }
}

//! Memory-format data movement: `lea`, `load` and `store`.

use steptrace_timeline::{RegIndex, Word};

use super::context::ExecContext;

/// LEA: `R[d] := disp + R[a]`
pub(crate) fn lea(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, disp: Word) {
    let addr = ctx.effective_address(disp, a);
    ctx.store_reg(d, addr);
}

/// LOAD: `R[d] := mem[disp + R[a]]`
pub(crate) fn load(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, disp: Word) {
    let addr = ctx.effective_address(disp, a);
    let value = ctx.load_mem(addr);
    ctx.store_reg(d, value);
}

/// STORE: `mem[disp + R[a]] := R[d]`
pub(crate) fn store(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, disp: Word) {
    let addr = ctx.effective_address(disp, a);
    let value = ctx.load_reg(d);
    ctx.store_mem(addr, value);
}

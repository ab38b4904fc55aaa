use steptrace_timeline::{RegIndex, Word};

use super::context::ExecContext;

/// Applies a bitwise operation to `R[a]` and `R[b]`, storing the result in
/// `R[d]` and comparing it against zero.
fn bitwise(
    ctx: &mut ExecContext,
    d: RegIndex,
    a: RegIndex,
    b: RegIndex,
    op: fn(Word, Word) -> Word,
) {
    let result = op(ctx.load_reg(a), ctx.load_reg(b));
    ctx.store_reg(d, result);
    ctx.set_comparison(result, 0);
}

pub(crate) fn and(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, b: RegIndex) {
    bitwise(ctx, d, a, b, |x, y| x & y);
}

pub(crate) fn or(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, b: RegIndex) {
    bitwise(ctx, d, a, b, |x, y| x | y);
}

pub(crate) fn xor(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, b: RegIndex) {
    bitwise(ctx, d, a, b, |x, y| x ^ y);
}

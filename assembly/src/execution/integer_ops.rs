//! Two's complement arithmetic on 16-bit words.

use steptrace_timeline::{Flags, RegIndex, Word};

use super::{context::ExecContext, emulator::InterpreterError};

/// Register holding the remainder of a division.
pub(crate) const REMAINDER_REGISTER: RegIndex = 15;

fn load_operands(ctx: &mut ExecContext, a: RegIndex, b: RegIndex) -> (Word, Word) {
    (ctx.load_reg(a), ctx.load_reg(b))
}

/// Stores `result` in `R[d]` and sets every flag.
fn store_with_flags(
    ctx: &mut ExecContext,
    d: RegIndex,
    result: Word,
    carry: bool,
    overflow: bool,
) {
    ctx.store_reg(d, result);
    ctx.flags.set(Flags::CARRY, carry);
    ctx.flags.set(Flags::OVERFLOW, overflow);
    ctx.set_comparison(result, 0);
}

/// ADD: `R[d] := R[a] + R[b]`
pub(crate) fn add(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, b: RegIndex) {
    let (lhs, rhs) = load_operands(ctx, a, b);
    let (result, carry) = lhs.overflowing_add(rhs);
    let overflow = (lhs as i16).overflowing_add(rhs as i16).1;
    store_with_flags(ctx, d, result, carry, overflow);
}

/// SUB: `R[d] := R[a] - R[b]`. `carry` reports an unsigned borrow.
pub(crate) fn sub(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, b: RegIndex) {
    let (lhs, rhs) = load_operands(ctx, a, b);
    let (result, borrow) = lhs.overflowing_sub(rhs);
    let overflow = (lhs as i16).overflowing_sub(rhs as i16).1;
    store_with_flags(ctx, d, result, borrow, overflow);
}

/// MUL: signed product, truncated to a word.
pub(crate) fn mul(ctx: &mut ExecContext, d: RegIndex, a: RegIndex, b: RegIndex) {
    let (lhs, rhs) = load_operands(ctx, a, b);
    let (result, overflow) = (lhs as i16).overflowing_mul(rhs as i16);
    store_with_flags(ctx, d, result as Word, false, overflow);
}

/// DIV: signed quotient in `R[d]`, remainder in `R15`.
pub(crate) fn div(
    ctx: &mut ExecContext,
    d: RegIndex,
    a: RegIndex,
    b: RegIndex,
) -> Result<(), InterpreterError> {
    let (lhs, rhs) = load_operands(ctx, a, b);
    if rhs == 0 {
        return Err(InterpreterError::DivideByZero {
            addr: ctx.instr_addr,
        });
    }
    let (lhs, rhs) = (lhs as i16, rhs as i16);
    let (quotient, overflow) = lhs.overflowing_div(rhs);
    let remainder = lhs.wrapping_rem(rhs);
    store_with_flags(ctx, d, quotient as Word, false, overflow);
    ctx.store_reg(REMAINDER_REGISTER, remainder as Word);
    Ok(())
}

/// CMP: sets `lt`, `eq` and `gt` from the signed comparison of `R[a]` and
/// `R[b]`.
pub(crate) fn cmp(ctx: &mut ExecContext, a: RegIndex, b: RegIndex) {
    let (lhs, rhs) = load_operands(ctx, a, b);
    ctx.set_comparison(lhs, rhs);
}

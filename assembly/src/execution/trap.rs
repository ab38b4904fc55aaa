//! System requests made through `trap Rd,Ra,Rb`. The request code is `R[d]`.

use num_enum::TryFromPrimitive;
use steptrace_timeline::RegIndex;
use tracing::debug;

use super::{context::ExecContext, emulator::InterpreterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u16)]
pub(crate) enum TrapCode {
    Halt = 0,
    /// Read the next input word into `R[a]`.
    Read = 1,
}

pub(crate) fn trap(
    ctx: &mut ExecContext,
    d: RegIndex,
    a: RegIndex,
) -> Result<(), InterpreterError> {
    let code = ctx.load_reg(d);
    ctx.control.status = code;
    let code = TrapCode::try_from(code).map_err(|_| InterpreterError::UnknownTrap {
        code,
        addr: ctx.instr_addr,
    })?;

    match code {
        TrapCode::Halt => ctx.halted = true,
        TrapCode::Read => match ctx.input.next_word() {
            Some(word) => ctx.store_reg(a, word),
            None => {
                debug!(addr = ctx.instr_addr, "input exhausted");
                ctx.blocked = true;
                // Resume at the same trap once input is available.
                let addr = ctx.instr_addr;
                ctx.jump_to(addr);
            }
        },
    }
    Ok(())
}

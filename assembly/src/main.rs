use std::{fs, path::PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use steptrace_asm::{init_logger, Assembler, Emulator, Instruction, Session};
use steptrace_timeline::{
    MachineState, MemoryScan, RunError, TimelineConfig, Word, DEFAULT_STEP_CAP,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "steptrace")]
#[command(about = "Assemble a program, record its run and inspect any step")]
struct Cli {
    /// Assembly source file
    file: PathBuf,

    /// Maximum number of instructions to record
    #[arg(long, default_value_t = DEFAULT_STEP_CAP)]
    step_cap: usize,

    /// Step to inspect (0 is the state before the first instruction)
    #[arg(long, conflicts_with = "end")]
    step: Option<usize>,

    /// Inspect the last recorded step
    #[arg(long)]
    end: bool,

    /// Word served to the next `trap` read request (decimal or $hex)
    #[arg(long = "input", value_parser = parse_word)]
    input: Vec<Word>,

    /// Compare all of memory when computing deltas
    #[arg(long)]
    full_scan: bool,
}

fn parse_word(s: &str) -> Result<Word, String> {
    let parsed = match s.strip_prefix('$') {
        Some(hex) => Word::from_str_radix(hex, 16).ok(),
        None => s
            .parse::<i16>()
            .map(|v| v as Word)
            .ok()
            .or_else(|| s.parse::<Word>().ok()),
    };
    parsed.ok_or_else(|| format!("not a word: {s}"))
}

fn print_state(state: &MachineState, previous: Option<&MachineState>) {
    for (row, values) in state.registers().chunks(4).enumerate() {
        let cells: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let index = row * 4 + i;
                let changed = previous.is_some_and(|p| p.registers()[index] != *value);
                let marker = if changed { '*' } else { ' ' };
                format!("R{index:<2} {value:04x}{marker}")
            })
            .collect();
        println!("  {}", cells.join("  "));
    }
    println!(
        "  pc {:04x}  ir {:04x}  adr {:04x}  dat {:04x}  status {:04x}  flags {:?}",
        state.pc, state.ir, state.control.adr, state.control.dat, state.control.status, state.flags
    );
    if state.halted {
        println!("  halted");
    } else if state.blocked {
        println!("  blocked on input");
    } else if let Some(next) = Instruction::at(state, state.pc) {
        println!("  next: {next}");
    }
}

fn print_step(session: &Session) -> anyhow::Result<()> {
    let Some(timeline) = session.timeline() else {
        bail!("no timeline");
    };
    let step = session.current_step();
    println!("step {step} of {}", session.total_steps());

    if let Some(delta) = session.current_delta() {
        let previous = session.previous_state();
        let line = timeline
            .source_line(step)
            .map_or_else(String::new, |line| format!(" (line {line})"));
        let executed = previous
            .as_ref()
            .and_then(|p| Instruction::at(p, delta.instr_addr()))
            .map_or_else(|| format!("{:04x}", delta.ir()), |i| i.to_string());
        println!("executed {:04x}: {executed}{line}", delta.instr_addr());
        for (&addr, &value) in delta.changed_memory() {
            let old = previous.as_ref().map_or(0, |p| p.mem(addr));
            println!("  mem[{addr:04x}] {old:04x} -> {value:04x}");
        }
        if let Some(state) = session.current_state() {
            print_state(&state, previous.as_ref());
        }
    } else if let Some(state) = session.current_state() {
        print_state(&state, None);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let module_name = cli
        .file
        .file_stem()
        .map_or_else(|| "main".to_string(), |s| s.to_string_lossy().into_owned());
    let memory_scan = if cli.full_scan {
        MemoryScan::Full
    } else {
        MemoryScan::WriteSet
    };
    let config = TimelineConfig::default()
        .with_step_cap(cli.step_cap)
        .with_memory_scan(memory_scan);

    let mut session = Session::with_config(Emulator::with_input(cli.input), Assembler, config)
        .with_module_name(module_name);
    let timeline = match session.run(&source) {
        Ok(timeline) => timeline,
        Err(RunError::Assembly(failure)) => {
            for diagnostic in &failure.diagnostics {
                eprintln!("{}: {diagnostic}", failure.module);
            }
            return Err(failure.into());
        }
        Err(err) => return Err(err.into()),
    };
    info!(steps = timeline.total_steps(), status = %timeline.status(), "recorded");

    if cli.end {
        session.go_to_end();
    } else if let Some(step) = cli.step {
        session.go_to_step(step)?;
    }
    print_step(&session)?;

    println!("{} ({} steps)", timeline.status(), timeline.total_steps());
    println!("{}", session.engine().stats());
    session.engine().stats().log_summary();
    Ok(())
}

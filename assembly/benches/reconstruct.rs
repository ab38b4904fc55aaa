use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use steptrace_asm::{Assembler, Emulator};
use steptrace_timeline::{run, state_at_step, Navigator, Timeline, TimelineConfig};

const LOOP_COUNTS: [usize; 3] = [100, 1_000, 10_000];
const JUMPS: usize = 100;

/// A loop writing `count` words, four instructions per iteration.
fn fill_program(count: usize) -> String {
    format!(
        "        lea    R1,{count}[R0]
        lea    R4,1[R0]
loop:   store  R1,buf[R2]
        add    R2,R2,R4
        sub    R1,R1,R4
        jumpnz R1,loop[R0]
        trap   R0,R0,R0
buf:    data   0
"
    )
}

fn record(count: usize) -> Timeline {
    let config = TimelineConfig::default().with_step_cap(usize::MAX);
    run(
        &mut Emulator::new(),
        &Assembler,
        "bench",
        &fill_program(count),
        &config,
    )
    .expect("benchmark program assembles")
}

fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("Record");

    for &n in &LOOP_COUNTS {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| record(n));
        });
    }

    group.finish();
}

fn bench_random_jumps(c: &mut Criterion) {
    let mut group = c.benchmark_group("Random jumps");

    for &n in &LOOP_COUNTS {
        let timeline = Arc::new(record(n));
        let total = timeline.total_steps();

        group.bench_with_input(BenchmarkId::new("replay", n), &n, |b, _| {
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(42);
                    (0..JUMPS)
                        .map(|_| rng.random_range(0..=total))
                        .collect::<Vec<_>>()
                },
                |steps| {
                    for step in steps {
                        let _ = state_at_step(&timeline, step).unwrap();
                    }
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("step forward", n), &n, |b, _| {
            b.iter_batched(
                || Navigator::new(timeline.clone()),
                |mut nav| {
                    while nav.next_step() {
                        let _ = nav.current_state().pc;
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record, bench_random_jumps);
criterion_main!(benches);

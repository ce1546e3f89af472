//! Benchmarks the compile pipeline end to end, from source text to
//! assembly text, across a few representative program shapes.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tacc::{Platform, compile_source};

const ADD_TWO_LOCALS: &str = "x = 1\ny = 2\nprint x + y\n";

const NESTED_IF_CHAIN: &str = "
x = 1
if x == 1:
  y = 2
elif x == 2:
  y = 3
else:
  y = 4
print y
";

const MANY_SIMULTANEOUSLY_LIVE_NAMES: &str = "
a = 1
b = 2
c = 3
d = 4
e = 5
f = 6
g = 7
h = 8
print a + b + c + d + e + f + g + h
";

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("compile_add_two_locals", |b| {
        b.iter(|| black_box(compile_source(ADD_TWO_LOCALS, Platform::Linux, false).unwrap()));
    });
    c.bench_function("compile_nested_if_chain", |b| {
        b.iter(|| black_box(compile_source(NESTED_IF_CHAIN, Platform::Linux, false).unwrap()));
    });
    c.bench_function("compile_register_pressure", |b| {
        b.iter(|| black_box(compile_source(MANY_SIMULTANEOUSLY_LIVE_NAMES, Platform::Linux, false).unwrap()));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

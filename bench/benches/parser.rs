use criterion::{criterion_group, criterion_main, Criterion};
use lynx::{lexer::SUGGESTED_TOKENS_CAPACITY, parser::parse_root, util::intern::Interner};
use std::hint::black_box;

static SNIPPET: &str = r#"
square(n: i64!) -> i64 {
    acc: i64 = 0;
    acc = acc + n * n ^ 1;
    ret acc;
}
scale(x -> f64, by: f64!) -> void { x = x * by / 2.5; }
apply(f64, i32!): f64;
count: i64 = 1;
p: i64* = &count;
*p = (*p)++ + square(3);
{ inner: i32 = 2; { inner } }
"#;

fn criterion_benchmark(c: &mut Criterion) {
    let input = SNIPPET.repeat(512);
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY * 8);

    c.bench_function("parser", |b| {
        b.iter(|| {
            tokens.clear();
            let mut idents = Interner::with_capacity(64);
            let root = parse_root(black_box(&input), &mut tokens, &mut idents);
            _ = black_box(root);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use lynx::{lexer, token::TokenKind};
use std::hint::black_box;

static SNIPPET: &str = r#"
// Squares, the slow way.
square(n: i64!) -> i64 {
    acc: i64 = 0;
    i: i64 = 0;
    acc = acc + n * n ^ 1;
    ret acc;
}
scale(x -> f64, by: f64!) -> void { x = x * by / 2.5; }
p: i64* = &count;
*p = (*p)++ + square(3);
s: literal = "tab\there\n";
/* block
   comment */
"#;

fn lexer(input: &str, tokens: &mut Vec<lynx::token::Token>) {
    let mut errors = Vec::new();
    tokens.clear();
    lexer::lex(input, tokens, &mut errors);
    let idents = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Identifier)
        .count();
    black_box((idents, errors));
}

fn criterion_benchmark(c: &mut Criterion) {
    let input = SNIPPET.repeat(512);
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY * 8);
    c.bench_function("lexer", |b| {
        b.iter(|| lexer(black_box(&input), &mut tokens));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

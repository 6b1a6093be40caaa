use criterion::{Criterion, black_box, criterion_group, criterion_main};
use wireproof_context::ExchangeContext;
use wireproof_text::{PlainTextValidator, resolve_ignore_tokens};

fn bench_placeholder(c: &mut Criterion) {
    let received: String = (0..200)
        .map(|i| format!("field{i} value{i} "))
        .collect::<String>()
        .trim_end()
        .to_string();
    let control: String = (0..200)
        .map(|i| {
            if i % 10 == 0 {
                format!("field{i} @ignore@ ")
            } else {
                format!("field{i} value{i} ")
            }
        })
        .collect::<String>()
        .trim_end()
        .to_string();

    c.bench_function("resolve_ignore_tokens_200_fields", |b| {
        b.iter(|| resolve_ignore_tokens(black_box(&control), black_box(&received)))
    });

    let validator = PlainTextValidator::default();
    c.bench_function("validate_200_fields", |b| {
        b.iter(|| {
            let mut ctx = ExchangeContext::new();
            validator
                .validate(black_box(&received), black_box(&control), &mut ctx)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_placeholder);
criterion_main!(benches);

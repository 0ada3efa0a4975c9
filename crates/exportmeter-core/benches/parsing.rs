use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::PathBuf;

use exportmeter_core::parser::parse_form_str;

fn make_form_toml(question_count: usize) -> String {
    let mut toml = String::from(
        "[form]\nid = \"bench\"\ntitle = \"Bench Form\"\ndescription = \"generated\"\n",
    );
    for i in 0..question_count {
        toml.push_str(&format!(
            "\n[[questions]]\nid = \"q{i}\"\ntext = \"Question {i}?\"\ncategory = \"category-{}\"\nweight = {}.0\norder_index = {i}\n",
            i % 5,
            1 + i % 3,
        ));
    }
    toml
}

fn bench_parse_form(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_form");
    let path = PathBuf::from("bench.toml");

    for size in [10usize, 100] {
        let content = make_form_toml(size);
        group.bench_function(format!("{size}_questions").as_str(), |b| {
            b.iter(|| parse_form_str(black_box(&content), black_box(&path)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_form);
criterion_main!(benches);

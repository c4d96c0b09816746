use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use terminator_core::{Translator, TranslatorConfig};

const SAMPLE: &str = r#"
#include <iostream>
#include <cmath>
#include <vector>

class Accumulator {
public:
    Accumulator(int start) : total(start) {}
    void add(int value) { total += value; }
    int get() const { return total; }
private:
    int total;
};

double norm(std::vector<double> xs) {
    double sum = 0.0;
    for (int i = 0; i < xs.size(); i++) {
        sum += pow(xs[i], 2);
    }
    return sqrt(sum);
}

int main() {
    Accumulator acc(0);
    for (int i = 0; i < 10; ++i) {
        if (i % 2 == 0) {
            acc.add(i / 2);
        }
    }
    std::cout << "total: " << acc.get() << std::endl;
    return 0;
}
"#;

/// `copies` functions renamed apart so the unit stays valid C++.
fn scaled_source(copies: usize) -> String {
    (0..copies)
        .map(|n| {
            format!(
                "int sum_{n}(int limit) {{\n    int total = 0;\n    for (int i = 0; i < limit; i++) {{\n        total += i / 2;\n    }}\n    return total;\n}}\n"
            )
        })
        .collect()
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate_sample");

    let single = Translator::default();
    group.bench_function("single_pass", |b| {
        b.iter(|| single.convert(black_box(SAMPLE)).map(|t| t.output.len()))
    });

    let mut config = TranslatorConfig::default();
    config.rewrite.fixed_point = true;
    let fixed = Translator::from_config(&config).expect("default rules exist");
    group.bench_function("fixed_point", |b| {
        b.iter(|| fixed.convert(black_box(SAMPLE)).map(|t| t.output.len()))
    });

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate_scaling");
    let translator = Translator::default();

    for copies in [10, 100, 500].iter() {
        let source = scaled_source(*copies);
        group.bench_with_input(BenchmarkId::new("functions", copies), &source, |b, source| {
            b.iter(|| translator.convert(black_box(source)).map(|t| t.output.len()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sample, bench_scaling);
criterion_main!(benches);

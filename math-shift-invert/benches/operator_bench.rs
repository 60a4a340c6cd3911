use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use math_audio_shift_invert::{ColumnOrdering, LinearOperator, OperatorConfig};
use ndarray::Array1;

/// 1D Laplacian tridiag(−1, 2, −1)
fn laplacian(n: usize, config: OperatorConfig) -> LinearOperator<f64> {
    let mut values = Vec::with_capacity(3 * n);
    let mut rows = Vec::with_capacity(3 * n);
    let mut ptrs = Vec::with_capacity(n + 1);
    ptrs.push(0);
    for j in 0..n {
        if j > 0 {
            values.push(-1.0);
            rows.push(j - 1);
        }
        values.push(2.0);
        rows.push(j);
        if j + 1 < n {
            values.push(-1.0);
            rows.push(j + 1);
        }
        ptrs.push(values.len());
    }
    LinearOperator::square(n, values, rows, ptrs, config).expect("valid laplacian")
}

fn bench_products(c: &mut Criterion) {
    let n = 2000;
    let op = laplacian(n, OperatorConfig::default());
    let v = Array1::from_elem(n, 1.0);

    c.bench_function("multiply_2000", |b| {
        b.iter(|| black_box(op.multiply(black_box(&v)).expect("defined")))
    });

    c.bench_function("multiply_transpose_2000", |b| {
        b.iter(|| black_box(op.multiply_transpose(black_box(&v)).expect("defined")))
    });
}

fn bench_factor_shifted(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_shifted");
    for ordering in [
        ColumnOrdering::Natural,
        ColumnOrdering::MinimumDegreeAtA,
        ColumnOrdering::MinimumDegreeAtPlusA,
    ] {
        let config = OperatorConfig::default().with_ordering(ordering.clone());
        let mut op = laplacian(2000, config);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{ordering:?}")),
            &0.5,
            |b, &sigma| b.iter(|| op.factor_shifted(black_box(sigma)).expect("regular shift")),
        );
    }
    group.finish();
}

fn bench_apply_inverse(c: &mut Criterion) {
    let n = 2000;
    let mut op = laplacian(n, OperatorConfig::default().with_ordering(ColumnOrdering::Natural));
    op.factor_shifted(0.5).expect("regular shift");
    let v = Array1::from_elem(n, 1.0);
    let mut w = Array1::zeros(n);

    c.bench_function("apply_inverse_2000", |b| {
        b.iter(|| {
            op.apply_inverse_into(black_box(v.view()), w.view_mut())
                .expect("factored");
            black_box(&w);
        })
    });
}

criterion_group!(benches, bench_products, bench_factor_shifted, bench_apply_inverse);
criterion_main!(benches);

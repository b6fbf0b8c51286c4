use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use salespivot_core::{aggregate, reshape, AggregateOptions, FilterSelection, ReshapeOptions};
use salespivot_sheet::{CellValue, Sheet};

const MONTHS: [&str; 6] = ["01_Jan", "01_Feb", "01_Mar", "01_Apr", "01_May", "01_Jun"];
const STORES: [&str; 4] = ["Pusat", "Utara", "Selatan", "Timur"];
const GROUPS: [&str; 5] = ["BZR", "GRC", "FRS", "MKN", "MNM"];

/// A wide sheet with `categories` rows and one column per month/store pair.
fn wide_sheet(categories: usize) -> Sheet {
    let mut level_a = vec![CellValue::from("Kelompok Barang")];
    let mut level_b = vec![CellValue::Null];
    for month in MONTHS {
        for store in STORES {
            level_a.push(CellValue::from(month));
            level_b.push(CellValue::from(store));
        }
    }

    let mut data = vec![level_a, level_b];
    for i in 0..categories {
        let category = format!("{} Item {i}", GROUPS[i % GROUPS.len()]);
        let mut row = vec![CellValue::String(category)];
        row.extend(
            (0..MONTHS.len() * STORES.len())
                .map(|j| CellValue::Float(((i * 31 + j * 7) % 500) as f64)),
        );
        data.push(row);
    }
    Sheet::from_data(data)
}

fn bench_reshape(c: &mut Criterion) {
    let mut group = c.benchmark_group("reshape");
    let options = ReshapeOptions::default();

    for size in [10, 100, 1000].iter() {
        let sheet = wide_sheet(*size);
        group.bench_with_input(BenchmarkId::new("wide_to_long", size), size, |b, _| {
            b.iter(|| reshape(black_box(&sheet), black_box(&options)))
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let options = AggregateOptions::default();

    for size in [10, 100, 1000].iter() {
        let rows = reshape(&wide_sheet(*size), &ReshapeOptions::default())
            .unwrap()
            .rows;
        let selection = FilterSelection::select_all(&rows);
        group.bench_with_input(BenchmarkId::new("all_views", size), size, |b, _| {
            b.iter(|| aggregate(black_box(&rows), black_box(&selection), black_box(&options)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reshape, bench_aggregate);
criterion_main!(benches);

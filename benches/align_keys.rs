use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use workbook_diff::align::align;
use workbook_diff::classify::CompareOptions;
use workbook_diff::data::CellValue;
use workbook_diff::error::Side;
use workbook_diff::keys::{KeyOptions, extract_keys};
use workbook_diff::report::keyed_report;
use workbook_diff::sheet::{ReportKind, Table};

/// Builds a sheet of `rows` test cases whose ids start at `offset`; every
/// seventh status differs between revisions.
fn generate_sheet(rows: usize, offset: usize, revision: usize) -> Table {
    let headers = ["Test ID", "Description", "Status", "Limit"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let data = (offset..offset + rows)
        .map(|i| {
            let status = if i % 7 == 0 && revision > 0 { "changed" } else { "stable" };
            vec![
                CellValue::Text(format!("IO{i}")),
                CellValue::Text(format!("Case number {i}")),
                CellValue::Text(status.to_string()),
                CellValue::Number((i % 100) as f64),
            ]
        })
        .collect();
    Table::new("Inputs", &headers, data)
}

fn bench_align_keys(c: &mut Criterion) {
    let old = generate_sheet(50_000, 0, 0);
    let new = generate_sheet(50_000, 5_000, 1);
    let options = KeyOptions::new("Test ID");

    let mut group = c.benchmark_group("keyed_compare");

    group.bench_function("extract_and_align", |b| {
        b.iter_batched(
            || (),
            |_| {
                let old_index = extract_keys(&old, Side::Old, &options).expect("old keys");
                let new_index = extract_keys(&new, Side::New, &options).expect("new keys");
                align(&old_index, &new_index)
            },
            BatchSize::SmallInput,
        );
    });

    let old_index = extract_keys(&old, Side::Old, &options).expect("old keys");
    let new_index = extract_keys(&new, Side::New, &options).expect("new keys");
    group.bench_function("keyed_report", |b| {
        b.iter(|| {
            keyed_report(
                &old,
                &new,
                &old_index,
                &new_index,
                ReportKind::Keyed,
                &CompareOptions::default(),
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_align_keys);
criterion_main!(benches);

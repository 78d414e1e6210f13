use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rask_log_monitor::domain::LogRecord;
use rask_log_monitor::metrics::aggregate;
use rask_log_monitor::parser::LogRecordParser;
use rask_log_monitor::store::BulkSerializer;

const PIPE_LINE: &str = "2024-01-01T10:00:00|TXN123|500|1200|/checkout|Payment gateway timeout";
const LEGACY_LINE: &str =
    "2023-10-15 14:31:10 payment-service 500 2500ms user_456 TXN002 Payment gateway timeout";

fn benchmark_line_parsing(c: &mut Criterion) {
    let parser = LogRecordParser::new();

    let mut group = c.benchmark_group("line_parsing");
    group.throughput(Throughput::Bytes(PIPE_LINE.len() as u64));

    group.bench_function("pipe_line", |b| {
        b.iter(|| parser.parse(std::hint::black_box(PIPE_LINE)));
    });

    group.bench_function("legacy_line", |b| {
        b.iter(|| parser.parse(std::hint::black_box(LEGACY_LINE)));
    });

    group.bench_function("rejected_line", |b| {
        b.iter(|| parser.parse(std::hint::black_box("2024-01-01T10:00:00|TXN1|abc")));
    });

    group.finish();
}

fn sample_records(count: usize) -> Vec<LogRecord> {
    let parser = LogRecordParser::new();
    (0..count)
        .filter_map(|i| {
            let status = if i % 7 == 0 { 503 } else { 200 };
            parser
                .parse(&format!(
                    "2024-01-01T10:{:02}:{:02}|TXN{i}|{status}|{}|/checkout",
                    (i / 60) % 60,
                    i % 60,
                    (i * 37) % 3000
                ))
                .ok()
        })
        .collect()
}

fn benchmark_aggregation(c: &mut Criterion) {
    let records = sample_records(10_000);

    let mut group = c.benchmark_group("aggregation");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("aggregate_10k", |b| {
        b.iter(|| aggregate(std::hint::black_box(&records)));
    });
    group.finish();
}

fn benchmark_bulk_serialization(c: &mut Criterion) {
    let records = sample_records(500);
    let serializer = BulkSerializer::new();

    let mut group = c.benchmark_group("bulk_serialization");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("ndjson_500", |b| {
        b.iter(|| serializer.serialize_ndjson("ecommerce-logs-2024.01.01", &records));
    });

    group.bench_function("gzip_500", |b| {
        b.iter(|| serializer.serialize_compressed("ecommerce-logs-2024.01.01", &records));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_line_parsing,
    benchmark_aggregation,
    benchmark_bulk_serialization
);
criterion_main!(benches);

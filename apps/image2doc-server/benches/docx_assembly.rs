//! Document Assembly Benchmarks
//!
//! Paragraph assembly from recognized text and `.docx` serialization.
//!
//! Run with: `cargo bench --bench docx_assembly`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use image2doc_server::docx::{DocumentAssembler, DocxWriter};

/// OCR-like page text: headings, body lines and blank separators
fn sample_text(lines: usize) -> String {
    (0..lines)
        .map(|i| match i % 12 {
            0 => "SECTION HEADING".to_string(),
            5 => String::new(),
            _ => format!(
                "Line {} of the scanned page with some ordinary words, punctuation; and numbers 1234.",
                i
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_assembly(c: &mut Criterion) {
    let assembler = DocumentAssembler::default();
    let mut group = c.benchmark_group("assemble_text");

    for lines in [40, 400, 4000] {
        let text = sample_text(lines);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &text, |b, text| {
            b.iter(|| black_box(assembler.from_text(black_box(text))))
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let assembler = DocumentAssembler::default();
    let writer = DocxWriter::default();
    let mut group = c.benchmark_group("write_docx");

    for lines in [40, 400, 4000] {
        let document = assembler.from_text(&sample_text(lines));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &document, |b, document| {
            b.iter(|| {
                let bytes = writer.write(black_box(document)).unwrap();
                black_box(bytes)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assembly, bench_serialization);
criterion_main!(benches);

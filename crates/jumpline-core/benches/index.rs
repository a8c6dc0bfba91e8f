use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use jumpline_core::{
    AnchoredText, BufferId, DerivedResult, FileRef, HighlightLayerEngine, PainterCategory,
    ResultIndex, StyleRegistry, TextBuffer,
};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (jumpline benchmark line)\n"
        ));
    }
    out.pop();
    out
}

fn file() -> FileRef {
    FileRef::new("Bench.java")
}

fn results(count: usize, line_count: usize) -> Vec<DerivedResult> {
    // Spread over the file in reverse so the index has to sort.
    (0..count)
        .rev()
        .map(|i| {
            let line = (i * line_count / count) as i64;
            DerivedResult::error(format!("error {i}"))
                .in_file(file())
                .at(line, 7)
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let text = large_text(50_000);
    let buffer = TextBuffer::new(BufferId::new(1), Some(file()), &text);
    let results = results(1_000, 50_000);

    c.bench_function("index_build/1k_results_50k_lines", |b| {
        b.iter_batched(
            || results.clone(),
            |results| black_box(ResultIndex::build(results, &buffer).len()),
            BatchSize::LargeInput,
        )
    });
}

fn bench_typing_with_anchors(c: &mut Criterion) {
    let text = large_text(50_000);
    let results = results(1_000, 50_000);

    c.bench_function("typing_middle/100_inserts_1k_anchors", |b| {
        b.iter_batched(
            || {
                let buffer = TextBuffer::new(BufferId::new(1), Some(file()), &text);
                let index = ResultIndex::build(results.clone(), &buffer);
                (buffer, index)
            },
            |(mut buffer, index)| {
                let mut offset = buffer.line_to_char(25_000).unwrap_or(0);
                for _ in 0..100 {
                    buffer.insert(offset, "x").unwrap();
                    offset += 1;
                }
                black_box(index.anchor(500).map(|a| a.offset()));
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_caret_lookup(c: &mut Criterion) {
    let text = large_text(50_000);
    let buffer = TextBuffer::new(BufferId::new(1), Some(file()), &text);
    let index = ResultIndex::build(results(1_000, 50_000), &buffer);
    let caret = buffer.line_to_char(25_000).unwrap_or(0) + 20;

    c.bench_function("find_enclosing/1k_results", |b| {
        b.iter(|| black_box(index.find_enclosing(&buffer, black_box(caret))))
    });
}

fn bench_highlight_churn(c: &mut Criterion) {
    let text = large_text(1_000);
    let buffer = TextBuffer::new(BufferId::new(1), Some(file()), &text);
    let painter = StyleRegistry::default().painter(PainterCategory::Result);

    c.bench_function("highlight/add_remove_200", |b| {
        b.iter(|| {
            let mut engine = HighlightLayerEngine::new(buffer.id());
            let handles: Vec<_> = (0..200)
                .map(|i| engine.add_highlight(&buffer, i * 10, i * 10 + 5, painter).unwrap())
                .collect();
            for handle in handles {
                engine.remove_region(handle);
            }
            black_box(engine.len());
        })
    });
}

criterion_group!(
    benches,
    bench_index_build,
    bench_typing_with_anchors,
    bench_caret_lookup,
    bench_highlight_churn
);
criterion_main!(benches);

use criterion::{Criterion, criterion_group, criterion_main};
use fridge_engine::editing::{Cmd, apply};
use fridge_engine::search::{Query, search_document};
use fridge_engine::selection::Position;
use fridge_engine::visual::{reconstruct, render};
use fridge_engine::Document;

fn generate_content(paragraphs: usize) -> String {
    let line = "Paragraph with some content,\u{3000}mixed 全角 text and a few words to search.";
    vec![line; paragraphs].join("\n")
}

fn bench_editing(c: &mut Criterion) {
    let mut group = c.benchmark_group("editing");
    group.sample_size(10);

    let doc = Document::new(Some("Benchmark"), &generate_content(1000));
    let root = render(&doc);

    group.bench_function("render", |b| {
        b.iter(|| std::hint::black_box(render(std::hint::black_box(&doc))));
    });

    group.bench_function("reconstruct", |b| {
        b.iter(|| std::hint::black_box(reconstruct(std::hint::black_box(&root))));
    });

    group.bench_function("search_literal", |b| {
        let query = Query::literal("words");
        b.iter(|| std::hint::black_box(search_document(&doc, &query)));
    });

    group.bench_function("split_block", |b| {
        let target = doc.blocks()[500].id().clone();
        b.iter(|| {
            let mut d = doc.clone();
            let caret = apply(
                &mut d,
                Cmd::SplitBlock {
                    at: Position::new(target.clone(), std::hint::black_box(10)),
                },
            );
            std::hint::black_box(caret)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_editing);
criterion_main!(benches);

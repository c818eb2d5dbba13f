use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use draftloom_engine::editing::{Cmd, Document, MarkupKind};

mod common;

fn bench_markup_commands(c: &mut Criterion) {
    let mut group = c.benchmark_group("markup_commands");
    group.sample_size(20);

    let mut doc = common::seeded_document(50);
    let target = doc.blocks()[25].id;
    doc.apply(Cmd::SelectionChanged {
        block_id: target,
        from: 0,
        to: 9,
    });

    group.bench_function("apply_bold", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut doc| {
                let patch = doc.apply(Cmd::ApplyMarkup {
                    kind: MarkupKind::Bold,
                    url: None,
                });
                black_box(patch);
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("toggle_bold_off", |b| {
        b.iter_batched(
            || {
                let mut doc = doc.clone();
                doc.apply(Cmd::ApplyMarkup {
                    kind: MarkupKind::Bold,
                    url: None,
                });
                doc
            },
            |mut doc| {
                let patch = doc.apply(Cmd::ApplyMarkup {
                    kind: MarkupKind::Bold,
                    url: None,
                });
                black_box(patch);
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("apply_link", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut doc| {
                let patch = doc.apply(Cmd::ApplyMarkup {
                    kind: MarkupKind::Link,
                    url: Some("https://example.com/reference".to_string()),
                });
                black_box(patch);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_range_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_replay");
    group.sample_size(20);

    let mut doc = Document::with_defaults();
    doc.apply(Cmd::InsertParagraph {
        text: "x".repeat(120),
        markups: common::many_ranges(32),
    });
    let target = doc.blocks()[1].id;

    group.bench_function("replay_32_ranges_on_edit", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut doc| {
                let patch = doc.apply(Cmd::TextChanged {
                    block_id: target,
                    text: "x".repeat(121),
                    markups: vec![],
                });
                black_box(patch);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_markup_commands, bench_range_replay);
criterion_main!(benches);

use bufview::{MountPoint, Position, RopeDocument, ViewNode, patch, render, view};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn list(items: &[String], selected: usize) -> ViewNode {
    let rows = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = if i == selected { ">" } else { " " };
            view!("{} {}: {}\n", marker, format!("{i:04}"), item.as_str())
        })
        .collect::<Vec<_>>();
    view!("{} items\n{}-- end --\n", items.len(), rows)
}

fn items(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("the quick brown fox jumps over the lazy dog #{i}"))
        .collect()
}

fn document() -> RopeDocument {
    let mut text = String::new();
    for i in 0..1_000 {
        text.push_str(&format!("{i:04} surrounding buffer line\n"));
    }
    RopeDocument::new(&text)
}

fn bench_initial_render(c: &mut Criterion) {
    let tree_view = list(&items(5_000), 0);
    c.bench_function("render/5k_rows", |b| {
        b.iter_batched(
            document,
            |mut doc| {
                let tree = render(
                    &mut doc,
                    black_box(&tree_view),
                    MountPoint::point(Position::new(500, 0)),
                )
                .unwrap();
                black_box(tree.end());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_patch_selection_move(c: &mut Criterion) {
    let items = items(5_000);
    let mut doc = document();
    let tree = render(
        &mut doc,
        &list(&items, 0),
        MountPoint::point(Position::new(500, 0)),
    )
    .unwrap();
    let next = list(&items, 2_500);

    c.bench_function("patch/move_selection_5k_rows", |b| {
        b.iter_batched(
            || (doc.clone(), tree.clone()),
            |(mut doc, tree)| {
                let tree = patch(&mut doc, &tree, black_box(&next), tree.range()).unwrap();
                black_box(tree.end());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_patch_append(c: &mut Criterion) {
    let mut items = items(5_000);
    let mut doc = document();
    let tree = render(
        &mut doc,
        &list(&items, 0),
        MountPoint::point(Position::new(500, 0)),
    )
    .unwrap();
    items.extend((0..100).map(|i| format!("appended {i}")));
    let next = list(&items, 0);

    c.bench_function("patch/append_100_rows", |b| {
        b.iter_batched(
            || (doc.clone(), tree.clone()),
            |(mut doc, tree)| {
                let tree = patch(&mut doc, &tree, black_box(&next), tree.range()).unwrap();
                black_box(tree.end());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_initial_render,
    bench_patch_selection_move,
    bench_patch_append
);
criterion_main!(benches);

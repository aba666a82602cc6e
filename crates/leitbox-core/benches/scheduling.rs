//! Benchmarks for the scheduler hot path: due-set filtering and review
//! application over a realistic card population.

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use leitbox_core::model::Card;
use leitbox_core::scheduler::{apply_review, is_due, BoxIntervals};

fn make_cards(n: usize) -> Vec<Card> {
    let now = Utc::now();
    (0..n)
        .map(|i| {
            let mut card = Card::new(1, &format!("word{i}"), "tr", "def", now);
            card.box_level = (i % 5 + 1) as u8;
            card.due_at = now + Duration::minutes(i as i64 % 60 - 30);
            card
        })
        .collect()
}

fn bench_due_filtering(c: &mut Criterion) {
    let cards = make_cards(10_000);
    let now = Utc::now();

    c.bench_function("due_set_10k_cards", |b| {
        b.iter(|| {
            let due: Vec<&Card> = cards.iter().filter(|card| is_due(card, now)).collect();
            black_box(due.len())
        })
    });
}

fn bench_apply_review(c: &mut Criterion) {
    let intervals = BoxIntervals::default();
    let cards = make_cards(100);
    let now = Utc::now();

    c.bench_function("apply_review_100_cards", |b| {
        b.iter(|| {
            for (i, card) in cards.iter().enumerate() {
                let updated = apply_review(card, i % 2 == 0, now, &intervals).unwrap();
                black_box(updated.box_level);
            }
        })
    });
}

criterion_group!(benches, bench_due_filtering, bench_apply_review);
criterion_main!(benches);

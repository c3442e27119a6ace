// Criterion benchmarks for EduCycle

use std::collections::HashMap;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use educycle::core::{aggregate_reputation, haversine_distance, within_radius, VisibilityRanker};
use educycle::models::{Book, Coordinates, Feedback, ReputationPolicy, Role, User};

fn create_user(id: usize, role: Role) -> User {
    User {
        uid: id.to_string(),
        role,
        email: None,
        display_name: Some(format!("User {}", id)),
        organization_name: None,
        city: Some("Chennai".to_string()),
        area: Some("Adyar".to_string()),
        reputation: Some(1.0 + (id % 40) as f64 / 10.0),
        mismatch_count: (id % 5) as u32,
        coordinates: None,
        blocked_uids: vec![],
        created_at: None,
    }
}

fn create_book(id: usize, donor: usize) -> Book {
    Book {
        id: id.to_string(),
        donor_uid: donor.to_string(),
        donor_name: None,
        title: format!("Book {}", id),
        subject: "Maths".to_string(),
        class_level: "10".to_string(),
        board: "CBSE".to_string(),
        condition: "good".to_string(),
        city: "Chennai".to_string(),
        area: "Adyar".to_string(),
        description: None,
        image_urls: vec![],
        available: true,
        created_at: Utc::now(),
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(13.0827),
                black_box(80.2707),
                black_box(13.0012),
                black_box(80.2565),
            )
        });
    });
}

fn bench_within_radius(c: &mut Criterion) {
    let center = Coordinates::new(13.0827, 80.2707);
    let mut group = c.benchmark_group("within_radius");

    for count in [10, 100, 1000].iter() {
        let candidates: Vec<(User, Coordinates)> = (0..*count)
            .map(|i| {
                let offset = (i as f64 * 0.001) % 0.5;
                (
                    create_user(i, Role::Ngo),
                    Coordinates::new(13.0827 + offset, 80.2707 - offset),
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| within_radius(black_box(center), black_box(20.0), candidates.clone()));
        });
    }

    group.finish();
}

fn bench_visibility_rank(c: &mut Criterion) {
    let ranker = VisibilityRanker::default();
    let owners: HashMap<String, User> = (0..100)
        .map(|i| (i.to_string(), create_user(i, Role::Student)))
        .collect();

    let mut group = c.benchmark_group("visibility_rank");

    for count in [50, 500, 5000].iter() {
        let books: Vec<Book> = (0..*count).map(|i| create_book(i, i % 120)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| ranker.rank(books.clone(), black_box(&owners), None));
        });
    }

    group.finish();
}

fn bench_aggregate_reputation(c: &mut Criterion) {
    let policy = ReputationPolicy::default();
    let feedback: Vec<Feedback> = (0..500)
        .map(|i| Feedback {
            id: i.to_string(),
            from_uid: format!("reader-{}", i),
            to_uid: "donor".to_string(),
            rating: (1 + i % 5) as f64,
            condition_matched: if i % 7 == 0 { Some(false) } else { Some(true) },
            request_id: None,
            comment: None,
            created_at: Utc::now(),
        })
        .collect();

    c.bench_function("aggregate_reputation_500", |b| {
        b.iter(|| aggregate_reputation(black_box(&feedback), &policy));
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_within_radius,
    bench_visibility_rank,
    bench_aggregate_reputation
);
criterion_main!(benches);

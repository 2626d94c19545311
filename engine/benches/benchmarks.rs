//! Performance benchmarks for roster-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roster_engine::{
    reconcile, Company, ListQuery, RecordStore, SortOrder, TempIdAllocator, User, UserPayload,
};

fn populate(size: usize) -> Vec<User> {
    (1..=size)
        .map(|i| User {
            id: i as i64,
            name: format!("User {}", i),
            username: format!("user{}", i),
            email: format!("user{}@test.com", size - i),
            company: Company {
                name: format!("Company {}", i % 7),
                ..Company::default()
            },
            ..User::default()
        })
        .collect()
}

fn bench_store_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_operations");

    group.bench_function("speculative_create", |b| {
        let mut store = RecordStore::with_users(populate(1000)).unwrap();
        let mut ids = TempIdAllocator::new();
        let payload = UserPayload::new("Test User", "test@example.com", "1", "Co");

        b.iter(|| {
            let temp = reconcile::speculative_user(ids.next(1000), &payload);
            store.replace(|users| reconcile::prepend(users, black_box(&temp)))
        })
    });

    group.bench_function("find", |b| {
        let store = RecordStore::with_users(populate(1000)).unwrap();
        b.iter(|| store.find(black_box(500)))
    });

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("snapshot", size), size, |b, &size| {
            let store = RecordStore::with_users(populate(size)).unwrap();
            b.iter(|| store.snapshot())
        });
    }

    group.finish();
}

fn bench_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("swap_in", size), size, |b, &size| {
            let payload = UserPayload::new("Ada", "ada@x.com", "1", "Co");
            let mut users = populate(size);
            let temp = reconcile::speculative_user(-1, &payload);
            users.insert(size / 2, temp.clone());
            let confirmed = User {
                id: size as i64 + 1,
                ..temp.clone()
            };
            let merged = reconcile::merge_create(&temp, &confirmed, &payload);

            b.iter(|| reconcile::swap_in(black_box(&users), -1, black_box(&merged)))
        });

        group.bench_with_input(BenchmarkId::new("resolve_temp_id", size), size, |b, &size| {
            let users = populate(size);
            let payload = UserPayload::new("User 1", "nobody@x.com", "1", "Co");
            let policy = Default::default();

            b.iter(|| reconcile::resolve_temp_id(black_box(&users), &payload, &policy))
        });
    }

    group.finish();
}

fn bench_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("view");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("search_sort_page", size), size, |b, &size| {
            let users = populate(size);
            let query = ListQuery::new()
                .search("user 1")
                .sort_by_email(SortOrder::Desc)
                .page(2);

            b.iter(|| query.apply(black_box(&users)).total_items)
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    group.bench_function("users_from_json", |b| {
        let json = serde_json::to_string(&populate(10)).unwrap();
        b.iter(|| serde_json::from_str::<Vec<User>>(black_box(&json)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_store_operations,
    bench_reconciliation,
    bench_view,
    bench_serialization,
);
criterion_main!(benches);

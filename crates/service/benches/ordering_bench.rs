use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::catalog::domain::{CatalogEntry, Direction, Prices, ServiceFields};
use service::catalog::ordering::{plan_move_to, plan_normalize};
use service::catalog::repository::memory::InMemoryCatalogRepository;
use service::catalog::CatalogService;

fn catalog(n: usize) -> Vec<CatalogEntry> {
    (0..n)
        .map(|i| CatalogEntry {
            name: format!("Service {i:04}"),
            position: Some(i as i32 + 1),
            visible: true,
            prices: Prices { bike: None, sedan: Some(100 + i as i32), suv: None },
            description: None,
            updated_at: chrono::Utc::now(),
        })
        .collect()
}

fn bench_planner(c: &mut Criterion) {
    let dense = catalog(200);
    c.bench_function("plan_move_to_top_200", |b| {
        b.iter(|| plan_move_to(black_box(&dense), "Service 0199", 1).unwrap());
    });

    // 位置全部颠倒，最坏情况的重排
    let mut reversed = catalog(200);
    for (i, e) in reversed.iter_mut().enumerate() {
        e.position = Some(1000 - i as i32);
    }
    c.bench_function("plan_normalize_reversed_200", |b| {
        b.iter(|| plan_normalize(black_box(&reversed)));
    });
}

fn bench_service(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let svc = CatalogService::new(Arc::new(InMemoryCatalogRepository::with_entries(catalog(50))));
    rt.block_on(svc.upsert("Bench Wash", ServiceFields::default(), None)).unwrap();

    c.bench_function("catalog_move_up_down", |b| {
        b.iter(|| {
            rt.block_on(svc.move_entry("Bench Wash", Direction::Up)).unwrap();
            rt.block_on(svc.move_entry("Bench Wash", Direction::Down)).unwrap();
        });
    });
}

criterion_group!(benches, bench_planner, bench_service);
criterion_main!(benches);

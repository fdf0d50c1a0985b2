// Query and storage performance benchmarks.
//
// Run with: cargo bench
//
// Performance Targets:
// | Operation                | Target  | Description                         |
// |--------------------------|---------|-------------------------------------|
// | Evaluate (1k)            | < 1ms   | Filter + sort 1000 tickets in memory |
// | Evaluate (10k)           | < 15ms  | Filter + sort 10000 tickets          |
// | List page (1k, SQLite)   | < 10ms  | list_tickets on a 1000-ticket store  |
// | Create                   | < 1ms   | Single ticket insert with event      |

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tix::model::{NewTicket, Priority, Status, Ticket};
use tix::query::{OrderBy, OrderDir, TicketQuery, evaluate, run};
use tix::storage::SqliteStorage;

fn make_ticket(i: usize) -> Ticket {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let minutes = i64::try_from(i).expect("index fits i64");
    let status = match i % 3 {
        0 => Status::Open,
        1 => Status::InProgress,
        _ => Status::Resolved,
    };
    let created_at = base + Duration::minutes(minutes);
    Ticket {
        id: minutes + 1,
        title: format!("Benchmark ticket {i}"),
        description: if i % 7 == 0 {
            format!("Auth failure number {i}")
        } else {
            format!("Routine description {i}")
        },
        status,
        priority: Priority::ALL[i % 3],
        tags: vec![format!("tag{}", i % 10)],
        created_at,
        updated_at: created_at + Duration::minutes(minutes % 17),
        resolved_at: status.is_resolved().then_some(created_at),
    }
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for size in [1_000usize, 10_000] {
        let tickets: Vec<Ticket> = (0..size).map(make_ticket).collect();
        group.throughput(Throughput::Elements(u64::try_from(size).unwrap_or(u64::MAX)));

        let by_priority = TicketQuery {
            order_by: OrderBy::Priority,
            order_dir: OrderDir::Desc,
            ..TicketQuery::default()
        };
        group.bench_with_input(BenchmarkId::new("sort_priority", size), &tickets, |b, t| {
            b.iter(|| evaluate(black_box(t.clone()), black_box(&by_priority)));
        });

        let search = TicketQuery {
            search: Some("auth".to_string()),
            status: Some(Status::Open),
            order_by: OrderBy::Title,
            ..TicketQuery::default()
        };
        group.bench_with_input(BenchmarkId::new("search_title", size), &tickets, |b, t| {
            b.iter(|| run(black_box(t.clone()), black_box(&search)));
        });
    }
    group.finish();
}

fn seeded_storage(size: usize) -> SqliteStorage {
    let mut storage = SqliteStorage::open_memory().expect("open storage");
    for i in 0..size {
        storage
            .create_ticket(&NewTicket {
                title: format!("Stored ticket {i}"),
                description: format!("Stored description {i}"),
                priority: Priority::ALL[i % 3],
                tags: vec![format!("tag{}", i % 10)],
            })
            .expect("create ticket");
    }
    storage
}

fn bench_list_tickets(c: &mut Criterion) {
    let storage = seeded_storage(1_000);
    let query = TicketQuery {
        priority: Some(Priority::High),
        order_by: OrderBy::UpdatedAt,
        ..TicketQuery::default()
    };
    c.bench_function("list_tickets_1k", |b| {
        b.iter(|| storage.list_tickets(black_box(&query)).expect("list"));
    });
}

fn bench_create(c: &mut Criterion) {
    let mut storage = SqliteStorage::open_memory().expect("open storage");
    let mut counter = 0usize;
    c.bench_function("create_ticket", |b| {
        b.iter(|| {
            counter += 1;
            storage
                .create_ticket(&NewTicket {
                    title: format!("Created in bench {counter}"),
                    ..NewTicket::default()
                })
                .expect("create")
        });
    });
}

criterion_group!(query_benches, bench_evaluate);
criterion_group!(storage_benches, bench_list_tickets, bench_create);
criterion_main!(query_benches, storage_benches);

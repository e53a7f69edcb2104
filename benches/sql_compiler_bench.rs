use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sql_filter::formatter::PostgresFormatter;
use sql_filter::parser::parse_json;
use sql_filter::SqlQuery;
use std::hint::black_box;

const TEST_CASES: [(&str, &str); 4] = [
    ("simple", r#"{"status": "Open"}"#),
    ("medium", r#"{"status": "Open", "priority": {"$gt": 2}, "assignee": {"$ne": "bob"}}"#),
    (
        "complex",
        r#"{"title": "Release Plan", "$or": [{"version": "v1"}, {"version": "v2"}], "priority": {"$bt": [1, 5]}}"#,
    ),
    ("large_in", r#"{"id": {"$in": [1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20]}}"#),
];

// 创建一个编译器实例并设置允许字段与映射
fn create_compiler() -> SqlQuery {
    let mut compiler = SqlQuery::new();
    compiler
        .gate_mut()
        .allow(["status", "priority", "assignee", "title", "version", "id"])
        .set_mapping("assignee", "assignee_id");
    compiler
}

// 基准测试：JSON 解析性能
fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, json) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("parse", name), &json, |b, &json| {
            b.iter(|| black_box(parse_json(black_box(json)).expect("解析应该成功")))
        });
    }

    group.finish();
}

// 基准测试：SQL编译性能
fn benchmark_sql_compiler(c: &mut Criterion) {
    let compiler = create_compiler();
    let mut postgres = SqlQuery::with_formatter(PostgresFormatter);
    postgres
        .gate_mut()
        .allow(["status", "priority", "assignee", "title", "version", "id"]);

    let mut group = c.benchmark_group("sql_compiler_performance");

    for (name, json) in TEST_CASES {
        let tree = parse_json(json).expect("解析应该成功");

        group.bench_with_input(BenchmarkId::new("literal", name), &tree, |b, tree| {
            b.iter(|| black_box(compiler.compile(black_box(tree), Some("t"))))
        });
        group.bench_with_input(BenchmarkId::new("postgres", name), &tree, |b, tree| {
            b.iter(|| black_box(postgres.compile(black_box(tree), Some("t"))))
        });
    }

    group.finish();
}

// 基准测试：完整的端到端处理
fn benchmark_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, json) in TEST_CASES {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), &json, |b, &json| {
            b.iter(|| {
                let compiler = create_compiler();
                let sql = compiler.compile_json(black_box(json), None).expect("编译应该成功");
                black_box(sql)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser, benchmark_sql_compiler, benchmark_end_to_end);
criterion_main!(benches);

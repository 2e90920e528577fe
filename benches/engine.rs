use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rowsmith::codec::{self, ParseOptions};
use rowsmith::data::Row;
use rowsmith::join::{JoinStrategy, JoinType, join};
use rowsmith::{profile, replace, transform};

fn generate_customers(rows: usize) -> String {
    let mut text = String::from("id,name,email,city,spend\n");
    for i in 0..rows {
        let city = match i % 4 {
            0 => "Lisbon",
            1 => " Porto ",
            2 => "",
            _ => "BRAGA",
        };
        let spend = if i % 7 == 0 {
            String::new()
        } else {
            format!("{}.{:02}", i % 500, i % 100)
        };
        text.push_str(&format!(
            "{},Customer {},user{}@example.com,{city},{spend}\n",
            i % (rows / 2).max(1),
            i % 97,
            i % 211
        ));
    }
    text
}

fn load(rows: usize) -> Vec<Row> {
    let text = generate_customers(rows);
    codec::parse_delimited(&text, "customers.csv", b',')
        .expect("parse generated csv")
        .dataset
        .rows
}

fn bench_engine(c: &mut Criterion) {
    let text = generate_customers(20_000);
    let rows = load(20_000);
    let lookup = load(2_000);

    let mut group = c.benchmark_group("engine");

    group.bench_function("parse_delimited", |b| {
        b.iter(|| codec::parse(&text, codec::Format::Delimited, "customers.csv", &ParseOptions::default()))
    });

    group.bench_function("profile", |b| b.iter(|| profile::profile(&rows)));

    group.bench_function("replace_regex_all_columns", |b| {
        b.iter(|| {
            replace::replace(
                &rows,
                replace::ALL_COLUMNS,
                r"user(\d+)@example\.com",
                "member-$1",
                false,
                true,
            )
        })
    });

    group.bench_function("trim_then_dedupe", |b| {
        b.iter_batched(
            || transform::trim_whitespace(&rows),
            |trimmed| transform::remove_duplicates(&trimmed),
            BatchSize::LargeInput,
        );
    });

    let strategy = JoinStrategy::new(JoinType::Outer, "id", "id");
    group.bench_function("outer_join", |b| b.iter(|| join(&rows, &lookup, &strategy)));

    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);

use book_charts::aggregate::{flow_graph, grouped_average, top_categories};
use book_charts::config::LayoutConfig;
use book_charts::data::{parse_dataset, Record};
use book_charts::layout::{compute_layout, layout_flow, ChartData, ChartKind, Rect, Size};
use book_charts::render::{paint_chart, render_svg, Scene};
use book_charts::theme::Theme;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const GENRES: [&str; 12] = [
    "Fantasy",
    "Sci-Fi",
    "Fiction",
    "Thriller",
    "Historical Fiction",
    "Romance",
    "Mystery",
    "Horror",
    "Memoir",
    "Poetry",
    "Classics",
    "Young Adult Fiction",
];
const AGES: [&str; 3] = ["Children", "Young Adult", "Adult"];

/// Deterministic books CSV with `rows` records and one to three genres each.
fn synthetic_csv(rows: usize) -> String {
    let mut out = String::from("title,genre,age_category,rating_average,adapted_to_movie\n");
    for i in 0..rows {
        let genre_count = 1 + i % 3;
        let genres: Vec<&str> = (0..genre_count)
            .map(|g| GENRES[(i * 7 + g * 5) % GENRES.len()])
            .collect();
        let rating = 2.5 + ((i * 37) % 25) as f64 / 10.0;
        let adapted = if i % 4 == 0 { "TRUE" } else { "FALSE" };
        out.push_str(&format!(
            "Book {i},\"{}\",{},{rating:.1},{adapted}\n",
            genres.join(", "),
            AGES[(i * 11) % AGES.len()],
        ));
    }
    out
}

fn records(rows: usize) -> Vec<Record> {
    parse_dataset(synthetic_csv(rows).as_bytes())
        .expect("synthetic csv parses")
        .records
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for rows in [100usize, 1_000, 10_000] {
        let input = synthetic_csv(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &input, |b, data| {
            b.iter(|| {
                let dataset = parse_dataset(black_box(data.as_bytes())).expect("parse failed");
                black_box(dataset.records.len());
            });
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for rows in [1_000usize, 10_000] {
        let data = records(rows);
        group.bench_with_input(BenchmarkId::new("top_categories", rows), &data, |b, data| {
            b.iter(|| black_box(top_categories(black_box(data), 5)));
        });
        group.bench_with_input(BenchmarkId::new("grouped_average", rows), &data, |b, data| {
            b.iter(|| black_box(grouped_average(black_box(data), 6)));
        });
        group.bench_with_input(BenchmarkId::new("flow_graph", rows), &data, |b, data| {
            b.iter(|| black_box(flow_graph(black_box(data), 5)));
        });
    }
    group.finish();
}

fn bench_flow_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_layout");
    let extent = Rect {
        x: 40.0,
        y: 40.0,
        width: 1120.0,
        height: 400.0,
    };
    for k in [5usize, 12] {
        let graph = flow_graph(&records(5_000), k);
        group.bench_with_input(BenchmarkId::from_parameter(k), &graph, |b, graph| {
            b.iter(|| black_box(layout_flow(black_box(graph), extent, 24.0, 17.0)));
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let theme = Theme::classic();
    let config = LayoutConfig {
        fast_text_metrics: true,
        ..LayoutConfig::default()
    };
    let data = records(2_000);
    for kind in ChartKind::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(kind.name()), &data, |b, data| {
            b.iter(|| {
                let chart = ChartData::aggregate(kind, black_box(data), &config);
                let mut scene = Scene::new();
                if let Some(layout) =
                    compute_layout(&chart, Size::new(1200.0, 800.0), &theme, &config)
                {
                    paint_chart(&layout, &mut scene, &theme);
                }
                black_box(render_svg(&scene, &theme).len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_aggregate, bench_flow_layout, bench_end_to_end
);
criterion_main!(benches);

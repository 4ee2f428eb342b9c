use pure_richtext::{
    Document, EditingSession, EditorConfig, ManualClock, SelectionOffsets, TreeInterpreter,
    document::{collect_segments, markup},
    inspect, restore_selection, save_selection,
};
use std::time::{Duration, Instant};

/// Performance benchmark suite for the editing core
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Markup parsing and serialization
/// - Selection save/restore over large trees
/// - Format state inspection
/// - Full command round trips through a session
const SMALL_DOC_PARAGRAPHS: usize = 10;
const MEDIUM_DOC_PARAGRAPHS: usize = 100;
const LARGE_DOC_PARAGRAPHS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: &[&str] = &[
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
];

/// Markup with headings, lists and nested inline formatting.
fn create_test_markup(num_paragraphs: usize, words_per_para: usize) -> String {
    let mut out = String::new();
    for i in 0..num_paragraphs {
        let mut text = String::new();
        for j in 0..words_per_para {
            if j > 0 {
                text.push(' ');
            }
            text.push_str(SAMPLE_WORDS[(i + j) % SAMPLE_WORDS.len()]);
        }
        let block = match i % 6 {
            0 => format!("<h2>{text}</h2>"),
            1 => format!("<p><b>{text}</b> tail</p>"),
            2 => format!("<p><span style=\"color: #1c7ed6;\">{text} <i>nested</i></span></p>"),
            3 => format!("<ul><li>{text}</li><li>second</li></ul>"),
            4 => format!("<p style=\"text-align: center;\">{text}</p>"),
            _ => format!("<p>{text}</p>"),
        };
        out.push_str(&block);
    }
    out
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn sizes() -> Vec<(&'static str, String)> {
    vec![
        ("Small (10 blocks)", create_test_markup(SMALL_DOC_PARAGRAPHS, 20)),
        ("Medium (100 blocks)", create_test_markup(MEDIUM_DOC_PARAGRAPHS, 20)),
        ("Large (1000 blocks)", create_test_markup(LARGE_DOC_PARAGRAPHS, 20)),
    ]
}

#[test]
fn bench_markup_round_trip() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║              MARKUP PARSE / SERIALIZE BENCHMARKS               ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, source) in sizes() {
        let result = benchmark(&format!("parse - {name}"), ITERATIONS, || {
            let _ = markup::parse(&source).unwrap();
        });
        result.print();

        let root = markup::parse(&source).unwrap();
        let result = benchmark(&format!("serialize - {name}"), ITERATIONS, || {
            let _ = markup::serialize(&root);
        });
        result.print();
    }
}

#[test]
fn bench_selection_mapping() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                SELECTION SAVE / RESTORE BENCHMARKS             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, source) in sizes() {
        let document = Document::parse(&source).unwrap();
        let root = document.root();
        let total = document.text_len();
        let offsets = SelectionOffsets::new(total / 3, total - total / 3);

        let result = benchmark(&format!("restore_selection - {name}"), ITERATIONS, || {
            let _ = restore_selection(root, offsets);
        });
        result.print();

        let selection = restore_selection(root, offsets).unwrap();
        let result = benchmark(&format!("save_selection - {name}"), ITERATIONS, || {
            let _ = save_selection(root, &selection.anchor, &selection.focus);
        });
        result.print();

        let result = benchmark(&format!("collect_segments - {name}"), ITERATIONS, || {
            let _ = collect_segments(root);
        });
        result.print();
    }
}

#[test]
fn bench_format_inspection() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                  FORMAT STATE INSPECTION                       ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let interpreter = TreeInterpreter::new();
    let config = EditorConfig::default();
    for (name, source) in sizes() {
        let document = Document::parse(&source).unwrap();
        let root = document.root();
        let caret = restore_selection(root, SelectionOffsets::caret(document.text_len() / 2)).unwrap();
        let result = benchmark(&format!("inspect caret - {name}"), ITERATIONS, || {
            let _ = inspect(root, Some(&caret), &interpreter, &config);
        });
        result.print();
    }
}

#[test]
fn bench_command_round_trip() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           COMMAND ROUND TRIP (save → edit → restore)           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, source) in sizes() {
        let clock = ManualClock::new();
        let mut session = EditingSession::with_parts(
            Some(&source),
            EditorConfig::default(),
            TreeInterpreter::new(),
            clock.clone(),
        );
        let total = session.document().text_len();
        session.select_offsets(total / 4, total / 4 + 40);

        let result = benchmark(&format!("toggle bold - {name}"), ITERATIONS, || {
            session.format_text("bold", None);
        });
        result.print();

        session.select_offsets(total / 2, total / 2);
        let result = benchmark(&format!("type text - {name}"), ITERATIONS, || {
            session.type_text("x");
            clock.advance_ms(50);
            session.tick();
        });
        result.print();

        let result = benchmark(&format!("undo + redo - {name}"), 20, || {
            session.undo();
            session.redo();
        });
        result.print();
    }
}

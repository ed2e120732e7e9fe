use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rtf::perf_fixtures::{make_blocks, make_nested};
use rtf::{ParserConfig, RtfParser, TextDocument, parse_document, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(input.as_bytes()));
            black_box(tokens.len());
        });
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(input.as_bytes()));
            black_box(tokens.len());
        });
    });
}

fn bench_parse_large_end_to_end(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_large_end_to_end", |b| {
        b.iter(|| {
            let parser = parse_document(black_box(input.as_bytes()));
            black_box(parser.document().runs().len());
        });
    });
}

fn bench_parse_deep_nesting(c: &mut Criterion) {
    let input = make_nested(10_000);
    c.bench_function("bench_parse_deep_nesting", |b| {
        b.iter(|| {
            let parser = parse_document(black_box(input.as_bytes()));
            black_box(parser.stats().frames_discarded);
        });
    });
}

fn bench_streaming_chunked(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let bytes = input.as_bytes();
    let chunk_sizes = [1usize, 2, 3, 7, 64, 128, 256, 1024];
    c.bench_function("bench_streaming_chunked", |b| {
        b.iter_batched(
            || RtfParser::new(TextDocument::new(), ParserConfig::default()),
            |mut parser| {
                let mut offset = 0usize;
                let mut size_idx = 0usize;
                while offset < bytes.len() {
                    let size = chunk_sizes[size_idx % chunk_sizes.len()];
                    let end = (offset + size).min(bytes.len());
                    parser.push_bytes(&bytes[offset..end]);
                    offset = end;
                    size_idx += 1;
                }
                parser.finish();
                black_box(parser.into_document());
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_parse_large_end_to_end,
    bench_parse_deep_nesting,
    bench_streaming_chunked
);
criterion_main!(benches);

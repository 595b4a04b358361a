//! Benchmark for config parsing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use parley::config::ParleyConfig;
use std::path::Path;

fn bench_config_load_from_file(c: &mut Criterion) {
    let config_path = Path::new("parley.example.toml");

    c.bench_function("config_parse_from_file", |b| {
        b.iter(|| {
            let config = ParleyConfig::load(Some(black_box(config_path)));
            black_box(config)
        });
    });
}

fn bench_config_load_defaults(c: &mut Criterion) {
    c.bench_function("config_parse_defaults_only", |b| {
        b.iter(|| {
            let config = ParleyConfig::load(None);
            black_box(config)
        });
    });
}

fn bench_config_toml_parsing(c: &mut Criterion) {
    let toml_content = r#"
[api]
base_url = "https://chat.example.com"
timeout_seconds = 20
chat_path = "/chat/"
max_message_length = 500

[chat]
user_id = "bench_user"
warning_threshold = 400
health_poll_seconds = 30
locale = "sv"

[auth]
token_env = "PARLEY_ADMIN_TOKEN"

[storage]
persist_conversation = false

[logging]
level = "info"
format = "json"

[logging.component_levels]
client = "debug"
chat = "trace"
"#;

    c.bench_function("config_toml_parse", |b| {
        b.iter(|| {
            let config = ParleyConfig::from_toml(black_box(toml_content));
            black_box(config)
        });
    });

    c.bench_function("config_validate", |b| {
        let config = ParleyConfig::from_toml(toml_content).unwrap();
        b.iter(|| black_box(config.validate()));
    });
}

criterion_group!(
    benches,
    bench_config_load_from_file,
    bench_config_load_defaults,
    bench_config_toml_parsing
);
criterion_main!(benches);

//! Parser and framer hot-path benchmarks.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio_util::codec::Decoder;

use irc_engine::{Line, LineFramer};

fn bench_parse(c: &mut Criterion) {
    let simple = "PING :irc.example.com";
    let typical = ":nick!user@host.example.com PRIVMSG #channel :Hello there, how are you today?";
    let tagged = "@time=2023-06-15T10:30:00.000Z;msgid=63E1033A0A :nick!user@host PRIVMSG #channel :tagged message body";
    let numeric = ":irc.server 353 me = #channel :@op +voice alice bob carol dave erin frank grace";

    let mut group = c.benchmark_group("parse");
    for (name, input) in [
        ("simple", simple),
        ("typical", typical),
        ("tagged", tagged),
        ("names_numeric", numeric),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(input).parse::<Line>().unwrap())
        });
    }
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let burst: String = (0..50)
        .map(|i| format!(":nick{i}!u@h PRIVMSG #chan :message number {i}\r\n"))
        .collect();

    c.bench_function("frame_burst_50", |b| {
        b.iter(|| {
            let mut framer = LineFramer::new();
            let mut buf = BytesMut::from(burst.as_str());
            let mut n = 0;
            while let Ok(Some(_)) = framer.decode(&mut buf) {
                n += 1;
            }
            black_box(n)
        })
    });
}

criterion_group!(benches, bench_parse, bench_frame);
criterion_main!(benches);

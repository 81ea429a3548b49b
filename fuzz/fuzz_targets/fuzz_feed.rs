#![no_main]
use std::cell::RefCell;

use arbitrary::{Arbitrary, Unstructured};
use httpmodem::{Event, FieldSet, ParserSession, ParserType, SessionOptions};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

const HEADER: usize = 5; // 1 flag + 4-byte seed

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "PATCH"];
const FRAMING: &[&str] = &[
    "Content-Length",
    "Transfer-Encoding",
    "Connection",
    "Upgrade",
    "Host",
    "X-Other",
];

/// Mostly well-formed message material for the mutator to start from.
#[derive(Debug, Arbitrary)]
struct ArbitraryMessage {
    method: u8,
    target: Vec<u8>,
    minor: bool,
    headers: Vec<(u8, Vec<u8>)>,
    body: Vec<u8>,
    chunked: bool,
}

impl ArbitraryMessage {
    fn render(&self, response: bool) -> Vec<u8> {
        let mut out = Vec::new();
        let minor = u8::from(self.minor);
        if response {
            out.extend_from_slice(format!("HTTP/1.{minor} 200 OK\r\n").as_bytes());
        } else {
            out.extend_from_slice(METHODS[usize::from(self.method) % METHODS.len()].as_bytes());
            out.push(b' ');
            out.push(b'/');
            out.extend(self.target.iter().map(|b| b.clamp(&b'!', &b'~')));
            out.extend_from_slice(format!(" HTTP/1.{minor}\r\n").as_bytes());
        }
        for (name, value) in &self.headers {
            out.extend_from_slice(FRAMING[usize::from(*name) % FRAMING.len()].as_bytes());
            out.extend_from_slice(b": ");
            out.extend(value.iter().map(|b| b.clamp(&b' ', &b'~')));
            out.extend_from_slice(b"\r\n");
        }
        if self.chunked {
            out.extend_from_slice(b"Transfer-Encoding: chunked\r\n\r\n");
            for chunk in self.body.chunks(7) {
                out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
                out.extend_from_slice(chunk);
                out.extend_from_slice(b"\r\n");
            }
            out.extend_from_slice(b"0\r\n\r\n");
        } else {
            out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", self.body.len()).as_bytes());
            out.extend_from_slice(&self.body);
        }
        out
    }
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8 & 0x03);
        data[1..5].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));
        let response = data[0] & 1 != 0;

        let mut prefix = HEADER;
        while prefix < max_size.min(size.max(HEADER + 64)) {
            let written = append_message(&mut data[prefix..max_size], response);
            if written == 0 {
                break;
            }
            prefix += written;
        }
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_message(buf: &mut [u8], response: bool) -> usize {
    let bytes: Vec<u8> = with_rng(|rng| {
        let len = rng.random_range(16..256);
        (0..len).map(|_| rng.random::<u8>()).collect()
    });
    let Ok(message) = ArbitraryMessage::arbitrary(&mut Unstructured::new(&bytes)) else {
        return 0;
    };
    let rendered = message.render(response);
    let len = rendered.len().min(buf.len());
    buf[..len].copy_from_slice(&rendered[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// Cuts `data` into non-empty chunks derived from `split_seed`.
fn split_into_chunks(data: &[u8], mut split_seed: u64) -> Vec<&[u8]> {
    let mut chunks = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        split_seed ^= split_seed << 13;
        split_seed ^= split_seed >> 7;
        split_seed ^= split_seed << 17;
        let size = (split_seed as usize % rest.len()) + 1;
        let (head, tail) = rest.split_at(size);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

fn coalesce(events: Vec<Event>) -> Vec<Event> {
    let mut out: Vec<Event> = Vec::with_capacity(events.len());
    for event in events {
        if let (Event::Body(next), Some(Event::Body(previous))) = (&event, out.last_mut()) {
            previous.extend_from_slice(next);
            continue;
        }
        out.push(event);
    }
    out
}

struct Run {
    events: Vec<Event>,
    consumed: usize,
    error: Option<httpmodem::TokenizerError>,
}

fn run<'a>(kind: ParserType, consumers: FieldSet, chunks: impl IntoIterator<Item = &'a [u8]>) -> Run {
    let mut session = ParserSession::new(
        kind,
        SessionOptions {
            consumers,
            ..SessionOptions::default()
        },
    )
    .unwrap();
    let mut run = Run {
        events: Vec::new(),
        consumed: 0,
        error: None,
    };
    for chunk in chunks {
        let feed = session.feed(chunk).unwrap();
        run.consumed += feed.consumed;
        run.error = feed.error;
        run.events.extend(feed.events);
        // An empty feed between chunks must not change anything.
        let empty = session.feed(&[]).unwrap();
        assert!(empty.events.is_empty() && empty.consumed == 0);
        assert_eq!(empty.error, run.error);
    }
    let end = session.finish().unwrap();
    run.error = end.error;
    run.events.extend(end.events);
    run.events = coalesce(run.events);
    run
}

fn feed(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u64::from(u32::from_le_bytes(data[1..5].try_into().unwrap())) | 1;
    let data = &data[HEADER..];
    if data.is_empty() {
        return;
    }

    let kind = if flags & 1 != 0 {
        ParserType::Response
    } else {
        ParserType::Request
    };
    let consumers = if flags & 2 != 0 {
        FieldSet::split_url()
    } else {
        FieldSet::combined_url()
    };

    let whole = run(kind, consumers, [data]);
    let split = run(kind, consumers, split_into_chunks(data, split_seed));

    // The tokenizer fails the same way however the input is cut; a clean
    // parse yields the same events.
    assert_eq!(whole.error, split.error);
    if whole.error.is_none() {
        assert_eq!(whole.consumed, split.consumed);
        assert_eq!(whole.events, split.events);
    }
}

fuzz_target!(|data: &[u8]| feed(data));

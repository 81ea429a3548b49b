use alloc::{vec, vec::Vec};

use rstest::rstest;

use super::utils::{coalesce_bodies, feed_chunks, request_session, response_session};
use crate::{
    Event, FieldId, FieldSet, Method, ParserSession, SessionOptions, UrlMode,
    tokenizer::ParserType,
};

const SIMPLE_GET: &[u8] = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";

fn header(field: &str, value: &str) -> Event {
    Event::Header {
        field: field.into(),
        value: value.into(),
    }
}

#[test]
fn simple_get_in_one_feed() {
    let mut session = request_session();
    let feed = session.feed(SIMPLE_GET).unwrap();
    assert_eq!(feed.consumed, SIMPLE_GET.len());
    assert!(feed.is_complete());
    assert_eq!(
        feed.events.into_vec(),
        vec![
            Event::MessageBegin,
            Event::Url("/index.html".into()),
            header("Host", "example.com"),
            Event::HeadersComplete,
            Event::MessageComplete,
        ]
    );
    assert_eq!(session.method(), Some(Method::Get));
    assert_eq!(session.http_version(), (1, 1));
    assert!(session.should_keep_alive());
    assert!(!session.in_message());
}

#[test]
fn every_two_way_split_matches_one_shot() {
    let expected = feed_chunks(&mut request_session(), [SIMPLE_GET]);
    for at in 0..=SIMPLE_GET.len() {
        let (head, tail) = SIMPLE_GET.split_at(at);
        let events = feed_chunks(&mut request_session(), [head, tail]);
        assert_eq!(events, expected, "split at {at}");
    }
}

#[test]
fn byte_at_a_time_matches_one_shot() {
    let expected = feed_chunks(&mut request_session(), [SIMPLE_GET]);
    let events = feed_chunks(&mut request_session(), SIMPLE_GET.chunks(1));
    assert_eq!(events, expected);
}

#[test]
fn header_value_split_across_feeds_is_held_back() {
    let mut session = request_session();
    let first = session.feed(b"GET / HTTP/1.1\r\nHost: exa").unwrap();
    assert_eq!(
        first.events.as_slice(),
        &[Event::MessageBegin, Event::Url("/".into())]
    );
    assert!(session.in_message());
    assert_eq!(session.pending_bytes(FieldId::HeaderValue), 3);
    assert_eq!(session.pending_fragments(FieldId::HeaderValue), 1);

    let second = session.feed(b"mple.com\r\nAccept: */*\r\n\r\n").unwrap();
    assert_eq!(
        second.events.into_vec(),
        vec![
            header("Host", "example.com"),
            header("Accept", "*/*"),
            Event::HeadersComplete,
            Event::MessageComplete,
        ]
    );
    assert_eq!(session.pending_bytes(FieldId::HeaderValue), 0);
}

#[test]
fn pending_header_name_is_visible_between_feeds() {
    let mut session = request_session();
    session.feed(b"GET / HTTP/1.1\r\nX-Tra").unwrap();
    assert!(session.pending_header_field());
    assert_eq!(session.pending_bytes(FieldId::HeaderField), 5);

    session.feed(b"ce:").unwrap();
    assert!(session.pending_header_field());
    assert_eq!(session.pending_bytes(FieldId::HeaderField), 7);

    session.feed(b" 1").unwrap();
    assert!(!session.pending_header_field());
}

#[test]
fn empty_header_value_still_pairs() {
    let events = feed_chunks(
        &mut request_session(),
        [&b"GET / HTTP/1.1\r\nX-Empty:\r\nX-Blank:   \r\nHost: h\r\n\r\n"[..]],
    );
    assert_eq!(
        events[2..5],
        [
            header("X-Empty", ""),
            header("X-Blank", ""),
            header("Host", "h"),
        ]
    );
}

#[test]
fn repeated_header_names_stay_separate_and_ordered() {
    let events = feed_chunks(
        &mut request_session(),
        [&b"GET / HTTP/1.1\r\nSet: a\r\nSet: b\r\nset: c\r\n\r\n"[..]],
    );
    let headers: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::Header { .. }))
        .cloned()
        .collect();
    assert_eq!(
        headers,
        [header("Set", "a"), header("Set", "b"), header("set", "c")]
    );
}

#[test]
fn identity_body_streams_one_event_per_fragment() {
    let mut session = request_session();
    let head = session
        .feed(b"POST /upload HTTP/1.1\r\nContent-Length: 10\r\n\r\n")
        .unwrap();
    assert_eq!(head.events.len(), 4);
    assert_eq!(head.events[3], Event::HeadersComplete);

    assert_eq!(
        session.feed(b"abc").unwrap().events.as_slice(),
        &[Event::Body("abc".into())]
    );
    assert_eq!(
        session.feed(b"defg").unwrap().events.as_slice(),
        &[Event::Body("defg".into())]
    );
    assert_eq!(
        session.feed(b"hij").unwrap().events.into_vec(),
        vec![
            Event::Body("hij".into()),
            Event::BodyEnd,
            Event::MessageComplete
        ]
    );
}

#[test]
fn chunked_body_reports_chunk_data_only() {
    let events = feed_chunks(
        &mut request_session(),
        [&b"POST /c HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5;ext=1\r\nhello\r\n6\r\n world\r\n0\r\nTrailer: x\r\n\r\n"[..]],
    );
    assert_eq!(
        events[3..],
        [
            Event::HeadersComplete,
            Event::Body("hello".into()),
            Event::Body(" world".into()),
            Event::BodyEnd,
            Event::MessageComplete,
        ]
    );
}

#[test]
fn zero_length_body_has_no_body_events() {
    let events = feed_chunks(
        &mut request_session(),
        [&b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n"[..]],
    );
    assert!(!events.iter().any(|event| matches!(event, Event::Body(_) | Event::BodyEnd)));
    assert_eq!(events.last(), Some(&Event::MessageComplete));
}

#[test]
fn pipelined_requests_come_out_in_order() {
    let mut session = request_session();
    let feed = session
        .feed(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\nContent-Length: 1\r\n\r\nx\r\nGET /c HTTP/1.1\r\n\r\n")
        .unwrap();
    assert_eq!(feed.error, None);
    let urls: Vec<_> = feed
        .events
        .iter()
        .filter_map(|event| match event {
            Event::Url(url) => Some(url.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(urls, ["/a", "/b", "/c"]);
    let begins = feed
        .events
        .iter()
        .filter(|event| **event == Event::MessageBegin)
        .count();
    let completes = feed
        .events
        .iter()
        .filter(|event| **event == Event::MessageComplete)
        .count();
    assert_eq!((begins, completes), (3, 3));
}

#[test]
fn split_url_mode_reports_each_part() {
    let mut session = ParserSession::request(SessionOptions {
        consumers: FieldSet::split_url(),
        ..SessionOptions::default()
    })
    .unwrap();
    assert_eq!(session.url_mode(), UrlMode::Split);
    let events = feed_chunks(
        &mut session,
        [&b"GET /sea"[..], b"rch?q=ru", b"st#to", b"p HTTP/1.1\r\n\r\n"],
    );
    assert_eq!(
        events,
        [
            Event::MessageBegin,
            Event::Path("/search".into()),
            Event::QueryString("q=rust".into()),
            Event::Fragment("top".into()),
            Event::HeadersComplete,
            Event::MessageComplete,
        ]
    );
}

#[test]
fn response_body_until_eof() {
    let mut session = response_session();
    let feed = session.feed(b"HTTP/1.1 200 OK\r\n\r\nhello").unwrap();
    assert_eq!(
        feed.events.into_vec(),
        vec![
            Event::MessageBegin,
            Event::HeadersComplete,
            Event::Body("hello".into()),
        ]
    );
    assert!(!session.should_keep_alive());

    let end = session.finish().unwrap();
    assert_eq!(end.consumed, 0);
    assert_eq!(end.error, None);
    assert_eq!(
        end.events.into_vec(),
        vec![Event::BodyEnd, Event::MessageComplete]
    );
}

#[test]
fn response_status_and_version() {
    let mut session = response_session();
    feed_chunks(
        &mut session,
        [&b"HTTP/1.0 404 Not Found\r\nContent-Length: 0\r\n\r\n"[..]],
    );
    assert_eq!(session.status_code(), 404);
    assert_eq!(session.http_version(), (1, 0));
    assert_eq!(session.method(), None);
    assert!(!session.should_keep_alive());
}

#[test]
fn bodiless_responses_complete_at_headers() {
    for head in [
        &b"HTTP/1.1 204 No Content\r\n\r\n"[..],
        b"HTTP/1.1 304 Not Modified\r\nContent-Length: 12\r\n\r\n",
    ] {
        let events = feed_chunks(&mut response_session(), [head]);
        assert_eq!(events.last(), Some(&Event::MessageComplete), "{head:?}");
        assert!(!events.contains(&Event::BodyEnd));
    }
}

#[test]
fn keep_alive_follows_version_and_connection() {
    let cases: [(&[u8], bool); 4] = [
        (b"GET / HTTP/1.1\r\n\r\n", true),
        (b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n", false),
        (b"GET / HTTP/1.0\r\n\r\n", false),
        (b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n", true),
    ];
    for (request, keep_alive) in cases {
        let mut session = request_session();
        feed_chunks(&mut session, [request]);
        assert_eq!(session.should_keep_alive(), keep_alive, "{request:?}");
    }
}

#[test]
fn upgrade_stops_at_end_of_headers() {
    let head: &[u8] = b"GET /chat HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n";
    let mut input = head.to_vec();
    input.extend_from_slice(b"\x81\x05hello");

    let mut session = request_session();
    let feed = session.feed(&input).unwrap();
    assert_eq!(feed.consumed, head.len());
    assert_eq!(feed.error, None);
    assert!(!feed.is_complete());
    assert_eq!(feed.input_len, input.len());
    assert!(session.is_upgrade());
    assert_eq!(feed.events.as_slice().last(), Some(&Event::MessageComplete));

    let after = session.feed(b"more").unwrap();
    assert_eq!(after.consumed, 0);
    assert!(after.events.is_empty());
}

#[test]
fn connect_is_an_upgrade() {
    let mut session = request_session();
    let feed = session
        .feed(b"CONNECT example.com:443 HTTP/1.1\r\n\r\n")
        .unwrap();
    assert_eq!(feed.events[1], Event::Url("example.com:443".into()));
    assert_eq!(session.method(), Some(Method::Connect));
    assert!(session.is_upgrade());
}

#[test]
fn switching_protocols_response_is_an_upgrade() {
    let mut session = response_session();
    let head: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: h2c\r\n\r\n";
    let feed = session.feed(head).unwrap();
    assert_eq!(feed.consumed, head.len());
    assert!(session.is_upgrade());
    assert_eq!(session.status_code(), 101);
}

#[test]
fn empty_feed_between_messages_is_idle() {
    let mut session = request_session();
    feed_chunks(&mut session, [SIMPLE_GET]);
    for _ in 0..3 {
        let feed = session.feed(b"").unwrap();
        assert_eq!(feed.consumed, 0);
        assert!(feed.events.is_empty());
        assert_eq!(feed.error, None);
    }
}

#[test]
fn empty_feed_inside_a_body_changes_nothing() {
    let mut session = request_session();
    session
        .feed(b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\n")
        .unwrap();
    let empty = session.feed(b"").unwrap();
    assert_eq!(empty.consumed, 0);
    assert!(empty.events.is_empty());
    assert_eq!(empty.error, None);
    assert!(empty.is_complete());

    let rest = session.feed(b"abc").unwrap();
    assert!(rest.is_complete());
    assert_eq!(
        rest.events.into_vec(),
        vec![
            Event::Body("abc".into()),
            Event::BodyEnd,
            Event::MessageComplete
        ]
    );
    assert!(session.should_keep_alive());
}

#[test]
fn empty_feed_keeps_a_pending_field() {
    let mut session = request_session();
    session.feed(b"GET / HTTP/1.1\r\nHost: exa").unwrap();
    assert!(session.feed(b"").unwrap().events.is_empty());
    assert_eq!(session.pending_bytes(FieldId::HeaderValue), 3);

    let rest = session.feed(b"mple.com\r\n\r\n").unwrap();
    assert_eq!(
        rest.events[0],
        Event::Header {
            field: "Host".into(),
            value: "example.com".into(),
        }
    );
}

#[test]
fn finish_between_messages_is_clean() {
    let mut session = request_session();
    feed_chunks(&mut session, [SIMPLE_GET]);
    let end = session.finish().unwrap();
    assert_eq!(end.error, None);
    assert!(end.events.is_empty());
}

#[rstest]
#[case::trailing_spaces(&[&b"X: value  \r\n\r\n"[..]], "value")]
#[case::trailing_tab(&[&b"X: value\t\r\n\r\n"[..]], "value")]
#[case::inner_space_kept(&[&b"X: a b\r\n\r\n"[..]], "a b")]
#[case::space_held_across_feeds(&[&b"X: a "[..], &b" b\r\n\r\n"[..]], "a  b")]
#[case::trailing_space_across_feeds(&[&b"X: a  "[..], &b"\r\n\r\n"[..]], "a")]
#[case::only_whitespace_in_second_feed(&[&b"X: a"[..], &b" \t"[..], &b" \r\n\r\n"[..]], "a")]
#[case::whitespace_only_value(&[&b"X:   \r\n\r\n"[..]], "")]
fn header_values_drop_surrounding_whitespace(#[case] tail: &[&[u8]], #[case] value: &str) {
    let mut session = request_session();
    session.feed(b"GET / HTTP/1.1\r\n").unwrap();
    let events = feed_chunks(&mut session, tail.iter().copied());
    assert_eq!(
        events[0],
        Event::Header {
            field: "X".into(),
            value: value.into(),
        }
    );
}

#[test]
fn leading_blank_lines_are_skipped() {
    let events = feed_chunks(&mut request_session(), [&b"\r\n\r\nGET / HTTP/1.1\r\n\r\n"[..]]);
    assert_eq!(events[0], Event::MessageBegin);
    assert_eq!(events.len(), 4);
}

#[test]
fn body_fragments_coalesce_to_the_whole_body() {
    let body = b"0123456789abcdef";
    let mut input = b"PUT /f HTTP/1.1\r\nContent-Length: 16\r\n\r\n".to_vec();
    input.extend_from_slice(body);
    let events = coalesce_bodies(feed_chunks(&mut request_session(), input.chunks(5)));
    assert!(events.contains(&Event::Body(body.as_slice().into())));
    assert_eq!(
        events.iter().filter(|event| matches!(event, Event::Body(_))).count(),
        1
    );
}

#[test]
fn session_reports_its_kind() {
    let session = ParserSession::new(ParserType::Response, SessionOptions::default()).unwrap();
    assert_eq!(session.tokenizer().kind(), ParserType::Response);
    assert_eq!(session.consumers(), FieldSet::combined_url());
}

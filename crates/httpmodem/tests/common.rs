#![allow(missing_docs)]
#![allow(dead_code)]

/// Two pipelined requests on one connection, as they arrived in TCP
/// segments. The cuts land on the seams that matter: inside the url, inside a
/// header name, inside a value, between CR and LF, and across the body.
#[rustfmt::skip]
pub const STREAM: [&[u8]; 12] = [
    b"POST /api/v1/sess",                               // url split
    b"ions?lang=en HTTP/1.1\r\nHo",                     // url ends, header name split
    b"st: api.exa",                                     // name ends, value split
    b"mple.com\r\nContent-Type: appl",                  // pair completes, next value split
    b"ication/json\r\nContent-Length: 29\r",            // CR without its LF
    b"\n\r\n{\"user\":",                                // end of headers, body starts
    b"\"ada\",\"role\":",                               // body continues
    b"\"admin\"}",                                      // body ends
    b"GET /health HTTP/1.1\r\n",                        // pipelined request line
    b"X-Empty:\r\n",                                    // header with no value
    b"Connection: cl",                                  // value split
    b"ose\r\n\r\n",                                     // end of the second message
];

pub const BODY: &[u8] = b"{\"user\":\"ada\",\"role\":\"admin\"}";

pub fn joined() -> Vec<u8> {
    STREAM.concat()
}

/// Joins adjacent body fragments.
pub fn coalesce(events: Vec<httpmodem::Event>) -> Vec<httpmodem::Event> {
    use httpmodem::Event;

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

#[test]
fn stream_body_matches_content_length() {
    let joined = joined();
    let start = joined
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .unwrap()
        + 4;
    assert_eq!(&joined[start..start + 29], BODY);
}

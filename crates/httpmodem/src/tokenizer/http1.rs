//! Incremental HTTP/1.x recognizer.
//!
//! The tokenizer walks its input one byte at a time (body bytes are sliced in
//! bulk) and reports every run of field bytes it has seen as soon as the run
//! ends, or when the input ends mid-run. The state survives between calls, so
//! any byte may be the last one of a call.
//!
//! Only the headers needed for framing are interpreted: `Content-Length`,
//! `Transfer-Encoding`, `Connection` and `Upgrade`. Chunk extensions and
//! trailers are consumed without being reported. Leading and trailing
//! whitespace around a header value is not part of the reported value;
//! whitespace at the end of one call is held back until the next byte shows
//! whether the value continues.

use alloc::vec::Vec;

use bstr::ByteSlice;

use super::{Callbacks, Method, ParserType, Tokenizer};
use crate::{error::TokenizerError, field::FieldId, field::UrlMode};

const HTTP_LITERAL: &[u8; 5] = b"HTTP/";

/// Longest header name that is interpreted (`transfer-encoding`).
const NAME_MAX: usize = 17;

/// Interpreted header values longer than this are truncated; a truncated
/// `Content-Length` is rejected.
const VALUE_SCRATCH_MAX: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    MessageStart,
    Method,
    UrlStart,
    /// Inside the request target; the field tells which part.
    Url(FieldId),
    VersionLiteral(u8),
    VersionMajor,
    VersionDot,
    VersionMinor,
    AfterVersion,
    StatusCode,
    StatusText,
    LineLf,
    HeaderFieldStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    HeadersLf,
    BodyIdentity(u64),
    BodyUntilEof,
    ChunkSizeStart,
    ChunkSize,
    ChunkExtension,
    ChunkSizeLf,
    ChunkData(u64),
    ChunkDataCr,
    ChunkDataLf,
    TrailerStart,
    TrailerLine,
    TrailerLineLf,
    TrailersLf,
    Upgraded,
    Dead,
}

impl State {
    /// The field whose bytes are being collected, if any.
    fn data_field(self) -> Option<FieldId> {
        match self {
            State::Url(field) => Some(field),
            State::HeaderField => Some(FieldId::HeaderField),
            State::HeaderValue => Some(FieldId::HeaderValue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    ContentLength,
    TransferEncoding,
    Connection,
    Upgrade,
    Other,
}

#[derive(Debug, Clone, Copy, Default)]
struct ConnectionTokens {
    close: bool,
    keep_alive: bool,
    upgrade: bool,
}

/// Where a run stopped early.
struct Stop {
    at: usize,
    error: TokenizerError,
}

impl Stop {
    fn at(at: usize, error: TokenizerError) -> Self {
        Self { at, error }
    }
}

/// HTTP/1.x request or response tokenizer.
///
/// ```
/// use httpmodem::{Http1Tokenizer, ParserType, Tokenizer, UrlMode};
///
/// let tokenizer = Http1Tokenizer::new(ParserType::Request, UrlMode::Combined);
/// assert_eq!(tokenizer.error(), None);
/// ```
#[derive(Debug, Clone)]
#[expect(clippy::struct_excessive_bools)]
pub struct Http1Tokenizer {
    kind: ParserType,
    url_mode: UrlMode,
    state: State,
    error: Option<TokenizerError>,

    method: Option<Method>,
    method_buf: [u8; Method::MAX_LEN],
    method_len: usize,
    status_code: u16,
    status_digits: u8,
    version: (u8, u8),

    header: HeaderKind,
    name_buf: [u8; NAME_MAX],
    name_len: usize,
    value_buf: Vec<u8>,
    value_truncated: bool,
    /// Whitespace that ended the previous call inside a header value.
    held_ows: Vec<u8>,

    content_length: Option<u64>,
    chunked: bool,
    connection: ConnectionTokens,
    upgrade_header: bool,
    upgrade: bool,
    needs_eof: bool,
    chunk_size: u64,
}

impl Http1Tokenizer {
    #[must_use]
    pub fn new(kind: ParserType, url_mode: UrlMode) -> Self {
        Self {
            kind,
            url_mode,
            state: State::MessageStart,
            error: None,
            method: None,
            method_buf: [0; Method::MAX_LEN],
            method_len: 0,
            status_code: 0,
            status_digits: 0,
            version: (0, 0),
            header: HeaderKind::Other,
            name_buf: [0; NAME_MAX],
            name_len: 0,
            value_buf: Vec::new(),
            value_truncated: false,
            held_ows: Vec::new(),
            content_length: None,
            chunked: false,
            connection: ConnectionTokens::default(),
            upgrade_header: false,
            upgrade: false,
            needs_eof: false,
            chunk_size: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ParserType {
        self.kind
    }

    #[must_use]
    pub fn url_mode(&self) -> UrlMode {
        self.url_mode
    }

    fn begin_message(&mut self) {
        self.method = None;
        self.method_len = 0;
        self.status_code = 0;
        self.status_digits = 0;
        self.version = (0, 0);
        self.header = HeaderKind::Other;
        self.name_len = 0;
        self.value_buf.clear();
        self.value_truncated = false;
        self.held_ows.clear();
        self.content_length = None;
        self.chunked = false;
        self.connection = ConnectionTokens::default();
        self.upgrade_header = false;
        self.upgrade = false;
        self.needs_eof = false;
        self.chunk_size = 0;
    }

    fn first_state(&self) -> State {
        match self.kind {
            ParserType::Request => State::Method,
            ParserType::Response => State::VersionLiteral(0),
        }
    }

    fn first_url_state(&self) -> State {
        match self.url_mode {
            UrlMode::Combined => State::Url(FieldId::Url),
            UrlMode::Split => State::Url(FieldId::Path),
        }
    }

    #[expect(clippy::too_many_lines)]
    fn run<C: Callbacks>(&mut self, cb: &mut C, input: &[u8]) -> Result<usize, Stop> {
        let mut i = 0;
        let mut mark = 0;
        // Start of the whitespace run that currently ends a header value.
        let mut ows_from: Option<usize> = None;

        while i < input.len() {
            let b = input[i];
            match self.state {
                State::MessageStart => {
                    if b == b'\r' || b == b'\n' {
                        i += 1;
                        continue;
                    }
                    signal(cb, FieldId::MessageBegin, i)?;
                    self.begin_message();
                    self.state = self.first_state();
                    continue;
                }
                State::Method => match b {
                    b'A'..=b'Z' if self.method_len < Method::MAX_LEN => {
                        self.method_buf[self.method_len] = b;
                        self.method_len += 1;
                    }
                    b' ' => {
                        self.method = Method::from_bytes(&self.method_buf[..self.method_len]);
                        if self.method.is_none() {
                            return Err(Stop::at(i, TokenizerError::InvalidMethod));
                        }
                        self.state = State::UrlStart;
                    }
                    _ => return Err(Stop::at(i, TokenizerError::InvalidMethod)),
                },
                State::UrlStart => {
                    if !is_url_byte(b) {
                        return Err(Stop::at(i, TokenizerError::InvalidUrl(b)));
                    }
                    mark = i;
                    self.state = self.first_url_state();
                    continue;
                }
                State::Url(field) => match (field, b) {
                    (_, b' ') => {
                        data(cb, field, &input[mark..i], i)?;
                        self.state = State::VersionLiteral(0);
                    }
                    (FieldId::Path, b'?') => {
                        data(cb, field, &input[mark..i], i)?;
                        mark = i + 1;
                        self.state = State::Url(FieldId::QueryString);
                    }
                    (FieldId::Path | FieldId::QueryString, b'#') => {
                        data(cb, field, &input[mark..i], i)?;
                        mark = i + 1;
                        self.state = State::Url(FieldId::Fragment);
                    }
                    (_, b) if is_url_byte(b) => {}
                    (_, b) => return Err(Stop::at(i, TokenizerError::InvalidUrl(b))),
                },
                State::VersionLiteral(n) => {
                    if b != HTTP_LITERAL[usize::from(n)] {
                        return Err(Stop::at(i, TokenizerError::InvalidVersion));
                    }
                    self.state = if usize::from(n) + 1 == HTTP_LITERAL.len() {
                        State::VersionMajor
                    } else {
                        State::VersionLiteral(n + 1)
                    };
                }
                State::VersionMajor => {
                    if !b.is_ascii_digit() {
                        return Err(Stop::at(i, TokenizerError::InvalidVersion));
                    }
                    self.version.0 = b - b'0';
                    self.state = State::VersionDot;
                }
                State::VersionDot => {
                    if b != b'.' {
                        return Err(Stop::at(i, TokenizerError::InvalidVersion));
                    }
                    self.state = State::VersionMinor;
                }
                State::VersionMinor => {
                    if !b.is_ascii_digit() {
                        return Err(Stop::at(i, TokenizerError::InvalidVersion));
                    }
                    self.version.1 = b - b'0';
                    self.state = State::AfterVersion;
                }
                State::AfterVersion => {
                    self.state = match (self.kind, b) {
                        (ParserType::Request, b'\r') => State::LineLf,
                        (ParserType::Response, b' ') => State::StatusCode,
                        _ => return Err(Stop::at(i, TokenizerError::InvalidVersion)),
                    };
                }
                State::StatusCode => match b {
                    b'0'..=b'9' if self.status_digits < 3 => {
                        self.status_code = self.status_code * 10 + u16::from(b - b'0');
                        self.status_digits += 1;
                    }
                    b' ' if self.status_digits == 3 => self.state = State::StatusText,
                    b'\r' if self.status_digits == 3 => self.state = State::LineLf,
                    _ => return Err(Stop::at(i, TokenizerError::InvalidStatus)),
                },
                State::StatusText => {
                    if b == b'\r' {
                        self.state = State::LineLf;
                    }
                }
                State::LineLf => {
                    if b != b'\n' {
                        return Err(Stop::at(i, TokenizerError::LfExpected));
                    }
                    self.state = State::HeaderFieldStart;
                }
                State::HeaderFieldStart => {
                    if b == b'\r' {
                        self.state = State::HeadersLf;
                    } else if is_token_byte(b) {
                        mark = i;
                        self.name_len = 0;
                        self.state = State::HeaderField;
                        continue;
                    } else {
                        return Err(Stop::at(i, TokenizerError::InvalidHeaderToken(b)));
                    }
                }
                State::HeaderField => {
                    if is_token_byte(b) {
                        self.push_name_byte(b);
                    } else if b == b':' {
                        data(cb, FieldId::HeaderField, &input[mark..i], i)?;
                        self.header = self.classify_name();
                        self.value_buf.clear();
                        self.value_truncated = false;
                        self.state = State::HeaderValueStart;
                    } else {
                        return Err(Stop::at(i, TokenizerError::InvalidHeaderToken(b)));
                    }
                }
                State::HeaderValueStart => match b {
                    b' ' | b'\t' => {}
                    b'\r' => {
                        // Every name gets a value, even an empty one.
                        cb.on_data(FieldId::HeaderValue, &[]).map_err(|_| {
                            Stop::at(i, TokenizerError::CallbackFailed(FieldId::HeaderValue))
                        })?;
                        self.finish_header(i)?;
                        self.state = State::LineLf;
                    }
                    _ => {
                        mark = i;
                        ows_from = None;
                        self.state = State::HeaderValue;
                        continue;
                    }
                },
                State::HeaderValue => match b {
                    b'\r' => {
                        let end = ows_from.take().unwrap_or(i);
                        data(cb, FieldId::HeaderValue, &input[mark..end], i)?;
                        self.held_ows.clear();
                        self.finish_header(i)?;
                        self.state = State::LineLf;
                    }
                    b' ' | b'\t' => {
                        ows_from.get_or_insert(i);
                        self.push_value_byte(b);
                    }
                    b'!'..=b'~' | 0x80..=0xff => {
                        ows_from = None;
                        if !self.held_ows.is_empty() {
                            // The value went on after the previous call ended.
                            let held = core::mem::take(&mut self.held_ows);
                            data(cb, FieldId::HeaderValue, &held, i)?;
                            self.held_ows = held;
                            self.held_ows.clear();
                        }
                        self.push_value_byte(b);
                    }
                    _ => return Err(Stop::at(i, TokenizerError::InvalidHeaderValue(b))),
                },
                State::HeadersLf => {
                    if b != b'\n' {
                        return Err(Stop::at(i, TokenizerError::LfExpected));
                    }
                    if self.headers_complete(cb, i)? {
                        return Ok(i + 1);
                    }
                }
                State::BodyIdentity(remaining) => {
                    let n = body_slice(remaining, input.len() - i);
                    data(cb, FieldId::Body, &input[i..i + n], i)?;
                    i += n;
                    let remaining = remaining - n as u64;
                    if remaining == 0 {
                        self.complete_message(cb, i)?;
                    } else {
                        self.state = State::BodyIdentity(remaining);
                    }
                    continue;
                }
                State::BodyUntilEof => {
                    data(cb, FieldId::Body, &input[i..], i)?;
                    i = input.len();
                    continue;
                }
                State::ChunkSizeStart | State::ChunkSize => match b {
                    b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                        let digit = u64::from(hex_value(b));
                        self.chunk_size = self
                            .chunk_size
                            .checked_mul(16)
                            .and_then(|size| size.checked_add(digit))
                            .ok_or(Stop::at(i, TokenizerError::InvalidChunkSize))?;
                        self.state = State::ChunkSize;
                    }
                    b';' | b' ' | b'\t' if self.state == State::ChunkSize => {
                        self.state = State::ChunkExtension;
                    }
                    b'\r' if self.state == State::ChunkSize => self.state = State::ChunkSizeLf,
                    _ => return Err(Stop::at(i, TokenizerError::InvalidChunkSize)),
                },
                State::ChunkExtension => {
                    if b == b'\r' {
                        self.state = State::ChunkSizeLf;
                    }
                }
                State::ChunkSizeLf => {
                    if b != b'\n' {
                        return Err(Stop::at(i, TokenizerError::LfExpected));
                    }
                    self.state = match core::mem::take(&mut self.chunk_size) {
                        0 => State::TrailerStart,
                        size => State::ChunkData(size),
                    };
                }
                State::ChunkData(remaining) => {
                    let n = body_slice(remaining, input.len() - i);
                    data(cb, FieldId::Body, &input[i..i + n], i)?;
                    i += n;
                    let remaining = remaining - n as u64;
                    self.state = if remaining == 0 {
                        State::ChunkDataCr
                    } else {
                        State::ChunkData(remaining)
                    };
                    continue;
                }
                State::ChunkDataCr => {
                    if b != b'\r' {
                        return Err(Stop::at(i, TokenizerError::InvalidChunkSize));
                    }
                    self.state = State::ChunkDataLf;
                }
                State::ChunkDataLf => {
                    if b != b'\n' {
                        return Err(Stop::at(i, TokenizerError::LfExpected));
                    }
                    self.state = State::ChunkSizeStart;
                }
                State::TrailerStart => {
                    self.state = if b == b'\r' {
                        State::TrailersLf
                    } else {
                        State::TrailerLine
                    };
                }
                State::TrailerLine => {
                    if b == b'\r' {
                        self.state = State::TrailerLineLf;
                    }
                }
                State::TrailerLineLf => {
                    if b != b'\n' {
                        return Err(Stop::at(i, TokenizerError::LfExpected));
                    }
                    self.state = State::TrailerStart;
                }
                State::TrailersLf => {
                    if b != b'\n' {
                        return Err(Stop::at(i, TokenizerError::LfExpected));
                    }
                    self.complete_message(cb, i + 1)?;
                }
                State::Upgraded | State::Dead => return Ok(i),
            }
            i += 1;
        }

        // The input ended inside a field: hand over what we have so far.
        if let Some(field) = self.state.data_field() {
            let end = match (field, ows_from) {
                (FieldId::HeaderValue, Some(from)) => from,
                _ => input.len(),
            };
            data(cb, field, &input[mark..end], input.len())?;
            self.held_ows.extend_from_slice(&input[end..]);
        }
        Ok(input.len())
    }

    /// Returns `true` when the connection switched protocols and the rest of
    /// the input belongs to someone else.
    fn headers_complete<C: Callbacks>(&mut self, cb: &mut C, at: usize) -> Result<bool, Stop> {
        signal(cb, FieldId::HeadersComplete, at)?;

        self.upgrade = match self.kind {
            ParserType::Request => {
                self.method == Some(Method::Connect)
                    || (self.upgrade_header && self.connection.upgrade)
            }
            ParserType::Response => self.status_code == 101,
        };
        if self.upgrade {
            signal(cb, FieldId::MessageComplete, at)?;
            self.state = State::Upgraded;
            return Ok(true);
        }

        let bodiless = self.kind == ParserType::Response
            && (self.status_code / 100 == 1 || self.status_code == 204 || self.status_code == 304);
        if bodiless {
            self.complete_message(cb, at)?;
        } else if self.chunked {
            self.chunk_size = 0;
            self.state = State::ChunkSizeStart;
        } else if let Some(length) = self.content_length {
            if length == 0 {
                self.complete_message(cb, at)?;
            } else {
                self.state = State::BodyIdentity(length);
            }
        } else if self.kind == ParserType::Request {
            self.complete_message(cb, at)?;
        } else {
            self.needs_eof = true;
            self.state = State::BodyUntilEof;
        }
        Ok(false)
    }

    fn complete_message<C: Callbacks>(&mut self, cb: &mut C, at: usize) -> Result<(), Stop> {
        signal(cb, FieldId::MessageComplete, at)?;
        self.state = State::MessageStart;
        Ok(())
    }

    fn push_name_byte(&mut self, b: u8) {
        if self.name_len < NAME_MAX {
            self.name_buf[self.name_len] = b.to_ascii_lowercase();
        }
        self.name_len = self.name_len.saturating_add(1);
    }

    fn classify_name(&self) -> HeaderKind {
        if self.name_len > NAME_MAX {
            return HeaderKind::Other;
        }
        match &self.name_buf[..self.name_len] {
            b"content-length" => HeaderKind::ContentLength,
            b"transfer-encoding" => HeaderKind::TransferEncoding,
            b"connection" => HeaderKind::Connection,
            b"upgrade" => HeaderKind::Upgrade,
            _ => HeaderKind::Other,
        }
    }

    fn push_value_byte(&mut self, b: u8) {
        if self.header == HeaderKind::Other {
            return;
        }
        if self.value_buf.len() < VALUE_SCRATCH_MAX {
            self.value_buf.push(b);
        } else {
            self.value_truncated = true;
        }
    }

    /// Interprets the framing headers once their value is complete.
    fn finish_header(&mut self, at: usize) -> Result<(), Stop> {
        let value = self.value_buf.trim_with(|c| matches!(c, ' ' | '\t'));
        match self.header {
            HeaderKind::ContentLength => {
                let length = parse_decimal(value)
                    .filter(|_| !self.value_truncated)
                    .ok_or(Stop::at(at, TokenizerError::InvalidContentLength))?;
                if self.content_length.is_some_and(|seen| seen != length) {
                    return Err(Stop::at(at, TokenizerError::InvalidContentLength));
                }
                self.content_length = Some(length);
            }
            HeaderKind::TransferEncoding => {
                self.chunked = value
                    .split_str(",")
                    .last()
                    .is_some_and(|coding| trim_ows(coding).eq_ignore_ascii_case(b"chunked"));
            }
            HeaderKind::Connection => {
                for token in value.split_str(",").map(trim_ows) {
                    if token.eq_ignore_ascii_case(b"close") {
                        self.connection.close = true;
                    } else if token.eq_ignore_ascii_case(b"keep-alive") {
                        self.connection.keep_alive = true;
                    } else if token.eq_ignore_ascii_case(b"upgrade") {
                        self.connection.upgrade = true;
                    }
                }
            }
            HeaderKind::Upgrade => self.upgrade_header = true,
            HeaderKind::Other => {}
        }
        self.header = HeaderKind::Other;
        Ok(())
    }

    fn fail(&mut self, error: TokenizerError) {
        tracing::debug!(%error, "tokenizer stopped");
        self.error = Some(error);
        self.state = State::Dead;
    }

    fn end_of_stream<C: Callbacks>(&mut self, cb: &mut C) {
        match self.state {
            State::MessageStart | State::Upgraded | State::Dead => {}
            State::BodyUntilEof => {
                if let Err(stop) = self.complete_message(cb, 0) {
                    self.fail(stop.error);
                }
            }
            _ => self.fail(TokenizerError::UnexpectedEof),
        }
    }
}

impl Tokenizer for Http1Tokenizer {
    fn execute<C: Callbacks>(&mut self, callbacks: &mut C, input: &[u8]) -> usize {
        if self.error.is_some() {
            return 0;
        }
        if input.is_empty() {
            return 0;
        }
        match self.run(callbacks, input) {
            Ok(consumed) => consumed,
            Err(Stop { at, error }) => {
                self.fail(error);
                at
            }
        }
    }

    fn finish<C: Callbacks>(&mut self, callbacks: &mut C) {
        if self.error.is_none() {
            self.end_of_stream(callbacks);
        }
    }

    fn error(&self) -> Option<TokenizerError> {
        self.error
    }

    fn should_keep_alive(&self) -> bool {
        let persistent = if self.version >= (1, 1) {
            !self.connection.close
        } else {
            self.connection.keep_alive
        };
        persistent && !self.needs_eof
    }

    fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    fn method(&self) -> Option<Method> {
        self.method
    }

    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn http_version(&self) -> (u8, u8) {
        self.version
    }
}

fn signal<C: Callbacks>(cb: &mut C, field: FieldId, at: usize) -> Result<(), Stop> {
    cb.on_signal(field)
        .map_err(|_| Stop::at(at, TokenizerError::CallbackFailed(field)))
}

/// Reports a non-empty run of field bytes.
fn data<C: Callbacks>(cb: &mut C, field: FieldId, bytes: &[u8], at: usize) -> Result<(), Stop> {
    if bytes.is_empty() {
        return Ok(());
    }
    cb.on_data(field, bytes)
        .map_err(|_| Stop::at(at, TokenizerError::CallbackFailed(field)))
}

fn body_slice(remaining: u64, available: usize) -> usize {
    usize::try_from(remaining).map_or(available, |remaining| remaining.min(available))
}

fn is_url_byte(b: u8) -> bool {
    b > b' ' && b != 0x7f
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

fn parse_decimal(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u64::from(b - b'0'))
    })
}

fn trim_ows(bytes: &[u8]) -> &[u8] {
    bytes.trim_with(|c| matches!(c, ' ' | '\t'))
}

//! W3C trace-context propagation.
//!
//! The same two header keys are used for every transport: inbound HTTP,
//! outbound collaborator calls and message headers on the bus.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Header carrying the trace id, parent span id and flags.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header carrying correlation baggage.
pub const BAGGAGE_HEADER: &str = "baggage";

const VERSION: &str = "00";
const SAMPLED_FLAG: u8 = 0x01;

/// Identity of the current span within a distributed trace, plus baggage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: u128,
    span_id: u64,
    flags: u8,
    baggage: BTreeMap<String, String>,
}

impl TraceContext {
    /// Starts a new sampled trace.
    pub fn root() -> Self {
        Self {
            trace_id: random_nonzero_u128(),
            span_id: random_nonzero_u64(),
            flags: SAMPLED_FLAG,
            baggage: BTreeMap::new(),
        }
    }

    /// Extracts a context from transport headers, or `None` when
    /// `traceparent` is absent or malformed.
    pub fn extract<'a>(get: impl Fn(&str) -> Option<&'a str>) -> Option<Self> {
        let (trace_id, span_id, flags) = parse_traceparent(get(TRACEPARENT_HEADER)?)?;
        let baggage = get(BAGGAGE_HEADER).map(parse_baggage).unwrap_or_default();
        Some(Self {
            trace_id,
            span_id,
            flags,
            baggage,
        })
    }

    /// Extracts a context from headers, starting a new trace if none is present.
    pub fn extract_or_root<'a>(get: impl Fn(&str) -> Option<&'a str>) -> Self {
        Self::extract(get).unwrap_or_else(Self::root)
    }

    /// Returns a context for a new span in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: random_nonzero_u64(),
            flags: self.flags,
            baggage: self.baggage.clone(),
        }
    }

    /// Adds a baggage entry.
    pub fn with_baggage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.baggage.insert(key.into(), value.into());
        self
    }

    pub fn trace_id(&self) -> String {
        format!("{:032x}", self.trace_id)
    }

    pub fn span_id(&self) -> String {
        format!("{:016x}", self.span_id)
    }

    pub fn is_sampled(&self) -> bool {
        self.flags & SAMPLED_FLAG != 0
    }

    pub fn baggage(&self) -> &BTreeMap<String, String> {
        &self.baggage
    }

    /// Encodes the `traceparent` header value.
    pub fn traceparent(&self) -> String {
        format!(
            "{VERSION}-{}-{}-{:02x}",
            self.trace_id(),
            self.span_id(),
            self.flags
        )
    }

    /// Returns the propagation headers for this context.
    ///
    /// `baggage` is omitted when empty.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![(TRACEPARENT_HEADER, self.traceparent())];
        if !self.baggage.is_empty() {
            let encoded = self
                .baggage
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            headers.push((BAGGAGE_HEADER, encoded));
        }
        headers
    }
}

fn parse_traceparent(value: &str) -> Option<(u128, u64, u8)> {
    let mut parts = value.trim().split('-');
    let version = parts.next()?;
    let trace_id = parts.next()?;
    let span_id = parts.next()?;
    let flags = parts.next()?;
    if version.len() != 2 || version == "ff" || trace_id.len() != 32 || span_id.len() != 16 || flags.len() != 2 {
        return None;
    }
    // Version 00 forbids trailing fields.
    if version == VERSION && parts.next().is_some() {
        return None;
    }
    let trace_id = u128::from_str_radix(trace_id, 16).ok()?;
    let span_id = u64::from_str_radix(span_id, 16).ok()?;
    let flags = u8::from_str_radix(flags, 16).ok()?;
    if trace_id == 0 || span_id == 0 {
        return None;
    }
    Some((trace_id, span_id, flags))
}

fn parse_baggage(value: &str) -> BTreeMap<String, String> {
    value
        .split(',')
        .filter_map(|member| {
            // Properties after ';' are dropped.
            let pair = member.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn random_nonzero_u128() -> u128 {
    loop {
        let value = Uuid::new_v4().as_u128();
        if value != 0 {
            return value;
        }
    }
}

fn random_nonzero_u64() -> u64 {
    loop {
        let value = Uuid::new_v4().as_u128() as u64;
        if value != 0 {
            return value;
        }
    }
}

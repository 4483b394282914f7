//! `httpRequest` payload built from `http` crate request/response parts.
//!
//! Field layout follows
//! <https://cloud.google.com/logging/docs/reference/v2/rest/v2/LogEntry#HttpRequest>.

use http::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use http::{request, response, HeaderMap, Method, Request, Response, StatusCode, Uri, Version};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::attr::Attr;
use crate::keys::HTTP_KEY;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The `httpRequest` special field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPayload {
    pub request_method: String,
    pub request_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_size: Option<String>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size: Option<String>,
    pub user_agent: String,
    pub remote_ip: String,
    pub server_ip: String,
    pub referer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<Latency>,
    pub cache_lookup: bool,
    pub cache_hit: bool,
    pub cache_validated_with_origin_server: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_fill_bytes: Option<String>,
    pub protocol: String,
}

/// Request latency. GKE reads a duration string, App Engine and Cloud
/// Run read a `{seconds, nanos}` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Latency {
    Gke(#[serde(serialize_with = "serialize_gke_latency")] Duration),
    Gae { seconds: i64, nanos: i32 },
}

pub fn make_latency(d: Duration, is_gke: bool) -> Latency {
    if is_gke {
        Latency::Gke(d)
    } else {
        Latency::Gae {
            seconds: i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
            nanos: d.subsec_nanos() as i32,
        }
    }
}

/// Seconds with up to nine fractional digits and no trailing zeros:
/// `1s`, `0.001s`, `0.000000001s`.
pub fn format_gke_latency(d: Duration) -> String {
    let secs = d.as_secs();
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", secs);
    }
    let frac = format!("{:09}", nanos);
    format!("{}.{}s", secs, frac.trim_end_matches('0'))
}

fn serialize_gke_latency<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_gke_latency(*d))
}

impl HttpPayload {
    /// Fill in what can be read from the request and, when available,
    /// the response.
    ///
    /// Sizes come from `Content-Length`. The remote IP is taken from
    /// `X-Forwarded-For`, falling back to a [`SocketAddr`] request
    /// extension (as inserted by most servers' connect-info layers).
    pub fn from_parts(req: &request::Parts, res: Option<&response::Parts>) -> Self {
        let mut payload = Self::for_request(
            &req.method,
            &req.uri,
            &req.headers,
            req.version,
            req.extensions.get::<SocketAddr>(),
        );
        if let Some(res) = res {
            payload.set_response(res.status, &res.headers);
        }
        payload
    }

    /// Same as [`from_parts`](Self::from_parts) for whole messages. The
    /// request and response bodies may differ in type.
    pub fn from_request<B1, B2>(req: &Request<B1>, res: Option<&Response<B2>>) -> Self {
        let mut payload = Self::for_request(
            req.method(),
            req.uri(),
            req.headers(),
            req.version(),
            req.extensions().get::<SocketAddr>(),
        );
        if let Some(res) = res {
            payload.set_response(res.status(), res.headers());
        }
        payload
    }

    fn for_request(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        version: Version,
        peer: Option<&SocketAddr>,
    ) -> Self {
        HttpPayload {
            request_method: method.to_string(),
            request_url: uri.to_string(),
            request_size: content_length(headers),
            user_agent: header_str(headers, USER_AGENT.as_str()),
            remote_ip: remote_ip(headers, peer),
            referer: header_str(headers, REFERER.as_str()),
            protocol: protocol(version),
            ..HttpPayload::default()
        }
    }

    fn set_response(&mut self, status: StatusCode, headers: &HeaderMap) {
        self.status = status.as_u16();
        self.response_size = content_length(headers);
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The reserved `httpRequest` attribute carrying this payload.
    pub fn to_attr(&self) -> Attr {
        Attr::json(HTTP_KEY, serde_json::to_value(self).unwrap_or_default())
    }
}

/// Shorthand for `HttpPayload::from_request(req, res).to_attr()`.
pub fn http_attr<B1, B2>(req: &Request<B1>, res: Option<&Response<B2>>) -> Attr {
    HttpPayload::from_request(req, res).to_attr()
}

fn content_length(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn remote_ip(headers: &HeaderMap, peer: Option<&SocketAddr>) -> String {
    let forwarded = header_str(headers, X_FORWARDED_FOR);
    if !forwarded.is_empty() {
        return forwarded;
    }
    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn protocol(version: Version) -> String {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "",
    }
    .to_string()
}

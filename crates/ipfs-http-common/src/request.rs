//! # Stateless request/response mapping
//!
//! Every daemon method is an HTTP `POST` to `<base>/<method path>` with its
//! positional arguments as repeated `arg=` query parameters, its options as
//! named query parameters, and `stream-channels=true`.
//!
//! Mapping overview:
//! - 2xx: the body is handed to the caller (raw bytes, JSON, or a stream of
//!   concatenated JSON values).
//! - non-2xx with a `{"Message", "Code", "Type"}` body: [`ErrorResponse`].
//! - any other non-2xx: [`HttpError`] with the status and raw body.

use std::collections::VecDeque;
use std::path::PathBuf;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use http::{HeaderValue, Method, Request, header::CONTENT_TYPE};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use url::Url;

use crate::config::CallOptions;
use crate::error::{
    ClientError, DecodeError, ErrorPayload, ErrorResponse, HttpError, TransportError,
};
use crate::http_client::ByteStream;
use crate::multipart::MultipartBody;

/// Error type for encoding requests
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EncodeError {
    /// Failed to serialize query options
    #[error("Failed to serialize query: {0}")]
    Query(
        #[from]
        #[source]
        serde_html_form::ser::Error,
    ),
    /// Failed to serialize JSON body
    #[error("Failed to serialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
    /// Failed to read an upload from disk
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(ipfs_http::encode::io))]
    Io {
        /// File or directory being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Description of a single daemon API call.
///
/// ```
/// use ipfs_http_common::ApiRequest;
///
/// let req = ApiRequest::new("pin/add")
///     .arg("QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u")
///     .flag("recursive", true);
/// assert_eq!(req.path(), "pin/add");
/// ```
#[derive(Debug, Clone)]
pub struct ApiRequest {
    path: String,
    args: Vec<String>,
    params: Vec<(String, String)>,
    body: Option<MultipartBody>,
}

impl ApiRequest {
    /// A call to the given method path, e.g. `"swarm/peers"`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            params: Vec::new(),
            body: None,
        }
    }

    /// Method path relative to the API base.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Positional arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Named parameters in order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Attached multipart body, if any.
    pub fn body(&self) -> Option<&MultipartBody> {
        self.body.as_ref()
    }

    /// Append a positional argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several positional arguments.
    pub fn args_from<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Set a named parameter.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_owned(), value.to_string()));
        self
    }

    /// Set a named parameter when a value is present.
    pub fn param_opt<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Set a boolean parameter.
    pub fn flag(self, name: &str, value: bool) -> Self {
        self.param(name, value)
    }

    /// Append every field of a serializable options struct as parameters.
    pub fn options<T: Serialize>(mut self, options: &T) -> Result<Self, EncodeError> {
        let qs = serde_html_form::to_string(options)?;
        self.params.extend(
            url::form_urlencoded::parse(qs.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
        Ok(self)
    }

    /// Attach a multipart body.
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Full URL for this call, including the query string.
    pub fn url(&self, base: &Url, opts: &CallOptions) -> Url {
        let mut url = base.clone();
        let mut path = url.path().trim_end_matches('/').to_owned();
        path.push('/');
        path.push_str(self.path.trim_start_matches('/'));
        url.set_path(&path);

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for arg in &self.args {
                query.append_pair("arg", arg);
            }
            for (name, value) in &self.params {
                query.append_pair(name, value);
            }
            query.append_pair("stream-channels", "true");
            if opts.is_offline() {
                query.append_pair("offline", "true");
            }
        }
        url
    }
}

/// Build the head of an HTTP request for a daemon call.
///
/// The body is left to the caller: empty for plain calls, or
/// [`MultipartBody::stream`] for uploads.
pub fn build_http_request(
    base: &Url,
    req: &ApiRequest,
    opts: &CallOptions,
    method: Method,
) -> Result<Request<()>, TransportError> {
    let url = req.url(base, opts);
    let mut builder = Request::builder().method(method).uri(url.as_str());

    if let Some(body) = &req.body {
        let content_type = HeaderValue::from_str(&body.content_type())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        builder = builder.header(CONTENT_TYPE, content_type);
    }

    if let Some(auth) = &opts.auth {
        let hv = auth.header_value().map_err(|e| {
            TransportError::InvalidRequest(format!("Invalid basic auth credentials: {}", e))
        })?;
        builder = builder.header(http::header::AUTHORIZATION, hv);
    }

    for (name, value) in &opts.headers {
        builder = builder.header(name, value);
    }

    Ok(builder.body(())?)
}

/// Map a non-2xx response body to the matching error.
pub fn error_from_body(status: http::StatusCode, body: Bytes) -> ClientError {
    #[cfg(feature = "tracing")]
    tracing::trace!(%status, len = body.len(), "daemon returned an error status");
    match serde_json::from_slice::<ErrorPayload>(&body) {
        Ok(payload) => ErrorResponse {
            status,
            message: payload.message,
            code: payload.code,
            kind: payload.kind,
        }
        .into(),
        Err(_) => HttpError {
            status,
            body: Some(body),
        }
        .into(),
    }
}

/// 2xx yields the body, anything else the matching error.
#[inline]
pub fn check_status(status: http::StatusCode, body: Bytes) -> Result<Bytes, ClientError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(error_from_body(status, body))
    }
}

/// Process a buffered HTTP response: 2xx yields the body, anything else an error.
#[inline]
pub fn process_response(http_response: http::Response<Vec<u8>>) -> Result<Bytes, ClientError> {
    let status = http_response.status();
    check_status(status, Bytes::from(http_response.into_body()))
}

/// Decode every JSON value in a body.
///
/// The daemon answers with either one value or several values separated by
/// newlines; both come back as a list.
pub fn decode_json_items<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, DecodeError> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<T>()
        .map(|item| item.map_err(DecodeError::from))
        .collect()
}

/// Decode a body that must contain exactly one JSON value worth keeping.
///
/// Values after the first are skipped, but they still have to be valid JSON.
pub fn decode_single<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    let mut items = serde_json::Deserializer::from_slice(body).into_iter::<T>();
    let first = match items.next() {
        Some(item) => item?,
        None => return Err(DecodeError::Empty),
    };
    let rest = &body[items.byte_offset()..];
    for item in serde_json::Deserializer::from_slice(rest).into_iter::<IgnoredAny>() {
        item?;
    }
    Ok(first)
}

/// Incremental decoder for a body of concatenated JSON values.
#[derive(Debug, Default)]
pub struct JsonLines {
    buffer: BytesMut,
}

impl JsonLines {
    /// Feed more bytes and return every value completed by them.
    pub fn push<T: DeserializeOwned>(&mut self, chunk: &[u8]) -> Result<Vec<T>, DecodeError> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        let mut consumed = 0;
        {
            let mut items = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<T>();
            loop {
                match items.next() {
                    Some(Ok(item)) => {
                        out.push(item);
                        consumed = items.byte_offset();
                    }
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        consumed = items.byte_offset();
                        break;
                    }
                }
            }
        }
        let _ = self.buffer.split_to(consumed);
        Ok(out)
    }

    /// Signal end of input; fails if a value was left incomplete.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(DecodeError::Truncated)
        }
    }
}

struct JsonStreamState<T> {
    body: ByteStream,
    decoder: JsonLines,
    ready: VecDeque<T>,
    done: bool,
}

/// Turn a streamed body into a stream of decoded JSON values.
///
/// Values are yielded as soon as their last byte arrives. The stream ends
/// after the first error.
pub fn json_stream<T>(body: ByteStream) -> impl Stream<Item = Result<T, ClientError>> + Send
where
    T: DeserializeOwned + Send + 'static,
{
    let state = JsonStreamState {
        body,
        decoder: JsonLines::default(),
        ready: VecDeque::new(),
        done: false,
    };
    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                return Some((Ok(item), st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => match st.decoder.push::<T>(&chunk) {
                    Ok(items) => st.ready.extend(items),
                    Err(e) => {
                        st.done = true;
                        return Some((Err(e.into()), st));
                    }
                },
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.done = true;
                    if let Err(e) = st.decoder.finish() {
                        return Some((Err(e.into()), st));
                    }
                }
            }
        }
    })
}

/// Collect a streamed body into a single buffer.
pub async fn collect_body(mut body: ByteStream) -> Result<Bytes, TransportError> {
    let mut out = BytesMut::new();
    while let Some(chunk) = body.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BasicAuth;
    use crate::multipart::Multipart;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Added {
        name: String,
        hash: String,
    }

    fn base() -> Url {
        Url::parse("http://localhost:5001/api/v0/").unwrap()
    }

    #[test]
    fn url_layout() {
        let req = ApiRequest::new("pin/add")
            .arg("QmA")
            .arg("QmB")
            .flag("recursive", false)
            .param_opt::<u32>("depth", None);
        let url = req.url(&base(), &CallOptions::default());
        assert_eq!(url.path(), "/api/v0/pin/add");
        assert_eq!(
            url.query(),
            Some("arg=QmA&arg=QmB&recursive=false&stream-channels=true")
        );
    }

    #[test]
    fn offline_is_appended() {
        let opts = CallOptions::builder().offline(true).build();
        let url = ApiRequest::new("/id").url(&base(), &opts);
        assert_eq!(url.as_str(), "http://localhost:5001/api/v0/id?stream-channels=true&offline=true");
    }

    #[test]
    fn serializable_options_become_params() {
        #[derive(Serialize)]
        struct Opts {
            #[serde(rename = "cid-version")]
            cid_version: u8,
            #[serde(skip_serializing_if = "Option::is_none")]
            chunker: Option<String>,
            pin: bool,
        }
        let req = ApiRequest::new("add")
            .options(&Opts {
                cid_version: 1,
                chunker: None,
                pin: true,
            })
            .unwrap();
        let params: HashMap<_, _> = req.params().iter().cloned().collect();
        assert_eq!(params["cid-version"], "1");
        assert_eq!(params["pin"], "true");
        assert!(!params.contains_key("chunker"));
    }

    #[test]
    fn http_request_carries_headers() {
        let body = Multipart::with_boundary(0, "zz").text("hi").finish();
        let req = ApiRequest::new("add").multipart(body);
        let opts = CallOptions::builder()
            .auth(BasicAuth::new("u", "p"))
            .build();
        let http = build_http_request(&base(), &req, &opts, Method::POST).unwrap();
        assert_eq!(http.method(), Method::POST);
        assert_eq!(
            http.headers()[CONTENT_TYPE],
            "multipart/form-data; boundary=zz"
        );
        assert!(http.headers().contains_key(http::header::AUTHORIZATION));
        assert_eq!(req.body().map(MultipartBody::boundary), Some("zz"));
    }

    #[test]
    fn daemon_error_payload_is_error_response() {
        let resp = http::Response::builder()
            .status(500)
            .body(br#"{"Message":"invalid path \"x\"","Code":0,"Type":"error"}"#.to_vec())
            .unwrap();
        match process_response(resp).unwrap_err() {
            ClientError::ErrorResponse(e) => {
                assert_eq!(e.status, http::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(e.message, "invalid path \"x\"");
                assert_eq!(e.code, 0);
                assert_eq!(e.kind, "error");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn plain_error_body_is_status_error() {
        let resp = http::Response::builder()
            .status(404)
            .body(b"404 page not found".to_vec())
            .unwrap();
        assert!(matches!(
            process_response(resp).unwrap_err(),
            ClientError::Status(HttpError { status, .. }) if status == 404
        ));
    }

    #[test]
    fn newline_delimited_items() {
        let body = b"{\"Name\":\"a\",\"Hash\":\"QmA\"}\n{\"Name\":\"b\",\"Hash\":\"QmB\"}\n";
        let items: Vec<Added> = decode_json_items(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].hash, "QmB");

        let first: Added = decode_single(body).unwrap();
        assert_eq!(first.name, "a");
    }

    #[test]
    fn trailing_values_must_be_json() {
        let one = br#"{"Name":"a","Hash":"QmA"}"#;
        let extra = br#"{"Name":"a","Hash":"QmA"} {"Other":true} 3"#;
        let garbage = br#"{"Name":"a","Hash":"QmA"}<html>oops"#;

        assert_eq!(decode_single::<Added>(one).unwrap().name, "a");
        assert_eq!(decode_single::<Added>(extra).unwrap().hash, "QmA");
        assert!(matches!(
            decode_single::<Added>(garbage),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn empty_and_garbage_bodies() {
        assert!(matches!(decode_single::<Added>(b"  \n"), Err(DecodeError::Empty)));
        assert!(matches!(
            decode_json_items::<Added>(b"<html>"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn json_lines_across_chunk_boundaries() {
        let mut lines = JsonLines::default();
        let a: Vec<Added> = lines.push(br#"{"Name":"a","Ha"#).unwrap();
        assert!(a.is_empty());
        let b: Vec<Added> = lines
            .push(b"sh\":\"QmA\"}\n{\"Name\":\"b\",\"Hash\":\"QmB\"}\n{\"Na")
            .unwrap();
        assert_eq!(b.len(), 2);
        assert!(matches!(lines.finish(), Err(DecodeError::Truncated)));
        let c: Vec<Added> = lines.push(b"me\":\"c\",\"Hash\":\"QmC\"}").unwrap();
        assert_eq!(c[0].name, "c");
        assert!(lines.finish().is_ok());
    }

    #[tokio::test]
    async fn stream_yields_values_and_flags_truncation() {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"{\"Name\":\"a\",\"Hash\":\"QmA\"}\n{\"Name\"")),
            Ok(Bytes::from_static(b":\"b\",\"Hash\":\"QmB\"}\n{\"Name\":")),
        ];
        let body: ByteStream = Box::pin(futures::stream::iter(chunks));
        let items: Vec<Result<Added, ClientError>> = json_stream(body).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().name, "a");
        assert_eq!(items[1].as_ref().unwrap().name, "b");
        assert!(matches!(
            items[2],
            Err(ClientError::Protocol(DecodeError::Truncated))
        ));
    }
}

//! Blocking HTTP client with a base path and default headers.
//!
//! # Design
//! Every verb helper funnels into `Client::do_request`, which resolves the
//! target, appends the default headers, runs the request on the `ureq` agent
//! and turns any status of 400 or above into `Error::Status`. The JSON, raw
//! and multipart helpers only differ in how they produce the request body and
//! what they do with the response body.
//!
//! The agent is built with `http_status_as_error(false)` so the error body can
//! be captured here instead of being dropped by the transport.

use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use ureq::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use ureq::http::{request, Method, Request, Response, Uri};
use ureq::{Agent, Body};

use crate::error::{Error, Result, MAX_ERROR_BODY};
use crate::http::{append_headers, parse_header, Reply};
use crate::multipart::Form;
use crate::target::resolve;

/// HTTP client holding a base path and headers sent with every request.
///
/// Cloning is cheap; clones share the agent's connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    agent: Agent,
    base_path: String,
    headers: HeaderMap,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Client with an empty base path and no default headers.
    pub fn new() -> Self {
        Self {
            agent: default_agent(None, None),
            base_path: String::new(),
            headers: HeaderMap::new(),
        }
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.base_path = base_path.into();
    }

    /// Headers appended to every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Resolve `target` against the base path.
    pub fn url(&self, target: &str) -> String {
        resolve(&self.base_path, target)
    }

    /// Build a request for `target` with the default headers attached.
    fn prepare(&self, method: &Method, target: &str) -> Result<(String, request::Builder)> {
        let url = self.url(target);
        let uri: Uri = url.parse().map_err(|source| Error::InvalidUrl {
            url: url.clone(),
            source,
        })?;
        let mut builder = Request::builder().method(method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            append_headers(headers, &self.headers);
        }
        Ok((url, builder))
    }

    /// Send a request and fail on any status of 400 or above.
    ///
    /// The returned response body has not been read.
    pub fn do_request(
        &self,
        method: Method,
        target: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response<Body>> {
        let (url, builder) = self.prepare(&method, target)?;
        self.execute(&method, &url, builder, body)
    }

    fn execute(
        &self,
        method: &Method,
        url: &str,
        builder: request::Builder,
        body: Option<Vec<u8>>,
    ) -> Result<Response<Body>> {
        debug!(%method, url, "sending request");
        let result = match body {
            Some(bytes) if !bytes.is_empty() => self.agent.run(builder.body(bytes)?),
            _ => self.agent.run(builder.body(())?),
        };
        let response = match result {
            Ok(response) => response,
            // Injected agents may still report statuses as errors.
            Err(ureq::Error::StatusCode(status)) => {
                warn!(%method, url, status, "request failed");
                return Err(Error::Status {
                    status,
                    reason: canonical_reason(status),
                    body: String::new(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        check_status(method, url, response)
    }

    /// Send `input` as JSON (when given) and decode the response body into `O`.
    pub fn do_json<I, O>(&self, method: Method, target: &str, input: Option<&I>) -> Result<Reply<O>>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let (url, mut builder) = self.prepare(&method, target)?;
        let body = match input {
            Some(value) => {
                set_content_type(&mut builder, "application/json", false);
                Some(serde_json::to_vec(value).map_err(Error::Serialize)?)
            }
            None => None,
        };
        let response = self.execute(&method, &url, builder, body)?;
        decode_json(read_reply(response)?)
    }

    pub fn json_get<O: DeserializeOwned>(&self, target: &str) -> Result<Reply<O>> {
        self.do_json::<(), O>(Method::GET, target, None)
    }

    pub fn json_delete<O: DeserializeOwned>(&self, target: &str) -> Result<Reply<O>> {
        self.do_json::<(), O>(Method::DELETE, target, None)
    }

    pub fn json_post<I, O>(&self, target: &str, input: &I) -> Result<Reply<O>>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.do_json(Method::POST, target, Some(input))
    }

    pub fn json_put<I, O>(&self, target: &str, input: &I) -> Result<Reply<O>>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.do_json(Method::PUT, target, Some(input))
    }

    pub fn json_patch<I, O>(&self, target: &str, input: &I) -> Result<Reply<O>>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.do_json(Method::PATCH, target, Some(input))
    }

    pub fn raw_get(&self, target: &str) -> Result<Reply<Vec<u8>>> {
        read_reply(self.do_request(Method::GET, target, None)?)
    }

    pub fn raw_delete(&self, target: &str) -> Result<Reply<Vec<u8>>> {
        read_reply(self.do_request(Method::DELETE, target, None)?)
    }

    pub fn raw_post(&self, target: &str, body: impl Into<Vec<u8>>) -> Result<Reply<Vec<u8>>> {
        read_reply(self.do_request(Method::POST, target, Some(body.into()))?)
    }

    pub fn raw_put(&self, target: &str, body: impl Into<Vec<u8>>) -> Result<Reply<Vec<u8>>> {
        read_reply(self.do_request(Method::PUT, target, Some(body.into()))?)
    }

    /// HEAD request. Only status and headers are returned; no body is read.
    pub fn raw_head(&self, target: &str) -> Result<Reply<()>> {
        let (parts, _body) = self.do_request(Method::HEAD, target, None)?.into_parts();
        Ok(Reply {
            status: parts.status,
            headers: parts.headers,
            body: (),
        })
    }

    /// POST `form` as `multipart/form-data` and return the raw response body.
    ///
    /// The body is fully encoded before the request is sent.
    pub fn multipart(&self, target: &str, form: &Form) -> Result<Reply<Vec<u8>>> {
        let encoded = form.encode()?;
        let (url, mut builder) = self.prepare(&Method::POST, target)?;
        set_content_type(&mut builder, &encoded.content_type, true);
        let response = self.execute(&Method::POST, &url, builder, Some(encoded.body))?;
        read_reply(response)
    }

    /// Like `multipart`, decoding the response body as JSON.
    pub fn multipart_json<O: DeserializeOwned>(&self, target: &str, form: &Form) -> Result<Reply<O>> {
        decode_json(self.multipart(target, form)?)
    }
}

/// Configures a `Client`.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_path: String,
    headers: HeaderMap,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    agent: Option<Agent>,
    invalid: Option<Error>,
}

impl ClientBuilder {
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Append a default header. Repeating a name adds another value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match parse_header(name, value) {
            Ok((name, value)) => {
                self.headers.append(name, value);
            }
            Err(err) => {
                self.invalid.get_or_insert(err);
            }
        }
        self
    }

    /// Overall timeout per call. Ignored when an agent is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `user-agent` sent by the built agent. Ignored when an agent is supplied.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Use a preconfigured agent instead of building one.
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn build(self) -> Result<Client> {
        if let Some(err) = self.invalid {
            return Err(err);
        }
        Ok(Client {
            agent: self
                .agent
                .unwrap_or_else(|| default_agent(self.timeout, self.user_agent.as_deref())),
            base_path: self.base_path,
            headers: self.headers,
        })
    }
}

fn default_agent(timeout: Option<Duration>, user_agent: Option<&str>) -> Agent {
    let mut config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout);
    if let Some(user_agent) = user_agent {
        config = config.user_agent(user_agent);
    }
    config.build().new_agent()
}

fn set_content_type(builder: &mut request::Builder, value: &str, overwrite: bool) {
    let Some(headers) = builder.headers_mut() else {
        return;
    };
    if !overwrite && headers.contains_key(CONTENT_TYPE) {
        return;
    }
    if let Ok(value) = HeaderValue::try_from(value) {
        headers.insert(CONTENT_TYPE, value);
    }
}

/// Map statuses of 400 or above to `Error::Status`, keeping a prefix of the body.
fn check_status(method: &Method, url: &str, mut response: Response<Body>) -> Result<Response<Body>> {
    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }
    let mut body = Vec::new();
    // The status is the error; a body that fails to read is reported empty.
    let _ = response
        .body_mut()
        .as_reader()
        .take(MAX_ERROR_BODY)
        .read_to_end(&mut body);
    warn!(%method, url, status = status.as_u16(), "request failed");
    Err(Error::Status {
        status: status.as_u16(),
        reason: canonical_reason(status.as_u16()),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn canonical_reason(status: u16) -> String {
    ureq::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

/// Read the whole response body. The body is released when this returns.
fn read_reply(response: Response<Body>) -> Result<Reply<Vec<u8>>> {
    let (parts, mut body) = response.into_parts();
    let mut bytes = Vec::new();
    body.as_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| Error::Transport(ureq::Error::Io(e)))?;
    Ok(Reply {
        status: parts.status,
        headers: parts.headers,
        body: bytes,
    })
}

fn decode_json<O: DeserializeOwned>(reply: Reply<Vec<u8>>) -> Result<Reply<O>> {
    let body = serde_json::from_slice(&reply.body).map_err(Error::Deserialize)?;
    Ok(reply.map(|_| body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::builder()
            .base_path("http://localhost:3000/")
            .header("authorization", "Bearer abc")
            .header("x-multi", "one")
            .header("x-multi", "two")
            .build()
            .unwrap()
    }

    #[test]
    fn new_client_is_empty() {
        let client = Client::new();
        assert_eq!(client.base_path(), "");
        assert!(client.headers().is_empty());
    }

    #[test]
    fn prepare_resolves_url_and_appends_default_headers() {
        let (url, builder) = client().prepare(&Method::GET, "users").unwrap();
        assert_eq!(url, "http://localhost:3000/users");
        assert_eq!(builder.uri_ref().unwrap(), "http://localhost:3000/users");
        assert_eq!(builder.method_ref().unwrap(), Method::GET);

        let headers = builder.headers_ref().unwrap();
        assert_eq!(headers["authorization"], "Bearer abc");
        let multi: Vec<_> = headers.get_all("x-multi").iter().collect();
        assert_eq!(multi, ["one", "two"]);
    }

    #[test]
    fn prepare_uses_absolute_target_verbatim() {
        let (url, _) = client().prepare(&Method::GET, "https://other.example/x").unwrap();
        assert_eq!(url, "https://other.example/x");
    }

    #[test]
    fn prepare_rejects_unparseable_url() {
        let client = Client::builder().base_path("http://bad host").build().unwrap();
        let err = client.prepare(&Method::GET, "/a").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { url, .. } if url == "http://bad host/a"));
    }

    #[test]
    fn json_content_type_respects_default_header() {
        let client = Client::builder()
            .header("content-type", "application/vnd.api+json")
            .build()
            .unwrap();
        let (_, mut builder) = client.prepare(&Method::POST, "http://h/a").unwrap();
        set_content_type(&mut builder, "application/json", false);
        let values: Vec<_> = builder.headers_ref().unwrap().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(values, ["application/vnd.api+json"]);
    }

    #[test]
    fn multipart_content_type_overrides_default_header() {
        let client = Client::builder()
            .header("content-type", "application/json")
            .build()
            .unwrap();
        let (_, mut builder) = client.prepare(&Method::POST, "http://h/b").unwrap();
        set_content_type(&mut builder, "multipart/form-data; boundary=B", true);
        assert_eq!(
            builder.headers_ref().unwrap()[CONTENT_TYPE],
            "multipart/form-data; boundary=B"
        );
    }

    #[test]
    fn builder_reports_first_invalid_header() {
        let err = Client::builder()
            .header("bad name", "x")
            .header("x-ok", "y")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(msg) if msg.contains("bad name")));
    }

    #[test]
    fn headers_can_be_changed_after_construction() {
        let mut client = Client::new();
        client.set_base_path("http://h");
        client
            .headers_mut()
            .append("x-late", HeaderValue::from_static("1"));
        let (url, builder) = client.prepare(&Method::DELETE, "z").unwrap();
        assert_eq!(url, "http://h/z");
        assert_eq!(builder.headers_ref().unwrap()["x-late"], "1");
    }

    #[test]
    fn canonical_reason_falls_back_to_empty() {
        assert_eq!(canonical_reason(404), "Not Found");
        assert_eq!(canonical_reason(599), "");
    }
}

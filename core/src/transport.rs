//! Transport seam between the request executor and the network.
//!
//! # Design
//! The executor never talks to a socket directly: it builds an
//! `HttpRequest` and passes it to a [`Transport`]. [`UreqTransport`] is the
//! production implementation over a shared `ureq::Agent`, which owns the
//! connection pool and TLS setup. Tests plug in recording transports.
//!
//! A [`CallContext`] carries an optional deadline and [`CancelToken`]. The
//! per-request timeout is the configured timeout or the time left on the
//! deadline, whichever is shorter. When a token is present the exchange runs
//! on a worker thread and the caller stops waiting as soon as it fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ureq::tls::{PemItem, RootCerts, TlsConfig};
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Agent, RequestBuilder};

use crate::config::{Config, ConfigError};
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest, ctx: &CallContext) -> Result<HttpResponse, Error>;
}

/// Shared flag that asks in-progress calls to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call deadline and cancellation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl CallContext {
    /// A context without deadline or cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail with `Error::Cancelled` once the token fired or the deadline passed.
    pub fn check(&self) -> Result<(), Error> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(Error::Cancelled("cancelled by caller".to_string()));
        }
        if self.remaining().is_some_and(|left| left.is_zero()) {
            return Err(Error::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }
}

/// How often a caller waiting on a cancellable exchange looks at its token.
const CANCEL_POLL: Duration = Duration::from_millis(20);

type UreqResponse = ureq::http::Response<ureq::Body>;

/// [`Transport`] backed by a `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    timeout: Option<Duration>,
}

impl UreqTransport {
    /// Wrap an agent. It must be built with `http_status_as_error(false)` so
    /// error statuses reach the error decoder.
    pub fn new(agent: Agent) -> Self {
        Self { agent, timeout: None }
    }

    /// Build an agent from the configured timeout and TLS settings.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut tls = TlsConfig::builder();
        if let Some(path) = &config.ca_cert {
            let pem = std::fs::read(path).map_err(|source| ConfigError::CaCert {
                path: path.clone(),
                source,
            })?;
            let mut certs = Vec::new();
            for item in ureq::tls::parse_pem(&pem) {
                match item.map_err(|e| ConfigError::Tls(e.to_string()))? {
                    PemItem::Certificate(cert) => certs.push(cert.to_owned()),
                    _ => continue,
                }
            }
            if certs.is_empty() {
                return Err(ConfigError::Tls(format!("no certificates in {}", path.display())));
            }
            tls = tls.root_certs(RootCerts::new_with_certs(&certs));
        }
        if config.insecure {
            tls = tls.disable_verification(true);
        }

        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .tls_config(tls.build())
            .build()
            .new_agent();
        Ok(Self {
            agent,
            timeout: config.timeout,
        })
    }

    /// The tighter of the configured timeout and the time left on `ctx`.
    fn effective_timeout(&self, ctx: &CallContext) -> Option<Duration> {
        match (self.timeout, ctx.remaining()) {
            (Some(configured), Some(left)) => Some(configured.min(left)),
            (configured, left) => configured.or(left),
        }
    }

    fn with_headers<B>(
        builder: RequestBuilder<B>,
        headers: &[(String, String)],
        timeout: Option<Duration>,
    ) -> RequestBuilder<B> {
        let builder = headers
            .iter()
            .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()));
        match timeout {
            Some(t) => builder.config().timeout_global(Some(t)).build(),
            None => builder,
        }
    }

    fn without_body(builder: RequestBuilder<WithoutBody>, body: Option<Vec<u8>>) -> Result<UreqResponse, ureq::Error> {
        match body {
            Some(body) => builder.force_send_body().send(body.as_slice()),
            None => builder.call(),
        }
    }

    fn with_body(builder: RequestBuilder<WithBody>, body: Option<Vec<u8>>) -> Result<UreqResponse, ureq::Error> {
        match body {
            Some(body) => builder.send(body.as_slice()),
            None => builder.send_empty(),
        }
    }

    /// Send the request and read the whole response.
    fn exchange(agent: &Agent, request: HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, Error> {
        let url = request.url.as_str();
        let headers = &request.headers;
        let result = match request.method {
            HttpMethod::Get => Self::without_body(Self::with_headers(agent.get(url), headers, timeout), request.body),
            HttpMethod::Delete => {
                Self::without_body(Self::with_headers(agent.delete(url), headers, timeout), request.body)
            }
            HttpMethod::Post => Self::with_body(Self::with_headers(agent.post(url), headers, timeout), request.body),
            HttpMethod::Put => Self::with_body(Self::with_headers(agent.put(url), headers, timeout), request.body),
        };
        let mut response = result.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec().map_err(transport_error)?;

        Ok(HttpResponse { status, headers, body })
    }

    /// Run the exchange on a worker so the caller can give up when `token`
    /// fires. The worker finishes on its own and its socket is dropped.
    fn exchange_cancellable(
        &self,
        request: HttpRequest,
        timeout: Option<Duration>,
        token: &CancelToken,
    ) -> Result<HttpResponse, Error> {
        let (tx, rx) = mpsc::sync_channel(1);
        let agent = self.agent.clone();
        thread::Builder::new()
            .name("icinga-http".to_string())
            .spawn(move || {
                // The caller may have stopped listening.
                let _ = tx.send(Self::exchange(&agent, request, timeout));
            })
            .map_err(|e| Error::Transport(Box::new(e)))?;

        loop {
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) if token.is_cancelled() => {
                    // A response that already arrived wins over the cancel.
                    return match rx.try_recv() {
                        Ok(result) => result,
                        Err(_) => Err(Error::Cancelled("cancelled by caller".to_string())),
                    };
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Transport("http worker exited without a response".into()));
                }
            }
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest, ctx: &CallContext) -> Result<HttpResponse, Error> {
        ctx.check()?;
        let timeout = self.effective_timeout(ctx);
        match &ctx.cancel {
            Some(token) => self.exchange_cancellable(request, timeout, token),
            None => Self::exchange(&self.agent, request, timeout),
        }
    }
}

fn transport_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Timeout(timeout) => Error::Cancelled(format!("timed out: {timeout:?}")),
        ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            Error::Cancelled(format!("timed out: {io}"))
        }
        other => Error::Transport(Box::new(other)),
    }
}

//! The transport seam: "given a request, produce a response or a failure".
//!
//! The middleware only ever talks to an [`Executor`]. The default network-backed
//! implementation is [`HttpExecutor`]; tests plug in deterministic stand-ins through
//! [`FnExecutor`] or their own implementation.

use std::{future::Future, pin::Pin, sync::Arc};

use futures::TryStreamExt as _;
use http::{Request, Response};
use http_body_util::{BodyExt as _, Empty, Full, StreamBody, combinators::UnsyncBoxBody};
use hyper::body::{Body as _, Bytes, Frame};
use tracing::trace;

use crate::{
    endpoint::Endpoint,
    error::{BoxError, TransportFailure},
};

/// Body type flowing through the executor in both directions.
pub type ProxyBody = UnsyncBoxBody<Bytes, BoxError>;

/// Future returned by [`Executor::execute`].
pub type ExecuteFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response<ProxyBody>, TransportFailure>> + Send + 'a>>;

/// Performs one outbound HTTP call.
///
/// On success the returned response body must be drained and dropped by the caller.
/// On failure no response exists at all.
pub trait Executor: Send + Sync {
    fn execute(&self, request: Request<ProxyBody>) -> ExecuteFuture<'_>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, request: Request<ProxyBody>) -> ExecuteFuture<'_> {
        (**self).execute(request)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, request: Request<ProxyBody>) -> ExecuteFuture<'_> {
        (**self).execute(request)
    }
}

/// Wraps a body into a [`ProxyBody`].
pub fn boxed<B>(body: B) -> ProxyBody
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

pub fn full(bytes: impl Into<Bytes>) -> ProxyBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Executor backed by a closure, handy for tests and small integrations.
///
/// ```
/// use reproxied_core::error::TransportFailure;
/// use reproxied_core::executor::{FnExecutor, ProxyBody, full};
///
/// let executor = FnExecutor::new(|_request: http::Request<ProxyBody>| async {
///     Ok::<_, TransportFailure>(http::Response::new(full("hello")))
/// });
/// # let _ = executor;
/// ```
#[derive(Clone)]
pub struct FnExecutor<F> {
    func: F,
}

impl<F> FnExecutor<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Executor for FnExecutor<F>
where
    F: Fn(Request<ProxyBody>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<ProxyBody>, TransportFailure>> + Send + 'static,
{
    fn execute(&self, request: Request<ProxyBody>) -> ExecuteFuture<'_> {
        Box::pin((self.func)(request))
    }
}

/// Default network executor.
///
/// Every outbound call goes through the configured forward proxy, or straight to the
/// destination when there is none. Redirects are relayed to the caller instead of being
/// followed, and nothing is retried.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    proxy: Option<Endpoint>,
}

impl HttpExecutor {
    pub fn new(proxy: Option<Endpoint>) -> Result<Self, reqwest::Error> {
        let builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());

        // user-info in the proxy url becomes proxy basic auth
        let builder = match &proxy {
            Some(endpoint) => builder.proxy(reqwest::Proxy::all(endpoint.url().as_str())?),
            None => builder.no_proxy(),
        };

        Ok(Self {
            client: builder.build()?,
            proxy,
        })
    }

    pub fn proxy(&self) -> Option<&Endpoint> {
        self.proxy.as_ref()
    }

    async fn send(&self, request: Request<ProxyBody>) -> Result<Response<ProxyBody>, TransportFailure> {
        let (parts, body) = request.into_parts();

        let url = reqwest::Url::parse(&parts.uri.to_string()).map_err(|err| {
            TransportFailure::new(format!("invalid outbound url {}: {err}", parts.uri))
        })?;

        let mut outbound = reqwest::Request::new(parts.method, url);
        *outbound.headers_mut() = parts.headers;
        if !body.is_end_stream() {
            *outbound.body_mut() = Some(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        trace!("Executing {} {}", outbound.method(), outbound.url());
        let response = self.client.execute(outbound).await?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            *headers = response.headers().clone();
        }

        let body = StreamBody::new(
            response
                .bytes_stream()
                .map_ok(Frame::data)
                .map_err(|err| -> BoxError { Box::new(err) }),
        );

        Ok(builder.body(body.boxed_unsync())?)
    }
}

impl Executor for HttpExecutor {
    fn execute(&self, request: Request<ProxyBody>) -> ExecuteFuture<'_> {
        Box::pin(self.send(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt as _;

    #[tokio::test]
    async fn test_fn_executor_returns_stub_response() {
        let executor = FnExecutor::new(|request: Request<ProxyBody>| async move {
            let mut response = Response::new(full(request.uri().to_string()));
            *response.status_mut() = http::StatusCode::ACCEPTED;
            Ok::<_, TransportFailure>(response)
        });

        let request = Request::get("http://example.com/path").body(empty()).unwrap();
        let response = executor.execute(request).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::ACCEPTED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"http://example.com/path");
    }

    #[tokio::test]
    async fn test_shared_executor_forwards() {
        let executor: Arc<dyn Executor> = Arc::new(FnExecutor::new(|_request: Request<ProxyBody>| async {
            Err::<Response<ProxyBody>, _>(TransportFailure::new("connection refused"))
        }));

        let request = Request::get("http://example.com/").body(empty()).unwrap();
        let failure = executor.execute(request).await.unwrap_err();
        assert_eq!(failure.description(), "connection refused");
    }

    #[test]
    fn test_http_executor_with_and_without_proxy() {
        let direct = HttpExecutor::new(None).unwrap();
        assert!(direct.proxy().is_none());

        let proxy = Endpoint::parse("http://proxy:3128").unwrap();
        let proxied = HttpExecutor::new(Some(proxy.clone())).unwrap();
        assert_eq!(proxied.proxy(), Some(&proxy));
    }

    #[tokio::test]
    async fn test_http_executor_reports_connection_failure() {
        // grab a free port, then close it so nothing listens there
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let executor = HttpExecutor::new(None).unwrap();
        let request = Request::get(format!("http://{addr}/"))
            .body(empty())
            .unwrap();

        let failure = executor.execute(request).await.unwrap_err();
        assert!(!failure.description().is_empty());
    }
}

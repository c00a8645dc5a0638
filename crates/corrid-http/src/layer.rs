//! Tower layer that binds a correlation id to every request.
//!
//! Per request:
//! 1. read the configured header; use it if the validator accepts it,
//!    otherwise generate a fresh id (a blank or missing header is treated as
//!    absent, a rejected one is logged),
//! 2. call the inner service with the id bound in the task-local store,
//! 3. on a response (any status) write the id to the response header and
//!    expose that header to browsers,
//! 4. on an inner error return it untouched, with no headers added.
//!
//! The binding ends when the response future completes, fails, panics or
//! is dropped.

use corrid_core::config::{DEFAULT_HEADER_NAME, parse_header_name};
use corrid_core::correlation::with_correlation_id;
use corrid_core::generator::{
    AcceptAny, IdGenerator, IdTransformer, IdValidator, Identity, UuidHexGenerator, UuidValidator,
    validate_with,
};
use corrid_core::{CorrelationConfig, CorrelationError, CorrelationId, Result};
use corrid_observability::spans;
use futures_util::future::BoxFuture;
use http::header::ACCESS_CONTROL_EXPOSE_HEADERS;
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{Instrument, warn};

#[derive(Clone)]
struct Settings {
    header_name: HeaderName,
    response_header_name: HeaderName,
    // Configured spelling, used in Access-Control-Expose-Headers.
    response_header_label: String,
    log_invalid_header: bool,
    generator: Arc<dyn IdGenerator>,
    validator: Arc<dyn IdValidator>,
    transformer: Arc<dyn IdTransformer>,
}

impl Default for Settings {
    fn default() -> Self {
        let header_name = HeaderName::from_static("x-request-id");
        Self {
            header_name: header_name.clone(),
            response_header_name: header_name,
            response_header_label: DEFAULT_HEADER_NAME.to_string(),
            log_invalid_header: true,
            generator: Arc::new(UuidHexGenerator),
            validator: Arc::new(UuidValidator),
            transformer: Arc::new(Identity),
        }
    }
}

impl Settings {
    fn from_config(config: &CorrelationConfig) -> Result<Self> {
        config.validate()?;
        let validator: Arc<dyn IdValidator> = if config.validate_header_as_uuid {
            Arc::new(UuidValidator)
        } else {
            Arc::new(AcceptAny)
        };
        Ok(Self {
            header_name: parse_header_name(&config.header_name)?,
            response_header_name: parse_header_name(config.response_header())?,
            response_header_label: config.response_header().to_string(),
            log_invalid_header: config.log_invalid_header,
            generator: Arc::new(UuidHexGenerator),
            validator,
            transformer: Arc::new(Identity),
        })
    }

    fn resolve(&self, headers: &HeaderMap) -> CorrelationId {
        let id = match headers.get(&self.header_name).map(HeaderValue::to_str) {
            None => self.generator.generate(),
            Some(Err(_)) => {
                if self.log_invalid_header {
                    warn!(
                        header = %self.header_name,
                        "Generating new ID, since header value is not valid UTF-8"
                    );
                }
                self.generator.generate()
            }
            Some(Ok(raw)) => match validate_with(raw, self.validator.as_ref()) {
                Ok(id) => id.into_string(),
                Err(CorrelationError::Rejected(value)) => {
                    if self.log_invalid_header {
                        warn!(
                            header = %self.header_name,
                            value = %value,
                            "Generating new ID, since header value is invalid"
                        );
                    }
                    self.generator.generate()
                }
                Err(_) => self.generator.generate(),
            },
        };
        CorrelationId::new(self.transformer.transform(id))
    }

    fn stamp<B>(&self, response: &mut Response<B>, id: &CorrelationId) {
        let Ok(value) = HeaderValue::from_str(id.as_str()) else {
            warn!(
                header = %self.response_header_name,
                "correlation id is not a valid header value, response left without it"
            );
            return;
        };
        let headers = response.headers_mut();
        headers.insert(self.response_header_name.clone(), value);

        let exposed = match headers
            .get(ACCESS_CONTROL_EXPOSE_HEADERS)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
        {
            Some(existing)
                if existing
                    .split(',')
                    .any(|h| h.trim().eq_ignore_ascii_case(&self.response_header_label)) =>
            {
                return;
            }
            Some(existing) if !existing.is_empty() => {
                format!("{}, {}", existing, self.response_header_label)
            }
            _ => self.response_header_label.clone(),
        };
        if let Ok(value) = HeaderValue::from_str(&exposed) {
            headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
    }
}

/// Layer installing [`CorrelationIdService`].
#[derive(Clone)]
pub struct CorrelationIdLayer {
    settings: Arc<Settings>,
}

impl CorrelationIdLayer {
    /// Default configuration: `X-Request-ID`, strict UUID validation.
    pub fn new() -> Self {
        Self {
            settings: Arc::new(Settings::default()),
        }
    }

    pub fn from_config(config: &CorrelationConfig) -> Result<Self> {
        Ok(Self {
            settings: Arc::new(Settings::from_config(config)?),
        })
    }

    pub fn with_generator<G: IdGenerator>(mut self, generator: G) -> Self {
        Arc::make_mut(&mut self.settings).generator = Arc::new(generator);
        self
    }

    pub fn with_validator<V: IdValidator>(mut self, validator: V) -> Self {
        Arc::make_mut(&mut self.settings).validator = Arc::new(validator);
        self
    }

    /// Applied to every id, received or generated, before it is bound.
    pub fn with_transformer<T: IdTransformer>(mut self, transformer: T) -> Self {
        Arc::make_mut(&mut self.settings).transformer = Arc::new(transformer);
        self
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.settings.header_name
    }
}

impl Default for CorrelationIdLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService {
            inner,
            settings: self.settings.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CorrelationIdService<S> {
    inner: S,
    settings: Arc<Settings>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let settings = self.settings.clone();
        let id = settings.resolve(req.headers());
        req.extensions_mut().insert(id.clone());

        let span = spans::http_request(req.method().as_str(), req.uri().path(), id.as_str());
        // The clone may not be ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(with_correlation_id(
            id.clone(),
            async move {
                let mut response = inner.call(req).await?;
                settings.stamp(&mut response, &id);
                Ok(response)
            }
            .instrument(span),
        ))
    }
}

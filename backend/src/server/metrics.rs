//! Prometheus request metrics, compiled only with the `metrics` feature.
//!
//! Counters are registered under the `icare` namespace and exposed on
//! `/metrics`. Health probes are excluded so orchestrator polling does not
//! drown real traffic. Background jobs are counted by wrapping the worker's
//! [`JobHandler`].

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use icare::domain::ports::{CacheProviderDataJob, JobHandler};
use prometheus::{CounterVec, Opts, Registry};
use std::sync::Arc;
use tracing::warn;

const NAMESPACE: &str = "icare";
const ENDPOINT: &str = "/metrics";
const UNMEASURED_PATHS: [&str; 2] = ["/health/ready", "/health/live"];

/// Build the Prometheus middleware, or `None` when registration fails.
pub fn prometheus_metrics() -> Option<PrometheusMetrics> {
    let builder = UNMEASURED_PATHS
        .iter()
        .fold(PrometheusMetricsBuilder::new(NAMESPACE), |builder, path| {
            builder.exclude(*path)
        });
    match builder.endpoint(ENDPOINT).build() {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "prometheus metrics disabled");
            None
        }
    }
}

/// Wraps the app either with the Prometheus middleware or a passthrough, so
/// both branches produce the same boxed service type.
#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl From<Option<PrometheusMetrics>> for MetricsLayer {
    fn from(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self {
            Self::Enabled(metrics) => {
                let pending = Compat::new(metrics.as_ref().clone()).new_transform(service);
                Box::pin(async move { Ok(boxed::service(pending.await?)) })
            }
            Self::Disabled => Box::pin(async move {
                let passthrough =
                    service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
                Ok(boxed::service(passthrough))
            }),
        }
    }
}

const CACHE_PROVIDER_DATA: &str = "cache_provider_data";

/// Counts every job handed to the inner handler in `icare_jobs_total`.
pub(crate) struct CountingJobHandler {
    inner: Arc<dyn JobHandler>,
    jobs_total: CounterVec,
}

impl CountingJobHandler {
    pub(crate) fn new(
        inner: Arc<dyn JobHandler>,
        registry: &Registry,
    ) -> Result<Self, prometheus::Error> {
        let jobs_total = CounterVec::new(
            Opts::new("jobs_total", "Background jobs handled, by type").namespace(NAMESPACE),
            &["type"],
        )?;
        registry.register(Box::new(jobs_total.clone()))?;
        Ok(Self { inner, jobs_total })
    }
}

#[async_trait]
impl JobHandler for CountingJobHandler {
    async fn handle(&self, job: CacheProviderDataJob) {
        self.inner.handle(job).await;
        self.jobs_total
            .with_label_values(&[CACHE_PROVIDER_DATA])
            .inc();
    }
}

/// Wrap `handler` with job counting when metrics are enabled.
pub(crate) fn count_jobs(
    handler: Arc<dyn JobHandler>,
    metrics: Option<&PrometheusMetrics>,
) -> Arc<dyn JobHandler> {
    let Some(metrics) = metrics else {
        return handler;
    };
    match CountingJobHandler::new(handler.clone(), &metrics.registry) {
        Ok(counting) => Arc::new(counting),
        Err(error) => {
            warn!(%error, "job counters disabled");
            handler
        }
    }
}

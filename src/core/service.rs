use bytes::Bytes;
use rust_decimal::Decimal;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::output::customers_to_json;
use crate::domain::coordinate::Coordinate;
use crate::domain::model::{Customer, OrderBy};
use crate::domain::ports::{CustomerFilter, CustomersParser, FilterCache};
use crate::utils::error::{InviteError, Result};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-deployment inputs of the invite flow.
#[derive(Debug, Clone)]
pub struct InviteSettings {
    pub base_location: Coordinate,
    pub threshold_km: Decimal,
    pub order_by: OrderBy,
    pub timeout: Duration,
}

impl InviteSettings {
    pub fn new(base_location: Coordinate, threshold_km: Decimal) -> Self {
        Self {
            base_location,
            threshold_km,
            order_by: OrderBy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs an upload through cache lookup, parsing, filtering and encoding.
pub struct InviteService<P, F, C>
where
    P: CustomersParser,
    F: CustomerFilter,
    C: FilterCache,
{
    parser: Arc<P>,
    filter: F,
    cache: C,
    settings: InviteSettings,
}

impl<P, F, C> InviteService<P, F, C>
where
    P: CustomersParser + 'static,
    F: CustomerFilter,
    C: FilterCache,
{
    pub fn new(parser: P, filter: F, cache: C, settings: InviteSettings) -> Self {
        Self {
            parser: Arc::new(parser),
            filter,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &InviteSettings {
        &self.settings
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the JSON response for `upload`, giving up once the configured timeout elapses.
    pub async fn invite(&self, upload: Bytes) -> Result<Bytes> {
        let cancel = CancellationToken::new();
        // callers dropping this future cancel the in-flight parse and filter work too
        let _cancel_on_drop = cancel.clone().drop_guard();

        tokio::select! {
            response = self.run(&cancel, upload) => response,
            _ = tokio::time::sleep(self.settings.timeout) => {
                cancel.cancel();
                Err(InviteError::canceled(format!(
                    "handling the upload (timeout of {:?} exceeded)",
                    self.settings.timeout
                )))
            }
        }
    }

    async fn run(&self, cancel: &CancellationToken, upload: Bytes) -> Result<Bytes> {
        if let Some(cached) = self
            .cache
            .get(&upload)
            .await
            .map_err(|e| e.context("error to load cache"))?
        {
            return Ok(cached);
        }

        let customers = self
            .parse(cancel, upload.clone())
            .await
            .map_err(|e| e.context("error to parse input file"))?;
        let input = customers.len();

        let filtered = self
            .filter
            .by_near_location(
                cancel,
                customers,
                &self.settings.base_location,
                self.settings.threshold_km,
                self.settings.order_by,
            )
            .await
            .map_err(|e| e.context("error to filter customers by location"))?;

        let response = customers_to_json(&filtered)?;

        info!(input = input, output = filtered.len(), "Filtered customers response built");

        if let Err(e) = self.cache.save(&upload, response.clone()).await {
            warn!(error = %e, "Error to store response on cache");
        }

        Ok(response)
    }

    async fn parse(&self, cancel: &CancellationToken, upload: Bytes) -> Result<Vec<Customer>> {
        let parser = Arc::clone(&self.parser);
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || parser.parse(&cancel, Cursor::new(upload)))
            .await
            .map_err(|e| InviteError::internal(format!("parser task failed: {}", e)))?
    }
}

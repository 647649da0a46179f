use async_trait::async_trait;
use bytes::Bytes;
use rust_decimal::Decimal;
use std::io::BufRead;
use tokio_util::sync::CancellationToken;

use crate::domain::coordinate::Coordinate;
use crate::domain::model::{Customer, OrderBy};
use crate::utils::error::Result;

/// Turns an uploaded customers file into records, one per non-blank line.
pub trait CustomersParser: Send + Sync {
    fn parse<R: BufRead>(&self, cancel: &CancellationToken, reader: R) -> Result<Vec<Customer>>;
}

#[async_trait]
pub trait CustomerFilter: Send + Sync {
    /// Keeps the customers within `threshold_km` of `base_location`, one per id,
    /// sorted by `order_by`.
    async fn by_near_location(
        &self,
        cancel: &CancellationToken,
        customers: Vec<Customer>,
        base_location: &Coordinate,
        threshold_km: Decimal,
        order_by: OrderBy,
    ) -> Result<Vec<Customer>>;
}

/// Serialized responses keyed by the raw upload they were computed from.
#[async_trait]
pub trait FilterCache: Send + Sync {
    async fn get(&self, raw_input: &[u8]) -> Result<Option<Bytes>>;
    async fn save(&self, raw_input: &[u8], response: Bytes) -> Result<()>;
}

#[async_trait]
pub trait CustomerNotifier: Send + Sync {
    async fn notify(&self, customer: &Customer) -> Result<()>;
}

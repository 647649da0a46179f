use async_trait::async_trait;

use crate::domain::model::Customer;
use crate::domain::ports::CustomerNotifier;
use crate::utils::error::Result;

/// Announces each invited customer as a log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl CustomerNotifier for LogNotifier {
    async fn notify(&self, customer: &Customer) -> Result<()> {
        tracing::info!(
            customer_id = customer.id,
            customer_name = %customer.name,
            "Customer invited"
        );
        Ok(())
    }
}

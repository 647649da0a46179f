use serde::Deserialize;
use std::io::BufRead;
use tokio_util::sync::CancellationToken;

use crate::domain::coordinate::Coordinate;
use crate::domain::model::Customer;
use crate::domain::ports::CustomersParser;
use crate::utils::error::{InviteError, Result};

#[derive(Debug, Deserialize)]
struct RawCustomer {
    user_id: i64,
    name: String,
    latitude: String,
    longitude: String,
}

/// Parses files holding one JSON customer object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerFileParser;

impl CustomerFileParser {
    pub fn new() -> Self {
        Self
    }
}

impl CustomersParser for CustomerFileParser {
    fn parse<R: BufRead>(&self, cancel: &CancellationToken, reader: R) -> Result<Vec<Customer>> {
        let mut customers = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            if cancel.is_cancelled() {
                return Err(InviteError::canceled("parsing customers file"));
            }

            let line_number = index + 1;
            let line = line.map_err(|e| {
                InviteError::invalid_argument(format!("error to read line={}", line_number), e)
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let raw: RawCustomer = serde_json::from_str(&line).map_err(|e| {
                InviteError::invalid_argument(
                    format!("error to parse line={}, content='{}'", line_number, line),
                    e,
                )
            })?;

            let location = Coordinate::new(&raw.latitude, &raw.longitude).map_err(|e| {
                e.context(format!("error to parse customers' location on line={}", line_number))
            })?;

            customers.push(Customer::new(raw.user_id, raw.name, location));
        }

        tracing::debug!(customers = customers.len(), "Customers file parsed");
        Ok(customers)
    }
}

use serde::Serialize;
use std::str::FromStr;

use crate::domain::coordinate::Coordinate;
use crate::utils::error::InviteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub location: Coordinate,
}

impl Customer {
    pub fn new(id: i64, name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            location,
        }
    }

    pub fn with_location(&self, location: Coordinate) -> Self {
        Self::new(self.id, self.name.clone(), location)
    }
}

/// The shape a customer takes in responses: identity and name only.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InvitedCustomer<'a> {
    pub id: i64,
    pub name: &'a str,
}

impl<'a> From<&'a Customer> for InvitedCustomer<'a> {
    fn from(customer: &'a Customer) -> Self {
        Self {
            id: customer.id,
            name: &customer.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    CustomerId,
}

impl OrderBy {
    pub fn sort(&self, customers: &mut [Customer]) {
        match self {
            OrderBy::CustomerId => customers.sort_unstable_by_key(|customer| customer.id),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::CustomerId => "customer_id",
        }
    }
}

impl FromStr for OrderBy {
    type Err = InviteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer_id" | "id" => Ok(OrderBy::CustomerId),
            _ => Err(InviteError::UnexpectedOrdering {
                value: s.to_string(),
            }),
        }
    }
}

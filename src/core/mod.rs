pub mod output;
pub mod proximity;
pub mod service;

pub use crate::domain::model::{Customer, OrderBy};
pub use crate::domain::ports::{CustomerFilter, CustomerNotifier, CustomersParser, FilterCache};
pub use crate::utils::error::Result;
pub use proximity::ProximityFilter;
pub use service::{InviteService, InviteSettings};

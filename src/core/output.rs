use bytes::Bytes;

use crate::domain::model::{Customer, InvitedCustomer};
use crate::utils::error::{InviteError, Result};

/// Encodes the filtered customers as the `[{"id":..,"name":..}]` response body.
pub fn customers_to_json(customers: &[Customer]) -> Result<Bytes> {
    let invited: Vec<InvitedCustomer<'_>> = customers.iter().map(InvitedCustomer::from).collect();

    let body = serde_json::to_vec(&invited)
        .map_err(|e| InviteError::from(e).context("error to encode customers output"))?;

    Ok(Bytes::from(body))
}

#[cfg(feature = "cli")]
pub fn customers_to_csv(customers: &[Customer]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let encoded = std::iter::once(["id".to_string(), "name".to_string()])
        .chain(
            customers
                .iter()
                .map(|customer| [customer.id.to_string(), customer.name.clone()]),
        )
        .try_for_each(|record| writer.write_record(&record));
    encoded.map_err(|e| InviteError::internal(format!("error to encode customers csv: {}", e)))?;

    let data = writer
        .into_inner()
        .map_err(|e| InviteError::internal(format!("error to flush customers csv: {}", e)))?;

    String::from_utf8(data).map_err(|e| InviteError::internal(format!("invalid csv output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coordinate::Coordinate;

    fn customers() -> Vec<Customer> {
        vec![
            Customer::new(4, "Ian Kehoe", Coordinate::dublin()),
            Customer::new(5, "Nora \"Dempsey\"", Coordinate::dublin()),
        ]
    }

    #[test]
    fn test_json_output_has_id_and_name_only() {
        let body = customers_to_json(&customers()).unwrap();

        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            r#"[{"id":4,"name":"Ian Kehoe"},{"id":5,"name":"Nora \"Dempsey\""}]"#
        );
    }

    #[test]
    fn test_empty_json_output_is_empty_array() {
        assert_eq!(&customers_to_json(&[]).unwrap()[..], b"[]");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_csv_output() {
        let csv = customers_to_csv(&customers()).unwrap();

        assert_eq!(csv, "id,name\n4,Ian Kehoe\n5,\"Nora \"\"Dempsey\"\"\"\n");
    }
}

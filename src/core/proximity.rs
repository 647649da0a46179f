use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::domain::coordinate::Coordinate;
use crate::domain::distance::round_distance;
use crate::domain::model::{Customer, OrderBy};
use crate::domain::ports::{CustomerFilter, CustomerNotifier};
use crate::utils::error::{InviteError, Result};

/// Smallest batch handed to a worker; tiny inputs are not worth a task each.
const MIN_BATCH_SIZE: usize = 64;
const ADMISSION_BUFFER: usize = 1024;
/// Workers give the scheduler a turn after this many records.
const YIELD_EVERY: usize = 256;

/// A customer that passed the distance filter, tagged with its position in the input.
#[derive(Debug)]
struct Admission {
    position: usize,
    customer: Customer,
}

/// Distance filter that fans customers out to a bounded set of tokio tasks and merges
/// admissions in a single collector.
pub struct ProximityFilter {
    workers: usize,
    notifier: Option<Arc<dyn CustomerNotifier>>,
}

impl ProximityFilter {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn CustomerNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn batch_size(&self, total: usize) -> usize {
        total.div_ceil(self.workers).max(MIN_BATCH_SIZE)
    }
}

impl Default for ProximityFilter {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }
}

#[async_trait]
impl CustomerFilter for ProximityFilter {
    async fn by_near_location(
        &self,
        cancel: &CancellationToken,
        customers: Vec<Customer>,
        base_location: &Coordinate,
        threshold_km: Decimal,
        order_by: OrderBy,
    ) -> Result<Vec<Customer>> {
        if cancel.is_cancelled() {
            return Err(InviteError::canceled("filtering customers"));
        }

        let total = customers.len();
        info!(
            customers = total,
            base_location = %base_location,
            threshold_km = %threshold_km,
            "Filtering customers by distance"
        );

        let batch_size = self.batch_size(total);
        let (tx, mut rx) = mpsc::channel::<Admission>(ADMISSION_BUFFER);
        let mut workers = JoinSet::new();

        let mut indexed = customers.into_iter().enumerate().peekable();
        while indexed.peek().is_some() {
            let batch: Vec<(usize, Customer)> = indexed.by_ref().take(batch_size).collect();
            workers.spawn(
                evaluate_batch(
                    batch,
                    *base_location,
                    threshold_km,
                    self.notifier.clone(),
                    tx.clone(),
                    cancel.clone(),
                )
                .in_current_span(),
            );
        }
        // the channel closes once the last worker drops its sender
        drop(tx);

        let mut admitted: HashMap<i64, Admission> = HashMap::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    workers.abort_all();
                    return Err(InviteError::canceled("filtering customers"));
                }
                next = rx.recv() => match next {
                    Some(admission) => merge(&mut admitted, admission),
                    None => break,
                },
            }
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| InviteError::internal(format!("distance worker failed: {}", e)))??;
        }

        if cancel.is_cancelled() {
            return Err(InviteError::canceled("filtering customers"));
        }

        let mut result: Vec<Customer> = admitted
            .into_values()
            .map(|admission| admission.customer)
            .collect();
        order_by.sort(&mut result);

        info!(
            input = total,
            output = result.len(),
            order_by = order_by.as_str(),
            "Customers filtered"
        );

        Ok(result)
    }
}

/// First admission in input order wins for a given id.
fn merge(admitted: &mut HashMap<i64, Admission>, admission: Admission) {
    match admitted.entry(admission.customer.id) {
        Entry::Vacant(slot) => {
            slot.insert(admission);
        }
        Entry::Occupied(mut slot) => {
            if admission.position < slot.get().position {
                slot.insert(admission);
            }
        }
    }
}

async fn evaluate_batch(
    batch: Vec<(usize, Customer)>,
    base_location: Coordinate,
    threshold_km: Decimal,
    notifier: Option<Arc<dyn CustomerNotifier>>,
    admissions: mpsc::Sender<Admission>,
    cancel: CancellationToken,
) -> Result<()> {
    for (evaluated, (position, customer)) in batch.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(InviteError::canceled("evaluating customer distances"));
        }

        let distance = base_location.distance_to(&customer.location);
        debug!(
            customer_id = customer.id,
            distance = %round_distance(distance),
            "Distance calculation"
        );

        if distance <= threshold_km {
            if let Some(notifier) = &notifier {
                if let Err(e) = notifier.notify(&customer).await {
                    warn!(customer_id = customer.id, error = %e, "Customer notification failed");
                }
            }

            if admissions.send(Admission { position, customer }).await.is_err() {
                // collector is gone, the operation was abandoned
                return Ok(());
            }
        }

        if evaluated % YIELD_EVERY == YIELD_EVERY - 1 {
            tokio::task::yield_now().await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn coordinate(latitude: &str, longitude: &str) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn sao_paulo() -> Coordinate {
        coordinate("-23.533773", "-46.625290")
    }

    fn ids(customers: &[Customer]) -> Vec<i64> {
        customers.iter().map(|c| c.id).collect()
    }

    async fn filter(
        engine: &ProximityFilter,
        customers: Vec<Customer>,
        base: &Coordinate,
        threshold: i64,
    ) -> Result<Vec<Customer>> {
        engine
            .by_near_location(
                &CancellationToken::new(),
                customers,
                base,
                Decimal::from(threshold),
                OrderBy::CustomerId,
            )
            .await
    }

    struct RecordingNotifier {
        notified: Mutex<Vec<i64>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Self {
            Self {
                notified: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl CustomerNotifier for RecordingNotifier {
        async fn notify(&self, customer: &Customer) -> Result<()> {
            self.notified.lock().unwrap().push(customer.id);
            if self.fail {
                return Err(InviteError::internal("notification channel down"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_result() {
        let engine = ProximityFilter::new(4);

        let result = filter(&engine, vec![], &Coordinate::dublin(), 100).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_only_near_customers_are_admitted() {
        let engine = ProximityFilter::new(4);
        let customers = vec![
            Customer::new(4, "Paris", coordinate("2.2945", "48.8584")),
            Customer::new(2, "Sao Paulo", sao_paulo()),
            Customer::new(1, "Dublin", Coordinate::dublin()),
            Customer::new(3, "Montreal", coordinate("45.508888", "-73.561668")),
        ];

        let result = filter(&engine, customers, &Coordinate::dublin(), 100).await.unwrap();

        assert_eq!(ids(&result), vec![1]);
    }

    #[tokio::test]
    async fn test_results_are_sorted_by_id() {
        let engine = ProximityFilter::new(2);
        let rio = coordinate("-22.908333", "-43.196388");
        let customers = vec![
            Customer::new(7, "Curitiba", coordinate("-25.441105", "-49.276855")),
            Customer::new(6, "Rio 2", rio),
            Customer::new(1, "Dublin", Coordinate::dublin()),
            Customer::new(3, "Montreal", coordinate("45.508888", "-73.561668")),
            Customer::new(5, "Rio 1", rio),
        ];

        let result = filter(&engine, customers, &sao_paulo(), 500).await.unwrap();

        assert_eq!(ids(&result), vec![5, 6, 7]);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let engine = ProximityFilter::new(1);
        let winnipeg = coordinate("49.895077", "-97.138451");
        let regina = coordinate("50.445210", "-104.618896");
        let exact = winnipeg.distance_to(&regina);

        let admitted = engine
            .by_near_location(
                &CancellationToken::new(),
                vec![Customer::new(1, "Regina", regina)],
                &winnipeg,
                exact,
                OrderBy::CustomerId,
            )
            .await
            .unwrap();
        assert_eq!(ids(&admitted), vec![1]);

        let rejected = filter(&engine, vec![Customer::new(1, "Regina", regina)], &winnipeg, 536)
            .await
            .unwrap();
        assert!(rejected.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_first_in_input_order() {
        let engine = ProximityFilter::new(8);
        let mut customers = vec![Customer::new(1, "first", Coordinate::dublin())];
        for i in 0..500 {
            customers.push(Customer::new(1, format!("copy {}", i), Coordinate::dublin()));
        }

        let result = filter(&engine, customers, &Coordinate::dublin(), 100).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "first");
    }

    #[tokio::test]
    async fn test_notifier_called_once_per_admitted_customer() {
        let notifier = Arc::new(RecordingNotifier::new(false));
        let engine = ProximityFilter::new(2).with_notifier(notifier.clone());
        let customers = vec![
            Customer::new(1, "Dublin", Coordinate::dublin()),
            Customer::new(2, "Sao Paulo", sao_paulo()),
            Customer::new(3, "Also Dublin", Coordinate::dublin()),
        ];

        filter(&engine, customers, &Coordinate::dublin(), 100).await.unwrap();

        let mut notified = notifier.notified.lock().unwrap().clone();
        notified.sort_unstable();
        assert_eq!(notified, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_change_result() {
        let notifier = Arc::new(RecordingNotifier::new(true));
        let engine = ProximityFilter::new(2).with_notifier(notifier.clone());
        let customers = vec![
            Customer::new(2, "Sao Paulo", sao_paulo()),
            Customer::new(1, "Dublin", Coordinate::dublin()),
        ];

        let result = filter(&engine, customers, &Coordinate::dublin(), 100).await.unwrap();

        assert_eq!(ids(&result), vec![1]);
        assert_eq!(notifier.notified.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_filtering() {
        let engine = ProximityFilter::new(4);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine
            .by_near_location(
                &cancel,
                vec![Customer::new(1, "Dublin", Coordinate::dublin())],
                &Coordinate::dublin(),
                Decimal::from(100),
                OrderBy::CustomerId,
            )
            .await
            .unwrap_err();

        assert!(err.is_canceled());
    }

    struct CancellingNotifier {
        cancel: CancellationToken,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CustomerNotifier for CancellingNotifier {
        async fn notify(&self, _customer: &Customer) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cancel.cancel();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cancellation_mid_evaluation_returns_no_partial_result() {
        let cancel = CancellationToken::new();
        let notifier = Arc::new(CancellingNotifier {
            cancel: cancel.clone(),
            calls: AtomicUsize::new(0),
        });
        let engine = ProximityFilter::new(1).with_notifier(notifier.clone());
        let customers = (0..1_000)
            .map(|id| Customer::new(id, format!("Customer {}", id), Coordinate::dublin()))
            .collect();

        let result = engine
            .by_near_location(
                &cancel,
                customers,
                &Coordinate::dublin(),
                Decimal::from(100),
                OrderBy::CustomerId,
            )
            .await;

        assert!(result.unwrap_err().is_canceled());
        assert!(notifier.calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_batch_size_respects_workers_and_minimum() {
        let engine = ProximityFilter::new(4);

        assert_eq!(engine.batch_size(10), MIN_BATCH_SIZE);
        assert_eq!(engine.batch_size(5_000), 1_250);
        assert_eq!(ProximityFilter::new(0).workers(), 1);
    }
}

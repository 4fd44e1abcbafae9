//! Full lifecycle tests against in-memory stores
//!
//! The doubles here honor the same contracts the Postgres implementations
//! do: `save` is an atomic check-and-insert per plate, and `finalize_exit`
//! applies the state transition and the payment insert as one unit while
//! re-checking occupancy.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use parkeo_core::{
    models::{Payment, Stay, StayKind, StayStatus, Tariff, VehicleClass},
    traits::{
        ExitStamp, MembershipRepository, PaymentRepository, StayRepository, TariffResolver,
    },
    AppError, AppResult,
};
use parkeo_services::StayLifecycleService;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// In-memory stay and payment store
#[derive(Default)]
struct InMemoryStays {
    stays: Mutex<Vec<Stay>>,
    payments: Mutex<Vec<Payment>>,
}

impl InMemoryStays {
    /// Shift a stay's entry time into the past
    fn backdate(&self, stay_id: i32, minutes: i64) {
        let mut stays = self.stays.lock();
        let stay = stays
            .iter_mut()
            .find(|s| s.id == stay_id)
            .expect("backdate: unknown stay id");
        stay.entered_at = Utc::now() - Duration::minutes(minutes);
    }

    fn stay_count(&self) -> usize {
        self.stays.lock().len()
    }

    fn payment_count(&self) -> usize {
        self.payments.lock().len()
    }

    fn snapshot(&self) -> Vec<Stay> {
        self.stays.lock().clone()
    }
}

#[async_trait]
impl StayRepository for InMemoryStays {
    async fn save(&self, stay: &Stay) -> AppResult<Stay> {
        // Check-and-insert under one lock, like the unique partial index
        let mut stays = self.stays.lock();
        if stays
            .iter()
            .any(|s| s.plate == stay.plate && s.status == StayStatus::Inside)
        {
            return Err(AppError::AlreadyInside(stay.plate.clone()));
        }

        let mut saved = stay.clone();
        saved.id = stays.len() as i32 + 1;
        stays.push(saved.clone());
        Ok(saved)
    }

    async fn find_active_by_plate(&self, plate: &str) -> AppResult<Option<Stay>> {
        Ok(self
            .stays
            .lock()
            .iter()
            .find(|s| s.plate == plate && s.status == StayStatus::Inside)
            .cloned())
    }

    async fn find_all_active(&self) -> AppResult<Vec<Stay>> {
        let mut active: Vec<Stay> = self
            .stays
            .lock()
            .iter()
            .filter(|s| s.status == StayStatus::Inside)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.entered_at);
        Ok(active)
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Stay>> {
        Ok(self.stays.lock().iter().find(|s| s.id == id).cloned())
    }

    async fn finalize_exit(
        &self,
        stay_id: i32,
        exit: &ExitStamp,
        payment: Option<&Payment>,
    ) -> AppResult<Stay> {
        // Both writes happen under the stays lock, mirroring the
        // transaction the Postgres store runs.
        let mut stays = self.stays.lock();
        let stay = stays
            .iter_mut()
            .find(|s| s.id == stay_id)
            .ok_or_else(|| AppError::NotFound(format!("stay {}", stay_id)))?;

        if stay.status != StayStatus::Inside {
            return Err(AppError::AlreadyFinalized(stay_id));
        }

        stay.status = StayStatus::Outside;
        stay.exited_at = Some(exit.exited_at);
        stay.exit_operator_id = Some(exit.operator_id);

        if let Some(payment) = payment {
            let mut payments = self.payments.lock();
            let mut saved = payment.clone();
            saved.id = payments.len() as i64 + 1;
            payments.push(saved);
        }

        Ok(stay.clone())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStays {
    async fn save(&self, payment: &Payment) -> AppResult<Payment> {
        let mut payments = self.payments.lock();
        let mut saved = payment.clone();
        saved.id = payments.len() as i64 + 1;
        payments.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_stay(&self, stay_id: i32) -> AppResult<Option<Payment>> {
        Ok(self
            .payments
            .lock()
            .iter()
            .find(|p| p.stay_id == stay_id)
            .cloned())
    }
}

/// Membership lookup over a fixed set of covered plates
struct StaticMemberships {
    covered: HashSet<String>,
}

impl StaticMemberships {
    fn none() -> Self {
        Self {
            covered: HashSet::new(),
        }
    }

    fn covering(plates: &[&str]) -> Self {
        Self {
            covered: plates.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[async_trait]
impl MembershipRepository for StaticMemberships {
    async fn is_currently_active(&self, plate: &str) -> AppResult<bool> {
        Ok(self.covered.contains(plate))
    }
}

/// Tariff resolution over a fixed table, no cache involved
struct TableTariffs {
    table: HashMap<VehicleClass, Tariff>,
}

impl TableTariffs {
    fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    fn with(tariffs: &[Tariff]) -> Self {
        Self {
            table: tariffs
                .iter()
                .map(|t| (t.vehicle_class, t.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl TariffResolver for TableTariffs {
    async fn resolve(&self, vehicle_class: VehicleClass) -> AppResult<Option<Tariff>> {
        Ok(self.table.get(&vehicle_class).cloned())
    }
}

type Service = StayLifecycleService<InMemoryStays, StaticMemberships, TableTariffs>;

fn standard_car_tariff() -> Tariff {
    Tariff {
        id: 1,
        description: Some("Car - standard".to_string()),
        vehicle_class: VehicleClass::Car,
        hourly_rate: dec!(2000),
        fraction_rate: dec!(500),
        fraction_minutes: 15,
        daily_cap: dec!(0),
        grace_period_minutes: 10,
        ..Default::default()
    }
}

fn service_with(
    memberships: StaticMemberships,
    tariffs: TableTariffs,
) -> (Arc<InMemoryStays>, Service) {
    init_logging();
    let store = Arc::new(InMemoryStays::default());
    let service = StayLifecycleService::new(
        store.clone(),
        Arc::new(memberships),
        Arc::new(tariffs),
    );
    (store, service)
}

fn guest_service() -> (Arc<InMemoryStays>, Service) {
    service_with(
        StaticMemberships::none(),
        TableTariffs::with(&[standard_car_tariff()]),
    )
}

// ==================== Entry ====================

#[tokio::test]
async fn entry_creates_inside_guest_stay() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("abc-123", VehicleClass::Car, 1)
        .await
        .unwrap();

    assert!(stay.id > 0);
    assert_eq!(stay.plate, "ABC123");
    assert_eq!(stay.kind, StayKind::Guest);
    assert_eq!(stay.status, StayStatus::Inside);
    assert!(stay.exited_at.is_none());
    assert_eq!(store.stay_count(), 1);
}

#[tokio::test]
async fn entry_classifies_member_from_coverage() {
    let (_, service) = service_with(
        StaticMemberships::covering(&["ABC123"]),
        TableTariffs::with(&[standard_car_tariff()]),
    );

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    assert_eq!(stay.kind, StayKind::Member);
}

#[tokio::test]
async fn duplicate_entry_fails_and_leaves_store_unchanged() {
    let (store, service) = guest_service();

    service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    let result = service.register_entry("abc 123", VehicleClass::Car, 2).await;

    assert!(matches!(result, Err(AppError::AlreadyInside(ref p)) if p == "ABC123"));
    assert_eq!(store.stay_count(), 1);
}

#[tokio::test]
async fn entry_rejects_unusable_plates() {
    let (store, service) = guest_service();

    let empty = service.register_entry("---", VehicleClass::Car, 1).await;
    assert!(matches!(empty, Err(AppError::Validation(_))));

    let oversized = service
        .register_entry("ABCDEFGH123456", VehicleClass::Car, 1)
        .await;
    assert!(matches!(oversized, Err(AppError::Validation(_))));

    assert_eq!(store.stay_count(), 0);
}

#[tokio::test]
async fn concurrent_entries_admit_exactly_one() {
    let (store, service) = guest_service();
    let service = Arc::new(service);

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.register_entry("ABC123", VehicleClass::Car, i).await
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(AppError::AlreadyInside(_)) => rejected += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(rejected, 7);
    assert_eq!(store.stay_count(), 1);
}

#[tokio::test]
async fn reentry_after_exit_is_a_new_stay() {
    let (store, service) = guest_service();

    let first = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    service
        .finalize_exit(&first, 1, Decimal::ZERO, "cash")
        .await
        .unwrap();

    let second = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.stay_count(), 2);
    assert_eq!(service.active_stays().await.unwrap().len(), 1);
}

#[tokio::test]
async fn active_stays_are_ordered_by_entry_time() {
    let (store, service) = guest_service();

    let late = service
        .register_entry("LATE1", VehicleClass::Car, 1)
        .await
        .unwrap();
    let early = service
        .register_entry("EARLY1", VehicleClass::Car, 1)
        .await
        .unwrap();
    store.backdate(early.id, 60);

    let active = service.active_stays().await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].id, early.id);
    assert_eq!(active[1].id, late.id);
}

// ==================== Exit pricing ====================

#[tokio::test]
async fn quote_fails_for_plate_not_inside() {
    let (_, service) = guest_service();

    let result = service.calculate_exit_details("GHOST1").await;
    assert!(matches!(result, Err(AppError::NotInside(ref p)) if p == "GHOST1"));
}

#[tokio::test]
async fn member_stay_owes_zero_for_any_duration() {
    let (store, service) = service_with(
        StaticMemberships::covering(&["ABC123"]),
        TableTariffs::empty(),
    );

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();

    let quote = service.calculate_exit_details("ABC123").await.unwrap();
    assert_eq!(quote.amount_due, Decimal::ZERO);

    // Ten years inside, still free; no tariff is even consulted
    store.backdate(stay.id, 10 * 365 * 24 * 60);
    let quote = service.calculate_exit_details("ABC123").await.unwrap();
    assert_eq!(quote.amount_due, Decimal::ZERO);
}

#[tokio::test]
async fn guest_quote_prices_elapsed_time() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    store.backdate(stay.id, 95);

    // 1 hour + ceil(35/15) = 3 fractions: 2000 + 1500
    let quote = service.calculate_exit_details("ABC123").await.unwrap();
    assert_eq!(quote.amount_due, dec!(3500));
    assert_eq!(quote.elapsed_minutes, 95);
}

#[tokio::test]
async fn guest_quote_honors_daily_cap() {
    let capped = Tariff {
        daily_cap: dec!(3000),
        ..standard_car_tariff()
    };
    let (store, service) =
        service_with(StaticMemberships::none(), TableTariffs::with(&[capped]));

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    store.backdate(stay.id, 95);

    let quote = service.calculate_exit_details("ABC123").await.unwrap();
    assert_eq!(quote.amount_due, dec!(3000));
}

#[tokio::test]
async fn grace_period_boundary_is_inclusive() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();

    store.backdate(stay.id, 10);
    let at_grace = service.calculate_exit_details("ABC123").await.unwrap();
    assert_eq!(at_grace.amount_due, Decimal::ZERO);

    store.backdate(stay.id, 11);
    let past_grace = service.calculate_exit_details("ABC123").await.unwrap();
    assert_eq!(past_grace.amount_due, dec!(500));
}

#[tokio::test]
async fn quote_fails_loudly_without_active_tariff() {
    let (_, service) = service_with(StaticMemberships::none(), TableTariffs::empty());

    service
        .register_entry("ABC123", VehicleClass::Motorcycle, 1)
        .await
        .unwrap();

    let result = service.calculate_exit_details("ABC123").await;
    assert!(matches!(result, Err(AppError::NoActiveTariff(ref c)) if c == "motorcycle"));
}

#[tokio::test]
async fn quoting_never_mutates_the_store() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    store.backdate(stay.id, 120);

    let before = store.snapshot();
    service.calculate_exit_details("ABC123").await.unwrap();
    service.calculate_exit_details("ABC123").await.unwrap();
    let after = store.snapshot();

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.status, a.status);
        assert_eq!(b.entered_at, a.entered_at);
        assert_eq!(b.exited_at, a.exited_at);
    }
    assert_eq!(store.payment_count(), 0);
}

// ==================== Exit finalization ====================

#[tokio::test]
async fn finalize_with_zero_amount_records_no_payment() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    let closed = service
        .finalize_exit(&stay, 2, Decimal::ZERO, "cash")
        .await
        .unwrap();

    assert_eq!(closed.status, StayStatus::Outside);
    assert!(closed.exited_at.is_some());
    assert_eq!(closed.exit_operator_id, Some(2));
    assert_eq!(store.payment_count(), 0);
}

#[tokio::test]
async fn finalize_with_positive_amount_records_exactly_one_payment() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    service
        .finalize_exit(&stay, 2, dec!(3500), "card")
        .await
        .unwrap();

    assert_eq!(store.payment_count(), 1);
    let payment = store.find_by_stay(stay.id).await.unwrap().unwrap();
    assert_eq!(payment.amount, dec!(3500));
    assert_eq!(payment.method, "card");
    assert_eq!(payment.operator_id, 2);
}

#[tokio::test]
async fn finalize_rejects_negative_amounts() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    let result = service.finalize_exit(&stay, 2, dec!(-100), "cash").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(store.payment_count(), 0);
    assert!(store.find_by_id(stay.id).await.unwrap().unwrap().is_inside());
}

#[tokio::test]
async fn second_finalize_fails_without_double_charge() {
    let (store, service) = guest_service();

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();
    let closed = service
        .finalize_exit(&stay, 2, dec!(2000), "cash")
        .await
        .unwrap();

    // A stale quote holder tries again
    let result = service.finalize_exit(&stay, 3, dec!(2000), "cash").await;
    assert!(matches!(result, Err(AppError::AlreadyFinalized(id)) if id == stay.id));

    assert_eq!(store.payment_count(), 1);
    let current = store.find_by_id(stay.id).await.unwrap().unwrap();
    assert_eq!(current.exited_at, closed.exited_at);
    assert_eq!(current.exit_operator_id, Some(2));
}

#[tokio::test]
async fn concurrent_finalizes_charge_once() {
    let (store, service) = guest_service();
    let service = Arc::new(service);

    let stay = service
        .register_entry("ABC123", VehicleClass::Car, 1)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let service = service.clone();
        let stay = stay.clone();
        handles.push(tokio::spawn(async move {
            service.finalize_exit(&stay, i, dec!(1500), "cash").await
        }));
    }

    let mut finalized = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => finalized += 1,
            Err(AppError::AlreadyFinalized(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(finalized, 1);
    assert_eq!(store.payment_count(), 1);
}

use super::*;
use crate::db::repository::{category, inventory};
use crate::db::test_pool;
use crate::message::MessageBus;
use shared::message::EventType;
use shared::models::{
    CashRegisterOpen, CategoryCreate, ComboComponentInput, DiningTableCreate, ProductComplementInput,
    ProductCreate,
};

const ACTOR: i64 = 1;

struct Fixture {
    lifecycle: OrderLifecycle,
    bus: MessageBus,
    pool: SqlitePool,
}

async fn fixture() -> Fixture {
    let pool = test_pool().await;
    let bus = MessageBus::new();
    let lifecycle = OrderLifecycle::new(pool.clone(), OrderNotifier::new(bus.clone()));
    Fixture { lifecycle, bus, pool }
}

async fn seed_product(pool: &SqlitePool, code: &str, price: f64, is_combo: bool) -> Product {
    product::create(
        pool,
        ProductCreate {
            name: code.into(),
            description: None,
            price,
            cost: None,
            code: code.into(),
            image: None,
            category_id: None,
            is_combo: Some(is_combo),
        },
    )
    .await
    .unwrap()
}

async fn seed_stock(pool: &SqlitePool, product_id: i64, qty: i64) {
    let mut conn = pool.acquire().await.unwrap();
    inventory::record_movement(
        &mut conn,
        NewMovement {
            product_id,
            movement_type: MovementType::Entrada,
            quantity: qty,
            reason: Some("inicial"),
            user_id: ACTOR,
            order_id: None,
        },
    )
    .await
    .unwrap();
}

async fn seed_table(pool: &SqlitePool, number: i64) -> i64 {
    dining_table::create(
        pool,
        DiningTableCreate { number, capacity: None, location: None, notes: None },
    )
    .await
    .unwrap()
    .id
}

fn line(product_id: i64, quantity: i64) -> OrderItemInput {
    OrderItemInput { product_id, quantity, notes: None, complement_of: None }
}

fn cart(table_id: Option<i64>, items: Vec<OrderItemInput>) -> OrderCreate {
    OrderCreate { table_id, bartender_id: None, notes: None, items }
}

async fn table_status(pool: &SqlitePool, table_id: i64) -> TableStatus {
    dining_table::find_by_id(pool, table_id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn scenario_a_table_follows_the_order() {
    let f = fixture().await;
    let cat = category::create(
        &f.pool,
        CategoryCreate { name: "Cervezas".into(), description: None, color: Some("#ffc107".into()) },
    )
    .await
    .unwrap();
    let mut beer = seed_product(&f.pool, "CERV", 45.0, false).await;
    beer = product::update(
        &f.pool,
        beer.id,
        shared::models::ProductUpdate {
            name: None,
            description: None,
            price: None,
            cost: None,
            code: None,
            image: None,
            category_id: Some(cat.id),
            is_combo: None,
            is_active: None,
        },
    )
    .await
    .unwrap();
    let table = seed_table(&f.pool, 5).await;
    let mut rx = f.bus.subscribe();

    let detail = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(beer.id, 2)]), ACTOR)
        .await
        .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.subtotal, 90.0);
    assert_eq!(detail.order.total, 90.0);
    assert_eq!(detail.items.len(), 1);
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Occupied);

    let created = rx.recv().await.unwrap();
    assert_eq!(created.event_type, EventType::OrderUpdated);
    let snap: OrderSnapshot = created.parse_payload().unwrap();
    assert_eq!(snap.mesa_numero, Some(5));
    assert_eq!(snap.productos[0].color, "#ffc107");
    assert_eq!(snap.productos[0].categoria.as_deref(), Some("Cervezas"));

    let id = detail.order.id;
    f.lifecycle.update_status(id, OrderStatus::InProgress, None, ACTOR).await.unwrap();
    f.lifecycle.update_status(id, OrderStatus::Ready, None, ACTOR).await.unwrap();
    // lista no longer occupies, but the flag only flips on a terminal status
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Occupied);

    let delivered = f
        .lifecycle
        .update_status(id, OrderStatus::Delivered, None, ACTOR)
        .await
        .unwrap();
    assert_eq!(delivered.estado, OrderStatus::Delivered);
    assert_eq!(delivered.version, 4);
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);

    // created + 3 status changes
    let history = f.lifecycle.history(id).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].action, HistoryAction::Created);
    assert_eq!(history[3].detail, "Estado cambiado de lista a entregada");

    let mut events = 1;
    while let Ok(msg) = rx.try_recv() {
        assert_eq!(msg.event_type, EventType::OrderUpdated);
        events += 1;
    }
    assert_eq!(events, 4);
}

#[tokio::test]
async fn table_stays_occupied_while_another_order_holds_it() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let table = seed_table(&f.pool, 1).await;

    let first = f.lifecycle.create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR).await.unwrap();
    // ocupada with an active order refuses a second cart
    let err = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TableOccupied);

    f.lifecycle
        .update_status(first.order.id, OrderStatus::Cancelled, None, ACTOR)
        .await
        .unwrap();
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
}

#[tokio::test]
async fn scenario_b_combo_consumes_components() {
    let f = fixture().await;
    let beer = seed_product(&f.pool, "P", 40.0, false).await;
    let cubeta = seed_product(&f.pool, "CUBETA", 200.0, true).await;
    seed_stock(&f.pool, beer.id, 6).await;
    {
        let mut conn = f.pool.acquire().await.unwrap();
        product::replace_components(
            &mut conn,
            cubeta.id,
            &[ComboComponentInput { component_id: beer.id, quantity: 6 }],
        )
        .await
        .unwrap();
    }

    let detail = f.lifecycle.create_order(cart(None, vec![line(cubeta.id, 1)]), ACTOR).await.unwrap();
    assert_eq!(detail.order.total, 200.0);
    assert_eq!(inventory::quantity_on_hand(&f.pool, beer.id).await.unwrap(), 0);

    let err = f
        .lifecycle
        .create_order(cart(None, vec![line(cubeta.id, 1)]), ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductOutOfStock);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_cart() {
    let f = fixture().await;
    let a = seed_product(&f.pool, "A", 10.0, false).await;
    let b = seed_product(&f.pool, "B", 10.0, false).await;
    seed_stock(&f.pool, a.id, 5).await;
    seed_stock(&f.pool, b.id, 1).await;
    let table = seed_table(&f.pool, 2).await;

    let err = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(a.id, 2), line(b.id, 3)]), ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);

    assert_eq!(inventory::quantity_on_hand(&f.pool, a.id).await.unwrap(), 5);
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
    assert!(f.lifecycle.list(&OrderFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn untracked_products_sell_without_stock() {
    let f = fixture().await;
    let mojito = seed_product(&f.pool, "MOJITO", 85.5, false).await;
    let detail = f.lifecycle.create_order(cart(None, vec![line(mojito.id, 3)]), ACTOR).await.unwrap();
    assert_eq!(detail.order.subtotal, 256.5);
    assert!(inventory::find_by_product(&f.pool, mojito.id).await.unwrap().is_none());
}

#[tokio::test]
async fn rejects_bad_carts() {
    let f = fixture().await;
    let err = f.lifecycle.create_order(cart(None, vec![]), ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderEmpty);

    let err = f.lifecycle.create_order(cart(None, vec![line(999, 1)]), ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductNotFound);

    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let err = f.lifecycle.create_order(cart(None, vec![line(p.id, 0)]), ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let err = f.lifecycle.create_order(cart(Some(77), vec![line(p.id, 1)]), ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);
}

#[tokio::test]
async fn free_and_mandatory_complements() {
    let f = fixture().await;
    let bottle = seed_product(&f.pool, "BOTELLA", 900.0, false).await;
    let mixer = seed_product(&f.pool, "REFRESCO", 30.0, false).await;
    {
        let mut conn = f.pool.acquire().await.unwrap();
        product::replace_complements(
            &mut conn,
            bottle.id,
            &[ProductComplementInput {
                complement_id: mixer.id,
                required_quantity: None,
                is_mandatory: Some(true),
                is_free: Some(true),
            }],
        )
        .await
        .unwrap();
    }

    let err = f.lifecycle.create_order(cart(None, vec![line(bottle.id, 1)]), ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderItemInvalid);

    let mut with_mixer = line(mixer.id, 2);
    with_mixer.complement_of = Some(bottle.id);
    let detail = f
        .lifecycle
        .create_order(cart(None, vec![line(bottle.id, 1), with_mixer]), ACTOR)
        .await
        .unwrap();
    assert_eq!(detail.order.total, 900.0);
    let free = detail.items.iter().find(|i| i.product_id == mixer.id).unwrap();
    assert!(free.is_free_complement);
    assert_eq!(free.unit_price, 0.0);

    let mut orphan = line(mixer.id, 1);
    orphan.complement_of = Some(bottle.id);
    let err = f.lifecycle.create_order(cart(None, vec![orphan]), ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderItemInvalid);
}

#[tokio::test]
async fn invalid_transition_changes_nothing() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let id = f.lifecycle.create_order(cart(None, vec![line(p.id, 1)]), ACTOR).await.unwrap().order.id;
    f.lifecycle.update_status(id, OrderStatus::Ready, None, ACTOR).await.unwrap();

    let mut rx = f.bus.subscribe();
    let err = f
        .lifecycle
        .update_status(id, OrderStatus::Pending, None, ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderInvalidTransition);

    let snap = f.lifecycle.snapshot(id).await.unwrap();
    assert_eq!(snap.estado, OrderStatus::Ready);
    assert_eq!(f.lifecycle.history(id).await.unwrap().len(), 2);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let id = f.lifecycle.create_order(cart(None, vec![line(p.id, 1)]), ACTOR).await.unwrap().order.id;

    f.lifecycle.update_status(id, OrderStatus::InProgress, Some(1), ACTOR).await.unwrap();
    let err = f
        .lifecycle
        .update_status(id, OrderStatus::Ready, Some(1), ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderVersionConflict);
    assert_eq!(f.lifecycle.snapshot(id).await.unwrap().version, 2);
}

#[tokio::test]
async fn scenario_d_second_terminal_move_is_rejected() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let table = seed_table(&f.pool, 3).await;
    let id = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
        .await
        .unwrap()
        .order
        .id;

    f.lifecycle.update_status(id, OrderStatus::Delivered, Some(1), ACTOR).await.unwrap();
    let err = f
        .lifecycle
        .update_status(id, OrderStatus::Cancelled, Some(1), ACTOR)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
    assert_eq!(f.lifecycle.history(id).await.unwrap().len(), 2);
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
}

#[tokio::test]
async fn mark_paid_keeps_status_and_table() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 120.0, false).await;
    let table = seed_table(&f.pool, 4).await;
    let register = crate::db::repository::cash_register::open(
        &f.pool,
        ACTOR,
        CashRegisterOpen { opening_amount: 500.0, notes: None },
    )
    .await
    .unwrap();
    let id = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
        .await
        .unwrap()
        .order
        .id;

    let mut rx = f.bus.subscribe();
    let paid = f.lifecycle.mark_paid(id, PaymentMethod::Efectivo, ACTOR).await.unwrap();
    assert!(paid.is_paid);
    assert_eq!(paid.status, OrderStatus::Pending);
    assert_eq!(paid.payment_method, Some(PaymentMethod::Efectivo));
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Occupied);
    assert!(rx.try_recv().is_err());

    let movements = cash_register::find_movements(&f.pool, register.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, 120.0);
    assert_eq!(movements[0].order_id, Some(id));

    let err = f.lifecycle.mark_paid(id, PaymentMethod::Tarjeta, ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderAlreadyPaid);

    let history = f.lifecycle.history(id).await.unwrap();
    assert_eq!(history.last().unwrap().action, HistoryAction::Paid);
}

#[tokio::test]
async fn cancelled_orders_cannot_be_paid() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let id = f.lifecycle.create_order(cart(None, vec![line(p.id, 1)]), ACTOR).await.unwrap().order.id;
    f.lifecycle.update_status(id, OrderStatus::Cancelled, None, ACTOR).await.unwrap();
    let err = f.lifecycle.mark_paid(id, PaymentMethod::Tarjeta, ACTOR).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn recompute_and_destroy() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 33.33, false).await;
    let table = seed_table(&f.pool, 8).await;
    let id = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 3)]), ACTOR)
        .await
        .unwrap()
        .order
        .id;

    let order = f.lifecycle.recompute_totals(id, ACTOR).await.unwrap();
    assert_eq!(order.subtotal, 99.99);
    assert_eq!(
        f.lifecycle.history(id).await.unwrap().last().unwrap().action,
        HistoryAction::ItemsRecalculated
    );

    f.lifecycle.destroy(id, ACTOR).await.unwrap();
    assert_eq!(f.lifecycle.get(id).await.unwrap_err().code, ErrorCode::OrderNotFound);
    assert_eq!(f.lifecycle.history(id).await.unwrap_err().code, ErrorCode::OrderNotFound);
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
}

#[tokio::test]
async fn active_lists_oldest_first() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let a = f.lifecycle.create_order(cart(None, vec![line(p.id, 1)]), ACTOR).await.unwrap().order.id;
    let b = f.lifecycle.create_order(cart(None, vec![line(p.id, 2)]), ACTOR).await.unwrap().order.id;
    let c = f.lifecycle.create_order(cart(None, vec![line(p.id, 3)]), ACTOR).await.unwrap().order.id;
    f.lifecycle.update_status(b, OrderStatus::Delivered, None, ACTOR).await.unwrap();

    let active: Vec<i64> = f.lifecycle.active().await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(active, vec![a, c]);
    let snap = f.lifecycle.snapshot(c).await.unwrap();
    assert_eq!(snap.usuario_nombre.as_deref(), Some("Administrador"));
    assert_eq!(snap.usuario_rol.as_deref(), Some("admin"));
    assert_eq!(snap.total, 30.0);
}

#[tokio::test]
async fn destroying_a_ready_order_frees_the_table() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let table = seed_table(&f.pool, 6).await;
    let id = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
        .await
        .unwrap()
        .order
        .id;
    f.lifecycle.update_status(id, OrderStatus::Ready, None, ACTOR).await.unwrap();
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Occupied);

    f.lifecycle.destroy(id, ACTOR).await.unwrap();
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
}

#[tokio::test]
async fn destroy_keeps_table_held_by_another_order() {
    let f = fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let table = seed_table(&f.pool, 7).await;
    let first = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
        .await
        .unwrap()
        .order
        .id;
    f.lifecycle.update_status(first, OrderStatus::Ready, None, ACTOR).await.unwrap();
    // lista no longer blocks new orders on the table
    let second = f
        .lifecycle
        .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
        .await
        .unwrap()
        .order
        .id;

    f.lifecycle.destroy(first, ACTOR).await.unwrap();
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Occupied);
    f.lifecycle.destroy(second, ACTOR).await.unwrap();
    assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
}

// ============================================================================
// File-backed database, real concurrent writers
// ============================================================================

async fn file_fixture() -> (Fixture, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pos.db");
    let pool = crate::db::DbService::new(&path.to_string_lossy()).await.unwrap().pool;
    let bus = MessageBus::new();
    let lifecycle = OrderLifecycle::new(pool.clone(), OrderNotifier::new(bus.clone()));
    (Fixture { lifecycle, bus, pool }, dir)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_terminal_moves_have_one_winner() {
    let (f, _dir) = file_fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;

    for round in 0..10 {
        let table = seed_table(&f.pool, 100 + round).await;
        let id = f
            .lifecycle
            .create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR)
            .await
            .unwrap()
            .order
            .id;

        let (delivered, cancelled) = tokio::join!(
            f.lifecycle.update_status(id, OrderStatus::Delivered, Some(1), ACTOR),
            f.lifecycle.update_status(id, OrderStatus::Cancelled, Some(1), ACTOR),
        );
        let loser = match (delivered, cancelled) {
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
            (a, b) => panic!("round {round}: expected exactly one winner, got {a:?} / {b:?}"),
        };
        assert!(
            matches!(
                loser.code,
                ErrorCode::OrderVersionConflict | ErrorCode::OrderInvalidTransition
            ),
            "round {round}: loser failed with {:?}",
            loser.code
        );
        assert_eq!(f.lifecycle.history(id).await.unwrap().len(), 2);
        assert_eq!(table_status(&f.pool, table).await, TableStatus::Available);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_carts_on_one_table_have_one_winner() {
    let (f, _dir) = file_fixture().await;
    let p = seed_product(&f.pool, "P", 10.0, false).await;
    let table = seed_table(&f.pool, 1).await;

    let (a, b) = tokio::join!(
        f.lifecycle.create_order(cart(Some(table), vec![line(p.id, 1)]), ACTOR),
        f.lifecycle.create_order(cart(Some(table), vec![line(p.id, 2)]), ACTOR),
    );
    let loser = match (a, b) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
        (a, b) => panic!("expected exactly one winner, got {a:?} / {b:?}"),
    };
    assert_eq!(loser.code, ErrorCode::TableOccupied);
    assert_eq!(f.lifecycle.active().await.unwrap().len(), 1);
}

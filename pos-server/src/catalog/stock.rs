//! StockResolver - combo availability from component stock
//!
//! Pure read at request time, nothing is cached. A combo reported available
//! here can still fail at sale time if another sale consumes the components
//! first; the order transaction re-checks stock when it records the sale.

use shared::models::{ComponentShortage, DEFAULT_CATEGORY_COLOR, MenuProduct, Product, ProductAvailability};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::repository::product::{self, ComponentState};
use crate::db::repository::{RepoResult, inventory};

pub struct StockResolver;

impl StockResolver {
    /// Components that block `units` combos
    ///
    /// Empty when every component exists, is active and has
    /// `on_hand >= required × units`.
    pub fn shortages(states: &[ComponentState], units: i64) -> Vec<ComponentShortage> {
        states
            .iter()
            .filter_map(|c| {
                let required = c.required.saturating_mul(units);
                match (c.is_active, c.on_hand) {
                    (None, _) | (_, None) => Some(ComponentShortage::Missing {
                        component_id: c.component_id,
                    }),
                    (Some(false), _) => Some(ComponentShortage::Inactive {
                        component_id: c.component_id,
                    }),
                    (Some(true), Some(on_hand)) if on_hand < required => {
                        Some(ComponentShortage::InsufficientStock {
                            component_id: c.component_id,
                            required,
                            on_hand,
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// `false` for non-combos; otherwise `true` iff no component blocks one unit
    pub async fn combo_available(conn: &mut SqliteConnection, product: &Product) -> RepoResult<bool> {
        if !product.is_combo {
            return Ok(false);
        }
        let states = product::component_states(&mut *conn, product.id).await?;
        Ok(Self::shortages(&states, 1).is_empty())
    }

    /// Combo → 1/0 per availability; normal product → stock on hand or 0
    pub async fn current_stock(conn: &mut SqliteConnection, product: &Product) -> RepoResult<i64> {
        if product.is_combo {
            Ok(i64::from(Self::combo_available(conn, product).await?))
        } else {
            inventory::quantity_on_hand(&mut *conn, product.id).await
        }
    }

    /// Availability verdict with the reasons a combo is blocked
    ///
    /// Normal products without a stock row are untracked and available while
    /// active.
    pub async fn availability(
        conn: &mut SqliteConnection,
        product: &Product,
    ) -> RepoResult<ProductAvailability> {
        if product.is_combo {
            let states = product::component_states(&mut *conn, product.id).await?;
            let shortages = Self::shortages(&states, 1);
            let available = shortages.is_empty();
            return Ok(ProductAvailability {
                product_id: product.id,
                is_combo: true,
                is_available: product.is_active && available,
                current_stock: i64::from(available),
                shortages,
            });
        }

        let stock = inventory::find_by_product(&mut *conn, product.id).await?;
        let current_stock = stock.as_ref().map_or(0, |s| s.quantity);
        Ok(ProductAvailability {
            product_id: product.id,
            is_combo: false,
            is_available: product.is_active && stock.is_none_or(|s| s.quantity > 0),
            current_stock,
            shortages: Vec::new(),
        })
    }

    /// Active products with category color and derived stock
    pub async fn menu(pool: &SqlitePool) -> RepoResult<Vec<MenuProduct>> {
        let rows = product::find_menu(pool).await?;
        let mut conn = pool.acquire().await?;
        let mut menu = Vec::with_capacity(rows.len());
        for row in rows {
            let (current_stock, is_available) = if row.product.is_combo {
                let available = Self::combo_available(&mut conn, &row.product).await?;
                (i64::from(available), available)
            } else {
                (row.stock.unwrap_or(0), row.stock.is_none_or(|q| q > 0))
            };
            menu.push(MenuProduct {
                category_name: row.category_name,
                category_color: row
                    .category_color
                    .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
                current_stock,
                is_available,
                product: row.product,
            });
        }
        Ok(menu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::inventory::{NewMovement, record_movement};
    use crate::db::test_pool;
    use shared::models::{ComboComponentInput, MovementType, ProductCreate, ProductUpdate};

    fn state(component_id: i64, required: i64, is_active: Option<bool>, on_hand: Option<i64>) -> ComponentState {
        ComponentState { component_id, required, is_active, on_hand }
    }

    async fn product(pool: &SqlitePool, code: &str, is_combo: bool) -> Product {
        product::create(
            pool,
            ProductCreate {
                name: code.into(),
                description: None,
                price: 50.0,
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

    async fn stock(pool: &SqlitePool, product_id: i64, qty: i64) {
        let mut conn = pool.acquire().await.unwrap();
        record_movement(
            &mut conn,
            NewMovement {
                product_id,
                movement_type: MovementType::Ajuste,
                quantity: qty,
                reason: None,
                user_id: 1,
                order_id: None,
            },
        )
        .await
        .unwrap();
    }

    async fn components(pool: &SqlitePool, combo_id: i64, parts: &[(i64, i64)]) {
        let mut conn = pool.acquire().await.unwrap();
        let inputs: Vec<_> = parts
            .iter()
            .map(|&(component_id, quantity)| ComboComponentInput { component_id, quantity })
            .collect();
        product::replace_components(&mut conn, combo_id, &inputs).await.unwrap();
    }

    #[test]
    fn shortages_cover_every_blocking_reason() {
        let states = [
            state(1, 2, Some(true), Some(5)),
            state(2, 1, Some(true), Some(0)),
            state(3, 1, Some(false), Some(10)),
            state(4, 1, None, None),
        ];
        let s = StockResolver::shortages(&states, 1);
        assert_eq!(
            s,
            vec![
                ComponentShortage::InsufficientStock { component_id: 2, required: 1, on_hand: 0 },
                ComponentShortage::Inactive { component_id: 3 },
                ComponentShortage::Missing { component_id: 4 },
            ]
        );
        assert!(StockResolver::shortages(&states[..1], 2).is_empty());
        assert_eq!(StockResolver::shortages(&states[..1], 3).len(), 1);
    }

    #[tokio::test]
    async fn non_combo_is_never_combo_available() {
        let pool = test_pool().await;
        let p = product(&pool, "AGUA", false).await;
        stock(&pool, p.id, 10).await;
        let mut conn = pool.acquire().await.unwrap();
        assert!(!StockResolver::combo_available(&mut conn, &p).await.unwrap());
        assert_eq!(StockResolver::current_stock(&mut conn, &p).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn cubeta_needs_six_beers() {
        let pool = test_pool().await;
        let beer = product(&pool, "P", false).await;
        let cubeta = product(&pool, "CUBETA", true).await;
        stock(&pool, beer.id, 4).await;
        components(&pool, cubeta.id, &[(beer.id, 6)]).await;

        let mut conn = pool.acquire().await.unwrap();
        assert!(!StockResolver::combo_available(&mut conn, &cubeta).await.unwrap());
        assert_eq!(StockResolver::current_stock(&mut conn, &cubeta).await.unwrap(), 0);
        drop(conn);

        stock(&pool, beer.id, 6).await;
        let mut conn = pool.acquire().await.unwrap();
        assert!(StockResolver::combo_available(&mut conn, &cubeta).await.unwrap());
        assert_eq!(StockResolver::current_stock(&mut conn, &cubeta).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn one_short_component_blocks_the_combo() {
        let pool = test_pool().await;
        let p = product(&pool, "P", false).await;
        let q = product(&pool, "Q", false).await;
        let combo = product(&pool, "COMBO", true).await;
        stock(&pool, p.id, 5).await;
        stock(&pool, q.id, 0).await;
        components(&pool, combo.id, &[(p.id, 2), (q.id, 1)]).await;

        let mut conn = pool.acquire().await.unwrap();
        let avail = StockResolver::availability(&mut conn, &combo).await.unwrap();
        assert!(!avail.is_available);
        assert_eq!(
            avail.shortages,
            vec![ComponentShortage::InsufficientStock { component_id: q.id, required: 1, on_hand: 0 }]
        );
    }

    #[tokio::test]
    async fn inactive_or_deleted_component_blocks_the_combo() {
        let pool = test_pool().await;
        let p = product(&pool, "P", false).await;
        let q = product(&pool, "Q", false).await;
        let combo = product(&pool, "COMBO", true).await;
        stock(&pool, p.id, 5).await;
        stock(&pool, q.id, 5).await;
        components(&pool, combo.id, &[(p.id, 1), (q.id, 1)]).await;

        product::update(
            &pool,
            p.id,
            ProductUpdate {
                name: None,
                description: None,
                price: None,
                cost: None,
                code: None,
                image: None,
                category_id: None,
                is_combo: None,
                is_active: Some(false),
            },
        )
        .await
        .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        assert!(!StockResolver::combo_available(&mut conn, &combo).await.unwrap());
        drop(conn);

        product::delete(&pool, q.id).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let avail = StockResolver::availability(&mut conn, &combo).await.unwrap();
        assert!(avail.shortages.contains(&ComponentShortage::Missing { component_id: q.id }));
    }

    #[tokio::test]
    async fn menu_uses_fallback_color_and_derived_stock() {
        let pool = test_pool().await;
        let beer = product(&pool, "P", false).await;
        let cubeta = product(&pool, "CUBETA", true).await;
        let untracked = product(&pool, "MOJITO", false).await;
        stock(&pool, beer.id, 12).await;
        components(&pool, cubeta.id, &[(beer.id, 6)]).await;

        let menu = StockResolver::menu(&pool).await.unwrap();
        assert_eq!(menu.len(), 3);
        let by_id = |id| menu.iter().find(|m| m.product.id == id).unwrap();
        assert_eq!(by_id(cubeta.id).current_stock, 1);
        assert!(by_id(cubeta.id).is_available);
        assert_eq!(by_id(beer.id).current_stock, 12);
        assert_eq!(by_id(untracked.id).current_stock, 0);
        assert!(by_id(untracked.id).is_available);
        assert!(menu.iter().all(|m| m.category_color == DEFAULT_CATEGORY_COLOR));
    }
}

//! Product Repository (products, combo components, complements)

use super::{RepoError, RepoResult};
use shared::models::{
    ComboComponent, ComboComponentInput, Product, ProductComplement, ProductComplementInput,
    ProductCreate, ProductUpdate,
};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

/// One combo requirement joined with the component's current state
///
/// `is_active` / `on_hand` are `None` when the component row no longer exists.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ComponentState {
    pub component_id: i64,
    pub required: i64,
    pub is_active: Option<bool>,
    pub on_hand: Option<i64>,
}

/// Product joined with its category, as shown on the menu
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MenuRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub stock: Option<i64>,
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, description, price, cost, code, image, is_active, category_id, is_combo, created_at, updated_at FROM product ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn find_by_id<'e>(exec: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, description, price, cost, code, image, is_active, category_id, is_combo, created_at, updated_at FROM product WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(exec)
    .await?;
    Ok(product)
}

/// Active products with category and stock, for the menu
pub async fn find_menu(pool: &SqlitePool) -> RepoResult<Vec<MenuRow>> {
    let rows = sqlx::query_as::<_, MenuRow>(
        "SELECT p.id, p.name, p.description, p.price, p.cost, p.code, p.image, p.is_active, p.category_id, p.is_combo, p.created_at, p.updated_at, \
         c.name AS category_name, c.color AS category_color, s.quantity AS stock \
         FROM product p \
         LEFT JOIN category c ON c.id = p.category_id \
         LEFT JOIN inventory_stock s ON s.product_id = p.id \
         WHERE p.is_active = 1 \
         ORDER BY c.name, p.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO product (name, description, price, cost, code, image, is_active, category_id, is_combo, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?9) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.cost.unwrap_or(0.0))
    .bind(&data.code)
    .bind(&data.image)
    .bind(data.category_id)
    .bind(data.is_combo.unwrap_or(false))
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET name = COALESCE(?1, name), description = COALESCE(?2, description), price = COALESCE(?3, price), cost = COALESCE(?4, cost), code = COALESCE(?5, code), image = COALESCE(?6, image), category_id = COALESCE(?7, category_id), is_combo = COALESCE(?8, is_combo), is_active = COALESCE(?9, is_active), updated_at = ?10 WHERE id = ?11",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.cost)
    .bind(&data.code)
    .bind(&data.image)
    .bind(data.category_id)
    .bind(data.is_combo)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn code_exists(pool: &SqlitePool, code: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE code = ?1 AND id != COALESCE(?2, -1)")
            .bind(code)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

// ── Combo components ───────────────────────────────────────────────

pub async fn find_components(pool: &SqlitePool, combo_id: i64) -> RepoResult<Vec<ComboComponent>> {
    let components = sqlx::query_as::<_, ComboComponent>(
        "SELECT combo_id, component_id, quantity FROM combo_component WHERE combo_id = ? ORDER BY component_id",
    )
    .bind(combo_id)
    .fetch_all(pool)
    .await?;
    Ok(components)
}

/// Requirements of a combo with each component's active flag and stock on hand
pub async fn component_states<'e>(
    exec: impl SqliteExecutor<'e>,
    combo_id: i64,
) -> RepoResult<Vec<ComponentState>> {
    let rows = sqlx::query_as::<_, ComponentState>(
        "SELECT cc.component_id, cc.quantity AS required, p.is_active, \
         CASE WHEN p.id IS NULL THEN NULL ELSE COALESCE(s.quantity, 0) END AS on_hand \
         FROM combo_component cc \
         LEFT JOIN product p ON p.id = cc.component_id \
         LEFT JOIN inventory_stock s ON s.product_id = cc.component_id \
         WHERE cc.combo_id = ? \
         ORDER BY cc.component_id",
    )
    .bind(combo_id)
    .fetch_all(exec)
    .await?;
    Ok(rows)
}

/// Replace the full component set of a combo
pub async fn replace_components(
    conn: &mut SqliteConnection,
    combo_id: i64,
    components: &[ComboComponentInput],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM combo_component WHERE combo_id = ?")
        .bind(combo_id)
        .execute(&mut *conn)
        .await?;
    for c in components {
        sqlx::query("INSERT INTO combo_component (combo_id, component_id, quantity) VALUES (?1, ?2, ?3)")
            .bind(combo_id)
            .bind(c.component_id)
            .bind(c.quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// ── Complements ────────────────────────────────────────────────────

pub async fn find_complements<'e>(
    exec: impl SqliteExecutor<'e>,
    product_id: i64,
) -> RepoResult<Vec<ProductComplement>> {
    let complements = sqlx::query_as::<_, ProductComplement>(
        "SELECT product_id, complement_id, required_quantity, is_mandatory, is_free FROM product_complement WHERE product_id = ? ORDER BY complement_id",
    )
    .bind(product_id)
    .fetch_all(exec)
    .await?;
    Ok(complements)
}

/// Complement relation between a principal and a complement product, if any
pub async fn find_complement<'e>(
    exec: impl SqliteExecutor<'e>,
    product_id: i64,
    complement_id: i64,
) -> RepoResult<Option<ProductComplement>> {
    let complement = sqlx::query_as::<_, ProductComplement>(
        "SELECT product_id, complement_id, required_quantity, is_mandatory, is_free FROM product_complement WHERE product_id = ?1 AND complement_id = ?2",
    )
    .bind(product_id)
    .bind(complement_id)
    .fetch_optional(exec)
    .await?;
    Ok(complement)
}

/// Replace the full complement set of a principal product
pub async fn replace_complements(
    conn: &mut SqliteConnection,
    product_id: i64,
    complements: &[ProductComplementInput],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM product_complement WHERE product_id = ?")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    for c in complements {
        sqlx::query(
            "INSERT INTO product_complement (product_id, complement_id, required_quantity, is_mandatory, is_free) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(product_id)
        .bind(c.complement_id)
        .bind(c.required_quantity.unwrap_or(1))
        .bind(c.is_mandatory.unwrap_or(false))
        .bind(c.is_free.unwrap_or(false))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

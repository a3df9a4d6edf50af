//! Catalog seeding command.
//!
//! Inserts a small set of sample products for local development. Running
//! the command twice inserts the fixtures twice; it is meant for fresh
//! databases.

use rust_decimal::Decimal;

use mercadito_server::db::ProductRepository;
use mercadito_server::models::product::NewProduct;

use super::CommandError;

fn fixtures() -> Vec<NewProduct> {
    let product = |name: &str, sku: &str, cents: i64, stock: i64| NewProduct {
        name: name.to_owned(),
        description: None,
        sku: Some(sku.to_owned()),
        price: Decimal::new(cents, 2),
        stock,
        is_active: true,
    };

    vec![
        product("Coffee Beans 500g", "COF-500", 1250, 40),
        product("Loose Leaf Tea 200g", "TEA-200", 899, 25),
        product("Ceramic Mug", "MUG-001", 1500, 60),
        product("French Press", "FRP-001", 3499, 12),
        product("Honey 350g", "HON-350", 725, 0),
    ]
}

/// Insert sample products into the catalog.
///
/// # Errors
///
/// Returns [`CommandError`] if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    tracing::info!("Seeding catalog...");
    for fixture in fixtures() {
        let created = repo.create(&fixture).await?;
        tracing::info!(id = %created.id, name = %created.name, "Product seeded");
    }
    tracing::info!("Seeding complete");

    Ok(())
}

//! # Seed Data Generator
//!
//! Populates a development database with a demo tenant, store settings,
//! and a realistic corner-store catalog.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p kirana-db --bin seed
//!
//! # Specify database path
//! cargo run -p kirana-db --bin seed -- --db ./data/kirana.db
//! ```
//!
//! Prints the generated tenant ID; pass it as `X-Tenant-Id` when calling
//! the API.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use kirana_core::{Customer, Product, ProductStatus, StoreSettings};
use kirana_db::repository::customer::generate_customer_id;
use kirana_db::{Database, DbConfig};

/// Catalog: (category, [(name, price_cents, stock)]).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "beverages",
        &[
            ("Coca-Cola 330ml", 4000, 48),
            ("Thums Up 500ml", 4500, 36),
            ("Limca 500ml", 4500, 24),
            ("Frooti 200ml", 2000, 60),
            ("Bisleri Water 1L", 2200, 96),
            ("Real Mango Juice 1L", 11000, 12),
            ("Red Bull 250ml", 12500, 18),
        ],
    ),
    (
        "snacks",
        &[
            ("Lays Classic Salted", 2000, 50),
            ("Kurkure Masala Munch", 2000, 45),
            ("Haldiram Bhujia 200g", 5500, 30),
            ("Parle-G 250g", 3000, 80),
            ("Hide & Seek 120g", 3500, 40),
            ("Dairy Milk 52g", 4500, 64),
            ("KitKat 4-Finger", 3500, 55),
        ],
    ),
    (
        "staples",
        &[
            ("Tata Salt 1kg", 2800, 40),
            ("Aashirvaad Atta 5kg", 27500, 15),
            ("India Gate Basmati 1kg", 14500, 20),
            ("Toor Dal 1kg", 16000, 25),
            ("Fortune Sunflower Oil 1L", 15500, 18),
            ("Tata Tea Gold 250g", 15000, 22),
            ("Nescafe Classic 50g", 22500, 14),
        ],
    ),
    (
        "household",
        &[
            ("Surf Excel 1kg", 14000, 16),
            ("Vim Bar 300g", 2500, 35),
            ("Colgate Strong Teeth 200g", 11500, 28),
            ("Lifebuoy Soap 125g", 3500, 52),
            ("Harpic 500ml", 9800, 12),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kirana_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kirana POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kirana_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kirana POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected, migrations applied");

    let tenant_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query("INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)")
        .bind(&tenant_id)
        .bind("Sharma General Store")
        .bind(now)
        .execute(db.pool())
        .await?;

    db.settings()
        .upsert(&StoreSettings {
            tenant_id: tenant_id.clone(),
            store_name: "Sharma General Store".to_string(),
            store_address: Some("14 MG Road, Pune".to_string()),
            store_phone: Some("+91 98200 00000".to_string()),
            tax_rate_bps: 1800, // 18% GST
            currency_symbol: "Rs.".to_string(),
            currency_code: "INR".to_string(),
            upi_id: Some("sharmastore@upi".to_string()),
            low_stock_threshold: 5,
            updated_at: now,
        })
        .await?;

    println!("✓ Tenant and settings created");
    println!();
    println!("Generating products...");

    let mut generated = 0;
    for (category, products) in CATALOG {
        for (index, (name, price_cents, stock)) in products.iter().enumerate() {
            let sku = format!(
                "{}-{:03}",
                category[..3].to_uppercase(),
                index + 1
            );

            let product = Product {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant_id.clone(),
                store_id: None,
                sku,
                barcode: Some(format!("890{:010}", generated)),
                name: name.to_string(),
                category: Some(category.to_string()),
                price_cents: *price_cents,
                stock: *stock,
                low_stock_threshold: 5,
                status: ProductStatus::Active,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }

            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);

    let regulars: &[(&str, &str)] = &[
        ("Priya Sharma", "9820012345"),
        ("Amit Verma", "9811098765"),
        ("Sunita Joshi", "9900112233"),
    ];
    for (name, phone) in regulars {
        db.customers()
            .insert(&Customer {
                id: generate_customer_id(),
                tenant_id: tenant_id.clone(),
                store_id: None,
                name: name.to_string(),
                phone: phone.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    println!("✓ Generated {} customers", regulars.len());
    println!();
    println!("Tenant ID: {}", tenant_id);
    println!("Pass it as the X-Tenant-Id header when calling the API.");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default) plus staff and customers
//! cargo run -p kirana-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p kirana-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p kirana-db --bin seed -- --db ./data/kirana.db
//! ```
//!
//! Each product gets a unique code, a pseudo-random price derived from its
//! index (no RNG dependency needed for demo data), stock levels, and a
//! standing discount on some items.

use chrono::Utc;
use std::env;

use kirana_core::{EmployeeRole, Money};
use kirana_db::repository::customer::NewCustomer;
use kirana_db::repository::employee::NewEmployee;
use kirana_db::repository::product::NewProduct;
use kirana_db::{Database, DbConfig};

/// Product categories with representative items.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "GRN",
        &[
            "Basmati Rice", "Sona Masoori Rice", "Wheat Flour", "Besan", "Toor Dal",
            "Moong Dal", "Chana Dal", "Urad Dal", "Poha", "Rava",
            "Sugar", "Jaggery", "Salt", "Idli Rice", "Maida",
        ],
    ),
    (
        "OIL",
        &[
            "Sunflower Oil", "Groundnut Oil", "Mustard Oil", "Coconut Oil",
            "Ghee", "Vanaspati", "Olive Oil", "Sesame Oil",
        ],
    ),
    (
        "SPC",
        &[
            "Turmeric Powder", "Chilli Powder", "Coriander Powder", "Garam Masala",
            "Cumin Seeds", "Mustard Seeds", "Black Pepper", "Cardamom",
            "Cloves", "Cinnamon", "Sambar Powder", "Curry Masala",
        ],
    ),
    (
        "BEV",
        &[
            "Tea Powder", "Filter Coffee", "Instant Coffee", "Health Drink",
            "Cola Bottle", "Orange Squash", "Mango Drink", "Soda Water",
            "Buttermilk", "Lassi",
        ],
    ),
    (
        "SNK",
        &[
            "Glucose Biscuits", "Cream Biscuits", "Salted Chips", "Banana Chips",
            "Murukku", "Mixture", "Peanut Candy", "Chocolate Bar",
            "Rusk", "Khari",
        ],
    ),
    (
        "HOME",
        &[
            "Detergent Bar", "Detergent Powder", "Dish Soap", "Toilet Cleaner",
            "Broom", "Matchbox", "Agarbatti", "Mosquito Coil",
            "Toothpaste", "Bath Soap", "Shampoo Sachet", "Hair Oil",
        ],
    ),
];

/// Pack size variants with a price addon in whole currency units.
const SIZES: &[(&str, i64)] = &[
    ("100g", 0),
    ("250g", 15),
    ("500g", 35),
    ("1kg", 70),
    ("5kg", 320),
    ("200ml", 10),
    ("500ml", 40),
    ("1L", 85),
];

/// Standing discount rates (basis points) cycled across products.
const DISCOUNTS: &[u32] = &[0, 0, 0, 500, 0, 1000];

const STAFF: &[(&str, EmployeeRole, i64)] = &[
    ("Suresh Nair", EmployeeRole::Manager, 32_000),
    ("Asha Devi", EmployeeRole::Cashier, 18_000),
    ("Binu Thomas", EmployeeRole::Cashier, 18_000),
    ("Ravindra Patil", EmployeeRole::InventoryManager, 22_000),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ravi Kumar", "9876543210"),
    ("Meena Iyer", "9823456781"),
    ("Joseph Mathew", "9765432109"),
    ("Fatima Begum", "9898989898"),
    ("Anil Gupta", "9812345670"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./kirana_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
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
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
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
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating staff...");
    for (name, role, salary) in STAFF {
        db.employees()
            .create(NewEmployee {
                name: name.to_string(),
                role: *role,
                salary: Some(Money::from_major(*salary)),
                ..NewEmployee::default()
            })
            .await?;
    }
    println!("✓ {} employees", STAFF.len());

    println!("Creating customers...");
    for (name, phone) in CUSTOMERS {
        db.customers()
            .create(NewCustomer {
                name: name.to_string(),
                phone: phone.to_string(),
                ..NewCustomer::default()
            })
            .await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    println!();
    println!("Generating products...");

    let mut generated = 0usize;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category_code, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product_name) in products.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 1000 + product_idx * 20 + size_idx;
                let product =
                    generate_product(category_code, product_name, size_name, *price_addon, seed);

                if let Err(e) = db.products().create(product).await {
                    eprintln!("Failed to insert {} {}: {}", product_name, size_name, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    println!();
    println!("Verifying FTS index...");
    let hits = db.products().search("rice", 10).await?;
    println!("  Search 'rice': {} results", hits.len());
    let hits = db.products().search("oil", 10).await?;
    println!("  Search 'oil': {} results", hits.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with index-derived data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewProduct {
    let compact: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let prefix: String = compact.chars().take(3).collect::<String>().to_uppercase();
    let code = format!("{}-{}-{:04}", category, prefix, seed);

    // barcode in an EAN-13-like shape (checksum not computed)
    let barcode = Some(format!("890{:010}", seed));

    // base price 20..180 in whole units, plus the size addon
    let base_price = 20 + ((seed * 17) % 160) as i64;
    let unit_price = Money::from_major(base_price + price_addon);

    // cost at 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_price = Some(Money::from_raw(unit_price.raw() * cost_pct / 100));

    let discount_rate_bps = DISCOUNTS[seed % DISCOUNTS.len()];
    let quantity_in_stock = (seed % 120) as i64;

    // every eighth product carries an expiry a few weeks out
    let expiry_date = if seed % 8 == 0 {
        Some(Utc::now().date_naive() + chrono::Duration::days(14 + (seed % 60) as i64))
    } else {
        None
    };

    NewProduct {
        product_code: Some(code),
        barcode,
        name: format!("{} {}", name, size),
        unit: Some("piece".to_string()),
        unit_price,
        cost_price,
        discount_rate_bps,
        tax_rate_bps: 1800,
        quantity_in_stock,
        min_stock_level: 5,
        max_stock_level: 500,
        reorder_level: 10,
        expiry_date,
        ..NewProduct::default()
    }
}

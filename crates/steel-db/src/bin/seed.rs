//! # Seed Data Generator
//!
//! Populates a development database with a steel catalog and a few regular
//! customers.
//!
//! ## Usage
//! ```bash
//! # Seed ./steel_dev.db
//! cargo run -p steel-db --bin seed
//!
//! # Specify database path
//! cargo run -p steel-db --bin seed -- --db ./data/steel.db
//! ```
//!
//! ## Generated Catalog
//! One product per steel family, one variant per size:
//! - Box section (thép hộp), sold per 6 m bar
//! - Round pipe (ống tròn)
//! - Corrugated sheet (tôn), sold per metre
//! - Rebar (thép cây), sold per bar
//!
//! Each variant gets a SKU `{FAMILY}-{SIZE}`, a price scaled from the
//! family base price and a starting stock.

use std::env;

use steel_core::catalog::{NewProduct, NewVariant, ProductQuery};
use steel_core::customer::NewCustomer;
use steel_db::{Database, DbConfig};

/// (sku prefix, product name, unit, base price in cents, sizes)
const FAMILIES: &[(&str, &str, &str, i64, &[&str])] = &[
    (
        "HOP",
        "Thép hộp mạ kẽm",
        "cây",
        18_000_000,
        &["20X40", "30X60", "40X80", "50X100", "60X120"],
    ),
    (
        "ONG",
        "Ống thép tròn",
        "cây",
        15_000_000,
        &["D21", "D27", "D34", "D42", "D49", "D60"],
    ),
    (
        "TON",
        "Tôn lạnh mạ màu",
        "m",
        9_500_000,
        &["0.30", "0.35", "0.40", "0.45"],
    ),
    (
        "CAY",
        "Thép cây vằn",
        "cây",
        12_000_000,
        &["D10", "D12", "D14", "D16", "D18", "D20"],
    ),
];

const CUSTOMERS: &[(&str, &str, Option<&str>)] = &[
    ("0903123456", "Cơ khí Tân Phát", Some("12 Quốc lộ 1A, Bình Tân")),
    ("0918765432", "Anh Hùng thợ hàn", None),
    ("0987000111", "Công ty xây dựng Minh Long", Some("45 Lê Văn Việt, Thủ Đức")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./steel_dev.db");

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
                println!("Steel POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./steel_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Steel POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().list(&ProductQuery::default()).await?.total;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let start = std::time::Instant::now();
    let mut variants = 0;

    for (family_idx, (prefix, name, unit, base_price, sizes)) in FAMILIES.iter().enumerate() {
        let product = generate_product(prefix, name, unit, *base_price, sizes, family_idx);

        match db.products().create(&product).await {
            Ok(created) => {
                variants += created.variants.len();
                println!("  {} ({} variants)", created.name, created.variants.len());
            }
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }

    println!();
    println!("Generating customers...");

    for (phone, name, address) in CUSTOMERS {
        let customer = NewCustomer {
            phone: phone.to_string(),
            name: name.to_string(),
            address: address.map(str::to_string),
        };
        if let Err(e) = db.customers().create(&customer).await {
            eprintln!("Failed to insert {}: {}", phone, e);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} products, {} variants, {} customers in {:?}",
        FAMILIES.len(),
        variants,
        CUSTOMERS.len(),
        elapsed
    );

    println!();
    println!("Verifying search...");
    let results = db
        .products()
        .list(&ProductQuery {
            search: Some("HOP".into()),
            ..ProductQuery::default()
        })
        .await?;
    println!("  Search 'HOP': {} results", results.total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with a variant per size. Later sizes cost more.
fn generate_product(
    prefix: &str,
    name: &str,
    unit: &str,
    base_price: i64,
    sizes: &[&str],
    seed: usize,
) -> NewProduct {
    let variants = sizes
        .iter()
        .enumerate()
        .map(|(idx, size)| NewVariant {
            name: size.replace('X', "x"),
            sku: format!("{}-{}", prefix, size.replace('.', "")),
            price_cents: base_price + base_price * idx as i64 / 4,
            stock: ((seed * 37 + idx * 13) % 80 + 20) as f64,
            unit: None,
        })
        .collect();

    NewProduct {
        name: name.to_string(),
        unit: unit.to_string(),
        notes: None,
        variants,
    }
}

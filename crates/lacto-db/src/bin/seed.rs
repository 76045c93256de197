//! # Seed Data Generator
//!
//! Populates the database with starter data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p lacto-db --bin seed
//!
//! # Specify database path
//! cargo run -p lacto-db --bin seed -- --db ./data/lacto.db
//! ```
//!
//! ## Generated Data
//! - Three accounts: manager / operator / viewer (passwords printed below)
//! - Three storage areas (chilled, frozen, dry)
//! - A small dairy catalog
//! - Sample batches with expiry dates spread around today, so the expiry
//!   report shows expired, upcoming and fresh stock out of the box

use chrono::{Duration, Utc};
use std::env;

use lacto_core::{Role, StorageType};
use lacto_db::{Database, DbConfig};

/// (id, name, storage type) for the starter areas.
const AREAS: &[(&str, &str, StorageType)] = &[
    ("COLD-01", "Cold Room 1", StorageType::Chilled),
    ("FRZ-01", "Freezer 1", StorageType::Frozen),
    ("DRY-01", "Dry Storage", StorageType::Dry),
];

/// (id, name) for the starter catalog.
const CATALOG: &[(&str, &str)] = &[
    ("MILK-1L", "Whole Milk 1L"),
    ("YOG-NAT", "Natural Yogurt 170g"),
    ("CHS-MOZZ", "Mozzarella 500g"),
    ("BUT-200", "Butter 200g"),
    ("CRM-300", "Heavy Cream 300ml"),
    ("ICE-2L", "Vanilla Ice Cream 2L"),
];

/// (area, product, quantity, days until expiry, lot) for the starter stock.
const BATCHES: &[(&str, &str, i64, i64, &str)] = &[
    ("COLD-01", "MILK-1L", 120, 5, "L-MILK-01"),
    ("COLD-01", "MILK-1L", 80, 12, "L-MILK-02"),
    ("COLD-01", "YOG-NAT", 200, -2, "L-YOG-01"),
    ("COLD-01", "BUT-200", 60, 45, "L-BUT-01"),
    ("COLD-01", "CRM-300", 40, 3, "L-CRM-01"),
    ("FRZ-01", "ICE-2L", 35, 180, "L-ICE-01"),
    ("FRZ-01", "CHS-MOZZ", 90, 60, "L-MOZZ-01"),
    ("DRY-01", "MILK-1L", 300, 90, "L-UHT-01"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./lacto_dev.db");

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
                println!("Lacto WMS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./lacto_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Lacto WMS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().count().await? > 0 {
        println!("⚠ Database already has users");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating accounts...");
    db.users()
        .create_user("manager", "manager123", "Warehouse Manager", Role::Manager)
        .await?;
    db.users()
        .create_user("operator", "operator123", "Stock Operator", Role::Operator)
        .await?;
    db.users()
        .create_user("auditor", "auditor123", "Stock Auditor", Role::Viewer)
        .await?;
    println!("  manager  / manager123   (manager)");
    println!("  operator / operator123  (operator)");
    println!("  auditor  / auditor123   (viewer)");

    println!();
    println!("Creating areas...");
    for (id, name, storage_type) in AREAS {
        db.areas().insert(id, name, *storage_type).await?;
        println!("  {id} - {name}");
    }

    println!();
    println!("Creating catalog...");
    for (id, name) in CATALOG {
        db.catalog().insert(id, name).await?;
        println!("  {id} - {name}");
    }

    println!();
    println!("Creating stock batches...");
    let today = Utc::now().date_naive();
    for (area_id, product_id, quantity, expiry_offset, lot) in BATCHES {
        let expiry = today + Duration::days(*expiry_offset);
        db.stock()
            .add_or_merge(area_id, product_id, *quantity, expiry, lot)
            .await?;
        println!("  {area_id}: {quantity} x {product_id} (lot {lot}, expires {expiry})");
    }

    println!();
    println!("✓ Seed complete!");
    println!(
        "  {} areas, {} catalog products",
        db.areas().count().await?,
        db.catalog().count().await?
    );

    Ok(())
}

//! # Seed Data Generator
//!
//! Populates a database with textile stock and two accounts for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - One inventory record per fabric below, 10 - 60 yards each
//! - `admin` / `admin-pass` (role admin)
//! - `cashier` / `cashier-pass` (role cashier)

use std::env;
use tally_core::{Money, ROLE_ADMIN, ROLE_CASHIER};
use tally_db::{Database, DbConfig, NewInventoryItem, NewUser};

/// Fabrics by category: (name, price per yard in naira)
const FABRICS: &[(&str, &[(&str, i64)])] = &[
    (
        "Wax Prints",
        &[
            ("Ankara", 5000),
            ("Hollandaise Wax", 9500),
            ("Super Wax", 7800),
            ("Java Print", 4200),
        ],
    ),
    (
        "Lace",
        &[
            ("Lace", 12000),
            ("Cord Lace", 15500),
            ("Swiss Voile Lace", 18000),
            ("Beaded Lace", 25000),
        ],
    ),
    (
        "Traditional",
        &[
            ("Aso Oke", 22000),
            ("Adire", 3500),
            ("Akwete", 8000),
            ("George", 30000),
        ],
    ),
    (
        "Plain",
        &[
            ("Guinea Brocade", 4500),
            ("Cotton Voile", 2500),
            ("Chiffon", 3000),
            ("Linen", 6500),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

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
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.inventory().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} inventory records", existing);
        println!("  Skipping stock seed to avoid duplicates.");
    } else {
        let inventory = db.inventory();
        let mut created = 0;

        for (category, fabrics) in FABRICS {
            for (index, (name, price)) in fabrics.iter().enumerate() {
                let quantity = 10 + ((name.len() as i64 * 7 + index as i64 * 11) % 51);
                let cost = Money::from_minor(price * 70);

                let item = NewInventoryItem::new(*name, quantity, Money::from_major(*price))
                    .with_cost_price(cost)
                    .with_category(*category);
                inventory.insert(&item).await?;
                created += 1;
            }
        }

        println!("✓ Created {} inventory records", created);
    }

    if db.users().count().await? > 0 {
        println!("⚠ Accounts already exist, skipping");
    } else {
        let accounts = [
            ("admin", "Store Admin", "admin-pass", ROLE_ADMIN),
            ("cashier", "Front Counter", "cashier-pass", ROLE_CASHIER),
        ];
        for (username, full_name, password, role) in accounts {
            db.users()
                .create(&NewUser {
                    username: username.to_string(),
                    full_name: full_name.to_string(),
                    password: password.to_string(),
                    role: role.to_string(),
                })
                .await?;
            println!("✓ Created {} account '{}'", role, username);
        }
    }

    println!();
    println!("🎉 Seed complete!");

    db.close().await;
    Ok(())
}

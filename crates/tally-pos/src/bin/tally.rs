//! # tally
//!
//! Operator harness for the receipt desk.
//!
//! ## Usage
//! ```bash
//! # Issue a receipt from an order file
//! tally generate --order order.json --user cashier --password cashier-pass
//!
//! # Recent receipts (admin only)
//! tally history --limit 20 --user admin --password admin-pass
//! ```
//!
//! ## Order File
//! ```json
//! {
//!   "customer_name": "Ada",
//!   "items": [
//!     { "name": "Ankara", "quantity": 2, "unit_price": "5000" },
//!     { "name": "Lace", "quantity": 1, "unit_price": "15000", "category": "Lace" }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use tally_core::{format_currency, LineItem, Money, PendingItems};
use tally_db::{Database, DbConfig};
use tally_pos::telemetry::init_tracing;
use tally_pos::{AuthService, PosConfig, ReceiptService};

#[derive(Debug, Deserialize)]
struct OrderFile {
    customer_name: String,
    items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
struct OrderItem {
    name: String,
    quantity: i64,
    unit_price: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Default)]
struct Args {
    command: String,
    order: Option<PathBuf>,
    config: Option<PathBuf>,
    user: Option<String>,
    password: Option<String>,
    limit: u32,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        command: args.get(1).cloned().unwrap_or_default(),
        limit: 20,
        ..Default::default()
    };

    let mut i = 2;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--order" | "-o" => parsed.order = value.map(PathBuf::from),
            "--config" | "-c" => parsed.config = value.map(PathBuf::from),
            "--user" | "-u" => parsed.user = value,
            "--password" | "-p" => parsed.password = value,
            "--limit" | "-n" => {
                parsed.limit = value.and_then(|v| v.parse().ok()).unwrap_or(20);
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }

    parsed
}

/// Login pair from the command line. Both or neither.
fn credentials(args: &Args) -> Result<Option<(&str, &str)>, &'static str> {
    match (&args.user, &args.password) {
        (Some(user), Some(password)) => Ok(Some((user, password))),
        (None, None) => Ok(None),
        _ => Err("--user and --password must be given together"),
    }
}

fn print_help() {
    println!("Tally POS Receipt Desk");
    println!();
    println!("Usage:");
    println!(
        "  tally generate --order <FILE> [--user <NAME> --password <SECRET>] [--config <PATH>]"
    );
    println!(
        "  tally history [--limit <N>] --user <ADMIN> --password <SECRET> [--config <PATH>]"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = parse_args();
    if args.command != "generate" && args.command != "history" {
        print_help();
        return Ok(());
    }

    let credentials = credentials(&args)?;
    let config = PosConfig::load(args.config.clone())?;
    let db = Database::new(DbConfig::new(&config.database.path)).await?;
    let auth = AuthService::new(&db);

    let user = match credentials {
        Some((user, password)) => Some(auth.authenticate(user, password).await?),
        None => None,
    };

    let service = ReceiptService::from_config(&config, &db).await?;

    match args.command.as_str() {
        "generate" => {
            let order_path = args.order.ok_or("--order <FILE> is required")?;
            let order: OrderFile = serde_json::from_str(&std::fs::read_to_string(&order_path)?)?;

            let mut pending = PendingItems::new();
            for (index, item) in order.items.iter().enumerate() {
                let field = format!("items[{}].unit_price", index);
                let mut line = LineItem::new(
                    item.name.clone(),
                    item.quantity,
                    Money::parse(&item.unit_price, &field)?,
                );
                if let Some(category) = &item.category {
                    line = line.with_category(category.clone());
                }
                pending.add(line)?;
            }

            let outcome = service
                .generate(&order.customer_name, user.as_ref(), &mut pending)
                .await?;

            std::fs::write(&outcome.file_name, &outcome.pdf)?;

            println!("{}", outcome.text);
            println!("✓ {}", outcome.success_message());
            println!("✓ Saved {}", outcome.file_name);
            if let Some(url) = &outcome.document_url {
                println!("✓ Stored at {}", url);
            }
            for issue in outcome.issues() {
                println!("⚠ {}", issue);
            }
        }
        _ => {
            let user = user.ok_or("history requires --user and --password")?;
            let entries = service.receipt_history(&user, args.limit).await?;
            let symbol = &service.branding().currency_symbol;

            for entry in entries {
                println!(
                    "{}  {}  {:<24} {:>16}  {}",
                    entry.receipt_number,
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.customer_name,
                    format_currency(entry.total_amount, symbol),
                    entry.issuer_name.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(user: Option<&str>, password: Option<&str>) -> Args {
        Args {
            user: user.map(String::from),
            password: password.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_credentials_come_in_pairs() {
        assert_eq!(
            credentials(&args(Some("ada"), Some("secret-pass"))),
            Ok(Some(("ada", "secret-pass")))
        );
        assert_eq!(credentials(&args(None, None)), Ok(None));
        assert!(credentials(&args(Some("ada"), None)).is_err());
        assert!(credentials(&args(None, Some("secret-pass"))).is_err());
    }
}

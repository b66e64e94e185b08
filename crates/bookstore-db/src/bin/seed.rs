//! # Seed Data Generator
//!
//! Populates a database with demo sellers, stores, books and a buyer.
//!
//! ## Usage
//! ```bash
//! # 4 stores (default)
//! cargo run -p bookstore-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p bookstore-db --bin seed -- --stores 10 --db ./data/bookstore.db
//! ```
//!
//! ## Generated Data
//! - One seller per store: `seller-{N}` / password `seller-{N}`
//! - Stores: `store-{N}`, each listing every title in [`TITLES`]
//! - A buyer `buyer` / password `buyer` with a balance of 1,000,000
//! - Stock 0-50 and prices 500-4,500 derived from the index (repeatable)

use std::env;

use bookstore_core::{BookListing, SearchFilter};
use bookstore_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (title, tags, content) for generated listings
const TITLES: &[(&str, &str, &str)] = &[
    ("The Rust Programming Language", "programming;rust", "ownership, borrowing and lifetimes"),
    ("Programming Rust", "programming;rust;systems", "fast, safe systems development"),
    ("Designing Data-Intensive Applications", "databases;distributed", "reliable, scalable, maintainable systems"),
    ("The Pragmatic Programmer", "programming;craft", "from journeyman to master"),
    ("Structure and Interpretation of Computer Programs", "programming;lisp", "abstraction with procedures and data"),
    ("The Hobbit", "fantasy;classic", "in a hole in the ground there lived a hobbit"),
    ("Dune", "science-fiction;classic", "the spice must flow"),
    ("Pride and Prejudice", "romance;classic", "a truth universally acknowledged"),
];

const BUYER_BALANCE: i64 = 1_000_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    let mut stores: usize = 4;
    let mut db_path = String::from("./bookstore_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stores" | "-s" => {
                if i + 1 < args.len() {
                    stores = args[i + 1].parse().unwrap_or(4);
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
                println!("Bookstore Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --stores <N>   Number of stores to generate (default: 4)");
                println!("  -d, --db <PATH>    Database file path (default: ./bookstore_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, stores, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.stores().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has stores, skipping seed to avoid duplicates");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut listed = 0usize;

    for n in 0..stores {
        let seller = format!("seller-{n}");
        let store_id = format!("store-{n}");

        db.users().insert(&seller, &seller, 0).await?;
        db.stores().insert(&store_id, &seller).await?;

        for (idx, (title, tags, content)) in TITLES.iter().enumerate() {
            let listing = generate_listing(&store_id, n * TITLES.len() + idx, title, tags, content);
            if let Err(e) = db.stores().add_book(&listing).await {
                warn!(store_id = %store_id, book_id = %listing.book_id, error = %e, "Failed to add listing");
                continue;
            }
            listed += 1;
        }
    }

    db.users().insert("buyer", "buyer", BUYER_BALANCE).await?;

    info!(
        stores,
        listings = listed,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    let matcher = SearchFilter::new().tags("(^|;)rust(;|$)").compile()?;
    let rust_books = db.search().search(&matcher).await?;
    info!(hits = rust_books.len(), "Search tags~'rust'");

    Ok(())
}

/// Builds one listing with repeatable stock and price.
fn generate_listing(store_id: &str, seed: usize, title: &str, tags: &str, content: &str) -> BookListing {
    BookListing {
        store_id: store_id.to_string(),
        book_id: format!("book-{:04}", seed),
        stock_level: (seed * 7 % 51) as i64,
        price: 500 + ((seed * 389) % 4001) as i64,
        title: title.to_string(),
        tags: tags.to_string(),
        content: content.to_string(),
    }
}

//! Shared fixture for the integration tests.

#![allow(dead_code)]

use bookstore_core::BookListing;
use bookstore_orders::{Bookstore, BookstoreConfig};

pub const SELLER: &str = "seller";
pub const BUYER: &str = "buyer";
pub const PASSWORD: &str = "pw";
pub const STORE: &str = "S";
pub const BOOK: &str = "B";

/// Fresh in-memory bookstore with one seller, store `S` and one buyer.
pub async fn shop(buyer_balance: i64) -> Bookstore {
    let shop = Bookstore::connect(&BookstoreConfig::in_memory())
        .await
        .expect("in-memory database");

    let db = shop.database();
    db.users().insert(SELLER, PASSWORD, 0).await.unwrap();
    db.users().insert(BUYER, PASSWORD, buyer_balance).await.unwrap();
    db.stores().insert(STORE, SELLER).await.unwrap();

    shop
}

/// Lists a book in store `S`.
pub async fn list_book(shop: &Bookstore, book_id: &str, stock: i64, price: i64) {
    shop.database()
        .stores()
        .add_book(&BookListing {
            store_id: STORE.to_string(),
            book_id: book_id.to_string(),
            stock_level: stock,
            price,
            title: format!("Title of {book_id}"),
            tags: "fiction".to_string(),
            content: String::new(),
        })
        .await
        .unwrap();
}

pub async fn stock(shop: &Bookstore, book_id: &str) -> i64 {
    shop.database()
        .stores()
        .get_book(STORE, book_id)
        .await
        .unwrap()
        .unwrap()
        .stock_level
}

pub async fn balance(shop: &Bookstore, user_id: &str) -> i64 {
    shop.accounts.balance(user_id).await.unwrap()
}

pub fn lines(items: &[(&str, i64)]) -> Vec<(String, i64)> {
    items.iter().map(|(b, c)| (b.to_string(), *c)).collect()
}

//! Synthetic Orders
//!
//! Builds schema-valid demo orders for the write path. Structure is fixed,
//! identifiers and item count are random.

use chrono::Utc;
use rand::Rng;

use crate::order::{Delivery, Order, Payment, Product};

/// Maximum number of line items in a generated order.
const MAX_PRODUCTS: usize = 5;

/// Generates a random order with 1..=5 products.
pub fn random_order() -> Order {
    let mut rng = rand::rng();
    let now = Utc::now();

    let order_uid = format!("{:x}", rng.random::<u64>() >> 1);
    let track_number = format!("{:06x}", rng.random::<u32>() >> 1);
    let transaction = format!("{:x}", rng.random::<u64>() >> 1);

    let count = rng.random_range(1..=MAX_PRODUCTS);
    let products = (0..count)
        .map(|_| Product {
            chrt_id: rng.random_range(0..1000),
            track_number: track_number.clone(),
            price: 453,
            rid: format!("rid-{:x}", rng.random::<u64>() >> 1),
            name: "Mascaras".to_string(),
            sale: 30,
            size: "0".to_string(),
            total_price: 317,
            nm_id: 2_389_212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
        })
        .collect();

    Order {
        order_uid,
        track_number,
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction,
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: now.timestamp(),
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        products,
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shard_key: "9".to_string(),
        sm_id: 99,
        date_created: now,
        oof_shard: "1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_order_is_valid() {
        for _ in 0..50 {
            let order = random_order();
            assert!(order.validate().is_ok());
            assert!(!order.products.is_empty());
            assert!(order.products.len() <= MAX_PRODUCTS);
            assert!(order.payment.amount > 0);
            assert!(order.payment.goods_total > 0);
            assert!(order
                .products
                .iter()
                .all(|p| p.track_number == order.track_number && p.price > 0));
        }
    }

    #[test]
    fn test_random_orders_have_distinct_ids() {
        let a = random_order();
        let b = random_order();
        assert_ne!(a.order_uid, b.order_uid);
    }
}

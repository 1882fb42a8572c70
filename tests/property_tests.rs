//! Property-based tests for the session cart store.
//!
//! Any sequence of add/update/remove operations on an initially empty
//! cart must leave the store equal to the same sequence replayed on a
//! plain in-memory map with the documented semantics: add sums, update
//! overwrites or deletes on non-positive quantities, remove deletes or
//! is a no-op.

use proptest::prelude::*;
use std::collections::HashMap;
use storefront_api::sessions::CartSessionStore;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum CartOp {
    Add { product: usize, quantity: u32 },
    Update { product: usize, quantity: i32 },
    Remove { product: usize },
}

fn cart_op_strategy(product_count: usize) -> impl Strategy<Value = CartOp> {
    prop_oneof![
        (0..product_count, 1u32..10).prop_map(|(product, quantity)| CartOp::Add {
            product,
            quantity
        }),
        (0..product_count, -3i32..10).prop_map(|(product, quantity)| CartOp::Update {
            product,
            quantity
        }),
        (0..product_count).prop_map(|product| CartOp::Remove { product }),
    ]
}

fn apply_to_model(model: &mut HashMap<Uuid, u32>, products: &[Uuid], op: &CartOp) {
    match *op {
        CartOp::Add { product, quantity } => {
            let entry = model.entry(products[product]).or_insert(0);
            *entry = entry.saturating_add(quantity);
        }
        CartOp::Update { product, quantity } => {
            if quantity <= 0 {
                model.remove(&products[product]);
            } else {
                model.insert(products[product], quantity as u32);
            }
        }
        CartOp::Remove { product } => {
            model.remove(&products[product]);
        }
    }
}

fn apply_to_store(store: &CartSessionStore, session: Uuid, products: &[Uuid], op: &CartOp) {
    match *op {
        CartOp::Add { product, quantity } => {
            store.add(session, products[product], quantity);
        }
        CartOp::Update { product, quantity } => {
            if quantity <= 0 {
                store.remove(session, products[product]);
            } else {
                store.set(session, products[product], quantity as u32);
            }
        }
        CartOp::Remove { product } => {
            store.remove(session, products[product]);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn store_replays_like_an_in_memory_map(ops in prop::collection::vec(cart_op_strategy(4), 0..40)) {
        let products: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let store = CartSessionStore::new(3600);
        let session = Uuid::new_v4();
        let mut model: HashMap<Uuid, u32> = HashMap::new();

        for op in &ops {
            apply_to_model(&mut model, &products, op);
            apply_to_store(&store, session, &products, op);
            // Every mutation is immediately visible, not batched
            prop_assert_eq!(store.snapshot(session), model.clone());
        }

        prop_assert_eq!(store.snapshot(session), model);
    }

    #[test]
    fn quantities_stay_strictly_positive(ops in prop::collection::vec(cart_op_strategy(3), 0..30)) {
        let products: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let store = CartSessionStore::new(3600);
        let session = Uuid::new_v4();

        for op in &ops {
            apply_to_store(&store, session, &products, op);
        }

        for quantity in store.snapshot(session).values() {
            prop_assert!(*quantity >= 1);
        }
    }
}

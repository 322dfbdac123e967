// Per-store shopping carts and best-deal promotion
use crate::model::{PriceRecord, Retailer};
use crate::storage::CartPersistence;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One ordered cart per retailer.
///
/// Serialized as a single object keyed by the retailers' display names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    carts: [Vec<PriceRecord>; 6],
}

impl CartState {
    pub fn cart(&self, retailer: Retailer) -> &[PriceRecord] {
        &self.carts[retailer.index()]
    }

    pub fn cart_mut(&mut self, retailer: Retailer) -> &mut Vec<PriceRecord> {
        &mut self.carts[retailer.index()]
    }

    pub fn total(&self, retailer: Retailer) -> f64 {
        self.cart(retailer).iter().fold(0.0, |acc, r| acc + r.price)
    }

    pub fn item_count(&self) -> usize {
        self.carts.iter().map(Vec::len).sum()
    }
}

impl Serialize for CartState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Retailer::CART_LAYOUT.len()))?;
        for retailer in Retailer::CART_LAYOUT {
            map.serialize_entry(retailer.display_name(), self.cart(retailer))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CartState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, Vec<PriceRecord>>::deserialize(deserializer)?;
        let mut state = CartState::default();
        for (name, items) in raw {
            match Retailer::from_display_name(&name) {
                Some(retailer) => {
                    let cart = state.cart_mut(retailer);
                    *cart = items;
                    for item in cart.iter_mut() {
                        item.store = Some(retailer);
                    }
                }
                None => warn!("Ignoring saved cart for unknown store '{}'", name),
            }
        }
        Ok(state)
    }
}

/// Who asked for an item to be added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOrigin {
    Manual,
    /// Best deal of a search, added without user action.
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Retailer),
    /// Same product at the same price is already in the cart.
    Duplicate(Retailer),
    /// The record's store is not one of the six carts.
    Unroutable,
}

/// Owns the carts and writes the whole state back after every change.
pub struct CartStore<P: CartPersistence> {
    persistence: P,
    state: Option<CartState>,
}

impl<P: CartPersistence> CartStore<P> {
    /// Nothing is read until the carts are first used.
    pub fn new(persistence: P) -> Self {
        Self {
            persistence,
            state: None,
        }
    }

    fn loaded(&mut self) -> &mut CartState {
        if self.state.is_none() {
            let state = match self.persistence.load() {
                Ok(Some(state)) => {
                    info!("Loaded {} cart item(s)", state.item_count());
                    state
                }
                Ok(None) => CartState::default(),
                Err(e) => {
                    warn!("Cart storage unavailable, starting with empty carts: {}", e);
                    CartState::default()
                }
            };
            self.state = Some(state);
        }
        self.state.get_or_insert_with(CartState::default)
    }

    fn persist(&self) {
        let Some(state) = &self.state else {
            return;
        };
        if let Err(e) = self.persistence.save(state) {
            warn!("Failed to save carts: {}", e);
        }
    }

    pub fn state(&mut self) -> &CartState {
        self.loaded()
    }

    pub fn add(&mut self, record: &PriceRecord, origin: AddOrigin) -> AddOutcome {
        let Some(retailer) = record.store else {
            debug!("No cart for store '{}', skipping {}", record.store_name, record.product_name);
            return AddOutcome::Unroutable;
        };

        let cart = self.loaded().cart_mut(retailer);
        let exists = cart
            .iter()
            .any(|item| item.product_name == record.product_name && item.price == record.price);
        if exists {
            debug!("{} already in {} cart", record.product_name, retailer.display_name());
            return AddOutcome::Duplicate(retailer);
        }

        cart.push(record.clone());
        self.persist();

        match origin {
            AddOrigin::Automatic => info!(
                "Auto-added best deal to {}: {} ({:.2} {})",
                retailer.display_name(),
                record.product_name,
                record.price,
                record.currency
            ),
            AddOrigin::Manual => debug!("Added {} to {}", record.product_name, retailer.display_name()),
        }
        AddOutcome::Added(retailer)
    }

    /// Out-of-range indexes leave the cart unchanged. The state is saved either way.
    pub fn remove(&mut self, retailer: Retailer, index: usize) -> Option<PriceRecord> {
        let cart = self.loaded().cart_mut(retailer);
        let removed = if index < cart.len() {
            Some(cart.remove(index))
        } else {
            debug!("No item #{} in {} cart", index, retailer.display_name());
            None
        };
        self.persist();
        removed
    }

    /// Empties every cart with a single write.
    pub fn clear(&mut self) {
        let state = self.loaded();
        for retailer in Retailer::ALL {
            state.cart_mut(retailer).clear();
        }
        self.persist();
        info!("All carts cleared");
    }
}

/// Puts the cheapest record of a search result into its store's cart.
///
/// `records` must be sorted cheapest first, as the pipeline returns them.
pub fn promote_best_deal<P: CartPersistence>(
    records: &[PriceRecord],
    carts: &mut CartStore<P>,
) -> Option<AddOutcome> {
    let best = records.first()?;
    debug!(
        "Best deal: {:.2} {} | {} | {}",
        best.price, best.currency, best.store_name, best.product_name
    );
    Some(carts.add(best, AddOrigin::Automatic))
}

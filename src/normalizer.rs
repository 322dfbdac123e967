use crate::model::{PriceRecord, Retailer};

/// Lowercase substrings identifying each retailer, checked in enumeration order.
/// A name containing aliases of two retailers resolves to the first one listed.
const STORE_ALIASES: [(Retailer, &[&str]); 6] = [
    (Retailer::Leclerc, &["leclerc"]),
    (Retailer::Carrefour, &["carrefour"]),
    (Retailer::Intermarche, &["intermarch"]),
    (Retailer::Lidl, &["lidl"]),
    (Retailer::Aldi, &["aldi"]),
    (Retailer::Auchan, &["auchan"]),
];

/// Maps a free-text store name to a retailer, or `None` when nothing matches.
pub fn resolve_store(store_name: &str) -> Option<Retailer> {
    let name = store_name.to_lowercase();

    for (retailer, aliases) in STORE_ALIASES {
        if aliases.iter().any(|alias| name.contains(alias)) {
            return Some(retailer);
        }
    }

    None
}

pub fn normalize_all(records: &mut [PriceRecord]) {
    for record in records.iter_mut() {
        record.store = resolve_store(&record.store_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_chains_case_insensitively() {
        assert_eq!(resolve_store("E.Leclerc"), Some(Retailer::Leclerc));
        assert_eq!(resolve_store("leclerc drive"), Some(Retailer::Leclerc));
        assert_eq!(resolve_store("CARREFOUR Market"), Some(Retailer::Carrefour));
        assert_eq!(resolve_store("Lidl"), Some(Retailer::Lidl));
        assert_eq!(resolve_store("Aldi Nord"), Some(Retailer::Aldi));
        assert_eq!(resolve_store("Auchan"), Some(Retailer::Auchan));
    }

    #[test]
    fn intermarche_matches_with_and_without_accent() {
        assert_eq!(resolve_store("Intermarché Drive"), Some(Retailer::Intermarche));
        assert_eq!(resolve_store("INTERMARCHÉ"), Some(Retailer::Intermarche));
        assert_eq!(resolve_store("Intermarche"), Some(Retailer::Intermarche));
    }

    #[test]
    fn unknown_store_is_unresolved() {
        assert_eq!(resolve_store("SuperExotic Mart"), None);
        assert_eq!(resolve_store(""), None);
    }

    #[test]
    fn first_alias_in_enumeration_order_wins() {
        assert_eq!(resolve_store("Lidl vs Carrefour"), Some(Retailer::Carrefour));
        assert_eq!(resolve_store("Auchan / E.Leclerc"), Some(Retailer::Leclerc));
    }
}

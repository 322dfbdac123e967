// Fallback product-search links per retailer
use crate::model::{PriceRecord, Retailer};
use crate::parser::validator::sanitize_product_name;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Same escaping as JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const GENERIC_SEARCH: &str = "https://www.google.com/search?q=";

/// Search page prefix of each retailer's site; the encoded product name is appended.
fn search_prefix(retailer: Retailer) -> &'static str {
    match retailer {
        Retailer::Carrefour => "https://www.carrefour.fr/s?q=",
        Retailer::Leclerc => "https://www.e.leclerc/recherche?q=",
        Retailer::Aldi => "https://www.aldi.fr/recherche.html?query=",
        Retailer::Lidl => "https://www.lidl.fr/q/search?q=",
        Retailer::Auchan => "https://www.auchan.fr/recherche?text=",
        Retailer::Intermarche => "https://www.intermarche.com/recherche/produits?terms=",
    }
}

fn encode(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Builds a search link for a product at a store. Unknown stores get a web search
/// for "{store_name} {product}".
pub fn search_url(store: Option<Retailer>, store_name: &str, product_name: &str) -> String {
    let clean_name = sanitize_product_name(product_name);
    match store {
        Some(retailer) => format!("{}{}", search_prefix(retailer), encode(&clean_name)),
        None => format!("{}{}", GENERIC_SEARCH, encode(&format!("{} {}", store_name, clean_name))),
    }
}

/// Keeps a model-supplied absolute link, otherwise fills in the search link.
pub fn resolve_url(record: &mut PriceRecord) {
    if record.product_url.contains("http") {
        return;
    }
    record.product_url = search_url(record.store, &record.store_name, &record.product_name);
}

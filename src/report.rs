// Plain-text rendering of results, carts and history
use crate::cart::CartState;
use crate::model::{PipelineError, PriceRecord, Retailer};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    PriceAsc,
    PriceDesc,
}

impl SortMode {
    pub fn parse(text: &str) -> Option<SortMode> {
        match text.trim() {
            "asc" | "price-asc" => Some(SortMode::PriceAsc),
            "desc" | "price-desc" => Some(SortMode::PriceDesc),
            _ => None,
        }
    }
}

/// Stable sort, so equal prices keep their relative order in both modes.
pub fn sort_records(records: &mut [PriceRecord], mode: SortMode) {
    match mode {
        SortMode::PriceAsc => records.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortMode::PriceDesc => records.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }
}

fn store_label(record: &PriceRecord) -> &str {
    match record.store {
        Some(retailer) => retailer.display_name(),
        None if record.store_name.is_empty() => "?",
        None => record.store_name.as_str(),
    }
}

pub fn format_results(query: &str, records: &[PriceRecord]) -> String {
    if records.is_empty() {
        return format!("No prices found for \"{}\".", query);
    }

    let mut out = format!("Prices for \"{}\":\n", query);
    for (i, record) in records.iter().enumerate() {
        let _ = write!(
            out,
            "{:>3}. {:>6.2} {} | {} | {}",
            i + 1,
            record.price,
            record.currency,
            store_label(record),
            record.product_name
        );
        if !record.unit.is_empty() {
            let _ = write!(out, " ({})", record.unit);
        }
        let _ = writeln!(out, "\n     🔗 {}", record.product_url);
    }
    out
}

pub fn format_carts(state: &CartState) -> String {
    let mut out = String::new();
    for retailer in Retailer::ALL {
        let items = state.cart(retailer);
        let _ = writeln!(
            out,
            "🛒 {}: {:.2}€ ({} item(s))",
            retailer.display_name(),
            state.total(retailer),
            items.len()
        );
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(out, "   [{}] {:.2}€ {}", i, item.price, item.product_name);
        }
    }
    out
}

pub fn format_history(queries: &[String]) -> String {
    if queries.is_empty() {
        return "No recent searches yet.".to_string();
    }
    format!("Recent searches: {}", queries.join(" · "))
}

pub fn format_error(err: &PipelineError) -> String {
    match err {
        PipelineError::EmptyQuery => "Type a product to search for.".to_string(),
        PipelineError::ModelUnavailable(e) => {
            format!("Price service unavailable ({}). Check the API key configuration or try again.", e)
        }
        PipelineError::MalformedAiResponse { snippet } => {
            format!("The AI did not return a valid price list. Raw start: {}", snippet)
        }
    }
}

use crate::model::{PipelineError, PriceRecord};
use crate::utils::truncate_chars;
use serde_json::{Map, Value};
use tracing::debug;

const DEFAULT_CURRENCY: &str = "€";
const SNIPPET_CHARS: usize = 100;

/// Turns the parsed model output into price records, cheapest first.
///
/// A non-array value rejects the whole batch. Elements without a product name
/// or a usable price are dropped.
pub fn validate_batch(value: &Value, raw_text: &str) -> Result<Vec<PriceRecord>, PipelineError> {
    let elements = value.as_array().ok_or_else(|| malformed(raw_text))?;

    let mut records: Vec<PriceRecord> = elements
        .iter()
        .enumerate()
        .filter_map(|(position, element)| {
            let record = validate_candidate(element);
            if record.is_none() {
                debug!("Dropping candidate #{}: {}", position, element);
            }
            record
        })
        .collect();

    // sort_by is stable, equal prices keep the model's order
    records.sort_by(|a, b| a.price.total_cmp(&b.price));
    Ok(records)
}

pub(crate) fn malformed(raw_text: &str) -> PipelineError {
    PipelineError::MalformedAiResponse {
        snippet: truncate_chars(raw_text, SNIPPET_CHARS),
    }
}

fn validate_candidate(element: &Value) -> Option<PriceRecord> {
    let fields = element.as_object()?;

    let product_name = fields
        .get("product_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())?;
    let price = fields.get("price").and_then(coerce_price)?;

    let store_name = text_field(fields, "store_name")
        .or_else(|| text_field(fields, "store"))
        .unwrap_or_default();
    let currency = text_field(fields, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Some(PriceRecord {
        store_name,
        store: None,
        price,
        currency,
        product_name: product_name.to_string(),
        unit: text_field(fields, "unit").unwrap_or_default(),
        product_url: text_field(fields, "product_url").unwrap_or_default(),
        search_id: None,
    })
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts JSON numbers and numeric strings such as `"1.20"`, `"1,20 €"`.
fn coerce_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s
            .replace('€', "")
            .replace(' ', "")
            .replace(',', ".")
            .trim()
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };

    (price.is_finite() && price >= 0.0).then_some(price)
}

/// Removes quote characters, which break retailer search queries.
pub fn sanitize_product_name(name: &str) -> String {
    name.chars().filter(|c| *c != '\'' && *c != '"').collect()
}

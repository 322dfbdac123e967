use crate::model::Retailer;

/// Asks the model for a JSON array of price candidates for `query`.
pub fn build_prompt(query: &str, search_grounding: bool) -> String {
    let stores: Vec<&str> = Retailer::ALL.iter().map(|r| r.display_name()).collect();
    let sourcing = if search_grounding {
        "Use Google Search to find the current price of each product in France today. \
         If no price can be found, use 0."
    } else {
        "Give a realistic estimated price for France today, using specific brands and weights \
         (e.g. \"Lait Lactel Demi-écrémé 1L\"), not generic names."
    };

    format!(
        "You are \"Food Scan\", a price comparator for French supermarkets.\n\
         \n\
         User query: \"{query}\"\n\
         \n\
         For each of these stores, list the 3 to 5 cheapest matching products: {stores}.\n\
         {sourcing}\n\
         \n\
         Return ONLY a JSON array, without markdown, where each item is:\n\
         {{\"store_name\": \"Store Name\", \"price\": 1.23, \"currency\": \"€\", \
         \"product_name\": \"Brand and product name\", \"unit\": \"1L\", \"product_url\": \"\"}}\n\
         Sort the array from cheapest to most expensive.",
        stores = stores.join(", "),
    )
}

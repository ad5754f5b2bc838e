/// Lowercases `input`, collapses every run of non-alphanumeric ASCII characters
/// into a single hyphen and trims hyphens from both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Product slug: `slugify(company) + "-" + slugify(product)`.
pub fn derive_slug(company_name: &str, product_name: &str) -> String {
    let company = slugify(company_name);
    let product = slugify(product_name);
    match (company.is_empty(), product.is_empty()) {
        (false, false) => format!("{company}-{product}"),
        (true, _) => product,
        (false, true) => company,
    }
}

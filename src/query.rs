use crate::domain::ProductType;

const PLATFORM: &str = "platformName:Sentinel-2";

/// One predicate in the search filter. Clauses are kept structured and only
/// rendered to the catalog's text syntax at build time, so replacing the
/// product type never has to touch the text of neighbouring clauses.
#[derive(Debug, Clone, PartialEq)]
enum FilterClause {
    Equality { key: String, value: String },
    NameSet(Vec<String>),
    Footprint(String),
}

impl FilterClause {
    fn render(&self) -> String {
        match self {
            FilterClause::Equality { key, value } => format!("{key}:{value}"),
            FilterClause::NameSet(names) => {
                if names.len() == 1 {
                    names[0].clone()
                } else {
                    format!("({})", names.join(" OR "))
                }
            }
            FilterClause::Footprint(wkt) => {
                format!("footprint:\"Intersects({wkt})\"")
            }
        }
    }
}

/// AND-joined filter expression: a fixed platform base clause, an optional
/// product-type constraint folded into the base, and appended clauses in
/// call order.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    product_type: Option<ProductType>,
    clauses: Vec<FilterClause>,
}

impl SearchFilter {
    pub fn new(product_type: Option<ProductType>) -> Self {
        Self {
            product_type,
            clauses: Vec::new(),
        }
    }

    pub fn product_type(&self) -> Option<ProductType> {
        self.product_type
    }

    /// Replaces the product-type constraint. The base clause is re-rendered
    /// from the new value; all other clauses are untouched.
    pub fn set_product_type(&mut self, product_type: ProductType) {
        self.product_type = Some(product_type);
    }

    /// Appends `key:value`. Empty key or value is silently ignored.
    pub fn add_equality(&mut self, key: &str, value: &str) {
        if key.is_empty() || value.is_empty() {
            return;
        }
        self.clauses.push(FilterClause::Equality {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Appends a name disjunction. A single name is emitted bare, more
    /// names become `(a OR b OR ...)`. An empty set is silently ignored.
    pub fn add_name_set(&mut self, names: &[String]) {
        let names: Vec<String> = names.iter().filter(|n| !n.is_empty()).cloned().collect();
        if names.is_empty() {
            return;
        }
        self.clauses.push(FilterClause::NameSet(names));
    }

    /// Appends a footprint intersection clause for the given WKT geometry.
    pub fn add_footprint(&mut self, wkt: &str) {
        if wkt.is_empty() {
            return;
        }
        self.clauses.push(FilterClause::Footprint(wkt.to_string()));
    }

    pub fn render(&self) -> String {
        let base = match self.product_type {
            Some(ty) => format!("({PLATFORM} AND producttype:{ty})"),
            None => PLATFORM.to_string(),
        };
        let mut out = base;
        for clause in &self.clauses {
            out.push_str(" AND ");
            out.push_str(&clause.render());
        }
        out
    }
}

/// Insertion-ordered key/value pairs for the search endpoint. Order is the
/// final URL parameter order.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.push((key.to_string(), value.into()));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Percent-encodes the pairs; spaces become `%20`, never `+`.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Full search query: pagination plus the composed filter.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    filter: SearchFilter,
    rows: Option<usize>,
    start: Option<usize>,
}

impl SearchQuery {
    pub fn new(product_type: Option<ProductType>) -> Self {
        Self {
            filter: SearchFilter::new(product_type),
            rows: None,
            start: None,
        }
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut SearchFilter {
        &mut self.filter
    }

    /// Row limit for one page. Zero is ignored.
    pub fn limit(&mut self, rows: usize) {
        if rows > 0 {
            self.rows = Some(rows);
        }
    }

    pub fn start(&mut self, offset: usize) {
        self.start = Some(offset);
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::default();
        if let Some(rows) = self.rows {
            params.push("rows", rows.to_string());
        }
        if let Some(start) = self.start {
            params.push("start", start.to_string());
        }
        params.push("q", self.filter.render());
        params
    }

    pub fn to_url(&self, endpoint: &str) -> String {
        format!("{}?{}", endpoint, self.to_params().encode())
    }
}

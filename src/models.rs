#[derive(Debug, Clone)]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryGroup {
    Garment,
    Accessory,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Garment => "garment",
            Self::Accessory => "accessory",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "garment" | "clothing" => Some(Self::Garment),
            "accessory" => Some(Self::Accessory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub group: CategoryGroup,
    pub is_preset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Owned,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owned => "owned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceType {
    Full,
    DepositBalance,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::DepositBalance => "DEPOSIT_BALANCE",
        }
    }
}

/// Inventory row ready for insert.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub brand_id: i64,
    pub category_id: i64,
    pub color: Option<String>,
    pub size: Option<String>,
    pub status: ItemStatus,
    pub description: String,
    pub source_url: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPrice {
    pub item_id: i64,
    pub price_type: PriceType,
    pub total_price: f64,
    pub deposit: Option<f64>,
    pub balance: Option<f64>,
    pub purchase_date: Option<String>,
}

/// One spreadsheet row with every cell already normalized to text.
#[derive(Debug, Clone, Default)]
pub struct RawOrderRow {
    pub order_id: String,
    pub order_time: String,
    pub order_status: String,
    pub shop_name: String,
    pub item_name: String,
    pub product_url: String,
    pub style_spec: String,
    pub quantity: String,
    pub item_price: String,
    pub total_paid: String,
    pub shipping: String,
}

#[derive(Debug, Clone)]
pub struct ParsedOrder {
    pub order_id: String,
    pub order_time: String,
    pub status: String,
    pub shop_name: String,
    pub total_paid: f64,
    pub shipping: f64,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub name: String,
    pub product_url: String,
    pub style_spec: String,
    pub quantity: u32,
    pub price: f64,
    pub parsed_type: Option<String>,
    pub parsed_size: Option<String>,
    pub parsed_color: Option<String>,
    // Copied from the parent order.
    pub order_id: String,
    pub order_time: String,
    pub shop_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Brand,
    Category,
}

impl ReferenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Brand => "Brand",
            Self::Category => "Category",
        }
    }
}

/// A brand or category the import wants to create. `group` is set for categories only.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingReferenceItem {
    pub name: String,
    pub kind: ReferenceKind,
    pub checked: bool,
    pub group: Option<CategoryGroup>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub merged: usize,
    pub skipped: usize,
}

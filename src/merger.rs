//! Deposit/balance pairing.
//!
//! Pre-order shops sell one garment as two listings: a deposit (定金) and a
//! balance (尾款) paid weeks or months later, often in different orders. This
//! module pairs such rows so they become one inventory item with a
//! deposit/balance price record.
//!
//! Pairing works across the whole batch. A deposit and a balance are scored on
//! core product name, keyword overlap, product URL and shop; a pair needs at
//! least [`MIN_PAIR_SCORE`] and must be each other's unique best candidate.
//! Anything ambiguous stays unpaired.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::ParsedItem;
use crate::order_parser::normalize_order_date;

pub const MIN_PAIR_SCORE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRole {
    Deposit,
    Balance,
}

impl PaymentRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Balance => "balance",
        }
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid name regex"))
        .collect()
}

static DEPOSIT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"定-?金").expect("valid deposit regex"));

static BALANCE_NEEDS_DEPOSIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"尾款.*需有.*定金|尾款.*需要有.*定金").expect("valid balance regex")
});

static DEPOSIT_NEEDS_BALANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"定-?金.*需补.*尾款|定-?金.*页面.*尾款").expect("valid deposit regex")
});

static CORE_NAME_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"【[^】]*】",
        r"＜[^＞]*＞",
        r"[《》]",
        r"（[^）]*）",
        r"\([^)]*\)",
        r"定-?金",
        r"尾款",
        r"意向",
        r"正式",
        r"预约",
        r"CP先行",
        r"加购小物",
        r"\d+团",
        r"\d+批",
        r"[一二三四五六七八九十]+团",
        r"[一二三四五六七八九十]+批",
        r"需有[^*｜|]*",
        r"需补[^*｜|]*",
        r"需要有[^*｜|]*",
        r"路德\s*",
        r"\d+\.\d+日[^*｜|]*",
        r"\d+月\d+日[^*｜|]*",
        r"春季新款|秋冬纯棉|慢团|成团再贩|2024再贩|页面",
    ])
});

static CORE_NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[｜|*·]").expect("valid separator regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static KEYWORD_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s+\-]").expect("valid keyword regex"));

static LATIN_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{2,}").expect("valid latin regex"));

static HAN_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fff}]{2,4}").expect("valid han regex"));

static ITEM_NAME_NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"【[^】]*】",
        r"＜[^＞]*＞",
        r"（定-?金）",
        r"（尾款）",
        r"CP先行",
        r"定-?金",
        r"尾款",
        r"^\s*-\s*",
    ])
});

const KEYWORD_STOP_WORDS: &[&str] = &[
    "原创", "lolita", "洋装", "连衣裙", "套装", "复古", "优雅", "华丽", "刺绣",
    "新款", "春季", "秋冬", "纯棉", "页面", "时间", "开始", "截止",
];

const SHOP_STOP_WORDS: &[&str] = &["原创", "独立", "设计师", "品牌", "洋服", "洋装", "工作室", "新款"];

// ---------------------------------------------------------------------------
// Name analysis
// ---------------------------------------------------------------------------

/// Deposit or balance, judged from the listing title.
pub fn detect_payment_role(name: &str) -> Option<PaymentRole> {
    let deposit_at = DEPOSIT_TOKEN.find(name).map(|m| m.start());
    let balance_at = name.find("尾款");
    match (deposit_at, balance_at) {
        (Some(d), Some(b)) => {
            if BALANCE_NEEDS_DEPOSIT.is_match(name) {
                Some(PaymentRole::Balance)
            } else if DEPOSIT_NEEDS_BALANCE.is_match(name) {
                Some(PaymentRole::Deposit)
            } else if d < b {
                Some(PaymentRole::Deposit)
            } else {
                Some(PaymentRole::Balance)
            }
        }
        (Some(_), None) => Some(PaymentRole::Deposit),
        (None, Some(_)) => Some(PaymentRole::Balance),
        (None, None) => None,
    }
}

/// Listing title without promo brackets and payment markers.
pub fn clean_item_name(name: &str) -> String {
    let mut cleaned = name.to_string();
    for re in ITEM_NAME_NOISE.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// The product series name left after stripping every payment/batch marker.
pub fn extract_core_name(name: &str) -> String {
    let mut core = name.to_string();
    for re in CORE_NAME_NOISE.iter() {
        core = re.replace_all(&core, "").into_owned();
    }
    let core = CORE_NAME_SEPARATORS.replace_all(&core, " ");
    let core = WHITESPACE.replace_all(&core, " ");
    core.trim().trim_matches(|c| c == '-' || c == ' ').to_string()
}

fn extract_keywords(core_name: &str) -> BTreeSet<String> {
    KEYWORD_SPLIT
        .split(core_name)
        .map(str::trim)
        .filter(|w| w.chars().count() >= 2)
        .filter(|w| {
            let lower = w.to_lowercase();
            !KEYWORD_STOP_WORDS.iter().any(|s| *s == lower)
        })
        .map(String::from)
        .collect()
}

fn extract_brand_keywords(shop_name: &str) -> BTreeSet<String> {
    let mut keywords: BTreeSet<String> = LATIN_WORD
        .find_iter(shop_name)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    keywords.extend(
        HAN_WORD
            .find_iter(shop_name)
            .map(|m| m.as_str())
            .filter(|w| !SHOP_STOP_WORDS.contains(w))
            .map(String::from),
    );
    keywords
}

fn shops_are_same_brand(a: &str, b: &str) -> bool {
    let ka = extract_brand_keywords(a);
    let kb = extract_brand_keywords(b);
    !ka.is_empty() && !kb.is_empty() && !ka.is_disjoint(&kb)
}

struct Candidate<'a> {
    item: &'a ParsedItem,
    core_name: String,
    keywords: BTreeSet<String>,
}

impl<'a> Candidate<'a> {
    fn new(item: &'a ParsedItem) -> Self {
        let core_name = extract_core_name(&item.name);
        let keywords = extract_keywords(&core_name);
        Self {
            item,
            core_name,
            keywords,
        }
    }
}

fn pair_score(deposit: &Candidate, balance: &Candidate) -> u32 {
    let mut score = 0;

    let (dc, bc) = (&deposit.core_name, &balance.core_name);
    if !dc.is_empty() && dc == bc {
        score += 10;
    } else if !dc.is_empty() && !bc.is_empty() {
        let (shorter, longer) = if dc.chars().count() <= bc.chars().count() {
            (dc, bc)
        } else {
            (bc, dc)
        };
        if shorter.chars().count() >= 3 && longer.contains(shorter.as_str()) {
            score += 7;
        }
    }

    if score < 7 && !deposit.keywords.is_empty() && !balance.keywords.is_empty() {
        let overlap = deposit.keywords.intersection(&balance.keywords).count();
        let smaller = deposit.keywords.len().min(balance.keywords.len());
        if overlap >= 2 && overlap as f32 / smaller as f32 >= 0.6 {
            score += 6;
        }
    }

    let (du, bu) = (&deposit.item.product_url, &balance.item.product_url);
    if !du.trim().is_empty() && du == bu {
        score += 8;
    }

    let (ds, bs) = (&deposit.item.shop_name, &balance.item.shop_name);
    if !ds.trim().is_empty() && !bs.trim().is_empty() {
        if ds == bs {
            score += 3;
        } else if shops_are_same_brand(ds, bs) {
            score += 2;
        }
    }

    score
}

/// A balance dated before its deposit cannot belong to it.
fn chronology_allows(deposit: &ParsedItem, balance: &ParsedItem) -> bool {
    match (
        normalize_order_date(&deposit.order_time),
        normalize_order_date(&balance.order_time),
    ) {
        (Some(d), Some(b)) => b >= d,
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ImportUnit {
    Single(ParsedItem),
    Merged {
        deposit: ParsedItem,
        balance: ParsedItem,
    },
}

impl ImportUnit {
    /// The row whose name, brand and date the inventory item takes.
    pub fn primary(&self) -> &ParsedItem {
        match self {
            Self::Single(item) => item,
            Self::Merged { deposit, .. } => deposit,
        }
    }

    pub fn source_rows(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Merged { .. } => 2,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// First value of a classified field across the unit's rows.
    pub fn pick<F>(&self, field: F) -> Option<&str>
    where
        F: Fn(&ParsedItem) -> Option<&String>,
    {
        match self {
            Self::Single(item) => field(item).map(String::as_str),
            Self::Merged { deposit, balance } => field(deposit)
                .or_else(|| field(balance))
                .map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    pub units: Vec<ImportUnit>,
}

impl MergePlan {
    pub fn merged_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_merged()).count()
    }
}

/// Pair indices `(deposit, balance)` into `items` that are each other's unique best match.
fn mutual_best_pairs(items: &[&ParsedItem], open: &[bool]) -> Vec<(usize, usize)> {
    let candidates: Vec<Candidate> = items.iter().map(|i| Candidate::new(i)).collect();
    let roles: Vec<Option<PaymentRole>> = items.iter().map(|i| detect_payment_role(&i.name)).collect();

    let deposits: Vec<usize> = (0..items.len())
        .filter(|&i| open[i] && roles[i] == Some(PaymentRole::Deposit))
        .collect();
    let balances: Vec<usize> = (0..items.len())
        .filter(|&i| open[i] && roles[i] == Some(PaymentRole::Balance))
        .collect();

    let score = |d: usize, b: usize| -> u32 {
        if chronology_allows(items[d], items[b]) {
            pair_score(&candidates[d], &candidates[b])
        } else {
            0
        }
    };

    // Strictly best element of `pool` for `f`, or None on a tie or below threshold.
    fn unique_best(pool: &[usize], f: impl Fn(usize) -> u32) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        let mut tied = false;
        for &idx in pool {
            let s = f(idx);
            match best {
                Some((_, bs)) if s == bs => tied = true,
                Some((_, bs)) if s < bs => {}
                _ => {
                    best = Some((idx, s));
                    tied = false;
                }
            }
        }
        match best {
            Some((idx, s)) if !tied && s >= MIN_PAIR_SCORE => Some(idx),
            _ => None,
        }
    }

    let mut pairs = Vec::new();
    for &d in &deposits {
        let Some(b) = unique_best(&balances, |b| score(d, b)) else {
            continue;
        };
        if unique_best(&deposits, |other| score(other, b)) == Some(d) {
            pairs.push((d, b));
        }
    }
    pairs
}

/// Collapse deposit/balance pairs. Already merged units pass through untouched,
/// so running this on its own output changes nothing.
pub fn merge_deposit_balance(units: Vec<ImportUnit>) -> MergePlan {
    let singles: Vec<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| !u.is_merged())
        .map(|(i, _)| i)
        .collect();
    let items: Vec<&ParsedItem> = singles.iter().map(|&i| units[i].primary()).collect();

    // Repeat until stable: removing a pair can leave a formerly tied
    // candidate with a unique best match.
    let mut open = vec![true; items.len()];
    let mut partner: Vec<Option<usize>> = vec![None; units.len()];
    loop {
        let pairs = mutual_best_pairs(&items, &open);
        if pairs.is_empty() {
            break;
        }
        for (d, b) in pairs {
            open[d] = false;
            open[b] = false;
            partner[singles[d]] = Some(singles[b]);
            partner[singles[b]] = Some(singles[d]);
        }
    }

    let is_deposit: Vec<bool> = units
        .iter()
        .map(|u| detect_payment_role(&u.primary().name) == Some(PaymentRole::Deposit))
        .collect();

    let mut slots: Vec<Option<ImportUnit>> = units.into_iter().map(Some).collect();
    let mut plan = MergePlan::default();
    for idx in 0..slots.len() {
        match partner[idx] {
            None => {
                if let Some(unit) = slots[idx].take() {
                    plan.units.push(unit);
                }
            }
            Some(other) if is_deposit[idx] => {
                let deposit = slots[idx].take();
                let balance = slots[other].take();
                if let (Some(ImportUnit::Single(deposit)), Some(ImportUnit::Single(balance))) =
                    (deposit, balance)
                {
                    tracing::debug!(
                        deposit = %deposit.name,
                        balance = %balance.name,
                        "Paired deposit and balance"
                    );
                    plan.units.push(ImportUnit::Merged { deposit, balance });
                }
            }
            // Balance half of a pair; emitted with its deposit.
            Some(_) => {}
        }
    }

    tracing::info!(
        units = plan.units.len(),
        merged = plan.merged_count(),
        "Planned deposit/balance merges"
    );
    plan
}

pub fn plan_items(items: Vec<ParsedItem>) -> MergePlan {
    merge_deposit_balance(items.into_iter().map(ImportUnit::Single).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, url: &str, shop: &str, time: &str, price: f64) -> ParsedItem {
        ParsedItem {
            name: name.to_string(),
            product_url: url.to_string(),
            style_spec: String::new(),
            quantity: 1,
            price,
            parsed_type: None,
            parsed_size: None,
            parsed_color: None,
            order_id: format!("{name}-{time}"),
            order_time: time.to_string(),
            shop_name: shop.to_string(),
        }
    }

    #[test]
    fn test_detect_payment_role() {
        assert_eq!(detect_payment_role("【定金】星河OP"), Some(PaymentRole::Deposit));
        assert_eq!(detect_payment_role("星河OP 定-金"), Some(PaymentRole::Deposit));
        assert_eq!(detect_payment_role("【尾款】星河OP"), Some(PaymentRole::Balance));
        assert_eq!(detect_payment_role("星河OP"), None);
        assert_eq!(detect_payment_role("星河OP 尾款*需有定金"), Some(PaymentRole::Balance));
        assert_eq!(detect_payment_role("尾款 星河OP 需要有一团定金"), Some(PaymentRole::Balance));
        assert_eq!(detect_payment_role("星河 定金页面需补尾款"), Some(PaymentRole::Deposit));
        assert_eq!(detect_payment_role("定金 星河 尾款"), Some(PaymentRole::Deposit));
        assert_eq!(detect_payment_role("尾款 星河 定金"), Some(PaymentRole::Balance));
    }

    #[test]
    fn test_clean_item_name() {
        assert_eq!(clean_item_name("【预约期包邮】星河OP（定金）"), "星河OP");
        assert_eq!(clean_item_name("＜不死锦鲤＞ 金鳞  流光 尾款"), "金鳞 流光");
        assert_eq!(clean_item_name(" - CP先行 Alice JSK"), "Alice JSK");
    }

    #[test]
    fn test_extract_core_name() {
        assert_eq!(extract_core_name("【定金】星河旋律OP 2团"), "星河旋律OP");
        assert_eq!(extract_core_name("【尾款】星河旋律OP｜需有定金"), "星河旋律OP");
        assert_eq!(extract_core_name("《旋转虎虎》JSK (208+800)"), "旋转虎虎JSK");
    }

    #[test]
    fn test_pairs_matching_deposit_and_balance() {
        let plan = plan_items(vec![
            item("【定金】星河旋律OP", "", "Shop A", "2024-01-05 10:00", 200.0),
            item("普通袜子", "", "Shop B", "2024-02-01 10:00", 30.0),
            item("【尾款】星河旋律OP", "", "Shop A", "2024-04-05 10:00", 600.0),
        ]);
        assert_eq!(plan.units.len(), 2);
        assert_eq!(plan.merged_count(), 1);
        match &plan.units[0] {
            ImportUnit::Merged { deposit, balance } => {
                assert_eq!(deposit.price, 200.0);
                assert_eq!(balance.price, 600.0);
            }
            other => panic!("expected merged unit, got {other:?}"),
        }
        assert_eq!(plan.units[1].primary().name, "普通袜子");
    }

    #[test]
    fn test_url_alone_is_enough() {
        let plan = plan_items(vec![
            item("定金 Alice", "https://item.taobao.com/1", "", "", 100.0),
            item("尾款 completely different title", "https://item.taobao.com/1", "", "", 300.0),
        ]);
        assert_eq!(plan.merged_count(), 1);
    }

    #[test]
    fn test_shop_match_alone_is_not_enough() {
        let plan = plan_items(vec![
            item("定金 星河旋律OP", "", "Shop A", "", 100.0),
            item("尾款 月光城堡JSK", "", "Shop A", "", 300.0),
        ]);
        assert_eq!(plan.merged_count(), 0);
        assert_eq!(plan.units.len(), 2);
    }

    #[test]
    fn test_ambiguous_balances_are_not_merged() {
        let plan = plan_items(vec![
            item("定金 星河旋律OP", "", "Shop A", "", 100.0),
            item("尾款 星河旋律OP", "", "Shop A", "", 300.0),
            item("尾款 星河旋律OP", "", "Shop A", "", 300.0),
        ]);
        assert_eq!(plan.merged_count(), 0);
        assert_eq!(plan.units.len(), 3);
    }

    #[test]
    fn test_balance_before_deposit_is_not_merged() {
        let plan = plan_items(vec![
            item("定金 星河旋律OP", "", "Shop A", "2024-05-01 10:00", 100.0),
            item("尾款 星河旋律OP", "", "Shop A", "2024-01-01 10:00", 300.0),
        ]);
        assert_eq!(plan.merged_count(), 0);
    }

    #[test]
    fn test_two_deposits_two_balances() {
        let plan = plan_items(vec![
            item("定金 星河旋律OP", "", "Shop A", "", 100.0),
            item("定金 月光城堡JSK", "", "Shop A", "", 150.0),
            item("尾款 月光城堡JSK", "", "Shop A", "", 450.0),
            item("尾款 星河旋律OP", "", "Shop A", "", 300.0),
        ]);
        assert_eq!(plan.merged_count(), 2);
        assert_eq!(plan.units.len(), 2);
        for unit in &plan.units {
            let ImportUnit::Merged { deposit, balance } = unit else {
                panic!("expected merged unit");
            };
            assert_eq!(extract_core_name(&deposit.name), extract_core_name(&balance.name));
        }
    }

    #[test]
    fn test_merge_is_idempotent() {
        let plan = plan_items(vec![
            item("定金 星河旋律OP", "", "Shop A", "", 100.0),
            item("尾款 星河旋律OP", "", "Shop A", "", 300.0),
            item("定金 月光城堡JSK", "", "Shop B", "", 150.0),
            item("普通袜子", "", "Shop B", "", 30.0),
        ]);
        assert_eq!(plan.merged_count(), 1);
        let again = merge_deposit_balance(plan.units.clone());
        assert_eq!(again, plan);
        assert_eq!(again.merged_count(), 1);
    }

    #[test]
    fn test_same_brand_shops() {
        assert!(shops_are_same_brand("Angelic Pretty 上海店", "Angelic Pretty官方"));
        assert!(!shops_are_same_brand("原创洋装工作室", "原创独立设计师"));
    }

    #[test]
    fn test_pick_prefers_deposit_fields() {
        let mut deposit = item("定金 A", "", "", "", 1.0);
        let mut balance = item("尾款 A", "", "", "", 2.0);
        balance.parsed_size = Some("M".to_string());
        balance.parsed_color = Some("黑色".to_string());
        deposit.parsed_color = Some("白色".to_string());
        let unit = ImportUnit::Merged { deposit, balance };
        assert_eq!(unit.pick(|i| i.parsed_size.as_ref()), Some("M"));
        assert_eq!(unit.pick(|i| i.parsed_color.as_ref()), Some("白色"));
        assert_eq!(unit.source_rows(), 2);
    }
}

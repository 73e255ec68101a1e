//! Heuristic extraction of garment type, size and color from the free-text
//! "型号款式" (style spec) column of a Taobao order export.
//!
//! Example: `"蓝黑配色;Lady80;开襟OP"` yields type `开襟OP`, size `Lady80`,
//! color `蓝黑配色`.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStyle {
    pub item_type: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl ParsedStyle {
    fn absorb(&mut self, other: ParsedStyle) {
        if self.item_type.is_none() {
            self.item_type = other.item_type;
        }
        if self.size.is_none() {
            self.size = other.size;
        }
        if self.color.is_none() {
            self.color = other.color;
        }
    }
}

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

const TYPE_KEYWORDS: &[&str] = &[
    // base
    "OP", "SK", "JSK", "SET", "FS",
    // skirts and dresses
    "开襟OP", "堆褶OP", "堆褶开襟OP", "拼色SK", "罩裙", "半裙", "格裙", "长裙", "连衣裙",
    // sets
    "Fullset", "华丽套装",
    // tops and outerwear
    "衬衫", "上衣", "外套", "长外套", "大衣", "罩衫", "斗篷", "罩衫斗篷", "胸衣", "蝙蝠胸衣",
    // bottoms
    "短裤", "南瓜裤",
    // headwear
    "头饰", "蝴蝶结头饰", "帽子", "贝雷帽", "KC", "发箍", "发带", "发夹", "边夹", "头纱",
    // waist and sleeves
    "腰封", "拖尾腰封", "印花钢骨腰封", "手袖", "接袖", "袖子",
    // other accessories
    "包", "包包", "吊坠", "项链", "耳环", "戒指", "胸针",
];

const TYPE_SUFFIXES: &[&str] = &["OP", "SK", "JSK", "SET", "FS"];

const COLOR_KEYWORDS: &[&str] = &[
    // base colors
    "黑色", "白色", "红色", "粉色", "蓝色", "绿色", "紫色", "黄色", "灰色", "棕色",
    "黑", "白", "红", "粉", "蓝", "绿", "紫", "黄", "灰", "棕",
    // shades
    "深蓝", "浅蓝", "天蓝", "藏蓝", "深绿", "浅绿", "墨绿", "军绿",
    "深紫", "浅紫", "暗红", "酒红", "玫红", "粉红",
    // named colors
    "绀色", "苔绿", "生成色", "香槟色", "白金色", "月银色", "深海色",
    "龙骨酒红色", "金色", "银色", "玫瑰金", "肤色",
    "米白", "米黄", "米色", "卡其", "驼色", "咖啡",
    // two-tone
    "黑白", "蓝黑", "灰黑", "绿金", "粉绿", "黑粉",
    "黑x红", "黑x青", "白×蓝",
    // series colorways
    "织金", "白玫瑰", "黑玫瑰", "黑夕", "白昼", "蓝暮", "紫夜", "白金", "深海",
    // mixed
    "配色", "拼色", "撞色", "混色", "渐变",
    "图色",
];

/// Removed in order; "色码以定金为准" must go before the bare payment words.
const NOISE_PATTERNS: &[&str] = &[
    r"【[^】]*】",
    r"\[[^\]]*\]",
    r"\{[^}]*\}",
    r"<[^>]*>",
    r"（[^）]*(?:尾款|定金|不单售|备注|售后)[^）]*）",
    r"\([^)]*(?:尾款|定金|不单售|备注|售后)[^)]*\)",
    r"·(?:尾款|定金|现货)",
    r"β款",
    r"色码以定金为准",
    r"[一二三四五六七八九十\d]+批",
    r"[一二三四五六七八九十\d]+团",
    r"(?:仅|只)?(?:定-?金|尾款|现货|预约|全款|意向金)",
    r"(?:自行)?备注尺码|尺码(?:请)?备注|单品尺码请备注",
    r"(?:发货|收货)[^;/]*地址[^;/]*",
    r"注意[^;/]*",
    r"需有[^;/]*",
    r"需要有[^;/]*",
    r"还需补[^;/]*",
    r"需补[^;/]*",
    r"\d+\.\d+(?:晚上|上午|下午)?[^;/]{0,10}",
    r"\d+月\d+日[^;/]*",
    r"本体",
    r"正常长度",
    r"不退不换不售后",
    r"福袋[^;/]*",
    r"按拍付顺序发",
    r"仅[^;/]*期间[^;/]*",
    r"物流情况",
    r"年前年后",
    r"单品[^;/]*请?备注",
];

static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NOISE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("valid noise regex"))
        .collect()
});

static SIZE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^Lady\d+$",
        r"^\d{2,3}$",
        r"(?i)^(?:XS|S|M|L|XL|XXL|XXXL|2XL|3XL)$",
        r"^均码$",
        r"(?i)^F$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid size regex"))
    .collect()
});

static LEADING_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Lady\d+|XXXL|XXL|2XL|3XL|XL|XS|S|M|L)").expect("valid leading size regex")
});

static PRIMARY_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;/]").expect("valid split regex"));

static SECONDARY_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+|--").expect("valid split regex"));

static TYPE_KEYWORDS_LONGEST_FIRST: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut keywords = TYPE_KEYWORDS.to_vec();
    keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));
    keywords
});

// ---------------------------------------------------------------------------
// Matching helpers
// ---------------------------------------------------------------------------

/// Byte offset of `needle` in `hay`, ignoring ASCII case.
fn find_ignore_ascii_case(hay: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    hay.char_indices().map(|(i, _)| i).find(|&i| {
        hay.get(i..i + needle.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    })
}

fn ends_with_ignore_ascii_case(hay: &str, suffix: &str) -> bool {
    hay.len() >= suffix.len()
        && hay
            .get(hay.len() - suffix.len()..)
            .is_some_and(|s| s.eq_ignore_ascii_case(suffix))
}

pub fn is_type_keyword(part: &str) -> bool {
    if TYPE_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(part)) {
        return true;
    }
    TYPE_SUFFIXES
        .iter()
        .any(|suffix| part.len() > suffix.len() && ends_with_ignore_ascii_case(part, suffix))
}

pub fn is_size_keyword(part: &str) -> bool {
    SIZE_PATTERNS.iter().any(|re| re.is_match(part))
}

pub fn is_color_keyword(part: &str) -> bool {
    COLOR_KEYWORDS
        .iter()
        .any(|k| find_ignore_ascii_case(part, k).is_some())
}

fn contained_type_keyword(part: &str) -> Option<(&'static str, String)> {
    TYPE_KEYWORDS_LONGEST_FIRST.iter().find_map(|kw| {
        let start = find_ignore_ascii_case(part, kw)?;
        let remaining = format!("{}{}", &part[..start], &part[start + kw.len()..]);
        Some((*kw, remaining.trim().to_string()))
    })
}

/// A size token at the start of a longer fragment, e.g. `M` in `M半裙`.
/// Letters directly after the token mean it is part of a word, not a size.
fn leading_size(part: &str) -> Option<&str> {
    let m = LEADING_SIZE.find(part)?;
    let rest = &part[m.end()..];
    if rest.is_empty() {
        return None;
    }
    if rest.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(m.as_str())
}

// ---------------------------------------------------------------------------
// Cleaning, splitting, classification
// ---------------------------------------------------------------------------

pub fn clean_style_spec(spec: &str) -> String {
    let mut cleaned = spec.to_string();
    for re in NOISE.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    cleaned.trim().to_string()
}

fn split_fragments(cleaned: &str) -> Vec<String> {
    PRIMARY_SPLIT
        .split(cleaned)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .flat_map(|p| {
            SECONDARY_SPLIT
                .split(p)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Checks run type, size, color; anything unmatched falls back to color.
fn classify_fragment(part: &str) -> ParsedStyle {
    if part.is_empty() {
        return ParsedStyle::default();
    }
    if is_type_keyword(part) {
        return ParsedStyle {
            item_type: Some(part.to_string()),
            ..Default::default()
        };
    }
    if is_size_keyword(part) {
        return ParsedStyle {
            size: Some(part.to_string()),
            ..Default::default()
        };
    }
    if let Some(size) = leading_size(part) {
        let remaining = part[size.len()..].trim();
        let inner = classify_fragment(remaining);
        return ParsedStyle {
            item_type: inner.item_type,
            size: Some(size.to_string()),
            color: inner.color,
        };
    }
    if let Some((keyword, remaining)) = contained_type_keyword(part) {
        let color = (!remaining.is_empty() && is_color_keyword(&remaining)).then_some(remaining);
        return ParsedStyle {
            item_type: Some(keyword.to_string()),
            size: None,
            color,
        };
    }
    ParsedStyle {
        color: Some(part.to_string()),
        ..Default::default()
    }
}

/// Each field keeps the first fragment that supplies it.
pub fn parse_style_spec(spec: &str) -> ParsedStyle {
    if spec.trim().is_empty() {
        return ParsedStyle::default();
    }
    let cleaned = clean_style_spec(spec);
    let mut result = ParsedStyle::default();
    for fragment in split_fragments(&cleaned) {
        result.absorb(classify_fragment(&fragment));
    }
    tracing::debug!(spec, ?result, "Classified style spec");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(t: Option<&str>, s: Option<&str>, c: Option<&str>) -> ParsedStyle {
        ParsedStyle {
            item_type: t.map(String::from),
            size: s.map(String::from),
            color: c.map(String::from),
        }
    }

    #[test]
    fn test_three_fragment_spec() {
        assert_eq!(
            parse_style_spec("蓝黑配色;Lady80;开襟OP"),
            parsed(Some("开襟OP"), Some("Lady80"), Some("蓝黑配色"))
        );
    }

    #[test]
    fn test_bracket_annotation_stripped() {
        assert_eq!(parse_style_spec("【现货】黑色;M"), parsed(None, Some("M"), Some("黑色")));
    }

    #[test]
    fn test_blank_spec() {
        assert_eq!(parse_style_spec(""), ParsedStyle::default());
        assert_eq!(parse_style_spec("   "), ParsedStyle::default());
    }

    #[test]
    fn test_type_wins_over_color() {
        assert_eq!(parse_style_spec("红OP"), parsed(Some("红OP"), None, None));
    }

    #[test]
    fn test_type_match_ignores_case() {
        assert_eq!(parse_style_spec("jsk").item_type.as_deref(), Some("jsk"));
        assert_eq!(parse_style_spec("粉色柳波芙jsk").item_type.as_deref(), Some("粉色柳波芙jsk"));
        assert_eq!(parse_style_spec("fullset").item_type.as_deref(), Some("fullset"));
    }

    #[test]
    fn test_bare_suffix_is_exact_type() {
        assert_eq!(parse_style_spec("FS"), parsed(Some("FS"), None, None));
    }

    #[test]
    fn test_size_variants() {
        for size in ["Lady85", "lady90", "160", "XL", "xs", "2XL", "均码", "f"] {
            assert_eq!(parse_style_spec(size).size.as_deref(), Some(size), "size {size}");
        }
    }

    #[test]
    fn test_four_digit_number_is_not_size() {
        assert_eq!(parse_style_spec("2024").size, None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            parse_style_spec("白色;黑色;S;M;SK;JSK"),
            parsed(Some("SK"), Some("S"), Some("白色"))
        );
    }

    #[test]
    fn test_unmatched_fragment_falls_back_to_color_once() {
        assert_eq!(parse_style_spec("星空;M"), parsed(None, Some("M"), Some("星空")));
        assert_eq!(parse_style_spec("黑色;星空"), parsed(None, None, Some("黑色")));
    }

    #[test]
    fn test_single_fragment_leaves_others_empty() {
        assert_eq!(parse_style_spec("Lady80"), parsed(None, Some("Lady80"), None));
    }

    #[test]
    fn test_disclaimers_removed() {
        assert_eq!(
            parse_style_spec("β款;藏蓝;色码以定金为准;L"),
            parsed(None, Some("L"), Some("藏蓝"))
        );
        assert_eq!(
            parse_style_spec("发货地址请留言;注意看详情;粉色;均码"),
            parsed(None, Some("均码"), Some("粉色"))
        );
        assert_eq!(
            parse_style_spec("需有定金才能拍;需要有一团定金;JSK"),
            parsed(Some("JSK"), None, None)
        );
    }

    #[test]
    fn test_half_width_brackets_and_payment_words() {
        assert_eq!(
            parse_style_spec("[预售]定金;墨绿;OP"),
            parsed(Some("OP"), None, Some("墨绿"))
        );
    }

    #[test]
    fn test_slash_and_whitespace_split() {
        assert_eq!(
            parse_style_spec("酒红 JSK/Lady85"),
            parsed(Some("JSK"), Some("Lady85"), Some("酒红"))
        );
    }

    #[test]
    fn test_leading_size_prefix() {
        assert_eq!(parse_style_spec("M半裙"), parsed(Some("半裙"), Some("M"), None));
        assert_eq!(parse_style_spec("XL上衣"), parsed(Some("上衣"), Some("XL"), None));
        assert_eq!(
            parse_style_spec("Lady80白色JSK"),
            parsed(Some("Lady80白色JSK"), None, None)
        );
    }

    #[test]
    fn test_contained_type_keyword_with_color() {
        assert_eq!(parse_style_spec("黑色半裙"), parsed(Some("半裙"), None, Some("黑色")));
    }

    #[test]
    fn test_clean_style_spec() {
        assert_eq!(clean_style_spec("【预约】白色{限定}<新>"), "白色");
        assert_eq!(clean_style_spec("三团尾款"), "");
        assert_eq!(clean_style_spec("12.5日截单;蓝色"), ";蓝色");
    }
}

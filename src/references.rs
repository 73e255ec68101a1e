//! Finds brands and categories an import batch refers to that the catalog
//! does not have yet. Nothing is written here; the result is a checklist the
//! user trims before commit.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::CatalogReader;
use crate::error::Result;
use crate::models::{Category, CategoryGroup, MissingReferenceItem, ParsedItem, ReferenceKind};

// (canonical category, classified types that map onto it)
// JSK precedes SK so "xxxJSK" is not taken for a skirt.
const CATEGORY_ALIASES: &[(&str, &[&str])] = &[
    ("JSK", &["JSK"]),
    ("OP", &["OP", "开襟OP", "堆褶OP", "堆褶开襟OP"]),
    ("SK", &["SK", "拼色SK"]),
    ("斗篷", &["斗篷", "罩衫斗篷"]),
    ("其他头饰", &["头饰", "蝴蝶结头饰"]),
];

const ACCESSORY_HINTS: &[&str] = &[
    "头饰", "蝴蝶结", "帽子", "KC", "发带", "发夹", "包", "鞋", "袜", "手套",
    "项链", "耳环", "戒指", "胸针", "腰链",
];

fn contains_ignore_ascii_case(hay: &str, needle: &str) -> bool {
    hay.to_ascii_uppercase().contains(&needle.to_ascii_uppercase())
}

pub fn guess_category_group(item_type: &str) -> CategoryGroup {
    if ACCESSORY_HINTS
        .iter()
        .any(|hint| contains_ignore_ascii_case(item_type, hint))
    {
        CategoryGroup::Accessory
    } else {
        CategoryGroup::Garment
    }
}

/// Exact name first, then the alias table when its canonical category exists.
pub fn resolve_category<R>(reader: &R, item_type: &str) -> Result<Option<Category>>
where
    R: CatalogReader + ?Sized,
{
    if let Some(category) = reader.find_category_by_name(item_type)? {
        return Ok(Some(category));
    }
    for (canonical, aliases) in CATEGORY_ALIASES {
        if aliases
            .iter()
            .any(|alias| contains_ignore_ascii_case(item_type, alias))
        {
            if let Some(category) = reader.find_category_by_name(canonical)? {
                return Ok(Some(category));
            }
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingReferences {
    pub brands: Vec<MissingReferenceItem>,
    pub categories: Vec<MissingReferenceItem>,
}

impl MissingReferences {
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.brands.len() + self.categories.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MissingReferenceItem> {
        self.brands.iter().chain(self.categories.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MissingReferenceItem> {
        self.brands.iter_mut().chain(self.categories.iter_mut())
    }

    pub fn checked(&self) -> impl Iterator<Item = &MissingReferenceItem> {
        self.iter().filter(|item| item.checked)
    }

    /// Returns false when no proposal has that name.
    pub fn set_checked(&mut self, kind: ReferenceKind, name: &str, checked: bool) -> bool {
        let list = match kind {
            ReferenceKind::Brand => &mut self.brands,
            ReferenceKind::Category => &mut self.categories,
        };
        match list.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                item.checked = checked;
                true
            }
            None => false,
        }
    }
}

pub fn detect_missing<'a, R, I>(reader: &R, items: I) -> Result<MissingReferences>
where
    R: CatalogReader + ?Sized,
    I: IntoIterator<Item = &'a ParsedItem>,
{
    let mut brand_names: BTreeSet<&str> = BTreeSet::new();
    let mut type_names: BTreeSet<&str> = BTreeSet::new();
    for item in items {
        if !item.shop_name.trim().is_empty() {
            brand_names.insert(item.shop_name.as_str());
        }
        if let Some(item_type) = item.parsed_type.as_deref() {
            if !item_type.trim().is_empty() {
                type_names.insert(item_type);
            }
        }
    }

    let mut missing = MissingReferences::default();
    for name in brand_names {
        if reader.find_brand_by_name(name)?.is_none() {
            missing.brands.push(MissingReferenceItem {
                name: name.to_string(),
                kind: ReferenceKind::Brand,
                checked: true,
                group: None,
            });
        }
    }

    let mut missing_categories: BTreeMap<&str, CategoryGroup> = BTreeMap::new();
    for name in type_names {
        if resolve_category(reader, name)?.is_none() {
            missing_categories.insert(name, guess_category_group(name));
        }
    }
    missing.categories = missing_categories
        .into_iter()
        .map(|(name, group)| MissingReferenceItem {
            name: name.to_string(),
            kind: ReferenceKind::Category,
            checked: true,
            group: Some(group),
        })
        .collect();

    tracing::info!(
        brands = missing.brands.len(),
        categories = missing.categories.len(),
        "Detected missing references"
    );
    Ok(missing)
}

use crate::catalog::{CatalogReader, CatalogWriter, ItemWriter};
use crate::error::{Result, WardrobeError};
use crate::merger::{clean_item_name, ImportUnit, MergePlan};
use crate::models::{
    CategoryGroup, ImportResult, ItemStatus, NewItem, NewPrice, PriceType, ReferenceKind,
};
use crate::order_parser::normalize_order_date;
use crate::references::{resolve_category, MissingReferences};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReferenceOutcome {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

/// Create every checked brand and category. A name that turns out to exist
/// already counts as `existing`; any other failure is logged and the batch
/// carries on.
pub fn create_checked_references<W>(writer: &W, missing: &MissingReferences) -> ReferenceOutcome
where
    W: CatalogWriter + ?Sized,
{
    let mut outcome = ReferenceOutcome::default();
    for reference in missing.checked() {
        let created = match reference.kind {
            ReferenceKind::Brand => writer.create_brand(&reference.name),
            ReferenceKind::Category => writer.create_category(
                &reference.name,
                reference.group.unwrap_or(CategoryGroup::Garment),
            ),
        };
        match created {
            Ok(id) => {
                tracing::debug!(kind = reference.kind.label(), name = %reference.name, id, "Created reference");
                outcome.created += 1;
            }
            Err(WardrobeError::Conflict { kind, name }) => {
                tracing::warn!(kind, %name, "Reference already exists, using it");
                outcome.existing += 1;
            }
            Err(e) => {
                tracing::warn!(kind = reference.kind.label(), name = %reference.name, error = %e, "Could not create reference");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn resolve_brand_id<C>(catalog: &C, unit: &ImportUnit) -> Result<i64>
where
    C: CatalogReader + ?Sized,
{
    let shop = match unit {
        ImportUnit::Single(item) => item.shop_name.trim(),
        ImportUnit::Merged { deposit, balance } => {
            if deposit.shop_name.trim().is_empty() {
                balance.shop_name.trim()
            } else {
                deposit.shop_name.trim()
            }
        }
    };
    if shop.is_empty() {
        return Err(WardrobeError::UnknownBrand(String::new()));
    }
    catalog
        .find_brand_by_name(shop)?
        .map(|b| b.id)
        .ok_or_else(|| WardrobeError::UnknownBrand(shop.to_string()))
}

fn resolve_category_id<C>(catalog: &C, unit: &ImportUnit, default_category: Option<&str>) -> Result<i64>
where
    C: CatalogReader + ?Sized,
{
    let item_type = unit.pick(|i| i.parsed_type.as_ref()).filter(|t| !t.trim().is_empty());
    let category = match (item_type, default_category) {
        (Some(t), _) => resolve_category(catalog, t)?
            .ok_or_else(|| WardrobeError::UnknownCategory(t.to_string()))?,
        (None, Some(fallback)) => catalog
            .find_category_by_name(fallback)?
            .ok_or_else(|| WardrobeError::UnknownCategory(fallback.to_string()))?,
        (None, None) => return Err(WardrobeError::UnknownCategory(String::new())),
    };
    Ok(category.id)
}

fn build_item(unit: &ImportUnit, brand_id: i64, category_id: i64) -> NewItem {
    let primary = unit.primary();
    let cleaned = clean_item_name(&primary.name);
    let name = if cleaned.is_empty() {
        primary.name.trim().to_string()
    } else {
        cleaned
    };
    let description = match unit {
        ImportUnit::Merged { deposit, balance } if deposit.style_spec.trim().is_empty() => {
            balance.style_spec.trim().to_string()
        }
        _ => primary.style_spec.trim().to_string(),
    };
    NewItem {
        name,
        brand_id,
        category_id,
        color: unit.pick(|i| i.parsed_color.as_ref()).map(String::from),
        size: unit.pick(|i| i.parsed_size.as_ref()).map(String::from),
        status: ItemStatus::Owned,
        description,
        source_url: non_blank(&primary.product_url),
        order_id: non_blank(&primary.order_id),
    }
}

fn build_price(unit: &ImportUnit, item_id: i64) -> NewPrice {
    let purchase_date = normalize_order_date(&unit.primary().order_time);
    match unit {
        ImportUnit::Single(item) => NewPrice {
            item_id,
            price_type: PriceType::Full,
            total_price: item.price,
            deposit: None,
            balance: None,
            purchase_date,
        },
        ImportUnit::Merged { deposit, balance } => NewPrice {
            item_id,
            price_type: PriceType::DepositBalance,
            total_price: deposit.price + balance.price,
            deposit: Some(deposit.price),
            balance: Some(balance.price),
            purchase_date,
        },
    }
}

fn commit_unit<C>(catalog: &C, unit: &ImportUnit, default_category: Option<&str>) -> Result<i64>
where
    C: CatalogReader + ItemWriter + ?Sized,
{
    let brand_id = resolve_brand_id(catalog, unit)?;
    let category_id = resolve_category_id(catalog, unit, default_category)?;
    let item_id = catalog.create_item(&build_item(unit, brand_id, category_id))?;
    if let Err(e) = catalog.create_price(&build_price(unit, item_id)) {
        if let Err(cleanup) = catalog.discard_item(item_id) {
            tracing::warn!(item_id, error = %cleanup, "Could not remove item after price failure");
        }
        return Err(e);
    }
    Ok(item_id)
}

/// Create the checked references, then write every unit of the plan.
///
/// Each unit stands alone: one that cannot be resolved or written adds its
/// source rows to `skipped` and the rest continue.
pub fn commit<C>(
    catalog: &C,
    missing: &MissingReferences,
    plan: &MergePlan,
    default_category: Option<&str>,
) -> ImportResult
where
    C: CatalogReader + CatalogWriter + ItemWriter + ?Sized,
{
    let references = create_checked_references(catalog, missing);
    tracing::info!(
        created = references.created,
        existing = references.existing,
        failed = references.failed,
        "Applied reference checklist"
    );

    let mut result = ImportResult::default();
    for unit in &plan.units {
        match commit_unit(catalog, unit, default_category) {
            Ok(item_id) => {
                tracing::debug!(item_id, name = %unit.primary().name, "Imported item");
                result.imported += 1;
                if unit.is_merged() {
                    result.merged += 1;
                }
            }
            Err(e) => {
                tracing::warn!(name = %unit.primary().name, reason = %e, "Skipped item");
                result.skipped += unit.source_rows();
            }
        }
    }

    tracing::info!(
        imported = result.imported,
        merged = result.merged,
        skipped = result.skipped,
        "Import committed"
    );
    result
}

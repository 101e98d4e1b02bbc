use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use stockbook_core::{DomainError, DomainResult, ProductId};

use crate::entry::LedgerEntry;

/// Kardex query: optional product plus an inclusive `[from, to]` window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    pub product_id: Option<ProductId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    /// Build a filter from raw query parameters.
    ///
    /// Bounds accept RFC 3339 timestamps or `YYYY-MM-DD`. A date-only `from`
    /// starts at midnight UTC; a date-only `to` runs to the end of that day.
    /// Blank parameters are ignored.
    pub fn parse(
        product_id: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> DomainResult<Self> {
        let product_id: Option<ProductId> = non_blank(product_id).map(str::parse).transpose()?;
        let from = non_blank(from)
            .map(|raw| parse_bound("from", raw, Bound::Start))
            .transpose()?;
        let to = non_blank(to)
            .map(|raw| parse_bound("to", raw, Bound::End))
            .transpose()?;
        Ok(Self { product_id, from, to })
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.product_id.is_none_or(|id| id == entry.product_id)
            && self.from.is_none_or(|from| entry.recorded_at >= from)
            && self.to.is_none_or(|to| entry.recorded_at <= to)
    }
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(field: &str, raw: &str, bound: Bound) -> DomainResult<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        DomainError::validation(format!(
            "{field} must be an RFC 3339 timestamp or a YYYY-MM-DD date (got '{raw}')"
        ))
    })?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    Ok(match bound {
        Bound::Start => start,
        Bound::End => start + TimeDelta::days(1) - TimeDelta::microseconds(1),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::entry::Movement;

    fn entry_at(product_id: ProductId, at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry::record(
            Movement::Opening(product_id),
            product_id,
            Decimal::ONE,
            Decimal::ONE,
            at,
        )
    }

    #[test]
    fn date_only_to_covers_the_whole_day() {
        let filter = LedgerFilter::parse(None, Some("2024-03-01"), Some("2024-03-01")).unwrap();
        let p = ProductId::new();

        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let day_before = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();

        assert!(filter.matches(&entry_at(p, late)));
        assert!(!filter.matches(&entry_at(p, next_day)));
        assert!(!filter.matches(&entry_at(p, day_before)));
    }

    #[test]
    fn timestamp_bounds_are_inclusive() {
        let filter = LedgerFilter::parse(
            None,
            Some("2024-03-01T10:00:00Z"),
            Some("2024-03-01T12:00:00+00:00"),
        )
        .unwrap();
        let p = ProductId::new();
        assert!(filter.matches(&entry_at(p, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())));
        assert!(filter.matches(&entry_at(p, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())));
        assert!(!filter.matches(&entry_at(p, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap())));
    }

    #[test]
    fn product_filter_is_exact() {
        let p = ProductId::new();
        let other = ProductId::new();
        let filter = LedgerFilter::parse(Some(&p.to_string()), None, Some("")).unwrap();
        assert_eq!(filter.to, None);
        assert!(filter.matches(&entry_at(p, Utc::now())));
        assert!(!filter.matches(&entry_at(other, Utc::now())));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            LedgerFilter::parse(Some("nope"), None, None),
            Err(DomainError::InvalidId(_))
        ));
        assert!(matches!(
            LedgerFilter::parse(None, Some("yesterday"), None),
            Err(DomainError::Validation(msg)) if msg.starts_with("from")
        ));
    }
}

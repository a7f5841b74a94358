//! Offset pagination over an already materialised result set.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::config::CONFIG;
use crate::database::record::Record;
use crate::database::schema::Schema;
use crate::filter::error::FilterError;
use crate::filter::filter_order::FilterOrder;
use crate::filter::types::SortSpec;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PagerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Zero-based page index, page size and optional sort.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    page: usize,
    size: usize,
    sort: SortSpec,
}

impl PageRequest {
    /// Rejects negative pages and non-positive sizes. Sizes above the
    /// configured maximum are capped.
    pub fn new(page: i64, size: i64) -> Result<Self, PagerError> {
        if page < 0 {
            return Err(PagerError::InvalidArgument(format!("page must not be negative, got {}", page)));
        }
        if size <= 0 {
            return Err(PagerError::InvalidArgument(format!("size must be positive, got {}", size)));
        }

        let max = CONFIG.pager.max_page_size;
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        let size = if size > max {
            tracing::warn!("Page size {} exceeds max {}, capping to max", size, max);
            max
        } else {
            size
        };

        Ok(Self {
            page: usize::try_from(page).unwrap_or(usize::MAX),
            size,
            sort: SortSpec::unsorted(),
        })
    }

    /// Builds a request from optional query parameters, falling back to the
    /// first page and the configured default size.
    pub fn from_params(page: Option<i64>, size: Option<i64>) -> Result<Self, PagerError> {
        let default_size = CONFIG.pager.default_page_size as i64;
        Self::new(page.unwrap_or(0), size.unwrap_or(default_size))
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// One slice of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "content")]
    pub items: Vec<T>,
    #[serde(rename = "pageNumber")]
    pub page_number: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    #[serde(rename = "totalElements")]
    pub total_count: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    #[serde(rename = "last")]
    pub is_last: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            is_last: self.is_last,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(Page {
            items,
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            is_last: self.is_last,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slices `items`, which must already be in their final order.
/// `request.sort()` is not consulted here: records go through
/// [`paginate_records`], anything else through [`paginate_by`].
pub fn paginate<T>(items: Vec<T>, request: &PageRequest) -> Page<T> {
    let total = items.len();
    let size = request.size();
    let offset = request.offset();
    let total_pages = total.div_ceil(size);
    let is_last = request.page().saturating_add(1).saturating_mul(size) >= total;

    let items = if offset >= total {
        if CONFIG.pager.debug_logging {
            tracing::debug!("Page {} is beyond {} items", request.page(), total);
        }
        Vec::new()
    } else {
        items.into_iter().skip(offset).take(size).collect()
    };

    Page { items, page_number: request.page(), page_size: size, total_count: total, total_pages, is_last }
}

/// Stable-sorts `items` with `compare`, then slices.
pub fn paginate_by<T>(mut items: Vec<T>, request: &PageRequest, compare: impl FnMut(&T, &T) -> Ordering) -> Page<T> {
    items.sort_by(compare);
    paginate(items, request)
}

/// Stable-sorts records by the request's sort, then slices. Sort fields
/// must exist on `schema`.
pub fn paginate_records(mut records: Vec<Record>, request: &PageRequest, schema: &Schema) -> Result<Page<Record>, FilterError> {
    FilterOrder::validate(request.sort(), schema)?;
    FilterOrder::sort(&mut records, request.sort(), schema);
    Ok(paginate(records, request))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_page_and_non_positive_size() {
        assert!(matches!(PageRequest::new(-1, 10), Err(PagerError::InvalidArgument(_))));
        assert!(matches!(PageRequest::new(0, 0), Err(PagerError::InvalidArgument(_))));
        assert!(matches!(PageRequest::new(0, -5), Err(PagerError::InvalidArgument(_))));
    }

    #[test]
    fn caps_size_at_configured_max() {
        let max = CONFIG.pager.max_page_size;
        let request = PageRequest::new(0, max as i64 + 1).unwrap();
        assert_eq!(request.size(), max);
    }

    #[test]
    fn pages_concatenate_to_full_sequence() {
        let items: Vec<u32> = (1..=7).collect();
        let mut seen = Vec::new();
        let mut pages = 0;
        for page in 0.. {
            let p = paginate(items.clone(), &PageRequest::new(page, 3).unwrap());
            assert!(p.items.len() <= p.page_size);
            assert_eq!(p.total_pages, 3);
            seen.extend(p.items);
            pages += 1;
            if p.is_last {
                break;
            }
        }
        assert_eq!(pages, 3);
        assert_eq!(seen, items);
    }

    #[test]
    fn page_beyond_data_is_empty_and_last() {
        let p = paginate((0..9).collect::<Vec<_>>(), &PageRequest::new(5, 3).unwrap());
        assert!(p.is_empty());
        assert!(p.is_last);
        assert_eq!(p.total_count, 9);
        assert_eq!(p.page_number, 5);
    }

    #[test]
    fn exact_boundary_marks_last() {
        let p = paginate((0..6).collect::<Vec<_>>(), &PageRequest::new(1, 3).unwrap());
        assert_eq!(p.items, vec![3, 4, 5]);
        assert!(p.is_last);
        let p = paginate(Vec::<i32>::new(), &PageRequest::new(0, 3).unwrap());
        assert!(p.is_last);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn paginate_by_sorts_stably() {
        let items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        let p = paginate_by(items, &PageRequest::new(0, 3).unwrap(), |a, b| a.0.cmp(&b.0));
        assert_eq!(p.items, vec![(1, 'b'), (1, 'd'), (2, 'a')]);
        assert!(!p.is_last);
    }

    #[test]
    fn paginate_records_applies_the_request_sort() {
        use crate::database::schema::FieldDef;

        let schema = Schema::new("students").field(FieldDef::integer("marks"));
        let records: Vec<Record> = [70, 90, 35, 90]
            .iter()
            .enumerate()
            .map(|(i, marks)| {
                let mut record = Record::from_json(serde_json::json!({ "marks": marks })).unwrap();
                record.set_id(Some(i as i64 + 1));
                record
            })
            .collect();

        let sort = FilterOrder::parse_order_string("marks desc").unwrap();
        let request = PageRequest::new(0, 3).unwrap().with_sort(sort);
        let page = paginate_records(records.clone(), &request, &schema).unwrap();
        let ids: Vec<_> = page.items.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![Some(2), Some(4), Some(1)]);

        let bad = PageRequest::new(0, 3).unwrap().with_sort(FilterOrder::parse_order_string("nickname").unwrap());
        assert!(matches!(paginate_records(records, &bad, &schema), Err(FilterError::SchemaMismatch { .. })));
    }

    #[test]
    fn serializes_with_envelope_names() {
        let p = paginate(vec![1], &PageRequest::new(0, 5).unwrap()).map(|n| n * 10);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["content"], serde_json::json!([10]));
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["last"], true);
    }
}

use serde::Deserialize;

use crate::error::ApiError;
use crate::filter::filter_order::FilterOrder;
use crate::filter::SortSpec;
use crate::pager::PageRequest;

/// `?page=&size=&sort=` query parameters. `sort` accepts `marks,desc` or
/// `marks desc, student_name`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

impl PageParams {
    pub fn sort_spec(&self) -> Result<SortSpec, ApiError> {
        match &self.sort {
            Some(sort) => Ok(FilterOrder::parse_order_string(sort)?),
            None => Ok(SortSpec::unsorted()),
        }
    }

    /// A page request when either `page` or `size` was given.
    pub fn page_request(&self) -> Result<Option<PageRequest>, ApiError> {
        if self.page.is_none() && self.size.is_none() {
            return Ok(None);
        }
        let request = PageRequest::from_params(self.page, self.size)?.with_sort(self.sort_spec()?);
        Ok(Some(request))
    }
}

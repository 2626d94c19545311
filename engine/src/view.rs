//! Search, filter, sort and pagination over the user collection.

use crate::User;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Rows per page.
pub const PAGE_SIZE: usize = 10;

/// Email sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Cycle unsorted -> ascending -> descending -> unsorted.
    pub fn toggle(current: Option<SortOrder>) -> Option<SortOrder> {
        match current {
            None => Some(SortOrder::Asc),
            Some(SortOrder::Asc) => Some(SortOrder::Desc),
            Some(SortOrder::Desc) => None,
        }
    }
}

/// What the list screen is currently asking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Case-insensitive substring of the name.
    pub search: String,
    /// Exact company name; `None` shows every company.
    pub company: Option<String>,
    pub email_sort: Option<SortOrder>,
    /// 1-based page number.
    pub page: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            company: None,
            email_sort: None,
            page: 1,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn sort_by_email(mut self, order: SortOrder) -> Self {
        self.email_sort = Some(order);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Filter, sort and paginate `users`.
    pub fn apply<'a>(&self, users: &'a [User]) -> Page<'a> {
        let needle = self.search.to_lowercase();
        let mut rows: Vec<&User> = users
            .iter()
            .filter(|u| needle.is_empty() || u.name.to_lowercase().contains(&needle))
            .filter(|u| self.company.as_ref().map_or(true, |c| &u.company.name == c))
            .collect();

        if let Some(order) = self.email_sort {
            rows.sort_by(|a, b| {
                let ord = compare_email(&a.email, &b.email);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let total_items = rows.len();
        let total_pages = total_items.div_ceil(PAGE_SIZE).max(1);
        let page = self.page.clamp(1, total_pages);
        let items = rows
            .into_iter()
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect();

        Page {
            items,
            page,
            total_pages,
            total_items,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub items: Vec<&'a User>,
    /// The page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    /// Matches across all pages.
    pub total_items: usize,
}

impl Page<'_> {
    /// 1-based index range of the shown rows, for "showing 11-20 of 42".
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        let start = (self.page - 1) * PAGE_SIZE + 1;
        Some((start, start + self.items.len() - 1))
    }
}

/// Distinct company names, sorted.
pub fn companies(users: &[User]) -> Vec<String> {
    users
        .iter()
        .map(|u| u.company.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn compare_email(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

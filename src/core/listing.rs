//! Purpose: Project a record collection plus view state into one page of results.
//! Exports: `ListQueryState`, `CategoryFilter`, `SortOrder`, `Page`, `project`, and stage helpers.
//! Role: Pure list pipeline; callers re-invoke `project` whenever an input changes.
//! Invariants: Stages run search -> category -> sort -> paginate, each on the previous output.
//! Invariants: Sorting is stable; `total_pages` is never below 1.
//! Invariants: Changing search text or category returns the view to page 1.
use super::record::Record;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: usize = 6;
pub const ALL_CATEGORIES: &str = "all";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(raw: &str) -> Self {
        if raw == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(category) => category,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Unsorted,
    PriceAscending,
    PriceDescending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Unsorted => "none",
            SortOrder::PriceAscending => "asc",
            SortOrder::PriceDescending => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "none" => Ok(SortOrder::Unsorted),
            "asc" => Ok(SortOrder::PriceAscending),
            "desc" => Ok(SortOrder::PriceDescending),
            other => Err(format!("unknown sort order `{other}` (expected none|asc|desc)")),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListQueryState {
    search_text: String,
    category: CategoryFilter,
    sort: SortOrder,
    page: usize,
    page_size: usize,
}

impl Default for ListQueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListQueryState {
    /// A zero page size is bumped to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            search_text: String::new(),
            category: CategoryFilter::All,
            sort: SortOrder::Unsorted,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.search_text {
            self.search_text = text;
            self.page = 1;
        }
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        if category != self.category {
            self.category = category;
            self.page = 1;
        }
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self, total_pages: usize) -> bool {
        self.page < total_pages
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page<'a> {
    pub items: Vec<&'a Record>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
}

impl Page<'_> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub fn project<'a>(records: &'a [Record], state: &ListQueryState) -> Page<'a> {
    let matched = filter_by_search(records.iter(), &state.search_text);
    let mut matched = filter_by_category(matched, &state.category);
    sort_by_price(&mut matched, state.sort);
    let total_matches = matched.len();
    let total_pages = total_pages(total_matches, state.page_size);
    let page = state.page.clamp(1, total_pages);
    let items = page_slice(&matched, page, state.page_size).to_vec();
    Page {
        items,
        page,
        total_pages,
        total_matches,
    }
}

pub fn filter_by_search<'a, I>(records: I, search_text: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    if search_text.trim().is_empty() {
        return records.into_iter().collect();
    }
    let needle = search_text.to_lowercase();
    records
        .into_iter()
        .filter(|record| record.title.to_lowercase().contains(&needle))
        .collect()
}

pub fn filter_by_category<'a>(
    records: Vec<&'a Record>,
    category: &CategoryFilter,
) -> Vec<&'a Record> {
    match category {
        CategoryFilter::All => records,
        CategoryFilter::Only(wanted) => records
            .into_iter()
            .filter(|record| &record.category == wanted)
            .collect(),
    }
}

/// `slice::sort_by` is stable, so equal prices keep their incoming order.
pub fn sort_by_price(records: &mut [&Record], order: SortOrder) {
    match order {
        SortOrder::Unsorted => {}
        SortOrder::PriceAscending => records.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::PriceDescending => records.sort_by(|a, b| b.price.total_cmp(&a.price)),
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::{
        CategoryFilter, ListQueryState, SortOrder, filter_by_category, filter_by_search,
        page_slice, project, sort_by_price, total_pages,
    };
    use crate::core::record::Record;

    fn record(id: u64, title: &str, price: f64, category: &str) -> Record {
        Record {
            id,
            title: title.to_string(),
            price,
            description: String::new(),
            category: category.to_string(),
            image: format!("https://img.example/{id}.png"),
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            record(1, "Shirt", 20.0, "men"),
            record(2, "Shoe", 50.0, "men"),
            record(3, "Bag", 30.0, "women"),
        ]
    }

    fn mixed() -> Vec<Record> {
        vec![
            record(1, "Red Shirt", 15.0, "men"),
            record(2, "blue shirt", 15.0, "men"),
            record(3, "Ring", 99.0, "jewelery"),
            record(4, "SHIRT dress", 40.0, "women"),
            record(5, "Jacket", 15.0, "women"),
            record(6, "Backpack", 109.95, "men"),
            record(7, "Earrings", 9.99, "jewelery"),
        ]
    }

    fn ids(records: &[&Record]) -> Vec<u64> {
        records.iter().map(|record| record.id).collect()
    }

    #[test]
    fn category_then_ascending_sort_pages_by_one() {
        let records = sample();
        let mut state = ListQueryState::new(1);
        state.set_category(CategoryFilter::parse("men"));
        state.set_sort(SortOrder::PriceAscending);

        let page = project(&records, &state);
        assert_eq!(ids(&page.items), vec![1]);
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_prev());
        assert!(page.has_next());
    }

    #[test]
    fn search_is_case_insensitive() {
        let records = sample();
        let mut state = ListQueryState::default();
        state.set_search_text("sh");

        let page = project(&records, &state);
        assert_eq!(ids(&page.items), vec![1, 2]);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn search_matches_exactly_the_containing_titles_and_is_idempotent() {
        let records = mixed();
        for needle in ["shirt", "SHIRT", "r", "ring", "zzz"] {
            let once = filter_by_search(records.iter(), needle);
            let lowered = needle.to_lowercase();
            let expected: Vec<u64> = records
                .iter()
                .filter(|record| record.title.to_lowercase().contains(&lowered))
                .map(|record| record.id)
                .collect();
            assert_eq!(ids(&once), expected, "{needle}");

            let twice = filter_by_search(once.iter().copied(), needle);
            assert_eq!(ids(&twice), ids(&once), "{needle}");
        }
    }

    #[test]
    fn blank_search_keeps_everything_in_order() {
        let records = mixed();
        for needle in ["", "   ", "\t"] {
            let kept = filter_by_search(records.iter(), needle);
            assert_eq!(ids(&kept), vec![1, 2, 3, 4, 5, 6, 7]);
        }
    }

    #[test]
    fn category_filter_is_exact_and_all_is_identity() {
        let records = mixed();
        let all: Vec<&Record> = records.iter().collect();

        let men = filter_by_category(all.clone(), &CategoryFilter::parse("men"));
        assert!(men.iter().all(|record| record.category == "men"));
        assert_eq!(ids(&men), vec![1, 2, 6]);

        let upper = filter_by_category(all.clone(), &CategoryFilter::parse("Men"));
        assert!(upper.is_empty());

        let unchanged = filter_by_category(all.clone(), &CategoryFilter::All);
        assert_eq!(ids(&unchanged), ids(&all));
    }

    #[test]
    fn sort_is_stable_for_equal_prices() {
        let records = mixed();
        let mut ascending: Vec<&Record> = records.iter().collect();
        sort_by_price(&mut ascending, SortOrder::PriceAscending);
        assert_eq!(ids(&ascending), vec![7, 1, 2, 5, 4, 3, 6]);

        let mut descending: Vec<&Record> = records.iter().collect();
        sort_by_price(&mut descending, SortOrder::PriceDescending);
        assert_eq!(ids(&descending), vec![6, 3, 4, 1, 2, 5, 7]);

        let mut unsorted: Vec<&Record> = records.iter().collect();
        sort_by_price(&mut unsorted, SortOrder::Unsorted);
        assert_eq!(ids(&unsorted), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn pages_reconstruct_the_filtered_sequence() {
        let records = mixed();
        for page_size in 1..=8 {
            let mut state = ListQueryState::new(page_size);
            state.set_sort(SortOrder::PriceDescending);
            let first = project(&records, &state);
            assert_eq!(first.total_pages, total_pages(records.len(), page_size));
            assert_eq!(first.total_pages, records.len().div_ceil(page_size).max(1));

            let mut joined = Vec::new();
            for number in 1..=first.total_pages {
                state.set_page(number);
                let page = project(&records, &state);
                assert!(page.items.len() <= page_size);
                joined.extend(ids(&page.items));
            }
            assert_eq!(joined, vec![6, 3, 4, 1, 2, 5, 7], "page size {page_size}");
        }
    }

    #[test]
    fn empty_result_has_one_empty_page() {
        let records = sample();
        let mut state = ListQueryState::default();
        state.set_search_text("no such product");
        let page = project(&records, &state);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_matches, 0);

        let page = project(&[], &ListQueryState::default());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn filter_changes_reset_page_but_sort_does_not() {
        let mut state = ListQueryState::new(2);
        state.set_page(3);
        state.set_sort(SortOrder::PriceAscending);
        assert_eq!(state.page(), 3);

        state.set_search_text("shirt");
        assert_eq!(state.page(), 1);

        state.set_page(2);
        state.set_search_text("shirt");
        assert_eq!(state.page(), 2);

        state.set_category(CategoryFilter::parse("men"));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn out_of_range_page_is_clamped_for_display() {
        let records = mixed();
        let mut state = ListQueryState::new(3);
        state.set_page(9);
        let page = project(&records, &state);
        assert_eq!(page.page, 3);
        assert_eq!(ids(&page.items), vec![7]);
    }

    #[test]
    fn prev_and_next_stop_at_boundaries() {
        let mut state = ListQueryState::new(2);
        assert!(!state.can_prev());
        state.prev_page();
        assert_eq!(state.page(), 1);

        state.next_page(2);
        assert_eq!(state.page(), 2);
        assert!(!state.can_next(2));
        state.next_page(2);
        assert_eq!(state.page(), 2);
        assert!(state.can_prev());
    }

    #[test]
    fn page_slice_handles_bounds() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(page_slice(&items, 1, 2), &[1, 2]);
        assert_eq!(page_slice(&items, 3, 2), &[5]);
        assert!(page_slice(&items, 4, 2).is_empty());
    }

    #[test]
    fn sort_order_parses_cli_names() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::PriceAscending));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::PriceDescending));
        assert_eq!("none".parse::<SortOrder>(), Ok(SortOrder::Unsorted));
        assert!("price".parse::<SortOrder>().is_err());
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
    }
}

/// Page size applied when a request carries no usable `limit`.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Largest page size a request can ask for.
pub const MAX_PAGE_SIZE: usize = 200;

/// Effective page size for a raw `limit` parameter: non-positive values
/// fall back to the default, oversized values clamp to the maximum.
pub fn clamp_limit(limit: i64) -> usize {
    if limit <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        (limit as usize).min(MAX_PAGE_SIZE)
    }
}

/// Number of pages needed to list `total` items, `limit` per page.
pub fn total_pages(total: usize, limit: usize) -> usize {
    if total == 0 || limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// Effective page number: at least 1, and at most `total_pages` when there
/// is at least one page.
pub fn clamp_page(page: i64, total_pages: usize) -> usize {
    let page = if page < 1 { 1 } else { page as usize };
    if total_pages > 0 {
        page.min(total_pages)
    } else {
        page
    }
}

/// Half-open index bounds of `page` within a collection of `total` items.
pub fn page_bounds(page: usize, limit: usize, total: usize) -> (usize, usize) {
    let offset = page.saturating_sub(1).saturating_mul(limit);
    (offset.min(total), offset.saturating_add(limit).min(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(0), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(-3), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(200), 200);
        assert_eq!(clamp_limit(10000), MAX_PAGE_SIZE);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(10206, 200), 52);
    }

    #[test]
    fn page_clamps_into_range() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(-1, 5), 1);
        assert_eq!(clamp_page(3, 5), 3);
        assert_eq!(clamp_page(9, 5), 5);
        // no upper clamp without pages, but still at least one
        assert_eq!(clamp_page(7, 0), 7);
        assert_eq!(clamp_page(-7, 0), 1);
    }

    #[test]
    fn page_bounds_slice_the_collection() {
        assert_eq!(page_bounds(1, 20, 45), (0, 20));
        assert_eq!(page_bounds(2, 20, 45), (20, 40));
        assert_eq!(page_bounds(3, 20, 45), (40, 45));
        assert_eq!(page_bounds(4, 20, 45), (45, 45));
        assert_eq!(page_bounds(1, 20, 0), (0, 0));
    }
}

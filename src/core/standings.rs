use chrono::SecondsFormat;
use serde::Serialize;

use crate::core::store::{Store, UserId};
use crate::utils::{clamp_limit, clamp_page, page_bounds, total_pages};

/// One leaderboard row. Rank and rating are read live when the row is
/// assembled, so they can be newer than the ordering they appear in.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub username: String,
    pub rating: i32,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardPage {
    pub updated_at: String,
    pub total_users: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub entries: Vec<RankedEntry>,
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub count: usize,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub results: Vec<RankedEntry>,
}

fn ranked_entry(store: &Store, id: UserId) -> RankedEntry {
    let rating = store.rating(id);
    RankedEntry {
        rank: store.rank(rating),
        username: store.username(id).to_string(),
        rating,
    }
}

/// One page of the published leaderboard ordering. The snapshot may lag
/// behind the mutator by up to one publish period; the rank column is
/// recomputed per row at read time.
pub fn leaderboard_page(store: &Store, page: i64, limit: i64) -> LeaderboardPage {
    let limit = clamp_limit(limit);
    let total_users = store.user_count();
    let pages = total_pages(total_users, limit);
    let page = clamp_page(page, pages);

    let snapshot = store.snapshot();
    let (start, end) = page_bounds(page, limit, snapshot.len());
    let entries = snapshot[start..end]
        .iter()
        .map(|&id| ranked_entry(store, id))
        .collect();

    LeaderboardPage {
        updated_at: store
            .last_update()
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        total_users,
        page,
        page_size: limit,
        total_pages: pages,
        entries,
    }
}

/// Case-insensitive prefix search over the name index, results in
/// alphabetical order of the lowercase name. Whitespace-only queries match
/// nothing.
pub fn search_page(store: &Store, query: &str, page: i64, limit: i64) -> SearchPage {
    let limit = clamp_limit(limit);
    let prefix = query.trim().to_ascii_lowercase();
    if prefix.is_empty() {
        return SearchPage {
            query: query.to_string(),
            count: 0,
            total: 0,
            page: clamp_page(page, 0),
            page_size: limit,
            total_pages: 0,
            results: Vec::new(),
        };
    }

    let range = store.name_index().prefix_range(&prefix);
    let total = range.len();
    let pages = total_pages(total, limit);
    let page = clamp_page(page, pages);

    let (start, end) = page_bounds(page, limit, total);
    let results: Vec<RankedEntry> = store
        .name_index()
        .entries(range.start + start..range.start + end)
        .iter()
        .map(|entry| ranked_entry(store, entry.id))
        .collect();

    SearchPage {
        query: query.to_string(),
        count: results.len(),
        total,
        page,
        page_size: limit,
        total_pages: pages,
        results,
    }
}

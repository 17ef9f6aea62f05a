use std::sync::{
    atomic::{AtomicI32, AtomicI64, AtomicUsize, Ordering},
    Arc, Mutex, RwLock,
};

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::core::search::PrefixIndex;

pub const MIN_RATING: i32 = 100;
pub const MAX_RATING: i32 = 5000;
/// One bucket per representable rating.
pub const BUCKET_COUNT: usize = (MAX_RATING - MIN_RATING + 1) as usize;

/// Dense user identifier, assigned in seed order.
pub type UserId = u32;

/// Handle shared between the HTTP surface and the background jobs.
pub type SharedStore = Arc<Store>;

/// Username/rating pair consumed at seed time. Ratings outside the legal
/// range are clamped on ingestion.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: String,
    pub rating: i32,
}

pub fn clamp_rating(value: i32) -> i32 {
    value.clamp(MIN_RATING, MAX_RATING)
}

#[inline]
fn bucket_of(rating: i32) -> usize {
    (rating - MIN_RATING) as usize
}

/// Partition of user ids by current rating, with a back-reference from
/// each id to its slot so removal is a swap-with-last. Only ever touched
/// under the store's bucket lock.
struct BucketTable {
    members: Vec<Vec<UserId>>,
    slot_of: Vec<usize>,
}

impl BucketTable {
    fn with_capacity(users: usize) -> Self {
        Self {
            members: vec![Vec::new(); BUCKET_COUNT],
            slot_of: vec![0; users],
        }
    }

    fn push(&mut self, id: UserId, rating: i32) {
        let bucket = &mut self.members[bucket_of(rating)];
        self.slot_of[id as usize] = bucket.len();
        bucket.push(id);
    }

    fn remove(&mut self, id: UserId, rating: i32) {
        let bucket = &mut self.members[bucket_of(rating)];
        let pos = self.slot_of[id as usize];
        assert!(
            bucket.get(pos) == Some(&id),
            "user {id} not found in bucket for rating {rating}"
        );
        let last = bucket[bucket.len() - 1];
        bucket[pos] = last;
        self.slot_of[last as usize] = pos;
        bucket.pop();
    }
}

/// The ranking store: dense user tables, rating buckets with atomic size
/// counters, the immutable prefix index, and the published leaderboard
/// snapshot. A single writer mutates ratings while readers compute ranks
/// and page through the snapshot without blocking it.
pub struct Store {
    usernames: Vec<String>,
    usernames_lower: Vec<String>,
    ratings: Vec<AtomicI32>,
    // Mirrors the bucket lengths; read lock-free by the rank sweep.
    counts: Vec<AtomicUsize>,
    buckets: Mutex<BucketTable>,
    name_index: PrefixIndex,
    snapshot: RwLock<Arc<Vec<UserId>>>,
    // Unix milliseconds of the most recent applied rating change.
    last_update: AtomicI64,
}

impl Store {
    pub fn new(seeds: Vec<SeedUser>) -> Store {
        let total = seeds.len();
        let mut usernames = Vec::with_capacity(total);
        let mut usernames_lower = Vec::with_capacity(total);
        let mut ratings = Vec::with_capacity(total);
        let mut table = BucketTable::with_capacity(total);
        let mut counts = vec![0usize; BUCKET_COUNT];

        for (id, seed) in seeds.into_iter().enumerate() {
            let rating = clamp_rating(seed.rating);
            usernames_lower.push(seed.username.to_ascii_lowercase());
            usernames.push(seed.username);
            ratings.push(AtomicI32::new(rating));
            table.push(id as UserId, rating);
            counts[bucket_of(rating)] += 1;
        }

        let name_index = PrefixIndex::build(&usernames_lower);

        Store {
            usernames,
            usernames_lower,
            ratings,
            counts: counts.into_iter().map(AtomicUsize::new).collect(),
            buckets: Mutex::new(table),
            name_index,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            last_update: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    pub fn user_count(&self) -> usize {
        self.usernames.len()
    }

    pub fn username(&self, id: UserId) -> &str {
        &self.usernames[id as usize]
    }

    pub fn username_lower(&self, id: UserId) -> &str {
        &self.usernames_lower[id as usize]
    }

    pub fn rating(&self, id: UserId) -> i32 {
        self.ratings[id as usize].load(Ordering::Relaxed)
    }

    /// Number of users currently at exactly this rating.
    pub fn count_at(&self, rating: i32) -> usize {
        self.counts[bucket_of(clamp_rating(rating))].load(Ordering::Relaxed)
    }

    pub fn name_index(&self) -> &PrefixIndex {
        &self.name_index
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_update.load(Ordering::Relaxed))
            .unwrap_or_default()
    }

    fn touch_last_update(&self) {
        self.last_update
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Live global rank for a rating: one plus the number of users strictly
    /// above it. Equal ratings share a rank. The sweep reads the bucket
    /// counters without taking the lock, so a concurrent migration can skew
    /// the sum by the number of in-flight updates.
    pub fn rank(&self, rating: i32) -> usize {
        let rating = clamp_rating(rating);
        let above: usize = self.counts[bucket_of(rating) + 1..]
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .sum();
        above + 1
    }

    /// Move a user to a new rating. Bucket membership and counters change
    /// inside the critical section; the rating cell is stored after release,
    /// so a reader can briefly observe the old rating alongside the new
    /// counters.
    pub fn update_rating(&self, id: UserId, new_rating: i32) {
        let new_rating = clamp_rating(new_rating);
        let old_rating = self.rating(id);
        if old_rating == new_rating {
            return;
        }

        {
            let mut table = self.buckets.lock().expect("bucket lock poisoned");
            table.remove(id, old_rating);
            table.push(id, new_rating);
            self.counts[bucket_of(old_rating)].fetch_sub(1, Ordering::Relaxed);
            self.counts[bucket_of(new_rating)].fetch_add(1, Ordering::Relaxed);
        }

        self.ratings[id as usize].store(new_rating, Ordering::Relaxed);
    }

    /// Apply a batch of rating deltas, clamped into the legal range;
    /// deltas that do not change the clamped rating are skipped. Stamps
    /// the last-update instant when at least one rating moved, and returns
    /// how many did.
    pub fn apply_deltas<I>(&self, deltas: I) -> usize
    where
        I: IntoIterator<Item = (UserId, i32)>,
    {
        let mut applied = 0;
        for (id, delta) in deltas {
            let old_rating = self.rating(id);
            let new_rating = clamp_rating(old_rating + delta);
            if new_rating == old_rating {
                continue;
            }
            self.update_rating(id, new_rating);
            applied += 1;
        }
        if applied > 0 {
            self.touch_last_update();
        }
        applied
    }

    /// Full leaderboard ordering: descending rating, ties by lowercase
    /// username then id. Holds the bucket lock across the whole scan so
    /// every id is observed exactly once.
    fn build_snapshot(&self) -> Vec<UserId> {
        let table = self.buckets.lock().expect("bucket lock poisoned");
        let mut ordered = Vec::with_capacity(self.user_count());

        for bucket in table.members.iter().rev() {
            match bucket.len() {
                0 => {}
                1 => ordered.push(bucket[0]),
                _ => ordered.extend(bucket.iter().copied().sorted_unstable_by(|&a, &b| {
                    self.usernames_lower[a as usize]
                        .cmp(&self.usernames_lower[b as usize])
                        .then(a.cmp(&b))
                })),
            }
        }

        ordered
    }

    /// Rebuild and publish the snapshot. Publication is an `Arc` swap:
    /// readers keep whichever snapshot they already cloned and never see a
    /// partial one.
    pub fn refresh_snapshot(&self) {
        let ordered = Arc::new(self.build_snapshot());
        *self.snapshot.write().expect("snapshot lock poisoned") = ordered;
    }

    /// The most recently published leaderboard ordering. Empty until the
    /// first `refresh_snapshot` call.
    pub fn snapshot(&self) -> Arc<Vec<UserId>> {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Store {
        Store::new(
            [
                ("alice", 1500),
                ("bob", 1500),
                ("carol", 1700),
                ("dave", 900),
                ("eve", 5200),
            ]
            .into_iter()
            .map(|(username, rating)| SeedUser {
                username: username.to_string(),
                rating,
            })
            .collect(),
        )
    }

    fn assert_counts_match_ratings(store: &Store) {
        let mut expected = vec![0usize; BUCKET_COUNT];
        for id in 0..store.user_count() as UserId {
            expected[(store.rating(id) - MIN_RATING) as usize] += 1;
        }
        for rating in MIN_RATING..=MAX_RATING {
            assert_eq!(
                store.count_at(rating),
                expected[(rating - MIN_RATING) as usize],
                "bucket counter out of sync at rating {rating}"
            );
        }
    }

    #[test]
    fn seeding_clamps_and_counts() {
        let store = fixture();
        assert_eq!(store.user_count(), 5);
        // eve's 5200 is clamped on ingestion
        assert_eq!(store.rating(4), MAX_RATING);
        assert_eq!(store.count_at(1500), 2);
        assert_eq!(store.count_at(MAX_RATING), 1);
        let total: usize = (MIN_RATING..=MAX_RATING).map(|r| store.count_at(r)).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn ranks_count_strictly_higher_users() {
        let store = fixture();
        assert_eq!(store.rank(5000), 1);
        assert_eq!(store.rank(1700), 2);
        assert_eq!(store.rank(1500), 3);
        assert_eq!(store.rank(900), 5);
        assert_eq!(store.rank(100), 6);
        // out-of-range input is clamped before ranking
        assert_eq!(store.rank(9999), 1);
        assert_eq!(store.rank(-5), 6);
    }

    #[test]
    fn tied_users_share_a_rank() {
        let store = fixture();
        assert_eq!(store.rank(store.rating(0)), store.rank(store.rating(1)));
    }

    #[test]
    fn update_to_same_rating_is_a_noop() {
        let store = fixture();
        let before = store.last_update();
        store.update_rating(0, store.rating(0));
        assert_eq!(store.rating(0), 1500);
        assert_eq!(store.count_at(1500), 2);
        assert_eq!(store.last_update(), before);
        assert_counts_match_ratings(&store);
    }

    #[test]
    fn saturated_delta_changes_nothing() {
        let store = fixture();
        let applied = store.apply_deltas([(4, 50)]);
        assert_eq!(applied, 0);
        assert_eq!(store.rating(4), MAX_RATING);
        assert_eq!(store.count_at(MAX_RATING), 1);
        assert_counts_match_ratings(&store);
    }

    #[test]
    fn applied_deltas_move_buckets_and_stamp_time() {
        let store = fixture();
        let applied = store.apply_deltas([(3, 50), (3, 50)]);
        assert_eq!(applied, 2);
        assert_eq!(store.rating(3), 1000);
        assert_eq!(store.count_at(900), 0);
        assert_eq!(store.count_at(1000), 1);
        assert!(store.last_update() <= Utc::now());
        assert_counts_match_ratings(&store);
    }

    #[test]
    fn snapshot_orders_by_rating_then_name() {
        let store = fixture();
        store.refresh_snapshot();
        let names: Vec<&str> = store
            .snapshot()
            .iter()
            .map(|&id| store.username(id))
            .collect();
        assert_eq!(names, ["eve", "carol", "alice", "bob", "dave"]);
    }

    #[test]
    fn snapshot_follows_rating_moves() {
        let store = fixture();
        store.update_rating(1, 1700);
        store.refresh_snapshot();
        let names: Vec<&str> = store
            .snapshot()
            .iter()
            .map(|&id| store.username(id))
            .collect();
        assert_eq!(names, ["eve", "bob", "carol", "alice", "dave"]);
        assert_eq!(store.rank(1700), 2);
        assert_eq!(store.rank(1500), 4);
        assert_eq!(store.rank(900), 5);
    }

    #[test]
    fn snapshot_refresh_is_idempotent() {
        let store = fixture();
        store.refresh_snapshot();
        let first = store.snapshot();
        store.refresh_snapshot();
        let second = store.snapshot();
        assert_eq!(*first, *second);
    }

    #[test]
    fn snapshot_is_a_permutation() {
        let store = fixture();
        store.refresh_snapshot();
        let mut ids: Vec<UserId> = store.snapshot().to_vec();
        ids.sort_unstable();
        let expected: Vec<UserId> = (0..store.user_count() as UserId).collect();
        assert_eq!(ids, expected);
    }
}

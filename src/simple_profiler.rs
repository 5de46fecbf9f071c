//! Lightweight hot-path profiling with thread-local counters
//!
//! Guards are free when profiling is off. Enable with environment variable:
//! AMAZONS_PROFILE=1. Worker threads must call `merge_thread_local` before
//! the report is printed.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Timed categories, in report order
const CATEGORIES: [&str; 5] = ["move_gen", "eval", "flood_fill", "apply_play", "alpha_beta"];
const CATEGORY_COUNT: usize = CATEGORIES.len();

#[derive(Default, Clone, Copy)]
struct LocalCounters {
    time_ns: [u64; CATEGORY_COUNT],
    calls: [u64; CATEGORY_COUNT],
    cutoffs: u64,
    cache_lookups: u64,
    cache_hits: u64,
}

thread_local! {
    static LOCAL: RefCell<LocalCounters> = RefCell::new(LocalCounters::default());
}

struct GlobalCounters {
    time_ns: [AtomicU64; CATEGORY_COUNT],
    calls: [AtomicU64; CATEGORY_COUNT],
    cutoffs: AtomicU64,
    cache_lookups: AtomicU64,
    cache_hits: AtomicU64,
}

static GLOBAL: GlobalCounters = GlobalCounters {
    time_ns: [const { AtomicU64::new(0) }; CATEGORY_COUNT],
    calls: [const { AtomicU64::new(0) }; CATEGORY_COUNT],
    cutoffs: AtomicU64::new(0),
    cache_lookups: AtomicU64::new(0),
    cache_hits: AtomicU64::new(0),
};

static ENABLED: OnceLock<bool> = OnceLock::new();

#[inline]
pub fn is_profiling_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("AMAZONS_PROFILE").is_ok())
}

fn category_slot(category: &str) -> Option<usize> {
    CATEGORIES.iter().position(|c| *c == category)
}

pub struct ProfileGuard {
    start: Instant,
    slot: usize,
}

impl ProfileGuard {
    /// Starts timing `category`; unknown categories are not timed
    pub fn new(category: &'static str) -> Option<Self> {
        if !is_profiling_enabled() {
            return None;
        }
        category_slot(category).map(|slot| ProfileGuard {
            start: Instant::now(),
            slot,
        })
    }
}

impl Drop for ProfileGuard {
    fn drop(&mut self) {
        let elapsed_ns = self.start.elapsed().as_nanos() as u64;
        LOCAL.with(|local| {
            let mut local = local.borrow_mut();
            local.time_ns[self.slot] += elapsed_ns;
            local.calls[self.slot] += 1;
        });
    }
}

#[inline]
pub fn record_alpha_beta_cutoff() {
    if is_profiling_enabled() {
        LOCAL.with(|local| local.borrow_mut().cutoffs += 1);
    }
}

#[inline]
pub fn record_cache_lookup(hit: bool) {
    if is_profiling_enabled() {
        LOCAL.with(|local| {
            let mut local = local.borrow_mut();
            local.cache_lookups += 1;
            if hit {
                local.cache_hits += 1;
            }
        });
    }
}

/// Moves this thread's counters into the global totals
pub fn merge_thread_local() {
    if !is_profiling_enabled() {
        return;
    }
    let local = LOCAL.with(|local| std::mem::take(&mut *local.borrow_mut()));
    for slot in 0..CATEGORY_COUNT {
        GLOBAL.time_ns[slot].fetch_add(local.time_ns[slot], Ordering::Relaxed);
        GLOBAL.calls[slot].fetch_add(local.calls[slot], Ordering::Relaxed);
    }
    GLOBAL.cutoffs.fetch_add(local.cutoffs, Ordering::Relaxed);
    GLOBAL.cache_lookups.fetch_add(local.cache_lookups, Ordering::Relaxed);
    GLOBAL.cache_hits.fetch_add(local.cache_hits, Ordering::Relaxed);
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        100.0 * part as f64 / whole as f64
    } else {
        0.0
    }
}

pub fn print_report(total_time_ms: u64) {
    if !is_profiling_enabled() {
        return;
    }
    let total_ns = total_time_ms * 1_000_000;

    eprintln!("\n═══════════════════════════════════════════════════════════");
    eprintln!("                 PERFORMANCE PROFILE");
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!("Total Time: {}ms\n", total_time_ms);

    for (slot, name) in CATEGORIES.iter().enumerate() {
        let time_ns = GLOBAL.time_ns[slot].load(Ordering::Relaxed);
        let calls = GLOBAL.calls[slot].load(Ordering::Relaxed);
        let avg_us = if calls > 0 {
            time_ns as f64 / (calls * 1000) as f64
        } else {
            0.0
        };
        // nested guards overlap, so shares can add up to more than 100%
        eprintln!(
            "{:<12} {:>10.2}ms ({:>5.1}%) - {} calls, {:.2}µs avg",
            name,
            time_ns as f64 / 1_000_000.0,
            percent(time_ns, total_ns),
            calls,
            avg_us
        );
    }

    let nodes = category_slot("alpha_beta").map_or(0, |slot| GLOBAL.calls[slot].load(Ordering::Relaxed));
    let cutoffs = GLOBAL.cutoffs.load(Ordering::Relaxed);
    eprintln!("\nAlpha-Beta cutoffs: {} ({:.1}% of nodes)", cutoffs, percent(cutoffs, nodes));

    let lookups = GLOBAL.cache_lookups.load(Ordering::Relaxed);
    let hits = GLOBAL.cache_hits.load(Ordering::Relaxed);
    eprintln!("State Cache:");
    eprintln!("  Lookups:    {}", lookups);
    eprintln!("  Hits:       {} ({:.1}%)", hits, percent(hits, lookups));
    eprintln!("═══════════════════════════════════════════════════════════\n");
}

#[macro_export]
macro_rules! profile {
    ($category:expr, $code:block) => {{
        let _guard = $crate::simple_profiler::ProfileGuard::new($category);
        $code
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_have_slots() {
        for name in CATEGORIES {
            assert!(category_slot(name).is_some());
        }
        assert_eq!(category_slot("maxn"), None);
    }

    #[test]
    fn test_profile_macro_returns_block_value() {
        let value = crate::profile!("eval", { 40 + 2 });
        assert_eq!(value, 42);
    }

    fn first_even(values: &[i32]) -> Result<i32, String> {
        crate::profile!("move_gen", {
            for value in values {
                if value % 2 == 0 {
                    return Ok(*value);
                }
            }
            let fallback: Result<i32, String> = Err("no even value".to_string());
            fallback?;
            Ok(-1)
        })
    }

    #[test]
    fn test_profile_macro_keeps_early_exits() {
        assert_eq!(first_even(&[3, 8, 5]), Ok(8));
        assert_eq!(first_even(&[3]), Err("no even value".to_string()));
    }
}

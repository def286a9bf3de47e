use cache::TtlCache;
use std::sync::Arc;
use std::time::Duration;

const SWEEP: Duration = Duration::from_millis(100);

fn new_cache() -> TtlCache<String, String> {
    TtlCache::new(SWEEP)
}

#[tokio::test(start_paused = true)]
async fn test_get_after_set_returns_value() {
    let cache = new_cache();

    cache.set("key".to_string(), "value".to_string(), Duration::from_secs(60));

    assert_eq!(cache.get("key"), Some("value".to_string()));
    assert!(cache.has_key("key"));
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_entry_absent_within_two_sweep_intervals_after_ttl() {
    let cache = new_cache();
    let ttl = Duration::from_millis(250);

    cache.set("key".to_string(), "value".to_string(), ttl);
    tokio::time::sleep(ttl + SWEEP * 2).await;

    assert!(!cache.has_key("key"));
    assert_eq!(cache.get("key"), None);
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_visible_until_sweep_runs() {
    let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(10));

    cache.set("key".to_string(), 7, Duration::from_millis(50));
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(cache.get("key"), Some(7));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(cache.get("key"), None);
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_unexpired_entries_survive_sweeps() {
    let cache = new_cache();

    cache.set("short".to_string(), "a".to_string(), Duration::from_millis(50));
    cache.set("long".to_string(), "b".to_string(), Duration::from_secs(60));
    tokio::time::sleep(SWEEP * 5).await;

    assert!(!cache.has_key("short"));
    assert_eq!(cache.get("long"), Some("b".to_string()));
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_set_overwrites_previous_value() {
    let cache = new_cache();

    cache.set("key".to_string(), "v1".to_string(), Duration::from_secs(60));
    cache.set("key".to_string(), "v2".to_string(), Duration::from_secs(60));

    assert_eq!(cache.get("key"), Some("v2".to_string()));
    assert_eq!(cache.len(), 1);
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_refreshes_expiry() {
    let cache = new_cache();

    cache.set("key".to_string(), "v1".to_string(), Duration::from_millis(50));
    cache.set("key".to_string(), "v2".to_string(), Duration::from_secs(60));
    tokio::time::sleep(SWEEP * 3).await;

    assert_eq!(cache.get("key"), Some("v2".to_string()));
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_remove_is_idempotent() {
    let cache = new_cache();
    cache.set("present".to_string(), "value".to_string(), Duration::from_secs(60));

    cache.remove("absent");
    cache.remove("absent");

    assert_eq!(cache.len(), 1);
    assert!(cache.has_key("present"));

    cache.remove("present");
    cache.remove("present");
    assert!(cache.is_empty());
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_clear_removes_every_key() {
    let cache = new_cache();
    let keys: Vec<String> = (0..20).map(|i| format!("key-{i}")).collect();

    for key in &keys {
        cache.set(key.clone(), "value".to_string(), Duration::from_secs(60));
    }
    cache.clear();

    for key in &keys {
        assert!(!cache.has_key(key.as_str()));
    }
    assert!(cache.is_empty());

    cache.set("after".to_string(), "value".to_string(), Duration::from_secs(60));
    assert!(cache.has_key("after"));
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_remove_matching_keeps_other_keys() {
    let cache = new_cache();
    cache.set("doc:/a.yaml".to_string(), "a".to_string(), Duration::from_secs(60));
    cache.set("doc:/b.yaml".to_string(), "b".to_string(), Duration::from_secs(60));
    cache.set("session:42".to_string(), "s".to_string(), Duration::from_secs(60));

    cache.remove_matching(|key| key.starts_with("doc:"));

    assert!(!cache.has_key("doc:/a.yaml"));
    assert!(!cache.has_key("doc:/b.yaml"));
    assert_eq!(cache.get("session:42"), Some("s".to_string()));
    cache.close();
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_sweeping() {
    let cache = new_cache();
    cache.set("key".to_string(), "value".to_string(), Duration::from_millis(10));

    cache.close();
    tokio::time::sleep(SWEEP * 10).await;

    assert!(cache.is_closed());
    assert!(cache.has_key("key"));

    cache.set("other".to_string(), "value".to_string(), Duration::from_secs(1));
    assert_eq!(cache.get("other"), Some("value".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_independent_caches_close_independently() {
    let first = new_cache();
    let second = new_cache();

    first.set("key".to_string(), "first".to_string(), Duration::from_millis(10));
    second.set("key".to_string(), "second".to_string(), Duration::from_millis(10));

    first.close();
    tokio::time::sleep(SWEEP * 3).await;

    assert!(first.has_key("key"));
    assert!(!second.has_key("key"));
    second.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_does_not_corrupt() {
    let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::new(Duration::from_millis(5)));
    let mut handles = Vec::new();

    for worker in 0..8usize {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..500usize {
                let key = format!("key-{}", i % 16);
                cache.set(key.clone(), worker * 1000 + i, Duration::from_millis(2));
                let _ = cache.get(key.as_str());
                if i % 7 == 0 {
                    cache.remove(key.as_str());
                }
                if i % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    for handle in handles {
        handle.await.expect("worker should not panic");
    }

    assert!(cache.len() <= 16);
    cache.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_writers_leave_exactly_one_value() {
    let cache: Arc<TtlCache<String, usize>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
    let mut handles = Vec::new();

    for writer in 0..8usize {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            cache.set("shared".to_string(), writer, Duration::from_secs(60));
        }));
    }

    for handle in handles {
        handle.await.expect("writer should not panic");
    }

    let value = cache.get("shared").expect("one value must survive");
    assert!(value < 8);
    assert_eq!(cache.len(), 1);
    cache.close();
}

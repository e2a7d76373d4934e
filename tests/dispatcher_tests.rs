mod common;

use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{OpenPorts, Panicking, Scripted};
use sub_hunter::collector::{Collector, CollectorKind};
use sub_hunter::config::Config;
use sub_hunter::dispatcher::{run_stage, Dispatcher};
use sub_hunter::dns::StaticResolver;

fn config_without_validation() -> Arc<Config> {
    let mut cfg = Config::default();
    cfg.validation.enabled = false;
    Arc::new(cfg)
}

fn dispatcher(cfg: Arc<Config>) -> Dispatcher {
    let resolver = StaticResolver::new().with_a("www.example.com", &[Ipv4Addr::new(93, 184, 216, 34)]);
    Dispatcher::new(cfg, Arc::new(resolver), Arc::new(OpenPorts(vec![80])))
}

#[tokio::test]
async fn stage_concurrency_is_bounded() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let collectors: Vec<Arc<dyn Collector>> = (0..12)
        .map(|_| {
            Arc::new(
                Scripted::new("slow", CollectorKind::Dataset, &["a.example.com"])
                    .delayed(Duration::from_millis(20))
                    .sharing(&running, &peak),
            ) as Arc<dyn Collector>
        })
        .collect();
    let report = run_stage(&collectors, "example.com", 3, Duration::from_secs(30), false).await;
    assert_eq!(report.completed, 12);
    assert_eq!(report.subdomains.len(), 12);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn soft_timeout_skips_waiting_collectors_and_keeps_running_ones() {
    let mut d = dispatcher(config_without_validation());
    let slow = Scripted::new("slow", CollectorKind::Dataset, &["slow.example.com"]).delayed(Duration::from_millis(300));
    let queued = Scripted::new("queued", CollectorKind::Dataset, &["queued.example.com"]);
    let queued_calls = queued.calls.clone();
    d.register_module(Arc::new(slow));
    d.register_module(Arc::new(queued));
    d.set_stage_concurrency(CollectorKind::Dataset, 1);
    d.set_stage_timeout(CollectorKind::Dataset, Duration::from_millis(100));

    let out = d.run_all_modules("example.com").await.unwrap();
    assert_eq!(out.per_stage[&CollectorKind::Dataset], vec!["slow.example.com"]);
    assert_eq!(queued_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn brute_stage_ignores_timeout() {
    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(Scripted::new("b1", CollectorKind::Brute, &["a.example.com"]).delayed(Duration::from_millis(80))),
        Arc::new(Scripted::new("b2", CollectorKind::Brute, &["b.example.com"]).delayed(Duration::from_millis(80))),
    ];
    let report = run_stage(&collectors, "example.com", 1, Duration::from_millis(20), true).await;
    assert_eq!(report.completed, 2);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn panicking_collector_is_isolated() {
    let mut d = dispatcher(config_without_validation());
    d.register_module(Arc::new(Panicking(CollectorKind::Certificate)));
    d.register_module(Arc::new(Scripted::new("ok", CollectorKind::Certificate, &["api.example.com"])));
    let out = d.run_all_modules("example.com").await.unwrap();
    assert_eq!(out.per_stage[&CollectorKind::Certificate], vec!["api.example.com"]);
}

#[tokio::test]
async fn out_of_scope_names_are_dropped() {
    let mut d = dispatcher(config_without_validation());
    d.register_module(Arc::new(Scripted::new(
        "noisy",
        CollectorKind::Crawl,
        &["Shop.Example.com", "example.com", "evil.com", "bad name.example.com"],
    )));
    let out = d.run_all_modules("example.com").await.unwrap();
    assert_eq!(out.all_subdomains(), vec!["shop.example.com"]);
}

#[tokio::test]
async fn validation_runs_once_over_the_union() {
    let mut d = dispatcher(Arc::new(Config::default()));
    d.register_module(Arc::new(Scripted::new("a", CollectorKind::Dataset, &["www.example.com", "gone.example.com"])));
    d.register_module(Arc::new(Scripted::new("b", CollectorKind::Crawl, &["www.example.com"])));
    let out = d.run_all_modules("example.com").await.unwrap();
    assert_eq!(out.validation.len(), 2);
    let www = out.validation.iter().find(|v| v.subdomain == "www.example.com").unwrap();
    assert!(www.alive);
    assert_eq!(www.status_code, 200);
    let gone = out.validation.iter().find(|v| v.subdomain == "gone.example.com").unwrap();
    assert_eq!(gone.status_code, -1);
    // dead hosts stay in the stage lists
    assert_eq!(out.per_stage[&CollectorKind::Dataset].len(), 2);
}

#[tokio::test]
async fn run_lib_respects_brute_flag_and_annotates() {
    let mut d = dispatcher(Arc::new(Config::default()));
    let brute = Scripted::new("brute", CollectorKind::Brute, &["dev.example.com"]);
    let brute_calls = brute.calls.clone();
    d.register_module(Arc::new(brute));
    d.register_module(Arc::new(Scripted::new("ds", CollectorKind::Dataset, &["www.example.com"])));

    let options: HashMap<String, Value> =
        serde_json::from_value(json!({"enable_brute_force": false, "concurrency": 2, "timeout": 5})).unwrap();
    let results = d.run_lib("example.com", &options).await.unwrap();
    assert_eq!(brute_calls.load(Ordering::SeqCst), 0);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].subdomain, "www.example.com");
    assert_eq!(results[0].source, "dataset");
    assert!(results[0].alive);
    assert_eq!(results[0].ip, "93.184.216.34");
    assert_eq!(results[0].status_text, "Alive");
}

#[tokio::test]
async fn run_lib_without_validation_leaves_results_unchecked() {
    let mut d = dispatcher(Arc::new(Config::default()));
    d.register_module(Arc::new(Scripted::new("ds", CollectorKind::Dataset, &["www.example.com"])));
    let options: HashMap<String, Value> = serde_json::from_value(json!({"enable_validation": false})).unwrap();
    let results = d.run_lib("example.com", &options).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].alive);
    assert!(!results[0].dns_resolved);
}

#[tokio::test]
async fn run_lib_survives_out_of_range_options() {
    let mut d = dispatcher(Arc::new(Config::default()));
    d.register_module(Arc::new(Scripted::new("ds", CollectorKind::Dataset, &["www.example.com"])));
    let options: HashMap<String, Value> =
        serde_json::from_value(json!({"timeout": 1e20, "concurrency": u64::MAX})).unwrap();
    let results = d.run_lib("example.com", &options).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].alive);
}

#[tokio::test]
async fn tiny_timeout_still_skips_queued_collectors() {
    let mut d = dispatcher(config_without_validation());
    d.register_module(Arc::new(
        Scripted::new("slow", CollectorKind::Dataset, &["slow.example.com"]).delayed(Duration::from_millis(200)),
    ));
    let queued = Scripted::new("queued", CollectorKind::Dataset, &["queued.example.com"]);
    let queued_calls = queued.calls.clone();
    d.register_module(Arc::new(queued));
    let options: HashMap<String, Value> =
        serde_json::from_value(json!({"timeout": 1e-12, "concurrency": 1, "enable_validation": false})).unwrap();
    let results = d.run_lib("example.com", &options).await.unwrap();
    assert_eq!(queued_calls.load(Ordering::SeqCst), 0);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].subdomain, "slow.example.com");
}

#[tokio::test]
async fn candidates_carry_collector_and_completion_time() {
    let mut d = dispatcher(config_without_validation());
    d.register_module(Arc::new(Scripted::new("fast-ds", CollectorKind::Dataset, &["www.example.com"])));
    d.register_module(Arc::new(
        Scripted::new("late-cert", CollectorKind::Certificate, &["WWW.example.com", "mail.example.com"])
            .delayed(Duration::from_millis(150)),
    ));
    let started = chrono::Local::now();
    let out = d.run_all_modules("example.com").await.unwrap();
    let agg = d.aggregate("example.com", &out);

    assert_eq!(agg.total(), 2);
    let www = &agg.candidates[0];
    assert_eq!(www.subdomain, "www.example.com");
    assert_eq!(www.source, CollectorKind::Dataset);
    assert_eq!(www.collector, "fast-ds");
    let mail = &agg.candidates[1];
    assert_eq!(mail.subdomain, "mail.example.com");
    assert_eq!(mail.source, CollectorKind::Certificate);
    assert_eq!(mail.collector, "late-cert");
    assert!(www.discovered_at >= started);
    assert!(mail.discovered_at >= started + chrono::Duration::milliseconds(150));
    assert!(www.discovered_at < mail.discovered_at);
    // the later duplicate keeps its own record in the raw outcome
    assert_eq!(out.candidates.len(), 3);
}

mod common;

use std::net::Ipv4Addr;
use std::sync::Arc;

use common::{OpenPorts, Scripted};
use sub_hunter::collector::CollectorKind;
use sub_hunter::config::Config;
use sub_hunter::dns::StaticResolver;
use sub_hunter::{ScanError, ScanOptions, SubHunter};

fn hunter() -> SubHunter {
    let resolver = StaticResolver::new().with_a("www.example.com", &[Ipv4Addr::new(93, 184, 216, 34)]);
    SubHunter::with_parts(Config::default(), Arc::new(resolver), Arc::new(OpenPorts(vec![80])))
}

#[tokio::test]
async fn run_requires_a_target() {
    for target in ["", "   "] {
        let opts = ScanOptions { target: target.to_string(), ..ScanOptions::default() };
        let err = hunter().run(&opts).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ScanError>(), Some(ScanError::MissingTarget)));
    }
}

#[tokio::test]
async fn report_counts_alive_hosts() {
    let mut h = hunter();
    h.add_collector(Arc::new(Scripted::new(
        "ds",
        CollectorKind::Dataset,
        &["www.example.com", "old.example.com", "legacy.example.com", "ftp.example.com"],
    )));
    let opts = ScanOptions {
        enable_brute_force: false,
        ..ScanOptions::for_target("example.com")
    };
    let report = h.run(&opts).await.unwrap();
    assert_eq!(report.total_subdomains, 4);
    assert_eq!(report.alive_subdomains, 1);
    assert_eq!(report.alive_percentage, 25.0);
}

#[tokio::test]
async fn disabled_stages_are_left_out() {
    let mut h = hunter();
    h.add_collector(Arc::new(Scripted::new("ds", CollectorKind::Dataset, &["www.example.com"])));
    let opts = ScanOptions {
        enable_brute_force: false,
        disabled_stages: vec![CollectorKind::Dataset],
        ..ScanOptions::for_target("example.com")
    };
    let report = h.run(&opts).await.unwrap();
    assert_eq!(report.total_subdomains, 0);
}

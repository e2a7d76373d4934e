use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cli::{Cli, Commands};
use sub_hunter::collector::CollectorKind;
use sub_hunter::config::Config;
use sub_hunter::dispatcher::flatten_outcome;
use sub_hunter::error::validate_domain;
use sub_hunter::output::{export, Format};
use sub_hunter::utils::{ensure_dir, normalize_target, read_domains_file};
use sub_hunter::validate::ValidationStats;
use sub_hunter::{SubHunter, SubdomainResult};

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // External crates (reqwest/hyper/hickory) stay at info or warn whatever the crate level.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "sub_hunter={crate},reqwest=info,hyper=info,h2=info,hickory_proto=warn,hickory_resolver=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Modules { config } => {
            let config = Config::load(config.as_deref().map(Path::new))?;
            let hunter = SubHunter::new(config)?;
            for info in hunter.dispatcher()?.list_modules() {
                println!(
                    "{:<13} {:<8} concurrency={:<5} timeout={:>4}s  {}",
                    info.name,
                    if info.enabled { "enabled" } else { "disabled" },
                    info.concurrency,
                    info.timeout_secs,
                    info.collectors.join(", ")
                );
            }
        }
        Commands::Scan {
            target,
            out,
            format,
            concurrency,
            timeout,
            brute,
            no_validate,
            alive_only,
            wordlist,
            config,
            postprocess,
        } => {
            let mut config = Config::load(config.as_deref().map(Path::new))?;
            if no_validate {
                config.validation.enabled = false;
            }
            if let Some(w) = wordlist {
                config.brute.wordlist = PathBuf::from(w);
            }
            config.stages.brute_force.enabled = brute;
            if postprocess {
                config.postprocess.enabled = true;
            }

            let targets = if Path::new(&target).is_file() {
                read_domains_file(Path::new(&target))?
            } else {
                vec![normalize_target(&target)]
            };
            tracing::info!(targets = targets.len(), out = %out, brute, validate = config.validation.enabled, "Starting scan");

            let opts = ScanSettings { out: PathBuf::from(out), format, concurrency, timeout, alive_only };
            let hunter = SubHunter::new(config)?;
            for domain in targets {
                if let Err(e) = validate_domain(&domain) {
                    eprintln!("[!] Skipping {}: {}", domain, e);
                    continue;
                }
                if let Err(e) = scan_domain(&hunter, &domain, &opts).await {
                    eprintln!("[!] {} failed: {:#}", domain, e);
                }
            }
        }
    }
    Ok(())
}

struct ScanSettings {
    out: PathBuf,
    format: Format,
    concurrency: Option<usize>,
    timeout: Option<u64>,
    alive_only: bool,
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn scan_domain(hunter: &SubHunter, domain: &str, opts: &ScanSettings) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut dispatcher = hunter.dispatcher()?;
    for kind in CollectorKind::ALL {
        if let Some(c) = opts.concurrency {
            dispatcher.set_stage_concurrency(kind, c);
        }
        if let Some(t) = opts.timeout {
            dispatcher.set_stage_timeout(kind, Duration::from_secs(t));
        }
    }

    println!("[>] Target: {}", domain);
    let pb = spinner(format!("enumerating {}", domain));
    let outcome = dispatcher.run_all_modules(domain).await;
    pb.finish_and_clear();
    let outcome = outcome?;

    let results = flatten_outcome(&outcome);
    let stats = ValidationStats::from_results(&outcome.validation);
    println!(
        "[+] {}: {} subdomains, {} alive ({:.1}%) in {}s",
        domain,
        results.len(),
        stats.alive_domains,
        stats.alive_percentage,
        started.elapsed().as_secs()
    );

    ensure_dir(&opts.out)?;
    let selected: Vec<&SubdomainResult> = results.iter().filter(|r| !opts.alive_only || r.alive).collect();
    let path = export(&opts.out, domain, opts.format, &selected)?;
    println!("[+] Results written to {}", path.display());

    if hunter.config().postprocess.enabled {
        let hosts: Vec<String> = selected.iter().map(|r| r.subdomain.clone()).collect();
        let pb = spinner(format!("post-processing {} hosts", hosts.len()));
        let reduced = hunter.postprocess(&hosts).await;
        pb.finish_and_clear();
        match reduced? {
            Some(list) => {
                let refs: Vec<&SubdomainResult> = list.iter().collect();
                let pp_path = export(&opts.out, &format!("{}_postprocess", domain), opts.format, &refs)?;
                println!("[+] Post-processed {} -> {} hosts, written to {}", hosts.len(), list.len(), pp_path.display());
            }
            None => tracing::info!(hosts = hosts.len(), "below post-process threshold, nothing to reduce"),
        }
    }
    Ok(())
}

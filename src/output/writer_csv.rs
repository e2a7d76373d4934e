use csv::Writer;
use std::fs::File;
use std::path::Path;

use crate::model::SubdomainResult;

pub fn write_csv(path: &Path, items: &[&SubdomainResult]) -> anyhow::Result<()> {
    let f = File::create(path)?;
    let mut w = Writer::from_writer(f);
    w.write_record([
        "subdomain", "source", "time", "alive", "ip", "dns_resolved", "ping_alive", "status_code", "status_text",
        "provider", "title", "port",
    ])?;
    for it in items {
        w.write_record(&[
            it.subdomain.clone(),
            it.source.clone(),
            it.time.clone(),
            it.alive.to_string(),
            it.ip.clone(),
            it.dns_resolved.to_string(),
            it.ping_alive.to_string(),
            it.status_code.to_string(),
            it.status_text.clone(),
            it.provider.clone(),
            it.title.clone().unwrap_or_default(),
            it.port.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut r = SubdomainResult::unvalidated("www.example.com", "dataset");
        r.title = Some("Home, sweet home".into());
        write_csv(&path, &[&r]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("subdomain,source,time,alive"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("www.example.com,dataset,"));
        assert!(row.contains("\"Home, sweet home\""));
    }
}

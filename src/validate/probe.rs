use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// Reachability check for a single address and port.
#[async_trait]
pub trait TcpProber: Send + Sync {
    async fn probe(&self, ip: IpAddr, port: u16, timeout: Duration) -> bool;
}

/// Plain TCP connect; the connection is dropped as soon as it is open.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTcpProber;

#[async_trait]
impl TcpProber for TokioTcpProber {
    async fn probe(&self, ip: IpAddr, port: u16, timeout: Duration) -> bool {
        let addr = SocketAddr::new(ip, port);
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::trace!(%addr, error = %e, "connect refused");
                false
            }
            Err(_) => {
                tracing::trace!(%addr, "connect timed out");
                false
            }
        }
    }
}

/// Try `ports` in order and stop at the first that accepts.
pub async fn first_open_port(prober: &dyn TcpProber, ip: IpAddr, ports: &[u16], timeout: Duration) -> Option<u16> {
    for &port in ports {
        if prober.probe(ip, port, timeout).await {
            return Some(port);
        }
    }
    None
}

//! Default route, interface counters and internet reachability.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

use super::procfs;
use crate::core::config::{Config, Timeouts};
use crate::core::system_monitor::{ConnectivitySource, RoutingInfoSource};
use crate::error::{PulseError, Result};
use crate::platform::command::run_command;

const PROC_NET_ROUTE: &str = "/proc/net/route";

pub struct LinuxRouting {
    command_timeout: Duration,
}

impl LinuxRouting {
    pub fn new(timeouts: &Timeouts) -> Self {
        Self {
            command_timeout: Duration::from_millis(timeouts.command_ms),
        }
    }
}

/// Interface names end up in sysfs paths and command arguments
fn check_interface_name(interface: &str) -> Result<()> {
    let valid = !interface.is_empty()
        && interface.len() <= 15
        && interface
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(PulseError::invalid_input(format!(
            "invalid interface name '{}'",
            interface
        )))
    }
}

#[async_trait]
impl RoutingInfoSource for LinuxRouting {
    async fn default_interface(&self) -> Result<Option<String>> {
        let content = tokio::fs::read_to_string(PROC_NET_ROUTE).await?;
        Ok(procfs::parse_default_route(&content))
    }

    async fn interface_counters(&self, interface: &str) -> Result<(u64, u64)> {
        check_interface_name(interface)?;
        let base = format!("/sys/class/net/{}/statistics", interface);
        let (rx, tx) = tokio::try_join!(
            tokio::fs::read_to_string(format!("{}/rx_bytes", base)),
            tokio::fs::read_to_string(format!("{}/tx_bytes", base)),
        )?;
        Ok((procfs::parse_counter(&rx)?, procfs::parse_counter(&tx)?))
    }

    async fn local_ip(&self, interface: &str) -> Result<String> {
        check_interface_name(interface)?;
        let output = run_command("ip", &["-4", "addr", "show", interface], self.command_timeout).await?;
        Ok(procfs::parse_inet_address(&output))
    }
}

/// Reachability via a TCP handshake and public address via an HTTP lookup
pub struct InternetProbe {
    client: reqwest::Client,
    target: String,
    public_ip_url: String,
    connect_timeout: Duration,
}

impl InternetProbe {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeouts.public_ip_ms))
            .user_agent(concat!("hostpulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            target: config.connectivity_target.clone(),
            public_ip_url: config.public_ip_url.clone(),
            connect_timeout: Duration::from_millis(config.timeouts.connectivity_ms),
        })
    }
}

#[async_trait]
impl ConnectivitySource for InternetProbe {
    async fn has_internet(&self) -> Result<bool> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => {
                log::debug!("Connectivity check to {} failed: {}", self.target, e);
                Ok(false)
            }
            Err(_) => Ok(false),
        }
    }

    async fn public_ip(&self) -> Result<String> {
        let body = self
            .client
            .get(&self.public_ip_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let ip = body.trim();
        if ip.parse::<std::net::IpAddr>().is_err() {
            return Err(PulseError::parse(format!(
                "public IP service returned '{}'",
                ip
            )));
        }
        Ok(ip.to_string())
    }
}

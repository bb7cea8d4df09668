//! `pinget probe <host>`: show the leaf fingerprint to pin.

use anyhow::{Context, Result};
use pinget_core::config::PingetConfig;
use pinget_core::pin::{LeafProbe, TlsProbe};
use std::time::Duration;

pub fn run_probe(cfg: &PingetConfig, host: &str, port: u16) -> Result<()> {
    let probe = TlsProbe::new(Duration::from_secs(cfg.transport.probe_timeout_secs));
    let fingerprint = probe
        .leaf_fingerprint(host, port)
        .with_context(|| format!("probing {}:{}", host, port))?;
    println!("{}  {}:{}", fingerprint, host, port);
    Ok(())
}

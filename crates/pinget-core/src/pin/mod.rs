//! Leaf certificate pinning.
//!
//! Authenticity comes from comparing the SHA-256 of the leaf certificate the
//! server presents against a known pin, not from chain-of-trust validation.

mod fingerprint;
mod probe;

pub use fingerprint::{Fingerprint, InvalidFingerprint};
pub use probe::{ProbeError, TlsProbe};

/// Source of the leaf fingerprint currently presented by a host.
pub trait LeafProbe {
    fn leaf_fingerprint(&self, host: &str, port: u16) -> Result<Fingerprint, ProbeError>;
}

impl<P: LeafProbe + ?Sized> LeafProbe for &P {
    fn leaf_fingerprint(&self, host: &str, port: u16) -> Result<Fingerprint, ProbeError> {
        (**self).leaf_fingerprint(host, port)
    }
}

/// Outcome of comparing the observed leaf against the pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinCheck {
    Match,
    Mismatch { observed: Fingerprint },
}

/// Probes `host:port` once and compares the leaf fingerprint to `pin`.
pub fn check_pin<P: LeafProbe + ?Sized>(
    probe: &P,
    host: &str,
    port: u16,
    pin: &Fingerprint,
) -> Result<PinCheck, ProbeError> {
    let observed = probe.leaf_fingerprint(host, port)?;
    if &observed == pin {
        Ok(PinCheck::Match)
    } else {
        Ok(PinCheck::Mismatch { observed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl LeafProbe for Fixed {
        fn leaf_fingerprint(&self, _host: &str, _port: u16) -> Result<Fingerprint, ProbeError> {
            Ok(Fingerprint::of_der(self.0.as_bytes()))
        }
    }

    #[test]
    fn check_pin_match_and_mismatch() {
        let pin = Fingerprint::of_der(b"leaf");
        assert_eq!(check_pin(&Fixed("leaf"), "h", 443, &pin).unwrap(), PinCheck::Match);
        match check_pin(&Fixed("other"), "h", 443, &pin).unwrap() {
            PinCheck::Mismatch { observed } => {
                assert_eq!(observed, Fingerprint::of_der(b"other"))
            }
            PinCheck::Match => panic!("expected mismatch"),
        }
    }
}

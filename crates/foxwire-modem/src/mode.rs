use std::fmt;
use std::str::FromStr;

/// Operating mode: the modulation schemes the external modem can run.
///
/// The authoritative value is owned by the modem; this enum mirrors the
/// names fldigi reports. Every `set_mode` request is validated against the
/// modem's live supported set before it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Psk31,
    Psk63,
    Psk125,
    Psk250,
    Rtty,
    Cw,
    Mfsk16,
    Olivia,
    Thor16,
    Mt63_500,
}

impl Mode {
    /// All modes this client understands.
    pub const ALL: [Mode; 10] = [
        Mode::Psk31,
        Mode::Psk63,
        Mode::Psk125,
        Mode::Psk250,
        Mode::Rtty,
        Mode::Cw,
        Mode::Mfsk16,
        Mode::Olivia,
        Mode::Thor16,
        Mode::Mt63_500,
    ];

    /// The mode name as fldigi spells it.
    pub fn as_name(self) -> &'static str {
        match self {
            Mode::Psk31 => "BPSK31",
            Mode::Psk63 => "BPSK63",
            Mode::Psk125 => "BPSK125",
            Mode::Psk250 => "BPSK250",
            Mode::Rtty => "RTTY",
            Mode::Cw => "CW",
            Mode::Mfsk16 => "MFSK16",
            Mode::Olivia => "OLIVIA",
            Mode::Thor16 => "THOR16",
            Mode::Mt63_500 => "MT63-500",
        }
    }

    /// Look up a mode by its modem-reported name, case-insensitively.
    /// Returns `None` for modes this client does not model.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name())
    }
}

impl FromStr for Mode {
    type Err = UnknownModeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownModeName(s.to_string()))
    }
}

/// A mode name outside the set this client models.
#[derive(Debug, thiserror::Error)]
#[error("unknown mode name '{0}'")]
pub struct UnknownModeName(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_name(mode.as_name()), Some(mode));
        }
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Mode::from_name("bpsk31"), Some(Mode::Psk31));
        assert_eq!(Mode::from_name(" rtty "), Some(Mode::Rtty));
    }

    #[test]
    fn unknown_name_rejected() {
        assert_eq!(Mode::from_name("FT8"), None);
        assert!("FT8".parse::<Mode>().is_err());
    }

    #[test]
    fn display_matches_modem_spelling() {
        assert_eq!(Mode::Mt63_500.to_string(), "MT63-500");
    }
}

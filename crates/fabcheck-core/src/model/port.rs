// ── Front-panel ports ──

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Network operating system running on a switch. Determines how the
/// controller expects port names in segment membership payloads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Nos {
    /// Accton OS: ports carry an explicit tagging suffix (`46/tag`).
    #[default]
    Aos,
    /// Open Network Linux / OpenFlow agent: bare port numbers, tagging is
    /// implied by the segment.
    Onl,
}

/// A physical front port, addressed by number.
///
/// Built per test and adjusted with the by-value setters; nothing is
/// shared between test cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: u32,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub tagged: bool,
    #[serde(default)]
    pub nos: Nos,
}

impl Port {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            device_id: None,
            tagged: false,
            nos: Nos::default(),
        }
    }

    pub fn on_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn tagged(mut self, tagged: bool) -> Self {
        self.tagged = tagged;
        self
    }

    pub fn nos(mut self, nos: Nos) -> Self {
        self.nos = nos;
        self
    }

    /// Name used in segment membership (`"46/untag"`, `"49/tag"`).
    pub fn name(&self) -> String {
        match self.nos {
            Nos::Aos => {
                let mode = if self.tagged { "tag" } else { "untag" };
                format!("{}/{mode}", self.number)
            }
            Nos::Onl => self.number.to_string(),
        }
    }

    /// `device/port` form used by policy-route ingress ports.
    pub fn qualified(&self) -> Option<String> {
        self.device_id
            .as_ref()
            .map(|dev| format!("{dev}/{}", self.number))
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aos_port_names_carry_tagging() {
        assert_eq!(Port::new(46).name(), "46/untag");
        assert_eq!(Port::new(49).tagged(true).name(), "49/tag");
    }

    #[test]
    fn onl_port_names_are_bare() {
        assert_eq!(Port::new(3).tagged(true).nos(Nos::Onl).name(), "3");
    }

    #[test]
    fn qualified_requires_device() {
        assert_eq!(Port::new(1).qualified(), None);
        assert_eq!(
            Port::new(1).on_device("of:1").qualified().as_deref(),
            Some("of:1/1")
        );
    }

    #[test]
    fn nos_parses_case_insensitively() {
        assert_eq!("ONL".parse::<Nos>().ok(), Some(Nos::Onl));
    }
}

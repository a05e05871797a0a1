//! The static device catalog: name -> device number, grouped, with optional
//! argument metadata. Grounded in the historical Grogono-1973 device list
//! (`devices.py` in the original simulator); treated here as ordinary injected
//! data rather than anything the evaluator hardcodes, so an embedding
//! application can swap in its own catalog wholesale (see `DeviceTable::from_entries`).

use std::collections::HashMap;

use crate::error::LoadError;

/// Bit width and unit label for a device argument, e.g. T1's "wait" parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentMeta {
    pub name: String,
    pub bits: u8,
    pub units: String,
}

/// One row of the catalog. Several names may share an id (`L1` and `A1` both 12);
/// that's intentional, not a collision to reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub id: u8,
    pub group: String,
    pub description: String,
    pub argument: Option<ArgumentMeta>,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceTable {
    by_name: HashMap<String, DeviceEntry>,
}

impl DeviceTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, DeviceEntry)>) -> Self {
        DeviceTable {
            by_name: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DeviceEntry> {
        self.by_name.get(name)
    }

    pub fn id_of(&self, name: &str) -> Option<u8> {
        self.get(name).map(|e| e.id)
    }

    /// Names sharing a given device id, sorted for stable output.
    pub fn names_for_id(&self, id: u8) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_name
            .iter()
            .filter(|(_, e)| e.id == id)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Parses a device-catalog override file: `NAME NUMBER GROUP... DESCRIPTION`,
    /// one entry per line, blank lines and `#`-comments skipped. `GROUP` is taken
    /// as the first whitespace-separated word after the number, the remainder of
    /// the line is the description.
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let mut by_name = HashMap::new();
        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(3, char::is_whitespace);
            let name = parts.next().unwrap_or("");
            let number = parts.next().unwrap_or("").trim();
            let rest = parts.next().unwrap_or("").trim();
            let id: u8 = number.parse().map_err(|_| LoadError::MalformedDeviceEntry {
                line: raw_line.to_string(),
            })?;
            if name.is_empty() {
                return Err(LoadError::MalformedDeviceEntry {
                    line: raw_line.to_string(),
                });
            }
            let mut rest_parts = rest.splitn(2, char::is_whitespace);
            let group = rest_parts.next().unwrap_or("").to_string();
            let description = rest_parts.next().unwrap_or("").trim().to_string();
            by_name.insert(
                name.to_string(),
                DeviceEntry {
                    id,
                    group,
                    description,
                    argument: None,
                },
            );
        }
        Ok(DeviceTable { by_name })
    }

    /// The catalog shipped with the interpreter, transcribed from the Grogono-1973
    /// device list plus the `K1` entry the spec's worked emission example needs.
    pub fn default_catalog() -> Self {
        let mut entries: Vec<(String, DeviceEntry)> = Vec::new();
        let mut push = |name: &str, id: u8, group: &str, desc: &str| {
            entries.push((
                name.to_string(),
                DeviceEntry {
                    id,
                    group: group.to_string(),
                    description: desc.to_string(),
                    argument: None,
                },
            ));
        };
        push("O1", 1, "Oscillators", "Oscillator");
        push("O2", 2, "Oscillators", "Oscillator");
        push("O3", 2, "Oscillators", "Oscillator");
        push("L1", 12, "Amplifiers", "Loudness amplifier 1");
        push("L2", 13, "Amplifiers", "Loudness amplifier 2");
        push("L3", 14, "Amplifiers", "Loudness amplifier 3");
        push("A1", 12, "Amplifiers", "Gain amplifier 1");
        push("A2", 13, "Amplifiers", "Gain amplifier 2");
        push("E1", 24, "Envelope shapers", "Envelope shaper 1");
        push("E2", 25, "Envelope shapers", "Envelope shaper 2");
        push("E3", 26, "Envelope shapers", "Envelope shaper 3");
        push("K1", 8, "Keyers", "Keyer 1");
        entries.push((
            "T1".to_string(),
            DeviceEntry {
                id: 60,
                group: "Timers".to_string(),
                description: "Timer 1: Wait timer".to_string(),
                argument: Some(ArgumentMeta {
                    name: "wait".to_string(),
                    bits: 6,
                    units: "interrupts".to_string(),
                }),
            },
        ));
        push("T2", 61, "Timers", "Timer 2");
        entries.push((
            "T3".to_string(),
            DeviceEntry {
                id: 62,
                group: "Timers".to_string(),
                description: "Timer 3: HW clock interrupt, 0.25Hz - 16KHz".to_string(),
                argument: Some(ArgumentMeta {
                    name: "rate".to_string(),
                    bits: 6,
                    units: "interrupts / second".to_string(),
                }),
            },
        ));
        DeviceTable::from_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_resolves_worked_example_codes() {
        let table = DeviceTable::default_catalog();
        assert_eq!(table.id_of("K1"), Some(8));
        assert_eq!(table.id_of("O1"), Some(1));
    }

    #[test]
    fn shared_ids_are_not_an_error() {
        let table = DeviceTable::default_catalog();
        let mut names = table.names_for_id(12);
        names.sort_unstable();
        assert_eq!(names, vec!["A1", "L1"]);
    }

    #[test]
    fn parse_skips_blank_and_comment_lines() {
        let table = DeviceTable::parse("# comment\n\nX1 5 Custom A test device\n").unwrap();
        assert_eq!(table.id_of("X1"), Some(5));
        assert_eq!(table.get("X1").unwrap().group, "Custom");
    }

    #[test]
    fn parse_rejects_non_numeric_id() {
        assert!(DeviceTable::parse("X1 five Custom\n").is_err());
    }
}

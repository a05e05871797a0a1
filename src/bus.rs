//! The six output buses. Each is an ordered list of 4-character octal words;
//! 6-bit emissions arrive as 2-character fragments and pair up into a word,
//! 12-bit emissions arrive whole and never touch the pending fragment.

pub const BUS_COUNT: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct Bus {
    words: Vec<String>,
    pending: Option<String>,
}

impl Bus {
    /// `digits` is a 2- or 4-character octal string (see [`crate::engine`] for
    /// how values are converted to that form before reaching here).
    pub fn send(&mut self, digits: &str) {
        debug_assert!(digits.len() == 2 || digits.len() == 4);
        match self.pending.take() {
            Some(pending) => self.words.push(format!("{pending}{digits}")),
            None if digits.len() == 2 => self.pending = Some(digits.to_string()),
            None => self.words.push(digits.to_string()),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct BusBuffer {
    buses: [Bus; BUS_COUNT],
}

impl Default for BusBuffer {
    fn default() -> Self {
        BusBuffer {
            buses: std::array::from_fn(|_| Bus::default()),
        }
    }
}

impl BusBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` is 1-based, matching the "currently-selected bus: integer 1..6" of the data model.
    pub fn send(&mut self, n: usize, digits: &str) {
        self.buses[n - 1].send(digits);
    }

    pub fn bus(&self, n: usize) -> &Bus {
        &self.buses[n - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bus> {
        self.buses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_bit_pairs_coalesce_into_twelve_bit_words() {
        let mut buffer = BusBuffer::new();
        buffer.send(1, "01");
        buffer.send(1, "10");
        assert_eq!(buffer.bus(1).words(), &["0110".to_string()]);
        assert!(!buffer.bus(1).has_pending());
    }

    #[test]
    fn twelve_bit_emission_stands_alone() {
        let mut buffer = BusBuffer::new();
        buffer.send(1, "1750");
        assert_eq!(buffer.bus(1).words(), &["1750".to_string()]);
    }

    #[test]
    fn worked_example_scenario_six() {
        // "O.K1. 1000:$" -> bus 1 == ["0010", "1750"]
        let mut buffer = BusBuffer::new();
        buffer.send(1, "00"); // bare variable O (unset) emitted 6-bit
        buffer.send(1, "10"); // device K1 = 8, emitted 6-bit
        buffer.send(1, "1750"); // 1000 decimal emitted 12-bit
        assert_eq!(
            buffer.bus(1).words(),
            &["0010".to_string(), "1750".to_string()]
        );
    }

    #[test]
    fn odd_count_of_six_bit_emissions_leaves_one_pending() {
        let mut buffer = BusBuffer::new();
        for _ in 0..5 {
            buffer.send(2, "07");
        }
        assert_eq!(buffer.bus(2).words().len(), 2);
        assert!(buffer.bus(2).has_pending());
    }
}

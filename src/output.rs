//! Serializes the six finished buses to disk: one line per bus, its words
//! space-joined, an empty bus producing an empty line so downstream tooling
//! can rely on exactly six lines regardless of how much a run actually emitted.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::bus::BusBuffer;
use crate::error::OutputError;

pub fn write_buses(buses: &BusBuffer, path: &Path) -> Result<(), OutputError> {
    let mut file = File::create(path).map_err(|source| OutputError::Unwritable {
        path: path.display().to_string(),
        source,
    })?;
    for bus in buses.iter() {
        writeln!(file, "{}", bus.words().join(" ")).map_err(|source| OutputError::Unwritable {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusBuffer;

    #[test]
    fn writes_six_lines_one_per_bus() {
        let mut buses = BusBuffer::new();
        buses.send(1, "1750");
        buses.send(3, "0010");

        let dir = std::env::temp_dir().join(format!("musys-output-test-{:p}", &buses));
        write_buses(&buses, &dir).unwrap();

        let contents = std::fs::read_to_string(&dir).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "1750");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "0010");

        let _ = std::fs::remove_file(&dir);
    }
}

//! Interactive input stage: ask for each field a calculation reads.

use std::io::{BufRead, Write};

use tab_core::errors::{CalcError, CalcResult};
use tab_core::measurement::{Field, MeasurementRecord};
use tab_core::project::TabSettings;
use tab_core::runner::{duct_geometry, field_unit, CalculationKind, Requirement};
use tracing::debug;

/// Fields that together describe a duct cross-section, in asking order
const DUCT_GEOMETRY: [Field; 4] = [Field::DuctArea, Field::DuctWidth, Field::DuctHeight, Field::DuctDiameter];

/// Reads readings line by line, re-asking until each value parses.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    at_end: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter {
            input,
            output,
            at_end: false,
        }
    }

    /// Collect a record for `kind`, in the calculation's field order.
    ///
    /// A blank line skips an optional field. Malformed or out-of-range
    /// values are reported and asked again. Closing the input before a
    /// required field is answered is a `MissingField` error.
    pub fn collect(&mut self, kind: CalculationKind, settings: &TabSettings) -> CalcResult<MeasurementRecord> {
        self.say(&format!("{}: enter readings, blank to skip optional values", kind.display_name()))?;

        let mut record = MeasurementRecord::new();
        for &(field, requirement) in kind.fields() {
            if kind == CalculationKind::DuctAirflow && DUCT_GEOMETRY.contains(&field) {
                if field == DUCT_GEOMETRY[0] {
                    self.collect_geometry(&mut record, settings)?;
                }
                continue;
            }
            if let Some(value) = self.ask(field, requirement, settings)? {
                record.insert(field, value)?;
            }
        }
        debug!(calculation = %kind, fields = record.len(), "prompted record complete");
        Ok(record)
    }

    /// Ask for duct dimensions until one description is complete.
    ///
    /// Each field is optional on its own, but skipping them all (or giving
    /// half a rectangle) starts the group again.
    fn collect_geometry(&mut self, record: &mut MeasurementRecord, settings: &TabSettings) -> CalcResult<()> {
        loop {
            for field in DUCT_GEOMETRY {
                if already_described(record, field) {
                    continue;
                }
                if let Some(value) = self.ask(field, Requirement::Optional, settings)? {
                    record.insert(field, value)?;
                }
            }

            let err = match duct_geometry(record) {
                Ok(_) => return Ok(()),
                Err(e) => e,
            };
            if self.at_end {
                return Err(err);
            }
            for field in DUCT_GEOMETRY {
                record.remove(field);
            }
            self.say(&format!("  {}; enter a duct area, width and height, or diameter.", err))?;
        }
    }

    fn ask(&mut self, field: Field, requirement: Requirement, settings: &TabSettings) -> CalcResult<Option<f64>> {
        let unit = field_unit(field, settings);
        let mut prompt = field.label().to_string();
        if !unit.is_empty() {
            prompt.push_str(&format!(" ({})", unit));
        }
        if requirement == Requirement::Optional {
            prompt.push_str(" [optional]");
        }
        prompt.push_str(": ");

        loop {
            write!(self.output, "{}", prompt).map_err(output_error)?;
            self.output.flush().map_err(output_error)?;

            let Some(line) = self.read_line()? else {
                return match requirement {
                    Requirement::Required => Err(CalcError::missing_field(field.name())),
                    Requirement::Optional => Ok(None),
                };
            };

            if line.trim().is_empty() {
                match requirement {
                    Requirement::Optional => return Ok(None),
                    Requirement::Required => {
                        self.say(&format!("  {} is required.", field.label()))?;
                        continue;
                    }
                }
            }

            match field.parse_value(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) if e.is_input_error() => self.say(&format!("  {}; try again.", e))?,
                Err(e) => return Err(e),
            }
        }
    }

    /// Next line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> CalcResult<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| CalcError::file_error("read", "<stdin>", e.to_string()))?;
        if read == 0 {
            self.at_end = true;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, text: &str) -> CalcResult<()> {
        writeln!(self.output, "{}", text).map_err(output_error)
    }
}

fn output_error(e: std::io::Error) -> CalcError {
    CalcError::file_error("write", "<stdout>", e.to_string())
}

/// Duct dimensions are only asked for until one description is complete.
fn already_described(record: &MeasurementRecord, field: Field) -> bool {
    let has_area = record.contains(Field::DuctArea);
    let has_rect = record.contains(Field::DuctWidth) && record.contains(Field::DuctHeight);
    match field {
        Field::DuctWidth | Field::DuctHeight => has_area,
        Field::DuctDiameter => has_area || has_rect,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(kind: CalculationKind, answers: &str) -> (CalcResult<MeasurementRecord>, String) {
        let mut output = Vec::new();
        let result = {
            let mut prompter = Prompter::new(Cursor::new(answers.as_bytes()), &mut output);
            prompter.collect(kind, &TabSettings::default())
        };
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_collects_required_fields() {
        let (record, output) = prompt(CalculationKind::PercentOfDesign, "1000\n950\n");
        let record = record.unwrap();
        assert_eq!(record.get(Field::DesignCfm), Some(1000.0));
        assert_eq!(record.get(Field::MeasuredCfm), Some(950.0));
        assert!(output.contains("Design airflow (CFM): "));
    }

    #[test]
    fn test_reprompts_on_malformed_value() {
        let (record, output) = prompt(CalculationKind::PercentOfDesign, "abc\n1000\n-5\n950\n");
        let record = record.unwrap();
        assert_eq!(record.get(Field::MeasuredCfm), Some(950.0));
        assert_eq!(output.matches("try again").count(), 2);
    }

    #[test]
    fn test_blank_required_asks_again() {
        let (record, output) = prompt(CalculationKind::PercentOfDesign, "\n1000\n950\n");
        assert!(record.is_ok());
        assert!(output.contains("Design airflow is required."));
    }

    #[test]
    fn test_blank_optional_is_skipped() {
        let (record, _) = prompt(CalculationKind::TemperatureSplit, "75\n55\n\n");
        let record = record.unwrap();
        assert_eq!(record.len(), 2);
        assert!(!record.contains(Field::MeasuredCfm));
    }

    #[test]
    fn test_end_of_input_is_missing_field() {
        let (record, _) = prompt(CalculationKind::PercentOfDesign, "1000\n");
        assert_eq!(record.unwrap_err(), CalcError::missing_field("measured_cfm"));
    }

    #[test]
    fn test_duct_area_skips_dimensions() {
        // velocity, area, then design; width/height/diameter never asked
        let (record, output) = prompt(CalculationKind::DuctAirflow, "800\n2.5\n2000\n");
        let record = record.unwrap();
        assert_eq!(record.get(Field::DuctArea), Some(2.5));
        assert_eq!(record.get(Field::DesignCfm), Some(2000.0));
        assert!(!output.contains("Duct width"));
        assert!(!output.contains("Duct diameter"));
    }

    #[test]
    fn test_no_duct_geometry_asks_again() {
        // all four dimensions skipped, then an area on the second pass
        let (record, output) = prompt(CalculationKind::DuctAirflow, "800\n\n\n\n\n2.5\n2000\n");
        let record = record.unwrap();
        assert_eq!(record.get(Field::DuctArea), Some(2.5));
        assert_eq!(record.get(Field::DesignCfm), Some(2000.0));
        assert_eq!(output.matches("enter a duct area").count(), 1);
    }

    #[test]
    fn test_half_rectangle_asks_again() {
        let (record, _) = prompt(CalculationKind::DuctAirflow, "800\n\n24\n\n\n\n24\n12\n\n");
        let record = record.unwrap();
        assert_eq!(record.get(Field::DuctWidth), Some(24.0));
        assert_eq!(record.get(Field::DuctHeight), Some(12.0));
        assert!(!record.contains(Field::DuctDiameter));
        assert!(duct_geometry(&record).is_ok());
    }

    #[test]
    fn test_no_duct_geometry_at_end_of_input() {
        let (record, _) = prompt(CalculationKind::DuctAirflow, "800\n");
        assert_eq!(record.unwrap_err(), CalcError::missing_field("duct_area"));
    }
}

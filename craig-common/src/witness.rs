//! Counterexample witnesses

use crate::{
    circuit::Circuit,
    literal::Literal,
    memory::{HeapSpace, Vector},
    parser::open_file_for_writing,
};
use serde_derive::{Deserialize, Serialize};
use std::{io::Write, mem::size_of};

/// An input sequence that drives the circuit from its reset state into a bad
/// state.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Witness {
    /// The step in which the bad literal holds
    pub length: usize,
    /// For each step `0..=length`, one `0` or `1` per input
    pub inputs: Vector<String>,
}

impl HeapSpace for Witness {
    fn heap_space(&self) -> usize {
        self.inputs.capacity() * size_of::<String>()
            + self.inputs.iter().map(String::capacity).sum::<usize>()
    }
}

impl Witness {
    /// Read the trace of a satisfying assignment of an unrolling with
    /// `frames` frames. The trace ends at the first bad state.
    pub fn from_model(
        circuit: &Circuit,
        frames: usize,
        model_value: impl Fn(Literal) -> bool,
    ) -> Witness {
        let length = (0..frames)
            .find(|&step| model_value(circuit.at(circuit.bad, step)))
            .unwrap_or_else(|| frames.saturating_sub(1));
        let inputs = (0..=length)
            .map(|step| {
                circuit
                    .inputs
                    .iter()
                    .map(|&input| if model_value(circuit.at(input, step)) { '1' } else { '0' })
                    .collect::<String>()
            })
            .collect();
        Witness { length, inputs }
    }
    /// Write the witness as TOML.
    pub fn write(&self, filename: &str) {
        let text = toml::to_string(self)
            .unwrap_or_else(|err| die!("failed to serialize witness: {}", err));
        let mut file = open_file_for_writing(filename);
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .unwrap_or_else(|err| die!("failed to write witness: {}", err));
    }
}

/// Simulate the circuit on the witness inputs, starting from the reset
/// state. Returns an error unless the bad literal holds in the final step.
pub fn check_witness(circuit: &Circuit, witness: &Witness) -> Result<(), String> {
    if witness.inputs.len() != witness.length + 1 {
        return Err(format!(
            "Expected {} input rows, found {}",
            witness.length + 1,
            witness.inputs.len()
        ));
    }
    let mut state: Vector<bool> = circuit.latches.iter().map(|_| false).collect();
    for (step, row) in witness.inputs.iter().enumerate() {
        if row.len() != circuit.inputs.len() {
            return Err(format!(
                "Step {} has {} input values, expected {}",
                step,
                row.len(),
                circuit.inputs.len()
            ));
        }
        let mut inputs = Vector::with_capacity(row.len());
        for value in row.chars() {
            inputs.push(match value {
                '0' => false,
                '1' => true,
                other => return Err(format!("Invalid input value {:?} in step {}", other, step)),
            });
        }
        let values = circuit.evaluate_frame(&state, &inputs);
        if step == witness.length {
            return if circuit.bad.evaluate(values[circuit.bad.variable()]) {
                Ok(())
            } else {
                Err(format!("Bad state is not reached in step {}", step))
            };
        }
        state = circuit.next_state(&values);
    }
    Err("Empty witness".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input::Input, parser::parse_circuit};

    /// Bad once the latch has stored a true input.
    const STORE: &str = "aag 2 1 1 1 0\n2\n4 2\n4\n";

    fn witness(length: usize, inputs: &[&str]) -> Witness {
        Witness {
            length,
            inputs: inputs.iter().map(|row| row.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_a_real_counterexample() {
        let circuit = parse_circuit(Input::from_text(STORE)).unwrap();
        assert_eq!(check_witness(&circuit, &witness(1, &["1", "0"])), Ok(()));
        assert_eq!(check_witness(&circuit, &witness(2, &["0", "1", "0"])), Ok(()));
    }

    #[test]
    fn rejects_bogus_witnesses() {
        let circuit = parse_circuit(Input::from_text(STORE)).unwrap();
        assert!(check_witness(&circuit, &witness(1, &["0", "0"])).is_err());
        assert!(check_witness(&circuit, &witness(1, &["1"])).is_err());
        assert!(check_witness(&circuit, &witness(1, &["1", "01"])).is_err());
        assert!(check_witness(&circuit, &witness(0, &["x"])).is_err());
    }

    #[test]
    fn toml_format() {
        let written = witness(1, &["1", "0"]);
        let text = toml::to_string(&written).unwrap();
        assert!(text.starts_with("length = 1\n"));
        let parsed: Witness = toml::from_str(&text).unwrap();
        assert_eq!(parsed, written);
    }
}

//! ASCII AIGER parser

use crate::{
    circuit::{Circuit, Gate, Latch},
    input::Input,
    literal::{Literal, Variable},
    memory::Vector,
    output::Timer,
};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Result},
};

/// The numbers of the `aag` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub max_index: u32,
    pub inputs: u32,
    pub latches: u32,
    pub outputs: u32,
    pub gates: u32,
}

/// Parse a circuit from a possibly compressed file.
///
/// Prints the time it took if `verbose` is set.
pub fn parse_circuit_file(filename: &str, verbose: bool) -> Result<Circuit> {
    let _timer = Timer::name_if("parse time", verbose);
    parse_circuit(read_compressed_file(filename))
}

/// Parse a circuit with exactly one output, which is taken as the bad-state
/// literal.
///
/// Anything after the gate definitions (symbols, comments) is ignored.
pub fn parse_circuit(mut input: Input) -> Result<Circuit> {
    let header = parse_header(&mut input)?;
    let max_index = Variable::new(header.max_index);
    let mut inputs = Vector::with_capacity(header.inputs as usize);
    for _ in 0..header.inputs {
        let literal = parse_literal(&mut input, max_index)?;
        if literal.is_negated() {
            warn!("input {} is negated", literal.encoding());
        }
        inputs.push(literal);
        input.expect_newline()?;
    }
    let mut latches = Vector::with_capacity(header.latches as usize);
    for _ in 0..header.latches {
        latches.push(parse_latch(&mut input, max_index)?);
    }
    let bad = parse_literal(&mut input, max_index)?;
    input.expect_newline()?;
    let mut gates = Vector::with_capacity(header.gates as usize + 1);
    for _ in 0..header.gates {
        let output = parse_literal(&mut input, max_index)?;
        if output.is_negated() {
            warn!("output of gate {} is negated", output.encoding());
        }
        input.skip_some_blanks()?;
        let left = parse_literal(&mut input, max_index)?;
        input.skip_some_blanks()?;
        let right = parse_literal(&mut input, max_index)?;
        input.expect_newline()?;
        gates.push(Gate {
            output,
            left,
            right,
        });
    }
    Ok(Circuit::new(max_index, inputs, latches, gates, bad))
}

/// Parse the line `aag M I L O A`.
pub fn parse_header(input: &mut Input) -> Result<Header> {
    input.expect_keyword(b"aag", Input::AAG)?;
    let mut numbers = [0u32; 5];
    for number in numbers.iter_mut() {
        input.skip_some_blanks()?;
        *number = input.parse_u32()?;
    }
    input.expect_newline()?;
    let header = Header {
        max_index: numbers[0],
        inputs: numbers[1],
        latches: numbers[2],
        outputs: numbers[3],
        gates: numbers[4],
    };
    if header.outputs != 1 {
        return Err(input.error(Input::OUTPUTS));
    }
    Ok(header)
}

/// Parse `current next [reset]` where the optional reset value must be 0.
fn parse_latch(input: &mut Input, max_index: Variable) -> Result<Latch> {
    let current = parse_literal(input, max_index)?;
    input.skip_some_blanks()?;
    let next = parse_literal(input, max_index)?;
    input.skip_blanks();
    if input.peek().map_or(false, Input::is_digit) && input.parse_u32()? != 0 {
        return Err(input.error(Input::RESET));
    }
    input.expect_newline()?;
    Ok(Latch { current, next })
}

/// Parse a literal in `2 * variable + sign` form, after optional leading blanks.
pub fn parse_literal(input: &mut Input, max_index: Variable) -> Result<Literal> {
    input.skip_blanks();
    let literal = Literal::from_raw(input.parse_u32()?);
    if literal.variable() > max_index {
        return Err(input.error(Input::LITERAL_RANGE));
    }
    Ok(literal)
}

/// Open a file for reading.
/// # Panics
/// Panics on error.
pub fn open_file(filename: &str) -> File {
    File::open(filename).unwrap_or_else(|err| die!("cannot open file: {}", err))
}

/// Open a file for writing.
/// # Panics
/// Panics on error.
pub fn open_file_for_writing(filename: &str) -> BufWriter<File> {
    BufWriter::new(
        File::create(filename).unwrap_or_else(|err| die!("cannot open file for writing: {}", err)),
    )
}

/// File extension of Zstandard archives.
const ZSTD: &str = ".zst";
/// File extension of Gzip archives.
const GZIP: &str = ".gz";
/// File extension of Bzip2 archives.
const BZIP2: &str = ".bz2";
/// File extension of XZ archives.
const XZ: &str = ".xz";
/// File extension of LZ4 archives.
const LZ4: &str = ".lz4";

/// Return the archive extension of a filename, or the empty string.
fn compression_format_by_extension(filename: &str) -> &str {
    [ZSTD, GZIP, BZIP2, LZ4, XZ]
        .iter()
        .find(|extension| filename.ends_with(*extension))
        .cloned()
        .unwrap_or("")
}

/// Return an [Input](../input/struct.Input.html) to read from a possibly compressed file.
///
/// If the file is compressed it is transparently uncompressed.
pub fn read_compressed_file(filename: &str) -> Input<'static> {
    let file = open_file(filename);
    Input::new(read_from_compressed_file(file, filename))
}

/// Return an Iterator to read from a possibly compressed file.
fn read_from_compressed_file(file: File, filename: &str) -> Box<dyn Iterator<Item = u8>> {
    match compression_format_by_extension(filename) {
        ZSTD => {
            let de = zstd::stream::read::Decoder::new(file)
                .unwrap_or_else(|err| die!("failed to decompress ZST archive: {}", err));
            Box::new(de.bytes().map(panic_on_error))
        }
        GZIP => {
            let de = flate2::read::GzDecoder::new(file);
            Box::new(de.bytes().map(panic_on_error))
        }
        BZIP2 => {
            let de = bzip2::read::BzDecoder::new(file);
            Box::new(de.bytes().map(panic_on_error))
        }
        XZ => {
            let de = xz2::read::XzDecoder::new(file);
            Box::new(de.bytes().map(panic_on_error))
        }
        LZ4 => {
            let de = lz4::Decoder::new(file)
                .unwrap_or_else(|err| die!("failed to decode LZ4 archive: {}", err));
            Box::new(de.bytes().map(panic_on_error))
        }
        _ => Box::new(BufReader::new(file).bytes().map(panic_on_error)),
    }
}

/// Unwraps a result, exiting on error.
pub fn panic_on_error<T>(result: Result<T>) -> T {
    result.unwrap_or_else(|error| die!("{}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    fn parse(text: &str) -> Result<Circuit> {
        parse_circuit(Input::from_text(text))
    }

    fn lit(encoding: u32) -> Literal {
        Literal::from_raw(encoding)
    }

    #[test]
    fn valid_circuit() {
        let circuit = parse("aag 5 2 1 1 2\n2\n4\n6 11 0\n10\n8 2 4\n10 9 7\nc\nsymbols\n").unwrap();
        assert_eq!(circuit.max_index, Variable(5));
        assert_eq!(&*circuit.inputs, &[lit(2), lit(4)]);
        assert_eq!(
            &*circuit.latches,
            &[Latch {
                current: lit(6),
                next: lit(11)
            }]
        );
        assert_eq!(circuit.bad, lit(10));
        assert_eq!(circuit.gates.len(), 3);
        assert_eq!(
            circuit.gates[1],
            Gate {
                output: lit(10),
                left: lit(9),
                right: lit(7)
            }
        );
        assert_eq!(*circuit.gates.last(), Gate::CONSTANT_FALSE);
    }

    #[test]
    fn trailing_blanks_and_missing_final_newline() {
        let circuit = parse("aag 1 0 1 1 0 \n 2  3 \n2").unwrap();
        assert_eq!(circuit.latches[0].next, lit(3));
    }

    #[test]
    fn rejects_bad_headers() {
        for text in &["aig 1 0 0 1 0\n0\n", "aag 1 0 0 2 0\n0\n0\n", "aag 1 0 0 1\n0\n"] {
            let error = parse(text).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidData);
        }
    }

    #[test]
    fn rejects_out_of_range_literals() {
        let error = parse("aag 1 0 1 1 0\n2 4\n2\n").unwrap_err();
        assert!(error.to_string().starts_with(Input::LITERAL_RANGE));
        assert!(error.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_reset_to_one() {
        let error = parse("aag 1 0 1 1 0\n2 3 1\n2\n").unwrap_err();
        assert!(error.to_string().starts_with(Input::RESET));
    }

    #[test]
    fn rejects_truncated_files() {
        assert!(parse("aag 3 1 1 1 1\n2\n4 6\n4\n").is_err());
        assert!(parse("aag 3 1 1 1 1\n2\n4 6\n").is_err());
    }
}

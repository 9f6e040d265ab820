//! BLIF reader.
//!
//! `.names` covers are lowered to primitive gates at parse time: each cube
//! becomes an AND of (possibly inverted) literals, the cover an OR of its
//! cubes, and an off-set cover gains a trailing inverter. Lowered internal
//! nodes get `$`-prefixed synthesized names, which cannot collide with BLIF
//! identifiers from well-formed sources.
//!
//! `.latch` lines follow the same full-scan treatment as `.bench` flip-flops:
//! latch output → pseudo-primary input, latch input → pseudo-primary output.

use crate::error::NetlistError;
use crate::gate::GateKind;
use crate::network::{Network, NetworkBuilder};

/// Parse BLIF text into a network.
///
/// Supported constructs: `.model`, `.inputs`, `.outputs`, `.names`,
/// `.latch`, `.end`. Anything else is a parse error.
///
/// # Errors
///
/// [`NetlistError::Parse`] on malformed or unsupported constructs, plus the
/// builder's resolution errors.
pub fn parse(text: &str) -> Result<Network, NetlistError> {
    let lines = logical_lines(text);
    let mut builder = NetworkBuilder::new("blif");
    let mut named = false;

    let mut i = 0;
    while i < lines.len() {
        let (lineno, ref line) = lines[i];
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            i += 1;
            continue;
        };
        match head {
            ".model" => {
                if let Some(name) = tokens.next() {
                    if !named {
                        builder.set_name(name);
                        named = true;
                    }
                }
                i += 1;
            }
            ".inputs" => {
                for t in tokens {
                    builder.add_input(t);
                }
                i += 1;
            }
            ".outputs" => {
                for t in tokens {
                    builder.add_output(t);
                }
                i += 1;
            }
            ".latch" => {
                let args: Vec<&str> = tokens.collect();
                if args.len() < 2 {
                    return Err(NetlistError::parse(lineno, ".latch needs input and output"));
                }
                // Trailing type/control/init-value tokens are irrelevant to
                // the full-scan view.
                builder.add_pseudo_output(args[0]);
                builder.add_pseudo_input(args[1]);
                i += 1;
            }
            ".names" => {
                let signals: Vec<String> = tokens.map(str::to_string).collect();
                let Some((output, inputs)) = signals.split_last() else {
                    return Err(NetlistError::parse(lineno, ".names needs an output"));
                };
                // Collect the single-output cover rows that follow.
                let mut rows: Vec<(usize, &str)> = Vec::new();
                let mut j = i + 1;
                while j < lines.len() && !lines[j].1.starts_with('.') {
                    rows.push((lines[j].0, lines[j].1.as_str()));
                    j += 1;
                }
                lower_cover(&mut builder, output, inputs, &rows)?;
                i = j;
            }
            ".end" => break,
            other => {
                return Err(NetlistError::parse(
                    lineno,
                    format!("unsupported BLIF construct `{other}`"),
                ));
            }
        }
    }
    builder.build()
}

/// Strip comments, join `\` continuations, keep 1-based line numbers.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (idx, raw) in text.lines().enumerate() {
        let no_comment = raw.split('#').next().unwrap_or("");
        let (fragment, continues) = match no_comment.trim_end().strip_suffix('\\') {
            Some(head) => (head.trim(), true),
            None => (no_comment.trim(), false),
        };
        match pending.take() {
            Some((start, mut acc)) => {
                acc.push(' ');
                acc.push_str(fragment);
                if continues {
                    pending = Some((start, acc));
                } else if !acc.trim().is_empty() {
                    out.push((start, acc));
                }
            }
            None => {
                if continues {
                    pending = Some((idx + 1, fragment.to_string()));
                } else if !fragment.is_empty() {
                    out.push((idx + 1, fragment.to_string()));
                }
            }
        }
    }
    if let Some((start, acc)) = pending {
        if !acc.trim().is_empty() {
            out.push((start, acc));
        }
    }
    out
}

/// One parsed cube: per-input `Some(polarity)` or `None` for don't-care.
type Cube = Vec<Option<bool>>;

/// Lower a `.names` cover onto primitive gates.
fn lower_cover(
    builder: &mut NetworkBuilder,
    output: &str,
    inputs: &[String],
    rows: &[(usize, &str)],
) -> Result<(), NetlistError> {
    let mut cubes: Vec<Cube> = Vec::new();
    let mut polarity: Option<bool> = None;
    for &(lineno, row) in rows {
        let (cube_part, out_part) = if inputs.is_empty() {
            ("", row.trim())
        } else {
            row.trim()
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| NetlistError::parse(lineno, "cover row needs an output value"))?
        };
        let row_polarity = match out_part {
            "1" => true,
            "0" => false,
            other => {
                return Err(NetlistError::parse(
                    lineno,
                    format!("bad cover output `{other}`"),
                ));
            }
        };
        if *polarity.get_or_insert(row_polarity) != row_polarity {
            return Err(NetlistError::parse(lineno, "mixed cover polarities"));
        }
        let cube_part = cube_part.trim();
        if cube_part.chars().filter(|c| !c.is_whitespace()).count() != inputs.len() {
            return Err(NetlistError::parse(lineno, "cover row width mismatch"));
        }
        let cube: Result<Cube, NetlistError> = cube_part
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '1' => Ok(Some(true)),
                '0' => Ok(Some(false)),
                '-' => Ok(None),
                other => Err(NetlistError::parse(
                    lineno,
                    format!("bad cube character `{other}`"),
                )),
            })
            .collect();
        cubes.push(cube?);
    }

    // Empty cover: constant zero by convention.
    if cubes.is_empty() {
        builder.add_gate(output, GateKind::Const0, Vec::<String>::new());
        return Ok(());
    }
    let polarity = polarity.unwrap_or(true);

    // A tautological cube makes the whole cover constant.
    if cubes.iter().any(|c| c.iter().all(Option::is_none)) {
        let kind = if polarity { GateKind::Const1 } else { GateKind::Const0 };
        builder.add_gate(output, kind, Vec::<String>::new());
        return Ok(());
    }

    // Cube terms.
    let mut cube_nets: Vec<String> = Vec::with_capacity(cubes.len());
    for (ci, cube) in cubes.iter().enumerate() {
        let mut literals: Vec<String> = Vec::new();
        for (pos, lit) in cube.iter().enumerate() {
            match lit {
                None => {}
                Some(true) => literals.push(inputs[pos].clone()),
                Some(false) => {
                    let inv = format!("{output}$c{ci}n{pos}");
                    builder.add_gate(&inv, GateKind::Not, [inputs[pos].clone()]);
                    literals.push(inv);
                }
            }
        }
        if literals.len() == 1 {
            cube_nets.push(literals.remove(0));
        } else {
            let net = format!("{output}$c{ci}");
            builder.add_gate(&net, GateKind::And, literals);
            cube_nets.push(net);
        }
    }

    // Cover disjunction plus optional output inversion.
    match (cube_nets.len(), polarity) {
        (1, true) => builder.add_gate(output, GateKind::Buf, [cube_nets.remove(0)]),
        (1, false) => builder.add_gate(output, GateKind::Not, [cube_nets.remove(0)]),
        (_, true) => builder.add_gate(output, GateKind::Or, cube_nets),
        (_, false) => builder.add_gate(output, GateKind::Nor, cube_nets),
    }
    Ok(())
}

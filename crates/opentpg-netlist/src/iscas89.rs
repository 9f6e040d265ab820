//! ISCAS89 `.bench` reader.
//!
//! Flip-flops are handled under the full-scan assumption: a `DFF` output
//! becomes a pseudo-primary input and its data input a pseudo-primary
//! output, leaving a purely combinational core.

use crate::error::NetlistError;
use crate::gate::GateKind;
use crate::network::{Network, NetworkBuilder};

/// Parse `.bench` text into a network.
///
/// # Errors
///
/// [`NetlistError::Parse`] on malformed lines, plus the builder's
/// resolution errors.
pub fn parse(text: &str) -> Result<Network, NetlistError> {
    let mut builder = NetworkBuilder::new("bench");
    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let lineno = lineno + 1;

        if let Some(name) = parse_decl(line, "INPUT") {
            builder.add_input(check_net(name, lineno, "INPUT")?);
        } else if let Some(name) = parse_decl(line, "OUTPUT") {
            builder.add_output(check_net(name, lineno, "OUTPUT")?);
        } else if let Some((lhs, rhs)) = line.split_once('=') {
            let lhs = lhs.trim();
            if lhs.is_empty() {
                return Err(NetlistError::parse(lineno, "missing net name before `=`"));
            }
            let (gate, args) = parse_call(rhs.trim())
                .ok_or_else(|| NetlistError::parse(lineno, "expected `GATE(net, ...)`"))?;
            let kind = match gate.to_ascii_uppercase().as_str() {
                "AND" => GateKind::And,
                "NAND" => GateKind::Nand,
                "OR" => GateKind::Or,
                "NOR" => GateKind::Nor,
                "XOR" => GateKind::Xor,
                "XNOR" => GateKind::Xnor,
                "NOT" => GateKind::Not,
                "BUF" | "BUFF" => GateKind::Buf,
                "DFF" => {
                    let [d] = args.as_slice() else {
                        return Err(NetlistError::parse(lineno, "DFF takes exactly one input"));
                    };
                    builder.add_pseudo_input(lhs);
                    builder.add_pseudo_output(d.clone());
                    continue;
                }
                other => {
                    return Err(NetlistError::parse(lineno, format!("unknown gate `{other}`")));
                }
            };
            if args.is_empty() {
                return Err(NetlistError::parse(lineno, "gate without inputs"));
            }
            if matches!(kind, GateKind::Not | GateKind::Buf) && args.len() != 1 {
                return Err(NetlistError::parse(
                    lineno,
                    format!("{gate} takes exactly one input"),
                ));
            }
            builder.add_gate(lhs, kind, args);
        } else {
            return Err(NetlistError::parse(lineno, "unrecognized line"));
        }
    }
    builder.build()
}

/// Match `KEYWORD ( name )`, case-insensitively, returning the raw inside.
fn parse_decl<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = line.get(keyword.len()..)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?.trim();
    Some(inner)
}

/// Reject empty or comma-bearing declaration bodies.
fn check_net(inner: &str, lineno: usize, keyword: &str) -> Result<String, NetlistError> {
    if inner.is_empty() || inner.contains(',') {
        return Err(NetlistError::parse(
            lineno,
            format!("malformed {keyword} declaration"),
        ));
    }
    Ok(inner.to_string())
}

/// Match `name ( a, b, ... )`.
fn parse_call(s: &str) -> Option<(String, Vec<String>)> {
    let open = s.find('(')?;
    let close = s.rfind(')')?;
    if close < open {
        return None;
    }
    let name = s[..open].trim();
    if name.is_empty() {
        return None;
    }
    let args: Vec<String> = s[open + 1..close]
        .split(',')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    Some((name.to_string(), args))
}

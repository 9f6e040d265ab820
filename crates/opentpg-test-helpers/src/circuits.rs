//! Tiny circuit fixtures.

use opentpg_netlist::{Network, NetlistFormat};

use crate::must::must;

/// `.bench` text of a lone inverter.
pub const INVERTER_BENCH: &str = "\
INPUT(a)
OUTPUT(y)
y = NOT(a)
";

/// `.bench` text of a 2-input AND.
pub const AND2_BENCH: &str = "\
INPUT(a)
INPUT(b)
OUTPUT(y)
y = AND(a, b)
";

/// `.bench` text of a net with an untestable branch fault: `y = OR(a, a)`
/// never changes when one branch sticks at 0.
pub const REDUNDANT_OR_BENCH: &str = "\
INPUT(a)
OUTPUT(y)
y = OR(a, a)
";

/// `.bench` text of the classic c17 benchmark (6 NAND gates).
pub const C17_BENCH: &str = "\
# c17
INPUT(G1)
INPUT(G2)
INPUT(G3)
INPUT(G6)
INPUT(G7)
OUTPUT(G22)
OUTPUT(G23)
G10 = NAND(G1, G3)
G11 = NAND(G3, G6)
G16 = NAND(G2, G11)
G19 = NAND(G11, G7)
G22 = NAND(G10, G16)
G23 = NAND(G16, G19)
";

/// BLIF text equivalent to [`AND2_BENCH`].
pub const AND2_BLIF: &str = "\
.model and2
.inputs a b
.outputs y
.names a b y
11 1
.end
";

/// A lone inverter.
pub fn inverter() -> Network {
    must(Network::parse(INVERTER_BENCH, NetlistFormat::Iscas89))
}

/// A 2-input AND.
pub fn and2() -> Network {
    must(Network::parse(AND2_BENCH, NetlistFormat::Iscas89))
}

/// `y = OR(a, a)`: both branch stuck-at-0 faults are untestable.
pub fn redundant_or() -> Network {
    must(Network::parse(REDUNDANT_OR_BENCH, NetlistFormat::Iscas89))
}

/// The c17 benchmark.
pub fn c17() -> Network {
    must(Network::parse(C17_BENCH, NetlistFormat::Iscas89))
}

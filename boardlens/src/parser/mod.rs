pub mod netlist;
pub mod pcb;
pub mod pcb_schema;
pub mod schema;
pub mod schematic;
pub mod sexp;

// Re-export for convenience
pub use pcb::{PcbParseError, PcbParser};
pub use pcb_schema::*;
pub use schema::*;
pub use schematic::{SchematicParseError, SchematicParser};
pub use sexp::{Sexp, SexpError, SexpParser};

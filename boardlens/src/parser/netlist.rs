//! Connectivity builder: turns flat pad/trace/via records into the
//! net-indexed structure the analyzers query.
//!
//! This is the single place where "which components share a net" is
//! established; differential-pair detection, cross-reference, thermal
//! search, and signal-path tracing all build on it.

use crate::parser::pcb_schema::{NetConnectivity, PadRef, PcbDesign};

/// Populate `design.connectivity` and `design.component_nets` from the
/// already-extracted footprints, traces, and vias.
///
/// Invariant on exit: for every component C and net N,
/// `C ∈ connectivity[N].components` iff `N ∈ component_nets[C]`.
pub fn build_connectivity(design: &mut PcbDesign) {
    design.connectivity.clear();
    design.component_nets.clear();

    // One entry per known net, net 0 included; downstream analysis
    // filters the unconnected net out itself.
    for &net in design.nets.keys() {
        design.connectivity.insert(net, NetConnectivity::default());
    }

    for trace in &design.traces {
        if let Some(conn) = design.connectivity.get_mut(&trace.net) {
            conn.traces.push(trace.clone());
        }
    }

    for via in &design.vias {
        if let Some(conn) = design.connectivity.get_mut(&via.net) {
            conn.vias.push(via.clone());
        }
    }

    for fp in &design.footprints {
        let nets = design.component_nets.entry(fp.reference.clone()).or_default();

        for pad in &fp.pads {
            let Some(net) = pad.net.filter(|n| *n > 0) else { continue };

            if let Some(conn) = design.connectivity.get_mut(&net) {
                conn.components.insert(fp.reference.clone());
                conn.pads.push(PadRef {
                    component: fp.reference.clone(),
                    pad: pad.number.clone(),
                    net_name: pad.net_name.clone(),
                });
            }
            nets.insert(net);
        }
    }
}

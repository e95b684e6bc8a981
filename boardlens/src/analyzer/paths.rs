//! Signal-path tracing over the component connectivity graph.
//!
//! Components are nodes; an edge exists where two components share a net.
//! A breadth-first shortest path is annotated with the connecting net
//! names, giving output like `["U1", "[SPI_CLK]", "R5", "[FLASH_CLK]", "U2"]`.

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::BTreeMap;

use crate::parser::pcb_schema::PcbDesign;

/// Shortest hop path between two components, alternating component
/// references and bracketed net names. `None` when either component is
/// unknown or no path exists. A component reaches itself with a
/// single-element path.
pub fn trace_signal_path(design: &PcbDesign, start: &str, end: &str) -> Option<Vec<String>> {
    design.footprint(start)?;
    design.footprint(end)?;

    let mut graph: UnGraph<String, ()> = UnGraph::new_undirected();
    let mut nodes: BTreeMap<&str, NodeIndex> = BTreeMap::new();

    for fp in &design.footprints {
        nodes.insert(&fp.reference, graph.add_node(fp.reference.clone()));
    }

    for conn in design.connectivity.values() {
        let members: Vec<&NodeIndex> = conn
            .components
            .iter()
            .filter_map(|c| nodes.get(c.as_str()))
            .collect();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                if graph.find_edge(*a, *b).is_none() {
                    graph.add_edge(*a, *b, ());
                }
            }
        }
    }

    let start_node = *nodes.get(start)?;
    let end_node = *nodes.get(end)?;

    let (_, path) = astar(&graph, start_node, |n| n == end_node, |_| 1u32, |_| 0)?;

    let mut detailed = Vec::with_capacity(path.len() * 2 - 1);
    for (i, node) in path.iter().enumerate() {
        detailed.push(graph[*node].clone());
        if let Some(next) = path.get(i + 1) {
            if let Some(net) = connecting_net(design, &graph[*node], &graph[*next]) {
                detailed.push(format!("[{}]", design.net_name(net)));
            }
        }
    }

    Some(detailed)
}

/// Lowest-numbered net shared by two components. The ordered net index
/// makes the annotation deterministic when several nets connect the pair.
fn connecting_net(design: &PcbDesign, a: &str, b: &str) -> Option<u32> {
    let nets_a = design.component_nets.get(a)?;
    let nets_b = design.component_nets.get(b)?;
    nets_a.intersection(nets_b).next().copied()
}

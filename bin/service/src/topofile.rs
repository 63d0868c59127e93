use serde::Deserialize;
use topology_graph::TopologyGraph;

#[derive(Debug, Deserialize)]
struct TopoFile {
    nodes: Vec<TopoNode>,
    edges: Vec<TopoEdge>,
}

#[derive(Debug, Deserialize)]
struct TopoNode {
    name: String,
    location: (f64, f64),
}

#[derive(Debug, Deserialize)]
struct TopoEdge {
    node1: String,
    node2: String,
    attributes: TopoEdgeAttributes,
}

#[derive(Debug, Deserialize)]
struct TopoEdgeAttributes {
    latency: f64,
    cost: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum TopoFileError {
    #[error("failed to read topology file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse topology file {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
    #[error("edge ({node1}, {node2}) references an unknown node: {source}")]
    UnknownEdgeEndpoint {
        node1: String,
        node2: String,
        source: topology_graph::GraphError,
    },
}

/// Loads the `TOPOFILE` YAML document into a fresh [`TopologyGraph`].
pub fn load(path: &str) -> Result<TopologyGraph, TopoFileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TopoFileError::Read {
        path: path.to_string(),
        source,
    })?;
    let parsed: TopoFile = serde_yaml::from_str(&raw).map_err(|source| TopoFileError::Parse {
        path: path.to_string(),
        source,
    })?;

    let mut graph = TopologyGraph::new();
    for node in &parsed.nodes {
        graph.add_node(node.name.clone(), node.location);
    }
    for edge in &parsed.edges {
        graph
            .add_edge(&edge.node1, &edge.node2, edge.attributes.latency, edge.attributes.cost)
            .map_err(|source| TopoFileError::UnknownEdgeEndpoint {
                node1: edge.node1.clone(),
                node2: edge.node2.clone(),
                source,
            })?;
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_nodes_and_edges() {
        let mut file = tempfile_with_contents(
            "nodes:\n  - name: A\n    location: [0.0, 0.0]\n  - name: B\n    location: [1.0, 1.0]\n\
             edges:\n  - node1: A\n    node2: B\n    attributes: { latency: 10.0, cost: 5.0 }\n",
        );
        let graph = load(file.path()).unwrap();
        assert!(graph.contains_node("A"));
        assert!(graph.contains_node("B"));
        assert_eq!(
            graph.get_edge("A", "B"),
            Some(topology_graph::Edge { latency: 10.0, cost: 5.0 })
        );
        file.close();
    }

    #[test]
    fn rejects_edge_with_unknown_node() {
        let mut file = tempfile_with_contents(
            "nodes:\n  - name: A\n    location: [0.0, 0.0]\n\
             edges:\n  - node1: A\n    node2: Z\n    attributes: { latency: 1.0, cost: 1.0 }\n",
        );
        assert!(load(file.path()).is_err());
        file.close();
    }

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn path(&self) -> &str {
            self.path.to_str().unwrap()
        }

        fn close(self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_with_contents(contents: &str) -> TempFile {
        let path = std::env::temp_dir().join(format!(
            "topofile-test-{}-{:?}.yaml",
            std::process::id(),
            std::thread::current().id()
        ));
        let mut handle = std::fs::File::create(&path).unwrap();
        handle.write_all(contents.as_bytes()).unwrap();
        TempFile { path }
    }
}

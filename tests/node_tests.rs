use approx::assert_abs_diff_eq;
use soft_lattice::*;

#[test]
fn inverse_mass_matches_mass() {
    for mass in [0.25_f32, 1.0, 3.0] {
        let node = Node::new(0, Vec3::ZERO, mass).unwrap();
        assert_abs_diff_eq!(node.inverse_mass(), 1.0 / mass, epsilon = 1e-7);
        assert_abs_diff_eq!(node.mass(), mass);
    }
}

#[test]
fn non_positive_mass_is_fatal() {
    assert_eq!(
        Node::new(0, Vec3::ZERO, 0.0).unwrap_err(),
        SimulationError::InvalidMass(0.0)
    );
    assert!(Node::new(0, Vec3::ZERO, -1.0).is_err());
    assert!(Node::new(0, Vec3::ZERO, f32::NAN).is_err());

    let config = SimulationConfig::default().with_mass(0.0);
    assert!(matches!(
        Simulation::new(config),
        Err(SimulationError::InvalidMass(_))
    ));
}

#[test]
fn cuboid_indexing_and_neighbourhoods() {
    let graph = NodeGraph::cuboid(3, 0.1, 1.0, Vec3::ZERO).unwrap();
    assert_eq!(graph.len(), 27);
    assert_eq!(graph.surface_nodes().len(), 26);

    // x + dim * (y + dim * z) with x = 1, y = 2, z = 0
    let node = graph.node(7).unwrap();
    assert_abs_diff_eq!(node.position.x, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(node.position.y, 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(node.position.z, -0.1, epsilon = 1e-6);

    let center = graph.node(13).unwrap();
    assert_eq!(center.nearby.len(), 26);
    assert_eq!(center.nearby_for_mesh.len(), 6);
    assert!(!center.is_surface());
    assert_eq!(center.surface_index, None);

    let corner = graph.node(0).unwrap();
    assert_eq!(corner.nearby.len(), 7);
    assert_eq!(corner.nearby_for_mesh.len(), 3);
    assert_eq!(corner.surface_index, Some(0));
    assert_eq!(corner.rest_offsets.len(), corner.nearby.len());
}

#[test]
fn adjacency_is_symmetric() {
    let graph = NodeGraph::cuboid(4, 0.1, 1.0, Vec3::new(1.0, 2.0, 3.0)).unwrap();
    for node in graph.nodes() {
        for &near in &node.nearby {
            assert!(graph.nodes()[near].nearby.contains(&node.index));
        }
        for &near in &node.nearby_for_mesh {
            assert!(node.nearby.contains(&near));
            assert!(graph.nodes()[near].nearby_for_mesh.contains(&node.index));
        }
    }
}

#[test]
fn manual_graph_connects_and_checks_bounds() {
    let mut graph = NodeGraph::new();
    let a = graph.add_node(Vec3::ZERO, 1.0).unwrap();
    let b = graph.add_node(Vec3::X, 1.0).unwrap();
    graph.connect(a, b, true).unwrap();
    graph.connect(a, b, true).unwrap();
    graph.rebuild_surface();

    assert_eq!(graph.nodes()[a].nearby, vec![b]);
    assert_eq!(graph.nodes()[b].rest_offsets, vec![-Vec3::X]);
    assert_eq!(graph.surface_nodes(), &[a, b]);
    assert_eq!(
        graph.connect(a, 5, false),
        Err(SimulationError::NodeOutOfBounds { index: 5, count: 2 })
    );
}

#[test]
fn reset_restores_rest_state() {
    let mut graph = NodeGraph::cuboid(2, 0.1, 1.0, Vec3::ZERO).unwrap();
    let rest = graph.rest_position(3).unwrap();
    {
        let node = graph.node_mut(3).unwrap();
        node.position += Vec3::Y;
        node.velocity = Vec3::X;
        node.rotation = Quat::from_rotation_y(0.3);
        node.normal = Vec3::Z;
        node.normal_count = 2;
    }
    graph.reset_to_rest();

    let node = graph.node(3).unwrap();
    assert_eq!(node.position, rest);
    assert_eq!(node.predicted_position, rest);
    assert_eq!(node.velocity, Vec3::ZERO);
    assert_eq!(node.rotation, Quat::IDENTITY);
    assert_eq!(node.normal_count, 0);
}

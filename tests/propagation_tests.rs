use approx::assert_abs_diff_eq;
use soft_lattice::config::MAX_PROPAGATION_POPS;
use soft_lattice::*;

fn two_nodes() -> NodeGraph {
    let mut graph = NodeGraph::new();
    graph.add_node(Vec3::ZERO, 1.0).unwrap();
    graph.add_node(Vec3::X, 1.0).unwrap();
    graph.connect(0, 1, true).unwrap();
    graph.rebuild_surface();
    graph
}

#[test]
fn force_orthogonal_to_neighbour_does_not_cross() {
    let mut graph = two_nodes();
    let config = SimulationConfig::default().with_propagation(0.005, 26, 50.0);
    let mut queue = ForceQueue::new(graph.len());

    queue.add_force(graph.nodes_mut(), 0, Vec3::Y, config.force_threshold);
    assert!(queue.is_queued(0));
    let stats = queue.propagate(graph.nodes_mut(), &config);

    assert_eq!(stats.pops, 1);
    assert!(!stats.cap_reached);
    assert_eq!(graph.nodes()[1].normal, Vec3::ZERO);
    assert_eq!(graph.nodes()[1].normal_count, 0);
    assert!(queue.is_empty());
}

#[test]
fn aligned_force_travels_one_way() {
    let mut graph = two_nodes();
    let config = SimulationConfig::default().with_propagation(0.005, 26, 50.0);
    let mut queue = ForceQueue::new(graph.len());

    queue.add_force(graph.nodes_mut(), 0, Vec3::X, config.force_threshold);
    let stats = queue.propagate(graph.nodes_mut(), &config);

    assert_eq!(stats.pops, 2);
    assert_abs_diff_eq!(graph.nodes()[1].normal.x, 1.0, epsilon = 1e-6);
    assert_eq!(graph.nodes()[1].normal_count, 1);
    // Nothing travels back against the normal.
    assert_eq!(graph.nodes()[0].normal_count, 1);
}

#[test]
fn weak_forces_accumulate_without_queueing() {
    let mut graph = two_nodes();
    let mut queue = ForceQueue::new(graph.len());

    queue.add_force(graph.nodes_mut(), 0, Vec3::X * 0.001, 0.005);
    assert!(!queue.is_queued(0));
    assert_eq!(graph.nodes()[0].normal_count, 1);

    // Out of range indices are ignored.
    queue.add_force(graph.nodes_mut(), 9, Vec3::X, 0.005);
    assert!(queue.is_empty());
}

#[test]
fn saturated_receivers_stop_accepting() {
    let mut graph = two_nodes();
    let config = SimulationConfig::default().with_propagation(0.005, 1, 50.0);
    let mut queue = ForceQueue::new(graph.len());
    graph.nodes_mut()[1].normal_count = 1;

    queue.add_force(graph.nodes_mut(), 0, Vec3::X, config.force_threshold);
    queue.propagate(graph.nodes_mut(), &config);
    assert_eq!(graph.nodes()[1].normal, Vec3::ZERO);
}

#[test]
fn pathological_graph_stops_at_pop_cap() {
    // Collinear and fully connected: every transfer keeps full strength, so
    // the worklist never drains on its own.
    let mut graph = NodeGraph::new();
    let count = 10;
    for i in 0..count {
        graph.add_node(Vec3::new(i as f32, 0.0, 0.0), 1.0).unwrap();
    }
    for a in 0..count {
        for b in (a + 1)..count {
            graph.connect(a, b, false).unwrap();
        }
    }
    graph.rebuild_surface();

    let config = SimulationConfig::default().with_propagation(0.0, u32::MAX, 360.0);
    let mut queue = ForceQueue::new(graph.len());
    queue.add_force(graph.nodes_mut(), 0, Vec3::X, config.force_threshold);
    let stats = queue.propagate(graph.nodes_mut(), &config);

    assert_eq!(stats.pops, MAX_PROPAGATION_POPS);
    assert!(stats.cap_reached);
    // Leftovers stay queued for the next run.
    assert!(!queue.is_empty());
    queue.clear();
    assert!(queue.is_empty());
    assert!(!queue.is_queued(0));
}

#[test]
fn surface_push_leaves_nodes_outside_the_cone_untouched() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    let index_of = |x: usize, y: usize, z: usize| x + 5 * (y + 5 * z);

    // Just above the threshold: diagonal hops fall below it.
    sim.add_force(index_of(0, 2, 2), Vec3::new(0.006, 0.0, 0.0)).unwrap();
    let stats = sim.propagate_queued_forces();

    assert_eq!(stats.pops, 5);
    assert!(!stats.cap_reached);
    for x in 1..5 {
        let node = sim.node(index_of(x, 2, 2)).unwrap();
        assert_abs_diff_eq!(node.normal.x, 0.006, epsilon = 1e-6);
    }
    let beside = sim.node(index_of(0, 3, 2)).unwrap();
    assert_eq!(beside.normal, Vec3::ZERO);
    assert_eq!(beside.normal_count, 0);
}

#[test]
fn out_of_range_force_is_rejected() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    assert_eq!(
        sim.add_force(125, Vec3::Y),
        Err(SimulationError::NodeOutOfBounds {
            index: 125,
            count: 125
        })
    );
}

#[test]
fn area_push_hits_surface_nodes_in_range() {
    let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    // Face centre of the -x side and its four face neighbours lie within 0.11.
    let applied = sim.add_force_in_range(Vec3::new(-0.2, 0.0, 0.0), -1.0, 0.11, Vec3::X);
    assert_eq!(applied, 5);
}

#[test]
fn inbox_is_drained_on_step() {
    let mut sim = Simulation::new(SimulationConfig::default().with_gravity(Vec3::ZERO)).unwrap();
    let inbox = sim.force_inbox();
    inbox.push(0, Vec3::X);
    inbox.push(500, Vec3::X);
    assert_eq!(inbox.len(), 2);

    sim.step();
    assert!(inbox.is_empty());
    assert!(sim.last_stats().propagation.pops >= 1);
}

use approx::assert_abs_diff_eq;
use soft_lattice::*;

fn default_body() -> Simulation {
    Simulation::new(SimulationConfig::default()).unwrap()
}

#[test]
fn generated_surface_is_closed_and_manifold() {
    let sim = default_body();
    let mesh = sim.mesh();

    // 6 faces * 16 squares * 2 triangles
    assert_eq!(mesh.triangles().len(), 192);
    assert_eq!(mesh.edges().len(), 288);
    assert!(mesh.edges().iter().all(|edge| edge.amount == 2));
    assert_eq!(mesh.flat_indices().len(), 576);
    assert!(mesh
        .flat_indices()
        .iter()
        .all(|&i| (i as usize) < mesh.vertices().len()));
    assert_eq!(mesh.vertices().len(), 98);
}

#[test]
fn winding_encloses_positive_volume() {
    let sim = default_body();
    let mesh = sim.mesh();
    let signed = mesh.topology().signed_volume(mesh.vertices());
    assert!(signed > 0.0);
    assert_abs_diff_eq!(mesh.volume(), 0.064, epsilon = 1e-5);
    assert_abs_diff_eq!(sim.initial_volume(), mesh.volume());
}

#[test]
fn generation_is_deterministic() {
    let a = default_body();
    let b = default_body();
    assert_eq!(a.mesh().triangles(), b.mesh().triangles());
    assert_eq!(a.mesh().flat_indices(), b.mesh().flat_indices());
}

#[test]
fn vertices_are_relative_to_the_body_origin() {
    let at_origin = default_body();
    let moved = Simulation::spawn_at(SimulationConfig::default(), Vec3::new(3.0, 1.0, -2.0)).unwrap();

    for (a, b) in at_origin.mesh().vertices().iter().zip(moved.mesh().vertices()) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-5);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-5);
        assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-5);
    }
    let bounds = moved.mesh().bounds();
    assert_abs_diff_eq!(bounds.extent().x, 0.2, epsilon = 1e-5);
    assert_abs_diff_eq!(bounds.center().x, 0.0, epsilon = 1e-5);
}

#[test]
fn vertex_order_follows_surface_index() {
    let sim = default_body();
    let mesh = sim.mesh();
    for (slot, &node) in mesh.surface_nodes().iter().enumerate() {
        assert_eq!(sim.nodes()[node].surface_index, Some(slot));
        assert_eq!(mesh.vertices()[slot], sim.nodes()[node].position);
    }
}

#[test]
fn degenerate_lattices_cannot_be_meshed() {
    let config = SimulationConfig::default().with_dim(1);
    assert!(matches!(
        Simulation::new(config),
        Err(SimulationError::MeshSeed(_))
    ));
}

#[test]
fn smallest_cube_has_twelve_triangles() {
    let sim = Simulation::new(SimulationConfig::default().with_dim(2)).unwrap();
    assert_eq!(sim.mesh().triangles().len(), 12);
    assert_eq!(sim.mesh().edges().len(), 18);
    assert_abs_diff_eq!(sim.mesh_volume(), 0.001, epsilon = 1e-6);
}

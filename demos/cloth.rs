use particle_engine::*;

fn main() {
    let mut world = ParticleWorld::default();
    let ground = world.add_contact_generator(GroundContactGenerator::new(-300.0));
    let pairs = world.add_contact_generator(ParticlePairContactGenerator::new());

    let anchors = vec![
        Vec3::new(-130.0, 200.0, 0.0),
        Vec3::new(-100.0, 200.0, 0.0),
        Vec3::new(-70.0, 200.0, 0.0),
    ];
    let Some(cloth) = ClothBuilder::new(anchors, 3)
        .with_contact_generators([ground, pairs])
        .build(&mut world)
    else {
        eprintln!("not enough room in the pool for the cloth");
        return;
    };

    // A ball dropped onto the cloth.
    if let Some(ball) = world.get_new_particle() {
        if let Some(particle) = world.particle_mut(ball) {
            particle.set_position(Vec3::new(-100.0, 260.0, 0.0));
            particle.set_mass(10.0);
            particle.set_radius(10.0);
            particle.set_bounciness(0.2);
            particle.set_acceleration(Vec3::new(0.0, -10.0, 0.0));
            particle.set_particle_type(ParticleType::Ball);
        }
        for index in [ground, pairs] {
            if let Some(generator) = world.contact_generator_mut(index) {
                generator.add_particle(ball);
            }
        }
    }

    for frame in 0..240 {
        if frame == 120 {
            cloth.set_anchor(&mut world, 0, Vec3::new(-160.0, 220.0, 0.0));
        }
        world.step(1.0 / 60.0);
    }

    for (column, ids) in cloth.grid.iter().enumerate() {
        let positions: Vec<_> = ids
            .iter()
            .filter_map(|&id| world.particle(id))
            .map(|p| p.position().truncate())
            .collect();
        println!("column {column}: {positions:?}");
    }
}
